//! Per-path interest matching on the notification delivery path.

use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::config::WatchConfig;
use crate::event::RawChangeEvent;
use crate::queue::EventSink;

/// Decides which raw events are interesting and queues them.
///
/// An event is queued once if its own path is configured for its kind, and
/// once more if it is not a directory and its parent directory is configured
/// for its kind. Identical notifications are never deduplicated.
///
/// The backend reports absolute paths. When a base directory is set, an
/// event under it is also looked up by its path relative to the base, and
/// those matches are queued with the relative path.
#[derive(Debug, Clone)]
pub struct EventFilter {
    config: Arc<WatchConfig>,
    base: Option<Arc<PathBuf>>,
    sink: EventSink,
}

impl EventFilter {
    /// Create a filter feeding `sink`.
    pub fn new(config: WatchConfig, sink: EventSink) -> Self {
        Self {
            config: Arc::new(config),
            base: None,
            sink,
        }
    }

    /// Resolve relative configured paths against `base`.
    pub fn with_base(mut self, base: impl Into<PathBuf>) -> Self {
        self.base = Some(Arc::new(base.into()));
        self
    }

    /// Queue entries `event` produces, in the form of the matching keys.
    pub fn entries(&self, event: &RawChangeEvent) -> Vec<RawChangeEvent> {
        let mut entries = Vec::new();
        self.collect_matches(event, &mut entries);

        if let Some(base) = &self.base
            && let Ok(relative) = event.path.strip_prefix(base.as_path())
            && !relative.as_os_str().is_empty()
        {
            let relative = RawChangeEvent::new(relative, event.kind, event.is_directory);
            self.collect_matches(&relative, &mut entries);
        }

        entries
    }

    /// Number of queue entries `event` produces.
    pub fn copies(&self, event: &RawChangeEvent) -> usize {
        self.entries(event).len()
    }

    /// Queue `event` as many times as it matches.
    pub fn accept(&self, event: RawChangeEvent) {
        let entries = self.entries(&event);
        if entries.is_empty() {
            trace!(path = %event.path.display(), change = event.label(), "no interest");
            return;
        }

        debug!(
            path = %event.path.display(),
            change = event.label(),
            copies = entries.len(),
            "queueing change"
        );

        for entry in entries {
            self.push(entry);
        }
    }

    fn collect_matches(&self, event: &RawChangeEvent, entries: &mut Vec<RawChangeEvent>) {
        if self.config.matches(&path_key(&event.path), event.kind) {
            entries.push(event.clone());
        }

        if !event.is_directory
            && let Some(parent) = event.path.parent().filter(|p| !p.as_os_str().is_empty())
            && self.config.matches(&path_key(parent), event.kind)
        {
            entries.push(event.clone());
        }
    }

    /// Translate a notify result and accept every resulting event.
    pub fn handle(&self, result: notify::Result<notify::Event>) {
        match result {
            Ok(event) => {
                for raw in RawChangeEvent::from_notify(&event) {
                    self.accept(raw);
                }
            }
            Err(e) => warn!("watch error: {e}"),
        }
    }

    fn push(&self, event: RawChangeEvent) {
        if !self.sink.push(event) {
            debug!("queue closed, dropping change");
        }
    }
}

impl notify::EventHandler for EventFilter {
    fn handle_event(&mut self, event: notify::Result<notify::Event>) {
        self.handle(event);
    }
}

/// Configured paths are compared verbatim: no canonicalization, case folding
/// or separator cleanup.
fn path_key(path: &Path) -> Cow<'_, str> {
    path.to_string_lossy()
}
