//! Lifecycle of the single filesystem watch subscription.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::WatchConfig;
use crate::error::{Result, WatchdogError};
use crate::event::RawChangeEvent;
use crate::filter::EventFilter;
use crate::queue::{self, EventQueue};

/// Owns at most one live subscription and its pending queue.
#[derive(Default)]
pub struct WatchSupervisor {
    state: Mutex<Option<Subscription>>,
}

impl WatchSupervisor {
    /// Create a supervisor with no subscription.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a subscription for `config` unless one is already live.
    ///
    /// An existing subscription is kept as is, even when `config` differs
    /// from the one it was created with.
    pub fn ensure(&self, config: &WatchConfig) -> Result<()> {
        let mut state = self.state.lock();
        if state.is_none() {
            *state = Some(Subscription::start(config)?);
        }
        Ok(())
    }

    /// Take every queued event, oldest first.
    pub fn drain(&self) -> Vec<RawChangeEvent> {
        self.state
            .lock()
            .as_mut()
            .map(|subscription| subscription.queue.drain())
            .unwrap_or_default()
    }

    /// Stop the subscription and discard its queue. No-op when none is live.
    pub fn close(&self) {
        if let Some(subscription) = self.state.lock().take() {
            subscription.stop();
        }
    }

    /// Check whether a subscription is live.
    pub fn is_active(&self) -> bool {
        self.state.lock().is_some()
    }

    /// Directories the live subscription watches.
    pub fn watch_roots(&self) -> Vec<PathBuf> {
        self.state
            .lock()
            .as_ref()
            .map(|subscription| subscription.roots.clone())
            .unwrap_or_default()
    }
}

impl Drop for WatchSupervisor {
    fn drop(&mut self) {
        self.close();
    }
}

struct Subscription {
    /// `None` when no path is configured.
    watcher: Option<RecommendedWatcher>,
    queue: EventQueue,
    roots: Vec<PathBuf>,
}

impl Subscription {
    fn start(config: &WatchConfig) -> Result<Self> {
        let (sink, queue) = queue::channel();
        let roots: Vec<PathBuf> = config
            .paths()
            .map(|path| watch_root(Path::new(path)))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        if roots.is_empty() {
            info!("no paths configured, watchdog subscription is idle");
            return Ok(Self {
                watcher: None,
                queue,
                roots,
            });
        }

        let mut filter = EventFilter::new(config.clone(), sink);
        if config.has_relative_paths() {
            // The backend reports absolute paths; relative keys resolve here.
            let cwd = std::env::current_dir()?;
            debug!("Resolving relative paths against {}", cwd.display());
            filter = filter.with_base(cwd);
        }

        let mut watcher = notify::recommended_watcher(filter)?;
        for root in &roots {
            watcher
                .watch(root, RecursiveMode::NonRecursive)
                .map_err(|source| WatchdogError::WatchRoot {
                    root: root.clone(),
                    source,
                })?;
            debug!("Started watching: {}", root.display());
        }

        for (path, entry) in config.ignored_entries() {
            warn!(path = %path, entry = %entry, "ignoring unrecognized mask entry");
        }

        info!(roots = roots.len(), paths = config.len(), "watchdog subscription started");
        Ok(Self {
            watcher: Some(watcher),
            queue,
            roots,
        })
    }

    /// Unwatch every root, then drop the watcher and the queue together so
    /// nothing can be enqueued once this returns.
    fn stop(self) {
        let Self {
            watcher,
            queue,
            roots,
        } = self;

        if let Some(mut watcher) = watcher {
            for root in &roots {
                if let Err(e) = watcher.unwatch(root) {
                    debug!("Failed to unwatch {}: {e}", root.display());
                }
            }
            drop(watcher);
        }
        drop(queue);

        info!("watchdog subscription closed");
    }
}

/// Directory to watch for a configured path: the path itself when it is a
/// directory, otherwise its parent.
pub fn watch_root(path: &Path) -> PathBuf {
    if path.is_dir() {
        return path.to_path_buf();
    }

    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChangeMask;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_watch_root_for_file_and_directory() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        let file = dir.join("missing.txt");

        assert_eq!(watch_root(dir), dir);
        assert_eq!(watch_root(&file), dir);
        assert_eq!(watch_root(Path::new("relative.txt")), Path::new("."));
    }

    #[test]
    fn test_empty_config_is_idle() {
        let supervisor = WatchSupervisor::new();
        supervisor.ensure(&WatchConfig::new()).unwrap();

        assert!(supervisor.is_active());
        assert!(supervisor.watch_roots().is_empty());
        assert!(supervisor.drain().is_empty());
    }

    #[test]
    fn test_ensure_is_idempotent() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        let supervisor = WatchSupervisor::new();

        let config = WatchConfig::new().with_path(first.path().to_string_lossy(), ChangeMask::ALL);
        supervisor.ensure(&config).unwrap();

        let other = WatchConfig::new().with_path(second.path().to_string_lossy(), ChangeMask::ALL);
        supervisor.ensure(&other).unwrap();

        assert_eq!(supervisor.watch_roots(), vec![first.path().to_path_buf()]);
    }

    #[test]
    fn test_roots_are_deduplicated() {
        let temp_dir = TempDir::new().unwrap();
        let a = temp_dir.path().join("a.txt");
        let b = temp_dir.path().join("b.txt");
        let config = WatchConfig::new()
            .with_path(a.to_string_lossy(), ChangeMask::ALL)
            .with_path(b.to_string_lossy(), ChangeMask::ALL);

        let supervisor = WatchSupervisor::new();
        supervisor.ensure(&config).unwrap();
        assert_eq!(supervisor.watch_roots(), vec![temp_dir.path().to_path_buf()]);
    }

    #[test]
    fn test_missing_root_fails_without_subscription() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("gone/file.txt");
        let config = WatchConfig::new().with_path(missing.to_string_lossy(), ChangeMask::ALL);

        let supervisor = WatchSupervisor::new();
        let err = supervisor.ensure(&config).unwrap_err();

        assert!(matches!(err, WatchdogError::WatchRoot { .. }));
        assert!(!supervisor.is_active());
    }

    #[test]
    fn test_close_is_repeatable() {
        let supervisor = WatchSupervisor::new();
        supervisor.close();

        supervisor.ensure(&WatchConfig::new()).unwrap();
        supervisor.close();
        supervisor.close();
        assert!(!supervisor.is_active());
    }
}
