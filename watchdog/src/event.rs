//! Change events: what the notification backend reports and what poll returns.

use std::path::{Path, PathBuf};

use notify::event::{CreateKind, ModifyKind, RemoveKind, RenameMode};
use serde::{Deserialize, Serialize};

/// Normalized kind of change, as named in a path's mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// Entry was created.
    Create,

    /// Entry content or metadata changed.
    Modify,

    /// Entry was deleted.
    Delete,

    /// Entry was renamed or moved away.
    Move,
}

impl ChangeKind {
    /// Every kind, in mask order.
    pub const ALL: [ChangeKind; 4] = [Self::Create, Self::Modify, Self::Delete, Self::Move];

    /// Parse a mask entry. Unrecognized entries yield `None`.
    pub fn from_mask_entry(entry: &str) -> Option<Self> {
        match entry {
            "create" => Some(Self::Create),
            "modify" => Some(Self::Modify),
            "delete" => Some(Self::Delete),
            "move" => Some(Self::Move),
            _ => None,
        }
    }

    /// Symbol used for this kind in a mask.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Modify => "modify",
            Self::Delete => "delete",
            Self::Move => "move",
        }
    }

    /// Label the notification layer uses for this kind ("created", ...).
    pub fn label(self) -> &'static str {
        match self {
            Self::Create => "created",
            Self::Modify => "modified",
            Self::Delete => "deleted",
            Self::Move => "moved",
        }
    }

    pub(crate) const fn bit(self) -> u8 {
        match self {
            Self::Create => 1,
            Self::Modify => 1 << 1,
            Self::Delete => 1 << 2,
            Self::Move => 1 << 3,
        }
    }
}

/// A single change reported by the notification layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawChangeEvent {
    /// Entry the change concerns.
    pub path: PathBuf,

    /// Kind of change.
    pub kind: ChangeKind,

    /// Whether the entry is a directory.
    pub is_directory: bool,
}

impl RawChangeEvent {
    /// Create a new raw event.
    pub fn new(path: impl Into<PathBuf>, kind: ChangeKind, is_directory: bool) -> Self {
        Self {
            path: path.into(),
            kind,
            is_directory,
        }
    }

    /// The notification layer's label for this change.
    pub fn label(&self) -> &'static str {
        self.kind.label()
    }

    /// Translate a notify event into raw change events.
    ///
    /// Creations, deletions and moves also report the containing directory
    /// as modified, the way directory-granular backends do. Access events
    /// and the destination half of a rename produce nothing.
    pub fn from_notify(event: &notify::Event) -> Vec<Self> {
        let mut out = Vec::new();

        match event.kind {
            notify::EventKind::Create(kind) => {
                for path in &event.paths {
                    let is_directory = match kind {
                        CreateKind::Folder => true,
                        CreateKind::File => false,
                        _ => path.is_dir(),
                    };
                    out.push(Self::new(path, ChangeKind::Create, is_directory));
                    push_parent_modified(&mut out, path);
                }
            }
            notify::EventKind::Remove(kind) => {
                for path in &event.paths {
                    let is_directory = matches!(kind, RemoveKind::Folder);
                    out.push(Self::new(path, ChangeKind::Delete, is_directory));
                    push_parent_modified(&mut out, path);
                }
            }
            notify::EventKind::Modify(ModifyKind::Name(mode)) => match mode {
                RenameMode::From | RenameMode::Any => {
                    if let Some(path) = event.paths.first() {
                        out.push(Self::new(path, ChangeKind::Move, path.is_dir()));
                        push_parent_modified(&mut out, path);
                    }
                }
                RenameMode::Both => {
                    if let [from, to] = event.paths.as_slice()
                        && from.parent() != to.parent()
                    {
                        push_parent_modified(&mut out, to);
                    }
                }
                RenameMode::To | RenameMode::Other => {}
            },
            notify::EventKind::Modify(_) => {
                for path in &event.paths {
                    out.push(Self::new(path, ChangeKind::Modify, path.is_dir()));
                }
            }
            notify::EventKind::Access(_) | notify::EventKind::Any | notify::EventKind::Other => {}
        }

        out
    }
}

fn push_parent_modified(out: &mut Vec<RawChangeEvent>, path: &Path) {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        out.push(RawChangeEvent::new(parent, ChangeKind::Modify, true));
    }
}

/// Event returned from a poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputEvent {
    /// Path the change concerns.
    pub path: String,

    /// Notification layer label ("created", "modified", "deleted", "moved").
    pub change: String,
}

impl From<RawChangeEvent> for OutputEvent {
    fn from(event: RawChangeEvent) -> Self {
        Self {
            change: event.label().to_string(),
            path: event.path.to_string_lossy().into_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, AccessMode, DataChange, EventKind};
    use pretty_assertions::assert_eq;

    fn notify_event(kind: EventKind, paths: &[&str]) -> notify::Event {
        paths
            .iter()
            .fold(notify::Event::new(kind), |event, path| event.add_path(PathBuf::from(path)))
    }

    #[test]
    fn test_mask_entries() {
        assert_eq!(ChangeKind::from_mask_entry("create"), Some(ChangeKind::Create));
        assert_eq!(ChangeKind::from_mask_entry("move"), Some(ChangeKind::Move));
        assert_eq!(ChangeKind::from_mask_entry("created"), None);
        assert_eq!(ChangeKind::from_mask_entry("CREATE"), None);
    }

    #[test]
    fn test_create_reports_parent_modified() {
        let event = notify_event(EventKind::Create(CreateKind::File), &["/watched/dir/a.txt"]);

        assert_eq!(
            RawChangeEvent::from_notify(&event),
            vec![
                RawChangeEvent::new("/watched/dir/a.txt", ChangeKind::Create, false),
                RawChangeEvent::new("/watched/dir", ChangeKind::Modify, true),
            ]
        );
    }

    #[test]
    fn test_remove_folder_is_directory() {
        let event = notify_event(EventKind::Remove(RemoveKind::Folder), &["/watched/sub"]);
        let raw = RawChangeEvent::from_notify(&event);

        assert_eq!(raw[0], RawChangeEvent::new("/watched/sub", ChangeKind::Delete, true));
        assert_eq!(raw.len(), 2);
    }

    #[test]
    fn test_rename_reported_from_source_only() {
        let from = notify_event(
            EventKind::Modify(ModifyKind::Name(RenameMode::From)),
            &["/watched/old.txt"],
        );
        let to = notify_event(
            EventKind::Modify(ModifyKind::Name(RenameMode::To)),
            &["/watched/new.txt"],
        );
        let both = notify_event(
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            &["/watched/old.txt", "/watched/new.txt"],
        );

        assert_eq!(
            RawChangeEvent::from_notify(&from),
            vec![
                RawChangeEvent::new("/watched/old.txt", ChangeKind::Move, false),
                RawChangeEvent::new("/watched", ChangeKind::Modify, true),
            ]
        );
        assert!(RawChangeEvent::from_notify(&to).is_empty());
        assert!(RawChangeEvent::from_notify(&both).is_empty());
    }

    #[test]
    fn test_rename_across_directories_touches_destination() {
        let both = notify_event(
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            &["/watched/a/f.txt", "/watched/b/f.txt"],
        );

        assert_eq!(
            RawChangeEvent::from_notify(&both),
            vec![RawChangeEvent::new("/watched/b", ChangeKind::Modify, true)]
        );
    }

    #[test]
    fn test_access_is_ignored() {
        let event = notify_event(
            EventKind::Access(AccessKind::Close(AccessMode::Write)),
            &["/watched/a.txt"],
        );
        assert!(RawChangeEvent::from_notify(&event).is_empty());

        let data = notify_event(
            EventKind::Modify(ModifyKind::Data(DataChange::Any)),
            &["/watched/a.txt"],
        );
        assert_eq!(
            RawChangeEvent::from_notify(&data),
            vec![RawChangeEvent::new("/watched/a.txt", ChangeKind::Modify, false)]
        );
    }

    #[test]
    fn test_relative_single_component_has_no_parent_event() {
        let event = notify_event(EventKind::Create(CreateKind::File), &["a.txt"]);
        assert_eq!(RawChangeEvent::from_notify(&event).len(), 1);
    }

    #[test]
    fn test_output_event_keeps_native_label() {
        let output = OutputEvent::from(RawChangeEvent::new("/w/a", ChangeKind::Create, false));
        assert_eq!(output.change, "created");

        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json, serde_json::json!({"path": "/w/a", "change": "created"}));
    }
}
