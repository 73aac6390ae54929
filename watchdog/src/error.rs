//! Error types for the watchdog beacon.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for watchdog operations.
pub type Result<T> = std::result::Result<T, WatchdogError>;

/// Errors that can occur in the watchdog beacon.
#[derive(Error, Debug)]
pub enum WatchdogError {
    /// A configured path could not be turned into a watch root.
    #[error("cannot watch {}: {source}", root.display())]
    WatchRoot {
        root: PathBuf,
        #[source]
        source: notify::Error,
    },

    /// Notification backend could not be initialized.
    #[error("notification backend unavailable: {0}")]
    Unavailable(String),

    /// Notify error.
    #[error("notify error: {0}")]
    Notify(#[from] notify::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration fragment was not a mapping.
    #[error("configuration fragment {index} is not a mapping")]
    MalformedFragment { index: usize },

    /// The merged configuration had the wrong shape.
    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),
}
