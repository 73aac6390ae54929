//! Host-facing beacon surface: validate, poll and close.

use std::sync::LazyLock;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::WatchConfig;
use crate::error::{Result, WatchdogError};
use crate::event::OutputEvent;
use crate::supervisor::WatchSupervisor;

/// Name the beacon registers under.
pub const BEACON_NAME: &str = "watchdog";

const VALID_MESSAGE: &str = "Valid beacon configuration";
const NOT_A_MAPPING_MESSAGE: &str = "Configuration for watchdog beacon must be a list of mappings";

/// Outcome of validating a beacon configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Validation {
    pub valid: bool,
    pub message: String,
}

/// A component the host scheduler polls for events.
pub trait Beacon: Send + Sync {
    /// Registered name.
    fn name(&self) -> &'static str;

    /// Check a configuration without acting on it.
    fn validate(&self, config: &[Value]) -> Validation;

    /// Return every event that arrived since the previous poll.
    fn poll(&self, config: &[Value]) -> Result<Vec<OutputEvent>>;

    /// Release whatever the beacon holds.
    fn close(&self, config: &[Value]);
}

/// Whether the notification backend can be used on this host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    Active,
    Inactive(String),
}

impl Availability {
    /// Try to bring up the notification backend once.
    pub fn detect() -> Self {
        match check_backend() {
            Ok(()) => Self::Active,
            Err(e) => Self::Inactive(e.to_string()),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

fn check_backend() -> Result<()> {
    notify::recommended_watcher(|_: notify::Result<notify::Event>| {})
        .map(drop)
        .map_err(|e| WatchdogError::Unavailable(e.to_string()))
}

/// Filesystem change beacon.
#[derive(Default)]
pub struct WatchdogBeacon {
    supervisor: WatchSupervisor,
}

impl WatchdogBeacon {
    /// Create a beacon with no live subscription.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a beacon if the notification backend is available.
    pub fn register() -> Option<Self> {
        match Availability::detect() {
            Availability::Active => Some(Self::new()),
            Availability::Inactive(reason) => {
                info!("{BEACON_NAME} beacon inactive: {reason}");
                None
            }
        }
    }

    pub fn supervisor(&self) -> &WatchSupervisor {
        &self.supervisor
    }
}

impl Beacon for WatchdogBeacon {
    fn name(&self) -> &'static str {
        BEACON_NAME
    }

    fn validate(&self, config: &[Value]) -> Validation {
        if config.iter().all(Value::is_object) {
            Validation {
                valid: true,
                message: VALID_MESSAGE.to_string(),
            }
        } else {
            Validation {
                valid: false,
                message: NOT_A_MAPPING_MESSAGE.to_string(),
            }
        }
    }

    fn poll(&self, config: &[Value]) -> Result<Vec<OutputEvent>> {
        let config = WatchConfig::from_fragments(config)?;
        self.supervisor.ensure(&config)?;

        let events: Vec<OutputEvent> = self
            .supervisor
            .drain()
            .into_iter()
            .map(OutputEvent::from)
            .collect();

        debug!(count = events.len(), "drained watchdog queue");
        Ok(events)
    }

    fn close(&self, _config: &[Value]) {
        self.supervisor.close();
    }
}

static GLOBAL: LazyLock<WatchdogBeacon> = LazyLock::new(WatchdogBeacon::new);

/// Validate against the process-wide beacon.
pub fn validate(config: &[Value]) -> Validation {
    GLOBAL.validate(config)
}

/// Poll the process-wide beacon.
pub fn poll(config: &[Value]) -> Result<Vec<OutputEvent>> {
    GLOBAL.poll(config)
}

/// Close the process-wide beacon.
pub fn close(config: &[Value]) {
    GLOBAL.close(config);
}
