//! # Watchdog Beacon
//!
//! This crate watches configured files and directories and turns matching
//! filesystem changes into events a host scheduler drains by polling.
//!
//! ## Features
//!
//! - **Per-path Masks**: Each path picks the changes it cares about
//! - **Parent Propagation**: A file change also counts for its configured directory
//! - **Lazy Subscription**: One watch is created on first poll and reused
//! - **Ordered Queue**: Events are returned in arrival order, exactly once
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Watchdog Beacon                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  poll(fragments) ──► WatchConfig ──► WatchSupervisor            │
//! │                                          │                      │
//! │  notify ──► EventFilter ──► EventQueue ◄─┘ drain ──► OutputEvent│
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod beacon;
pub mod config;
pub mod error;
pub mod event;
pub mod filter;
pub mod queue;
pub mod supervisor;

pub use beacon::{
    Availability, BEACON_NAME, Beacon, Validation, WatchdogBeacon, close, poll, validate,
};
pub use config::{BeaconConfig, ChangeMask, PathRule, WatchConfig, merge_fragments};
pub use error::{Result, WatchdogError};
pub use event::{ChangeKind, OutputEvent, RawChangeEvent};
pub use filter::EventFilter;
pub use queue::{EventQueue, EventSink};
pub use supervisor::{WatchSupervisor, watch_root};
