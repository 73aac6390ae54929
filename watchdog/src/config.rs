//! Configuration types for the watchdog beacon.
//!
//! The host hands over configuration as a list of mapping fragments. They are
//! merged left to right by top-level key, then read as:
//!
//! ```yaml
//! files:
//!   /etc/important_file:
//!     mask: [create, modify]
//!   /var/spool/incoming:
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, WatchdogError};
use crate::event::ChangeKind;

/// Set of change kinds a path is interested in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChangeMask(u8);

impl ChangeMask {
    /// Interested in nothing.
    pub const NONE: Self = Self(0);

    /// Interested in every kind.
    pub const ALL: Self = Self(0b1111);

    /// Build a mask from mask entries, ignoring unrecognized ones.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        entries
            .into_iter()
            .filter_map(|entry| ChangeKind::from_mask_entry(entry.as_ref()))
            .collect()
    }

    /// Add a kind to the mask.
    pub const fn with(self, kind: ChangeKind) -> Self {
        Self(self.0 | kind.bit())
    }

    /// Check whether the mask includes a kind.
    pub const fn contains(self, kind: ChangeKind) -> bool {
        self.0 & kind.bit() != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl FromIterator<ChangeKind> for ChangeMask {
    fn from_iter<T: IntoIterator<Item = ChangeKind>>(iter: T) -> Self {
        iter.into_iter().fold(Self::NONE, Self::with)
    }
}

/// Rule for one configured path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathRule {
    /// Kinds of interest. `None` means all four; an empty list means none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask: Option<Vec<String>>,
}

impl PathRule {
    /// Create a rule with an explicit mask.
    pub fn with_mask<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            mask: Some(entries.into_iter().map(Into::into).collect()),
        }
    }

    /// Resolve the rule into a mask.
    pub fn change_mask(&self) -> ChangeMask {
        match &self.mask {
            Some(entries) => ChangeMask::from_entries(entries),
            None => ChangeMask::ALL,
        }
    }

    /// Mask entries that name no known kind.
    pub fn unrecognized_entries(&self) -> impl Iterator<Item = &str> {
        self.mask
            .iter()
            .flatten()
            .map(String::as_str)
            .filter(|entry| ChangeKind::from_mask_entry(entry).is_none())
    }
}

/// Beacon configuration as written by the host.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BeaconConfig {
    /// Watched paths. A path with no body uses the default rule.
    #[serde(default)]
    pub files: Option<BTreeMap<String, Option<PathRule>>>,
}

impl BeaconConfig {
    /// Merge fragments and read the result.
    pub fn from_fragments(fragments: &[Value]) -> Result<Self> {
        let merged = merge_fragments(fragments)?;
        Ok(serde_json::from_value(Value::Object(merged))?)
    }
}

/// Merge configuration fragments left to right.
///
/// Later fragments replace earlier ones key by key at the top level only; a
/// repeated `files` key replaces the whole mapping.
pub fn merge_fragments(fragments: &[Value]) -> Result<Map<String, Value>> {
    let mut merged = Map::new();

    for (index, fragment) in fragments.iter().enumerate() {
        let Value::Object(map) = fragment else {
            return Err(WatchdogError::MalformedFragment { index });
        };
        for (key, value) in map {
            merged.insert(key.clone(), value.clone());
        }
    }

    Ok(merged)
}

/// Resolved per-path interest, keyed by the exact configured path string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchConfig {
    rules: BTreeMap<String, ChangeMask>,
    ignored: Vec<(String, String)>,
}

impl WatchConfig {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge fragments and resolve them.
    pub fn from_fragments(fragments: &[Value]) -> Result<Self> {
        BeaconConfig::from_fragments(fragments).map(Self::from)
    }

    /// Add a path.
    pub fn with_path(mut self, path: impl Into<String>, mask: ChangeMask) -> Self {
        self.rules.insert(path.into(), mask);
        self
    }

    /// Mask for a configured path.
    pub fn mask_for(&self, path: &str) -> Option<ChangeMask> {
        self.rules.get(path).copied()
    }

    /// Check whether `path` is configured with `kind` in its mask.
    pub fn matches(&self, path: &str, kind: ChangeKind) -> bool {
        self.mask_for(path).is_some_and(|mask| mask.contains(kind))
    }

    /// Configured paths, in sorted order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    /// Whether any configured path is relative to the working directory.
    pub fn has_relative_paths(&self) -> bool {
        self.paths().any(|path| Path::new(path).is_relative())
    }

    /// `(path, entry)` pairs for mask entries that were dropped.
    pub fn ignored_entries(&self) -> &[(String, String)] {
        &self.ignored
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl From<BeaconConfig> for WatchConfig {
    fn from(config: BeaconConfig) -> Self {
        let mut rules = BTreeMap::new();
        let mut ignored = Vec::new();

        for (path, rule) in config.files.unwrap_or_default() {
            let mask = match rule {
                Some(rule) => {
                    ignored.extend(
                        rule.unrecognized_entries()
                            .map(|entry| (path.clone(), entry.to_string())),
                    );
                    rule.change_mask()
                }
                None => ChangeMask::ALL,
            };
            rules.insert(path, mask);
        }

        Self { rules, ignored }
    }
}
