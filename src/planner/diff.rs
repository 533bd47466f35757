//! Diff engine comparing desired and observed configuration lines.
//!
//! Both sides are compared as sets of `set` statements: ordering on the
//! device is not significant, and a statement repeated on one side counts
//! once.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::debug;

use crate::codec::CommandSet;
use crate::config::ConfigHasher;

/// Engine for computing diffs between desired and observed lines.
#[derive(Debug, Default)]
pub struct DiffEngine {
    /// Fingerprint hasher.
    hasher: ConfigHasher,
}

/// Difference for a single resource instance.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceDiff {
    /// Type of difference.
    pub diff_type: DiffType,
    /// Desired lines absent from the device, in desired order.
    pub missing: Vec<String>,
    /// Device lines not in the desired set, in device order.
    pub unexpected: Vec<String>,
    /// Fingerprint of the desired lines.
    pub desired_hash: String,
    /// Fingerprint of the observed lines, if the object exists.
    pub observed_hash: Option<String>,
}

/// Type of difference detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffType {
    /// The object does not exist on the device.
    Create,
    /// The device matches the desired lines.
    NoChange,
    /// The object exists but its lines differ.
    Drift,
}

impl DiffEngine {
    /// Creates a new diff engine.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            hasher: ConfigHasher::new(),
        }
    }

    /// Compares desired lines with the lines rendered from device state.
    ///
    /// `observed` is `None` when the object does not exist.
    #[must_use]
    pub fn compute_diff(&self, desired: &CommandSet, observed: Option<&CommandSet>) -> ResourceDiff {
        let desired_hash = self.hasher.hash_lines(desired);

        let Some(observed) = observed else {
            debug!(lines = desired.len(), "Object absent on device");
            return ResourceDiff {
                diff_type: DiffType::Create,
                missing: dedup_in_order(desired.iter()),
                unexpected: Vec::new(),
                desired_hash,
                observed_hash: None,
            };
        };

        let desired_set: BTreeSet<&str> = desired.iter().map(String::as_str).collect();
        let observed_set: BTreeSet<&str> = observed.iter().map(String::as_str).collect();

        let missing = dedup_in_order(desired.iter().filter(|l| !observed_set.contains(l.as_str())));
        let unexpected =
            dedup_in_order(observed.iter().filter(|l| !desired_set.contains(l.as_str())));

        let diff_type = if missing.is_empty() && unexpected.is_empty() {
            DiffType::NoChange
        } else {
            DiffType::Drift
        };
        debug!(
            missing = missing.len(),
            unexpected = unexpected.len(),
            "Computed diff: {diff_type}"
        );

        ResourceDiff {
            diff_type,
            missing,
            unexpected,
            desired_hash,
            observed_hash: Some(self.hasher.hash_lines(observed)),
        }
    }
}

fn dedup_in_order<'a>(lines: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut unique = Vec::new();
    for line in lines {
        if seen.insert(line.as_str()) {
            unique.push(line.clone());
        }
    }
    unique
}

impl ResourceDiff {
    /// Returns true if the device differs from the desired lines.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.diff_type != DiffType::NoChange
    }
}

impl std::fmt::Display for DiffType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Create => "create",
            Self::NoChange => "no change",
            Self::Drift => "drift",
        };
        write!(f, "{s}")
    }
}

impl std::fmt::Display for ResourceDiff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.diff_type)?;
        for line in &self.missing {
            writeln!(f, "  + {line}")?;
        }
        for line in &self.unexpected {
            writeln!(f, "  - {line}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commands(lines: &[&str]) -> CommandSet {
        let mut set = CommandSet::new();
        for line in lines {
            set.set(line);
        }
        set
    }

    #[test]
    fn test_absent_object_is_create() {
        let desired = commands(&["system host-name r1"]);
        let diff = DiffEngine::new().compute_diff(&desired, None);

        assert_eq!(diff.diff_type, DiffType::Create);
        assert_eq!(diff.missing, ["set system host-name r1"]);
        assert!(diff.observed_hash.is_none());
    }

    #[test]
    fn test_reordered_lines_are_no_change() {
        let desired = commands(&["a 1", "b 2"]);
        let observed = commands(&["b 2", "a 1"]);
        let diff = DiffEngine::new().compute_diff(&desired, Some(&observed));

        assert_eq!(diff.diff_type, DiffType::NoChange);
        assert!(!diff.has_changes());
        assert_eq!(Some(diff.desired_hash), diff.observed_hash);
    }

    #[test]
    fn test_drift_lists_both_sides() {
        let desired = commands(&["flag all", "rate-limit 100"]);
        let observed = commands(&["flag all", "rate-limit 50", "no-remote-trace"]);
        let diff = DiffEngine::new().compute_diff(&desired, Some(&observed));

        assert_eq!(diff.diff_type, DiffType::Drift);
        assert_eq!(diff.missing, ["set rate-limit 100"]);
        assert_eq!(diff.unexpected, ["set rate-limit 50", "set no-remote-trace"]);
    }
}
