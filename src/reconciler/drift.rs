//! Drift reports.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::planner::{DiffType, ResourceDiff};
use crate::resource::ResourceKind;

/// Comparison of desired options with the state read from the device.
#[derive(Debug, Clone, Serialize)]
pub struct DriftReport {
    /// Resource kind.
    pub kind: ResourceKind,
    /// Resource id.
    pub id: String,
    /// When the device was read.
    pub checked_at: DateTime<Utc>,
    /// Line-level difference.
    pub diff: ResourceDiff,
}

impl DriftReport {
    /// Returns true if the device does not match the desired options.
    #[must_use]
    pub fn has_drift(&self) -> bool {
        self.diff.has_changes()
    }

    /// Returns true if the object is missing on the device.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        self.diff.diff_type == DiffType::Create
    }
}

impl std::fmt::Display for DriftReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} '{}': {}", self.kind, self.id, self.diff)
    }
}
