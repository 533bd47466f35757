//! Operation states and outcomes.

use serde::Serialize;
use tracing::debug;

/// States an operation moves through.
///
/// Writes go `Idle → SessionOpen → Locked → Diffing → Applying → Committing
/// → Committed | RolledBack → SessionClosed`. Reads go through `Reading`
/// instead of the write states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationState {
    /// Nothing sent yet.
    Idle,
    /// A session is open.
    SessionOpen,
    /// The configuration lock is held.
    Locked,
    /// Lines to send are being planned.
    Diffing,
    /// Lines are being sent.
    Applying,
    /// Commit requested.
    Committing,
    /// The change is committed, or there was nothing to commit.
    Committed,
    /// The candidate configuration was rolled back.
    RolledBack,
    /// Reading configuration back.
    Reading,
    /// The session is closed.
    SessionClosed,
}

impl std::fmt::Display for OperationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::SessionOpen => "session-open",
            Self::Locked => "locked",
            Self::Diffing => "diffing",
            Self::Applying => "applying",
            Self::Committing => "committing",
            Self::Committed => "committed",
            Self::RolledBack => "rolled-back",
            Self::Reading => "reading",
            Self::SessionClosed => "session-closed",
        };
        f.write_str(s)
    }
}

/// Ordered record of the states an operation went through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct OperationTrace {
    states: Vec<OperationState>,
}

impl Default for OperationTrace {
    fn default() -> Self {
        Self::new()
    }
}

impl OperationTrace {
    /// Starts a trace in [`OperationState::Idle`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            states: vec![OperationState::Idle],
        }
    }

    /// Records a transition.
    pub fn enter(&mut self, state: OperationState) {
        debug!(from = %self.current(), to = %state, "State transition");
        self.states.push(state);
    }

    /// Returns the latest state.
    #[must_use]
    pub fn current(&self) -> OperationState {
        self.states
            .last()
            .copied()
            .unwrap_or(OperationState::Idle)
    }

    /// Returns every state in order.
    #[must_use]
    pub fn states(&self) -> &[OperationState] {
        &self.states
    }

    /// Returns true if the operation went through `state`.
    #[must_use]
    pub fn contains(&self, state: OperationState) -> bool {
        self.states.contains(&state)
    }
}

impl std::fmt::Display for OperationTrace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, state) in self.states.iter().enumerate() {
            if i > 0 {
                f.write_str(" -> ")?;
            }
            write!(f, "{state}")?;
        }
        Ok(())
    }
}

/// Result of a reconciler operation.
#[derive(Debug, Clone, Serialize)]
pub struct OperationOutcome<O> {
    /// Operation id, also attached to the operation's log span.
    pub operation_id: String,
    /// Resource id.
    pub id: String,
    /// State read back from the device, or the submitted options in
    /// set-file mode. `None` when the object does not exist.
    pub state: Option<O>,
    /// Commit and rollback warnings reported by the device.
    pub warnings: Vec<String>,
    /// States the operation went through.
    pub trace: OperationTrace,
}
