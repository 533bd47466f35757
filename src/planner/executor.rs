//! Transactional write cycle.
//!
//! One planned action is applied as: lock, send every line in order, commit,
//! unlock. Any failure after the lock is taken is followed by a rollback of
//! the candidate configuration, and the rollback outcome is reported with
//! the original error.

use tracing::{debug, error, info, warn};

use crate::error::{ProviderError, Result};
use crate::reconciler::{OperationState, OperationTrace};
use crate::session::Session;

use super::plan::PlannedAction;

/// Applies planned actions on one session.
pub struct PlanExecutor<'a> {
    /// Session owned by the current operation.
    session: &'a dyn Session,
}

/// Result of a successful write cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Lines sent to the device.
    pub applied: usize,
    /// Warnings returned by the commit.
    pub warnings: Vec<String>,
}

impl<'a> PlanExecutor<'a> {
    /// Creates an executor on `session`.
    #[must_use]
    pub const fn new(session: &'a dyn Session) -> Self {
        Self { session }
    }

    /// Runs one write cycle for `action`.
    ///
    /// Actions without lines commit nothing and never take the lock.
    ///
    /// # Errors
    ///
    /// Returns the lock error as-is, or [`ProviderError::RolledBack`] when a
    /// line or the commit failed after the lock was taken.
    pub async fn execute(
        &self,
        action: &PlannedAction,
        trace: &mut OperationTrace,
    ) -> Result<ExecutionResult> {
        if action.commands.is_empty() {
            debug!("Nothing to apply for {}", action.description());
            trace.enter(OperationState::Committed);
            return Ok(ExecutionResult::default());
        }

        self.session.lock().await?;
        trace.enter(OperationState::Locked);

        trace.enter(OperationState::Diffing);
        debug!(lines = action.commands.len(), "{}", action.description());

        match self.apply_and_commit(action, trace).await {
            Ok(warnings) => {
                trace.enter(OperationState::Committed);
                info!(
                    lines = action.commands.len(),
                    "Committed: {}",
                    action.commit_message()
                );
                self.unlock().await;
                Ok(ExecutionResult {
                    applied: action.commands.len(),
                    warnings,
                })
            }
            Err(cause) => {
                error!("Write cycle failed, rolling back: {cause}");
                let mut warnings = cause.warnings().to_vec();
                let rollback = match self.session.rollback().await {
                    Ok(rollback_warnings) => {
                        for warning in &rollback_warnings {
                            warn!("Rollback warning: {warning}");
                        }
                        warnings.extend(rollback_warnings);
                        None
                    }
                    Err(e) => {
                        error!("Rollback failed: {e}");
                        Some(e)
                    }
                };
                trace.enter(OperationState::RolledBack);
                self.unlock().await;
                Err(ProviderError::rolled_back(cause, rollback, warnings))
            }
        }
    }

    async fn apply_and_commit(
        &self,
        action: &PlannedAction,
        trace: &mut OperationTrace,
    ) -> Result<Vec<String>> {
        trace.enter(OperationState::Applying);
        for line in &action.commands {
            debug!("Applying: {line}");
            self.session.execute_command(line).await?;
        }

        trace.enter(OperationState::Committing);
        self.session.commit(&action.commit_message()).await
    }

    async fn unlock(&self) {
        if let Err(e) = self.session.unlock().await {
            warn!("Failed to release configuration lock: {e}");
        }
    }
}

impl std::fmt::Debug for PlanExecutor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanExecutor").finish_non_exhaustive()
    }
}

impl std::fmt::Display for ExecutionResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Applied {} lines", self.applied)?;
        if !self.warnings.is_empty() {
            write!(f, " ({} warnings)", self.warnings.len())?;
        }
        Ok(())
    }
}
