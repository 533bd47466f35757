//! Reconciliation engine.
//!
//! Drives create, read, update, delete and import of one resource instance
//! against a device session:
//!
//! 1. options are validated and rendered, with no remote side effect
//! 2. a session is opened and the compatibility gate consulted
//! 3. the write cycle runs under the device lock, rolled back on failure
//! 4. the object is read back under the [`ReadGuard`] and parsed
//!
//! Every operation runs in its own `tracing` span carrying a fresh
//! operation id, and returns an [`OperationOutcome`] with the states it went
//! through.

mod drift;
mod state;

pub use drift::DriftReport;
pub use state::{OperationOutcome, OperationState, OperationTrace};

use chrono::Utc;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::compat::CompatibilityGate;
use crate::config::ProviderConfig;
use crate::error::{ConfigError, ProviderError, Result};
use crate::guard::ReadGuard;
use crate::planner::{DiffEngine, PlanExecutor, PlannedAction};
use crate::resource::Resource;
use crate::session::{Session, SessionFactory, SetFileWriter};

/// Offline mode writing lines to a set file instead of a device.
///
/// Creates always go to the file. Updates and login user deletes go to the
/// file only when enabled.
#[derive(Debug, Clone)]
pub struct FakeMode {
    writer: SetFileWriter,
    update_also: bool,
    delete_also: bool,
}

impl FakeMode {
    /// Creates a fake mode writing creates to `writer`.
    #[must_use]
    pub const fn new(writer: SetFileWriter) -> Self {
        Self {
            writer,
            update_also: false,
            delete_also: false,
        }
    }

    /// Also writes updates to the file.
    #[must_use]
    pub const fn with_update_also(mut self, enabled: bool) -> Self {
        self.update_also = enabled;
        self
    }

    /// Also writes deletes to the file.
    #[must_use]
    pub const fn with_delete_also(mut self, enabled: bool) -> Self {
        self.delete_also = enabled;
        self
    }

    /// Builds the fake mode configured in the provider section, if any.
    #[must_use]
    pub fn from_provider(provider: &ProviderConfig) -> Option<Self> {
        provider.fake_create_set_file.as_ref().map(|path| {
            Self::new(SetFileWriter::new(path))
                .with_update_also(provider.fake_update_also)
                .with_delete_also(provider.fake_delete_also)
        })
    }

    /// Builds the fake mode configured in the provider section, failing
    /// when no set file is named.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingSetting`] when
    /// `provider.fake_create_set_file` is unset.
    pub fn required(provider: &ProviderConfig) -> Result<Self> {
        Self::from_provider(provider).ok_or_else(|| {
            ConfigError::MissingSetting {
                setting: String::from("provider.fake_create_set_file"),
                hint: String::from("name a set file in the resources file or pass --set-file"),
            }
            .into()
        })
    }

    /// Returns the set file writer.
    #[must_use]
    pub const fn writer(&self) -> &SetFileWriter {
        &self.writer
    }
}

/// Reconciler for one device.
pub struct Reconciler<F: SessionFactory> {
    /// Opens sessions.
    factory: F,
    /// Shared read lock.
    read_guard: ReadGuard,
    /// Platform compatibility gate.
    gate: CompatibilityGate,
    /// Diff engine for drift checks.
    diff_engine: DiffEngine,
    /// Set-file mode, if enabled.
    fake: Option<FakeMode>,
}

impl<F: SessionFactory> Reconciler<F> {
    /// Creates a reconciler opening sessions with `factory`.
    #[must_use]
    pub const fn new(factory: F, read_guard: ReadGuard) -> Self {
        Self {
            factory,
            read_guard,
            gate: CompatibilityGate::new(),
            diff_engine: DiffEngine::new(),
            fake: None,
        }
    }

    /// Enables set-file mode.
    #[must_use]
    pub fn with_fake_mode(mut self, fake: Option<FakeMode>) -> Self {
        self.fake = fake;
        self
    }

    /// Returns the session factory.
    #[must_use]
    pub const fn factory(&self) -> &F {
        &self.factory
    }

    /// Returns the read guard shared with other reconcilers.
    #[must_use]
    pub const fn read_guard(&self) -> &ReadGuard {
        &self.read_guard
    }

    /// Creates a resource and reads it back.
    ///
    /// # Errors
    ///
    /// Returns a validation or compatibility error before any change, a
    /// transport error, or [`ProviderError::RolledBack`] when the write
    /// cycle failed.
    pub async fn create<R: Resource>(
        &self,
        options: &R::Options,
    ) -> Result<OperationOutcome<R::Options>> {
        let operation_id = Uuid::new_v4().to_string();
        let span = info_span!("create", operation_id = %operation_id, kind = %R::KIND);
        self.create_inner::<R>(operation_id, options)
            .instrument(span)
            .await
    }

    /// Reads a resource from the device.
    ///
    /// The outcome's state is `None` if a login user does not exist.
    ///
    /// # Errors
    ///
    /// Returns a transport or parse error.
    pub async fn read<R: Resource>(&self, id: &str) -> Result<OperationOutcome<R::Options>> {
        let operation_id = Uuid::new_v4().to_string();
        let span = info_span!("read", operation_id = %operation_id, kind = %R::KIND, id);
        self.read_inner::<R>(operation_id, id).instrument(span).await
    }

    /// Replaces a resource: deletes its managed subtree, sets every line
    /// again and reads it back.
    ///
    /// # Errors
    ///
    /// Same as [`Reconciler::create`].
    pub async fn update<R: Resource>(
        &self,
        id: &str,
        options: &R::Options,
    ) -> Result<OperationOutcome<R::Options>> {
        let operation_id = Uuid::new_v4().to_string();
        let span = info_span!("update", operation_id = %operation_id, kind = %R::KIND, id);
        self.update_inner::<R>(operation_id, id, options)
            .instrument(span)
            .await
    }

    /// Deletes a resource. Singletons are left on the device untouched.
    ///
    /// # Errors
    ///
    /// Returns a transport error, or [`ProviderError::RolledBack`] when the
    /// write cycle failed.
    pub async fn delete<R: Resource>(&self, id: &str) -> Result<OperationOutcome<R::Options>> {
        let operation_id = Uuid::new_v4().to_string();
        let span = info_span!("delete", operation_id = %operation_id, kind = %R::KIND, id);
        self.delete_inner::<R>(operation_id, id).instrument(span).await
    }

    /// Imports an existing resource.
    ///
    /// Singletons are imported under their fixed id whatever `id` is given.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::NotFound`] if the object does not exist.
    pub async fn import<R: Resource>(&self, id: &str) -> Result<OperationOutcome<R::Options>> {
        let operation_id = Uuid::new_v4().to_string();
        let span = info_span!("import", operation_id = %operation_id, kind = %R::KIND, id);
        self.import_inner::<R>(operation_id, id).instrument(span).await
    }

    /// Compares desired options with the device.
    ///
    /// # Errors
    ///
    /// Returns a validation error for the desired options, or a transport
    /// or parse error while reading.
    pub async fn check_drift<R: Resource>(
        &self,
        id: &str,
        desired: &R::Options,
    ) -> Result<DriftReport> {
        let operation_id = Uuid::new_v4().to_string();
        let span = info_span!("check_drift", operation_id = %operation_id, kind = %R::KIND, id);
        self.check_drift_inner::<R>(operation_id, id, desired)
            .instrument(span)
            .await
    }

    async fn create_inner<R: Resource>(
        &self,
        operation_id: String,
        options: &R::Options,
    ) -> Result<OperationOutcome<R::Options>> {
        let trace = OperationTrace::new();
        let action = PlannedAction::create::<R>(options)?;
        info!("Creating {} '{}'", R::KIND, action.id);

        if let Some(fake) = &self.fake {
            return Self::write_set_file::<R>(fake, operation_id, action, options, trace).await;
        }

        self.write_cycle::<R>(operation_id, action, trace).await
    }

    async fn update_inner<R: Resource>(
        &self,
        operation_id: String,
        id: &str,
        options: &R::Options,
    ) -> Result<OperationOutcome<R::Options>> {
        let trace = OperationTrace::new();
        let action = PlannedAction::update::<R>(id, options)?;
        info!("Updating {} '{id}'", R::KIND);

        if let Some(fake) = self.fake.as_ref().filter(|fake| fake.update_also) {
            return Self::write_set_file::<R>(fake, operation_id, action, options, trace).await;
        }

        self.write_cycle::<R>(operation_id, action, trace).await
    }

    async fn delete_inner<R: Resource>(
        &self,
        operation_id: String,
        id: &str,
    ) -> Result<OperationOutcome<R::Options>> {
        let mut trace = OperationTrace::new();
        let action = PlannedAction::delete::<R>(id);

        if action.commands.is_empty() {
            info!("{} '{id}' is not removed from the device", R::KIND);
            trace.enter(OperationState::Committed);
            return Ok(OperationOutcome {
                operation_id,
                id: action.id,
                state: None,
                warnings: Vec::new(),
                trace,
            });
        }
        info!("Deleting {} '{id}'", R::KIND);

        if let Some(fake) = self.fake.as_ref().filter(|fake| fake.delete_also) {
            fake.writer.append(&action.commands).await?;
            trace.enter(OperationState::Committed);
            return Ok(OperationOutcome {
                operation_id,
                id: action.id,
                state: None,
                warnings: Vec::new(),
                trace,
            });
        }

        let session = self.open(&mut trace).await?;
        let result = PlanExecutor::new(session.as_ref())
            .execute(&action, &mut trace)
            .await;
        Self::close(session.as_ref(), &mut trace).await;
        let execution = result?;
        log_warnings(&execution.warnings);

        Ok(OperationOutcome {
            operation_id,
            id: action.id,
            state: None,
            warnings: execution.warnings,
            trace,
        })
    }

    async fn import_inner<R: Resource>(
        &self,
        operation_id: String,
        id: &str,
    ) -> Result<OperationOutcome<R::Options>> {
        let id = R::KIND.singleton_id().unwrap_or(id);
        let outcome = self.read_inner::<R>(operation_id, id).await?;
        if outcome.state.is_none() {
            return Err(ProviderError::NotFound {
                kind: R::KIND,
                id: id.to_string(),
            });
        }
        info!("Imported {} '{id}'", R::KIND);
        Ok(outcome)
    }

    async fn check_drift_inner<R: Resource>(
        &self,
        operation_id: String,
        id: &str,
        desired: &R::Options,
    ) -> Result<DriftReport> {
        let desired_lines = R::render(desired)?;
        let outcome = self.read_inner::<R>(operation_id, id).await?;
        let observed_lines = outcome.state.as_ref().map(R::set_lines).transpose()?;

        let diff = self
            .diff_engine
            .compute_diff(&desired_lines, observed_lines.as_ref());
        if diff.has_changes() {
            warn!(
                missing = diff.missing.len(),
                unexpected = diff.unexpected.len(),
                "Drift detected on {} '{id}'",
                R::KIND
            );
        } else {
            info!("{} '{id}' is up to date", R::KIND);
        }

        Ok(DriftReport {
            kind: R::KIND,
            id: id.to_string(),
            checked_at: Utc::now(),
            diff,
        })
    }

    async fn read_inner<R: Resource>(
        &self,
        operation_id: String,
        id: &str,
    ) -> Result<OperationOutcome<R::Options>> {
        let mut trace = OperationTrace::new();
        let session = self.open(&mut trace).await?;
        let result = self.read_state::<R>(session.as_ref(), id, &mut trace).await;
        Self::close(session.as_ref(), &mut trace).await;

        Ok(OperationOutcome {
            operation_id,
            id: id.to_string(),
            state: result?,
            warnings: Vec::new(),
            trace,
        })
    }

    async fn write_cycle<R: Resource>(
        &self,
        operation_id: String,
        action: PlannedAction,
        mut trace: OperationTrace,
    ) -> Result<OperationOutcome<R::Options>> {
        let session = self.open(&mut trace).await?;
        let result = self
            .apply_and_read::<R>(session.as_ref(), &action, &mut trace)
            .await;
        Self::close(session.as_ref(), &mut trace).await;
        let (state, warnings) = result?;
        log_warnings(&warnings);

        Ok(OperationOutcome {
            operation_id,
            id: action.id,
            state,
            warnings,
            trace,
        })
    }

    async fn apply_and_read<R: Resource>(
        &self,
        session: &dyn Session,
        action: &PlannedAction,
        trace: &mut OperationTrace,
    ) -> Result<(Option<R::Options>, Vec<String>)> {
        self.gate
            .check(session.platform_model().as_deref(), R::KIND)?;
        let execution = PlanExecutor::new(session).execute(action, trace).await?;
        let state = self.read_state::<R>(session, &action.id, trace).await?;
        Ok((state, execution.warnings))
    }

    async fn read_state<R: Resource>(
        &self,
        session: &dyn Session,
        id: &str,
        trace: &mut OperationTrace,
    ) -> Result<Option<R::Options>> {
        trace.enter(OperationState::Reading);
        let _permit = self.read_guard.acquire().await;
        let raw = session.execute_command(&R::read_command(id)).await?;
        Ok(R::parse(id, &raw)?)
    }

    async fn write_set_file<R: Resource>(
        fake: &FakeMode,
        operation_id: String,
        action: PlannedAction,
        options: &R::Options,
        mut trace: OperationTrace,
    ) -> Result<OperationOutcome<R::Options>> {
        fake.writer.append(&action.commands).await?;
        trace.enter(OperationState::Committed);
        info!(
            path = %fake.writer.path().display(),
            lines = action.commands.len(),
            "Wrote {} '{}' to set file",
            R::KIND,
            action.id
        );
        Ok(OperationOutcome {
            operation_id,
            id: action.id,
            state: Some(options.clone()),
            warnings: Vec::new(),
            trace,
        })
    }

    async fn open(&self, trace: &mut OperationTrace) -> Result<Box<dyn Session>> {
        let session = self.factory.open().await?;
        trace.enter(OperationState::SessionOpen);
        Ok(session)
    }

    async fn close(session: &dyn Session, trace: &mut OperationTrace) {
        if let Err(e) = session.close().await {
            warn!("Failed to close session: {e}");
        }
        trace.enter(OperationState::SessionClosed);
    }
}

fn log_warnings(warnings: &[String]) {
    for warning in warnings {
        warn!("Device warning: {warning}");
    }
}

impl<F: SessionFactory + std::fmt::Debug> std::fmt::Debug for Reconciler<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("factory", &self.factory)
            .field("fake", &self.fake)
            .finish_non_exhaustive()
    }
}
