//! In-memory simulated device.
//!
//! Keeps a committed and a candidate configuration as flat statements.
//! The session holding the lock edits and reads the candidate; every other
//! session reads the committed configuration.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tracing::debug;

use crate::codec::{CommandSet, DELETE_PREFIX, OUTPUT_END, OUTPUT_START, SET_PREFIX};
use crate::error::{CommitError, ProviderError, Result, TransportError};

use super::{Session, SessionFactory};

const SHOW_PREFIX: &str = "show configuration ";
const SHOW_SUFFIX: &str = " | display set relative";

#[derive(Debug, Default)]
struct DeviceState {
    model: Option<String>,
    committed: Vec<String>,
    candidate: Vec<String>,
    lock_holder: Option<u64>,
    next_session: u64,
    journal: Vec<String>,
    commit_warnings: Vec<String>,
    fail_next_commit: Option<String>,
    fail_rollback: Option<String>,
    fail_commands: Vec<(String, String)>,
}

impl DeviceState {
    fn view(&self, session: u64) -> &[String] {
        if self.lock_holder == Some(session) {
            &self.candidate
        } else {
            &self.committed
        }
    }

    fn require_lock(&self, session: u64, command: &str) -> Result<()> {
        if self.lock_holder == Some(session) {
            Ok(())
        } else {
            Err(TransportError::command(command, "configuration database not locked").into())
        }
    }
}

/// A simulated Junos device.
///
/// Cloning yields another handle to the same device.
#[derive(Debug, Clone, Default)]
pub struct MemoryDevice {
    state: Arc<Mutex<DeviceState>>,
}

impl MemoryDevice {
    /// Creates an empty device with no platform model.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the platform model reported by sessions.
    #[must_use]
    pub fn with_model(self, model: impl Into<String>) -> Self {
        self.state().model = Some(model.into());
        self
    }

    /// Sets warnings reported by every commit, rejected or not.
    #[must_use]
    pub fn with_commit_warnings(self, warnings: Vec<String>) -> Self {
        self.state().commit_warnings = warnings;
        self
    }

    /// Makes the next commit fail with `message`.
    pub fn fail_next_commit(&self, message: impl Into<String>) {
        self.state().fail_next_commit = Some(message.into());
    }

    /// Makes every rollback fail with `message`.
    pub fn fail_rollback(&self, message: impl Into<String>) {
        self.state().fail_rollback = Some(message.into());
    }

    /// Makes commands containing `pattern` fail with `message`.
    pub fn fail_commands_containing(&self, pattern: impl Into<String>, message: impl Into<String>) {
        self.state()
            .fail_commands
            .push((pattern.into(), message.into()));
    }

    /// Applies `set`/`delete` lines directly to the committed configuration,
    /// as another administrator would.
    pub fn apply_out_of_band(&self, lines: &CommandSet) {
        let mut state = self.state();
        for line in lines {
            apply_line(&mut state.committed, line);
        }
    }

    /// Returns the committed configuration.
    #[must_use]
    pub fn committed(&self) -> Vec<String> {
        self.state().committed.clone()
    }

    /// Returns every call received so far, in order.
    #[must_use]
    pub fn journal(&self) -> Vec<String> {
        self.state().journal.clone()
    }

    /// Forgets the recorded calls.
    pub fn clear_journal(&self) {
        self.state().journal.clear();
    }

    /// Returns true while a session holds the configuration lock.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.state().lock_holder.is_some()
    }

    fn state(&self) -> MutexGuard<'_, DeviceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl SessionFactory for MemoryDevice {
    async fn open(&self) -> Result<Box<dyn Session>> {
        let id = {
            let mut state = self.state();
            state.next_session += 1;
            state.journal.push(String::from("open"));
            state.next_session
        };
        debug!(session = id, "Opened simulated session");
        Ok(Box::new(MemorySession {
            id,
            device: self.clone(),
            closed: AtomicBool::new(false),
        }))
    }
}

/// A session on a [`MemoryDevice`].
#[derive(Debug)]
pub struct MemorySession {
    id: u64,
    device: MemoryDevice,
    closed: AtomicBool,
}

impl MemorySession {
    fn state(&self) -> Result<MutexGuard<'_, DeviceState>> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::Closed.into());
        }
        Ok(self.device.state())
    }
}

#[async_trait]
impl Session for MemorySession {
    fn platform_model(&self) -> Option<String> {
        self.device.state().model.clone()
    }

    async fn lock(&self) -> Result<()> {
        let mut state = self.state()?;
        state.journal.push(String::from("lock"));
        match state.lock_holder {
            Some(holder) if holder != self.id => Err(TransportError::Lock {
                message: format!("configuration database locked by session {holder}"),
            }
            .into()),
            _ => {
                state.lock_holder = Some(self.id);
                state.candidate = state.committed.clone();
                Ok(())
            }
        }
    }

    async fn unlock(&self) -> Result<()> {
        let mut state = self.state()?;
        state.journal.push(String::from("unlock"));
        if state.lock_holder == Some(self.id) {
            state.lock_holder = None;
            state.candidate.clear();
        }
        Ok(())
    }

    async fn execute_command(&self, command: &str) -> Result<String> {
        let mut state = self.state()?;
        state.journal.push(command.to_string());
        debug!(session = self.id, command, "Simulated command");

        if let Some((_, message)) = state
            .fail_commands
            .iter()
            .find(|(pattern, _)| command.contains(pattern.as_str()))
        {
            return Err(TransportError::command(command, message.clone()).into());
        }

        if command.starts_with(SET_PREFIX) || command.starts_with(DELETE_PREFIX) {
            state.require_lock(self.id, command)?;
            apply_line(&mut state.candidate, command);
            return Ok(String::new());
        }

        if let Some(path) = command
            .strip_prefix(SHOW_PREFIX)
            .and_then(|rest| rest.strip_suffix(SHOW_SUFFIX))
        {
            return Ok(show(state.view(self.id), path));
        }

        Err(TransportError::command(command, "syntax error").into())
    }

    async fn commit(&self, message: &str) -> Result<Vec<String>> {
        let mut state = self.state()?;
        state.journal.push(format!("commit {message}"));
        state.require_lock(self.id, "commit")?;
        if let Some(reason) = state.fail_next_commit.take() {
            return Err(CommitError::rejected(reason)
                .with_warnings(state.commit_warnings.clone())
                .into());
        }
        state.committed = state.candidate.clone();
        Ok(state.commit_warnings.clone())
    }

    async fn rollback(&self) -> Result<Vec<String>> {
        let mut state = self.state()?;
        state.journal.push(String::from("rollback"));
        if let Some(reason) = state.fail_rollback.clone() {
            return Err(TransportError::command("rollback", reason).into());
        }
        if state.lock_holder == Some(self.id) {
            state.candidate = state.committed.clone();
        }
        Ok(Vec::new())
    }

    async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(ProviderError::Transport(TransportError::Closed));
        }
        let mut state = self.device.state();
        state.journal.push(String::from("close"));
        if state.lock_holder == Some(self.id) {
            state.lock_holder = None;
            state.candidate.clear();
        }
        Ok(())
    }
}

/// Applies one `set` or `delete` line to a flat configuration.
fn apply_line(config: &mut Vec<String>, line: &str) {
    if let Some(statement) = line.strip_prefix(SET_PREFIX) {
        if !config.iter().any(|existing| existing == statement) {
            config.push(statement.to_string());
        }
    } else if let Some(path) = line.strip_prefix(DELETE_PREFIX) {
        config.retain(|existing| !is_under(existing, path));
    }
}

/// Renders the statements under `path` relative to it, framed by markers.
fn show(config: &[String], path: &str) -> String {
    let mut reply = format!("\n{OUTPUT_START}\n");
    for statement in config {
        if let Some(relative) = statement
            .strip_prefix(path)
            .and_then(|rest| rest.strip_prefix(' '))
        {
            reply.push_str(SET_PREFIX);
            reply.push_str(relative);
            reply.push('\n');
        }
    }
    reply.push_str(OUTPUT_END);
    reply.push('\n');
    reply
}

fn is_under(statement: &str, path: &str) -> bool {
    statement
        .strip_prefix(path)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(' '))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(statements: &[&str]) -> CommandSet {
        let mut set = CommandSet::new();
        for statement in statements {
            set.set(statement);
        }
        set
    }

    #[tokio::test]
    async fn test_candidate_visible_only_to_lock_holder() {
        let device = MemoryDevice::new();
        let writer = device.open().await.unwrap();
        let reader = device.open().await.unwrap();

        writer.lock().await.unwrap();
        writer
            .execute_command("set system root-authentication no-public-keys")
            .await
            .unwrap();

        let show = "show configuration system root-authentication | display set relative";
        assert!(writer.execute_command(show).await.unwrap().contains("set no-public-keys"));
        assert!(!reader.execute_command(show).await.unwrap().contains("no-public-keys"));

        writer.commit("test").await.unwrap();
        assert!(reader.execute_command(show).await.unwrap().contains("set no-public-keys"));
    }

    #[tokio::test]
    async fn test_second_lock_refused() {
        let device = MemoryDevice::new();
        let first = device.open().await.unwrap();
        let second = device.open().await.unwrap();

        first.lock().await.unwrap();
        let err = second.lock().await.unwrap_err();
        assert!(matches!(err, ProviderError::Transport(TransportError::Lock { .. })));

        first.close().await.unwrap();
        assert!(!device.is_locked());
        second.lock().await.unwrap();
    }

    #[tokio::test]
    async fn test_set_requires_lock() {
        let device = MemoryDevice::new();
        let session = device.open().await.unwrap();
        assert!(session.execute_command("set system host-name r1").await.is_err());
    }

    #[tokio::test]
    async fn test_rollback_discards_candidate() {
        let device = MemoryDevice::new();
        device.apply_out_of_band(&lines(&["system host-name r1"]));
        let session = device.open().await.unwrap();

        session.lock().await.unwrap();
        session.execute_command("delete system").await.unwrap();
        session.rollback().await.unwrap();
        session.commit("noop").await.unwrap();

        assert_eq!(device.committed(), ["system host-name r1"]);
    }

    #[tokio::test]
    async fn test_injected_commit_failure() {
        let device = MemoryDevice::new();
        device.fail_next_commit("commit check failed");
        let session = device.open().await.unwrap();
        session.lock().await.unwrap();

        let err = session.commit("x").await.unwrap_err();
        assert!(matches!(err, ProviderError::Commit(_)));
        assert!(session.commit("x").await.is_ok());
    }

    #[tokio::test]
    async fn test_closed_session_rejects_calls() {
        let device = MemoryDevice::new();
        let session = device.open().await.unwrap();
        session.close().await.unwrap();
        assert!(matches!(
            session.lock().await,
            Err(ProviderError::Transport(TransportError::Closed))
        ));
    }

    #[test]
    fn test_delete_removes_subtree_at_token_boundary() {
        let mut config = vec![
            String::from("system login user ops class super-user"),
            String::from("system login user ops2 class read-only"),
        ];
        apply_line(&mut config, "delete system login user ops");
        assert_eq!(config, ["system login user ops2 class read-only"]);
    }

    #[test]
    fn test_show_is_relative_and_framed() {
        let config = vec![
            String::from("security ike traceoptions flag all"),
            String::from("securityx other"),
        ];
        let reply = show(&config, "security");
        assert_eq!(
            reply,
            "\n<configuration-output>\nset ike traceoptions flag all\n</configuration-output>\n"
        );
    }
}
