//! Remote configuration session contract.
//!
//! The transport to the device is not part of this crate. Operations talk to
//! it through [`Session`], obtained from a [`SessionFactory`]:
//! - [`MemoryDevice`]: an in-memory device with candidate and committed
//!   configurations, used for simulation and tests
//! - [`DetachedSessions`]: a factory for offline runs that refuses to connect
//! - [`SetFileWriter`]: the sink used instead of a session in set-file mode

mod memory;
mod set_file;

use async_trait::async_trait;

use crate::error::{Result, TransportError};

pub use memory::{MemoryDevice, MemorySession};
pub use set_file::SetFileWriter;

/// One configuration session with a device.
///
/// A session is owned by a single operation for its whole lifetime and is
/// never shared between operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Session: Send + Sync {
    /// Platform model reported by the device, if known.
    fn platform_model(&self) -> Option<String>;

    /// Takes the exclusive configuration lock.
    async fn lock(&self) -> Result<()>;

    /// Releases the configuration lock.
    async fn unlock(&self) -> Result<()>;

    /// Sends one command line and returns the raw reply.
    async fn execute_command(&self, command: &str) -> Result<String>;

    /// Commits the candidate configuration and returns the device warnings.
    async fn commit(&self, message: &str) -> Result<Vec<String>>;

    /// Discards uncommitted changes and returns the device warnings.
    async fn rollback(&self) -> Result<Vec<String>>;

    /// Closes the session.
    async fn close(&self) -> Result<()>;
}

/// Opens sessions to one device.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    /// Opens a new session.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when the device cannot be reached.
    async fn open(&self) -> Result<Box<dyn Session>>;
}

#[async_trait]
impl<F: SessionFactory + ?Sized> SessionFactory for std::sync::Arc<F> {
    async fn open(&self) -> Result<Box<dyn Session>> {
        (**self).open().await
    }
}

/// Factory used when no device is attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetachedSessions;

#[async_trait]
impl SessionFactory for DetachedSessions {
    async fn open(&self) -> Result<Box<dyn Session>> {
        Err(TransportError::Unavailable {
            message: String::from("no device attached"),
        }
        .into())
    }
}
