//! Set-file sink for offline runs.

use std::path::{Path, PathBuf};

use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::codec::CommandSet;
use crate::error::Result;

/// Appends configuration lines to a file instead of a device.
#[derive(Debug, Clone)]
pub struct SetFileWriter {
    path: PathBuf,
}

impl SetFileWriter {
    /// Creates a writer for `path`. The file is created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the target path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `lines`, one per line, in order.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be opened or written.
    pub async fn append(&self, lines: &CommandSet) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        let mut content = String::new();
        for line in lines {
            content.push_str(line);
            content.push('\n');
        }
        file.write_all(content.as_bytes()).await?;
        file.flush().await?;

        debug!(path = %self.path.display(), lines = lines.len(), "Appended to set file");
        Ok(())
    }
}
