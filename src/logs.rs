//! Instructor log export.

use std::path::Path;

use tracing::{info, warn};

use crate::backend::ChatBackend;
use crate::error::LogDownloadError;

pub const MSG_MISSING_SECRET: &str = "Please enter the secret key to download logs.";
pub const MSG_SUCCESS: &str = "Logs downloaded successfully.";
pub const MSG_FAILURE: &str = "Failed to download logs. Check secret key.";

/// Downloads the backend's student logs and writes them to disk.
pub struct LogExporter<'a, B> {
    backend: &'a B,
}

impl<'a, B: ChatBackend> LogExporter<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    /// Fetch the logs with `secret` and write them to `path`.
    ///
    /// Returns the number of bytes written.
    pub async fn export(&self, secret: &str, path: &Path) -> Result<usize, LogDownloadError> {
        if secret.trim().is_empty() {
            return Err(LogDownloadError::MissingSecret);
        }
        let bytes = self.backend.download_logs(secret).await.map_err(|e| {
            warn!(error = %e, "log download failed");
            e
        })?;
        tokio::fs::write(path, &bytes)
            .await
            .map_err(|source| LogDownloadError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        info!(path = %path.display(), bytes = bytes.len(), "student logs written");
        Ok(bytes.len())
    }
}

/// User-facing status line for an export result.
pub fn status_message(result: &Result<usize, LogDownloadError>) -> &'static str {
    match result {
        Ok(_) => MSG_SUCCESS,
        Err(LogDownloadError::MissingSecret) => MSG_MISSING_SECRET,
        Err(_) => MSG_FAILURE,
    }
}
