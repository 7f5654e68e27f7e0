//! Append-only audit log stored as JSON lines.
//!
//! Each [`AuditEntry`] is serialized to one line and appended with a single
//! write under an in-process mutex, so concurrent appends are never lost or
//! interleaved. Entries are never rewritten.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::domain::{AuditEntry, DateRange};
use crate::error::GatewayError;

/// File name of the audit log inside the save folder.
pub const AUDIT_LOG_FILE: &str = "database-actions.log";

/// Durable, append-only record of gateway operations.
#[derive(Debug)]
pub struct AuditLog {
    path: PathBuf,
    append_lock: Mutex<()>,
}

impl AuditLog {
    /// Creates a log appending to `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            append_lock: Mutex::new(()),
        }
    }

    /// Creates a log at `<save_folder>/database-actions.log`.
    #[must_use]
    pub fn in_folder(save_folder: &Path) -> Self {
        Self::new(save_folder.join(AUDIT_LOG_FILE))
    }

    /// Returns the log file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one entry.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] if the entry cannot be
    /// serialized or written.
    pub async fn append(&self, entry: &AuditEntry) -> Result<(), GatewayError> {
        let mut line = serde_json::to_vec(entry)
            .map_err(|e| GatewayError::PersistenceError(format!("serialize audit entry: {e}")))?;
        line.push(b'\n');

        let _guard = self.append_lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| self.io_error(&e))?;
        file.write_all(&line).await.map_err(|e| self.io_error(&e))?;
        file.flush().await.map_err(|e| self.io_error(&e))?;

        tracing::debug!(
            collection = %entry.collection_name,
            action = entry.action.as_str(),
            "audit entry appended"
        );
        Ok(())
    }

    /// Returns the entries for `collection`, in append order, optionally
    /// restricted to entries timestamped inside `range`.
    ///
    /// Lines that fail to parse are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] if the log exists but
    /// cannot be read.
    pub async fn query(
        &self,
        collection: &str,
        range: Option<DateRange>,
    ) -> Result<Vec<AuditEntry>, GatewayError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.io_error(&e)),
        };

        let mut entries = Vec::new();
        for (line_no, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<AuditEntry>(line) {
                Ok(entry) => {
                    if entry.collection_name == collection
                        && range.is_none_or(|r| r.contains(entry.timestamp))
                    {
                        entries.push(entry);
                    }
                }
                Err(e) => {
                    tracing::warn!(line = line_no + 1, error = %e, "skipping malformed audit line");
                }
            }
        }
        Ok(entries)
    }

    fn io_error(&self, err: &std::io::Error) -> GatewayError {
        GatewayError::PersistenceError(format!("audit log {}: {err}", self.path.display()))
    }
}
