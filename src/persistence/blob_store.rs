//! File-backed key → blob store for collection snapshots and view state.
//!
//! Every blob is a pretty-printed JSON file. Saves write a uniquely named
//! temp file in the target directory, fsync it, and rename it over the
//! destination, so a concurrent [`BlobStore::load`] observes either the
//! whole old blob or the whole new one. Saves to the same name race on
//! the rename; the last rename wins.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;

use super::models::DisplaySetting;
use crate::config::GatewayConfig;
use crate::domain::collection_rules::validate_collection_name;
use crate::error::GatewayError;

/// File name of the singleton display setting.
const DISPLAY_SETTING_FILE: &str = "dark-mode.json";

/// Kind of per-collection blob. Each kind lives in its own directory with
/// its own file-name pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlobKind {
    /// Last full fetch of a collection: `LOCAL_DATA_PATH/<name>.json`.
    Snapshot,
    /// Client-side filtered view: `CHANGE_DATA_PATH/<name>Filtered.json`.
    FilterData,
    /// Saved filter selections: `SAVE_FOLDER/<name>-filter-selections.json`.
    FilterSelection,
}

impl BlobKind {
    /// Human-readable kind name used in errors and logs.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Snapshot => "snapshot",
            Self::FilterData => "filter data",
            Self::FilterSelection => "filter selections",
        }
    }

    fn file_name(self, name: &str) -> String {
        match self {
            Self::Snapshot => format!("{name}.json"),
            Self::FilterData => format!("{name}Filtered.json"),
            Self::FilterSelection => format!("{name}-filter-selections.json"),
        }
    }
}

/// Durable blob storage keyed by (kind, collection name).
#[derive(Debug, Clone)]
pub struct BlobStore {
    local_data_path: PathBuf,
    change_data_path: PathBuf,
    save_folder: PathBuf,
}

impl BlobStore {
    /// Creates a store rooted at the three given directories.
    #[must_use]
    pub fn new(
        local_data_path: impl Into<PathBuf>,
        change_data_path: impl Into<PathBuf>,
        save_folder: impl Into<PathBuf>,
    ) -> Self {
        Self {
            local_data_path: local_data_path.into(),
            change_data_path: change_data_path.into(),
            save_folder: save_folder.into(),
        }
    }

    /// Creates a store from the configured directories.
    #[must_use]
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(
            &config.local_data_path,
            &config.change_data_path,
            &config.save_folder,
        )
    }

    /// Creates every blob directory that does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] if a directory cannot be
    /// created.
    pub async fn ensure_dirs(&self) -> Result<(), GatewayError> {
        for dir in [&self.local_data_path, &self.change_data_path, &self.save_folder] {
            if !tokio::fs::try_exists(dir).await.unwrap_or(false) {
                tokio::fs::create_dir_all(dir).await.map_err(|e| {
                    GatewayError::PersistenceError(format!("create {}: {e}", dir.display()))
                })?;
                tracing::info!(dir = %dir.display(), "created directory");
            }
        }
        Ok(())
    }

    /// Returns the file backing `(kind, name)`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] if `name` is not usable as
    /// a file-name stem.
    pub fn path_for(&self, kind: BlobKind, name: &str) -> Result<PathBuf, GatewayError> {
        validate_collection_name(name)?;
        let dir = match kind {
            BlobKind::Snapshot => &self.local_data_path,
            BlobKind::FilterData => &self.change_data_path,
            BlobKind::FilterSelection => &self.save_folder,
        };
        Ok(dir.join(kind.file_name(name)))
    }

    /// Replaces the whole blob stored for `(kind, name)`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] for an unusable name and
    /// [`GatewayError::PersistenceError`] if serialization or the write
    /// fails.
    pub async fn save<T: Serialize + ?Sized>(
        &self,
        kind: BlobKind,
        name: &str,
        blob: &T,
    ) -> Result<(), GatewayError> {
        let path = self.path_for(kind, name)?;
        write_json_atomic(&path, blob).await?;
        tracing::info!(collection = name, kind = kind.label(), "blob saved");
        Ok(())
    }

    /// Loads the last blob saved for `(kind, name)`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::RecordNotFound`] if nothing was ever saved,
    /// [`GatewayError::InvalidRequest`] for an unusable name, and
    /// [`GatewayError::PersistenceError`] if the file cannot be read or
    /// parsed.
    pub async fn load<T: DeserializeOwned>(
        &self,
        kind: BlobKind,
        name: &str,
    ) -> Result<T, GatewayError> {
        let path = self.path_for(kind, name)?;
        read_json(&path).await?.ok_or_else(|| GatewayError::RecordNotFound {
            kind: kind.label(),
            name: name.to_string(),
        })
    }

    /// Replaces the display setting.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] if the write fails.
    pub async fn save_display_setting(&self, setting: DisplaySetting) -> Result<(), GatewayError> {
        write_json_atomic(&self.save_folder.join(DISPLAY_SETTING_FILE), &setting).await
    }

    /// Loads the display setting, falling back to the default when none
    /// has been saved.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] if an existing file
    /// cannot be read or parsed.
    pub async fn load_display_setting(&self) -> Result<DisplaySetting, GatewayError> {
        Ok(read_json(&self.save_folder.join(DISPLAY_SETTING_FILE))
            .await?
            .unwrap_or_default())
    }
}

/// Serializes `value` and atomically replaces `path` with it.
async fn write_json_atomic<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
) -> Result<(), GatewayError> {
    let bytes = serde_json::to_vec_pretty(value)
        .map_err(|e| GatewayError::PersistenceError(format!("serialize blob: {e}")))?;

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| GatewayError::Internal(format!("no file name in {}", path.display())))?;
    let temp_path = path.with_file_name(format!(".{file_name}.{}.tmp", uuid::Uuid::new_v4()));

    let result = write_and_rename(&temp_path, path, &bytes).await;
    if result.is_err() {
        let _ = tokio::fs::remove_file(&temp_path).await;
    }
    result.map_err(|e| GatewayError::PersistenceError(format!("write {}: {e}", path.display())))
}

async fn write_and_rename(temp_path: &Path, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(temp_path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    drop(file);
    tokio::fs::rename(temp_path, path).await
}

/// Reads and parses `path`, returning `None` if it does not exist.
async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, GatewayError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(GatewayError::PersistenceError(format!(
                "read {}: {e}",
                path.display()
            )));
        }
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| GatewayError::PersistenceError(format!("parse {}: {e}", path.display())))
}
