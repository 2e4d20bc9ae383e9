//! JSON file persistence shared by the identity cache and the daily snapshot

use crate::error::{StorageError, StorageResult};
use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;
use tokio::{
    fs as tokio_fs,
    io::{AsyncReadExt, AsyncWriteExt},
};
use tracing::{debug, instrument};

/// Reads and deserializes a JSON file.
///
/// Returns `Ok(None)` when the file does not exist so callers can start empty.
#[instrument]
pub async fn read_json<T: DeserializeOwned>(path: &Path) -> StorageResult<Option<T>> {
    let mut file = match tokio_fs::File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StorageError::FileRead(path.to_path_buf(), e)),
    };

    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .await
        .map_err(|e| StorageError::FileRead(path.to_path_buf(), e))?;

    serde_json::from_str(&contents)
        .map(Some)
        .map_err(|e| StorageError::Deserialization(path.to_path_buf(), e))
}

/// Serializes `value` as pretty JSON and replaces `path` atomically.
#[instrument(skip(value))]
pub async fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> StorageResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio_fs::create_dir_all(parent)
            .await
            .map_err(|e| StorageError::DirectoryCreate(parent.to_path_buf(), e))?;
    }

    let json = serde_json::to_string_pretty(value)
        .map_err(|e| StorageError::Serialization(path.to_path_buf(), e))?;

    let temp_path = path.with_extension("tmp");
    let mut file = tokio_fs::File::create(&temp_path)
        .await
        .map_err(|e| StorageError::FileWrite(temp_path.clone(), e))?;

    file.write_all(json.as_bytes())
        .await
        .map_err(|e| StorageError::FileWrite(temp_path.clone(), e))?;

    file.sync_all()
        .await
        .map_err(|e| StorageError::FileWrite(temp_path.clone(), e))?;

    tokio_fs::rename(&temp_path, path)
        .await
        .map_err(|e| StorageError::FileRename(temp_path, path.to_path_buf(), e))?;

    debug!("Wrote {}", path.display());
    Ok(())
}
