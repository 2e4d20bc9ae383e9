//! Host-owned per-player stat files.
//!
//! Each known player has a `<uuid>.json` file holding
//! `stats["minecraft:custom"]["minecraft:play_time"]`. One unreadable file
//! never prevents the others from being read.

use crate::error::{StorageError, StorageResult};
use crate::types::{PlayerId, StatRecord};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs as tokio_fs;
use tracing::{debug, error, instrument};

const CUSTOM_STATS_KEY: &str = "minecraft:custom";
const PLAY_TIME_KEY: &str = "minecraft:play_time";

/// Read access to the persisted activity counters of all known players
#[async_trait]
pub trait StatStore: Send + Sync {
    /// Every readable record, in a deterministic order.
    async fn records(&self) -> Vec<StatRecord>;
}

/// Stat store reading a directory of JSON stat files
#[derive(Debug, Clone)]
pub struct JsonStatStore {
    dir: PathBuf,
}

impl JsonStatStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn stat_files(&self) -> StorageResult<Vec<PathBuf>> {
        let mut entries = match tokio_fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::DirectoryRead(self.dir.clone(), e)),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::DirectoryRead(self.dir.clone(), e))?
        {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some("json") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

#[async_trait]
impl StatStore for JsonStatStore {
    async fn records(&self) -> Vec<StatRecord> {
        let files = match self.stat_files().await {
            Ok(files) => files,
            Err(e) => {
                error!("Error listing stat files: {}", e);
                return Vec::new();
            }
        };

        let mut records = Vec::with_capacity(files.len());
        for path in files {
            match read_stat_file(&path).await {
                Ok(Some(record)) => records.push(record),
                Ok(None) => debug!("No play time recorded in {}", path.display()),
                Err(e) => error!("Error reading stat file: {}", e),
            }
        }
        records
    }
}

/// Reads one stat file. `Ok(None)` when the file has no play time counter.
#[instrument]
pub async fn read_stat_file(path: &Path) -> StorageResult<Option<StatRecord>> {
    let id = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .and_then(|stem| PlayerId::from_str(stem).ok())
        .ok_or_else(|| StorageError::InvalidFileName(path.to_path_buf()))?;

    let contents = tokio_fs::read_to_string(path)
        .await
        .map_err(|e| StorageError::FileRead(path.to_path_buf(), e))?;

    let body: Value = serde_json::from_str(&contents)
        .map_err(|e| StorageError::Deserialization(path.to_path_buf(), e))?;

    Ok(play_time_ticks(&body).map(|activity_ticks| StatRecord { id, activity_ticks }))
}

/// Extracts the play time counter from a parsed stat file.
pub fn play_time_ticks(body: &Value) -> Option<u64> {
    let counter = body
        .get("stats")?
        .get(CUSTOM_STATS_KEY)?
        .get(PLAY_TIME_KEY)?;

    counter
        .as_u64()
        .or_else(|| counter.as_f64().filter(|v| *v >= 0.0).map(|v| v as u64))
}

/// Stat store held in memory, for hosts that keep counters themselves
#[derive(Debug, Default)]
pub struct InMemoryStatStore {
    records: RwLock<Vec<StatRecord>>,
}

impl InMemoryStatStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the counter for `id`.
    pub fn set(&self, id: PlayerId, activity_ticks: u64) {
        let mut records = self.records.write();
        match records.iter_mut().find(|r| r.id == id) {
            Some(record) => record.activity_ticks = activity_ticks,
            None => records.push(StatRecord { id, activity_ticks }),
        }
    }
}

#[async_trait]
impl StatStore for InMemoryStatStore {
    async fn records(&self) -> Vec<StatRecord> {
        self.records.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn write_stats(dir: &Path, name: &str, body: &str) {
        tokio::fs::write(dir.join(name), body).await.unwrap();
    }

    #[tokio::test]
    async fn test_reads_sorted_records_and_skips_bad_files() {
        let dir = TempDir::new().unwrap();
        let a = "0a000000-0000-4000-8000-000000000000";
        let b = "0b000000-0000-4000-8000-000000000000";
        let c = "0c000000-0000-4000-8000-000000000000";

        write_stats(
            dir.path(),
            &format!("{b}.json"),
            r#"{"stats":{"minecraft:custom":{"minecraft:play_time":72000}}}"#,
        )
        .await;
        write_stats(
            dir.path(),
            &format!("{a}.json"),
            r#"{"stats":{"minecraft:custom":{"minecraft:play_time":144000}}}"#,
        )
        .await;
        // Corrupt, no counter, bad name, wrong extension.
        write_stats(dir.path(), &format!("{c}.json"), "{{{").await;
        write_stats(
            dir.path(),
            "0d000000-0000-4000-8000-000000000000.json",
            r#"{"stats":{"minecraft:mined":{}}}"#,
        )
        .await;
        write_stats(dir.path(), "level.json", r#"{"stats":{}}"#).await;
        write_stats(dir.path(), "notes.txt", "hello").await;

        let store = JsonStatStore::new(dir.path());
        let records = store.records().await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id.to_string(), a);
        assert_eq!(records[0].activity_ticks, 144_000);
        assert_eq!(records[1].id.to_string(), b);
    }

    #[tokio::test]
    async fn test_missing_directory_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonStatStore::new(dir.path().join("stats"));
        assert!(store.records().await.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_file_name_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("level.json");
        tokio::fs::write(&path, "{}").await.unwrap();
        assert!(matches!(
            read_stat_file(&path).await,
            Err(StorageError::InvalidFileName(_))
        ));
    }

    #[tokio::test]
    async fn test_in_memory_store_replaces_counters() {
        let store = InMemoryStatStore::new();
        let id = PlayerId::new();
        store.set(id, 10);
        store.set(id, 20);
        let records = store.records().await;
        assert_eq!(records, vec![StatRecord { id, activity_ticks: 20 }]);
    }
}
