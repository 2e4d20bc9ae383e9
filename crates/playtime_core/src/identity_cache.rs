//! Durable mapping of player identifier to last known display name.
//!
//! The cache is written through on every confirmed resolution that did not
//! come from the cache itself and on every login. Entries are never removed.

use crate::error::StorageResult;
use crate::storage::{read_json, write_json_atomic};
use crate::types::PlayerId;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{error, info, warn};

/// Identity cache backed by a flat `{ "<uuid>": "<name>" }` JSON file
#[derive(Debug)]
pub struct IdentityCache {
    path: PathBuf,
    names: RwLock<HashMap<PlayerId, String>>,
}

impl IdentityCache {
    /// Create an empty cache that persists to `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            names: RwLock::new(HashMap::new()),
        }
    }

    /// Load the cache from disk.
    ///
    /// A missing file yields an empty cache. A corrupt file is logged and
    /// also yields an empty cache; entries with invalid identifiers are skipped.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let cache = Self::new(path);
        let raw: Option<BTreeMap<String, String>> = match read_json(&cache.path).await {
            Ok(raw) => raw,
            Err(e) => {
                error!("Error loading username cache, starting empty: {}", e);
                None
            }
        };

        if let Some(raw) = raw {
            let mut names = cache.names.write().await;
            for (key, name) in raw {
                match PlayerId::from_str(&key) {
                    Ok(id) if !name.is_empty() => {
                        names.insert(id, name);
                    }
                    Ok(_) => warn!("Empty username in cache for {}", key),
                    Err(_) => warn!("Invalid UUID in cache: {}", key),
                }
            }
            info!("Loaded username cache with {} entries", names.len());
        }

        cache
    }

    /// Backing file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Look up the cached name for `id`
    pub async fn get(&self, id: &PlayerId) -> Option<String> {
        self.names.read().await.get(id).cloned()
    }

    /// Number of cached identities
    pub async fn len(&self) -> usize {
        self.names.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.names.read().await.is_empty()
    }

    /// Store `name` for `id` and persist the cache.
    ///
    /// Persistence failures are logged; the in-memory entry is kept either way.
    pub async fn store(&self, id: PlayerId, name: &str) {
        if name.is_empty() {
            return;
        }

        let mut names = self.names.write().await;
        if names.get(&id).map(String::as_str) == Some(name) {
            return;
        }
        names.insert(id, name.to_string());

        if let Err(e) = Self::write(&self.path, &names).await {
            error!("Error saving username cache: {}", e);
        }
    }

    /// Persist the current contents
    pub async fn save(&self) -> StorageResult<()> {
        let names = self.names.read().await;
        Self::write(&self.path, &names).await
    }

    async fn write(path: &Path, names: &HashMap<PlayerId, String>) -> StorageResult<()> {
        let raw: BTreeMap<String, &String> = names
            .iter()
            .map(|(id, name)| (id.to_string(), name))
            .collect();
        write_json_atomic(path, &raw).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn id(s: &str) -> PlayerId {
        PlayerId::from_str(s).unwrap()
    }

    #[tokio::test]
    async fn test_store_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("playtime_usernames.json");
        let steve = id("8667ba71-b85a-4004-af54-457a9734eed7");

        let cache = IdentityCache::load(&path).await;
        assert!(cache.is_empty().await);
        cache.store(steve, "Steve").await;
        assert_eq!(cache.get(&steve).await.as_deref(), Some("Steve"));

        let reloaded = IdentityCache::load(&path).await;
        assert_eq!(reloaded.get(&steve).await.as_deref(), Some("Steve"));
        assert_eq!(reloaded.len().await, 1);
    }

    #[tokio::test]
    async fn test_store_overwrites_previous_name() {
        let dir = TempDir::new().unwrap();
        let cache = IdentityCache::new(dir.path().join("names.json"));
        let player = id("069a79f4-44e9-4726-a5be-fca90e38aaf5");

        cache.store(player, "OldName").await;
        cache.store(player, "NewName").await;
        assert_eq!(cache.get(&player).await.as_deref(), Some("NewName"));
    }

    #[tokio::test]
    async fn test_invalid_entries_are_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("names.json");
        tokio::fs::write(
            &path,
            r#"{ "not-a-uuid": "Ghost", "069a79f4-44e9-4726-a5be-fca90e38aaf5": "Notch" }"#,
        )
        .await
        .unwrap();

        let cache = IdentityCache::load(&path).await;
        assert_eq!(cache.len().await, 1);
        assert_eq!(
            cache.get(&id("069a79f4-44e9-4726-a5be-fca90e38aaf5")).await.as_deref(),
            Some("Notch")
        );
    }

    #[tokio::test]
    async fn test_corrupt_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("names.json");
        tokio::fs::write(&path, "[1, 2").await.unwrap();

        let cache = IdentityCache::load(&path).await;
        assert!(cache.is_empty().await);
    }
}
