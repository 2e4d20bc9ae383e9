//! Cascading display-name resolution.
//!
//! Tiers are tried in order and the first success wins:
//!
//! 1. live session name (never cached here, it can change)
//! 2. [`IdentityCache`]
//! 3. remote [`DirectoryService`], written through into the cache
//! 4. synthesized `Unknown_<prefix>` placeholder
//!
//! Every tier failure falls through. No tier is retried within one call and
//! no lock is held while the directory request is in flight.

use crate::directory::DirectoryService;
use crate::error::DirectoryError;
use crate::identity_cache::IdentityCache;
use crate::session::SessionRegistry;
use crate::types::PlayerId;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Literal prefix of synthesized placeholder names.
pub const PLACEHOLDER_PREFIX: &str = "Unknown_";

/// Which tier produced a resolved name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameSource {
    Session,
    Cache,
    Directory,
    Placeholder,
}

/// A resolved display name together with its origin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedName {
    pub name: String,
    pub source: NameSource,
}

/// Placeholder name for an identifier no tier could resolve.
pub fn placeholder_name(id: &PlayerId) -> String {
    format!("{}{}", PLACEHOLDER_PREFIX, id.short())
}

/// Resolves player identifiers to display names
pub struct NameResolver {
    sessions: Arc<dyn SessionRegistry>,
    cache: Arc<IdentityCache>,
    directory: Option<Arc<dyn DirectoryService>>,
    timeout: Duration,
}

impl NameResolver {
    pub fn new(
        sessions: Arc<dyn SessionRegistry>,
        cache: Arc<IdentityCache>,
        directory: Option<Arc<dyn DirectoryService>>,
        timeout: Duration,
    ) -> Self {
        Self {
            sessions,
            cache,
            directory,
            timeout,
        }
    }

    pub fn cache(&self) -> &Arc<IdentityCache> {
        &self.cache
    }

    /// Resolve `id` to a display name. Never fails.
    pub async fn resolve(&self, id: PlayerId) -> String {
        self.resolve_with_source(id).await.name
    }

    /// Resolve `id`, reporting which tier answered.
    pub async fn resolve_with_source(&self, id: PlayerId) -> ResolvedName {
        if let Some(player) = self.sessions.find(&id) {
            if !player.name.is_empty() {
                return ResolvedName {
                    name: player.name,
                    source: NameSource::Session,
                };
            }
        }

        if let Some(name) = self.cache.get(&id).await {
            return ResolvedName {
                name,
                source: NameSource::Cache,
            };
        }

        if let Some(name) = self.lookup_remote(id).await {
            self.cache.store(id, &name).await;
            return ResolvedName {
                name,
                source: NameSource::Directory,
            };
        }

        ResolvedName {
            name: placeholder_name(&id),
            source: NameSource::Placeholder,
        }
    }

    async fn lookup_remote(&self, id: PlayerId) -> Option<String> {
        let directory = self.directory.as_ref()?;

        let outcome = match tokio::time::timeout(self.timeout, directory.lookup(id)).await {
            Ok(result) => result,
            Err(_) => Err(DirectoryError::Timeout(self.timeout.as_millis() as u64)),
        };

        match outcome {
            Ok(Some(name)) => Some(name),
            Ok(None) => {
                debug!("Profile directory does not know {}", id);
                None
            }
            Err(e) => {
                warn!("Profile directory lookup failed for {}: {}", id, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DirectoryResult;
    use crate::session::InMemorySessions;
    use crate::types::OnlinePlayer;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    enum Behaviour {
        Found(&'static str),
        NotFound,
        Fail,
        Hang,
    }

    struct MockDirectory {
        behaviour: Behaviour,
        calls: AtomicUsize,
    }

    impl MockDirectory {
        fn new(behaviour: Behaviour) -> Arc<Self> {
            Arc::new(Self {
                behaviour,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl DirectoryService for MockDirectory {
        async fn lookup(&self, _id: PlayerId) -> DirectoryResult<Option<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behaviour {
                Behaviour::Found(name) => Ok(Some(name.to_string())),
                Behaviour::NotFound => Ok(None),
                Behaviour::Fail => Err(DirectoryError::Status(503)),
                Behaviour::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(None)
                }
            }
        }
    }

    fn resolver(
        dir: &TempDir,
        sessions: Arc<InMemorySessions>,
        directory: Option<Arc<dyn DirectoryService>>,
    ) -> NameResolver {
        let cache = Arc::new(IdentityCache::new(dir.path().join("names.json")));
        NameResolver::new(sessions, cache, directory, Duration::from_millis(50))
    }

    #[tokio::test]
    async fn test_live_session_wins_and_is_not_cached() {
        let dir = TempDir::new().unwrap();
        let sessions = Arc::new(InMemorySessions::new());
        let id = PlayerId::new();
        sessions.upsert(OnlinePlayer::new(id, "LiveName", 0));
        let directory = MockDirectory::new(Behaviour::Found("RemoteName"));
        let resolver = resolver(&dir, sessions, Some(directory.clone()));
        resolver.cache().store(id, "CachedName").await;

        let resolved = resolver.resolve_with_source(id).await;
        assert_eq!(resolved.name, "LiveName");
        assert_eq!(resolved.source, NameSource::Session);
        assert_eq!(resolver.cache().get(&id).await.as_deref(), Some("CachedName"));
        assert_eq!(directory.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_directory() {
        let dir = TempDir::new().unwrap();
        let id = PlayerId::new();
        let directory = MockDirectory::new(Behaviour::Found("RemoteName"));
        let resolver = resolver(&dir, Arc::new(InMemorySessions::new()), Some(directory.clone()));
        resolver.cache().store(id, "CachedName").await;

        let resolved = resolver.resolve_with_source(id).await;
        assert_eq!(resolved.source, NameSource::Cache);
        assert_eq!(resolved.name, "CachedName");
        assert_eq!(directory.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_directory_hit_writes_through() {
        let dir = TempDir::new().unwrap();
        let id = PlayerId::new();
        let directory = MockDirectory::new(Behaviour::Found("Notch"));
        let resolver = resolver(&dir, Arc::new(InMemorySessions::new()), Some(directory.clone()));

        let resolved = resolver.resolve_with_source(id).await;
        assert_eq!(resolved.source, NameSource::Directory);
        assert_eq!(resolver.cache().get(&id).await.as_deref(), Some("Notch"));

        // Second resolution is served by the cache.
        assert_eq!(resolver.resolve_with_source(id).await.source, NameSource::Cache);
        assert_eq!(directory.calls.load(Ordering::SeqCst), 1);

        let on_disk = IdentityCache::load(dir.path().join("names.json")).await;
        assert_eq!(on_disk.get(&id).await.as_deref(), Some("Notch"));
    }

    #[tokio::test]
    async fn test_failing_directory_yields_stable_placeholder() {
        let dir = TempDir::new().unwrap();
        let id = PlayerId::from_str("c06f8906-4c8a-4911-9c29-ea1dbd1aab82").unwrap();
        let directory = MockDirectory::new(Behaviour::Fail);
        let resolver = resolver(&dir, Arc::new(InMemorySessions::new()), Some(directory.clone()));

        let first = resolver.resolve_with_source(id).await;
        let second = resolver.resolve(id).await;
        assert_eq!(first.source, NameSource::Placeholder);
        assert_eq!(first.name, "Unknown_c06f8906");
        assert_eq!(second, first.name);
        assert!(resolver.cache().get(&id).await.is_none());
        // One attempt per resolution, no retries.
        assert_eq!(directory.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_not_found_and_missing_directory_fall_through() {
        let dir = TempDir::new().unwrap();
        let id = PlayerId::new();

        let not_found = resolver(
            &dir,
            Arc::new(InMemorySessions::new()),
            Some(MockDirectory::new(Behaviour::NotFound)),
        );
        assert_eq!(not_found.resolve(id).await, placeholder_name(&id));

        let offline = resolver(&dir, Arc::new(InMemorySessions::new()), None);
        assert_eq!(offline.resolve(id).await, placeholder_name(&id));
    }

    #[tokio::test]
    async fn test_hanging_directory_is_bounded_by_timeout() {
        let dir = TempDir::new().unwrap();
        let id = PlayerId::new();
        let resolver = resolver(
            &dir,
            Arc::new(InMemorySessions::new()),
            Some(MockDirectory::new(Behaviour::Hang)),
        );

        let resolved = resolver.resolve_with_source(id).await;
        assert_eq!(resolved.source, NameSource::Placeholder);
    }
}
