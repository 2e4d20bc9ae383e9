//! Remote profile directory lookups.
//!
//! The directory is the third tier of name resolution. It sits behind the
//! [`DirectoryService`] trait so tests and offline hosts can swap it out.

use crate::error::{DirectoryError, DirectoryResult};
use crate::types::PlayerId;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Default profile endpoint; the undashed identifier is appended.
pub const DEFAULT_DIRECTORY_URL: &str = "https://api.mojang.com/user/profile/";

/// Remote lookup of display names by player identifier
#[async_trait]
pub trait DirectoryService: Send + Sync {
    /// Look up the display name for `id`.
    ///
    /// `Ok(None)` means the directory answered but does not know the player.
    async fn lookup(&self, id: PlayerId) -> DirectoryResult<Option<String>>;
}

#[derive(Debug, Deserialize)]
struct ProfileResponse {
    name: Option<String>,
}

/// HTTP directory client for `GET {base_url}{uuid-without-hyphens}`
#[derive(Debug, Clone)]
pub struct HttpDirectory {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpDirectory {
    /// Creates a client whose requests are bounded by `timeout`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> DirectoryResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DirectoryError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            timeout,
        })
    }

    fn profile_url(&self, id: PlayerId) -> String {
        format!("{}{}", self.base_url, id.simple())
    }
}

#[async_trait]
impl DirectoryService for HttpDirectory {
    async fn lookup(&self, id: PlayerId) -> DirectoryResult<Option<String>> {
        let url = self.profile_url(id);
        debug!("Querying profile directory: {}", url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                DirectoryError::Timeout(self.timeout.as_millis() as u64)
            } else {
                DirectoryError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND || status == reqwest::StatusCode::NO_CONTENT {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(DirectoryError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| DirectoryError::Transport(e.to_string()))?;
        parse_profile_name(&body)
    }
}

/// Extract the `name` field from a profile response body.
pub fn parse_profile_name(body: &str) -> DirectoryResult<Option<String>> {
    let profile: ProfileResponse =
        serde_json::from_str(body).map_err(|e| DirectoryError::MalformedBody(e.to_string()))?;

    match profile.name {
        Some(name) if !name.trim().is_empty() => Ok(Some(name)),
        _ => Err(DirectoryError::MalformedBody("missing name".to_string())),
    }
}
