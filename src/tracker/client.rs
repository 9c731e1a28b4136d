use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;

use super::models::{Story, StoryNameUpdate};
use crate::errors::TrackerError;

pub const DEFAULT_API_URL: &str = "https://www.pivotaltracker.com/services/v5";
const TOKEN_HEADER: &str = "X-TrackerToken";
const USER_AGENT: &str = concat!("storytag/", env!("CARGO_PKG_VERSION"));

/// Abstraction over the story store for testability.
/// Real implementation: `TrackerClient`. Test double: `MemoryRepository` in the driver tests.
#[async_trait]
pub trait StoryRepository: Send + Sync {
    /// Fetch one page of stories for the configured project.
    async fn fetch_stories(&self, limit: u32, offset: u32) -> Result<Vec<Story>, TrackerError>;

    /// Replace a story's title.
    async fn update_story_title(&self, story_id: u64, title: &str) -> Result<(), TrackerError>;
}

/// Connection settings for a single Pivotal Tracker project.
#[derive(Clone)]
pub struct TrackerSettings {
    pub api_url: String,
    pub project_id: String,
    pub api_token: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for TrackerSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackerSettings")
            .field("api_url", &self.api_url)
            .field("project_id", &self.project_id)
            .field("api_token", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Pivotal Tracker v5 REST client scoped to one project.
pub struct TrackerClient {
    http: reqwest::Client,
    project_url: String,
    api_token: String,
}

impl TrackerClient {
    pub fn new(settings: &TrackerSettings) -> Result<Self, TrackerError> {
        let project_url = format!(
            "{}/projects/{}",
            settings.api_url.trim_end_matches('/'),
            settings.project_id
        );
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|source| TrackerError::Request {
                url: project_url.clone(),
                source,
            })?;
        Ok(Self {
            http,
            project_url,
            api_token: settings.api_token.clone(),
        })
    }

    pub fn project_url(&self) -> &str {
        &self.project_url
    }

    /// Send a request and turn non-2xx statuses into typed errors.
    async fn send(
        &self,
        url: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<String, TrackerError> {
        let resp = request
            .header(TOKEN_HEADER, &self.api_token)
            .send()
            .await
            .map_err(|source| TrackerError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|source| TrackerError::Request {
            url: url.to_string(),
            source,
        })?;

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(TrackerError::Unauthorized {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            return Err(TrackerError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl StoryRepository for TrackerClient {
    async fn fetch_stories(&self, limit: u32, offset: u32) -> Result<Vec<Story>, TrackerError> {
        let url = format!("{}/stories", self.project_url);
        let request = self.http.get(&url).query(&[
            ("limit", limit.to_string()),
            ("offset", offset.to_string()),
        ]);
        let body = self.send(&url, request).await?;
        serde_json::from_str(&body).map_err(|source| TrackerError::Decode { url, source })
    }

    async fn update_story_title(&self, story_id: u64, title: &str) -> Result<(), TrackerError> {
        let url = format!("{}/stories/{}", self.project_url, story_id);
        let request = self.http.put(&url).json(&StoryNameUpdate { name: title });
        self.send(&url, request).await?;
        Ok(())
    }
}

/// Fetch every page of stories, concatenating the results.
///
/// Stops at the first page shorter than `page_size`, and never requests more
/// than `max_pages` pages.
pub async fn fetch_all_stories(
    repo: &dyn StoryRepository,
    page_size: u32,
    max_pages: u32,
) -> Result<Vec<Story>, TrackerError> {
    let mut stories = Vec::new();

    for page in 0..max_pages {
        let offset = page.saturating_mul(page_size);
        let batch = repo.fetch_stories(page_size, offset).await?;
        let count = batch.len();
        tracing::debug!(page, offset, count, "Fetched story page");
        stories.extend(batch);

        if count < page_size as usize {
            return Ok(stories);
        }
    }

    tracing::warn!(
        max_pages,
        page_size,
        "Every page came back full; stories beyond the last page were not fetched"
    );
    Ok(stories)
}
