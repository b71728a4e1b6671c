//! Feed and profile collaborators
//!
//! Discovery reads from two external collaborators: a social feed that yields
//! timestamped posts, and a per-account profile service that resolves tool
//! metadata by identifier. Both are consumed as traits; actually transporting
//! requests to a real service is out of scope, so the crate ships only a
//! file-backed [`JsonFeed`] for the CLI and offline use.

use crate::registry::ToolRecord;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Errors from feed or profile collaborators
#[derive(Debug, Error)]
pub enum FeedError {
    /// The feed or profile service could not be reached
    #[error("Feed unavailable: {0}")]
    Unavailable(String),

    /// The external call exceeded its deadline
    #[error("Feed request timed out after {0} seconds")]
    Timeout(u64),

    /// The collaborator returned data we could not understand
    #[error("Malformed feed data: {0}")]
    Malformed(String),
}

/// One post from the external feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedPost {
    /// Feed-assigned post identifier
    pub id: String,
    /// Account that published the post
    pub author: String,
    /// Raw post text
    pub text: String,
    /// Publication time
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

/// Read access to the external social feed
#[async_trait]
pub trait FeedClient: Send + Sync {
    /// Recent posts, newest first
    async fn recent_posts(&self) -> Result<Vec<FeedPost>, FeedError>;

    /// Posts matching a free-text query
    async fn search_posts(&self, query: &str) -> Result<Vec<FeedPost>, FeedError>;

    /// Collaborator name for logging
    fn name(&self) -> &str;
}

/// Per-account profile lookup for tool metadata
#[async_trait]
pub trait ProfileClient: Send + Sync {
    /// Resolves the metadata an account publishes for a tool id, if any
    async fn tool_metadata(
        &self,
        author: &str,
        tool_id: &str,
    ) -> Result<Option<ToolRecord>, FeedError>;
}

/// On-disk feed document consumed by [`JsonFeed`]
#[derive(Debug, Default, Serialize, Deserialize)]
struct FeedDocument {
    #[serde(default)]
    posts: Vec<FeedPost>,
    /// Author account -> records that account publishes
    #[serde(default)]
    profiles: HashMap<String, Vec<ToolRecord>>,
}

/// File-backed feed: posts and profiles loaded from one JSON document.
///
/// Lets the CLI run full discovery scans without any network. The document
/// shape is `{"posts": [...], "profiles": {"account": [ToolRecord, ...]}}`.
pub struct JsonFeed {
    document: FeedDocument,
    source: String,
}

impl JsonFeed {
    /// A feed with no posts and no profiles
    pub fn empty() -> Self {
        Self {
            document: FeedDocument::default(),
            source: "empty".to_string(),
        }
    }

    /// Loads a feed document from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, FeedError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| FeedError::Unavailable(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&raw, path.display().to_string())
    }

    /// Parses a feed document from a JSON string
    pub fn from_json(raw: &str, source: String) -> Result<Self, FeedError> {
        let document: FeedDocument =
            serde_json::from_str(raw).map_err(|e| FeedError::Malformed(e.to_string()))?;
        Ok(Self { document, source })
    }

    /// Number of posts in the document
    pub fn post_count(&self) -> usize {
        self.document.posts.len()
    }
}

#[async_trait]
impl FeedClient for JsonFeed {
    async fn recent_posts(&self) -> Result<Vec<FeedPost>, FeedError> {
        let mut posts = self.document.posts.clone();
        posts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(posts)
    }

    async fn search_posts(&self, query: &str) -> Result<Vec<FeedPost>, FeedError> {
        let needle = query.to_lowercase();
        Ok(self
            .document
            .posts
            .iter()
            .filter(|p| p.text.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    fn name(&self) -> &str {
        &self.source
    }
}

#[async_trait]
impl ProfileClient for JsonFeed {
    async fn tool_metadata(
        &self,
        author: &str,
        tool_id: &str,
    ) -> Result<Option<ToolRecord>, FeedError> {
        Ok(self
            .document
            .profiles
            .get(author)
            .and_then(|records| records.iter().find(|r| r.id == tool_id))
            .cloned())
    }
}
