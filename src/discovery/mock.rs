//! Scriptable feed for tests
//!
//! Mirrors the shape of the real collaborators but serves canned posts and
//! profiles, with optional per-call delay and injected failures so concurrency
//! and partial-failure paths can be exercised deterministically.

use super::feed::{FeedClient, FeedError, FeedPost, ProfileClient};
use crate::registry::ToolRecord;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

/// In-memory feed + profile collaborator for tests
pub struct MockFeed {
    posts: Mutex<Vec<FeedPost>>,
    profiles: Mutex<HashMap<String, Vec<ToolRecord>>>,
    failing_tools: Mutex<HashSet<String>>,
    feed_error: Mutex<Option<String>>,
    delay: Option<Duration>,
}

impl MockFeed {
    /// Creates an empty mock feed
    pub fn new() -> Self {
        Self {
            posts: Mutex::new(Vec::new()),
            profiles: Mutex::new(HashMap::new()),
            failing_tools: Mutex::new(HashSet::new()),
            feed_error: Mutex::new(None),
            delay: None,
        }
    }

    /// Creates a mock feed that sleeps before answering each feed call
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new()
        }
    }

    /// Appends a post by the given account
    pub fn add_post(&self, author: impl Into<String>, text: impl Into<String>) {
        let mut posts = self.posts.lock().unwrap();
        let id = format!("post-{}", posts.len() + 1);
        posts.push(FeedPost {
            id,
            author: author.into(),
            text: text.into(),
            timestamp: Utc::now(),
        });
    }

    /// Publishes tool metadata on an account profile
    pub fn publish(&self, author: impl Into<String>, record: ToolRecord) {
        self.profiles
            .lock()
            .unwrap()
            .entry(author.into())
            .or_default()
            .push(record);
    }

    /// Makes metadata lookups for this tool id fail
    pub fn fail_metadata_for(&self, tool_id: impl Into<String>) {
        self.failing_tools.lock().unwrap().insert(tool_id.into());
    }

    /// Makes every feed call fail with the given message
    pub fn fail_feed(&self, message: impl Into<String>) {
        *self.feed_error.lock().unwrap() = Some(message.into());
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn check_feed_error(&self) -> Result<(), FeedError> {
        match self.feed_error.lock().unwrap().clone() {
            Some(message) => Err(FeedError::Unavailable(message)),
            None => Ok(()),
        }
    }
}

impl Default for MockFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FeedClient for MockFeed {
    async fn recent_posts(&self) -> Result<Vec<FeedPost>, FeedError> {
        self.pause().await;
        self.check_feed_error()?;
        Ok(self.posts.lock().unwrap().clone())
    }

    async fn search_posts(&self, query: &str) -> Result<Vec<FeedPost>, FeedError> {
        self.pause().await;
        self.check_feed_error()?;
        let needle = query.to_lowercase();
        Ok(self
            .posts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.text.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    fn name(&self) -> &str {
        "MockFeed"
    }
}

#[async_trait]
impl ProfileClient for MockFeed {
    async fn tool_metadata(
        &self,
        author: &str,
        tool_id: &str,
    ) -> Result<Option<ToolRecord>, FeedError> {
        if self.failing_tools.lock().unwrap().contains(tool_id) {
            return Err(FeedError::Unavailable(format!(
                "profile fetch failed for {tool_id}"
            )));
        }
        Ok(self
            .profiles
            .lock()
            .unwrap()
            .get(author)
            .and_then(|records| records.iter().find(|r| r.id == tool_id))
            .cloned())
    }
}
