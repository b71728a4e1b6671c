//! Discovery scanner
//!
//! Scans the external feed for tool mentions, verifies unknown candidates
//! against the publishing account's profile, and merges the results into the
//! registry. A scan is single-flight: overlapping calls fail fast with
//! [`ScanError::InProgress`] instead of queuing or racing registry writes.
//!
//! Failure semantics are deliberately partial: one candidate that cannot be
//! verified lands in `ScanResult.errors` and never blocks the rest. Only a
//! feed that is unreachable outright aborts the scan, in which case the
//! last-scan timestamp is left alone so `needs_refresh` keeps asking for a
//! retry.

use super::feed::{FeedClient, FeedError, ProfileClient};
use super::mentions::MentionExtractor;
use crate::registry::{ToolRecord, ToolRegistry};
use serde::Serialize;
use std::collections::HashSet;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Default deadline for one feed or profile call
pub const DEFAULT_FEED_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors surfaced by [`DiscoveryScanner::scan`]
#[derive(Debug, Error)]
pub enum ScanError {
    /// Another scan is still running
    #[error("Scan already in progress")]
    InProgress,

    /// The feed itself could not be read
    #[error("Feed error: {0}")]
    Feed(#[from] FeedError),
}

/// Outcome of one completed scan
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanResult {
    /// Distinct tool ids mentioned across the scanned posts
    pub tools_found: usize,
    /// Ids verified and added to the registry this scan
    pub new_tools: Vec<String>,
    /// Already-cached ids whose last-seen time was bumped
    pub updated_tools: Vec<String>,
    /// Per-candidate verification failures (scan still completes)
    pub errors: Vec<String>,
}

/// Clears the running flag on every exit path
struct ScanGuard(Arc<AtomicBool>);

impl Drop for ScanGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Populates the registry from the external feed
#[derive(Clone)]
pub struct DiscoveryScanner {
    registry: ToolRegistry,
    feed: Arc<dyn FeedClient>,
    profiles: Arc<dyn ProfileClient>,
    extractor: MentionExtractor,
    scanning: Arc<AtomicBool>,
    timeout: Duration,
}

impl DiscoveryScanner {
    /// Creates a scanner over the given collaborators.
    ///
    /// `namespace` is the identifier namespace mentions are normalized into
    /// (e.g. `tools` for `tools.giphy`).
    pub fn new(
        registry: ToolRegistry,
        feed: Arc<dyn FeedClient>,
        profiles: Arc<dyn ProfileClient>,
        namespace: &str,
    ) -> Self {
        Self {
            registry,
            feed,
            profiles,
            extractor: MentionExtractor::new(namespace),
            scanning: Arc::new(AtomicBool::new(false)),
            timeout: DEFAULT_FEED_TIMEOUT,
        }
    }

    /// Sets the per-call deadline for feed and profile requests
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// True while a scan is running
    pub fn is_scanning(&self) -> bool {
        self.scanning.load(Ordering::SeqCst)
    }

    /// Scans recent posts for tool mentions and merges verified results.
    ///
    /// Fails fast with [`ScanError::InProgress`] if a prior scan has not
    /// completed. On completion the registry's last-scan time is stamped even
    /// when some candidates failed verification.
    pub async fn scan(&self) -> Result<ScanResult, ScanError> {
        if self
            .scanning
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("scan requested while another scan is in progress");
            return Err(ScanError::InProgress);
        }
        let _guard = ScanGuard(Arc::clone(&self.scanning));

        info!(feed = self.feed.name(), "starting discovery scan");
        let posts = self.bounded(self.feed.recent_posts()).await?;
        debug!(posts = posts.len(), "fetched feed posts");

        let mut result = ScanResult::default();
        let mut seen: HashSet<String> = HashSet::new();

        for post in &posts {
            for tool_id in self.extractor.extract(&post.text) {
                if !seen.insert(tool_id.clone()) {
                    continue;
                }

                if self.registry.touch(&tool_id) {
                    debug!(tool = %tool_id, "known tool re-observed");
                    result.updated_tools.push(tool_id);
                    continue;
                }

                match self.verify(&post.author, &tool_id).await {
                    Ok(Some(record)) => {
                        info!(tool = %tool_id, author = %post.author, "discovered new tool");
                        self.registry.upsert(record);
                        result.new_tools.push(tool_id);
                    }
                    Ok(None) => {
                        result
                            .errors
                            .push(format!("{}: no metadata published by {}", tool_id, post.author));
                    }
                    Err(e) => {
                        warn!(tool = %tool_id, error = %e, "verification failed");
                        result.errors.push(format!("{tool_id}: {e}"));
                    }
                }
            }
        }

        result.tools_found = seen.len();
        self.registry.mark_scanned();
        info!(
            found = result.tools_found,
            new = result.new_tools.len(),
            updated = result.updated_tools.len(),
            errors = result.errors.len(),
            "discovery scan completed"
        );
        Ok(result)
    }

    /// Registry search first; on an empty result, a narrower live feed lookup
    /// whose verified hits are merged into the registry before returning.
    pub async fn search_for_tool(&self, query: &str) -> Result<Vec<ToolRecord>, ScanError> {
        let cached = self.registry.search(Some(query), 10);
        if !cached.tools.is_empty() {
            return Ok(cached.tools);
        }

        debug!(query, "registry empty for query, searching feed");
        let posts = self.bounded(self.feed.search_posts(query)).await?;

        let mut found = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        for post in &posts {
            for tool_id in self.extractor.extract(&post.text) {
                if !seen.insert(tool_id.clone()) {
                    continue;
                }
                if let Some(record) = self.registry.get(&tool_id) {
                    found.push(record);
                    continue;
                }
                match self.verify(&post.author, &tool_id).await {
                    Ok(Some(record)) => {
                        self.registry.upsert(record.clone());
                        // Re-read so last_seen reflects the upsert stamp
                        found.push(self.registry.get(&tool_id).unwrap_or(record));
                    }
                    Ok(None) => {}
                    Err(e) => warn!(tool = %tool_id, error = %e, "live lookup verification failed"),
                }
            }
        }
        Ok(found)
    }

    /// Resolves descriptive metadata for a candidate from its author profile
    async fn verify(&self, author: &str, tool_id: &str) -> Result<Option<ToolRecord>, FeedError> {
        let record = self
            .bounded(self.profiles.tool_metadata(author, tool_id))
            .await?;
        Ok(record.map(|mut r| {
            if r.author.is_empty() {
                r.author = author.to_string();
            }
            r
        }))
    }

    /// Applies the scanner deadline to one collaborator call
    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, FeedError>>,
    ) -> Result<T, FeedError> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(FeedError::Timeout(self.timeout.as_secs())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::mock::MockFeed;

    fn scanner_with(feed: Arc<MockFeed>) -> DiscoveryScanner {
        DiscoveryScanner::new(
            ToolRegistry::new(),
            Arc::clone(&feed) as Arc<dyn FeedClient>,
            feed as Arc<dyn ProfileClient>,
            "tools",
        )
    }

    fn giphy_record() -> ToolRecord {
        ToolRecord::new("tools.giphy", "giphy")
            .with_description("Animated GIF search")
            .with_capabilities(vec!["media".to_string(), "search".to_string()])
    }

    #[tokio::test]
    async fn test_scan_discovers_and_merges_new_tools() {
        let feed = Arc::new(MockFeed::new());
        feed.add_post("giphy-bot", "everyone should install giphy");
        feed.publish("giphy-bot", giphy_record());

        let scanner = scanner_with(feed);
        let result = scanner.scan().await.unwrap();

        assert_eq!(result.tools_found, 1);
        assert_eq!(result.new_tools, vec!["tools.giphy"]);
        assert!(result.updated_tools.is_empty());
        assert!(result.errors.is_empty());
        assert!(scanner.registry.get("tools.giphy").is_some());
        assert!(!scanner.registry.needs_refresh());
    }

    #[tokio::test]
    async fn test_scan_counts_cached_tools_as_updated() {
        let feed = Arc::new(MockFeed::new());
        feed.add_post("giphy-bot", "tools.giphy is great");

        let scanner = scanner_with(feed);
        scanner.registry.upsert(giphy_record());
        let before = scanner.registry.get("tools.giphy").unwrap().last_seen;

        let result = scanner.scan().await.unwrap();
        assert!(result.new_tools.is_empty());
        assert_eq!(result.updated_tools, vec!["tools.giphy"]);
        assert!(scanner.registry.get("tools.giphy").unwrap().last_seen >= before);
    }

    #[tokio::test]
    async fn test_scan_collects_partial_failures() {
        let feed = Arc::new(MockFeed::new());
        feed.add_post("giphy-bot", "install giphy");
        feed.add_post("broken-bot", "install broken");
        feed.add_post("silent-bot", "install ghost");
        feed.publish("giphy-bot", giphy_record());
        feed.fail_metadata_for("tools.broken");

        let scanner = scanner_with(feed);
        let result = scanner.scan().await.unwrap();

        // One verified, one failed fetch, one with no published metadata
        assert_eq!(result.tools_found, 3);
        assert_eq!(result.new_tools, vec!["tools.giphy"]);
        assert_eq!(result.errors.len(), 2);
        assert!(result.errors.iter().any(|e| e.contains("tools.broken")));
        assert!(result.errors.iter().any(|e| e.contains("tools.ghost")));
        // Partial failures still stamp the scan time
        assert!(!scanner.registry.needs_refresh());
    }

    #[tokio::test]
    async fn test_scan_deduplicates_across_posts() {
        let feed = Arc::new(MockFeed::new());
        feed.add_post("giphy-bot", "install giphy");
        feed.add_post("fan", "tools.giphy rocks");
        feed.publish("giphy-bot", giphy_record());

        let scanner = scanner_with(feed);
        let result = scanner.scan().await.unwrap();
        assert_eq!(result.tools_found, 1);
        assert_eq!(result.new_tools.len(), 1);
    }

    #[tokio::test]
    async fn test_overlapping_scan_fails_fast() {
        let feed = Arc::new(MockFeed::with_delay(Duration::from_millis(100)));
        feed.add_post("giphy-bot", "install giphy");
        feed.publish("giphy-bot", giphy_record());

        let scanner = scanner_with(feed);
        let racing = scanner.clone();

        let first = tokio::spawn(async move { racing.scan().await });
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(scanner.is_scanning());
        assert!(matches!(scanner.scan().await, Err(ScanError::InProgress)));

        let completed = first.await.unwrap().unwrap();
        assert_eq!(completed.new_tools.len(), 1);
        assert!(!scanner.is_scanning());

        // The guard released; a follow-up scan succeeds
        assert!(scanner.scan().await.is_ok());
    }

    #[tokio::test]
    async fn test_feed_failure_aborts_without_stamping() {
        let feed = Arc::new(MockFeed::new());
        feed.fail_feed("feed down");

        let scanner = scanner_with(feed);
        let result = scanner.scan().await;

        assert!(matches!(result, Err(ScanError::Feed(_))));
        assert!(scanner.registry.needs_refresh());
        assert!(!scanner.is_scanning());
    }

    #[tokio::test]
    async fn test_feed_timeout_is_bounded() {
        let feed = Arc::new(MockFeed::with_delay(Duration::from_millis(200)));
        let scanner = scanner_with(feed).with_timeout(Duration::from_millis(20));

        let result = scanner.scan().await;
        assert!(matches!(
            result,
            Err(ScanError::Feed(FeedError::Timeout(_)))
        ));
        assert!(!scanner.is_scanning());
    }

    #[tokio::test]
    async fn test_search_for_tool_prefers_registry() {
        let feed = Arc::new(MockFeed::new());
        let scanner = scanner_with(feed);
        scanner.registry.upsert(giphy_record());

        let found = scanner.search_for_tool("giphy").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "tools.giphy");
    }

    #[tokio::test]
    async fn test_search_for_tool_falls_back_to_feed() {
        let feed = Arc::new(MockFeed::new());
        feed.add_post("giphy-bot", "install giphy for gif search");
        feed.publish("giphy-bot", giphy_record());

        let scanner = scanner_with(feed);
        let found = scanner.search_for_tool("giphy").await.unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "tools.giphy");
        // Verified hits are merged into the registry
        assert!(scanner.registry.get("tools.giphy").is_some());
    }

    #[tokio::test]
    async fn test_search_for_tool_no_hits() {
        let feed = Arc::new(MockFeed::new());
        let scanner = scanner_with(feed);
        assert!(scanner.search_for_tool("nothing").await.unwrap().is_empty());
    }
}
