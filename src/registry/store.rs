//! In-memory tool registry
//!
//! The registry is the shared cache of every tool the engine knows about. It
//! is a clone-able handle around `Arc<RwLock<_>>` state, so the discovery
//! scanner and the intent resolver can share one instance across tasks.
//!
//! Ranking is intentionally simple: exact name matches dominate, description
//! matches beat tag matches, and ties keep encounter order.

use super::record::{RegistrySnapshot, ToolRecord};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::debug;

/// Registry contents are considered stale after this long without a scan
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Marker echoed back when `search` is called without a query.
///
/// The system this replaces echoed a coerced `"undefined"` here; the
/// empty-result behavior is kept but the marker says what actually happened.
pub const NO_QUERY_MARKER: &str = "(no query)";

/// Score weight for an exact (case-insensitive) name match
const SCORE_NAME_EXACT: u32 = 3;
/// Score weight for a description substring match
const SCORE_DESCRIPTION: u32 = 2;
/// Score weight for a capability or tag substring match
const SCORE_TAG: u32 = 1;

/// Result of a ranked registry search
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    /// Top matches, best first, truncated to the requested limit
    pub tools: Vec<ToolRecord>,
    /// Full match count before truncation
    pub total: usize,
    /// The query as the registry understood it
    pub query: String,
}

/// Registry size and freshness counters
#[derive(Debug, Clone, Serialize)]
pub struct RegistryStats {
    /// Number of cached tools
    pub total: usize,
    /// Completion time of the most recent discovery scan
    pub last_scan: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct RegistryState {
    records: HashMap<String, ToolRecord>,
    /// Insertion order of ids, for stable ranking tie-breaks
    order: Vec<String>,
    last_scan: Option<DateTime<Utc>>,
}

/// Shared in-memory store of discoverable tools
#[derive(Clone)]
pub struct ToolRegistry {
    state: Arc<RwLock<RegistryState>>,
    refresh_interval: Duration,
}

impl ToolRegistry {
    /// Creates an empty registry with the default freshness interval
    pub fn new() -> Self {
        Self::with_refresh_interval(DEFAULT_REFRESH_INTERVAL)
    }

    /// Creates an empty registry with a custom freshness interval
    pub fn with_refresh_interval(refresh_interval: Duration) -> Self {
        Self {
            state: Arc::new(RwLock::new(RegistryState::default())),
            refresh_interval,
        }
    }

    /// Inserts or replaces a record by id, stamping `last_seen` to now.
    ///
    /// Idempotent: re-upserting identical data only advances the timestamp.
    pub fn upsert(&self, mut record: ToolRecord) {
        record.last_seen = Utc::now();
        if let Ok(mut state) = self.state.write() {
            if !state.records.contains_key(&record.id) {
                state.order.push(record.id.clone());
            }
            debug!(tool = %record.id, "registry upsert");
            state.records.insert(record.id.clone(), record);
        }
    }

    /// O(1) lookup by id; absence is a normal result
    pub fn get(&self, id: &str) -> Option<ToolRecord> {
        self.state.read().ok()?.records.get(id).cloned()
    }

    /// Bumps `last_seen` without replacing fields. Returns false if unknown.
    pub fn touch(&self, id: &str) -> bool {
        if let Ok(mut state) = self.state.write() {
            if let Some(record) = state.records.get_mut(id) {
                record.last_seen = Utc::now();
                return true;
            }
        }
        false
    }

    /// Ranked, case-insensitive substring search over name, description,
    /// tags, and id.
    ///
    /// Never panics: an absent query yields an empty result set with the
    /// [`NO_QUERY_MARKER`] echoed, and an empty/blank query yields an empty
    /// result set echoing the input.
    pub fn search(&self, query: Option<&str>, limit: usize) -> SearchResult {
        let raw = match query {
            Some(q) => q,
            None => {
                return SearchResult {
                    tools: Vec::new(),
                    total: 0,
                    query: NO_QUERY_MARKER.to_string(),
                }
            }
        };

        let needle = raw.trim().to_lowercase();
        if needle.is_empty() {
            return SearchResult {
                tools: Vec::new(),
                total: 0,
                query: raw.to_string(),
            };
        }

        let mut scored: Vec<(u32, ToolRecord)> = Vec::new();
        if let Ok(state) = self.state.read() {
            for id in &state.order {
                let Some(record) = state.records.get(id) else {
                    continue;
                };
                if let Some(score) = Self::match_score(record, &needle) {
                    scored.push((score, record.clone()));
                }
            }
        }

        let total = scored.len();
        // Stable sort keeps encounter order within equal scores
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        let tools = scored
            .into_iter()
            .take(limit)
            .map(|(_, record)| record)
            .collect();

        SearchResult {
            tools,
            total,
            query: raw.to_string(),
        }
    }

    /// Returns `Some(score)` when the record matches the lowercased needle.
    ///
    /// Empty optional fields simply fail their criterion instead of erroring,
    /// so sparse records from the feed are searchable too.
    fn match_score(record: &ToolRecord, needle: &str) -> Option<u32> {
        let name = record.name.to_lowercase();
        let description = record.description.to_lowercase();
        let tag_hit = record
            .capabilities
            .iter()
            .chain(record.tags.iter())
            .any(|t| t.to_lowercase().contains(needle));
        let matches = name.contains(needle)
            || description.contains(needle)
            || tag_hit
            || record.id.to_lowercase().contains(needle);
        if !matches {
            return None;
        }

        let mut score = 0;
        if name == needle {
            score += SCORE_NAME_EXACT;
        }
        if !description.is_empty() && description.contains(needle) {
            score += SCORE_DESCRIPTION;
        }
        if tag_hit {
            score += SCORE_TAG;
        }
        Some(score)
    }

    /// Unranked filter by capability tag, in encounter order
    pub fn by_capability(&self, tag: &str) -> Vec<ToolRecord> {
        let mut found = Vec::new();
        if let Ok(state) = self.state.read() {
            for id in &state.order {
                if let Some(record) = state.records.get(id) {
                    if record.has_capability(tag) {
                        found.push(record.clone());
                    }
                }
            }
        }
        found
    }

    /// Removes a record by id. Returns true if something was removed.
    pub fn remove(&self, id: &str) -> bool {
        if let Ok(mut state) = self.state.write() {
            if state.records.remove(id).is_some() {
                state.order.retain(|o| o != id);
                return true;
            }
        }
        false
    }

    /// Empties the registry and forgets the last scan time
    pub fn clear(&self) {
        if let Ok(mut state) = self.state.write() {
            state.records.clear();
            state.order.clear();
            state.last_scan = None;
        }
    }

    /// Current size and freshness counters
    pub fn stats(&self) -> RegistryStats {
        match self.state.read() {
            Ok(state) => RegistryStats {
                total: state.records.len(),
                last_scan: state.last_scan,
            },
            Err(_) => RegistryStats {
                total: 0,
                last_scan: None,
            },
        }
    }

    /// True if no scan has completed within the refresh interval
    pub fn needs_refresh(&self) -> bool {
        let last_scan = match self.state.read() {
            Ok(state) => state.last_scan,
            Err(_) => return true,
        };
        match last_scan {
            Some(at) => Utc::now()
                .signed_duration_since(at)
                .to_std()
                .map(|age| age > self.refresh_interval)
                .unwrap_or(false),
            None => true,
        }
    }

    /// Records that a discovery scan just completed
    pub fn mark_scanned(&self) {
        if let Ok(mut state) = self.state.write() {
            state.last_scan = Some(Utc::now());
        }
    }

    /// Exports the full registry state, in encounter order
    pub fn export(&self) -> RegistrySnapshot {
        match self.state.read() {
            Ok(state) => RegistrySnapshot {
                tools: state
                    .order
                    .iter()
                    .filter_map(|id| state.records.get(id).cloned())
                    .collect(),
                last_scan: state.last_scan,
            },
            Err(_) => RegistrySnapshot::default(),
        }
    }

    /// Replaces all registry state with the snapshot contents
    pub fn import(&self, snapshot: RegistrySnapshot) {
        if let Ok(mut state) = self.state.write() {
            state.records.clear();
            state.order.clear();
            for record in snapshot.tools {
                if !state.records.contains_key(&record.id) {
                    state.order.push(record.id.clone());
                }
                state.records.insert(record.id.clone(), record);
            }
            state.last_scan = snapshot.last_scan;
        }
    }

    /// Number of cached tools
    pub fn len(&self) -> usize {
        self.state.read().map(|s| s.records.len()).unwrap_or(0)
    }

    /// True if no tools are cached
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn giphy() -> ToolRecord {
        ToolRecord::new("tools.giphy", "giphy")
            .with_description("Search and share animated GIFs")
            .with_capabilities(vec!["media".to_string(), "search".to_string()])
            .with_tags(vec!["gif".to_string(), "fun".to_string()])
    }

    fn weather() -> ToolRecord {
        ToolRecord::new("tools.weather", "weather")
            .with_description("Current conditions, works with giphy overlays")
            .with_capabilities(vec!["location".to_string()])
    }

    #[test]
    fn test_upsert_and_get() {
        let registry = ToolRegistry::new();
        let before = Utc::now();
        registry.upsert(giphy());

        let record = registry.get("tools.giphy").unwrap();
        assert_eq!(record.name, "giphy");
        assert!(record.last_seen >= before);
        assert!(registry.get("tools.unknown").is_none());
    }

    #[test]
    fn test_upsert_is_idempotent_except_last_seen() {
        let registry = ToolRegistry::new();
        registry.upsert(giphy());
        let first = registry.get("tools.giphy").unwrap();

        registry.upsert(giphy());
        let second = registry.get("tools.giphy").unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.description, second.description);
        assert!(second.last_seen >= first.last_seen);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_search_ranks_exact_name_above_description() {
        let registry = ToolRegistry::new();
        registry.upsert(weather());
        registry.upsert(giphy());

        let result = registry.search(Some("giphy"), 10);
        assert_eq!(result.total, 2);
        assert_eq!(result.tools[0].id, "tools.giphy");
        assert_eq!(result.tools[1].id, "tools.weather");
        assert_eq!(result.query, "giphy");
    }

    #[test]
    fn test_search_matches_tags_and_id() {
        let registry = ToolRegistry::new();
        registry.upsert(giphy());

        assert_eq!(registry.search(Some("gif"), 10).total, 1);
        assert_eq!(registry.search(Some("tools.gip"), 10).total, 1);
        assert_eq!(registry.search(Some("GIF"), 10).total, 1);
        assert_eq!(registry.search(Some("missing"), 10).total, 0);
    }

    #[test]
    fn test_search_respects_limit_but_reports_full_total() {
        let registry = ToolRegistry::new();
        for i in 0..5 {
            registry.upsert(
                ToolRecord::new(format!("tools.gif{i}"), format!("gif{i}"))
                    .with_tags(vec!["gif".to_string()]),
            );
        }

        let result = registry.search(Some("gif"), 2);
        assert_eq!(result.tools.len(), 2);
        assert_eq!(result.total, 5);
        // Equal scores keep encounter order
        assert_eq!(result.tools[0].id, "tools.gif0");
        assert_eq!(result.tools[1].id, "tools.gif1");
    }

    #[test]
    fn test_search_absent_and_empty_queries_never_panic() {
        let registry = ToolRegistry::new();
        registry.upsert(giphy());

        let absent = registry.search(None, 10);
        assert!(absent.tools.is_empty());
        assert_eq!(absent.total, 0);
        assert_eq!(absent.query, NO_QUERY_MARKER);

        let empty = registry.search(Some(""), 10);
        assert!(empty.tools.is_empty());
        assert_eq!(empty.total, 0);
        assert_eq!(empty.query, "");

        let blank = registry.search(Some("   "), 10);
        assert_eq!(blank.total, 0);
    }

    #[test]
    fn test_search_tolerates_sparse_records() {
        let registry = ToolRegistry::new();
        registry.upsert(ToolRecord::new("tools.bare", "bare"));

        // No description, no tags: still matchable by name/id, no panic
        let result = registry.search(Some("bare"), 10);
        assert_eq!(result.total, 1);
        assert_eq!(result.tools[0].id, "tools.bare");
    }

    #[test]
    fn test_by_capability() {
        let registry = ToolRegistry::new();
        registry.upsert(giphy());
        registry.upsert(weather());

        let media = registry.by_capability("media");
        assert_eq!(media.len(), 1);
        assert_eq!(media[0].id, "tools.giphy");
        assert!(registry.by_capability("nonexistent").is_empty());
    }

    #[test]
    fn test_remove_and_clear() {
        let registry = ToolRegistry::new();
        registry.upsert(giphy());
        registry.mark_scanned();

        assert!(registry.remove("tools.giphy"));
        assert!(!registry.remove("tools.giphy"));
        assert!(registry.is_empty());
        assert!(registry.stats().last_scan.is_some());

        registry.upsert(weather());
        registry.clear();
        assert!(registry.is_empty());
        assert!(registry.stats().last_scan.is_none());
    }

    #[test]
    fn test_touch_bumps_last_seen_only() {
        let registry = ToolRegistry::new();
        registry.upsert(giphy());
        let before = registry.get("tools.giphy").unwrap();

        assert!(registry.touch("tools.giphy"));
        let after = registry.get("tools.giphy").unwrap();
        assert!(after.last_seen >= before.last_seen);
        assert_eq!(after.description, before.description);

        assert!(!registry.touch("tools.unknown"));
    }

    #[test]
    fn test_needs_refresh() {
        let registry = ToolRegistry::new();
        assert!(registry.needs_refresh());

        registry.mark_scanned();
        assert!(!registry.needs_refresh());

        let stale = ToolRegistry::with_refresh_interval(Duration::from_secs(0));
        stale.mark_scanned();
        std::thread::sleep(Duration::from_millis(5));
        assert!(stale.needs_refresh());
    }

    #[test]
    fn test_export_import_round_trip() {
        let registry = ToolRegistry::new();
        registry.upsert(weather());
        registry.upsert(giphy());
        registry.mark_scanned();

        let snapshot = registry.export();
        assert_eq!(snapshot.tools.len(), 2);
        assert_eq!(snapshot.tools[0].id, "tools.weather");

        let restored = ToolRegistry::new();
        restored.import(snapshot);

        let original = registry.search(Some("giphy"), 10);
        let replayed = restored.search(Some("giphy"), 10);
        assert_eq!(original.total, replayed.total);
        let ids: Vec<_> = original.tools.iter().map(|t| &t.id).collect();
        let replayed_ids: Vec<_> = replayed.tools.iter().map(|t| &t.id).collect();
        assert_eq!(ids, replayed_ids);
        assert!(!restored.needs_refresh());
    }

    #[test]
    fn test_import_replaces_existing_state() {
        let registry = ToolRegistry::new();
        registry.upsert(giphy());

        registry.import(RegistrySnapshot::default());
        assert!(registry.is_empty());
        assert!(registry.needs_refresh());
    }

    #[test]
    fn test_handle_is_shared_across_clones() {
        let registry = ToolRegistry::new();
        let clone = registry.clone();

        let handle = std::thread::spawn(move || clone.upsert(giphy()));
        handle.join().unwrap();

        assert!(registry.get("tools.giphy").is_some());
    }
}
