//! Tool record and registry snapshot types
//!
//! A [`ToolRecord`] describes one installable capability provider as observed
//! on the feed or supplied at install time. Records are plain serde values so
//! the whole registry can be exported and re-imported by the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single discoverable tool.
///
/// The `id` is namespace-qualified (e.g. `tools.giphy`) and immutable once the
/// record is created; re-discovery only advances `last_seen` and refreshes the
/// descriptive fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolRecord {
    /// Globally unique, namespace-qualified identifier
    pub id: String,
    /// Human-readable display name
    pub name: String,
    /// Free-text description
    #[serde(default)]
    pub description: String,
    /// Identifier of the publishing account
    #[serde(default)]
    pub author: String,
    /// Origin repository reference, when published
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_repo: Option<String>,
    /// Last time this tool was observed (discovery or install).
    ///
    /// Absent on the wire: published metadata need not carry it, and `upsert`
    /// re-stamps it on merge anyway.
    #[serde(default = "Utc::now")]
    pub last_seen: DateTime<Utc>,
    /// Capability tags ("search", "media", "location", ...)
    #[serde(default)]
    pub capabilities: Vec<String>,
    /// Topical tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Semantic version string
    #[serde(default)]
    pub version: String,
    /// Optional homepage URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    /// Optional input schema blob
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<serde_json::Value>,
    /// Optional output schema blob
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<serde_json::Value>,
}

impl ToolRecord {
    /// Creates a minimal record with the current timestamp.
    ///
    /// Descriptive fields start empty and are filled in by verification or a
    /// later `upsert`.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            author: String::new(),
            source_repo: None,
            last_seen: Utc::now(),
            capabilities: Vec::new(),
            tags: Vec::new(),
            version: String::new(),
            homepage: None,
            input_schema: None,
            output_schema: None,
        }
    }

    /// Sets the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the publishing account
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    /// Sets the capability tags
    pub fn with_capabilities(mut self, capabilities: Vec<String>) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Sets the topical tags
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Sets the version string
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// True if any capability tag equals `tag` (case-insensitive)
    pub fn has_capability(&self, tag: &str) -> bool {
        self.capabilities
            .iter()
            .any(|c| c.eq_ignore_ascii_case(tag))
    }
}

/// Full registry state as an exportable value.
///
/// Tools are stored in encounter order so an import reproduces the original
/// search tie-breaking. Owned exclusively by the registry; mutations go
/// through its API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    /// All records, in the order they were first seen
    pub tools: Vec<ToolRecord>,
    /// Completion time of the most recent discovery scan
    #[serde(default)]
    pub last_scan: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_builder() {
        let record = ToolRecord::new("tools.giphy", "giphy")
            .with_description("Search and share animated GIFs")
            .with_author("giphy-bot")
            .with_capabilities(vec!["media".to_string(), "search".to_string()])
            .with_tags(vec!["gif".to_string()])
            .with_version("1.2.0");

        assert_eq!(record.id, "tools.giphy");
        assert_eq!(record.name, "giphy");
        assert_eq!(record.author, "giphy-bot");
        assert_eq!(record.version, "1.2.0");
        assert!(record.has_capability("media"));
        assert!(record.has_capability("SEARCH"));
        assert!(!record.has_capability("location"));
    }

    #[test]
    fn test_record_serde_round_trip() {
        let record = ToolRecord::new("tools.weather", "weather")
            .with_capabilities(vec!["location".to_string()]);

        let json = serde_json::to_string(&record).unwrap();
        let back: ToolRecord = serde_json::from_str(&json).unwrap();

        assert_eq!(back.id, record.id);
        assert_eq!(back.capabilities, record.capabilities);
        assert_eq!(back.last_seen, record.last_seen);
    }

    #[test]
    fn test_record_deserializes_sparse_json() {
        // Feed profiles often publish only identity fields
        let before = Utc::now();
        let json = r#"{"id": "tools.maps", "name": "maps"}"#;
        let record: ToolRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.id, "tools.maps");
        assert!(record.description.is_empty());
        assert!(record.capabilities.is_empty());
        assert!(record.homepage.is_none());
        // Absent last_seen defaults to the deserialization time
        assert!(record.last_seen >= before);
    }

    #[test]
    fn test_snapshot_default_is_empty() {
        let snapshot = RegistrySnapshot::default();
        assert!(snapshot.tools.is_empty());
        assert!(snapshot.last_scan.is_none());
    }
}
