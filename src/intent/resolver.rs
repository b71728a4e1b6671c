//! Intent resolution
//!
//! [`IntentResolver`] turns free text into a [`Classification`]. When a
//! [`Classifier`] backend is configured its verdict is used; any backend
//! error, timeout, or unmappable verdict falls back to the deterministic
//! rules. The fallback is logged but never surfaced to the caller.

use super::classifier::Classifier;
use super::fallback;
use super::params;
use super::types::{Action, Classification, ExecuteParams};
use super::verdict::{Verdict, VerdictKind};
use crate::registry::{ToolRecord, ToolRegistry};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Default bound on one classifier call
pub const DEFAULT_CLASSIFIER_TIMEOUT: Duration = Duration::from_secs(15);

/// Parameter keys accepted for a tool name
const NAME_KEYS: &[&str] = &["toolName", "tool_name", "name", "tool"];
/// Parameter keys accepted for a tool id
const ID_KEYS: &[&str] = &["toolId", "tool_id", "id"];

/// Classifies user text into typed tool actions
#[derive(Clone)]
pub struct IntentResolver {
    registry: ToolRegistry,
    classifier: Option<Arc<dyn Classifier>>,
    namespace: String,
    timeout: Duration,
}

impl IntentResolver {
    /// Creates a rules-only resolver
    pub fn new(registry: ToolRegistry, namespace: impl Into<String>) -> Self {
        Self {
            registry,
            classifier: None,
            namespace: namespace.into(),
            timeout: DEFAULT_CLASSIFIER_TIMEOUT,
        }
    }

    /// Attaches a classifier backend
    pub fn with_classifier(mut self, classifier: Arc<dyn Classifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Bounds each classifier call
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Classifies `text` for a user with the given installed tool ids
    pub async fn classify(&self, text: &str, installed: &HashSet<String>) -> Classification {
        if text.trim().is_empty() {
            return Classification::rules(Action::Unknown, 0.0, text);
        }

        let records = self.installed_records(installed);

        if let Some(classifier) = &self.classifier {
            match tokio::time::timeout(self.timeout, classifier.classify(text, &records)).await {
                Ok(Ok(verdict)) => {
                    debug!(
                        backend = classifier.name(),
                        kind = ?verdict.kind,
                        confidence = verdict.confidence,
                        "Classifier verdict"
                    );
                    if let Some(classification) = self.from_verdict(verdict, text) {
                        return classification;
                    }
                    warn!(
                        backend = classifier.name(),
                        "Verdict missing required parameters, using rules"
                    );
                }
                Ok(Err(e)) => {
                    warn!(backend = classifier.name(), error = %e, "Classifier failed, using rules");
                }
                Err(_) => {
                    warn!(
                        backend = classifier.name(),
                        timeout_secs = self.timeout.as_secs(),
                        "Classifier timed out, using rules"
                    );
                }
            }
        }

        fallback::classify_with_rules(text, &records, &self.namespace)
    }

    /// Classifies with the deterministic rules only
    pub fn classify_with_rules(&self, text: &str, installed: &HashSet<String>) -> Classification {
        let records = self.installed_records(installed);
        fallback::classify_with_rules(text, &records, &self.namespace)
    }

    /// Looks up installed ids in the registry; ids with no record become
    /// name-only placeholders so the rules can still match on them
    fn installed_records(&self, installed: &HashSet<String>) -> Vec<ToolRecord> {
        installed
            .iter()
            .map(|id| {
                self.registry.get(id).unwrap_or_else(|| {
                    let name = id.rsplit('.').next().unwrap_or(id);
                    ToolRecord::new(id, name)
                })
            })
            .collect()
    }

    /// Maps a verdict onto a classification, or None when a required
    /// parameter is missing
    fn from_verdict(&self, verdict: Verdict, text: &str) -> Option<Classification> {
        let confidence = verdict.confidence;
        let reasoning = verdict.reasoning.clone();

        let action = match verdict.kind {
            VerdictKind::Install => {
                let name = self.bare_name(&verdict)?;
                let tool_id = self.tool_id(&verdict, &name);
                Action::Install {
                    tool_name: name,
                    tool_id,
                }
            }
            VerdictKind::Uninstall => {
                let name = self.bare_name(&verdict)?;
                let tool_id = self.tool_id(&verdict, &name);
                Action::Uninstall {
                    tool_name: name,
                    tool_id,
                }
            }
            VerdictKind::Execute => {
                let raw = verdict.param(ID_KEYS).or_else(|| verdict.param(NAME_KEYS))?;
                let tool_id = self.qualify(raw);
                let params = ExecuteParams {
                    query: verdict
                        .param(&["query", "searchTerm", "q"])
                        .map(str::to_string)
                        .or_else(|| params::extract_query(text)),
                    location: verdict
                        .param(&["location", "place"])
                        .map(str::to_string)
                        .or_else(|| params::extract_location(text)),
                };
                Action::Execute { tool_id, params }
            }
            VerdictKind::Search => Action::Search {
                query: verdict
                    .param(&["query", "searchTerm", "q"])
                    .map(str::to_string)
                    .or_else(|| params::extract_query(text)),
            },
            VerdictKind::List => Action::List,
            VerdictKind::Help => Action::Help,
            // A punt from the model: let the rules have a go
            VerdictKind::Unknown => return None,
        };

        Some(Classification::model(action, confidence, text, reasoning))
    }

    fn bare_name(&self, verdict: &Verdict) -> Option<String> {
        if let Some(name) = verdict.param(NAME_KEYS) {
            return Some(name.rsplit('.').next().unwrap_or(name).to_lowercase());
        }
        verdict
            .param(ID_KEYS)
            .and_then(|id| id.rsplit('.').next())
            .map(str::to_lowercase)
    }

    fn tool_id(&self, verdict: &Verdict, name: &str) -> String {
        match verdict.param(ID_KEYS) {
            Some(id) if id.contains('.') => id.to_string(),
            _ => self.qualify(name),
        }
    }

    fn qualify(&self, name: &str) -> String {
        if name.contains('.') {
            name.to_string()
        } else {
            format!("{}.{}", self.namespace, name.to_lowercase())
        }
    }
}
