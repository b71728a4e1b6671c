//! Classified intent types
//!
//! A [`Classification`] is the engine's typed view of one piece of user text:
//! a closed [`Action`] union, a confidence score, and a provenance marker
//! saying whether the model or the deterministic rules produced it.
//! Classifications are transient; they are built per request and never
//! persisted.

use serde::Serialize;

/// Bare name of the built-in media tool, executable without installation
pub const BUILTIN_MEDIA_NAME: &str = "giphy";

/// Qualified id of the built-in media tool for a namespace
pub fn builtin_media_tool(namespace: &str) -> String {
    format!("{namespace}.{BUILTIN_MEDIA_NAME}")
}

/// Parameters extracted for an execute action.
///
/// Extraction is best effort: an absent field means no pattern matched, which
/// is a normal outcome, not an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExecuteParams {
    /// Free-text search/content query
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// Place name following a location preposition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl ExecuteParams {
    /// Params carrying only a query
    pub fn with_query(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            location: None,
        }
    }
}

/// The typed action a piece of user text is asking for
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    /// Install a tool by name
    Install {
        /// Bare tool name as the user wrote it
        tool_name: String,
        /// Namespace-qualified identifier
        tool_id: String,
    },
    /// Uninstall a tool by name
    Uninstall {
        /// Bare tool name as the user wrote it
        tool_name: String,
        /// Namespace-qualified identifier
        tool_id: String,
    },
    /// Invoke an installed (or built-in) tool
    Execute {
        /// Namespace-qualified identifier of the chosen tool
        tool_id: String,
        /// Extracted call parameters
        params: ExecuteParams,
    },
    /// Search the registry / feed for tools
    Search {
        /// Query text, when one could be extracted
        query: Option<String>,
    },
    /// List the user's installed tools
    List,
    /// Show usage help
    Help,
    /// Nothing recognizable
    Unknown,
}

impl Action {
    /// Short kind name for logging and output
    pub fn kind(&self) -> &'static str {
        match self {
            Action::Install { .. } => "install",
            Action::Uninstall { .. } => "uninstall",
            Action::Execute { .. } => "execute",
            Action::Search { .. } => "search",
            Action::List => "list",
            Action::Help => "help",
            Action::Unknown => "unknown",
        }
    }
}

/// Which path produced a classification
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "path", rename_all = "snake_case")]
pub enum ClassificationSource {
    /// The external classifier, with its stated reasoning if any
    Model {
        /// Model-provided reasoning text
        reasoning: Option<String>,
    },
    /// The deterministic fallback rules
    Rules,
}

/// A classified request: action, confidence, and provenance
#[derive(Debug, Clone, Serialize)]
pub struct Classification {
    /// The resolved action
    pub action: Action,
    /// Certainty estimate in [0, 1]
    pub confidence: f32,
    /// The original input text
    pub text: String,
    /// Which path produced this classification
    pub source: ClassificationSource,
}

impl Classification {
    /// A classification produced by the deterministic rules
    pub fn rules(action: Action, confidence: f32, text: impl Into<String>) -> Self {
        Self {
            action,
            confidence,
            text: text.into(),
            source: ClassificationSource::Rules,
        }
    }

    /// A classification produced by the external classifier
    pub fn model(
        action: Action,
        confidence: f32,
        text: impl Into<String>,
        reasoning: Option<String>,
    ) -> Self {
        Self {
            action,
            confidence: confidence.clamp(0.0, 1.0),
            text: text.into(),
            source: ClassificationSource::Model { reasoning },
        }
    }

    /// True when the rules path produced this classification
    pub fn from_rules(&self) -> bool {
        self.source == ClassificationSource::Rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_media_tool_is_namespace_qualified() {
        assert_eq!(builtin_media_tool("tools"), "tools.giphy");
        assert_eq!(builtin_media_tool("caps"), "caps.giphy");
    }

    #[test]
    fn test_action_kind_names() {
        let install = Action::Install {
            tool_name: "giphy".to_string(),
            tool_id: "tools.giphy".to_string(),
        };
        assert_eq!(install.kind(), "install");
        assert_eq!(Action::List.kind(), "list");
        assert_eq!(Action::Unknown.kind(), "unknown");
    }

    #[test]
    fn test_model_classification_clamps_confidence() {
        let c = Classification::model(Action::Help, 1.7, "help", None);
        assert_eq!(c.confidence, 1.0);
        assert!(!c.from_rules());

        let c = Classification::rules(Action::Help, 0.9, "help");
        assert!(c.from_rules());
    }
}
