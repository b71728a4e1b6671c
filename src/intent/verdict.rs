//! Classifier verdict parsing
//!
//! The external classifier is asked for a JSON object but models wrap their
//! answers in prose or markdown fences often enough that parsing has to dig
//! the object out first. A verdict that cannot be parsed or names an unknown
//! intent kind is an error here; the resolver turns any such error into the
//! deterministic fallback path.

use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors raised while parsing a classifier response
#[derive(Debug, Clone, Error)]
pub enum VerdictError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),
    #[error("Missing required field: {0}")]
    MissingField(String),
    #[error("Unknown intent kind: {0}")]
    UnknownKind(String),
}

/// Intent kind as reported by the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerdictKind {
    Install,
    Uninstall,
    Execute,
    Search,
    List,
    Help,
    Unknown,
}

impl VerdictKind {
    fn parse(raw: &str) -> Result<Self, VerdictError> {
        match raw.trim().to_lowercase().as_str() {
            "install" => Ok(VerdictKind::Install),
            "uninstall" => Ok(VerdictKind::Uninstall),
            "execute" | "execute_tool" | "use" => Ok(VerdictKind::Execute),
            "search" => Ok(VerdictKind::Search),
            "list" => Ok(VerdictKind::List),
            "help" => Ok(VerdictKind::Help),
            "unknown" | "none" => Ok(VerdictKind::Unknown),
            other => Err(VerdictError::UnknownKind(other.to_string())),
        }
    }
}

/// Wire shape of the classifier's JSON answer
#[derive(Debug, Deserialize)]
struct RawVerdict {
    #[serde(alias = "intent", alias = "kind")]
    r#type: Option<String>,
    confidence: Option<f32>,
    #[serde(default)]
    parameters: Map<String, Value>,
    reasoning: Option<String>,
}

/// A validated classifier verdict
#[derive(Debug, Clone)]
pub struct Verdict {
    /// Reported intent kind
    pub kind: VerdictKind,
    /// Confidence, clamped to [0, 1]
    pub confidence: f32,
    /// Loosely structured extracted parameters
    pub parameters: Map<String, Value>,
    /// Model-provided reasoning, if any
    pub reasoning: Option<String>,
}

impl Verdict {
    /// Fetches a string parameter under any of the given keys
    pub fn param(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .find_map(|k| self.parameters.get(*k).and_then(Value::as_str))
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Parses a raw classifier response into a validated verdict
pub fn parse_verdict(response: &str) -> Result<Verdict, VerdictError> {
    debug!("parsing classifier response ({} chars)", response.len());
    let json_str = extract_json_from_response(response)?;

    let raw: RawVerdict = serde_json::from_str(&json_str).map_err(|e| {
        warn!("classifier JSON parse error: {}", e);
        VerdictError::InvalidJson(format!(
            "{}: {}",
            e,
            json_str.chars().take(100).collect::<String>()
        ))
    })?;

    let kind_raw = raw
        .r#type
        .ok_or_else(|| VerdictError::MissingField("type".to_string()))?;
    let kind = VerdictKind::parse(&kind_raw)?;

    let confidence_raw = raw
        .confidence
        .ok_or_else(|| VerdictError::MissingField("confidence".to_string()))?;
    let confidence = confidence_raw.clamp(0.0, 1.0);
    if confidence != confidence_raw {
        warn!(
            "classifier confidence {} out of range, clamped to {}",
            confidence_raw, confidence
        );
    }

    Ok(Verdict {
        kind,
        confidence,
        parameters: raw.parameters,
        reasoning: raw.reasoning,
    })
}

/// Pulls the first JSON object out of a possibly prose-wrapped response
pub fn extract_json_from_response(response: &str) -> Result<String, VerdictError> {
    let trimmed = response.trim();

    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        return Ok(trimmed.to_string());
    }

    if trimmed.contains("```") {
        return extract_from_markdown_block(trimmed);
    }

    if let Some(start) = trimmed.find('{') {
        if let Some(end) = trimmed.rfind('}') {
            if start < end {
                return Ok(trimmed[start..=end].to_string());
            }
        }
    }

    Err(VerdictError::InvalidJson(
        "No JSON object found in response".to_string(),
    ))
}

fn extract_from_markdown_block(text: &str) -> Result<String, VerdictError> {
    let re = Regex::new(r"```(?:json)?\s*\n?([\s\S]*?)\n?```").unwrap();

    if let Some(captures) = re.captures(text) {
        if let Some(json_match) = captures.get(1) {
            let json = json_match.as_str().trim();
            if json.starts_with('{') && json.ends_with('}') {
                return Ok(json.to_string());
            }
        }
    }

    Err(VerdictError::InvalidJson(
        "Could not extract JSON from markdown block".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_verdict_plain_json() {
        let response = r#"{
            "type": "install",
            "confidence": 0.92,
            "parameters": {"toolName": "giphy"},
            "reasoning": "User asked to install a tool"
        }"#;

        let verdict = parse_verdict(response).unwrap();
        assert_eq!(verdict.kind, VerdictKind::Install);
        assert_eq!(verdict.confidence, 0.92);
        assert_eq!(verdict.param(&["toolName"]), Some("giphy"));
        assert!(verdict.reasoning.is_some());
    }

    #[test]
    fn test_parse_verdict_accepts_intent_alias() {
        let response = r#"{"intent": "list", "confidence": 0.8}"#;
        let verdict = parse_verdict(response).unwrap();
        assert_eq!(verdict.kind, VerdictKind::List);
        assert!(verdict.parameters.is_empty());
    }

    #[test]
    fn test_parse_verdict_from_markdown_fence() {
        let response = "Here is my answer:\n```json\n{\"type\": \"help\", \"confidence\": 0.9}\n```\nDone.";
        let verdict = parse_verdict(response).unwrap();
        assert_eq!(verdict.kind, VerdictKind::Help);
    }

    #[test]
    fn test_parse_verdict_embedded_in_prose() {
        let response = r#"I classified it as {"type": "search", "confidence": 0.75, "parameters": {"query": "weather tools"}} based on the phrasing."#;
        let verdict = parse_verdict(response).unwrap();
        assert_eq!(verdict.kind, VerdictKind::Search);
        assert_eq!(verdict.param(&["query"]), Some("weather tools"));
    }

    #[test]
    fn test_parse_verdict_clamps_confidence() {
        let response = r#"{"type": "help", "confidence": 1.4}"#;
        let verdict = parse_verdict(response).unwrap();
        assert_eq!(verdict.confidence, 1.0);

        let response = r#"{"type": "help", "confidence": -0.2}"#;
        let verdict = parse_verdict(response).unwrap();
        assert_eq!(verdict.confidence, 0.0);
    }

    #[test]
    fn test_parse_verdict_missing_fields() {
        assert!(matches!(
            parse_verdict(r#"{"confidence": 0.9}"#),
            Err(VerdictError::MissingField(_))
        ));
        assert!(matches!(
            parse_verdict(r#"{"type": "install"}"#),
            Err(VerdictError::MissingField(_))
        ));
    }

    #[test]
    fn test_parse_verdict_unknown_kind() {
        let result = parse_verdict(r#"{"type": "reboot", "confidence": 0.9}"#);
        assert!(matches!(result, Err(VerdictError::UnknownKind(_))));
    }

    #[test]
    fn test_parse_verdict_not_json() {
        let result = parse_verdict("I think the user wants to install giphy");
        assert!(matches!(result, Err(VerdictError::InvalidJson(_))));
    }

    #[test]
    fn test_param_lookup_aliases_and_blanks() {
        let verdict = parse_verdict(
            r#"{"type": "install", "confidence": 0.9,
                "parameters": {"tool_name": "weather", "query": "  "}}"#,
        )
        .unwrap();

        assert_eq!(verdict.param(&["toolName", "tool_name"]), Some("weather"));
        // Blank values are treated as absent
        assert_eq!(verdict.param(&["query"]), None);
        assert_eq!(verdict.param(&["missing"]), None);
    }

    #[test]
    fn test_extract_json_variants() {
        assert!(extract_json_from_response(r#"{"a": 1}"#).is_ok());
        assert!(extract_json_from_response("  \n {\"a\": 1} \n ").is_ok());
        assert!(extract_json_from_response("```\n{\"a\": 1}\n```").is_ok());
        assert!(extract_json_from_response("plain text only").is_err());
    }
}
