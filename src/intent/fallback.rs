//! Deterministic classification rules
//!
//! The fallback path when the external classifier is unavailable or returns
//! something unusable. Rules are evaluated in a fixed priority order:
//! install, uninstall, list, search, help, best-matching installed tool,
//! unknown. Phrase rules carry fixed confidences; the tool-match rule computes
//! one and must clear a threshold to fire.

use super::params;
use super::types::{builtin_media_tool, Action, Classification, ExecuteParams};
use crate::registry::ToolRecord;
use regex::Regex;
use std::sync::OnceLock;

/// Confidence for install / uninstall / help phrase rules
pub const PHRASE_CONFIDENCE: f32 = 0.9;
/// Confidence for list / search phrase rules
pub const LIST_SEARCH_CONFIDENCE: f32 = 0.8;
/// Confidence for the built-in media tool last resort
pub const BUILTIN_MEDIA_CONFIDENCE: f32 = 0.7;
/// Minimum computed score for the installed-tool match rule to fire
pub const TOOL_MATCH_THRESHOLD: f32 = 0.3;

/// Score weights for matching an installed tool against the message
const WEIGHT_NAME: f32 = 0.4;
const WEIGHT_CAPABILITY: f32 = 0.2;
const WEIGHT_TAG: f32 = 0.1;
const WEIGHT_DESC_WORD: f32 = 0.05;

/// Classifies text with the deterministic rules only
pub fn classify_with_rules(
    text: &str,
    installed: &[ToolRecord],
    namespace: &str,
) -> Classification {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Classification::rules(Action::Unknown, 0.0, text);
    }
    let lower = trimmed.to_lowercase();

    if let Some(name) = extract_install_name(&lower) {
        let tool_id = format!("{namespace}.{name}");
        return Classification::rules(
            Action::Install {
                tool_name: name,
                tool_id,
            },
            PHRASE_CONFIDENCE,
            text,
        );
    }

    if let Some(name) = extract_uninstall_name(&lower) {
        let tool_id = format!("{namespace}.{name}");
        return Classification::rules(
            Action::Uninstall {
                tool_name: name,
                tool_id,
            },
            PHRASE_CONFIDENCE,
            text,
        );
    }

    if is_list_phrase(&lower) {
        return Classification::rules(Action::List, LIST_SEARCH_CONFIDENCE, text);
    }

    if is_search_phrase(&lower) {
        return Classification::rules(
            Action::Search {
                query: params::extract_query(trimmed),
            },
            LIST_SEARCH_CONFIDENCE,
            text,
        );
    }

    if is_help_phrase(&lower) {
        return Classification::rules(Action::Help, PHRASE_CONFIDENCE, text);
    }

    if let Some((record, score)) = best_tool_match(installed, &lower) {
        if score > TOOL_MATCH_THRESHOLD {
            return Classification::rules(
                Action::Execute {
                    tool_id: record.id.clone(),
                    params: params::extract_params(&record.capabilities, trimmed),
                },
                score,
                text,
            );
        }
    }

    // Last resort: media requests go to the built-in tool, which does not
    // require installation
    if params::mentions_media(&lower) {
        let query = params::extract_media_query(trimmed).or_else(|| params::extract_query(trimmed));
        return Classification::rules(
            Action::Execute {
                tool_id: builtin_media_tool(namespace),
                params: ExecuteParams {
                    query,
                    location: None,
                },
            },
            BUILTIN_MEDIA_CONFIDENCE,
            text,
        );
    }

    Classification::rules(Action::Unknown, 0.0, text)
}

/// Scores one installed tool against the (lowercased) message.
///
/// 0.4 for the name appearing, 0.2 per capability tag, 0.1 per topical tag,
/// 0.05 per description word longer than three characters, clamped to 1.0.
pub fn tool_match_score(record: &ToolRecord, message: &str) -> f32 {
    let mut score = 0.0;

    if !record.name.is_empty() && message.contains(&record.name.to_lowercase()) {
        score += WEIGHT_NAME;
    }
    for capability in &record.capabilities {
        if !capability.is_empty() && message.contains(&capability.to_lowercase()) {
            score += WEIGHT_CAPABILITY;
        }
    }
    for tag in &record.tags {
        if !tag.is_empty() && message.contains(&tag.to_lowercase()) {
            score += WEIGHT_TAG;
        }
    }
    for word in record.description.split_whitespace() {
        let word = word
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        if word.len() > 3 && message.contains(&word) {
            score += WEIGHT_DESC_WORD;
        }
    }

    score.min(1.0)
}

/// Highest-scoring installed tool for the message, if any are installed
pub fn best_tool_match<'a>(
    installed: &'a [ToolRecord],
    message: &str,
) -> Option<(&'a ToolRecord, f32)> {
    installed
        .iter()
        .map(|record| (record, tool_match_score(record, message)))
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
}

/// Tool name from an install phrase, if one fires
pub fn extract_install_name(lower: &str) -> Option<String> {
    if let Some(rest) = lower.strip_prefix("install ") {
        return Some(first_token(rest));
    }
    keyword_capture(lower, install_keyword_re())
}

/// Tool name from an uninstall phrase, if one fires
pub fn extract_uninstall_name(lower: &str) -> Option<String> {
    if let Some(rest) = lower.strip_prefix("uninstall ") {
        return Some(first_token(rest));
    }
    keyword_capture(lower, uninstall_keyword_re())
}

/// First word-run of `rest`, or the whole trimmed remainder
fn first_token(rest: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"(\w+)").unwrap());
    re.captures(rest)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| rest.trim().to_string())
}

fn keyword_capture(lower: &str, re: &Regex) -> Option<String> {
    re.captures(lower)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

fn install_keyword_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(?:add|get)\s+(\w+)").unwrap())
}

fn uninstall_keyword_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(?:remove|delete)\s+(\w+)").unwrap())
}

fn is_list_phrase(lower: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(?:list|installed)\b|\bmy tools\b|what do i have").unwrap())
        .is_match(lower)
}

fn is_search_phrase(lower: &str) -> bool {
    lower.starts_with("search")
        || lower.starts_with("find ")
        || lower.contains("search for")
        || lower.contains("look for")
        || lower.contains("look up")
}

fn is_help_phrase(lower: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bhelp\b|what can you do|how do i\b").unwrap())
        .is_match(lower)
}
