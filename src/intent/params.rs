//! Best-effort parameter extraction from request text
//!
//! Extraction is keyed by the selected tool's capability tags: media tools
//! get the text after a media keyword, location tools get the text after a
//! location preposition, search tools get quoted text or the text after a
//! search verb. No pattern matching just leaves the parameter unset.

use super::types::ExecuteParams;
use regex::Regex;
use std::sync::OnceLock;

fn quoted_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""([^"]+)"|'([^']+)'"#).unwrap())
}

fn search_verb_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(?:search\s+for|search|find|look\s*up|show\s+me)\s+(.+?)\s*[.!?]*$")
            .unwrap()
    })
}

fn media_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(?:gifs?|memes?|stickers?)\s+(?:of|about|with|for)\s+(.+?)\s*[.!?]*$")
            .unwrap()
    })
}

fn location_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(?:in|at|near)\s+(.+?)\s*[.!?]*$").unwrap())
}

/// Quoted text, or the text following a search-style verb
pub fn extract_query(text: &str) -> Option<String> {
    if let Some(captures) = quoted_re().captures(text) {
        let hit = captures.get(1).or_else(|| captures.get(2))?;
        return Some(hit.as_str().trim().to_string());
    }
    search_verb_re()
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// The subject following a media keyword ("gif of cats" -> "cats")
pub fn extract_media_query(text: &str) -> Option<String> {
    media_re()
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// The place following a location preposition
pub fn extract_location(text: &str) -> Option<String> {
    location_re()
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// True if the text mentions media content at all
pub fn mentions_media(text: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(?:gifs?|memes?|stickers?)\b").unwrap())
        .is_match(text)
}

/// Extracts call parameters for a tool with the given capability tags
pub fn extract_params(capabilities: &[String], text: &str) -> ExecuteParams {
    let has = |tag: &str| capabilities.iter().any(|c| c.eq_ignore_ascii_case(tag));
    let mut params = ExecuteParams::default();

    if has("media") {
        params.query = extract_media_query(text).or_else(|| extract_query(text));
    } else if has("search") {
        params.query = extract_query(text);
    }
    if has("location") || has("weather") {
        params.location = extract_location(text);
        if params.query.is_none() {
            params.query = extract_query(text);
        }
    }
    if !has("media") && !has("search") && !has("location") && !has("weather") {
        // No capability hint: take whatever the text offers
        params.query = extract_query(text);
        params.location = extract_location(text);
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoted_query_wins() {
        assert_eq!(
            extract_query(r#"search for "space cats" please"#),
            Some("space cats".to_string())
        );
        assert_eq!(
            extract_query("find 'weather tools'"),
            Some("weather tools".to_string())
        );
    }

    #[test]
    fn test_search_verb_query() {
        assert_eq!(
            extract_query("search for weather tools"),
            Some("weather tools".to_string())
        );
        assert_eq!(extract_query("find giphy"), Some("giphy".to_string()));
        assert_eq!(extract_query("hello there"), None);
    }

    #[test]
    fn test_media_query() {
        assert_eq!(
            extract_media_query("show me a gif of cats"),
            Some("cats".to_string())
        );
        assert_eq!(
            extract_media_query("gifs about monday mornings!"),
            Some("monday mornings".to_string())
        );
        assert_eq!(extract_media_query("show me a gif"), None);
    }

    #[test]
    fn test_location() {
        assert_eq!(
            extract_location("what's the weather in san francisco?"),
            Some("san francisco".to_string())
        );
        assert_eq!(
            extract_location("restaurants near union square"),
            Some("union square".to_string())
        );
        assert_eq!(extract_location("no places here"), None);
    }

    #[test]
    fn test_mentions_media() {
        assert!(mentions_media("show me a gif of cats"));
        assert!(mentions_media("send a MEME"));
        assert!(!mentions_media("gift ideas")); // "gift" is not "gif"
        assert!(!mentions_media("what's the weather"));
    }

    #[test]
    fn test_extract_params_media_tool() {
        let caps = vec!["media".to_string(), "search".to_string()];
        let params = extract_params(&caps, "show me a gif of cats");
        assert_eq!(params.query, Some("cats".to_string()));
        assert_eq!(params.location, None);
    }

    #[test]
    fn test_extract_params_location_tool() {
        let caps = vec!["location".to_string()];
        let params = extract_params(&caps, "weather in tokyo");
        assert_eq!(params.location, Some("tokyo".to_string()));
    }

    #[test]
    fn test_extract_params_search_tool() {
        let caps = vec!["search".to_string()];
        let params = extract_params(&caps, r#"look up "rust macros""#);
        assert_eq!(params.query, Some("rust macros".to_string()));
    }

    #[test]
    fn test_extract_params_no_match_leaves_unset() {
        let caps = vec!["media".to_string()];
        let params = extract_params(&caps, "do something");
        assert_eq!(params, ExecuteParams::default());
    }
}
