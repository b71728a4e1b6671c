//! Tool mention extraction from post text
//!
//! Posts mention tools in two shapes: fully qualified identifiers
//! (`tools.giphy`) and install phrases (`install giphy`), which are
//! normalized to the same namespace. Mentions are deduplicated per post,
//! preserving first-occurrence order.

use regex::Regex;

/// Compiles the mention patterns for one identifier namespace
#[derive(Clone)]
pub struct MentionExtractor {
    namespace: String,
    qualified: Regex,
    install_phrase: Regex,
}

impl MentionExtractor {
    /// Builds an extractor for the given namespace (e.g. `tools`)
    pub fn new(namespace: &str) -> Self {
        let ns = regex::escape(namespace);
        Self {
            namespace: namespace.to_string(),
            // Identifier mentions: tools.giphy
            qualified: Regex::new(&format!(r"(?i)\b{ns}\.(\w+)")).unwrap(),
            // Install phrases: "install giphy"
            install_phrase: Regex::new(r"(?i)\binstall\s+(\w+)").unwrap(),
        }
    }

    /// The namespace mentions are normalized into
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Qualifies a bare tool name into the namespace, lowercased
    pub fn qualify(&self, name: &str) -> String {
        format!("{}.{}", self.namespace, name.to_lowercase())
    }

    /// Extracts deduplicated tool ids mentioned in a post
    pub fn extract(&self, text: &str) -> Vec<String> {
        let mut mentions = Vec::new();

        for capture in self.qualified.captures_iter(text) {
            if let Some(token) = capture.get(1) {
                push_unique(&mut mentions, self.qualify(token.as_str()));
            }
        }
        for capture in self.install_phrase.captures_iter(text) {
            if let Some(token) = capture.get(1) {
                push_unique(&mut mentions, self.qualify(token.as_str()));
            }
        }

        mentions
    }
}

fn push_unique(mentions: &mut Vec<String>, id: String) {
    if !mentions.contains(&id) {
        mentions.push(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualified_mentions() {
        let extractor = MentionExtractor::new("tools");
        let mentions = extractor.extract("check out tools.giphy and tools.weather!");
        assert_eq!(mentions, vec!["tools.giphy", "tools.weather"]);
    }

    #[test]
    fn test_install_phrase_mentions() {
        let extractor = MentionExtractor::new("tools");
        let mentions = extractor.extract("you should install giphy right now");
        assert_eq!(mentions, vec!["tools.giphy"]);
    }

    #[test]
    fn test_mixed_mentions_deduplicate() {
        let extractor = MentionExtractor::new("tools");
        let mentions = extractor.extract("install giphy, it lives at tools.giphy");
        assert_eq!(mentions, vec!["tools.giphy"]);
    }

    #[test]
    fn test_mentions_are_case_normalized() {
        let extractor = MentionExtractor::new("tools");
        let mentions = extractor.extract("Install GIPHY or Tools.Weather");
        assert_eq!(mentions, vec!["tools.weather", "tools.giphy"]);
    }

    #[test]
    fn test_no_mentions() {
        let extractor = MentionExtractor::new("tools");
        assert!(extractor.extract("just a normal post about cats").is_empty());
        assert!(extractor.extract("").is_empty());
    }

    #[test]
    fn test_other_namespace_ignored() {
        let extractor = MentionExtractor::new("tools");
        assert!(extractor.extract("see apps.giphy for details").is_empty());
    }

    #[test]
    fn test_custom_namespace() {
        let extractor = MentionExtractor::new("caps");
        assert_eq!(extractor.extract("caps.maps is great"), vec!["caps.maps"]);
        assert_eq!(extractor.qualify("Maps"), "caps.maps");
    }
}
