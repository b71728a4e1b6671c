//! External classifier backends
//!
//! A [`Classifier`] turns a user message into a [`Verdict`] using an external
//! model. The genai-backed implementation supports multiple providers
//! (Ollama, OpenAI, Claude, Gemini, Grok, Groq); [`MockClassifier`] serves
//! tests with canned verdicts.

use super::verdict::{parse_verdict, Verdict, VerdictError};
use crate::registry::ToolRecord;
use async_trait::async_trait;
use genai::adapter::AdapterKind;
use genai::chat::{ChatMessage, ChatOptions, ChatRequest};
use genai::Client;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};

/// Errors from a classifier backend
#[derive(Debug, Clone, Error)]
pub enum ClassifierError {
    /// The provider API rejected or failed the request
    #[error("{provider} request failed: {message}")]
    Api { provider: String, message: String },

    /// The request did not complete within the configured timeout
    #[error("Classifier request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// The model responded, but not with a usable verdict
    #[error("Unusable classifier output: {0}")]
    Verdict(#[from] VerdictError),
}

/// A backend that classifies free text into a tool verdict
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classifies `text` given the user's installed tools
    async fn classify(
        &self,
        text: &str,
        installed: &[ToolRecord],
    ) -> Result<Verdict, ClassifierError>;

    /// Backend name for logging
    fn name(&self) -> &str;

    /// Model identifier, if the backend has one
    fn model_info(&self) -> Option<String> {
        None
    }
}

const SYSTEM_PROMPT: &str = r#"You classify a user message into a tool action.

Respond with a single JSON object and nothing else:
{"type": "<install|uninstall|execute|search|list|help|unknown>",
 "confidence": <0.0-1.0>,
 "parameters": {"toolName": "...", "toolId": "...", "query": "...", "location": "..."},
 "reasoning": "<one sentence>"}

Only include parameters that apply. Use "execute" when the message asks an
installed tool (or a media request) to do something, "install"/"uninstall"
for managing tools, "search" for finding new tools, "list" for showing
installed tools, "help" for usage questions, and "unknown" otherwise."#;

/// GenAI-backed classifier supporting multiple providers
pub struct GenAiClassifier {
    client: Client,
    model: String,
    provider: AdapterKind,
    timeout: Duration,
}

impl GenAiClassifier {
    /// Creates a classifier for the given provider and model
    pub fn new(provider: AdapterKind, model: String, timeout: Duration) -> Self {
        debug!(
            "Creating classifier: provider={}, model={}",
            provider.as_str(),
            model,
        );
        Self {
            client: Client::default(),
            model,
            provider,
            timeout,
        }
    }

    fn build_prompt(text: &str, installed: &[ToolRecord]) -> String {
        let mut prompt = String::new();
        if installed.is_empty() {
            prompt.push_str("The user has no tools installed.\n");
        } else {
            prompt.push_str("Installed tools:\n");
            for record in installed {
                prompt.push_str(&format!(
                    "- {} ({}): {}\n",
                    record.name, record.id, record.description
                ));
            }
        }
        prompt.push_str("\nUser message: ");
        prompt.push_str(text);
        prompt
    }
}

#[async_trait]
impl Classifier for GenAiClassifier {
    async fn classify(
        &self,
        text: &str,
        installed: &[ToolRecord],
    ) -> Result<Verdict, ClassifierError> {
        let request = ChatRequest::new(vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(Self::build_prompt(text, installed)),
        ]);
        let options = ChatOptions::default().with_temperature(0.0);

        let response = match tokio::time::timeout(
            self.timeout,
            self.client
                .exec_chat(&self.model, request, Some(&options)),
        )
        .await
        {
            Ok(Ok(resp)) => resp,
            Ok(Err(e)) => {
                error!("{} API error: {}", self.provider.as_str(), e);
                return Err(ClassifierError::Api {
                    provider: self.provider.as_str().to_string(),
                    message: e.to_string(),
                });
            }
            Err(_) => {
                error!(
                    "{} request timed out after {}s",
                    self.provider.as_str(),
                    self.timeout.as_secs()
                );
                return Err(ClassifierError::Timeout {
                    seconds: self.timeout.as_secs(),
                });
            }
        };

        let content = response.first_text().unwrap_or_default().to_string();
        Ok(parse_verdict(&content)?)
    }

    fn name(&self) -> &str {
        self.provider.as_str()
    }

    fn model_info(&self) -> Option<String> {
        Some(self.model.clone())
    }
}

impl std::fmt::Debug for GenAiClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenAiClassifier")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// A canned classifier outcome for tests
#[derive(Debug, Clone)]
pub enum MockOutcome {
    /// Raw model text, run through verdict parsing like real output
    Text(String),
    /// A backend error
    Error(ClassifierError),
}

impl MockOutcome {
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text(content.into())
    }

    pub fn error(error: ClassifierError) -> Self {
        Self::Error(error)
    }
}

/// Queue-backed classifier for tests
pub struct MockClassifier {
    outcomes: Mutex<VecDeque<MockOutcome>>,
    delay: Option<Duration>,
}

impl MockClassifier {
    pub fn new() -> Self {
        Self {
            outcomes: Mutex::new(VecDeque::new()),
            delay: None,
        }
    }

    /// Pauses for `delay` before each response, for timeout tests
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            outcomes: Mutex::new(VecDeque::new()),
            delay: Some(delay),
        }
    }

    pub fn add_outcome(&self, outcome: MockOutcome) {
        self.outcomes.lock().unwrap().push_back(outcome);
    }

    pub fn remaining_outcomes(&self) -> usize {
        self.outcomes.lock().unwrap().len()
    }
}

impl Default for MockClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Classifier for MockClassifier {
    async fn classify(
        &self,
        _text: &str,
        _installed: &[ToolRecord],
    ) -> Result<Verdict, ClassifierError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let outcome = self.outcomes.lock().unwrap().pop_front();
        match outcome {
            Some(MockOutcome::Text(content)) => Ok(parse_verdict(&content)?),
            Some(MockOutcome::Error(error)) => Err(error),
            None => Err(ClassifierError::Api {
                provider: "mock".to_string(),
                message: "no outcomes queued".to_string(),
            }),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::verdict::VerdictKind;

    #[tokio::test]
    async fn test_mock_classifier_serves_queued_text() {
        let mock = MockClassifier::new();
        mock.add_outcome(MockOutcome::text(
            r#"{"type": "install", "confidence": 0.9, "parameters": {"toolName": "giphy"}}"#,
        ));

        let verdict = mock.classify("install giphy", &[]).await.unwrap();
        assert_eq!(verdict.kind, VerdictKind::Install);
        assert_eq!(verdict.param(&["toolName"]), Some("giphy"));
        assert_eq!(mock.remaining_outcomes(), 0);
    }

    #[tokio::test]
    async fn test_mock_classifier_serves_errors() {
        let mock = MockClassifier::new();
        mock.add_outcome(MockOutcome::error(ClassifierError::Timeout { seconds: 5 }));

        let result = mock.classify("anything", &[]).await;
        assert!(matches!(result, Err(ClassifierError::Timeout { seconds: 5 })));
    }

    #[tokio::test]
    async fn test_mock_classifier_exhausted_queue_errors() {
        let mock = MockClassifier::new();
        assert!(mock.classify("anything", &[]).await.is_err());
    }

    #[tokio::test]
    async fn test_mock_classifier_garbage_text_is_verdict_error() {
        let mock = MockClassifier::new();
        mock.add_outcome(MockOutcome::text("I cannot help with that"));

        let result = mock.classify("anything", &[]).await;
        assert!(matches!(result, Err(ClassifierError::Verdict(_))));
    }

    #[test]
    fn test_prompt_lists_installed_tools() {
        let installed = vec![ToolRecord::new("tools.giphy", "giphy")
            .with_description("Search and share animated GIFs")];
        let prompt = GenAiClassifier::build_prompt("show me a gif", &installed);
        assert!(prompt.contains("giphy (tools.giphy)"));
        assert!(prompt.contains("User message: show me a gif"));

        let empty = GenAiClassifier::build_prompt("hi", &[]);
        assert!(empty.contains("no tools installed"));
    }

    #[test]
    fn test_classifier_name_and_model() {
        let classifier = GenAiClassifier::new(
            AdapterKind::Ollama,
            "qwen2.5:7b".to_string(),
            Duration::from_secs(15),
        );
        assert_eq!(classifier.name(), "Ollama");
        assert_eq!(classifier.model_info(), Some("qwen2.5:7b".to_string()));
    }
}
