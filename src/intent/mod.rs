//! Intent classification
//!
//! Turns free-form user text into typed tool actions. The resolver prefers
//! an external classifier backend when one is configured and falls back to
//! deterministic pattern rules otherwise.

pub mod classifier;
pub mod fallback;
pub mod params;
pub mod resolver;
pub mod types;
pub mod verdict;

pub use classifier::{Classifier, ClassifierError, GenAiClassifier, MockClassifier, MockOutcome};
pub use resolver::{IntentResolver, DEFAULT_CLASSIFIER_TIMEOUT};
pub use types::{
    builtin_media_tool, Action, Classification, ClassificationSource, ExecuteParams,
    BUILTIN_MEDIA_NAME,
};
pub use verdict::{parse_verdict, Verdict, VerdictError, VerdictKind};
