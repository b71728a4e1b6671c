//! toolcast - natural-language tool resolution engine with feed-based discovery
//!
//! This library turns free-form user requests ("install giphy", "show me a gif
//! of cats") into typed tool actions and executes them against a per-user set
//! of installed tools. Tools are discovered by scanning a social feed for
//! namespace-qualified mentions and verifying each candidate against its
//! author's published metadata.
//!
//! # Core Concepts
//!
//! - **Registry**: Ranked, freshness-tracked in-memory cache of tool records
//! - **Discovery**: Feed scanning with mention extraction, per-candidate
//!   verification, and a single-flight guarantee
//! - **Intent**: Classification of user text into a closed action union, via
//!   a pluggable LLM classifier with a deterministic rules fallback
//! - **Sessions**: Per-user installed tool sets, mutated only on success
//!
//! # Example Usage
//!
//! ```no_run
//! use toolcast::discovery::{DiscoveryScanner, JsonFeed};
//! use toolcast::engine::ToolEngine;
//! use toolcast::intent::IntentResolver;
//! use toolcast::registry::ToolRegistry;
//! use toolcast::session::SessionStore;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = ToolRegistry::new();
//! let feed = Arc::new(JsonFeed::from_file(Path::new("feed.json"))?);
//! let scanner = DiscoveryScanner::new(registry.clone(), feed.clone(), feed, "tools");
//! let resolver = IntentResolver::new(registry.clone(), "tools");
//! let engine = ToolEngine::new(registry, SessionStore::new(), scanner, resolver);
//!
//! engine.scan_for_tools(true).await?;
//! let resolution = engine.resolve_and_execute("alice", "install giphy").await;
//! println!("{}", resolution.result.content);
//! # Ok(())
//! # }
//! ```
//!
//! # Project Structure
//!
//! - [`registry`]: Tool records and the ranked registry
//! - [`discovery`]: Feed clients, mention extraction, and the scanner
//! - [`intent`]: Classifier backends, verdict parsing, and the resolver
//! - [`engine`]: Orchestration and execution results
//! - [`session`]: Per-user installed tool sets

pub mod cli;
pub mod config;
pub mod discovery;
pub mod engine;
pub mod intent;
pub mod registry;
pub mod session;
pub mod util;

pub use config::{ConfigError, ToolcastConfig};
pub use engine::{ExecutionResult, Resolution, ToolEngine};
pub use registry::{ToolRecord, ToolRegistry};
pub use session::SessionStore;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_name_is_toolcast() {
        assert_eq!(NAME, "toolcast");
    }
}
