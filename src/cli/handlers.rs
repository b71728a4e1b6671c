//! Command handlers
//!
//! Each handler builds an engine from the environment configuration and the
//! command arguments, runs one operation, and returns a process exit code:
//! 0 on success, 1 when the requested action failed, 2 on setup errors.

use super::commands::{
    InstalledArgs, OutputFormatArg, ResolveArgs, ScanArgs, SearchArgs, StatsArgs,
};
use crate::config::ToolcastConfig;
use crate::discovery::{DiscoveryScanner, JsonFeed};
use crate::engine::{InstalledTool, ToolEngine};
use crate::intent::IntentResolver;
use crate::registry::ToolRegistry;
use crate::session::SessionStore;
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Builds the engine for one CLI invocation.
///
/// Without a feed file, discovery runs against an empty feed; the registry
/// still works for anything pre-seeded or built in. `prescan` populates the
/// registry up front; the `scan` subcommand passes `false` so its own pass
/// is the first one and the counts it prints are real.
async fn build_engine(
    feed_path: Option<&Path>,
    rules_only: bool,
    prescan: bool,
) -> Result<ToolEngine> {
    let config = ToolcastConfig::from_env().context("loading configuration")?;
    config.validate().context("validating configuration")?;

    let feed = match feed_path {
        Some(path) => Arc::new(
            JsonFeed::from_file(path)
                .with_context(|| format!("loading feed from {}", path.display()))?,
        ),
        None => Arc::new(JsonFeed::empty()),
    };

    let registry = ToolRegistry::with_refresh_interval(config.refresh_interval());
    let scanner = DiscoveryScanner::new(registry.clone(), feed.clone(), feed, &config.namespace)
        .with_timeout(config.feed_timeout());

    let mut resolver = IntentResolver::new(registry.clone(), &config.namespace)
        .with_timeout(config.classifier_timeout());
    if !rules_only {
        if let Some(classifier) = config.create_classifier() {
            debug!(backend = classifier.name(), "classifier backend configured");
            resolver = resolver.with_classifier(classifier);
        }
    }

    let engine = ToolEngine::new(registry, SessionStore::new(), scanner, resolver);

    // Populate the registry up front when a feed was provided
    if prescan && feed_path.is_some() {
        if let Err(e) = engine.scan_for_tools(true).await {
            warn!(error = %e, "initial feed scan failed");
        }
    }

    Ok(engine)
}

fn seed_session(engine: &ToolEngine, user: &str, installed: &[String]) {
    for id in installed {
        engine.session().add(user, id);
    }
}

pub async fn handle_resolve(args: &ResolveArgs, quiet: bool) -> i32 {
    match run_resolve(args, quiet).await {
        Ok(success) => {
            if success {
                0
            } else {
                1
            }
        }
        Err(e) => {
            error!("resolve failed: {e:#}");
            eprintln!("Error: {e:#}");
            2
        }
    }
}

async fn run_resolve(args: &ResolveArgs, quiet: bool) -> Result<bool> {
    let engine = build_engine(args.feed.as_deref(), args.rules_only, true).await?;
    seed_session(&engine, &args.user, &args.installed);

    let resolution = engine.resolve_and_execute(&args.user, &args.text).await;

    match args.format {
        OutputFormatArg::Json => {
            println!("{}", serde_json::to_string_pretty(&resolution)?);
        }
        OutputFormatArg::Human => {
            if !quiet {
                println!(
                    "[{} {:.2}] {}",
                    resolution.classification.action.kind(),
                    resolution.classification.confidence,
                    resolution.result.content
                );
                if let Some(media) = &resolution.result.media {
                    println!("media: {media}");
                }
            } else if !resolution.result.success {
                eprintln!("{}", resolution.result.content);
            }
        }
    }

    Ok(resolution.result.success)
}

pub async fn handle_search(args: &SearchArgs) -> i32 {
    match run_search(args).await {
        Ok(()) => 0,
        Err(e) => {
            error!("search failed: {e:#}");
            eprintln!("Error: {e:#}");
            2
        }
    }
}

async fn run_search(args: &SearchArgs) -> Result<()> {
    let engine = build_engine(args.feed.as_deref(), true, true).await?;
    let tools = engine
        .search_tools(&args.query, args.limit)
        .await
        .context("searching for tools")?;

    match args.format {
        OutputFormatArg::Json => {
            println!("{}", serde_json::to_string_pretty(&tools)?);
        }
        OutputFormatArg::Human => {
            if tools.is_empty() {
                println!("No tools found for '{}'", args.query);
            } else {
                for tool in &tools {
                    if tool.description.is_empty() {
                        println!("{} ({})", tool.name, tool.id);
                    } else {
                        println!("{} ({}): {}", tool.name, tool.id, tool.description);
                    }
                }
            }
        }
    }
    Ok(())
}

pub async fn handle_scan(args: &ScanArgs) -> i32 {
    match run_scan(args).await {
        Ok(()) => 0,
        Err(e) => {
            error!("scan failed: {e:#}");
            eprintln!("Error: {e:#}");
            2
        }
    }
}

async fn run_scan(args: &ScanArgs) -> Result<()> {
    // No prescan: the pass below is the first, so new tools count as new
    let engine = build_engine(args.feed.as_deref(), true, false).await?;
    let result = engine
        .scan_for_tools(args.force)
        .await
        .context("scanning feed")?;

    match (&result, args.format) {
        (None, OutputFormatArg::Json) => println!("null"),
        (None, OutputFormatArg::Human) => {
            println!("Registry is still fresh; use --force to scan anyway");
        }
        (Some(scan), OutputFormatArg::Json) => {
            println!("{}", serde_json::to_string_pretty(scan)?);
        }
        (Some(scan), OutputFormatArg::Human) => {
            println!(
                "Scan complete: {} mentioned, {} new, {} updated",
                scan.tools_found,
                scan.new_tools.len(),
                scan.updated_tools.len()
            );
            for id in &scan.new_tools {
                println!("  + {id}");
            }
            for error in &scan.errors {
                println!("  ! {error}");
            }
        }
    }
    Ok(())
}

pub async fn handle_installed(args: &InstalledArgs) -> i32 {
    match run_installed(args).await {
        Ok(()) => 0,
        Err(e) => {
            error!("installed listing failed: {e:#}");
            eprintln!("Error: {e:#}");
            2
        }
    }
}

async fn run_installed(args: &InstalledArgs) -> Result<()> {
    let engine = build_engine(args.feed.as_deref(), true, true).await?;
    seed_session(&engine, &args.user, &args.installed);

    let installed = engine.list_installed(&args.user);
    match args.format {
        OutputFormatArg::Json => {
            println!("{}", serde_json::to_string_pretty(&installed)?);
        }
        OutputFormatArg::Human => {
            if installed.is_empty() {
                println!("No tools installed for {}", args.user);
            }
            for tool in &installed {
                match tool {
                    InstalledTool::Cached(record) => {
                        println!("{} ({}): {}", record.name, record.id, record.description)
                    }
                    InstalledTool::Uncached(id) => println!("{id} (not in registry)"),
                }
            }
        }
    }
    Ok(())
}

pub async fn handle_stats(args: &StatsArgs) -> i32 {
    match run_stats(args).await {
        Ok(()) => 0,
        Err(e) => {
            error!("stats failed: {e:#}");
            eprintln!("Error: {e:#}");
            2
        }
    }
}

async fn run_stats(args: &StatsArgs) -> Result<()> {
    let engine = build_engine(args.feed.as_deref(), true, true).await?;
    let stats = engine.cache_stats();

    match args.format {
        OutputFormatArg::Json => {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        OutputFormatArg::Human => {
            println!("Tools cached: {}", stats.total);
            match stats.last_scan {
                Some(at) => println!("Last scan:    {at}"),
                None => println!("Last scan:    never"),
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn feed_file() -> tempfile::NamedTempFile {
        let doc = r#"{
            "posts": [
                {"id": "1", "author": "giphy.example",
                 "text": "tools.giphy is live, install giphy today"}
            ],
            "profiles": {
                "giphy.example": [
                    {"id": "tools.giphy", "name": "giphy",
                     "description": "Search and share animated GIFs"}
                ]
            }
        }"#;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(doc.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_prescan_populates_registry() {
        let file = feed_file();
        let engine = build_engine(Some(file.path()), true, true).await.unwrap();
        assert!(engine.registry().get("tools.giphy").is_some());
    }

    #[tokio::test]
    async fn test_scan_without_prescan_counts_new_tools() {
        let file = feed_file();
        let engine = build_engine(Some(file.path()), true, false).await.unwrap();
        assert!(engine.registry().is_empty());

        // Unforced: registry never scanned, so the pass runs and the feed's
        // tool is reported as new, not as a re-discovery
        let scan = engine.scan_for_tools(false).await.unwrap().unwrap();
        assert_eq!(scan.new_tools, vec!["tools.giphy".to_string()]);
        assert!(scan.updated_tools.is_empty());
    }

    #[tokio::test]
    async fn test_engine_without_feed_uses_empty_feed() {
        let engine = build_engine(None, true, true).await.unwrap();
        let scan = engine.scan_for_tools(true).await.unwrap().unwrap();
        assert_eq!(scan.tools_found, 0);
    }
}
