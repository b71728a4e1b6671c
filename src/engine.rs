//! Engine orchestration
//!
//! [`ToolEngine`] wires the registry, session store, discovery scanner, and
//! intent resolver into one request path. Execution never propagates errors
//! to the caller: every action produces an [`ExecutionResult`], with failures
//! carried in the result rather than thrown.

use crate::discovery::{DiscoveryScanner, ScanError, ScanResult};
use crate::intent::{builtin_media_tool, Action, Classification, ExecuteParams, IntentResolver};
use crate::registry::{RegistryStats, ToolRecord, ToolRegistry};
use crate::session::SessionStore;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info};

const HELP_TEXT: &str = "You can ask me to:\n\
    - install <tool> / uninstall <tool>\n\
    - search for tools (e.g. \"find weather tools\")\n\
    - list your installed tools\n\
    - just ask, e.g. \"show me a gif of cats\" or \"weather in Tokyo\"";

/// Outcome of executing one classified action
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResult {
    /// Whether the action succeeded
    pub success: bool,
    /// User-facing response text
    pub content: String,
    /// Media attachment reference, when the tool produced one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<String>,
    /// Failure detail, set when `success` is false
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionResult {
    pub fn ok(content: impl Into<String>) -> Self {
        Self {
            success: true,
            content: content.into(),
            media: None,
            error: None,
        }
    }

    pub fn ok_with_media(content: impl Into<String>, media: impl Into<String>) -> Self {
        Self {
            success: true,
            content: content.into(),
            media: Some(media.into()),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            success: false,
            content: message.clone(),
            media: None,
            error: Some(message),
        }
    }
}

/// A classification paired with its execution outcome
#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
    pub classification: Classification,
    pub result: ExecutionResult,
}

/// An installed tool id, with its registry record when one is cached
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum InstalledTool {
    Cached(ToolRecord),
    Uncached(String),
}

impl InstalledTool {
    pub fn id(&self) -> &str {
        match self {
            InstalledTool::Cached(record) => &record.id,
            InstalledTool::Uncached(id) => id,
        }
    }
}

/// Session mutation deferred until the action is known to have succeeded
enum Mutation {
    Add(String),
    Remove(String),
}

/// The tool resolution engine
#[derive(Clone)]
pub struct ToolEngine {
    registry: ToolRegistry,
    session: SessionStore,
    scanner: DiscoveryScanner,
    resolver: IntentResolver,
}

impl ToolEngine {
    pub fn new(
        registry: ToolRegistry,
        session: SessionStore,
        scanner: DiscoveryScanner,
        resolver: IntentResolver,
    ) -> Self {
        Self {
            registry,
            session,
            scanner,
            resolver,
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Classifies `text` for `user_id` and executes the resulting action.
    ///
    /// The session is mutated only after a successful install or uninstall.
    pub async fn resolve_and_execute(&self, user_id: &str, text: &str) -> Resolution {
        let installed = self.session.get(user_id);
        let classification = self.resolver.classify(text, &installed).await;
        debug!(
            user_id,
            kind = classification.action.kind(),
            confidence = classification.confidence,
            "Resolved intent"
        );

        let (result, mutation) = self.run(&classification.action, &installed).await;
        if result.success {
            match mutation {
                Some(Mutation::Add(id)) => {
                    self.session.add(user_id, &id);
                    info!(user_id, tool_id = %id, "Tool installed");
                }
                Some(Mutation::Remove(id)) => {
                    self.session.remove(user_id, &id);
                    info!(user_id, tool_id = %id, "Tool uninstalled");
                }
                None => {}
            }
        }

        Resolution {
            classification,
            result,
        }
    }

    /// Executes an already-classified action without touching any session
    pub async fn execute(
        &self,
        classification: &Classification,
        installed: &HashSet<String>,
    ) -> ExecutionResult {
        self.run(&classification.action, installed).await.0
    }

    async fn run(
        &self,
        action: &Action,
        installed: &HashSet<String>,
    ) -> (ExecutionResult, Option<Mutation>) {
        match action {
            Action::Install { tool_name, tool_id } => self.install(tool_name, tool_id, installed).await,
            Action::Uninstall { tool_name, tool_id } => {
                if !installed.contains(tool_id) {
                    (
                        ExecutionResult::failure(format!("{tool_name} is not installed")),
                        None,
                    )
                } else {
                    (
                        ExecutionResult::ok(format!("Uninstalled {tool_name}")),
                        Some(Mutation::Remove(tool_id.clone())),
                    )
                }
            }
            Action::Execute { tool_id, params } => {
                (self.invoke(tool_id, params, installed), None)
            }
            Action::Search { query } => (self.search(query.as_deref()).await, None),
            Action::List => (self.list(installed), None),
            Action::Help => (ExecutionResult::ok(HELP_TEXT), None),
            Action::Unknown => (
                ExecutionResult::failure(
                    "Sorry, I didn't understand that. Say \"help\" to see what I can do.",
                ),
                None,
            ),
        }
    }

    async fn install(
        &self,
        tool_name: &str,
        tool_id: &str,
        installed: &HashSet<String>,
    ) -> (ExecutionResult, Option<Mutation>) {
        if installed.contains(tool_id) {
            return (
                ExecutionResult::ok(format!("{tool_name} is already installed")),
                None,
            );
        }

        let record = match self.registry.get(tool_id) {
            Some(record) => Some(record),
            None => match self.scanner.search_for_tool(tool_name).await {
                Ok(candidates) => candidates
                    .into_iter()
                    .find(|r| r.id == tool_id || r.name.eq_ignore_ascii_case(tool_name)),
                Err(e) => {
                    return (
                        ExecutionResult::failure(format!(
                            "Could not look up '{tool_name}': {e}"
                        )),
                        None,
                    );
                }
            },
        };

        match record {
            Some(record) => {
                let content = if record.description.is_empty() {
                    format!("Installed {}", record.name)
                } else {
                    format!("Installed {}: {}", record.name, record.description)
                };
                let id = record.id;
                (ExecutionResult::ok(content), Some(Mutation::Add(id)))
            }
            None => (
                ExecutionResult::failure(format!("No tool named '{tool_name}' was found")),
                None,
            ),
        }
    }

    fn invoke(
        &self,
        tool_id: &str,
        params: &ExecuteParams,
        installed: &HashSet<String>,
    ) -> ExecutionResult {
        let builtin = builtin_media_tool(self.resolver.namespace());
        if tool_id != builtin && !installed.contains(tool_id) {
            let name = bare_name(tool_id);
            return ExecutionResult::failure(format!(
                "{name} is not installed. Say \"install {name}\" first."
            ));
        }

        let display = self
            .registry
            .get(tool_id)
            .map(|r| r.name)
            .unwrap_or_else(|| bare_name(tool_id).to_string());

        let mut content = match &params.query {
            Some(query) => format!("{display}: results for \"{query}\""),
            None => format!("Ran {display}"),
        };
        if let Some(location) = &params.location {
            content.push_str(&format!(" in {location}"));
        }

        // The built-in media tool points at a search page rather than
        // fetching content itself
        if tool_id == builtin {
            if let Some(query) = &params.query {
                let slug = query.trim().replace(' ', "-");
                return ExecutionResult::ok_with_media(
                    content,
                    format!("https://giphy.com/search/{slug}"),
                );
            }
        }

        ExecutionResult::ok(content)
    }

    async fn search(&self, query: Option<&str>) -> ExecutionResult {
        match query {
            Some(query) => match self.scanner.search_for_tool(query).await {
                Ok(tools) if tools.is_empty() => {
                    ExecutionResult::failure(format!("No tools found for '{query}'"))
                }
                Ok(tools) => ExecutionResult::ok(render_tool_list(&tools)),
                Err(e) => ExecutionResult::failure(format!("Search failed: {e}")),
            },
            None => {
                // Absent query matches nothing by contract
                let result = self.registry.search(None, 5);
                if result.tools.is_empty() {
                    ExecutionResult::failure(format!("No tools found for '{}'", result.query))
                } else {
                    ExecutionResult::ok(render_tool_list(&result.tools))
                }
            }
        }
    }

    fn list(&self, installed: &HashSet<String>) -> ExecutionResult {
        if installed.is_empty() {
            return ExecutionResult::ok(
                "You have no tools installed. Try \"search for tools\" to find some.",
            );
        }
        let mut ids: Vec<&String> = installed.iter().collect();
        ids.sort();
        let lines: Vec<String> = ids
            .iter()
            .map(|id| match self.registry.get(id) {
                Some(record) if !record.description.is_empty() => {
                    format!("- {} ({}): {}", record.name, record.id, record.description)
                }
                Some(record) => format!("- {} ({})", record.name, record.id),
                None => format!("- {id}"),
            })
            .collect();
        ExecutionResult::ok(format!("Installed tools:\n{}", lines.join("\n")))
    }

    /// Searches the registry, then the feed, for tools matching `query`
    pub async fn search_tools(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<ToolRecord>, ScanError> {
        let mut tools = self.scanner.search_for_tool(query).await?;
        tools.truncate(limit);
        Ok(tools)
    }

    /// Scans the feed unless the registry is still fresh.
    ///
    /// `Ok(None)` means the registry was fresh and `force` was not set.
    pub async fn scan_for_tools(&self, force: bool) -> Result<Option<ScanResult>, ScanError> {
        if !force && !self.registry.needs_refresh() {
            debug!("registry still fresh, skipping scan");
            return Ok(None);
        }
        self.scanner.scan().await.map(Some)
    }

    /// The user's installed tools, with registry records where cached
    pub fn list_installed(&self, user_id: &str) -> Vec<InstalledTool> {
        let mut ids: Vec<String> = self.session.get(user_id).into_iter().collect();
        ids.sort();
        ids.into_iter()
            .map(|id| match self.registry.get(&id) {
                Some(record) => InstalledTool::Cached(record),
                None => InstalledTool::Uncached(id),
            })
            .collect()
    }

    pub fn cache_stats(&self) -> RegistryStats {
        self.registry.stats()
    }
}

fn bare_name(tool_id: &str) -> &str {
    tool_id.rsplit('.').next().unwrap_or(tool_id)
}

fn render_tool_list(tools: &[ToolRecord]) -> String {
    let lines: Vec<String> = tools
        .iter()
        .map(|r| {
            if r.description.is_empty() {
                format!("- {} ({})", r.name, r.id)
            } else {
                format!("- {} ({}): {}", r.name, r.id, r.description)
            }
        })
        .collect();
    format!("Found {} tool(s):\n{}", tools.len(), lines.join("\n"))
}
