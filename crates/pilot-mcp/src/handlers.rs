//! Tool handlers for MCP server.
//!
//! This module implements the actual tool execution logic: it runs the
//! backlog selector and renders its result as the text handed back to the
//! assistant.

use std::sync::Arc;

use pilot_azure_devops::{validate_limit, AzureDevOpsClient, BacklogSelector, SelectorOptions};
use pilot_core::report::{render_error, render_lookup, render_selection, render_unexpected};
use pilot_core::{BacklogConfig, Config, Error, TraversalMode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::protocol::{ToolCallResult, ToolDefinition};

/// Tool handler that executes tools against one project's backlog.
pub struct ToolHandler {
    /// Selector, or the reason one could not be built
    backend: std::result::Result<BacklogSelector, Error>,
    backlog: BacklogConfig,
}

impl ToolHandler {
    /// Create a tool handler around a ready selector.
    pub fn new(selector: BacklogSelector, backlog: BacklogConfig) -> Self {
        Self {
            backend: Ok(selector),
            backlog,
        }
    }

    /// Create a tool handler whose tools all report `error`.
    pub fn unconfigured(error: Error, backlog: BacklogConfig) -> Self {
        Self {
            backend: Err(error),
            backlog,
        }
    }

    /// Build the Azure DevOps client and selector from configuration.
    ///
    /// Never fails: configuration problems are kept and reported by every
    /// tool call, so the server still starts and answers the handshake.
    pub fn from_config(config: &Config) -> Self {
        let built = config
            .azure_devops()
            .and_then(AzureDevOpsClient::from_config)
            .map(|client| {
                let project = client.scope().project().to_string();
                tracing::info!(
                    org = client.scope().org_base(),
                    project = %project,
                    "Azure DevOps backlog configured"
                );
                BacklogSelector::new(
                    Arc::new(client),
                    project,
                    SelectorOptions::from(&config.backlog),
                )
            });

        match built {
            Ok(selector) => Self::new(selector, config.backlog.clone()),
            Err(e) => {
                tracing::warn!(error = %e, "Backlog tools are unavailable until configuration is fixed");
                Self::unconfigured(e, config.backlog.clone())
            }
        }
    }

    /// Whether tool calls can reach a tracker.
    pub fn is_configured(&self) -> bool {
        self.backend.is_ok()
    }

    /// Get available tool definitions.
    pub fn available_tools(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition {
                name: "get_burndown_tasks".to_string(),
                description: "Get the next work items to do from the Azure DevOps backlog, \
                              highest priority first. With prioritize_parents, parents are \
                              replaced by their open children."
                    .to_string(),
                input_schema: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "limit": {
                            "type": "integer",
                            "description": format!(
                                "Maximum number of items (default: {})",
                                self.backlog.default_limit
                            ),
                            "minimum": 1
                        },
                        "prioritize_parents": {
                            "type": "boolean",
                            "description": format!(
                                "Replace parent items with their open children (default: {})",
                                self.backlog.prioritize_parents
                            )
                        }
                    }
                }),
            },
            ToolDefinition {
                name: "get_work_items".to_string(),
                description: "Get specific Azure DevOps work items by id".to_string(),
                input_schema: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "ids": {
                            "type": "array",
                            "items": { "type": "integer", "minimum": 1 },
                            "description": "Work item ids"
                        }
                    },
                    "required": ["ids"]
                }),
            },
        ]
    }

    /// Execute a tool by name with arguments.
    pub async fn execute(&self, name: &str, arguments: Option<Value>) -> ToolCallResult {
        match name {
            "get_burndown_tasks" => {
                match parse_arguments::<GetBurndownTasksParams>(arguments) {
                    Ok(params) => self.burndown(params.limit, params.prioritize_parents).await,
                    Err(result) => result,
                }
            }
            "get_work_items" => match parse_arguments::<GetWorkItemsParams>(arguments) {
                Ok(params) => self.work_items(&params.ids).await,
                Err(result) => result,
            },
            _ => ToolCallResult::error(format!("❌ Error: Unknown tool: {}", name)),
        }
    }

    /// Select the next items and render the burndown report. Missing
    /// arguments fall back to the `[backlog]` defaults.
    pub async fn burndown(
        &self,
        limit: Option<i64>,
        prioritize_parents: Option<bool>,
    ) -> ToolCallResult {
        let limit = match validate_limit(limit.unwrap_or(i64::from(self.backlog.default_limit))) {
            Ok(limit) => limit,
            Err(e) => return ToolCallResult::error(render_error(&e)),
        };
        let mode = TraversalMode::from(prioritize_parents.unwrap_or(self.backlog.prioritize_parents));

        let selector = match &self.backend {
            Ok(selector) => selector,
            Err(e) => return ToolCallResult::error(render_error(e)),
        };

        tracing::debug!(limit = limit, mode = ?mode, "Selecting backlog");

        match selector.select(limit, mode).await {
            Ok(result) => ToolCallResult::text(render_selection(&result, limit)),
            Err(e @ (Error::InvalidArgument(_) | Error::Config(_))) => {
                ToolCallResult::error(render_error(&e))
            }
            Err(e) => {
                tracing::error!(error = %e, "Backlog selection failed");
                ToolCallResult::error(render_unexpected(&e))
            }
        }
    }

    /// Look up explicit work item ids.
    pub async fn work_items(&self, ids: &[u64]) -> ToolCallResult {
        if ids.is_empty() {
            return ToolCallResult::error(render_error(&Error::InvalidArgument(
                "ids must contain at least one work item id".to_string(),
            )));
        }

        let selector = match &self.backend {
            Ok(selector) => selector,
            Err(e) => return ToolCallResult::error(render_error(e)),
        };

        let result = selector.fetch_items(ids).await;
        ToolCallResult::text(render_lookup(&result, ids))
    }
}

fn parse_arguments<T>(arguments: Option<Value>) -> std::result::Result<T, ToolCallResult>
where
    T: for<'de> Deserialize<'de> + Default,
{
    match arguments {
        None | Some(Value::Null) => Ok(T::default()),
        Some(value) => serde_json::from_value(value)
            .map_err(|e| ToolCallResult::error(format!("❌ Error: Invalid arguments: {}", e))),
    }
}

/// Parameters for get_burndown_tasks tool.
#[derive(Debug, Default, Serialize, Deserialize)]
struct GetBurndownTasksParams {
    limit: Option<i64>,
    prioritize_parents: Option<bool>,
}

/// Parameters for get_work_items tool.
#[derive(Debug, Default, Serialize, Deserialize)]
struct GetWorkItemsParams {
    #[serde(default)]
    ids: Vec<u64>,
}
