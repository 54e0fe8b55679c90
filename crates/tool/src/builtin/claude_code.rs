//! Claude Code tool - delegate a task to the external Claude Code CLI

use crate::claude::{ClaudeCodeClient, CliClient, Model, OutputFormat, SessionConfig, UsageDetail};
use crate::{Tool, ToolContext, ToolDef, ToolResult};
use async_trait::async_trait;
use bridge_foundation::permission::PermissionAction;
use bridge_foundation::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

pub const CLAUDE_CODE_TOOL_NAME: &str = "claude_code";

/// Turn limit applied when the caller does not set one
pub const DEFAULT_MAX_TURNS: u32 = 10;

/// Agent name used in permission requests
const AGENT_NAME: &str = "claude-code";

const DESCRIPTION: &str = include_str!("claude_code.md");

/// Usage-map keys mapped to human-readable labels, checked in this order so
/// the resolved label is deterministic.
const MODEL_LABELS: &[(&str, &str)] = &[
    ("claude-3.5-sonnet", "claude-sonnet"),
    ("claude-3-sonnet", "claude-sonnet"),
    ("claude-3.5-haiku", "claude-haiku"),
    ("claude-3-haiku", "claude-haiku"),
    ("claude-3-opus", "claude-opus"),
];

#[derive(Debug, Deserialize)]
struct ClaudeCodeParams {
    #[serde(default)]
    query: String,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    working_dir: Option<String>,
    #[serde(default)]
    max_turns: Option<u32>,
    #[serde(default)]
    allowed_tools: Vec<String>,
    #[serde(default)]
    disallowed_tools: Vec<String>,
    #[serde(default)]
    custom_instructions: Option<String>,
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    fork_session: bool,
    #[serde(default)]
    verbose: bool,
}

/// Structured response returned as the tool's JSON content
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaudeCodeResponse {
    pub result: String,
    pub session_id: String,
    pub cost_usd: f64,
    pub duration_ms: u64,
    pub num_turns: u32,
    pub is_error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub model_used: String,
}

/// Tool that delegates a task to Claude Code
pub struct ClaudeCodeTool {
    /// Injected client; when absent a `CliClient` is created per call so
    /// that a missing binary surfaces as call-time error content.
    client: Option<Arc<dyn ClaudeCodeClient>>,
}

impl ClaudeCodeTool {
    pub fn new() -> Self {
        Self { client: None }
    }

    /// Use a specific client (tests, alternative transports)
    pub fn with_client(client: Arc<dyn ClaudeCodeClient>) -> Self {
        Self {
            client: Some(client),
        }
    }

    fn model_label(usage: &HashMap<String, UsageDetail>) -> &'static str {
        for (key, label) in MODEL_LABELS {
            if usage.contains_key(*key) {
                return label;
            }
        }
        "unknown"
    }
}

impl Default for ClaudeCodeTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for ClaudeCodeTool {
    fn definition(&self) -> ToolDef {
        ToolDef::builder(CLAUDE_CODE_TOOL_NAME, DESCRIPTION)
            .string_param("query", "The task or question for Claude Code to perform", true)
            .enum_param(
                "model",
                "Claude model to use. Defaults to sonnet",
                vec!["opus", "sonnet", "haiku"],
                false,
            )
            .string_param(
                "working_dir",
                "Working directory for Claude Code operations (defaults to current directory)",
                false,
            )
            .integer_param(
                "max_turns",
                "Maximum number of turns for the session. Defaults to 10",
                false,
            )
            .string_array_param(
                "allowed_tools",
                "List of tools Claude Code is allowed to use. Defaults to all built-in tools",
                false,
            )
            .string_array_param(
                "disallowed_tools",
                "List of tools Claude Code is not allowed to use",
                false,
            )
            .string_param(
                "custom_instructions",
                "Custom instructions to prepend to the system prompt",
                false,
            )
            .string_param(
                "session_id",
                "Resume an existing session by providing its ID",
                false,
            )
            .boolean_param(
                "fork_session",
                "If true with session_id, forks instead of resuming",
                false,
            )
            .boolean_param("verbose", "Enable verbose output", false)
            .build()
    }

    async fn execute(&self, ctx: &ToolContext, params: Value) -> Result<ToolResult> {
        let params: ClaudeCodeParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return Ok(ToolResult::error(format!("Invalid parameters: {}", e))),
        };

        let query = params.query.trim().to_string();
        if query.is_empty() {
            return Ok(ToolResult::error(
                "query is required and cannot be empty",
            ));
        }

        // Resolve the model before touching the permission gate so a bad
        // value never reaches the external process.
        let model = match params.model.as_deref().filter(|m| !m.is_empty()) {
            Some(name) => match Model::parse(name) {
                Some(model) => model,
                None => {
                    return Ok(ToolResult::error(format!(
                        "invalid model: {}. Must be opus, sonnet, or haiku",
                        name
                    )));
                }
            },
            None => Model::Sonnet,
        };

        let max_turns = match params.max_turns {
            Some(turns) if turns > 0 => turns,
            _ => DEFAULT_MAX_TURNS,
        };

        let working_dir = match params.working_dir.as_deref().filter(|d| !d.is_empty()) {
            Some(dir) => ctx.working_dir.join(dir),
            None => ctx.working_dir.clone(),
        };

        if ctx.session_id.trim().is_empty() {
            return Err(Error::InvalidInput(
                "session ID is required for Claude Code operations".to_string(),
            ));
        }

        if !ctx.auto_approve {
            let action = PermissionAction::Delegate {
                agent: AGENT_NAME.to_string(),
                task: query.clone(),
            };

            let permitted = ctx
                .permissions
                .request(
                    &ctx.session_id,
                    CLAUDE_CODE_TOOL_NAME,
                    &format!("Claude Code: {}", query),
                    action,
                )
                .await?;

            if !permitted {
                return Err(Error::PermissionDenied(format!(
                    "Claude Code delegation: {}",
                    query
                )));
            }
        }

        let client: Arc<dyn ClaudeCodeClient> = match &self.client {
            Some(client) => client.clone(),
            None => match CliClient::new() {
                Ok(client) => Arc::new(client),
                Err(e) => {
                    return Ok(ToolResult::error(format!(
                        "failed to create Claude Code client: {}",
                        e
                    )));
                }
            },
        };

        let config = SessionConfig {
            query: query.clone(),
            model,
            working_dir: Some(working_dir),
            max_turns,
            allowed_tools: params.allowed_tools,
            disallowed_tools: params.disallowed_tools,
            custom_instructions: params.custom_instructions,
            session_id: params.session_id,
            fork_session: params.fork_session,
            verbose: params.verbose,
            // Structured response requires JSON output
            output_format: OutputFormat::Json,
        };

        debug!(session_id = %ctx.session_id, model = model.cli_name(), "delegating to Claude Code");

        let result = match client.launch_and_wait(config).await {
            Ok(result) => result,
            Err(e) => {
                return Ok(ToolResult::error(format!(
                    "Claude Code session failed: {}",
                    e
                )));
            }
        };

        let response = ClaudeCodeResponse {
            result: result.result,
            session_id: result.session_id,
            cost_usd: result.cost_usd,
            duration_ms: result.duration_ms,
            num_turns: result.num_turns,
            is_error: result.is_error,
            error: result.error.filter(|e| !e.is_empty()),
            model_used: Self::model_label(&result.model_usage).to_string(),
        };

        info!(
            session_id = %response.session_id,
            cost_usd = response.cost_usd,
            num_turns = response.num_turns,
            is_error = response.is_error,
            "Claude Code session finished"
        );

        let metadata = serde_json::json!({
            "session_id": response.session_id,
            "cost_usd": response.cost_usd,
            "duration_ms": response.duration_ms,
            "num_turns": response.num_turns,
        });

        match serde_json::to_string(&response) {
            Ok(json) => Ok(ToolResult::success_with_metadata(json, metadata)),
            Err(e) => Ok(ToolResult::error(format!(
                "failed to serialize response: {}",
                e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usage(keys: &[&str]) -> HashMap<String, UsageDetail> {
        keys.iter()
            .map(|k| (k.to_string(), UsageDetail::default()))
            .collect()
    }

    #[test]
    fn test_model_label_known_models() {
        assert_eq!(
            ClaudeCodeTool::model_label(&usage(&["claude-3.5-sonnet"])),
            "claude-sonnet"
        );
        assert_eq!(
            ClaudeCodeTool::model_label(&usage(&["claude-3-haiku"])),
            "claude-haiku"
        );
        assert_eq!(
            ClaudeCodeTool::model_label(&usage(&["claude-3-opus"])),
            "claude-opus"
        );
    }

    #[test]
    fn test_model_label_precedence_is_fixed() {
        // Sonnet outranks opus regardless of map iteration order
        assert_eq!(
            ClaudeCodeTool::model_label(&usage(&["claude-3-opus", "claude-3.5-sonnet"])),
            "claude-sonnet"
        );
    }

    #[test]
    fn test_model_label_unknown() {
        assert_eq!(ClaudeCodeTool::model_label(&usage(&[])), "unknown");
        assert_eq!(
            ClaudeCodeTool::model_label(&usage(&["some-future-model"])),
            "unknown"
        );
    }
}
