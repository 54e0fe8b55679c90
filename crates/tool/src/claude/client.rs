//! Claude Code CLI client
//!
//! Launches the external `claude` binary for a single blocking session and
//! parses its JSON result output. The `ClaudeCodeClient` trait is the
//! swappable seam the `claude_code` tool is built against.

use async_trait::async_trait;
use bridge_foundation::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

/// Name of the external binary
pub const CLAUDE_BINARY: &str = "claude";

/// Claude model selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Model {
    Opus,
    #[default]
    Sonnet,
    Haiku,
}

impl Model {
    /// Parse a user-supplied model name (case-insensitive)
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "opus" => Some(Self::Opus),
            "sonnet" => Some(Self::Sonnet),
            "haiku" => Some(Self::Haiku),
            _ => None,
        }
    }

    /// Value passed to the CLI `--model` flag
    pub fn cli_name(&self) -> &'static str {
        match self {
            Self::Opus => "opus",
            Self::Sonnet => "sonnet",
            Self::Haiku => "haiku",
        }
    }
}

/// Output format requested from the CLI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    StreamJson,
}

impl OutputFormat {
    pub fn cli_name(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
            Self::StreamJson => "stream-json",
        }
    }
}

/// Configuration for a single Claude Code session
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// Task or question for the session
    pub query: String,

    /// Model to run
    pub model: Model,

    /// Working directory for the session
    pub working_dir: Option<PathBuf>,

    /// Turn limit (0 means the CLI default)
    pub max_turns: u32,

    /// Tools the session may use
    pub allowed_tools: Vec<String>,

    /// Tools the session must not use
    pub disallowed_tools: Vec<String>,

    /// Text prepended to the system prompt
    pub custom_instructions: Option<String>,

    /// Resume an existing session by id
    pub session_id: Option<String>,

    /// Fork instead of resuming (only meaningful with `session_id`)
    pub fork_session: bool,

    /// Verbose CLI output
    pub verbose: bool,

    /// Output format requested from the CLI
    pub output_format: OutputFormat,
}

/// Per-model usage reported by the CLI
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UsageDetail {
    #[serde(default, alias = "inputTokens")]
    pub input_tokens: u64,

    #[serde(default, alias = "outputTokens")]
    pub output_tokens: u64,

    #[serde(default, alias = "costUSD")]
    pub cost_usd: f64,
}

/// Final result of a Claude Code session
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionResult {
    /// Output text
    #[serde(default)]
    pub result: String,

    /// Session identifier (usable for resume/fork)
    #[serde(default)]
    pub session_id: String,

    // Newer CLI builds emit `total_cost_usd`, older ones `cost_usd`.
    #[serde(default, alias = "total_cost_usd")]
    pub cost_usd: f64,

    #[serde(default)]
    pub duration_ms: u64,

    #[serde(default)]
    pub num_turns: u32,

    #[serde(default)]
    pub is_error: bool,

    #[serde(default)]
    pub error: Option<String>,

    /// Usage keyed by raw model identifier
    #[serde(default, alias = "modelUsage")]
    pub model_usage: HashMap<String, UsageDetail>,
}

/// Swappable client seam for launching Claude Code sessions
#[async_trait]
pub trait ClaudeCodeClient: Send + Sync {
    /// Launch a session and block until it finishes
    async fn launch_and_wait(&self, config: SessionConfig) -> Result<SessionResult>;
}

/// Default client - spawns the `claude` CLI
pub struct CliClient {
    binary: PathBuf,
}

impl CliClient {
    /// Locate the `claude` binary on PATH
    pub fn new() -> Result<Self> {
        let binary = which::which(CLAUDE_BINARY)
            .map_err(|e| Error::Client(format!("{} binary not found: {}", CLAUDE_BINARY, e)))?;
        Ok(Self { binary })
    }

    /// Use an explicit binary path
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn build_args(config: &SessionConfig) -> Vec<String> {
        let mut args = vec!["-p".to_string(), config.query.clone()];

        args.push("--output-format".to_string());
        args.push(config.output_format.cli_name().to_string());

        args.push("--model".to_string());
        args.push(config.model.cli_name().to_string());

        if config.max_turns > 0 {
            args.push("--max-turns".to_string());
            args.push(config.max_turns.to_string());
        }

        if !config.allowed_tools.is_empty() {
            args.push("--allowedTools".to_string());
            args.push(config.allowed_tools.join(","));
        }

        if !config.disallowed_tools.is_empty() {
            args.push("--disallowedTools".to_string());
            args.push(config.disallowed_tools.join(","));
        }

        if let Some(instructions) = &config.custom_instructions {
            args.push("--append-system-prompt".to_string());
            args.push(instructions.clone());
        }

        if let Some(session_id) = &config.session_id {
            args.push("--resume".to_string());
            args.push(session_id.clone());
            if config.fork_session {
                args.push("--fork-session".to_string());
            }
        }

        if config.verbose {
            args.push("--verbose".to_string());
        }

        args
    }

    /// Parse the CLI's JSON result from stdout
    ///
    /// In JSON mode the CLI prints one result object; verbose runs may put
    /// it on the last line after other output.
    fn parse_result(stdout: &str) -> Result<SessionResult> {
        let trimmed = stdout.trim();
        if let Ok(result) = serde_json::from_str::<SessionResult>(trimmed) {
            return Ok(result);
        }

        if let Some(last) = trimmed.lines().rev().find(|l| !l.trim().is_empty()) {
            if let Ok(result) = serde_json::from_str::<SessionResult>(last.trim()) {
                return Ok(result);
            }
        }

        let snippet: String = trimmed.chars().take(200).collect();
        Err(Error::Client(format!(
            "unparseable CLI output: {}",
            snippet
        )))
    }
}

#[async_trait]
impl ClaudeCodeClient for CliClient {
    async fn launch_and_wait(&self, config: SessionConfig) -> Result<SessionResult> {
        let args = Self::build_args(&config);
        debug!(binary = %self.binary.display(), ?args, "launching Claude Code session");

        let mut command = Command::new(&self.binary);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(dir) = &config.working_dir {
            command.current_dir(dir);
        }

        let output = command.output().await?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        match Self::parse_result(&stdout) {
            Ok(result) => {
                debug!(
                    session_id = %result.session_id,
                    cost_usd = result.cost_usd,
                    duration_ms = result.duration_ms,
                    "Claude Code session finished"
                );
                Ok(result)
            }
            Err(parse_err) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                warn!(status = ?output.status.code(), "Claude Code session failed");
                if !output.status.success() {
                    Err(Error::Client(format!(
                        "claude exited with {}: {}",
                        output.status,
                        stderr.trim()
                    )))
                } else {
                    Err(parse_err)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_parse() {
        assert_eq!(Model::parse("opus"), Some(Model::Opus));
        assert_eq!(Model::parse("SONNET"), Some(Model::Sonnet));
        assert_eq!(Model::parse("Haiku"), Some(Model::Haiku));
        assert_eq!(Model::parse("gpt-4"), None);
        assert_eq!(Model::parse(""), None);
    }

    #[test]
    fn test_build_args_full_config() {
        let config = SessionConfig {
            query: "add a test".to_string(),
            model: Model::Opus,
            max_turns: 5,
            allowed_tools: vec!["bash".to_string(), "view".to_string()],
            disallowed_tools: vec!["edit".to_string()],
            custom_instructions: Some("be brief".to_string()),
            session_id: Some("sess-1".to_string()),
            fork_session: true,
            verbose: true,
            output_format: OutputFormat::Json,
            ..Default::default()
        };

        let args = CliClient::build_args(&config);
        assert_eq!(args[0], "-p");
        assert_eq!(args[1], "add a test");

        let joined = args.join(" ");
        assert!(joined.contains("--output-format json"));
        assert!(joined.contains("--model opus"));
        assert!(joined.contains("--max-turns 5"));
        assert!(joined.contains("--allowedTools bash,view"));
        assert!(joined.contains("--disallowedTools edit"));
        assert!(joined.contains("--append-system-prompt be brief"));
        assert!(joined.contains("--resume sess-1"));
        assert!(joined.contains("--fork-session"));
        assert!(joined.contains("--verbose"));
    }

    #[test]
    fn test_build_args_minimal_config() {
        let config = SessionConfig {
            query: "hello".to_string(),
            ..Default::default()
        };

        let joined = CliClient::build_args(&config).join(" ");
        assert!(joined.contains("--model sonnet"));
        assert!(!joined.contains("--max-turns"));
        assert!(!joined.contains("--resume"));
        assert!(!joined.contains("--fork-session"));
        assert!(!joined.contains("--verbose"));
    }

    #[test]
    fn test_parse_result() {
        let stdout = r#"{
            "type": "result",
            "result": "done",
            "session_id": "abc-123",
            "total_cost_usd": 0.42,
            "duration_ms": 1500,
            "num_turns": 4,
            "is_error": false,
            "modelUsage": { "claude-3.5-sonnet": { "inputTokens": 10, "outputTokens": 20, "costUSD": 0.42 } }
        }"#;

        let result = CliClient::parse_result(stdout).unwrap();
        assert_eq!(result.result, "done");
        assert_eq!(result.session_id, "abc-123");
        assert!((result.cost_usd - 0.42).abs() < f64::EPSILON);
        assert_eq!(result.duration_ms, 1500);
        assert_eq!(result.num_turns, 4);
        assert!(!result.is_error);
        assert_eq!(
            result.model_usage["claude-3.5-sonnet"].output_tokens,
            20
        );
    }

    #[test]
    fn test_parse_result_last_line() {
        let stdout = "tool noise\nmore noise\n{\"result\":\"ok\",\"session_id\":\"s\",\"cost_usd\":0.1}\n";
        let result = CliClient::parse_result(stdout).unwrap();
        assert_eq!(result.result, "ok");
        assert!((result.cost_usd - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_result_garbage() {
        let err = CliClient::parse_result("not json at all").unwrap_err();
        assert!(matches!(err, Error::Client(_)));
    }
}
