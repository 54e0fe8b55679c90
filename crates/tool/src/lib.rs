//! # bridge-tool
//!
//! Tool layer for Claude Bridge providing:
//! - Tool trait and registry
//! - Claude Code client (subprocess seam around the `claude` CLI)
//! - The `claude_code` builtin tool

pub mod builtin;
pub mod claude;
pub mod registry;
pub mod r#trait;

pub use r#trait::{Tool, ToolContext, ToolDef, ToolResult};
pub use registry::ToolRegistry;

pub use builtin::claude_code::{
    ClaudeCodeResponse, ClaudeCodeTool, CLAUDE_CODE_TOOL_NAME, DEFAULT_MAX_TURNS,
};

pub use claude::{
    ClaudeCodeClient, CliClient, Model, OutputFormat, SessionConfig, SessionResult, UsageDetail,
};
