//! Claude Code client - subprocess seam around the `claude` CLI

mod client;

pub use client::{
    ClaudeCodeClient, CliClient, Model, OutputFormat, SessionConfig, SessionResult, UsageDetail,
};
