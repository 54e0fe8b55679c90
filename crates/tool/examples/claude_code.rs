//! Demonstrates invoking the claude_code tool through the registry.
//!
//! Requires the `claude` CLI on PATH:
//!
//! `cargo run -p bridge-tool --example claude_code`

use anyhow::Result;
use bridge_foundation::permission::PermissionService;
use bridge_tool::{ClaudeCodeResponse, ToolContext, ToolRegistry, CLAUDE_CODE_TOOL_NAME};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

fn print_response(content: &str) -> Result<()> {
    let response: ClaudeCodeResponse = serde_json::from_str(content)?;
    println!("  session id: {}", response.session_id);
    println!("  model:      {}", response.model_used);
    println!("  cost:       ${:.4}", response.cost_usd);
    println!("  duration:   {}ms", response.duration_ms);
    println!("  turns:      {}", response.num_turns);

    let preview: String = response.result.chars().take(200).collect();
    println!("  result:     {}...", preview);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let permissions = Arc::new(PermissionService::with_auto_approve());
    let registry = ToolRegistry::with_builtins();

    let ctx = ToolContext::new(
        format!("demo-{}", Uuid::new_v4()),
        std::env::current_dir()?,
        permissions,
    );

    // Example 1: simple code generation
    println!("Example 1: simple HTTP server");
    let params = json!({
        "query": "Create a simple HTTP server with a /hello endpoint that returns JSON",
        "model": "sonnet",
        "max_turns": 5,
    });

    let result = registry.execute(CLAUDE_CODE_TOOL_NAME, &ctx, params).await?;
    if result.success {
        print_response(&result.content)?;
    } else {
        println!("  failed: {}", result.error.unwrap_or_default());
    }

    // Example 2: read-only analysis with tool restrictions
    println!("\nExample 2: read-only project analysis");
    let params = json!({
        "query": "Analyze the project structure and identify the main components",
        "model": "sonnet",
        "max_turns": 3,
        "allowed_tools": ["bash", "glob", "view", "ls"],
        "disallowed_tools": ["edit", "write", "multiedit"],
    });

    let result = registry.execute(CLAUDE_CODE_TOOL_NAME, &ctx, params).await?;
    if result.success {
        print_response(&result.content)?;
    } else {
        println!("  failed: {}", result.error.unwrap_or_default());
    }

    Ok(())
}
