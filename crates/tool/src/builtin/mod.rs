//! Builtin tools

pub mod claude_code;
