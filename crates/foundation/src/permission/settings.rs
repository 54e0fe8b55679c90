//! Persisted permission settings
//!
//! Permanent grants and deny patterns, stored as JSON.

use super::service::{Permission, PermissionAction};
use crate::storage::JsonStore;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Settings file name
pub const PERMISSIONS_FILE: &str = "permissions.json";

/// Permission settings file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionSettings {
    /// Permanently granted permissions
    #[serde(default)]
    pub grants: HashSet<PermissionGrant>,

    /// Patterns that are always denied
    #[serde(default)]
    pub denies: HashSet<PermissionDeny>,

    /// Global auto-approve mode
    #[serde(default)]
    pub auto_approve: bool,

    /// Tools that are auto-approved individually
    #[serde(default)]
    pub auto_approve_tools: HashSet<String>,
}

/// Stored grant entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct PermissionGrant {
    /// Tool name (e.g. "claude_code")
    pub tool: String,

    /// Action type
    pub action_type: PermissionActionType,

    /// Pattern (glob-ish, e.g. "/home/user/project/**")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

/// Stored deny entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct PermissionDeny {
    /// Tool name
    pub tool: String,

    /// Pattern
    pub pattern: String,

    /// Reason
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Simplified action type for storage
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PermissionActionType {
    Execute,
    Delegate,
    Custom(String),
}

impl From<&PermissionAction> for PermissionActionType {
    fn from(action: &PermissionAction) -> Self {
        match action {
            PermissionAction::Execute { .. } => Self::Execute,
            PermissionAction::Delegate { .. } => Self::Delegate,
            PermissionAction::Custom { name, .. } => Self::Custom(name.clone()),
        }
    }
}

impl PermissionSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load global settings
    pub fn load_global() -> Result<Self> {
        let store = JsonStore::global()?;
        Ok(store.load_or_default(PERMISSIONS_FILE))
    }

    /// Load project settings
    pub fn load_project() -> Result<Self> {
        let store = JsonStore::current_project()?;
        Ok(store.load_or_default(PERMISSIONS_FILE))
    }

    /// Load global + project merged
    pub fn load() -> Result<Self> {
        let mut settings = Self::load_global().unwrap_or_default();
        if let Ok(project) = Self::load_project() {
            settings.merge(project);
        }
        Ok(settings)
    }

    /// Save global settings
    pub fn save_global(&self) -> Result<()> {
        let store = JsonStore::global()?;
        store.save(PERMISSIONS_FILE, self)
    }

    /// Add a grant entry
    pub fn add_grant(&mut self, grant: PermissionGrant) {
        self.grants.insert(grant);
    }

    /// Add a grant derived from a runtime permission
    pub fn add_permission(&mut self, permission: &Permission) {
        let grant = PermissionGrant {
            tool: permission.tool_name.clone(),
            action_type: PermissionActionType::from(&permission.action),
            pattern: Self::extract_pattern(&permission.action),
        };
        self.grants.insert(grant);
    }

    /// Add a deny entry
    pub fn add_deny(&mut self, deny: PermissionDeny) {
        self.denies.insert(deny);
    }

    /// Check whether an action is permanently granted
    pub fn is_granted(&self, tool: &str, action: &PermissionAction) -> bool {
        let action_type = PermissionActionType::from(action);
        let pattern = Self::extract_pattern(action);

        for grant in &self.grants {
            if grant.tool == tool && grant.action_type == action_type {
                if let (Some(grant_pattern), Some(ref action_pattern)) = (&grant.pattern, &pattern)
                {
                    if Self::pattern_matches(grant_pattern, action_pattern) {
                        return true;
                    }
                } else if grant.pattern.is_none() {
                    return true;
                }
            }
        }

        false
    }

    /// Check whether an action is deny-listed
    pub fn is_denied(&self, tool: &str, action: &PermissionAction) -> bool {
        let pattern = Self::extract_pattern(action);

        for deny in &self.denies {
            if deny.tool == tool {
                if let Some(ref action_pattern) = pattern {
                    if Self::pattern_matches(&deny.pattern, action_pattern) {
                        return true;
                    }
                }
            }
        }

        false
    }

    /// Check whether a tool is auto-approved
    pub fn is_auto_approved(&self, tool: &str) -> bool {
        self.auto_approve || self.auto_approve_tools.contains(tool)
    }

    /// Merge another settings set into this one
    pub fn merge(&mut self, other: PermissionSettings) {
        self.grants.extend(other.grants);
        self.denies.extend(other.denies);
        self.auto_approve = self.auto_approve || other.auto_approve;
        self.auto_approve_tools.extend(other.auto_approve_tools);
    }

    fn extract_pattern(action: &PermissionAction) -> Option<String> {
        match action {
            PermissionAction::Execute { command } => Some(command.clone()),
            PermissionAction::Delegate { task, .. } => Some(task.clone()),
            PermissionAction::Custom { details, .. } => Some(details.clone()),
        }
    }

    fn pattern_matches(pattern: &str, value: &str) -> bool {
        if pattern == "**" || pattern == "*" {
            return true;
        }
        if let Some(prefix) = pattern.strip_suffix("/**") {
            return value.starts_with(prefix);
        }
        if let Some(prefix) = pattern.strip_suffix("/*") {
            return value.starts_with(prefix) && !value[prefix.len()..].contains('/');
        }
        pattern == value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delegate_grant() {
        let mut settings = PermissionSettings::new();

        settings.add_grant(PermissionGrant {
            tool: "claude_code".to_string(),
            action_type: PermissionActionType::Delegate,
            pattern: None,
        });

        assert!(settings.is_granted(
            "claude_code",
            &PermissionAction::Delegate {
                agent: "claude-code".to_string(),
                task: "refactor the parser".to_string()
            }
        ));

        assert!(!settings.is_granted(
            "bash",
            &PermissionAction::Execute {
                command: "ls".to_string()
            }
        ));
    }

    #[test]
    fn test_deny_pattern() {
        let mut settings = PermissionSettings::new();

        settings.add_deny(PermissionDeny {
            tool: "claude_code".to_string(),
            pattern: "**".to_string(),
            reason: Some("Delegation disabled".to_string()),
        });

        assert!(settings.is_denied(
            "claude_code",
            &PermissionAction::Delegate {
                agent: "claude-code".to_string(),
                task: "anything at all".to_string()
            }
        ));
    }

    #[test]
    fn test_merge_prefers_union() {
        let mut base = PermissionSettings::new();
        base.auto_approve_tools.insert("bash".to_string());

        let mut project = PermissionSettings::new();
        project.auto_approve = true;
        project.auto_approve_tools.insert("claude_code".to_string());

        base.merge(project);
        assert!(base.auto_approve);
        assert!(base.is_auto_approved("bash"));
        assert!(base.is_auto_approved("claude_code"));
    }

    #[test]
    fn test_settings_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());

        let mut settings = PermissionSettings::new();
        settings.add_permission(&Permission {
            tool_name: "claude_code".to_string(),
            action: PermissionAction::Delegate {
                agent: "claude-code".to_string(),
                task: "add unit tests".to_string(),
            },
            scope: crate::permission::PermissionScope::Permanent,
        });

        store.save(PERMISSIONS_FILE, &settings).unwrap();
        let loaded: PermissionSettings = store.load(PERMISSIONS_FILE).unwrap();
        assert_eq!(loaded.grants.len(), 1);
    }
}
