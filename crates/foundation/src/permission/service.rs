//! Permission service for Claude Bridge
//!
//! Manages runtime permission grants and integrates with persistent storage.
//! This is a pure data management layer - UI/CLI interaction is handled elsewhere.

use super::settings::PermissionSettings;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::RwLock;
use tracing::debug;

/// Types of permission actions
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PermissionAction {
    /// Execute a shell command
    Execute { command: String },

    /// Delegate a task to an external coding agent
    Delegate { agent: String, task: String },

    /// Custom action
    Custom { name: String, details: String },
}

impl PermissionAction {
    /// Get a human-readable description
    pub fn description(&self) -> String {
        match self {
            Self::Execute { command } => format!("Execute: {}", command),
            Self::Delegate { agent, task } => format!("Delegate to {}: {}", agent, task),
            Self::Custom { name, details } => format!("{}: {}", name, details),
        }
    }
}

/// A granted permission
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Permission {
    pub tool_name: String,
    pub action: PermissionAction,
    pub scope: PermissionScope,
}

/// Scope of a granted permission
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PermissionScope {
    /// Valid for current request only
    Once,

    /// Valid for current session
    Session,

    /// Saved permanently
    Permanent,
}

/// Permission check result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    /// Permission granted
    Granted,

    /// Permission denied (in deny list)
    Denied,

    /// Permission not found - needs user decision
    Unknown,

    /// Auto-approved (tool or global auto-approve)
    AutoApproved,
}

/// Permission service managing grants and queries
///
/// This service handles:
/// - Session grants (in-memory, cleared on restart)
/// - Permanent grants (loaded from/saved to JSON storage)
/// - Permission checking and granting
pub struct PermissionService {
    /// Session grants (in-memory only)
    session_grants: RwLock<HashSet<Permission>>,

    /// Persistent settings (loaded from storage)
    settings: RwLock<PermissionSettings>,
}

impl PermissionService {
    /// Create a new permission service with default settings
    pub fn new() -> Self {
        Self {
            session_grants: RwLock::new(HashSet::new()),
            settings: RwLock::new(PermissionSettings::default()),
        }
    }

    /// Create with loaded settings
    pub fn with_settings(settings: PermissionSettings) -> Self {
        Self {
            session_grants: RwLock::new(HashSet::new()),
            settings: RwLock::new(settings),
        }
    }

    /// Load settings from storage (global + project merged)
    pub fn load() -> Result<Self> {
        let settings = PermissionSettings::load()?;
        Ok(Self::with_settings(settings))
    }

    /// Create with auto-approve enabled for all tools
    pub fn with_auto_approve() -> Self {
        let mut settings = PermissionSettings::default();
        settings.auto_approve = true;
        Self::with_settings(settings)
    }

    /// Check permission status for an action
    pub fn check(&self, tool_name: &str, action: &PermissionAction) -> PermissionStatus {
        // Deny list wins over everything else
        if let Ok(settings) = self.settings.read() {
            if settings.is_denied(tool_name, action) {
                return PermissionStatus::Denied;
            }

            if settings.is_auto_approved(tool_name) {
                return PermissionStatus::AutoApproved;
            }

            if settings.is_granted(tool_name, action) {
                return PermissionStatus::Granted;
            }
        }

        if let Ok(grants) = self.session_grants.read() {
            for grant in grants.iter() {
                if grant.tool_name == tool_name && &grant.action == action {
                    return PermissionStatus::Granted;
                }
            }
        }

        PermissionStatus::Unknown
    }

    /// Check if an action is permitted (convenience method)
    pub fn is_permitted(&self, tool_name: &str, action: &PermissionAction) -> bool {
        matches!(
            self.check(tool_name, action),
            PermissionStatus::Granted | PermissionStatus::AutoApproved
        )
    }

    /// Grant session permission
    pub fn grant_session(&self, tool_name: &str, action: PermissionAction) {
        let permission = Permission {
            tool_name: tool_name.to_string(),
            action,
            scope: PermissionScope::Session,
        };

        if let Ok(mut grants) = self.session_grants.write() {
            grants.insert(permission);
        }
    }

    /// Grant and save permanent permission
    pub fn grant_permanent(&self, tool_name: &str, action: PermissionAction) -> Result<()> {
        let permission = Permission {
            tool_name: tool_name.to_string(),
            action,
            scope: PermissionScope::Permanent,
        };

        if let Ok(mut settings) = self.settings.write() {
            settings.add_permission(&permission);
            settings.save_global()?;
        }

        Ok(())
    }

    /// Clear all session grants
    pub fn clear_session(&self) {
        if let Ok(mut grants) = self.session_grants.write() {
            grants.clear();
        }
    }

    /// Get all session grants
    pub fn session_grants(&self) -> Vec<Permission> {
        self.session_grants
            .read()
            .map(|g| g.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Request permission for an action
    ///
    /// Returns:
    /// - Ok(true) if permitted (granted or auto-approved)
    /// - Ok(false) if denied
    /// - Err if permission is unknown and needs user interaction
    ///
    /// The caller (host framework) is expected to prompt the user on
    /// `Unknown` and call `grant_session()` or `grant_permanent()` based on
    /// the response.
    pub async fn request(
        &self,
        session_id: &str,
        tool_name: &str,
        description: &str,
        action: PermissionAction,
    ) -> Result<bool> {
        debug!(session_id, tool_name, description, "permission request");

        match self.check(tool_name, &action) {
            PermissionStatus::Granted | PermissionStatus::AutoApproved => Ok(true),
            PermissionStatus::Denied => Ok(false),
            PermissionStatus::Unknown => Err(crate::Error::PermissionDenied(format!(
                "Permission required for {}: {}",
                tool_name,
                action.description()
            ))),
        }
    }
}

impl Default for PermissionService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permission::settings::PermissionDeny;

    fn delegate_action() -> PermissionAction {
        PermissionAction::Delegate {
            agent: "claude-code".to_string(),
            task: "fix the failing test".to_string(),
        }
    }

    #[test]
    fn test_session_grant() {
        let service = PermissionService::new();
        let action = delegate_action();

        // Initially not permitted
        assert!(!service.is_permitted("claude_code", &action));

        service.grant_session("claude_code", action.clone());
        assert!(service.is_permitted("claude_code", &action));

        service.clear_session();
        assert!(!service.is_permitted("claude_code", &action));
    }

    #[test]
    fn test_permission_status() {
        let service = PermissionService::new();
        let action = PermissionAction::Execute {
            command: "ls".to_string(),
        };

        assert_eq!(service.check("bash", &action), PermissionStatus::Unknown);

        service.grant_session("bash", action.clone());
        assert_eq!(service.check("bash", &action), PermissionStatus::Granted);
    }

    #[test]
    fn test_deny_wins_over_auto_approve() {
        let mut settings = PermissionSettings::default();
        settings.auto_approve = true;
        settings.add_deny(PermissionDeny {
            tool: "claude_code".to_string(),
            pattern: "**".to_string(),
            reason: Some("disabled by policy".to_string()),
        });

        let service = PermissionService::with_settings(settings);
        assert_eq!(
            service.check("claude_code", &delegate_action()),
            PermissionStatus::Denied
        );
    }

    #[tokio::test]
    async fn test_request_outcomes() {
        let allow = PermissionService::with_auto_approve();
        let permitted = allow
            .request("s1", "claude_code", "delegate", delegate_action())
            .await
            .unwrap();
        assert!(permitted);

        let unknown = PermissionService::new();
        let err = unknown
            .request("s1", "claude_code", "delegate", delegate_action())
            .await
            .unwrap_err();
        assert!(matches!(err, crate::Error::PermissionDenied(_)));
    }
}
