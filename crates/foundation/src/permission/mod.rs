//! Permission system for Claude Bridge
//!
//! - `service`: runtime grant management (PermissionService)
//! - `settings`: persisted allow/deny settings (PermissionSettings)

mod service;
mod settings;

pub use service::{
    Permission, PermissionAction, PermissionScope, PermissionService, PermissionStatus,
};

pub use settings::{
    PermissionActionType, PermissionDeny, PermissionGrant, PermissionSettings, PERMISSIONS_FILE,
};
