//! # bridge-foundation
//!
//! Foundation layer for Claude Bridge:
//! - Error: central error enum and `Result` alias
//! - Permission: runtime grants plus persisted settings
//! - Storage: JSON config store

pub mod error;
pub mod permission;
pub mod storage;

pub use error::{Error, Result};

pub use permission::{
    Permission, PermissionAction, PermissionActionType, PermissionDeny, PermissionGrant,
    PermissionScope, PermissionService, PermissionSettings, PermissionStatus, PERMISSIONS_FILE,
};

pub use storage::JsonStore;
