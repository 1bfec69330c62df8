//! Core error types

use thiserror::Error;

/// Core compositor errors
#[derive(Error, Debug, Clone)]
pub enum CoreError {
    #[error("Wayland protocol error: {0}")]
    Protocol(String),

    #[error("Surface {surface_id} already has role {current}, cannot take role {requested}")]
    RoleConflict {
        surface_id: u32,
        current: &'static str,
        requested: &'static str,
    },

    #[error("Render pass failed: {0}")]
    Render(String),
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
