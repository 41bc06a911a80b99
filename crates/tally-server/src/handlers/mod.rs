//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod categories;
pub mod expenses;
pub mod health;
pub mod upload;

// Re-export all handlers for use in router
pub use categories::*;
pub use expenses::*;
pub use health::*;
pub use upload::*;

use serde::Deserialize;

use crate::AppError;

/// Query string for list endpoints (`?active=true`)
#[derive(Debug, Deserialize)]
pub struct ActiveQuery {
    pub active: Option<String>,
}

impl ActiveQuery {
    /// The `active` flag is required and must be `true` or `false`
    pub fn flag(&self) -> Result<bool, AppError> {
        let raw = self
            .active
            .as_deref()
            .ok_or_else(|| AppError::bad_request("Missing 'active' query parameter"))?;
        raw.parse()
            .map_err(|_| AppError::bad_request(&format!("Invalid 'active' value: {}", raw)))
    }
}
