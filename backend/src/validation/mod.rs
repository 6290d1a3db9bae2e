//! Validation helpers for request payloads.
//!
//! Presence checks run first so a missing field reports the route's
//! "required" message; format rules are declared with `validator` on the
//! payload types.

pub mod rules;

pub use validator::Validate;

use crate::error::AppError;

/// Fails with `message` when any of `values` is empty or whitespace.
pub fn require_present(values: &[&str], message: &str) -> Result<(), AppError> {
    if values.iter().any(|value| value.trim().is_empty()) {
        return Err(AppError::Validation(message.to_string()));
    }
    Ok(())
}
