//! Input validation utilities.
//!
//! Centralized validation helpers used across API routes and functions.

use validator::Validate;

use crate::error::StockpilotError;

/// Validate a request body, returning a StockpilotError::Validation on failure.
pub fn validate_request<T: Validate>(body: &T) -> Result<(), StockpilotError> {
    body.validate().map_err(|e| StockpilotError::Validation {
        message: format_validation_errors(e),
    })
}

/// Format validation errors into a human-readable string.
fn format_validation_errors(errors: validator::ValidationErrors) -> String {
    let mut messages = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value for '{field}'"))
            })
        })
        .collect::<Vec<_>>();
    // field_errors() is a HashMap; keep the output stable.
    messages.sort();
    messages.join("; ")
}

/// Reject strings that are empty once trimmed.
pub fn require_non_blank(field: &str, value: &str) -> Result<(), StockpilotError> {
    if value.trim().is_empty() {
        return Err(StockpilotError::Validation {
            message: format!("{field} cannot be empty or whitespace only"),
        });
    }
    Ok(())
}
