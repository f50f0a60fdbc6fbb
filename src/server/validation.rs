//! Presence and length checks applied before anything reaches the gateway
//! or the store. Lengths are counted in characters.

use super::error::ApiError;

pub const MAX_TOOL_NAME: usize = 64;
pub const MAX_COMMAND: usize = 2048;
pub const MAX_QUESTION: usize = 4096;
pub const MAX_ANSWER: usize = 2048;
pub const MAX_EXPLANATION: usize = 16 * 1024;
pub const MAX_SEARCH_TEXT: usize = 256;

/// Field must be present and contain something other than whitespace.
pub fn required<'a>(field: &str, value: Option<&'a str>, max: usize) -> Result<&'a str, ApiError> {
    match value {
        Some(v) if !v.trim().is_empty() => within_limit(field, v, max),
        Some(_) => Err(ApiError::BadRequest(format!("{} must not be blank", field))),
        None => Err(ApiError::BadRequest(format!("{} is required", field))),
    }
}

/// Field must be present but may be empty.
pub fn present<'a>(field: &str, value: Option<&'a str>, max: usize) -> Result<&'a str, ApiError> {
    match value {
        Some(v) => within_limit(field, v, max),
        None => Err(ApiError::BadRequest(format!("{} is required", field))),
    }
}

pub fn within_limit<'a>(field: &str, value: &'a str, max: usize) -> Result<&'a str, ApiError> {
    if value.chars().count() > max {
        return Err(ApiError::BadRequest(format!(
            "{} exceeds {} characters",
            field, max
        )));
    }
    Ok(value)
}
