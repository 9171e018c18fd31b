//! Error codes shared by service and route layers.
//!
//! DESIGN
//! ======
//! Every service error enum implements `ErrorCode` so routes can render a
//! uniform JSON error body: `{ "code": "E_…", "message": "…", "retryable": bool }`.
//! Codes are grepable constants, never derived from `Display` text.

use serde_json::{Value, json};

/// Error body key for the grepable error code.
pub const ERROR_CODE: &str = "code";

/// Error body key for the human-readable message.
pub const ERROR_MESSAGE: &str = "message";

/// Error body key for the retryable flag.
pub const ERROR_RETRYABLE: &str = "retryable";

/// Maps a typed error to a stable code and a retry hint.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

/// Build the JSON error body for a typed error.
#[must_use]
pub fn error_body(err: &dyn ErrorCode) -> Value {
    json!({
        ERROR_CODE: err.error_code(),
        ERROR_MESSAGE: err.to_string(),
        ERROR_RETRYABLE: err.retryable(),
    })
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
