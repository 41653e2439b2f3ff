//! Error mapping for the PDP adapter

use std::time::Duration;

use shelf_auth_core::PolicyError;

/// Convert a reqwest error to PolicyError
pub fn map_http_error(err: reqwest::Error, deadline: Duration) -> PolicyError {
    if err.is_timeout() {
        PolicyError::Timeout(deadline)
    } else if err.is_decode() {
        PolicyError::Protocol(err.to_string())
    } else if let Some(status) = err.status() {
        PolicyError::Status(status.as_u16())
    } else {
        // connect / request / body errors
        PolicyError::Transport(err.to_string())
    }
}

/// Reject non-2xx responses
pub fn ensure_success(status: reqwest::StatusCode) -> Result<(), PolicyError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(PolicyError::Status(status.as_u16()))
    }
}
