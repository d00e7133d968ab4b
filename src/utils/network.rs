//! Classification of Azure service errors by HTTP status.
//!
//! The SDK surfaces transport and service failures as `azure_core::Error`;
//! the handful of statuses this crate reacts to (missing blob on delete,
//! existing table on create) are detected here. Everything else propagates
//! unchanged.

use azure_core::StatusCode;

/// Whether an Azure error denotes a missing resource (HTTP 404).
pub fn is_not_found(error: &azure_core::Error) -> bool {
    if let Some(http) = error.as_http_error() {
        return http.status() == StatusCode::NotFound;
    }

    // Fallback for errors that lost their HTTP context (emulators, proxies)
    let message = error.to_string().to_lowercase();
    message.contains("404")
        || message.contains("not found")
        || message.contains("blobnotfound")
        || message.contains("resourcenotfound")
        || message.contains("tablenotfound")
}

/// Whether an Azure error denotes a conflicting resource (HTTP 409).
pub fn is_conflict(error: &azure_core::Error) -> bool {
    if let Some(http) = error.as_http_error() {
        return http.status() == StatusCode::Conflict;
    }

    let message = error.to_string().to_lowercase();
    message.contains("409")
        || message.contains("already exists")
        || message.contains("tablealreadyexists")
        || message.contains("containeralreadyexists")
}
