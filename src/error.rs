use serde::{Deserialize, Serialize};
use std::fmt;

/// Error returned by every fallible operation of this crate.
///
/// It carries the HTTP status code the failure should be reported with and a
/// human readable message. Two errors are equal when both fields are equal.
///
/// ```rust
/// use lambda_commons::error::ApplicationError;
///
/// let error = ApplicationError::not_found("user not found");
/// assert_eq!(error.http_status(), 404);
/// assert_eq!(error.to_string(), "user not found");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApplicationError {
    http_status: u16,
    message: String,
}

impl ApplicationError {
    /// Create an error with an arbitrary status code.
    pub fn new(http_status: u16, message: impl Into<String>) -> Self {
        Self {
            http_status,
            message: message.into(),
        }
    }

    /// 400 with a custom message.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(400, message)
    }

    /// 401 with a custom message.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(401, message)
    }

    /// 403 with a custom message.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(403, message)
    }

    /// 404 with a custom message.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(404, message)
    }

    /// 412 with a custom message.
    pub fn precondition_failed(message: impl Into<String>) -> Self {
        Self::new(412, message)
    }

    /// 500 with a custom message.
    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self::new(500, message)
    }

    /// 400 with the canned message `bad request`.
    pub fn generic_bad_request() -> Self {
        Self::bad_request("bad request")
    }

    /// 401 with the canned message `unauthorized`.
    pub fn generic_unauthorized() -> Self {
        Self::unauthorized("unauthorized")
    }

    /// 403 with the canned message `forbidden`.
    pub fn generic_forbidden() -> Self {
        Self::forbidden("forbidden")
    }

    /// 404 with the canned message `not found`.
    pub fn generic_not_found() -> Self {
        Self::not_found("not found")
    }

    /// 412 with the canned message `precondition failed`.
    pub fn generic_precondition_failed() -> Self {
        Self::precondition_failed("precondition failed")
    }

    /// 500 with the canned message `internal server error`.
    pub fn generic_internal_server_error() -> Self {
        Self::internal_server_error("internal server error")
    }

    /// The HTTP status code of the error.
    pub fn http_status(&self) -> u16 {
        self.http_status
    }

    /// The error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ApplicationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ApplicationError {}

/// JSON body sent back to the caller when a request fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// The error message.
    pub message: String,
}

impl From<&ApplicationError> for ErrorResponse {
    fn from(error: &ApplicationError) -> Self {
        Self {
            message: error.message.clone(),
        }
    }
}
