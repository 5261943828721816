//! Error types for the Wahoo API client.
//!
//! # Design
//! Every non-2xx response is classified into a `StatusError` from a fixed
//! table of upstream status descriptions. Argument guards fail with
//! `MissingMandatoryValue` before a request is even built, so callers can tell
//! "never sent" apart from "sent and rejected". Field-level decode anomalies
//! are not errors; they only surface as `InvalidFields` when the caller asks
//! for strict decoding.

use crate::decode::Diagnostic;

/// An HTTP status of 300 or above, with the upstream description attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusError {
    pub code: u16,
    pub message: &'static str,
}

impl StatusError {
    pub const UNHANDLED: &'static str = "Unhandled Response";

    pub fn from_code(code: u16) -> Self {
        let message = match code {
            400 => "Bad Request -- Your request is invalid.",
            401 => "Unauthorized -- Your API key is wrong.",
            403 => "Forbidden -- You do not have access to the specified resource.",
            404 => "Not Found -- The specified resource could not be found.",
            405 => "Method Not Allowed -- You tried to access a resource with an invalid method.",
            406 => "Not Acceptable -- You requested a format that isn't json.",
            410 => "Gone -- The resource requested has been removed from our servers.",
            422 => "Unprocessable Entity -- One or more parameters supplied are missing or invalid.",
            429 => "Too Many Requests -- You are sending too many requests in short period of time.",
            500 => "Internal Server Error -- We had a problem with our server. Try again later.",
            503 => "Service Unavailable -- We're temporarily offline for maintenance. Please try again later.",
            _ => Self::UNHANDLED,
        };
        Self { code, message }
    }
}

/// Errors returned by `WahooClient` and `BlockingClient`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A required argument was empty or zero; nothing was sent.
    #[error("missing mandatory value: {0}")]
    MissingMandatoryValue(&'static str),

    /// The transport could not complete the round trip.
    #[error("transport failed: {0}")]
    Transport(String),

    /// The server answered with a status of 300 or above.
    #[error("HTTP {}: {}", .0.code, .0.message)]
    Status(StatusError),

    /// The response body was not a JSON object of the expected shape.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// Strict decoding was requested and at least one field was skipped.
    #[error("{} field(s) could not be decoded", .0.len())]
    InvalidFields(Vec<Diagnostic>),
}

impl ApiError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Status(status) => Some(status.code),
            _ => None,
        }
    }
}

impl From<StatusError> for ApiError {
    fn from(status: StatusError) -> Self {
        ApiError::Status(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message() {
        let err = ApiError::from(StatusError::from_code(404));
        assert!(err.to_string().contains("Not Found"));
        assert_eq!(err.status_code(), Some(404));
    }

    #[test]
    fn too_many_requests_message() {
        let status = StatusError::from_code(429);
        assert_eq!(status.code, 429);
        assert!(status.message.contains("Too Many Requests"));
    }

    #[test]
    fn unmapped_code_gets_default_message() {
        let status = StatusError::from_code(418);
        assert_eq!(status.code, 418);
        assert_eq!(status.message, "Unhandled Response");

        let redirect = StatusError::from_code(302);
        assert_eq!(redirect.message, StatusError::UNHANDLED);
    }

    #[test]
    fn every_mapped_code_has_its_own_message() {
        for code in [400, 401, 403, 404, 405, 406, 410, 422, 429, 500, 503] {
            let status = StatusError::from_code(code);
            assert_ne!(status.message, StatusError::UNHANDLED, "code {code}");
        }
    }

    #[test]
    fn every_kind_renders_a_message() {
        let kinds = [
            ApiError::MissingMandatoryValue("workout_id"),
            ApiError::Transport("connection refused".to_string()),
            ApiError::Status(StatusError::from_code(503)),
            ApiError::DeserializationError("expected value".to_string()),
            ApiError::InvalidFields(Vec::new()),
        ];
        for err in kinds {
            let expected = match &err {
                ApiError::MissingMandatoryValue(_) => "missing mandatory value",
                ApiError::Transport(_) => "transport failed",
                ApiError::Status(_) => "HTTP 503",
                ApiError::DeserializationError(_) => "deserialization failed",
                ApiError::InvalidFields(_) => "0 field(s)",
            };
            assert!(err.to_string().starts_with(expected), "{err}");
        }
    }

    #[test]
    fn missing_value_display() {
        let err = ApiError::MissingMandatoryValue("access_token");
        assert_eq!(err.to_string(), "missing mandatory value: access_token");
        assert_eq!(err.status_code(), None);
    }
}
