//! Parsed API responses.

use http::StatusCode;
use serde_json::{Map, Value};

use crate::error::{SpecError, SpecResult};

/// Reason phrase used for status code 0, which the API reports when it
/// could not reach a provider.
pub const NETWORK_CONNECTION_ERROR: &str = "Network Connection Error";

/// The parsed outcome of one API request.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    code: u16,
    result: Value,
    success: bool,
    status: String,
    message: String,
}

impl ApiResponse {
    /// Parses a response from its status code and raw body.
    ///
    /// A `204 No Content` response yields an empty object; any other body
    /// must be valid JSON.
    pub fn parse(code: u16, body: &[u8]) -> SpecResult<Self> {
        let result = if code == StatusCode::NO_CONTENT.as_u16() {
            Value::Object(Map::new())
        } else {
            serde_json::from_slice(body).map_err(|source| SpecError::InvalidJson { code, source })?
        };

        let success = code < 400;
        let message = match result.pointer("/error/message") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };

        Ok(Self {
            code,
            status: status_text(code, success),
            result,
            success,
            message,
        })
    }

    /// Returns the HTTP status code.
    pub fn code(&self) -> u16 {
        self.code
    }

    /// Returns the parsed JSON body.
    pub fn result(&self) -> &Value {
        &self.result
    }

    /// Returns true if the status code is below 400.
    pub fn success(&self) -> bool {
        self.success
    }

    /// Returns the reason phrase for the status code.
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Returns `error.message` from the body, or an empty string.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Returns the reason phrase for a status code.
///
/// Unknown codes fall back to the phrase for 200 or 400 depending on
/// whether the request succeeded.
pub fn status_text(code: u16, success: bool) -> String {
    if code == 0 {
        return NETWORK_CONNECTION_ERROR.to_string();
    }

    let fallback = if success {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };

    StatusCode::from_u16(code)
        .ok()
        .and_then(|s| s.canonical_reason())
        .or_else(|| fallback.canonical_reason())
        .unwrap_or_default()
        .to_string()
}
