//! Error types for the built.io SDK.

use serde_json::Value;
use thiserror::Error;

/// Result type alias for SDK operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the SDK.
#[derive(Error, Debug)]
pub enum Error {
    // ===== Configuration Errors =====
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Credentials not found: {0}")]
    CredentialsNotFound(String),

    // ===== Validation Errors =====
    #[error("Invalid argument: {0}")]
    Validation(String),

    #[error("uid is not set: the record has not been saved yet")]
    UidNotSet,

    // ===== API Errors =====
    #[error("API error: {status} {error_code} - {error_message}")]
    Api {
        status: u16,
        error_code: String,
        error_message: String,
        errors: Option<Value>,
    },

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    // ===== Session Errors =====
    #[error("Not logged in: the user's authtoken does not match the active session")]
    NotLoggedIn,

    // ===== Parsing Errors =====
    #[error("Invalid timestamp: {0}")]
    Timestamp(#[from] chrono::ParseError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // ===== I/O Errors =====
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an API error from a status code and the server's error fields.
    pub fn api(
        status: u16,
        error_code: impl Into<String>,
        error_message: impl Into<String>,
        errors: Option<Value>,
    ) -> Self {
        Self::Api {
            status,
            error_code: error_code.into(),
            error_message: error_message.into(),
            errors,
        }
    }

    /// Build an API error from a non-2xx response body.
    ///
    /// The body is expected to look like `{error_code, error_message, errors?}`.
    /// Missing or non-JSON bodies still produce an error carrying the status.
    pub fn from_response_body(status: u16, body: &[u8]) -> Self {
        let payload: Value = serde_json::from_slice(body).unwrap_or(Value::Null);

        let error_code = match payload.get("error_code") {
            Some(Value::String(code)) => code.clone(),
            Some(Value::Number(code)) => code.to_string(),
            _ => status.to_string(),
        };
        let error_message = payload
            .get("error_message")
            .and_then(Value::as_str)
            .map(String::from)
            .unwrap_or_else(|| String::from_utf8_lossy(body).into_owned());
        let errors = payload.get("errors").filter(|e| !e.is_null()).cloned();

        Self::api(status, error_code, error_message, errors)
    }

    /// Server-provided error code, for API errors.
    pub fn error_code(&self) -> Option<&str> {
        match self {
            Self::Api { error_code, .. } => Some(error_code),
            _ => None,
        }
    }

    /// Server-provided error message, for API errors.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Api { error_message, .. } => Some(error_message),
            _ => None,
        }
    }

    /// HTTP status code, for API errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether this error was raised before any request was sent.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::UidNotSet)
    }
}
