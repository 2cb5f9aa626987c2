//! Error types for the implicit-flow client.
//!
//! Uses `thiserror` for structured error handling. Callback errors map onto
//! distinct HTTP status codes so callers can tell them apart.

use axum::{
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};

/// Errors raised while processing `GET /login/callback`.
///
/// Every variant is terminal for the exchange that produced it.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CallbackError {
    /// The callback arrived without any query parameters, or without a token.
    #[error("No Access Token provided")]
    MissingParameters,

    /// The returned `state` does not match the one sent to the authorization server.
    #[error("The state variables did not match. Could not identify response validity.")]
    StateMismatch,

    /// The bearer token is missing or failed signature verification.
    #[error("Invalid bearer token: {reason}")]
    Unauthenticated {
        /// Short, non-sensitive description of the failure
        reason: String,
    },
}

impl CallbackError {
    /// Create an unauthenticated error.
    #[must_use]
    pub fn unauthenticated(reason: impl Into<String>) -> Self {
        Self::Unauthenticated { reason: reason.into() }
    }

    /// HTTP status surfaced for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MissingParameters => StatusCode::NOT_FOUND,
            Self::StateMismatch | Self::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for CallbackError {
    fn into_response(self) -> Response {
        let mut response = (self.status(), self.to_string()).into_response();
        if matches!(self, Self::Unauthenticated { .. }) {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static(r#"Bearer error="invalid_token""#),
            );
        }
        response
    }
}

/// Errors detected while loading configuration at startup.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// A required variable is not set
    #[error("Missing required configuration: {0}")]
    Missing(&'static str),

    /// A variable is set but empty
    #[error("Configuration value {0} must not be empty")]
    Empty(&'static str),

    /// A URL variable does not parse as an absolute URL
    #[error("Invalid URL in {key}: {source}")]
    InvalidUrl {
        /// Variable name
        key: &'static str,
        /// Parser error
        #[source]
        source: url::ParseError,
    },

    /// A numeric variable is malformed or out of range
    #[error("Invalid number in {key}: {value:?}")]
    InvalidNumber {
        /// Variable name
        key: &'static str,
        /// Raw value
        value: String,
    },
}
