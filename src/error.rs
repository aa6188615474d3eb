//! Gate errors.
//!
//! ERROR HANDLING
//! ==============
//! Most gate failures never surface as errors: a missing credential becomes a
//! redirect, malformed roles become an empty set, a 403 becomes a user notice
//! and a 401 becomes a logout. Only configuration problems and transport-level
//! failures propagate through `GateError`.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

/// Errors produced by session-gate operations.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    /// A configuration value could not be parsed.
    #[error("config parse failed: {0}")]
    ConfigParse(String),

    /// A caller-supplied header could not be sent.
    #[error("invalid header `{name}`: {reason}")]
    InvalidHeader { name: String, reason: String },

    /// The HTTP request failed before a response arrived.
    #[error("http request failed: {0}")]
    Transport(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl GateError {
    /// Stable machine-readable code for logs and CLI output.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ConfigParse(_) => "E_CONFIG_PARSE",
            Self::InvalidHeader { .. } => "E_INVALID_HEADER",
            Self::Transport(_) => "E_TRANSPORT",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }
}
