//! Error types for the chat-relay backend.

use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// What went wrong talking to the upstream provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamKind {
    /// Connection, TLS or other transport-level failure.
    Transport,
    Timeout,
    /// 401 or 403 from the provider.
    Authentication,
    /// 429 from the provider.
    RateLimited,
    /// Any other non-success status.
    Rejected(u16),
    /// The body could not be decoded or carried no usable choice.
    MalformedResponse,
}

impl UpstreamKind {
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => UpstreamKind::Authentication,
            429 => UpstreamKind::RateLimited,
            other => UpstreamKind::Rejected(other),
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            UpstreamKind::Transport => "transport",
            UpstreamKind::Timeout => "timeout",
            UpstreamKind::Authentication => "authentication",
            UpstreamKind::RateLimited => "rate_limited",
            UpstreamKind::Rejected(_) => "rejected",
            UpstreamKind::MalformedResponse => "malformed_response",
        }
    }
}

impl fmt::Display for UpstreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpstreamKind::Rejected(status) => write!(f, "rejected with status {}", status),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Error types for chat operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Caller input violates a constraint. Never reaches the provider.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// No usable upstream credential. Permanent until the process is reconfigured.
    #[error("Not configured: {0}")]
    NotConfigured(String),

    #[error("Upstream error ({kind}): {message}")]
    Upstream { kind: UpstreamKind, message: String },
}

impl Error {
    pub fn upstream(kind: UpstreamKind, message: impl Into<String>) -> Self {
        Error::Upstream {
            kind,
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            Error::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::Upstream {
                kind: UpstreamKind::Timeout,
                ..
            } => StatusCode::GATEWAY_TIMEOUT,
            Error::Upstream { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            Error::InvalidParameter(_) => "invalid_parameter",
            Error::NotConfigured(_) => "not_configured",
            Error::Upstream { .. } => "upstream_error",
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            Error::InvalidParameter(_) => tracing::debug!("Rejected request: {}", self),
            Error::NotConfigured(_) => tracing::error!("{}", self),
            Error::Upstream { .. } => tracing::warn!("{}", self),
        }

        let mut error = json!({
            "type": self.error_type(),
            "message": self.to_string()
        });
        if let Error::Upstream { kind, .. } = &self {
            error["kind"] = json!(kind.as_str());
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, Error>;
