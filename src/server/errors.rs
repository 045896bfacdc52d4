//! Errors surfaced to callers of the HTTP API.
//!
//! Every failure is answered with the same JSON shape, `{"success": false, "error": "..."}`,
//! and only the status code tells the kinds apart.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use derive_more::Display;
use serde::Serialize;

use crate::github::ContentsError;

/// Reported when GitHub refuses a write without saying why.
pub const UPSTREAM_FALLBACK_MESSAGE: &str = "GitHub API error";

/// Terminal failure of a request.
#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum DeployError {
    /// `filename` or `content` missing or empty.
    #[display(fmt = "filename and content are required")]
    InvalidInput,
    /// Body is not a JSON object of the expected shape.
    #[display(fmt = "Invalid request body: {}", _0)]
    InvalidBody(String),
    /// Body larger than the accepted limit, in bytes.
    #[display(fmt = "Request body exceeds {} bytes", _0)]
    PayloadTooLarge(usize),
    /// `deployKey` does not match the configured secret.
    #[display(fmt = "Deploy key does not match")]
    Unauthorized,
    /// No repository or token for the requested project (or `default`).
    #[display(fmt = "Project configuration not found: {}", _0)]
    MissingConfiguration(String),
    /// Method not accepted on this path.
    #[display(fmt = "Method not allowed")]
    MethodNotAllowed,
    /// GitHub refused the write.
    #[display(fmt = "{}", _0)]
    UpstreamWrite(String),
    /// Anything else, e.g. the network failing mid-write.
    #[display(fmt = "{}", _0)]
    Unexpected(String),
}

impl std::error::Error for DeployError {}

/// Uniform failure body.
#[derive(Serialize, Debug)]
pub struct Failure {
    /// Always `false`.
    pub success: bool,
    /// Human readable reason.
    pub error: String,
}

impl ResponseError for DeployError {
    fn status_code(&self) -> StatusCode {
        match *self {
            Self::InvalidInput | Self::InvalidBody(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::MissingConfiguration(_) | Self::UpstreamWrite(_) | Self::Unexpected(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(Failure {
            success: false,
            error: self.to_string(),
        })
    }
}

impl From<ContentsError> for DeployError {
    fn from(err: ContentsError) -> Self {
        match err {
            ContentsError::Rejected { message, .. } => Self::UpstreamWrite(
                message.unwrap_or_else(|| UPSTREAM_FALLBACK_MESSAGE.to_owned()),
            ),
            ContentsError::Transport(reason) => Self::Unexpected(reason),
        }
    }
}
