use chrono::{SecondsFormat, Utc};
use serde::Serialize;

/// Message accompanying every successful deploy.
pub const SUCCESS_MESSAGE: &str = "Deploy succeeded";

/// Response for a successful deploy.
#[derive(Serialize, Debug)]
pub struct Success {
    /// Always `true`.
    pub success: bool,
    /// See [`SUCCESS_MESSAGE`].
    pub message: &'static str,
    /// What was written where.
    pub data: Deployed,
}

impl Success {
    /// Wrap `data` in the success envelope.
    #[must_use]
    pub const fn new(data: Deployed) -> Self {
        Self {
            success: true,
            message: SUCCESS_MESSAGE,
            data,
        }
    }
}

/// Outcome of a deploy.
#[derive(Serialize, Debug, PartialEq, Eq)]
pub struct Deployed {
    /// Project as requested, or `default`.
    pub project: String,
    /// Repository written to, `owner/repo`.
    pub repo: String,
    /// Path as requested.
    pub filename: String,
    /// Browser URL of the file.
    pub url: String,
    /// New blob SHA.
    pub sha: String,
    /// New commit SHA.
    pub commit: String,
    /// When the response was generated, RFC 3339 in UTC.
    pub timestamp: String,
}

/// Current time as e.g. `2026-01-02T03:04:05.678Z`.
#[must_use]
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
