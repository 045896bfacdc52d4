//! Outbound side: the slice of the GitHub Contents API this service relies on.
//!
//! The handler talks to GitHub only through [`ContentsApi`], which has two calls: a
//! best-effort metadata lookup and a create-or-update write.

use async_trait::async_trait;
use base64::prelude::*;
use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::config::ProjectCredentials;

pub mod client;

pub use client::GitHubClient;

/// Product tag sent as `User-Agent` on every outbound call.
pub const USER_AGENT: &str = "CADS-v2.0";
/// Media type requested from the API.
pub const ACCEPT: &str = "application/vnd.github.v3+json";

/// What a metadata lookup found at a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileLookup {
    /// The file exists at this blob revision.
    Found {
        /// Blob SHA that must accompany an overwrite.
        sha: String,
    },
    /// GitHub answered, but there is no file at the path.
    Missing,
    /// The lookup itself failed (transport error or undecodable body).
    Unreachable(String),
}

impl FileLookup {
    /// The revision marker to send with the write, if any.
    ///
    /// Only [`FileLookup::Found`] carries one. A failed lookup is treated as a new file.
    #[must_use]
    pub fn into_sha(self) -> Option<String> {
        match self {
            Self::Found { sha } => Some(sha),
            Self::Missing | Self::Unreachable(_) => None,
        }
    }
}

/// Body of the create-or-update call.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct UpsertFile {
    /// Commit message.
    pub message: String,
    /// File body, base64 encoded.
    pub content: String,
    /// Current blob SHA. Left out entirely for new files, since GitHub rejects a
    /// `sha` that does not match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
}

/// Successful create-or-update response.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UpsertedFile {
    /// The written file.
    pub content: UpsertedContent,
    /// The commit that wrote it.
    pub commit: UpsertedCommit,
}

/// File part of [`UpsertedFile`].
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UpsertedContent {
    /// Browser URL of the file.
    pub html_url: String,
    /// New blob SHA.
    pub sha: String,
}

/// Commit part of [`UpsertedFile`].
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UpsertedCommit {
    /// New commit SHA.
    pub sha: String,
}

/// Failure of the write call.
#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum ContentsError {
    /// GitHub answered with a non-success status.
    #[display(fmt = "GitHub rejected the write with status {}", status)]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// `message` field of the error body, when there was one.
        message: Option<String>,
    },
    /// The call could not be completed or its answer could not be read.
    #[display(fmt = "{}", _0)]
    Transport(String),
}

impl std::error::Error for ContentsError {}

/// The two GitHub calls a deploy needs.
#[async_trait]
pub trait ContentsApi: Send + Sync {
    /// Fetch metadata for `path`. Never fails; problems are reported as a variant.
    async fn lookup(&self, credentials: &ProjectCredentials, path: &str) -> FileLookup;

    /// Create or update the file at `path`.
    ///
    /// # Errors
    /// Errors if GitHub refuses the write or cannot be reached.
    async fn put(
        &self,
        credentials: &ProjectCredentials,
        path: &str,
        body: &UpsertFile,
    ) -> Result<UpsertedFile, ContentsError>;
}

/// Base64 (standard alphabet, padded) of the UTF-8 bytes of `content`.
#[must_use]
pub fn encode_content(content: &str) -> String {
    BASE64_STANDARD.encode(content.as_bytes())
}
