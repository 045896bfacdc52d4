//! `reqwest` implementation of [`ContentsApi`].
use anyhow::Context as _;
use async_trait::async_trait;
use reqwest::{header, Client, Method, RequestBuilder};
use serde::Deserialize;
use url::Url;

use super::{ContentsApi, ContentsError, FileLookup, UpsertFile, UpsertedFile, ACCEPT, USER_AGENT};
use crate::config::ProjectCredentials;

/// Error body returned by the GitHub API.
#[derive(Deserialize)]
struct ErrorBody {
    /// Human readable reason, e.g. `Validation Failed`.
    message: Option<String>,
}

/// Talks to the GitHub REST API.
///
/// No timeout is configured; the host's per-invocation limit bounds every call.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    /// Shared connection pool.
    http: Client,
    /// API location; the contents path is appended to its segments.
    api_base_url: Url,
}

impl GitHubClient {
    /// Create a client for the API at `api_base_url`.
    ///
    /// # Errors
    /// Will error if `api_base_url` is not an absolute hierarchical URL or the TLS
    /// backend cannot be initialized.
    pub fn new(api_base_url: &str) -> anyhow::Result<Self> {
        let parsed = Url::parse(api_base_url)
            .with_context(|| format!("invalid GitHub API URL '{api_base_url}'"))?;
        anyhow::ensure!(
            !parsed.cannot_be_a_base(),
            "GitHub API URL '{api_base_url}' cannot carry a path"
        );
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("could not build HTTP client")?;
        Ok(Self {
            http,
            api_base_url: parsed,
        })
    }

    /// `{base}/repos/{owner/repo}/contents/{path}`, each segment percent-encoded.
    fn contents_url(&self, repository: &str, path: &str) -> Url {
        let mut url = self.api_base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .push("repos")
                .extend(repository.split('/').filter(|segment| !segment.is_empty()))
                .push("contents")
                .extend(path.split('/').filter(|segment| !segment.is_empty()));
        }
        url
    }

    /// Authenticated request to the contents endpoint for `path`.
    fn request(
        &self,
        method: Method,
        credentials: &ProjectCredentials,
        path: &str,
    ) -> RequestBuilder {
        self.http
            .request(method, self.contents_url(&credentials.repository, path))
            .bearer_auth(&credentials.token)
            .header(header::ACCEPT, ACCEPT)
    }
}

#[async_trait]
impl ContentsApi for GitHubClient {
    #[tracing::instrument(name = "Looking up file", skip(self, credentials), fields(repo = %credentials.repository))]
    async fn lookup(&self, credentials: &ProjectCredentials, path: &str) -> FileLookup {
        let response = match self.request(Method::GET, credentials, path).send().await {
            Ok(response) => response,
            Err(err) => return FileLookup::Unreachable(err.to_string()),
        };
        if !response.status().is_success() {
            tracing::debug!(status = response.status().as_u16(), "No existing file");
            return FileLookup::Missing;
        }
        match response.bytes().await {
            Ok(body) => lookup_from_body(&body),
            Err(err) => FileLookup::Unreachable(err.to_string()),
        }
    }

    #[tracing::instrument(name = "Writing file", skip(self, credentials, body), fields(repo = %credentials.repository))]
    async fn put(
        &self,
        credentials: &ProjectCredentials,
        path: &str,
        body: &UpsertFile,
    ) -> Result<UpsertedFile, ContentsError> {
        let response = self
            .request(Method::PUT, credentials, path)
            .json(body)
            .send()
            .await
            .map_err(|err| ContentsError::Transport(err.to_string()))?;
        let status = response.status();
        let raw = response
            .bytes()
            .await
            .map_err(|err| ContentsError::Transport(err.to_string()))?;
        if !status.is_success() {
            return Err(ContentsError::Rejected {
                status: status.as_u16(),
                message: rejection_message(&raw),
            });
        }
        serde_json::from_slice(&raw).map_err(|err| ContentsError::Transport(err.to_string()))
    }
}

/// Interpret a successful metadata response.
///
/// Directories come back as a JSON array and have no `sha` of their own, so they
/// count as missing.
fn lookup_from_body(body: &[u8]) -> FileLookup {
    match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(value) => value
            .get("sha")
            .and_then(serde_json::Value::as_str)
            .map_or(FileLookup::Missing, |sha| FileLookup::Found {
                sha: sha.to_owned(),
            }),
        Err(err) => FileLookup::Unreachable(err.to_string()),
    }
}

/// Non-empty `message` of an error body, if the body is JSON and has one.
fn rejection_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|error| error.message)
        .filter(|message| !message.is_empty())
}
