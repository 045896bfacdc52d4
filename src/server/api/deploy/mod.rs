//! Handler for writing a file into a configured repository.
use std::time::Instant;

use actix_web::{web, HttpRequest, HttpResponse};
use tracing_actix_web::RootSpan;

use crate::{
    config::{ProjectCredentials, DEFAULT_PROJECT_LABEL},
    github::{encode_content, FileLookup, UpsertFile},
    server::{
        errors::DeployError,
        tracing::{record_target, record_upstream},
    },
};

use self::response::{Deployed, Success};

use super::state::{App as AppState, Global as _};

/// Module that maps the HTTP web request body to structs.
pub mod request;

/// Module that maps the HTTP web response to structs.
pub mod response;

/// Prefix of the commit message used when the caller gives none.
const DEFAULT_COMMIT_PREFIX: &str = "CADS: Update";
/// Largest accepted request body, in bytes.
pub const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

/// Handler for the deploy endpoint.
///
/// Validation and the deploy key are checked before any configuration or network
/// access. Then exactly one best-effort lookup and one write go out to GitHub.
#[tracing::instrument(name = "Deploying file", skip_all)]
pub async fn deploy(
    req: HttpRequest,
    payload: web::Payload,
    root_span: RootSpan,
    data: web::Data<AppState>,
) -> Result<HttpResponse, DeployError> {
    let outcome = match read_body(payload).await {
        Ok(body) => run(&body, &data, &req, &root_span).await,
        Err(err) => Err(err),
    };
    match outcome {
        Ok(deployed) => {
            tracing::info!(commit = %deployed.commit, "Deployed file");
            Ok(HttpResponse::Ok().json(Success::new(deployed)))
        }
        Err(err) => {
            match err {
                DeployError::UpstreamWrite(_) | DeployError::Unexpected(_) => {
                    tracing::error!("Deploy failed: {err}");
                }
                DeployError::InvalidInput
                | DeployError::InvalidBody(_)
                | DeployError::PayloadTooLarge(_)
                | DeployError::Unauthorized
                | DeployError::MissingConfiguration(_)
                | DeployError::MethodNotAllowed => {
                    tracing::warn!("Deploy rejected: {err}");
                }
            }
            Err(err)
        }
    }
}

/// Collect the request body, refusing anything over [`MAX_BODY_BYTES`].
async fn read_body(payload: web::Payload) -> Result<web::Bytes, DeployError> {
    match payload.to_bytes_limited(MAX_BODY_BYTES).await {
        Ok(Ok(body)) => Ok(body),
        Ok(Err(err)) => Err(DeployError::InvalidBody(err.to_string())),
        Err(_) => Err(DeployError::PayloadTooLarge(MAX_BODY_BYTES)),
    }
}

/// Validate, authorize, resolve, look up, write.
async fn run(
    body: &[u8],
    data: &AppState,
    req: &HttpRequest,
    span: &RootSpan,
) -> Result<Deployed, DeployError> {
    let request = request::Deploy::parse(body)?.check()?;
    authorize(data.config().deploy_key(), request.deploy_key.as_deref())?;

    let project = request
        .project
        .clone()
        .unwrap_or_else(|| DEFAULT_PROJECT_LABEL.to_owned());
    let credentials = data
        .config()
        .resolve(request.project.as_deref())
        .ok_or_else(|| DeployError::MissingConfiguration(project.clone()))?;
    record_target(span, &project, &credentials.repository, &request.filename);

    let content = encode_content(&request.content);
    let started = Instant::now();
    let sha = existing_sha(data, &credentials, &request.filename).await;
    let upsert = UpsertFile {
        message: request
            .message
            .unwrap_or_else(|| default_commit_message(&request.filename)),
        content,
        sha,
    };
    let written = data
        .contents()
        .put(&credentials, &request.filename, &upsert)
        .await;
    record_upstream(req, span, started.elapsed());
    let written = written?;

    Ok(Deployed {
        project,
        repo: credentials.repository,
        filename: request.filename,
        url: written.content.html_url,
        sha: written.content.sha,
        commit: written.commit.sha,
        timestamp: response::timestamp(),
    })
}

/// Check the caller's deploy key against the configured one.
///
/// Without a configured key every request passes, whatever it sends.
fn authorize(expected: Option<&str>, supplied: Option<&str>) -> Result<(), DeployError> {
    match expected {
        Some(key) if supplied != Some(key) => Err(DeployError::Unauthorized),
        Some(_) | None => Ok(()),
    }
}

/// Revision marker of the file currently at `path`, if GitHub reports one.
///
/// A failed lookup does not abort the deploy; it is treated as a new file and the
/// write goes out without a marker.
async fn existing_sha(
    data: &AppState,
    credentials: &ProjectCredentials,
    path: &str,
) -> Option<String> {
    let lookup = data.contents().lookup(credentials, path).await;
    match lookup {
        FileLookup::Found { .. } => {}
        FileLookup::Missing => tracing::debug!("Creating new file: {path}"),
        FileLookup::Unreachable(ref reason) => {
            tracing::warn!("Lookup of {path} failed, writing as new file: {reason}");
        }
    }
    lookup.into_sha()
}

/// Commit message used when the caller gives none.
fn default_commit_message(filename: &str) -> String {
    format!("{DEFAULT_COMMIT_PREFIX} {filename}")
}
