//! Handler reporting whether the server is configured.
use actix_web::{web, HttpResponse};
use serde::Serialize;

use super::state::{App as AppState, Global as _};

/// Name reported by the status endpoint.
pub const SERVICE_NAME: &str = "CADS Deploy Server";

/// Response for the status endpoint. Never contains tokens or the deploy key.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    /// Always `online`.
    pub status: &'static str,
    /// See [`SERVICE_NAME`].
    pub service: &'static str,
    /// Crate version.
    pub version: &'static str,
    /// Whether the default repository and token are both set.
    pub configured: bool,
    /// Default repository.
    pub repo: Option<String>,
    /// Projects with a configured repository.
    pub projects: Vec<String>,
    /// Whether callers must send a `deployKey`.
    pub deploy_key_required: bool,
}

/// Handler for the status endpoint. Makes no outbound calls.
pub async fn status(data: web::Data<AppState>) -> HttpResponse {
    let config = data.config();
    HttpResponse::Ok().json(Status {
        status: "online",
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        configured: config.is_configured(),
        repo: config.default_repo().map(str::to_owned),
        projects: config.project_ids(),
        deploy_key_required: config.deploy_key().is_some(),
    })
}
