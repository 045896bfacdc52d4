//! Serve the deploy API.
#![allow(clippy::exit, clippy::module_name_repetitions)]
use crate::config::Config;
use crate::github::GitHubClient;
use crate::server::api::state::App as AppState;
use crate::server::headers;
use crate::server::tracing::CadsRootSpanBuilder;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::{App, Error, HttpServer};

use std::{io, process, sync::Arc};

use actix_http::body::MessageBody;
use actix_service::ServiceFactory;
use tracing_actix_web::TracingLogger;

use crate::server::api::routes;

/// Serve the deploy API on `bind`:`port` until the process is stopped.
#[actix_web::main]
pub async fn serve(config: Config, bind: &str, port: u16) -> io::Result<()> {
    let contents = GitHubClient::new(config.api_base_url()).unwrap_or_else(|err| {
        tracing::error!("Unable to create GitHub client.");
        tracing::error!("Error: {:?}", err);
        process::exit(1);
    });
    if !config.is_configured() {
        tracing::warn!("No default repository/token configured; only named projects can deploy.");
    }
    if config.deploy_key().is_none() {
        tracing::warn!("DEPLOY_KEY is not set; any caller can deploy.");
    }
    tracing::info!("Running deploy server on http://{bind}:{port}.");

    let state = AppState::new(config, Arc::new(contents));
    HttpServer::new(move || init_app(&state))
        .bind((bind, port))?
        .run()
        .await
}

/// Initialize the application and all routing at start-up time.
///
/// # Arguments
/// * `state` - The application state
pub fn init_app(
    state: &AppState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Response = ServiceResponse<impl MessageBody>,
        Config = (),
        InitError = (),
        Error = Error,
    >,
> {
    let app = App::new()
        .wrap(headers::cors())
        .wrap(TracingLogger::<CadsRootSpanBuilder>::new());
    routes::register_app(app, state)
}
