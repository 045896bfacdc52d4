//! A central place to register App routes.
use actix_service::ServiceFactory;
use actix_web::{
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    http::Method,
    web, App, Error,
};

use super::{deploy::deploy, method_not_allowed, preflight, state, status::status};

/// Prefix the endpoints were served under on the serverless platform.
const LEGACY_PREFIX: &str = "/api";

/// Central place to register all the App routing.
///
/// Every endpoint is reachable both at the root and under [`LEGACY_PREFIX`].
#[tracing::instrument(skip(app, state))]
pub fn register_app<
    U: MessageBody,
    V: ServiceFactory<
        ServiceRequest,
        Response = ServiceResponse<U>,
        Config = (),
        InitError = (),
        Error = Error,
    >,
>(
    app: App<V>,
    state: &state::App,
) -> App<V> {
    app.app_data(web::Data::new(state.clone()))
        .configure(register_routes)
        .service(web::scope(LEGACY_PREFIX).configure(register_routes))
}

/// `/deploy` and `/status`, each answering preflights and rejecting unknown methods.
fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/deploy")
            .route(web::method(Method::OPTIONS).to(preflight))
            .route(web::post().to(deploy))
            .default_service(web::to(method_not_allowed)),
    )
    .service(
        web::resource("/status")
            .route(web::method(Method::OPTIONS).to(preflight))
            .route(web::get().to(status))
            .default_service(web::to(method_not_allowed)),
    );
}
