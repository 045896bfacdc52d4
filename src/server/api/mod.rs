//! This module contains the API endpoints for the server.
use actix_web::{HttpResponse, ResponseError as _};

use super::errors::DeployError;

pub mod deploy;
pub mod routes;
pub mod state;
pub mod status;

/// Answer a CORS preflight. The CORS headers themselves come from the middleware.
pub async fn preflight() -> HttpResponse {
    HttpResponse::Ok().finish()
}

/// Fallback for methods a resource does not accept.
pub async fn method_not_allowed() -> HttpResponse {
    DeployError::MethodNotAllowed.error_response()
}
