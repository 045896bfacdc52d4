//! Headers attached to every response of the server.
//!
//! Browsers call the deploy endpoint cross-origin, so the CORS headers go on success
//! and failure responses alike, including preflights.

use actix_web::http::header::{
    ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN,
};
use actix_web::middleware::DefaultHeaders;

/// Any origin may call the API.
pub const ALLOW_ORIGIN: &str = "*";
/// Methods the API answers to.
pub const ALLOW_METHODS: &str = "GET,OPTIONS,POST";
/// Request headers callers may send.
pub const ALLOW_HEADERS: &str = "Content-Type";

/// Middleware adding the CORS headers to every response.
#[must_use]
pub fn cors() -> DefaultHeaders {
    DefaultHeaders::new()
        .add((ACCESS_CONTROL_ALLOW_CREDENTIALS, "true"))
        .add((ACCESS_CONTROL_ALLOW_ORIGIN, ALLOW_ORIGIN))
        .add((ACCESS_CONTROL_ALLOW_METHODS, ALLOW_METHODS))
        .add((ACCESS_CONTROL_ALLOW_HEADERS, ALLOW_HEADERS))
}
