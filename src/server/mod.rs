//! HTTP surface of the deploy service.

pub mod api;
pub mod app;
pub mod errors;
pub mod headers;
pub mod tracing;
