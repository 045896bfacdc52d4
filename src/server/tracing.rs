//! Root span of every HTTP request, annotated with the deploy it carried out.
//!
//! The deploy handler fills in which project, repository and file it touched, and
//! how long it waited on GitHub. A deploy whose GitHub calls take longer than
//! [`SLOW_UPSTREAM`] is reported when the request ends.

use std::time::{Duration, Instant};

use actix_web::{
    dev::{ServiceRequest, ServiceResponse},
    HttpMessage, HttpRequest,
};
use tracing::field::Empty;
use tracing_actix_web::{DefaultRootSpanBuilder, RootSpan, RootSpanBuilder};

/// Time spent waiting on GitHub after which a deploy is reported as stalled.
///
/// Outbound calls have no timeout of their own, so this is where stalls show up.
pub const SLOW_UPSTREAM: Duration = Duration::from_secs(5);

/// `DefaultRootSpanBuilder` plus deploy target and timings.
pub struct CadsRootSpanBuilder;

/// When the request entered the service.
struct RequestStart(Instant);

/// Time the request spent in GitHub calls.
#[derive(Debug, Clone, Copy)]
struct UpstreamElapsed(Duration);

/// Record which file of which repository the request deploys.
pub fn record_target(span: &RootSpan, project: &str, repo: &str, filename: &str) {
    span.record("project", project);
    span.record("repo", repo);
    span.record("filename", filename);
}

/// Record the time spent in GitHub calls for `req`.
pub fn record_upstream(req: &HttpRequest, span: &RootSpan, elapsed: Duration) {
    span.record("upstream_ms", elapsed.as_millis());
    req.extensions_mut().insert(UpstreamElapsed(elapsed));
}

/// Whether waiting `elapsed` on GitHub counts as a stall.
fn is_stalled(elapsed: Duration) -> bool {
    elapsed > SLOW_UPSTREAM
}

impl RootSpanBuilder for CadsRootSpanBuilder {
    fn on_request_start(request: &ServiceRequest) -> tracing::Span {
        request.extensions_mut().insert(RequestStart(Instant::now()));
        tracing_actix_web::root_span!(
            request,
            project = Empty,
            repo = Empty,
            filename = Empty,
            upstream_ms = Empty,
            duration_ms = Empty,
        )
    }

    fn on_request_end<B: actix_web::body::MessageBody>(
        span: tracing::Span,
        outcome: &Result<ServiceResponse<B>, actix_web::Error>,
    ) {
        if let Ok(response) = outcome {
            let extensions = response.request().extensions();
            if let Some(start) = extensions.get::<RequestStart>() {
                span.record("duration_ms", start.0.elapsed().as_millis());
            }
            match extensions.get::<UpstreamElapsed>() {
                Some(upstream) if is_stalled(upstream.0) => {
                    tracing::warn!(
                        parent: &span,
                        upstream_ms = upstream.0.as_millis(),
                        "GitHub was slow to answer"
                    );
                }
                Some(_) | None => tracing::trace!(parent: &span, "HTTP Request"),
            }
        }
        DefaultRootSpanBuilder::on_request_end(span, outcome);
    }
}
