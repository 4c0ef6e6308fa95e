//! Response rewriting middleware.
//!
//! # Responsibilities
//! - Run the rewrite pipeline over `text/html` responses
//! - Pass every other response through untouched
//! - Keep status, version, extensions and headers of the original response
//!
//! # Design Decisions
//! - Never fails: anything unexpected means "forward as-is"
//! - `content-length` is dropped only when the body actually changed
//! - Compressed or oversized bodies are not buffered; a body without a
//!   declared length is read up to the limit, then streamed on as-is
//! - Settings live in an `ArcSwap` so config reloads apply between requests

use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use futures_util::{stream, StreamExt};

use crate::config::RewriteConfig;
use crate::http::request::request_id;
use crate::observability::metrics;
use crate::rewrite::RewritePipeline;

/// Rewrite settings active for the current request.
#[derive(Debug, Default)]
pub struct RewriteSettings {
    pub pipeline: RewritePipeline,
    pub max_body_bytes: usize,
}

impl RewriteSettings {
    pub fn from_config(config: &RewriteConfig) -> Self {
        Self {
            pipeline: RewritePipeline::from_config(config),
            max_body_bytes: config.max_body_bytes,
        }
    }
}

/// Hot-swappable rewrite settings shared with the middleware.
pub type SharedRewrite = Arc<ArcSwap<RewriteSettings>>;

pub fn shared_rewrite(config: &RewriteConfig) -> SharedRewrite {
    Arc::new(ArcSwap::from_pointee(RewriteSettings::from_config(config)))
}

/// Axum middleware rewriting HTML produced by the inner service.
///
/// ```ignore
/// let app = Router::new()
///     .route("/", get(page))
///     .layer(axum::middleware::from_fn_with_state(rewrite, rewrite_html));
/// ```
pub async fn rewrite_html(
    State(settings): State<SharedRewrite>,
    request: Request,
    next: Next,
) -> Response {
    let request_id = request_id(request.headers()).to_string();
    let response = next.run(request).await;

    let settings = settings.load_full();
    let response = rewrite_response(response, &settings).await;

    tracing::trace!(
        request_id = %request_id,
        status = %response.status(),
        "Response post-processed"
    );
    response
}

/// Why a response is forwarded without looking at its body.
fn skip_reason(headers: &HeaderMap, max_body_bytes: usize) -> Option<&'static str> {
    let is_html = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.to_ascii_lowercase().contains("text/html"));
    if !is_html {
        return Some("content_type");
    }

    let encoded = headers
        .get(header::CONTENT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|enc| !enc.trim().eq_ignore_ascii_case("identity"));
    if encoded {
        return Some("encoded");
    }

    let too_large = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|len| len.trim().parse::<usize>().ok())
        .is_some_and(|len| len > max_body_bytes);
    if too_large {
        return Some("too_large");
    }

    None
}

/// Apply the pipeline to one response.
pub async fn rewrite_response(response: Response, settings: &RewriteSettings) -> Response {
    if settings.pipeline.is_empty() {
        return response;
    }
    if let Some(reason) = skip_reason(response.headers(), settings.max_body_bytes) {
        if reason != "content_type" {
            tracing::debug!(reason, "HTML response forwarded without rewriting");
        }
        metrics::record_rewrite_skipped(reason);
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match collect_limited(body, settings.max_body_bytes).await {
        Collected::Complete(bytes) => bytes,
        Collected::TooLarge(body) => {
            tracing::debug!(reason = "too_large", "HTML response forwarded without rewriting");
            metrics::record_rewrite_skipped("too_large");
            return Response::from_parts(parts, body);
        }
        Collected::Failed(e) => {
            tracing::warn!(error = %e, status = %parts.status, "Failed to read HTML body");
            parts.headers.remove(header::CONTENT_LENGTH);
            return Response::from_parts(parts, Body::empty());
        }
    };

    let rewritten = match std::str::from_utf8(&bytes) {
        Ok(html) => {
            let out = settings.pipeline.apply(html);
            out.is_changed().then(|| (out.html.into_owned(), out.applied))
        }
        Err(_) => {
            metrics::record_rewrite_skipped("not_utf8");
            None
        }
    };

    match rewritten {
        Some((html, applied)) => {
            tracing::debug!(
                transforms = ?applied,
                before = bytes.len(),
                after = html.len(),
                "HTML rewritten"
            );
            for name in applied {
                metrics::record_rewrite(name);
            }
            parts.headers.remove(header::CONTENT_LENGTH);
            Response::from_parts(parts, Body::from(html))
        }
        None => Response::from_parts(parts, Body::from(bytes)),
    }
}

enum Collected {
    Complete(Bytes),
    /// The limit was hit; the read prefix chained with the unread rest.
    TooLarge(Body),
    Failed(axum::Error),
}

/// Buffer `body` as long as it stays within `limit` bytes.
async fn collect_limited(body: Body, limit: usize) -> Collected {
    let mut rest = body.into_data_stream();
    let mut buf = Vec::new();

    while let Some(chunk) = rest.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => return Collected::Failed(e),
        };
        if buf.len() + chunk.len() > limit {
            let read = stream::iter([Ok(Bytes::from(buf)), Ok(chunk)]);
            return Collected::TooLarge(Body::from_stream(read.chain(rest)));
        }
        buf.extend_from_slice(&chunk);
    }

    Collected::Complete(Bytes::from(buf))
}
