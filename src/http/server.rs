//! HTTP server setup and upstream forwarding.
//!
//! # Responsibilities
//! - Create the Axum Router with the forwarding handler
//! - Wire up middleware (HTML rewriting, compression, timeout, request ID, tracing)
//! - Forward every request to the single upstream site server
//! - Apply reloaded rewrite settings without restarting
//! - Stop accepting on the shutdown signal and drain in-flight requests

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    http::{header, StatusCode, Uri, Version},
    middleware,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{compression::CompressionLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::SiteConfig;
use crate::http::request::{
    add_forwarded_headers, propagate_request_id_layer, request_id, set_request_id_layer,
    strip_hop_by_hop,
};
use crate::http::response::{rewrite_html, shared_rewrite, RewriteSettings, SharedRewrite};
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Upstream authority, e.g. "127.0.0.1:3000".
    pub upstream: Arc<str>,
    pub client: Client<HttpConnector, Body>,
}

/// Front server for the site.
pub struct HttpServer {
    router: Router,
    config: SiteConfig,
    rewrite: SharedRewrite,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: SiteConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(config.timeouts.connect_secs)));
        let client = Client::builder(TokioExecutor::new()).build(connector);

        let state = AppState {
            upstream: Arc::from(config.upstream.address.as_str()),
            client,
        };
        let rewrite = shared_rewrite(&config.rewrite);

        tracing::info!(
            upstream = %config.upstream.address,
            transforms = ?rewrite.load().pipeline.names(),
            "Rewrite pipeline ready"
        );

        let router = Self::build_router(&config, state, rewrite.clone());
        Self {
            router,
            config,
            rewrite,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &SiteConfig, state: AppState, rewrite: SharedRewrite) -> Router {
        Router::new()
            .route("/", any(proxy_handler))
            .route("/{*path}", any(proxy_handler))
            .with_state(state)
            .layer(middleware::from_fn_with_state(rewrite, rewrite_html))
            .layer(CompressionLayer::new())
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// The fully layered router, for embedding or tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Handle to the live rewrite settings.
    pub fn rewrite_settings(&self) -> SharedRewrite {
        self.rewrite.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        config_updates: mpsc::UnboundedReceiver<SiteConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        tokio::spawn(apply_config_updates(
            self.config.clone(),
            self.rewrite.clone(),
            config_updates,
        ));

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Draining in-flight requests");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Swap in rewrite settings from each reloaded config.
async fn apply_config_updates(
    mut active: SiteConfig,
    rewrite: SharedRewrite,
    mut updates: mpsc::UnboundedReceiver<SiteConfig>,
) {
    while let Some(next) = updates.recv().await {
        if requires_restart(&active, &next) {
            tracing::warn!("Listener, upstream and timeout changes take effect after a restart");
        }

        let settings = RewriteSettings::from_config(&next.rewrite);
        tracing::info!(transforms = ?settings.pipeline.names(), "Rewrite settings reloaded");
        rewrite.store(Arc::new(settings));
        active = next;
    }
}

/// Settings baked into the listener, client and router at startup.
fn requires_restart(active: &SiteConfig, next: &SiteConfig) -> bool {
    next.listener.bind_address != active.listener.bind_address
        || next.upstream.address != active.upstream.address
        || next.timeouts.connect_secs != active.timeouts.connect_secs
        || next.timeouts.request_secs != active.timeouts.request_secs
}

/// Forward the request to the upstream site server.
async fn proxy_handler(State(state): State<AppState>, request: Request) -> Response {
    let start_time = Instant::now();
    let client_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    let (mut parts, body) = request.into_parts();
    let request_id = request_id(&parts.headers).to_string();
    let method = parts.method.clone();

    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let uri = match format!("http://{}{}", state.upstream, path_and_query).parse::<Uri>() {
        Ok(uri) => uri,
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Cannot build upstream URI");
            return (StatusCode::BAD_REQUEST, "Invalid request target").into_response();
        }
    };

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        "Forwarding request"
    );

    strip_hop_by_hop(&mut parts.headers);
    add_forwarded_headers(&mut parts.headers, client_addr);
    // HTML must come back uncompressed to be rewritten; CompressionLayer re-encodes.
    parts.headers.remove(header::ACCEPT_ENCODING);
    parts.uri = uri;
    parts.version = Version::HTTP_11;

    match state.client.request(Request::from_parts(parts, body)).await {
        Ok(response) => {
            let (mut parts, body) = response.into_parts();
            strip_hop_by_hop(&mut parts.headers);
            metrics::record_request(method.as_str(), parts.status.as_u16(), start_time);
            Response::from_parts(parts, Body::new(body))
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Upstream error");
            metrics::record_request(method.as_str(), 502, start_time);
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    }
}
