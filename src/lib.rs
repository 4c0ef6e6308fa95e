//! Site tooling for reagent systems.
//!
//! - [`rewrite`] / [`http`]: post-process outgoing HTML (viewport fix,
//!   preconnect pruning, opt-in stylesheet deferral) as an axum middleware
//!   or as a front proxy in front of the site server.
//! - [`og`]: build-time Open Graph image rasterizer.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod og;
pub mod rewrite;

pub use config::schema::SiteConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use rewrite::RewritePipeline;
