//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, layers)
//!     → request.rs (request ID, hop-by-hop stripping, X-Forwarded-*)
//!     → upstream site server
//!     → response.rs (rewrite text/html bodies)
//!     → compression, send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use response::{rewrite_html, rewrite_response, RewriteSettings, SharedRewrite};
pub use server::HttpServer;
