//! OAuth2 Implicit-Flow Client
//!
//! A small web client for the OAuth2 implicit grant: it sends the browser to
//! an authorization server, receives the access token on a callback, checks
//! the anti-forgery `state`, and optionally verifies the token's signature.
//!
//! # Features
//!
//! - **Redirect builder**: `client_id`, `redirect_uri`, `response_type=token`, `state`, `scope`
//! - **Fragment promotion**: landing page moving the URL fragment into a query string
//! - **State guard**: fixed value, or single-use per-request values with a TTL
//! - **Bearer verification**: optional HS256 check before the state check
//!
//! # Example
//!
//! ```no_run
//! use implicit_flow_client::{config::ClientConfig, server::ClientServer};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ClientConfig::from_env()?;
//!     ClientServer::new(config).run_http(([127, 0, 0, 1], 8082).into()).await
//! }
//! ```

pub mod config;
pub mod error;
pub mod oauth;
pub mod server;

pub use config::ClientConfig;
pub use error::{CallbackError, ConfigError};
pub use server::router::create_router;
