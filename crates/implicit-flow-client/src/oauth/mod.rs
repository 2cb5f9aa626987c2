//! OAuth 2.0 implicit-grant client.
//!
//! The browser is sent to the authorization server with a `state` value, comes
//! back with the token in the URL fragment, and a landing page promotes the
//! fragment to query parameters for the callback handler.
//!
//! ## Supported Standards
//! - RFC 6749 §4.2: Implicit Grant
//! - RFC 7519: JSON Web Token (HS256 bearer verification)

pub mod bearer;
pub mod handlers;
pub mod pages;
pub mod request;
pub mod state;

pub use bearer::{BearerClaims, BearerVerifier, VerifiedClaims};
pub use request::{AuthorizationRequest, ResponseType, authorization_url};
pub use state::{EphemeralStateStore, FixedState, StateGuard};
