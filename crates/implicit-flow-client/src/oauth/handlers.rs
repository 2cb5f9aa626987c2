//! OAuth 2.0 implicit-flow endpoint handlers.
//!
//! - `GET /auth`: redirect the browser to the authorization server
//! - `GET /login/oauth/callback`: landing page promoting the URL fragment
//! - `GET /login/callback`: state check and terminal page

use std::sync::Arc;

use axum::{
    extract::{RawQuery, State},
    http::{HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use super::bearer::VerifiedClaims;
use super::{pages, request};
use crate::error::CallbackError;
use crate::server::router::AppState;

/// Path the landing page forwards the promoted parameters to.
pub const CALLBACK_PATH: &str = "/login/callback";

// ─── Authorization Redirect ──────────────────────────────────────────────────

/// `GET /auth`
///
/// Issue a state value and send the browser to the authorization server.
pub async fn handle_auth(State(state): State<Arc<AppState>>) -> Response {
    let oauth_state = state.states.issue().await;
    let location = request::authorization_url(&state.config, &oauth_state);

    tracing::info!(client_id = %state.config.client_id, "Redirecting to authorization server");

    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

// ─── Stage 1: Redirect Landing ───────────────────────────────────────────────

/// `GET /login/oauth/callback`
///
/// Serve the page that moves fragment parameters into a query string.
pub async fn handle_oauth_landing() -> Response {
    let mut response = Html(pages::render_landing_page(CALLBACK_PATH)).into_response();

    let headers = response.headers_mut();
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    headers.insert(header::REFERRER_POLICY, HeaderValue::from_static("no-referrer"));
    response
}

// ─── Stage 2: Callback Processing ────────────────────────────────────────────

/// Parameters promoted from the fragment onto the callback query string.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CallbackQuery {
    pub access_token: Option<String>,
    pub state: Option<String>,
    pub token_type: Option<String>,
    pub expires_in: Option<String>,
    /// Decoded pairs, recognised or not.
    pub params: usize,
    /// More than one `state` was sent.
    pub repeated_state: bool,
}

impl CallbackQuery {
    /// Decode a raw query string. The first value of a repeated key wins.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let mut query = Self::default();
        for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
            query.params += 1;
            let slot = match &*key {
                "access_token" => &mut query.access_token,
                "token_type" => &mut query.token_type,
                "expires_in" => &mut query.expires_in,
                "state" => {
                    query.repeated_state |= query.state.is_some();
                    &mut query.state
                }
                _ => continue,
            };
            slot.get_or_insert_with(|| value.into_owned());
        }
        query
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.params == 0
    }
}

/// `GET /login/callback`
///
/// Reject callbacks without parameters or with a foreign `state`, then serve
/// the confirmation page. When bearer verification is enabled the middleware
/// has already run and left the claims in the request extensions.
pub async fn handle_callback(
    State(state): State<Arc<AppState>>,
    RawQuery(raw): RawQuery,
    VerifiedClaims(claims): VerifiedClaims,
) -> Result<Html<String>, CallbackError> {
    let query = CallbackQuery::parse(raw.as_deref().unwrap_or_default());
    if query.is_empty() {
        tracing::warn!("Callback without query parameters");
        return Err(CallbackError::MissingParameters);
    }

    // An ambiguous `state` never matches.
    let state_ok = match query.state.as_deref() {
        Some(received) if !query.repeated_state => state.states.verify(received).await,
        _ => false,
    };
    if !state_ok {
        tracing::warn!(
            has_state = query.state.is_some(),
            repeated = query.repeated_state,
            "Callback state mismatch"
        );
        return Err(CallbackError::StateMismatch);
    }

    let Some(access_token) = query.access_token.as_deref().filter(|t| !t.is_empty()) else {
        tracing::warn!("Callback with valid state but no access token");
        return Err(CallbackError::MissingParameters);
    };

    // Held only for this exchange; never logged by value.
    tracing::info!(
        token_len = access_token.len(),
        token_type = ?query.token_type,
        expires_in = ?query.expires_in,
        "Implicit-flow callback accepted"
    );

    Ok(Html(pages::render_greeting_page(claims.as_ref())))
}
