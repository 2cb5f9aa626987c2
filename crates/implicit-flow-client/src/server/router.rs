//! HTTP routing for the implicit-flow client.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Request,
    http::{HeaderValue, Method},
    middleware,
    response::IntoResponse,
    routing::get,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::ClientConfig;
use crate::oauth::bearer::{self, BearerVerifier};
use crate::oauth::handlers::{self, CALLBACK_PATH};
use crate::oauth::state::{self, StateGuard};

/// Shared state for HTTP handlers.
#[derive(Debug)]
pub struct AppState {
    pub config: ClientConfig,
    pub states: Arc<dyn StateGuard>,
}

impl AppState {
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        let states = state::state_guard(&config.state_mode);
        Self { config, states }
    }
}

/// Create the HTTP router.
///
/// Bearer verification is layered on the callback route only, and only when a
/// shared secret is configured.
pub fn create_router(config: ClientConfig) -> Router {
    let verifier = config
        .jwt_secret
        .as_deref()
        .map(|secret| Arc::new(BearerVerifier::hs256(secret.as_bytes(), config.token_param.clone())));
    let cors = cors_layer(&config.allowed_origins);
    let public_dir = config.public_dir.clone();

    let state = Arc::new(AppState::new(config));

    let mut callback = Router::new().route(CALLBACK_PATH, get(handlers::handle_callback));
    if let Some(verifier) = verifier {
        tracing::info!(param = %verifier.token_param(), "Bearer verification enabled on callback");
        callback = callback.route_layer(middleware::from_fn_with_state(verifier, bearer::require_bearer));
    }

    let mut router = Router::new()
        .route("/health", get(health_check))
        .route("/auth", get(handlers::handle_auth))
        .route("/login/oauth/callback", get(handlers::handle_oauth_landing))
        .merge(callback);

    if let Some(dir) = public_dir {
        tracing::info!(dir = %dir.display(), "Serving static assets");
        router = router.fallback_service(ServeDir::new(dir));
    }

    // Spans carry the path only: the callback query holds the access token.
    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request| {
        tracing::info_span!("request", method = %request.method(), path = %request.uri().path())
    });

    router.layer(cors).layer(trace).with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods([Method::GET])
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "implicit-flow-client",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
