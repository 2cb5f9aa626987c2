//! Integration tests for the hardened callback with bearer verification.

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::{EncodingKey, Header};
use serde_json::json;
use tower::ServiceExt;

use implicit_flow_client::config::ClientConfig;
use implicit_flow_client::create_router;

const STATE: &str = "8njkfds893ksHSD3bd";
const SECRET: &str = "test-shared-secret-12345";

fn hardened_router() -> axum::Router {
    let mut config = ClientConfig::for_testing();
    config.jwt_secret = Some(SECRET.to_string());
    create_router(config)
}

fn sign(claims: &serde_json::Value, secret: &str) -> String {
    jsonwebtoken::encode(&Header::default(), claims, &EncodingKey::from_secret(secret.as_bytes()))
        .unwrap()
}

fn callback_uri(token: &str, state: &str) -> String {
    let query = serde_urlencoded::to_string([("access_token", token), ("state", state)]).unwrap();
    format!("/login/callback?{query}")
}

async fn get(app: &axum::Router, uri: &str) -> axum::response::Response {
    app.clone().oneshot(Request::get(uri).body(Body::empty()).unwrap()).await.unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

#[tokio::test]
async fn test_signed_token_with_matching_state_greets_user() {
    let app = hardened_router();
    let token = sign(&json!({"user": "alice", "iat": 1_516_239_022}), SECRET);

    let response = get(&app, &callback_uri(&token, STATE)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert!(html.contains("Greetings, alice!"));
}

#[tokio::test]
async fn test_unsigned_token_rejected_before_state_check() {
    let app = hardened_router();

    // Wrong state AND bad token: the bearer failure must win.
    let response = get(&app, &callback_uri("not.a.jwt", "wrong")).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(header::WWW_AUTHENTICATE).is_some());
    let body = body_string(response).await;
    assert!(body.contains("Invalid bearer token"));
    assert!(!body.contains("state variables"));
}

#[tokio::test]
async fn test_token_signed_with_other_secret_rejected() {
    let app = hardened_router();
    let token = sign(&json!({"user": "mallory"}), "some-other-secret");

    let response = get(&app, &callback_uri(&token, STATE)).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(body_string(response).await.contains("signature mismatch"));
}

#[tokio::test]
async fn test_tampered_payload_rejected() {
    let app = hardened_router();
    let token = sign(&json!({"user": "alice"}), SECRET);

    let mut parts: Vec<String> = token.split('.').map(String::from).collect();
    parts[1] = URL_SAFE_NO_PAD.encode(json!({"user": "admin"}).to_string());
    let forged = parts.join(".");

    let response = get(&app, &callback_uri(&forged, STATE)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_token_rejected() {
    let app = hardened_router();
    let token = sign(&json!({"user": "bob", "exp": 1_000_000}), SECRET);

    let response = get(&app, &callback_uri(&token, STATE)).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(body_string(response).await.contains("token expired"));
}

#[tokio::test]
async fn test_missing_token_rejected() {
    let app = hardened_router();
    let response = get(&app, &format!("/login/callback?state={STATE}")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_no_params_still_404_when_hardened() {
    let app = hardened_router();
    for uri in ["/login/callback", "/login/callback?", "/login/callback?&"] {
        let response = get(&app, uri).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}

#[tokio::test]
async fn test_repeated_token_first_is_verified() {
    let app = hardened_router();
    let token = sign(&json!({"user": "alice"}), SECRET);

    let uri = format!("/login/callback?access_token={token}&access_token=garbage&state={STATE}");
    let response = get(&app, &uri).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("Greetings, alice!"));

    let uri = format!("/login/callback?access_token=garbage&access_token={token}&state={STATE}");
    assert_eq!(get(&app, &uri).await.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_repeated_state_rejected_after_bearer_check() {
    let app = hardened_router();
    let token = sign(&json!({"user": "alice"}), SECRET);

    let uri = format!("/login/callback?access_token={token}&state={STATE}&state=wrong");
    let response = get(&app, &uri).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(body_string(response).await.contains("state variables did not match"));
}

#[tokio::test]
async fn test_valid_token_wrong_state_is_state_mismatch() {
    let app = hardened_router();
    let token = sign(&json!({"user": "alice"}), SECRET);

    let response = get(&app, &callback_uri(&token, "wrong")).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(body_string(response).await.contains("state variables did not match"));
}

#[tokio::test]
async fn test_custom_token_param() {
    let mut config = ClientConfig::for_testing();
    config.jwt_secret = Some(SECRET.to_string());
    config.token_param = "id_token".to_string();
    let app = create_router(config);

    let token = sign(&json!({"user": "carol"}), SECRET);
    let uri = format!("/login/callback?id_token={token}&access_token=opaque&state={STATE}");

    let response = get(&app, &uri).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("Greetings, carol!"));
}

#[tokio::test]
async fn test_other_routes_unaffected_by_bearer_layer() {
    let app = hardened_router();
    assert_eq!(get(&app, "/auth").await.status(), StatusCode::FOUND);
    assert_eq!(get(&app, "/login/oauth/callback").await.status(), StatusCode::OK);
}
