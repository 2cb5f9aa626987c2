//! Bearer token verification for the hardened callback.
//!
//! Tokens are HS256 JWTs signed with a secret shared with the authorization
//! server. Claims are trusted only after the signature checks out.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, errors::ErrorKind};
use serde::{Deserialize, Serialize};

use crate::error::CallbackError;

/// Decoded payload of a verified bearer token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BearerClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    /// Any other claims, kept verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl BearerClaims {
    /// Name to greet: `user`, then `name`, then `sub`.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.user.as_deref().or(self.name.as_deref()).or(self.sub.as_deref())
    }

    #[must_use]
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        self.iat.and_then(|ts| Utc.timestamp_opt(ts, 0).single())
    }
}

/// Claims left by [`require_bearer`], if it ran and succeeded.
#[derive(Debug, Clone, Default)]
pub struct VerifiedClaims(pub Option<BearerClaims>);

impl<S> FromRequestParts<S> for VerifiedClaims
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<BearerClaims>().cloned()))
    }
}

/// Verifies HS256 bearer tokens against a shared secret.
#[derive(Clone)]
pub struct BearerVerifier {
    key: DecodingKey,
    validation: Validation,
    token_param: String,
}

impl BearerVerifier {
    /// Create a verifier reading the token from `token_param` on the query string.
    ///
    /// `exp` and `nbf` are enforced when present but not required.
    #[must_use]
    pub fn hs256(secret: &[u8], token_param: impl Into<String>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_aud = false;
        validation.validate_nbf = true;
        Self { key: DecodingKey::from_secret(secret), validation, token_param: token_param.into() }
    }

    /// Query parameter the token is read from.
    #[must_use]
    pub fn token_param(&self) -> &str {
        &self.token_param
    }

    /// Verify the signature of `token` and decode its claims.
    ///
    /// # Errors
    ///
    /// Returns [`CallbackError::Unauthenticated`] if the token is malformed,
    /// signed with another key or algorithm, or expired.
    pub fn verify(&self, token: &str) -> Result<BearerClaims, CallbackError> {
        jsonwebtoken::decode::<BearerClaims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                let reason = match e.kind() {
                    ErrorKind::InvalidSignature => "signature mismatch",
                    ErrorKind::ExpiredSignature => "token expired",
                    ErrorKind::ImmatureSignature => "token not yet valid",
                    ErrorKind::InvalidAlgorithm => "unexpected algorithm",
                    _ => "malformed token",
                };
                tracing::debug!(error = %e, "Bearer token rejected");
                CallbackError::unauthenticated(reason)
            })
    }

    /// Find the token in a raw query string.
    #[must_use]
    pub fn extract<'a>(&self, query: &'a str) -> Option<std::borrow::Cow<'a, str>> {
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == self.token_param.as_str())
            .map(|(_, value)| value)
            .filter(|value| !value.is_empty())
    }
}

impl std::fmt::Debug for BearerVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerVerifier").field("token_param", &self.token_param).finish()
    }
}

fn has_params(query: &str) -> bool {
    url::form_urlencoded::parse(query.as_bytes()).next().is_some()
}

/// Middleware guarding the callback route.
///
/// Runs before the handler: requests without any query parameter are rejected as
/// missing parameters, requests whose token fails verification are rejected as
/// unauthenticated, and verified claims are inserted into the request extensions.
pub async fn require_bearer(
    State(verifier): State<Arc<BearerVerifier>>,
    mut request: Request,
    next: Next,
) -> Response {
    let claims = {
        let Some(query) = request.uri().query().filter(|q| has_params(q)) else {
            return CallbackError::MissingParameters.into_response();
        };
        let Some(token) = verifier.extract(query) else {
            tracing::warn!(param = %verifier.token_param(), "Callback without bearer token");
            return CallbackError::unauthenticated("missing bearer token").into_response();
        };
        match verifier.verify(&token) {
            Ok(claims) => claims,
            Err(err) => {
                tracing::warn!(error = %err, "Bearer verification failed");
                return err.into_response();
            }
        }
    };

    tracing::debug!(user = ?claims.display_name(), "Bearer token verified");
    request.extensions_mut().insert(claims);
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::{EncodingKey, Header};
    use serde_json::json;

    use super::*;

    const SECRET: &[u8] = b"shared-demo-secret";

    fn sign(claims: &serde_json::Value, secret: &[u8]) -> String {
        jsonwebtoken::encode(&Header::default(), claims, &EncodingKey::from_secret(secret)).unwrap()
    }

    fn verifier() -> BearerVerifier {
        BearerVerifier::hs256(SECRET, "access_token")
    }

    #[test]
    fn test_valid_token_without_exp() {
        let token = sign(&json!({"sub": "1234567890", "name": "Amd Amp", "iat": 1_516_239_022}), SECRET);
        let claims = verifier().verify(&token).unwrap();

        assert_eq!(claims.sub.as_deref(), Some("1234567890"));
        assert_eq!(claims.display_name(), Some("Amd Amp"));
        assert_eq!(claims.issued_at().unwrap().timestamp(), 1_516_239_022);
    }

    #[test]
    fn test_user_claim_preferred_and_extra_kept() {
        let token = sign(&json!({"user": "alice", "name": "Alice A.", "role": "admin"}), SECRET);
        let claims = verifier().verify(&token).unwrap();

        assert_eq!(claims.display_name(), Some("alice"));
        assert_eq!(claims.extra["role"], "admin");
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = sign(&json!({"user": "mallory"}), b"other-secret");
        let err = verifier().verify(&token).unwrap_err();
        assert_eq!(err, CallbackError::unauthenticated("signature mismatch"));
    }

    #[test]
    fn test_expired_token_rejected() {
        let token = sign(&json!({"user": "bob", "exp": 1_000_000}), SECRET);
        let err = verifier().verify(&token).unwrap_err();
        assert_eq!(err, CallbackError::unauthenticated("token expired"));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(verifier().verify("not-a-jwt").is_err());
        assert!(verifier().verify("").is_err());
    }

    #[test]
    fn test_extract_from_query() {
        let v = verifier();
        assert_eq!(v.extract("state=x&access_token=abc.def").as_deref(), Some("abc.def"));
        assert_eq!(v.extract("state=x&access_token="), None);
        assert_eq!(v.extract("state=x"), None);

        let custom = BearerVerifier::hs256(SECRET, "id_token");
        assert_eq!(custom.extract("id_token=t&access_token=u").as_deref(), Some("t"));
    }

    #[test]
    fn test_has_params() {
        assert!(has_params("access_token=t"));
        assert!(has_params("state"));
        assert!(!has_params(""));
        assert!(!has_params("&"));
    }
}
