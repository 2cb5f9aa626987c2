//! Authorization request construction.
//!
//! Pure URL building: no network access happens here.

use url::Url;

use crate::config::ClientConfig;

/// OAuth2 `response_type`. The implicit grant only ever asks for a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseType {
    #[default]
    Token,
}

impl ResponseType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Token => "token",
        }
    }
}

/// A single authorization request, built fresh for every `GET /auth`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    pub client_id: String,
    pub redirect_uri: Url,
    pub response_type: ResponseType,
    pub state: String,
    pub scope: Vec<String>,
}

impl AuthorizationRequest {
    /// Build a request for the configured client with the given state value.
    #[must_use]
    pub fn new(config: &ClientConfig, state: impl Into<String>) -> Self {
        Self {
            client_id: config.client_id.clone(),
            redirect_uri: config.redirect_uri.clone(),
            response_type: ResponseType::Token,
            state: state.into(),
            scope: config.scopes.clone(),
        }
    }

    /// Space-joined scope parameter.
    #[must_use]
    pub fn scope_param(&self) -> String {
        self.scope.join(" ")
    }

    /// Render the request as a URL on top of the authorization endpoint.
    ///
    /// Query parameters already present on `endpoint` are kept.
    #[must_use]
    pub fn to_url(&self, endpoint: &Url) -> Url {
        let mut url = endpoint.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", self.redirect_uri.as_str())
            .append_pair("response_type", self.response_type.as_str())
            .append_pair("state", &self.state)
            .append_pair("scope", &self.scope_param());
        url
    }
}

/// Authorization URL for the configured client and `state`.
#[must_use]
pub fn authorization_url(config: &ClientConfig, state: &str) -> Url {
    AuthorizationRequest::new(config, state).to_url(&config.auth_endpoint)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn query_map(url: &Url) -> HashMap<String, String> {
        url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())).collect()
    }

    #[test]
    fn test_demo_url() {
        let config = ClientConfig::for_testing();
        let url = authorization_url(&config, "8njkfds893ksHSD3bd");

        assert_eq!(
            url.as_str(),
            "http://localhost:8080/?client_id=client_id_implicit_authentication_app\
             &redirect_uri=http%3A%2F%2Flocalhost%3A8082%2Flogin%2Foauth%2Fcallback\
             &response_type=token&state=8njkfds893ksHSD3bd&scope=profile"
        );
    }

    #[test]
    fn test_multiple_scopes_are_space_joined() {
        let mut config = ClientConfig::for_testing();
        config.scopes = vec!["profile".into(), "email".into()];
        let url = authorization_url(&config, "s");

        assert_eq!(query_map(&url)["scope"], "profile email");
        assert!(url.as_str().ends_with("scope=profile+email"));
    }

    #[test]
    fn test_empty_scope_still_emitted() {
        let mut config = ClientConfig::for_testing();
        config.scopes.clear();
        let url = authorization_url(&config, "s");
        assert_eq!(query_map(&url)["scope"], "");
    }

    #[test]
    fn test_existing_endpoint_query_preserved() {
        let mut config = ClientConfig::for_testing();
        config.auth_endpoint = Url::parse("https://idp.example.com/oauth2/authorization?tenant=a").unwrap();
        let url = authorization_url(&config, "s");

        assert_eq!(url.path(), "/oauth2/authorization");
        let pairs: Vec<(String, String)> =
            url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())).collect();
        assert_eq!(pairs[0], ("tenant".to_string(), "a".to_string()));
        assert_eq!(pairs[1].0, "client_id");
    }

    #[test]
    fn test_state_is_encoded() {
        let config = ClientConfig::for_testing();
        let url = authorization_url(&config, "a&b=c");
        assert_eq!(query_map(&url)["state"], "a&b=c");
    }
}
