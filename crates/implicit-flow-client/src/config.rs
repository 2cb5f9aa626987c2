//! Configuration for the implicit-flow client.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::ConfigError;

/// Defaults matching the local demo setup (auth server on 8080, client on 8082).
pub mod defaults {
    use std::time::Duration;

    /// Authorization server entry endpoint.
    pub const AUTH_ENDPOINT: &str = "http://localhost:8080/";

    /// Where the authorization server sends the browser back to.
    pub const REDIRECT_URI: &str = "http://localhost:8082/login/oauth/callback";

    /// Requested scopes.
    pub const SCOPES: &str = "profile";

    /// Lifetime of an ephemeral state value.
    pub const STATE_TTL: Duration = Duration::from_secs(600);

    /// Upper bound on outstanding ephemeral states.
    pub const STATE_CAPACITY: u64 = 10_000;

    /// Query parameter carrying the bearer token on the callback.
    pub const TOKEN_PARAM: &str = "access_token";

    /// Origins allowed by CORS.
    pub const ALLOWED_ORIGINS: &[&str] = &["http://localhost:8080", "http://localhost:8082"];
}

/// Environment variable names.
pub mod vars {
    pub const AUTH_ENDPOINT: &str = "OAUTH_AUTH_ENDPOINT";
    pub const CLIENT_ID: &str = "OAUTH_CLIENT_ID";
    pub const REDIRECT_URI: &str = "OAUTH_REDIRECT_URI";
    pub const SCOPES: &str = "OAUTH_SCOPES";
    pub const STATE: &str = "OAUTH_STATE";
    pub const STATE_TTL_SECS: &str = "OAUTH_STATE_TTL_SECS";
    pub const JWT_SECRET: &str = "OAUTH_JWT_SECRET";
    pub const TOKEN_PARAM: &str = "OAUTH_TOKEN_PARAM";
    pub const ALLOWED_ORIGINS: &str = "CORS_ALLOWED_ORIGINS";
    pub const PUBLIC_DIR: &str = "PUBLIC_DIR";
}

/// How the anti-forgery `state` value is produced and checked.
#[derive(Clone, PartialEq, Eq)]
pub enum StateMode {
    /// One value for the whole process. Callbacks are idempotent.
    Fixed(String),

    /// A fresh value per authorization request, single-use, expiring after `ttl`.
    Ephemeral {
        /// Lifetime of an issued value.
        ttl: Duration,
        /// Maximum number of outstanding values.
        capacity: u64,
    },
}

impl std::fmt::Debug for StateMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fixed(_) => f.write_str("Fixed(<redacted>)"),
            Self::Ephemeral { ttl, capacity } => f
                .debug_struct("Ephemeral")
                .field("ttl", ttl)
                .field("capacity", capacity)
                .finish(),
        }
    }
}

/// Immutable client configuration, built once at startup.
#[derive(Clone)]
pub struct ClientConfig {
    /// Authorization server entry endpoint.
    pub auth_endpoint: Url,

    /// OAuth client id.
    pub client_id: String,

    /// Redirect URI registered with the authorization server.
    pub redirect_uri: Url,

    /// Requested scopes, deduplicated, in configured order.
    pub scopes: Vec<String>,

    /// State token strategy.
    pub state_mode: StateMode,

    /// HS256 shared secret. Enables bearer verification on the callback.
    pub jwt_secret: Option<String>,

    /// Query parameter holding the bearer token.
    pub token_param: String,

    /// CORS allowed origins. Empty means permissive.
    pub allowed_origins: Vec<String>,

    /// Directory of static assets served for unmatched paths.
    pub public_dir: Option<PathBuf>,
}

impl ClientConfig {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns error if a required variable is missing or a value is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns error if a required variable is missing or a value is malformed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let client_id = lookup(vars::CLIENT_ID).ok_or(ConfigError::Missing(vars::CLIENT_ID))?;
        if client_id.trim().is_empty() {
            return Err(ConfigError::Empty(vars::CLIENT_ID));
        }

        let auth_endpoint = parse_url(
            vars::AUTH_ENDPOINT,
            lookup(vars::AUTH_ENDPOINT).as_deref().unwrap_or(defaults::AUTH_ENDPOINT),
        )?;
        let redirect_uri = parse_url(
            vars::REDIRECT_URI,
            lookup(vars::REDIRECT_URI).as_deref().unwrap_or(defaults::REDIRECT_URI),
        )?;

        let scopes = parse_list(lookup(vars::SCOPES).as_deref().unwrap_or(defaults::SCOPES));

        let state_mode = match lookup(vars::STATE) {
            Some(state) if state.is_empty() => return Err(ConfigError::Empty(vars::STATE)),
            Some(state) => StateMode::Fixed(state),
            None => {
                let ttl = match lookup(vars::STATE_TTL_SECS) {
                    Some(raw) => parse_ttl(&raw)?,
                    None => defaults::STATE_TTL,
                };
                StateMode::Ephemeral { ttl, capacity: defaults::STATE_CAPACITY }
            }
        };

        let jwt_secret = match lookup(vars::JWT_SECRET) {
            Some(secret) if secret.is_empty() => return Err(ConfigError::Empty(vars::JWT_SECRET)),
            other => other,
        };

        let token_param =
            lookup(vars::TOKEN_PARAM).unwrap_or_else(|| defaults::TOKEN_PARAM.to_string());
        if token_param.is_empty() {
            return Err(ConfigError::Empty(vars::TOKEN_PARAM));
        }

        let allowed_origins = lookup(vars::ALLOWED_ORIGINS).map_or_else(
            || defaults::ALLOWED_ORIGINS.iter().map(ToString::to_string).collect(),
            |raw| parse_list(&raw),
        );

        Ok(Self {
            auth_endpoint,
            client_id,
            redirect_uri,
            scopes,
            state_mode,
            jwt_secret,
            token_param,
            allowed_origins,
            public_dir: lookup(vars::PUBLIC_DIR).filter(|d| !d.is_empty()).map(PathBuf::from),
        })
    }

    /// Create a deterministic configuration for tests.
    ///
    /// Uses the demo's fixed state value and no bearer verification.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            auth_endpoint: Url::parse(defaults::AUTH_ENDPOINT).expect("valid default URL"),
            client_id: "client_id_implicit_authentication_app".to_string(),
            redirect_uri: Url::parse(defaults::REDIRECT_URI).expect("valid default URL"),
            scopes: vec![defaults::SCOPES.to_string()],
            state_mode: StateMode::Fixed("8njkfds893ksHSD3bd".to_string()),
            jwt_secret: None,
            token_param: defaults::TOKEN_PARAM.to_string(),
            allowed_origins: defaults::ALLOWED_ORIGINS.iter().map(ToString::to_string).collect(),
            public_dir: None,
        }
    }

    /// Check if bearer verification is enabled.
    #[must_use]
    pub const fn verifies_bearer(&self) -> bool {
        self.jwt_secret.is_some()
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("auth_endpoint", &self.auth_endpoint.as_str())
            .field("client_id", &self.client_id)
            .field("redirect_uri", &self.redirect_uri.as_str())
            .field("scopes", &self.scopes)
            .field("state_mode", &self.state_mode)
            .field("verifies_bearer", &self.verifies_bearer())
            .field("token_param", &self.token_param)
            .field("allowed_origins", &self.allowed_origins)
            .field("public_dir", &self.public_dir)
            .finish()
    }
}

fn parse_url(key: &'static str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|source| ConfigError::InvalidUrl { key, source })
}

fn parse_ttl(raw: &str) -> Result<Duration, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidNumber { key: vars::STATE_TTL_SECS, value: raw.to_string() }),
    }
}

/// Split on whitespace and commas, dropping empties and duplicates.
fn parse_list(raw: &str) -> Vec<String> {
    let mut items: Vec<String> = Vec::new();
    for item in raw.split(|c: char| c == ',' || c.is_whitespace()).filter(|s| !s.is_empty()) {
        if !items.iter().any(|existing| existing == item) {
            items.push(item.to_string());
        }
    }
    items
}
