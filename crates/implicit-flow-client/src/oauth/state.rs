//! Anti-forgery `state` values.
//!
//! A [`StateGuard`] hands out the value embedded in the authorization request
//! and later decides whether the value coming back on the callback is ours.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::future::Cache;
use sha2::{Digest, Sha256};

use crate::config::StateMode;

type StateDigest = [u8; 32];

/// Issues and verifies `state` values.
#[async_trait]
pub trait StateGuard: Send + Sync + std::fmt::Debug {
    /// Value to embed in a new authorization request.
    async fn issue(&self) -> String;

    /// Whether `received` matches a value this guard issued.
    async fn verify(&self, received: &str) -> bool;
}

/// Build the guard for the configured mode.
#[must_use]
pub fn state_guard(mode: &StateMode) -> Arc<dyn StateGuard> {
    match mode {
        StateMode::Fixed(token) => Arc::new(FixedState::new(token.clone())),
        StateMode::Ephemeral { ttl, capacity } => {
            Arc::new(EphemeralStateStore::new(*ttl, *capacity))
        }
    }
}

/// Compare two state values without short-circuiting on the first differing byte.
///
/// Both sides are hashed first so the comparison length does not depend on input.
#[must_use]
pub fn states_match(expected: &str, received: &str) -> bool {
    digests_match(&digest(expected), &digest(received))
}

fn digest(value: &str) -> StateDigest {
    Sha256::digest(value.as_bytes()).into()
}

fn digests_match(a: &StateDigest, b: &StateDigest) -> bool {
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Generate an unpredictable state value using two UUIDs (256 bits).
#[must_use]
pub fn generate_state() -> String {
    format!("{}{}", uuid::Uuid::new_v4().simple(), uuid::Uuid::new_v4().simple())
}

/// One state value shared by every request of the process.
pub struct FixedState {
    token: String,
    digest: StateDigest,
}

impl FixedState {
    #[must_use]
    pub fn new(token: String) -> Self {
        let digest = digest(&token);
        Self { token, digest }
    }
}

impl std::fmt::Debug for FixedState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixedState").finish_non_exhaustive()
    }
}

#[async_trait]
impl StateGuard for FixedState {
    async fn issue(&self) -> String {
        self.token.clone()
    }

    async fn verify(&self, received: &str) -> bool {
        digests_match(&self.digest, &digest(received))
    }
}

/// Per-request state values, kept server-side until used or expired.
///
/// Values are indexed by digest; a successful [`verify`](StateGuard::verify)
/// removes the entry, so each value is accepted at most once.
///
/// The store holds at most `capacity` outstanding values. `/auth` is
/// unauthenticated, so a burst of flows past that bound lets the cache evict
/// (or decline to admit) an issued value, and its callback fails with a state
/// mismatch. Size `capacity` for the peak number of logins started within one
/// TTL.
#[derive(Clone)]
pub struct EphemeralStateStore {
    issued: Cache<StateDigest, Instant>,
    ttl: Duration,
}

impl EphemeralStateStore {
    #[must_use]
    pub fn new(ttl: Duration, capacity: u64) -> Self {
        Self { issued: Cache::builder().max_capacity(capacity).time_to_live(ttl).build(), ttl }
    }

    /// Number of outstanding values (approximate, see `moka` docs).
    #[must_use]
    pub fn outstanding(&self) -> u64 {
        self.issued.entry_count()
    }
}

impl std::fmt::Debug for EphemeralStateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EphemeralStateStore").field("outstanding", &self.outstanding()).finish()
    }
}

#[async_trait]
impl StateGuard for EphemeralStateStore {
    async fn issue(&self) -> String {
        let state = generate_state();
        self.issued.insert(digest(&state), Instant::now()).await;
        state
    }

    async fn verify(&self, received: &str) -> bool {
        // Eviction is lazy, so the age is checked here as well.
        let consumed = matches!(
            self.issued.remove(&digest(received)).await,
            Some(issued_at) if issued_at.elapsed() <= self.ttl
        );
        if !consumed {
            tracing::debug!("State not issued, already used, or expired");
        }
        consumed
    }
}
