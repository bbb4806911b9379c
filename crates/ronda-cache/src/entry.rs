//! Cache keys and entries.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Query parameter names never folded into a key.
const CREDENTIAL_PARAMS: &[&str] = &["apikey", "api_key", "token"];

/// Deterministic cache key: endpoint path plus query parameters sorted by name.
///
/// Credentials are excluded so rotating an API key does not invalidate the
/// cache, and so the key never leaks into the database.
///
/// ```
/// use ronda_cache::CacheKey;
///
/// let a = CacheKey::new("ratios", &[("symbol", "AAPL"), ("limit", "5"), ("apikey", "secret")]);
/// let b = CacheKey::new("ratios", &[("limit", "5"), ("symbol", "AAPL")]);
/// assert_eq!(a, b);
/// assert_eq!(a.as_str(), "ratios?limit=5&symbol=AAPL");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Build a key from an endpoint path and its query parameters.
    #[must_use]
    pub fn new<K: AsRef<str>, V: AsRef<str>>(endpoint: &str, params: &[(K, V)]) -> Self {
        let mut pairs: Vec<(&str, &str)> = params
            .iter()
            .map(|(k, v)| (k.as_ref(), v.as_ref()))
            .filter(|(k, _)| {
                !CREDENTIAL_PARAMS
                    .iter()
                    .any(|c| c.eq_ignore_ascii_case(k))
            })
            .collect();
        pairs.sort_unstable();

        let endpoint = endpoint.trim_matches('/');
        if pairs.is_empty() {
            return Self(endpoint.to_string());
        }
        let query: Vec<String> = pairs.iter().map(|(k, v)| format!("{k}={v}")).collect();
        Self(format!("{endpoint}?{}", query.join("&")))
    }

    /// Wrap an already-built key string.
    #[must_use]
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A cached provider payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Cache key.
    pub key: String,
    /// Raw JSON payload as returned by the provider.
    pub payload: serde_json::Value,
    /// When the payload was fetched.
    pub fetched_at: DateTime<Utc>,
    /// How long the payload stays valid after `fetched_at`.
    pub ttl: Duration,
}

impl CacheEntry {
    /// Create an entry fetched now.
    #[must_use]
    pub fn new(key: &CacheKey, payload: serde_json::Value, ttl: Duration) -> Self {
        Self {
            key: key.as_str().to_string(),
            payload,
            fetched_at: Utc::now(),
            ttl,
        }
    }

    /// Instant after which the entry is stale.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        chrono::Duration::from_std(self.ttl)
            .ok()
            .and_then(|ttl| self.fetched_at.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Whether the entry's age exceeds its ttl at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }

    /// Whether the entry is expired right now.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Time left before expiry at `now`, zero when already expired.
    #[must_use]
    pub fn remaining_at(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at() - now).to_std().unwrap_or(Duration::ZERO)
    }
}
