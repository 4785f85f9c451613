//! Client configuration
//!
//! Defaults suit a local development backend; environment variables override
//! them, and CLI flags override the environment.

use std::env;

use crate::api::resolve_base_url;

/// Explicit API base URL
pub const ENV_API_URL: &str = "HEALTHTRACK_API_URL";
/// Host the client is serving from, used to infer the API origin
pub const ENV_HOST: &str = "HEALTHTRACK_HOST";
/// Default response cache lifetime in milliseconds
pub const ENV_CACHE_TTL_MS: &str = "HEALTHTRACK_CACHE_TTL_MS";

/// Default cache lifetime for GET responses (5 minutes)
pub const DEFAULT_TTL_MS: u64 = 300_000;

/// Default HTTP request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Settings for building an `ApiClient`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API base URL without a trailing slash
    pub base_url: String,
    /// TTL applied when a cached GET does not specify one
    pub default_ttl_ms: u64,
    /// Timeout for each HTTP request
    pub timeout_secs: u64,
    /// Store responses on disk instead of in memory
    pub persist_cache: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: resolve_base_url(None, None),
            default_ttl_ms: DEFAULT_TTL_MS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            persist_cache: false,
        }
    }
}

impl ClientConfig {
    /// Builds a config from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a config from an arbitrary variable lookup
    ///
    /// Unparseable TTL values fall back to the default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = resolve_base_url(lookup(ENV_API_URL).as_deref(), lookup(ENV_HOST).as_deref());
        let default_ttl_ms = lookup(ENV_CACHE_TTL_MS)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(DEFAULT_TTL_MS);

        Self {
            base_url,
            default_ttl_ms,
            ..Self::default()
        }
    }

    /// Overrides the base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}
