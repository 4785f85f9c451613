//! HealthTrack API client
//!
//! Wraps `reqwest` with the behavior every call site shares: the session's
//! bearer token goes on each request, a 401 tears the session down, and GETs
//! can be served from a TTL response cache.

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use super::error::ApiError;
use super::session::SessionStore;
use crate::cache::{cache_key, CacheManager, ResponseStore, TtlCache};
use crate::config::ClientConfig;

/// Callback run after a 401 clears the session and the cache
pub type UnauthorizedHook = Arc<dyn Fn() + Send + Sync>;

/// Per-request options
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestOptions {
    /// Report a 401 as an ordinary status error and keep the session
    pub skip_auth_redirect: bool,
}

/// Options for `ApiClient::cached_get`
#[derive(Debug, Clone, Copy, Default)]
pub struct CachedGetOptions {
    /// Cache lifetime for the fetched body; the client default when `None`
    pub ttl_ms: Option<u64>,
    /// Always go to the network, then refresh the cache with the result
    pub skip_cache: bool,
    /// Report a 401 as an ordinary status error and keep the session
    pub skip_auth_redirect: bool,
}

impl CachedGetOptions {
    fn request(&self) -> RequestOptions {
        RequestOptions {
            skip_auth_redirect: self.skip_auth_redirect,
        }
    }
}

/// A decoded GET body and where it came from
#[derive(Debug, Clone, PartialEq)]
pub struct CachedResponse<T> {
    pub data: T,
    pub from_cache: bool,
}

/// Client for the HealthTrack REST API
pub struct ApiClient<S = TtlCache<Value>> {
    http: Client,
    base_url: String,
    default_ttl_ms: u64,
    session: SessionStore,
    cache: S,
    on_unauthorized: Option<UnauthorizedHook>,
}

impl ApiClient<TtlCache<Value>> {
    /// Creates a client with an in-memory response cache
    pub fn new(config: &ClientConfig, session: SessionStore) -> Result<Self, ApiError> {
        Self::with_store(config, session, TtlCache::new())
    }
}

impl ApiClient<Box<dyn ResponseStore>> {
    /// Creates a client whose cache backend follows `config.persist_cache`
    ///
    /// Falls back to memory when no cache directory can be determined.
    pub fn from_config(config: &ClientConfig, session: SessionStore) -> Result<Self, ApiError> {
        let store: Box<dyn ResponseStore> = if config.persist_cache {
            match CacheManager::new() {
                Some(manager) => Box::new(manager),
                None => {
                    warn!("no cache directory available, using in-memory cache");
                    Box::new(TtlCache::<Value>::new())
                }
            }
        } else {
            Box::new(TtlCache::<Value>::new())
        };
        Self::with_store(config, session, store)
    }
}

impl<S: ResponseStore> ApiClient<S> {
    /// Creates a client over an explicit cache store
    pub fn with_store(config: &ClientConfig, session: SessionStore, cache: S) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            default_ttl_ms: config.default_ttl_ms,
            session,
            cache,
            on_unauthorized: None,
        })
    }

    /// Registers a callback for when the server rejects the session
    pub fn on_unauthorized<F>(mut self, hook: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_unauthorized = Some(Arc::new(hook));
        self
    }

    /// API base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Session holding the bearer token
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Response cache backing `cached_get`
    pub fn cache(&self) -> &S {
        &self.cache
    }

    /// Fetches `path`, serving it from the cache while a live entry exists
    ///
    /// A failed request or an undecodable body propagates to the caller and
    /// leaves the cache untouched.
    #[instrument(skip(self, options))]
    pub async fn cached_get<T: DeserializeOwned>(
        &self,
        path: &str,
        options: CachedGetOptions,
    ) -> Result<CachedResponse<T>, ApiError> {
        check_path(path)?;
        let key = cache_key(&Method::GET, path);

        if !options.skip_cache {
            if let Some(value) = self.cache.get(&key) {
                debug!(%key, "cache hit");
                let data = serde_json::from_value(value)?;
                return Ok(CachedResponse {
                    data,
                    from_cache: true,
                });
            }
            debug!(%key, "cache miss");
        }

        let value = self.send(self.http.get(self.url(path)), options.request()).await?;
        let data = T::deserialize(&value)?;

        let ttl_ms = options.ttl_ms.unwrap_or(self.default_ttl_ms);
        self.cache.set(&key, value, ttl_ms);

        Ok(CachedResponse {
            data,
            from_cache: false,
        })
    }

    /// Fetches `path` without consulting or filling the cache
    #[instrument(skip(self, options))]
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        check_path(path)?;
        let value = self.send(self.http.get(self.url(path)), options).await?;
        Ok(T::deserialize(&value)?)
    }

    /// POSTs a JSON body and decodes the JSON reply
    ///
    /// Cached GETs of the same resource are left alone; call `invalidate`
    /// when the write must be visible immediately.
    #[instrument(skip(self, body, options))]
    pub async fn post_json<B, T>(&self, path: &str, body: &B, options: RequestOptions) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        check_path(path)?;
        let value = self
            .send(self.http.post(self.url(path)).json(body), options)
            .await?;
        Ok(T::deserialize(&value)?)
    }

    /// PUTs a JSON body and decodes the JSON reply
    #[instrument(skip(self, body, options))]
    pub async fn put_json<B, T>(&self, path: &str, body: &B, options: RequestOptions) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        check_path(path)?;
        let value = self
            .send(self.http.put(self.url(path)).json(body), options)
            .await?;
        Ok(T::deserialize(&value)?)
    }

    /// Sends a DELETE, ignoring any reply body
    #[instrument(skip(self, options))]
    pub async fn delete(&self, path: &str, options: RequestOptions) -> Result<(), ApiError> {
        check_path(path)?;
        self.send(self.http.delete(self.url(path)), options).await?;
        Ok(())
    }

    /// Drops the cached GET response for `path`
    pub fn invalidate(&self, path: &str) {
        self.cache.invalidate(&cache_key(&Method::GET, path));
    }

    /// Stores a bearer token for subsequent requests
    ///
    /// Switching to a different token empties the cache so one account never
    /// sees responses fetched for another.
    pub fn login(&self, token: &str) -> Result<(), ApiError> {
        if self.session.token().as_deref() != Some(token) {
            self.cache.clear();
        }
        self.session.save(token)?;
        Ok(())
    }

    /// Ends the session: forgets the token and empties the cache
    pub fn logout(&self) -> Result<(), ApiError> {
        self.cache.clear();
        self.session.clear()?;
        info!("logged out");
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Sends a request with auth attached and decodes the body as JSON
    ///
    /// An empty success body decodes as `null`.
    async fn send(&self, request: RequestBuilder, options: RequestOptions) -> Result<Value, ApiError> {
        let request = match self.session.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();
        info!(url = %response.url(), status = status.as_u16(), "api response");

        if status == StatusCode::UNAUTHORIZED && !options.skip_auth_redirect {
            self.handle_unauthorized();
            return Err(ApiError::Unauthorized);
        }

        let text = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    fn handle_unauthorized(&self) {
        warn!("server rejected session, clearing it and the response cache");
        self.cache.clear();
        if let Err(e) = self.session.clear() {
            warn!(error = %e, "failed to clear session");
        }
        if let Some(hook) = &self.on_unauthorized {
            (**hook)();
        }
    }
}

fn check_path(path: &str) -> Result<(), ApiError> {
    if path.trim().is_empty() {
        return Err(ApiError::InvalidPath(path.to_string()));
    }
    Ok(())
}
