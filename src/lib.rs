//! HealthTrack client library
//!
//! An authenticated HTTP client for the HealthTrack API with a TTL response
//! cache in front of GET requests.

pub mod api;
pub mod cache;
pub mod cli;
pub mod config;

pub use api::{ApiClient, ApiError, CachedGetOptions, CachedResponse, RequestOptions, SessionStore};
pub use cache::{cache_key, CacheManager, ResponseStore, TtlCache};
pub use config::ClientConfig;
