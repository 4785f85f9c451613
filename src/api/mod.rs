//! HealthTrack API access
//!
//! This module contains the HTTP client and its collaborators: session
//! storage for the bearer token, base URL resolution, and error types.

mod client;
mod endpoint;
mod error;
mod session;

pub use client::{ApiClient, CachedGetOptions, CachedResponse, RequestOptions, UnauthorizedHook};
pub use endpoint::{resolve_base_url, LOCAL_API_URL};
pub use error::ApiError;
pub use session::{SessionError, SessionStore};
