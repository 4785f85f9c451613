//! Cache key construction for API requests

use reqwest::Method;

/// Namespace prefix shared by every API response key
pub const KEY_PREFIX: &str = "api:";

/// Builds the cache key for a request
///
/// The key is `api:{METHOD} {path}` followed by the query string with its
/// parameters sorted, so `/a?x=1&y=2` and `a?y=2&x=1` share an entry while the
/// same path under another method or key space does not.
pub fn cache_key(method: &Method, path: &str) -> String {
    let (path, query) = match path.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (path, None),
    };

    let path = path.trim_start_matches('/');
    let mut key = format!("{}{} /{}", KEY_PREFIX, method.as_str(), path);

    if let Some(query) = query {
        let mut params: Vec<&str> = query.split('&').filter(|p| !p.is_empty()).collect();
        if !params.is_empty() {
            params.sort_unstable();
            key.push('?');
            key.push_str(&params.join("&"));
        }
    }

    key
}
