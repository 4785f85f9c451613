//! API base address resolution

/// Backend address used when running against a local development server
pub const LOCAL_API_URL: &str = "http://localhost:8000/api";

/// Resolves the API base URL
///
/// An explicit override always wins. Otherwise a local or unknown host points
/// at the development backend, and any other host is assumed to serve the API
/// from the same origin under `/api`.
pub fn resolve_base_url(override_url: Option<&str>, host: Option<&str>) -> String {
    if let Some(url) = override_url.map(str::trim).filter(|u| !u.is_empty()) {
        return url.trim_end_matches('/').to_string();
    }

    match host.map(str::trim).filter(|h| !h.is_empty()) {
        Some(host) if !is_local_host(host) => {
            format!("https://{}/api", host.trim_end_matches('/'))
        }
        _ => LOCAL_API_URL.to_string(),
    }
}

fn is_local_host(host: &str) -> bool {
    let name = match host.strip_prefix('[') {
        // Bracketed IPv6, optionally followed by a port
        Some(rest) => rest.split(']').next().unwrap_or(rest),
        None if host.matches(':').count() > 1 => host,
        None => host.split(':').next().unwrap_or(host),
    };
    matches!(name, "localhost" | "127.0.0.1" | "0.0.0.0" | "::1")
}
