//! HTTP request handlers.

pub(crate) mod docs;
pub(crate) mod feedback;
pub(crate) mod versions;

use axum::http::HeaderMap;

/// Client address for rate limiting.
///
/// Uses `x-real-ip`, then the first `x-forwarded-for` entry, else `unknown`.
pub(crate) fn client_address(headers: &HeaderMap) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    header("x-real-ip")
        .or_else(|| {
            header("x-forwarded-for")
                .and_then(|v| v.split(',').next())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        })
        .unwrap_or("unknown")
        .to_owned()
}
