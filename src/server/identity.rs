//! Caller identity extraction from request headers.

use axum::http::HeaderMap;

/// Shared bucket for callers without an address header
pub const UNKNOWN_ADDRESS: &str = "unknown";

/// Caller address: first `x-forwarded-for` hop, then `x-real-ip`, then
/// [`UNKNOWN_ADDRESS`].
pub fn client_address(headers: &HeaderMap) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    forwarded
        .or_else(real_ip)
        .unwrap_or(UNKNOWN_ADDRESS)
        .to_string()
}
