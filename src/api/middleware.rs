//! API Middleware
//!
//! Logging only. The teacher's `auth_middleware`/`rate_limit_middleware`
//! are dropped here — authentication/authorization and rate limiting are
//! explicit Non-goals — but request logging is ambient and carried over
//! almost verbatim. The teacher's correlation id is minted per-request in
//! its auth middleware and logged from there; this domain has no such
//! middleware, so `EventMetadata::ensure_correlation_id` mints one per
//! command instead (see `src/services/command.rs`).

use axum::{
    body::Body,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};

const SENSITIVE_HEADERS: &[&str] = &["authorization", "cookie", "set-cookie"];

pub fn mask_headers_for_logging(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let name_lower = name.as_str().to_lowercase();
            let masked_value = if SENSITIVE_HEADERS.contains(&name_lower.as_str()) {
                "[REDACTED]".to_string()
            } else {
                value.to_str().unwrap_or("[invalid utf8]").to_string()
            };
            (name.to_string(), masked_value)
        })
        .collect()
}

pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let headers = mask_headers_for_logging(request.headers());
    let start = std::time::Instant::now();

    tracing::info!(method = %method, uri = %uri, headers = ?headers, "incoming request");

    let response = next.run(request).await;

    let duration = start.elapsed();
    tracing::info!(
        method = %method,
        uri = %uri,
        status = %response.status(),
        duration_ms = %duration.as_millis(),
        "request completed"
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_only_sensitive_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", "application/json".parse().unwrap());
        headers.insert("authorization", "Bearer secret".parse().unwrap());

        let masked = mask_headers_for_logging(&headers);
        let auth = masked.iter().find(|(k, _)| k == "authorization").unwrap();
        let content_type = masked.iter().find(|(k, _)| k == "content-type").unwrap();

        assert_eq!(auth.1, "[REDACTED]");
        assert_eq!(content_type.1, "application/json");
    }
}
