//! # V1 API Key Authentication & Rate Limiting Middleware
//!
//! Protects all v1 API routes (except explicitly public ones like `/health`)
//! with Bearer token authentication against the `ROLO_API_KEYS` list, and
//! optionally applies a best-effort fixed-window rate limit per key.
//!
//! The limiter is an in-memory counter: single-instance, not linearizable,
//! reset every wall-clock minute. Suitable for a self-hosted deployment, not
//! a substitute for an edge rate limiter.

use std::collections::HashMap;
use std::sync::Mutex;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;

use crate::api::state::AppState;

use super::response::{ApiResponse, ErrorCode};

/// Fixed-window request counters keyed by API key.
#[derive(Debug, Default)]
pub struct RateLimiter {
    windows: Mutex<HashMap<String, (i64, u32)>>,
}

impl RateLimiter {
    /// Record a hit for `key`; returns `false` when the caller exceeded
    /// `limit` requests in the current minute window.
    pub fn check(&self, key: &str, limit: u32) -> bool {
        let now_min = Utc::now().timestamp() / 60;
        let mut windows = self
            .windows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let entry = windows.entry(key.to_string()).or_insert((now_min, 0));
        if entry.0 != now_min {
            *entry = (now_min, 0);
        }

        if entry.1 >= limit {
            return false;
        }

        entry.1 += 1;
        true
    }
}

fn bearer_token(request: &Request<Body>) -> Option<&str> {
    request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

/// Axum middleware that enforces Bearer token authentication for v1 routes.
///
/// # Behavior
///
/// - If `ROLO_API_KEYS` is empty/unset → returns 401 with JSON error envelope.
///   The server still starts, but protected routes are locked down.
/// - If the `Authorization: Bearer <token>` header is missing or malformed → 401.
/// - If the token is not in the configured key list → 401.
/// - If the token is valid → passes the request through to the next handler.
pub async fn v1_auth_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if state.config.server.api_keys.is_empty() {
        return ApiResponse::<()>::error(
            ErrorCode::Unauthorized,
            "API keys not configured. Set ROLO_API_KEYS to enable access.",
        )
        .into_response();
    }

    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(h) if h.starts_with("Bearer ") => &h[7..],
        Some(_) => {
            return ApiResponse::<()>::error(
                ErrorCode::Unauthorized,
                "Invalid authorization header format. Expected: Bearer <token>",
            )
            .into_response();
        }
        None => {
            return ApiResponse::<()>::error(
                ErrorCode::Unauthorized,
                "Missing authorization header",
            )
            .into_response();
        }
    };

    if state.config.server.api_keys.contains(&token.to_string()) {
        next.run(request).await
    } else {
        ApiResponse::<()>::error(ErrorCode::Unauthorized, "Invalid API key").into_response()
    }
}

/// Axum middleware applying the per-key fixed-window rate limit.
///
/// A no-op when `RATE_LIMIT_PER_MINUTE` is unset. Requests without a Bearer
/// token share one anonymous bucket (auth will reject them next anyway).
pub async fn v1_rate_limit_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(limit) = state.config.server.rate_limit_per_minute else {
        return next.run(request).await;
    };

    let key = bearer_token(&request).unwrap_or("anonymous").to_string();

    if !state.rate_limiter.check(&key, limit) {
        return ApiResponse::<()>::error(
            ErrorCode::TooManyRequests,
            format!("Rate limit of {limit} requests per minute exceeded"),
        )
        .into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limiter_allows_up_to_limit() {
        let limiter = RateLimiter::default();
        for _ in 0..5 {
            assert!(limiter.check("key-a", 5));
        }
        assert!(!limiter.check("key-a", 5));
    }

    #[test]
    fn rate_limiter_buckets_are_per_key() {
        let limiter = RateLimiter::default();
        assert!(limiter.check("key-a", 1));
        assert!(!limiter.check("key-a", 1));
        assert!(limiter.check("key-b", 1), "other keys keep their own budget");
    }
}
