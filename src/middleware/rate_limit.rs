//! Rate limiting middleware.
//!
//! Fixed-window request counters keyed by an arbitrary string. A client can
//! land up to 2x the limit in a short span straddling a window boundary; that
//! is a documented property of fixed-window limiting, not a defect.

use crate::auth::error::AuthError;
use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

/// Configuration for rate limiting.
#[derive(Clone)]
pub struct RateLimitConfig {
    /// Maximum requests per window.
    pub max_requests: u32,
    /// Window duration.
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window: Duration::from_secs(60),
        }
    }
}

/// Fixed-window rate limiter. One explicit instance is owned by the app state
/// and handed to every call site.
#[derive(Clone)]
pub struct RateLimiter {
    windows: Arc<Mutex<HashMap<String, WindowCounter>>>,
}

struct WindowCounter {
    count: u32,
    window_start: Instant,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            windows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Fixed-window check. The first request for a key opens a window with
    /// count 1; at the limit, requests are rejected without incrementing;
    /// once the window has elapsed the counter resets wholesale.
    pub fn is_allowed(&self, key: &str, limit: u32, window: Duration) -> bool {
        let mut windows = self.windows.lock();
        let now = Instant::now();

        let counter = windows.entry(key.to_string()).or_insert(WindowCounter {
            count: 0,
            window_start: now,
        });

        // Whole-window reset once the window has elapsed
        if now.duration_since(counter.window_start) >= window {
            counter.count = 0;
            counter.window_start = now;
        }

        if counter.count >= limit {
            return false;
        }

        counter.count += 1;
        true
    }

    /// Periodic cleanup of idle windows (call from a background task).
    pub fn cleanup(&self, max_idle: Duration) {
        let now = Instant::now();
        self.windows
            .lock()
            .retain(|_, counter| now.duration_since(counter.window_start) < max_idle);
    }

    pub fn tracked_keys(&self) -> usize {
        self.windows.lock().len()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

/// Limiter plus its configured defaults, shared as middleware state.
#[derive(Clone)]
pub struct RateLimitState {
    pub limiter: RateLimiter,
    pub config: RateLimitConfig,
}

/// Per-IP rate limiting middleware.
pub async fn rate_limit_middleware(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<RateLimitState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let key = addr.ip().to_string();

    if state
        .limiter
        .is_allowed(&key, state.config.max_requests, state.config.window)
    {
        return next.run(request).await;
    }

    warn!(ip = %addr.ip(), "Rate limit exceeded");

    let mut response = AuthError::RateLimited.into_response();
    if let Ok(retry_after) = state.config.window.as_secs().to_string().parse() {
        response.headers_mut().insert("Retry-After", retry_after);
    }
    response
}
