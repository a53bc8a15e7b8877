//! Cross-cutting request policy: rate limiting, origin checks, CORS,
//! hardening headers and panic recovery.

use crate::errors::ApiError;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{
        header::{self, HeaderName, HeaderValue},
        Method,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use std::any::Any;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;

const X_RATELIMIT_LIMIT: &str = "x-ratelimit-limit";
const X_RATELIMIT_REMAINING: &str = "x-ratelimit-remaining";

// ---------------------------------------------------------------------------
// Rate limiting

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed { remaining: u32, reset_in: Duration },
    Limited { retry_after: Duration },
}

/// Fixed-window request counter per client address
pub struct FixedWindowLimiter {
    max_requests: u32,
    window: Duration,
    windows: DashMap<IpAddr, Window>,
}

impl FixedWindowLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            windows: DashMap::new(),
        }
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub fn check(&self, client: IpAddr) -> Decision {
        self.check_at(client, Instant::now())
    }

    /// Increment-and-check under the shard lock for `client`
    pub fn check_at(&self, client: IpAddr, now: Instant) -> Decision {
        let mut entry = self.windows.entry(client).or_insert(Window {
            started: now,
            count: 0,
        });

        if now.duration_since(entry.started) >= self.window {
            entry.started = now;
            entry.count = 0;
        }
        let reset_in = self
            .window
            .saturating_sub(now.duration_since(entry.started));

        if entry.count >= self.max_requests {
            return Decision::Limited {
                retry_after: reset_in,
            };
        }
        entry.count += 1;
        Decision::Allowed {
            remaining: self.max_requests - entry.count,
            reset_in,
        }
    }

    /// Drop windows that have rolled over; returns how many were removed
    pub fn prune(&self, now: Instant) -> usize {
        let mut removed = 0;
        self.windows.retain(|_, w| {
            let live = now.duration_since(w.started) < self.window;
            if !live {
                removed += 1;
            }
            live
        });
        removed
    }

    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }
}

fn client_ip(request: &Request) -> IpAddr {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

pub async fn rate_limit(
    State(limiter): State<Arc<FixedWindowLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let client = client_ip(&request);
    let limit = HeaderValue::from(limiter.max_requests());

    match limiter.check(client) {
        Decision::Allowed { remaining, .. } => {
            let mut response = next.run(request).await;
            let headers = response.headers_mut();
            headers.insert(X_RATELIMIT_LIMIT, limit);
            headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(remaining));
            response
        }
        Decision::Limited { retry_after } => {
            warn!(client = %client, path = %request.uri().path(), "rate limit exceeded");
            let mut response = ApiError::RateLimited.into_response();
            let headers = response.headers_mut();
            headers.insert(X_RATELIMIT_LIMIT, limit);
            headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(0u32));
            headers.insert(
                header::RETRY_AFTER,
                HeaderValue::from(retry_after.as_secs_f64().ceil() as u64),
            );
            response
        }
    }
}

// ---------------------------------------------------------------------------
// Origins

/// Browser origins allowed to call the gateway
#[derive(Clone)]
pub struct OriginPolicy {
    allowed: Arc<Vec<HeaderValue>>,
}

impl OriginPolicy {
    pub fn new(origins: &[String]) -> Self {
        let allowed = origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!("ignoring unusable CORS origin {:?}", o);
                    None
                }
            })
            .collect();
        Self {
            allowed: Arc::new(allowed),
        }
    }

    pub fn allows(&self, origin: &HeaderValue) -> bool {
        self.allowed.iter().any(|o| o == origin)
    }

    pub fn cors_layer(&self) -> CorsLayer {
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(self.allowed.iter().cloned()))
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
                Method::PATCH,
            ])
            .allow_headers([
                header::CONTENT_TYPE,
                header::AUTHORIZATION,
                HeaderName::from_static("x-user-id"),
                HeaderName::from_static("x-profile-id"),
            ])
            .allow_credentials(true)
            .max_age(Duration::from_secs(86_400))
    }
}

/// Requests without an Origin header (curl, same-origin, server-to-server) always pass
pub async fn guard_origin(
    State(policy): State<OriginPolicy>,
    request: Request,
    next: Next,
) -> Response {
    if let Some(origin) = request.headers().get(header::ORIGIN) {
        if !policy.allows(origin) {
            warn!(origin = ?origin, "rejected cross-origin request");
            return ApiError::Forbidden("Not allowed by CORS".to_string()).into_response();
        }
    }
    next.run(request).await
}

// ---------------------------------------------------------------------------
// Hardening headers

const CONTENT_SECURITY_POLICY: &str = "default-src 'self';base-uri 'self';font-src 'self' https: data:;form-action 'self';frame-ancestors 'self';img-src 'self' data:;object-src 'none';script-src 'self';script-src-attr 'none';style-src 'self' https: 'unsafe-inline';upgrade-insecure-requests";

pub fn security_headers() -> Vec<(HeaderName, HeaderValue)> {
    vec![
        (
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static(CONTENT_SECURITY_POLICY),
        ),
        (
            HeaderName::from_static("cross-origin-opener-policy"),
            HeaderValue::from_static("same-origin"),
        ),
        (
            HeaderName::from_static("cross-origin-resource-policy"),
            HeaderValue::from_static("same-origin"),
        ),
        (
            HeaderName::from_static("origin-agent-cluster"),
            HeaderValue::from_static("?1"),
        ),
        (header::REFERRER_POLICY, HeaderValue::from_static("no-referrer")),
        (
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=15552000; includeSubDomains"),
        ),
        (header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
        (header::X_DNS_PREFETCH_CONTROL, HeaderValue::from_static("off")),
        (
            HeaderName::from_static("x-download-options"),
            HeaderValue::from_static("noopen"),
        ),
        (header::X_FRAME_OPTIONS, HeaderValue::from_static("SAMEORIGIN")),
        (
            HeaderName::from_static("x-permitted-cross-domain-policies"),
            HeaderValue::from_static("none"),
        ),
        (header::X_XSS_PROTECTION, HeaderValue::from_static("0")),
    ]
}

// ---------------------------------------------------------------------------
// Panics

/// Turn a handler panic into the generic internal error response
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    ApiError::Internal(detail).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, last))
    }

    #[test]
    fn test_limiter_allows_up_to_max_then_limits() {
        let limiter = FixedWindowLimiter::new(3, Duration::from_secs(60));
        let now = Instant::now();

        for expected_remaining in [2, 1, 0] {
            match limiter.check_at(ip(1), now) {
                Decision::Allowed { remaining, .. } => assert_eq!(remaining, expected_remaining),
                other => panic!("expected allowed, got {:?}", other),
            }
        }
        assert!(matches!(
            limiter.check_at(ip(1), now + Duration::from_secs(10)),
            Decision::Limited { retry_after } if retry_after == Duration::from_secs(50)
        ));
    }

    #[test]
    fn test_limiter_counts_clients_separately() {
        let limiter = FixedWindowLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();
        assert!(matches!(limiter.check_at(ip(1), now), Decision::Allowed { .. }));
        assert!(matches!(limiter.check_at(ip(2), now), Decision::Allowed { .. }));
        assert!(matches!(limiter.check_at(ip(1), now), Decision::Limited { .. }));
    }

    #[test]
    fn test_limiter_resets_on_rollover() {
        let limiter = FixedWindowLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();
        assert!(matches!(limiter.check_at(ip(1), now), Decision::Allowed { .. }));
        assert!(matches!(limiter.check_at(ip(1), now), Decision::Limited { .. }));
        assert!(matches!(
            limiter.check_at(ip(1), now + Duration::from_secs(60)),
            Decision::Allowed { remaining: 0, .. }
        ));
    }

    #[test]
    fn test_prune_drops_expired_windows() {
        let limiter = FixedWindowLimiter::new(5, Duration::from_secs(60));
        let now = Instant::now();
        limiter.check_at(ip(1), now);
        limiter.check_at(ip(2), now + Duration::from_secs(30));
        assert_eq!(limiter.prune(now + Duration::from_secs(61)), 1);
        assert_eq!(limiter.tracked_clients(), 1);
    }

    #[test]
    fn test_prune_while_new_clients_arrive() {
        let limiter = FixedWindowLimiter::new(5, Duration::from_secs(60));
        let start = Instant::now();
        limiter.check_at(ip(1), start);
        let later = start + Duration::from_secs(120);

        let mut removed = 0;
        std::thread::scope(|scope| {
            scope.spawn(|| {
                for n in 0..20_000u32 {
                    let client = IpAddr::V4(Ipv4Addr::from(0x0b00_0000 + n));
                    limiter.check_at(client, start);
                }
            });
            for _ in 0..200 {
                removed += limiter.prune(later);
            }
        });
        removed += limiter.prune(later);

        assert_eq!(removed, 20_001);
        assert_eq!(limiter.tracked_clients(), 0);
    }

    #[test]
    fn test_origin_policy_exact_match() {
        let policy = OriginPolicy::new(&["http://localhost:3000".to_string()]);
        assert!(policy.allows(&HeaderValue::from_static("http://localhost:3000")));
        assert!(!policy.allows(&HeaderValue::from_static("http://localhost:3000.evil.test")));
        assert!(!policy.allows(&HeaderValue::from_static("https://localhost:3000")));
    }

    #[test]
    fn test_panic_handler_is_generic() {
        let response = handle_panic(Box::new("boom"));
        assert_eq!(response.status(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    }
}
