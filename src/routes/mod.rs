/// Application routes configuration
use crate::config::AppConfig;
use crate::handlers::{
    get_apod, get_epic, get_mars_photos, get_neo, health, not_found, search_media, AppState,
};
use crate::middleware::{
    guard_origin, handle_panic, rate_limit, security_headers, FixedWindowLimiter, OriginPolicy,
};
use axum::{middleware::from_fn_with_state, routing::get, Router};
use std::sync::Arc;
use std::time::Duration;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

/// Request policy shared by every route
#[derive(Clone)]
pub struct Policies {
    pub limiter: Arc<FixedWindowLimiter>,
    pub origins: OriginPolicy,
}

impl Policies {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            limiter: Arc::new(FixedWindowLimiter::new(
                config.rate_limit.max_requests,
                Duration::from_secs(config.rate_limit.window_seconds),
            )),
            origins: OriginPolicy::new(&config.allowed_origins),
        }
    }
}

/// Build the application router with all routes
///
/// Every route is GET-only; other methods on a known path get the same 404
/// as an unknown path rather than a 405.
pub fn build_router(state: AppState, policies: &Policies) -> Router {
    let mut router = Router::new()
        .route("/api/apod", get(get_apod).fallback(not_found))
        .route("/api/mars-photos", get(get_mars_photos).fallback(not_found))
        .route("/api/neo", get(get_neo).fallback(not_found))
        .route("/api/epic", get(get_epic).fallback(not_found))
        .route("/api/search", get(search_media).fallback(not_found))
        .route("/api/health", get(health).fallback(not_found))
        .fallback(not_found)
        .with_state(state)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(from_fn_with_state(policies.limiter.clone(), rate_limit))
        .layer(from_fn_with_state(policies.origins.clone(), guard_origin))
        .layer(policies.origins.cors_layer());

    for (name, value) in security_headers() {
        router = router.layer(SetResponseHeaderLayer::if_not_present(name, value));
    }

    router
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
}
