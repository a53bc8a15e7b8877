/// HTTP request handlers
use crate::domain::Health;
use crate::errors::ApiError;
use crate::services::GatewayService;
use crate::upstream::UpstreamRoute;
use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<GatewayService>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(gateway: GatewayService) -> Self {
        Self {
            gateway: Arc::new(gateway),
            started_at: Instant::now(),
        }
    }
}

type Params = Query<HashMap<String, String>>;

async fn proxy(
    state: &AppState,
    route: UpstreamRoute,
    params: HashMap<String, String>,
) -> Result<Json<Value>, ApiError> {
    let payload = state.gateway.forward(route, &params).await?;
    Ok(Json(payload))
}

/// Astronomy Picture of the Day
pub async fn get_apod(
    State(state): State<AppState>,
    Query(params): Params,
) -> Result<Json<Value>, ApiError> {
    proxy(&state, UpstreamRoute::Apod, params).await
}

/// Mars rover photos
pub async fn get_mars_photos(
    State(state): State<AppState>,
    Query(params): Params,
) -> Result<Json<Value>, ApiError> {
    proxy(&state, UpstreamRoute::MarsPhotos, params).await
}

/// Near-Earth object feed
pub async fn get_neo(
    State(state): State<AppState>,
    Query(params): Params,
) -> Result<Json<Value>, ApiError> {
    proxy(&state, UpstreamRoute::Neo, params).await
}

/// EPIC natural-color imagery
pub async fn get_epic(
    State(state): State<AppState>,
    Query(params): Params,
) -> Result<Json<Value>, ApiError> {
    proxy(&state, UpstreamRoute::Epic, params).await
}

/// NASA Image and Video Library search
pub async fn search_media(
    State(state): State<AppState>,
    Query(params): Params,
) -> Result<Json<Value>, ApiError> {
    proxy(&state, UpstreamRoute::SearchMedia, params).await
}

/// Health check handler
pub async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        uptime_seconds: state.started_at.elapsed().as_secs_f64(),
    })
}

/// Fallback for unmatched paths
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}
