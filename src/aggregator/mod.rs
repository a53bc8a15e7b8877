//! View-model layer: gateway access, session cache and display shaping.

pub mod catalog;
pub mod client;
pub mod favorites;
pub mod neo;
pub mod store;

pub use client::{FetchError, GatewayClient, RouteName};
pub use favorites::FavoritesStore;
pub use neo::{classify_danger, derive_neo_stats, ChartRow, DangerLevel, NeoStatsView};
pub use store::{CacheEvent, EntryStatus, FetchOutcome, QueryCacheEntry, QueryKey, QueryStore};

use crate::config::AppConfig;
use crate::domain::{ApodResult, EpicImage, MarsPhotos, MediaSearchResponse, NeoFeed};
use serde_json::Value;

pub fn store_from_config(config: &AppConfig) -> anyhow::Result<QueryStore> {
    Ok(QueryStore::new(GatewayClient::new(&config.gateway)?))
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("unknown rover {0}")]
    UnknownRover(String),
    #[error("{rover} has no photos past sol {max_sol}")]
    SolOutOfRange { rover: &'static str, max_sol: u32 },
    #[error("{rover} has no {camera} camera")]
    UnknownCamera { rover: &'static str, camera: String },
}

pub fn apod_key(date: Option<&str>) -> QueryKey {
    QueryKey::new(RouteName::Apod, date.map(|d| ("date", d)))
}

/// `count` random pictures; the gateway answers with an array
pub fn apod_random_key(count: u32) -> QueryKey {
    QueryKey::new(RouteName::Apod, [("count", count.to_string())])
}

pub fn mars_photos_key(
    rover: &str,
    sol: u32,
    camera: Option<&str>,
) -> Result<QueryKey, QueryError> {
    let info = catalog::rover(rover).ok_or_else(|| QueryError::UnknownRover(rover.to_string()))?;
    if sol > info.max_sol {
        return Err(QueryError::SolOutOfRange {
            rover: info.name,
            max_sol: info.max_sol,
        });
    }

    let mut params = vec![
        ("rover", info.key.to_string()),
        ("sol", sol.to_string()),
    ];
    if let Some(camera) = camera.filter(|c| !c.is_empty()) {
        if !info.has_camera(camera) {
            return Err(QueryError::UnknownCamera {
                rover: info.name,
                camera: camera.to_string(),
            });
        }
        params.push(("camera", camera.to_ascii_uppercase()));
    }
    Ok(QueryKey::new(RouteName::MarsPhotos, params))
}

pub fn neo_key(start_date: &str, end_date: &str) -> QueryKey {
    QueryKey::new(
        RouteName::Neo,
        [("start_date", start_date), ("end_date", end_date)],
    )
}

pub fn epic_key(date: Option<&str>) -> QueryKey {
    QueryKey::new(RouteName::Epic, date.map(|d| ("date", d)))
}

pub fn search_key(q: &str, media_type: Option<&str>, page: Option<u32>) -> QueryKey {
    let mut params = vec![("q", q.trim().to_string())];
    if let Some(media_type) = media_type {
        params.push(("media_type", media_type.to_string()));
    }
    if let Some(page) = page {
        params.push(("page", page.to_string()));
    }
    QueryKey::new(RouteName::Search, params)
}

/// EPIC answers `[]` for dates without imagery; that is a successful empty result
#[derive(Debug, Clone)]
pub enum EpicView {
    Images(Vec<EpicImage>),
    Empty,
}

impl EpicView {
    pub fn from_payload(payload: &Value) -> Result<Self, serde_json::Error> {
        let images: Vec<EpicImage> = serde_json::from_value(payload.clone())?;
        if images.is_empty() {
            Ok(EpicView::Empty)
        } else {
            Ok(EpicView::Images(images))
        }
    }
}

pub fn apod_view(entry: &QueryCacheEntry) -> Option<Result<ApodResult, serde_json::Error>> {
    entry.decode()
}

pub fn mars_view(entry: &QueryCacheEntry) -> Option<Result<MarsPhotos, serde_json::Error>> {
    entry.decode()
}

pub fn search_view(
    entry: &QueryCacheEntry,
) -> Option<Result<MediaSearchResponse, serde_json::Error>> {
    entry.decode()
}

pub fn epic_view(entry: &QueryCacheEntry) -> Option<Result<EpicView, serde_json::Error>> {
    entry.data.as_ref().map(EpicView::from_payload)
}

/// Recomputed from the cached feed on every call
pub fn neo_view(entry: &QueryCacheEntry) -> Option<Result<NeoStatsView, serde_json::Error>> {
    entry
        .decode::<NeoFeed>()
        .map(|feed| feed.map(|f| derive_neo_stats(&f)))
}
