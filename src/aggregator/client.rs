//! HTTP client the view layer uses to reach the gateway.

use crate::config::GatewaySettings;
use crate::utils::s_pick;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

/// Gateway routes as seen from the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RouteName {
    Apod,
    MarsPhotos,
    Neo,
    Epic,
    Search,
    Health,
}

impl RouteName {
    pub fn path(self) -> &'static str {
        match self {
            RouteName::Apod => "/api/apod",
            RouteName::MarsPhotos => "/api/mars-photos",
            RouteName::Neo => "/api/neo",
            RouteName::Epic => "/api/epic",
            RouteName::Search => "/api/search",
            RouteName::Health => "/api/health",
        }
    }

    fn fallback_error(self) -> &'static str {
        match self {
            RouteName::Apod => "Failed to fetch APOD",
            RouteName::MarsPhotos => "Failed to fetch Mars photos",
            RouteName::Neo => "Failed to fetch NEO data",
            RouteName::Epic => "Failed to fetch Earth images",
            RouteName::Search => "Failed to search media",
            RouteName::Health => "API health check failed",
        }
    }
}

/// Failure shown to the user as a transient toast
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,
    #[error("Server error. Please try again later.")]
    Server,
    #[error("Request timeout. Please try again.")]
    Timeout,
    #[error("{0}")]
    Failed(String),
}

pub struct GatewayClient {
    client: Client,
    base_url: String,
}

impl GatewayClient {
    pub fn new(settings: &GatewaySettings) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()?;
        Ok(Self {
            client,
            base_url: settings.api_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn get(
        &self,
        route: RouteName,
        query: &BTreeMap<String, String>,
    ) -> Result<Value, FetchError> {
        let url = format!("{}{}", self.base_url, route.path());
        let resp = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| transport_error(route, e))?;

        let status = resp.status();
        if status.is_success() {
            return resp.json().await.map_err(|e| transport_error(route, e));
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::RateLimited);
        }
        if status.is_server_error() {
            return Err(FetchError::Server);
        }

        let body: Option<Value> = resp.json().await.ok();
        let message = match route {
            RouteName::Health => None,
            _ => body.as_ref().and_then(|b| s_pick(b, &["error"])),
        };
        Err(FetchError::Failed(
            message.unwrap_or_else(|| route.fallback_error().to_string()),
        ))
    }
}

fn transport_error(route: RouteName, err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Failed(route.fallback_error().to_string())
    }
}
