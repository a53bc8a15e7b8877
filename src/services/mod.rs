/// Gateway service: resolves a route and forwards it upstream
use crate::clients::{HttpClient, MediaLibraryClient, NasaClient, UpstreamFailure};
use crate::config::AppConfig;
use crate::errors::{ApiError, ApiResult};
use crate::upstream::{Target, UpstreamRequest, UpstreamRoute};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, error};

pub struct GatewayService {
    nasa_client: NasaClient,
    media_client: MediaLibraryClient,
}

impl GatewayService {
    pub fn new(nasa_client: NasaClient, media_client: MediaLibraryClient) -> Self {
        Self {
            nasa_client,
            media_client,
        }
    }

    /// Wire both upstream clients from configuration
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let http = HttpClient::new(config.upstream_timeout())?;
        let nasa_client = NasaClient::new(
            http.clone(),
            config.nasa_api_url.clone(),
            config.nasa_api_key.clone(),
        );
        let media_client = MediaLibraryClient::new(http, config.media_search_url.clone());
        Ok(Self::new(nasa_client, media_client))
    }

    /// Resolve `raw` against the route table and relay the upstream JSON verbatim
    pub async fn forward(
        &self,
        route: UpstreamRoute,
        raw: &HashMap<String, String>,
    ) -> ApiResult<Value> {
        let request = route.build(raw)?;
        debug!(route = route.name(), path = %request.path, "forwarding upstream");

        self.dispatch(&request)
            .await
            .map_err(|failure| into_api_error(route, failure))
    }

    async fn dispatch(&self, request: &UpstreamRequest) -> Result<Value, UpstreamFailure> {
        match request.target {
            Target::Nasa => self.nasa_client.fetch(&request.path, &request.query).await,
            Target::MediaLibrary => self.media_client.search(&request.query).await,
        }
    }
}

fn into_api_error(route: UpstreamRoute, failure: UpstreamFailure) -> ApiError {
    let context = route.spec().failure;
    error!("{} error: {}", route.name(), failure);

    match failure {
        UpstreamFailure::Timeout(timeout_ms) => ApiError::UpstreamTimeout {
            context,
            timeout_ms,
        },
        other => ApiError::Upstream {
            context,
            details: other.details(),
        },
    }
}
