/// External API clients module
use crate::domain::UpstreamQuery;
use crate::utils::{redact, upstream_message};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// Why an upstream call produced no usable payload
#[derive(Debug, thiserror::Error)]
pub enum UpstreamFailure {
    #[error("upstream answered {status}: {message}")]
    Status { status: u16, message: String },
    #[error("timeout of {0}ms exceeded")]
    Timeout(u64),
    #[error("{0}")]
    Transport(String),
    #[error("{0}")]
    Decode(String),
}

impl UpstreamFailure {
    /// Text forwarded to callers in the envelope `details`
    pub fn details(&self) -> String {
        match self {
            UpstreamFailure::Status { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    fn redacted(self, secret: &str) -> Self {
        match self {
            UpstreamFailure::Status { status, message } => UpstreamFailure::Status {
                status,
                message: redact(&message, secret),
            },
            UpstreamFailure::Transport(msg) => UpstreamFailure::Transport(redact(&msg, secret)),
            UpstreamFailure::Decode(msg) => UpstreamFailure::Decode(redact(&msg, secret)),
            timeout => timeout,
        }
    }
}

/// HTTP client wrapper with common configuration
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    timeout: Duration,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("space-explorer-gateway/1.0")
            .build()?;
        Ok(Self { client, timeout })
    }

    /// GET `url` and decode a JSON body, folding every failure into [`UpstreamFailure`]
    pub async fn get_json(
        &self,
        url: &str,
        query: &[(String, String)],
    ) -> Result<Value, UpstreamFailure> {
        let resp = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = resp.status();
        if !status.is_success() {
            let body: Option<Value> = resp.json().await.ok();
            let message = body
                .as_ref()
                .and_then(upstream_message)
                .unwrap_or_else(|| format!("Request failed with status code {}", status.as_u16()));
            return Err(UpstreamFailure::Status {
                status: status.as_u16(),
                message,
            });
        }

        resp.json::<Value>().await.map_err(|e| self.classify(e))
    }

    fn classify(&self, err: reqwest::Error) -> UpstreamFailure {
        if err.is_timeout() {
            UpstreamFailure::Timeout(self.timeout.as_millis() as u64)
        } else if err.is_decode() {
            UpstreamFailure::Decode(err.without_url().to_string())
        } else {
            UpstreamFailure::Transport(err.without_url().to_string())
        }
    }
}

/// api.nasa.gov client; every call carries the service key
#[derive(Clone)]
pub struct NasaClient {
    http_client: HttpClient,
    base_url: String,
    api_key: String,
}

impl NasaClient {
    pub fn new(http_client: HttpClient, base_url: String, api_key: String) -> Self {
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub async fn fetch(&self, path: &str, query: &UpstreamQuery) -> Result<Value, UpstreamFailure> {
        let url = format!("{}{}", self.base_url, path);
        let mut pairs = query.as_pairs().to_vec();
        pairs.push(("api_key".to_string(), self.api_key.clone()));

        self.http_client
            .get_json(&url, &pairs)
            .await
            .map_err(|e| e.redacted(&self.api_key))
    }
}

/// NASA Image and Video Library search, no key required
#[derive(Clone)]
pub struct MediaLibraryClient {
    http_client: HttpClient,
    search_url: String,
}

impl MediaLibraryClient {
    pub fn new(http_client: HttpClient, search_url: String) -> Self {
        Self {
            http_client,
            search_url,
        }
    }

    pub async fn search(&self, query: &UpstreamQuery) -> Result<Value, UpstreamFailure> {
        self.http_client
            .get_json(&self.search_url, query.as_pairs())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn http(timeout_ms: u64) -> HttpClient {
        HttpClient::new(Duration::from_millis(timeout_ms)).unwrap()
    }

    #[tokio::test]
    async fn test_nasa_client_appends_key_last() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/planetary/apod"))
            .and(query_param("date", "2024-01-01"))
            .and(query_param("api_key", "k3y"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"title": "t"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = NasaClient::new(http(1_000), format!("{}/", server.uri()), "k3y".into());
        let mut query = UpstreamQuery::new();
        query.push("date", "2024-01-01");

        let body = client.fetch("/planetary/apod", &query).await.unwrap();
        assert_eq!(body["title"], "t");

        let received = server.received_requests().await.unwrap();
        assert_eq!(
            received[0].url.query(),
            Some("date=2024-01-01&api_key=k3y")
        );
    }

    #[tokio::test]
    async fn test_status_failure_prefers_upstream_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "error": {"code": "API_KEY_INVALID", "message": "An invalid api_key was supplied: k3y"}
            })))
            .mount(&server)
            .await;

        let client = NasaClient::new(http(1_000), server.uri(), "k3y".into());
        let err = client
            .fetch("/neo/rest/v1/feed", &UpstreamQuery::new())
            .await
            .unwrap_err();
        match err {
            UpstreamFailure::Status { status, ref message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "An invalid api_key was supplied: ***");
            }
            other => panic!("unexpected failure {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_status_failure_without_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let client = MediaLibraryClient::new(http(1_000), format!("{}/search", server.uri()));
        let err = client.search(&UpstreamQuery::new()).await.unwrap_err();
        assert_eq!(err.details(), "Request failed with status code 502");
    }

    #[tokio::test]
    async fn test_timeout_is_classified() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let client = NasaClient::new(http(100), server.uri(), "k3y".into());
        let err = client
            .fetch("/EPIC/api/natural", &UpstreamQuery::new())
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamFailure::Timeout(100)));
        assert_eq!(err.details(), "timeout of 100ms exceeded");
    }

    #[tokio::test]
    async fn test_transport_error_hides_url() {
        // Nothing listens on port 9 of the loopback interface
        let client = NasaClient::new(http(1_000), "http://127.0.0.1:9".into(), "k3y".into());
        let err = client
            .fetch("/planetary/apod", &UpstreamQuery::new())
            .await
            .unwrap_err();
        assert!(!err.details().contains("k3y"));
    }
}
