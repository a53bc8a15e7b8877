/// Application configuration module
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Shared public key accepted by api.nasa.gov with tighter rate limits
pub const DEMO_API_KEY: &str = "DEMO_KEY";

const DEFAULT_ALLOWED_ORIGINS: &[&str] = &[
    "http://localhost:3000",
    "http://localhost:3001",
    "http://127.0.0.1:3000",
    "http://127.0.0.1:3001",
];

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub nasa_api_url: String,
    pub nasa_api_key: String,
    pub media_search_url: String,
    pub upstream_timeout_ms: u64,
    pub allowed_origins: Vec<String>,
    pub rate_limit: RateLimitSettings,
    pub gateway: GatewaySettings,
}

#[derive(Clone, Debug)]
pub struct RateLimitSettings {
    pub max_requests: u32,
    pub window_seconds: u64,
}

/// Where the aggregator finds the gateway
#[derive(Clone, Debug)]
pub struct GatewaySettings {
    pub api_url: String,
    pub timeout_ms: u64,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let nasa_api_key = env::var("NASA_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .unwrap_or_else(|| DEMO_API_KEY.to_string());

        let port = env_parse("PORT", 5001u16);

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .map(|raw| parse_origins(&raw))
            .unwrap_or_else(|_| default_origins());

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port,
            nasa_api_url: env::var("NASA_API_URL")
                .unwrap_or_else(|_| "https://api.nasa.gov".to_string()),
            nasa_api_key,
            media_search_url: env::var("NASA_MEDIA_SEARCH_URL")
                .unwrap_or_else(|_| "https://images-api.nasa.gov/search".to_string()),
            upstream_timeout_ms: env_parse("UPSTREAM_TIMEOUT_MS", 10_000),
            allowed_origins,
            rate_limit: RateLimitSettings {
                max_requests: env_parse("RATE_LIMIT_MAX", 100u32),
                window_seconds: env_parse("RATE_LIMIT_WINDOW_SECONDS", 15 * 60),
            },
            gateway: GatewaySettings {
                api_url: env::var("GATEWAY_API_URL")
                    .unwrap_or_else(|_| "http://localhost:5001".to_string()),
                timeout_ms: env_parse("GATEWAY_TIMEOUT_MS", 30_000),
            },
        })
    }

    pub fn uses_demo_key(&self) -> bool {
        self.nasa_api_key == DEMO_API_KEY
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_millis(self.upstream_timeout_ms)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5001,
            nasa_api_url: "https://api.nasa.gov".to_string(),
            nasa_api_key: DEMO_API_KEY.to_string(),
            media_search_url: "https://images-api.nasa.gov/search".to_string(),
            upstream_timeout_ms: 10_000,
            allowed_origins: default_origins(),
            rate_limit: RateLimitSettings {
                max_requests: 100,
                window_seconds: 15 * 60,
            },
            gateway: GatewaySettings {
                api_url: "http://localhost:5001".to_string(),
                timeout_ms: 30_000,
            },
        }
    }
}

fn default_origins() -> Vec<String> {
    DEFAULT_ALLOWED_ORIGINS.iter().map(|o| o.to_string()).collect()
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

/// Unset, unparseable and out-of-range values all fall back to `default`
fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_origins_trims_and_drops_empty() {
        let origins = parse_origins(" https://a.example , ,https://b.example,");
        assert_eq!(origins, vec!["https://a.example", "https://b.example"]);
    }

    #[test]
    fn test_default_config_matches_public_defaults() {
        let config = AppConfig::default();
        assert!(config.uses_demo_key());
        assert_eq!(config.port, 5001);
        assert_eq!(config.upstream_timeout(), Duration::from_secs(10));
        assert_eq!(config.rate_limit.max_requests, 100);
        assert_eq!(config.rate_limit.window_seconds, 900);
        assert_eq!(config.allowed_origins.len(), 4);
    }

    #[test]
    fn test_env_parse_falls_back_on_garbage() {
        std::env::set_var("SPACE_EXPLORER_TEST_U64", "not-a-number");
        assert_eq!(env_parse("SPACE_EXPLORER_TEST_U64", 7u64), 7);
        std::env::remove_var("SPACE_EXPLORER_TEST_U64");
    }

    #[test]
    fn test_env_parse_rejects_out_of_range_instead_of_truncating() {
        std::env::set_var("SPACE_EXPLORER_TEST_U32", "4294967296");
        assert_eq!(env_parse("SPACE_EXPLORER_TEST_U32", 100u32), 100);
        std::env::set_var("SPACE_EXPLORER_TEST_U32", " 250 ");
        assert_eq!(env_parse("SPACE_EXPLORER_TEST_U32", 100u32), 250);
        std::env::remove_var("SPACE_EXPLORER_TEST_U32");
    }
}
