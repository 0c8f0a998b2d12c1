/// Application configuration module
use std::env;

pub const DEFAULT_LAUNCH_API_URL: &str = "https://lldev.thespacedevs.com/2.2.0";
pub const DEFAULT_PREFERENCES_KEY: &str = "space-launches-filters";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub launch_api_url: String,
    pub bind_addr: String,
    pub preferences_key: String,
    pub http: HttpSettings,
}

#[derive(Clone, Debug)]
pub struct HttpSettings {
    pub timeout_seconds: u64,
    pub user_agent: String,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Ok(Self::from_lookup(|key| env::var(key).ok()))
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let database_url = lookup("DATABASE_URL").filter(|s| !s.trim().is_empty());

        let launch_api_url = lookup("LAUNCH_API_URL")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_LAUNCH_API_URL.to_string());

        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string());

        let preferences_key =
            lookup("PREFERENCES_KEY").unwrap_or_else(|| DEFAULT_PREFERENCES_KEY.to_string());

        let http = HttpSettings {
            timeout_seconds: parse_u64(lookup("HTTP_TIMEOUT_SECONDS"), 30),
            user_agent: lookup("HTTP_USER_AGENT")
                .unwrap_or_else(|| "launch-tracker/1.0".to_string()),
        };

        Self {
            database_url,
            launch_api_url,
            bind_addr,
            preferences_key,
            http,
        }
    }
}

fn parse_u64(value: Option<String>, default: u64) -> u64 {
    value.and_then(|s| s.parse().ok()).unwrap_or(default)
}
