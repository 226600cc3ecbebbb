use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    // Directory API
    pub api_base_url: String,
    pub http_timeout_secs: u64,

    // Refresh / cache cadence
    pub server_refresh_secs: u64,
    pub mod_cache_ttl_secs: u64,

    // View defaults
    pub default_page_size: usize,

    // Links
    pub mod_detail_base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080".to_string(),
            http_timeout_secs: 30,
            server_refresh_secs: 15 * 60,
            mod_cache_ttl_secs: 60 * 60,
            default_page_size: 20,
            mod_detail_base_url: "https://mods.example.at".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_base_url: env::var("DIRECTORY_API_URL")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.api_base_url),

            http_timeout_secs: env::var("HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.http_timeout_secs),

            server_refresh_secs: env::var("SERVER_REFRESH_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v: &u64| *v > 0)
                .unwrap_or(defaults.server_refresh_secs),

            mod_cache_ttl_secs: env::var("MOD_CACHE_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.mod_cache_ttl_secs),

            default_page_size: env::var("DEFAULT_PAGE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v: &usize| *v > 0)
                .unwrap_or(defaults.default_page_size),

            mod_detail_base_url: env::var("MOD_DETAIL_BASE_URL")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.mod_detail_base_url),
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.server_refresh_secs)
    }

    pub fn mod_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.mod_cache_ttl_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}
