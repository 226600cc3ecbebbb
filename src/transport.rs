// src/transport.rs
use async_trait::async_trait;
use log::debug;
use serde_json::Value;

use crate::config::Config;
use crate::error::{FetchError, Result};

pub const SERVER_LIST_PATH: &str = "/s/servers/list";
pub const MOD_CATALOG_PATH: &str = "/m/mods";

/// Path of a single mod's metadata. The id becomes one percent-encoded path
/// segment; a literal `+` is already `%2B`, so form-encoded spaces can be
/// rewritten to `%20`.
pub fn mod_path(id: &str) -> String {
    let escaped = url::form_urlencoded::byte_serialize(id.as_bytes())
        .collect::<String>()
        .replace('+', "%20");
    format!("/m/mod/{}", escaped)
}

/// Request/response surface of the directory API.
///
/// Implementations return the parsed JSON body or fail; envelope checks are
/// left to the caller.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get_json(&self, path: &str) -> Result<Value>;
}

pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .build()?;
        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_json(&self, path: &str) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}
