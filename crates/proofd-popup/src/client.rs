use anyhow::{Context, Result};
use proofd_core::api;
use proofd_core::config::Config;
use proofd_core::event::PurchaseEvent;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP access to the settings store and purchase event source.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: String,
}

impl ApiClient {
    pub fn new(base: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            http,
            base: base.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub async fn fetch_config(&self) -> Result<Config> {
        let url = self.url(api::PATH_SETTINGS);
        let config: Config = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("requesting {url}"))?
            .error_for_status()
            .with_context(|| format!("status from {url}"))?
            .json()
            .await
            .context("decoding settings")?;
        config.validate().context("validating settings")?;
        Ok(config)
    }

    pub async fn fetch_event(&self) -> Result<PurchaseEvent> {
        let url = self.url(api::PATH_MOCK_PURCHASE);
        self.http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("requesting {url}"))?
            .error_for_status()
            .with_context(|| format!("status from {url}"))?
            .json()
            .await
            .context("decoding purchase event")
    }
}
