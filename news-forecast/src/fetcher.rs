use crate::types::{FetchConfig, ForecastError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;
use url::Url;

/// Minimal HTTP surface the news sources need. `Fetcher` is the real
/// implementation; tests substitute canned responses.
#[async_trait]
pub trait HttpFetch: Send + Sync {
    async fn get_json(&self, url: &Url, headers: &[(&str, &str)]) -> Result<serde_json::Value>;

    async fn get_text(&self, url: &Url, headers: &[(&str, &str)]) -> Result<String>;
}

/// Keeps requests to the same host at least `min_interval` apart. Each
/// caller reserves its slot under the lock and sleeps after releasing it,
/// so a wait on one host never holds up another.
#[derive(Clone)]
pub struct HostPacer {
    min_interval: Duration,
    next_slot: Arc<Mutex<HashMap<String, Instant>>>,
}

impl HostPacer {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            next_slot: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn wait_turn(&self, host: &str) {
        let now = Instant::now();
        let slot = {
            let mut next_slot = self.next_slot.lock().await;
            let slot = next_slot.get(host).map_or(now, |reserved| (*reserved).max(now));
            next_slot.insert(host.to_string(), slot + self.min_interval);
            slot
        };

        if slot > now {
            debug!("Rate limiting {}: waiting {:?}", host, slot - now);
            tokio::time::sleep_until(slot).await;
        }
    }
}

pub struct Fetcher {
    client: Client,
    pacer: HostPacer,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self {
            client,
            pacer: HostPacer::new(config.min_host_interval()),
        })
    }

    async fn send(&self, url: &Url, headers: &[(&str, &str)]) -> Result<reqwest::Response> {
        self.pacer.wait_turn(url.host_str().unwrap_or("")).await;

        let mut request = self.client.get(url.clone());
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ForecastError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl HttpFetch for Fetcher {
    async fn get_json(&self, url: &Url, headers: &[(&str, &str)]) -> Result<serde_json::Value> {
        debug!("GET json {}", url);
        let response = self.send(url, headers).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn get_text(&self, url: &Url, headers: &[(&str, &str)]) -> Result<String> {
        debug!("GET text {}", url);
        let response = self.send(url, headers).await?;
        let content = response.text().await?;
        Ok(content)
    }
}
