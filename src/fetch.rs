//! HTTP feed retrieval.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use lodgesync_core::sync::FeedSource;
use lodgesync_core::{EngineError, EngineResult};

const USER_AGENT: &str = concat!("lodgesync/", env!("CARGO_PKG_VERSION"));

/// Fetches feeds over HTTP with a bounded timeout. A timeout is treated
/// exactly like any other fetch failure by the orchestrator.
pub struct HttpFeedSource {
    http: Client,
    timeout_secs: u64,
}

impl HttpFeedSource {
    pub fn new(timeout_secs: u64) -> Self {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("reqwest client");
        HttpFeedSource { http, timeout_secs }
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch(&self, url: &str) -> EngineResult<String> {
        let response = self
            .http
            .get(url)
            .header(reqwest::header::ACCEPT, "text/calendar")
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    EngineError::FetchTimeout(self.timeout_secs)
                } else {
                    EngineError::Fetch(err.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(EngineError::Fetch(format!("feed returned HTTP {}", status)));
        }

        response
            .text()
            .await
            .map_err(|err| EngineError::Fetch(err.to_string()))
    }
}
