use crate::domain::ports::{ConfigProvider, HttpResponse, HttpTransport};
use crate::utils::error::{Result, ScoutError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Client;
use std::time::Duration;

pub const ACCEPT_HEADER: &str = "text/html,application/xhtml+xml,application/json;q=0.9,*/*;q=0.8";

/// reqwest 實作的 `HttpTransport`；狀態碼原樣交給 `PageFetcher` 分類
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HEADER));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent).map_err(|e| ScoutError::InvalidConfigValue {
                field: "user_agent".to_string(),
                value: user_agent.to_string(),
                reason: e.to_string(),
            })?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }

    pub fn from_config(config: &dyn ConfigProvider) -> Result<Self> {
        Self::new(config.user_agent(), config.request_timeout())
    }
}

fn classify(url: &str, error: reqwest::Error) -> ScoutError {
    if error.is_timeout() {
        ScoutError::Timeout {
            url: url.to_string(),
        }
    } else {
        ScoutError::Network {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify(url, e))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| classify(url, e))?;
        Ok(HttpResponse { status, body })
    }
}
