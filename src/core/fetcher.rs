use crate::domain::ports::HttpTransport;
use crate::utils::error::{Result, ScoutError};
use crate::utils::retry::{retry_if, RetryConfig};
use std::sync::Arc;
use tracing::debug;

/// 帶重試與狀態分類的 GET
///
/// 200 → 內容；404 → `NotFound` (不重試)；429/5xx/逾時/網路錯誤 → 重試後回報；
/// 其他狀態 → `UpstreamStatus`。
pub struct PageFetcher {
    transport: Arc<dyn HttpTransport>,
    retry: RetryConfig,
}

impl PageFetcher {
    pub fn new(transport: Arc<dyn HttpTransport>, retry: RetryConfig) -> Self {
        Self { transport, retry }
    }

    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    async fn fetch_once(&self, url: &str) -> Result<String> {
        let response = self.transport.get(url).await?;
        debug!("GET {} -> {}", url, response.status);
        match response.status {
            200 => Ok(response.body),
            404 => Err(ScoutError::not_found(format!("Page not found: {}", url), url)),
            status => Err(ScoutError::UpstreamStatus {
                url: url.to_string(),
                status,
            }),
        }
    }

    pub async fn get_text(&self, url: &str) -> Result<String> {
        retry_if(
            &self.retry,
            &format!("GET {}", url),
            ScoutError::is_transient,
            || self.fetch_once(url),
        )
        .await
    }

    /// 404 回傳 `Ok(None)`，供探測候選網址使用
    pub async fn probe(&self, url: &str) -> Result<Option<String>> {
        match self.get_text(url).await {
            Ok(body) => Ok(Some(body)),
            Err(ScoutError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
