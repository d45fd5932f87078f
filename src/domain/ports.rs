use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// 單次 GET 的原始結果，狀態碼由呼叫端分類
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// 對外 HTTP 協作者：`fetch(url) -> (status, body)`
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse>;
}

pub trait ConfigProvider: Send + Sync {
    fn base_url(&self) -> &str;
    fn user_agent(&self) -> &str;
    fn request_timeout(&self) -> Duration;
    fn retry_attempts(&self) -> u32;
    fn retry_initial_delay(&self) -> Duration;
    fn cache_ttl(&self) -> Duration;
    fn concurrent_requests(&self) -> usize;
}

/// 卡名的外部識別碼查詢 (例如 Scryfall id)；失敗只會讓該欄位為空
#[async_trait]
pub trait CardEnricher: Send + Sync {
    async fn lookup(&self, card_name: &str) -> Result<Option<String>>;
}
