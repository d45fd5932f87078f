use crate::core::site::{DEFAULT_BASE_URL, DEFAULT_USER_AGENT};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{Result, ScoutError};
use crate::utils::retry::MAX_RETRY_ATTEMPTS;
use crate::utils::validation::{
    validate_non_empty_string, validate_positive_number, validate_range, validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub source: SourceConfig,
    pub cache: Option<CacheConfig>,
    pub hydration: Option<HydrationConfig>,
    #[serde(default)]
    pub lookups: Vec<LookupSpec>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    pub base_url: Option<String>,
    pub user_agent: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub retry_attempts: Option<u32>,
    pub retry_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub ttl_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HydrationConfig {
    pub concurrent_requests: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupKind {
    Summary,
    Theme,
    TagIndex,
}

/// `[[lookups]]` 中的一筆查詢
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupSpec {
    pub kind: LookupKind,
    /// 指揮官名稱 (summary；theme 時代表指揮官專屬主題頁)
    pub name: Option<String>,
    pub budget: Option<String>,
    pub tag: Option<String>,
    pub identity: Option<String>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ScoutError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${EDHREC_BASE_URL})；未設定的保留原文
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ScoutError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    fn validate_lookup(index: usize, lookup: &LookupSpec) -> Result<()> {
        let missing = |field: &str| ScoutError::MissingConfig {
            field: format!("lookups[{}].{}", index, field),
        };
        match lookup.kind {
            LookupKind::Summary if lookup.name.is_none() => Err(missing("name")),
            LookupKind::Theme if lookup.tag.is_none() => Err(missing("tag")),
            _ => Ok(()),
        }
    }
}

impl ConfigProvider for TomlConfig {
    fn base_url(&self) -> &str {
        self.source.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    fn user_agent(&self) -> &str {
        self.source.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT)
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.source.timeout_seconds.unwrap_or(12))
    }

    fn retry_attempts(&self) -> u32 {
        self.source.retry_attempts.unwrap_or(2)
    }

    fn retry_initial_delay(&self) -> Duration {
        Duration::from_millis(self.source.retry_delay_ms.unwrap_or(300))
    }

    fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.as_ref().map(|c| c.ttl_seconds).unwrap_or(900))
    }

    fn concurrent_requests(&self) -> usize {
        self.hydration.as_ref().map(|h| h.concurrent_requests).unwrap_or(5)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validate_url("source.base_url", self.base_url())?;
        validate_non_empty_string("source.user_agent", self.user_agent())?;
        validate_positive_number("source.timeout_seconds", self.request_timeout().as_secs(), 1)?;
        validate_range("source.retry_attempts", self.retry_attempts(), 1, MAX_RETRY_ATTEMPTS)?;
        validate_positive_number("hydration.concurrent_requests", self.concurrent_requests() as u64, 1)?;

        for (index, lookup) in self.lookups.iter().enumerate() {
            Self::validate_lookup(index, lookup)?;
        }
        Ok(())
    }
}
