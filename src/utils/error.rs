use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScoutError {
    #[error("Commander name is required")]
    NameRequired,

    #[error("Bracket is required")]
    BracketRequired,

    #[error("Bracket '{bracket}' is not supported")]
    BracketUnsupported {
        bracket: String,
        allowed: Vec<String>,
    },

    #[error("Bracket '{bracket}' not found for '{name}'")]
    BracketUnavailable {
        name: String,
        bracket: String,
        available: Vec<String>,
        commander_url: String,
    },

    #[error("{message}")]
    NotFound {
        message: String,
        url: String,
        hints: Vec<String>,
    },

    #[error("Timeout fetching {url}")]
    Timeout { url: String },

    #[error("Network error talking to {url}: {message}")]
    Network { url: String, message: String },

    #[error("Unexpected HTTP status {status} from {url}")]
    UpstreamStatus { url: String, status: u16 },

    #[error("{message}")]
    Parsing {
        message: String,
        url: String,
        details: Option<String>,
    },

    #[error("Unrecognized color identity: {value}")]
    IdentityUnsupported { value: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfig { field: String },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// 呼叫端輸入錯誤 (400 類)
    Input,
    /// 上游頁面不存在或該 bracket 無資料
    Lookup,
    /// 網路或暫時性錯誤
    Network,
    /// 上游頁面結構改變，服務降級
    Degraded,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

/// 回應中 `error` 欄位的結構
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ScoutError {
    pub fn parsing(message: impl Into<String>, url: impl Into<String>, details: Option<String>) -> Self {
        ScoutError::Parsing {
            message: message.into(),
            url: url.into(),
            details,
        }
    }

    pub fn not_found(message: impl Into<String>, url: impl Into<String>) -> Self {
        ScoutError::NotFound {
            message: message.into(),
            url: url.into(),
            hints: Vec::new(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ScoutError::NameRequired
            | ScoutError::BracketRequired
            | ScoutError::BracketUnsupported { .. }
            | ScoutError::IdentityUnsupported { .. } => ErrorCategory::Input,
            ScoutError::BracketUnavailable { .. } | ScoutError::NotFound { .. } => {
                ErrorCategory::Lookup
            }
            ScoutError::Timeout { .. }
            | ScoutError::Network { .. }
            | ScoutError::UpstreamStatus { .. }
            | ScoutError::HttpClient(_) => ErrorCategory::Network,
            ScoutError::Parsing { .. } | ScoutError::SerializationError(_) => {
                ErrorCategory::Degraded
            }
            ScoutError::ConfigError { .. }
            | ScoutError::InvalidConfigValue { .. }
            | ScoutError::MissingConfig { .. } => ErrorCategory::Configuration,
            ScoutError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input | ErrorCategory::Lookup => ErrorSeverity::Low,
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Degraded | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 是否值得重試 (逾時、網路錯誤、429 或 5xx)
    pub fn is_transient(&self) -> bool {
        match self {
            ScoutError::Timeout { .. } | ScoutError::Network { .. } => true,
            ScoutError::UpstreamStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            ScoutError::BracketUnavailable { commander_url, .. } => Some(commander_url),
            ScoutError::NotFound { url, .. }
            | ScoutError::Timeout { url }
            | ScoutError::Network { url, .. }
            | ScoutError::UpstreamStatus { url, .. }
            | ScoutError::Parsing { url, .. } => Some(url),
            _ => None,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            ScoutError::NameRequired => "Pass a commander name, e.g. --name \"Jodah, the Unifier\"".to_string(),
            ScoutError::BracketRequired => "Pass a bracket such as 'upgraded' or 'all'".to_string(),
            ScoutError::BracketUnsupported { allowed, .. } => {
                format!("Use one of: {}", allowed.join(", "))
            }
            ScoutError::BracketUnavailable { available, .. } => {
                format!("Available brackets for this commander: {}", available.join(", "))
            }
            ScoutError::NotFound { hints, .. } if !hints.is_empty() => hints.join("; "),
            ScoutError::NotFound { .. } => "Check the commander name spelling".to_string(),
            ScoutError::Timeout { .. } | ScoutError::Network { .. } | ScoutError::HttpClient(_) => {
                "Check network connectivity or raise --timeout-seconds".to_string()
            }
            ScoutError::UpstreamStatus { .. } => "The upstream site rejected the request; try again later".to_string(),
            ScoutError::Parsing { .. } | ScoutError::SerializationError(_) => {
                "The upstream page layout may have changed; the parser heuristics need review".to_string()
            }
            ScoutError::IdentityUnsupported { .. } => {
                "Use WUBRG letters (e.g. 'wur'), a guild/shard name or a slug like 'mono-green'".to_string()
            }
            ScoutError::ConfigError { .. }
            | ScoutError::InvalidConfigValue { .. }
            | ScoutError::MissingConfig { .. } => "Review the configuration file and CLI flags".to_string(),
            ScoutError::IoError(_) => "Check file permissions and paths".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Input => format!("輸入錯誤: {}", self),
            ErrorCategory::Lookup => format!("找不到資料: {}", self),
            ErrorCategory::Network => format!("網路錯誤: {}", self),
            ErrorCategory::Degraded => format!("上游頁面解析失敗: {}", self),
            ErrorCategory::Configuration => format!("配置錯誤: {}", self),
            ErrorCategory::System => format!("系統錯誤: {}", self),
        }
    }

    pub fn to_payload(&self) -> ErrorPayload {
        let details = match self {
            ScoutError::BracketUnsupported { allowed, .. } => {
                Some(serde_json::json!({ "allowed_brackets": allowed }))
            }
            ScoutError::BracketUnavailable { available, .. } => {
                Some(serde_json::json!({ "available_brackets": available }))
            }
            ScoutError::NotFound { hints, .. } if !hints.is_empty() => {
                Some(serde_json::json!({ "hints": hints }))
            }
            ScoutError::Parsing {
                details: Some(details),
                ..
            } => Some(serde_json::Value::String(details.clone())),
            _ => None,
        };

        ErrorPayload {
            message: self.to_string(),
            url: self.url().map(str::to_string),
            details,
        }
    }
}

pub type Result<T> = std::result::Result<T, ScoutError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        let timeout = ScoutError::Timeout { url: "u".into() };
        let server = ScoutError::UpstreamStatus { url: "u".into(), status: 503 };
        let throttled = ScoutError::UpstreamStatus { url: "u".into(), status: 429 };
        let forbidden = ScoutError::UpstreamStatus { url: "u".into(), status: 403 };

        assert!(timeout.is_transient());
        assert!(server.is_transient());
        assert!(throttled.is_transient());
        assert!(!forbidden.is_transient());
        assert!(!ScoutError::not_found("missing", "u").is_transient());
    }

    #[test]
    fn test_parsing_is_degraded_not_lookup() {
        let err = ScoutError::parsing("Missing __NEXT_DATA__ payload", "https://x", None);
        assert_eq!(err.category(), ErrorCategory::Degraded);
        assert_eq!(ScoutError::not_found("gone", "https://x").category(), ErrorCategory::Lookup);
    }

    #[test]
    fn test_payload_carries_allow_list() {
        let err = ScoutError::BracketUnsupported {
            bracket: "nonexistent".into(),
            allowed: vec!["all".into(), "upgraded".into()],
        };
        let payload = err.to_payload();
        assert_eq!(payload.message, "Bracket 'nonexistent' is not supported");
        assert!(payload.url.is_none());
        assert_eq!(
            payload.details.unwrap()["allowed_brackets"],
            serde_json::json!(["all", "upgraded"])
        );
    }
}
