use crate::core::site::{DEFAULT_BASE_URL, DEFAULT_USER_AGENT};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::retry::MAX_RETRY_ATTEMPTS;
use crate::utils::validation::{
    validate_non_empty_string, validate_positive_number, validate_range, validate_url, Validate,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const RETRY_INITIAL_DELAY: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "edhrec-scout")]
#[command(about = "Resolve a commander's average deck, tags and card sections")]
pub struct CliConfig {
    #[arg(long, help = "Commander name, e.g. \"Jodah, the Unifier\"")]
    pub name: String,

    #[arg(long, default_value = "upgraded")]
    pub bracket: String,

    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    #[arg(long, default_value = "12")]
    pub timeout_seconds: u64,

    #[arg(long, default_value = "2", help = "Additional tries after the first request")]
    pub retry_attempts: u32,

    #[arg(long, default_value = "900")]
    pub cache_ttl_seconds: u64,

    #[arg(long, default_value = "5")]
    pub concurrent_requests: usize,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,
}

impl ConfigProvider for CliConfig {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn user_agent(&self) -> &str {
        &self.user_agent
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    fn retry_attempts(&self) -> u32 {
        self.retry_attempts
    }

    fn retry_initial_delay(&self) -> Duration {
        RETRY_INITIAL_DELAY
    }

    fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }

    fn concurrent_requests(&self) -> usize {
        self.concurrent_requests
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_url("base_url", &self.base_url)?;
        validate_non_empty_string("user_agent", &self.user_agent)?;
        validate_positive_number("timeout_seconds", self.timeout_seconds, 1)?;
        validate_range("retry_attempts", self.retry_attempts, 1, MAX_RETRY_ATTEMPTS)?;
        validate_positive_number("concurrent_requests", self.concurrent_requests as u64, 1)?;
        Ok(())
    }
}
