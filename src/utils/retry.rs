//! 有上限的指數退避重試

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// 第一次之後最多重試幾次 (總共 2 到 4 次請求)
pub const MAX_RETRY_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// 第一次嘗試之後的額外重試次數
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_millis(300),
            max_delay: Duration::from_secs(2),
            multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    pub fn new(max_retries: u32, initial_delay: Duration) -> Self {
        Self {
            max_retries,
            initial_delay,
            ..Self::default()
        }
    }

    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay_ms = self.initial_delay.as_millis() as f64 * self.multiplier.powi(attempt as i32);
        Duration::from_millis(delay_ms as u64).min(self.max_delay)
    }
}

/// 只在 `should_retry` 回傳 true 時重試，其餘錯誤立即回傳
pub async fn retry_if<T, E, F, Fut, P>(
    config: &RetryConfig,
    operation_name: &str,
    should_retry: P,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    debug!("{} succeeded after {} retries", operation_name, attempt);
                }
                return Ok(result);
            }
            Err(e) if attempt < config.max_retries && should_retry(&e) => {
                let delay = config.delay_for_attempt(attempt);
                warn!(
                    "{} failed (attempt {}/{}): {}. Retrying in {:?}...",
                    operation_name,
                    attempt + 1,
                    config.max_retries + 1,
                    e,
                    delay
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast_config(max_retries: u32) -> RetryConfig {
        RetryConfig {
            max_retries,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            multiplier: 2.0,
        }
    }

    #[tokio::test]
    async fn test_retry_success_after_transient_failures() {
        let counter = Arc::new(AtomicU32::new(0));
        let c = counter.clone();

        let result: Result<i32, &str> = retry_if(&fast_config(3), "test", |_| true, || {
            let c = c.clone();
            async move {
                if c.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err("temporary failure")
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_budget_exhausted() {
        let counter = Arc::new(AtomicU32::new(0));
        let c = counter.clone();

        let result: Result<i32, &str> = retry_if(&fast_config(2), "test", |_| true, || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err("permanent failure")
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 3); // 初次 + 2 次重試
    }

    #[tokio::test]
    async fn test_non_retryable_error_returns_immediately() {
        let counter = Arc::new(AtomicU32::new(0));
        let c = counter.clone();

        let result: Result<i32, &str> = retry_if(&fast_config(3), "test", |e| *e != "not found", || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err("not found")
            }
        })
        .await;

        assert_eq!(result.unwrap_err(), "not found");
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_delay_is_capped() {
        let config = RetryConfig {
            max_retries: 10,
            initial_delay: Duration::from_millis(300),
            max_delay: Duration::from_secs(2),
            multiplier: 2.0,
        };

        assert_eq!(config.delay_for_attempt(0), Duration::from_millis(300));
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(600));
        assert_eq!(config.delay_for_attempt(2), Duration::from_millis(1200));
        assert_eq!(config.delay_for_attempt(5), Duration::from_secs(2));
    }
}
