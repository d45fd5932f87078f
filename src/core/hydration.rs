use futures::stream::{self, StreamExt};
use std::future::Future;

/// 每個項目一個 future，最多 `concurrency` 個同時執行；輸出順序與輸入相同
pub async fn hydrate_in_order<I, T, F, Fut, R>(items: I, concurrency: usize, f: F) -> Vec<R>
where
    I: IntoIterator<Item = T>,
    F: FnMut(T) -> Fut,
    Fut: Future<Output = R>,
{
    stream::iter(items)
        .map(f)
        .buffered(concurrency.max(1))
        .collect()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_output_keeps_input_order() {
        // 前面的項目睡比較久，完成順序與輸入相反
        let delays = vec![40u64, 30, 20, 10, 0];
        let results = hydrate_in_order(delays.clone(), 5, |delay| async move {
            tokio::time::sleep(Duration::from_millis(delay)).await;
            delay * 2
        })
        .await;

        assert_eq!(results, vec![80, 60, 40, 20, 0]);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let results = hydrate_in_order(0..12, 3, |i| {
            let in_flight = in_flight.clone();
            let peak = peak.clone();
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                i
            }
        })
        .await;

        assert_eq!(results, (0..12).collect::<Vec<_>>());
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_zero_concurrency_still_runs() {
        let results = hydrate_in_order(vec!["a", "b"], 0, |s| async move { s.to_uppercase() }).await;
        assert_eq!(results, vec!["A", "B"]);
    }
}
