//! 带指数退避的重试执行器 - 基础设施层
//!
//! 不关心被包装的操作做什么，补充资料检索和每个分片的出题调用都复用它。

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::warn;

use crate::config::RetryConfig;
use crate::error::RetryExhausted;
use crate::infrastructure::ProgressReporter;

/// 每次重试后等待时间的放大倍数
const BACKOFF_FACTOR: f64 = 1.5;

/// 重试执行器
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    max_retries: u32,
    initial_delay: Duration,
}

impl RetryExecutor {
    pub fn new(max_retries: u32, initial_delay: Duration) -> Self {
        Self {
            max_retries,
            initial_delay,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.max_retries,
            Duration::from_millis(config.initial_delay_ms),
        )
    }

    /// 执行操作，失败时按退避策略重试
    ///
    /// 操作最多被调用 `max_retries + 1` 次；全部失败时返回 [`RetryExhausted`]，
    /// 其中保存最后一次的原始错误。
    pub async fn execute<T, E, F, Fut>(
        &self,
        label: &str,
        progress: Option<&ProgressReporter>,
        mut operation: F,
    ) -> Result<T, RetryExhausted<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let mut remaining = self.max_retries;
        let mut delay = self.initial_delay;
        let mut attempt = 1u32;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if remaining > 0 => {
                    let message = format!(
                        "⚠️ {} 第 {} 次尝试失败: {}，{}ms 后重试...",
                        label,
                        attempt,
                        err,
                        delay.as_millis()
                    );
                    match progress {
                        Some(reporter) => reporter.log(&message),
                        None => warn!("{}", message),
                    }

                    sleep(delay).await;
                    delay = delay.mul_f64(BACKOFF_FACTOR);
                    remaining -= 1;
                    attempt += 1;
                }
                Err(err) => {
                    return Err(RetryExhausted {
                        label: label.to_string(),
                        attempts: attempt,
                        source: err,
                    })
                }
            }
        }
    }
}

impl Default for RetryExecutor {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;
    use tokio_test::{assert_err, assert_ok};

    #[derive(Debug, PartialEq)]
    struct Boom(u32);

    impl Display for Boom {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "boom #{}", self.0)
        }
    }

    #[tokio::test]
    async fn test_always_failing_operation_runs_four_times() {
        let executor = RetryExecutor::new(3, Duration::from_millis(1));
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = executor
            .execute("always-fail", None, || async {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                Err(Boom(n))
            })
            .await;

        let exhausted = assert_err!(result);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(exhausted.attempts, 4);
        assert_eq!(exhausted.label, "always-fail");
        // 返回的是最后一次的原始错误，没有被改写
        assert_eq!(exhausted.into_source(), Boom(4));
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let executor = RetryExecutor::new(3, Duration::from_millis(1));
        let calls = AtomicU32::new(0);

        let result = executor
            .execute("flaky", None, || async {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    Err(Boom(n))
                } else {
                    Ok("ok")
                }
            })
            .await;

        assert_eq!(assert_ok!(result), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_zero_retries_calls_once() {
        let executor = RetryExecutor::new(0, Duration::from_millis(1));
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = executor
            .execute("once", None, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Boom(0))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_backoff_uses_wall_clock_and_logs_each_retry() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = seen.clone();
        let reporter = ProgressReporter::new(move |msg, _| {
            sink_seen.lock().unwrap().push(msg.to_string());
        });
        let executor = RetryExecutor::new(2, Duration::from_millis(20));

        let started = Instant::now();
        let result: Result<(), _> = executor
            .execute("slow", Some(&reporter), || async { Err(Boom(1)) })
            .await;

        assert!(result.is_err());
        // 20ms + 30ms
        assert!(started.elapsed() >= Duration::from_millis(50));

        let logs = seen.lock().unwrap();
        assert_eq!(logs.len(), 2);
        assert!(logs[0].contains("slow 第 1 次尝试失败"));
        assert!(logs[1].contains("slow 第 2 次尝试失败"));
    }
}
