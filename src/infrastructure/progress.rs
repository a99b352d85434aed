//! 进度上报
//!
//! 把调用方的 `on_log(message, percent)` 回调包装成可在并发分片间共享的句柄。

use std::sync::{Arc, Mutex};

use tracing::info;

/// 进度回调
pub type LogSink = Arc<dyn Fn(&str, u8) + Send + Sync>;

/// 进度上报器
///
/// - 百分比被限制在 `[0, 100]`
/// - 回调看到的百分比单调不减，即使多个分片任务同时上报
/// - 每条消息同时写入 tracing 日志
#[derive(Clone)]
pub struct ProgressReporter {
    sink: Option<LogSink>,
    current: Arc<Mutex<u8>>,
}

impl ProgressReporter {
    pub fn new(sink: impl Fn(&str, u8) + Send + Sync + 'static) -> Self {
        Self {
            sink: Some(Arc::new(sink)),
            current: Arc::new(Mutex::new(0)),
        }
    }

    /// 只写日志，不回调
    pub fn silent() -> Self {
        Self {
            sink: None,
            current: Arc::new(Mutex::new(0)),
        }
    }

    /// 上报一条消息并推进进度
    pub fn report(&self, message: &str, percent: u8) {
        // 持锁期间调用回调，保证回调观察到的顺序与百分比顺序一致
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current = (*current).max(percent.min(100));
        info!("[{:>3}%] {}", *current, message);
        if let Some(sink) = &self.sink {
            sink(message, *current);
        }
    }

    /// 上报一条消息，进度保持不变
    pub fn log(&self, message: &str) {
        self.report(message, 0);
    }

    pub fn current(&self) -> u8 {
        *self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::silent()
    }
}

impl std::fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("has_sink", &self.sink.is_some())
            .field("current", &self.current())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording() -> (ProgressReporter, Arc<Mutex<Vec<(String, u8)>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = seen.clone();
        let reporter = ProgressReporter::new(move |msg, pct| {
            sink_seen.lock().unwrap().push((msg.to_string(), pct));
        });
        (reporter, seen)
    }

    #[test]
    fn test_progress_never_goes_backwards() {
        let (reporter, seen) = recording();
        reporter.report("a", 40);
        reporter.report("b", 20);
        reporter.log("c");
        reporter.report("d", 150);

        let percents: Vec<u8> = seen.lock().unwrap().iter().map(|(_, p)| *p).collect();
        assert_eq!(percents, vec![40, 40, 40, 100]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_reports_stay_monotonic() {
        let (reporter, seen) = recording();
        let mut handles = Vec::new();
        for i in 0..50u8 {
            let reporter = reporter.clone();
            handles.push(tokio::spawn(async move {
                reporter.report("tick", i * 2);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let percents: Vec<u8> = seen.lock().unwrap().iter().map(|(_, p)| *p).collect();
        assert_eq!(percents.len(), 50);
        assert!(percents.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(reporter.current(), 98);
    }
}
