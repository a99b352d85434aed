//! 分片调度 - 编排层
//!
//! ## 两种模式
//!
//! - **串行**：第 i 个分片（i > 0）开始前等待间隔，上一个分片完全结束后才开始下一个。
//!   任何分片失败，后续分片都不再执行。
//! - **并行**：按间隔依次启动分片，启动后不等待；全部启动后统一等待所有任务。
//!   任何分片最终失败，整次运行失败，不返回部分结果。
//!
//! 两种模式下结果都按分片顺序拼接。

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use futures::future::try_join_all;
use tokio::time::sleep;
use tracing::error;

use crate::config::{PerformanceConfig, SchedulingMode};
use crate::error::GenerationError;
use crate::infrastructure::ProgressReporter;
use crate::orchestrator::batch_planner::ShardPlan;
use crate::workflow::ShardCtx;

/// 分片阶段在总进度中占用的区间
const PROGRESS_START: u8 = 40;
const PROGRESS_SPAN: usize = 50;

fn shard_progress(done: usize, total: usize) -> u8 {
    if total == 0 {
        return PROGRESS_START + PROGRESS_SPAN as u8;
    }
    PROGRESS_START + (PROGRESS_SPAN * done.min(total) / total) as u8
}

/// 分片调度器
#[derive(Debug, Clone)]
pub struct ShardScheduler {
    mode: SchedulingMode,
    delay: Duration,
}

impl ShardScheduler {
    pub fn new(performance: &PerformanceConfig) -> Self {
        Self {
            mode: performance.mode,
            delay: performance.inter_shard_delay(),
        }
    }

    /// 执行所有分片，按分片顺序合并结果
    ///
    /// `make_shard` 为每个分片创建任务；并行模式下任务会被 `tokio::spawn`，
    /// 因此必须是 `Send + 'static`。
    pub async fn run<T, F, Fut>(
        &self,
        plan: &ShardPlan,
        progress: &ProgressReporter,
        make_shard: F,
    ) -> Result<Vec<T>>
    where
        T: Send + 'static,
        F: FnMut(ShardCtx) -> Fut,
        Fut: Future<Output = Result<Vec<T>>> + Send + 'static,
    {
        match self.mode {
            SchedulingMode::Serial => self.run_serial(plan, progress, make_shard).await,
            SchedulingMode::Parallel => self.run_parallel(plan, progress, make_shard).await,
        }
    }

    async fn run_serial<T, F, Fut>(
        &self,
        plan: &ShardPlan,
        progress: &ProgressReporter,
        mut make_shard: F,
    ) -> Result<Vec<T>>
    where
        F: FnMut(ShardCtx) -> Fut,
        Fut: Future<Output = Result<Vec<T>>>,
    {
        let total = plan.len();
        let mut all = Vec::with_capacity(plan.total());

        for (i, ctx) in plan.contexts().enumerate() {
            if i > 0 && !self.delay.is_zero() {
                sleep(self.delay).await;
            }

            progress.report(
                &format!("{} 🚀 开始生成 {} 道题", ctx, ctx.count),
                shard_progress(i, total),
            );

            let items = make_shard(ctx).await.inspect_err(|e| {
                error!("{} ❌ 生成失败，终止后续分片: {:#}", ctx, e);
            })?;

            progress.report(
                &format!("{} ✓ 完成，得到 {} 道题", ctx, items.len()),
                shard_progress(i + 1, total),
            );
            all.extend(items);
        }

        Ok(all)
    }

    async fn run_parallel<T, F, Fut>(
        &self,
        plan: &ShardPlan,
        progress: &ProgressReporter,
        mut make_shard: F,
    ) -> Result<Vec<T>>
    where
        T: Send + 'static,
        F: FnMut(ShardCtx) -> Fut,
        Fut: Future<Output = Result<Vec<T>>> + Send + 'static,
    {
        let total = plan.len();
        let completed = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::with_capacity(total);

        for (i, ctx) in plan.contexts().enumerate() {
            if i > 0 && !self.delay.is_zero() {
                sleep(self.delay).await;
            }

            progress.log(&format!("{} 🚀 启动，请求 {} 道题", ctx, ctx.count));

            let shard = make_shard(ctx);
            let progress = progress.clone();
            let completed = completed.clone();

            let handle = tokio::spawn(async move {
                let items = shard.await.inspect_err(|e| {
                    error!("{} ❌ 生成失败: {:#}", ctx, e);
                })?;
                let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                let message = format!(
                    "{} ✓ 完成，得到 {} 道题 ({}/{})",
                    ctx,
                    items.len(),
                    done,
                    total
                );
                progress.report(&message, shard_progress(done, total));
                Ok::<_, anyhow::Error>(items)
            });
            handles.push((ctx, handle));
        }

        // 等待全部分片，任何一个失败都让整体失败
        let results = try_join_all(handles.into_iter().map(|(ctx, handle)| async move {
            match handle.await {
                Ok(result) => result,
                Err(join_err) => Err(GenerationError::ShardAborted {
                    shard: ctx.index,
                    reason: join_err.to_string(),
                }
                .into()),
            }
        }))
        .await?;

        Ok(results.into_iter().flatten().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::batch_planner::plan_shards;
    use std::sync::Mutex;
    use tokio::time::Instant;

    #[derive(Debug, thiserror::Error)]
    #[error("shard {0} exploded")]
    struct Exploded(usize);

    fn scheduler(mode: SchedulingMode, delay_ms: u64) -> ShardScheduler {
        ShardScheduler::new(&PerformanceConfig {
            shard_size: 2,
            inter_shard_delay_ms: delay_ms,
            mode,
        })
    }

    /// 记录同时在执行的分片数量
    #[derive(Default)]
    struct Gauge {
        current: AtomicUsize,
        peak: AtomicUsize,
        started: AtomicUsize,
    }

    impl Gauge {
        fn enter(&self) {
            self.started.fetch_add(1, Ordering::SeqCst);
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
        }

        fn leave(&self) {
            self.current.fetch_sub(1, Ordering::SeqCst);
        }
    }

    type BoxedShard = std::pin::Pin<Box<dyn Future<Output = Result<Vec<usize>>> + Send>>;

    /// 每个分片返回 `[index * 10, index * 10 + 1, ...]`，越靠前的分片耗时越长
    fn shard_task(
        gauge: Arc<Gauge>,
        fail_on: Option<usize>,
    ) -> impl FnMut(ShardCtx) -> BoxedShard {
        move |ctx: ShardCtx| -> BoxedShard {
            let gauge = gauge.clone();
            Box::pin(async move {
                gauge.enter();
                sleep(Duration::from_millis(10 * (ctx.total - ctx.index + 1) as u64)).await;
                gauge.leave();
                if fail_on == Some(ctx.index) {
                    return Err(anyhow::Error::new(Exploded(ctx.index)));
                }
                let items = (0..ctx.count).map(|i| ctx.index * 10 + i).collect::<Vec<_>>();
                Ok::<_, anyhow::Error>(items)
            })
        }
    }

    #[tokio::test]
    async fn test_serial_runs_one_at_a_time_in_order() {
        let gauge = Arc::new(Gauge::default());
        let started = Instant::now();
        let plan = plan_shards(5, 2);
        let progress = ProgressReporter::silent();
        let result = scheduler(SchedulingMode::Serial, 20)
            .run(&plan, &progress, shard_task(gauge.clone(), None))
            .await
            .unwrap();

        assert_eq!(result, vec![10, 11, 20, 21, 30]);
        assert_eq!(gauge.peak.load(Ordering::SeqCst), 1);
        // 两次分片间隔
        assert!(started.elapsed() >= Duration::from_millis(40));
    }

    #[tokio::test]
    async fn test_serial_failure_stops_later_shards() {
        let gauge = Arc::new(Gauge::default());
        let plan = plan_shards(6, 2);
        let progress = ProgressReporter::silent();
        let err = scheduler(SchedulingMode::Serial, 0)
            .run(&plan, &progress, shard_task(gauge.clone(), Some(2)))
            .await
            .unwrap_err();

        assert!(matches!(err.downcast_ref::<Exploded>(), Some(Exploded(2))));
        assert_eq!(gauge.started.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_parallel_overlaps_and_keeps_shard_order() {
        let gauge = Arc::new(Gauge::default());
        let plan = plan_shards(5, 2);
        let progress = ProgressReporter::silent();
        let result = scheduler(SchedulingMode::Parallel, 1)
            .run(&plan, &progress, shard_task(gauge.clone(), None))
            .await
            .unwrap();

        // 分片 3 最先完成，但结果仍按分片顺序排列
        assert_eq!(result, vec![10, 11, 20, 21, 30]);
        assert!(gauge.peak.load(Ordering::SeqCst) > 1);
    }

    #[tokio::test]
    async fn test_parallel_failure_fails_whole_run() {
        let gauge = Arc::new(Gauge::default());
        let plan = plan_shards(8, 2);
        let progress = ProgressReporter::silent();
        let err = scheduler(SchedulingMode::Parallel, 0)
            .run(&plan, &progress, shard_task(gauge.clone(), Some(3)))
            .await
            .unwrap_err();

        assert!(matches!(err.downcast_ref::<Exploded>(), Some(Exploded(3))));
        // 所有分片都已启动
        assert_eq!(gauge.started.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_parallel_panic_becomes_shard_aborted() {
        let plan = plan_shards(2, 1);
        let progress = ProgressReporter::silent();
        let err = scheduler(SchedulingMode::Parallel, 0)
            .run(&plan, &progress, |ctx: ShardCtx| async move {
                if ctx.index == 2 {
                    panic!("boom");
                }
                Ok::<_, anyhow::Error>(vec![ctx.index])
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<GenerationError>(),
            Some(GenerationError::ShardAborted { shard: 2, .. })
        ));
    }

    #[tokio::test]
    async fn test_progress_moves_through_shard_band() {
        for mode in [SchedulingMode::Serial, SchedulingMode::Parallel] {
            let seen = Arc::new(Mutex::new(Vec::new()));
            let sink_seen = seen.clone();
            let reporter = ProgressReporter::new(move |_, pct| sink_seen.lock().unwrap().push(pct));

            scheduler(mode, 0)
                .run(&plan_shards(4, 1), &reporter, |ctx: ShardCtx| async move {
                    Ok::<_, anyhow::Error>(vec![ctx.index])
                })
                .await
                .unwrap();

            let percents = seen.lock().unwrap();
            assert!(percents.windows(2).all(|w| w[0] <= w[1]));
            assert_eq!(*percents.last().unwrap(), 90);
        }
    }

    #[test]
    fn test_shard_progress_band() {
        assert_eq!(shard_progress(0, 4), 40);
        assert_eq!(shard_progress(2, 4), 65);
        assert_eq!(shard_progress(4, 4), 90);
        assert_eq!(shard_progress(0, 0), 90);
    }
}
