//! 出题总流程 - 编排层
//!
//! ## 职责
//!
//! 本模块是出题功能的入口，把各层能力串成一次完整运行。
//!
//! ## 核心流程
//!
//! 1. **校验请求**：题型不能为空，分片大小必须大于 0
//! 2. **补充资料**：只运行一次，结果被所有分片只读共享
//! 3. **分片规划与调度**：串行或错峰并行执行分片
//! 4. **清洗与去重**：去掉题号前缀后按指纹去重
//! 5. **打乱顺序**（可选）
//!
//! 进度区间：0-5 启动，10-35 补充资料，40-90 分片，92 清洗去重，100 完成。

use std::sync::Arc;

use anyhow::Result;
use rand::seq::SliceRandom;
use tracing::info;

use crate::clients::{build_provider, GenerativeBackend, OpenAiBackend, SearchProvider};
use crate::config::{Config, SearchMode};
use crate::infrastructure::{ProgressReporter, RetryExecutor};
use crate::models::{DocumentPart, ExamGenerationRequest, Material, Question};
use crate::orchestrator::batch_planner::plan_shards;
use crate::orchestrator::shard_scheduler::ShardScheduler;
use crate::services::{clean, deduplicate, ContextEnricher};
use crate::utils::logging::truncate_text;
use crate::workflow::{GenerationContext, ShardGenerator};

/// 出题器
pub struct ExamGenerator {
    backend: Arc<dyn GenerativeBackend>,
    provider: Option<Arc<dyn SearchProvider>>,
    config: Config,
}

impl ExamGenerator {
    /// 按配置创建 OpenAI 兼容后端和外部搜索服务
    pub fn new(config: Config) -> Self {
        let backend: Arc<dyn GenerativeBackend> = Arc::new(OpenAiBackend::new(&config));
        let provider =
            (config.search.mode == SearchMode::Provider).then(|| build_provider(&config.search));
        Self {
            backend,
            provider,
            config,
        }
    }

    /// 使用自定义后端（不创建外部搜索服务）
    pub fn with_backend(backend: Arc<dyn GenerativeBackend>, config: Config) -> Self {
        Self {
            backend,
            provider: None,
            config,
        }
    }

    pub fn with_provider(mut self, provider: Arc<dyn SearchProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 以回调形式接收进度，`on_log(message, percent)`
    pub async fn generate_with_log(
        &self,
        request: &ExamGenerationRequest,
        on_log: impl Fn(&str, u8) + Send + Sync + 'static,
    ) -> Result<Vec<Question>> {
        self.generate(request, &ProgressReporter::new(on_log)).await
    }

    /// 执行一次完整的出题
    ///
    /// 返回去重（并按需打乱）后的题目；任何分片的致命错误都原样返回，不返回部分结果。
    pub async fn generate(
        &self,
        request: &ExamGenerationRequest,
        progress: &ProgressReporter,
    ) -> Result<Vec<Question>> {
        request.validate()?;

        if request.count == 0 {
            progress.report("题目数量为 0，无需生成", 100);
            return Ok(Vec::new());
        }

        progress.report(
            &format!(
                "🚀 开始出题: 共 {} 道，{} 份资料，题型 {}",
                request.count,
                request.materials.len(),
                type_names(request)
            ),
            0,
        );

        let parts: Vec<DocumentPart> = request.materials.iter().map(Material::to_part).collect();
        progress.report("✓ 资料准备完成", 5);

        let retry = RetryExecutor::from_config(&self.config.retry);

        // ========== 补充资料 ==========
        let mut enricher =
            ContextEnricher::new(self.backend.clone(), self.config.search.mode, retry.clone());
        if let Some(provider) = &self.provider {
            enricher = enricher.with_provider(provider.clone());
        }
        let enrichment = enricher
            .enrich(&parts, &request.allowed_types, progress)
            .await;

        // ========== 分片生成 ==========
        let plan = plan_shards(request.count, request.performance.shard_size);
        progress.report(
            &format!(
                "📦 共 {} 个分片 {:?}，{:?} 模式",
                plan.len(),
                plan.sizes(),
                request.performance.mode
            ),
            40,
        );

        let input = Arc::new(GenerationContext {
            parts,
            allowed_types: request.allowed_types.clone(),
            difficulty: request.difficulty.clone(),
            enrichment,
        });
        let generator = ShardGenerator::new(self.backend.clone(), retry);
        let scheduler = ShardScheduler::new(&request.performance);

        let questions = scheduler
            .run(&plan, progress, |ctx| {
                let generator = generator.clone();
                let input = input.clone();
                let progress = progress.clone();
                async move { generator.generate(&input, ctx, &progress).await }
            })
            .await?;

        // ========== 清洗与去重 ==========
        let generated = questions.len();
        let cleaned: Vec<Question> = questions
            .into_iter()
            .map(|mut q| {
                q.question_text = clean(&q.question_text);
                q
            })
            .collect();
        let (mut questions, stats) = deduplicate(cleaned, &self.config.dedup);
        progress.report(
            &format!(
                "🧹 清洗去重: 生成 {} 道，保留 {} 道，重复 {} 道，空题 {} 道",
                generated, stats.kept, stats.duplicates, stats.empty
            ),
            92,
        );

        if self.config.verbose_logging {
            for (i, q) in questions.iter().enumerate() {
                info!("  {}. [{}] {}", i + 1, q.question_type, truncate_text(&q.question_text, 40));
            }
        }

        if request.shuffle {
            questions.shuffle(&mut rand::thread_rng());
        }

        progress.report(&format!("✅ 出题完成，共 {} 道题", questions.len()), 100);
        Ok(questions)
    }
}

fn type_names(request: &ExamGenerationRequest) -> String {
    request
        .allowed_types
        .iter()
        .map(|t| t.label())
        .collect::<Vec<_>>()
        .join("、")
}
