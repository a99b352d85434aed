use crate::config::{Config, PerformanceConfig};
use crate::error::ConfigError;
use crate::models::{Material, QuestionType};

/// 一次出题请求
///
/// 请求在整个运行期间只读。
#[derive(Debug, Clone)]
pub struct ExamGenerationRequest {
    pub materials: Vec<Material>,
    /// 期望的题目总数
    pub count: usize,
    /// 允许的题型
    pub allowed_types: Vec<QuestionType>,
    /// 难度描述，原样写入提示词
    pub difficulty: String,
    /// 是否打乱最终题目顺序
    pub shuffle: bool,
    pub performance: PerformanceConfig,
}

impl ExamGenerationRequest {
    /// 使用配置中的默认题量、题型、难度构造请求
    pub fn from_config(materials: Vec<Material>, config: &Config) -> Self {
        Self {
            materials,
            count: config.question_count,
            allowed_types: config.question_types.clone(),
            difficulty: config.difficulty.clone(),
            shuffle: config.shuffle,
            performance: config.performance.clone(),
        }
    }

    /// 检查请求是否可以执行
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.allowed_types.is_empty() {
            return Err(ConfigError::NoQuestionTypes);
        }
        if self.performance.shard_size == 0 {
            return Err(ConfigError::ZeroShardSize);
        }
        Ok(())
    }
}
