//! 程序配置
//!
//! 所有组件只读取调用方构造好的 [`Config`]，不读取任何全局状态。

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::models::QuestionType;

/// 分片调度模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulingMode {
    /// 严格串行：上一片完成后才开始下一片
    #[default]
    Serial,
    /// 错峰并发：按间隔依次发起，全部发起后统一等待
    Parallel,
}

impl FromStr for SchedulingMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "serial" => Ok(SchedulingMode::Serial),
            "parallel" => Ok(SchedulingMode::Parallel),
            _ => Err(ConfigError::InvalidValue {
                key: "scheduling_mode".to_string(),
                value: s.to_string(),
                expected: "serial | parallel",
            }),
        }
    }
}

/// 性能配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    /// 每个分片最多请求的题目数
    pub shard_size: usize,
    /// 分片之间的间隔（毫秒）
    pub inter_shard_delay_ms: u64,
    /// 调度模式
    pub mode: SchedulingMode,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            shard_size: 10,
            inter_shard_delay_ms: 1000,
            mode: SchedulingMode::Serial,
        }
    }
}

impl PerformanceConfig {
    pub fn inter_shard_delay(&self) -> Duration {
        Duration::from_millis(self.inter_shard_delay_ms)
    }
}

/// 重试配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// 首次失败后最多再重试的次数
    pub max_retries: u32,
    /// 首次重试前的等待时间（毫秒），之后每次乘以 1.5
    pub initial_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 2000,
        }
    }
}

/// 补充资料检索方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// 不检索
    #[default]
    Disabled,
    /// 由模型自带的联网搜索完成
    Native,
    /// 交给外部搜索服务
    Provider,
}

impl FromStr for SearchMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "disabled" | "off" | "none" => Ok(SearchMode::Disabled),
            "native" => Ok(SearchMode::Native),
            "provider" | "external" => Ok(SearchMode::Provider),
            _ => Err(ConfigError::InvalidValue {
                key: "search_mode".to_string(),
                value: s.to_string(),
                expected: "disabled | native | provider",
            }),
        }
    }
}

/// 外部搜索服务
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    #[default]
    Tavily,
    SerpApi,
    GoogleCse,
    Brave,
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tavily" => Ok(ProviderKind::Tavily),
            "serpapi" | "serp_api" => Ok(ProviderKind::SerpApi),
            "google_cse" | "google" => Ok(ProviderKind::GoogleCse),
            "brave" => Ok(ProviderKind::Brave),
            _ => Err(ConfigError::InvalidValue {
                key: "search_provider".to_string(),
                value: s.to_string(),
                expected: "tavily | serpapi | google_cse | brave",
            }),
        }
    }
}

/// 搜索配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub mode: SearchMode,
    pub provider: ProviderKind,
    pub tavily_api_key: Option<String>,
    pub serpapi_api_key: Option<String>,
    pub google_api_key: Option<String>,
    pub google_cse_cx: Option<String>,
    pub brave_api_key: Option<String>,
    /// 单次搜索请求超时（秒）
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            mode: SearchMode::Disabled,
            provider: ProviderKind::Tavily,
            tavily_api_key: None,
            serpapi_api_key: None,
            google_api_key: None,
            google_cse_cx: None,
            brave_api_key: None,
            timeout_secs: 15,
        }
    }
}

/// 去重阈值
///
/// 这两个数字是针对中文题干调出来的经验值，换语种时需要重新调整。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    /// 两个指纹的宽度都超过该值时才启用包含/前缀判重
    pub fuzzy_min_len: usize,
    /// 前缀判重比较的字符数
    pub prefix_window: usize,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            fuzzy_min_len: 10,
            prefix_window: 15,
        }
    }
}

/// 程序配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub performance: PerformanceConfig,
    pub retry: RetryConfig,
    pub search: SearchConfig,
    pub dedup: DedupConfig,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    /// 原生联网搜索使用的模型，未设置时沿用 `llm_model_name`
    pub llm_search_model_name: Option<String>,
    pub llm_temperature: f32,
    // --- 命令行默认请求 ---
    pub question_count: usize,
    pub question_types: Vec<QuestionType>,
    pub difficulty: String,
    pub shuffle: bool,
    /// 结果输出文件，未设置时打印到标准输出
    pub output_file: Option<String>,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            performance: PerformanceConfig::default(),
            retry: RetryConfig::default(),
            search: SearchConfig::default(),
            dedup: DedupConfig::default(),
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o-mini".to_string(),
            llm_search_model_name: None,
            llm_temperature: 0.3,
            question_count: 10,
            question_types: vec![QuestionType::SingleChoice, QuestionType::TrueFalse],
            difficulty: "中等".to_string(),
            shuffle: false,
            output_file: None,
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 从环境变量加载，缺失或无法解析的项使用默认值
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            performance: PerformanceConfig {
                shard_size: env_parse("EXAM_SHARD_SIZE").unwrap_or(default.performance.shard_size),
                inter_shard_delay_ms: env_parse("EXAM_SHARD_DELAY_MS")
                    .unwrap_or(default.performance.inter_shard_delay_ms),
                mode: env_parse("EXAM_SCHEDULING_MODE").unwrap_or(default.performance.mode),
            },
            retry: RetryConfig {
                max_retries: env_parse("EXAM_MAX_RETRIES").unwrap_or(default.retry.max_retries),
                initial_delay_ms: env_parse("EXAM_RETRY_DELAY_MS")
                    .unwrap_or(default.retry.initial_delay_ms),
            },
            search: SearchConfig {
                mode: env_parse("SEARCH_MODE").unwrap_or(default.search.mode),
                provider: env_parse("SEARCH_PROVIDER").unwrap_or(default.search.provider),
                tavily_api_key: env_opt("TAVILY_API_KEY"),
                serpapi_api_key: env_opt("SERPAPI_API_KEY"),
                google_api_key: env_opt("GOOGLE_API_KEY"),
                google_cse_cx: env_opt("GOOGLE_CSE_CX"),
                brave_api_key: env_opt("BRAVE_API_KEY"),
                timeout_secs: env_parse("SEARCH_TIMEOUT_SECS")
                    .unwrap_or(default.search.timeout_secs),
            },
            dedup: DedupConfig {
                fuzzy_min_len: env_parse("DEDUP_FUZZY_MIN_LEN")
                    .unwrap_or(default.dedup.fuzzy_min_len),
                prefix_window: env_parse("DEDUP_PREFIX_WINDOW")
                    .unwrap_or(default.dedup.prefix_window),
            },
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            llm_search_model_name: env_opt("LLM_SEARCH_MODEL_NAME"),
            llm_temperature: env_parse("LLM_TEMPERATURE").unwrap_or(default.llm_temperature),
            question_count: env_parse("EXAM_QUESTION_COUNT").unwrap_or(default.question_count),
            question_types: std::env::var("EXAM_QUESTION_TYPES")
                .ok()
                .and_then(|v| QuestionType::parse_list(&v))
                .unwrap_or(default.question_types),
            difficulty: std::env::var("EXAM_DIFFICULTY").unwrap_or(default.difficulty),
            shuffle: env_parse("EXAM_SHUFFLE").unwrap_or(default.shuffle),
            output_file: env_opt("EXAM_OUTPUT_FILE"),
            verbose_logging: env_parse("VERBOSE_LOGGING").unwrap_or(default.verbose_logging),
        }
    }

    /// 从 TOML 文本加载，缺失的项使用默认值
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 从 TOML 文件加载
    pub fn from_toml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::FileUnreadable {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        Self::from_toml_str(&content)
    }

    /// 检查配置是否可用
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.performance.shard_size == 0 {
            return Err(ConfigError::ZeroShardSize);
        }
        if self.question_types.is_empty() {
            return Err(ConfigError::NoQuestionTypes);
        }
        Ok(())
    }
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.performance.shard_size, 10);
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.dedup, DedupConfig::default());
    }

    #[test]
    fn test_from_toml_partial() {
        let config = Config::from_toml_str(
            r#"
            llm_model_name = "deepseek-chat"
            question_types = ["multiple_choice", "判断题"]

            [performance]
            shard_size = 5
            mode = "parallel"

            [search]
            mode = "provider"
            provider = "brave"
            "#,
        )
        .unwrap();

        assert_eq!(config.llm_model_name, "deepseek-chat");
        assert_eq!(config.performance.shard_size, 5);
        assert_eq!(config.performance.inter_shard_delay_ms, 1000);
        assert_eq!(config.performance.mode, SchedulingMode::Parallel);
        assert_eq!(config.search.mode, SearchMode::Provider);
        assert_eq!(config.search.provider, ProviderKind::Brave);
        assert_eq!(
            config.question_types,
            vec![QuestionType::MultipleChoice, QuestionType::TrueFalse]
        );
    }

    #[test]
    fn test_zero_shard_size_rejected() {
        let err = Config::from_toml_str("[performance]\nshard_size = 0\n").unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::ZeroShardSize)
        );
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("PARALLEL".parse::<SchedulingMode>().unwrap(), SchedulingMode::Parallel);
        assert_eq!("off".parse::<SearchMode>().unwrap(), SearchMode::Disabled);
        assert_eq!("serpapi".parse::<ProviderKind>().unwrap(), ProviderKind::SerpApi);
        assert!("bing".parse::<ProviderKind>().is_err());
    }
}
