use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use exam_question_gen::models::load_materials;
use exam_question_gen::utils::logging;
use exam_question_gen::{Config, ExamGenerationRequest, ExamGenerator};
use tracing::{info, warn};

/// 进度日志文件
const PROGRESS_LOG_FILE: &str = "exam_progress.log";

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = load_config()?;

    // 初始化日志
    logging::init(config.verbose_logging);

    let paths: Vec<PathBuf> = std::env::args().skip(1).map(PathBuf::from).collect();
    if paths.is_empty() {
        bail!("用法: exam_question_gen <资料文件>...");
    }

    logging::log_startup(&config, paths.len());

    info!("\n📁 正在加载资料...");
    let materials = load_materials(&paths).await?;

    logging::init_log_file(PROGRESS_LOG_FILE)?;
    let request = ExamGenerationRequest::from_config(materials, &config);
    let generator = ExamGenerator::new(config);

    let questions = generator
        .generate_with_log(&request, |message, percent| {
            if let Err(e) = logging::append_log_line(PROGRESS_LOG_FILE, message, percent) {
                warn!("写入进度日志失败: {}", e);
            }
        })
        .await
        .context("出题失败")?;

    let json = serde_json::to_string_pretty(&questions)?;
    match &generator.config().output_file {
        Some(path) => {
            tokio::fs::write(path, json)
                .await
                .with_context(|| format!("无法写入输出文件: {}", path))?;
            logging::print_final_stats(&questions, path);
        }
        None => {
            println!("{}", json);
            logging::print_final_stats(&questions, "标准输出");
        }
    }

    Ok(())
}

/// `EXAM_CONFIG_FILE` 指向的 TOML 文件优先，否则读取环境变量
fn load_config() -> Result<Config> {
    let config = match std::env::var("EXAM_CONFIG_FILE") {
        Ok(path) if !path.trim().is_empty() => Config::from_toml_file(path.trim())?,
        _ => Config::from_env(),
    };
    config.validate()?;
    Ok(config)
}
