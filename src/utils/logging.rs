use anyhow::Result;
/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use std::fs::{self, OpenOptions};
use std::io::Write;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::models::Question;

/// 初始化 tracing 日志
///
/// 优先使用 `RUST_LOG`，未设置时 `verbose` 为真用 debug 级别，否则用 info。
/// 重复调用不会报错。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n出题日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 追加一行带进度的日志
pub fn append_log_line(log_file_path: &str, message: &str, percent: u8) -> Result<()> {
    let mut file = OpenOptions::new().append(true).create(true).open(log_file_path)?;
    writeln!(
        file,
        "[{}] [{:>3}%] {}",
        chrono::Local::now().format("%H:%M:%S"),
        percent,
        message
    )?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config, material_count: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 资料出题模式");
    info!("📄 资料数量: {}", material_count);
    info!(
        "📊 题量: {} | 分片大小: {} | 调度: {:?}",
        config.question_count, config.performance.shard_size, config.performance.mode
    );
    info!("🌐 补充资料检索: {:?}", config.search.mode);
    info!("{}", "=".repeat(60));
}

/// 打印最终统计信息
///
/// # 参数
/// - `questions`: 最终题目
/// - `output`: 输出位置（文件路径或标准输出）
pub fn print_final_stats(questions: &[Question], output: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 出题完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 题目总数: {}", questions.len());
    let mut counts: Vec<(String, usize)> = Vec::new();
    for q in questions {
        let label = q.question_type.label().to_string();
        match counts.iter_mut().find(|(l, _)| *l == label) {
            Some((_, n)) => *n += 1,
            None => counts.push((label, 1)),
        }
    }
    for (label, n) in counts {
        info!("  {}: {}", label, n);
    }
    info!("{}", "=".repeat(60));
    info!("\n题目已保存至: {}", output);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text_counts_chars() {
        assert_eq!(truncate_text("光合作用的场所", 4), "光合作用...");
        assert_eq!(truncate_text("short", 10), "short");
    }

    #[test]
    fn test_log_file_header_and_lines() {
        let path = std::env::temp_dir().join(format!(
            "exam_question_gen_log_{}.txt",
            std::process::id()
        ));
        let path = path.to_string_lossy().to_string();

        init_log_file(&path).unwrap();
        append_log_line(&path, "开始", 0).unwrap();
        append_log_line(&path, "完成", 100).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("出题日志"));
        assert!(content.contains("[  0%] 开始"));
        assert!(content.contains("[100%] 完成"));
        let _ = fs::remove_file(&path);
    }
}
