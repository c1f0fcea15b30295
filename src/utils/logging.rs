//! 日志工具模块
//!
//! 控制台 + 可选的日志文件，以及日志格式化的辅助函数

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::models::RunStatistics;
use crate::orchestrator::OutputOutcome;

/// 初始化日志
///
/// `RUST_LOG` 优先于配置的级别。日志文件不带颜色，以追加方式写入。
pub fn init(level: &str, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let file_layer = match log_file {
        Some(path) => {
            let file = init_log_file(path)?;
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(false),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("初始化日志失败: {}", e))?;

    Ok(())
}

/// 初始化日志文件：写入带时间的分隔头，返回追加模式的文件句柄
pub fn init_log_file(log_file_path: &Path) -> Result<File> {
    if let Some(parent) = log_file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("无法创建日志目录: {}", parent.display()))?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)
        .with_context(|| format!("无法打开日志文件: {}", log_file_path.display()))?;

    let log_header = format!(
        "{}\nNovaOCR 处理日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    file.write_all(log_header.as_bytes())?;
    Ok(file)
}

/// 记录程序启动信息
pub fn log_startup(input_folder: &Path, file_count: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 NovaOCR - 命令行模式");
    info!("📁 输入文件夹: {}", input_folder.display());
    info!("📄 找到文件: {}", file_count);
    info!("{}", "=".repeat(60));
}

/// 打印最终统计信息
pub fn print_final_stats(stats: &RunStatistics, outcome: &OutputOutcome, log_file: Option<&Path>) {
    info!("\n{}", "=".repeat(60));
    info!("📊 处理完成");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    for line in stats.summary().lines() {
        info!("{}", line);
    }
    match outcome {
        OutputOutcome::Written(path) => info!("💾 输出已保存至: {}", path.display()),
        OutputOutcome::Failed(reason) => info!("❌ 输出生成失败: {}", reason),
        OutputOutcome::Skipped => info!("ℹ️  未生成输出文件"),
    }
    info!("{}", "=".repeat(60));
    if let Some(path) = log_file {
        info!("\n日志已保存至: {}", path.display());
    }
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大字符数
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
