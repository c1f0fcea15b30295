//! 命令行参数

use std::path::PathBuf;

use clap::Parser;

use crate::config::Config;

/// NovaOCR - 扫描文件夹，OCR 识别后用 AI 清理，输出一份完整文稿
#[derive(Debug, Clone, Parser)]
#[command(name = "nova-ocr", version, about)]
pub struct Cli {
    /// 包含图片 / PDF 的输入文件夹
    #[arg(long, value_name = "DIR")]
    pub input_folder: PathBuf,

    /// 输出文件名（默认取自配置，支持 {timestamp}）
    #[arg(long, value_name = "NAME")]
    pub output_name: Option<String>,

    /// 配置文件路径（默认 config/config.toml）
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// 日志级别
    #[arg(long, value_parser = ["trace", "debug", "info", "warn", "error"])]
    pub log_level: Option<String>,

    /// 每次 AI 清理的页数
    #[arg(long)]
    pub batch_size: Option<usize>,
}

impl Cli {
    /// 命令行参数覆盖配置
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if let Some(batch_size) = self.batch_size {
            config.processing.batch_size = batch_size;
        }
        if let Some(name) = &self.output_name {
            config.output.filename_template = name.clone();
        }
    }
}
