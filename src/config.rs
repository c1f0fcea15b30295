//! 程序配置
//!
//! 配置只构建一次，然后以引用的形式传给需要它的组件。
//!
//! 优先级：默认值 < TOML 文件 < 环境变量 < 命令行参数

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AppError, AppResult, ConfigError, FileError};
use crate::orchestrator::BatchSettings;
use crate::services::OutputFormat;

/// 默认配置文件位置（相对于当前工作目录）
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// 默认的文本清理提示词
pub const DEFAULT_CLEANUP_PROMPT: &str = "You are a meticulous editor. You receive raw OCR output \
from scanned book pages, separated by ---PAGE BREAK--- markers. Fix OCR mistakes, rejoin words \
hyphenated across line breaks, remove running headers, footers and page numbers, and merge \
paragraphs split across pages. Keep the original wording and language. Format headings with \
markdown '#'. Return only the cleaned text.";

/// 程序配置
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub processing: ProcessingConfig,
    pub prompt: PromptConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

/// 远程服务配置
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    pub api_key: String,
    /// OpenAI 兼容的 API 基础地址
    pub base_url: String,
    pub ocr_model: String,
    pub llm_model: String,
    /// 单次请求超时（秒）
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.mistral.ai/v1".to_string(),
            ocr_model: "mistral-ocr-latest".to_string(),
            llm_model: "mistral-large-latest".to_string(),
            timeout_secs: 120,
        }
    }
}

/// 批处理配置
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProcessingConfig {
    /// 每次 AI 清理的页数
    pub batch_size: usize,
    /// LLM 最大尝试次数
    pub max_retries: u32,
    /// 指数退避的底数（秒）
    pub retry_backoff_base: u64,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            batch_size: 7,
            max_retries: 3,
            retry_backoff_base: 2,
        }
    }
}

/// 清理提示词配置
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PromptConfig {
    pub system_prompt: String,
    pub temperature: f32,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_CLEANUP_PROMPT.to_string(),
            temperature: 0.0,
        }
    }
}

/// 输出配置
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// 支持 `{timestamp}` 占位符
    pub filename_template: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Docx,
            filename_template: "OUTPUT_{timestamp}.docx".to_string(),
        }
    }
}

/// 日志配置
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file_enabled: bool,
    pub file_path: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_enabled: true,
            file_path: "logs/novaocr.log".to_string(),
        }
    }
}

impl Config {
    /// 加载配置：TOML 文件（可选）+ 环境变量
    ///
    /// 显式传入的路径必须存在；未传入时尝试默认位置，不存在则使用默认值。
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_PATH);
                if default_path.is_file() {
                    Self::from_file(&default_path)?
                } else {
                    debug!("未找到配置文件 {}，使用默认配置", DEFAULT_CONFIG_PATH);
                    Self::default()
                }
            }
        };

        config.with_env()
    }

    /// 从 TOML 文件读取
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::File(FileError::NotFound {
                    path: path.display().to_string(),
                })
            } else {
                AppError::file_read_failed(path.display().to_string(), e)
            }
        })?;

        Self::from_toml_str(&content).map_err(|e| match e {
            AppError::File(FileError::TomlParseFailed { source, .. }) => {
                AppError::File(FileError::TomlParseFailed {
                    path: path.display().to_string(),
                    source,
                })
            }
            other => other,
        })
    }

    /// 从 TOML 字符串解析
    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// 使用环境变量覆盖配置
    pub fn with_env(self) -> AppResult<Self> {
        self.with_env_source(|key| std::env::var(key).ok())
    }

    /// 使用给定的变量来源覆盖配置
    pub fn with_env_source(mut self, var: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        if let Some(key) = var("MISTRAL_API_KEY").filter(|v| !v.is_empty()) {
            self.api.api_key = key;
        }
        if let Some(url) = var("NOVA_API_BASE_URL").filter(|v| !v.is_empty()) {
            self.api.base_url = url;
        }
        if let Some(value) = var("NOVA_BATCH_SIZE") {
            self.processing.batch_size =
                value
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::EnvVarParseFailed {
                        var_name: "NOVA_BATCH_SIZE".to_string(),
                        value: value.clone(),
                        expected_type: "usize".to_string(),
                    })?;
        }
        if let Some(level) = var("NOVA_LOG_LEVEL").filter(|v| !v.is_empty()) {
            self.logging.level = level;
        }
        Ok(self)
    }

    /// 校验配置
    pub fn validate(&self) -> AppResult<()> {
        if self.api.api_key.trim().is_empty() {
            return Err(ConfigError::MissingValue {
                key: "api.api_key (或环境变量 MISTRAL_API_KEY)".to_string(),
            }
            .into());
        }
        if self.processing.batch_size == 0 {
            return Err(AppError::invalid_config(
                "processing.batch_size",
                "必须大于 0",
            ));
        }
        if self.processing.max_retries == 0 {
            return Err(AppError::invalid_config(
                "processing.max_retries",
                "必须大于 0",
            ));
        }
        if !(0.0..=2.0).contains(&self.prompt.temperature) {
            return Err(AppError::invalid_config(
                "prompt.temperature",
                format!("{} 不在 [0, 2] 范围内", self.prompt.temperature),
            ));
        }
        Ok(())
    }

    /// 构建单次运行的批处理参数
    pub fn batch_settings(&self) -> BatchSettings {
        BatchSettings {
            batch_size: self.processing.batch_size.max(1),
            style_directive: self.prompt.system_prompt.clone(),
            temperature: self.prompt.temperature,
        }
    }

    /// 日志文件路径（未启用时为 None）
    pub fn log_file(&self) -> Option<PathBuf> {
        self.logging
            .file_enabled
            .then(|| PathBuf::from(&self.logging.file_path))
    }
}

/// 解析输出文件名模板
pub fn resolve_output_name(template: &str, now: DateTime<Local>) -> String {
    if template.contains("{timestamp}") {
        template.replace("{timestamp}", &now.format("%Y%m%d_%H%M%S").to_string())
    } else {
        template.to_string()
    }
}
