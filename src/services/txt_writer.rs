//! 纯文本输出 - 业务能力层
//!
//! 只负责"写 .txt"能力，不关心流程

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::info;

use crate::error::{AppError, AppResult, OutputError};
use crate::services::capability::DocumentWriter;

/// 纯文本写入服务（UTF-8）
#[derive(Debug, Default, Clone, Copy)]
pub struct TxtWriter;

impl TxtWriter {
    pub fn new() -> Self {
        Self
    }

    /// 同步写入，供 DOCX 回退复用
    pub fn write_sync(&self, content: &str, destination: &Path) -> AppResult<PathBuf> {
        ensure_parent_dir(destination)?;
        std::fs::write(destination, content)
            .map_err(|e| AppError::output_failed("TXT", destination.display().to_string(), e))?;

        info!(
            "✅ 已生成: {}",
            destination.file_name().unwrap_or_default().to_string_lossy()
        );
        Ok(destination.to_path_buf())
    }
}

#[async_trait]
impl DocumentWriter for TxtWriter {
    async fn write(&self, content: &str, destination: &Path) -> AppResult<PathBuf> {
        self.write_sync(content, destination)
    }

    fn format_name(&self) -> &'static str {
        "TXT"
    }
}

/// 确保父目录存在
pub(crate) fn ensure_parent_dir(destination: &Path) -> AppResult<()> {
    if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| OutputError::CreateDirFailed {
            path: parent.display().to_string(),
            source: Box::new(e),
        })?;
    }
    Ok(())
}
