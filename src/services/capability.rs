//! 能力接口
//!
//! 编排层只依赖这三个相互独立的能力：识别、清理、输出。
//! 具体实现通过 `Arc<dyn _>` 注入。

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::AppResult;

/// 文字识别能力：一个文件 → 文本
///
/// 无法恢复的错误必须返回 `Err`。
/// 返回空字符串或只含空白字符的文本表示"页面为空"，这样的页面计入 empty，不参与清理。
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, path: &Path) -> AppResult<String>;
}

/// 文本清理能力：一个批次的拼接文本 → 清理后的文本
///
/// 重试策略由实现自己负责，返回 `Err` 表示该批次最终失败
#[async_trait]
pub trait TextCleaner: Send + Sync {
    async fn clean(&self, text: &str, style_directive: &str, temperature: f32)
        -> AppResult<String>;
}

/// 文档输出能力：完整文本 → 文件
///
/// 负责创建父目录，返回实际写入的路径
#[async_trait]
pub trait DocumentWriter: Send + Sync {
    async fn write(&self, content: &str, destination: &Path) -> AppResult<PathBuf>;

    /// 格式名称（如 "DOCX"、"TXT"）
    fn format_name(&self) -> &'static str;
}
