//! 输出格式选择

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::services::capability::DocumentWriter;
use crate::services::docx_writer::DocxWriter;
use crate::services::txt_writer::TxtWriter;

/// 输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Docx,
    Txt,
}

impl OutputFormat {
    /// 根据文件名推断格式
    pub fn from_filename(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".docx") {
            Some(OutputFormat::Docx)
        } else if lower.ends_with(".txt") {
            Some(OutputFormat::Txt)
        } else {
            None
        }
    }

    /// 文件名的扩展名优先于配置
    pub fn select(configured: OutputFormat, filename: &str) -> Self {
        Self::from_filename(filename).unwrap_or(configured)
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Docx => "docx",
            OutputFormat::Txt => "txt",
        }
    }

    /// 创建对应的写入服务
    pub fn writer(self) -> Arc<dyn DocumentWriter> {
        match self {
            OutputFormat::Docx => Arc::new(DocxWriter::new()),
            OutputFormat::Txt => Arc::new(TxtWriter::new()),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}
