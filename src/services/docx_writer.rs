//! DOCX 输出 - 业务能力层
//!
//! 把清理后的 markdown 风格文本写成 Word 文档，失败时回退为 .txt

use std::fs::File;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use docx_rs::{BreakType, Docx, Paragraph, Run};
use tracing::{error, info};

use crate::error::{AppError, AppResult};
use crate::services::capability::DocumentWriter;
use crate::services::txt_writer::{ensure_parent_dir, TxtWriter};

/// 分页标记（去掉两侧空行）
const PAGE_BREAK_LINE: &str = "---PAGE BREAK---";

/// DOCX 写入服务
#[derive(Debug, Default, Clone, Copy)]
pub struct DocxWriter {
    fallback: TxtWriter,
}

impl DocxWriter {
    pub fn new() -> Self {
        Self::default()
    }

    fn write_docx(&self, content: &str, destination: &Path) -> AppResult<()> {
        ensure_parent_dir(destination)?;
        let file = File::create(destination)
            .map_err(|e| AppError::file_write_failed(destination.display().to_string(), e))?;
        build_document(content)
            .build()
            .pack(file)
            .map_err(|e| AppError::output_failed("DOCX", destination.display().to_string(), e))?;
        Ok(())
    }
}

#[async_trait]
impl DocumentWriter for DocxWriter {
    async fn write(&self, content: &str, destination: &Path) -> AppResult<PathBuf> {
        match self.write_docx(content, destination) {
            Ok(()) => {
                info!(
                    "✅ 已生成: {}",
                    destination.file_name().unwrap_or_default().to_string_lossy()
                );
                Ok(destination.to_path_buf())
            }
            Err(e) => {
                error!("生成 DOCX 失败: {}", e);
                let txt_path = destination.with_extension("txt");
                let written = self.fallback.write_sync(content, &txt_path)?;
                info!(
                    "📝 已保存为 TXT: {}",
                    txt_path.file_name().unwrap_or_default().to_string_lossy()
                );
                Ok(written)
            }
        }
    }

    fn format_name(&self) -> &'static str {
        "DOCX"
    }
}

/// 一段输出内容
#[derive(Debug, Clone, PartialEq, Eq)]
enum Block {
    Heading { level: usize, text: String },
    Paragraph(Vec<String>),
    PageBreak,
}

/// 按空行切分段落，识别 `#` 标题和分页标记
fn parse_blocks(content: &str) -> Vec<Block> {
    let mut blocks = Vec::new();

    for chunk in content.split("\n\n") {
        let chunk = chunk.trim();
        if chunk.is_empty() {
            continue;
        }
        if chunk == PAGE_BREAK_LINE {
            blocks.push(Block::PageBreak);
            continue;
        }

        let mut lines = Vec::new();
        for line in chunk.lines().map(str::trim_end) {
            match heading(line) {
                Some((level, text)) => {
                    if !lines.is_empty() {
                        blocks.push(Block::Paragraph(std::mem::take(&mut lines)));
                    }
                    blocks.push(Block::Heading {
                        level,
                        text: text.to_string(),
                    });
                }
                None => lines.push(line.to_string()),
            }
        }
        if !lines.is_empty() {
            blocks.push(Block::Paragraph(lines));
        }
    }

    blocks
}

fn heading(line: &str) -> Option<(usize, &str)> {
    let level = line.chars().take_while(|c| *c == '#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let rest = &line[level..];
    rest.starts_with(' ')
        .then(|| (level, rest.trim()))
        .filter(|(_, text)| !text.is_empty())
}

fn build_document(content: &str) -> Docx {
    parse_blocks(content)
        .into_iter()
        .fold(Docx::new(), |docx, block| match block {
            Block::Heading { level, text } => {
                let size = match level {
                    1 => 36,
                    2 => 30,
                    _ => 26,
                };
                docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(text).bold().size(size)))
            }
            Block::Paragraph(lines) => {
                let mut run = Run::new();
                for (i, line) in lines.iter().enumerate() {
                    if i > 0 {
                        run = run.add_break(BreakType::TextWrapping);
                    }
                    run = run.add_text(line);
                }
                docx.add_paragraph(Paragraph::new().add_run(run))
            }
            Block::PageBreak => {
                docx.add_paragraph(Paragraph::new().add_run(Run::new().add_break(BreakType::Page)))
            }
        })
}
