//! 累积文档

/// 段落分隔符
pub const BLOCK_SEPARATOR: &str = "\n\n";

/// 整次运行的输出文本，只追加不修改
#[derive(Debug, Default, Clone)]
pub struct Manuscript {
    content: String,
    blocks: usize,
}

impl Manuscript {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一个批次的内容（清理后或原始文本）
    pub fn append_block(&mut self, text: &str) {
        self.content.push_str(text);
        self.content.push_str(BLOCK_SEPARATOR);
        self.blocks += 1;
    }

    /// 去除空白后是否为空
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }

    pub fn block_count(&self) -> usize {
        self.blocks
    }

    pub fn as_str(&self) -> &str {
        &self.content
    }
}
