//! 批次缓冲区

/// 页面之间的分隔标记
pub const PAGE_BREAK: &str = "\n\n---PAGE BREAK---\n\n";

/// 等待 AI 清理的页面缓冲
///
/// `texts` 和 `filenames` 始终等长且顺序一致
#[derive(Debug, Default, Clone)]
pub struct PageBatch {
    texts: Vec<String>,
    filenames: Vec<String>,
}

impl PageBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一页
    pub fn push(&mut self, text: impl Into<String>, filename: impl Into<String>) {
        self.texts.push(text.into());
        self.filenames.push(filename.into());
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    pub fn filenames(&self) -> &[String] {
        &self.filenames
    }

    /// 是否应该送去清理：达到批大小，或者已经是最后一个文件且缓冲非空
    pub fn is_ready(&self, batch_size: usize, is_last: bool) -> bool {
        self.len() >= batch_size || (is_last && !self.is_empty())
    }

    /// 用分页标记拼接所有页面
    pub fn combined(&self) -> String {
        self.texts.join(PAGE_BREAK)
    }

    /// 清空缓冲（两个数组一起）
    pub fn clear(&mut self) {
        self.texts.clear();
        self.filenames.clear();
    }
}
