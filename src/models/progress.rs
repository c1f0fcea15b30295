//! 进度回调

use std::fmt;

/// 进度回调：(当前序号, 总数, 状态消息)
///
/// 在工作任务中同步调用，不能长时间阻塞。可以借用调用方的局部状态。
pub type ProgressCallback<'a> = dyn Fn(usize, usize, &str) + Send + Sync + 'a;

/// 进度阶段
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressStage {
    /// 正在识别某个文件
    Processing { filename: String },
    /// 正在清理一个批次
    Cleaning { pages: usize },
    /// 正在生成输出文件
    GeneratingOutput,
}

impl fmt::Display for ProgressStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressStage::Processing { filename } => write!(f, "正在处理: {}", filename),
            ProgressStage::Cleaning { pages } => write!(f, "AI 清理批次 ({} 页)...", pages),
            ProgressStage::GeneratingOutput => write!(f, "正在生成输出文件..."),
        }
    }
}

/// 如果提供了回调就上报进度
pub fn report(
    callback: Option<&ProgressCallback<'_>>,
    current: usize,
    total: usize,
    stage: &ProgressStage,
) {
    if let Some(callback) = callback {
        callback(current, total, &stage.to_string());
    }
}
