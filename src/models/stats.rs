//! 运行统计
//!
//! 每次运行创建一个新实例，只由编排层修改

use std::time::{Duration, Instant};

use chrono::{DateTime, Local};

/// 单次运行的统计信息
///
/// 每个输入文件最终只会落入 succeeded / empty / failed 之一。
/// succeeded 在所属批次清理完成后才计入。
#[derive(Debug, Clone, Default)]
pub struct RunStatistics {
    /// 输入文件总数
    pub total: usize,
    /// 清理成功的页数
    pub succeeded: usize,
    /// 识别结果为空的页数
    pub empty: usize,
    /// 失败的页数（识别失败或所属批次清理失败）
    pub failed: usize,
    /// 开始时间
    pub started_at: Option<DateTime<Local>>,
    /// 结束时间
    pub ended_at: Option<DateTime<Local>>,
    start_instant: Option<Instant>,
    end_instant: Option<Instant>,
}

impl RunStatistics {
    /// 开始一次新的运行
    pub fn start(total: usize) -> Self {
        Self {
            total,
            started_at: Some(Local::now()),
            start_instant: Some(Instant::now()),
            ..Default::default()
        }
    }

    /// 记录结束时间
    pub fn finish(&mut self) {
        self.ended_at = Some(Local::now());
        self.end_instant = Some(Instant::now());
    }

    /// 是否已经结束
    pub fn is_finished(&self) -> bool {
        self.end_instant.is_some()
    }

    /// 已用时间；未开始返回 0，运行中返回截至目前的时长
    pub fn elapsed(&self) -> Duration {
        match self.start_instant {
            None => Duration::ZERO,
            Some(start) => {
                let end = self.end_instant.unwrap_or_else(Instant::now);
                end.saturating_duration_since(start)
            }
        }
    }

    /// 已归类的文件数
    pub fn processed(&self) -> usize {
        self.succeeded + self.empty + self.failed
    }

    /// 统计摘要
    pub fn summary(&self) -> String {
        let elapsed = self.elapsed().as_secs_f64();
        format!(
            "📊 处理结果:\n   ✅ 成功: {} 页\n   📭 空白: {} 页\n   ❌ 失败: {} 页\n   ⏱️  耗时: {:.1}s ({:.1} 分钟)",
            self.succeeded,
            self.empty,
            self.failed,
            elapsed,
            elapsed / 60.0
        )
    }
}
