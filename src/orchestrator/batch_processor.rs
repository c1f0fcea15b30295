//! 批处理编排器 - 编排层
//!
//! ## 职责
//!
//! 按顺序识别每个文件，把非空结果攒成批次交给 LLM 清理，
//! 最后把累积的文档交给输出服务写一次。
//!
//! ## 失败处理
//!
//! - 单个文件识别失败：计入 failed，继续下一个文件
//! - 批次清理失败：原始文本照样写入文档，整批计入 failed
//! - 输出失败：只记录日志，不改变文件的统计结果
//! - 用户停止：不是错误，未处理的文件不计入任何统计
//!
//! 任何单文件、单批次的错误都不会从 `process` 抛出。

use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{error, info, warn};

use crate::config::DEFAULT_CLEANUP_PROMPT;
use crate::infrastructure::{RunControl, RunState};
use crate::models::progress::{report, ProgressCallback, ProgressStage};
use crate::models::{Manuscript, PageBatch, RunStatistics};
use crate::services::{DocumentWriter, TextCleaner, TextExtractor};

/// 单次运行的不可变参数
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSettings {
    /// 每批最多页数（至少为 1）
    pub batch_size: usize,
    /// 清理风格（系统提示词）
    pub style_directive: String,
    /// 确定性参数（temperature）
    pub temperature: f32,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            batch_size: 7,
            style_directive: DEFAULT_CLEANUP_PROMPT.to_string(),
            temperature: 0.0,
        }
    }
}

/// 输出步骤的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputOutcome {
    /// 没有生成输出（文档为空或被停止）
    Skipped,
    /// 已写入（可能是回退后的路径）
    Written(PathBuf),
    /// 写入失败
    Failed(String),
}

/// 批处理编排器
///
/// 同一时间只进行一次运行。统计信息和控制信号可以被其他任务读取 / 修改。
pub struct BatchOrchestrator {
    extractor: Arc<dyn TextExtractor>,
    cleaner: Arc<dyn TextCleaner>,
    writer: Arc<dyn DocumentWriter>,
    settings: BatchSettings,
    control: RunControl,
    stats: RwLock<RunStatistics>,
    last_output: RwLock<OutputOutcome>,
}

impl BatchOrchestrator {
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        cleaner: Arc<dyn TextCleaner>,
        writer: Arc<dyn DocumentWriter>,
        settings: BatchSettings,
    ) -> Self {
        let settings = BatchSettings {
            batch_size: settings.batch_size.max(1),
            ..settings
        };

        Self {
            extractor,
            cleaner,
            writer,
            settings,
            control: RunControl::new(),
            stats: RwLock::new(RunStatistics::default()),
            last_output: RwLock::new(OutputOutcome::Skipped),
        }
    }

    /// 控制句柄（可交给其他任务）
    pub fn control(&self) -> RunControl {
        self.control.clone()
    }

    pub fn pause(&self) -> bool {
        self.control.pause()
    }

    pub fn resume(&self) -> bool {
        self.control.resume()
    }

    pub fn stop(&self) -> bool {
        self.control.stop()
    }

    pub fn state(&self) -> RunState {
        self.control.state()
    }

    /// 当前统计信息的快照
    pub fn statistics(&self) -> RunStatistics {
        self.stats
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// 最近一次运行的输出结果
    pub fn last_output(&self) -> OutputOutcome {
        self.last_output
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// 处理文件列表：识别 → 分批清理 → 输出
    ///
    /// # 参数
    /// - `inputs`: 按顺序处理的文件
    /// - `destination`: 输出文件路径
    /// - `progress`: 进度回调（可选）
    ///
    /// # 返回
    /// 本次运行的统计信息
    pub async fn process(
        &self,
        inputs: &[PathBuf],
        destination: &Path,
        progress: Option<&ProgressCallback<'_>>,
    ) -> RunStatistics {
        let total = inputs.len();
        self.reset(total);
        log_run_start(self.settings.batch_size, total);

        let mut batch = PageBatch::new();
        let mut manuscript = Manuscript::new();

        for (index, path) in inputs.iter().enumerate() {
            let position = index + 1;

            if !self.control.checkpoint().await {
                warn!("⏹️ 处理已被用户停止");
                break;
            }

            let filename = display_name(path);
            info!("🔄 [{}/{}] OCR: {}", position, total, filename);
            report(
                progress,
                position,
                total,
                &ProgressStage::Processing {
                    filename: filename.clone(),
                },
            );

            match self.extractor.extract(path).await {
                Ok(text) if !text.trim().is_empty() => batch.push(text, filename),
                Ok(_) => {
                    info!("  ℹ️  空白页，跳过");
                    self.update_stats(|s| s.empty += 1);
                }
                Err(e) => {
                    error!("  ❌ OCR 失败: {}", e);
                    self.update_stats(|s| s.failed += 1);
                    continue;
                }
            }

            if batch.is_ready(self.settings.batch_size, position == total) {
                self.flush(&mut batch, &mut manuscript, position, total, progress)
                    .await;
            }
        }

        let stopped = self.control.is_stop_requested();

        // 最后一个文件识别失败时，缓冲区里还有没清理的页面
        if !stopped && !batch.is_empty() {
            self.flush(&mut batch, &mut manuscript, total, total, progress)
                .await;
        }

        self.update_stats(RunStatistics::finish);

        if stopped {
            warn!("⚠️ 处理未完成，不生成输出文件");
        } else if manuscript.is_blank() {
            warn!("⚠️ 没有可输出的内容");
        } else {
            self.generate_output(&manuscript, destination, total, progress)
                .await;
        }

        self.control.finish();

        let stats = self.statistics();
        info!("\n{}", stats.summary());
        stats
    }

    /// 清理一个批次并追加到文档，无论成败都清空缓冲
    async fn flush(
        &self,
        batch: &mut PageBatch,
        manuscript: &mut Manuscript,
        position: usize,
        total: usize,
        progress: Option<&ProgressCallback<'_>>,
    ) {
        let pages = batch.len();
        info!(
            "\n🧹 清理批次 ({} 页: {})",
            pages,
            batch.filenames().join(", ")
        );
        report(progress, position, total, &ProgressStage::Cleaning { pages });

        let combined = batch.combined();
        let result = self
            .cleaner
            .clean(
                &combined,
                &self.settings.style_directive,
                self.settings.temperature,
            )
            .await;

        match result {
            Ok(cleaned) if !cleaned.trim().is_empty() => {
                manuscript.append_block(&cleaned);
                self.update_stats(|s| s.succeeded += pages);
                info!("  ✅ 批次清理成功\n");
            }
            Ok(_) => {
                warn!("  ⚠️ LLM 返回空内容，使用原始文本");
                manuscript.append_block(&combined);
                self.update_stats(|s| s.failed += pages);
            }
            Err(e) => {
                error!("  ❌ LLM 清理失败，使用原始文本: {}", e);
                manuscript.append_block(&combined);
                self.update_stats(|s| s.failed += pages);
            }
        }

        batch.clear();
    }

    async fn generate_output(
        &self,
        manuscript: &Manuscript,
        destination: &Path,
        total: usize,
        progress: Option<&ProgressCallback<'_>>,
    ) {
        info!(
            "\n💾 生成输出 ({}, {} 个批次): {}",
            self.writer.format_name(),
            manuscript.block_count(),
            display_name(destination)
        );
        report(progress, total, total, &ProgressStage::GeneratingOutput);

        let outcome = match self.writer.write(manuscript.as_str(), destination).await {
            Ok(path) => OutputOutcome::Written(path),
            Err(e) => {
                error!("❌ 生成输出失败: {}", e);
                OutputOutcome::Failed(e.to_string())
            }
        };

        *self
            .last_output
            .write()
            .unwrap_or_else(PoisonError::into_inner) = outcome;
    }

    fn reset(&self, total: usize) {
        *self.stats.write().unwrap_or_else(PoisonError::into_inner) = RunStatistics::start(total);
        *self
            .last_output
            .write()
            .unwrap_or_else(PoisonError::into_inner) = OutputOutcome::Skipped;
        self.control.begin();
    }

    /// 统计更新在一个写锁内完成，读者看不到中间状态
    fn update_stats(&self, update: impl FnOnce(&mut RunStatistics)) {
        let mut stats = self.stats.write().unwrap_or_else(PoisonError::into_inner);
        update(&mut stats);
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or(path.as_os_str())
        .to_string_lossy()
        .to_string()
}

// ========== 日志辅助函数 ==========

fn log_run_start(batch_size: usize, total: usize) {
    info!("{}", "=".repeat(60));
    info!("🤖 开始批处理（AI 清理）");
    info!("📦 批大小: 每次清理 {} 页", batch_size);
    info!("📁 文件总数: {}", total);
    info!("{}", "=".repeat(60));
}
