//! 命令行应用 - 编排层入口
//!
//! ## 职责
//!
//! 1. **应用初始化**：校验配置、创建 OCR / LLM / 输出服务
//! 2. **扫描输入**：找出文件夹中可处理的文件，提示重名文件
//! 3. **后台运行**：批处理在单独的 tokio 任务中运行
//! 4. **控制转发**：控制台输入 `pause` / `resume` / `stop`，Ctrl-C 等同于 stop
//! 5. **最终统计**：打印统计信息和输出位置

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cli::Cli;
use crate::config::{resolve_output_name, Config};
use crate::infrastructure::{validate_folder, RunControl};
use crate::models::RunStatistics;
use crate::orchestrator::{BatchOrchestrator, OutputOutcome};
use crate::services::{LlmService, OcrService, OutputFormat};
use crate::utils::logging::{log_startup, print_final_stats};

/// 控制台命令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    Pause,
    Resume,
    Stop,
}

impl ConsoleCommand {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "p" | "pause" => Some(Self::Pause),
            "r" | "resume" => Some(Self::Resume),
            "s" | "stop" | "q" | "quit" => Some(Self::Stop),
            _ => None,
        }
    }

    /// 转发到控制句柄，返回状态是否发生变化
    pub fn apply(self, control: &RunControl) -> bool {
        let changed = match self {
            Self::Pause => control.pause(),
            Self::Resume => control.resume(),
            Self::Stop => control.stop(),
        };
        if changed {
            info!("🎛️  {:?} → {}", self, control.state());
        } else {
            debug!("命令 {:?} 在状态 {} 下无效", self, control.state());
        }
        changed
    }
}

/// Ctrl-C 的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptAction {
    /// 第一次：当前文件完成后停止
    Stop,
    /// 已经在停止（或运行已结束）：立即退出进程
    ForceQuit,
}

impl InterruptAction {
    /// 根据当前运行状态决定如何处理一次 Ctrl-C
    pub fn on_interrupt(control: &RunControl) -> Self {
        if control.stop() {
            Self::Stop
        } else {
            Self::ForceQuit
        }
    }
}

/// 应用主结构
pub struct App {
    config: Config,
    input_folder: PathBuf,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config, cli: &Cli) -> Result<Self> {
        config.validate().context("配置校验失败")?;

        Ok(Self {
            config,
            input_folder: cli.input_folder.clone(),
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<RunStatistics> {
        info!("\n📁 正在扫描输入文件夹...");
        let report = validate_folder(&self.input_folder)
            .await
            .with_context(|| format!("无法使用输入文件夹: {}", self.input_folder.display()))?;

        log_startup(&self.input_folder, report.files.len());
        if !report.duplicates.is_empty() {
            warn!("⚠️ 重名文件会按顺序分别处理，请确认没有重复扫描");
        }

        let output_name =
            resolve_output_name(&self.config.output.filename_template, chrono::Local::now());
        let format = OutputFormat::select(self.config.output.format, &output_name);
        let destination = self.input_folder.join(&output_name);

        let ocr = OcrService::new(&self.config).context("创建 OCR 服务失败")?;
        let llm = LlmService::new(&self.config);
        info!("🔍 OCR 模型: {}", ocr.model_name());
        info!("🤖 LLM 模型: {}", llm.model_name());
        info!("📝 输出格式: {}", format);
        info!("💡 运行中输入 pause / resume / stop 控制处理，Ctrl-C 停止\n");

        let orchestrator = Arc::new(BatchOrchestrator::new(
            Arc::new(ocr),
            Arc::new(llm),
            format.writer(),
            self.config.batch_settings(),
        ));

        let controls = spawn_console_controls(orchestrator.control());

        let worker = {
            let orchestrator = orchestrator.clone();
            let files = report.files;
            let destination = destination.clone();
            tokio::spawn(async move {
                orchestrator
                    .process(&files, &destination, Some(&log_progress))
                    .await
            })
        };

        let result = worker.await;
        controls.abort();
        let stats = result.context("处理任务异常退出")?;

        let outcome = orchestrator.last_output();
        print_final_stats(&stats, &outcome, self.config.log_file().as_deref());
        if let OutputOutcome::Written(path) = &outcome {
            if path != &destination {
                warn!("⚠️ 输出已回退为: {}", path.display());
            }
        }

        Ok(stats)
    }
}

fn log_progress(current: usize, total: usize, message: &str) {
    debug!("[{}/{}] {}", current, total, message);
}

/// 把控制台输入和 Ctrl-C 转发给控制句柄
///
/// 标准输入在独立线程中阻塞读取，不占用运行时，也不会阻止程序退出。
fn spawn_console_controls(control: RunControl) -> JoinHandle<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    tokio::spawn(async move {
        let mut stdin_open = true;
        loop {
            tokio::select! {
                signal = tokio::signal::ctrl_c() => {
                    if signal.is_err() {
                        break;
                    }
                    match InterruptAction::on_interrupt(&control) {
                        InterruptAction::Stop => {
                            warn!("⏹️ 收到 Ctrl-C，当前文件完成后停止（再按一次立即退出）");
                        }
                        InterruptAction::ForceQuit => {
                            warn!("⛔ 再次收到 Ctrl-C，立即退出");
                            std::process::exit(130);
                        }
                    }
                }
                line = rx.recv(), if stdin_open => match line {
                    Some(line) => match ConsoleCommand::parse(&line) {
                        Some(command) => {
                            command.apply(&control);
                        }
                        None if line.trim().is_empty() => {}
                        None => warn!("未知命令: {}（可用: pause / resume / stop）", line.trim()),
                    },
                    None => stdin_open = false,
                },
            }
        }
    })
}
