//! # NovaOCR
//!
//! 把一个文件夹里的扫描页面（图片 / PDF）识别成文字，分批交给 LLM 清理，
//! 最后拼成一份完整的 DOCX 或 TXT 文稿。
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 文件扫描（自然排序、重名检测）和运行控制信号
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 三个独立能力：识别（`TextExtractor`）、清理（`TextCleaner`）、
//!   写出（`DocumentWriter`），以及基于 Mistral / OpenAI 兼容接口和 docx-rs 的实现
//!
//! ### ③ 数据层（Models）
//! - `models/` - 统计信息、批次缓冲、累积文稿、进度消息
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批处理编排器，唯一修改统计信息的地方
//! - `orchestrator/app` - 命令行应用，后台运行编排器并转发控制命令
//!
//! ## 模块结构

pub mod cli;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;

// 重新导出常用类型
pub use cli::Cli;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{RunControl, RunState};
pub use models::{ProgressCallback, RunStatistics};
pub use orchestrator::{App, BatchOrchestrator, BatchSettings, OutputOutcome};
pub use services::{DocumentWriter, TextCleaner, TextExtractor};
