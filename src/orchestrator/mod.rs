//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批处理编排器
//! - 顺序识别文件，把非空页面攒成批次
//! - 批次满或到最后一个文件时交给 LLM 清理
//! - 维护统计信息，响应暂停 / 继续 / 停止
//! - 最后生成一次输出文件
//!
//! ### `app` - 命令行应用
//! - 扫描输入文件夹、创建服务
//! - 在后台任务中运行编排器，转发控制台命令
//!
//! ## 层次关系
//!
//! ```text
//! app (命令行 / 控制台)
//!     ↓
//! batch_processor (处理 Vec<PathBuf>)
//!     ↓
//! services (能力层：extract / clean / write)
//!     ↓
//! infrastructure (文件扫描、运行控制)
//! ```

pub mod app;
pub mod batch_processor;

// 重新导出主要类型
pub use app::{App, ConsoleCommand, InterruptAction};
pub use batch_processor::{BatchOrchestrator, BatchSettings, OutputOutcome};
