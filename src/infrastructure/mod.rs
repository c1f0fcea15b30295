//! 基础设施层
//!
//! - `file_selector` - 扫描输入文件夹，自然排序，检测重名
//! - `run_control` - 暂停 / 继续 / 停止信号

pub mod file_selector;
pub mod run_control;

pub use file_selector::{detect_duplicates, find_valid_files, validate_folder, FolderReport};
pub use run_control::{RunControl, RunState};
