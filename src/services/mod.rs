//! 业务能力层（Services）
//!
//! 描述"我能做什么"，每个服务只处理一个文件或一个批次：
//! - `capability` - 三个独立的能力接口
//! - `OcrService` - 文件 → 文本
//! - `LlmService` - 批次文本 → 清理后的文本
//! - `DocxWriter` / `TxtWriter` - 文本 → 输出文件

pub mod capability;
pub mod docx_writer;
pub mod llm_service;
pub mod ocr_service;
pub mod output_format;
pub mod retry;
pub mod txt_writer;

pub use capability::{DocumentWriter, TextCleaner, TextExtractor};
pub use docx_writer::DocxWriter;
pub use llm_service::LlmService;
pub use ocr_service::OcrService;
pub use output_format::OutputFormat;
pub use retry::RetryPolicy;
pub use txt_writer::TxtWriter;
