pub mod batch;
pub mod document;
pub mod progress;
pub mod stats;

pub use batch::{PageBatch, PAGE_BREAK};
pub use document::{Manuscript, BLOCK_SEPARATOR};
pub use progress::{ProgressCallback, ProgressStage};
pub use stats::RunStatistics;
