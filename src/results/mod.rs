//! Results merging, storage, and reporting module
//!
//! Combines per-worker outputs, persists the run summary, and renders reports.

mod merge;
mod report;
mod storage;

pub use merge::{MergeOutcome, ResultMerger};
pub use report::{ReportFormat, ReportGenerator};
pub use storage::RunSummary;
