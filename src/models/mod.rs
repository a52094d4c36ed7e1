//! Data models for parallel feature execution
//!
//! This module contains all data structures used throughout the application.

mod feature;
mod statistics;
mod task_result;

pub use feature::{FeatureUnit, OutputFormat, WorkerAssignment};
pub use statistics::RunStatistics;
pub use task_result::{tail_chars, TaskResult, NO_EXIT_CODE};
