//! Feature execution engine
//!
//! Single-feature workers and the bounded parallel pool that drives them.

mod parallel;
mod worker;

pub use parallel::ParallelExecutor;
pub use worker::FeatureWorker;
