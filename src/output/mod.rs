//! Output formatting module
//!
//! Console rendering of run progress and summaries.

mod formatter;

pub use formatter::SummaryFormatter;
