//! Output formatting module
//!
//! Renders the run summary for humans and machines.

mod formatter;

pub use formatter::{OutputFormat, SummaryFormatter};
