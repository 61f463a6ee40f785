//! Output formatting for council results

pub mod console;
pub mod formatter;
pub mod report;
