//! Student scanning: roster discovery, per-student extraction, reporting.

pub mod report;
pub mod roster;
pub mod runner;

pub use report::write_report;
pub use runner::{print_results_table, scan_all, scan_student, StudentRecord};
