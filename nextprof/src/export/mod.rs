//! Profile export functionality
//!
//! This module provides functionality for exporting profiling data to various formats.
//! Currently supports a JSON report and a Graphviz DOT call graph.

pub mod dot;
pub mod json;

pub use dot::{severity_color, write_dot};
pub use json::ProfileReport;
