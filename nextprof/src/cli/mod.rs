//! Command-line interface for nextprof
//!
//! This module contains CLI argument parsing

pub mod args;

pub use args::{Args, CodeArg};
