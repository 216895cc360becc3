//! Analysis logic for profiling data
//!
//! This module contains pure business logic for turning an aggregated
//! profile into views, separated from the console and export layers.

pub mod callgraph;
pub mod function_table;

pub use callgraph::{
    build_call_graph, CallGraph, CallGraphEdge, CallGraphNode, CallGraphParams, CriticalMode,
};
pub use function_table::{function_rows, sort_rows, FunctionRow, SortKey};
