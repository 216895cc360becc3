//! # nextprof - Sampling Profiler Post-Processor
//!
//! nextprof turns the packet stream recorded by an on-target sampling
//! profiler into a per-function profile and a weighted call graph. The
//! target is a 32-bit ARM process without debug information: each sample
//! carries the program counter, the link register and a raw snapshot of the
//! stack, and symbols come from a plain map file.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                 On-target recorder (not this crate)             │
//! │        "NP" | kind | tid | pc | lr | n | stack[n] ...           │
//! └───────────────────────┬─────────────────────────────────────────┘
//!                         │ byte stream (file)
//!                         ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       nextprof (This Crate)                     │
//! │                                                                 │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐         │
//! │  │   Packet     │──▶│    Chain     │──▶│   Profile    │         │
//! │  │   Decoder    │   │ Reconstructor│   │  Aggregator  │         │
//! │  └──────────────┘   └──────────────┘   └──────────────┘         │
//! │                            │                  │                 │
//! │                            ▼                  ▼                 │
//! │                     ┌──────────────┐   ┌──────────────┐         │
//! │                     │ SymbolTable  │   │   Analysis   │         │
//! │                     │ (map + code) │   │ (call graph) │         │
//! │                     └──────────────┘   └──────────────┘         │
//! │                                               │                 │
//! │                                               ▼                 │
//! │                                        ┌──────────────┐         │
//! │                                        │    Export    │         │
//! │                                        │ (JSON / DOT) │         │
//! │                                        └──────────────┘         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`profiling`]: packet decoding, chain reconstruction, aggregation and
//!   the stream processor that drives them
//! - [`symbolization`]: map-file symbols, code dumps, the ARM call-site
//!   check and executable ranges
//! - [`analysis`]: call-graph thresholds and severity, the function table
//! - [`export`]: JSON report and Graphviz DOT writers
//! - [`config`]: TOML target layout configuration
//! - [`cli`]: command-line argument parsing
//! - [`domain`]: core types (`ThreadId`, `AddressRange`) and errors
//!
//! ## Typical Usage
//!
//! ```bash
//! # Profile table for a recording
//! nextprof -f samples.bin -s game.map --exec-range 00100000-0056B000
//!
//! # Use code dumps for the call-site check and export the call graph
//! nextprof -f samples.bin -s game.map --code code.bin --export-dot graph.dot
//! ```
//!
//! ## Key Concepts
//!
//! - **Direct hit**: the sample's innermost frame is in the function
//! - **Total hit**: the function appears anywhere in the sample's chain
//! - **Trace root**: chains stop at this function, keeping it
//! - **Executable range**: address ranges stack words must fall in to be
//!   considered return addresses

pub mod analysis;
pub mod cli;
pub mod config;
pub mod domain;
pub mod export;
pub mod profiling;
pub mod symbolization;
