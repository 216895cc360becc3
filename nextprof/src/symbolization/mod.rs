//! # Symbol Resolution and Call-Site Classification
//!
//! This module turns the raw 32-bit addresses captured by the recorder into
//! function starts and names, and decides which stack words are plausible
//! return addresses.
//!
//! ## The Symbolization Problem
//!
//! The target ships without debug information. What is available is a map
//! file (`address name` per line, exported from a linker map or a
//! disassembler database) and, optionally, raw dumps of the code segments.
//! Resolution is therefore approximate:
//!
//! ```text
//! 0x00100012 ──nearest symbol ≤ addr──▶ 0x00100010 "helper"
//!                (within MAX_FUNCTION_LEN)
//! ```
//!
//! ## Stack Filtering
//!
//! A raw stack snapshot is mostly data. Two checks keep only words that look
//! like saved return addresses:
//!
//! 1. **Executable range**: the word points into a configured code segment
//! 2. **Call site**: the instruction at `word - 4` is an ARM `BL`/`BLX`
//!    (only when code dumps are loaded; otherwise the check passes)
//!
//! ## Module Structure
//!
//! - **`symbol_table`**: `SymbolTable`, exact and nearest lookup, loaders
//! - **`map_file`**: line parser and the name cleanup policy
//! - **`code_blobs`**: non-overlapping code dumps and the ARM call decoder
//! - **`executable_ranges`**: configured code segment ranges
//!
//! ## Limitations
//!
//! - **Thumb**: return addresses with bit 0 set are never classified as call
//!   sites yet
//! - **Function size**: a symbol more than `MAX_FUNCTION_LEN` below an
//!   address does not claim it

pub mod code_blobs;
pub mod executable_ranges;
pub mod map_file;
pub mod symbol_table;

pub use code_blobs::{is_arm_call, CodeBlob, CodeBlobs};
pub use executable_ranges::{parse_range, ExecutableRanges};
pub use map_file::{parse_hex_address, parse_map_line, NameCleanup, DEFAULT_IGNORE_PREFIXES};
pub use symbol_table::{SymbolTable, DEFAULT_CODE_BASE, DEFAULT_MAX_FUNCTION_LEN};
