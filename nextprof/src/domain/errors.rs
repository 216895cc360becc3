//! Structured error types for nextprof
//!
//! Using thiserror for automatic Display implementation and error chaining.
//! Unparseable map lines and unresolvable stack candidates are not errors;
//! they are filtered out where they occur.

use std::path::PathBuf;
use thiserror::Error;

/// A sample stream packet could not be decoded
///
/// Every variant carries the byte offset of the packet start. Decoding of the
/// stream stops at the first error; packets before it stay aggregated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PacketError {
    #[error("Malformed packet header at offset {offset}: {reason}")]
    MalformedHeader { offset: usize, reason: &'static str },

    #[error("Unknown packet kind {kind} at offset {offset}")]
    UnknownKind { offset: usize, kind: u16 },

    #[error("Truncated packet body at offset {offset}: need {needed} bytes, {available} available")]
    TruncatedBody { offset: usize, needed: usize, available: usize },
}

impl PacketError {
    /// Byte offset of the packet that failed to decode
    #[must_use]
    pub fn offset(&self) -> usize {
        match *self {
            Self::MalformedHeader { offset, .. }
            | Self::UnknownKind { offset, .. }
            | Self::TruncatedBody { offset, .. } => offset,
        }
    }
}

#[derive(Error, Debug)]
pub enum SymbolError {
    #[error("Code data from {source_id} overlaps with existing code data from {existing}")]
    OverlappingCodeBlob { source_id: String, existing: String },

    #[error("Failed to read {}: {source}", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum ProfilerError {
    #[error("Failed to read {}: {source}", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },

    #[error(transparent)]
    Packet(#[from] PacketError),

    #[error(transparent)]
    Symbol(#[from] SymbolError),
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
