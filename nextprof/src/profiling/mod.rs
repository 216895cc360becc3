//! Profiling core modules
//!
//! This module contains the sample pipeline:
//! - Packet decoding of the recorder's byte stream
//! - Call chain reconstruction from pc and raw stack words
//! - Aggregation into per-function counts and call edges
//! - Event processing (the decode → reconstruct → aggregate driver)
//! - Console display of statistics and function tables

pub mod aggregator;
pub mod chain;
pub mod event_display;
pub mod event_processor;
pub mod packet;

// Re-export common types
pub use aggregator::{Function, Profile};
pub use chain::{CallChain, ChainPolicy, ChainReconstructor, ChainStats};
pub use event_display::{display_function_table, display_statistics};
pub use event_processor::{ProcessingStats, SampleProcessor};
pub use packet::{decode_packet, DecodedPacket, Packet, PacketStream, SamplePacket};
