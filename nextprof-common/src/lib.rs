//! # Shared Wire Definitions (Recorder ↔ Host)
//!
//! Defines the constants of the sample stream written by the on-target
//! recorder and read back by the host tooling. The recorder emits every
//! packet as a sequence of little-endian 32-bit words, so everything here is
//! expressed in terms of words and their byte offsets.
//!
//! ## Packet Layout
//!
//! ```text
//! offset  size  field
//! 0       2     magic ("NP")
//! 2       2     kind (little-endian u16)
//! 4       ...   kind-specific body
//! ```
//!
//! The recorder writes magic and kind together as a single header word, see
//! [`record_header`].
//!
//! ## Key Types
//!
//! - [`SampleHeader`] - Fixed-size prefix of a Sample packet

#![no_std]

// ============================================================================
// Framing Constants
// ============================================================================

/// Two-byte ASCII tag at the start of every packet.
pub const PACKET_MAGIC: [u8; 2] = *b"NP";

/// Size of the magic + kind prefix in bytes.
pub const PACKET_HEADER_LEN: usize = 4;

/// Size of one stream word in bytes.
pub const WORD_LEN: usize = 4;

// ============================================================================
// Packet Kinds
// ============================================================================

/// **Sample**: one statistical sample of a thread's execution point
///
/// Body: `thread_id`, `pc`, `lr`, `stack_count`, then `stack_count` stack words.
pub const PACKET_KIND_SAMPLE: u16 = 1;

/// Number of fixed words in a Sample packet (header + four body words).
pub const SAMPLE_FIXED_WORDS: usize = 5;

/// Byte length of the fixed part of a Sample body (after the header).
pub const SAMPLE_BODY_FIXED_LEN: usize = (SAMPLE_FIXED_WORDS - 1) * WORD_LEN;

/// Build the header word the recorder writes for a packet of `kind`.
///
/// Stored little-endian this yields the magic bytes followed by the kind.
#[must_use]
pub const fn record_header(kind: u16) -> u32 {
    (PACKET_MAGIC[0] as u32) | ((PACKET_MAGIC[1] as u32) << 8) | ((kind as u32) << 16)
}

/// Header word of a Sample packet.
pub const RECORD_HEADER_SAMPLE: u32 = record_header(PACKET_KIND_SAMPLE);

// ============================================================================
// Shared Data Structures
// ============================================================================

/// Fixed-size prefix of a Sample packet as laid out by the recorder
///
/// **Memory Layout**: `#[repr(C)]`, five consecutive little-endian words.
/// The stack words follow immediately after `stack_count`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SampleHeader {
    /// Packed magic + kind, see [`record_header`]
    pub header: u32,

    /// Kernel thread ID of the sampled thread
    pub thread_id: u32,

    /// Program counter at the time of the sample
    pub pc: u32,

    /// Link register at the time of the sample
    pub lr: u32,

    /// Number of 32-bit stack words that follow
    pub stack_count: u32,
}

impl SampleHeader {
    /// Total packet length in bytes, stack words included
    ///
    /// `None` if the declared stack count overflows the address space.
    #[must_use]
    pub const fn packet_len(&self) -> Option<usize> {
        match (self.stack_count as usize).checked_add(SAMPLE_FIXED_WORDS) {
            Some(words) => words.checked_mul(WORD_LEN),
            None => None,
        }
    }
}
