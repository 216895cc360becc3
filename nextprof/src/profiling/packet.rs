//! # Sample Stream Decoding
//!
//! The recorder writes a flat concatenation of length-framed packets:
//!
//! ```text
//! ┌──────┬──────┬───────────────────────────────┐
//! │ "NP" │ kind │ body (kind-specific)          │
//! └──────┴──────┴───────────────────────────────┘
//!   2 B    2 B
//! ```
//!
//! Kinds are dispatched through a fixed decoder table, so supporting a new
//! packet kind means adding one `Packet` variant and one table row.
//!
//! Decoding is positional: every error carries the byte offset of the packet
//! that failed, and nothing after it is decoded.

use nextprof_common::{
    SampleHeader, PACKET_HEADER_LEN, PACKET_KIND_SAMPLE, PACKET_MAGIC, RECORD_HEADER_SAMPLE,
    SAMPLE_BODY_FIXED_LEN, WORD_LEN,
};

use crate::domain::{PacketError, ThreadId};

/// One statistical sample of a thread's execution point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplePacket {
    pub thread_id: ThreadId,
    pub pc: u32,
    pub lr: u32,
    /// Raw stack words, innermost (lowest address) first
    pub stack: Vec<u32>,
}

impl SamplePacket {
    /// Encoded length in bytes
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        PACKET_HEADER_LEN + SAMPLE_BODY_FIXED_LEN + self.stack.len() * WORD_LEN
    }

    /// Encode the packet exactly as the recorder writes it
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        let stack_count = u32::try_from(self.stack.len()).unwrap_or(u32::MAX);
        for word in [RECORD_HEADER_SAMPLE, self.thread_id.0, self.pc, self.lr, stack_count] {
            out.extend_from_slice(&word.to_le_bytes());
        }
        for word in &self.stack {
            out.extend_from_slice(&word.to_le_bytes());
        }
        out
    }
}

/// A decoded packet of any known kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    Sample(SamplePacket),
}

impl Packet {
    #[must_use]
    pub fn kind(&self) -> u16 {
        match self {
            Packet::Sample(_) => PACKET_KIND_SAMPLE,
        }
    }
}

/// Result of decoding one packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPacket {
    pub packet: Packet,
    /// Bytes consumed from the packet start, header included
    pub consumed: usize,
}

/// Decodes a packet body. Receives the bytes from the packet start (header
/// included) and the packet's stream offset for error reporting.
type BodyDecoder = fn(&[u8], usize) -> Result<DecodedPacket, PacketError>;

/// Known packet kinds and their body decoders.
const DECODERS: &[(u16, BodyDecoder)] = &[(PACKET_KIND_SAMPLE, decode_sample)];

fn read_word(bytes: &[u8], pos: usize) -> u32 {
    u32::from_le_bytes([bytes[pos], bytes[pos + 1], bytes[pos + 2], bytes[pos + 3]])
}

fn decode_sample(bytes: &[u8], offset: usize) -> Result<DecodedPacket, PacketError> {
    let fixed_len = PACKET_HEADER_LEN + SAMPLE_BODY_FIXED_LEN;
    if bytes.len() < fixed_len {
        return Err(PacketError::TruncatedBody { offset, needed: fixed_len, available: bytes.len() });
    }

    let header = SampleHeader {
        header: read_word(bytes, 0),
        thread_id: read_word(bytes, 4),
        pc: read_word(bytes, 8),
        lr: read_word(bytes, 12),
        stack_count: read_word(bytes, 16),
    };

    let needed = header.packet_len().unwrap_or(usize::MAX);
    if bytes.len() < needed {
        return Err(PacketError::TruncatedBody { offset, needed, available: bytes.len() });
    }

    let stack = bytes[fixed_len..needed]
        .chunks_exact(WORD_LEN)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();

    Ok(DecodedPacket {
        packet: Packet::Sample(SamplePacket {
            thread_id: ThreadId(header.thread_id),
            pc: header.pc,
            lr: header.lr,
            stack,
        }),
        consumed: needed,
    })
}

/// Decode the packet starting at `offset` in `stream`
///
/// # Errors
/// - `MalformedHeader` if fewer than 4 bytes remain or the magic is wrong
/// - `UnknownKind` if no decoder is registered for the kind
/// - `TruncatedBody` if the body is shorter than it declares
pub fn decode_packet(stream: &[u8], offset: usize) -> Result<DecodedPacket, PacketError> {
    let bytes = stream.get(offset..).unwrap_or_default();
    if bytes.len() < PACKET_HEADER_LEN {
        return Err(PacketError::MalformedHeader { offset, reason: "short header" });
    }
    if bytes[..2] != PACKET_MAGIC {
        return Err(PacketError::MalformedHeader { offset, reason: "bad magic" });
    }

    let kind = u16::from_le_bytes([bytes[2], bytes[3]]);
    let decoder = DECODERS
        .iter()
        .find_map(|&(k, decoder)| (k == kind).then_some(decoder))
        .ok_or(PacketError::UnknownKind { offset, kind })?;
    decoder(bytes, offset)
}

/// Cursor over a concatenated packet stream
///
/// Yields `(offset, packet)` pairs. After the first error it yields that
/// error once and then ends; the stream must end exactly on a packet
/// boundary.
#[derive(Debug)]
pub struct PacketStream<'a> {
    data: &'a [u8],
    pos: usize,
    failed: bool,
}

impl<'a> PacketStream<'a> {
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_offset(data, 0)
    }

    /// Start decoding at a byte offset into `data`
    #[must_use]
    pub fn with_offset(data: &'a [u8], offset: usize) -> Self {
        Self { data, pos: offset, failed: false }
    }

    /// Byte offset of the next packet to decode
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }
}

impl Iterator for PacketStream<'_> {
    type Item = Result<(usize, Packet), PacketError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.data.len() {
            return None;
        }

        let offset = self.pos;
        match decode_packet(self.data, offset) {
            Ok(decoded) => {
                self.pos += decoded.consumed;
                Some(Ok((offset, decoded.packet)))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
