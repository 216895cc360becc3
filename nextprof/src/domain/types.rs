//! Domain types providing compile-time safety and self-documentation
//!
//! Addresses stay plain `u32` (the target is a 32-bit ARM process); the
//! newtypes here exist where mixing values up would silently corrupt a
//! profile.

use serde::Serialize;
use std::fmt;

/// Thread ID of a sampled thread on the target
///
/// Only one thread is profiled per session: the first one observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ThreadId(pub u32);

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TID:{}", self.0)
    }
}

impl From<u32> for ThreadId {
    fn from(tid: u32) -> Self {
        ThreadId(tid)
    }
}

/// Half-open address range `[start, end)` in the target's address space
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct AddressRange {
    pub start: u32,
    pub end: u32,
}

impl AddressRange {
    /// Create a range, returning `None` if it would be empty
    #[must_use]
    pub fn new(start: u32, end: u32) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    /// Check if an address falls within this range
    #[must_use]
    pub fn contains(&self, addr: u32) -> bool {
        addr >= self.start && addr < self.end
    }
}

impl fmt::Display for AddressRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}-0x{:08X}", self.start, self.end)
    }
}
