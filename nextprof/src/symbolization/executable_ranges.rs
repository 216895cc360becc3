//! Executable address ranges of the profiled binary
//!
//! The code segments of the target are specific to the binary being
//! profiled, so they are supplied by configuration (TOML or `--exec-range`)
//! rather than compiled in. Stack words outside every range are never
//! treated as return addresses.

use log::info;

use super::map_file::parse_hex_address;
use crate::domain::AddressRange;

/// Ordered set of `[start, end)` code segment ranges
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutableRanges {
    ranges: Vec<AddressRange>,
}

impl ExecutableRanges {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a range, keeping the set ordered by start address
    pub fn insert(&mut self, range: AddressRange) {
        let idx = self.ranges.partition_point(|r| r < &range);
        if self.ranges.get(idx) != Some(&range) {
            info!("Executable range: {range}");
            self.ranges.insert(idx, range);
        }
    }

    /// Check if an address falls within any configured range
    #[must_use]
    pub fn contains(&self, addr: u32) -> bool {
        self.ranges.iter().any(|r| r.contains(addr))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AddressRange> {
        self.ranges.iter()
    }
}

impl FromIterator<AddressRange> for ExecutableRanges {
    fn from_iter<I: IntoIterator<Item = AddressRange>>(iter: I) -> Self {
        let mut ranges = Self::new();
        for range in iter {
            ranges.insert(range);
        }
        ranges
    }
}

/// Parse a `start-end` range as written on the command line
///
/// Both bounds are hexadecimal, with or without a `0x` prefix.
#[must_use]
pub fn parse_range(text: &str) -> Option<AddressRange> {
    let (start, end) = text.trim().split_once('-')?;
    AddressRange::new(parse_hex_address(start)?, parse_hex_address(end)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_checks_every_range() {
        let ranges: ExecutableRanges = [
            AddressRange::new(0x0010_0000, 0x0056_B000).unwrap(),
            AddressRange::new(0x006C_4DD4, 0x00F0_0000).unwrap(),
        ]
        .into_iter()
        .collect();

        assert!(ranges.contains(0x0010_0000));
        assert!(ranges.contains(0x006C_4DD4));
        assert!(!ranges.contains(0x0056_B000));
        assert!(!ranges.contains(0x0060_0000));
        assert!(!ranges.contains(0x00F0_0000));
    }

    #[test]
    fn test_empty_set_contains_nothing() {
        let ranges = ExecutableRanges::new();
        assert!(ranges.is_empty());
        assert!(!ranges.contains(0x0010_0000));
    }

    #[test]
    fn test_insert_keeps_order_and_dedups() {
        let mut ranges = ExecutableRanges::new();
        ranges.insert(AddressRange::new(0x3000, 0x4000).unwrap());
        ranges.insert(AddressRange::new(0x1000, 0x2000).unwrap());
        ranges.insert(AddressRange::new(0x3000, 0x4000).unwrap());

        let starts: Vec<u32> = ranges.iter().map(|r| r.start).collect();
        assert_eq!(starts, vec![0x1000, 0x3000]);
    }

    #[test]
    fn test_parse_range() {
        assert_eq!(parse_range("0x100000-0x56B000"), AddressRange::new(0x0010_0000, 0x0056_B000));
        assert_eq!(parse_range("1000-2000"), AddressRange::new(0x1000, 0x2000));
        assert_eq!(parse_range("2000-1000"), None);
        assert_eq!(parse_range("nonsense"), None);
    }
}
