//! Raw code bytes of the target and the ARM call-site classifier
//!
//! A stack snapshot contains saved return addresses mixed with arbitrary
//! data that happens to look like code addresses. A real return address
//! points right after a call-with-link instruction, so when the code bytes
//! are available the word at `addr - 4` can be decoded to tell them apart.

use crate::domain::SymbolError;

/// `BL<cond> <imm24>`
const BL_MASK: u32 = 0x0F00_0000;
const BL_BITS: u32 = 0x0B00_0000;

/// `BLX <imm24>` (unconditional, switches to Thumb)
const BLX_IMM_MASK: u32 = 0xFE00_0000;
const BLX_IMM_BITS: u32 = 0xFA00_0000;

/// `BLX<cond> <Rm>`
const BLX_REG_MASK: u32 = 0x0FFF_FFF0;
const BLX_REG_BITS: u32 = 0x012F_FF30;

/// Bytes loaded from one source at a fixed base address
#[derive(Debug, Clone)]
pub struct CodeBlob {
    pub source_id: String,
    pub base_address: u32,
    pub bytes: Vec<u8>,
}

impl CodeBlob {
    /// Exclusive end address, widened so blobs touching 4 GiB don't overflow
    #[must_use]
    pub fn end_address(&self) -> u64 {
        u64::from(self.base_address) + self.bytes.len() as u64
    }

    fn overlaps(&self, base: u32, len: usize) -> bool {
        let start = u64::from(base);
        let end = start + len as u64;
        !(end <= u64::from(self.base_address) || start >= self.end_address())
    }

    fn slice(&self, addr: u32, size: usize) -> Option<&[u8]> {
        let start = u64::from(addr);
        let end = start + size as u64;
        if start < u64::from(self.base_address) || end > self.end_address() {
            return None;
        }
        let offset = usize::try_from(addr - self.base_address).ok()?;
        self.bytes.get(offset..offset.checked_add(size)?)
    }
}

/// Pairwise non-overlapping set of code blobs
#[derive(Debug, Clone, Default)]
pub struct CodeBlobs {
    blobs: Vec<CodeBlob>,
}

impl CodeBlobs {
    /// Register a blob, refusing it if it intersects an existing one
    ///
    /// # Errors
    /// Returns `SymbolError::OverlappingCodeBlob` naming both sources; the
    /// set is left unchanged.
    pub fn insert(&mut self, blob: CodeBlob) -> Result<(), SymbolError> {
        if let Some(existing) =
            self.blobs.iter().find(|b| b.overlaps(blob.base_address, blob.bytes.len()))
        {
            return Err(SymbolError::OverlappingCodeBlob {
                source_id: blob.source_id,
                existing: existing.source_id.clone(),
            });
        }
        self.blobs.push(blob);
        Ok(())
    }

    /// Bytes `[addr, addr + size)` if fully inside a single blob
    #[must_use]
    pub fn read(&self, addr: u32, size: usize) -> Option<&[u8]> {
        self.blobs.iter().find_map(|b| b.slice(addr, size))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn clear(&mut self) {
        self.blobs.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &CodeBlob> {
        self.blobs.iter()
    }

    /// Check whether `addr` is the landing site of an ARM call-with-link
    ///
    /// With no code loaded every address passes. Thumb addresses (bit 0 set)
    /// are not decoded yet and never pass.
    #[must_use]
    pub fn is_after_bl(&self, addr: u32) -> bool {
        if self.blobs.is_empty() {
            return true;
        }

        // TODO: decode Thumb BL/BLX pairs instead of rejecting Thumb return addresses
        if addr & 1 != 0 {
            return false;
        }

        let Some(call_site) = addr.checked_sub(4) else {
            return false;
        };
        match self.read(call_site, 4) {
            Some(&[b0, b1, b2, b3]) => is_arm_call(u32::from_le_bytes([b0, b1, b2, b3])),
            _ => false,
        }
    }
}

/// Check whether an ARM instruction word is one of the call-with-link forms
#[must_use]
pub fn is_arm_call(instr: u32) -> bool {
    (instr & BL_MASK) == BL_BITS
        || (instr & BLX_IMM_MASK) == BLX_IMM_BITS
        || (instr & BLX_REG_MASK) == BLX_REG_BITS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob(source: &str, base: u32, bytes: Vec<u8>) -> CodeBlob {
        CodeBlob { source_id: source.to_string(), base_address: base, bytes }
    }

    #[test]
    fn test_arm_call_patterns() {
        assert!(is_arm_call(0xEB00_0010)); // BL
        assert!(is_arm_call(0x0B00_0010)); // BLEQ
        assert!(is_arm_call(0xFA00_0010)); // BLX imm
        assert!(is_arm_call(0xE12F_FF33)); // BLX r3
        assert!(!is_arm_call(0xE1A0_0000)); // MOV r0, r0
        assert!(!is_arm_call(0xEA00_0010)); // B
        assert!(!is_arm_call(0xE12F_FF13)); // BX r3
    }

    #[test]
    fn test_insert_rejects_overlap_and_keeps_existing() {
        let mut blobs = CodeBlobs::default();
        blobs.insert(blob("a.bin", 0x1000, vec![1; 0x100])).unwrap();

        let err = blobs.insert(blob("b.bin", 0x10F0, vec![2; 0x20])).unwrap_err();
        assert!(matches!(
            err,
            SymbolError::OverlappingCodeBlob { ref source_id, ref existing }
                if source_id == "b.bin" && existing == "a.bin"
        ));
        assert_eq!(blobs.len(), 1);
        assert_eq!(blobs.read(0x1000, 4), Some(&[1u8, 1, 1, 1][..]));
    }

    #[test]
    fn test_adjacent_blobs_do_not_overlap() {
        let mut blobs = CodeBlobs::default();
        blobs.insert(blob("a.bin", 0x1000, vec![1; 0x10])).unwrap();
        blobs.insert(blob("b.bin", 0x1010, vec![2; 0x10])).unwrap();
        blobs.insert(blob("c.bin", 0x0FF0, vec![3; 0x10])).unwrap();
        assert_eq!(blobs.len(), 3);
    }

    #[test]
    fn test_read_requires_single_blob() {
        let mut blobs = CodeBlobs::default();
        blobs.insert(blob("a.bin", 0x1000, (0..16).collect())).unwrap();
        blobs.insert(blob("b.bin", 0x1010, (16..32).collect())).unwrap();

        assert_eq!(blobs.read(0x1004, 4), Some(&[4u8, 5, 6, 7][..]));
        assert_eq!(blobs.read(0x1010, 2), Some(&[16u8, 17][..]));
        assert_eq!(blobs.read(0x100E, 4), None);
        assert_eq!(blobs.read(0x0FFE, 4), None);
        assert_eq!(blobs.read(0x101E, 4), None);
    }

    #[test]
    fn test_read_near_top_of_address_space() {
        let mut blobs = CodeBlobs::default();
        blobs.insert(blob("top.bin", 0xFFFF_FFF8, vec![9; 8])).unwrap();
        assert_eq!(blobs.read(0xFFFF_FFFC, 4), Some(&[9u8; 4][..]));
        assert_eq!(blobs.read(0xFFFF_FFFC, 8), None);
    }

    #[test]
    fn test_is_after_bl_without_code_accepts_everything() {
        let blobs = CodeBlobs::default();
        assert!(blobs.is_after_bl(0x1001));
        assert!(blobs.is_after_bl(0));
    }

    #[test]
    fn test_is_after_bl_decodes_preceding_word() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0xEB00_0010u32.to_le_bytes()); // 0x1000: BL
        bytes.extend_from_slice(&0xE1A0_0000u32.to_le_bytes()); // 0x1004: MOV
        bytes.extend_from_slice(&0xE12F_FF33u32.to_le_bytes()); // 0x1008: BLX r3
        let mut blobs = CodeBlobs::default();
        blobs.insert(blob("code.bin", 0x1000, bytes)).unwrap();

        assert!(blobs.is_after_bl(0x1004));
        assert!(!blobs.is_after_bl(0x1008));
        assert!(blobs.is_after_bl(0x100C));
        assert!(!blobs.is_after_bl(0x1005)); // Thumb
        assert!(!blobs.is_after_bl(0x1000)); // call site outside the blob
        assert!(!blobs.is_after_bl(0x2000));
    }
}
