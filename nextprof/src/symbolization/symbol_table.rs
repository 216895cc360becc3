use log::{debug, info};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::code_blobs::{CodeBlob, CodeBlobs};
use super::executable_ranges::ExecutableRanges;
use super::map_file::{parse_map_line, NameCleanup};
use crate::domain::SymbolError;

/// Default bound on the distance between an address and its function start.
pub const DEFAULT_MAX_FUNCTION_LEN: u32 = 0x10000;

/// Base address used for code blobs when none is configured.
pub const DEFAULT_CODE_BASE: u32 = 0x0010_0000;

/// Address → name table for the profiled binary
///
/// Nearest-address lookups go through a sorted copy of the addresses that is
/// rebuilt lazily on the first lookup after a mutation, so bulk loading a map
/// file costs a single sort.
#[derive(Debug)]
pub struct SymbolTable {
    symbols: HashMap<u32, String>,
    /// Sorted addresses; `None` after any insert until the next lookup
    sorted_addrs: RefCell<Option<Vec<u32>>>,
    code: CodeBlobs,
    executable: ExecutableRanges,
    max_function_len: u32,
    cleanup: NameCleanup,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    #[must_use]
    pub fn new() -> Self {
        Self {
            symbols: HashMap::new(),
            sorted_addrs: RefCell::new(None),
            code: CodeBlobs::default(),
            executable: ExecutableRanges::new(),
            max_function_len: DEFAULT_MAX_FUNCTION_LEN,
            cleanup: NameCleanup::default(),
        }
    }

    /// Set the largest distance `get_nearest` accepts
    pub fn set_max_function_len(&mut self, len: u32) {
        self.max_function_len = len;
    }

    /// Set the name filtering/normalization policy for later map loads
    pub fn set_name_cleanup(&mut self, cleanup: NameCleanup) {
        self.cleanup = cleanup;
    }

    /// Replace the known code segment ranges
    pub fn set_executable_ranges(&mut self, ranges: ExecutableRanges) {
        self.executable = ranges;
    }

    #[must_use]
    pub fn executable_ranges(&self) -> &ExecutableRanges {
        &self.executable
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Drop all symbols and code blobs
    pub fn clear(&mut self) {
        self.symbols.clear();
        self.code.clear();
        *self.sorted_addrs.get_mut() = None;
    }

    /// Iterate symbols in no particular order
    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
        self.symbols.iter().map(|(&addr, name)| (addr, name.as_str()))
    }

    /// Insert or overwrite the symbol at `addr`
    pub fn insert(&mut self, addr: u32, name: impl Into<String>) {
        self.symbols.insert(addr, name.into());
        *self.sorted_addrs.get_mut() = None;
    }

    /// Exact-address lookup
    #[must_use]
    pub fn get(&self, addr: u32) -> Option<&str> {
        self.symbols.get(&addr).map(String::as_str)
    }

    /// Resolve `addr` to the closest symbol at or below it
    ///
    /// Returns `None` if there is no such symbol or it is more than the
    /// maximum function length away.
    #[must_use]
    pub fn get_nearest(&self, addr: u32) -> Option<(u32, &str)> {
        let symbol_addr = {
            let mut cache = self.sorted_addrs.borrow_mut();
            let sorted = cache.get_or_insert_with(|| {
                let mut addrs: Vec<u32> = self.symbols.keys().copied().collect();
                addrs.sort_unstable();
                debug!("Rebuilt nearest-symbol index ({} symbols)", addrs.len());
                addrs
            });
            let idx = sorted.partition_point(|&a| a <= addr);
            *sorted.get(idx.checked_sub(1)?)?
        };

        if addr - symbol_addr > self.max_function_len {
            return None;
        }
        self.get(symbol_addr).map(|name| (symbol_addr, name))
    }

    /// Load symbols from map file text, returning the number accepted
    pub fn load_from_str(&mut self, text: &str) -> usize {
        let mut accepted = 0;
        let mut skipped = 0;
        for line in text.lines() {
            match parse_map_line(line, &self.cleanup) {
                Some((addr, name)) => {
                    self.insert(addr, name);
                    accepted += 1;
                }
                None => skipped += 1,
            }
        }
        debug!("Map text: {accepted} symbols accepted, {skipped} lines skipped");
        accepted
    }

    /// Load a map file, returning the number of symbols accepted
    ///
    /// # Errors
    /// Returns `SymbolError::FileAccess` if the file cannot be read
    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<usize, SymbolError> {
        let path = path.as_ref();
        let data = fs::read(path)
            .map_err(|source| SymbolError::FileAccess { path: path.to_path_buf(), source })?;
        let accepted = self.load_from_str(&String::from_utf8_lossy(&data));
        info!("Loaded {accepted} symbols from {}", path.display());
        Ok(accepted)
    }

    /// Register raw code bytes at `base_addr`
    ///
    /// # Errors
    /// Returns `SymbolError::OverlappingCodeBlob` if the range intersects an
    /// already loaded blob; nothing is registered in that case.
    pub fn insert_code(
        &mut self,
        source_id: impl Into<String>,
        base_addr: u32,
        bytes: Vec<u8>,
    ) -> Result<(), SymbolError> {
        self.code.insert(CodeBlob { source_id: source_id.into(), base_address: base_addr, bytes })
    }

    /// Load a raw code dump and register it at `base_addr`
    ///
    /// # Errors
    /// Returns `SymbolError::FileAccess` on read failure or
    /// `SymbolError::OverlappingCodeBlob` on a range conflict
    pub fn load_code_from_file<P: AsRef<Path>>(
        &mut self,
        path: P,
        base_addr: u32,
    ) -> Result<(), SymbolError> {
        let path = path.as_ref();
        let bytes = fs::read(path)
            .map_err(|source| SymbolError::FileAccess { path: path.to_path_buf(), source })?;
        let size = bytes.len();
        self.insert_code(path.display().to_string(), base_addr, bytes)?;
        info!("Loaded {size} code bytes from {} at 0x{base_addr:08X}", path.display());
        Ok(())
    }

    /// Loaded code blobs
    #[must_use]
    pub fn code_blobs(&self) -> &CodeBlobs {
        &self.code
    }

    /// Bytes `[addr, addr + size)` if fully inside one loaded blob
    #[must_use]
    pub fn read_code_data(&self, addr: u32, size: usize) -> Option<&[u8]> {
        self.code.read(addr, size)
    }

    /// Check whether `addr` directly follows an ARM call-with-link
    ///
    /// Always true when no code is loaded.
    #[must_use]
    pub fn is_after_bl(&self, addr: u32) -> bool {
        self.code.is_after_bl(addr)
    }

    /// Check whether `addr` lies in a configured code segment
    #[must_use]
    pub fn is_executable(&self, addr: u32) -> bool {
        self.executable.contains(addr)
    }
}
