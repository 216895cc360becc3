//! Map file parsing and symbol name cleanup
//!
//! Map files come from a mix of toolchains (linker maps, disassembler name
//! exports), one symbol per line:
//!
//! ```text
//! [module:]hexaddress   name
//! ```
//!
//! Lines are filtered rather than rejected: anything that does not parse, or
//! that names a compiler/disassembler-generated label, is skipped silently.

use rustc_demangle::try_demangle;
use serde::Deserialize;

/// Name prefixes of generated labels that never denote a function start.
pub const DEFAULT_IGNORE_PREFIXES: &[&str] = &[
    "__mw_", "0", "(", "loc_", "locret_", "def_", "jpt_", "off_", "Abs ", "dword_", "word_",
    "byte_", "flt_",
];

/// Marks an alias/equate line rather than a function.
const EQUATE_MARKER: &str = " = ";

/// Parse a hexadecimal address, with or without a `0x` prefix.
#[must_use]
pub fn parse_hex_address(text: &str) -> Option<u32> {
    let text = text.trim();
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    if digits.is_empty() {
        return None;
    }
    u32::from_str_radix(digits, 16).ok()
}

/// Name filtering and normalization policy applied while loading map files
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NameCleanup {
    /// Names starting with any of these are skipped
    pub ignore_prefixes: Vec<String>,
    /// Rewrite `__` to the `::` namespace separator
    pub collapse_double_underscore: bool,
    /// Rewrite a literal `(void)` parameter list to `()`
    pub empty_void_params: bool,
    /// Try to demangle names before the rewrites above
    pub demangle: bool,
}

impl Default for NameCleanup {
    fn default() -> Self {
        Self {
            ignore_prefixes: DEFAULT_IGNORE_PREFIXES.iter().map(|p| (*p).to_string()).collect(),
            collapse_double_underscore: true,
            empty_void_params: true,
            demangle: false,
        }
    }
}

impl NameCleanup {
    /// Check whether a raw name is filtered out entirely
    #[must_use]
    pub fn is_ignored(&self, name: &str) -> bool {
        name.contains(EQUATE_MARKER)
            || self.ignore_prefixes.iter().any(|prefix| name.starts_with(prefix.as_str()))
    }

    /// Normalize an accepted name for display
    #[must_use]
    pub fn normalize(&self, name: &str) -> String {
        let mut name = if self.demangle {
            match try_demangle(name) {
                Ok(demangled) => format!("{demangled:#}"),
                Err(_) => name.to_string(),
            }
        } else {
            name.to_string()
        };

        if self.collapse_double_underscore {
            name = name.replace("__", "::");
        }
        if self.empty_void_params {
            name = name.replace("(void)", "()");
        }
        name
    }
}

/// Parse one map file line into `(address, name)`
///
/// Returns `None` for lines that are skipped: blank lines, lines without a
/// name, addresses that are not hexadecimal, ignored prefixes and equates.
#[must_use]
pub fn parse_map_line(line: &str, cleanup: &NameCleanup) -> Option<(u32, String)> {
    let line = line.trim();
    let (addr_token, rest) = line.split_once(char::is_whitespace)?;
    let name = rest.trim_start();
    if name.is_empty() {
        return None;
    }

    // "module:address" keeps only the address part
    let addr_token = match addr_token.find(':') {
        Some(idx) => &addr_token[idx + 1..],
        None => addr_token,
    };
    let addr = parse_hex_address(addr_token)?;

    if cleanup.is_ignored(name) {
        return None;
    }

    Some((addr, cleanup.normalize(name)))
}
