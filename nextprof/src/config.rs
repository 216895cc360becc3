//! Target layout configuration
//!
//! Loaded from an optional TOML file, then overridden by command-line flags:
//!
//! ```toml
//! max_function_length = 0x10000
//! trace_roots = [0x00100000]
//! chain_policy = "heuristic"
//!
//! [[executable_ranges]]
//! start = 0x00100000
//! end = 0x0056B000
//!
//! [[code]]
//! path = "code.bin"
//! base = 0x00100000
//!
//! [symbols]
//! demangle = true
//!
//! [callgraph]
//! min_node_percent = 1.0
//! critical_mode = "direct"
//! ```

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::analysis::CallGraphParams;
use crate::domain::{AddressRange, ProfilerError};
use crate::profiling::ChainPolicy;
use crate::symbolization::{ExecutableRanges, NameCleanup, DEFAULT_CODE_BASE};

/// `[[executable_ranges]]` entry, `end` exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RangeEntry {
    pub start: u32,
    pub end: u32,
}

/// `[[code]]` entry
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CodeEntry {
    pub path: PathBuf,
    #[serde(default)]
    pub base: Option<u32>,
}

impl CodeEntry {
    #[must_use]
    pub fn base_address(&self) -> u32 {
        self.base.unwrap_or(DEFAULT_CODE_BASE)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProfilerConfig {
    pub max_function_length: Option<u32>,
    pub trace_roots: Vec<u32>,
    pub chain_policy: Option<ChainPolicy>,
    pub executable_ranges: Vec<RangeEntry>,
    pub code: Vec<CodeEntry>,
    pub symbols: NameCleanup,
    pub callgraph: CallGraphParams,
}

impl ProfilerConfig {
    /// Load and validate a TOML configuration file
    ///
    /// # Errors
    /// Returns `ProfilerError::FileAccess` if the file cannot be read and
    /// `ProfilerError::Config` if it does not parse or validate.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ProfilerError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|source| ProfilerError::FileAccess { path: path.to_path_buf(), source })?;
        Self::parse(&text, path)
    }

    /// Parse configuration text; `path` names the source in errors and
    /// anchors relative code paths
    ///
    /// # Errors
    /// Returns `ProfilerError::Config` on a syntax error, an unknown key or an
    /// empty executable range.
    pub fn parse(text: &str, path: &Path) -> Result<Self, ProfilerError> {
        let config_error =
            |reason: String| ProfilerError::Config { path: path.to_path_buf(), reason };

        let mut config: Self = toml::from_str(text).map_err(|e| config_error(e.to_string()))?;

        if let Some(bad) = config.executable_ranges.iter().find(|r| r.start >= r.end) {
            return Err(config_error(format!(
                "executable range 0x{:08X}-0x{:08X} is empty",
                bad.start, bad.end
            )));
        }

        if let Some(dir) = path.parent() {
            for entry in &mut config.code {
                if entry.path.is_relative() {
                    entry.path = dir.join(&entry.path);
                }
            }
        }

        Ok(config)
    }

    /// Configured executable ranges
    #[must_use]
    pub fn executable_ranges(&self) -> ExecutableRanges {
        self.executable_ranges.iter().filter_map(|r| AddressRange::new(r.start, r.end)).collect()
    }
}
