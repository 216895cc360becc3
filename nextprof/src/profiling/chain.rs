//! Call chain reconstruction
//!
//! Turns one sample (pc + raw stack words) into an ordered list of function
//! starts, innermost first. Thread selection happens before this step, see
//! [`Profile::observe_thread`](super::aggregator::Profile::observe_thread).

use log::trace;
use serde::Deserialize;
use std::collections::BTreeSet;

use super::packet::SamplePacket;
use crate::symbolization::SymbolTable;

/// How stack words are turned into chain candidates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ChainPolicy {
    /// `[pc] ++ stack`, keeping stack words that are executable and follow a call
    #[default]
    Heuristic,
    /// `[pc, lr] ++ stack`, keeping every word whose resolved function is executable
    Nearest,
}

/// Ordered function starts of one sample, innermost first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallChain(Vec<u32>);

impl CallChain {
    #[must_use]
    pub fn innermost(&self) -> Option<u32> {
        self.0.first().copied()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Adjacent `(callee, caller)` pairs from the inside out
    pub fn call_pairs(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.0.windows(2).map(|pair| (pair[0], pair[1]))
    }
}

impl From<Vec<u32>> for CallChain {
    fn from(addrs: Vec<u32>) -> Self {
        Self(addrs)
    }
}

/// Per-sample counters of what the reconstructor dropped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChainStats {
    /// Stack words rejected by the executable-range or call-site filter
    pub rejected_candidates: usize,
    /// Candidates with no symbol close enough below them
    pub unresolved_candidates: usize,
    /// Chains cut short at a trace root
    pub stopped_at_root: usize,
}

/// Chain reconstructor - resolves sample addresses against a symbol table
///
/// Holds a shared borrow of the symbol table, so many samples can be
/// reconstructed against the same snapshot.
pub struct ChainReconstructor<'a> {
    symbols: &'a SymbolTable,
    trace_roots: BTreeSet<u32>,
    policy: ChainPolicy,
}

impl<'a> ChainReconstructor<'a> {
    #[must_use]
    pub fn new(symbols: &'a SymbolTable) -> Self {
        Self { symbols, trace_roots: BTreeSet::new(), policy: ChainPolicy::default() }
    }

    /// Stop unwinding at any of these function addresses (inclusive)
    #[must_use]
    pub fn with_trace_roots(mut self, roots: impl IntoIterator<Item = u32>) -> Self {
        self.trace_roots = roots.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: ChainPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn symbols(&self) -> &'a SymbolTable {
        self.symbols
    }

    /// Reconstruct the call chain of one sample
    #[must_use]
    pub fn reconstruct(&self, sample: &SamplePacket) -> CallChain {
        self.reconstruct_counted(sample, &mut ChainStats::default())
    }

    /// Reconstruct the call chain of one sample, accumulating drop counters
    pub fn reconstruct_counted(&self, sample: &SamplePacket, stats: &mut ChainStats) -> CallChain {
        let candidates = self.candidates(sample, stats);

        let mut chain = Vec::with_capacity(candidates.len());
        for addr in candidates {
            let Some((func_addr, _)) = self.symbols.get_nearest(addr) else {
                stats.unresolved_candidates += 1;
                continue;
            };

            if self.policy == ChainPolicy::Nearest && !self.symbols.is_executable(func_addr) {
                stats.rejected_candidates += 1;
                continue;
            }

            chain.push(func_addr);
            if self.trace_roots.contains(&func_addr) {
                stats.stopped_at_root += 1;
                trace!("Chain stopped at trace root 0x{func_addr:08X}");
                break;
            }
        }

        CallChain(chain)
    }

    fn candidates(&self, sample: &SamplePacket, stats: &mut ChainStats) -> Vec<u32> {
        match self.policy {
            ChainPolicy::Heuristic => {
                let mut candidates = Vec::with_capacity(sample.stack.len() + 1);
                candidates.push(sample.pc);
                for &addr in &sample.stack {
                    if self.symbols.is_executable(addr) && self.symbols.is_after_bl(addr) {
                        candidates.push(addr);
                    } else {
                        stats.rejected_candidates += 1;
                    }
                }
                candidates
            }
            ChainPolicy::Nearest => {
                let mut candidates = Vec::with_capacity(sample.stack.len() + 2);
                candidates.push(sample.pc);
                candidates.push(sample.lr);
                candidates.extend_from_slice(&sample.stack);
                candidates
            }
        }
    }
}
