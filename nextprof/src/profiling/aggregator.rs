//! Profile aggregation
//!
//! Accumulates reconstructed call chains into per-function hit counts and
//! caller → callee edge weights.
//!
//! Edges are stored on the caller as `callee address → count` rather than as
//! references between `Function` records, which keeps the structure acyclic,
//! serializable and trivially mergeable.
//!
//! # Performance
//!
//! - `record_chain()`: O(chain length) amortized (HashMap index + BTreeMap edge)
//! - `merge()`: O(functions + edges) of the merged-in profile

use log::info;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use super::chain::CallChain;
use crate::domain::ThreadId;
use crate::symbolization::SymbolTable;

/// Accumulated statistics for one function
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Function {
    /// Start address of the function (resolved symbol address)
    pub address: u32,

    pub name: String,

    /// Samples whose chain contains this function anywhere
    pub hit_count: u64,

    /// Samples whose innermost frame is this function
    pub hit_count_direct: u64,

    /// Outgoing call edges: callee address → call count
    pub callees: BTreeMap<u32, u64>,
}

impl Function {
    fn new(address: u32, name: String) -> Self {
        Self { address, name, hit_count: 0, hit_count_direct: 0, callees: BTreeMap::new() }
    }
}

/// Aggregated profile of a single tracked thread
#[derive(Debug, Clone, Default)]
pub struct Profile {
    /// Thread selected by the first observed sample
    main_thread_id: Option<ThreadId>,

    /// Functions in first-hit order
    functions: Vec<Function>,

    /// Address → index into `functions`
    index: HashMap<u32, usize>,
}

impl Profile {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The tracked thread, once a sample has been observed
    #[must_use]
    pub fn main_thread_id(&self) -> Option<ThreadId> {
        self.main_thread_id
    }

    /// Decide whether a sample from `thread_id` belongs to this profile
    ///
    /// The first thread ever observed becomes the tracked thread for the rest
    /// of the session; samples from any other thread are rejected.
    pub fn observe_thread(&mut self, thread_id: ThreadId) -> bool {
        match self.main_thread_id {
            Some(main) => main == thread_id,
            None => {
                info!("Tracking thread {thread_id}");
                self.main_thread_id = Some(thread_id);
                true
            }
        }
    }

    /// Functions in first-hit order
    #[must_use]
    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    #[must_use]
    pub fn function(&self, address: u32) -> Option<&Function> {
        self.index.get(&address).map(|&idx| &self.functions[idx])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Sum of `hit_count` over all functions
    #[must_use]
    pub fn total_hits(&self) -> u64 {
        self.functions.iter().map(|f| f.hit_count).sum()
    }

    fn function_mut(&mut self, address: u32, name: impl FnOnce() -> String) -> &mut Function {
        let idx = match self.index.get(&address) {
            Some(&idx) => idx,
            None => {
                let idx = self.functions.len();
                self.functions.push(Function::new(address, name()));
                self.index.insert(address, idx);
                idx
            }
        };
        &mut self.functions[idx]
    }

    /// Add one reconstructed chain to the profile
    ///
    /// Every entry gets a hit, the innermost entry also a direct hit, and each
    /// adjacent pair adds one to the caller's edge towards the callee. Names
    /// of new functions come from `symbols`.
    pub fn record_chain(&mut self, chain: &CallChain, symbols: &SymbolTable) {
        let name_of = |addr: u32| {
            symbols.get(addr).map_or_else(|| format!("0x{addr:08X}"), str::to_string)
        };

        for (i, &addr) in chain.as_slice().iter().enumerate() {
            let func = self.function_mut(addr, || name_of(addr));
            func.hit_count += 1;
            if i == 0 {
                func.hit_count_direct += 1;
            }
        }

        for (callee, caller) in chain.call_pairs() {
            let func = self.function_mut(caller, || name_of(caller));
            *func.callees.entry(callee).or_insert(0) += 1;
        }
    }

    /// Fold another profile into this one
    ///
    /// Counts and edge weights add up; functions unknown to `self` are
    /// appended in `other`'s order. The tracked thread of `self` wins when
    /// both are set.
    pub fn merge(&mut self, other: Profile) {
        if self.main_thread_id.is_none() {
            self.main_thread_id = other.main_thread_id;
        }

        for theirs in other.functions {
            let Function { address, name, hit_count, hit_count_direct, callees } = theirs;
            let ours = self.function_mut(address, || name);
            ours.hit_count += hit_count;
            ours.hit_count_direct += hit_count_direct;
            for (callee, count) in callees {
                *ours.callees.entry(callee).or_insert(0) += count;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbols() -> SymbolTable {
        let mut symbols = SymbolTable::new();
        symbols.insert(0x100, "main");
        symbols.insert(0x200, "update");
        symbols.insert(0x300, "draw");
        symbols
    }

    #[test]
    fn test_first_thread_wins() {
        let mut profile = Profile::new();
        assert!(profile.observe_thread(ThreadId(5)));
        assert!(profile.observe_thread(ThreadId(5)));
        assert!(!profile.observe_thread(ThreadId(6)));
        assert_eq!(profile.main_thread_id(), Some(ThreadId(5)));
    }

    #[test]
    fn test_record_single_frame() {
        let symbols = symbols();
        let mut profile = Profile::new();
        profile.record_chain(&CallChain::from(vec![0x200]), &symbols);

        let update = profile.function(0x200).unwrap();
        assert_eq!(update.name, "update");
        assert_eq!(update.hit_count, 1);
        assert_eq!(update.hit_count_direct, 1);
        assert!(profile.function(0x100).is_none());
    }

    #[test]
    fn test_record_chain_counts_and_edges() {
        let symbols = symbols();
        let mut profile = Profile::new();
        let chain = CallChain::from(vec![0x300, 0x200, 0x100]);
        for _ in 0..4 {
            profile.record_chain(&chain, &symbols);
        }

        for addr in [0x100, 0x200, 0x300] {
            assert_eq!(profile.function(addr).unwrap().hit_count, 4);
        }
        assert_eq!(profile.function(0x300).unwrap().hit_count_direct, 4);
        assert_eq!(profile.function(0x200).unwrap().hit_count_direct, 0);
        assert_eq!(profile.function(0x100).unwrap().callees[&0x200], 4);
        assert_eq!(profile.function(0x200).unwrap().callees[&0x300], 4);
        assert!(profile.function(0x300).unwrap().callees.is_empty());
        assert_eq!(profile.total_hits(), 12);
    }

    #[test]
    fn test_functions_keep_first_hit_order() {
        let symbols = symbols();
        let mut profile = Profile::new();
        profile.record_chain(&CallChain::from(vec![0x300, 0x100]), &symbols);
        profile.record_chain(&CallChain::from(vec![0x200, 0x100]), &symbols);

        let order: Vec<u32> = profile.functions().iter().map(|f| f.address).collect();
        assert_eq!(order, vec![0x300, 0x100, 0x200]);
    }

    #[test]
    fn test_unknown_symbol_gets_address_name() {
        let mut profile = Profile::new();
        profile.record_chain(&CallChain::from(vec![0xABC]), &SymbolTable::new());
        assert_eq!(profile.function(0xABC).unwrap().name, "0x00000ABC");
    }

    #[test]
    fn test_empty_chain_changes_nothing() {
        let mut profile = Profile::new();
        profile.record_chain(&CallChain::default(), &symbols());
        assert!(profile.is_empty());
    }

    #[test]
    fn test_merge_sums_counts_and_edges() {
        let symbols = symbols();
        let mut left = Profile::new();
        left.observe_thread(ThreadId(1));
        left.record_chain(&CallChain::from(vec![0x300, 0x100]), &symbols);

        let mut right = Profile::new();
        right.observe_thread(ThreadId(2));
        right.record_chain(&CallChain::from(vec![0x300, 0x100]), &symbols);
        right.record_chain(&CallChain::from(vec![0x200]), &symbols);

        left.merge(right);
        assert_eq!(left.main_thread_id(), Some(ThreadId(1)));
        assert_eq!(left.function(0x300).unwrap().hit_count, 2);
        assert_eq!(left.function(0x100).unwrap().callees[&0x300], 2);
        assert_eq!(left.function(0x200).unwrap().hit_count_direct, 1);
        assert_eq!(left.len(), 3);
    }
}
