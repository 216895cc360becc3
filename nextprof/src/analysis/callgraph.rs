//! Thresholded call graph derived from a profile.
//!
//! The graph is a pure function of the profile snapshot and the threshold
//! parameters: building it never touches the profile, so thresholds can be
//! tuned repeatedly without re-reading the sample stream.
//!
//! # Percentages
//!
//! ```text
//! node %      = hit_count / Σ hit_count × 100
//! direct %    = hit_count_direct / Σ hit_count × 100
//! edge %      = call_count / caller.hit_count × 100
//! severity    = min(node % (or direct %) / critical %, 1.0)
//! ```

// Percentage calculations intentionally convert u64 to f64
#![allow(clippy::cast_precision_loss)]

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::profiling::Profile;

/// Smallest critical percentage used when normalizing severity.
const MIN_CRITICAL_PERCENT: f64 = 0.001;

/// Which percentage drives the severity score
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CriticalMode {
    /// Anywhere in the chain (self + callees)
    #[default]
    Cumulative,
    /// Innermost frame only (self)
    Direct,
}

/// Threshold parameters for [`build_call_graph`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CallGraphParams {
    pub min_node_percent: f64,
    pub min_edge_percent: f64,
    pub critical_percent: f64,
    pub critical_mode: CriticalMode,
}

impl Default for CallGraphParams {
    fn default() -> Self {
        Self {
            min_node_percent: 1.0,
            min_edge_percent: 5.0,
            critical_percent: 5.0,
            critical_mode: CriticalMode::Cumulative,
        }
    }
}

/// A function that passed the node threshold
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallGraphNode {
    pub address: u32,
    pub name: String,
    pub hit_count: u64,
    pub hit_count_direct: u64,
    pub percentage: f64,
    pub direct_percentage: f64,
    /// Presentation hint in `[0, 1]`, 1.0 at or above the critical percentage
    pub severity: f64,
}

/// A caller → callee edge between two included nodes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallGraphEdge {
    pub caller: u32,
    pub callee: u32,
    pub call_count: u64,
    /// Share of the caller's hits that went through this edge
    pub percentage: f64,
}

/// Filtered, weighted call graph ready for rendering
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CallGraph {
    /// Nodes in the profile's function order
    pub nodes: Vec<CallGraphNode>,
    /// Edges grouped by caller in node order, callees by address
    pub edges: Vec<CallGraphEdge>,
}

impl CallGraph {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn node(&self, address: u32) -> Option<&CallGraphNode> {
        self.nodes.iter().find(|n| n.address == address)
    }
}

/// Build the call graph of `profile` under `params`
#[must_use]
pub fn build_call_graph(profile: &Profile, params: &CallGraphParams) -> CallGraph {
    let total = profile.total_hits();
    if total == 0 {
        return CallGraph::default();
    }
    let total = total as f64;
    let critical = params.critical_percent.max(MIN_CRITICAL_PERCENT);

    let included: Vec<_> = profile
        .functions()
        .iter()
        .filter(|f| f.hit_count as f64 / total * 100.0 >= params.min_node_percent)
        .collect();
    let included_addrs: HashSet<u32> = included.iter().map(|f| f.address).collect();
    let included_addrs = &included_addrs;

    let nodes = included
        .iter()
        .map(|f| {
            let percentage = f.hit_count as f64 / total * 100.0;
            let direct_percentage = f.hit_count_direct as f64 / total * 100.0;
            let critical_basis = match params.critical_mode {
                CriticalMode::Cumulative => percentage,
                CriticalMode::Direct => direct_percentage,
            };
            CallGraphNode {
                address: f.address,
                name: f.name.clone(),
                hit_count: f.hit_count,
                hit_count_direct: f.hit_count_direct,
                percentage,
                direct_percentage,
                severity: (critical_basis / critical).min(1.0),
            }
        })
        .collect();

    let edges = included
        .iter()
        .flat_map(|&caller| {
            caller.callees.iter().filter_map(move |(&callee, &call_count)| {
                if !included_addrs.contains(&callee) || caller.hit_count == 0 {
                    return None;
                }
                let percentage = call_count as f64 / caller.hit_count as f64 * 100.0;
                (percentage >= params.min_edge_percent).then_some(CallGraphEdge {
                    caller: caller.address,
                    callee,
                    call_count,
                    percentage,
                })
            })
        })
        .collect();

    CallGraph { nodes, edges }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiling::CallChain;
    use crate::symbolization::SymbolTable;

    /// main → update → draw (×3), main → update (×1)
    fn profile() -> Profile {
        let mut symbols = SymbolTable::new();
        symbols.insert(0x100, "main");
        symbols.insert(0x200, "update");
        symbols.insert(0x300, "draw");

        let mut profile = Profile::new();
        for _ in 0..3 {
            profile.record_chain(&CallChain::from(vec![0x300, 0x200, 0x100]), &symbols);
        }
        profile.record_chain(&CallChain::from(vec![0x200, 0x100]), &symbols);
        profile
    }

    fn all() -> CallGraphParams {
        CallGraphParams { min_node_percent: 0.0, min_edge_percent: 0.0, ..Default::default() }
    }

    #[test]
    fn test_empty_profile_gives_empty_graph() {
        let graph = build_call_graph(&Profile::new(), &all());
        assert!(graph.is_empty());
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn test_zero_thresholds_include_everything() {
        let graph = build_call_graph(&profile(), &all());
        assert_eq!(graph.nodes.len(), 3);
        assert_eq!(graph.edges.len(), 2);
    }

    #[test]
    fn test_percentages() {
        // total hits: main 4 + update 4 + draw 3 = 11
        let graph = build_call_graph(&profile(), &all());

        let draw = graph.node(0x300).unwrap();
        assert!((draw.percentage - 3.0 / 11.0 * 100.0).abs() < 1e-9);
        assert!((draw.direct_percentage - 3.0 / 11.0 * 100.0).abs() < 1e-9);

        let main = graph.node(0x100).unwrap();
        assert_eq!(main.direct_percentage, 0.0);

        let edge = graph.edges.iter().find(|e| e.caller == 0x200).unwrap();
        assert_eq!(edge.callee, 0x300);
        assert_eq!(edge.call_count, 3);
        assert!((edge.percentage - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_node_threshold_drops_nodes_and_their_edges() {
        let params = CallGraphParams { min_node_percent: 30.0, min_edge_percent: 0.0, ..all() };
        let graph = build_call_graph(&profile(), &params);

        let addrs: Vec<u32> = graph.nodes.iter().map(|n| n.address).collect();
        assert_eq!(addrs, vec![0x200, 0x100]);
        assert_eq!(graph.edges.len(), 1);
        assert_eq!((graph.edges[0].caller, graph.edges[0].callee), (0x100, 0x200));
    }

    #[test]
    fn test_thresholds_above_max_empty_the_graph() {
        let graph =
            build_call_graph(&profile(), &CallGraphParams { min_node_percent: 50.0, ..all() });
        assert!(graph.nodes.is_empty());

        let graph =
            build_call_graph(&profile(), &CallGraphParams { min_edge_percent: 100.1, ..all() });
        assert_eq!(graph.nodes.len(), 3);
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn test_severity_normalization() {
        let params = CallGraphParams { critical_percent: 30.0, ..all() };
        let graph = build_call_graph(&profile(), &params);

        // update: 4/11 = 36% >= 30% → saturated
        assert_eq!(graph.node(0x200).unwrap().severity, 1.0);
        // draw: 27.3% / 30%
        let draw = graph.node(0x300).unwrap();
        assert!((draw.severity - (3.0 / 11.0 * 100.0) / 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_direct_critical_mode() {
        let params =
            CallGraphParams { critical_percent: 30.0, critical_mode: CriticalMode::Direct, ..all() };
        let graph = build_call_graph(&profile(), &params);
        assert_eq!(graph.node(0x100).unwrap().severity, 0.0);
    }

    #[test]
    fn test_zero_critical_percent_is_clamped() {
        let params = CallGraphParams { critical_percent: 0.0, ..all() };
        let graph = build_call_graph(&profile(), &params);
        assert!(graph.nodes.iter().all(|n| n.severity == 1.0));
    }

    #[test]
    fn test_building_leaves_profile_untouched() {
        let profile = profile();
        let before = profile.functions().to_vec();
        let _ = build_call_graph(&profile, &all());
        let _ = build_call_graph(&profile, &CallGraphParams::default());
        assert_eq!(profile.functions(), before.as_slice());
    }
}
