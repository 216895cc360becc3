//! Graphviz DOT description of a call graph
//!
//! Rendering the description to an image is left to `dot` itself:
//!
//! ```bash
//! nextprof -f game.bin -s game.map --export-dot graph.dot
//! dot -Tsvg graph.dot -o graph.svg
//! ```

// Colour interpolation intentionally rounds f64 channels to u8
#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use std::io::Write;

use crate::analysis::CallGraph;
use crate::domain::ExportError;

/// Longest node name shown before truncation
const MAX_NAME_LEN: usize = 50;

/// Severity gradient: grey → yellow → orange → red
const GRADIENT: [(f64, [u8; 3]); 4] = [
    (0.0, [0xbd, 0xc3, 0xc7]),
    (0.33, [0xf1, 0xc4, 0x0f]),
    (0.66, [0xe6, 0x7e, 0x22]),
    (1.0, [0xe7, 0x4c, 0x3c]),
];

/// Fill colour for a severity in `[0, 1]` as `#rrggbb`
#[must_use]
pub fn severity_color(severity: f64) -> String {
    let s = severity.clamp(0.0, 1.0);
    let upper = GRADIENT.iter().position(|&(stop, _)| s <= stop).unwrap_or(GRADIENT.len() - 1);
    if upper == 0 {
        return hex(GRADIENT[0].1);
    }

    let (lo_stop, lo) = GRADIENT[upper - 1];
    let (hi_stop, hi) = GRADIENT[upper];
    let t = (s - lo_stop) / (hi_stop - lo_stop);
    let mix = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8;
    hex([mix(lo[0], hi[0]), mix(lo[1], hi[1]), mix(lo[2], hi[2])])
}

fn hex([r, g, b]: [u8; 3]) -> String {
    format!("#{r:02x}{g:02x}{b:02x}")
}

fn truncate_name(name: &str) -> String {
    if name.chars().count() <= MAX_NAME_LEN {
        name.to_string()
    } else {
        let head: String = name.chars().take(MAX_NAME_LEN - 3).collect();
        format!("{head}...")
    }
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Write `graph` as a DOT digraph
///
/// # Errors
/// Returns `ExportError::Io` if the writer fails.
pub fn write_dot<W: Write>(graph: &CallGraph, mut writer: W) -> Result<(), ExportError> {
    writeln!(writer, "digraph callgraph {{")?;
    writeln!(writer, "    rankdir=TB;")?;
    writeln!(writer, "    node [shape=box, style=filled, fontname=\"monospace\"];")?;
    writeln!(writer, "    edge [fontname=\"monospace\", fontsize=10];")?;

    for node in &graph.nodes {
        let mut label = format!(
            "{}\\n{:.1}% ({})",
            escape(&truncate_name(&node.name)),
            node.percentage,
            node.hit_count
        );
        if node.hit_count_direct > 0 {
            label.push_str(&format!(
                "\\n{:.1}% direct ({})",
                node.direct_percentage, node.hit_count_direct
            ));
        }
        writeln!(
            writer,
            "    func_{:x} [label=\"{label}\", fillcolor=\"{}\"];",
            node.address,
            severity_color(node.severity)
        )?;
    }

    for edge in &graph.edges {
        writeln!(
            writer,
            "    func_{:x} -> func_{:x} [label=\"{:.1}%\"];",
            edge.caller, edge.callee, edge.percentage
        )?;
    }

    writeln!(writer, "}}")?;
    Ok(())
}
