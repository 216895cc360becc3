use std::fmt::Write as _;

use super::event_processor::ProcessingStats;
use crate::analysis::FunctionRow;

/// Display processing statistics
pub fn display_statistics(stats: &ProcessingStats) {
    eprintln!(
        "stats: packets={} tracked={} ignored={} empty_chains={}",
        stats.packets_decoded, stats.samples_tracked, stats.samples_ignored, stats.empty_chains
    );
    eprintln!(
        "chain: rejected={} unresolved={} stopped_at_root={}",
        stats.chain.rejected_candidates,
        stats.chain.unresolved_candidates,
        stats.chain.stopped_at_root
    );
}

/// Render the function table, at most `limit` rows (0 = all)
#[must_use]
pub fn format_function_table(rows: &[FunctionRow], limit: usize) -> String {
    let shown = if limit == 0 { rows.len() } else { limit.min(rows.len()) };
    let name_width = rows[..shown].iter().map(|r| r.name.chars().count()).max().unwrap_or(0).max(4);

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<10}  {:<name_width$}  {:>10} {:>7}  {:>11} {:>7}",
        "Address", "Name", "Total Hits", "%", "Direct Hits", "%"
    );
    for row in &rows[..shown] {
        let _ = writeln!(
            out,
            "0x{:08X}  {:<name_width$}  {:>10} {:>6.2}%  {:>11} {:>6.2}%",
            row.address,
            row.name,
            row.hit_count,
            row.percentage,
            row.hit_count_direct,
            row.direct_percentage
        );
    }
    if shown < rows.len() {
        let _ = writeln!(out, "... {} more", rows.len() - shown);
    }
    out
}

/// Display the function table on stdout
pub fn display_function_table(rows: &[FunctionRow], limit: usize) {
    print!("{}", format_function_table(rows, limit));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(address: u32, name: &str, hits: u64) -> FunctionRow {
        FunctionRow {
            address,
            name: name.to_string(),
            hit_count: hits,
            hit_count_direct: hits / 2,
            percentage: 50.0,
            direct_percentage: 25.0,
        }
    }

    #[test]
    fn test_table_formats_addresses_and_percentages() {
        let table = format_function_table(&[row(0x0010_0100, "Game::Update()", 512)], 0);
        let line = table.lines().nth(1).unwrap();
        assert!(line.starts_with("0x00100100  Game::Update()"));
        assert!(line.contains("512"));
        assert!(line.contains("50.00%"));
        assert!(line.contains("25.00%"));
    }

    #[test]
    fn test_table_limit() {
        let rows = vec![row(1, "a", 3), row(2, "b", 2), row(3, "c", 1)];
        let table = format_function_table(&rows, 2);
        assert_eq!(table.lines().count(), 4);
        assert!(table.ends_with("... 1 more\n"));
    }

    #[test]
    fn test_empty_table_has_header_only() {
        assert_eq!(format_function_table(&[], 10).lines().count(), 1);
    }
}
