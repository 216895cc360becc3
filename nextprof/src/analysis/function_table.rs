//! Sortable function table for display.
//!
//! Flattens the profile into one row per function with its share of the
//! total hits, in the column order the presentation layer expects:
//!
//! ```text
//! Address     Name                      Total Hits  Direct Hits
//! 0x00100200  Game::Draw()                     310          290
//! 0x00100100  Game::Update()                   512          140
//! ```

// Percentage calculations intentionally convert u64 to f64
#![allow(clippy::cast_precision_loss)]

use serde::Serialize;

use crate::profiling::Profile;

/// Column to sort the table by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum SortKey {
    Address,
    Name,
    #[default]
    Hits,
    Direct,
}

/// One row of the function table (the view model for presentation).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionRow {
    pub address: u32,
    pub name: String,
    pub hit_count: u64,
    pub hit_count_direct: u64,
    /// Percentage of the total hits (0.0 - 100.0)
    pub percentage: f64,
    pub direct_percentage: f64,
}

/// Build the function table in the profile's first-hit order.
#[must_use]
pub fn function_rows(profile: &Profile) -> Vec<FunctionRow> {
    let total = profile.total_hits();
    let share = |count: u64| {
        if total > 0 {
            count as f64 / total as f64 * 100.0
        } else {
            0.0
        }
    };

    profile
        .functions()
        .iter()
        .map(|f| FunctionRow {
            address: f.address,
            name: f.name.clone(),
            hit_count: f.hit_count,
            hit_count_direct: f.hit_count_direct,
            percentage: share(f.hit_count),
            direct_percentage: share(f.hit_count_direct),
        })
        .collect()
}

/// Sort rows by `key`; ties keep their previous relative order.
pub fn sort_rows(rows: &mut [FunctionRow], key: SortKey, descending: bool) {
    match key {
        SortKey::Address => rows.sort_by_key(|r| r.address),
        SortKey::Name => rows.sort_by(|a, b| a.name.cmp(&b.name)),
        SortKey::Hits => rows.sort_by_key(|r| r.hit_count),
        SortKey::Direct => rows.sort_by_key(|r| r.hit_count_direct),
    }
    if descending {
        rows.reverse();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiling::CallChain;
    use crate::symbolization::SymbolTable;

    fn create_test_profile() -> Profile {
        let mut symbols = SymbolTable::new();
        symbols.insert(0x300, "alpha");
        symbols.insert(0x100, "gamma");
        symbols.insert(0x200, "beta");

        let mut profile = Profile::new();
        profile.record_chain(&CallChain::from(vec![0x300, 0x100]), &symbols);
        profile.record_chain(&CallChain::from(vec![0x300, 0x100]), &symbols);
        profile.record_chain(&CallChain::from(vec![0x200, 0x100]), &symbols);
        profile
    }

    #[test]
    fn test_rows_follow_profile_order() {
        let rows = function_rows(&create_test_profile());
        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "gamma", "beta"]);
    }

    #[test]
    fn test_rows_calculate_percentages() {
        // total hits: alpha 2 + gamma 3 + beta 1 = 6
        let rows = function_rows(&create_test_profile());
        assert!((rows[1].percentage - 50.0).abs() < 0.01);
        assert!((rows[0].direct_percentage - 33.333).abs() < 0.01);
        assert_eq!(rows[1].direct_percentage, 0.0);
    }

    #[test]
    fn test_sort_by_each_column() {
        let mut rows = function_rows(&create_test_profile());

        sort_rows(&mut rows, SortKey::Address, false);
        assert_eq!(rows.iter().map(|r| r.address).collect::<Vec<_>>(), vec![0x100, 0x200, 0x300]);

        sort_rows(&mut rows, SortKey::Name, false);
        assert_eq!(rows[0].name, "alpha");

        sort_rows(&mut rows, SortKey::Hits, true);
        assert_eq!(rows[0].name, "gamma");

        sort_rows(&mut rows, SortKey::Direct, true);
        assert_eq!(rows[0].name, "alpha");
        assert_eq!(rows[2].name, "gamma");
    }

    #[test]
    fn test_empty_profile_gives_no_rows() {
        assert!(function_rows(&Profile::new()).is_empty());
    }
}
