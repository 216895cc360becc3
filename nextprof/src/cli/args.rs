//! CLI argument definitions

use clap::Parser;
use std::path::PathBuf;

use crate::analysis::SortKey;
use crate::domain::AddressRange;
use crate::profiling::ChainPolicy;
use crate::symbolization::{parse_hex_address, parse_range};

#[derive(Parser)]
#[command(
    name = "nextprof",
    about = "Build a call-graph profile from a sampling profiler's packet stream",
    after_help = "\
EXAMPLES:
    nextprof -f samples.bin -s game.map --exec-range 00100000-0056B000
    nextprof -f samples.bin -s game.map --code code.bin@00100000 --export-dot graph.dot
    nextprof -f samples.bin --config target.toml --sort direct --limit 20"
)]
pub struct Args {
    /// Sample stream file(s), processed in order into one profile
    #[arg(short = 'f', long = "file", value_name = "STREAM", required = true)]
    pub files: Vec<PathBuf>,

    /// Symbol map file(s) (`[module:]address name` per line)
    #[arg(short, long, value_name = "MAP")]
    pub symbols: Vec<PathBuf>,

    /// Raw code dump, optionally with its load address
    #[arg(long, value_name = "FILE[@ADDR]", value_parser = parse_code_arg)]
    pub code: Vec<CodeArg>,

    /// Load address for --code files given without one
    #[arg(long, value_name = "ADDR", value_parser = parse_address_arg)]
    pub code_base: Option<u32>,

    /// TOML configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Executable address range (end exclusive)
    #[arg(long, value_name = "START-END", value_parser = parse_range_arg)]
    pub exec_range: Vec<AddressRange>,

    /// Stop call chains at this function address (inclusive)
    #[arg(long, value_name = "ADDR", value_parser = parse_address_arg)]
    pub trace_root: Vec<u32>,

    /// How stack words become chain candidates
    #[arg(long, value_enum)]
    pub chain_policy: Option<ChainPolicy>,

    /// Largest distance from a symbol that still resolves to it
    #[arg(long, value_name = "BYTES", value_parser = parse_address_arg)]
    pub max_function_length: Option<u32>,

    /// Start decoding the first stream at this byte offset (later streams start at 0)
    #[arg(long, value_name = "BYTES", default_value = "0")]
    pub offset: usize,

    /// Minimum node percentage for the call graph
    #[arg(long, value_name = "PCT")]
    pub min_node: Option<f64>,

    /// Minimum edge percentage for the call graph
    #[arg(long, value_name = "PCT")]
    pub min_edge: Option<f64>,

    /// Percentage at which a node is fully critical
    #[arg(long, value_name = "PCT")]
    pub critical: Option<f64>,

    /// Base severity on direct hits instead of total hits
    #[arg(long)]
    pub critical_direct: bool,

    /// Sort the function table by this column
    #[arg(long, value_enum, default_value_t = SortKey::Hits)]
    pub sort: SortKey,

    /// Sort ascending instead of descending
    #[arg(long)]
    pub ascending: bool,

    /// Show at most N table rows (0 = all)
    #[arg(long, value_name = "N", default_value = "0")]
    pub limit: usize,

    /// Write a JSON report
    #[arg(long, value_name = "FILE")]
    pub export_json: Option<PathBuf>,

    /// Write the call graph as Graphviz DOT
    #[arg(long, value_name = "FILE")]
    pub export_dot: Option<PathBuf>,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,
}

/// `--code` value: a file and an optional load address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeArg {
    pub path: PathBuf,
    pub base: Option<u32>,
}

fn parse_address_arg(text: &str) -> Result<u32, String> {
    parse_hex_address(text).ok_or_else(|| format!("invalid hexadecimal address: {text}"))
}

fn parse_range_arg(text: &str) -> Result<AddressRange, String> {
    parse_range(text).ok_or_else(|| format!("invalid address range (expected START-END): {text}"))
}

fn parse_code_arg(text: &str) -> Result<CodeArg, String> {
    match text.rsplit_once('@') {
        Some((path, addr)) if !path.is_empty() => {
            Ok(CodeArg { path: PathBuf::from(path), base: Some(parse_address_arg(addr)?) })
        }
        _ => Ok(CodeArg { path: PathBuf::from(text), base: None }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_arg_with_and_without_address() {
        assert_eq!(
            parse_code_arg("dump/code.bin@0x00200000").unwrap(),
            CodeArg { path: PathBuf::from("dump/code.bin"), base: Some(0x0020_0000) }
        );
        assert_eq!(
            parse_code_arg("code.bin").unwrap(),
            CodeArg { path: PathBuf::from("code.bin"), base: None }
        );
        assert!(parse_code_arg("code.bin@zz").is_err());
    }

    #[test]
    fn test_parse_full_command_line() {
        let args = Args::try_parse_from([
            "nextprof",
            "-f",
            "a.bin",
            "--file",
            "b.bin",
            "-s",
            "game.map",
            "--exec-range",
            "00100000-0056B000",
            "--trace-root",
            "0x00100400",
            "--sort",
            "direct",
            "--critical-direct",
            "--offset",
            "16",
        ])
        .unwrap();

        assert_eq!(args.files, vec![PathBuf::from("a.bin"), PathBuf::from("b.bin")]);
        assert_eq!(args.exec_range, vec![AddressRange::new(0x0010_0000, 0x0056_B000).unwrap()]);
        assert_eq!(args.trace_root, vec![0x0010_0400]);
        assert_eq!(args.sort, SortKey::Direct);
        assert!(args.critical_direct);
        assert_eq!(args.offset, 16);
        assert_eq!(args.limit, 0);
        assert!(args.chain_policy.is_none());
    }

    #[test]
    fn test_stream_file_is_required() {
        assert!(Args::try_parse_from(["nextprof", "-s", "game.map"]).is_err());
    }

    #[test]
    fn test_bad_range_is_rejected() {
        assert!(Args::try_parse_from(["nextprof", "-f", "a.bin", "--exec-range", "2000-1000"])
            .is_err());
    }
}
