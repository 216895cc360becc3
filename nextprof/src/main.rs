//! # nextprof - Main Entry Point
//!
//! Reads one or more recorded sample streams, reconstructs call chains
//! against a symbol map and prints the resulting function table. The call
//! graph can be exported as a JSON report or Graphviz DOT.

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::fs::File;
use std::io::{BufWriter, Write};

use nextprof::analysis::{
    build_call_graph, function_rows, sort_rows, CallGraphParams, CriticalMode,
};
use nextprof::cli::Args;
use nextprof::config::ProfilerConfig;
use nextprof::domain::ProfilerError;
use nextprof::export::{write_dot, ProfileReport};
use nextprof::profiling::{
    display_function_table, display_statistics, ChainReconstructor, Profile, SampleProcessor,
};
use nextprof::symbolization::{SymbolTable, DEFAULT_CODE_BASE};

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_USAGE: i32 = 2;

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            let code = exit_code_for(&e);
            eprintln!("error: {e:#}");
            code
        }
    });
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<ProfilerError>() {
        Some(ProfilerError::Config { .. }) => EXIT_USAGE,
        _ => EXIT_ERROR,
    }
}

/// Build the symbol table from the configuration file and CLI flags.
///
/// CLI ranges and code dumps are added on top of the configured ones.
fn build_symbol_table(args: &Args, config: &ProfilerConfig) -> Result<SymbolTable> {
    let mut symbols = SymbolTable::new();
    symbols.set_name_cleanup(config.symbols.clone());
    if let Some(len) = args.max_function_length.or(config.max_function_length) {
        symbols.set_max_function_len(len);
    }

    let mut ranges = config.executable_ranges();
    for range in &args.exec_range {
        ranges.insert(*range);
    }
    symbols.set_executable_ranges(ranges);

    for path in &args.symbols {
        symbols
            .load_from_file(path)
            .with_context(|| format!("Failed to load symbols from {}", path.display()))?;
    }

    let default_base = args.code_base.unwrap_or(DEFAULT_CODE_BASE);
    let code = config
        .code
        .iter()
        .map(|entry| (&entry.path, entry.base_address()))
        .chain(args.code.iter().map(|arg| (&arg.path, arg.base.unwrap_or(default_base))));
    for (path, base) in code {
        symbols
            .load_code_from_file(path, base)
            .with_context(|| format!("Failed to load code from {}", path.display()))?;
    }

    Ok(symbols)
}

fn call_graph_params(args: &Args, config: &ProfilerConfig) -> CallGraphParams {
    let mut params = config.callgraph;
    if let Some(pct) = args.min_node {
        params.min_node_percent = pct;
    }
    if let Some(pct) = args.min_edge {
        params.min_edge_percent = pct;
    }
    if let Some(pct) = args.critical {
        params.critical_percent = pct;
    }
    if args.critical_direct {
        params.critical_mode = CriticalMode::Direct;
    }
    params
}

fn run() -> Result<()> {
    let args = Args::parse();
    let quiet = args.quiet;

    let config = match &args.config {
        Some(path) => ProfilerConfig::load(path)?,
        None => ProfilerConfig::default(),
    };

    let symbols = build_symbol_table(&args, &config)?;
    if !quiet {
        println!("symbols: {}, code blobs: {}", symbols.len(), symbols.code_blobs().len());
    }

    let reconstructor = ChainReconstructor::new(&symbols)
        .with_trace_roots(config.trace_roots.iter().chain(&args.trace_root).copied())
        .with_policy(args.chain_policy.or(config.chain_policy).unwrap_or_default());
    let mut processor = SampleProcessor::new(reconstructor);
    let mut profile = Profile::new();

    for (i, path) in args.files.iter().enumerate() {
        let offset = if i == 0 { args.offset } else { 0 };
        match processor.process_file(&mut profile, path, offset) {
            Ok(end) => info!("{}: decoded up to byte {end}", path.display()),
            // Everything decoded before the bad packet stays in the profile
            Err(ProfilerError::Packet(e)) => eprintln!("warning: {}: {e}", path.display()),
            Err(e) => return Err(e.into()),
        }
    }

    if !quiet {
        if let Some(tid) = profile.main_thread_id() {
            println!("thread: {tid}, total hits: {}", profile.total_hits());
        }
        display_statistics(&processor.stats);
    }

    let mut rows = function_rows(&profile);
    sort_rows(&mut rows, args.sort, !args.ascending);
    display_function_table(&rows, args.limit);

    let params = call_graph_params(&args, &config);

    if let Some(ref export_path) = args.export_json {
        let file = File::create(export_path).context("Failed to create JSON output file")?;
        let mut writer = BufWriter::new(file);
        ProfileReport::new(&profile, &params)
            .export(&mut writer)
            .context("Failed to export JSON report")?;
        writer.flush().context("Failed to export JSON report")?;
        if !quiet {
            println!("saved: {}", export_path.display());
        }
    }

    if let Some(ref export_path) = args.export_dot {
        let file = File::create(export_path).context("Failed to create DOT output file")?;
        let graph = build_call_graph(&profile, &params);
        let mut writer = BufWriter::new(file);
        write_dot(&graph, &mut writer).context("Failed to export call graph")?;
        writer.flush().context("Failed to export call graph")?;
        if !quiet {
            println!("saved: {}", export_path.display());
        }
    }

    Ok(())
}
