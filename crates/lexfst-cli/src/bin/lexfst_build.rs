// lexfst-build: Build an FST from key/value lines on stdin.
//
// Each input line is either `key<TAB>value` or a bare `key` (value 0).
// Keys must arrive in strictly increasing byte order unless --sort is given.
//
// Usage:
//   lexfst-build -o OUT [OPTIONS] < pairs.tsv
//
// Options:
//   -o, --output PATH      Output file
//   --table-size N         Registry bucket count (0 disables minimization)
//   --mru-size N           Registry cells per bucket
//   --width N              Output width in bytes (0-8)
//   --sort                 Sort and deduplicate input first (last value wins)
//   -h, --help             Print help

use std::collections::BTreeMap;
use std::io::{self, BufRead};

use lexfst::{Builder, BuilderConfig};

/// Split an input line into key and value.
fn parse_line(line: &str, lineno: usize) -> (Vec<u8>, u64) {
    match line.split_once('\t') {
        Some((key, value)) => {
            let value = value.trim().parse().unwrap_or_else(|e| {
                lexfst_cli::fatal(&format!("line {lineno}: invalid value {value:?} ({e})"))
            });
            (key.as_bytes().to_vec(), value)
        }
        None => (line.as_bytes().to_vec(), 0),
    }
}

fn main() {
    lexfst_cli::init_tracing();
    let mut args: Vec<String> = std::env::args().skip(1).collect();

    if lexfst_cli::wants_help(&args) {
        println!("lexfst-build: Build an FST from key/value lines on stdin.");
        println!();
        println!("Usage: lexfst-build -o OUT [OPTIONS] < pairs.tsv");
        println!();
        println!("Input lines are `key<TAB>value` or a bare `key` (value 0).");
        println!();
        println!("Options:");
        println!("  -o, --output PATH   Output file");
        println!("  --table-size N      Registry bucket count (0 disables minimization)");
        println!("  --mru-size N        Registry cells per bucket");
        println!("  --width N           Output width in bytes (0-8)");
        println!("  --sort              Sort and deduplicate input first (last value wins)");
        println!("  -h, --help          Print this help");
        return;
    }

    let output = lexfst_cli::take_option(&mut args, "--output", Some("-o"))
        .unwrap_or_else(|| lexfst_cli::fatal("missing -o OUT"));
    let mut config = BuilderConfig::default();
    if let Some(v) = lexfst_cli::take_option(&mut args, "--table-size", None) {
        config.registry_table_size = lexfst_cli::parse_value("--table-size", &v);
    }
    if let Some(v) = lexfst_cli::take_option(&mut args, "--mru-size", None) {
        config.registry_mru_size = lexfst_cli::parse_value("--mru-size", &v);
    }
    if let Some(v) = lexfst_cli::take_option(&mut args, "--width", None) {
        config.output_width = lexfst_cli::parse_value("--width", &v);
    }
    let sort = lexfst_cli::take_flag(&mut args, "--sort");
    if let Some(extra) = args.first() {
        lexfst_cli::fatal(&format!("unexpected argument: {extra}"));
    }

    let mut builder = Builder::create(&output, config)
        .unwrap_or_else(|e| lexfst_cli::fatal(&format!("{output}: {e}")));

    let stdin = io::stdin();
    let mut sorted = BTreeMap::new();
    for (i, line) in stdin.lock().lines().enumerate() {
        let lineno = i + 1;
        let line = line.unwrap_or_else(|e| lexfst_cli::fatal(&format!("error reading stdin: {e}")));
        let (key, value) = parse_line(&line, lineno);
        if sort {
            sorted.insert(key, value);
        } else if let Err(e) = builder.insert(&key, value) {
            lexfst_cli::fatal(&format!("line {lineno}: {e}"));
        }
    }
    if sort {
        tracing::debug!(pairs = sorted.len(), "input sorted");
        builder
            .extend(sorted)
            .unwrap_or_else(|e| lexfst_cli::fatal(&e.to_string()));
    }

    builder
        .close_synced()
        .unwrap_or_else(|e| lexfst_cli::fatal(&format!("{output}: {e}")));
    let stats = builder.stats();
    eprintln!(
        "{output}: {} keys, {} nodes, {} registry hits, {} bytes",
        stats.keys, stats.nodes_written, stats.registry_hits, stats.bytes_written
    );
}
