// Quick test: build an FST from a word list and query it.
//
// Usage:
//   cargo run -p lexfst --example word_index [WORDLIST]
//
// Without an argument a small built-in list is used. Words are sorted and
// deduplicated, and each word maps to its line number.
use std::fs;

use lexfst::{Builder, BuilderConfig, Fst};

fn main() {
    let text = match std::env::args().nth(1) {
        Some(path) => fs::read_to_string(&path).expect("Failed to read word list"),
        None => "monday\ntuesday\nwednesday\nthursday\nfriday\nsaturday\nsunday\n".to_string(),
    };

    let mut words: Vec<&str> = text.lines().filter(|l| !l.is_empty()).collect();
    words.sort_unstable();
    words.dedup();

    let mut builder = Builder::new(Vec::new(), BuilderConfig::default()).expect("builder");
    for (i, word) in words.iter().enumerate() {
        builder.insert(word.as_bytes(), i as u64).expect("insert");
    }
    let stats = builder.stats();
    let fst = Fst::from_bytes(builder.into_inner().expect("close")).expect("load");

    println!(
        "Built {} keys: {} nodes written, {} registry hits, {} bytes",
        fst.len(),
        stats.nodes_written,
        stats.registry_hits,
        fst.size_bytes(),
    );

    let probes = ["monday", "tue", "tuesday", "xyz", "sunday"];
    for probe in &probes {
        match fst.get(probe.as_bytes()).expect("lookup") {
            Some(v) => println!("{:15} → {}", probe, v),
            None => println!("{:15} → (no match)", probe),
        }
    }

    println!("\nKeys starting with 's':");
    for pair in fst.prefix(b"s").expect("prefix").into_pairs() {
        let (key, value) = pair.expect("corrupt fst");
        println!("  {} = {}", String::from_utf8_lossy(&key), value);
    }
}
