// lexfst-get: Look up keys in an FST.
//
// Prints `key<TAB>value` for every key found and `key<TAB>-` otherwise.
// Keys come from the command line, or from stdin (one per line) if none
// are given.
//
// Usage:
//   lexfst-get FST [KEY...]

use std::io::{self, BufRead, Write};

use lexfst::Fst;

fn lookup(fst: &Fst, key: &str, out: &mut impl Write) {
    match fst.get(key.as_bytes()) {
        Ok(Some(value)) => {
            let _ = writeln!(out, "{key}\t{value}");
        }
        Ok(None) => {
            let _ = writeln!(out, "{key}\t-");
        }
        Err(e) => lexfst_cli::fatal(&format!("lookup of {key:?} failed: {e}")),
    }
}

fn main() {
    lexfst_cli::init_tracing();
    let args: Vec<String> = std::env::args().skip(1).collect();

    if lexfst_cli::wants_help(&args) || args.is_empty() {
        println!("lexfst-get: Look up keys in an FST.");
        println!();
        println!("Usage: lexfst-get FST [KEY...]");
        println!();
        println!("Without KEY arguments, keys are read from stdin (one per line).");
        println!("Prints `key<TAB>value`, or `key<TAB>-` for absent keys.");
        return;
    }

    let fst = lexfst_cli::open_fst(&args[0]);
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());

    if args.len() > 1 {
        for key in &args[1..] {
            lookup(&fst, key, &mut out);
        }
        return;
    }

    for line in io::stdin().lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("error reading stdin: {e}");
                break;
            }
        };
        lookup(&fst, &line, &mut out);
    }
}
