// lexfst-dump: Print the keys of an FST in order.
//
// Output is one `key<TAB>value` line per key. Keys that are not valid UTF-8
// are printed with escapes.
//
// Usage:
//   lexfst-dump FST [--start K] [--end K] [--prefix P]
//
// Options:
//   --start K     First key to include
//   --end K       Stop before this key
//   --prefix P    Only keys starting with P (overrides --start/--end)
//   -h, --help    Print help

use std::io::{self, Write};

fn main() {
    lexfst_cli::init_tracing();
    let mut args: Vec<String> = std::env::args().skip(1).collect();

    if lexfst_cli::wants_help(&args) {
        println!("lexfst-dump: Print the keys of an FST in order.");
        println!();
        println!("Usage: lexfst-dump FST [--start K] [--end K] [--prefix P]");
        println!();
        println!("Options:");
        println!("  --start K     First key to include");
        println!("  --end K       Stop before this key");
        println!("  --prefix P    Only keys starting with P (overrides --start/--end)");
        println!("  -h, --help    Print this help");
        return;
    }

    let start = lexfst_cli::take_option(&mut args, "--start", None);
    let end = lexfst_cli::take_option(&mut args, "--end", None);
    let prefix = lexfst_cli::take_option(&mut args, "--prefix", None);
    let path = match args.as_slice() {
        [path] => path.clone(),
        _ => lexfst_cli::fatal("expected exactly one FST path"),
    };

    let fst = lexfst_cli::open_fst(&path);
    let it = match &prefix {
        Some(p) => fst.prefix(p.as_bytes()),
        None => fst.range(start.as_deref().map(str::as_bytes), end.as_deref().map(str::as_bytes)),
    }
    .unwrap_or_else(|e| lexfst_cli::fatal(&e.to_string()));

    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    for pair in it.into_pairs() {
        let (key, value) = pair.unwrap_or_else(|e| lexfst_cli::fatal(&e.to_string()));
        if writeln!(out, "{}\t{value}", lexfst_cli::display_key(&key)).is_err() {
            // Broken pipe (e.g. piped into `head`).
            break;
        }
    }
}
