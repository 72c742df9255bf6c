// lexfst-info: Print FST metadata as JSON.
//
// Usage:
//   lexfst-info FST

use serde::Serialize;

#[derive(Serialize)]
struct Info<'a> {
    path: &'a str,
    version: u32,
    keys: u64,
    nodes: usize,
    bytes: usize,
    output_width: u8,
    root_addr: u64,
}

fn main() {
    lexfst_cli::init_tracing();
    let args: Vec<String> = std::env::args().skip(1).collect();

    if lexfst_cli::wants_help(&args) || args.len() != 1 {
        println!("lexfst-info: Print FST metadata as JSON.");
        println!();
        println!("Usage: lexfst-info FST");
        return;
    }

    let path = &args[0];
    let fst = lexfst_cli::open_fst(path);
    let nodes = fst
        .node_count()
        .unwrap_or_else(|e| lexfst_cli::fatal(&format!("{path}: {e}")));

    let info = Info {
        path,
        version: fst.version(),
        keys: fst.len(),
        nodes,
        bytes: fst.size_bytes(),
        output_width: fst.output_width(),
        root_addr: fst.root_addr(),
    };
    match serde_json::to_string_pretty(&info) {
        Ok(json) => println!("{json}"),
        Err(e) => lexfst_cli::fatal(&e.to_string()),
    }
}
