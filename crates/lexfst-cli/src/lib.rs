// lexfst-cli: shared utilities for CLI tools.

use std::process;
use std::str::FromStr;

use lexfst::Fst;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter (e.g. `LEXFST_LOG=debug`).
const LOG_ENV: &str = "LEXFST_LOG";

/// Install a stderr subscriber filtered by `LEXFST_LOG`.
///
/// Logging is off unless the variable is set.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("off"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Memory-map an FST file, exiting with a message on failure.
pub fn open_fst(path: &str) -> Fst {
    Fst::open(path).unwrap_or_else(|e| fatal(&format!("failed to open {path}: {e}")))
}

/// Remove an option and its value from `args`.
///
/// Accepts both `--name VALUE` and `--name=VALUE`; `short` (e.g. `-o`) only
/// in the separated form. Returns the last value given.
pub fn take_option(args: &mut Vec<String>, long: &str, short: Option<&str>) -> Option<String> {
    let mut value = None;
    let mut remaining = Vec::with_capacity(args.len());
    let mut iter = std::mem::take(args).into_iter();
    let prefix = format!("{long}=");

    while let Some(arg) = iter.next() {
        if let Some(val) = arg.strip_prefix(&prefix) {
            value = Some(val.to_string());
        } else if arg == long || short == Some(arg.as_str()) {
            match iter.next() {
                Some(val) => value = Some(val),
                None => fatal(&format!("{arg} requires a value")),
            }
        } else {
            remaining.push(arg);
        }
    }

    *args = remaining;
    value
}

/// Remove a boolean flag from `args`, returning whether it was present.
pub fn take_flag(args: &mut Vec<String>, flag: &str) -> bool {
    let before = args.len();
    args.retain(|a| a != flag);
    args.len() != before
}

/// Parse an option value, exiting with a message if it is malformed.
pub fn parse_value<T: FromStr>(name: &str, value: &str) -> T
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .unwrap_or_else(|e| fatal(&format!("invalid value for {name}: {value:?} ({e})")))
}

/// Render a key for display, escaping bytes that are not valid UTF-8.
pub fn display_key(key: &[u8]) -> String {
    match std::str::from_utf8(key) {
        Ok(s) => s.to_string(),
        Err(_) => key.escape_ascii().to_string(),
    }
}

/// Print an error message and exit with code 1.
pub fn fatal(msg: &str) -> ! {
    eprintln!("error: {msg}");
    process::exit(1);
}

/// Check if `--help` or `-h` is in the args.
pub fn wants_help(args: &[String]) -> bool {
    args.iter().any(|a| a == "--help" || a == "-h")
}
