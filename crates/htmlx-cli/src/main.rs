use clap::{ArgAction, Parser, Subcommand};
use htmlx_parser::{ParseOptions, ParseResult};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "htmlx")]
#[command(about = "HTMLX template parser")]
#[command(version)]
struct Cli {
    /// Increase logging verbosity (-v: debug, -vv+: trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a template and print its AST and errors as JSON
    Parse {
        /// Input template file
        path: String,

        /// Print JSON on a single line
        #[arg(long)]
        compact: bool,

        /// Keep trailing whitespace at the end of the document
        #[arg(long)]
        keep_trailing_whitespace: bool,
    },

    /// Check a template for errors without printing the AST
    Check {
        /// Input template file
        path: String,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(directive_for_verbosity(cli.verbose))),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Parse {
            path,
            compact,
            keep_trailing_whitespace,
        } => cmd_parse(&path, compact, keep_trailing_whitespace),
        Command::Check { path } => cmd_check(&path),
    }
}

fn directive_for_verbosity(v: u8) -> &'static str {
    // Targets are module paths, so each crate is listed by its own name.
    match v {
        0 => "htmlx_cli=warn,htmlx_parser=warn,htmlx_lexer=warn",
        1 => "htmlx_cli=debug,htmlx_parser=debug,htmlx_lexer=debug",
        _ => "htmlx_cli=trace,htmlx_parser=trace,htmlx_lexer=trace",
    }
}

fn read_source(path: &str) -> String {
    match load_source(path) {
        Ok(source) => source,
        Err(message) => {
            eprintln!("{message}");
            std::process::exit(1);
        }
    }
}

fn load_source(path: &str) -> Result<String, String> {
    std::fs::read_to_string(path).map_err(|e| format!("Error reading {path}: {e}"))
}

fn cmd_parse(path: &str, compact: bool, keep_trailing_whitespace: bool) {
    let source = read_source(path);
    let options = ParseOptions {
        trim_trailing_whitespace: !keep_trailing_whitespace,
    };
    let result = htmlx_parser::parse_with_options(&source, &options);
    debug!(path, errors = result.errors.len(), "parsed file");

    let json = if compact {
        serde_json::to_string(&result)
    } else {
        serde_json::to_string_pretty(&result)
    };
    match json {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Error serializing AST: {e}");
            std::process::exit(1);
        }
    }

    if !result.is_ok() {
        std::process::exit(1);
    }
}

fn cmd_check(path: &str) {
    let source = read_source(path);
    let result = htmlx_parser::parse(&source);

    if result.is_ok() {
        eprintln!("OK: {path}");
        return;
    }
    for line in diagnostics(path, &result) {
        eprintln!("{line}");
    }
    std::process::exit(1);
}

/// One `path:line:column: source name: message` line per error.
fn diagnostics(path: &str, result: &ParseResult) -> Vec<String> {
    result
        .errors
        .iter()
        .map(|e| {
            let start = e.position.start;
            format!(
                "{path}:{}:{}: {} {}: {}",
                start.line, start.column, e.origin, e.name, e.message
            )
        })
        .collect()
}
