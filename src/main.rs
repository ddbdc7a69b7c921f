use std::io;
use std::process;

use clap::Parser;
use jsonpath_interp::compile;
use serde::Serialize;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

/// Run an RFC 9535 JSONPath query against a JSON document.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// JSONPath query, e.g. `$.store.book[?@.price < 10].title`
    query: String,
    /// JSON document; read from stdin when omitted
    json: Option<String>,
    /// Print `{path, value}` objects instead of bare values
    #[arg(long)]
    paths: bool,
    /// Delete the matches and print the remaining document
    #[arg(long, conflicts_with = "paths")]
    delete: bool,
    /// Show only the first match
    #[arg(long, conflicts_with = "delete")]
    first: bool,
}

#[derive(Serialize)]
struct Located<'a> {
    path: String,
    value: &'a Value,
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("{message}");
    process::exit(1);
}

fn print<T: Serialize>(out: &T) {
    match serde_json::to_string_pretty(out) {
        Ok(text) => println!("{text}"),
        Err(e) => fail(format!("cannot serialize output: {e}")),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    // Parse CLI arguments.
    let args = Args::parse();

    // Parse input JSON.
    let text = match args.json {
        Some(text) => text,
        None => io::read_to_string(io::stdin()).unwrap_or_else(|e| fail(format!("cannot read stdin: {e}"))),
    };
    let mut data: Value = serde_json::from_str(&text).unwrap_or_else(|e| fail(format!("Invalid JSON: {e}")));

    // Compile the query.
    let query = compile(&args.query).unwrap_or_else(|e| fail(e));

    if args.delete {
        query.delete(&mut data);
        print(&data);
        return;
    }

    if args.paths {
        let mut located: Vec<Located<'_>> = query
            .locate(&data)
            .into_iter()
            .map(|(path, value)| Located { path, value })
            .collect();
        if args.first {
            located.truncate(1);
        }
        print(&located);
        return;
    }

    let mut found = query.search(&data);
    if args.first {
        found.truncate(1);
    }
    print(&found);
}
