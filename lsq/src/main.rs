mod cli;
mod render;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use loglens::{LogRecord, SearchOptions, SearchState, load_records};
use render::{RenderFlags, render};
use std::io::Write;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let options = cli.search_options();
    let flags = RenderFlags {
        tokens: cli.tokens,
        json: cli.json,
    };
    let records = match &cli.records {
        Some(path) => load_records(path)?,
        None => Vec::new(),
    };
    info!(records = records.len(), default_fields = ?options.default_fields, "lsq ready");

    match &cli.query {
        Some(query) => run_query(query, &records, &options, flags),
        None => prompt(&records, &options, flags),
    }
}

fn run_query(
    query: &str,
    records: &[LogRecord],
    options: &SearchOptions,
    flags: RenderFlags,
) -> Result<()> {
    let state = SearchState::new(query, options);
    let mut stdout = std::io::stdout().lock();
    render(&mut stdout, &state, records, flags)
}

fn prompt(records: &[LogRecord], options: &SearchOptions, flags: RenderFlags) -> Result<()> {
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    loop {
        print!("> ");
        stdout.flush().context("Failed to flush stdout")?;
        let mut line = String::new();
        let read = stdin
            .read_line(&mut line)
            .context("Failed to read query")?;
        if read == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        } else if line == "/bye" {
            break;
        }
        run_query(line, records, options, flags)?;
    }
    Ok(())
}
