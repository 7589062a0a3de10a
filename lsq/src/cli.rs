use clap::Parser;
use loglens::SearchOptions;
use std::path::PathBuf;

#[derive(Parser)]
pub struct Cli {
    /// Query to run. Starts an interactive prompt when omitted.
    pub query: Option<String>,
    #[clap(long)]
    /// JSON-lines file of log records to search.
    pub records: Option<PathBuf>,
    #[clap(long = "default-field", default_value = "message")]
    /// Field searched by free-text terms; repeat to add more.
    pub default_fields: Vec<String>,
    #[clap(long, default_value = "false")]
    /// Print the token groups of the query.
    pub tokens: bool,
    #[clap(long, default_value = "false")]
    /// Emit JSON instead of text.
    pub json: bool,
}

impl Cli {
    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            default_fields: self.default_fields.clone(),
        }
    }
}
