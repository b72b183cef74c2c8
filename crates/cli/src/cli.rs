use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "moviefetch")]
#[command(author, version, about = "Look up movie metadata and print it for humans")]
pub struct Cli {
    /// Movie titles to look up
    pub queries: Vec<String>,

    /// Fields to print: "all", a comma-separated list, or "?" to list known fields
    #[arg(short, long, default_value = "all", value_name = "FIELDS")]
    pub fields: String,

    /// Network timeout in seconds
    #[arg(short, long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Keep going with the next query after a failed lookup
    #[arg(short, long)]
    pub ignore_error: bool,

    /// Do not print the header line for each query
    #[arg(short, long)]
    pub quiet: bool,

    /// Lookup endpoint
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// API key sent with every lookup
    #[arg(long, value_name = "KEY")]
    pub api_key: Option<String>,

    /// URL fields to download: "all" or a comma-separated list
    #[arg(short, long, value_name = "FIELDS")]
    pub download: Option<String>,

    /// Directory downloaded fields are written to
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Print the normalized record as JSON
    #[arg(long)]
    pub json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Parsed form of `--fields`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSelection {
    ListKnown,
    All,
    Named(Vec<String>),
}

impl FieldSelection {
    pub fn parse(input: &str) -> Self {
        match input.trim() {
            "?" => Self::ListKnown,
            s if s.is_empty() || s.eq_ignore_ascii_case("all") => Self::All,
            s => Self::Named(
                s.split(',')
                    .map(|f| f.trim().to_lowercase())
                    .filter(|f| !f.is_empty())
                    .collect(),
            ),
        }
    }
}
