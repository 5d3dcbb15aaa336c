//! Command-line interface parsing for xkcdfetch
//!
//! This module handles parsing of CLI arguments using clap and turns them
//! into the query and cache location used at startup.

use clap::Parser;
use std::path::PathBuf;
use thiserror::Error;

use crate::cache::DEFAULT_CACHE_FILE;
use crate::data::Query;

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The query argument contains nothing to search for
    #[error("Query is blank. Pass a comic number, search text, or nothing for the latest comic")]
    BlankQuery,
}

/// xkcdfetch - Look up xkcd comics by number or by text
#[derive(Parser, Debug)]
#[command(name = "xkcdfetch")]
#[command(about = "Look up xkcd comics by number or text, with a local cache")]
#[command(version)]
pub struct Cli {
    /// Comic number or text to search for
    ///
    /// Examples:
    ///   xkcdfetch                  # Latest comic
    ///   xkcdfetch 614              # Comic number 614
    ///   xkcdfetch "bobby tables"   # First comic found by searching
    #[arg(value_name = "QUERY", conflicts_with = "latest")]
    pub query: Option<String>,

    /// Fetch the latest comic (same as giving no query)
    #[arg(long)]
    pub latest: bool,

    /// Path of the JSON cache file
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CACHE_FILE)]
    pub cache_file: PathBuf,

    /// Print the comic as JSON instead of a summary
    #[arg(long)]
    pub json: bool,
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone, PartialEq)]
pub struct StartupConfig {
    /// What to look up
    pub query: Query,
    /// Where the cache lives
    pub cache_file: PathBuf,
    /// Whether to print raw JSON
    pub json: bool,
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with the parsed query
    /// * `Err(CliError::BlankQuery)` if the query is only whitespace
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let query = match cli.query.as_deref() {
            Some(raw) if raw.trim().is_empty() => return Err(CliError::BlankQuery),
            _ if cli.latest => Query::Latest,
            raw => Query::parse(raw),
        };

        Ok(StartupConfig {
            query,
            cache_file: cli.cache_file.clone(),
            json: cli.json,
        })
    }
}
