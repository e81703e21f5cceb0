//! CLI support for cost-query
//!
//! Everything the `costq` binary does lives here so it can be driven from
//! tests or embedded in other tools.

mod logging;
mod run;
mod steps;

pub use logging::setup_logging;
pub use run::{
    QueryInput, build_query, execute_call, execute_explain, execute_run, render_totals,
};
pub use steps::{Step, parse_arg_value, parse_filter};

use thiserror::Error;

use crate::{QueryError, config::ConfigError};

/// Errors that can occur during CLI operations
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Query(#[from] QueryError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// A `--filter` argument that does not parse
    #[error("Invalid filter '{0}': expected NAME OP [VALUE], e.g. status=open or hours>=2")]
    InvalidFilter(String),

    /// No entries file, config entry or stdin input
    #[error("No entries provided. Use --entries, set `entries` in the config, or pipe JSON to stdin.")]
    NoInput,
}
