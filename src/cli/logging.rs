use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt};

/// Environment variable that overrides the verbosity flags.
pub const LOG_ENV: &str = "COSTQ_LOG";

/// Install the global subscriber. Logs go to stderr so JSON on stdout stays
/// machine-readable.
pub fn setup_logging(verbose: u8, quiet: bool) {
    let filter_level = if quiet {
        Level::ERROR
    } else if verbose >= 2 {
        Level::TRACE
    } else if verbose == 1 {
        Level::DEBUG
    } else {
        Level::WARN
    };

    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(format!("cost_query={filter_level}")));

    let installed = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .without_time()
        .try_init();

    // Fails only when a subscriber is already set, e.g. by an embedding tool.
    if let Err(e) = installed {
        eprintln!("costq: logging not initialized: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_setup_is_harmless() {
        setup_logging(0, false);
        setup_logging(2, true);
        tracing::debug!("still logging");
    }
}
