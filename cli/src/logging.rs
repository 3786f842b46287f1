use std::io::{self, IsTerminal};

use anyhow::{anyhow, Context, Result};
use tracing_subscriber::EnvFilter;

/// Creates the filter for log events. `RUST_LOG` takes precedence over the
/// configured level.
fn env_filter(level: &str) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(level).with_context(|| format!("invalid log level `{level}'")),
    }
}

/// Initializes the global log subscriber. Log output goes to stderr so it
/// does not interfere with the envelope printed to stdout.
pub fn init_logging(level: &str) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(level)?)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow!("unable to initialize logging: {err}"))
}

#[cfg(test)]
mod tests {
    use assertor::{assert_that, ResultAssertion};

    use super::env_filter;

    #[test]
    fn levels() {
        if std::env::var_os("RUST_LOG").is_some() {
            // the configured level is ignored
            return;
        }
        assert_that!(env_filter("warn")).is_ok();
        assert_that!(env_filter("geoextent_core=debug,info")).is_ok();
        assert_that!(env_filter("very=loud=please")).is_err();
    }
}
