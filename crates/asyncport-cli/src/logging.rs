//! Log subscriber setup
//!
//! `RUST_LOG` takes precedence over `--log-level` so single crates can be
//! turned up while debugging.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use crate::error::{CliError, Result};

/// Logging options from the command line
#[derive(Debug, Clone)]
pub struct LogOptions<'a> {
    pub level: &'a str,
    pub json: bool,
    pub file: Option<&'a Path>,
}

/// Install the global subscriber; logs go to stderr unless a file is given
pub fn init(options: &LogOptions<'_>) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(options.level).map_err(|e| {
            CliError::config_with_help(
                format!("invalid log level '{}': {e}", options.level),
                "use one of trace, debug, info, warn, error",
            )
        })?,
    };

    let writer = match options.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| CliError::io(format!("cannot open log file {}: {e}", path.display())))?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(std::io::stderr),
    };

    let registry = tracing_subscriber::registry().with(filter);
    let installed = if options.json {
        registry
            .with(fmt::layer().json().with_writer(writer))
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_writer(writer)
                    .with_target(false)
                    .with_ansi(options.file.is_none()),
            )
            .try_init()
    };
    installed.map_err(|e| CliError::internal(format!("cannot install logger: {e}")))
}
