//! asyncport CLI - import AsyncAPI documents into an event catalog

use clap::Parser;
use console::style;
use indexmap::IndexSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use asyncport_catalog::{Catalog, DEFAULT_API_URL, HttpCatalog, HttpCatalogConfig};
use asyncport_core::{
    BumpStrategy, DEFAULT_BROKER_TYPE, DEFAULT_TEST_DOMAIN_PREFIX, ImportSettings, LifecycleState,
};
use asyncport_engine::{Importer, RunMode, RunSummary};

mod display;
mod error;
mod exit_codes;
mod logging;

use error::{CliError, Result};

#[derive(Parser, Debug)]
#[command(name = "asyncport")]
#[command(author = "asyncport Contributors")]
#[command(version)]
#[command(about = "Import AsyncAPI documents into an event catalog", long_about = None)]
struct Cli {
    /// AsyncAPI documents to import (paths or glob patterns)
    #[arg(
        short,
        long = "file",
        env = "ASYNCPORT_FILE",
        required = true,
        num_args = 1..,
        value_delimiter = ','
    )]
    files: Vec<String>,

    /// Run mode: test_mode, test_mode_keep or release_mode
    #[arg(short, long, env = "ASYNCPORT_MODE", default_value = "test_mode")]
    mode: RunMode,

    /// Application domain for every document (default: info.x-ep-application-domain-name)
    #[arg(short, long, env = "ASYNCPORT_DOMAIN")]
    domain: Option<String>,

    /// API token of the event catalog
    #[arg(long, env = "ASYNCPORT_TOKEN", hide_env_values = true)]
    token: String,

    /// Base URL of the catalog architecture API
    #[arg(long, env = "ASYNCPORT_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Lifecycle state new versions are moved to (draft, released, deprecated, retired)
    #[arg(long, env = "ASYNCPORT_TARGET_STATE", default_value = "released")]
    target_state: LifecycleState,

    /// Version bump for changed enums, schemas and events (bump_patch or bump_minor)
    #[arg(long, env = "ASYNCPORT_VERSION_STRATEGY", default_value = "bump_patch")]
    version_strategy: BumpStrategy,

    /// Prefix of the disposable domains used by test runs
    #[arg(long, env = "ASYNCPORT_TEST_DOMAIN_PREFIX", default_value = DEFAULT_TEST_DOMAIN_PREFIX)]
    test_domain_prefix: String,

    /// Broker type of events, event APIs and applications
    #[arg(long, env = "ASYNCPORT_BROKER_TYPE", default_value = DEFAULT_BROKER_TYPE)]
    broker_type: String,

    /// Do not create an event API per document
    #[arg(long, env = "ASYNCPORT_NO_EVENT_API")]
    no_event_api: bool,

    /// Do not create an application per document
    #[arg(long, env = "ASYNCPORT_NO_APPLICATION")]
    no_application: bool,

    /// Write the run summary as JSON to this file
    #[arg(long, env = "ASYNCPORT_SUMMARY_FILE")]
    summary_file: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, env = "ASYNCPORT_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, env = "ASYNCPORT_LOG_JSON")]
    log_json: bool,

    /// Append logs to this file instead of stderr
    #[arg(long, env = "ASYNCPORT_LOG_FILE")]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn settings(&self) -> ImportSettings {
        ImportSettings {
            target_state: self.target_state,
            version_strategy: self.version_strategy,
            create_event_api: !self.no_event_api,
            create_application: !self.no_application,
            test_domain_prefix: self.test_domain_prefix.clone(),
            broker_type: self.broker_type.clone(),
            ..Default::default()
        }
    }
}

fn main() {
    miette::set_panic_hook();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if err.use_stderr() => {
            let _ = err.print();
            std::process::exit(exit_codes::USAGE_ERROR);
        }
        // --help and --version
        Err(err) => err.exit(),
    };

    let code = match run(&cli) {
        Ok(()) => exit_codes::SUCCESS,
        Err(err) => {
            let code = err.exit_code();
            eprintln!("{:?}", miette::Report::new(err));
            code
        }
    };
    std::process::exit(code);
}

fn run(cli: &Cli) -> Result<()> {
    logging::init(&logging::LogOptions {
        level: &cli.log_level,
        json: cli.log_json,
        file: cli.log_file.as_deref(),
    })?;

    let files = expand_files(&cli.files)?;
    let backend = HttpCatalog::new(HttpCatalogConfig::new(&cli.api_url, &cli.token))?;
    let catalog = Catalog::from_backend(Arc::new(backend));
    let mut importer = Importer::new(catalog, cli.settings());

    println!(
        "{} Importing {} document(s) in {}",
        style("→").blue().bold(),
        files.len(),
        style(cli.mode).cyan()
    );
    for file in &files {
        println!("  {} {}", style("→").blue(), file.display());
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::internal(format!("cannot start runtime: {e}")))?;
    let result = runtime.block_on(importer.run(cli.mode, &files, cli.domain.as_deref()));

    let summary = importer.into_summary();
    display::print_summary(&summary);
    if let Some(path) = &cli.summary_file {
        write_summary(&summary, path)?;
    }

    result?;
    println!(
        "{} {} completed",
        style("✓").green().bold(),
        style(cli.mode).cyan()
    );
    Ok(())
}

/// Expand paths and glob patterns, keeping first-seen order without duplicates
fn expand_files(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = IndexSet::new();

    for pattern in patterns {
        if !is_glob(pattern) {
            let path = PathBuf::from(pattern);
            if !path.is_file() {
                return Err(CliError::io(format!("file not found: {pattern}")));
            }
            files.insert(path);
            continue;
        }

        let entries = glob::glob(pattern).map_err(|e| {
            CliError::config_with_help(
                format!("invalid pattern '{pattern}': {e}"),
                "quote patterns so the shell does not expand them",
            )
        })?;
        let before = files.len();
        for entry in entries {
            let path = entry.map_err(|e| CliError::io(e.to_string()))?;
            if path.is_file() {
                files.insert(path);
            }
        }
        if files.len() == before {
            return Err(CliError::io(format!("no file matches '{pattern}'")));
        }
    }

    Ok(files.into_iter().collect())
}

fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

fn write_summary(summary: &RunSummary, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(summary)
        .map_err(|e| CliError::internal(format!("cannot serialize summary: {e}")))?;
    std::fs::write(path, json)
        .map_err(|e| CliError::io(format!("cannot write summary {}: {e}", path.display())))?;
    tracing::info!(path = %path.display(), "summary written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, "asyncapi: 2.6.0\n").unwrap();
        path
    }

    #[test]
    fn test_expand_literal_and_glob() {
        let dir = TempDir::new().unwrap();
        let a = touch(&dir, "a.yaml");
        let b = touch(&dir, "b.yaml");
        touch(&dir, "notes.txt");

        let pattern = dir.path().join("*.yaml").display().to_string();
        let files = expand_files(&[b.display().to_string(), pattern]).unwrap();

        assert_eq!(files, vec![b, a]);
    }

    #[test]
    fn test_expand_missing_file() {
        let err = expand_files(&["does-not-exist.yaml".to_string()]).unwrap_err();
        assert_eq!(err.exit_code(), exit_codes::IO_ERROR);
    }

    #[test]
    fn test_expand_empty_glob() {
        let dir = TempDir::new().unwrap();
        let pattern = dir.path().join("*.json").display().to_string();
        let err = expand_files(&[pattern]).unwrap_err();
        assert!(err.to_string().contains("no file matches"));
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["asyncport", "--file", "api.yaml", "--token", "t"]).unwrap();
        assert_eq!(cli.mode, RunMode::TestMode);
        assert_eq!(cli.api_url, DEFAULT_API_URL);

        let settings = cli.settings();
        assert_eq!(settings.target_state, LifecycleState::Released);
        assert_eq!(settings.version_strategy, BumpStrategy::Patch);
        assert!(settings.create_event_api);
        assert!(settings.create_application);
        assert_eq!(settings.test_domain_prefix, "asyncport/test/");
    }

    #[test]
    fn test_cli_options() {
        let cli = Cli::try_parse_from([
            "asyncport",
            "-f",
            "a.yaml,b.yaml",
            "--token",
            "t",
            "--mode",
            "release",
            "--version-strategy",
            "bump_minor",
            "--target-state",
            "draft",
            "--no-application",
        ])
        .unwrap();

        assert_eq!(cli.files, vec!["a.yaml", "b.yaml"]);
        assert_eq!(cli.mode, RunMode::ReleaseMode);
        let settings = cli.settings();
        assert_eq!(settings.version_strategy, BumpStrategy::Minor);
        assert_eq!(settings.target_state, LifecycleState::Draft);
        assert!(!settings.create_application);
    }

    #[test]
    fn test_cli_rejects_unknown_mode() {
        let result = Cli::try_parse_from([
            "asyncport", "--file", "a.yaml", "--token", "t", "--mode", "deploy",
        ]);
        assert!(result.is_err());
    }
}
