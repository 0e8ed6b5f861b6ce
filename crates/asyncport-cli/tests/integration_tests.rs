//! Integration tests for the asyncport binary
//!
//! None of these reach a real catalog: every run either fails before the
//! first request or points at a closed local port.

use std::process::{Command, Output};

/// Closed port on the loopback interface
const UNREACHABLE_API: &str = "http://127.0.0.1:9/api/v2/architecture";

/// Run asyncport with a clean environment
fn asyncport(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_asyncport"))
        .env_clear()
        .args(args)
        .output()
        .expect("Failed to execute asyncport")
}

/// Get the fixtures path
fn fixture(name: &str) -> String {
    format!("{}/../../fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

mod usage {
    use super::*;

    #[test]
    fn test_help() {
        let output = asyncport(&["--help"]);

        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("--file"));
        assert!(stdout.contains("--mode"));
        assert!(stdout.contains("ASYNCPORT_TOKEN"));
    }

    #[test]
    fn test_version() {
        let output = asyncport(&["--version"]);

        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_missing_required_options() {
        let output = asyncport(&["--token", "secret"]);
        assert_eq!(output.status.code(), Some(64));
    }

    #[test]
    fn test_unknown_mode() {
        let output = asyncport(&[
            "--file",
            &fixture("orders-v1.yaml"),
            "--token",
            "secret",
            "--mode",
            "deploy",
        ]);

        assert_eq!(output.status.code(), Some(64));
        assert!(stderr(&output).contains("deploy"));
    }

    #[test]
    fn test_token_from_environment() {
        let output = Command::new(env!("CARGO_BIN_EXE_asyncport"))
            .env_clear()
            .env("ASYNCPORT_TOKEN", "secret")
            .env("ASYNCPORT_FILE", fixture("no-domain.yaml"))
            .env("ASYNCPORT_API_URL", UNREACHABLE_API)
            .output()
            .expect("Failed to execute asyncport");

        // options resolved from the environment; the document itself is rejected
        assert_eq!(output.status.code(), Some(4));
    }
}

mod documents {
    use super::*;

    #[test]
    fn test_missing_file() {
        let output = asyncport(&[
            "--file",
            &fixture("does-not-exist.yaml"),
            "--token",
            "secret",
        ]);

        assert_eq!(output.status.code(), Some(5));
        assert!(stderr(&output).contains("file not found"));
    }

    #[test]
    fn test_glob_without_matches() {
        let output = asyncport(&["--file", &fixture("*.avsc"), "--token", "secret"]);

        assert_eq!(output.status.code(), Some(5));
        assert!(stderr(&output).contains("no file matches"));
    }

    #[test]
    fn test_document_without_domain() {
        let output = asyncport(&[
            "--file",
            &fixture("no-domain.yaml"),
            "--token",
            "secret",
            "--api-url",
            UNREACHABLE_API,
        ]);

        assert_eq!(output.status.code(), Some(4));
        assert!(stderr(&output).contains("x-ep-application-domain-name"));
    }

    #[test]
    fn test_unsupported_document() {
        let output = asyncport(&[
            "--file",
            &fixture("unsupported-oneof.yaml"),
            "--token",
            "secret",
            "--api-url",
            UNREACHABLE_API,
        ]);

        assert_eq!(output.status.code(), Some(6));
        assert!(stderr(&output).contains("oneOf"));
    }
}

mod catalog {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_invalid_api_url() {
        let output = asyncport(&[
            "--file",
            &fixture("orders-v1.yaml"),
            "--token",
            "secret",
            "--api-url",
            "not a url",
        ]);

        assert_eq!(output.status.code(), Some(64));
        assert!(stderr(&output).contains("--api-url"));
    }

    #[test]
    fn test_unreachable_catalog_writes_summary() {
        let dir = TempDir::new().unwrap();
        let summary_path = dir.path().join("summary.json");

        let output = asyncport(&[
            "--file",
            &fixture("orders-v1.yaml"),
            "--token",
            "secret",
            "--api-url",
            UNREACHABLE_API,
            "--summary-file",
            summary_path.to_str().unwrap(),
            "--log-level",
            "error",
        ]);

        assert_eq!(output.status.code(), Some(2));

        let content = std::fs::read_to_string(&summary_path).unwrap();
        let summary: serde_json::Value = serde_json::from_str(&content).unwrap();
        let entries = summary["entries"].as_array().unwrap();
        assert_eq!(entries[0]["type"], "run_started");
        assert!(
            entries
                .iter()
                .any(|e| e["type"] == "error" && e["context"]["document"] == "Orders@1.0.0")
        );
    }

    #[test]
    fn test_log_file() {
        let dir = TempDir::new().unwrap();
        let log_path = dir.path().join("asyncport.log");

        asyncport(&[
            "--file",
            &fixture("orders-v1.yaml"),
            "--token",
            "secret",
            "--api-url",
            UNREACHABLE_API,
            "--log-file",
            log_path.to_str().unwrap(),
            "--log-json",
        ]);

        let content = std::fs::read_to_string(&log_path).unwrap();
        let first = content.lines().next().unwrap();
        let line: serde_json::Value = serde_json::from_str(first).unwrap();
        assert!(line.get("level").is_some());
    }
}
