//! CLI - Command Line Interface for the ARTE add-on
//!
//! Plays the part of the host application from a terminal: one invocation
//! serves one request, exactly like a media-center call would.
//!
//! # Examples
//!
//! ```bash
//! # Root menu
//! artetv
//!
//! # Browse a collection, descend into its first zone
//! artetv "?mode=collection&path=MAGAZINES&level=0" --json
//!
//! # Resolve a stream in a given version
//! artetv "?mode=watch&id=110342-012-A&version=VOSTF"
//!
//! # Search without prompting
//! artetv "?mode=search" --query "tour de france"
//! ```

use clap::{ArgAction, Parser};
use serde::Serialize;
use std::io::IsTerminal;
use std::path::PathBuf;

use crate::api::ArteError;
use crate::host::DEFAULT_BASE_URL;
use crate::navigation::NavigationError;

// =============================================================================
// Exit Codes
// =============================================================================

/// Exit codes for CLI operations (semantic for scripting)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// General error
    Error = 1,
    /// Invalid arguments
    InvalidArgs = 2,
    /// Network or API error
    NetworkError = 3,
    /// No (matching) stream available
    NoStreams = 4,
}

impl ExitCode {
    /// Exit code matching a request failure
    pub fn for_error(error: &anyhow::Error) -> Self {
        if error.downcast_ref::<NavigationError>().is_some() {
            return ExitCode::NoStreams;
        }
        match error.downcast_ref::<ArteError>() {
            Some(ArteError::Http(_)) | Some(ArteError::Api { .. }) => ExitCode::NetworkError,
            Some(ArteError::UnsupportedLanguage(_)) => ExitCode::InvalidArgs,
            _ => ExitCode::Error,
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> std::process::ExitCode {
        std::process::ExitCode::from(code as u8)
    }
}

// =============================================================================
// Main CLI Structure
// =============================================================================

/// ARTE catalog browser and player adapter
///
/// Serves one add-on request: a listing or a resolved stream.
#[derive(Parser, Debug)]
#[command(
    name = "artetv",
    version,
    about = "ARTE catalog browser and player adapter",
    long_about = "Browse the ARTE video-on-demand catalog and resolve playable \
                  streams.\n\n\
                  Each invocation serves one request given as an add-on query \
                  string (mode, path, level, id, version).",
    after_help = "EXAMPLES:\n\
                  artetv                                       Root menu\n\
                  artetv \"?mode=collection&path=CATEGORIES\"    Browse categories\n\
                  artetv \"?mode=watch&id=110342-012-A\"         Resolve a stream\n\
                  artetv \"?mode=search\" --query arte           Search"
)]
pub struct Cli {
    /// Request query string (empty for the root menu)
    #[arg(default_value = "")]
    pub params: String,

    /// Add-on base URL used in listing entries
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Output format as JSON (default for non-TTY)
    #[arg(long, short = 'j')]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q')]
    pub quiet: bool,

    /// Catalog language (de, en, es, fr, it, pl)
    #[arg(long, short = 'l')]
    pub language: Option<String>,

    /// Search text, instead of prompting on stdin
    #[arg(long)]
    pub query: Option<String>,

    /// Path to config file
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Host API major version
    #[arg(long, default_value = "19")]
    pub host_version: u32,

    /// Resolve streams without adaptive streaming hints
    #[arg(long)]
    pub no_inputstream: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(long, short = 'v', action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Check if JSON output should be used
    pub fn should_json(&self) -> bool {
        self.json || !std::io::stdout().is_terminal()
    }

    /// Log filter derived from `-v`, unless RUST_LOG is set
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    }
}

// =============================================================================
// Reporting
// =============================================================================

/// JSON envelope of one request
#[derive(Debug, Serialize)]
pub struct Report<T: Serialize> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<Failure>,
}

/// Failure details, with the whole error chain
#[derive(Debug, Serialize)]
pub struct Failure {
    pub message: String,
    pub causes: Vec<String>,
    pub exit_code: i32,
}

impl<T: Serialize> Report<T> {
    pub fn success(result: T) -> Self {
        Self {
            ok: true,
            result: Some(result),
            failure: None,
        }
    }
}

impl Report<()> {
    pub fn failure(failure: Failure) -> Self {
        Self {
            ok: false,
            result: None,
            failure: Some(failure),
        }
    }
}

/// Where request results and diagnostics go
#[derive(Debug, Clone, Copy)]
pub struct Output {
    pub json: bool,
    pub quiet: bool,
}

impl Output {
    pub fn new(cli: &Cli) -> Self {
        Self {
            json: cli.should_json(),
            quiet: cli.quiet,
        }
    }

    /// Write a successful result as a JSON report on stdout
    pub fn report<T: Serialize>(&self, result: T) -> anyhow::Result<()> {
        let report = serde_json::to_string_pretty(&Report::success(result))?;
        println!("{}", report);
        Ok(())
    }

    /// Report a failed request and return its exit code
    pub fn fail(&self, error: &anyhow::Error) -> ExitCode {
        let code = ExitCode::for_error(error);
        let failure = Failure {
            message: error.to_string(),
            causes: error.chain().skip(1).map(|c| c.to_string()).collect(),
            exit_code: code.into(),
        };
        self.emit_failure(failure);
        code
    }

    /// Report a usage problem and return its exit code
    pub fn reject(&self, message: impl Into<String>, code: ExitCode) -> ExitCode {
        self.emit_failure(Failure {
            message: message.into(),
            causes: Vec::new(),
            exit_code: code.into(),
        });
        code
    }

    fn emit_failure(&self, failure: Failure) {
        if self.json {
            if let Ok(json) = serde_json::to_string_pretty(&Report::<()>::failure(failure)) {
                eprintln!("{}", json);
            }
        } else if !self.quiet {
            eprintln!("Error: {}", failure.message);
            for cause in &failure.causes {
                eprintln!("  caused by: {}", cause);
            }
        }
    }

    /// Print a side note (suppressed in quiet and JSON modes)
    pub fn note(&self, msg: impl std::fmt::Display) {
        if !self.quiet && !self.json {
            eprintln!("{}", msg);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_args_is_root_menu() {
        let cli = Cli::parse_from(["artetv"]);
        assert_eq!(cli.params, "");
        assert_eq!(cli.base_url, DEFAULT_BASE_URL);
        assert_eq!(cli.host_version, 19);
        assert_eq!(cli.log_level(), "warn");
    }

    #[test]
    fn test_request_and_flags() {
        let cli = Cli::parse_from([
            "artetv",
            "?mode=watch&id=42",
            "--json",
            "-l",
            "fr",
            "-vv",
            "--no-inputstream",
        ]);
        assert_eq!(cli.params, "?mode=watch&id=42");
        assert!(cli.json);
        assert!(cli.no_inputstream);
        assert_eq!(cli.language.as_deref(), Some("fr"));
        assert_eq!(cli.log_level(), "trace");
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(i32::from(ExitCode::Success), 0);
        assert_eq!(i32::from(ExitCode::Error), 1);
        assert_eq!(i32::from(ExitCode::InvalidArgs), 2);
        assert_eq!(i32::from(ExitCode::NetworkError), 3);
        assert_eq!(i32::from(ExitCode::NoStreams), 4);
    }

    #[test]
    fn test_report_shape() {
        let ok = serde_json::to_value(Report::success(vec!["a"])).unwrap();
        assert_eq!(ok, serde_json::json!({"ok": true, "result": ["a"]}));

        let failed = serde_json::to_value(Report::<()>::failure(Failure {
            message: "Failed to list collection X".to_string(),
            causes: vec!["Request failed".to_string()],
            exit_code: 3,
        }))
        .unwrap();
        assert_eq!(failed["ok"], false);
        assert_eq!(failed["failure"]["exit_code"], 3);
        assert!(failed.get("result").is_none());
    }

    #[test]
    fn test_fail_maps_exit_code() {
        let output = Output {
            json: false,
            quiet: true,
        };
        let err = anyhow::Error::new(NavigationError::NoStream("1".into()));
        assert_eq!(output.fail(&err), ExitCode::NoStreams);
        assert_eq!(
            output.reject("Unsupported language: nl", ExitCode::InvalidArgs),
            ExitCode::InvalidArgs
        );
    }

    #[test]
    fn test_exit_code_for_errors() {
        let err = anyhow::Error::new(NavigationError::NoStream("1".into()));
        assert_eq!(ExitCode::for_error(&err), ExitCode::NoStreams);

        let err = anyhow::Error::new(ArteError::UnsupportedLanguage("nl".into()))
            .context("while starting");
        assert_eq!(ExitCode::for_error(&err), ExitCode::InvalidArgs);

        let err = anyhow::Error::new(ArteError::Api {
            status: 404,
            error: serde_json::json!({"code": "NOT_FOUND"}),
        })
        .context("Failed to list collection X");
        assert_eq!(ExitCode::for_error(&err), ExitCode::NetworkError);

        let err = anyhow::anyhow!("something else");
        assert_eq!(ExitCode::for_error(&err), ExitCode::Error);
    }
}
