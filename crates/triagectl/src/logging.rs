//! Invocation log for triagectl
//!
//! One JSON line per command, XDG state dir with a fallback chain.

use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable that overrides the log location
pub const LOG_FILE_ENV: &str = "TRIAGECTL_LOG_FILE";

/// Log entry for each triagectl invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// ISO 8601 timestamp
    pub ts: String,

    /// Request ID (UUID)
    pub req_id: String,

    /// Subcommand name
    pub command: String,

    /// Raw arguments after the binary name
    #[serde(default)]
    pub args: Vec<String>,

    pub exit_code: i32,

    pub duration_ms: u64,

    pub ok: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetails>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// `TriageError::code()`, or 1 for errors outside the core
    pub code: i32,
    pub message: String,
}

impl LogEntry {
    /// Entry for a finished command
    pub fn new(
        command: impl Into<String>,
        args: Vec<String>,
        elapsed: Duration,
        error: Option<ErrorDetails>,
    ) -> Self {
        Self {
            ts: Self::now(),
            req_id: Self::generate_req_id(),
            command: command.into(),
            args,
            exit_code: if error.is_some() { 1 } else { 0 },
            duration_ms: elapsed.as_millis() as u64,
            ok: error.is_none(),
            error,
        }
    }

    /// Discover log file path with fallback chain
    ///
    /// Priority:
    /// 1. $TRIAGECTL_LOG_FILE (explicit override)
    /// 2. $XDG_STATE_HOME/triage/ctl.jsonl
    /// 3. ~/.local/state/triage/ctl.jsonl
    pub fn discover_log_path() -> Option<PathBuf> {
        Self::discover_log_path_with(|key| std::env::var(key).ok())
    }

    /// Same chain over an arbitrary variable lookup
    pub fn discover_log_path_with(var: impl Fn(&str) -> Option<String>) -> Option<PathBuf> {
        if let Some(path) = var(LOG_FILE_ENV) {
            return Some(PathBuf::from(path));
        }

        if let Some(xdg_state) = var("XDG_STATE_HOME") {
            return Some(Path::new(&xdg_state).join("triage").join("ctl.jsonl"));
        }

        var("HOME").map(|home| {
            Path::new(&home)
                .join(".local")
                .join("state")
                .join("triage")
                .join("ctl.jsonl")
        })
    }

    /// Write log entry to file, falling back to stderr on failure.
    /// Stdout carries command output only.
    pub fn write(&self) -> Result<(), std::io::Error> {
        self.write_or_fallback(Self::discover_log_path().as_deref(), &mut std::io::stderr())
    }

    /// Append to `path`, or emit the line on `fallback` when that fails
    pub fn write_or_fallback(
        &self,
        path: Option<&Path>,
        fallback: &mut dyn Write,
    ) -> Result<(), std::io::Error> {
        let json = serde_json::to_string(self)?;

        if let Some(path) = path {
            if Self::write_to_file(&json, path).is_ok() {
                return Ok(());
            }
        }

        writeln!(fallback, "{}", json)
    }

    /// Append one line, creating parent directories as needed
    pub fn write_to_file(json: &str, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;

        writeln!(file, "{}", json)?;
        Ok(())
    }

    pub fn generate_req_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    /// Current timestamp in RFC 3339
    pub fn now() -> String {
        chrono::Utc::now().to_rfc3339()
    }
}
