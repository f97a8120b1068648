// src/models.rs

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

// --- Shell execution ---

/// What to run: either a line one would type into a console, or a ready argv list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandLine {
    /// Split with POSIX shell-word rules before running.
    Line(String),
    /// Used as-is, no splitting.
    Argv(Vec<String>),
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Line(line) => f.write_str(line),
            Self::Argv(argv) => f.write_str(&argv.join(" ")),
        }
    }
}

impl From<&str> for CommandLine {
    fn from(line: &str) -> Self {
        Self::Line(line.to_string())
    }
}

impl From<String> for CommandLine {
    fn from(line: String) -> Self {
        Self::Line(line)
    }
}

impl From<Vec<String>> for CommandLine {
    fn from(argv: Vec<String>) -> Self {
        Self::Argv(argv)
    }
}

impl From<&[&str]> for CommandLine {
    fn from(argv: &[&str]) -> Self {
        Self::Argv(argv.iter().map(|s| (*s).to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for CommandLine {
    fn from(argv: [&str; N]) -> Self {
        Self::Argv(argv.iter().map(|s| (*s).to_string()).collect())
    }
}

/// Everything known about one shelled-out command.
///
/// Optional fields are only present when they apply, so a serialized result
/// reads like a report of what happened and nothing else.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct ShellResult {
    /// The command as it was given.
    pub command: String,
    /// Data fed to stdin, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdin: Option<String>,
    /// Working directory, if one was set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
    /// Set when the command could not be run to completion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception: Option<String>,
    /// Seconds allowed; only set when that limit was hit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<f64>,
    /// Non-empty stdout lines.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stdout: Vec<String>,
    /// Non-empty stderr lines.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stderr: Vec<String>,
    /// Exit code. Negative signal number when the process was killed by a signal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub returncode: Option<i32>,
    /// The most urgent message: exception, then stderr, then stdout.
    pub out: String,
    /// Whether a failure of this command was meant to be fatal. Only set on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub critical: Option<bool>,
}

impl ShellResult {
    /// The command ran and exited with code 0.
    pub fn success(&self) -> bool {
        self.returncode == Some(0)
    }

    /// Fills `out` from exception, stderr or stdout, in that order.
    pub(crate) fn settle_out(&mut self) {
        self.out = if let Some(exception) = &self.exception {
            exception.clone()
        } else if !self.stderr.is_empty() {
            self.stderr.join("\n")
        } else {
            self.stdout.join("\n")
        };
    }
}

// --- Messages ---

/// Severity of a message, which decides its prefix.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NotifyState {
    /// Plain information, prefixed with `~`.
    #[default]
    Info,
    /// Prefixed with `[WARNING]`.
    Warning,
    /// Prefixed with `[FATAL]`; tears the application down.
    Fatal,
    /// Prefixed with the label in brackets.
    Custom(String),
}

impl NotifyState {
    /// The prefix printed in front of the message.
    pub fn prefix(&self) -> String {
        match self {
            Self::Info => "~".to_string(),
            Self::Warning => "[WARNING]".to_string(),
            Self::Fatal => "[FATAL]".to_string(),
            Self::Custom(label) => format!("[{}]", label),
        }
    }
}

/// What a message call hands back when it does not tear down.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Notification {
    /// The message, untouched.
    pub message: String,
    /// Extra payload, if any.
    pub more: Option<serde_json::Value>,
    /// Whether it was printed.
    pub verbose: bool,
}

// --- Locations ---

/// The default folders Photon works with.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Locations {
    /// The user's home directory.
    pub home_dir: PathBuf,
    /// Directory of the running executable.
    pub call_dir: PathBuf,
    /// `$XDG_CONFIG_HOME/photon`.
    pub conf_dir: PathBuf,
    /// `$XDG_DATA_HOME/photon`.
    pub data_dir: PathBuf,
}

impl Locations {
    /// The folders keyed by name, in declaration order.
    pub fn entries(&self) -> [(&'static str, &Path); 4] {
        [
            ("home_dir", self.home_dir.as_path()),
            ("call_dir", self.call_dir.as_path()),
            ("conf_dir", self.conf_dir.as_path()),
            ("data_dir", self.data_dir.as_path()),
        ]
    }

    /// Looks a folder up by its key.
    pub fn get(&self, key: &str) -> Option<&Path> {
        self.entries()
            .into_iter()
            .find(|(name, _)| *name == key)
            .map(|(_, path)| path)
    }

    /// All folders, without their keys.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.entries()
            .into_iter()
            .map(|(_, path)| path.to_path_buf())
            .collect()
    }
}

/// What [`crate::core::locations::change_location`] does with a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transfer {
    /// Copy to the target, keep the source.
    Copy(PathBuf),
    /// Copy to the target, then remove the source.
    Move(PathBuf),
    /// Remove the source.
    Delete,
}

// --- Settings output ---

/// How the settings tool prints a value.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Formatter {
    /// Plain print.
    #[value(name = "p")]
    Plain,
    /// Pretty print.
    #[default]
    #[value(name = "pp")]
    Pretty,
    /// JSON with sorted keys.
    #[value(name = "j")]
    Json,
    /// Nested tabs.
    #[value(name = "t")]
    Tabs,
    /// TOML.
    #[value(name = "toml")]
    Toml,
}

// --- Git ---

/// Working tree state as reported by `git status --porcelain`.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct GitStatus {
    /// Files git does not know yet.
    pub untracked: Vec<String>,
    /// Modified files.
    pub modified: Vec<String>,
    /// Deleted files.
    pub deleted: Vec<String>,
    /// Files with unresolved merge conflicts.
    pub conflicting: Vec<String>,
    /// Nothing of the above.
    pub clean: bool,
}

/// One line of the short log.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct GitLogEntry {
    /// Abbreviated commit hash.
    pub commit: String,
    /// Commit subject.
    pub message: String,
}

/// What [`crate::tools::git::Git::cleanup`] did.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CleanupReport {
    /// The working tree state before cleaning up.
    pub changes: GitStatus,
    /// The result of fetching from the remote.
    pub fetch: ShellResult,
}
