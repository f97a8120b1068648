// src/cli/args.rs
use crate::{
    constants::{DEFAULTS_FILENAME, DEFAULT_BRANCH},
    models::Formatter,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true)] // Handlers receive the arguments after the command name.
pub struct RunArgs {
    /// The command. A single argument is split like a shell would; several are used as argv.
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,

    /// Text written to the command's stdin.
    #[arg(long)]
    pub stdin: Option<String>,

    /// Working directory for the command.
    #[arg(long)]
    pub cwd: Option<String>,

    /// Seconds before the command is killed.
    #[arg(long, short)]
    pub timeout: Option<f64>,

    /// A failing command only warns instead of tearing down.
    #[arg(long)]
    pub non_critical: bool,

    /// Print a warning before the result when a non-critical command fails.
    /// Off by default so stdout stays plain JSON.
    #[arg(long, short)]
    pub verbose: bool,
}

#[derive(Parser, Debug)]
#[command(no_binary_name = true)]
pub struct SettingsArgs {
    /// Path to the settings keys to print, e.g. `mesh interfaces`.
    pub keys: Vec<String>,

    /// The defaults file, searched in the default locations.
    #[arg(long, short, default_value = DEFAULTS_FILENAME)]
    pub defaults: String,

    /// The config file; created in the config folder if it does not exist.
    #[arg(long, short)]
    pub config: Option<String>,

    /// Output format.
    #[arg(long, short, value_enum, default_value_t = Formatter::Pretty)]
    pub format: Formatter,

    /// Announce what is loaded and created.
    #[arg(long, short)]
    pub verbose: bool,
}

#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true)]
pub struct LocationsArgs {
    /// Print only this location (`home_dir`, `call_dir`, `conf_dir` or `data_dir`).
    pub key: Option<String>,

    /// Search for a file in the locations instead.
    #[arg(long, short, conflicts_with = "key")]
    pub search: Option<String>,
}

#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true)]
pub struct BackupArgs {
    /// The file or folder to back up.
    pub src: String,

    /// Put the backup into this absolute folder instead of next to the source.
    #[arg(long, short)]
    pub into: Option<PathBuf>,

    /// Do not announce the copy.
    #[arg(long, short)]
    pub quiet: bool,
}

#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true)]
pub struct HostnameArgs {}

#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true)]
pub struct TimestampArgs {
    /// Append microseconds.
    #[arg(long, short)]
    pub precise: bool,
}

#[derive(Parser, Debug)]
#[command(no_binary_name = true)]
pub struct GitArgs {
    /// The local checkout.
    pub local: String,

    /// Clone from here if the checkout does not exist yet.
    #[arg(long, short)]
    pub remote_url: Option<String>,

    /// Announce every git call.
    #[arg(long, short)]
    pub verbose: bool,

    #[command(subcommand)]
    pub action: GitAction,
}

#[derive(Subcommand, Debug, Clone)]
pub enum GitAction {
    /// Name of the first remote.
    Remote,
    /// Hash of the current commit.
    Commit,
    /// The last few commits.
    Log,
    /// Working tree state.
    Status,
    /// Print the current branch, or check out another one.
    Branch {
        /// Branch to check out.
        #[arg(long, short = 's', num_args = 0..=1, default_missing_value = DEFAULT_BRANCH)]
        set: Option<String>,
    },
    /// Commit local changes to the host branch and fetch.
    Cleanup,
    /// Clean up, then push.
    Publish,
    /// All tags.
    Tags,
}

#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true)]
pub struct VersionArgs {
    /// Check this version instead of the running one.
    pub version: Option<String>,
}
