// src/constants.rs

use std::time::Duration;

/// The identifier used for folder names and messages.
pub const IDENT: &str = "photon";

/// How long a shelled-out command may run before it is killed.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Exit code used when a fatal message tears the application down.
pub const FATAL_EXIT_CODE: i32 = 23;

/// Interval between checks on a running child process.
pub const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Format of [`crate::system::host::timestamp`].
pub const TIMESTAMP_FORMAT: &str = "%Y.%m.%d-%H.%M.%S";

/// Suffix appended to [`TIMESTAMP_FORMAT`] for precise timestamps (microseconds).
pub const TIMESTAMP_PRECISE_SUFFIX: &str = "-%6f";

/// Default name of the settings defaults file.
pub const DEFAULTS_FILENAME: &str = "defaults.toml";

/// Branch used by the git tool when none is given.
pub const DEFAULT_BRANCH: &str = "master";

/// How many entries [`crate::tools::git::Git::log`] returns.
pub const GIT_LOG_LENGTH: usize = 10;
