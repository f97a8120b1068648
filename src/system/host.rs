// src/system/host.rs

use crate::{
    constants::{TIMESTAMP_FORMAT, TIMESTAMP_PRECISE_SUFFIX},
    system::{
        executor::{RunOptions, ShellError, shell_run},
        notify::Notice,
    },
};
use chrono::{DateTime, Local, TimeZone};

/// Now, formatted as `%Y.%m.%d-%H.%M.%S` (plus `-<microseconds>` when `precise`).
pub fn timestamp(precise: bool) -> String {
    format_timestamp(&Local::now(), precise)
}

/// Formats any point in time the way [`timestamp`] does.
pub fn format_timestamp<Tz: TimeZone>(moment: &DateTime<Tz>, precise: bool) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let mut format = TIMESTAMP_FORMAT.to_string();
    if precise {
        format.push_str(TIMESTAMP_PRECISE_SUFFIX);
    }
    moment.format(&format).to_string()
}

/// The short hostname, probed with `uname -n` and then `hostname`.
///
/// Domain parts are split off. If neither probe works this is fatal.
pub fn hostname() -> Result<String, ShellError> {
    for probe in ["uname -n", "hostname"] {
        let result = shell_run(probe, &RunOptions::probe())?;
        if result.success() && !result.out.is_empty() {
            return Ok(short_hostname(&result.out));
        }
        log::debug!("Hostname probe '{}' failed: {}", probe, result.out);
    }
    Err(Notice::new(t!("host.error.no_hostname")).abort().into())
}

fn short_hostname(raw: &str) -> String {
    raw.trim()
        .split('.')
        .next()
        .unwrap_or_default()
        .to_string()
}
