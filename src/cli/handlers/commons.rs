// src/cli/handlers/commons.rs

// Shared helpers for the command handlers.

use anyhow::{Result, anyhow};
use serde::Serialize;
use std::sync::atomic::Ordering;

use crate::{CancellationToken, core::locations};
use std::path::{MAIN_SEPARATOR, PathBuf};

/// Fails once the user asked to stop.
pub fn check_for_cancellation(cancellation_token: &CancellationToken) -> Result<()> {
    if cancellation_token.load(Ordering::Relaxed) {
        return Err(anyhow!(t!("common.error.operation_cancelled")));
    }
    Ok(())
}

/// Prints `value` as indented JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// A file argument that looks like a path (it contains a separator) is expanded
/// and made absolute; bare names are left for the location search.
pub fn resolve_file_arg(arg: &str) -> Result<String> {
    if arg.contains('/') || arg.contains(MAIN_SEPARATOR) {
        let path: PathBuf = locations::expand_path(arg)?;
        return Ok(path.to_string_lossy().into_owned());
    }
    Ok(arg.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;

    #[test]
    fn bare_names_are_kept() {
        assert_eq!(resolve_file_arg("photon.toml").unwrap(), "photon.toml");
    }

    #[test]
    fn paths_become_absolute() {
        let resolved = resolve_file_arg("conf/photon.toml").unwrap();
        assert!(PathBuf::from(&resolved).is_absolute());
        assert!(resolved.ends_with("photon.toml"));
    }

    #[test]
    fn raised_token_cancels() {
        let token = Arc::new(AtomicBool::new(false));
        assert!(check_for_cancellation(&token).is_ok());
        token.store(true, Ordering::Relaxed);
        assert!(check_for_cancellation(&token).is_err());
    }
}
