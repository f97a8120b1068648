// src/cli/handlers/backup.rs

use anyhow::{Result, anyhow};
use clap::Parser;

use crate::{CancellationToken, cli::args::BackupArgs, core::locations};

/// The main handler for the `backup` command.
/// Copies a file or folder to a timestamped sibling and prints where it went.
pub fn handle(args: Vec<String>, _cancellation_token: &CancellationToken) -> Result<()> {
    let backup_args = BackupArgs::try_parse_from(&args)?;

    let src = locations::expand_path(&backup_args.src)?;
    if !src.exists() {
        return Err(anyhow!(format!(
            t!("backup.error.missing_source"),
            path = src.display()
        )));
    }

    let target = locations::backup_location(&src, backup_args.into.as_deref(), !backup_args.quiet)?;
    println!("{}", target.display());
    Ok(())
}
