// src/cli/handlers/hostname.rs

use anyhow::Result;
use clap::Parser;

use crate::{CancellationToken, cli::args::HostnameArgs, system::host};

/// The main handler for the `hostname` command.
pub fn handle(args: Vec<String>, _cancellation_token: &CancellationToken) -> Result<()> {
    let _hostname_args = HostnameArgs::try_parse_from(&args)?;
    println!("{}", host::hostname()?);
    Ok(())
}
