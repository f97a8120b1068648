// src/cli/handlers/timestamp.rs

use anyhow::Result;
use clap::Parser;

use crate::{CancellationToken, cli::args::TimestampArgs, system::host};

/// The main handler for the `timestamp` command.
pub fn handle(args: Vec<String>, _cancellation_token: &CancellationToken) -> Result<()> {
    let timestamp_args = TimestampArgs::try_parse_from(&args)?;
    println!("{}", host::timestamp(timestamp_args.precise));
    Ok(())
}
