// src/cli/handlers/locations.rs

use anyhow::{Result, anyhow};
use clap::Parser;
use colored::*;

use crate::{
    CancellationToken,
    cli::args::LocationsArgs,
    core::locations::{self, SearchOptions},
};

/// The main handler for the `locations` command.
/// Prints the default folders, one of them, or where a file is found.
pub fn handle(args: Vec<String>, _cancellation_token: &CancellationToken) -> Result<()> {
    let locations_args = LocationsArgs::try_parse_from(&args)?;
    let defaults = locations::default_locations()?;

    if let Some(file) = &locations_args.search {
        let found = locations::search_location(file, &defaults, &SearchOptions::default())?
            .ok_or_else(|| anyhow!(format!(t!("locations.error.not_in_locations"), file = file)))?;
        println!("{}", found.display());
        return Ok(());
    }

    if let Some(key) = &locations_args.key {
        let path = defaults
            .get(key)
            .ok_or_else(|| anyhow!(format!(t!("locations.error.unknown_key"), key = key)))?;
        println!("{}", path.display());
        return Ok(());
    }

    for (key, path) in defaults.entries() {
        println!("  {:<10} {}", key.cyan(), path.display());
    }
    Ok(())
}
