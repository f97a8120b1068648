// src/cli/handlers/version.rs

use anyhow::Result;
use clap::Parser;
use colored::*;

use crate::{CancellationToken, cli::args::VersionArgs, constants::IDENT, meta};

/// The main handler for the `version` command.
/// Prints the identity, whether the version is a pre-release and its release tag.
pub fn handle(args: Vec<String>, _cancellation_token: &CancellationToken) -> Result<()> {
    let version_args = VersionArgs::try_parse_from(&args)?;
    let version = version_args.version.as_deref().unwrap_or(meta::VERSION);

    println!("{} {}", IDENT.yellow().bold(), version);
    let channel = if meta::is_prerelease(version) {
        t!("version.label.prerelease").yellow()
    } else {
        t!("version.label.release").green()
    };
    println!("  {:<12} {}", t!("version.label.channel").blue(), channel);
    println!(
        "  {:<12} {}",
        t!("version.label.tag").blue(),
        meta::release_tag(version)
    );
    Ok(())
}
