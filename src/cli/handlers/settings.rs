// src/cli/handlers/settings.rs

use anyhow::Result;
use clap::Parser;

use super::commons::{self, check_for_cancellation};
use crate::{
    CancellationToken,
    cli::args::SettingsArgs,
    core::settings::{self, Settings},
};

/// The main handler for the `settings` command.
/// Loads defaults and config, then prints the value found under the given keys.
pub fn handle(args: Vec<String>, cancellation_token: &CancellationToken) -> Result<()> {
    let settings_args = SettingsArgs::try_parse_from(&args)?;

    let defaults = commons::resolve_file_arg(&settings_args.defaults)?;
    let config = settings_args
        .config
        .as_deref()
        .map(commons::resolve_file_arg)
        .transpose()?;
    check_for_cancellation(cancellation_token)?;

    let loaded = Settings::load(&defaults, config.as_deref(), settings_args.verbose)?;
    log::debug!(
        "Settings loaded from '{}' and {:?}",
        loaded.defaults_path().display(),
        loaded.config_path()
    );

    let value = loaded.lookup(settings_args.keys.as_slice());
    println!("{}", settings::format_value(&value, settings_args.format)?);
    Ok(())
}
