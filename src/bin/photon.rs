// src/bin/photon.rs

use anyhow::Result;
use clap::{CommandFactory, Parser};
use colored::*;
use photon::{
    CancellationToken,
    cli::{Cli, handlers},
    system::notify::Teardown,
};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

// --- Command Definition and Registry ---

/// A command, its aliases and its handler.
struct CommandDefinition {
    name: &'static str,
    aliases: &'static [&'static str],
    handler: fn(Vec<String>, &CancellationToken) -> Result<()>,
}

/// Every command the binary knows. Adding a command means adding an entry here.
static COMMAND_REGISTRY: &[CommandDefinition] = &[
    CommandDefinition {
        name: "backup",
        aliases: &[],
        handler: handlers::backup::handle,
    },
    CommandDefinition {
        name: "git",
        aliases: &[],
        handler: handlers::git::handle,
    },
    CommandDefinition {
        name: "hostname",
        aliases: &[],
        handler: handlers::hostname::handle,
    },
    CommandDefinition {
        name: "locations",
        aliases: &["loc"],
        handler: handlers::locations::handle,
    },
    CommandDefinition {
        name: "run",
        aliases: &[],
        handler: handlers::run::handle,
    },
    CommandDefinition {
        name: "settings",
        aliases: &["set"],
        handler: handlers::settings::handle,
    },
    CommandDefinition {
        name: "timestamp",
        aliases: &["ts"],
        handler: handlers::timestamp::handle,
    },
    CommandDefinition {
        name: "version",
        aliases: &[],
        handler: handlers::version::handle,
    },
];

/// Finds a command definition in the registry by its name or alias.
fn find_command(name: &str) -> Option<&'static CommandDefinition> {
    COMMAND_REGISTRY
        .iter()
        .find(|cmd| cmd.name == name || cmd.aliases.contains(&name))
}

fn main() {
    // Stays lowered for now; handlers pass it on to every command they start.
    let cancellation_token = Arc::new(AtomicBool::new(false));
    env_logger::init();

    if let Err(e) = run_cli(Cli::parse(), &cancellation_token) {
        // A fatal message was already printed; leave with its exit code.
        if let Some(teardown) = e.chain().find_map(|cause| cause.downcast_ref::<Teardown>()) {
            log::debug!("Teardown: {}", teardown.message);
            std::process::exit(teardown.exit_code);
        }

        eprintln!("\n{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

/// Routes `photon <command> [args...]` to its handler; anything else prints help.
fn run_cli(cli: Cli, cancellation_token: &CancellationToken) -> Result<()> {
    log::debug!("CLI args parsed: {:?}", cli);

    let Some(command) = cli.command.as_deref().and_then(find_command) else {
        if let Some(unknown) = &cli.command {
            eprintln!(
                "{}\n",
                format!(photon::t!("cli.error.unknown_command"), command = unknown).yellow()
            );
        }
        Cli::command().print_help()?;
        return Ok(());
    };

    (command.handler)(cli.args, cancellation_token)
}
