// src/cli/handlers/git.rs

use anyhow::Result;
use clap::Parser;

use super::commons::{self, check_for_cancellation};
use crate::{
    CancellationToken,
    cli::args::{GitAction, GitArgs},
    core::photon::Photon,
    tools::git::Git,
};

/// The main handler for the `git` command.
/// Opens (or clones) the checkout, then performs one action on it.
pub fn handle(args: Vec<String>, cancellation_token: &CancellationToken) -> Result<()> {
    let git_args = GitArgs::try_parse_from(&args)?;
    let photon = Photon::new(git_args.verbose).with_cancellation(cancellation_token.clone());

    let local = commons::resolve_file_arg(&git_args.local)?;
    let repo = Git::open(&photon, &local, git_args.remote_url.as_deref())?;
    check_for_cancellation(cancellation_token)?;

    match git_args.action {
        GitAction::Remote => print_line(repo.remote()?),
        GitAction::Commit => println!("{}", repo.commit()?),
        GitAction::Log => commons::print_json(&repo.log()?)?,
        GitAction::Status => commons::print_json(&repo.status()?)?,
        GitAction::Branch { set: None } => print_line(repo.branch()?),
        GitAction::Branch { set: Some(name) } => print_line(repo.set_branch(Some(name.as_str()))?),
        GitAction::Cleanup => commons::print_json(&repo.cleanup()?)?,
        GitAction::Publish => commons::print_json(&repo.publish()?)?,
        GitAction::Tags => repo.tags()?.iter().for_each(|tag| println!("{}", tag)),
    }
    Ok(())
}

fn print_line(value: Option<String>) {
    if let Some(value) = value {
        println!("{}", value);
    }
}
