// src/cli/handlers/run.rs

use anyhow::{Result, anyhow};
use clap::Parser;
use std::time::Duration;

use super::commons;
use crate::{
    CancellationToken,
    cli::args::RunArgs,
    models::CommandLine,
    system::executor::{self, RunOptions},
};

/// The main handler for the `run` command.
/// Runs one command and prints its result as JSON.
pub fn handle(args: Vec<String>, cancellation_token: &CancellationToken) -> Result<()> {
    let run_args = RunArgs::try_parse_from(&args)?;
    let options = build_options(&run_args)?.cancellable(cancellation_token.clone());

    let command = match run_args.command.as_slice() {
        [line] => CommandLine::Line(line.clone()),
        argv => CommandLine::Argv(argv.to_vec()),
    };

    let result = executor::shell_run(command, &options)?;
    commons::print_json(&result)?;

    if !result.success() {
        return Err(anyhow!(
            format!(t!("shell.error.command_failed"), command = result.command)
        ));
    }
    Ok(())
}

fn build_options(run_args: &RunArgs) -> Result<RunOptions> {
    let mut options = RunOptions::default()
        .critical(!run_args.non_critical)
        .verbose(run_args.verbose);
    if let Some(stdin) = &run_args.stdin {
        options = options.stdin(stdin.as_str());
    }
    if let Some(cwd) = &run_args.cwd {
        options = options.cwd(commons::resolve_file_arg(cwd)?);
    }
    if let Some(seconds) = run_args.timeout {
        let timeout = Duration::try_from_secs_f64(seconds)
            .map_err(|_| anyhow!(t!("run.error.invalid_timeout")))?;
        options = options.timeout(timeout);
    }
    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_become_options() {
        let args = RunArgs::try_parse_from([
            "--stdin", "data", "--timeout", "1.5", "--non-critical", "-v", "cat",
        ])
        .unwrap();
        let options = build_options(&args).unwrap();
        assert_eq!(options.stdin.as_deref(), Some("data"));
        assert_eq!(options.timeout, Duration::from_millis(1500));
        assert!(!options.critical);
        assert!(options.verbose);
        assert_eq!(args.command, vec!["cat"]);
    }

    #[test]
    fn output_stays_machine_readable_by_default() {
        let args = RunArgs::try_parse_from(["--non-critical", "false"]).unwrap();
        let options = build_options(&args).unwrap();
        assert!(!options.verbose);
    }

    #[test]
    fn command_keeps_its_own_flags() {
        let args = RunArgs::try_parse_from(["ls", "-la", "/tmp"]).unwrap();
        assert_eq!(args.command, vec!["ls", "-la", "/tmp"]);
    }

    #[test]
    fn negative_timeout_is_rejected() {
        let args = RunArgs::try_parse_from(["--timeout=-1", "true"]).unwrap();
        assert!(build_options(&args).is_err());
    }

    #[test]
    fn missing_command_is_an_error() {
        assert!(RunArgs::try_parse_from(Vec::<String>::new()).is_err());
    }
}
