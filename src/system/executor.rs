// src/system/executor.rs

use crate::{
    CancellationToken,
    constants::{DEFAULT_TIMEOUT, POLL_INTERVAL},
    models::{CommandLine, ShellResult},
    system::notify::{Notice, Teardown},
};
use std::io::{ErrorKind, Read, Write};
use std::path::PathBuf;
use std::process::{Child, Command as StdCommand, ExitStatus, Stdio};
use std::sync::atomic::Ordering;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Why [`shell_run`] gave no result.
#[derive(Error, Debug)]
pub enum ShellError {
    #[error("Command could not be parsed: {0}")]
    CommandParse(String),
    #[error("Command '{0}' was cancelled.")]
    Cancelled(String),
    #[error("{0}")]
    Teardown(#[from] Teardown),
}

/// How [`shell_run`] runs a command.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Text written to the command's stdin.
    pub stdin: Option<String>,
    /// Working directory for the command.
    pub cwd: Option<PathBuf>,
    /// Kill the command after this long.
    pub timeout: Duration,
    /// A failure tears the application down.
    pub critical: bool,
    /// Print warnings about non-critical failures.
    pub verbose: bool,
    /// Stop the command when this flag is raised.
    pub cancellation_token: Option<CancellationToken>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            stdin: None,
            cwd: None,
            timeout: DEFAULT_TIMEOUT,
            critical: true,
            verbose: true,
            cancellation_token: None,
        }
    }
}

impl RunOptions {
    /// Writes `stdin` to the command's stdin.
    pub fn stdin(mut self, stdin: impl Into<String>) -> Self {
        self.stdin = Some(stdin.into());
        self
    }

    /// Runs the command in `cwd`.
    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Kills the command after `timeout`.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether a failure tears the application down.
    pub fn critical(mut self, critical: bool) -> Self {
        self.critical = critical;
        self
    }

    /// Whether warnings about failures are printed.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Stops the command once `token` is raised.
    pub fn cancellable(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    /// Non-critical and quiet: for probing commands whose failure is an answer.
    pub fn probe() -> Self {
        Self::default().critical(false).verbose(false)
    }
}

/// How far a child process got.
enum Outcome {
    Exited {
        code: i32,
        stdout: String,
        stderr: String,
    },
    TimedOut,
    Failed(String),
}

/// Runs a command, waits for it and reports what happened.
///
/// A line is split with POSIX shell-word rules; an argv list is used as-is.
/// Output is captured into lines (empty ones dropped) and `out` carries the
/// most urgent message. When the command does not exit with 0 the failure is
/// announced: as a warning if not `critical` (and `verbose`), otherwise as a
/// fatal message, which returns [`ShellError::Teardown`].
///
/// # Errors
/// - [`ShellError::CommandParse`] if the line has unbalanced quotes.
/// - [`ShellError::Cancelled`] if the cancellation token was raised.
/// - [`ShellError::Teardown`] if a critical command failed.
pub fn shell_run(
    command: impl Into<CommandLine>,
    options: &RunOptions,
) -> Result<ShellResult, ShellError> {
    let command = command.into();
    let stdin = options.stdin.clone().filter(|s| !s.is_empty());
    let mut result = ShellResult {
        command: command.to_string(),
        stdin: stdin.clone(),
        cwd: options.cwd.clone(),
        ..Default::default()
    };

    let argv = match &command {
        CommandLine::Line(line) => {
            shlex::split(line).ok_or_else(|| ShellError::CommandParse(line.clone()))?
        }
        CommandLine::Argv(argv) => argv.clone(),
    };
    log::debug!("Running {:?} (cwd: {:?})", argv, options.cwd);

    match communicate(&argv, stdin.as_deref(), options, &result.command)? {
        Outcome::Exited {
            code,
            stdout,
            stderr,
        } => {
            result.stdout = non_empty_lines(&stdout);
            result.stderr = non_empty_lines(&stderr);
            result.returncode = Some(code);
        }
        Outcome::TimedOut => {
            let seconds = options.timeout.as_secs_f64();
            result.exception = Some(format!(
                "Command '{}' timed out after {} seconds",
                result.command, seconds
            ));
            result.timeout = Some(seconds);
        }
        Outcome::Failed(message) => result.exception = Some(message),
    }
    result.settle_out();
    log::trace!("Result of '{}': {:?}", result.command, result);

    if !result.success() {
        result.critical = Some(options.critical);
        let notice = Notice::new(format!(
            t!("shell.error.command_failed"),
            command = result.command
        ))
        .more(&result)
        .verbose(options.verbose);
        let notice = if options.critical {
            notice.fatal()
        } else {
            notice.warning()
        };
        notice.emit()?;
    }

    Ok(result)
}

fn build_command(program: &str, args: &[String], options: &RunOptions) -> StdCommand {
    let mut command = StdCommand::new(program);
    command
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(cwd) = &options.cwd {
        command.current_dir(dunce::simplified(cwd));
    }
    command
}

fn spawn(argv: &[String], options: &RunOptions) -> Result<Child, String> {
    let Some((program, args)) = argv.split_first() else {
        return Err("No command specified to run.".to_string());
    };

    match build_command(program, args, options).spawn() {
        Ok(child) => Ok(child),
        // Built-ins like `echo` only exist inside cmd.exe.
        Err(e) if e.kind() == ErrorKind::NotFound && cfg!(target_os = "windows") => {
            log::debug!("Command '{}' not found. Retrying with cmd /C.", program);
            let mut fallback = vec!["/C".to_string()];
            fallback.extend(argv.iter().cloned());
            build_command("cmd", &fallback, options)
                .spawn()
                .map_err(|e| e.to_string())
        }
        Err(e) => Err(e.to_string()),
    }
}

/// Feeds stdin, drains stdout/stderr and waits for the child, honoring the
/// timeout and the cancellation token.
fn communicate(
    argv: &[String],
    stdin: Option<&str>,
    options: &RunOptions,
    display: &str,
) -> Result<Outcome, ShellError> {
    let mut child = match spawn(argv, options) {
        Ok(child) => child,
        Err(message) => return Ok(Outcome::Failed(message)),
    };

    // Dropping the pipe without data closes stdin right away. The writer is
    // never joined: a grandchild may keep the pipe open without reading.
    if let (Some(mut pipe), Some(data)) = (child.stdin.take(), stdin) {
        let data = data.to_string();
        thread::spawn(move || {
            if let Err(e) = pipe.write_all(data.as_bytes()) {
                log::debug!("Could not write stdin: {}", e);
            }
        });
    }
    let stdout_reader = child.stdout.take().map(spawn_reader);
    let stderr_reader = child.stderr.take().map(spawn_reader);

    let deadline = Instant::now() + options.timeout;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                if is_cancelled(options) {
                    log::debug!(
                        "Cancellation requested, killing child process (PID: {})...",
                        child.id()
                    );
                    kill(&mut child);
                    return Err(ShellError::Cancelled(display.to_string()));
                }
                if Instant::now() >= deadline {
                    log::debug!(
                        "Timeout of {:?} reached, killing child process (PID: {})...",
                        options.timeout,
                        child.id()
                    );
                    kill(&mut child);
                    return Ok(Outcome::TimedOut);
                }
                thread::sleep(POLL_INTERVAL);
            }
            Err(e) => {
                kill(&mut child);
                return Ok(Outcome::Failed(e.to_string()));
            }
        }
    };

    // The child is gone, but a background grandchild may still hold its
    // pipes. The output only counts if it arrives before the deadline.
    let Some(stdout) = collect(stdout_reader, deadline, options, display)? else {
        log::debug!("Output of '{}' still open at the deadline", display);
        return Ok(Outcome::TimedOut);
    };
    let Some(stderr) = collect(stderr_reader, deadline, options, display)? else {
        log::debug!("Errors of '{}' still open at the deadline", display);
        return Ok(Outcome::TimedOut);
    };

    Ok(Outcome::Exited {
        code: exit_code(status),
        stdout,
        stderr,
    })
}

/// Reads a pipe to its end on its own thread and hands the bytes over once.
fn spawn_reader<R: Read + Send + 'static>(mut pipe: R) -> Receiver<Vec<u8>> {
    let (sender, receiver) = mpsc::channel();
    thread::spawn(move || {
        let mut buffer = Vec::new();
        if let Err(e) = pipe.read_to_end(&mut buffer) {
            log::debug!("Could not read child output: {}", e);
        }
        // The receiver is gone when the deadline passed first.
        sender.send(buffer).ok();
    });
    receiver
}

/// Waits for a reader until `deadline`. `None` means the pipe was still open then.
fn collect(
    reader: Option<Receiver<Vec<u8>>>,
    deadline: Instant,
    options: &RunOptions,
    display: &str,
) -> Result<Option<String>, ShellError> {
    let Some(receiver) = reader else {
        return Ok(Some(String::new()));
    };
    loop {
        match receiver.recv_timeout(POLL_INTERVAL) {
            Ok(bytes) => return Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
            Err(RecvTimeoutError::Disconnected) => return Ok(Some(String::new())),
            Err(RecvTimeoutError::Timeout) => {
                if is_cancelled(options) {
                    return Err(ShellError::Cancelled(display.to_string()));
                }
                if Instant::now() >= deadline {
                    return Ok(None);
                }
            }
        }
    }
}

fn is_cancelled(options: &RunOptions) -> bool {
    options
        .cancellation_token
        .as_ref()
        .is_some_and(|token| token.load(Ordering::Relaxed))
}

fn kill(child: &mut Child) {
    if let Err(e) = child.kill() {
        log::warn!("Failed to kill child process {}: {}", child.id(), e);
    }
    child.wait().ok();
}

#[cfg(unix)]
fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|signal| -signal))
        .unwrap_or(-1)
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}

fn non_empty_lines(text: &str) -> Vec<String> {
    text.lines()
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::constants::FATAL_EXIT_CODE;
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;

    #[test]
    fn captures_stdout_of_a_line() {
        let result = shell_run("echo hello", &RunOptions::default()).unwrap();
        assert_eq!(result.stdout, vec!["hello"]);
        assert!(result.stderr.is_empty());
        assert_eq!(result.returncode, Some(0));
        assert_eq!(result.out, "hello");
        assert_eq!(result.critical, None);
        assert!(result.success());
    }

    #[test]
    fn argv_is_not_split() {
        let result = shell_run(["echo", "a  b"], &RunOptions::default()).unwrap();
        assert_eq!(result.stdout, vec!["a  b"]);
        assert_eq!(result.command, "echo a  b");
    }

    #[test]
    fn quoted_words_stay_together() {
        let result = shell_run("printf '%s|' 'one two' three", &RunOptions::default()).unwrap();
        assert_eq!(result.out, "one two|three|");
    }

    #[test]
    fn empty_lines_are_dropped() {
        let result = shell_run(["printf", "a\n\nb\n"], &RunOptions::default()).unwrap();
        assert_eq!(result.stdout, vec!["a", "b"]);
        assert_eq!(result.out, "a\nb");
    }

    #[test]
    fn stdin_is_fed_to_the_command() {
        let options = RunOptions::default().stdin("first\nsecond\n");
        let result = shell_run("cat", &options).unwrap();
        assert_eq!(result.stdout, vec!["first", "second"]);
        assert_eq!(result.stdin.as_deref(), Some("first\nsecond\n"));
    }

    #[test]
    fn empty_stdin_is_not_recorded() {
        let result = shell_run("cat", &RunOptions::default().stdin("")).unwrap();
        assert_eq!(result.stdin, None);
        assert!(result.stdout.is_empty());
        assert_eq!(result.out, "");
    }

    #[test]
    fn stderr_wins_over_stdout() {
        let result = shell_run(
            ["sh", "-c", "echo out; echo err >&2; exit 3"],
            &RunOptions::probe(),
        )
        .unwrap();
        assert_eq!(result.returncode, Some(3));
        assert_eq!(result.stdout, vec!["out"]);
        assert_eq!(result.stderr, vec!["err"]);
        assert_eq!(result.out, "err");
        assert_eq!(result.critical, Some(false));
        assert!(!result.success());
    }

    #[test]
    fn critical_failure_tears_down() {
        let options = RunOptions::default().verbose(false);
        match shell_run("false", &options) {
            Err(ShellError::Teardown(teardown)) => {
                assert_eq!(teardown.exit_code, FATAL_EXIT_CODE);
                assert!(teardown.message.contains("false"));
            }
            other => panic!("expected teardown, got {:?}", other),
        }
    }

    #[test]
    fn missing_program_reports_exception() {
        let result = shell_run("photon-no-such-program --flag", &RunOptions::probe()).unwrap();
        assert!(result.exception.is_some());
        assert_eq!(result.returncode, None);
        assert_eq!(Some(result.out.clone()), result.exception);
        assert_eq!(result.critical, Some(false));
    }

    #[test]
    fn empty_command_reports_exception() {
        let result = shell_run("   ", &RunOptions::probe()).unwrap();
        assert_eq!(result.exception.as_deref(), Some("No command specified to run."));
        assert_eq!(result.returncode, None);
    }

    #[test]
    fn unbalanced_quotes_are_a_parse_error() {
        let err = shell_run("echo 'unterminated", &RunOptions::probe()).unwrap_err();
        assert!(matches!(err, ShellError::CommandParse(_)));
    }

    #[test]
    fn timeout_kills_the_command() {
        let options = RunOptions::probe().timeout(Duration::from_millis(200));
        let started = Instant::now();
        let result = shell_run(["sleep", "5"], &options).unwrap();
        assert!(started.elapsed() < Duration::from_secs(4));
        assert_eq!(result.timeout, Some(0.2));
        assert_eq!(result.returncode, None);
        assert!(result.out.contains("timed out"));
    }

    #[test]
    fn background_children_do_not_outlive_the_timeout() {
        let options = RunOptions::probe().timeout(Duration::from_secs(1));
        let started = Instant::now();
        let result = shell_run(["sh", "-c", "sleep 6 & echo hi"], &options).unwrap();
        assert!(started.elapsed() < Duration::from_secs(3));
        assert_eq!(result.returncode, None);
        assert_eq!(result.timeout, Some(1.0));
        assert!(result.out.contains("timed out"));
    }

    #[test]
    fn detached_background_children_do_not_block() {
        let options = RunOptions::probe().timeout(Duration::from_secs(2));
        let started = Instant::now();
        let result = shell_run(
            ["sh", "-c", "sleep 6 >/dev/null 2>&1 </dev/null & echo hi"],
            &options,
        )
        .unwrap();
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(result.returncode, Some(0));
        assert_eq!(result.out, "hi");
    }

    #[test]
    fn timeout_while_stdin_is_still_written() {
        let options = RunOptions::probe()
            .timeout(Duration::from_millis(200))
            .stdin("x".repeat(4 * 1024 * 1024));
        let started = Instant::now();
        let result = shell_run(["sleep", "5"], &options).unwrap();
        assert!(started.elapsed() < Duration::from_secs(3));
        assert_eq!(result.returncode, None);
        assert_eq!(result.timeout, Some(0.2));
    }

    #[test]
    fn cwd_is_respected() {
        let dir = tempfile::tempdir().unwrap();
        let result = shell_run("pwd", &RunOptions::default().cwd(dir.path())).unwrap();
        assert_eq!(
            dunce::canonicalize(&result.out).unwrap(),
            dunce::canonicalize(dir.path()).unwrap()
        );
        assert_eq!(result.cwd.as_deref(), Some(dir.path()));
    }

    #[test]
    fn raised_token_cancels() {
        let token = Arc::new(AtomicBool::new(true));
        let options = RunOptions::probe().cancellable(token);
        let err = shell_run(["sleep", "5"], &options).unwrap_err();
        assert!(matches!(err, ShellError::Cancelled(_)));
    }

    #[test]
    fn failed_result_serializes_without_absent_fields() {
        let result = shell_run(["sh", "-c", "exit 1"], &RunOptions::probe()).unwrap();
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["returncode"], 1);
        assert_eq!(value["critical"], false);
        assert!(value.get("stdout").is_none());
        assert!(value.get("exception").is_none());
    }
}
