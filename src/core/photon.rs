// src/core/photon.rs

use crate::{
    CancellationToken,
    core::settings::Settings,
    models::{CommandLine, ShellResult},
    system::{
        executor::{self, RunOptions, ShellError},
        notify::Notice,
    },
};
use serde_json::json;

/// Shared context for tools: verbosity, loaded settings and a cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct Photon {
    verbose: bool,
    settings: Option<Settings>,
    cancellation_token: Option<CancellationToken>,
}

impl Photon {
    /// A context without settings or cancellation.
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            ..Self::default()
        }
    }

    /// Attaches loaded settings.
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Every command run through this context stops once `token` is raised.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    /// Whether announcements are printed.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// The attached settings, if any.
    pub fn settings(&self) -> Option<&Settings> {
        self.settings.as_ref()
    }

    /// A message that follows this context's verbosity.
    pub fn notice(&self, message: impl Into<String>) -> Notice {
        Notice::new(message).verbose(self.verbose)
    }

    /// Announces `message`, then runs `command`.
    ///
    /// The announcement is only printed when both the context and `options`
    /// are verbose. The context's cancellation flag applies unless `options`
    /// brings its own.
    pub fn run(
        &self,
        message: &str,
        command: impl Into<CommandLine>,
        options: RunOptions,
    ) -> Result<ShellResult, ShellError> {
        let command = command.into();
        self.notice(message)
            .more(&json!({ "command": command.to_string(), "cwd": options.cwd }))
            .verbose(self.verbose && options.verbose)
            .emit()?;

        let options = match (&options.cancellation_token, &self.cancellation_token) {
            (None, Some(token)) => options.cancellable(token.clone()),
            _ => options,
        };
        executor::shell_run(command, &options)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;

    #[test]
    fn run_announces_and_executes() {
        let photon = Photon::new(false);
        let result = photon
            .run("saying hi", "echo hi", RunOptions::default())
            .unwrap();
        assert_eq!(result.out, "hi");
    }

    #[test]
    fn context_cancellation_applies() {
        let photon = Photon::new(false).with_cancellation(Arc::new(AtomicBool::new(true)));
        let err = photon
            .run("waiting", ["sleep", "5"], RunOptions::probe())
            .unwrap_err();
        assert!(matches!(err, ShellError::Cancelled(_)));
    }
}
