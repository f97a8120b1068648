// src/system/notify.rs

//! The one place Photon prints messages.
//!
//! A message has a state (which picks its prefix), an optional payload that is
//! pretty-printed below it, and an optional exit code. When an exit code is set,
//! or the state is [`NotifyState::Fatal`], the message is always printed and a
//! [`Teardown`] error is returned; the binary turns that into a process exit.

use crate::{
    constants::FATAL_EXIT_CODE,
    models::{Notification, NotifyState},
};
use colored::Colorize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// The application has to end with `exit_code` after `message` was shown.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct Teardown {
    /// The message that caused the teardown.
    pub message: String,
    /// The process exit code to use.
    pub exit_code: i32,
}

/// A message about to be shown. Built up with chained calls and finished by [`Notice::emit`].
#[derive(Debug, Clone)]
pub struct Notice {
    message: String,
    state: NotifyState,
    more: Option<Value>,
    exit_code: Option<i32>,
    verbose: bool,
}

impl Notice {
    /// An informational message that will be printed.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            state: NotifyState::Info,
            more: None,
            exit_code: None,
            verbose: true,
        }
    }

    /// Sets the state.
    pub fn state(mut self, state: NotifyState) -> Self {
        self.state = state;
        self
    }

    /// Shortcut for [`NotifyState::Warning`].
    pub fn warning(self) -> Self {
        self.state(NotifyState::Warning)
    }

    /// Shortcut for [`NotifyState::Fatal`].
    pub fn fatal(self) -> Self {
        self.state(NotifyState::Fatal)
    }

    /// Attaches a payload. Empty payloads (null, empty string, list or map) are dropped.
    pub fn more<T: Serialize + ?Sized>(mut self, more: &T) -> Self {
        self.more = match serde_json::to_value(more) {
            Ok(value) if !is_empty(&value) => Some(value),
            Ok(_) => None,
            Err(e) => {
                log::warn!("Could not serialize message payload: {}", e);
                None
            }
        };
        self
    }

    /// Ends the application with `code` after printing.
    pub fn exit_code(mut self, code: i32) -> Self {
        self.exit_code = Some(code);
        self
    }

    /// Whether to print. Ignored when an exit code applies.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn effective_exit_code(&self) -> Option<i32> {
        if self.state == NotifyState::Fatal {
            Some(FATAL_EXIT_CODE)
        } else {
            self.exit_code
        }
    }

    /// The message as it is printed, without colors.
    pub fn render(&self) -> String {
        compose(&self.state.prefix(), &self.message, self.more.as_ref())
    }

    fn render_colored(&self) -> String {
        let prefix = self.state.prefix();
        let prefix = match self.state {
            NotifyState::Info => prefix.dimmed(),
            NotifyState::Warning => prefix.yellow().bold(),
            NotifyState::Fatal => prefix.red().bold(),
            NotifyState::Custom(_) => prefix.cyan(),
        };
        compose(&prefix.to_string(), &self.message, self.more.as_ref())
    }

    /// Prints (if applicable) and either returns the notification or tears down.
    pub fn emit(self) -> Result<Notification, Teardown> {
        if self.effective_exit_code().is_some() {
            return Err(self.abort());
        }

        if self.verbose {
            println!("{}", self.render_colored());
        } else {
            log::trace!("{}", self.render());
        }

        Ok(Notification {
            message: self.message,
            more: self.more,
            verbose: self.verbose,
        })
    }

    /// Always prints and hands back the teardown. Without an explicit exit code
    /// the message becomes fatal.
    pub fn abort(self) -> Teardown {
        let exit_code = self.effective_exit_code().unwrap_or(FATAL_EXIT_CODE);
        let notice = if self.exit_code.is_none() {
            self.fatal()
        } else {
            self
        };
        println!("{}", notice.render_colored());
        Teardown {
            message: notice.message,
            exit_code,
        }
    }
}

/// Function form of [`Notice`], for callers that have everything at hand.
pub fn shell_notify(
    message: &str,
    state: NotifyState,
    more: Option<Value>,
    verbose: bool,
) -> Result<Notification, Teardown> {
    let mut notice = Notice::new(message).state(state).verbose(verbose);
    if let Some(value) = more {
        notice = notice.more(&value);
    }
    notice.emit()
}

fn compose(prefix: &str, message: &str, more: Option<&Value>) -> String {
    let mut line = format!("{} {}", prefix, message);
    if let Some(value) = more {
        let pretty = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
        line.push_str("\n\t");
        line.push_str(&pretty.replace('\n', "\n\t"));
    }
    line
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Number(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn prefixes_follow_the_state() {
        assert_eq!(Notice::new("hello").render(), "~ hello");
        assert_eq!(Notice::new("careful").warning().render(), "[WARNING] careful");
        assert_eq!(Notice::new("bye").fatal().render(), "[FATAL] bye");
        assert_eq!(
            Notice::new("done")
                .state(NotifyState::Custom("git".to_string()))
                .render(),
            "[git] done"
        );
    }

    #[test]
    fn payload_is_indented_with_tabs() {
        let notice = Notice::new("path created").more(&json!(["/tmp/a"]));
        assert_eq!(notice.render(), "~ path created\n\t[\n\t  \"/tmp/a\"\n\t]");
    }

    #[test]
    fn empty_payloads_are_dropped() {
        let notice = Notice::new("nothing").more(&Vec::<String>::new());
        assert_eq!(notice.render(), "~ nothing");
        let notification = notice.verbose(false).emit().unwrap();
        assert!(notification.more.is_none());
    }

    #[test]
    fn quiet_notice_returns_untouched_message() {
        let notification = Notice::new("silent")
            .more(&json!({"key": "value"}))
            .verbose(false)
            .emit()
            .unwrap();
        assert_eq!(notification.message, "silent");
        assert_eq!(notification.more, Some(json!({"key": "value"})));
        assert!(!notification.verbose);
    }

    #[test]
    fn fatal_tears_down_with_code_23() {
        let err = Notice::new("broken").fatal().verbose(false).emit().unwrap_err();
        assert_eq!(err.exit_code, FATAL_EXIT_CODE);
        assert_eq!(err.message, "broken");
    }

    #[test]
    fn abort_turns_any_notice_fatal() {
        let teardown = Notice::new("giving up").warning().abort();
        assert_eq!(teardown.exit_code, FATAL_EXIT_CODE);
        assert_eq!(teardown.to_string(), "giving up");
    }

    #[test]
    fn explicit_exit_code_tears_down() {
        assert!(shell_notify("staying", NotifyState::Info, None, false).is_ok());
        let err = Notice::new("leaving").exit_code(3).emit().unwrap_err();
        assert_eq!(err.exit_code, 3);
    }
}
