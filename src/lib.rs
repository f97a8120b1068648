//! Photon: a shell backend as a module.
//!
//! Helper scripts on gateway nodes mostly shell out to system commands and
//! react to what comes back. Photon gives them one place to do that
//! ([`system::executor::shell_run`]), one place to talk to the user
//! ([`system::notify`]), and the small file, settings and git helpers
//! those scripts keep needing.

include!(concat!(env!("OUT_DIR"), "/translations.rs"));

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/// A shared flag; raising it asks a running command to stop.
pub type CancellationToken = Arc<AtomicBool>;

pub mod cli;
pub mod constants;
pub mod core;
pub mod meta;
pub mod models;
pub mod system;
pub mod tools;
