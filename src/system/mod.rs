//! # System Interaction Layer
//!
//! Everything that touches the host directly lives here.
//!
//! ## Modules
//!
//! - **`executor`**: runs external commands with captured output, stdin, a
//!   working directory, a timeout and graceful cancellation.
//! - **`notify`**: the single printing path, including teardown on fatal messages.
//! - **`host`**: timestamps and the hostname probe.

pub mod executor;
pub mod host;
pub mod notify;
