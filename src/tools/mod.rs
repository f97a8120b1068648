//! # Tools
//!
//! Helpers built on top of [`crate::core::photon::Photon`]: each one drives an
//! external program through the shared command runner.
//!
//! - **`git`**: keeps a local checkout in sync with its remote.

pub mod git;
