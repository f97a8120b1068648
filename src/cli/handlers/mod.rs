// src/cli/handlers/mod.rs

// One module per CLI command.

pub mod backup;
pub mod commons;
pub mod git;
pub mod hostname;
pub mod locations;
pub mod run;
pub mod settings;
pub mod timestamp;
pub mod version;
