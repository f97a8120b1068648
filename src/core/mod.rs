// src/core/mod.rs

pub mod locations;
pub mod photon;
pub mod settings;
