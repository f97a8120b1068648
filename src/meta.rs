// src/meta.rs

//! Package identity and the versioning rules releases follow.
//!
//! A version with a leading zero (`0.x.y`) is a pre-release, as is any version
//! with a semver pre-release suffix. Every released version has a source tag
//! named exactly like the version; not every tag is necessarily released.

use crate::constants::IDENT;

/// The crate version this binary was built from.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// `photon <version>`, used in auto-generated commit messages.
pub fn ident() -> String {
    format!("{} {}", IDENT, VERSION)
}

/// Whether `version` counts as a pre-release. Unparseable versions are treated
/// as pre-releases.
pub fn is_prerelease(version: &str) -> bool {
    match semver::Version::parse(version.trim_start_matches('v')) {
        Ok(v) => v.major == 0 || !v.pre.is_empty(),
        Err(e) => {
            log::debug!("Version '{}' is not valid semver: {}", version, e);
            true
        }
    }
}

/// The source-control tag a released `version` must carry.
pub fn release_tag(version: &str) -> String {
    version.trim_start_matches('v').to_string()
}
