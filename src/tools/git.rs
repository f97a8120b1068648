// src/tools/git.rs

//! Keeps a local git checkout in sync with its remote.
//!
//! Local changes are never lost: before fetching, a dirty working tree is
//! committed onto a branch named after the host.

use crate::{
    constants::{DEFAULT_BRANCH, GIT_LOG_LENGTH},
    core::{
        locations::{self, LocationError, SearchOptions},
        photon::Photon,
    },
    meta,
    models::{CleanupReport, GitLogEntry, GitStatus, ShellResult},
    system::{
        executor::{RunOptions, ShellError},
        host,
        notify::Teardown,
    },
};
use serde_json::json;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// What can go wrong while working with a checkout.
#[derive(Error, Debug)]
pub enum GitError {
    #[error("{0}")]
    Shell(#[from] ShellError),
    #[error("{0}")]
    Location(#[from] LocationError),
    #[error("{0}")]
    Teardown(#[from] Teardown),
}

/// A local checkout, driven through [`Photon::run`].
#[derive(Debug)]
pub struct Git<'p> {
    photon: &'p Photon,
    local: PathBuf,
    remote_url: Option<String>,
}

impl<'p> Git<'p> {
    /// Opens `local`, searched in the default locations first. A missing
    /// folder is created.
    pub fn open(photon: &'p Photon, local: &str, remote_url: Option<&str>) -> Result<Self, GitError> {
        let defaults = locations::default_locations()?;
        let local = match locations::search_location(local, &defaults, &SearchOptions::default())? {
            Some(found) => found,
            None => locations::expand_path(local)?,
        };
        Self::open_in(photon, &local, remote_url)
    }

    /// Opens the checkout at `local`. If it is not the top of a work tree yet,
    /// `remote_url` is cloned into it; without a remote url this is fatal.
    pub fn open_in(
        photon: &'p Photon,
        local: &Path,
        remote_url: Option<&str>,
    ) -> Result<Self, GitError> {
        locations::make_locations(&[local.to_path_buf()], photon.is_verbose())?;
        let git = Self {
            photon,
            local: dunce::canonicalize(local).unwrap_or_else(|_| local.to_path_buf()),
            remote_url: remote_url.map(str::to_string),
        };

        if !git.is_work_tree()? {
            let Some(url) = git.remote_url.as_deref() else {
                let teardown = photon
                    .notice(t!("git.error.no_remote"))
                    .more(&json!({ "local": git.local }))
                    .abort();
                return Err(teardown.into());
            };
            let local = git.local.to_string_lossy().into_owned();
            photon.run(
                t!("git.info.cloning"),
                ["git", "clone", url, local.as_str()],
                RunOptions::default(),
            )?;
        }

        photon
            .notice(t!("git.info.ready"))
            .more(&json!({ "remote_url": git.remote_url, "local": git.local }))
            .verbose(false)
            .emit()?;
        Ok(git)
    }

    /// The checkout folder.
    pub fn local(&self) -> &Path {
        &self.local
    }

    /// The url cloned from, if one was given.
    pub fn remote_url(&self) -> Option<&str> {
        self.remote_url.as_deref()
    }

    /// Name of the first configured remote.
    pub fn remote(&self) -> Result<Option<String>, GitError> {
        let result = self.query(t!("git.info.remote"), &["remote"])?;
        Ok(result.stdout.into_iter().next())
    }

    /// Full hash of the current commit.
    pub fn commit(&self) -> Result<String, GitError> {
        Ok(self.query(t!("git.info.log"), &["log", "-n", "1", "--format=%H"])?.out)
    }

    /// The last few commits, newest first.
    pub fn log(&self) -> Result<Vec<GitLogEntry>, GitError> {
        let count = GIT_LOG_LENGTH.to_string();
        let result = self.query(
            t!("git.info.log"),
            &["log", "-n", count.as_str(), "--format=%h::%s"],
        )?;
        Ok(parse_log(&result.stdout))
    }

    /// The working tree state.
    pub fn status(&self) -> Result<GitStatus, GitError> {
        let result = self.query(t!("git.info.status"), &["status", "--porcelain"])?;
        Ok(parse_status(&result.stdout))
    }

    /// The checked out branch.
    pub fn branch(&self) -> Result<Option<String>, GitError> {
        let result = self.query(t!("git.info.branch"), &["branch"])?;
        Ok(parse_branch(&result.stdout))
    }

    /// Checks out `branch` (default `master`) and returns the branch now checked out.
    ///
    /// A branch that exists locally or on a remote is checked out as is;
    /// anything else is created from the current commit.
    pub fn set_branch(&self, branch: Option<&str>) -> Result<Option<String>, GitError> {
        let branch = branch.unwrap_or(DEFAULT_BRANCH);
        let local = self.query(t!("git.info.branch"), &["branch", "--list", branch])?;
        let remote = self.query(t!("git.info.branch"), &["branch", "-r"])?;
        let known = !local.stdout.is_empty()
            || remote
                .stdout
                .iter()
                .any(|line| remote_branch_name(line) == Some(branch));

        let args: &[&str] = if known {
            &["checkout", branch]
        } else {
            &["checkout", "-B", branch]
        };
        self.act(t!("git.info.checkout"), args)?;
        self.branch()
    }

    /// Commits local changes onto a branch named after this host, returns to
    /// the previous branch, then fetches from the remote and merges if the
    /// fetch brought anything in.
    pub fn cleanup(&self) -> Result<CleanupReport, GitError> {
        let hostname = host::hostname()?;
        let ident = meta::ident();
        let changes = self.status()?;

        if !changes.clean {
            if !changes.conflicting.is_empty() {
                let teardown = self
                    .photon
                    .notice(t!("git.error.conflicting_files"))
                    .more(&changes)
                    .abort();
                return Err(teardown.into());
            }

            let old_branch = self.branch()?;
            let _restore = scopeguard::guard(old_branch, |old_branch| {
                if let Some(branch) = old_branch
                    && let Err(e) = self.set_branch(Some(branch.as_str()))
                {
                    log::warn!("Could not return to branch '{}': {}", branch, e);
                }
            });

            // The host branch is always reset to the current commit, so the
            // dirty tree carries over even if the branch exists from last time.
            self.act(t!("git.info.checkout"), &["checkout", "-B", hostname.as_str()])?;
            for file in changes.untracked.iter().chain(&changes.modified) {
                self.act(t!("git.info.adding"), &["add", "--", file.as_str()])?;
            }
            for file in &changes.deleted {
                self.act(t!("git.info.removing"), &["rm", "--", file.as_str()])?;
            }
            let message = format!("{} {} auto commit", hostname, ident);
            self.act(t!("git.info.committing"), &["commit", "-m", message.as_str()])?;
        }

        let fetch = self.act(t!("git.info.fetching"), &["fetch", "--tags"])?;
        if fetch.out.contains("CONFLICT") {
            let teardown = self
                .photon
                .notice(t!("git.error.merge_conflict"))
                .more(&fetch)
                .abort();
            return Err(teardown.into());
        }
        if !fetch.stdout.is_empty() {
            let message = format!("{} {} auto merge", hostname, ident);
            self.act(
                t!("git.info.merging"),
                &["merge", DEFAULT_BRANCH, "-m", message.as_str()],
            )?;
        }

        Ok(CleanupReport { changes, fetch })
    }

    /// Cleans up, then pushes the current branch to the remote.
    pub fn publish(&self) -> Result<ShellResult, GitError> {
        self.cleanup()?;
        let remote = self.remote()?.unwrap_or_else(|| "origin".to_string());
        let branch = self
            .branch()?
            .unwrap_or_else(|| DEFAULT_BRANCH.to_string());
        let message = format!(t!("git.info.pushing"), remote = remote, branch = branch);
        Ok(self.act(&message, &["push", "-u", remote.as_str(), branch.as_str()])?)
    }

    /// All tags.
    pub fn tags(&self) -> Result<Vec<String>, GitError> {
        Ok(self.query(t!("git.info.tags"), &["tag", "--list"])?.stdout)
    }

    /// Whether `version` has its release tag.
    pub fn has_release_tag(&self, version: &str) -> Result<bool, GitError> {
        let tag = meta::release_tag(version);
        Ok(self.tags()?.iter().any(|t| *t == tag))
    }

    /// Whether `local` is the top level of a work tree.
    fn is_work_tree(&self) -> Result<bool, GitError> {
        let result = self.photon.run(
            t!("git.info.probe"),
            ["git", "rev-parse", "--show-toplevel"],
            RunOptions::probe().cwd(&self.local),
        )?;
        if !result.success() {
            return Ok(false);
        }
        let toplevel = dunce::canonicalize(&result.out).unwrap_or_else(|_| PathBuf::from(&result.out));
        Ok(toplevel == self.local)
    }

    /// A quiet, critical git call.
    fn query(&self, message: &str, args: &[&str]) -> Result<ShellResult, GitError> {
        self.git(message, args, false)
    }

    /// An announced, critical git call.
    fn act(&self, message: &str, args: &[&str]) -> Result<ShellResult, GitError> {
        self.git(message, args, true)
    }

    fn git(&self, message: &str, args: &[&str], verbose: bool) -> Result<ShellResult, GitError> {
        let mut argv = vec!["git".to_string()];
        argv.extend(args.iter().map(|arg| (*arg).to_string()));
        let options = RunOptions::default().cwd(&self.local).verbose(verbose);
        Ok(self.photon.run(message, argv, options)?)
    }
}

/// Sorts `git status --porcelain` lines into buckets.
pub fn parse_status<S: AsRef<str>>(lines: &[S]) -> GitStatus {
    let mut status = GitStatus::default();
    for line in lines {
        let line = line.as_ref();
        let (Some(code), Some(file)) = (line.get(..2), line.get(3..)) else {
            continue;
        };
        let file = file.to_string();
        if code.contains('?') {
            status.untracked.push(file.clone());
        }
        if code.contains('M') {
            status.modified.push(file.clone());
        }
        if code.contains('D') {
            status.deleted.push(file.clone());
        }
        if code.contains('U') {
            status.conflicting.push(file);
        }
    }
    status.clean = status.untracked.is_empty()
        && status.modified.is_empty()
        && status.deleted.is_empty()
        && status.conflicting.is_empty();
    status
}

/// Parses `<hash>::<subject>` lines.
pub fn parse_log<S: AsRef<str>>(lines: &[S]) -> Vec<GitLogEntry> {
    lines
        .iter()
        .filter_map(|line| line.as_ref().split_once("::"))
        .map(|(commit, message)| GitLogEntry {
            commit: commit.to_string(),
            message: message.to_string(),
        })
        .collect()
}

/// The branch marked with `*` in `git branch` output.
pub fn parse_branch<S: AsRef<str>>(lines: &[S]) -> Option<String> {
    lines
        .iter()
        .map(AsRef::as_ref)
        .find(|line| line.starts_with('*'))
        .map(|line| line.trim_start_matches('*').trim().to_string())
}

/// `origin/feature` -> `feature`; symbolic `origin/HEAD -> ...` lines are skipped.
fn remote_branch_name(line: &str) -> Option<&str> {
    let line = line.trim();
    if line.contains("->") {
        return None;
    }
    line.split_once('/').map(|(_, branch)| branch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_buckets() {
        let status = parse_status(&[
            "?? new.txt",
            " M changed.rs",
            "MM both.rs",
            " D gone.md",
            "UU fight.toml",
        ]);
        assert_eq!(status.untracked, vec!["new.txt"]);
        assert_eq!(status.modified, vec!["changed.rs", "both.rs"]);
        assert_eq!(status.deleted, vec!["gone.md"]);
        assert_eq!(status.conflicting, vec!["fight.toml"]);
        assert!(!status.clean);
    }

    #[test]
    fn empty_status_is_clean() {
        let status = parse_status::<&str>(&[]);
        assert!(status.clean);
    }

    #[test]
    fn log_lines() {
        let log = parse_log(&["abc123::first line", "def456::with :: inside", "garbage"]);
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].commit, "abc123");
        assert_eq!(log[1].message, "with :: inside");
    }

    #[test]
    fn current_branch() {
        assert_eq!(
            parse_branch(&["  feature", "* master", "  gateway"]),
            Some("master".to_string())
        );
        assert_eq!(parse_branch(&["  feature"]), None);
    }

    #[test]
    fn remote_branch_names() {
        assert_eq!(remote_branch_name("  origin/master"), Some("master"));
        assert_eq!(remote_branch_name("  origin/HEAD -> origin/master"), None);
        assert_eq!(remote_branch_name("  upstream/team/x"), Some("team/x"));
    }
}
