// src/core/locations.rs

//! Default folders and the file juggling helper scripts do with them.

use crate::{
    constants::IDENT,
    models::{Locations, Transfer},
    system::{
        host,
        notify::{Notice, Teardown},
    },
};
use lazy_static::lazy_static;
use serde_json::json;
use std::{
    env,
    ffi::OsString,
    fs, io,
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};
use thiserror::Error;
use walkdir::WalkDir;

lazy_static! {
    static ref DEFAULT_LOCATIONS: Mutex<Option<Locations>> = Mutex::new(None);
}

/// What can go wrong while working with locations.
#[derive(Error, Debug)]
pub enum LocationError {
    #[error("Could not find the home directory.")]
    HomeDirNotFound,
    #[error("Could not {action} '{path}': {source}")]
    Io {
        action: &'static str,
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("{0}")]
    Teardown(#[from] Teardown),
}

impl LocationError {
    fn io<'a>(action: &'static str, path: &'a Path) -> impl FnOnce(io::Error) -> Self + 'a {
        move |source| Self::Io {
            action,
            path: path.display().to_string(),
            source,
        }
    }
}

impl Locations {
    /// Builds the default folders from the real environment.
    pub fn discover() -> Result<Self, LocationError> {
        let home_dir = dirs::home_dir().ok_or(LocationError::HomeDirNotFound)?;
        let call_dir = env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .or_else(|| env::current_dir().ok())
            .unwrap_or_else(|| home_dir.clone());
        Ok(Self::from_parts(home_dir, call_dir, |key| env::var_os(key)))
    }

    /// Builds the default folders from explicit parts. `lookup` resolves
    /// environment variables; empty values count as unset.
    pub fn from_parts(
        home_dir: PathBuf,
        call_dir: PathBuf,
        lookup: impl Fn(&str) -> Option<OsString>,
    ) -> Self {
        let base = |var: &str, fallback: PathBuf| {
            lookup(var)
                .filter(|value| !value.is_empty())
                .map(PathBuf::from)
                .unwrap_or(fallback)
        };
        let conf_dir = base("XDG_CONFIG_HOME", home_dir.join(".config")).join(IDENT);
        let data_dir = base("XDG_DATA_HOME", home_dir.join(".local").join("share")).join(IDENT);

        Self {
            home_dir,
            call_dir,
            conf_dir,
            data_dir,
        }
    }
}

/// The default folders of this process.
///
/// Memoized: the first call discovers them, later calls return the cached set.
pub fn default_locations() -> Result<Locations, LocationError> {
    let mut cached = DEFAULT_LOCATIONS
        .lock()
        .unwrap_or_else(PoisonError::into_inner);

    if let Some(locations) = &*cached {
        return Ok(locations.clone());
    }

    let locations = Locations::discover()?;
    log::debug!("Default locations: {:?}", locations);
    *cached = Some(locations.clone());
    Ok(locations)
}

/// Expands a leading `~` and makes the path absolute. Anything else, `$` included, is taken literally.
pub fn expand_path(path: &str) -> Result<PathBuf, LocationError> {
    let expanded = PathBuf::from(shellexpand::tilde(path).into_owned());
    std::path::absolute(&expanded).map_err(LocationError::io("resolve", &expanded))
}

/// Creates every missing folder in `paths` and returns the ones created.
///
/// Folders are handled in reverse-sorted order. Creations are announced as a
/// warning when `verbose`.
pub fn make_locations(paths: &[PathBuf], verbose: bool) -> Result<Vec<PathBuf>, LocationError> {
    let mut ordered = paths.to_vec();
    ordered.sort();
    ordered.dedup();
    ordered.reverse();

    let mut created = Vec::new();
    for path in ordered {
        if !path.exists() {
            fs::create_dir_all(&path).map_err(LocationError::io("create folder", &path))?;
            created.push(path);
        }
    }

    if !created.is_empty() {
        Notice::new(t!("locations.info.path_created"))
            .warning()
            .more(&created)
            .verbose(verbose)
            .emit()?;
    }
    Ok(created)
}

/// How [`search_location`] behaves when nothing is found.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Tear down if the file was not found.
    pub critical: bool,
    /// Create this folder (a location key like `conf_dir`, or a path) and
    /// return the file's path inside it.
    pub create_in: Option<String>,
    /// Announce created folders.
    pub verbose: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            critical: false,
            create_in: None,
            verbose: true,
        }
    }
}

impl SearchOptions {
    /// Tear down when nothing is found.
    pub fn critical() -> Self {
        Self {
            critical: true,
            ..Self::default()
        }
    }

    /// Create `folder` (a location key or a path) when nothing is found.
    pub fn create_in(folder: impl Into<String>) -> Self {
        Self {
            create_in: Some(folder.into()),
            ..Self::default()
        }
    }

    /// Whether created folders are announced.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// Locates `loc`.
///
/// 1. `<location>/<loc>` for every location, in reverse-sorted order.
/// 2. `loc` itself, with `~` expanded and made absolute.
/// 3. Nothing found: tear down if `critical`; with `create_in`, create that
///    folder and return `<create_in>/<loc>`; otherwise `None`.
pub fn search_location(
    loc: &str,
    locations: &Locations,
    options: &SearchOptions,
) -> Result<Option<PathBuf>, LocationError> {
    let mut candidates = locations.paths();
    candidates.sort();
    candidates.reverse();

    for folder in candidates {
        let file = folder.join(loc);
        if file.exists() {
            log::trace!("Found '{}' at '{}'", loc, file.display());
            return Ok(Some(file));
        }
    }

    let direct = expand_path(loc)?;
    if direct.exists() {
        return Ok(Some(direct));
    }

    if options.critical {
        let teardown = Notice::new(t!("locations.error.not_found"))
            .more(&json!({ "file": loc, "locations": locations }))
            .abort();
        return Err(teardown.into());
    }

    if let Some(create_in) = &options.create_in {
        let folder = match locations.get(create_in) {
            Some(path) => path.to_path_buf(),
            None => expand_path(create_in)?,
        };
        make_locations(std::slice::from_ref(&folder), options.verbose)?;
        return Ok(Some(folder.join(loc)));
    }

    Ok(None)
}

/// Copies, moves or deletes `src`. Returns `false` if `src` does not exist.
pub fn change_location(
    src: &Path,
    transfer: &Transfer,
    verbose: bool,
) -> Result<bool, LocationError> {
    if !src.exists() {
        log::debug!("Nothing to do, '{}' does not exist", src.display());
        return Ok(false);
    }

    let (action, target) = match transfer {
        Transfer::Copy(target) => {
            copy_location(src, target)?;
            (t!("locations.action.copied"), Some(target))
        }
        Transfer::Move(target) => {
            copy_location(src, target)?;
            remove_location(src)?;
            (t!("locations.action.moved"), Some(target))
        }
        Transfer::Delete => {
            remove_location(src)?;
            (t!("locations.action.deleted"), None)
        }
    };

    Notice::new(format!(t!("locations.info.changed"), action = action))
        .more(&json!({ "src": src, "tgt": target }))
        .verbose(verbose)
        .emit()?;
    Ok(true)
}

/// Copies `src` next to itself (or into the absolute folder `into`) as
/// `<name>_backup_<timestamp>` and returns the backup's path.
pub fn backup_location(
    src: &Path,
    into: Option<&Path>,
    verbose: bool,
) -> Result<PathBuf, LocationError> {
    let src = dunce::canonicalize(src).map_err(LocationError::io("resolve", src))?;

    let folder = match into {
        Some(folder) if folder.is_absolute() => folder.to_path_buf(),
        _ => src
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(std::path::MAIN_SEPARATOR_STR)),
    };
    let name = src
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| IDENT.to_string());
    let target = folder.join(format!("{}_backup_{}", name, host::timestamp(false)));

    make_locations(std::slice::from_ref(&folder), verbose)?;
    change_location(&src, &Transfer::Copy(target.clone()), verbose)?;
    Ok(target)
}

fn copy_location(src: &Path, target: &Path) -> Result<(), LocationError> {
    if src.is_file() {
        let target = if target.is_dir() {
            match src.file_name() {
                Some(name) => target.join(name),
                None => target.to_path_buf(),
            }
        } else {
            target.to_path_buf()
        };
        return copy_file(src, &target);
    }

    fs::create_dir_all(target).map_err(LocationError::io("create folder", target))?;
    for entry in WalkDir::new(src).min_depth(1).follow_links(true) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(src).to_path_buf();
            LocationError::Io {
                action: "walk",
                path: path.display().to_string(),
                source: e.into(),
            }
        })?;
        let Ok(relative) = entry.path().strip_prefix(src) else {
            continue;
        };
        let destination = target.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&destination)
                .map_err(LocationError::io("create folder", &destination))?;
        } else {
            copy_file(entry.path(), &destination)?;
        }
    }
    Ok(())
}

fn copy_file(src: &Path, target: &Path) -> Result<(), LocationError> {
    if let Some(parent) = target.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(LocationError::io("create folder", parent))?;
    }
    fs::copy(src, target).map_err(LocationError::io("copy", src))?;
    Ok(())
}

fn remove_location(src: &Path) -> Result<(), LocationError> {
    let metadata = fs::symlink_metadata(src).map_err(LocationError::io("inspect", src))?;
    if metadata.is_dir() {
        fs::remove_dir_all(src).map_err(LocationError::io("remove", src))
    } else {
        fs::remove_file(src).map_err(LocationError::io("remove", src))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sandbox() -> (TempDir, Locations) {
        let root = tempfile::tempdir().unwrap();
        let home = root.path().join("home");
        let call = root.path().join("call");
        let locations = Locations::from_parts(home, call, |_| None);
        make_locations(&locations.paths(), false).unwrap();
        (root, locations)
    }

    #[test]
    fn xdg_variables_override_defaults() {
        let locations = Locations::from_parts(
            PathBuf::from("/home/node"),
            PathBuf::from("/usr/bin"),
            |key| match key {
                "XDG_CONFIG_HOME" => Some(OsString::from("/etc/xdg")),
                "XDG_DATA_HOME" => Some(OsString::new()),
                _ => None,
            },
        );
        assert_eq!(locations.conf_dir, PathBuf::from("/etc/xdg/photon"));
        assert_eq!(
            locations.data_dir,
            PathBuf::from("/home/node/.local/share/photon")
        );
        assert_eq!(locations.get("call_dir"), Some(Path::new("/usr/bin")));
        assert_eq!(locations.get("nope"), None);
    }

    #[test]
    fn default_locations_are_memoized() {
        let first = default_locations().unwrap();
        let second = default_locations().unwrap();
        assert_eq!(first, second);
        assert!(first.conf_dir.ends_with(IDENT));
    }

    #[test]
    fn make_locations_reports_only_new_folders() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("a").join("b");
        let sibling = root.path().join("c");

        let created = make_locations(&[nested.clone(), sibling.clone()], false).unwrap();
        assert_eq!(created, vec![sibling.clone(), nested.clone()]);
        assert!(nested.is_dir());

        let again = make_locations(&[nested, sibling], false).unwrap();
        assert!(again.is_empty());
    }

    #[test]
    fn search_prefers_reverse_sorted_locations() {
        let (_root, locations) = sandbox();
        fs::write(locations.home_dir.join("settings.toml"), "home").unwrap();
        fs::write(locations.conf_dir.join("settings.toml"), "conf").unwrap();

        // `home/.local/share/photon` > `home/.config/photon` > `home`
        let found = search_location("settings.toml", &locations, &SearchOptions::default())
            .unwrap()
            .unwrap();
        assert_eq!(found, locations.conf_dir.join("settings.toml"));
    }

    #[test]
    fn search_falls_back_to_the_path_itself() {
        let (root, locations) = sandbox();
        let loose = root.path().join("loose.txt");
        fs::write(&loose, "x").unwrap();

        let found = search_location(
            loose.to_str().unwrap(),
            &locations,
            &SearchOptions::default(),
        )
        .unwrap();
        assert_eq!(found, Some(loose));
    }

    #[test]
    fn search_without_match_is_none() {
        let (_root, locations) = sandbox();
        let found =
            search_location("photon-missing.toml", &locations, &SearchOptions::default()).unwrap();
        assert_eq!(found, None);
    }

    #[test]
    fn critical_search_tears_down() {
        let (_root, locations) = sandbox();
        let err = search_location("photon-missing.toml", &locations, &SearchOptions::critical())
            .unwrap_err();
        assert!(matches!(err, LocationError::Teardown(t) if t.exit_code == 23));
    }

    #[test]
    fn create_in_accepts_a_location_key() {
        let (_root, locations) = sandbox();
        fs::remove_dir_all(&locations.data_dir).unwrap();

        let found = search_location(
            "state.toml",
            &locations,
            &SearchOptions::create_in("data_dir").verbose(false),
        )
        .unwrap();
        assert_eq!(found, Some(locations.data_dir.join("state.toml")));
        assert!(locations.data_dir.is_dir());
    }

    #[test]
    fn create_in_accepts_a_path() {
        let (root, locations) = sandbox();
        let folder = root.path().join("repo");

        let found = search_location(
            "file",
            &locations,
            &SearchOptions::create_in(folder.to_str().unwrap()).verbose(false),
        )
        .unwrap();
        assert_eq!(found, Some(folder.join("file")));
        assert!(folder.is_dir());
    }

    #[test]
    fn dollar_signs_are_not_expanded() {
        let (_root, locations) = sandbox();
        let loc = "price$PHOTON_UNSET_VAR.toml";
        assert_eq!(
            search_location(loc, &locations, &SearchOptions::default()).unwrap(),
            None
        );
        assert!(expand_path(loc).unwrap().ends_with(loc));
    }

    #[test]
    fn tilde_is_the_home_folder() {
        let expanded = expand_path("~/photon.toml").unwrap();
        assert_eq!(expanded, dirs::home_dir().unwrap().join("photon.toml"));
    }

    #[test]
    fn copy_file_creates_target_folders() {
        let root = tempfile::tempdir().unwrap();
        let src = root.path().join("a.txt");
        fs::write(&src, "payload").unwrap();
        let target = root.path().join("deep").join("er").join("b.txt");

        assert!(change_location(&src, &Transfer::Copy(target.clone()), false).unwrap());
        assert_eq!(fs::read_to_string(&target).unwrap(), "payload");
        assert!(src.exists());
    }

    #[test]
    fn move_folder_recursively() {
        let root = tempfile::tempdir().unwrap();
        let src = root.path().join("src");
        fs::create_dir_all(src.join("inner")).unwrap();
        fs::write(src.join("top.txt"), "1").unwrap();
        fs::write(src.join("inner").join("low.txt"), "2").unwrap();
        let target = root.path().join("dst");

        assert!(change_location(&src, &Transfer::Move(target.clone()), false).unwrap());
        assert!(!src.exists());
        assert_eq!(fs::read_to_string(target.join("top.txt")).unwrap(), "1");
        assert_eq!(
            fs::read_to_string(target.join("inner").join("low.txt")).unwrap(),
            "2"
        );
    }

    #[test]
    fn delete_and_missing_source() {
        let root = tempfile::tempdir().unwrap();
        let src = root.path().join("gone.txt");
        fs::write(&src, "bye").unwrap();

        assert!(change_location(&src, &Transfer::Delete, false).unwrap());
        assert!(!src.exists());
        assert!(!change_location(&src, &Transfer::Delete, false).unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn moving_a_folder_symlink_removes_only_the_link() {
        let root = tempfile::tempdir().unwrap();
        let real = root.path().join("real");
        fs::create_dir_all(&real).unwrap();
        fs::write(real.join("keep.txt"), "still here").unwrap();
        let link = root.path().join("link");
        std::os::unix::fs::symlink(&real, &link).unwrap();
        let target = root.path().join("moved");

        assert!(change_location(&link, &Transfer::Move(target.clone()), false).unwrap());
        assert!(fs::symlink_metadata(&link).is_err());
        assert_eq!(fs::read_to_string(real.join("keep.txt")).unwrap(), "still here");
        assert_eq!(fs::read_to_string(target.join("keep.txt")).unwrap(), "still here");
    }

    #[cfg(unix)]
    #[test]
    fn deleting_a_folder_symlink_keeps_its_target() {
        let root = tempfile::tempdir().unwrap();
        let real = root.path().join("real");
        fs::create_dir_all(&real).unwrap();
        fs::write(real.join("keep.txt"), "x").unwrap();
        let link = root.path().join("link");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        assert!(change_location(&link, &Transfer::Delete, false).unwrap());
        assert!(fs::symlink_metadata(&link).is_err());
        assert!(real.join("keep.txt").is_file());
    }

    #[test]
    fn backup_lands_next_to_the_source() {
        let root = tempfile::tempdir().unwrap();
        let src = root.path().join("notes.txt");
        fs::write(&src, "keep me").unwrap();

        let backup = backup_location(&src, None, false).unwrap();
        let name = backup.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("notes.txt_backup_"));
        assert_eq!(
            backup.parent().unwrap(),
            dunce::canonicalize(root.path()).unwrap()
        );
        assert_eq!(fs::read_to_string(&backup).unwrap(), "keep me");
    }

    #[test]
    fn backup_into_absolute_folder() {
        let root = tempfile::tempdir().unwrap();
        let src = root.path().join("conf");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("a.toml"), "a = 1").unwrap();
        let vault = root.path().join("vault");

        let backup = backup_location(&src, Some(&vault), false).unwrap();
        assert!(backup.starts_with(&vault));
        assert_eq!(fs::read_to_string(backup.join("a.toml")).unwrap(), "a = 1");
    }
}
