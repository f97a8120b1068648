// src/core/settings.rs

//! Layered TOML settings.
//!
//! A required defaults file is overlaid by an optional config file. The merged
//! result is written back to the config file, so the config always shows every
//! setting in effect.

use crate::{
    core::locations::{self, LocationError, SearchOptions},
    models::{Formatter, Locations},
};
use serde::Serialize;
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;
use toml::{Table, Value};

/// What can go wrong while loading or printing settings.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Settings file '{0}' could not be located.")]
    NotFound(String),
    #[error("Could not read settings file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("Could not write settings file '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("Failed to parse '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to serialize settings to TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Failed to render settings as JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Location(#[from] LocationError),
}

/// Defaults merged with a config file.
#[derive(Debug, Clone)]
pub struct Settings {
    defaults_path: PathBuf,
    config_path: Option<PathBuf>,
    data: Table,
}

impl Settings {
    /// Loads settings, searching files in the default locations.
    pub fn load(defaults: &str, config: Option<&str>, verbose: bool) -> Result<Self, SettingsError> {
        let locations = locations::default_locations()?;
        Self::load_with(defaults, config, &locations, verbose)
    }

    /// Loads settings, searching files in `locations`.
    ///
    /// The defaults file must exist (missing is fatal). The config file is
    /// looked up as well and, when absent, placed into `conf_dir`.
    pub fn load_with(
        defaults: &str,
        config: Option<&str>,
        locations: &Locations,
        verbose: bool,
    ) -> Result<Self, SettingsError> {
        let defaults_path = locations::search_location(
            defaults,
            locations,
            &SearchOptions::critical().verbose(verbose),
        )?
        .ok_or_else(|| SettingsError::NotFound(defaults.to_string()))?;
        let mut data = read_table(&defaults_path)?;
        log::debug!("Loaded settings defaults from '{}'", defaults_path.display());

        let config_path = match config {
            Some(config) => locations::search_location(
                config,
                locations,
                &SearchOptions::create_in("conf_dir").verbose(verbose),
            )?,
            None => None,
        };

        if let Some(path) = &config_path
            && path.exists()
        {
            log::debug!("Merging settings config from '{}'", path.display());
            merge(&mut data, read_table(path)?);
        }

        let settings = Self {
            defaults_path,
            config_path,
            data,
        };
        settings.save()?;
        Ok(settings)
    }

    /// All settings in effect.
    pub fn get(&self) -> &Table {
        &self.data
    }

    /// Where the defaults were read from.
    pub fn defaults_path(&self) -> &Path {
        &self.defaults_path
    }

    /// Where the merged settings are written, if a config was given.
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Follows `path` through nested tables (and arrays, by index).
    /// An empty path yields the whole table.
    pub fn find<S: AsRef<str>>(&self, path: &[S]) -> Option<Value> {
        let mut current = Value::Table(self.data.clone());
        for key in path {
            let key = key.as_ref();
            current = match current {
                Value::Table(mut table) => table.remove(key)?,
                Value::Array(mut items) => {
                    let index: usize = key.parse().ok()?;
                    if index >= items.len() {
                        return None;
                    }
                    items.swap_remove(index)
                }
                _ => return None,
            };
        }
        Some(current)
    }

    /// Like [`Settings::find`], but a miss is `false`, which is what the
    /// settings tool prints for unknown keys.
    pub fn lookup<S: AsRef<str>>(&self, path: &[S]) -> Value {
        self.find(path).unwrap_or(Value::Boolean(false))
    }

    /// Sets a top-level or nested value, creating intermediate tables.
    pub fn set<S: AsRef<str>>(&mut self, path: &[S], value: Value) {
        let Some((last, parents)) = path.split_last() else {
            return;
        };
        let mut table = &mut self.data;
        for key in parents {
            let entry = table
                .entry(key.as_ref().to_string())
                .or_insert_with(|| Value::Table(Table::new()));
            if !entry.is_table() {
                *entry = Value::Table(Table::new());
            }
            let Value::Table(next) = entry else {
                return;
            };
            table = next;
        }
        table.insert(last.as_ref().to_string(), value);
    }

    /// Writes the merged settings to the config file, if there is one.
    pub fn save(&self) -> Result<(), SettingsError> {
        let Some(path) = &self.config_path else {
            return Ok(());
        };
        let content = toml::to_string_pretty(&self.data)?;
        fs::write(path, content).map_err(|source| SettingsError::Write {
            path: path.display().to_string(),
            source,
        })?;
        log::debug!("Settings written back to '{}'", path.display());
        Ok(())
    }
}

fn read_table(path: &Path) -> Result<Table, SettingsError> {
    let content = fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.display().to_string(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| SettingsError::Parse {
        path: path.display().to_string(),
        source,
    })
}

/// Deep-merges `overlay` into `base`: tables merge key by key, anything else
/// in `overlay` replaces what `base` had.
pub fn merge(base: &mut Table, overlay: Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(Value::Table(existing)), Value::Table(incoming)) => merge(existing, incoming),
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

// --- Formatters ---

/// Renders a value for the settings tool.
pub fn format_value(value: &Value, formatter: Formatter) -> Result<String, SettingsError> {
    let rendered = match formatter {
        Formatter::Plain => plain(value),
        Formatter::Pretty => match value {
            Value::String(s) => s.clone(),
            other => serde_json::to_string_pretty(&to_json(other))?,
        },
        Formatter::Json => {
            let mut buffer = Vec::new();
            let indent = serde_json::ser::PrettyFormatter::with_indent(b"    ");
            let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, indent);
            to_json(value).serialize(&mut serializer)?;
            String::from_utf8_lossy(&buffer).into_owned()
        }
        Formatter::Tabs => {
            let mut lines = Vec::new();
            tabs(value, 0, &mut lines);
            lines.join("\n")
        }
        Formatter::Toml => match value {
            Value::Table(table) => toml::to_string_pretty(table)?.trim_end().to_string(),
            other => plain(other),
        },
    };
    Ok(rendered)
}

fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn tabs(value: &Value, depth: usize, lines: &mut Vec<String>) {
    let indent = "\t".repeat(depth);
    match value {
        Value::Array(items) => items.iter().for_each(|item| tabs(item, depth, lines)),
        Value::Table(table) => {
            for (key, inner) in table {
                lines.push(format!("{}{}", indent, key));
                tabs(inner, depth + 1, lines);
            }
        }
        other => lines.push(format!("{}{}", indent, plain(other))),
    }
}

/// TOML to JSON, with datetimes as strings and keys sorted.
fn to_json(value: &Value) -> serde_json::Value {
    use serde_json::Value as Json;
    match value {
        Value::String(s) => Json::String(s.clone()),
        Value::Integer(i) => Json::from(*i),
        Value::Float(f) => serde_json::Number::from_f64(*f).map_or(Json::Null, Json::Number),
        Value::Boolean(b) => Json::Bool(*b),
        Value::Datetime(dt) => Json::String(dt.to_string()),
        Value::Array(items) => Json::Array(items.iter().map(to_json).collect()),
        Value::Table(table) => Json::Object(
            table
                .iter()
                .map(|(key, inner)| (key.clone(), to_json(inner)))
                .collect(),
        ),
    }
}
