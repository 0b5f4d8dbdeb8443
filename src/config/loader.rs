//! Edit-set loading.
//!
//! An edit set is parsed from TOML, validated, and paired with the directory
//! its relative `file` paths resolve against.

use crate::config::applicator::{apply_edits, check_edits};
use crate::config::schema::{EditSet, ValidationError};
use crate::context::Context;
use crate::edit::{EditError, EditResult};
use crate::engine::Limit;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use toml_edit::DocumentMut;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read edit set {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed edit set{}: {source}", located(.path))]
    Parse {
        path: Option<PathBuf>,
        #[source]
        source: toml_edit::de::Error,
    },

    #[error("edit {edit}{} has count {count}: expected -1 (all) or a non-negative number", located(.path))]
    InvalidCount {
        path: Option<PathBuf>,
        /// Edit id, or `#<n>` for an edit without one
        edit: String,
        count: i64,
    },

    #[error("edit set{} failed validation:\n{source}", located(.path))]
    Validation {
        path: Option<PathBuf>,
        #[source]
        source: ValidationError,
    },
}

impl ConfigError {
    /// Attach the edit-set file to an error raised while loading its text.
    fn located_at(mut self, file: &Path) -> Self {
        match &mut self {
            ConfigError::Parse { path, .. }
            | ConfigError::InvalidCount { path, .. }
            | ConfigError::Validation { path, .. } => {
                path.get_or_insert_with(|| file.to_path_buf());
            }
            ConfigError::Read { .. } => {}
        }
        self
    }
}

fn located(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|path| format!(" ({})", path.display()))
        .unwrap_or_default()
}

/// An edit set read from disk.
#[derive(Debug, Clone)]
pub struct LoadedEditSet {
    /// File the set was read from
    pub source: PathBuf,
    /// Directory relative `file` paths resolve against: the set's own
    /// directory with `relative_to_config`, the working directory otherwise
    pub base_dir: PathBuf,
    pub edit_set: EditSet,
}

impl LoadedEditSet {
    /// Apply every edit in declaration order.
    pub fn apply(&self, ctx: &Context) -> Vec<(String, Result<EditResult, EditError>)> {
        apply_edits(&self.edit_set, &self.base_dir, ctx)
    }

    /// Report pending edits without writing anything.
    pub fn check(&self) -> Vec<(String, Result<EditResult, EditError>)> {
        check_edits(&self.edit_set, &self.base_dir)
    }
}

/// Parse and validate an edit set.
pub fn load_from_str(input: &str) -> Result<EditSet, ConfigError> {
    let edit_set: EditSet = toml_edit::de::from_str(input).map_err(|source| {
        invalid_count(input).unwrap_or(ConfigError::Parse { path: None, source })
    })?;
    edit_set
        .validate()
        .map_err(|source| ConfigError::Validation { path: None, source })?;
    Ok(edit_set)
}

/// Read, parse and validate the edit set at `path`.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<LoadedEditSet, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let edit_set = load_from_str(&contents).map_err(|err| err.located_at(path))?;

    let base_dir = if edit_set.meta.relative_to_config {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    } else {
        PathBuf::new()
    };

    Ok(LoadedEditSet {
        source: path.to_path_buf(),
        base_dir,
        edit_set,
    })
}

/// Find the first edit whose `count` is out of range.
///
/// The deserializer only reports the bad value; the raw document still knows
/// which edit it belongs to.
fn invalid_count(input: &str) -> Option<ConfigError> {
    let document = input.parse::<DocumentMut>().ok()?;
    let edits = document.get("edits")?.as_array_of_tables()?;

    let found = edits.iter().enumerate().find_map(|(index, edit)| {
        let count = edit.get("operation")?.get("count")?.as_integer()?;
        Limit::try_from(count).err()?;
        let edit = edit
            .get("id")
            .and_then(|id| id.as_str())
            .filter(|id| !id.is_empty())
            .map_or_else(|| format!("#{}", index + 1), String::from);
        Some(ConfigError::InvalidCount {
            path: None,
            edit,
            count,
        })
    });
    found
}
