//! Edit-set applicator - runs each edit definition against its file
//!
//! Edits run one at a time in declaration order. Each edit re-reads its
//! file, so later edits see the result of earlier ones on the same file.

use crate::config::schema::{EditDefinition, EditSet};
use crate::context::Context;
use crate::edit::{EditError, EditResult, LineEdit, DEFAULT_FILE_MODE};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Apply an edit set.
///
/// # Arguments
///
/// * `config` - The edit set to apply
/// * `base_dir` - Directory that relative paths resolve against (see
///   [`LoadedEditSet::base_dir`](crate::config::LoadedEditSet::base_dir))
/// * `ctx` - Run mode; a dry-run context previews every edit instead of writing
///
/// # Returns
///
/// One result per edit, in declaration order.
pub fn apply_edits(
    config: &EditSet,
    base_dir: &Path,
    ctx: &Context,
) -> Vec<(String, Result<EditResult, EditError>)> {
    config
        .edits
        .iter()
        .map(|def| {
            let edit = line_edit(def, base_dir);
            debug!(id = %def.id, file = %edit.file.display(), "applying edit");
            (def.id.clone(), edit.apply(ctx))
        })
        .collect()
}

/// Check which edits are still pending without touching any file.
///
/// Results are [`EditResult::Previewed`]; `changed()` tells whether the edit
/// would modify its file. Nothing is written to the diagnostic stream and
/// errors are always returned.
pub fn check_edits(
    config: &EditSet,
    base_dir: &Path,
) -> Vec<(String, Result<EditResult, EditError>)> {
    let ctx = Context::new().with_dry_run(true).quiet();
    apply_edits(config, base_dir, &ctx)
}

/// Build the file-level edit for one definition.
pub fn line_edit(def: &EditDefinition, base_dir: &Path) -> LineEdit {
    LineEdit::new(resolve_path(def, base_dir), def.operation.to_line_operation())
        .with_mode(def.matching)
        .with_create_mode(def.mode.unwrap_or(DEFAULT_FILE_MODE))
}

/// Resolve an edit's target path. A leading `~` expands to the home
/// directory; other relative paths are joined onto `base_dir`.
pub fn resolve_path(def: &EditDefinition, base_dir: &Path) -> PathBuf {
    let path = expand_home(&def.file);
    if path.is_relative() {
        base_dir.join(path)
    } else {
        path
    }
}

fn expand_home(file: &str) -> PathBuf {
    let rest = if file == "~" {
        Some("")
    } else {
        file.strip_prefix("~/")
    };

    match (rest, home::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(file),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_from_str;
    use std::fs;

    const EDIT_SET: &str = r##"
[meta]
name = "test"
relative_to_config = true

[[edits]]
id = "add-option"
file = "app.conf"
[edits.operation]
type = "ensure"
line = "Option = true"
before = "# End"

[[edits]]
id = "drop-legacy"
file = "app.conf"
[edits.operation]
type = "remove"
search = "Legacy"
"##;

    #[test]
    fn test_expand_home() {
        if let Some(home) = home::home_dir() {
            assert_eq!(expand_home("~/x.conf"), home.join("x.conf"));
            assert_eq!(expand_home("~"), home);
        }
        assert_eq!(expand_home("~other/x"), PathBuf::from("~other/x"));
        assert_eq!(expand_home("/etc/x"), PathBuf::from("/etc/x"));
    }

    #[test]
    fn test_resolve_against_base_dir() {
        let config = load_from_str(EDIT_SET).unwrap();
        let path = resolve_path(&config.edits[0], Path::new("/srv/cfg"));
        assert_eq!(path, PathBuf::from("/srv/cfg/app.conf"));

        let path = resolve_path(&config.edits[0], Path::new(""));
        assert_eq!(path, PathBuf::from("app.conf"));
    }

    #[test]
    fn test_apply_in_order_on_same_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("app.conf");
        fs::write(&file, "# Start\nLegacy = 1\n# End\n").unwrap();

        let config = load_from_str(EDIT_SET).unwrap();
        let results = apply_edits(&config, dir.path(), &Context::new());

        let ids: Vec<&str> = results.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["add-option", "drop-legacy"]);
        assert!(results.iter().all(|(_, r)| r.as_ref().unwrap().changed()));
        assert_eq!(
            fs::read_to_string(&file).unwrap(),
            "# Start\nOption = true\n# End\n"
        );

        let again = apply_edits(&config, dir.path(), &Context::new());
        assert!(again
            .iter()
            .all(|(_, r)| matches!(r, Ok(EditResult::AlreadyApplied { .. }))));
    }

    #[test]
    fn test_check_reports_pending_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("app.conf");
        fs::write(&file, "# End\n").unwrap();

        let config = load_from_str(EDIT_SET).unwrap();
        let results = check_edits(&config, dir.path());

        assert!(results[0].1.as_ref().unwrap().changed());
        assert!(!results[1].1.as_ref().unwrap().changed());
        assert_eq!(fs::read_to_string(&file).unwrap(), "# End\n");
    }

    #[test]
    fn test_missing_file_errors_only_for_remove() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_from_str(EDIT_SET).unwrap();
        let results = check_edits(&config, dir.path());

        assert!(results[0].1.is_ok());
        assert!(matches!(results[1].1, Err(EditError::Read { .. })));
    }
}
