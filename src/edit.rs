use crate::anchor::Anchors;
use crate::context::Context;
use crate::diff::{unified_diff, Preview};
use crate::engine::{Limit, LineOperation, Mutation, Neighbors};
use crate::matcher::MatchMode;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Longest line accepted when reading a file, in bytes.
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// Permission bits for files created by an ensure.
pub const DEFAULT_FILE_MODE: u32 = 0o644;

/// A line operation bound to a file.
///
/// Loading, mutating and writing back happen in [`LineEdit::apply`]; each call
/// reads the file fresh and keeps nothing afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "LineEdit does nothing until apply() is called"]
pub struct LineEdit {
    /// File to edit
    pub file: PathBuf,
    /// What to do to its lines
    pub operation: LineOperation,
    /// Matching policy for the operation's targets
    pub mode: MatchMode,
    /// Permission bits used if an ensure has to create the file
    pub create_mode: u32,
}

#[derive(Error, Debug)]
pub enum EditError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("line {line_number} of {} exceeds {limit} bytes", .path.display())]
    LineTooLong {
        path: PathBuf,
        line_number: usize,
        limit: usize,
    },
}

/// Result of applying a line edit.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "EditResult should be checked for applied/already-applied"]
pub enum EditResult {
    /// The file was rewritten
    Applied { file: PathBuf, touched: usize },
    /// Nothing to do; the file was left alone
    AlreadyApplied { file: PathBuf },
    /// Dry run: nothing written, this is what would have changed
    Previewed {
        file: PathBuf,
        changed: bool,
        preview: Preview,
    },
}

impl EditResult {
    pub fn file(&self) -> &Path {
        match self {
            EditResult::Applied { file, .. }
            | EditResult::AlreadyApplied { file }
            | EditResult::Previewed { file, .. } => file,
        }
    }

    /// Whether the file changed, or would have in a dry run.
    pub fn changed(&self) -> bool {
        match self {
            EditResult::Applied { .. } => true,
            EditResult::AlreadyApplied { .. } => false,
            EditResult::Previewed { changed, .. } => *changed,
        }
    }
}

impl fmt::Display for EditResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditResult::Applied { file, touched } => {
                write!(f, "Applied to {} ({} lines)", file.display(), touched)
            }
            EditResult::AlreadyApplied { file } => {
                write!(f, "Already applied to {}", file.display())
            }
            EditResult::Previewed { file, changed, .. } => {
                if *changed {
                    write!(f, "Would change {}", file.display())
                } else {
                    write!(f, "No change to {}", file.display())
                }
            }
        }
    }
}

impl LineEdit {
    /// Create an edit using prefix matching on trimmed lines.
    pub fn new(file: impl Into<PathBuf>, operation: LineOperation) -> Self {
        Self {
            file: file.into(),
            operation,
            mode: MatchMode::PREFIX,
            create_mode: DEFAULT_FILE_MODE,
        }
    }

    pub fn with_mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_create_mode(mut self, create_mode: u32) -> Self {
        self.create_mode = create_mode;
        self
    }

    /// Apply this edit under `ctx`.
    ///
    /// In dry-run mode the file is never created or written; the preview is
    /// emitted and returned instead. Errors go through the context's
    /// exit-on-error policy.
    pub fn apply(&self, ctx: &Context) -> Result<EditResult, EditError> {
        ctx.or_exit(self.run(ctx))
    }

    fn run(&self, ctx: &Context) -> Result<EditResult, EditError> {
        let (lines, existed) = self.load()?;

        let mutation = if self.already_present(&lines) {
            Mutation::unchanged(&lines)
        } else {
            self.operation.apply(&lines, self.mode)
        };

        debug!(
            file = %self.file.display(),
            operation = self.operation.kind(),
            touched = mutation.touched,
            changed = mutation.changed,
            "computed line mutation"
        );

        if ctx.dry_run {
            let preview = Preview {
                invocation: self.invocation(),
                diff: unified_diff(&self.file, &lines, &mutation.lines),
                show_empty_diff: matches!(self.operation, LineOperation::Ensure { .. }),
            };
            ctx.emit(&preview);
            return Ok(EditResult::Previewed {
                file: self.file.clone(),
                changed: mutation.changed,
                preview,
            });
        }

        if existed && !mutation.changed {
            return Ok(EditResult::AlreadyApplied {
                file: self.file.clone(),
            });
        }

        write_lines(&self.file, &mutation.lines, self.create_mode)?;
        info!(
            file = %self.file.display(),
            operation = self.operation.kind(),
            touched = mutation.touched,
            "rewrote file"
        );

        Ok(EditResult::Applied {
            file: self.file.clone(),
            touched: mutation.touched,
        })
    }

    /// Read the file's lines. A missing file is an empty sequence for an
    /// ensure and an error otherwise.
    fn load(&self) -> Result<(Vec<String>, bool), EditError> {
        match read_lines(&self.file) {
            Ok(lines) => Ok((lines, true)),
            Err(EditError::Read { source, .. })
                if source.kind() == io::ErrorKind::NotFound
                    && matches!(self.operation, LineOperation::Ensure { .. }) =>
            {
                Ok((Vec::new(), false))
            }
            Err(err) => Err(err),
        }
    }

    /// Unanchored ensure of a line that already exists verbatim needs no
    /// further work.
    fn already_present(&self, lines: &[String]) -> bool {
        match &self.operation {
            LineOperation::Ensure { line, anchors } => {
                anchors.is_empty() && lines.iter().any(|existing| existing == line)
            }
            _ => false,
        }
    }

    fn invocation(&self) -> String {
        let file = self.file.display().to_string();
        let MatchMode {
            full_string,
            surrounding_whitespace,
        } = self.mode;
        match &self.operation {
            LineOperation::Ensure { line, anchors } => format!(
                "ensure({file:?}, {line:?}, before={:?}, after={:?}, full_string={full_string}, surrounding_whitespace={surrounding_whitespace})",
                anchors.before, anchors.after
            ),
            LineOperation::Replace {
                search,
                replacement,
                limit,
            } => format!(
                "replace({file:?}, {search:?}, {replacement:?}, count={limit}, full_string={full_string}, surrounding_whitespace={surrounding_whitespace})"
            ),
            LineOperation::Remove {
                search,
                limit,
                neighbors,
            } => format!(
                "remove({file:?}, {search:?}, count={limit}, before={:?}, after={:?}, full_string={full_string}, surrounding_whitespace={surrounding_whitespace})",
                neighbors.before, neighbors.after
            ),
        }
    }
}

/// Ensure `line` is in `path`, using the process-wide run mode.
pub fn ensure_line_in_file(
    path: impl Into<PathBuf>,
    line: &str,
    anchors: Anchors,
    mode: MatchMode,
) -> Result<EditResult, EditError> {
    LineEdit::new(path, LineOperation::ensure(line, anchors))
        .with_mode(mode)
        .apply(&Context::from_process())
}

/// Replace up to `limit` lines in `path`, using the process-wide run mode.
pub fn replace_line_in_file(
    path: impl Into<PathBuf>,
    search: &str,
    replacement: &str,
    limit: Limit,
    mode: MatchMode,
) -> Result<EditResult, EditError> {
    LineEdit::new(path, LineOperation::replace(search, replacement, limit))
        .with_mode(mode)
        .apply(&Context::from_process())
}

/// Remove up to `limit` lines from `path`, using the process-wide run mode.
pub fn remove_line_from_file(
    path: impl Into<PathBuf>,
    search: &str,
    limit: Limit,
    neighbors: Neighbors,
    mode: MatchMode,
) -> Result<EditResult, EditError> {
    LineEdit::new(path, LineOperation::remove(search, limit, neighbors))
        .with_mode(mode)
        .apply(&Context::from_process())
}

/// Read `path` as a sequence of lines with terminators stripped.
pub fn read_lines(path: &Path) -> Result<Vec<String>, EditError> {
    let content = fs::read_to_string(path).map_err(|source| EditError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    split_lines(path, &content)
}

/// Split file content into lines.
///
/// `\n` and `\r\n` both terminate a line and a final unterminated line is
/// kept. Lines longer than [`MAX_LINE_BYTES`] are rejected.
pub fn split_lines(path: &Path, content: &str) -> Result<Vec<String>, EditError> {
    content
        .lines()
        .enumerate()
        .map(|(idx, line)| {
            if line.len() > MAX_LINE_BYTES {
                Err(EditError::LineTooLong {
                    path: path.to_path_buf(),
                    line_number: idx + 1,
                    limit: MAX_LINE_BYTES,
                })
            } else {
                Ok(line.to_string())
            }
        })
        .collect()
}

/// File content for `lines`, each terminated by `\n`.
pub fn join_lines<S: AsRef<str>>(lines: &[S]) -> String {
    let mut content = String::new();
    for line in lines {
        content.push_str(line.as_ref());
        content.push('\n');
    }
    content
}

fn write_lines(path: &Path, lines: &[String], create_mode: u32) -> Result<(), EditError> {
    // Write through symlinks instead of replacing them.
    let target = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    atomic_write(&target, join_lines(lines).as_bytes(), create_mode).map_err(|source| {
        EditError::Write {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Atomic file write: tempfile + fsync + rename.
///
/// An existing file keeps its owner, group and permissions; a new one gets
/// `create_mode`. Fails without touching the file if the owner cannot be
/// carried over.
fn atomic_write(path: &Path, content: &[u8], create_mode: u32) -> io::Result<()> {
    // Create tempfile in same directory to ensure same filesystem
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let existing = match fs::metadata(path) {
        Ok(meta) => Some(meta),
        Err(err) if err.kind() == io::ErrorKind::NotFound => None,
        Err(err) => return Err(err),
    };

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;

    match &existing {
        Some(meta) => {
            copy_owner(temp.as_file(), meta)?;
            temp.as_file().set_permissions(meta.permissions())?;
        }
        None => set_create_mode(temp.as_file(), create_mode)?,
    }

    temp.persist(path).map_err(|e| e.error)?;

    Ok(())
}

#[cfg(unix)]
fn set_create_mode(file: &fs::File, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_create_mode(_file: &fs::File, _mode: u32) -> io::Result<()> {
    Ok(())
}

#[cfg(unix)]
fn copy_owner(file: &fs::File, meta: &fs::Metadata) -> io::Result<()> {
    use std::os::unix::fs::{fchown, MetadataExt};
    let current = file.metadata()?;
    if current.uid() == meta.uid() && current.gid() == meta.gid() {
        return Ok(());
    }
    fchown(file, Some(meta.uid()), Some(meta.gid()))
}

#[cfg(not(unix))]
fn copy_owner(_file: &fs::File, _meta: &fs::Metadata) -> io::Result<()> {
    Ok(())
}
