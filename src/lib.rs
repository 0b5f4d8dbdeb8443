//! Lineset: declarative, idempotent line editing for text files
//!
//! Keeps plain-text configuration files in a desired state one line at a
//! time: make sure a line is present (optionally next to other lines),
//! replace matching lines, or remove them.
//!
//! # Architecture
//!
//! - [`matcher`] decides whether a line matches a target (prefix or exact,
//!   trimmed or verbatim). Every operation uses the same predicate.
//! - [`anchor`] finds lines and insertion points.
//! - [`engine`] holds the three operations as pure functions from one line
//!   sequence to another.
//! - [`edit`] binds an operation to a file: read, mutate, then write back
//!   atomically or, in dry-run mode, emit a [`diff`] preview instead.
//! - [`config`] loads TOML edit sets and applies them in order.
//!
//! # Example
//!
//! ```no_run
//! use lineset::{Anchors, Context, LineEdit, LineOperation, MatchMode};
//!
//! let edit = LineEdit::new(
//!     "/etc/ssh/sshd_config",
//!     LineOperation::ensure("PermitRootLogin no", Anchors::after("# Authentication")),
//! )
//! .with_mode(MatchMode::PREFIX);
//!
//! match edit.apply(&Context::from_process()) {
//!     Ok(result) => println!("{result}"),
//!     Err(e) => eprintln!("Edit failed: {e}"),
//! }
//! ```

pub mod anchor;
pub mod config;
pub mod context;
pub mod diff;
pub mod edit;
pub mod engine;
pub mod matcher;

// Re-exports
pub use anchor::{resolve, Anchors};
pub use config::{
    apply_edits, check_edits, load_from_path, load_from_str, ConfigError, EditSet,
    LoadedEditSet, ValidationError,
};
pub use context::{dry_run, exit_on_error, set_dry_run, set_exit_on_error, Context};
pub use diff::{unified_diff, Preview};
pub use edit::{
    ensure_line_in_file, read_lines, remove_line_from_file, replace_line_in_file, EditError,
    EditResult, LineEdit, MAX_LINE_BYTES,
};
pub use engine::{ensure, remove, replace, InvalidCount, Limit, LineOperation, Mutation, Neighbors};
pub use matcher::{matches, MatchMode, MatchSpec};
