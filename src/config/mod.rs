pub mod applicator;
pub mod loader;
pub mod schema;

pub use applicator::{apply_edits, check_edits, line_edit, resolve_path};
pub use loader::{load_from_path, load_from_str, ConfigError, LoadedEditSet};
pub use schema::{
    EditDefinition, EditSet, Metadata, Operation, ValidationError, ValidationIssue,
};
