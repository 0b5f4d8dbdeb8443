use crate::anchor::Anchors;
use crate::engine::{Limit, LineOperation, Neighbors};
use crate::matcher::{MatchMode, MatchSpec};
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Deserialize, Default, Clone)]
pub struct EditSet {
    #[serde(default)]
    pub meta: Metadata,
    #[serde(default)]
    pub edits: Vec<EditDefinition>,
}

impl EditSet {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.edits.is_empty() {
            issues.push(ValidationIssue::EmptyEditList);
        }

        let mut seen = HashSet::new();

        for edit in &self.edits {
            if edit.id.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    edit_id: None,
                    field: "id",
                });
            } else if !seen.insert(edit.id.as_str()) {
                issues.push(ValidationIssue::DuplicateId {
                    edit_id: edit.id.clone(),
                });
            }

            if edit.file.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    edit_id: Some(edit.id.clone()),
                    field: "file",
                });
            }

            match &edit.operation {
                Operation::Ensure { line, .. } => {
                    if line.trim().is_empty() {
                        issues.push(ValidationIssue::MissingField {
                            edit_id: Some(edit.id.clone()),
                            field: "operation.line",
                        });
                    } else if !MatchSpec::new(line, edit.matching).matches_itself() {
                        issues.push(ValidationIssue::InvalidValue {
                            edit_id: Some(edit.id.clone()),
                            message: format!(
                                "line {line:?} has surrounding whitespace that trimmed matching ignores; trim it or set matching.surrounding_whitespace"
                            ),
                        });
                    }
                }
                Operation::Replace { search, .. } | Operation::Remove { search, .. } => {
                    if search.trim().is_empty() {
                        issues.push(ValidationIssue::MissingField {
                            edit_id: Some(edit.id.clone()),
                            field: "operation.search",
                        });
                    }
                }
            }

            if let Some(mode) = edit.mode {
                if mode > 0o7777 {
                    issues.push(ValidationIssue::InvalidValue {
                        edit_id: Some(edit.id.clone()),
                        message: format!("mode {mode:#o} is not a permission value"),
                    });
                }
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Resolve relative `file` paths against the edit-set file's directory.
    #[serde(default)]
    pub relative_to_config: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EditDefinition {
    pub id: String,
    pub file: String,
    /// Permission bits for a file created by an ensure.
    #[serde(default)]
    pub mode: Option<u32>,
    pub operation: Operation,
    #[serde(default)]
    pub matching: MatchMode,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Operation {
    Ensure {
        line: String,
        #[serde(default)]
        before: Option<String>,
        #[serde(default)]
        after: Option<String>,
    },
    Replace {
        search: String,
        replacement: String,
        #[serde(default)]
        count: Limit,
    },
    /// `before`/`after` are substrings of the neighbouring lines.
    Remove {
        search: String,
        #[serde(default)]
        count: Limit,
        #[serde(default)]
        before: Option<String>,
        #[serde(default)]
        after: Option<String>,
    },
}

impl Operation {
    pub fn to_line_operation(&self) -> LineOperation {
        match self {
            Operation::Ensure {
                line,
                before,
                after,
            } => LineOperation::ensure(
                line.clone(),
                Anchors {
                    before: before.clone(),
                    after: after.clone(),
                },
            ),
            Operation::Replace {
                search,
                replacement,
                count,
            } => LineOperation::replace(search.clone(), replacement.clone(), *count),
            Operation::Remove {
                search,
                count,
                before,
                after,
            } => LineOperation::remove(
                search.clone(),
                *count,
                Neighbors::new(before.clone(), after.clone()),
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    EmptyEditList,
    MissingField {
        edit_id: Option<String>,
        field: &'static str,
    },
    DuplicateId {
        edit_id: String,
    },
    InvalidValue {
        edit_id: Option<String>,
        message: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyEditList => write!(f, "edit set contains no edits"),
            ValidationIssue::MissingField { edit_id, field } => match edit_id {
                Some(id) => write!(f, "edit '{id}' missing required field '{field}'"),
                None => write!(f, "edit missing required field '{field}'"),
            },
            ValidationIssue::DuplicateId { edit_id } => {
                write!(f, "edit id '{edit_id}' is used more than once")
            }
            ValidationIssue::InvalidValue { edit_id, message } => match edit_id {
                Some(id) => write!(f, "edit '{id}' has invalid configuration: {message}"),
                None => write!(f, "invalid edit configuration: {message}"),
            },
        }
    }
}
