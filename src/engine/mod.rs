//! Mutation engine: the three line operations.
//!
//! Every operation takes an immutable line sequence and returns a fresh
//! [`Mutation`]. Nothing here touches the filesystem; see [`crate::edit`]
//! for the persistence side.

mod ensure;
mod remove;
mod replace;

pub use ensure::ensure;
pub use remove::{remove, Neighbors};
pub use replace::replace;

use crate::anchor::Anchors;
use crate::matcher::MatchMode;
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// How many matching lines an operation may touch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "i64")]
pub enum Limit {
    /// Every match found in a single top-to-bottom pass (`-1`).
    #[default]
    All,
    /// At most this many matches, first to last.
    AtMost(usize),
}

impl Limit {
    /// Whether another line may be touched after `done` have been.
    pub fn allows(self, done: usize) -> bool {
        match self {
            Limit::All => true,
            Limit::AtMost(max) => done < max,
        }
    }

    /// The count as written on the command line or in edit-set files.
    pub fn as_count(self) -> i64 {
        match self {
            Limit::All => -1,
            Limit::AtMost(max) => i64::try_from(max).unwrap_or(i64::MAX),
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("invalid count {0}: expected -1 (all) or a non-negative number")]
pub struct InvalidCount(pub i64);

impl TryFrom<i64> for Limit {
    type Error = InvalidCount;

    fn try_from(count: i64) -> Result<Self, Self::Error> {
        match count {
            -1 => Ok(Limit::All),
            n => usize::try_from(n)
                .map(Limit::AtMost)
                .map_err(|_| InvalidCount(n)),
        }
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_count())
    }
}

/// Outcome of running an operation over a line sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "Mutation carries the new lines"]
pub struct Mutation {
    /// The resulting sequence.
    pub lines: Vec<String>,
    /// Lines inserted, replaced or removed.
    pub touched: usize,
    /// Whether `lines` differs from the input.
    pub changed: bool,
}

impl Mutation {
    /// A mutation that leaves `lines` as they were.
    pub fn unchanged<S: AsRef<str>>(lines: &[S]) -> Self {
        Self {
            lines: to_owned_lines(lines),
            touched: 0,
            changed: false,
        }
    }
}

/// A single line operation with its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOperation {
    /// Make `line` present exactly once, moved next to its anchors.
    Ensure { line: String, anchors: Anchors },
    /// Overwrite matching lines with `replacement`.
    Replace {
        search: String,
        replacement: String,
        limit: Limit,
    },
    /// Drop matching lines whose neighbours satisfy `neighbors`.
    Remove {
        search: String,
        limit: Limit,
        neighbors: Neighbors,
    },
}

impl LineOperation {
    pub fn ensure(line: impl Into<String>, anchors: Anchors) -> Self {
        LineOperation::Ensure {
            line: line.into(),
            anchors,
        }
    }

    pub fn replace(search: impl Into<String>, replacement: impl Into<String>, limit: Limit) -> Self {
        LineOperation::Replace {
            search: search.into(),
            replacement: replacement.into(),
            limit,
        }
    }

    pub fn remove(search: impl Into<String>, limit: Limit, neighbors: Neighbors) -> Self {
        LineOperation::Remove {
            search: search.into(),
            limit,
            neighbors,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            LineOperation::Ensure { .. } => "ensure",
            LineOperation::Replace { .. } => "replace",
            LineOperation::Remove { .. } => "remove",
        }
    }

    /// Run the operation against `lines`.
    pub fn apply<S: AsRef<str>>(&self, lines: &[S], mode: MatchMode) -> Mutation {
        match self {
            LineOperation::Ensure { line, anchors } => ensure(lines, line, anchors, mode),
            LineOperation::Replace {
                search,
                replacement,
                limit,
            } => replace(lines, search, replacement, *limit, mode),
            LineOperation::Remove {
                search,
                limit,
                neighbors,
            } => remove(lines, search, *limit, neighbors, mode),
        }
    }
}

pub(crate) fn to_owned_lines<S: AsRef<str>>(lines: &[S]) -> Vec<String> {
    lines.iter().map(|line| line.as_ref().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_from_count() {
        assert_eq!(Limit::try_from(-1), Ok(Limit::All));
        assert_eq!(Limit::try_from(0), Ok(Limit::AtMost(0)));
        assert_eq!(Limit::try_from(3), Ok(Limit::AtMost(3)));
        assert_eq!(Limit::try_from(-2), Err(InvalidCount(-2)));
    }

    #[test]
    fn test_limit_allows() {
        assert!(Limit::All.allows(usize::MAX - 1));
        assert!(Limit::AtMost(2).allows(1));
        assert!(!Limit::AtMost(2).allows(2));
        assert!(!Limit::AtMost(0).allows(0));
    }

    #[test]
    fn test_limit_display_round_trips_count() {
        assert_eq!(Limit::All.to_string(), "-1");
        assert_eq!(Limit::AtMost(4).to_string(), "4");
    }

    #[test]
    fn test_operation_dispatch() {
        let lines = ["a", "b"];
        let op = LineOperation::remove("a", Limit::All, Neighbors::default());
        let mutation = op.apply(&lines, MatchMode::VERBATIM);
        assert_eq!(mutation.lines, vec!["b"]);
        assert_eq!(op.kind(), "remove");
    }
}
