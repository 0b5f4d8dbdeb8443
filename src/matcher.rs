//! Line matching shared by every operation.
//!
//! A [`MatchSpec`] pairs a target string with a [`MatchMode`]. The same
//! predicate decides which lines Ensure moves, Replace rewrites, and Remove
//! drops, so all three operations agree on what "the line" means.

use serde::Deserialize;

/// Comparison policy applied uniformly within one operation call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(default)]
pub struct MatchMode {
    /// Require equality instead of a prefix test.
    pub full_string: bool,
    /// Compare the candidate verbatim instead of trimming it first.
    pub surrounding_whitespace: bool,
}

impl MatchMode {
    /// Prefix match against the trimmed candidate.
    pub const PREFIX: Self = Self {
        full_string: false,
        surrounding_whitespace: false,
    };

    /// Exact match against the untrimmed candidate.
    pub const VERBATIM: Self = Self {
        full_string: true,
        surrounding_whitespace: true,
    };

    pub fn new(full_string: bool, surrounding_whitespace: bool) -> Self {
        Self {
            full_string,
            surrounding_whitespace,
        }
    }
}

/// A target string together with the policy used to compare lines against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchSpec<'a> {
    pub target: &'a str,
    pub mode: MatchMode,
}

impl<'a> MatchSpec<'a> {
    pub fn new(target: &'a str, mode: MatchMode) -> Self {
        Self { target, mode }
    }

    /// Check whether `candidate` satisfies this spec.
    ///
    /// Only the candidate is trimmed; the target is taken as already
    /// normalized by the caller.
    pub fn matches(&self, candidate: &str) -> bool {
        let candidate = if self.mode.surrounding_whitespace {
            candidate
        } else {
            candidate.trim()
        };

        if self.mode.full_string {
            candidate == self.target
        } else {
            candidate.starts_with(self.target)
        }
    }

    /// Whether the target matches a line consisting of exactly itself.
    ///
    /// False for a target with surrounding whitespace under trimmed
    /// matching. Such a line can never be found again once written.
    pub fn matches_itself(&self) -> bool {
        self.matches(self.target)
    }
}

/// Free-function form of [`MatchSpec::matches`].
pub fn matches(candidate: &str, spec: &MatchSpec<'_>) -> bool {
    spec.matches(candidate)
}
