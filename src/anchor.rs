//! Anchor resolution: locating lines and insertion points in a sequence.

use crate::matcher::{MatchMode, MatchSpec};
use serde::Deserialize;

/// Return the index of the first line at or after `start` that matches `spec`.
///
/// A `start` past the end of the sequence yields `None`.
pub fn resolve<S: AsRef<str>>(lines: &[S], spec: &MatchSpec<'_>, start: usize) -> Option<usize> {
    lines
        .iter()
        .enumerate()
        .skip(start)
        .find(|(_, line)| spec.matches(line.as_ref()))
        .map(|(idx, _)| idx)
}

/// Optional positioning for an ensured line.
///
/// Each anchor is matched with the same [`MatchMode`] as the line itself and
/// is always searched from the top of the sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Anchors {
    /// Insert immediately before the first line matching this target.
    #[serde(default)]
    pub before: Option<String>,
    /// Insert immediately after the first line matching this target.
    #[serde(default)]
    pub after: Option<String>,
}

impl Anchors {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn before(target: impl Into<String>) -> Self {
        Self {
            before: Some(target.into()),
            after: None,
        }
    }

    pub fn after(target: impl Into<String>) -> Self {
        Self {
            before: None,
            after: Some(target.into()),
        }
    }

    pub fn with_before(mut self, target: impl Into<String>) -> Self {
        self.before = Some(target.into());
        self
    }

    pub fn with_after(mut self, target: impl Into<String>) -> Self {
        self.after = Some(target.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.before.is_none() && self.after.is_none()
    }

    /// Compute where a line should be inserted into `lines`.
    ///
    /// Defaults to the end. A resolved `after` anchor gives the index past
    /// it; a resolved `before` anchor gives its own index and wins over
    /// `after`. Unresolved anchors are ignored.
    pub fn insertion_index<S: AsRef<str>>(&self, lines: &[S], mode: MatchMode) -> usize {
        let mut index = lines.len();

        if let Some(after) = &self.after {
            if let Some(found) = resolve(lines, &MatchSpec::new(after, mode), 0) {
                index = found + 1;
            }
        }

        if let Some(before) = &self.before {
            if let Some(found) = resolve(lines, &MatchSpec::new(before, mode), 0) {
                index = found;
            }
        }

        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<String> {
        ["# Start", "a = 1", "b = 2", "a = 3", "# End"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_resolve_first_match() {
        let lines = sample();
        let spec = MatchSpec::new("a", MatchMode::PREFIX);
        assert_eq!(resolve(&lines, &spec, 0), Some(1));
    }

    #[test]
    fn test_resolve_from_start_index() {
        let lines = sample();
        let spec = MatchSpec::new("a", MatchMode::PREFIX);
        assert_eq!(resolve(&lines, &spec, 2), Some(3));
        assert_eq!(resolve(&lines, &spec, 4), None);
        assert_eq!(resolve(&lines, &spec, 99), None);
    }

    #[test]
    fn test_insertion_defaults_to_end() {
        let lines = sample();
        assert_eq!(Anchors::none().insertion_index(&lines, MatchMode::PREFIX), 5);
    }

    #[test]
    fn test_insertion_after_anchor() {
        let lines = sample();
        let anchors = Anchors::after("b");
        assert_eq!(anchors.insertion_index(&lines, MatchMode::PREFIX), 3);
    }

    #[test]
    fn test_before_wins_over_after() {
        let lines = sample();
        let anchors = Anchors::before("# End").with_after("# Start");
        assert_eq!(anchors.insertion_index(&lines, MatchMode::PREFIX), 4);
    }

    #[test]
    fn test_unresolved_before_falls_back_to_after() {
        let lines = sample();
        let anchors = Anchors::before("missing").with_after("# Start");
        assert_eq!(anchors.insertion_index(&lines, MatchMode::PREFIX), 1);
    }

    #[test]
    fn test_unresolved_anchors_fall_back_to_end() {
        let lines = sample();
        let anchors = Anchors::before("nope").with_after("nope either");
        assert_eq!(anchors.insertion_index(&lines, MatchMode::PREFIX), 5);
    }

    #[test]
    fn test_anchor_respects_mode() {
        let lines = sample();
        let anchors = Anchors::before("a");
        assert_eq!(anchors.insertion_index(&lines, MatchMode::VERBATIM), 5);
        assert_eq!(anchors.insertion_index(&lines, MatchMode::PREFIX), 1);
    }
}
