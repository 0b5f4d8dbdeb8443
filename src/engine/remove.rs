use super::{Limit, Mutation};
use crate::matcher::{MatchMode, MatchSpec};
use serde::Deserialize;

/// Neighbour conditions for removal.
///
/// Unlike ensure anchors these are plain substring tests against the raw
/// neighbouring lines, independent of the [`MatchMode`] in effect.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Neighbors {
    /// The preceding line must contain this text.
    #[serde(default)]
    pub before: Option<String>,
    /// The following line must contain this text.
    #[serde(default)]
    pub after: Option<String>,
}

impl Neighbors {
    pub fn new(before: Option<String>, after: Option<String>) -> Self {
        Self { before, after }
    }

    /// Check the neighbours of `lines[index]` in the original sequence.
    fn accept<S: AsRef<str>>(&self, lines: &[S], index: usize) -> bool {
        let before_ok = match &self.before {
            None => true,
            Some(needle) => index
                .checked_sub(1)
                .and_then(|prev| lines.get(prev))
                .is_some_and(|line| line.as_ref().contains(needle.as_str())),
        };
        let after_ok = match &self.after {
            None => true,
            Some(needle) => lines
                .get(index + 1)
                .is_some_and(|line| line.as_ref().contains(needle.as_str())),
        };
        before_ok && after_ok
    }
}

/// Remove lines matching `search` whose neighbours satisfy `neighbors`.
///
/// Neighbours are always read from the input sequence, so removing one line
/// does not change what its successor sees as "before". Once `limit` is
/// spent the remaining lines are kept as they are.
pub fn remove<S: AsRef<str>>(
    lines: &[S],
    search: &str,
    limit: Limit,
    neighbors: &Neighbors,
    mode: MatchMode,
) -> Mutation {
    let spec = MatchSpec::new(search, mode);
    let mut result = Vec::with_capacity(lines.len());
    let mut touched = 0;

    for (index, line) in lines.iter().enumerate() {
        let line = line.as_ref();
        if limit.allows(touched) && spec.matches(line) && neighbors.accept(lines, index) {
            touched += 1;
            continue;
        }
        result.push(line.to_string());
    }

    Mutation {
        lines: result,
        touched,
        changed: touched > 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn neighbors(before: Option<&str>, after: Option<&str>) -> Neighbors {
        Neighbors::new(before.map(String::from), after.map(String::from))
    }

    #[test]
    fn test_remove_single_line() {
        let lines = ["line1", "line2", "line3"];
        let result = remove(&lines, "line2", Limit::AtMost(1), &Neighbors::default(), MatchMode::VERBATIM);
        assert_eq!(result.lines, vec!["line1", "line3"]);
        assert_eq!(result.touched, 1);
    }

    #[test]
    fn test_remove_all_occurrences() {
        let lines = ["line1", "line2", "line2", "line3", "line2"];
        let result = remove(&lines, "line2", Limit::All, &Neighbors::default(), MatchMode::VERBATIM);
        assert_eq!(result.lines, vec!["line1", "line3"]);
        assert_eq!(result.touched, 3);
    }

    #[test]
    fn test_remove_respects_limit() {
        let lines = ["x", "x", "x"];
        let result = remove(&lines, "x", Limit::AtMost(2), &Neighbors::default(), MatchMode::VERBATIM);
        assert_eq!(result.lines, vec!["x"]);
    }

    #[test]
    fn test_remove_with_both_neighbours() {
        let lines = ["line1", "before", "line2", "after", "line3"];
        let result = remove(
            &lines,
            "line2",
            Limit::AtMost(1),
            &neighbors(Some("before"), Some("after")),
            MatchMode::VERBATIM,
        );
        assert_eq!(result.lines, vec!["line1", "before", "after", "line3"]);
    }

    #[test]
    fn test_failed_neighbour_keeps_match() {
        let lines = ["line1", "line2", "after"];
        let result = remove(
            &lines,
            "line2",
            Limit::All,
            &neighbors(Some("before"), Some("after")),
            MatchMode::VERBATIM,
        );
        assert_eq!(result.lines, lines);
        assert!(!result.changed);
    }

    #[test]
    fn test_neighbours_use_substring_not_match_mode() {
        // "# before here" only contains "before"; a prefix test would reject it.
        let lines = ["# before here", "target", "x after x"];
        let result = remove(
            &lines,
            "target",
            Limit::All,
            &neighbors(Some("before"), Some("after")),
            MatchMode::VERBATIM,
        );
        assert_eq!(result.lines, vec!["# before here", "x after x"]);
    }

    #[test]
    fn test_first_and_last_lines_have_no_neighbours() {
        let lines = ["target", "middle", "target"];
        let before = remove(&lines, "target", Limit::All, &neighbors(Some(""), None), MatchMode::VERBATIM);
        assert_eq!(before.lines, vec!["target", "middle"]);

        let after = remove(&lines, "target", Limit::All, &neighbors(None, Some("")), MatchMode::VERBATIM);
        assert_eq!(after.lines, vec!["middle", "target"]);
    }

    #[test]
    fn test_neighbours_read_from_original_sequence() {
        let lines = ["a", "dup", "dup"];
        let result = remove(&lines, "dup", Limit::All, &neighbors(Some("dup"), None), MatchMode::VERBATIM);
        assert_eq!(result.lines, vec!["a", "dup"]);
    }

    #[test]
    fn test_prefix_trimmed_match() {
        let lines = ["  Option = 1", "Optional = 2", "Keep"];
        let result = remove(&lines, "Option", Limit::All, &Neighbors::default(), MatchMode::PREFIX);
        assert_eq!(result.lines, vec!["Keep"]);
    }

    #[test]
    fn test_no_match_is_noop() {
        let lines = ["a", "b"];
        let result = remove(&lines, "z", Limit::All, &Neighbors::default(), MatchMode::PREFIX);
        assert_eq!(result.lines, lines);
        assert!(!result.changed);
        assert_eq!(result.touched, 0);
    }
}
