use super::{to_owned_lines, Limit, Mutation};
use crate::anchor::resolve;
use crate::matcher::{MatchMode, MatchSpec};

/// Replace lines matching `search` with `replacement`, top to bottom.
///
/// Scanning resumes just past each replaced line, so a replacement that
/// itself matches `search` is never picked up again.
pub fn replace<S: AsRef<str>>(
    lines: &[S],
    search: &str,
    replacement: &str,
    limit: Limit,
    mode: MatchMode,
) -> Mutation {
    let spec = MatchSpec::new(search, mode);
    let mut result = to_owned_lines(lines);
    let mut touched = 0;
    let mut changed = false;
    let mut next = 0;

    while limit.allows(touched) {
        let Some(index) = resolve(&result, &spec, next) else {
            break;
        };
        if result[index] != replacement {
            result[index] = replacement.to_string();
            changed = true;
        }
        touched += 1;
        next = index + 1;
    }

    Mutation {
        lines: result,
        touched,
        changed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines() -> Vec<&'static str> {
        vec![
            "Hello world",
            "Replace me",
            "Replace me",
            "Next last line",
            "Last line",
        ]
    }

    #[test]
    fn test_replace_first_only() {
        let result = replace(&lines(), "Replace", "Replaced", Limit::AtMost(1), MatchMode::PREFIX);
        assert_eq!(
            result.lines,
            vec!["Hello world", "Replaced", "Replace me", "Next last line", "Last line"]
        );
        assert_eq!(result.touched, 1);
        assert!(result.changed);
    }

    #[test]
    fn test_replace_all() {
        let result = replace(&lines(), "Replace", "Replaced", Limit::All, MatchMode::PREFIX);
        assert_eq!(result.lines[1], "Replaced");
        assert_eq!(result.lines[2], "Replaced");
        assert_eq!(result.touched, 2);
    }

    #[test]
    fn test_count_above_matches_replaces_all_matches() {
        let result = replace(&lines(), "Replace", "Replaced", Limit::AtMost(10), MatchMode::PREFIX);
        assert_eq!(result.touched, 2);
    }

    #[test]
    fn test_zero_count_is_noop() {
        let result = replace(&lines(), "Replace", "Replaced", Limit::AtMost(0), MatchMode::PREFIX);
        assert_eq!(result.lines, lines());
        assert!(!result.changed);
    }

    #[test]
    fn test_missing_target_is_noop() {
        let result = replace(&lines(), "Does not exist", "x", Limit::All, MatchMode::PREFIX);
        assert_eq!(result.lines, lines());
        assert_eq!(result.touched, 0);
        assert!(!result.changed);
    }

    #[test]
    fn test_replace_last_line() {
        let result = replace(&lines(), "Last line", "Yep, replaced", Limit::All, MatchMode::PREFIX);
        assert_eq!(result.lines[4], "Yep, replaced");
        assert_eq!(result.lines[3], "Next last line");
    }

    #[test]
    fn test_replacement_is_not_rematched() {
        let lines = ["key", "key", "other"];
        let result = replace(&lines, "key", "key = extended", Limit::All, MatchMode::PREFIX);
        assert_eq!(result.lines, vec!["key = extended", "key = extended", "other"]);
        assert_eq!(result.touched, 2);
    }

    #[test]
    fn test_identical_replacement_counts_but_does_not_change() {
        let lines = ["same"];
        let result = replace(&lines, "same", "same", Limit::All, MatchMode::VERBATIM);
        assert_eq!(result.touched, 1);
        assert!(!result.changed);
    }

    #[test]
    fn test_whitespace_policy() {
        let lines = ["  indented = 1"];
        let trimmed = replace(&lines, "indented", "x", Limit::All, MatchMode::PREFIX);
        assert_eq!(trimmed.lines, vec!["x"]);

        let verbatim = replace(&lines, "indented", "x", Limit::All, MatchMode::new(false, true));
        assert!(!verbatim.changed);
    }
}
