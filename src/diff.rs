//! Unified diff previews of a line mutation.

use crate::edit::join_lines;
use colored::Colorize;
use similar::{Algorithm, TextDiff};
use std::path::Path;

const CONTEXT_LINES: usize = 3;

/// What a mutating call would have done, shown instead of writing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    /// The call and its arguments, one line.
    pub invocation: String,
    /// Unified diff of the change; empty when nothing would change.
    pub diff: String,
    /// Emit the diff section even when it is empty.
    pub show_empty_diff: bool,
}

impl Preview {
    pub fn is_empty(&self) -> bool {
        self.diff.is_empty()
    }

    /// Text written to the diagnostic stream for this preview.
    pub fn render(&self, color: bool) -> String {
        let mut out = format!("{}\n", self.invocation);
        if !self.diff.is_empty() {
            if color {
                out.push_str(&colorize(&self.diff));
            } else {
                out.push_str(&self.diff);
            }
        } else if self.show_empty_diff {
            out.push('\n');
        }
        out
    }
}

/// Render the change from `before` to `after` as a unified diff.
///
/// Paths are labelled `a/<path>` and `b/<path>`. Returns an empty string when
/// the two sequences are identical.
pub fn unified_diff<A, B>(path: &Path, before: &[A], after: &[B]) -> String
where
    A: AsRef<str>,
    B: AsRef<str>,
{
    let old = join_lines(before);
    let new = join_lines(after);

    let diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .diff_lines(&old, &new);

    let rendered = diff
        .unified_diff()
        .context_radius(CONTEXT_LINES)
        .header(&label("a", path), &label("b", path))
        .to_string();
    rendered
}

/// Colour a unified diff for terminal output.
pub fn colorize(diff: &str) -> String {
    let mut out = String::with_capacity(diff.len());
    for line in diff.lines() {
        let painted = if line.starts_with("---") || line.starts_with("+++") {
            line.bold().to_string()
        } else if line.starts_with("@@") {
            line.cyan().to_string()
        } else if line.starts_with('-') {
            line.red().to_string()
        } else if line.starts_with('+') {
            line.green().to_string()
        } else {
            line.to_string()
        };
        out.push_str(&painted);
        out.push('\n');
    }
    out
}

fn label(side: &str, path: &Path) -> String {
    let display = path.display().to_string();
    format!("{side}/{}", display.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_sequences_produce_no_diff() {
        let lines = ["a", "b"];
        assert!(unified_diff(Path::new("f.txt"), &lines, &lines).is_empty());
    }

    #[test]
    fn test_empty_sequences_produce_no_diff() {
        let empty: [&str; 0] = [];
        assert!(unified_diff(Path::new("f.txt"), &empty, &empty).is_empty());
    }

    #[test]
    fn test_diff_has_labels_and_changes() {
        let before = ["# Start", "# End"];
        let after = ["# Start", "# End", "ConfigOption = true"];
        let diff = unified_diff(Path::new("etc/app.conf"), &before, &after);
        assert!(diff.contains("--- a/etc/app.conf"));
        assert!(diff.contains("+++ b/etc/app.conf"));
        assert!(diff.contains("+ConfigOption = true"));
        assert!(!diff.contains("-# Start"));
    }

    #[test]
    fn test_absolute_path_labels() {
        let diff = unified_diff(Path::new("/etc/hosts"), &["x"], &["y"]);
        assert!(diff.contains("--- a/etc/hosts"));
        assert!(diff.contains("-x"));
        assert!(diff.contains("+y"));
    }

    #[test]
    fn test_preview_render_policy() {
        let mut preview = Preview {
            invocation: "remove(\"f\")".to_string(),
            diff: String::new(),
            show_empty_diff: false,
        };
        assert_eq!(preview.render(false), "remove(\"f\")\n");

        preview.show_empty_diff = true;
        assert_eq!(preview.render(false), "remove(\"f\")\n\n");

        preview.diff = "--- a/f\n+++ b/f\n".to_string();
        assert!(preview.render(false).ends_with("+++ b/f\n"));
        assert!(!preview.is_empty());
    }

    #[test]
    fn test_colorize_keeps_text() {
        colored::control::set_override(false);
        let diff = "--- a/x\n+++ b/x\n@@ -1 +1 @@\n-old\n+new\n";
        assert_eq!(colorize(diff), diff);
    }
}
