use super::{to_owned_lines, Mutation};
use crate::anchor::{resolve, Anchors};
use crate::matcher::{MatchMode, MatchSpec};

/// Ensure `line` is present once, positioned by `anchors`.
///
/// An existing occurrence (first line matching `line` under `mode`) is taken
/// out before the insertion point is computed, so a line that sits in the
/// wrong place is moved rather than duplicated. Anchors are resolved against
/// the sequence with that occurrence removed.
pub fn ensure<S: AsRef<str>>(
    lines: &[S],
    line: &str,
    anchors: &Anchors,
    mode: MatchMode,
) -> Mutation {
    let mut result = to_owned_lines(lines);

    if let Some(existing) = resolve(&result, &MatchSpec::new(line, mode), 0) {
        result.remove(existing);
    }

    let index = anchors.insertion_index(&result, mode);
    result.insert(index, line.to_string());

    let changed = result.len() != lines.len()
        || result
            .iter()
            .zip(lines)
            .any(|(new, old)| new.as_str() != old.as_ref());

    Mutation {
        lines: result,
        touched: usize::from(changed),
        changed,
    }
}
