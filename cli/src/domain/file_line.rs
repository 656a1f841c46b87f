//! Single-line edits of key/value config files.

use regex::Regex;

/// Ensure `line` is present in `content`.
///
/// Returns `None` when the exact line already exists. Otherwise every line
/// matching `matcher` is replaced by `line`, or `line` is appended when
/// nothing matches.
#[must_use]
pub fn ensure_line(content: &str, matcher: &Regex, line: &str) -> Option<String> {
    if content.lines().any(|l| l == line) {
        return None;
    }

    let mut replaced = false;
    let mut out: Vec<&str> = content
        .lines()
        .map(|l| {
            if matcher.is_match(l) {
                replaced = true;
                line
            } else {
                l
            }
        })
        .collect();
    if !replaced {
        out.push(line);
    }

    let mut joined = out.join("\n");
    joined.push('\n');
    Some(joined)
}
