//! Unified Diff Rendering
//!
//! Preview output for dry runs: a standard unified diff between the original
//! and rewritten source of one file.

use similar::TextDiff;

/// Unified diff with `a/path` / `b/path` headers. Empty string when the
/// texts are identical.
pub fn unified_diff(old: &str, new: &str, path: &str) -> String {
    if old == new {
        return String::new();
    }
    TextDiff::from_lines(old, new)
        .unified_diff()
        .context_radius(3)
        .header(&format!("a/{}", path), &format!("b/{}", path))
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_texts_produce_empty_diff() {
        assert_eq!(unified_diff("same\n", "same\n", "x.py"), "");
    }

    #[test]
    fn diff_carries_headers_and_hunks() {
        let old = "def f():\n    return 1\n";
        let new = "def f():\n    \"\"\"Doc.\"\"\"\n    return 1\n";
        let diff = unified_diff(old, new, "pkg/mod.py");
        assert!(diff.starts_with("--- a/pkg/mod.py\n+++ b/pkg/mod.py\n"));
        assert!(diff.contains("+    \"\"\"Doc.\"\"\"\n"));
        assert!(!diff.contains("-def f():"));
    }
}
