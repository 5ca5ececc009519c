//! Insertion Engine
//!
//! Splices rendered docstrings into original source text. The core invariant:
//! every byte outside the modified documentation region is preserved exactly,
//! including trailing whitespace and blank-line structure elsewhere.
//!
//! Edits are planned against the original text's coordinates and applied in
//! a single pass in descending position order, so a later element's insertion
//! never invalidates an earlier element's stored positions.

pub mod diff;
pub mod writer;

pub use diff::unified_diff;
pub use writer::FileWriter;

use std::ops::Range;

use crate::constants::format::INDENT_UNIT;
use crate::types::{CodeElement, DocError, ElementKind, Result};

/// What to do when the element already has a docstring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertMode {
    /// Leave existing docstrings untouched and skip the element
    InsertMissing,
    /// Remove exactly the existing literal and insert the new text
    ReplaceExisting,
}

/// One planned source mutation: replace `range` bytes with `replacement`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub range: Range<usize>,
    pub replacement: String,
}

pub struct InsertionEngine;

impl InsertionEngine {
    /// Plan the edit that gives `element` the docstring `text`.
    ///
    /// Returns `Ok(None)` when the element already has a docstring and the
    /// mode is `InsertMissing`. Fails with `DocError::Insertion` when the
    /// recorded body positions do not line up with the source, in which case
    /// the file must be left untouched.
    pub fn plan(
        source: &str,
        element: &CodeElement,
        text: &str,
        mode: InsertMode,
    ) -> Result<Option<Edit>> {
        let body = &element.body;
        if body.start > source.len() || body.header_end > body.start {
            return Err(DocError::Insertion {
                element: element.qualified_name.clone(),
                reason: "Body position is outside the source text".to_string(),
            });
        }

        if let Some((doc_start, doc_end)) = body.doc_range {
            if mode == InsertMode::InsertMissing {
                return Ok(None);
            }
            if doc_end > source.len() || doc_start < body.start {
                return Err(DocError::Insertion {
                    element: element.qualified_name.clone(),
                    reason: "Existing docstring range is corrupted".to_string(),
                });
            }
            let indent = if body.inline {
                nested_indent(element)
            } else {
                body.indent.clone()
            };
            return Ok(Some(Edit {
                range: doc_start..doc_end,
                replacement: render_literal(text, &indent),
            }));
        }

        if body.inline {
            // Expand the body onto its own line to host the docstring
            let indent = nested_indent(element);
            let literal = render_literal(text, &indent);
            return Ok(Some(Edit {
                range: body.header_end..body.start,
                replacement: format!("\n{}{}\n{}", indent, literal, indent),
            }));
        }

        let indent = &body.indent;
        let literal = render_literal(text, indent);
        Ok(Some(Edit {
            range: body.start..body.start,
            replacement: format!("{}\n{}", literal, indent),
        }))
    }

    /// Apply edits in one serialized pass, last position first
    pub fn apply(source: &str, mut edits: Vec<Edit>) -> Result<String> {
        edits.sort_by(|a, b| b.range.start.cmp(&a.range.start));
        for pair in edits.windows(2) {
            // Sorted descending: pair[1] precedes pair[0] in the source
            if pair[1].range.end > pair[0].range.start {
                return Err(DocError::Insertion {
                    element: String::new(),
                    reason: "Overlapping edits for one file".to_string(),
                });
            }
        }

        let mut out = source.to_string();
        for edit in edits {
            if edit.range.end > out.len() {
                return Err(DocError::Insertion {
                    element: String::new(),
                    reason: "Edit range exceeds source length".to_string(),
                });
            }
            out.replace_range(edit.range.clone(), &edit.replacement);
        }
        Ok(out)
    }

    /// Convenience wrapper: plan and apply a single element's docstring
    pub fn insert(
        source: &str,
        element: &CodeElement,
        text: &str,
        mode: InsertMode,
    ) -> Result<String> {
        match Self::plan(source, element, text, mode)? {
            Some(edit) => Self::apply(source, vec![edit]),
            None => Ok(source.to_string()),
        }
    }
}

/// Docstring body indentation for an element whose body must be created:
/// the definition's own indentation plus one standard unit.
fn nested_indent(element: &CodeElement) -> String {
    let own = if element.kind == ElementKind::Module {
        String::new()
    } else {
        " ".repeat(element.span.start_col as usize)
    };
    format!("{}{}", own, INDENT_UNIT)
}

/// Render docstring text as a triple-quoted literal. Multi-line content puts
/// the closing quotes on their own line; continuation lines carry `indent`
/// and blank lines stay truly empty.
fn render_literal(text: &str, indent: &str) -> String {
    let safe = text.replace("\"\"\"", "\\\"\\\"\\\"");
    let mut lines = safe.lines();
    let first = lines.next().unwrap_or_default();

    let rest: Vec<&str> = lines.collect();
    if rest.is_empty() {
        return format!("\"\"\"{}\"\"\"", first);
    }

    let mut out = format!("\"\"\"{}", first);
    for line in rest {
        out.push('\n');
        if !line.is_empty() {
            out.push_str(indent);
            out.push_str(line);
        }
    }
    out.push('\n');
    out.push_str(indent);
    out.push_str("\"\"\"");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::PythonParser;
    use crate::types::{ElementId, ParseResult};

    fn parse(source: &str) -> ParseResult {
        PythonParser::new().unwrap().parse("demo.py", source).unwrap()
    }

    #[test]
    fn inserts_single_line_docstring() {
        let source = "def f():\n    return 1\n";
        let parsed = parse(source);
        let new = InsertionEngine::insert(
            source,
            parsed.get(ElementId(1)),
            "Do the thing.",
            InsertMode::InsertMissing,
        )
        .unwrap();
        assert_eq!(new, "def f():\n    \"\"\"Do the thing.\"\"\"\n    return 1\n");
    }

    #[test]
    fn multi_line_docstring_closes_on_own_line() {
        let source = "def f():\n    return 1\n";
        let parsed = parse(source);
        let new = InsertionEngine::insert(
            source,
            parsed.get(ElementId(1)),
            "Summary.\n\nDetail line.",
            InsertMode::InsertMissing,
        )
        .unwrap();
        assert_eq!(
            new,
            "def f():\n    \"\"\"Summary.\n\n    Detail line.\n    \"\"\"\n    return 1\n"
        );
    }

    #[test]
    fn inline_body_expands_onto_own_line() {
        let source = "def add(a, b): return a + b\n";
        let parsed = parse(source);
        let new = InsertionEngine::insert(
            source,
            parsed.get(ElementId(1)),
            "Add two numbers.",
            InsertMode::InsertMissing,
        )
        .unwrap();
        assert_eq!(
            new,
            "def add(a, b):\n    \"\"\"Add two numbers.\"\"\"\n    return a + b\n"
        );
    }

    #[test]
    fn existing_docstring_skipped_in_insert_missing() {
        let source = "def f():\n    \"\"\"Old.\"\"\"\n    return 1\n";
        let parsed = parse(source);
        let edit = InsertionEngine::plan(
            source,
            parsed.get(ElementId(1)),
            "New.",
            InsertMode::InsertMissing,
        )
        .unwrap();
        assert!(edit.is_none());
    }

    #[test]
    fn replace_removes_exactly_the_old_literal() {
        let source = "def f():\n    \"\"\"Old.\"\"\"\n    return 1  # trailing comment\n";
        let parsed = parse(source);
        let new = InsertionEngine::insert(
            source,
            parsed.get(ElementId(1)),
            "New summary.",
            InsertMode::ReplaceExisting,
        )
        .unwrap();
        assert_eq!(
            new,
            "def f():\n    \"\"\"New summary.\"\"\"\n    return 1  # trailing comment\n"
        );
    }

    #[test]
    fn method_indentation_is_two_levels() {
        let source = "class C:\n    def m(self):\n        return 1\n";
        let parsed = parse(source);
        let method = parsed.get(parsed.find_by_qualified_name("demo.C.m").unwrap());
        let new =
            InsertionEngine::insert(source, method, "Doc.\nMore.", InsertMode::InsertMissing)
                .unwrap();
        assert_eq!(
            new,
            "class C:\n    def m(self):\n        \"\"\"Doc.\n        More.\n        \"\"\"\n        return 1\n"
        );
    }

    #[test]
    fn multiline_signature_insertion() {
        let source = "def f(\n    a,\n    b,\n):\n    return a\n";
        let parsed = parse(source);
        let new = InsertionEngine::insert(
            source,
            parsed.get(ElementId(1)),
            "Doc.",
            InsertMode::InsertMissing,
        )
        .unwrap();
        assert_eq!(new, "def f(\n    a,\n    b,\n):\n    \"\"\"Doc.\"\"\"\n    return a\n");
    }

    #[test]
    fn batch_edits_apply_in_descending_order() {
        let source = "def a():\n    return 1\n\ndef b():\n    return 2\n";
        let parsed = parse(source);
        let mut edits = Vec::new();
        for id in parsed.documentable_ids() {
            let element = parsed.get(id);
            let text = format!("Doc for {}.", element.name);
            if let Some(edit) =
                InsertionEngine::plan(source, element, &text, InsertMode::InsertMissing).unwrap()
            {
                edits.push(edit);
            }
        }
        // Deliberately pass them in ascending order; apply must still work
        let new = InsertionEngine::apply(source, edits).unwrap();
        assert_eq!(
            new,
            "def a():\n    \"\"\"Doc for a.\"\"\"\n    return 1\n\ndef b():\n    \"\"\"Doc for b.\"\"\"\n    return 2\n"
        );
    }

    #[test]
    fn bytes_outside_region_preserved() {
        let source = "# header comment\t\ndef f():\n    return 1\n\n\n# trailing   \n";
        let parsed = parse(source);
        let new = InsertionEngine::insert(
            source,
            parsed.get(ElementId(1)),
            "Doc.",
            InsertMode::InsertMissing,
        )
        .unwrap();
        assert!(new.starts_with("# header comment\t\n"));
        assert!(new.ends_with("\n\n\n# trailing   \n"));
    }

    #[test]
    fn corrupted_layout_is_an_insertion_error() {
        let source = "def f():\n    return 1\n";
        let parsed = parse(source);
        let mut element = parsed.get(ElementId(1)).clone();
        element.body.start = source.len() + 10;
        let err = InsertionEngine::plan(source, &element, "Doc.", InsertMode::InsertMissing);
        assert!(matches!(err, Err(DocError::Insertion { .. })));
    }

    #[test]
    fn triple_quotes_in_text_are_escaped() {
        let source = "def f():\n    return 1\n";
        let parsed = parse(source);
        let new = InsertionEngine::insert(
            source,
            parsed.get(ElementId(1)),
            "Has \"\"\" inside.",
            InsertMode::InsertMissing,
        )
        .unwrap();
        assert!(new.contains("\\\"\\\"\\\""));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            #[test]
            fn insertion_preserves_surrounding_bytes(
                name in "f_[a-z0-9_]{0,10}",
                header in "# [ -~]{0,24}",
                trailer in "# [ -~]{0,24}",
            ) {
                let source = format!("{}\ndef {}():\n    return 1\n{}\n", header, name, trailer);
                let parsed = parse(&source);
                let new = InsertionEngine::insert(
                    &source,
                    parsed.get(ElementId(1)),
                    "Doc.",
                    InsertMode::InsertMissing,
                )
                .unwrap();
                let prefix = format!("{}\n", header);
                let suffix = format!("{}\n", trailer);
                prop_assert!(new.starts_with(&prefix));
                prop_assert!(new.ends_with(&suffix));
                prop_assert!(new.contains("\"\"\"Doc.\"\"\""));
            }
        }
    }
}
