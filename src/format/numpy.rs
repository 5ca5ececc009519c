//! NumPy-style docstring rendering.
//!
//! ```text
//! Summary line.
//!
//! Parameters
//! ----------
//! name : type
//!     Description.
//! ```

use super::{DocContent, DocFormatter, FieldDoc, RenderOptions, head_lines, wrap};
use crate::types::DocStyle;

pub struct NumpyFormatter;

impl NumpyFormatter {
    fn push_header(lines: &mut Vec<String>, name: &str) {
        lines.push(String::new());
        lines.push(name.to_string());
        lines.push("-".repeat(name.len()));
    }

    fn push_entry(lines: &mut Vec<String>, entry: &FieldDoc, opts: &RenderOptions) {
        match &entry.ty {
            Some(ty) => lines.push(format!("{} : {}", entry.name, ty)),
            None => lines.push(entry.name.clone()),
        }
        if !entry.description.is_empty() {
            for piece in wrap(&entry.description, opts.width(4).max(20)) {
                lines.push(format!("    {}", piece));
            }
        }
    }

    fn push_value(lines: &mut Vec<String>, field: &FieldDoc, opts: &RenderOptions) {
        match &field.ty {
            Some(ty) => {
                lines.push(ty.clone());
                if !field.description.is_empty() {
                    for piece in wrap(&field.description, opts.width(4).max(20)) {
                        lines.push(format!("    {}", piece));
                    }
                }
            }
            None => lines.extend(wrap(&field.description, opts.width(0).max(20))),
        }
    }
}

impl DocFormatter for NumpyFormatter {
    fn style(&self) -> DocStyle {
        DocStyle::Numpy
    }

    fn render(&self, content: &DocContent, opts: &RenderOptions) -> String {
        let mut lines = head_lines(content, opts);

        if !content.args.is_empty() {
            Self::push_header(&mut lines, "Parameters");
            for arg in &content.args {
                Self::push_entry(&mut lines, arg, opts);
            }
        }
        if let Some(ret) = &content.returns {
            Self::push_header(&mut lines, "Returns");
            Self::push_value(&mut lines, ret, opts);
        }
        if let Some(yields) = &content.yields {
            Self::push_header(&mut lines, "Yields");
            Self::push_value(&mut lines, yields, opts);
        }
        if !content.raises.is_empty() {
            Self::push_header(&mut lines, "Raises");
            for raised in &content.raises {
                Self::push_entry(&mut lines, raised, opts);
            }
        }
        if !content.examples.is_empty() {
            Self::push_header(&mut lines, "Examples");
            lines.extend(content.examples.iter().cloned());
        }
        if !content.notes.is_empty() {
            Self::push_header(&mut lines, "Notes");
            lines.extend(content.notes.iter().cloned());
        }
        if !content.cautions.is_empty() {
            Self::push_header(&mut lines, "Warnings");
            lines.extend(content.cautions.iter().cloned());
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_underlined_sections() {
        let raw = "Scale values.\n\nArgs:\n    values (list): Numbers to scale.\n    factor: Multiplier.\n\nReturns:\n    list: Scaled values.";
        let rendered = NumpyFormatter.format(raw, &RenderOptions::default());
        assert_eq!(
            rendered,
            "Scale values.\n\nParameters\n----------\nvalues : list\n    Numbers to scale.\nfactor\n    Multiplier.\n\nReturns\n-------\nlist\n    Scaled values."
        );
    }

    #[test]
    fn own_output_parses_back() {
        let raw = "Scale values.\n\nArgs:\n    values (list): Numbers to scale.\n\nRaises:\n    ValueError: On empty input.";
        let once = NumpyFormatter.format(raw, &RenderOptions::default());
        let content = DocContent::parse(&once);
        assert_eq!(content.args[0].name, "values");
        assert_eq!(content.args[0].ty.as_deref(), Some("list"));
        assert_eq!(content.raises[0].name, "ValueError");
        assert_eq!(content.raises[0].description, "On empty input.");
    }
}
