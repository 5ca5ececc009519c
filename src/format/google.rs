//! Google-style docstring rendering.
//!
//! ```text
//! Summary line.
//!
//! Args:
//!     name (type): Description.
//!
//! Returns:
//!     type: Description.
//! ```

use super::{DocContent, DocFormatter, RenderOptions, entry_lines, head_lines, push_plain_section};
use crate::types::DocStyle;

pub struct GoogleFormatter;

impl DocFormatter for GoogleFormatter {
    fn style(&self) -> DocStyle {
        DocStyle::Google
    }

    fn render(&self, content: &DocContent, opts: &RenderOptions) -> String {
        let mut lines = head_lines(content, opts);

        if !content.args.is_empty() {
            lines.push(String::new());
            lines.push("Args:".to_string());
            for arg in &content.args {
                let lead = match &arg.ty {
                    Some(ty) => format!("    {} ({}): ", arg.name, ty),
                    None => format!("    {}: ", arg.name),
                };
                lines.extend(entry_lines(&lead, &arg.description, 8, opts));
            }
        }

        for (header, field) in [("Returns:", &content.returns), ("Yields:", &content.yields)] {
            if let Some(field) = field {
                lines.push(String::new());
                lines.push(header.to_string());
                let lead = match &field.ty {
                    Some(ty) => format!("    {}: ", ty),
                    None => "    ".to_string(),
                };
                lines.extend(entry_lines(&lead, &field.description, 8, opts));
            }
        }

        if !content.raises.is_empty() {
            lines.push(String::new());
            lines.push("Raises:".to_string());
            for raised in &content.raises {
                let lead = format!("    {}: ", raised.name);
                lines.extend(entry_lines(&lead, &raised.description, 8, opts));
            }
        }

        push_plain_section(&mut lines, "Examples:", &content.examples);
        push_plain_section(&mut lines, "Notes:", &content.notes);
        push_plain_section(&mut lines, "Warnings:", &content.cautions);

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_google_text_round_trips() {
        let raw = "Add two numbers.\n\nArgs:\n    a: First number.\n    b: Second number.\n\nReturns:\n    Sum of a and b.";
        let rendered = GoogleFormatter.format(raw, &RenderOptions::default());
        assert_eq!(rendered, raw);
    }

    #[test]
    fn typed_args_and_returns() {
        let mut content = DocContent::default();
        content.summary = "Scale a value.".into();
        content.args.push(super::super::FieldDoc {
            name: "value".into(),
            ty: Some("float".into()),
            description: "Input value.".into(),
        });
        content.returns = Some(super::super::FieldDoc {
            name: String::new(),
            ty: Some("float".into()),
            description: "Scaled value.".into(),
        });

        let rendered = GoogleFormatter.render(&content, &RenderOptions::default());
        assert_eq!(
            rendered,
            "Scale a value.\n\nArgs:\n    value (float): Input value.\n\nReturns:\n    float: Scaled value."
        );
    }

    #[test]
    fn examples_preserved_verbatim() {
        let raw = "Doc.\n\nExamples:\n    >>> add(1, 2)\n    3";
        let rendered = GoogleFormatter.format(raw, &RenderOptions::default());
        assert_eq!(rendered, raw);
    }
}
