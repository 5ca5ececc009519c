//! Sphinx-style docstring rendering (`:param x:` / `:return:` fields).

use super::{DocContent, DocFormatter, FieldMarkers, RenderOptions, render_field_style};
use crate::types::DocStyle;

pub struct SphinxFormatter;

const MARKERS: FieldMarkers = FieldMarkers {
    prefix: ':',
    ret: "return",
    raise_kw: "raises",
};

impl DocFormatter for SphinxFormatter {
    fn style(&self) -> DocStyle {
        DocStyle::Sphinx
    }

    fn render(&self, content: &DocContent, opts: &RenderOptions) -> String {
        render_field_style(content, opts, &MARKERS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_field_lines() {
        let raw = "Look up a user.\n\nArgs:\n    user_id (int): Identifier to search for.\n\nReturns:\n    User: The matching user.\n\nRaises:\n    KeyError: When no user exists.";
        let rendered = SphinxFormatter.format(raw, &RenderOptions::default());
        assert_eq!(
            rendered,
            "Look up a user.\n\n:param user_id: Identifier to search for.\n:type user_id: int\n:return: The matching user.\n:rtype: User\n:raises KeyError: When no user exists."
        );
    }
}
