//! Plain reStructuredText docstring rendering.
//!
//! The `:returns:` variant of the field style; otherwise shaped like Sphinx.

use super::{DocContent, DocFormatter, FieldMarkers, RenderOptions, render_field_style};
use crate::types::DocStyle;

pub struct RestFormatter;

const MARKERS: FieldMarkers = FieldMarkers {
    prefix: ':',
    ret: "returns",
    raise_kw: "raises",
};

impl DocFormatter for RestFormatter {
    fn style(&self) -> DocStyle {
        DocStyle::Rest
    }

    fn render(&self, content: &DocContent, opts: &RenderOptions) -> String {
        render_field_style(content, opts, &MARKERS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uses_returns_keyword() {
        let raw = "Fetch data.\n\nReturns:\n    dict: Decoded payload.";
        let rendered = RestFormatter.format(raw, &RenderOptions::default());
        assert_eq!(
            rendered,
            "Fetch data.\n\n:returns: Decoded payload.\n:rtype: dict"
        );
    }
}
