//! Epytext docstring rendering (`@param x:` / `@return:` fields).

use super::{DocContent, DocFormatter, FieldMarkers, RenderOptions, render_field_style};
use crate::types::DocStyle;

pub struct EpytextFormatter;

const MARKERS: FieldMarkers = FieldMarkers {
    prefix: '@',
    ret: "return",
    raise_kw: "raise",
};

impl DocFormatter for EpytextFormatter {
    fn style(&self) -> DocStyle {
        DocStyle::Epytext
    }

    fn render(&self, content: &DocContent, opts: &RenderOptions) -> String {
        render_field_style(content, opts, &MARKERS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_at_fields() {
        let raw = "Ping a host.\n\nArgs:\n    host (str): Target host.\n\nReturns:\n    float: Round trip time.";
        let rendered = EpytextFormatter.format(raw, &RenderOptions::default());
        assert_eq!(
            rendered,
            "Ping a host.\n\n@param host: Target host.\n@type host: str\n@return: Round trip time.\n@rtype: float"
        );
    }
}
