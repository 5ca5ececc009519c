//! Docstring Formatters
//!
//! Interchangeable rendering styles behind one trait. Rendering is pure text
//! shaping: parse raw provider text into `DocContent`, render it in the
//! requested style. Rendering already-rendered text of the same style is a
//! no-op up to whitespace.

pub mod epytext;
pub mod google;
pub mod numpy;
pub mod rest;
pub mod sections;
pub mod sphinx;

pub use epytext::EpytextFormatter;
pub use google::GoogleFormatter;
pub use numpy::NumpyFormatter;
pub use rest::RestFormatter;
pub use sections::{DocContent, FieldDoc, wrap};
pub use sphinx::SphinxFormatter;

use crate::constants::format::DEFAULT_MAX_LINE_LENGTH;
use crate::types::DocStyle;

/// Rendering options derived from settings and the insertion site
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub max_line_length: usize,
    /// Columns the docstring body will be indented by at its insertion site
    pub body_indent: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            body_indent: 0,
        }
    }
}

impl RenderOptions {
    /// Usable width for a line nested `extra` columns inside the docstring
    pub fn width(&self, extra: usize) -> usize {
        self.max_line_length
            .saturating_sub(self.body_indent + extra)
    }
}

/// A docstring rendering style
pub trait DocFormatter: Send + Sync {
    fn style(&self) -> DocStyle;

    /// Render style-neutral content into docstring text (quotes excluded)
    fn render(&self, content: &DocContent, opts: &RenderOptions) -> String;

    /// Parse raw provider text and render it in this style
    fn format(&self, raw: &str, opts: &RenderOptions) -> String {
        self.render(&DocContent::parse(raw), opts)
    }
}

pub fn create_formatter(style: DocStyle) -> Box<dyn DocFormatter> {
    match style {
        DocStyle::Google => Box::new(GoogleFormatter),
        DocStyle::Numpy => Box::new(NumpyFormatter),
        DocStyle::Sphinx => Box::new(SphinxFormatter),
        DocStyle::Rest => Box::new(RestFormatter),
        DocStyle::Epytext => Box::new(EpytextFormatter),
    }
}

/// Summary and description paragraphs shared by every style
pub(crate) fn head_lines(content: &DocContent, opts: &RenderOptions) -> Vec<String> {
    // Deep nesting can push the usable width to zero; keep a sane floor here
    let width = opts.width(0).max(20);
    let mut lines = wrap(&content.summary, width);
    if !content.description.is_empty() {
        lines.push(String::new());
        for paragraph in paragraphs(&content.description) {
            if paragraph.is_empty() {
                lines.push(String::new());
            } else {
                lines.extend(wrap(&paragraph, width));
            }
        }
    }
    lines
}

/// Join consecutive non-blank lines into paragraphs, keeping blank separators
fn paragraphs(lines: &[String]) -> Vec<String> {
    let mut out = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in lines {
        if line.trim().is_empty() {
            if !current.is_empty() {
                out.push(current.join(" "));
                current.clear();
            }
            out.push(String::new());
        } else {
            current.push(line.trim());
        }
    }
    if !current.is_empty() {
        out.push(current.join(" "));
    }
    while out.last().is_some_and(|l| l.is_empty()) {
        out.pop();
    }
    out
}

/// One wrapped entry: `{lead}{description}` with continuations at
/// `cont_indent` columns.
pub(crate) fn entry_lines(
    lead: &str,
    description: &str,
    cont_indent: usize,
    opts: &RenderOptions,
) -> Vec<String> {
    if description.is_empty() {
        return vec![lead.trim_end().to_string()];
    }
    let width = opts.width(lead.len()).max(20);
    let wrapped = wrap(description, width);
    let mut out = Vec::with_capacity(wrapped.len());
    for (i, piece) in wrapped.iter().enumerate() {
        if i == 0 {
            out.push(format!("{}{}", lead, piece));
        } else {
            out.push(format!("{}{}", " ".repeat(cont_indent), piece));
        }
    }
    out
}

/// Markers for the field-oriented styles (Sphinx, reST, Epytext)
pub(crate) struct FieldMarkers {
    pub prefix: char,
    pub ret: &'static str,
    pub raise_kw: &'static str,
}

/// Shared body renderer for the field-oriented styles
pub(crate) fn render_field_style(
    content: &DocContent,
    opts: &RenderOptions,
    markers: &FieldMarkers,
) -> String {
    let p = markers.prefix;
    let mut lines = head_lines(content, opts);

    let mut fields: Vec<String> = Vec::new();
    for arg in &content.args {
        fields.extend(entry_lines(
            &format!("{}param {}: ", p, arg.name),
            &arg.description,
            4,
            opts,
        ));
        if let Some(ty) = &arg.ty {
            fields.push(format!("{}type {}: {}", p, arg.name, ty));
        }
    }
    if let Some(ret) = &content.returns {
        if !ret.description.is_empty() {
            fields.extend(entry_lines(
                &format!("{}{}: ", p, markers.ret),
                &ret.description,
                4,
                opts,
            ));
        }
        if let Some(ty) = &ret.ty {
            fields.push(format!("{}rtype: {}", p, ty));
        }
    }
    if let Some(yields) = &content.yields {
        fields.extend(entry_lines(
            &format!("{}yields: ", p),
            &yields.description,
            4,
            opts,
        ));
    }
    for raised in &content.raises {
        fields.extend(entry_lines(
            &format!("{}{} {}: ", p, markers.raise_kw, raised.name),
            &raised.description,
            4,
            opts,
        ));
    }

    if !fields.is_empty() {
        lines.push(String::new());
        lines.extend(fields);
    }

    push_plain_section(&mut lines, "Examples:", &content.examples);
    push_plain_section(&mut lines, "Notes:", &content.notes);
    push_plain_section(&mut lines, "Warnings:", &content.cautions);

    lines.join("\n")
}

/// Google-shaped verbatim section used by every style for examples/notes
pub(crate) fn push_plain_section(lines: &mut Vec<String>, header: &str, body: &[String]) {
    if body.is_empty() {
        return;
    }
    lines.push(String::new());
    lines.push(header.to_string());
    for line in body {
        if line.trim().is_empty() {
            lines.push(String::new());
        } else {
            lines.push(format!("    {}", line));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_covers_every_style() {
        for style in [
            DocStyle::Google,
            DocStyle::Numpy,
            DocStyle::Sphinx,
            DocStyle::Rest,
            DocStyle::Epytext,
        ] {
            assert_eq!(create_formatter(style).style(), style);
        }
    }

    #[test]
    fn every_style_is_idempotent() {
        let raw = "Compute a value.\n\nLonger description of the computation.\n\nArgs:\n    count (int): How many items.\n    label: Display label.\n\nReturns:\n    str: The rendered result.\n\nRaises:\n    ValueError: When count is negative.";
        let opts = RenderOptions::default();
        for style in [
            DocStyle::Google,
            DocStyle::Numpy,
            DocStyle::Sphinx,
            DocStyle::Rest,
            DocStyle::Epytext,
        ] {
            let formatter = create_formatter(style);
            let once = formatter.format(raw, &opts);
            let twice = formatter.format(&once, &opts);
            assert_eq!(once, twice, "style {} not idempotent", style);
        }
    }

    #[test]
    fn entry_lines_wrap_with_continuation_indent() {
        let opts = RenderOptions {
            max_line_length: 40,
            body_indent: 0,
        };
        let lines = entry_lines(
            "    path: ",
            "A fairly long description that needs to wrap onto another line.",
            8,
            &opts,
        );
        assert!(lines.len() > 1);
        assert!(lines[0].starts_with("    path: A"));
        assert!(lines[1].starts_with("        "));
    }
}
