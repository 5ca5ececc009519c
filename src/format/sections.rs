//! Structured Docstring Content
//!
//! Style-neutral representation of a docstring plus the parser that recovers
//! it from raw provider text. Every renderer consumes a `DocContent`, so
//! parse-then-render is the idempotence seam: rendering already-rendered
//! text of the same style reproduces it.

use regex::Regex;
use std::sync::OnceLock;

use crate::constants::format::MISSING_DESCRIPTION;
use crate::types::{AnalysisResult, CodeElement, ElementKind};

/// One documented field: a parameter, return value, or raised exception
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldDoc {
    pub name: String,
    pub ty: Option<String>,
    pub description: String,
}

impl FieldDoc {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: None,
            description: description.into(),
        }
    }
}

/// Style-neutral docstring content
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocContent {
    pub summary: String,
    /// Extended description lines (blank line = paragraph break)
    pub description: Vec<String>,
    pub args: Vec<FieldDoc>,
    pub returns: Option<FieldDoc>,
    pub yields: Option<FieldDoc>,
    pub raises: Vec<FieldDoc>,
    /// Verbatim example lines, indentation preserved
    pub examples: Vec<String>,
    pub notes: Vec<String>,
    pub cautions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Args,
    Returns,
    Yields,
    Raises,
    Examples,
    Notes,
    Cautions,
}

fn section_for(header: &str) -> Option<Section> {
    match header.trim().trim_end_matches(':').to_lowercase().as_str() {
        "args" | "arguments" | "parameters" | "params" => Some(Section::Args),
        "returns" | "return" => Some(Section::Returns),
        "yields" | "yield" => Some(Section::Yields),
        "raises" | "exceptions" | "throws" => Some(Section::Raises),
        "examples" | "example" => Some(Section::Examples),
        "notes" | "note" => Some(Section::Notes),
        "warnings" | "warning" => Some(Section::Cautions),
        _ => None,
    }
}

fn field_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[:@](param|type|returns?|rtype|raises?|yields?)(\s+[\w.*\[\],\s]+?)?\s*:\s*(.*)$")
            .expect("field regex")
    })
}

impl DocContent {
    /// Parse raw docstring text in any supported style
    pub fn parse(raw: &str) -> Self {
        let mut content = DocContent::default();
        let lines: Vec<&str> = raw.trim_matches('\n').lines().collect();

        let mut head: Vec<String> = Vec::new();
        let mut sections: Vec<(Section, Vec<String>)> = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            let line = lines[i];
            let trimmed = line.trim();

            // Sphinx/epytext field lines consume their continuations directly
            if (trimmed.starts_with(':') || trimmed.starts_with('@'))
                && field_re().is_match(trimmed)
            {
                i = content.consume_field(&lines, i);
                continue;
            }

            // Google header: a bare section keyword ending in a colon
            if trimmed.ends_with(':')
                && let Some(section) = section_for(trimmed)
            {
                sections.push((section, Vec::new()));
                i += 1;
                continue;
            }

            // NumPy header: keyword underlined with dashes
            if let Some(section) = section_for(trimmed)
                && lines
                    .get(i + 1)
                    .is_some_and(|l| !l.trim().is_empty() && l.trim().chars().all(|c| c == '-'))
            {
                sections.push((section, Vec::new()));
                i += 2;
                continue;
            }

            match sections.last_mut() {
                Some((_, body)) => body.push(line.to_string()),
                None => head.push(line.to_string()),
            }
            i += 1;
        }

        content.set_head(&head);
        for (section, body) in sections {
            content.set_section(section, &dedent(&body));
        }
        content
    }

    fn set_head(&mut self, head: &[String]) {
        let mut iter = head.iter().map(|l| l.trim().to_string()).peekable();
        while iter.peek().is_some_and(|l| l.is_empty()) {
            iter.next();
        }
        let mut summary = Vec::new();
        for line in iter.by_ref() {
            if line.is_empty() {
                break;
            }
            summary.push(line);
        }
        self.summary = summary.join(" ");

        let rest: Vec<String> = iter.collect();
        let trimmed = trim_blank_edges(rest);
        if !trimmed.is_empty() {
            self.description = trimmed;
        }
    }

    fn set_section(&mut self, section: Section, body: &[String]) {
        match section {
            Section::Args => self.args.extend(parse_entries(body)),
            Section::Raises => self.raises.extend(parse_entries(body)),
            Section::Returns => self.returns = parse_single_field(body),
            Section::Yields => self.yields = parse_single_field(body),
            Section::Examples => self.examples = trim_blank_edges(body.to_vec()),
            Section::Notes => self.notes = trim_blank_edges(body.to_vec()),
            Section::Cautions => self.cautions = trim_blank_edges(body.to_vec()),
        }
    }

    /// Consume one `:field:`/`@field:` line plus its indented continuations.
    /// Returns the next unconsumed index.
    fn consume_field(&mut self, lines: &[&str], start: usize) -> usize {
        let trimmed = lines[start].trim();
        let caps = field_re().captures(trimmed).expect("checked by caller");
        let keyword = &caps[1];
        let argument = caps.get(2).map(|m| m.as_str().trim().to_string());
        let mut value = caps[3].trim().to_string();

        let mut i = start + 1;
        while i < lines.len() {
            let next = lines[i].trim();
            if next.is_empty() || next.starts_with(':') || next.starts_with('@') {
                break;
            }
            if !value.is_empty() {
                value.push(' ');
            }
            value.push_str(next);
            i += 1;
        }

        match (keyword, argument) {
            ("param", Some(name)) => {
                if let Some(existing) = self.args.iter_mut().find(|a| a.name == name) {
                    existing.description = value;
                } else {
                    self.args.push(FieldDoc::new(name, value));
                }
            }
            ("type", Some(name)) => {
                if let Some(existing) = self.args.iter_mut().find(|a| a.name == name) {
                    existing.ty = Some(value);
                } else {
                    self.args.push(FieldDoc {
                        name,
                        ty: Some(value),
                        description: String::new(),
                    });
                }
            }
            ("return" | "returns", _) => {
                self.returns.get_or_insert_with(FieldDoc::default).description = value;
            }
            ("rtype", _) => {
                self.returns.get_or_insert_with(FieldDoc::default).ty = Some(value);
            }
            ("raise" | "raises", Some(name)) => {
                self.raises.push(FieldDoc::new(name, value));
            }
            ("yield" | "yields", _) => {
                self.yields.get_or_insert_with(FieldDoc::default).description = value;
            }
            _ => {}
        }
        i
    }

    /// Fill gaps from the element's structure: undocumented parameters,
    /// known raised exceptions, and types the analyzer is confident about.
    /// Provider-supplied text is never altered, only supplemented.
    pub fn supplement(
        &mut self,
        element: &CodeElement,
        analysis: Option<&AnalysisResult>,
        type_confidence_threshold: f32,
    ) {
        if self.summary.is_empty() {
            self.summary = MISSING_DESCRIPTION.to_string();
        }

        if !matches!(element.kind, ElementKind::Module | ElementKind::Class) {
            let confident_type = |name: &str| -> Option<String> {
                analysis
                    .and_then(|a| a.inferred_types.get(name))
                    .filter(|g| g.confidence >= type_confidence_threshold)
                    .map(|g| g.ty.clone())
            };

            for param in element.documentable_parameters() {
                match self.args.iter_mut().find(|a| a.name == param.name) {
                    Some(entry) => {
                        if entry.ty.is_none() {
                            entry.ty = param
                                .annotation
                                .clone()
                                .or_else(|| confident_type(&param.name));
                        }
                    }
                    None => self.args.push(FieldDoc {
                        name: param.name.clone(),
                        ty: param
                            .annotation
                            .clone()
                            .or_else(|| confident_type(&param.name)),
                        description: MISSING_DESCRIPTION.to_string(),
                    }),
                }
            }

            if let Some(ret) = &mut self.returns
                && ret.ty.is_none()
            {
                ret.ty = element
                    .returns
                    .as_ref()
                    .and_then(|r| r.annotation.clone());
            }

            for raised in &element.raises {
                if !self.raises.iter().any(|r| &r.name == raised) {
                    self.raises
                        .push(FieldDoc::new(raised.clone(), MISSING_DESCRIPTION));
                }
            }
        }
    }

    /// Order args to match the signature, keeping unknown extras at the end
    pub fn align_args(&mut self, element: &CodeElement) {
        let order: Vec<&str> = element
            .documentable_parameters()
            .map(|p| p.name.as_str())
            .collect();
        self.args.sort_by_key(|a| {
            order
                .iter()
                .position(|n| *n == a.name)
                .unwrap_or(order.len())
        });
    }

    pub fn word_count(&self) -> usize {
        self.summary.split_whitespace().count()
            + self
                .description
                .iter()
                .map(|l| l.split_whitespace().count())
                .sum::<usize>()
    }
}

/// Parse Google/NumPy style entry blocks: entries start at column zero after
/// dedent, deeper lines continue the previous entry's description.
fn parse_entries(body: &[String]) -> Vec<FieldDoc> {
    static GOOGLE: OnceLock<Regex> = OnceLock::new();
    static NUMPY: OnceLock<Regex> = OnceLock::new();
    let google =
        GOOGLE.get_or_init(|| Regex::new(r"^(\*{0,2}\w+)\s*(?:\(([^)]*)\))?:\s*(.*)$").expect("google entry"));
    let numpy = NUMPY.get_or_init(|| Regex::new(r"^(\*{0,2}[\w.]+) : (.+)$").expect("numpy entry"));

    let mut entries: Vec<FieldDoc> = Vec::new();
    for line in body {
        if line.trim().is_empty() {
            continue;
        }
        let at_margin = !line.starts_with(' ');
        let trimmed = line.trim();

        if at_margin {
            // NumPy `name : type` takes precedence (spaced colon)
            if let Some(caps) = numpy.captures(trimmed) {
                entries.push(FieldDoc {
                    name: caps[1].to_string(),
                    ty: Some(caps[2].trim().to_string()),
                    description: String::new(),
                });
                continue;
            }
            if let Some(caps) = google.captures(trimmed) {
                entries.push(FieldDoc {
                    name: caps[1].to_string(),
                    ty: caps.get(2).map(|m| m.as_str().trim().to_string()),
                    description: caps[3].trim().to_string(),
                });
                continue;
            }
            // NumPy bare name (no type)
            entries.push(FieldDoc::new(trimmed, ""));
        } else if let Some(last) = entries.last_mut() {
            if !last.description.is_empty() {
                last.description.push(' ');
            }
            last.description.push_str(trimmed);
        }
    }
    entries
}

/// Parse a Returns/Yields block in either Google or NumPy shape
fn parse_single_field(body: &[String]) -> Option<FieldDoc> {
    static TYPED: OnceLock<Regex> = OnceLock::new();
    let typed = TYPED.get_or_init(|| Regex::new(r"^([\w.\[\],]+):\s+(.+)$").expect("typed return"));

    let lines: Vec<&String> = body.iter().filter(|l| !l.trim().is_empty()).collect();
    if lines.is_empty() {
        return None;
    }

    // NumPy: first line is the type, continuations are indented description
    if lines.len() > 1 && !lines[0].starts_with(' ') && lines[1].starts_with(' ') {
        let description = lines[1..]
            .iter()
            .map(|l| l.trim())
            .collect::<Vec<_>>()
            .join(" ");
        return Some(FieldDoc {
            name: String::new(),
            ty: Some(lines[0].trim().to_string()),
            description,
        });
    }

    let joined = lines
        .iter()
        .map(|l| l.trim())
        .collect::<Vec<_>>()
        .join(" ");
    if let Some(caps) = typed.captures(&joined) {
        return Some(FieldDoc {
            name: String::new(),
            ty: Some(caps[1].to_string()),
            description: caps[2].to_string(),
        });
    }
    Some(FieldDoc {
        name: String::new(),
        ty: None,
        description: joined,
    })
}

/// Leading ASCII space/tab count in bytes; keeps the margin slice on a char
/// boundary when a line starts with Unicode whitespace.
fn indent_width(line: &str) -> usize {
    line.bytes().take_while(|b| *b == b' ' || *b == b'\t').count()
}

/// Remove the common leading indentation of non-blank lines
fn dedent(lines: &[String]) -> Vec<String> {
    let margin = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| indent_width(l))
        .min()
        .unwrap_or(0);
    lines
        .iter()
        .map(|l| {
            if l.trim().is_empty() {
                String::new()
            } else {
                l[margin.min(indent_width(l))..].trim_end().to_string()
            }
        })
        .collect()
}

fn trim_blank_edges(mut lines: Vec<String>) -> Vec<String> {
    while lines.first().is_some_and(|l| l.trim().is_empty()) {
        lines.remove(0);
    }
    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }
    lines
}

/// Greedy word wrap at exactly `width` columns. A word longer than the width
/// gets its own line; callers guard against degenerate widths.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if current.is_empty() {
            current = word.to_string();
        } else if current.len() + 1 + word.len() <= width {
            current.push(' ');
            current.push_str(word);
        } else {
            out.push(std::mem::take(&mut current));
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    if out.is_empty() {
        out.push(String::new());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_google_sections() {
        let raw = "Add two numbers.\n\nArgs:\n    a: First number.\n    b: Second number.\n\nReturns:\n    Sum of a and b.";
        let content = DocContent::parse(raw);
        assert_eq!(content.summary, "Add two numbers.");
        assert_eq!(content.args.len(), 2);
        assert_eq!(content.args[0], FieldDoc::new("a", "First number."));
        assert_eq!(content.args[1].description, "Second number.");
        let ret = content.returns.unwrap();
        assert_eq!(ret.ty, None);
        assert_eq!(ret.description, "Sum of a and b.");
    }

    #[test]
    fn parses_google_typed_args_and_continuations() {
        let raw = "Do it.\n\nArgs:\n    path (str): Location of the input\n        file on disk.\n\nRaises:\n    ValueError: When the path is empty.";
        let content = DocContent::parse(raw);
        assert_eq!(content.args[0].ty.as_deref(), Some("str"));
        assert_eq!(
            content.args[0].description,
            "Location of the input file on disk."
        );
        assert_eq!(content.raises[0].name, "ValueError");
    }

    #[test]
    fn parses_numpy_headers() {
        let raw = "Scale values.\n\nParameters\n----------\nvalues : list\n    Numbers to scale.\nfactor : float\n    Multiplier.\n\nReturns\n-------\nlist\n    Scaled values.";
        let content = DocContent::parse(raw);
        assert_eq!(content.args.len(), 2);
        assert_eq!(content.args[0].name, "values");
        assert_eq!(content.args[0].ty.as_deref(), Some("list"));
        assert_eq!(content.args[0].description, "Numbers to scale.");
        let ret = content.returns.unwrap();
        assert_eq!(ret.ty.as_deref(), Some("list"));
        assert_eq!(ret.description, "Scaled values.");
    }

    #[test]
    fn parses_sphinx_fields() {
        let raw = "Look up a user.\n\n:param user_id: Identifier to search for.\n:type user_id: int\n:return: The matching user.\n:rtype: User\n:raises KeyError: When no user exists.";
        let content = DocContent::parse(raw);
        assert_eq!(content.args.len(), 1);
        assert_eq!(content.args[0].name, "user_id");
        assert_eq!(content.args[0].ty.as_deref(), Some("int"));
        let ret = content.returns.unwrap();
        assert_eq!(ret.ty.as_deref(), Some("User"));
        assert_eq!(content.raises[0].name, "KeyError");
    }

    #[test]
    fn parses_epytext_fields() {
        let raw = "Ping.\n\n@param host: Target host.\n@type host: str\n@return: Round trip time.\n@rtype: float";
        let content = DocContent::parse(raw);
        assert_eq!(content.args[0].name, "host");
        assert_eq!(content.args[0].ty.as_deref(), Some("str"));
        assert_eq!(content.returns.unwrap().ty.as_deref(), Some("float"));
    }

    #[test]
    fn description_separated_from_summary() {
        let raw = "Summary line.\n\nFirst detail line.\nSecond detail line.\n\nArgs:\n    x: Value.";
        let content = DocContent::parse(raw);
        assert_eq!(content.summary, "Summary line.");
        assert_eq!(
            content.description,
            vec!["First detail line.", "Second detail line."]
        );
    }

    #[test]
    fn plain_text_is_all_summary_and_description() {
        let content = DocContent::parse("Just a line of prose with no sections at all.");
        assert_eq!(
            content.summary,
            "Just a line of prose with no sections at all."
        );
        assert!(content.args.is_empty());
        assert!(content.returns.is_none());
    }

    #[test]
    fn supplement_adds_missing_params_and_raises() {
        use crate::types::ParameterInfo;
        let element = CodeElement {
            kind: ElementKind::Function,
            name: "f".into(),
            parameters: vec![
                ParameterInfo::new("mentioned"),
                ParameterInfo {
                    annotation: Some("int".into()),
                    ..ParameterInfo::new("forgotten")
                },
            ],
            raises: vec!["ValueError".into()],
            ..Default::default()
        };
        let mut content = DocContent::parse("Does a thing.\n\nArgs:\n    mentioned: Covered.");
        content.supplement(&element, None, 0.5);

        assert_eq!(content.args.len(), 2);
        assert_eq!(content.args[1].name, "forgotten");
        assert_eq!(content.args[1].ty.as_deref(), Some("int"));
        assert_eq!(content.args[1].description, MISSING_DESCRIPTION);
        assert_eq!(content.raises[0].name, "ValueError");
    }

    #[test]
    fn supplement_respects_confidence_threshold() {
        use crate::types::{ParameterInfo, TypeGuess};
        let element = CodeElement {
            kind: ElementKind::Function,
            name: "f".into(),
            parameters: vec![ParameterInfo::new("a"), ParameterInfo::new("b")],
            ..Default::default()
        };
        let mut analysis = AnalysisResult::default();
        analysis
            .inferred_types
            .insert("a".into(), TypeGuess::new("Any", 0.1, "no_evidence"));
        analysis
            .inferred_types
            .insert("b".into(), TypeGuess::new("str", 0.9, "default_value"));

        let mut content = DocContent::parse("Sum.\n\nArgs:\n    a: First.\n    b: Second.");
        content.supplement(&element, Some(&analysis), 0.5);
        assert_eq!(content.args[0].ty, None);
        assert_eq!(content.args[1].ty.as_deref(), Some("str"));
    }

    #[test]
    fn wrap_is_greedy_and_stable() {
        let wrapped = wrap("one two three four five six seven", 13);
        assert_eq!(wrapped, vec!["one two three", "four five six", "seven"]);
        let rejoined = wrapped.join(" ");
        assert_eq!(wrap(&rejoined, 13), wrapped);
    }

    #[test]
    fn dedent_counts_only_ascii_whitespace() {
        // NBSP must neither panic the margin slice nor count as indentation
        let lines = vec!["    one".to_string(), "\u{a0}two".to_string()];
        assert_eq!(dedent(&lines), vec!["    one", "\u{a0}two"]);
    }
}
