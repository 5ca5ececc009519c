//! Core Data Model
//!
//! Value types describing parsed Python code elements, parse diagnostics,
//! analysis metadata, and generated documentation.
//!
//! The element tree is an arena: `ParseResult` owns a flat `Vec<CodeElement>`,
//! each element stores its parent as an index and its children as an ordered
//! index list. Parent links are relation only, never ownership, so the tree
//! has no reference cycles.

pub mod error;

pub use error::{DocError, ErrorCategory, ErrorClassifier, ProviderError, Result};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// =============================================================================
// Element Identity
// =============================================================================

/// Index of an element within its `ParseResult` arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub usize);

/// Kind of documentable Python construct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Module,
    Class,
    Function,
    Method,
    Property,
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Module => write!(f, "module"),
            Self::Class => write!(f, "class"),
            Self::Function => write!(f, "function"),
            Self::Method => write!(f, "method"),
            Self::Property => write!(f, "property"),
        }
    }
}

/// Visibility derived from Python naming convention (leading underscore)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    /// Underscore prefix means private
    pub fn from_name(name: &str) -> Self {
        if name.starts_with('_') {
            Visibility::Private
        } else {
            Visibility::Public
        }
    }
}

// =============================================================================
// Spans and Body Layout
// =============================================================================

/// Source location of an element (1-based lines, 0-based columns)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
    /// Byte range of the whole definition in the original source
    pub start_byte: usize,
    pub end_byte: usize,
}

impl SourceSpan {
    /// Strict containment check used by the tree invariant:
    /// children lie inside their parent and do not overlap siblings.
    pub fn contains(&self, other: &SourceSpan) -> bool {
        self.start_byte <= other.start_byte && other.end_byte <= self.end_byte
    }

    pub fn overlaps(&self, other: &SourceSpan) -> bool {
        self.start_byte < other.end_byte && other.start_byte < self.end_byte
    }
}

/// Positions the Insertion Engine needs to place a docstring, captured at
/// parse time against the original unmodified source.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BodyLayout {
    /// Byte offset just after the `:` that ends the signature
    /// (0 for the module element)
    pub header_end: usize,
    /// Byte offset of the first statement in the body
    pub start: usize,
    /// Line (1-based) of the first body statement
    pub start_line: u32,
    /// True when the body begins on the signature line (`def f(): return x`)
    pub inline: bool,
    /// Leading whitespace of the first body line, when the body is on its
    /// own line
    pub indent: String,
    /// Byte range of the existing docstring expression statement, quotes
    /// included, if the first body statement is a string literal
    pub doc_range: Option<(usize, usize)>,
}

// =============================================================================
// Signature Components
// =============================================================================

/// Parameter kind in a Python signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParamKind {
    Positional,
    KeywordOnly,
    /// `*args`
    VarPositional,
    /// `**kwargs`
    VarKeyword,
}

/// Information about a function/method parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterInfo {
    pub name: String,
    /// Type annotation as written in source (e.g. `int`, `list[str] | None`)
    pub annotation: Option<String>,
    /// Default value literal as written in source
    pub default: Option<String>,
    pub kind: ParamKind,
}

impl ParameterInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotation: None,
            default: None,
            kind: ParamKind::Positional,
        }
    }

    /// Required when it has no default and is not variadic
    pub fn is_required(&self) -> bool {
        self.default.is_none()
            && !matches!(self.kind, ParamKind::VarPositional | ParamKind::VarKeyword)
    }

    /// Receiver parameters carry no documentation value
    pub fn is_receiver(&self) -> bool {
        self.name == "self" || self.name == "cls"
    }
}

/// Information about a function/method return value
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReturnInfo {
    /// Return type annotation as written in source
    pub annotation: Option<String>,
    pub is_generator: bool,
    pub is_async: bool,
}

/// A decorator applied to an element, with its literal arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoratorInfo {
    pub name: String,
    pub arguments: Vec<String>,
}

impl DecoratorInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: Vec::new(),
        }
    }
}

// =============================================================================
// Code Element
// =============================================================================

/// A parsed, documentable Python construct.
///
/// Immutable by convention after parsing, except for the `analysis` slot the
/// Analyzer fills in.
#[derive(Debug, Clone, Default)]
pub struct CodeElement {
    pub kind: ElementKind,
    pub name: String,
    /// Dotted path from the module root (e.g. `pkg.module.Class.method`)
    pub qualified_name: String,
    pub span: SourceSpan,
    pub body: BodyLayout,
    pub visibility: Visibility,
    pub parameters: Vec<ParameterInfo>,
    pub returns: Option<ReturnInfo>,
    /// Exception type names raised in the body, first-seen order, deduplicated
    pub raises: Vec<String>,
    pub decorators: Vec<DecoratorInfo>,
    pub base_classes: Vec<String>,
    /// Class-level attributes as (name, annotation) pairs
    pub attributes: Vec<(String, Option<String>)>,
    /// Existing docstring content, quotes stripped. `Some("")` means an empty
    /// docstring is present, which still counts as documented.
    pub docstring: Option<String>,
    pub is_async: bool,
    pub is_abstract: bool,
    pub is_property: bool,
    pub is_classmethod: bool,
    pub is_staticmethod: bool,
    /// Weak back-reference: index only, never ownership
    pub parent: Option<ElementId>,
    /// Owned children, ordered by source position
    pub children: Vec<ElementId>,
    /// Filled by the Analyzer
    pub analysis: Option<AnalysisResult>,
}

// Defaults used only by `CodeElement::default`; parsing always sets them.
impl Default for ElementKind {
    fn default() -> Self {
        ElementKind::Module
    }
}

impl Default for Visibility {
    fn default() -> Self {
        Visibility::Public
    }
}

impl CodeElement {
    /// A docstring is "present" even when empty or whitespace-only
    pub fn has_docstring(&self) -> bool {
        self.docstring.is_some()
    }

    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    /// Parameters excluding `self`/`cls`
    pub fn documentable_parameters(&self) -> impl Iterator<Item = &ParameterInfo> {
        self.parameters.iter().filter(|p| !p.is_receiver())
    }

    /// Render the signature roughly as written (`def name(a: int, b=0) -> str`)
    pub fn signature(&self) -> String {
        match self.kind {
            ElementKind::Module => self.qualified_name.clone(),
            ElementKind::Class => {
                if self.base_classes.is_empty() {
                    format!("class {}", self.name)
                } else {
                    format!("class {}({})", self.name, self.base_classes.join(", "))
                }
            }
            _ => {
                let params: Vec<String> = self
                    .parameters
                    .iter()
                    .map(|p| {
                        let mut s = match p.kind {
                            ParamKind::VarPositional => format!("*{}", p.name),
                            ParamKind::VarKeyword => format!("**{}", p.name),
                            _ => p.name.clone(),
                        };
                        if let Some(ann) = &p.annotation {
                            s.push_str(": ");
                            s.push_str(ann);
                        }
                        if let Some(default) = &p.default {
                            s.push_str(if p.annotation.is_some() { " = " } else { "=" });
                            s.push_str(default);
                        }
                        s
                    })
                    .collect();
                let prefix = if self.is_async { "async def" } else { "def" };
                let ret = self
                    .returns
                    .as_ref()
                    .and_then(|r| r.annotation.as_ref())
                    .map(|a| format!(" -> {}", a))
                    .unwrap_or_default();
                format!("{} {}({}){}", prefix, self.name, params.join(", "), ret)
            }
        }
    }

    pub fn get_decorator(&self, name: &str) -> Option<&DecoratorInfo> {
        self.decorators.iter().find(|d| d.name == name)
    }
}

// =============================================================================
// Diagnostics
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
    Fatal,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
            Self::Fatal => write!(f, "fatal"),
        }
    }
}

/// One parse/analysis finding, positioned in the original source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    /// 1-based line
    pub line: u32,
    /// 0-based column
    pub column: u32,
}

impl Diagnostic {
    pub fn new(severity: Severity, message: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            severity,
            message: message.into(),
            line,
            column,
        }
    }

    pub fn fatal(message: impl Into<String>, line: u32, column: u32) -> Self {
        Self::new(Severity::Fatal, message, line, column)
    }

    pub fn warning(message: impl Into<String>, line: u32, column: u32) -> Self {
        Self::new(Severity::Warning, message, line, column)
    }
}

// =============================================================================
// Parse Result
// =============================================================================

/// Result of parsing one Python file.
///
/// Owns the element arena (index 0 is the module root when parsing
/// succeeded), the diagnostics, and the original source text the Insertion
/// Engine later rewrites. Discarded after one generation pass.
#[derive(Debug, Clone, Default)]
pub struct ParseResult {
    pub path: String,
    /// Dotted module path derived from the file path
    pub module_path: String,
    /// Original source text, kept verbatim for insertion
    pub source: String,
    /// Element arena; empty when parsing failed fatally
    pub elements: Vec<CodeElement>,
    pub diagnostics: Vec<Diagnostic>,
    pub total_lines: usize,
    /// Non-blank, non-comment lines
    pub code_lines: usize,
}

impl ParseResult {
    /// Module root, when the parse produced a tree
    pub fn root(&self) -> Option<ElementId> {
        if self.elements.is_empty() {
            None
        } else {
            Some(ElementId(0))
        }
    }

    pub fn get(&self, id: ElementId) -> &CodeElement {
        &self.elements[id.0]
    }

    pub fn get_mut(&mut self, id: ElementId) -> &mut CodeElement {
        &mut self.elements[id.0]
    }

    pub fn has_fatal(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Fatal)
    }

    /// All element ids in depth-first source order, root first
    pub fn ids(&self) -> Vec<ElementId> {
        let mut out = Vec::with_capacity(self.elements.len());
        if let Some(root) = self.root() {
            self.collect_ids(root, &mut out);
        }
        out
    }

    fn collect_ids(&self, id: ElementId, out: &mut Vec<ElementId>) {
        out.push(id);
        for child in &self.get(id).children {
            self.collect_ids(*child, out);
        }
    }

    /// Elements the generator can target: everything except the module root
    pub fn documentable_ids(&self) -> Vec<ElementId> {
        self.ids().into_iter().skip(1).collect()
    }

    /// Find an element by its fully qualified name
    pub fn find_by_qualified_name(&self, qualified: &str) -> Option<ElementId> {
        self.elements
            .iter()
            .position(|e| e.qualified_name == qualified)
            .map(ElementId)
    }

    /// Dedented source snippet for one element, suitable for standalone
    /// re-parsing (methods carry class indentation in the file).
    pub fn snippet(&self, id: ElementId) -> String {
        let el = self.get(id);
        let raw = &self.source[el.span.start_byte..el.span.end_byte.min(self.source.len())];
        let dedent = el.span.start_col as usize;
        if dedent == 0 {
            return raw.to_string();
        }
        raw.lines()
            .enumerate()
            .map(|(i, line)| {
                if i == 0 {
                    line.to_string()
                } else {
                    let strip = line
                        .char_indices()
                        .take_while(|(i, c)| *i < dedent && (*c == ' ' || *c == '\t'))
                        .count();
                    line[strip..].to_string()
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Verify the tree invariant: child spans strictly inside the parent,
    /// siblings non-overlapping and in source order.
    pub fn check_span_invariant(&self) -> bool {
        for (idx, el) in self.elements.iter().enumerate() {
            if idx == 0 {
                continue;
            }
            for pair in el.children.windows(2) {
                let (a, b) = (self.get(pair[0]), self.get(pair[1]));
                if a.span.overlaps(&b.span) || a.span.start_byte > b.span.start_byte {
                    return false;
                }
            }
            if let Some(parent) = el.parent
                && !self.get(parent).span.contains(&el.span)
            {
                return false;
            }
        }
        true
    }
}

// =============================================================================
// Analysis Result
// =============================================================================

/// Best-guess type with a confidence in [0, 1] and the evidence it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeGuess {
    pub ty: String,
    pub confidence: f32,
    /// How the type was inferred (e.g. `default_value`, `str_methods_used`)
    pub source: String,
}

impl TypeGuess {
    pub fn new(ty: impl Into<String>, confidence: f32, source: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            confidence: confidence.clamp(0.0, 1.0),
            source: source.into(),
        }
    }
}

/// Per-element analysis metadata attached by the Analyzer.
///
/// Inferred types are keyed by parameter name, with `"return"` reserved for
/// the return value. Low-confidence guesses are reported, never dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// McCabe-style cyclomatic complexity (0 when unknown/degraded)
    pub complexity: u32,
    pub inferred_types: BTreeMap<String, TypeGuess>,
    /// Detected pattern tags, sorted and deduplicated
    pub patterns: Vec<String>,
    pub suggestions: Vec<String>,
    pub is_recursive: bool,
    pub is_generator: bool,
    pub has_early_return: bool,
    /// True when analysis failed and metrics were downgraded to unknown
    pub degraded: bool,
}

impl AnalysisResult {
    /// Degraded placeholder recorded when analysis of one element fails
    pub fn unknown() -> Self {
        Self {
            degraded: true,
            ..Default::default()
        }
    }

    pub fn has_pattern(&self, tag: &str) -> bool {
        self.patterns.iter().any(|p| p == tag)
    }
}

// =============================================================================
// Docstring Styles and Generated Documentation
// =============================================================================

/// Supported docstring rendering styles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocStyle {
    #[default]
    Google,
    Numpy,
    Sphinx,
    Rest,
    Epytext,
}

impl std::fmt::Display for DocStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Google => write!(f, "google"),
            Self::Numpy => write!(f, "numpy"),
            Self::Sphinx => write!(f, "sphinx"),
            Self::Rest => write!(f, "rest"),
            Self::Epytext => write!(f, "epytext"),
        }
    }
}

impl std::str::FromStr for DocStyle {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "numpy" => Ok(Self::Numpy),
            "sphinx" => Ok(Self::Sphinx),
            "rest" | "restructuredtext" => Ok(Self::Rest),
            "epytext" => Ok(Self::Epytext),
            _ => Err(format!(
                "Unknown docstring style: {}. Valid values: google, numpy, sphinx, rest, epytext",
                s
            )),
        }
    }
}

/// One rendered docstring, ready for insertion.
///
/// References its element by qualified name rather than by arena index so it
/// outlives any particular parse. Transient: consumed within one generation
/// pass.
#[derive(Debug, Clone)]
pub struct GeneratedDoc {
    pub qualified_name: String,
    pub kind: ElementKind,
    /// Rendered docstring text, quotes not included
    pub text: String,
    pub style: DocStyle,
    /// Generator's certainty in the text quality, [0, 1]
    pub confidence: f32,
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visibility_follows_underscore_convention() {
        assert_eq!(Visibility::from_name("public_fn"), Visibility::Public);
        assert_eq!(Visibility::from_name("_private_fn"), Visibility::Private);
        assert_eq!(Visibility::from_name("__dunder__"), Visibility::Private);
    }

    #[test]
    fn parameter_requiredness() {
        let plain = ParameterInfo::new("x");
        assert!(plain.is_required());

        let with_default = ParameterInfo {
            default: Some("0".into()),
            ..ParameterInfo::new("x")
        };
        assert!(!with_default.is_required());

        let varargs = ParameterInfo {
            kind: ParamKind::VarPositional,
            ..ParameterInfo::new("args")
        };
        assert!(!varargs.is_required());
    }

    #[test]
    fn empty_docstring_still_counts_as_documented() {
        let el = CodeElement {
            docstring: Some(String::new()),
            ..Default::default()
        };
        assert!(el.has_docstring());
    }

    #[test]
    fn signature_rendering() {
        let el = CodeElement {
            kind: ElementKind::Function,
            name: "add".into(),
            parameters: vec![
                ParameterInfo {
                    annotation: Some("int".into()),
                    ..ParameterInfo::new("a")
                },
                ParameterInfo {
                    annotation: Some("int".into()),
                    default: Some("0".into()),
                    ..ParameterInfo::new("b")
                },
            ],
            returns: Some(ReturnInfo {
                annotation: Some("int".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(el.signature(), "def add(a: int, b: int = 0) -> int");
    }

    #[test]
    fn type_guess_clamps_confidence() {
        let guess = TypeGuess::new("str", 1.5, "test");
        assert_eq!(guess.confidence, 1.0);
    }

    #[test]
    fn span_containment() {
        let outer = SourceSpan {
            start_byte: 0,
            end_byte: 100,
            ..Default::default()
        };
        let inner = SourceSpan {
            start_byte: 10,
            end_byte: 50,
            ..Default::default()
        };
        assert!(outer.contains(&inner));
        assert!(!inner.contains(&outer));
        assert!(outer.overlaps(&inner));
    }
}
