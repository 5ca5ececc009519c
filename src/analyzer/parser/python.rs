use std::path::Path;

use tree_sitter::Node;

use crate::constants::analysis::MAX_FILE_SIZE;
use crate::types::{
    BodyLayout, CodeElement, DecoratorInfo, Diagnostic, DocError, ElementId, ElementKind,
    ParamKind, ParameterInfo, ParseResult, Result, ReturnInfo, SourceSpan, Visibility,
};

/// Structural parser for Python source files
pub struct PythonParser;

impl PythonParser {
    pub fn new() -> Result<Self> {
        // Validate that the grammar loads before accepting work
        let _ = create_ts_parser()?;
        Ok(Self)
    }

    /// Read and parse a file from disk, enforcing the size limit
    pub fn parse_file(&self, path: &Path) -> Result<ParseResult> {
        let metadata = std::fs::metadata(path)?;
        if metadata.len() > MAX_FILE_SIZE {
            return Err(DocError::Parse {
                path: path.display().to_string(),
                message: format!(
                    "File too large ({} bytes, limit {})",
                    metadata.len(),
                    MAX_FILE_SIZE
                ),
            });
        }
        let source = std::fs::read_to_string(path)?;
        self.parse(&path.display().to_string(), &source)
    }

    /// Parse source into an element tree.
    ///
    /// Syntactically invalid input yields a `ParseResult` with an empty
    /// element arena and one fatal diagnostic positioned at the first error.
    pub fn parse(&self, path: &str, source: &str) -> Result<ParseResult> {
        let mut parser = create_ts_parser()?;
        let tree = parser.parse(source, None).ok_or_else(|| DocError::Parse {
            path: path.to_string(),
            message: "Parser produced no tree".to_string(),
        })?;
        let root = tree.root_node();

        let mut result = ParseResult {
            path: path.to_string(),
            module_path: module_path_from(path),
            source: source.to_string(),
            total_lines: source.lines().count(),
            code_lines: count_code_lines(source),
            ..Default::default()
        };

        if root.has_error() {
            let (line, column, message) = first_syntax_error(root);
            result.diagnostics.push(Diagnostic::fatal(message, line, column));
            tracing::debug!(path, line, column, "parse failed, emitting fatal diagnostic");
            return Ok(result);
        }

        let module = build_module_element(root, source, &result.module_path, path);
        result.elements.push(module);

        let mut extractor = Extractor {
            source,
            elements: &mut result.elements,
            diagnostics: &mut result.diagnostics,
        };
        extractor.walk_scope(root, ElementId(0), false);

        tracing::debug!(
            path,
            elements = result.elements.len(),
            diagnostics = result.diagnostics.len(),
            "parsed"
        );
        Ok(result)
    }
}

fn create_ts_parser() -> Result<tree_sitter::Parser> {
    let mut parser = tree_sitter::Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|e| DocError::Parse {
            path: String::new(),
            message: format!("Failed to load Python grammar: {}", e),
        })?;
    Ok(parser)
}

// =============================================================================
// Module-Level Helpers
// =============================================================================

/// Dotted module path from a file path: components after the last `src`/`lib`
/// marker, `.py` stripped, `__init__` dropped.
fn module_path_from(path: &str) -> String {
    let normalized = path.replace('\\', "/");
    let stem_path = normalized.strip_suffix(".py").unwrap_or(&normalized);
    let components: Vec<&str> = stem_path
        .split('/')
        .filter(|c| !c.is_empty() && *c != ".")
        .collect();

    // Markers are skipped when present; without one, every component counts
    let start = components
        .iter()
        .rposition(|c| *c == "src" || *c == "lib")
        .map(|i| i + 1)
        .unwrap_or(0);

    let parts: Vec<&str> = components[start..]
        .iter()
        .copied()
        .filter(|c| *c != "__init__")
        .collect();

    if parts.is_empty() {
        components.last().copied().unwrap_or("").to_string()
    } else {
        parts.join(".")
    }
}

/// Non-blank lines that are not pure comments
fn count_code_lines(source: &str) -> usize {
    source
        .lines()
        .filter(|l| {
            let t = l.trim();
            !t.is_empty() && !t.starts_with('#')
        })
        .count()
}

/// Position and description of the first ERROR or MISSING node
fn first_syntax_error(node: Node) -> (u32, u32, String) {
    if node.is_missing() {
        let pos = node.start_position();
        return (
            pos.row as u32 + 1,
            pos.column as u32,
            format!("Syntax error: missing {}", node.kind()),
        );
    }
    if node.is_error() && node.child_count() == 0 {
        let pos = node.start_position();
        return (pos.row as u32 + 1, pos.column as u32, "Syntax error".to_string());
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.has_error() || child.is_missing() {
            return first_syntax_error(child);
        }
    }
    let pos = node.start_position();
    (pos.row as u32 + 1, pos.column as u32, "Syntax error".to_string())
}

fn span_of(node: Node) -> SourceSpan {
    let start = node.start_position();
    let end = node.end_position();
    SourceSpan {
        start_line: start.row as u32 + 1,
        start_col: start.column as u32,
        end_line: end.row as u32 + 1,
        end_col: end.column as u32,
        start_byte: node.start_byte(),
        end_byte: node.end_byte(),
    }
}

fn node_text<'a>(node: Node, source: &'a str) -> &'a str {
    &source[node.start_byte()..node.end_byte()]
}

fn build_module_element(root: Node, source: &str, module_path: &str, path: &str) -> CodeElement {
    let name = Path::new(path)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| module_path.to_string());

    // First statement past any leading comments anchors module-level insertion
    let mut body = BodyLayout {
        start: source.len(),
        start_line: 1,
        ..Default::default()
    };
    let mut cursor = root.walk();
    for child in root.named_children(&mut cursor) {
        if child.kind() == "comment" {
            continue;
        }
        body.start = child.start_byte();
        body.start_line = child.start_position().row as u32 + 1;
        if child.kind() == "expression_statement"
            && let Some(s) = string_child(child)
        {
            body.doc_range = Some((s.start_byte(), s.end_byte()));
        }
        break;
    }

    let docstring = body
        .doc_range
        .map(|(a, b)| clean_docstring(&string_literal_content(&source[a..b])));

    CodeElement {
        kind: ElementKind::Module,
        name: name.clone(),
        qualified_name: module_path.to_string(),
        span: span_of(root),
        body,
        visibility: Visibility::from_name(&name),
        docstring,
        ..Default::default()
    }
}

// =============================================================================
// Tree Extraction
// =============================================================================

struct Extractor<'a> {
    source: &'a str,
    elements: &'a mut Vec<CodeElement>,
    diagnostics: &'a mut Vec<Diagnostic>,
}

impl Extractor<'_> {
    /// Walk statements attaching definitions to `parent`. Definitions nested
    /// inside control flow still belong to the enclosing scope; entering a
    /// definition switches the parent.
    fn walk_scope(&mut self, node: Node, parent: ElementId, in_class: bool) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "decorated_definition" => {
                    if let Some(def) = child.child_by_field_name("definition") {
                        self.extract_definition(def, Some(child), parent, in_class);
                    }
                }
                "function_definition" | "class_definition" => {
                    self.extract_definition(child, None, parent, in_class);
                }
                // Definition bodies are walked by extract_definition
                _ => self.walk_scope(child, parent, in_class),
            }
        }
    }

    fn extract_definition(
        &mut self,
        def: Node,
        decorated: Option<Node>,
        parent: ElementId,
        in_class: bool,
    ) {
        let Some(name_node) = def.child_by_field_name("name") else {
            let pos = def.start_position();
            self.diagnostics.push(Diagnostic::warning(
                format!("Skipping {} without a name", def.kind()),
                pos.row as u32 + 1,
                pos.column as u32,
            ));
            return;
        };
        let name = node_text(name_node, self.source).to_string();
        let is_class = def.kind() == "class_definition";

        let decorators = decorated
            .map(|d| self.extract_decorators(d))
            .unwrap_or_default();
        let is_property = decorators
            .iter()
            .any(|d| matches!(last_segment(&d.name), "property" | "cached_property"));
        let is_staticmethod = decorators
            .iter()
            .any(|d| last_segment(&d.name) == "staticmethod");
        let is_classmethod = decorators
            .iter()
            .any(|d| last_segment(&d.name) == "classmethod");
        let is_abstract = decorators
            .iter()
            .any(|d| matches!(last_segment(&d.name), "abstractmethod" | "abstractproperty"));

        let kind = if is_class {
            ElementKind::Class
        } else if in_class && is_property {
            ElementKind::Property
        } else if in_class {
            ElementKind::Method
        } else {
            ElementKind::Function
        };

        let qualified_name = {
            let parent_q = &self.elements[parent.0].qualified_name;
            if parent_q.is_empty() {
                name.clone()
            } else {
                format!("{}.{}", parent_q, name)
            }
        };

        // Span covers the decorators when present so sibling order holds
        let span = span_of(decorated.unwrap_or(def));
        let body_node = def.child_by_field_name("body");
        let body = body_node
            .map(|b| self.body_layout(def, b))
            .unwrap_or_default();
        let docstring = body
            .doc_range
            .map(|(a, b)| clean_docstring(&string_literal_content(&self.source[a..b])));

        let is_async = def.child(0).is_some_and(|c| c.kind() == "async");

        let mut element = CodeElement {
            kind,
            name: name.clone(),
            qualified_name,
            span,
            body,
            visibility: Visibility::from_name(&name),
            decorators,
            docstring,
            is_async,
            is_abstract,
            is_property,
            is_classmethod,
            is_staticmethod,
            parent: Some(parent),
            ..Default::default()
        };

        if is_class {
            element.base_classes = self.extract_base_classes(def);
            if let Some(b) = body_node {
                element.attributes = self.extract_class_attributes(b);
            }
        } else {
            element.parameters = def
                .child_by_field_name("parameters")
                .map(|p| self.extract_parameters(p))
                .unwrap_or_default();
            let (raises, is_generator) = body_node
                .map(|b| self.scan_body(b))
                .unwrap_or_default();
            element.raises = raises;
            element.returns = Some(ReturnInfo {
                annotation: def
                    .child_by_field_name("return_type")
                    .map(|r| node_text(r, self.source).to_string()),
                is_generator,
                is_async,
            });
        }

        let id = ElementId(self.elements.len());
        self.elements.push(element);
        self.elements[parent.0].children.push(id);

        if let Some(b) = body_node {
            self.walk_scope(b, id, is_class);
        }
    }

    /// Positions the Insertion Engine needs, taken against original bytes
    fn body_layout(&self, def: Node, body: Node) -> BodyLayout {
        // The `:` closing the signature sits between the header and the block
        let mut header_end = body.start_byte();
        let mut colon_row = body.start_position().row;
        let mut cursor = def.walk();
        for child in def.children(&mut cursor) {
            if child.kind() == ":" && child.start_byte() < body.start_byte() {
                header_end = child.end_byte();
                colon_row = child.end_position().row;
            }
        }

        let start = body.start_byte();
        let start_pos = body.start_position();
        let inline = start_pos.row == colon_row;

        let indent = if inline {
            String::new()
        } else {
            let line_start = self.source[..start].rfind('\n').map(|i| i + 1).unwrap_or(0);
            self.source[line_start..start].to_string()
        };

        let mut doc_range = None;
        let mut body_cursor = body.walk();
        for stmt in body.named_children(&mut body_cursor) {
            if stmt.kind() == "comment" {
                continue;
            }
            if stmt.kind() == "expression_statement"
                && let Some(s) = string_child(stmt)
            {
                doc_range = Some((s.start_byte(), s.end_byte()));
            }
            break;
        }

        BodyLayout {
            header_end,
            start,
            start_line: start_pos.row as u32 + 1,
            inline,
            indent,
            doc_range,
        }
    }

    fn extract_decorators(&self, decorated: Node) -> Vec<DecoratorInfo> {
        let mut out = Vec::new();
        let mut cursor = decorated.walk();
        for child in decorated.named_children(&mut cursor) {
            if child.kind() != "decorator" {
                continue;
            }
            let Some(expr) = child.named_child(0) else { continue };
            if expr.kind() == "call" {
                let name = expr
                    .child_by_field_name("function")
                    .map(|f| node_text(f, self.source).to_string())
                    .unwrap_or_else(|| node_text(expr, self.source).to_string());
                let arguments = expr
                    .child_by_field_name("arguments")
                    .map(|args| {
                        let mut c = args.walk();
                        args.named_children(&mut c)
                            .filter(|a| a.kind() != "comment")
                            .map(|a| node_text(a, self.source).to_string())
                            .collect()
                    })
                    .unwrap_or_default();
                out.push(DecoratorInfo {
                    name,
                    arguments,
                });
            } else {
                out.push(DecoratorInfo::new(node_text(expr, self.source)));
            }
        }
        out
    }

    fn extract_parameters(&self, params: Node) -> Vec<ParameterInfo> {
        let mut out = Vec::new();
        let mut keyword_only = false;
        let mut cursor = params.walk();
        for child in params.named_children(&mut cursor) {
            match child.kind() {
                "identifier" => {
                    let mut p = ParameterInfo::new(node_text(child, self.source));
                    if keyword_only {
                        p.kind = ParamKind::KeywordOnly;
                    }
                    out.push(p);
                }
                "typed_parameter" => {
                    let Some(inner) = child.named_child(0) else { continue };
                    let annotation = child
                        .child_by_field_name("type")
                        .map(|t| node_text(t, self.source).to_string());
                    match inner.kind() {
                        "list_splat_pattern" => {
                            keyword_only = true;
                            if let Some(p) = self.splat_param(inner, ParamKind::VarPositional) {
                                out.push(ParameterInfo { annotation, ..p });
                            }
                        }
                        "dictionary_splat_pattern" => {
                            if let Some(p) = self.splat_param(inner, ParamKind::VarKeyword) {
                                out.push(ParameterInfo { annotation, ..p });
                            }
                        }
                        _ => out.push(ParameterInfo {
                            annotation,
                            kind: if keyword_only {
                                ParamKind::KeywordOnly
                            } else {
                                ParamKind::Positional
                            },
                            ..ParameterInfo::new(node_text(inner, self.source))
                        }),
                    }
                }
                "default_parameter" | "typed_default_parameter" => {
                    let name = child
                        .child_by_field_name("name")
                        .map(|n| node_text(n, self.source).to_string())
                        .unwrap_or_default();
                    if name.is_empty() {
                        continue;
                    }
                    out.push(ParameterInfo {
                        annotation: child
                            .child_by_field_name("type")
                            .map(|t| node_text(t, self.source).to_string()),
                        default: child
                            .child_by_field_name("value")
                            .map(|v| node_text(v, self.source).to_string()),
                        kind: if keyword_only {
                            ParamKind::KeywordOnly
                        } else {
                            ParamKind::Positional
                        },
                        name,
                    });
                }
                "list_splat_pattern" => {
                    keyword_only = true;
                    if let Some(p) = self.splat_param(child, ParamKind::VarPositional) {
                        out.push(p);
                    }
                }
                "dictionary_splat_pattern" => {
                    if let Some(p) = self.splat_param(child, ParamKind::VarKeyword) {
                        out.push(p);
                    }
                }
                // Bare `*` separator: everything after is keyword-only
                "keyword_separator" => keyword_only = true,
                "positional_separator" | "comment" => {}
                _ => {}
            }
        }
        out
    }

    fn splat_param(&self, pattern: Node, kind: ParamKind) -> Option<ParameterInfo> {
        let name = pattern.named_child(0)?;
        Some(ParameterInfo {
            kind,
            ..ParameterInfo::new(node_text(name, self.source))
        })
    }

    fn extract_base_classes(&self, class_def: Node) -> Vec<String> {
        let Some(supers) = class_def.child_by_field_name("superclasses") else {
            return Vec::new();
        };
        let mut cursor = supers.walk();
        supers
            .named_children(&mut cursor)
            .filter(|c| !matches!(c.kind(), "comment" | "keyword_argument"))
            .map(|c| node_text(c, self.source).to_string())
            .collect()
    }

    /// Class-level attribute assignments as (name, annotation)
    fn extract_class_attributes(&self, body: Node) -> Vec<(String, Option<String>)> {
        let mut out = Vec::new();
        let mut cursor = body.walk();
        for stmt in body.named_children(&mut cursor) {
            if stmt.kind() != "expression_statement" {
                continue;
            }
            let Some(expr) = stmt.named_child(0) else { continue };
            if expr.kind() != "assignment" {
                continue;
            }
            let Some(left) = expr.child_by_field_name("left") else { continue };
            if left.kind() != "identifier" {
                continue;
            }
            let annotation = expr
                .child_by_field_name("type")
                .map(|t| node_text(t, self.source).to_string());
            out.push((node_text(left, self.source).to_string(), annotation));
        }
        out
    }

    /// Raised exception names (first-seen order, deduplicated) and whether
    /// the body yields. Nested definitions are excluded; their bodies belong
    /// to their own elements.
    fn scan_body(&self, body: Node) -> (Vec<String>, bool) {
        let mut raises = Vec::new();
        let mut is_generator = false;
        self.scan_body_inner(body, &mut raises, &mut is_generator);
        (raises, is_generator)
    }

    fn scan_body_inner(&self, node: Node, raises: &mut Vec<String>, is_generator: &mut bool) {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "function_definition" | "class_definition" => continue,
                "yield" => *is_generator = true,
                "raise_statement" => {
                    if let Some(name) = self.raised_exception_name(child)
                        && !raises.contains(&name)
                    {
                        raises.push(name);
                    }
                    self.scan_body_inner(child, raises, is_generator);
                }
                _ => self.scan_body_inner(child, raises, is_generator),
            }
        }
    }

    fn raised_exception_name(&self, raise_stmt: Node) -> Option<String> {
        let expr = raise_stmt.named_child(0)?;
        let target = if expr.kind() == "call" {
            expr.child_by_field_name("function")?
        } else {
            expr
        };
        match target.kind() {
            "identifier" | "attribute" => Some(node_text(target, self.source).to_string()),
            _ => None,
        }
    }
}

fn string_child(expr_stmt: Node) -> Option<Node> {
    let child = expr_stmt.named_child(0)?;
    (child.kind() == "string").then_some(child)
}

fn last_segment(dotted: &str) -> &str {
    dotted.rsplit('.').next().unwrap_or(dotted)
}

// =============================================================================
// String Literals
// =============================================================================

/// Strip quote characters and string prefixes from a Python string literal
fn string_literal_content(literal: &str) -> String {
    let trimmed = literal.trim_start_matches(|c: char| "rRbBuUfF".contains(c));
    for quote in ["\"\"\"", "'''", "\"", "'"] {
        if trimmed.starts_with(quote) {
            let inner = &trimmed[quote.len()..];
            return inner.strip_suffix(quote).unwrap_or(inner).to_string();
        }
    }
    trimmed.to_string()
}

/// Leading ASCII space/tab count in bytes. Only these count as indentation,
/// so slicing at the margin always lands on a char boundary even when a line
/// starts with Unicode whitespace.
fn indent_width(line: &str) -> usize {
    line.bytes().take_while(|b| *b == b' ' || *b == b'\t').count()
}

/// `inspect.cleandoc` semantics: trim the first line, strip the common
/// indentation from continuation lines, drop leading/trailing blank lines.
fn clean_docstring(raw: &str) -> String {
    let lines: Vec<&str> = raw.lines().collect();
    if lines.is_empty() {
        return String::new();
    }

    let margin = lines[1..]
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| indent_width(l))
        .min()
        .unwrap_or(0);

    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    out.push(lines[0].trim().to_string());
    for line in &lines[1..] {
        if line.trim().is_empty() {
            out.push(String::new());
        } else {
            out.push(line[margin.min(indent_width(line))..].trim_end().to_string());
        }
    }

    while out.last().is_some_and(|l| l.is_empty()) {
        out.pop();
    }
    while out.first().is_some_and(|l| l.is_empty()) {
        out.remove(0);
    }
    out.join("\n")
}
