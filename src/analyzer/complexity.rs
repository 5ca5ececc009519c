//! Structural Body Metrics
//!
//! McCabe-style cyclomatic complexity plus the structural flags the pattern
//! catalog and type inference consume. Works on a dedented element snippet
//! re-parsed in isolation so methods score independently of their class.
//!
//! Nested function/class definitions are skipped while scoring; each nested
//! definition is measured on its own when its element is analyzed.

use tree_sitter::Node;

use crate::types::{DocError, Result};

/// Metrics from one function/method body
#[derive(Debug, Clone, Default)]
pub struct BodyMetrics {
    /// 1 + decision points in the element's own body
    pub complexity: u32,
    pub is_recursive: bool,
    pub has_early_return: bool,
    /// Some `return self` exists (builder chaining)
    pub returns_self: bool,
    /// Yields in own body (not nested definitions)
    pub yields: bool,
    /// Type names classified from literal return expressions
    pub return_kinds: Vec<String>,
    /// Distinct numeric literals other than -1, 0, 1
    pub magic_numbers: usize,
}

/// Node kinds that each add one decision point
const DECISION_KINDS: &[&str] = &[
    "if_statement",
    "elif_clause",
    "while_statement",
    "for_statement",
    "except_clause",
    "conditional_expression",
    "for_in_clause",
    "if_clause",
    "case_clause",
    "boolean_operator",
];

/// Measure a single function/method snippet.
///
/// `name` is the element's own name, used for recursion detection. Fails when
/// the snippet does not re-parse as a function definition; callers degrade
/// the element's analysis to unknown.
pub fn measure(snippet: &str, name: &str) -> Result<BodyMetrics> {
    let mut parser = tree_sitter::Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|e| DocError::Analysis {
            element: name.to_string(),
            message: format!("Grammar unavailable: {}", e),
        })?;

    let tree = parser.parse(snippet, None).ok_or_else(|| DocError::Analysis {
        element: name.to_string(),
        message: "Snippet produced no tree".to_string(),
    })?;
    let root = tree.root_node();
    if root.has_error() {
        return Err(DocError::Analysis {
            element: name.to_string(),
            message: "Snippet did not re-parse cleanly".to_string(),
        });
    }

    let def = find_definition(root).ok_or_else(|| DocError::Analysis {
        element: name.to_string(),
        message: "No function definition in snippet".to_string(),
    })?;
    let body = def.child_by_field_name("body").ok_or_else(|| DocError::Analysis {
        element: name.to_string(),
        message: "Definition has no body".to_string(),
    })?;

    let mut metrics = BodyMetrics {
        complexity: 1,
        ..Default::default()
    };
    let mut returns: Vec<Node> = Vec::new();
    let mut magic: Vec<String> = Vec::new();
    walk(body, snippet, name, &mut metrics, &mut returns, &mut magic);
    metrics.magic_numbers = magic.len();

    // A return outside the final top-level statement exits early
    if let Some(last) = last_statement(body) {
        metrics.has_early_return = returns.iter().any(|r| *r != last && !is_within(*r, last));
    }

    for ret in &returns {
        if let Some(expr) = ret.named_child(0) {
            if expr.kind() == "identifier" && text(expr, snippet) == "self" {
                metrics.returns_self = true;
            }
            if let Some(kind) = classify_literal(expr, snippet) {
                metrics.return_kinds.push(kind);
            }
        } else {
            metrics.return_kinds.push("None".to_string());
        }
    }

    Ok(metrics)
}

fn find_definition(root: Node) -> Option<Node> {
    if root.kind() == "function_definition" {
        return Some(root);
    }
    let mut cursor = root.walk();
    let children: Vec<Node> = root.named_children(&mut cursor).collect();
    for child in children {
        if let Some(found) = find_definition(child) {
            return Some(found);
        }
    }
    None
}

fn last_statement(body: Node) -> Option<Node> {
    let mut cursor = body.walk();
    body.named_children(&mut cursor)
        .filter(|c| c.kind() != "comment")
        .last()
}

fn is_within(node: Node, container: Node) -> bool {
    container.start_byte() <= node.start_byte() && node.end_byte() <= container.end_byte()
}

fn walk<'tree>(
    node: Node<'tree>,
    source: &str,
    name: &str,
    metrics: &mut BodyMetrics,
    returns: &mut Vec<Node<'tree>>,
    magic: &mut Vec<String>,
) {
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    for child in children {
        let kind = child.kind();
        match kind {
            // Nested definitions score independently
            "function_definition" | "class_definition" => continue,
            "yield" => metrics.yields = true,
            "return_statement" => returns.push(child),
            "call" => {
                if let Some(f) = child.child_by_field_name("function")
                    && text(f, source) == name
                {
                    metrics.is_recursive = true;
                }
            }
            "integer" | "float" => {
                let literal = text(child, source).to_string();
                if !matches!(literal.as_str(), "0" | "1" | "-1") && !magic.contains(&literal) {
                    magic.push(literal);
                }
            }
            _ => {}
        }
        if DECISION_KINDS.contains(&kind) {
            metrics.complexity += 1;
        }
        walk(child, source, name, metrics, returns, magic);
    }
}

fn text<'a>(node: Node, source: &'a str) -> &'a str {
    &source[node.start_byte()..node.end_byte()]
}

/// Python type name for a literal return expression, when determinable
fn classify_literal(expr: Node, source: &str) -> Option<String> {
    let name = match expr.kind() {
        "true" | "false" => "bool",
        "integer" => "int",
        "float" => "float",
        "string" | "concatenated_string" => "str",
        "list" | "list_comprehension" => "list",
        "dictionary" | "dictionary_comprehension" => "dict",
        "set" | "set_comprehension" => "set",
        "tuple" => "tuple",
        "none" => "None",
        "comparison_operator" | "not_operator" => "bool",
        "identifier" if text(expr, source) == "self" => return None,
        _ => return None,
    };
    Some(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn straight_line_code_scores_one() {
        let m = measure("def f(a, b):\n    return a + b\n", "f").unwrap();
        assert_eq!(m.complexity, 1);
        assert!(!m.has_early_return);
    }

    #[test]
    fn branches_and_boolean_operators_add_points() {
        let snippet = "\
def grade(score, strict):
    if score > 90 and not strict:
        return \"A\"
    elif score > 70:
        return \"B\"
    for _ in range(3):
        pass
    return \"C\"
";
        let m = measure(snippet, "grade").unwrap();
        // if + and + elif + for
        assert_eq!(m.complexity, 5);
        assert!(m.has_early_return);
        assert_eq!(m.return_kinds, vec!["str", "str", "str"]);
    }

    #[test]
    fn nested_definitions_score_independently() {
        let snippet = "\
def outer(x):
    def inner(y):
        if y:
            while y:
                y -= 1
        return y
    return inner(x)
";
        let m = measure(snippet, "outer").unwrap();
        assert_eq!(m.complexity, 1);
    }

    #[test]
    fn recursion_detected() {
        let m = measure(
            "def fact(n):\n    if n <= 1:\n        return 1\n    return n * fact(n - 1)\n",
            "fact",
        )
        .unwrap();
        assert!(m.is_recursive);
        assert!(m.has_early_return);
    }

    #[test]
    fn builder_chaining_detected() {
        let m = measure("def with_name(self, name):\n    self.name = name\n    return self\n", "with_name")
            .unwrap();
        assert!(m.returns_self);
    }

    #[test]
    fn yields_detected_excluding_nested() {
        let m = measure("def gen(n):\n    for i in range(n):\n        yield i\n", "gen").unwrap();
        assert!(m.yields);

        let m = measure(
            "def outer():\n    def gen():\n        yield 1\n    return gen\n",
            "outer",
        )
        .unwrap();
        assert!(!m.yields);
    }

    #[test]
    fn magic_numbers_counted_distinct() {
        let m = measure(
            "def f(x):\n    return x * 42 + 42 - 7 + 1\n",
            "f",
        )
        .unwrap();
        assert_eq!(m.magic_numbers, 2);
    }

    #[test]
    fn invalid_snippet_is_an_error() {
        assert!(measure("def broken(:\n    pass\n", "broken").is_err());
    }

    #[test]
    fn comprehension_clauses_count() {
        let m = measure(
            "def f(xs):\n    return [x for x in xs if x > 0]\n",
            "f",
        )
        .unwrap();
        // for_in_clause + if_clause
        assert_eq!(m.complexity, 3);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(32))]

            #[test]
            fn each_branch_adds_exactly_one(branches in 0usize..8) {
                let mut body = String::new();
                for i in 0..branches {
                    body.push_str(&format!("    if x > {}:\n        x -= {}\n", i, i));
                }
                if branches == 0 {
                    body.push_str("    pass\n");
                }
                let snippet = format!("def f(x):\n{}", body);
                let m = measure(&snippet, "f").unwrap();
                prop_assert_eq!(m.complexity, 1 + branches as u32);
            }
        }
    }
}
