//! Design Pattern and Anti-Pattern Catalog
//!
//! Tags an element with recognizable idioms so generated documentation can
//! mention them, plus anti-pattern flags with improvement suggestions.
//!
//! Three detector families: decorator-based, name-based, structure-based.
//! Tags come back sorted and deduplicated.

use crate::analyzer::complexity::BodyMetrics;
use crate::constants::analysis;
use crate::types::{CodeElement, ElementKind, ParseResult};

/// Detected pattern tags and improvement suggestions for one element
pub fn detect(
    parse: &ParseResult,
    element: &CodeElement,
    metrics: Option<&BodyMetrics>,
) -> (Vec<String>, Vec<String>) {
    let mut patterns = Vec::new();
    let mut suggestions = Vec::new();

    decorator_patterns(element, &mut patterns);
    name_patterns(element, &mut patterns);
    match element.kind {
        ElementKind::Class => class_structure_patterns(parse, element, &mut patterns),
        _ => {
            if let Some(m) = metrics {
                function_structure_patterns(element, m, &mut patterns);
            }
        }
    }
    anti_patterns(parse, element, metrics, &mut patterns, &mut suggestions);

    patterns.sort();
    patterns.dedup();
    (patterns, suggestions)
}

fn decorator_patterns(element: &CodeElement, out: &mut Vec<String>) {
    if element.is_property {
        out.push("property_accessor".into());
    }
    if element.is_abstract {
        out.push("abstract_method".into());
    }
    if element.is_staticmethod {
        out.push("static_method".into());
    }
    if element.is_classmethod {
        out.push("class_method".into());
    }
    for deco in &element.decorators {
        let tail = deco.name.rsplit('.').next().unwrap_or(&deco.name);
        match tail {
            "cached_property" | "lru_cache" | "cache" => out.push("cached_computation".into()),
            "contextmanager" | "asynccontextmanager" => out.push("context_manager".into()),
            _ => {}
        }
    }
}

fn name_patterns(element: &CodeElement, out: &mut Vec<String>) {
    if matches!(element.kind, ElementKind::Module | ElementKind::Class) {
        return;
    }
    let name = element.name.to_lowercase();

    for (prefixes, tag) in [
        (&["create_", "add_", "insert_", "new_"][..], "crud_create"),
        (&["get_", "fetch_", "find_", "retrieve_", "load_"][..], "crud_read"),
        (&["update_", "set_", "modify_"][..], "crud_update"),
        (&["delete_", "remove_", "clear_"][..], "crud_delete"),
        (&["is_", "has_", "can_", "should_"][..], "predicate"),
        (&["make_", "build_"][..], "factory_method"),
        (&["with_"][..], "builder_method"),
        (&["validate_", "check_", "verify_"][..], "validation"),
        (&["to_", "serialize", "dump"][..], "serialization"),
        (&["parse_", "from_", "deserialize"][..], "parser"),
        (&["format_", "render_"][..], "formatter"),
    ] {
        if prefixes.iter().any(|p| name.starts_with(p)) {
            out.push(tag.into());
        }
    }
}

fn function_structure_patterns(element: &CodeElement, metrics: &BodyMetrics, out: &mut Vec<String>) {
    if metrics.yields || element.returns.as_ref().is_some_and(|r| r.is_generator) {
        out.push("generator".into());
    }
    if metrics.returns_self {
        out.push("builder_method".into());
    }
    if metrics.is_recursive {
        out.push("recursive".into());
    }
}

fn class_structure_patterns(parse: &ParseResult, element: &CodeElement, out: &mut Vec<String>) {
    let method_names: Vec<&str> = element
        .children
        .iter()
        .map(|id| parse.get(*id).name.as_str())
        .collect();
    let has = |n: &str| method_names.contains(&n);

    if has("__iter__") && has("__next__") {
        out.push("iterator".into());
    }
    if has("__enter__") && has("__exit__") {
        out.push("context_manager".into());
    }
    if has("__get__") && has("__set__") {
        out.push("descriptor".into());
    }
    if has("__new__")
        && (element.attributes.iter().any(|(n, _)| n == "_instance")
            || has("instance")
            || has("get_instance"))
    {
        out.push("singleton".into());
    }
    if ["attach", "detach", "notify"].iter().all(|m| has(m))
        || ["subscribe", "unsubscribe"].iter().all(|m| has(m))
    {
        out.push("observer".into());
    }

    let abstract_methods = element
        .children
        .iter()
        .filter(|id| parse.get(**id).is_abstract)
        .count();
    if abstract_methods > 0 && abstract_methods < method_names.len() {
        out.push("template_method".into());
    }
}

fn anti_patterns(
    parse: &ParseResult,
    element: &CodeElement,
    metrics: Option<&BodyMetrics>,
    patterns: &mut Vec<String>,
    suggestions: &mut Vec<String>,
) {
    let lines = (element.span.end_line - element.span.start_line + 1) as usize;

    match element.kind {
        ElementKind::Class => {
            let methods = element
                .children
                .iter()
                .filter(|id| {
                    matches!(
                        parse.get(**id).kind,
                        ElementKind::Method | ElementKind::Property
                    )
                })
                .count();
            if methods > analysis::GOD_CLASS_METHODS {
                patterns.push("god_class".into());
                suggestions.push(format!(
                    "Class has {} methods; consider splitting responsibilities",
                    methods
                ));
            }
        }
        ElementKind::Module => {}
        _ => {
            if lines > analysis::LONG_METHOD_LINES {
                patterns.push("long_method".into());
                suggestions.push(format!(
                    "Function spans {} lines; consider extracting helpers",
                    lines
                ));
            }
            let param_count = element.documentable_parameters().count();
            if param_count > analysis::MAX_PARAMETERS {
                patterns.push("too_many_parameters".into());
                suggestions.push(format!(
                    "Function takes {} parameters; consider grouping them into an object",
                    param_count
                ));
            }
            if let Some(m) = metrics {
                if m.complexity > analysis::HIGH_COMPLEXITY {
                    patterns.push("high_complexity".into());
                    suggestions.push(format!(
                        "Cyclomatic complexity is {}; consider simplifying branching",
                        m.complexity
                    ));
                }
                if m.magic_numbers > analysis::MAGIC_NUMBER_LIMIT {
                    patterns.push("magic_numbers".into());
                    suggestions
                        .push("Several unnamed numeric literals; consider named constants".into());
                }
            }
            let unannotated = element
                .documentable_parameters()
                .filter(|p| p.annotation.is_none())
                .count();
            if unannotated > 0 && param_count > 0 {
                suggestions.push(format!(
                    "{} of {} parameters lack type annotations",
                    unannotated, param_count
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::parser::PythonParser;

    fn parse(source: &str) -> ParseResult {
        PythonParser::new().unwrap().parse("demo.py", source).unwrap()
    }

    #[test]
    fn crud_and_predicate_names() {
        let result = parse("def get_user(user_id):\n    pass\n\ndef is_valid(x):\n    pass\n");
        let (p1, _) = detect(&result, result.get(result.elements[0].children[0]), None);
        assert!(p1.contains(&"crud_read".to_string()));
        let (p2, _) = detect(&result, result.get(result.elements[0].children[1]), None);
        assert!(p2.contains(&"predicate".to_string()));
    }

    #[test]
    fn iterator_and_context_manager_classes() {
        let source = "\
class Walker:
    def __iter__(self):
        return self

    def __next__(self):
        raise StopIteration

class Scope:
    def __enter__(self):
        return self

    def __exit__(self, *exc):
        pass
";
        let result = parse(source);
        let walker = result.get(result.find_by_qualified_name("demo.Walker").unwrap());
        let (patterns, _) = detect(&result, walker, None);
        assert!(patterns.contains(&"iterator".to_string()));

        let scope = result.get(result.find_by_qualified_name("demo.Scope").unwrap());
        let (patterns, _) = detect(&result, scope, None);
        assert!(patterns.contains(&"context_manager".to_string()));
    }

    #[test]
    fn template_method_needs_mixed_abstractness() {
        let source = "\
class Base:
    @abstractmethod
    def step(self):
        ...

    def run(self):
        return self.step()
";
        let result = parse(source);
        let base = result.get(result.find_by_qualified_name("demo.Base").unwrap());
        let (patterns, _) = detect(&result, base, None);
        assert!(patterns.contains(&"template_method".to_string()));
    }

    #[test]
    fn too_many_parameters_flagged_with_suggestion() {
        let result = parse("def f(a, b, c, d, e, g):\n    pass\n");
        let el = result.get(result.elements[0].children[0]);
        let (patterns, suggestions) = detect(&result, el, None);
        assert!(patterns.contains(&"too_many_parameters".to_string()));
        assert!(suggestions.iter().any(|s| s.contains("6 parameters")));
    }

    #[test]
    fn high_complexity_comes_from_metrics() {
        let result = parse("def f(x):\n    pass\n");
        let el = result.get(result.elements[0].children[0]);
        let metrics = BodyMetrics {
            complexity: 20,
            ..Default::default()
        };
        let (patterns, suggestions) = detect(&result, el, Some(&metrics));
        assert!(patterns.contains(&"high_complexity".to_string()));
        assert!(suggestions.iter().any(|s| s.contains("20")));
    }

    #[test]
    fn tags_are_sorted_and_unique() {
        let result = parse("def with_name(self):\n    return self\n");
        let el = result.get(result.elements[0].children[0]);
        let metrics = BodyMetrics {
            returns_self: true,
            ..Default::default()
        };
        let (patterns, _) = detect(&result, el, Some(&metrics));
        // name-based and structure-based both say builder_method; kept once
        assert_eq!(
            patterns.iter().filter(|p| *p == "builder_method").count(),
            1
        );
        let mut sorted = patterns.clone();
        sorted.sort();
        assert_eq!(patterns, sorted);
    }
}
