//! Heuristic Type Inference
//!
//! Best-effort Python type guesses for unannotated parameters and return
//! values, each carrying a confidence in [0, 1] and the evidence source.
//! Guesses are reported at every confidence level; thresholding is the
//! consumer's decision.
//!
//! Strategy ladder per parameter (first match wins):
//! 1. explicit annotation
//! 2. default value literal
//! 3. `isinstance` check in the body
//! 4. method-call usage patterns
//! 5. naming conventions

use std::collections::BTreeMap;

use regex::Regex;

use crate::analyzer::complexity::BodyMetrics;
use crate::constants::confidence;
use crate::types::{CodeElement, TypeGuess};

/// Key reserved for the return value in the inferred-types map
pub const RETURN_KEY: &str = "return";

const LIST_METHODS: &[&str] = &["append", "extend", "insert", "remove", "sort", "reverse"];
const DICT_METHODS: &[&str] = &["keys", "values", "items", "get", "update", "setdefault"];
const STR_METHODS: &[&str] = &[
    "upper", "lower", "strip", "lstrip", "rstrip", "split", "join", "startswith", "endswith",
    "replace", "format", "encode", "title", "capitalize",
];
const SET_METHODS: &[&str] = &["add", "discard", "union", "intersection", "difference"];

/// Infer types for every documentable parameter plus the return value
pub fn infer_types(
    element: &CodeElement,
    snippet: &str,
    metrics: &BodyMetrics,
) -> BTreeMap<String, TypeGuess> {
    let mut out = BTreeMap::new();

    for param in element.documentable_parameters() {
        out.insert(param.name.clone(), infer_parameter(&param.name, param.annotation.as_deref(), param.default.as_deref(), snippet));
    }

    out.insert(RETURN_KEY.to_string(), infer_return(element, metrics));
    out
}

fn infer_parameter(
    name: &str,
    annotation: Option<&str>,
    default: Option<&str>,
    snippet: &str,
) -> TypeGuess {
    if let Some(ann) = annotation {
        return TypeGuess::new(ann, 1.0, "annotation");
    }

    if let Some(default) = default
        && let Some(guess) = from_default(default)
    {
        return guess;
    }

    if let Some(ty) = from_isinstance(name, snippet) {
        return TypeGuess::new(ty, confidence::HIGH, "isinstance_check");
    }

    if let Some(ty) = from_usage(name, snippet) {
        return TypeGuess::new(ty, confidence::MEDIUM, "method_usage");
    }

    if let Some(ty) = from_naming(name) {
        return TypeGuess::new(ty, confidence::LOW, "naming_convention");
    }

    TypeGuess::new("Any", confidence::UNKNOWN, "no_evidence")
}

/// Classify a default value literal as written in source
fn from_default(default: &str) -> Option<TypeGuess> {
    let trimmed = default.trim();
    let (ty, conf, source) = match trimmed {
        "True" | "False" => ("bool", confidence::HIGH, "default_value"),
        "None" => ("Optional[Any]", confidence::LOW, "default_none"),
        _ if trimmed.starts_with('"') || trimmed.starts_with('\'') => {
            ("str", confidence::HIGH, "default_value")
        }
        _ if trimmed.starts_with('[') => ("list", confidence::HIGH, "default_value"),
        _ if trimmed.starts_with('{') => {
            if trimmed.contains(':') || trimmed == "{}" {
                ("dict", confidence::HIGH, "default_value")
            } else {
                ("set", confidence::HIGH, "default_value")
            }
        }
        _ if trimmed.starts_with('(') => ("tuple", confidence::HIGH, "default_value"),
        _ if trimmed.parse::<i64>().is_ok() => ("int", confidence::HIGH, "default_value"),
        _ if trimmed.parse::<f64>().is_ok() => ("float", confidence::HIGH, "default_value"),
        _ => return None,
    };
    Some(TypeGuess::new(ty, conf, source))
}

fn from_isinstance(name: &str, snippet: &str) -> Option<String> {
    let pattern = format!(
        r"isinstance\(\s*{}\s*,\s*([A-Za-z_][A-Za-z0-9_.]*)",
        regex::escape(name)
    );
    let re = Regex::new(&pattern).ok()?;
    re.captures(snippet).map(|c| c[1].to_string())
}

/// Match `name.method(` calls against per-type method vocabularies
fn from_usage(name: &str, snippet: &str) -> Option<String> {
    let pattern = format!(r"{}\.([A-Za-z_][A-Za-z0-9_]*)\(", regex::escape(name));
    let re = Regex::new(&pattern).ok()?;

    let mut scores: BTreeMap<&str, usize> = BTreeMap::new();
    for cap in re.captures_iter(snippet) {
        let method = cap.get(1).map(|m| m.as_str()).unwrap_or("");
        for (ty, vocab) in [
            ("list", LIST_METHODS),
            ("dict", DICT_METHODS),
            ("str", STR_METHODS),
            ("set", SET_METHODS),
        ] {
            if vocab.contains(&method) {
                *scores.entry(ty).or_insert(0) += 1;
            }
        }
    }

    scores
        .into_iter()
        .max_by_key(|(_, count)| *count)
        .map(|(ty, _)| ty.to_string())
}

fn from_naming(name: &str) -> Option<String> {
    let lower = name.to_lowercase();
    let ty = if lower.starts_with("is_")
        || lower.starts_with("has_")
        || lower.starts_with("should_")
        || lower.starts_with("can_")
        || lower.starts_with("enable")
    {
        "bool"
    } else if lower.ends_with("_count")
        || lower.ends_with("_index")
        || lower.ends_with("_size")
        || lower.ends_with("_num")
        || matches!(lower.as_str(), "count" | "index" | "size" | "length" | "n" | "i")
    {
        "int"
    } else if lower.ends_with("_name")
        || lower.ends_with("_path")
        || lower.ends_with("_str")
        || lower.ends_with("_text")
        || lower.ends_with("_msg")
        || matches!(lower.as_str(), "name" | "path" | "text" | "message" | "url" | "key")
    {
        "str"
    } else if lower.ends_with("_list") || lower.ends_with("_items") || lower == "items" {
        "list"
    } else if lower.ends_with("_dict") || lower.ends_with("_map") || lower == "mapping" {
        "dict"
    } else if lower.ends_with("callback")
        || lower.ends_with("_fn")
        || lower.ends_with("_func")
        || lower.ends_with("handler")
    {
        "Callable"
    } else {
        return None;
    };
    Some(ty.to_string())
}

fn infer_return(element: &CodeElement, metrics: &BodyMetrics) -> TypeGuess {
    if let Some(ann) = element.returns.as_ref().and_then(|r| r.annotation.as_deref()) {
        return TypeGuess::new(ann, 1.0, "annotation");
    }

    if metrics.yields {
        return TypeGuess::new("Iterator", confidence::HIGH, "yield_statements");
    }

    if metrics.returns_self {
        return TypeGuess::new("Self", confidence::HIGH, "returns_self");
    }

    let mut kinds: Vec<&str> = metrics.return_kinds.iter().map(String::as_str).collect();
    kinds.sort_unstable();
    kinds.dedup();
    match kinds.as_slice() {
        [] => TypeGuess::new("None", confidence::HIGH, "no_return_statements"),
        ["None"] => TypeGuess::new("None", confidence::HIGH, "return_literals"),
        [single] => TypeGuess::new(*single, confidence::HIGH, "return_literals"),
        ["None", other] | [other, "None"] => TypeGuess::new(
            format!("Optional[{}]", other),
            confidence::MEDIUM,
            "return_literals",
        ),
        _ => TypeGuess::new("Any", confidence::UNKNOWN, "mixed_returns"),
    }
}
