//! Code Analysis Module
//!
//! Parsing, file discovery, and per-element analysis. The `Analyzer` façade
//! fills each element's `AnalysisResult`; a failure on one element degrades
//! that element to unknown metrics and never aborts the file.

pub mod complexity;
pub mod parser;
pub mod patterns;
pub mod scanner;
pub mod type_inference;

pub use complexity::BodyMetrics;
pub use parser::PythonParser;
pub use scanner::FileScanner;

use std::collections::BTreeMap;

use crate::types::{AnalysisResult, Diagnostic, ElementId, ElementKind, ParseResult};

/// Per-element analysis driver
#[derive(Default)]
pub struct Analyzer;

impl Analyzer {
    pub fn new() -> Self {
        Self
    }

    /// Analyze one element. Never fails: when metrics cannot be computed the
    /// result is degraded to unknown and the cause is returned alongside.
    pub fn analyze(&self, parse: &ParseResult, id: ElementId) -> (AnalysisResult, Option<Diagnostic>) {
        let element = parse.get(id);

        match element.kind {
            ElementKind::Module | ElementKind::Class => {
                let (detected, suggestions) = patterns::detect(parse, element, None);
                (
                    AnalysisResult {
                        patterns: detected,
                        suggestions,
                        ..Default::default()
                    },
                    None,
                )
            }
            _ => {
                let snippet = parse.snippet(id);
                match complexity::measure(&snippet, &element.name) {
                    Ok(metrics) => {
                        let inferred = type_inference::infer_types(element, &snippet, &metrics);
                        let (detected, suggestions) =
                            patterns::detect(parse, element, Some(&metrics));
                        (
                            AnalysisResult {
                                complexity: metrics.complexity,
                                inferred_types: inferred,
                                patterns: detected,
                                suggestions,
                                is_recursive: metrics.is_recursive,
                                is_generator: metrics.yields
                                    || element.returns.as_ref().is_some_and(|r| r.is_generator),
                                has_early_return: metrics.has_early_return,
                                degraded: false,
                            },
                            None,
                        )
                    }
                    Err(e) => {
                        tracing::warn!(
                            element = %element.qualified_name,
                            error = %e,
                            "analysis degraded to unknown"
                        );
                        (
                            AnalysisResult::unknown(),
                            Some(Diagnostic::warning(
                                format!("Analysis of {} degraded: {}", element.qualified_name, e),
                                element.span.start_line,
                                element.span.start_col,
                            )),
                        )
                    }
                }
            }
        }
    }

    /// Fill the `analysis` slot of every element in a parse
    pub fn analyze_file(&self, parse: &mut ParseResult) {
        let ids = parse.ids();
        let mut results = Vec::with_capacity(ids.len());
        for id in ids {
            let (analysis, diagnostic) = self.analyze(parse, id);
            results.push((id, analysis, diagnostic));
        }
        for (id, analysis, diagnostic) in results {
            parse.get_mut(id).analysis = Some(analysis);
            if let Some(d) = diagnostic {
                parse.diagnostics.push(d);
            }
        }
    }

    /// Aggregate documentation-coverage statistics across parsed files
    pub fn project_report(&self, parses: &[ParseResult]) -> ProjectReport {
        let mut report = ProjectReport {
            files: parses.len(),
            ..Default::default()
        };
        let mut complexity_sum = 0u64;
        let mut complexity_count = 0u64;

        for parse in parses {
            if parse.has_fatal() {
                report.failed_files += 1;
                continue;
            }
            for id in parse.documentable_ids() {
                let element = parse.get(id);
                report.elements += 1;
                if element.has_docstring() {
                    report.documented += 1;
                }
                if let Some(analysis) = &element.analysis {
                    if !analysis.degraded {
                        complexity_sum += analysis.complexity as u64;
                        complexity_count += 1;
                    }
                    for pattern in &analysis.patterns {
                        *report.pattern_counts.entry(pattern.clone()).or_insert(0) += 1;
                    }
                }
            }
        }

        report.coverage = if report.elements == 0 {
            1.0
        } else {
            report.documented as f32 / report.elements as f32
        };
        report.average_complexity = if complexity_count == 0 {
            0.0
        } else {
            complexity_sum as f32 / complexity_count as f32
        };
        report
    }
}

/// Documentation-coverage summary across a set of files
#[derive(Debug, Clone, Default)]
pub struct ProjectReport {
    pub files: usize,
    pub failed_files: usize,
    pub elements: usize,
    pub documented: usize,
    /// documented / elements, 1.0 for an empty project
    pub coverage: f32,
    pub average_complexity: f32,
    pub pattern_counts: BTreeMap<String, usize>,
}

impl ProjectReport {
    pub fn undocumented(&self) -> usize {
        self.elements - self.documented
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> ParseResult {
        PythonParser::new().unwrap().parse("src/app/svc.py", source).unwrap()
    }

    #[test]
    fn analyze_file_fills_every_element() {
        let mut result = parse(
            "class Svc:\n    def run(self, n):\n        if n:\n            return n\n        return 0\n",
        );
        Analyzer::new().analyze_file(&mut result);
        assert!(result.elements.iter().all(|e| e.analysis.is_some()));

        let run = result.get(result.find_by_qualified_name("app.svc.Svc.run").unwrap());
        let analysis = run.analysis.as_ref().unwrap();
        assert_eq!(analysis.complexity, 2);
        assert!(analysis.has_early_return);
        assert!(!analysis.degraded);
    }

    #[test]
    fn project_report_counts_coverage() {
        let mut documented = parse("def a():\n    \"\"\"Doc.\"\"\"\n\ndef b():\n    pass\n");
        Analyzer::new().analyze_file(&mut documented);
        let report = Analyzer::new().project_report(&[documented]);
        assert_eq!(report.elements, 2);
        assert_eq!(report.documented, 1);
        assert!((report.coverage - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn fatal_files_count_as_failed() {
        let broken = parse("def broken(:\n    pass\n");
        let report = Analyzer::new().project_report(&[broken]);
        assert_eq!(report.failed_files, 1);
        assert_eq!(report.elements, 0);
    }
}
