//! Check Command
//!
//! Read-only coverage report: parse and analyze every discovered file, then
//! summarize docstring coverage, complexity, and detected patterns.

use std::path::Path;

use crate::analyzer::{Analyzer, PythonParser};
use crate::cli::Output;
use crate::config;
use crate::generate::discover;
use crate::types::{DocError, Result};

pub fn run(config_path: Option<&Path>, path: &Path, format: &str) -> Result<()> {
    let settings = config::load(config_path)?;
    let files = discover(&settings, path)?;
    let parser = PythonParser::new()?;
    let analyzer = Analyzer::new();

    let mut parses = Vec::with_capacity(files.len());
    for file in &files {
        match parser.parse_file(file) {
            Ok(mut parse) => {
                if !parse.has_fatal() {
                    analyzer.analyze_file(&mut parse);
                }
                parses.push(parse);
            }
            Err(e) => tracing::warn!(path = %file.display(), error = %e, "skipping file"),
        }
    }
    let report = analyzer.project_report(&parses);

    if format == "json" {
        let json = serde_json::json!({
            "files": report.files,
            "failed_files": report.failed_files,
            "elements": report.elements,
            "documented": report.documented,
            "undocumented": report.undocumented(),
            "coverage": report.coverage,
            "average_complexity": report.average_complexity,
            "patterns": report.pattern_counts,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&json).map_err(DocError::Json)?
        );
        return Ok(());
    }

    let out = Output::new();
    out.header("Documentation Coverage");
    println!("Files: {} ({} failed to parse)", report.files, report.failed_files);
    println!("Elements: {}", report.elements);
    println!("Documented: {}", report.documented);
    println!("Coverage: {:.1}%", report.coverage * 100.0);
    println!("Average complexity: {:.1}", report.average_complexity);

    if !report.pattern_counts.is_empty() {
        out.section("Detected patterns");
        for (pattern, count) in &report.pattern_counts {
            println!("  {}: {}", pattern, count);
        }
    }

    if report.undocumented() > 0 {
        out.warning(&format!("{} element(s) lack docstrings", report.undocumented()));
    } else if report.elements > 0 {
        out.success("Every documentable element has a docstring");
    }
    Ok(())
}
