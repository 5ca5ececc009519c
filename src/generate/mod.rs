//! Generation Orchestrator
//!
//! Drives the pipeline: discover files, parse, analyze, select candidates,
//! request text from the provider, render, and hand edits to the Insertion
//! Engine. Files are processed by a bounded concurrent pool; elements within
//! one file are serialized so all of a file's edits are computed against the
//! original text and applied in one pass.
//!
//! Candidacy is evaluated per element, from that element's own state alone:
//! a documented element never suppresses generation for its siblings.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::stream::{self, StreamExt};
use rand::Rng;
use tokio::sync::watch;
use tracing::instrument;

use crate::analyzer::{Analyzer, FileScanner, PythonParser};
use crate::config::Settings;
use crate::constants::{generation, retry};
use crate::edit::{Edit, FileWriter, InsertMode, InsertionEngine, unified_diff};
use crate::format::{DocContent, RenderOptions, create_formatter};
use crate::provider::{GenerationContext, SharedProvider};
use crate::types::{
    CodeElement, DocError, ElementId, ElementKind, GeneratedDoc, ParseResult, Result, Severity,
};

/// Outcome for one element that could not be documented
#[derive(Debug, Clone)]
pub struct FailedElement {
    pub qualified_name: String,
    pub cause: String,
}

/// Outcome of one file's generation pass
#[derive(Debug, Clone, Default)]
pub struct FileReport {
    pub path: String,
    pub generated: usize,
    pub skipped: usize,
    pub failed: Vec<FailedElement>,
    pub docs: Vec<GeneratedDoc>,
    /// True when the rewritten source reached disk
    pub written: bool,
    /// Unified diff, present in preview mode when the file would change
    pub diff: Option<String>,
    /// Parse/analysis findings surfaced to the user
    pub diagnostics: Vec<(Severity, String, u32, u32)>,
    pub cost_estimate: f64,
    pub total_tokens: u32,
}

impl FileReport {
    fn for_path(path: &Path) -> Self {
        Self {
            path: path.display().to_string(),
            ..Default::default()
        }
    }
}

/// Aggregated outcome of one batch
#[derive(Debug, Clone, Default)]
pub struct GenerationReport {
    pub files: Vec<FileReport>,
    pub canceled: bool,
}

impl GenerationReport {
    pub fn generated(&self) -> usize {
        self.files.iter().map(|f| f.generated).sum()
    }

    pub fn skipped(&self) -> usize {
        self.files.iter().map(|f| f.skipped).sum()
    }

    pub fn failed(&self) -> usize {
        self.files.iter().map(|f| f.failed.len()).sum()
    }

    pub fn cost_estimate(&self) -> f64 {
        self.files.iter().map(|f| f.cost_estimate).sum()
    }
}

pub struct Orchestrator {
    settings: Settings,
    provider: SharedProvider,
    analyzer: Analyzer,
}

impl Orchestrator {
    pub fn new(settings: Settings, provider: SharedProvider) -> Self {
        Self {
            settings,
            provider,
            analyzer: Analyzer::new(),
        }
    }

    /// Run one generation pass over `root` (a file or directory).
    ///
    /// `dry_run` computes diffs without touching any file. Cancellation is
    /// cooperative: in-flight files finish, no new file or element starts.
    #[instrument(skip(self, cancel), fields(root = %root.display(), dry_run))]
    pub async fn run(
        &self,
        root: &Path,
        dry_run: bool,
        cancel: watch::Receiver<bool>,
    ) -> Result<GenerationReport> {
        let files = FileScanner::new(root)
            .with_include(self.settings.include.clone())
            .with_exclude(self.settings.exclude.clone())
            .with_max_file_size(self.settings.analysis.max_file_size)
            .scan()?;

        tracing::info!(root = %root.display(), files = files.len(), "starting generation pass");

        let reports: Vec<FileReport> = stream::iter(files)
            .map(|path| {
                let cancel = cancel.clone();
                async move { self.process_file(&path, dry_run, cancel).await }
            })
            .buffer_unordered(self.settings.concurrency.max(1))
            .collect()
            .await;

        let mut report = GenerationReport {
            files: reports,
            canceled: *cancel.borrow(),
        };
        report.files.sort_by(|a, b| a.path.cmp(&b.path));
        tracing::info!(
            generated = report.generated(),
            skipped = report.skipped(),
            failed = report.failed(),
            "generation pass finished"
        );
        Ok(report)
    }

    /// Process one file end to end. Never returns an error: every failure is
    /// recorded in the report so the batch continues.
    #[instrument(skip(self, cancel, dry_run), fields(path = %path.display()))]
    pub async fn process_file(
        &self,
        path: &Path,
        dry_run: bool,
        cancel: watch::Receiver<bool>,
    ) -> FileReport {
        let mut report = FileReport::for_path(path);
        if *cancel.borrow() {
            return report;
        }

        let mut parse = match PythonParser::new().and_then(|p| p.parse_file(path)) {
            Ok(parse) => parse,
            Err(e) => {
                report.failed.push(FailedElement {
                    qualified_name: path.display().to_string(),
                    cause: e.to_string(),
                });
                return report;
            }
        };

        if parse.has_fatal() {
            for d in &parse.diagnostics {
                report
                    .diagnostics
                    .push((d.severity, d.message.clone(), d.line, d.column));
            }
            return report;
        }

        self.analyzer.analyze_file(&mut parse);
        for d in &parse.diagnostics {
            report
                .diagnostics
                .push((d.severity, d.message.clone(), d.line, d.column));
        }

        let mode = if self.settings.overwrite {
            InsertMode::ReplaceExisting
        } else {
            InsertMode::InsertMissing
        };
        let duplicates = duplicate_names(&parse);
        let mut edits: Vec<Edit> = Vec::new();

        for id in parse.documentable_ids() {
            let element = parse.get(id);
            if !self.is_candidate(element) {
                report.skipped += 1;
                continue;
            }
            if *cancel.borrow() {
                // Stop starting new provider calls; computed edits still land
                report.skipped += 1;
                continue;
            }

            let context = self.build_context(&parse, id);
            match self.generate_with_retry(&context).await {
                Ok(response) => {
                    report.cost_estimate += response.cost_estimate;
                    report.total_tokens += response.usage.total_tokens;

                    let (text, warnings) =
                        self.render(&response.text, element, &duplicates);
                    match InsertionEngine::plan(&parse.source, element, &text, mode) {
                        Ok(Some(edit)) => {
                            edits.push(edit);
                            report.generated += 1;
                            report.docs.push(GeneratedDoc {
                                qualified_name: element.qualified_name.clone(),
                                kind: element.kind,
                                text,
                                style: self.settings.style,
                                confidence: confidence_for(element),
                                warnings,
                            });
                        }
                        Ok(None) => report.skipped += 1,
                        Err(e) => report.failed.push(FailedElement {
                            qualified_name: element.qualified_name.clone(),
                            cause: e.to_string(),
                        }),
                    }
                }
                Err(e) => {
                    let cause = match &e {
                        DocError::Provider(p) => p.category.to_string(),
                        other => other.to_string(),
                    };
                    tracing::warn!(
                        element = %element.qualified_name,
                        cause = %cause,
                        "generation failed for element"
                    );
                    report.failed.push(FailedElement {
                        qualified_name: element.qualified_name.clone(),
                        cause,
                    });
                }
            }
        }

        if edits.is_empty() {
            return report;
        }

        let new_source = match InsertionEngine::apply(&parse.source, edits) {
            Ok(source) => source,
            Err(e) => {
                // The file is left untouched when edits cannot apply safely
                report.failed.push(FailedElement {
                    qualified_name: report.path.clone(),
                    cause: e.to_string(),
                });
                report.generated = 0;
                return report;
            }
        };

        if dry_run {
            report.diff = Some(unified_diff(&parse.source, &new_source, &report.path));
            return report;
        }

        let writer = FileWriter::new(self.settings.backup, false);
        match writer.write(path, &new_source) {
            Ok(_) => report.written = true,
            Err(e) => report.failed.push(FailedElement {
                qualified_name: report.path.clone(),
                cause: e.to_string(),
            }),
        }
        report
    }

    /// Per-element candidacy, from this element's own state only
    fn is_candidate(&self, element: &CodeElement) -> bool {
        if element.kind == ElementKind::Module {
            return false;
        }
        if !element.is_public() && !self.settings.include_private {
            return false;
        }
        !element.has_docstring() || self.settings.overwrite
    }

    fn build_context(&self, parse: &ParseResult, id: ElementId) -> GenerationContext {
        let element = parse.get(id);
        let enclosing_scope = element
            .parent
            .map(|p| parse.get(p))
            .filter(|p| p.kind != ElementKind::Module)
            .map(|p| p.qualified_name.clone());

        let related: Vec<String> = element
            .parent
            .map(|p| {
                parse
                    .get(p)
                    .children
                    .iter()
                    .filter(|sibling| **sibling != id)
                    .take(generation::RELATED_CONTEXT_LIMIT)
                    .map(|sibling| parse.get(*sibling).signature())
                    .collect()
            })
            .unwrap_or_default();

        GenerationContext {
            qualified_name: element.qualified_name.clone(),
            kind: element.kind,
            signature: element.signature(),
            style: self.settings.style,
            existing_docstring: element.docstring.clone(),
            enclosing_scope,
            module_path: parse.module_path.clone(),
            parameters: element.parameters.clone(),
            returns: element.returns.clone(),
            raises: element.raises.clone(),
            analysis: element.analysis.clone(),
            related,
            source_snippet: parse.snippet(id),
        }
    }

    /// Bounded exponential backoff with jitter. Terminal categories fail
    /// immediately; retryable ones wait and try again until the budget runs
    /// out.
    async fn generate_with_retry(
        &self,
        context: &GenerationContext,
    ) -> Result<crate::provider::ProviderResponse> {
        let max_retries = self.settings.provider.max_retries;
        let mut attempt = 0u32;
        loop {
            match self.provider.generate(context).await {
                Ok(response) => return Ok(response),
                Err(DocError::Provider(e)) => {
                    if !e.is_retryable() || attempt >= max_retries {
                        return Err(DocError::Provider(e));
                    }
                    let delay = backoff_delay(attempt, e.retry_after);
                    tracing::debug!(
                        element = %context.qualified_name,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        category = %e.category,
                        "retrying provider call"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(other) => return Err(other),
            }
        }
    }

    /// Parse provider text, supplement it from the element's structure, and
    /// render in the configured style.
    fn render(
        &self,
        raw: &str,
        element: &CodeElement,
        duplicates: &HashSet<String>,
    ) -> (String, Vec<String>) {
        let mut content = DocContent::parse(raw);
        content.align_args(element);
        content.supplement(
            element,
            element.analysis.as_ref(),
            self.settings.type_confidence_threshold,
        );

        let mut warnings = Vec::new();
        if content.word_count() < generation::BRIEF_DOCSTRING_WORDS {
            warnings.push("Generated description is very brief".to_string());
        }
        let complexity = element.analysis.as_ref().map(|a| a.complexity).unwrap_or(0);
        if complexity > generation::COMPLEX_NEEDS_EXAMPLE && content.examples.is_empty() {
            warnings.push(format!(
                "No examples for a function with complexity {}",
                complexity
            ));
        }
        if duplicates.contains(&element.qualified_name) {
            warnings.push("Duplicate qualified name in this file".to_string());
        }

        let opts = RenderOptions {
            max_line_length: self.settings.max_line_length,
            body_indent: element.span.start_col as usize + 4,
        };
        let formatter = create_formatter(self.settings.style);
        (formatter.render(&content, &opts), warnings)
    }
}

/// Confidence in the generated text quality, discounted for degraded analysis
fn confidence_for(element: &CodeElement) -> f32 {
    match &element.analysis {
        Some(a) if a.degraded => 0.4,
        Some(_) => 0.8,
        None => 0.5,
    }
}

fn duplicate_names(parse: &ParseResult) -> HashSet<String> {
    let mut seen = HashSet::new();
    let mut duplicates = HashSet::new();
    for element in &parse.elements {
        if !seen.insert(element.qualified_name.clone()) {
            duplicates.insert(element.qualified_name.clone());
        }
    }
    duplicates
}

/// Exponential backoff with jitter; a provider-suggested delay wins outright
fn backoff_delay(attempt: u32, suggested: Option<Duration>) -> Duration {
    let base = suggested.unwrap_or_else(|| {
        let exp = f64::from(retry::BACKOFF_FACTOR).powi(attempt as i32);
        let base_ms = (retry::BASE_DELAY_MS as f64 * exp) as u64;
        Duration::from_millis(base_ms.min(retry::MAX_DELAY_SECS * 1000))
    });
    let jitter_ms = rand::rng().random_range(0..=base.as_millis() as u64 / 4 + 1);
    base + Duration::from_millis(jitter_ms)
}

/// Files discovered for a batch, exposed for the check command
pub fn discover(settings: &Settings, root: &Path) -> Result<Vec<PathBuf>> {
    FileScanner::new(root)
        .with_include(settings.include.clone())
        .with_exclude(settings.exclude.clone())
        .with_max_file_size(settings.analysis.max_file_size)
        .scan()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockProvider;
    use crate::types::{ErrorCategory, ProviderError};
    use std::sync::Arc;

    fn orchestrator(provider: MockProvider) -> Orchestrator {
        let mut settings = Settings::default();
        settings.backup = false;
        Orchestrator::new(settings, Arc::new(provider))
    }

    fn cancel_channel() -> (watch::Sender<bool>, watch::Receiver<bool>) {
        watch::channel(false)
    }

    #[tokio::test]
    async fn documents_undocumented_elements() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("m.py");
        std::fs::write(&file, "def one():\n    pass\n\ndef two():\n    pass\n").unwrap();

        let (_tx, rx) = cancel_channel();
        let orch = orchestrator(MockProvider::new());
        let report = orch.process_file(&file, false, rx).await;
        assert_eq!(report.generated, 2);
        assert_eq!(report.failed.len(), 0);
        assert!(report.written);

        let content = std::fs::read_to_string(&file).unwrap();
        assert!(content.contains("\"\"\"One.\"\"\""));
        assert!(content.contains("\"\"\"Two.\"\"\""));
    }

    #[tokio::test]
    async fn documented_sibling_does_not_suppress_others() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("m.py");
        std::fs::write(
            &file,
            "class C:\n    def documented(self):\n        \"\"\"Kept.\"\"\"\n        return 1\n\n    def bare(self):\n        return 2\n",
        )
        .unwrap();

        let (_tx, rx) = cancel_channel();
        let orch = orchestrator(MockProvider::new());
        let report = orch.process_file(&file, false, rx).await;
        // class + bare method generated, documented method skipped
        assert_eq!(report.generated, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.failed.len(), 0);

        let content = std::fs::read_to_string(&file).unwrap();
        assert!(content.contains("\"\"\"Kept.\"\"\""));
    }

    #[tokio::test]
    async fn auth_failure_fails_element_without_retry() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("m.py");
        std::fs::write(&file, "def f():\n    return 1\n").unwrap();

        let provider = MockProvider::failing(ProviderError::new(
            ErrorCategory::Auth,
            "invalid api key",
        ));
        let (_tx, rx) = cancel_channel();
        let orch = orchestrator(provider);
        let report = orch.process_file(&file, false, rx).await;
        assert_eq!(report.generated, 0);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].cause, "authentication");
        // File untouched
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "def f():\n    return 1\n");
    }

    #[tokio::test]
    async fn transient_failures_are_retried() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("m.py");
        std::fs::write(&file, "def f():\n    return 1\n").unwrap();

        let provider = MockProvider::failing_times(
            ProviderError::new(ErrorCategory::Transient, "overloaded")
                .retry_after(Duration::from_millis(1)),
            2,
        );
        let (_tx, rx) = cancel_channel();
        let orch = orchestrator(provider);
        let report = orch.process_file(&file, false, rx).await;
        assert_eq!(report.generated, 1);
        assert!(report.failed.is_empty());
    }

    #[tokio::test]
    async fn private_elements_skipped_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("m.py");
        std::fs::write(&file, "def _hidden():\n    return 1\n").unwrap();

        let (_tx, rx) = cancel_channel();
        let orch = orchestrator(MockProvider::new());
        let report = orch.process_file(&file, false, rx).await;
        assert_eq!(report.generated, 0);
        assert_eq!(report.skipped, 1);
    }

    #[tokio::test]
    async fn dry_run_produces_diff_only() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("m.py");
        let original = "def f():\n    pass\n";
        std::fs::write(&file, original).unwrap();

        let (_tx, rx) = cancel_channel();
        let orch = orchestrator(MockProvider::new());
        let report = orch.process_file(&file, true, rx).await;
        assert!(!report.written);
        assert!(report.diff.as_ref().unwrap().contains("+    \"\"\"F.\"\"\""));
        assert_eq!(std::fs::read_to_string(&file).unwrap(), original);
    }

    #[tokio::test]
    async fn fatal_parse_reports_diagnostic_and_continues() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("broken.py");
        std::fs::write(&file, "def broken(:\n    pass\n").unwrap();

        let (_tx, rx) = cancel_channel();
        let orch = orchestrator(MockProvider::new());
        let report = orch.process_file(&file, false, rx).await;
        assert_eq!(report.generated, 0);
        assert!(report
            .diagnostics
            .iter()
            .any(|(severity, ..)| *severity == Severity::Fatal));
    }

    #[tokio::test]
    async fn cancellation_stops_new_elements() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("m.py");
        std::fs::write(&file, "def a():\n    return 1\n\ndef b():\n    return 2\n").unwrap();

        let (tx, rx) = watch::channel(true);
        let orch = orchestrator(MockProvider::new());
        let report = orch.process_file(&file, false, rx).await;
        drop(tx);
        assert_eq!(report.generated, 0);
    }

    #[tokio::test]
    async fn inline_function_gets_exact_google_docstring() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("m.py");
        std::fs::write(&file, "def add(a, b): return a + b\n").unwrap();

        let provider = MockProvider::returning(
            "Add two numbers.\n\nArgs:\n    a: First number.\n    b: Second number.\n\nReturns:\n    Sum of a and b.",
        );
        let (_tx, rx) = cancel_channel();
        let orch = orchestrator(provider);
        let report = orch.process_file(&file, false, rx).await;
        assert_eq!(report.generated, 1);

        let expected = "def add(a, b):\n    \"\"\"Add two numbers.\n\n    Args:\n        a: First number.\n        b: Second number.\n\n    Returns:\n        Sum of a and b.\n    \"\"\"\n    return a + b\n";
        assert_eq!(std::fs::read_to_string(&file).unwrap(), expected);
    }

    #[tokio::test]
    async fn second_run_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("m.py");
        std::fs::write(&file, "def one():\n    pass\n\ndef two():\n    pass\n").unwrap();

        let (_tx, rx) = cancel_channel();
        let orch = orchestrator(MockProvider::new());
        let first = orch.process_file(&file, false, rx.clone()).await;
        assert_eq!(first.generated, 2);
        let after_first = std::fs::read_to_string(&file).unwrap();

        let second = orch.process_file(&file, false, rx).await;
        assert_eq!(second.generated, 0);
        assert_eq!(second.skipped, 2);
        assert!(!second.written);
        assert_eq!(std::fs::read_to_string(&file).unwrap(), after_first);
    }

    #[tokio::test]
    async fn one_failing_element_does_not_block_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        // Place the file under a `src` marker so the derived module path is `m`
        let src_dir = dir.path().join("src");
        std::fs::create_dir(&src_dir).unwrap();
        let file = src_dir.join("m.py");
        let source: String = (0..10)
            .map(|i| format!("def f{}():\n    pass\n\n", i))
            .collect();
        std::fs::write(&file, &source).unwrap();

        let provider = Arc::new(MockProvider::failing_for(
            "m.f3",
            ProviderError::new(ErrorCategory::Auth, "invalid api key"),
        ));
        let mut settings = Settings::default();
        settings.backup = false;
        let orch = Orchestrator::new(settings, provider.clone());

        let (_tx, rx) = cancel_channel();
        let report = orch.process_file(&file, false, rx).await;
        assert_eq!(report.generated, 9);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].qualified_name, "m.f3");
        assert_eq!(report.failed[0].cause, "authentication");
        assert!(report.written);
        // Auth is terminal: one call per element, no retries
        assert_eq!(provider.call_count(), 10);

        let content = std::fs::read_to_string(&file).unwrap();
        assert!(content.contains("\"\"\"F0.\"\"\""));
        assert!(!content.contains("def f3():\n    \"\"\""));
    }

    #[tokio::test]
    async fn run_covers_every_file_under_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.py"), "def a():\n    pass\n").unwrap();
        std::fs::write(dir.path().join("b.py"), "def b():\n    pass\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not python").unwrap();

        let (_tx, rx) = cancel_channel();
        let orch = orchestrator(MockProvider::new());
        let report = orch.run(dir.path(), false, rx).await.unwrap();
        assert_eq!(report.files.len(), 2);
        assert_eq!(report.generated(), 2);
        assert!(!report.canceled);
        // Reports come back sorted regardless of completion order
        assert!(report.files[0].path < report.files[1].path);
    }

    #[test]
    fn backoff_grows_and_respects_cap() {
        let d0 = backoff_delay(0, None);
        assert!(d0 >= Duration::from_millis(500));
        let d_large = backoff_delay(20, None);
        assert!(d_large <= Duration::from_secs(retry::MAX_DELAY_SECS + retry::MAX_DELAY_SECS / 4 + 1));
    }
}
