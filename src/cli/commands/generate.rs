//! Generate Command
//!
//! Run one documentation pass over a file or directory, printing a per-file
//! summary and either writing files or showing diffs.

use std::path::{Path, PathBuf};

use tokio::sync::watch;

use crate::cli::Output;
use crate::config;
use crate::generate::{GenerationReport, Orchestrator};
use crate::provider::create_provider;
use crate::types::{DocStyle, Result, Severity};

pub struct GenerateOptions {
    pub path: PathBuf,
    /// Compute and print diffs without writing any file
    pub dry_run: bool,
    pub style: Option<DocStyle>,
    pub overwrite: bool,
    pub include_private: bool,
    pub concurrency: Option<usize>,
}

pub async fn run(config_path: Option<&Path>, opts: GenerateOptions) -> Result<GenerationReport> {
    let mut settings = config::load(config_path)?;
    if let Some(style) = opts.style {
        settings.style = style;
    }
    if opts.overwrite {
        settings.overwrite = true;
    }
    if opts.include_private {
        settings.include_private = true;
    }
    if let Some(concurrency) = opts.concurrency {
        settings.concurrency = concurrency;
    }
    settings.validate()?;

    let out = Output::new();
    let provider = create_provider(&settings)?;
    out.info(&format!(
        "Provider: {} ({}), style: {}",
        provider.name(),
        provider.model(),
        settings.style
    ));

    // Ctrl-C flips the cancel flag; in-flight files finish, nothing new starts
    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("cancellation requested, finishing in-flight work");
            let _ = cancel_tx.send(true);
        }
    });

    let orchestrator = Orchestrator::new(settings, provider);
    let report = orchestrator.run(&opts.path, opts.dry_run, cancel_rx).await?;
    print_report(&out, &report, opts.dry_run);
    Ok(report)
}

fn print_report(out: &Output, report: &GenerationReport, dry_run: bool) {
    for file in &report.files {
        for (severity, message, line, column) in &file.diagnostics {
            let location = format!("{}:{}:{}: {}", file.path, line, column, message);
            match severity {
                Severity::Warning => out.warning(&location),
                _ => out.error(&location),
            }
        }
        for failed in &file.failed {
            out.error(&format!("{}: {}", failed.qualified_name, failed.cause));
        }
        for doc in &file.docs {
            for warning in &doc.warnings {
                out.warning(&format!("{}: {}", doc.qualified_name, warning));
            }
        }
        if let Some(diff) = &file.diff {
            out.section(&file.path);
            out.diff(diff);
        }
    }

    out.section("Summary");
    let verb = if dry_run { "would document" } else { "documented" };
    out.success(&format!(
        "{} {} element(s), skipped {}, failed {}",
        verb,
        report.generated(),
        report.skipped(),
        report.failed()
    ));
    if report.cost_estimate() > 0.0 {
        out.info(&format!("Estimated cost: ${:.4}", report.cost_estimate()));
    }
    if report.canceled {
        out.warning("Run was canceled before completing");
    }
}
