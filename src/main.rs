use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docpilot::cli::commands;
use docpilot::cli::commands::generate::GenerateOptions;
use docpilot::types::DocStyle;

/// Parse docstring style from string
fn parse_style(s: &str) -> Result<DocStyle, String> {
    s.parse::<DocStyle>()
}

#[derive(Parser)]
#[command(name = "docpilot")]
#[command(version, about = "AI-assisted docstring generator for Python codebases")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, short, help = "Path to a docpilot.toml config file")]
    config: Option<PathBuf>,

    #[arg(long)]
    verbose: bool,

    #[arg(long, short)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate docstrings for a file or directory
    Generate {
        #[arg(help = "File or directory to document", default_value = ".")]
        path: PathBuf,
        #[arg(long = "dry-run", visible_alias = "diff", help = "Show diffs without writing files")]
        dry_run: bool,
        #[arg(long, value_parser = parse_style, help = "Docstring style: google, numpy, sphinx, rest, epytext")]
        style: Option<DocStyle>,
        #[arg(long, help = "Regenerate existing docstrings too")]
        overwrite: bool,
        #[arg(long, help = "Include underscore-prefixed elements")]
        include_private: bool,
        #[arg(long, help = "Number of files processed concurrently")]
        concurrency: Option<usize>,
    },

    /// Report docstring coverage without changing anything
    Check {
        #[arg(help = "File or directory to inspect", default_value = ".")]
        path: PathBuf,
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, json"
        )]
        format: String,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show resolved configuration (defaults, file, and environment merged)
    Show {
        #[arg(
            short = 'f',
            long,
            default_value = "toml",
            help = "Output format: toml, json"
        )]
        format: String,
    },
    /// Write a starter docpilot.toml in the current directory
    Init {
        #[arg(long, help = "Overwrite an existing config file")]
        force: bool,
    },
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mdocpilot encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }

        // Call default hook for backtrace (if RUST_BACKTRACE=1)
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Generate {
            path,
            dry_run,
            style,
            overwrite,
            include_private,
            concurrency,
        } => {
            let rt = Runtime::new()?;
            let report = rt.block_on(commands::generate::run(
                config_path,
                GenerateOptions {
                    path,
                    dry_run,
                    style,
                    overwrite,
                    include_private,
                    concurrency,
                },
            ))?;
            if report.failed() > 0 {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Check { path, format } => {
            commands::check::run(config_path, &path, &format)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { format } => {
                commands::config::show(config_path, &format)?;
            }
            ConfigAction::Init { force } => {
                commands::config::init(force)?;
            }
        },
    }

    Ok(ExitCode::SUCCESS)
}
