//! DocPilot - Python Docstring Generator
//!
//! Parses Python source with tree-sitter, analyzes each function, class, and
//! method, asks a provider for docstring text, and splices the rendered
//! docstring back into the file byte-for-byte outside the insertion site.
//!
//! ## Quick Start
//!
//! ```ignore
//! use docpilot::config::Settings;
//! use docpilot::generate::Orchestrator;
//! use docpilot::provider::create_provider;
//!
//! let settings = docpilot::config::load(None)?;
//! let provider = create_provider(&settings)?;
//! let orchestrator = Orchestrator::new(settings, provider);
//! let report = orchestrator.run(path, false, cancel_rx).await?;
//! ```
//!
//! ## Modules
//!
//! - [`analyzer`]: tree-sitter parsing, file discovery, complexity and types
//! - [`format`]: interchangeable docstring rendering styles
//! - [`edit`]: byte-precise docstring insertion and file writing
//! - [`provider`]: docstring text backends behind one trait
//! - [`generate`]: the orchestrator driving the whole pipeline

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod constants;
pub mod edit;
pub mod format;
pub mod generate;
pub mod provider;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{ProviderSettings, Settings};

// Error Types
pub use types::error::{DocError, ErrorCategory, ProviderError, Result};

// Analysis
pub use analyzer::{Analyzer, FileScanner, ProjectReport, PythonParser};

// Pipeline
pub use generate::{FileReport, GenerationReport, Orchestrator};
pub use provider::{DocProvider, GenerationContext, MockProvider, SharedProvider, create_provider};

// Rendering and insertion
pub use edit::{InsertMode, InsertionEngine};
pub use format::{DocFormatter, RenderOptions, create_formatter};
pub use types::{CodeElement, DocStyle, ElementId, ElementKind, GeneratedDoc, ParseResult};
