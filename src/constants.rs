//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Retry/backoff constants for provider calls
pub mod retry {
    /// Default maximum retries per element
    pub const DEFAULT_MAX_RETRIES: u32 = 3;

    /// Base delay for exponential backoff (milliseconds)
    pub const BASE_DELAY_MS: u64 = 500;

    /// Maximum delay between retries (seconds)
    pub const MAX_DELAY_SECS: u64 = 30;

    /// Backoff multiplier
    pub const BACKOFF_FACTOR: f32 = 2.0;
}

/// Code analysis thresholds
pub mod analysis {
    /// Maximum file size to parse (1MB)
    pub const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Lines above which a function is flagged as a long method
    pub const LONG_METHOD_LINES: usize = 100;

    /// Complexity above which a function is flagged
    pub const HIGH_COMPLEXITY: u32 = 15;

    /// Parameter count above which a function is flagged
    pub const MAX_PARAMETERS: usize = 5;

    /// Distinct magic-number literals tolerated before flagging
    pub const MAGIC_NUMBER_LIMIT: usize = 3;

    /// Methods above which a class is flagged as a god class
    pub const GOD_CLASS_METHODS: usize = 20;
}

/// Type-inference confidence scores
pub mod confidence {
    /// Explicit evidence (literals, isinstance checks, consistent returns)
    pub const HIGH: f32 = 0.9;

    /// Clear usage patterns (method calls, operators)
    pub const MEDIUM: f32 = 0.6;

    /// Naming-convention guesses
    pub const LOW: f32 = 0.3;

    /// No usable evidence
    pub const UNKNOWN: f32 = 0.1;
}

/// Docstring formatting constants
pub mod format {
    /// Default maximum line length for rendered docstrings
    pub const DEFAULT_MAX_LINE_LENGTH: usize = 88;

    /// One standard indentation unit
    pub const INDENT_UNIT: &str = "    ";

    /// Placeholder description when the provider gives none
    pub const MISSING_DESCRIPTION: &str = "Description needed";
}

/// Generation orchestration constants
pub mod generation {
    /// Default number of files processed concurrently
    pub const DEFAULT_CONCURRENCY: usize = 4;

    /// Maximum related sibling elements included in a context bundle
    pub const RELATED_CONTEXT_LIMIT: usize = 3;

    /// Word count below which a generated docstring is considered brief
    pub const BRIEF_DOCSTRING_WORDS: usize = 10;

    /// Complexity above which missing examples produce a warning
    pub const COMPLEX_NEEDS_EXAMPLE: u32 = 10;
}

/// HTTP/Network constants
pub mod network {
    /// Default request timeout (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

    /// Connection timeout (seconds)
    pub const CONNECTION_TIMEOUT_SECS: u64 = 30;

    /// Default max tokens requested from a provider
    pub const DEFAULT_MAX_TOKENS: u32 = 2000;
}
