//! **stylecard** - Fast local profiler that condenses chat exports into per-author style cards
//!
//! Reads CSV chat exports, folds every message into per-author feature counters,
//! ranks vocabulary with TF-IDF and renders compact voice guides for LLM persona prompts.

/// Command-line interface with clap integration
pub mod cli;

/// Shell completion generation
pub mod completion;

/// Core analytics pipeline - normalization, features, aggregation, statistics and rendering
pub mod core {
    /// Normalizer, tokenizer and word lists
    pub mod text;

    /// Insertion-ordered frequency counter
    pub mod counter;
    pub use counter::Counter;

    /// Per-message feature extractors (punctuation, laughter, emoji, markers, ...)
    pub mod features;

    /// Per-author accumulation into a `Corpus`
    pub mod aggregate;
    pub use aggregate::{AuthorAccumulator, Corpus, FoldOptions, Message};

    /// TF-IDF, cosine similarity, percentiles
    pub mod stats;

    /// Representative, interesting and quote selection
    pub mod select;

    /// Style card payloads and the full report
    pub mod profile;
    pub use profile::{AuthorProfile, ProfileLimits, Report, ReportOptions};

    /// Console, JSON and dump-file output
    pub mod render;

    /// `analyze` command driver
    pub mod analyze;
    pub use analyze::run as analyze_run;
}

/// Infrastructure - configuration, ingestion and input discovery
pub mod infra {
    /// Configuration management with TOML support and env overrides
    pub mod config;
    pub use config::{Config, init as config_init, load_config};

    /// CSV chat-export reader with alias resolution
    pub mod ingest;
    pub use ingest::{AliasTable, CsvSource, IngestError};

    /// Export discovery with ignore/globset
    pub mod walk;
    pub use walk::CsvWalker;
}

// Re-exports for the binary and library consumers
pub use cli::{AppContext, Cli, Commands};
pub use core::{AuthorProfile, Corpus, Message, Report, analyze_run};
pub use infra::{Config, CsvSource, CsvWalker, load_config};
