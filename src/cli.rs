use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::core::render::OutputFormat;

/// Shared application context for global flags
#[derive(Clone, Debug)]
pub struct AppContext {
    pub quiet: bool,    // global --quiet
    pub no_color: bool, // global --no-color
}

#[derive(Parser)]
#[command(name = "stylecard")]
#[command(
    about = "Condense chat exports into dense per-author style cards for LLM persona prompts"
)]
#[command(version, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Suppress progress bars and non-essential output
    #[arg(long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Profile every author in a set of CSV chat exports
    Analyze(AnalyzeArgs),

    /// Initialize a stylecard.toml config file
    Init(InitArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Options for `analyze`; anything left unset falls back to the config file
#[derive(Debug, Clone, Default, Args)]
pub struct AnalyzeArgs {
    /// Root directory holding one sub-directory of CSV exports per guild
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Guild directory under the data dir ("all" for every guild)
    #[arg(short, long)]
    pub guild: Option<String>,

    /// Analyze every guild under the data dir
    #[arg(long)]
    pub all: bool,

    /// Keep messages from bot accounts
    #[arg(long)]
    pub include_bots: bool,

    /// Number of style cards to print
    #[arg(long)]
    pub top: Option<usize>,

    /// Quotes kept per author
    #[arg(long)]
    pub quotes_per_user: Option<usize>,

    /// Minimum words for a message to count as a quote
    #[arg(long)]
    pub min_quote_words: Option<usize>,

    /// Skip authors with fewer qualifying messages
    #[arg(long)]
    pub min_messages: Option<usize>,

    /// Print quotes for the first author whose name contains this (case-insensitive)
    #[arg(long)]
    pub focus_user: Option<String>,

    /// Stdout format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Write one file per profiled author
    #[arg(long)]
    pub dump: bool,

    /// Directory for --dump output
    #[arg(long)]
    pub dump_dir: Option<PathBuf>,

    /// File format for --dump output
    #[arg(long, value_enum)]
    pub dump_format: Option<OutputFormat>,
}

#[derive(Parser)]
pub struct InitArgs {
    /// Directory to initialize config in
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Overwrite existing config file
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Parser)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,

    /// Output directory; if omitted and --stdout not set, prints error
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Print completion script to stdout instead of a file
    #[arg(long)]
    pub stdout: bool,
}
