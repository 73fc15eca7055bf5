use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    cli::{AppContext, InitArgs},
    core::{
        aggregate::FoldOptions,
        features::DEFAULT_SHOUT_THRESHOLD,
        profile::{ProfileLimits, ReportOptions},
        render::OutputFormat,
        select::INTERESTING_MIN_TOKENS,
    },
    infra::ingest::AliasTable,
};

/// Config files probed in the working directory, first hit wins
pub const CONFIG_FILES: [&str; 4] =
    ["stylecard.toml", "stylecard.yaml", "stylecard.json", ".stylecard.toml"];

/// Environment prefix; nested keys use `__` (e.g. `STYLECARD__OUTPUT__TOP=5`)
pub const ENV_PREFIX: &str = "STYLECARD";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config
{
    /// Where exports live and which rows to admit
    pub ingest: IngestConfig,

    /// Thresholds that change what gets counted
    pub analysis: AnalysisConfig,

    /// How much of the report to print or dump
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig
{
    pub data_dir: PathBuf,
    pub include_bots: bool,
    pub respect_gitignore: bool,
    /// Also read exports under dot-directories
    pub include_hidden: bool,
    /// Discovery depth below the export root (unbounded when unset)
    pub max_depth: Option<usize>,
    /// Extra glob patterns skipped during discovery
    pub ignore: Vec<String>,
    /// Only analyze aliased author ids (when any aliases exist)
    pub restrict_to_aliases: bool,
    /// author id -> display name
    pub aliases: IndexMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig
{
    pub min_quote_words: usize,
    pub min_messages: usize,
    pub shout_threshold: f64,
    pub interesting_min_tokens: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig
{
    /// Style cards shown on stdout
    pub top: usize,
    pub format: OutputFormat,
    pub dump_dir: PathBuf,
    pub dump_format: OutputFormat,
    pub limits: ProfileLimits,
}

impl Default for IngestConfig
{
    fn default() -> Self
    {
        Self {
            data_dir: PathBuf::from("data"),
            include_bots: false,
            respect_gitignore: false,
            include_hidden: false,
            max_depth: None,
            ignore: Vec::new(),
            restrict_to_aliases: true,
            aliases: IndexMap::new(),
        }
    }
}

impl Default for AnalysisConfig
{
    fn default() -> Self
    {
        Self {
            min_quote_words: 2,
            min_messages: 100,
            shout_threshold: DEFAULT_SHOUT_THRESHOLD,
            interesting_min_tokens: INTERESTING_MIN_TOKENS,
        }
    }
}

impl Default for OutputConfig
{
    fn default() -> Self
    {
        Self {
            top: 8,
            format: OutputFormat::Text,
            dump_dir: PathBuf::from("out"),
            dump_format: OutputFormat::Text,
            limits: ProfileLimits::default(),
        }
    }
}

impl Config
{
    pub fn alias_table(&self) -> AliasTable
    {
        AliasTable::new(
            self.ingest
                .aliases
                .clone(),
            self.ingest
                .restrict_to_aliases,
        )
    }

    pub fn fold_options(&self) -> FoldOptions
    {
        FoldOptions {
            min_quote_words: self
                .analysis
                .min_quote_words,
            shout_threshold: self
                .analysis
                .shout_threshold,
            include_bots: self
                .ingest
                .include_bots,
        }
    }

    pub fn report_options(&self) -> ReportOptions
    {
        ReportOptions {
            min_messages: self
                .analysis
                .min_messages,
            min_quote_words: self
                .analysis
                .min_quote_words,
            interesting_min_tokens: self
                .analysis
                .interesting_min_tokens,
            limits: self
                .output
                .limits,
        }
    }
}

/// Load configuration from the working directory plus `STYLECARD__*` env vars
pub fn load_config() -> Result<Config>
{
    load_config_from(Path::new("."))
}

/// Load configuration, probing `dir` for config files
pub fn load_config_from(dir: &Path) -> Result<Config>
{
    let mut builder = config::Config::builder();

    if let Some(path) = CONFIG_FILES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
    {
        debug!(path = %path.display(), "loading config file");
        builder = builder.add_source(config::File::from(path));
    }

    builder = builder.add_source(
        config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    let cfg = builder
        .build()
        .context("Failed to load configuration")?;
    let parsed: Config = cfg
        .try_deserialize()
        .context("Failed to parse configuration")?;

    Ok(parsed)
}

pub fn init(
    args: InitArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let config_path = args
        .path
        .join(CONFIG_FILES[0]);

    if config_path.exists() && !args.force
    {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    let config = Config::default();
    let toml_string =
        toml::to_string_pretty(&config).context("Failed to serialize default config")?;

    std::fs::write(&config_path, toml_string).context("Failed to write config file")?;

    if !ctx.quiet
    {
        println!("Created config file at {}", config_path.display());
    }
    Ok(())
}
