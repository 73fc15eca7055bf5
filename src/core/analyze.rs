//! `analyze` command: discover exports, fold them into a corpus, build the
//! report and print or dump it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::{info, instrument};

use crate::{
    cli::{AnalyzeArgs, AppContext},
    core::{
        aggregate::{Corpus, Message},
        profile::Report,
        render::{self, ConsoleOptions, OutputFormat},
    },
    infra::{
        config::{Config, load_config},
        ingest::{CsvSource, IngestError},
        walk::{CsvWalker, export_root},
    },
};

/// Fold CLI flags over the loaded config; flags win
pub fn apply_overrides(
    config: &mut Config,
    args: &AnalyzeArgs,
)
{
    if let Some(dir) = &args.data_dir
    {
        config
            .ingest
            .data_dir
            .clone_from(dir);
    }
    if args.include_bots
    {
        config
            .ingest
            .include_bots = true;
    }
    if let Some(n) = args.min_quote_words
    {
        config
            .analysis
            .min_quote_words = n;
    }
    if let Some(n) = args.min_messages
    {
        config
            .analysis
            .min_messages = n;
    }
    if let Some(n) = args.top
    {
        config
            .output
            .top = n;
    }
    if let Some(n) = args.quotes_per_user
    {
        config
            .output
            .limits
            .quotes = n;
    }
    if let Some(f) = args.format
    {
        config
            .output
            .format = f;
    }
    if let Some(dir) = &args.dump_dir
    {
        config
            .output
            .dump_dir
            .clone_from(dir);
    }
    if let Some(f) = args.dump_format
    {
        config
            .output
            .dump_format = f;
    }
}

/// Expand `~` and `$VARS` in a configured path
pub fn expand_path(path: &Path) -> Result<PathBuf>
{
    let raw = path.to_string_lossy();
    let expanded = shellexpand::full(&raw)
        .with_context(|| format!("Failed to expand path {raw}"))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

fn progress_bar(
    len: usize,
    ctx: &AppContext,
) -> ProgressBar
{
    if ctx.quiet
    {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}

/// Read every export and fold it into a corpus.
///
/// Files are parsed in parallel but folded in path order, so the result does
/// not depend on thread scheduling.
#[instrument(skip_all, fields(files = files.len()))]
pub fn ingest(
    files: &[PathBuf],
    config: &Config,
    progress: &ProgressBar,
) -> Result<Corpus, IngestError>
{
    let source = CsvSource::new(config.alias_table());

    let batches: Vec<Vec<Message>> = files
        .par_iter()
        .map(|path| {
            let rows = source.read_path(path);
            progress.inc(1);
            rows
        })
        .collect::<Result<_, _>>()?;

    let mut corpus = Corpus::new(config.fold_options());
    for batch in &batches
    {
        corpus.extend(batch);
    }

    info!(
        messages = corpus.message_total(),
        authors = corpus.author_count(),
        "corpus folded"
    );
    Ok(corpus)
}

/// Everything after option resolution: discover, ingest, build the report
pub fn build_report(
    config: &Config,
    guild: Option<&str>,
    all: bool,
    ctx: &AppContext,
) -> Result<Report>
{
    let data_dir = expand_path(&config.ingest.data_dir)?;
    let root = export_root(&data_dir, guild, all);

    let walker = CsvWalker::new(&config.ingest.ignore)
        .context("Invalid ingest.ignore pattern")?
        .with_respect_gitignore(config.ingest.respect_gitignore)
        .with_include_hidden(config.ingest.include_hidden)
        .with_max_depth(config.ingest.max_depth);
    let files = walker.walk(&root);
    if files.is_empty()
    {
        return Err(IngestError::NoInputs { root }.into());
    }

    let pb = progress_bar(files.len(), ctx);
    pb.set_message("reading exports");
    let corpus = ingest(&files, config, &pb)?;
    pb.finish_and_clear();

    Ok(Report::build(&corpus, &config.report_options(), files.len()))
}

pub fn run(
    args: AnalyzeArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let mut config = load_config()?;
    apply_overrides(&mut config, &args);

    let report = build_report(&config, args.guild.as_deref(), args.all, ctx)?;

    // --dump-dir implies --dump
    if args.dump || args.dump_dir.is_some()
    {
        let dir = expand_path(&config.output.dump_dir)?;
        let written = render::write_dump(&report, &dir, config.output.dump_format)?;
        if !ctx.quiet
        {
            eprintln!("Wrote {written} author file(s) to {}", dir.display());
        }
    }

    let out = match config
        .output
        .format
    {
        OutputFormat::Json => render::render_json(&report, config.output.top)?,
        OutputFormat::Text => render::render_console(
            &report,
            &ConsoleOptions {
                top: config.output.top,
                quotes_per_user: config
                    .output
                    .limits
                    .quotes,
                focus: args.focus_user,
                color: !ctx.no_color,
            },
        ),
    };
    println!("{out}");

    Ok(())
}

#[cfg(test)]
mod tests
{
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn ctx() -> AppContext
    {
        AppContext { quiet: true, no_color: true }
    }

    #[test]
    fn test_overrides_win_over_config()
    {
        let mut cfg = Config::default();
        let args = AnalyzeArgs {
            data_dir: Some(PathBuf::from("/exports")),
            include_bots: true,
            top: Some(2),
            quotes_per_user: Some(4),
            min_messages: Some(1),
            format: Some(OutputFormat::Json),
            ..AnalyzeArgs::default()
        };
        apply_overrides(&mut cfg, &args);

        assert_eq!(cfg.ingest.data_dir, PathBuf::from("/exports"));
        assert!(cfg.ingest.include_bots);
        assert_eq!(cfg.output.top, 2);
        assert_eq!(cfg.output.limits.quotes, 4);
        assert_eq!(cfg.analysis.min_messages, 1);
        assert_eq!(cfg.analysis.min_quote_words, 2);
        assert_eq!(cfg.output.format, OutputFormat::Json);
    }

    #[test]
    fn test_expand_path_leaves_plain_paths()
    {
        assert_eq!(expand_path(Path::new("data/x")).unwrap(), PathBuf::from("data/x"));
    }

    #[test]
    fn test_build_report_across_guilds()
    {
        let tmp = TempDir::new().unwrap();
        let header = "author.id,author.global_name,author.bot,timestamp,content\n";
        fs::create_dir_all(tmp.path().join("g1")).unwrap();
        fs::create_dir_all(tmp.path().join("g2")).unwrap();
        fs::write(
            tmp.path()
                .join("g1/a.csv"),
            format!("{header}1,Ann,false,2024-01-01T10:00:00Z,hello there friend\n9,Bot,true,,beep beep\n"),
        )
        .unwrap();
        fs::write(
            tmp.path()
                .join("g2/b.csv"),
            format!("{header}1,Ann,false,,another one here\n2,Bo,false,,what is up\n"),
        )
        .unwrap();

        let mut cfg = Config::default();
        cfg.ingest.data_dir = tmp.path().to_path_buf();
        cfg.analysis.min_messages = 1;

        let all = build_report(&cfg, None, false, &ctx()).unwrap();
        assert_eq!(all.summary.files, 2);
        assert_eq!(all.summary.messages, 3);
        assert_eq!(all.authors[0].author, "Ann");
        assert_eq!(all.authors[0].hour_peaks, vec![10]);

        let one = build_report(&cfg, Some("g2"), false, &ctx()).unwrap();
        assert_eq!(one.summary.files, 1);
        assert_eq!(one.summary.authors, 2);

        cfg.ingest.include_bots = true;
        let with_bots = build_report(&cfg, Some("all"), false, &ctx()).unwrap();
        assert_eq!(with_bots.summary.messages, 4);
    }

    #[test]
    fn test_discovery_honours_hidden_and_depth()
    {
        let tmp = TempDir::new().unwrap();
        let header = "author.id,author.global_name,content\n";
        fs::create_dir_all(tmp.path().join("g/nested")).unwrap();
        fs::create_dir_all(tmp.path().join(".backup")).unwrap();
        for rel in ["g/top.csv", "g/nested/deep.csv", ".backup/old.csv"]
        {
            fs::write(
                tmp.path()
                    .join(rel),
                format!("{header}1,Ann,hello there friend\n"),
            )
            .unwrap();
        }

        let mut cfg = Config::default();
        cfg.ingest.data_dir = tmp.path().to_path_buf();
        cfg.analysis.min_messages = 1;

        assert_eq!(build_report(&cfg, None, false, &ctx()).unwrap().summary.files, 2);

        cfg.ingest.include_hidden = true;
        assert_eq!(build_report(&cfg, None, false, &ctx()).unwrap().summary.files, 3);

        cfg.ingest.include_hidden = false;
        cfg.ingest.max_depth = Some(2);
        let shallow = build_report(&cfg, None, false, &ctx()).unwrap();
        assert_eq!(shallow.summary.files, 1);
        assert_eq!(shallow.summary.messages, 1);
    }

    #[test]
    fn test_no_inputs_is_an_ingest_error()
    {
        let tmp = TempDir::new().unwrap();
        let mut cfg = Config::default();
        cfg.ingest.data_dir = tmp.path().to_path_buf();

        let err = build_report(&cfg, None, false, &ctx()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<IngestError>(),
            Some(IngestError::NoInputs { .. })
        ));
    }
}
