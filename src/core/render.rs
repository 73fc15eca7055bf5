//! Text and JSON rendering of a `Report`, plus per-author dump files.

use std::{fmt::Write as _, fs, path::Path};

use anyhow::{Context, Result};
use clap::ValueEnum;
use itertools::Itertools;
use owo_colors::OwoColorize;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::core::profile::{AuthorProfile, Report};

/// Output format for stdout and dump files
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat
{
    #[default]
    Text,
    Json,
}

impl OutputFormat
{
    pub fn extension(self) -> &'static str
    {
        match self
        {
            OutputFormat::Text => "txt",
            OutputFormat::Json => "json",
        }
    }
}

/// Console rendering knobs
#[derive(Debug, Clone, Default)]
pub struct ConsoleOptions
{
    /// Style cards to print
    pub top: usize,
    /// Quotes shown per card and for the focus user
    pub quotes_per_user: usize,
    /// Display-name substring to spotlight
    pub focus: Option<String>,
    pub color: bool,
}

/// Char-boundary safe prefix of at most `max` characters
fn clip(
    s: &str,
    max: usize,
) -> &str
{
    match s
        .char_indices()
        .nth(max)
    {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

fn counts<T: std::fmt::Display>(items: &[(String, T)]) -> String
{
    if items.is_empty()
    {
        return "-".to_string();
    }

    items
        .iter()
        .map(|(k, v)| format!("{k} ({v})"))
        .join(", ")
}

fn hours(p: &AuthorProfile) -> String
{
    if p.hour_peaks
        .is_empty()
    {
        return "-".to_string();
    }

    p.hour_peaks
        .iter()
        .join(", ")
}

/// Replace anything outside `[A-Za-z0-9._-]` so a display name is a safe file stem
pub fn sanitize_filename(name: &str) -> String
{
    let mut out = String::with_capacity(name.len());
    let mut in_bad_run = false;

    for c in name
        .trim()
        .chars()
    {
        if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
        {
            out.push(c);
            in_bad_run = false;
        }
        else if !in_bad_run
        {
            out.push('_');
            in_bad_run = true;
        }
    }

    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() { "user".to_string() } else { trimmed.to_string() }
}

/// Full plain-text card for one author (used for dump files)
pub fn render_author_card(p: &AuthorProfile) -> String
{
    let mut lines = vec![
        format!("author: {} ({})", p.author, p.author_id),
        format!("messages: {}", p.messages),
        format!(
            "volume: avg_words {}, median_words {}, p90_words {}, avg_chars {}, p90_chars {}",
            p.avg_words, p.median_words, p.p90_words, p.avg_chars, p.p90_chars
        ),
        format!(
            "lexical: ttr {}, hapax {}, caps/msg {}",
            p.lexical_diversity, p.hapax_ratio, p.caps_rate
        ),
        format!("sentences: avg_words {}", p.avg_sentence_words),
        format!(
            "words: avg_len {}, variety {}, typos/msg {}",
            p.avg_word_length, p.word_variety, p.typo_rate
        ),
        format!(
            "tokens: {}",
            p.top_tokens
                .iter()
                .map(|(t, w)| format!("{t} ({w:.3})"))
                .join(", ")
        ),
        format!("char_trigrams: {}", counts(&p.top_char_trigrams)),
        format!("style_markers: {}", counts(&p.style_markers)),
        format!("laughter: {}", counts(&p.laughter)),
        format!("emoji: {}", counts(&p.emoji)),
        format!("openers: {} | {}", counts(&p.openers1), counts(&p.openers2)),
        format!("closers: {} | {}", counts(&p.closers1), counts(&p.closers2)),
        format!(
            "cadence: {} | repeats {} | ?/msg {} !/msg {} .../msg {}",
            counts(&p.punct),
            counts(&p.repeat_punct),
            p.question_rate,
            p.exclaim_rate,
            p.ellipsis_rate
        ),
        format!(
            "formatting: links/msg {} mentions/msg {} quotes/msg {} code/msg {} multiline/msg {} \
             stretch/msg {} shout/msg {}",
            p.link_rate,
            p.mention_rate,
            p.quote_rate,
            p.code_rate,
            p.multiline_rate,
            p.stretch_rate,
            p.shout_rate
        ),
        format!("hours: {}", hours(p)),
    ];

    if !p
        .mentions
        .is_empty()
    {
        lines.push(format!("mentions: {}", counts(&p.mentions)));
    }
    if let Some(rep) = &p.representative
    {
        lines.push(format!("representative: {rep}"));
    }
    if !p
        .interesting_messages
        .is_empty()
    {
        lines.push("interesting:".to_string());
        for (i, (msg, score)) in p
            .interesting_messages
            .iter()
            .enumerate()
        {
            lines.push(format!("{:2}. ({:.3}) {msg}", i + 1, score));
        }
    }
    if !p
        .quotes
        .is_empty()
    {
        lines.push("quotes:".to_string());
        for (q, c) in &p.quotes
        {
            lines.push(format!("- \"{q}\" ({c})"));
        }
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Compact style card used in the console overview
fn render_console_card(
    out: &mut String,
    idx: usize,
    p: &AuthorProfile,
    opts: &ConsoleOptions,
) -> std::fmt::Result
{
    let title = if opts.color
    {
        p.author
            .bold()
            .to_string()
    }
    else
    {
        p.author
            .clone()
    };
    writeln!(out, "{idx}. {title}")?;
    writeln!(
        out,
        "   volume      : {} msgs | avg {:.1}w | median {:.1}w | p90 {:.1}w | p90 chars {:.0}",
        p.messages, p.avg_words, p.median_words, p.p90_words, p.p90_chars
    )?;
    writeln!(
        out,
        "   lexical     : ttr {:.2} | hapax {:.2} | caps/msg {:.2}",
        p.lexical_diversity, p.hapax_ratio, p.caps_rate
    )?;
    writeln!(out, "   sentences   : avg {:.2} words", p.avg_sentence_words)?;
    writeln!(
        out,
        "   words       : avg_len {:.2} | variety {} | typos/msg {:.2}",
        p.avg_word_length, p.word_variety, p.typo_rate
    )?;
    writeln!(
        out,
        "   tokens      : {}",
        p.top_tokens
            .iter()
            .map(|(t, w)| format!("{t} ({w:.2})"))
            .join(", ")
    )?;
    writeln!(out, "   char3       : {}", counts(&p.top_char_trigrams))?;
    writeln!(out, "   markers     : {}", counts(&p.style_markers))?;
    writeln!(out, "   laughter    : {}", counts(&p.laughter))?;
    writeln!(out, "   emoji       : {}", counts(&p.emoji))?;
    writeln!(out, "   openers     : {} | {}", counts(&p.openers1), counts(&p.openers2))?;
    writeln!(out, "   closers     : {} | {}", counts(&p.closers1), counts(&p.closers2))?;
    writeln!(
        out,
        "   cadence     : {} | repeats {} | ?/msg {:.2} !/msg {:.2} .../msg {:.2}",
        counts(&p.punct),
        counts(&p.repeat_punct),
        p.question_rate,
        p.exclaim_rate,
        p.ellipsis_rate
    )?;
    writeln!(
        out,
        "   formatting  : links/msg {:.2} | mentions/msg {:.2} | quotes/msg {:.2} | code/msg {:.2} \
         | multiline/msg {:.2} | stretch/msg {:.2} | shout/msg {:.2} | hours {}",
        p.link_rate,
        p.mention_rate,
        p.quote_rate,
        p.code_rate,
        p.multiline_rate,
        p.stretch_rate,
        p.shout_rate,
        hours(p)
    )?;

    if !p
        .mentions
        .is_empty()
    {
        writeln!(out, "   mentions    : {}", counts(&p.mentions))?;
    }
    if let Some(rep) = &p.representative
    {
        writeln!(out, "   rep         : {}", clip(rep, 160))?;
    }
    if !p
        .interesting_messages
        .is_empty()
    {
        let snippets = p
            .interesting_messages
            .iter()
            .map(|(m, s)| format!("\"{}\" ({s:.2})", clip(m, 120)))
            .join("; ");
        writeln!(out, "   interesting : {snippets}")?;
    }
    if !p
        .quotes
        .is_empty()
    {
        let quotes = p
            .quotes
            .iter()
            .take(opts.quotes_per_user)
            .map(|(q, c)| format!("\"{q}\" ({c})"))
            .join("; ");
        writeln!(out, "   quotes      : {quotes}")?;
    }
    writeln!(out)
}

/// Human-readable overview: summary line, top style cards, neighbours, focus user
pub fn render_console(
    report: &Report,
    opts: &ConsoleOptions,
) -> String
{
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = write_console(&mut out, report, opts);
    out
}

fn write_console(
    out: &mut String,
    report: &Report,
    opts: &ConsoleOptions,
) -> std::fmt::Result
{
    let s = &report.summary;
    writeln!(
        out,
        "Analyzed {} messages from {} authors across {} file(s).",
        s.messages, s.authors, s.files
    )?;

    let heading = |t: &str| if opts.color { t.cyan().bold().to_string() } else { t.to_string() };

    writeln!(out, "\n{}", heading("Style cards (LLM-ready voice guide):"))?;
    for (i, p) in report
        .authors
        .iter()
        .take(opts.top)
        .enumerate()
    {
        render_console_card(out, i + 1, p, opts)?;
    }

    writeln!(out, "{}", heading("Nearest stylistic neighbors (TF-IDF cosine):"))?;
    for n in report
        .neighbors
        .iter()
        .take(opts.top)
    {
        let near = n
            .nearest
            .iter()
            .map(|(name, sim)| format!("{name} ({sim:.2})"))
            .join(", ");
        writeln!(out, "- {} -> {near}", n.author)?;
    }

    if let Some(needle) = &opts.focus
    {
        match report.focus(needle)
        {
            Some(p) =>
            {
                writeln!(out, "\nFocus user: {}", p.author)?;
                for (q, c) in p
                    .quotes
                    .iter()
                    .take(opts.quotes_per_user)
                {
                    writeln!(out, "  \"{q}\" ({c})")?;
                }
            }
            None => writeln!(out, "\nFocus user '{needle}' not found.")?,
        }
    }

    Ok(())
}

/// JSON document with the summary, the first `top` profiles and their neighbours
pub fn render_json(
    report: &Report,
    top: usize,
) -> Result<String>
{
    let authors = &report.authors[..top.min(
        report
            .authors
            .len(),
    )];
    let neighbors = &report.neighbors[..top.min(
        report
            .neighbors
            .len(),
    )];

    let doc = json!({
        "summary": report.summary,
        "authors": authors,
        "neighbors": neighbors,
    });

    serde_json::to_string_pretty(&doc).context("Failed to serialize report")
}

/// Write one file per profiled author into `dir`. Returns the number written.
pub fn write_dump(
    report: &Report,
    dir: &Path,
    format: OutputFormat,
) -> Result<usize>
{
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create dump dir {}", dir.display()))?;

    for p in &report.authors
    {
        let stem = sanitize_filename(if p.author.is_empty() { &p.author_id } else { &p.author });
        let path = dir.join(format!("{stem}.{}", format.extension()));

        let body = match format
        {
            OutputFormat::Json =>
            {
                serde_json::to_string_pretty(p).context("Failed to serialize author profile")?
            }
            OutputFormat::Text => render_author_card(p),
        };

        fs::write(&path, body).with_context(|| format!("Failed to write {}", path.display()))?;
    }

    info!(files = report.authors.len(), dir = %dir.display(), "wrote author dumps");
    Ok(report
        .authors
        .len())
}
