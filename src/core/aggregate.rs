//! Per-author accumulation.
//!
//! `Corpus` owns one `AuthorAccumulator` per author key and is the only place
//! accumulators are mutated. Statistics and selection read a finished corpus.

use chrono::{DateTime, FixedOffset, Timelike};
use indexmap::IndexMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::core::{
    counter::Counter,
    features::{self, DEFAULT_SHOUT_THRESHOLD},
    text::{lexical_tokens, normalize, surface_words},
};

/// One ingested chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message
{
    /// Stable identity key
    pub author_id: String,
    /// Display label (already alias-resolved by ingestion)
    pub author_name: String,
    /// Raw text, may contain newlines and markup
    pub content: String,
    pub is_bot: bool,
    pub timestamp: Option<DateTime<FixedOffset>>,
}

impl Message
{
    pub fn new(
        author_id: impl Into<String>,
        author_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self
    {
        Self {
            author_id: author_id.into(),
            author_name: author_name.into(),
            content: content.into(),
            is_bot: false,
            timestamp: None,
        }
    }

    pub fn with_timestamp(
        mut self,
        ts: DateTime<FixedOffset>,
    ) -> Self
    {
        self.timestamp = Some(ts);
        self
    }

    pub fn with_bot(
        mut self,
        is_bot: bool,
    ) -> Self
    {
        self.is_bot = is_bot;
        self
    }
}

/// Tunables that affect folding
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FoldOptions
{
    /// Minimum lexical tokens for a message to be recorded as a quote
    pub min_quote_words: usize,
    /// Uppercase ratio at which a message counts as shouting
    pub shout_threshold: f64,
    /// Keep messages flagged as bot traffic
    pub include_bots: bool,
}

impl Default for FoldOptions
{
    fn default() -> Self
    {
        Self {
            min_quote_words: 2,
            shout_threshold: DEFAULT_SHOUT_THRESHOLD,
            include_bots: false,
        }
    }
}

/// Messages exhibiting each boolean formatting feature
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FlagCounts
{
    pub links: usize,
    pub quote_blocks: usize,
    pub code: usize,
    pub multiline: usize,
    pub stretchy: usize,
    pub shouty: usize,
}

/// Normalized text plus both token views of one message
#[derive(Debug, Clone)]
pub struct PreparedMessage<'a>
{
    pub normalized: String,
    pub tokens: Vec<String>,
    raw: &'a str,
}

impl<'a> PreparedMessage<'a>
{
    /// `None` when the message has neither lexical tokens nor surface words
    pub fn new(raw: &'a str) -> Option<Self>
    {
        let normalized = normalize(raw);
        let tokens = lexical_tokens(&normalized);
        if tokens.is_empty() && surface_words(&normalized).is_empty()
        {
            return None;
        }

        Some(Self { normalized, tokens, raw })
    }

    pub fn words(&self) -> Vec<&str>
    {
        surface_words(&self.normalized)
    }
}

/// Every count and list gathered for one author over a pipeline run
#[derive(Debug, Clone, Default)]
pub struct AuthorAccumulator
{
    pub author_id: String,
    pub display_name: String,

    pub message_count: usize,
    /// Cumulative code points of raw content
    pub char_count: usize,
    /// Trimmed raw texts in ingestion order
    pub messages: Vec<String>,

    pub terms: Counter<String>,
    pub char_trigrams: Counter<String>,
    pub punctuation: Counter<&'static str>,
    pub repeated_punctuation: Counter<String>,
    pub style_markers: Counter<&'static str>,
    pub laughter: Counter<&'static str>,
    pub emoji: Counter<char>,
    pub mentions: Counter<String>,
    pub openers: Counter<String>,
    pub opener_pairs: Counter<String>,
    pub closers: Counter<String>,
    pub closer_pairs: Counter<String>,
    /// Space-joined token sequences long enough to quote
    pub quotes: Counter<String>,
    pub hours: Counter<u32>,

    /// Lexical tokens per message
    pub word_counts: Vec<usize>,
    /// Raw code points per message
    pub char_lengths: Vec<usize>,
    /// Surface words per sentence
    pub sentence_words: Vec<usize>,
    /// Code points per surface word
    pub word_lengths: Vec<usize>,

    pub flags: FlagCounts,
    pub shouted_words: usize,
    pub typos: usize,
}

impl AuthorAccumulator
{
    pub fn new(
        author_id: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self
    {
        Self {
            author_id: author_id.into(),
            display_name: display_name.into(),
            ..Self::default()
        }
    }

    /// Fold one message. Returns `false`, leaving every field untouched, when
    /// the message is empty after normalization.
    pub fn fold(
        &mut self,
        msg: &Message,
        opts: &FoldOptions,
    ) -> bool
    {
        match PreparedMessage::new(&msg.content)
        {
            Some(prepared) =>
            {
                self.fold_prepared(msg, &prepared, opts);
                true
            }
            None => false,
        }
    }

    pub(crate) fn fold_prepared(
        &mut self,
        msg: &Message,
        prepared: &PreparedMessage<'_>,
        opts: &FoldOptions,
    )
    {
        let raw = prepared.raw;
        let norm = prepared
            .normalized
            .as_str();
        let toks = &prepared.tokens;
        let words = prepared.words();
        let raw_chars = raw
            .chars()
            .count();

        self.message_count += 1;
        self.char_count += raw_chars;
        self.messages
            .push(
                raw.trim()
                    .to_string(),
            );

        self.terms
            .extend(
                toks.iter()
                    .cloned(),
            );
        self.word_counts
            .push(toks.len());
        self.char_lengths
            .push(raw_chars);
        self.word_lengths
            .extend(
                words
                    .iter()
                    .map(|w| {
                        w.chars()
                            .count()
                    }),
            );
        self.sentence_words
            .extend(features::sentence_word_counts(raw));
        self.typos += features::estimate_typos(&words);
        self.shouted_words += features::shouted_words(&words);

        self.char_trigrams
            .merge(features::char_trigrams(norm));
        self.laughter
            .merge(features::laughter(norm));
        self.style_markers
            .merge(features::style_markers(norm));
        self.mentions
            .extend(features::mentions(raw));
        self.emoji
            .extend(features::emoji(raw));
        self.punctuation
            .merge(features::punctuation_counts(raw));
        self.repeated_punctuation
            .merge(features::repeated_punctuation(raw));

        let flags = &mut self.flags;
        flags.links += usize::from(features::has_link(raw));
        flags.quote_blocks += usize::from(features::has_quote_block(raw));
        flags.code += usize::from(features::has_code(raw));
        flags.multiline += usize::from(features::is_multiline(raw));
        flags.stretchy += usize::from(features::has_stretchy_word(raw));
        flags.shouty += usize::from(features::is_shouty(raw, opts.shout_threshold));

        if let Some(ts) = msg.timestamp
        {
            self.hours
                .add(ts.hour());
        }

        if let (Some(first), Some(last)) = (toks.first(), toks.last())
        {
            self.openers
                .add(first.clone());
            self.closers
                .add(last.clone());

            if toks.len() >= 2
            {
                self.opener_pairs
                    .add(format!("{} {}", toks[0], toks[1]));
                self.closer_pairs
                    .add(format!("{} {}", toks[toks.len() - 2], toks[toks.len() - 1]));
            }

            if toks.len() >= opts.min_quote_words
            {
                self.quotes
                    .add(
                        toks.iter()
                            .join(" "),
                    );
            }
        }
    }
}

/// Author-key indexed owner of all accumulators for one run
#[derive(Debug, Clone, Default)]
pub struct Corpus
{
    opts: FoldOptions,
    /// Last display name seen per author, including authors with no qualifying messages
    names: IndexMap<String, String>,
    authors: IndexMap<String, AuthorAccumulator>,
}

impl Corpus
{
    pub fn new(opts: FoldOptions) -> Self
    {
        Self { opts, ..Self::default() }
    }

    pub fn options(&self) -> &FoldOptions
    {
        &self.opts
    }

    /// Fold one message into its author's accumulator.
    /// Returns whether the message was counted.
    pub fn add(
        &mut self,
        msg: &Message,
    ) -> bool
    {
        if msg.is_bot && !self.opts.include_bots
        {
            trace!(author = %msg.author_id, "skipping bot message");
            return false;
        }

        // Latest admitted name wins, even when the message itself is not counted
        self.names
            .insert(msg.author_id.clone(), msg.author_name.clone());
        if let Some(acc) = self
            .authors
            .get_mut(&msg.author_id)
        {
            acc.display_name
                .clone_from(&msg.author_name);
        }

        let Some(prepared) = PreparedMessage::new(&msg.content)
        else
        {
            return false;
        };

        let acc = self
            .authors
            .entry(msg.author_id.clone())
            .or_insert_with(|| AuthorAccumulator::new(&msg.author_id, &msg.author_name));
        acc.fold_prepared(msg, &prepared, &self.opts);
        true
    }

    pub fn extend<'m, I>(
        &mut self,
        messages: I,
    ) -> usize
    where
        I: IntoIterator<Item = &'m Message>,
    {
        messages
            .into_iter()
            .filter(|m| self.add(m))
            .count()
    }

    pub fn get(
        &self,
        author_id: &str,
    ) -> Option<&AuthorAccumulator>
    {
        self.authors
            .get(author_id)
    }

    /// Accumulators in first-qualifying-message order
    pub fn authors(&self) -> impl Iterator<Item = &AuthorAccumulator>
    {
        self.authors
            .values()
    }

    pub fn display_name<'a>(
        &'a self,
        author_id: &'a str,
    ) -> &'a str
    {
        self.names
            .get(author_id)
            .map(String::as_str)
            .unwrap_or(author_id)
    }

    /// Distinct authors seen, including those whose messages were all empty
    pub fn author_count(&self) -> usize
    {
        self.names
            .len()
    }

    /// Qualifying messages across all authors
    pub fn message_total(&self) -> usize
    {
        self.authors
            .values()
            .map(|a| a.message_count)
            .sum()
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn msg(
        author: &str,
        content: &str,
    ) -> Message
    {
        Message::new(author, author.to_uppercase(), content)
    }

    #[test]
    fn test_fold_openers_closers_and_quotes()
    {
        let mut acc = AuthorAccumulator::new("a", "A");
        let opts = FoldOptions::default();

        assert!(acc.fold(&msg("a", "Nice game, well played!"), &opts));
        assert!(acc.fold(&msg("a", "gg"), &opts));

        assert_eq!(acc.message_count, 2);
        assert_eq!(acc.openers.get("nice"), 1);
        assert_eq!(acc.openers.get("gg"), 1);
        assert_eq!(acc.opener_pairs.get("nice game"), 1);
        assert_eq!(acc.closers.get("played"), 1);
        assert_eq!(acc.closer_pairs.get("well played"), 1);
        assert_eq!(acc.quotes.get("nice game well played"), 1);
        // single-token message is below min_quote_words
        assert!(!acc.quotes.contains("gg"));
        assert_eq!(acc.word_counts, vec![4, 1]);
        assert_eq!(acc.messages[1], "gg");
    }

    #[test]
    fn test_url_only_message_is_not_counted()
    {
        let mut acc = AuthorAccumulator::new("a", "A");
        let folded = acc.fold(&msg("a", "https://example.com/clip"), &FoldOptions::default());

        assert!(!folded);
        assert_eq!(acc.message_count, 0);
        assert!(acc.messages.is_empty());
        assert!(acc.char_lengths.is_empty());
        assert_eq!(acc.flags, FlagCounts::default());
    }

    #[test]
    fn test_surface_only_message_still_counts()
    {
        // "I" is a surface word but not a lexical token
        let mut acc = AuthorAccumulator::new("a", "A");
        assert!(acc.fold(&msg("a", "I"), &FoldOptions::default()));
        assert_eq!(acc.message_count, 1);
        assert!(acc.terms.is_empty());
        assert!(acc.openers.is_empty());
        assert_eq!(acc.word_counts, vec![0]);
    }

    #[test]
    fn test_hours_only_with_timestamp()
    {
        let mut acc = AuthorAccumulator::new("a", "A");
        let ts = DateTime::parse_from_rfc3339("2024-03-01T21:15:00+00:00").unwrap();
        acc.fold(&msg("a", "evening").with_timestamp(ts), &FoldOptions::default());
        acc.fold(&msg("a", "no clock"), &FoldOptions::default());

        assert_eq!(acc.hours.get(&21u32), 1);
        assert_eq!(acc.hours.total(), 1);
    }

    #[test]
    fn test_flags_and_rates_inputs()
    {
        let mut acc = AuthorAccumulator::new("a", "A");
        let opts = FoldOptions::default();
        acc.fold(&msg("a", "WHY IS THIS BROKEN http://x.y"), &opts);
        acc.fold(&msg("a", "> quoted\nsooo true `code`"), &opts);

        assert_eq!(acc.flags.links, 1);
        assert_eq!(acc.flags.quote_blocks, 1);
        assert_eq!(acc.flags.code, 1);
        assert_eq!(acc.flags.multiline, 1);
        assert_eq!(acc.flags.stretchy, 1);
        assert_eq!(acc.flags.shouty, 1);
    }

    #[test]
    fn test_corpus_skips_bots_and_tracks_names()
    {
        let mut corpus = Corpus::new(FoldOptions::default());
        corpus.add(&msg("bot", "beep boop").with_bot(true));
        corpus.add(&msg("a", "hello there"));
        corpus.add(&Message::new("a", "Alias", "again here"));
        corpus.add(&msg("b", "https://only.link"));

        assert!(corpus.get("bot").is_none());
        assert!(corpus.get("b").is_none());
        assert_eq!(corpus.author_count(), 2);
        assert_eq!(corpus.message_total(), 2);
        assert_eq!(corpus.display_name("a"), "Alias");
        assert_eq!(corpus.display_name("b"), "B");
        assert_eq!(
            corpus
                .get("a")
                .unwrap()
                .display_name,
            "Alias"
        );
    }

    #[test]
    fn test_uncounted_message_still_renames_author()
    {
        let mut corpus = Corpus::new(FoldOptions::default());
        corpus.add(&Message::new("a", "Ann", "hello there"));
        assert!(!corpus.add(&Message::new("a", "Annie", "https://only.link")));

        assert_eq!(corpus.message_total(), 1);
        assert_eq!(corpus.display_name("a"), "Annie");
        assert_eq!(
            corpus
                .get("a")
                .unwrap()
                .display_name,
            "Annie"
        );
    }

    #[test]
    fn test_corpus_includes_bots_when_asked()
    {
        let opts = FoldOptions { include_bots: true, ..FoldOptions::default() };
        let mut corpus = Corpus::new(opts);
        let counted = corpus.extend(&[msg("bot", "beep boop").with_bot(true)]);
        assert_eq!(counted, 1);
    }
}
