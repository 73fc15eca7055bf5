//! Payload assembly: one `AuthorProfile` per selected author plus the
//! cross-author neighbour rankings.

use std::{cmp::Reverse, fmt::Display, hash::Hash};

use indexmap::IndexMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::core::{
    aggregate::{AuthorAccumulator, Corpus},
    counter::Counter,
    select::{self, INTERESTING_MIN_TOKENS},
    stats::{self, TermWeights},
};

/// Top-N sizes for every ranked table in a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileLimits
{
    pub top_tokens: usize,
    pub char_trigrams: usize,
    pub laughter: usize,
    pub emoji: usize,
    pub openers: usize,
    pub closers: usize,
    pub punctuation: usize,
    pub repeated_punctuation: usize,
    pub mentions: usize,
    pub style_markers: usize,
    pub hour_peaks: usize,
    pub interesting: usize,
    pub quotes: usize,
    pub neighbors: usize,
}

impl Default for ProfileLimits
{
    fn default() -> Self
    {
        Self {
            top_tokens: 8,
            char_trigrams: 6,
            laughter: 4,
            emoji: 6,
            openers: 5,
            closers: 5,
            punctuation: 6,
            repeated_punctuation: 4,
            mentions: 5,
            style_markers: 6,
            hour_peaks: 3,
            interesting: 20,
            quotes: 20,
            neighbors: 3,
        }
    }
}

/// Everything `Report::build` needs besides the corpus
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportOptions
{
    /// Authors below this many qualifying messages get no profile
    pub min_messages: usize,
    pub min_quote_words: usize,
    pub interesting_min_tokens: usize,
    pub limits: ProfileLimits,
}

impl Default for ReportOptions
{
    fn default() -> Self
    {
        Self {
            min_messages: 100,
            min_quote_words: 2,
            interesting_min_tokens: INTERESTING_MIN_TOKENS,
            limits: ProfileLimits::default(),
        }
    }
}

/// Per-author style card payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorProfile
{
    pub author: String,
    pub author_id: String,
    pub messages: usize,

    pub avg_words: f64,
    pub avg_chars: f64,
    pub median_words: f64,
    pub p90_words: f64,
    pub p90_chars: f64,

    pub lexical_diversity: f64,
    pub word_variety: usize,
    pub hapax_ratio: f64,
    pub avg_word_length: f64,
    pub avg_sentence_words: f64,

    pub top_tokens: Vec<(String, f64)>,
    pub top_char_trigrams: Vec<(String, usize)>,
    pub laughter: Vec<(String, usize)>,
    pub emoji: Vec<(String, usize)>,
    pub openers1: Vec<(String, usize)>,
    pub openers2: Vec<(String, usize)>,
    pub closers1: Vec<(String, usize)>,
    pub closers2: Vec<(String, usize)>,
    pub punct: Vec<(String, usize)>,
    pub repeat_punct: Vec<(String, usize)>,

    pub question_rate: f64,
    pub exclaim_rate: f64,
    pub ellipsis_rate: f64,
    pub caps_rate: f64,
    pub link_rate: f64,
    pub mention_rate: f64,
    pub quote_rate: f64,
    pub code_rate: f64,
    pub multiline_rate: f64,
    pub stretch_rate: f64,
    pub shout_rate: f64,
    pub typo_rate: f64,

    pub mentions: Vec<(String, usize)>,
    pub style_markers: Vec<(String, usize)>,
    pub hour_peaks: Vec<u32>,

    pub representative: Option<String>,
    pub interesting_messages: Vec<(String, f64)>,
    pub quotes: Vec<(String, usize)>,
}

/// Round to `places` decimals; exact halves go to the even neighbour
pub fn round_to(
    x: f64,
    places: i32,
) -> f64
{
    let f = 10f64.powi(places);
    (x * f).round_ties_even() / f
}

fn table<K>(
    c: &Counter<K>,
    n: usize,
) -> Vec<(String, usize)>
where
    K: Hash + Eq + Display,
{
    c.most_common(n)
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

impl AuthorProfile
{
    pub fn build(
        acc: &AuthorAccumulator,
        weights: &TermWeights,
        opts: &ReportOptions,
    ) -> Self
    {
        let lim = &opts.limits;
        let n = acc.message_count;
        let per_msg = |count: usize| round_to(stats::ratio(count, n), 3);

        let total_tokens = acc
            .terms
            .total();
        let unique_tokens = acc
            .terms
            .len();

        let hour_peaks = acc
            .hours
            .most_common(lim.hour_peaks)
            .into_iter()
            .map(|(h, _)| *h)
            .collect();

        Self {
            author: acc
                .display_name
                .clone(),
            author_id: acc
                .author_id
                .clone(),
            messages: n,

            avg_words: round_to(stats::mean(&acc.word_counts), 2),
            avg_chars: round_to(stats::ratio(acc.char_count, n), 2),
            median_words: round_to(stats::percentile(&acc.word_counts, 0.5), 2),
            p90_words: round_to(stats::percentile(&acc.word_counts, 0.9), 2),
            p90_chars: round_to(stats::percentile(&acc.char_lengths, 0.9), 2),

            lexical_diversity: round_to(stats::ratio(unique_tokens, total_tokens), 3),
            word_variety: unique_tokens,
            hapax_ratio: round_to(
                stats::ratio(
                    acc.terms
                        .singletons(),
                    total_tokens,
                ),
                3,
            ),
            avg_word_length: round_to(stats::mean(&acc.word_lengths), 3),
            avg_sentence_words: round_to(stats::mean(&acc.sentence_words), 3),

            top_tokens: stats::top_weighted(weights, lim.top_tokens),
            top_char_trigrams: table(&acc.char_trigrams, lim.char_trigrams),
            laughter: table(&acc.laughter, lim.laughter),
            emoji: table(&acc.emoji, lim.emoji),
            openers1: table(&acc.openers, lim.openers),
            openers2: table(&acc.opener_pairs, lim.openers),
            closers1: table(&acc.closers, lim.closers),
            closers2: table(&acc.closer_pairs, lim.closers),
            punct: table(&acc.punctuation, lim.punctuation),
            repeat_punct: table(&acc.repeated_punctuation, lim.repeated_punctuation),

            question_rate: per_msg(
                acc.punctuation
                    .get("?"),
            ),
            exclaim_rate: per_msg(
                acc.punctuation
                    .get("!"),
            ),
            ellipsis_rate: per_msg(
                acc.punctuation
                    .get("..."),
            ),
            caps_rate: per_msg(acc.shouted_words),
            link_rate: per_msg(acc.flags.links),
            mention_rate: per_msg(
                acc.mentions
                    .total(),
            ),
            quote_rate: per_msg(acc.flags.quote_blocks),
            code_rate: per_msg(acc.flags.code),
            multiline_rate: per_msg(acc.flags.multiline),
            stretch_rate: per_msg(acc.flags.stretchy),
            shout_rate: per_msg(acc.flags.shouty),
            typo_rate: per_msg(acc.typos),

            mentions: table(&acc.mentions, lim.mentions),
            style_markers: table(&acc.style_markers, lim.style_markers),
            hour_peaks,

            representative: select::representative(&acc.messages, weights).map(str::to_string),
            interesting_messages: select::interesting(
                &acc.messages,
                weights,
                opts.interesting_min_tokens,
                lim.interesting,
            ),
            quotes: select::top_quotes(&acc.quotes, opts.min_quote_words, lim.quotes),
        }
    }
}

/// Corpus-level counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Summary
{
    /// Qualifying messages across all authors
    pub messages: usize,
    /// Distinct authors seen
    pub authors: usize,
    /// Input files read
    pub files: usize,
}

/// Nearest stylistic neighbours of one author
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NeighborRanking
{
    pub author: String,
    pub author_id: String,
    /// (display name, cosine score rounded to 3 places)
    pub nearest: Vec<(String, f64)>,
}

/// Full analysis result, authors ordered by message count descending
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report
{
    pub summary: Summary,
    pub authors: Vec<AuthorProfile>,
    pub neighbors: Vec<NeighborRanking>,
}

impl Report
{
    /// Build profiles and neighbour rankings from a fully folded corpus.
    #[instrument(skip_all, fields(authors = corpus.author_count()))]
    pub fn build(
        corpus: &Corpus,
        opts: &ReportOptions,
        files: usize,
    ) -> Self
    {
        // TF-IDF sees every accumulated author, not just the selected ones
        let vectors: IndexMap<String, TermWeights> = stats::compute_tfidf(
            corpus
                .authors()
                .map(|a| (a.author_id.as_str(), &a.terms)),
        );

        let mut selected: Vec<&AuthorAccumulator> = corpus
            .authors()
            .filter(|a| a.message_count >= opts.min_messages)
            .collect();
        selected.sort_by_key(|a| Reverse(a.messages.len()));
        debug!(selected = selected.len(), "authors above message threshold");

        let empty = TermWeights::new();
        let authors: Vec<AuthorProfile> = selected
            .par_iter()
            .map(|acc| {
                let weights = vectors
                    .get(&acc.author_id)
                    .unwrap_or(&empty);
                AuthorProfile::build(acc, weights, opts)
            })
            .collect();

        let candidate_ids: Vec<&str> = selected
            .iter()
            .map(|a| a.author_id.as_str())
            .collect();
        let neighbors: Vec<NeighborRanking> = selected
            .par_iter()
            .map(|acc| NeighborRanking {
                author: acc
                    .display_name
                    .clone(),
                author_id: acc
                    .author_id
                    .clone(),
                nearest: stats::nearest_neighbors(
                    &vectors,
                    &acc.author_id,
                    candidate_ids
                        .iter()
                        .copied(),
                    opts.limits
                        .neighbors,
                )
                .into_iter()
                .map(|(id, score)| (corpus.display_name(&id).to_string(), round_to(score, 3)))
                .collect(),
            })
            .collect();

        Self {
            summary: Summary {
                messages: corpus.message_total(),
                authors: corpus.author_count(),
                files,
            },
            authors,
            neighbors,
        }
    }

    /// First profiled author whose display name contains `needle`, ignoring case
    pub fn focus(
        &self,
        needle: &str,
    ) -> Option<&AuthorProfile>
    {
        let needle = needle.to_lowercase();
        self.authors
            .iter()
            .find(|p| {
                p.author
                    .to_lowercase()
                    .contains(&needle)
            })
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::core::aggregate::{FoldOptions, Message};

    fn corpus(rows: &[(&str, &str)]) -> Corpus
    {
        let mut c = Corpus::new(FoldOptions::default());
        for &(author, text) in rows
        {
            c.add(&Message::new(author, author.to_uppercase(), text));
        }
        c
    }

    fn opts(min_messages: usize) -> ReportOptions
    {
        ReportOptions { min_messages, ..ReportOptions::default() }
    }

    #[test]
    fn test_round_to()
    {
        assert_eq!(round_to(2.0 / 3.0, 3), 0.667);
        assert_eq!(round_to(1.005, 0), 1.0);
        assert_eq!(round_to(0.0, 2), 0.0);
        assert_eq!(round_to(2.125, 2), 2.12);
        assert_eq!(round_to(2.375, 2), 2.38);
        assert_eq!(round_to(0.0625, 3), 0.062);
        assert_eq!(round_to(2.5, 0), 2.0);
    }

    #[test]
    fn test_rates_round_half_to_even()
    {
        let mut rows: Vec<(&str, &str)> = vec![("a", "see https://example.com/x here")];
        rows.extend(std::iter::repeat_n(("a", "plain words only"), 15));
        let report = Report::build(&corpus(&rows), &opts(1), 1);

        // 1 link in 16 messages = 0.0625
        assert_eq!(report.authors[0].link_rate, 0.062);
    }

    #[test]
    fn test_display_name_follows_latest_admitted_message()
    {
        let mut c = Corpus::new(FoldOptions::default());
        c.add(&Message::new("1", "Ann", "hello there friend"));
        c.add(&Message::new("2", "Bo", "hello again friend"));
        // renamed, but this message normalizes to nothing
        c.add(&Message::new("1", "Annie", "https://example.com/clip"));

        let report = Report::build(&c, &opts(1), 1);
        let ann = report
            .authors
            .iter()
            .find(|p| p.author_id == "1")
            .unwrap();
        assert_eq!(ann.author, "Annie");

        let own = report
            .neighbors
            .iter()
            .find(|n| n.author_id == "1")
            .unwrap();
        assert_eq!(own.author, "Annie");

        let bo = report
            .neighbors
            .iter()
            .find(|n| n.author_id == "2")
            .unwrap();
        assert_eq!(bo.nearest[0].0, "Annie");
    }

    #[test]
    fn test_profile_volume_and_lexical_stats()
    {
        let c = corpus(&[
            ("a", "gg gg gg"),
            ("a", "nice game well played!"),
            ("a", "gg gg gg"),
            ("b", "totally different words here?"),
        ]);
        let report = Report::build(&c, &opts(1), 1);

        let a = &report.authors[0];
        assert_eq!(a.author_id, "a");
        assert_eq!(a.messages, 3);
        assert_eq!(a.avg_words, round_to(10.0 / 3.0, 2));
        assert_eq!(a.median_words, 3.0);
        // 10 tokens, 5 unique, 4 singletons (nice game well played)
        assert_eq!(a.lexical_diversity, 0.5);
        assert_eq!(a.hapax_ratio, 0.4);
        assert_eq!(a.word_variety, 5);
        assert_eq!(a.exclaim_rate, 0.333);
        assert_eq!(a.quotes[0], ("gg gg gg".to_string(), 2));
        assert_eq!(a.top_tokens[0].0, "gg");
        assert_eq!(a.openers1[0], ("gg".to_string(), 2));

        let b = &report.authors[1];
        assert_eq!(b.question_rate, 1.0);
    }

    #[test]
    fn test_min_messages_and_ordering()
    {
        let c = corpus(&[
            ("a", "one message only"),
            ("b", "first of two"),
            ("b", "second of two"),
            ("c", "lonely words"),
        ]);
        let report = Report::build(&c, &opts(2), 0);

        assert_eq!(report.authors.len(), 1);
        assert_eq!(report.authors[0].author_id, "b");
        assert_eq!(report.summary.authors, 3);
        assert_eq!(report.summary.messages, 4);
        assert!(report.neighbors[0].nearest.is_empty());
    }

    #[test]
    fn test_neighbors_among_selected()
    {
        let c = corpus(&[
            ("a", "rust borrow checker lifetimes"),
            ("b", "rust borrow checker traits"),
            ("c", "pasta sauce basil garlic"),
        ]);
        let report = Report::build(&c, &opts(1), 0);

        let a = report
            .neighbors
            .iter()
            .find(|n| n.author_id == "a")
            .unwrap();
        assert_eq!(a.nearest.len(), 2);
        assert_eq!(a.nearest[0].0, "B");
        assert!(a.nearest[0].1 > 0.0);
        assert_eq!(a.nearest[1], ("C".to_string(), 0.0));
    }

    #[test]
    fn test_focus_case_insensitive()
    {
        let c = corpus(&[("virmel", "hello there friend")]);
        let report = Report::build(&c, &opts(1), 0);

        assert!(report.focus("IRM").is_some());
        assert!(report.focus("nobody").is_none());
    }

    #[test]
    fn test_zero_message_author_is_zero_safe()
    {
        let acc = AuthorAccumulator::new("x", "X");
        let p = AuthorProfile::build(&acc, &TermWeights::new(), &ReportOptions::default());

        assert_eq!(p.messages, 0);
        assert_eq!(p.avg_words, 0.0);
        assert_eq!(p.p90_chars, 0.0);
        assert_eq!(p.lexical_diversity, 0.0);
        assert_eq!(p.typo_rate, 0.0);
        assert!(p.representative.is_none());
        assert!(p.top_tokens.is_empty());
    }
}
