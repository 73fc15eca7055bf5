//! Message selection: the representative message, ranked "interesting"
//! messages, and repetition-ranked quotes.

use std::collections::HashSet;

use crate::core::{
    counter::Counter,
    stats::TermWeights,
    text::{lexical_tokens, normalize},
};

/// Fewest tokens a message needs to be considered interesting
pub const INTERESTING_MIN_TOKENS: usize = 3;

/// Mean TF-IDF weight per token; tokens missing from `weights` weigh 0
pub fn average_weight(
    tokens: &[String],
    weights: &TermWeights,
) -> Option<f64>
{
    if tokens.is_empty()
    {
        return None;
    }

    let sum: f64 = tokens
        .iter()
        .map(|t| {
            weights
                .get(t)
                .copied()
                .unwrap_or(0.0)
        })
        .sum();

    Some(sum / tokens.len() as f64)
}

/// Highest-scoring message by average token weight; the first one wins ties.
/// `None` when no message has a token with positive weight.
pub fn representative<'a>(
    messages: &'a [String],
    weights: &TermWeights,
) -> Option<&'a str>
{
    let mut best: Option<&str> = None;
    let mut best_score = 0.0;

    for msg in messages
    {
        let toks = lexical_tokens(&normalize(msg));
        let Some(score) = average_weight(&toks, weights)
        else
        {
            continue;
        };

        if score > best_score
        {
            best_score = score;
            best = Some(msg.as_str());
        }
    }

    best
}

/// Messages ranked by average token weight, deduplicated by normalized text.
///
/// A normalized text is only marked as seen once it clears the token gate, so
/// a short duplicate never shadows anything.
pub fn interesting(
    messages: &[String],
    weights: &TermWeights,
    min_tokens: usize,
    limit: usize,
) -> Vec<(String, f64)>
{
    let mut seen: HashSet<String> = HashSet::new();
    let mut scored: Vec<(String, f64)> = Vec::new();

    for msg in messages
    {
        let normalized = normalize(msg);
        if seen.contains(&normalized)
        {
            continue;
        }

        let toks = lexical_tokens(&normalized);
        if toks.len() < min_tokens
        {
            continue;
        }
        seen.insert(normalized);

        if let Some(score) = average_weight(&toks, weights).filter(|&s| s > 0.0)
        {
            scored.push((msg.clone(), score));
        }
    }

    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.truncate(limit);
    scored
}

/// Quote keys with at least `min_words` words, most repeated first; ties keep
/// first-seen order.
pub fn top_quotes(
    quotes: &Counter<String>,
    min_words: usize,
    limit: usize,
) -> Vec<(String, usize)>
{
    let eligible: Counter<String> = quotes
        .iter()
        .filter(|(q, _)| {
            q.split(' ')
                .count()
                >= min_words
        })
        .fold(Counter::new(), |mut c, (q, n)| {
            c.add_n(q.clone(), n);
            c
        });

    eligible
        .most_common(limit)
        .into_iter()
        .map(|(q, n)| (q.clone(), n))
        .collect()
}
