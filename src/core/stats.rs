//! Corpus-wide statistics: TF-IDF, cosine similarity, percentiles and
//! nearest-neighbour rankings.
//!
//! TF-IDF treats each author's whole term counter as one document. Weights use
//! max-tf normalization and smoothed IDF:
//!
//! `w(t) = tf(t) / max_tf * (ln((1 + D) / (1 + df(t))) + 1)`

use std::{cmp::Ordering, collections::HashMap};

use indexmap::IndexMap;

use crate::core::counter::Counter;

/// Token -> weight for one author; iteration follows the author's first use
pub type TermWeights = IndexMap<String, f64>;

/// Compute one weight map per document (author key, term counter).
pub fn compute_tfidf<'a, I>(docs: I) -> IndexMap<String, TermWeights>
where
    I: IntoIterator<Item = (&'a str, &'a Counter<String>)>,
{
    let docs: Vec<(&str, &Counter<String>)> = docs
        .into_iter()
        .collect();
    let doc_count = docs.len() as f64;

    let mut df: HashMap<&str, usize> = HashMap::new();
    for (_, counts) in &docs
    {
        for term in counts.keys()
        {
            *df.entry(term.as_str())
                .or_insert(0) += 1;
        }
    }

    docs.iter()
        .map(|&(id, counts)| {
            let max_tf = counts
                .max_count()
                .unwrap_or(1) as f64;

            let weights = counts
                .iter()
                .map(|(term, tf)| {
                    let dft = df
                        .get(term.as_str())
                        .copied()
                        .unwrap_or(0) as f64;
                    let idf = ((1.0 + doc_count) / (1.0 + dft)).ln() + 1.0;
                    (term.clone(), (tf as f64 / max_tf) * idf)
                })
                .collect();

            (id.to_string(), weights)
        })
        .collect()
}

fn l2_norm(v: &TermWeights) -> f64
{
    v.values()
        .map(|w| w * w)
        .sum::<f64>()
        .sqrt()
}

/// Dot product over shared keys divided by both full L2 norms.
/// Zero (never `-0.0`) when either side is empty, has zero norm, or no key is shared.
pub fn cosine_similarity(
    a: &TermWeights,
    b: &TermWeights,
) -> f64
{
    if a.is_empty() || b.is_empty()
    {
        return 0.0;
    }

    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let dot: f64 = small
        .iter()
        .filter_map(|(k, wa)| {
            large
                .get(k)
                .map(|wb| wa * wb)
        })
        .fold(0.0, |acc, x| acc + x);

    let norm_a = l2_norm(a);
    let norm_b = l2_norm(b);
    if norm_a == 0.0 || norm_b == 0.0
    {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// Linear-interpolation percentile; `p` in [0, 1]. Empty input yields 0.
pub fn percentile(
    data: &[usize],
    p: f64,
) -> f64
{
    if data.is_empty()
    {
        return 0.0;
    }

    let mut sorted = data.to_vec();
    sorted.sort_unstable();

    let k = (sorted.len() - 1) as f64 * p;
    let lo = k.floor() as usize;
    let hi = k.ceil() as usize;
    if lo == hi
    {
        return sorted[lo] as f64;
    }

    let (a, b) = (sorted[lo] as f64, sorted[hi] as f64);
    a + (b - a) * (k - lo as f64)
}

/// Arithmetic mean; 0 for an empty slice
pub fn mean(data: &[usize]) -> f64
{
    if data.is_empty()
    {
        return 0.0;
    }

    data.iter()
        .sum::<usize>() as f64
        / data.len() as f64
}

/// `num / den`, or 0 when `den` is zero
pub fn ratio(
    num: usize,
    den: usize,
) -> f64
{
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

fn desc_by_score(
    a: f64,
    b: f64,
) -> Ordering
{
    b.total_cmp(&a)
}

/// Up to `n` heaviest tokens; ties keep map order
pub fn top_weighted(
    weights: &TermWeights,
    n: usize,
) -> Vec<(String, f64)>
{
    let mut entries: Vec<(String, f64)> = weights
        .iter()
        .map(|(k, &w)| (k.clone(), w))
        .collect();
    entries.sort_by(|a, b| desc_by_score(a.1, b.1));
    entries.truncate(n);
    entries
}

/// Most similar candidates to `author`, excluding `author` itself.
/// Descending by cosine score, then by author id descending.
pub fn nearest_neighbors<'a>(
    vectors: &IndexMap<String, TermWeights>,
    author: &str,
    candidates: impl IntoIterator<Item = &'a str>,
    k: usize,
) -> Vec<(String, f64)>
{
    let Some(own) = vectors.get(author)
    else
    {
        return Vec::new();
    };

    let mut scored: Vec<(String, f64)> = candidates
        .into_iter()
        .filter(|&other| other != author)
        .filter_map(|other| {
            vectors
                .get(other)
                .map(|v| (other.to_string(), cosine_similarity(own, v)))
        })
        .collect();

    scored.sort_by(|a, b| desc_by_score(a.1, b.1).then_with(|| b.0.cmp(&a.0)));
    scored.truncate(k);
    scored
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn counter(tokens: &[&str]) -> Counter<String>
    {
        tokens
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn approx(
        a: f64,
        b: f64,
    ) -> bool
    {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_tfidf_formula()
    {
        let a = counter(&["gg", "gg", "wp"]);
        let b = counter(&["gg", "ez"]);
        let v = compute_tfidf([("a", &a), ("b", &b)]);

        let idf_shared = (3.0f64 / 3.0).ln() + 1.0;
        let idf_unique = (3.0f64 / 2.0).ln() + 1.0;

        assert!(approx(v["a"]["gg"], 1.0 * idf_shared));
        assert!(approx(v["a"]["wp"], 0.5 * idf_unique));
        assert!(approx(v["b"]["ez"], 1.0 * idf_unique));
    }

    #[test]
    fn test_shared_token_weighs_less_than_unique()
    {
        let a = counter(&["common", "rare"]);
        let b = counter(&["common", "other"]);
        let c = counter(&["common"]);
        let v = compute_tfidf([("a", &a), ("b", &b), ("c", &c)]);

        assert!(v["a"]["common"] < v["a"]["rare"]);
    }

    #[test]
    fn test_tfidf_empty_document()
    {
        let a = Counter::new();
        let b = counter(&["x"]);
        let v = compute_tfidf([("a", &a), ("b", &b)]);

        assert!(v["a"].is_empty());
        // empty doc still counts toward D
        assert!(approx(v["b"]["x"], (3.0f64 / 2.0).ln() + 1.0));
    }

    #[test]
    fn test_cosine_properties()
    {
        let a = counter(&["x", "y", "y"]);
        let b = counter(&["y", "z"]);
        let v = compute_tfidf([("a", &a), ("b", &b)]);

        assert!(approx(cosine_similarity(&v["a"], &v["a"]), 1.0));
        assert_eq!(cosine_similarity(&v["a"], &TermWeights::new()), 0.0);
        assert!(approx(
            cosine_similarity(&v["a"], &v["b"]),
            cosine_similarity(&v["b"], &v["a"])
        ));
    }

    #[test]
    fn test_cosine_uses_full_norms()
    {
        let a: TermWeights = [("x".to_string(), 1.0), ("y".to_string(), 1.0)]
            .into_iter()
            .collect();
        let b: TermWeights = [("x".to_string(), 1.0)]
            .into_iter()
            .collect();

        assert!(approx(cosine_similarity(&a, &b), 1.0 / 2f64.sqrt()));
    }

    #[test]
    fn test_cosine_zero_norm()
    {
        let z: TermWeights = [("x".to_string(), 0.0)]
            .into_iter()
            .collect();
        assert_eq!(cosine_similarity(&z, &z), 0.0);
    }

    #[test]
    fn test_cosine_disjoint_is_positive_zero()
    {
        let a: TermWeights = [("x".to_string(), 1.0)]
            .into_iter()
            .collect();
        let b: TermWeights = [("y".to_string(), 1.0)]
            .into_iter()
            .collect();

        let sim = cosine_similarity(&a, &b);
        assert_eq!(sim, 0.0);
        assert!(sim.is_sign_positive());
        assert_eq!(format!("{sim:.2}"), "0.00");
    }

    #[test]
    fn test_percentile()
    {
        assert_eq!(percentile(&[], 0.5), 0.0);
        assert_eq!(percentile(&[5], 0.0), 5.0);
        assert_eq!(percentile(&[5], 0.9), 5.0);
        assert_eq!(percentile(&[5], 1.0), 5.0);
        assert_eq!(percentile(&[4, 1, 3, 2], 0.5), 2.5);
        assert!(approx(percentile(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10], 0.9), 9.1));
    }

    #[test]
    fn test_nearest_neighbors_excludes_self_and_orders()
    {
        let a = counter(&["x", "y"]);
        let b = counter(&["x", "y"]);
        let c = counter(&["z"]);
        let v = compute_tfidf([("a", &a), ("b", &b), ("c", &c)]);

        let n = nearest_neighbors(&v, "a", ["a", "b", "c"], 5);
        assert_eq!(n.len(), 2);
        assert_eq!(n[0].0, "b");
        assert!(approx(n[0].1, 1.0));
        assert_eq!(n[1], ("c".to_string(), 0.0));

        assert!(n[1].1.is_sign_positive());

        assert_eq!(nearest_neighbors(&v, "a", ["b", "c"], 1).len(), 1);
        assert!(nearest_neighbors(&v, "missing", ["a"], 3).is_empty());
    }

    #[test]
    fn test_nearest_neighbor_ties_prefer_higher_id()
    {
        let a = counter(&["apple"]);
        let b = counter(&["banana"]);
        let c = counter(&["cherry"]);
        let v = compute_tfidf([("a", &a), ("b", &b), ("c", &c)]);

        // every pair scores zero; candidate order must not decide
        let n = nearest_neighbors(&v, "a", ["b", "c"], 5);
        assert_eq!(n, vec![("c".to_string(), 0.0), ("b".to_string(), 0.0)]);
        assert!(
            n.iter()
                .all(|(_, s)| s.is_sign_positive())
        );
    }

    #[test]
    fn test_top_weighted_stable()
    {
        let w: TermWeights = [("a".to_string(), 1.0), ("b".to_string(), 2.0), ("c".to_string(), 1.0)]
            .into_iter()
            .collect();
        let top = top_weighted(&w, 3);
        let keys: Vec<_> = top
            .iter()
            .map(|(k, _)| k.as_str())
            .collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_mean_and_ratio_zero_safe()
    {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(ratio(3, 0), 0.0);
        assert_eq!(ratio(1, 4), 0.25);
    }
}
