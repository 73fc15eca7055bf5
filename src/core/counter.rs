//! Insertion-ordered multiset.
//!
//! Ranking helpers sort stably, so equal counts keep first-seen order.

use std::{borrow::Borrow, cmp::Reverse, hash::Hash};

use indexmap::IndexMap;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Counter<K: Hash + Eq>
{
    counts: IndexMap<K, usize>,
}

impl<K: Hash + Eq> Default for Counter<K>
{
    fn default() -> Self
    {
        Self { counts: IndexMap::new() }
    }
}

impl<K: Hash + Eq> Counter<K>
{
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Count one occurrence of `key`
    pub fn add(
        &mut self,
        key: K,
    )
    {
        self.add_n(key, 1);
    }

    /// Count `n` occurrences of `key`; `n == 0` records nothing
    pub fn add_n(
        &mut self,
        key: K,
        n: usize,
    )
    {
        if n == 0
        {
            return;
        }

        *self
            .counts
            .entry(key)
            .or_insert(0) += n;
    }

    /// Fold another counter into this one, preserving first-seen order
    pub fn merge(
        &mut self,
        other: Counter<K>,
    )
    {
        for (k, n) in other.counts
        {
            self.add_n(k, n);
        }
    }

    pub fn get<Q>(
        &self,
        key: &Q,
    ) -> usize
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.counts
            .get(key)
            .copied()
            .unwrap_or(0)
    }

    pub fn contains<Q>(
        &self,
        key: &Q,
    ) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.counts
            .contains_key(key)
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize
    {
        self.counts
            .len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.counts
            .is_empty()
    }

    /// Sum of all counts
    pub fn total(&self) -> usize
    {
        self.counts
            .values()
            .sum()
    }

    /// Highest single count, if any
    pub fn max_count(&self) -> Option<usize>
    {
        self.counts
            .values()
            .copied()
            .max()
    }

    /// Keys seen exactly once
    pub fn singletons(&self) -> usize
    {
        self.counts
            .values()
            .filter(|&&n| n == 1)
            .count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, usize)>
    {
        self.counts
            .iter()
            .map(|(k, &n)| (k, n))
    }

    pub fn keys(&self) -> impl Iterator<Item = &K>
    {
        self.counts
            .keys()
    }

    /// Up to `n` entries by count descending; ties keep insertion order
    pub fn most_common(
        &self,
        n: usize,
    ) -> Vec<(&K, usize)>
    {
        let mut entries: Vec<(&K, usize)> = self
            .iter()
            .collect();
        entries.sort_by_key(|&(_, c)| Reverse(c));
        entries.truncate(n);
        entries
    }
}

impl<K: Hash + Eq> FromIterator<K> for Counter<K>
{
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self
    {
        let mut c = Counter::new();
        c.extend(iter);
        c
    }
}

impl<K: Hash + Eq> Extend<K> for Counter<K>
{
    fn extend<I: IntoIterator<Item = K>>(
        &mut self,
        iter: I,
    )
    {
        for k in iter
        {
            self.add(k);
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_most_common_is_stable_on_ties()
    {
        let c: Counter<&str> = ["b", "a", "c", "a", "b", "d"]
            .into_iter()
            .collect();
        let top = c.most_common(3);
        assert_eq!(top, vec![(&"b", 2), (&"a", 2), (&"c", 1)]);
    }

    #[test]
    fn test_add_n_zero_records_nothing()
    {
        let mut c = Counter::new();
        c.add_n("x", 0);
        assert!(c.is_empty());
        assert!(!c.contains("x"));
    }

    #[test]
    fn test_merge_and_totals()
    {
        let mut a: Counter<String> = ["x", "y"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let b: Counter<String> = ["y", "z", "z"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        a.merge(b);

        assert_eq!(a.get("y"), 2);
        assert_eq!(a.get("z"), 2);
        assert_eq!(a.total(), 5);
        assert_eq!(a.singletons(), 1);
        assert_eq!(a.max_count(), Some(2));
        assert_eq!(
            a.keys()
                .cloned()
                .collect::<Vec<_>>(),
            vec!["x", "y", "z"]
        );
    }
}
