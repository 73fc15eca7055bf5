//! Per-message feature extractors.
//!
//! Each extractor is a pure function over one message's text. Pattern-driven
//! extractors keep their vocabularies as ordered (name, matcher) tables so the
//! tables can be inspected and tested on their own.

use std::sync::LazyLock;

use memchr::memmem;
use regex::Regex;

use crate::core::{
    counter::Counter,
    text::{is_common_word, is_stopword, surface_words},
};

/// Default uppercase ratio at which a message counts as shouting
pub const DEFAULT_SHOUT_THRESHOLD: f64 = 0.6;

/// Shortest surface word the typo heuristic looks at
pub const TYPO_MIN_WORD_LEN: usize = 4;

/// Punctuation marks counted by raw substring occurrence
pub const PUNCTUATION_MARKS: &[&str] = &["!", "?", "...", ".", ",", ";", ":", "\"", "'"];

/// Inclusive code point ranges treated as emoji (flags included)
pub const EMOJI_RANGES: &[(u32, u32)] = &[
    (0x1F300, 0x1F5FF),
    (0x1F600, 0x1F64F),
    (0x1F680, 0x1F6FF),
    (0x1F700, 0x1F77F),
    (0x1F900, 0x1F9FF),
    (0x1FA70, 0x1FAFF),
    (0x2700, 0x27BF),
    (0x1F1E6, 0x1F1FF),
];

/// A named matcher in a declarative pattern table
pub struct NamedPattern
{
    pub name: &'static str,
    pub regex: Regex,
}

fn table(entries: &[(&'static str, &str)]) -> Vec<NamedPattern>
{
    entries
        .iter()
        .map(|&(name, pat)| NamedPattern {
            name,
            regex: Regex::new(&format!("(?i){pat}")).expect("valid pattern table regex"),
        })
        .collect()
}

/// Laughter patterns, keyed by the pattern they came from
pub static LAUGHTER_PATTERNS: LazyLock<Vec<NamedPattern>> = LazyLock::new(|| {
    table(&[
        ("ha+ha+", r"\bha+ha+\b"),
        ("l+o+l+", r"\bl+o+l+\b"),
        ("lmao", r"\blmao\b"),
        ("rofl|lmfao", r"\b(rofl|lmfao)\b"),
    ])
});

/// Hedges, intensifiers and slang
pub static STYLE_MARKERS: LazyLock<Vec<NamedPattern>> = LazyLock::new(|| {
    table(&[
        ("maybe", r"\bmaybe\b"),
        ("idk", r"\bidk\b"),
        ("idc", r"\bidc\b"),
        ("kinda", r"\bkinda\b"),
        ("sorta", r"\bsorta\b"),
        ("probably", r"\bprobably\b"),
        ("perhaps", r"\bperhaps\b"),
        ("guess", r"\bguess\b"),
        ("ngl", r"\bngl\b"),
        ("honestly", r"\bhonestly\b"),
        ("literally", r"\bliterally\b"),
        ("actually", r"\bactually\b"),
        ("really", r"\breally\b"),
        ("super", r"\bsuper\b"),
        ("lowkey", r"\blow ?key\b"),
        ("highkey", r"\bhigh ?key\b"),
        ("imo", r"\bimo\b"),
        ("fr", r"\bfr\b"),
        ("bro", r"\bbro\b"),
        ("dude", r"\bdude\b"),
        ("bruh", r"\bbruh\b"),
        ("nah", r"\bnah\b"),
        ("yo", r"\byo\b"),
        ("yall", r"\byall\b"),
        ("wtf", r"\bwtf\b"),
        ("omg", r"\bomg\b"),
        ("dang", r"\bdang\b"),
        ("pls", r"\b(pls|please)\b"),
        ("jk", r"\bjk\b"),
        ("gg", r"\bgg\b"),
        ("wdym", r"\bwdym\b"),
    ])
});

/// `??`, `!!!`, `?!`, `!?!` and friends; run independently of each other
static REPEATED_PUNCT_RES: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [r"\?{2,}", r"!{2,}", r"(?:\?+!+|!+\?+)"]
        .map(|p| Regex::new(p).expect("valid repeated punctuation regex"))
});

static MENTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<@!?(?P<id>\d+)>|@(?P<name>[\w.\-]+)").expect("valid mention regex")
});

static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://").expect("valid link regex"));

static QUOTE_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\n)>\s*\S").expect("valid quote block regex"));

static INLINE_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`[^`]+`").expect("valid inline code regex"));

static WHITESPACE_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

static SENTENCE_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]+").expect("valid sentence regex"));

/// Non-overlapping occurrences of `needle` in `haystack`
fn count_substr(
    haystack: &str,
    needle: &str,
) -> usize
{
    memmem::find_iter(haystack.as_bytes(), needle.as_bytes()).count()
}

/// Raw substring counts per punctuation mark; marks that never occur are omitted.
pub fn punctuation_counts(text: &str) -> Counter<&'static str>
{
    let mut c = Counter::new();
    for &mark in PUNCTUATION_MARKS
    {
        c.add_n(mark, count_substr(text, mark));
    }
    c
}

/// Runs of repeated `?`/`!`, keyed by the exact matched run
pub fn repeated_punctuation(text: &str) -> Counter<String>
{
    let mut c = Counter::new();
    for re in REPEATED_PUNCT_RES.iter()
    {
        c.extend(
            re.find_iter(text)
                .map(|m| m.as_str().to_string()),
        );
    }
    c
}

fn count_table(
    patterns: &[NamedPattern],
    text: &str,
) -> Counter<&'static str>
{
    let mut c = Counter::new();
    for p in patterns
    {
        c.add_n(
            p.name,
            p.regex
                .find_iter(text)
                .count(),
        );
    }
    c
}

pub fn laughter(text: &str) -> Counter<&'static str>
{
    count_table(&LAUGHTER_PATTERNS, text)
}

pub fn style_markers(text: &str) -> Counter<&'static str>
{
    count_table(&STYLE_MARKERS, text)
}

pub fn is_emoji(c: char) -> bool
{
    let cp = c as u32;
    EMOJI_RANGES
        .iter()
        .any(|&(lo, hi)| (lo..=hi).contains(&cp))
}

/// Emoji code points in order of appearance; no grapheme joining
pub fn emoji(text: &str) -> Vec<char>
{
    text.chars()
        .filter(|&c| is_emoji(c))
        .collect()
}

/// Mentioned user ids (`<@123>`, `<@!123>`) or names (`@name`)
pub fn mentions(text: &str) -> Vec<String>
{
    MENTION_RE
        .captures_iter(text)
        .filter_map(|caps| {
            caps.name("id")
                .or_else(|| caps.name("name"))
                .map(|m| m.as_str().to_string())
        })
        .collect()
}

pub fn has_link(text: &str) -> bool
{
    LINK_RE.is_match(text)
}

pub fn has_quote_block(text: &str) -> bool
{
    QUOTE_BLOCK_RE.is_match(text)
}

pub fn has_code(text: &str) -> bool
{
    text.contains("```") || INLINE_CODE_RE.is_match(text)
}

pub fn is_multiline(text: &str) -> bool
{
    text.trim()
        .contains('\n')
}

fn same_char_folded(
    a: char,
    b: char,
) -> bool
{
    a == b
        || a.to_lowercase()
            .eq(b.to_lowercase())
}

/// Any non-newline character repeated three or more times in a row,
/// ignoring case ("sooo", "NOoo", "!!!").
pub fn has_stretchy_word(text: &str) -> bool
{
    let mut prev: Option<char> = None;
    let mut run = 0usize;

    for c in text.chars()
    {
        if c == '\n'
        {
            prev = None;
            run = 0;
            continue;
        }

        match prev
        {
            Some(p) if same_char_folded(p, c) => run += 1,
            _ =>
            {
                prev = Some(c);
                run = 1;
            }
        }

        if run >= 3
        {
            return true;
        }
    }

    false
}

/// Uppercase letters over alphabetic characters; 0 when there are no letters.
pub fn uppercase_ratio(text: &str) -> f64
{
    let (letters, upper) = text
        .chars()
        .filter(|c| c.is_alphabetic())
        .fold((0usize, 0usize), |(l, u), c| (l + 1, u + usize::from(c.is_uppercase())));

    if letters == 0
    {
        return 0.0;
    }

    upper as f64 / letters as f64
}

pub fn is_shouty(
    text: &str,
    threshold: f64,
) -> bool
{
    uppercase_ratio(text) >= threshold
}

/// Overlapping 3-char windows of the lower-cased, whitespace-collapsed text
pub fn char_trigrams(text: &str) -> Counter<String>
{
    let lowered = text.to_lowercase();
    let cleaned = WHITESPACE_RUN_RE.replace_all(&lowered, " ");
    let chars: Vec<char> = cleaned
        .chars()
        .collect();

    let mut c = Counter::new();
    for w in chars.windows(3)
    {
        if w.iter()
            .all(|ch| ch.is_whitespace())
        {
            continue;
        }
        c.add(
            w.iter()
                .collect::<String>(),
        );
    }
    c
}

/// Surface-word counts per sentence; wordless segments are not recorded.
pub fn sentence_word_counts(text: &str) -> Vec<usize>
{
    SENTENCE_SPLIT_RE
        .split(text)
        .map(|part| {
            surface_words(part)
                .len()
        })
        .filter(|&n| n > 0)
        .collect()
}

/// Rough typo count: long-ish alphabetic words outside the stopword and
/// common-word lists. Over- and under-counts by construction.
pub fn estimate_typos(words: &[&str]) -> usize
{
    words
        .iter()
        .filter(|w| {
            w.chars()
                .count()
                >= TYPO_MIN_WORD_LEN
        })
        .filter(|w| {
            let cleaned: String = w
                .chars()
                .filter(|c| c.is_ascii_alphabetic())
                .map(|c| c.to_ascii_lowercase())
                .collect();

            !cleaned.is_empty()
                && !is_stopword(&cleaned)
                && !is_common_word(&cleaned)
                && cleaned
                    .chars()
                    .all(|c| c.is_alphabetic())
        })
        .count()
}

/// Words of two or more characters written entirely in capitals ("OMG", "NO")
pub fn shouted_words(words: &[&str]) -> usize
{
    words
        .iter()
        .filter(|w| {
            w.chars()
                .count()
                > 1
                && w.chars()
                    .any(|c| c.is_alphabetic())
                && !w
                    .chars()
                    .any(|c| c.is_lowercase())
        })
        .count()
}
