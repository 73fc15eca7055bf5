//! Text normalization and tokenization.
//!
//! Every analytic in the crate consumes text through this module:
//! - `normalize` strips URLs and zero-width spaces
//! - `lexical_tokens` is the filtered, lower-cased vocabulary view
//! - `surface_words` is the case-preserving view used for length and typo heuristics

use std::sync::LazyLock;

use regex::Regex;

/// HTTP(S) URLs up to the next whitespace
static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+").expect("valid url regex"));

/// Lower-case lexical runs
static LEXICAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-z0-9']+").expect("valid lexical regex"));

/// Case-preserving word runs
static SURFACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9']+").expect("valid surface regex"));

/// Zero-width space emitted by some clients to break mentions/embeds
const ZERO_WIDTH_SPACE: char = '\u{200b}';

/// Longest token kept in the lexical view
pub const MAX_TOKEN_LEN: usize = 30;

/// Purely numeric tokens at least this long are platform ids, not vocabulary
pub const NUMERIC_ID_MIN_LEN: usize = 5;

/// Placeholder tokens produced by exporters for empty cells
pub const NOISE_TOKENS: &[&str] = &["missing"];

/// Function words skipped by the typo heuristic
pub const STOPWORDS: &[&str] = &[
    "a", "about", "all", "am", "an", "and", "are", "as", "at", "be", "been", "but", "by", "can",
    "could", "did", "do", "does", "for", "from", "get", "got", "had", "has", "have", "he", "her",
    "hers", "him", "his", "how", "i", "if", "ill", "im", "in", "is", "it", "its", "just", "like",
    "me", "mine", "my", "no", "not", "of", "off", "oh", "ok", "on", "or", "our", "out", "so",
    "that", "the", "their", "them", "then", "there", "these", "they", "this", "those", "to",
    "too", "up", "was", "we", "well", "were", "what", "when", "where", "who", "why", "will",
    "with", "would", "ya", "yeah", "you", "your", "youre",
];

/// Frequent English words allowed through the typo heuristic
pub const COMMON_WORDS: &[&str] = &[
    "about", "after", "again", "against", "almost", "along", "also", "always", "another",
    "around", "away", "back", "because", "before", "being", "between", "called", "could",
    "different", "during", "early", "enough", "even", "every", "family", "first", "found",
    "friend", "great", "group", "happy", "house", "important", "large", "later", "little",
    "long", "money", "morning", "mother", "never", "night", "nothing", "other", "place", "point",
    "power", "problem", "really", "right", "school", "small", "something", "sound", "state",
    "still", "story", "study", "thing", "think", "thought", "through", "under", "until", "water",
    "where", "while", "white", "woman", "world", "work", "year",
];

/// Strip URLs and zero-width spaces, then trim surrounding whitespace.
///
/// Idempotent: the output never contains a URL or a zero-width space and is
/// already trimmed.
pub fn normalize(text: &str) -> String
{
    let without_urls = URL_RE.replace_all(text, " ");
    without_urls
        .replace(ZERO_WIDTH_SPACE, " ")
        .trim()
        .to_string()
}

/// True for tokens from the fixed noise set (case-insensitive)
pub fn is_noise(token: &str) -> bool
{
    NOISE_TOKENS
        .iter()
        .any(|n| n.eq_ignore_ascii_case(token))
}

/// Digit-only strings long enough to be snowflakes or other generated ids
pub fn is_numeric_id(token: &str) -> bool
{
    token.len() >= NUMERIC_ID_MIN_LEN
        && token
            .bytes()
            .all(|b| b.is_ascii_digit())
}

pub fn is_stopword(word: &str) -> bool
{
    STOPWORDS.contains(&word)
}

pub fn is_common_word(word: &str) -> bool
{
    COMMON_WORDS.contains(&word)
}

/// Lower-cased vocabulary tokens in reading order.
pub fn lexical_tokens(text: &str) -> Vec<String>
{
    let lowered = text.to_lowercase();

    LEXICAL_RE
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|t| {
            let len = t
                .chars()
                .count();
            len > 1 && len <= MAX_TOKEN_LEN && !is_noise(t) && !is_numeric_id(t)
        })
        .map(str::to_string)
        .collect()
}

/// Case-preserving words; only the noise set is dropped.
pub fn surface_words(text: &str) -> Vec<&str>
{
    SURFACE_RE
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|w| !is_noise(w))
        .collect()
}
