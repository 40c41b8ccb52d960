//! Review text normalization and word-frequency counting for word clouds.

use crate::models::{ReviewRecord, TextField, WordCount};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::ops::RangeInclusive;
use std::sync::OnceLock;

/// English stopwords dropped before counting.
const STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "aren't", "as", "at", "be", "because", "been", "before", "being", "below", "between",
    "both", "but", "by", "can", "can't", "cannot", "com", "could", "couldn't", "did", "didn't",
    "do", "does", "doesn't", "doing", "don't", "down", "during", "each", "else", "ever", "few",
    "for", "from", "further", "get", "had", "hadn't", "has", "hasn't", "have", "haven't",
    "having", "he", "he'd", "he'll", "he's", "hence", "her", "here", "here's", "hers", "herself",
    "him", "himself", "his", "how", "how's", "however", "http", "i", "i'd", "i'll", "i'm",
    "i've", "if", "in", "into", "is", "isn't", "it", "it's", "its", "itself", "just", "k",
    "let's", "like", "me", "more", "most", "mustn't", "my", "myself", "no", "nor", "not", "of",
    "off", "on", "once", "only", "or", "other", "otherwise", "ought", "our", "ours",
    "ourselves", "out", "over", "own", "r", "same", "shall", "shan't", "she", "she'd",
    "she'll", "she's", "should", "shouldn't", "since", "so", "some", "such", "than", "that",
    "that's", "the", "their", "theirs", "them", "themselves", "then", "there", "there's",
    "therefore", "these", "they", "they'd", "they'll", "they're", "they've", "this", "those",
    "through", "to", "too", "under", "until", "up", "very", "was", "wasn't", "we", "we'd",
    "we'll", "we're", "we've", "were", "weren't", "what", "what's", "when", "when's", "where",
    "where's", "which", "while", "who", "who's", "whom", "why", "why's", "with", "won't",
    "would", "wouldn't", "www", "you", "you'd", "you'll", "you're", "you've", "your", "yours",
    "yourself", "yourselves",
];

fn tag_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<.*?>").expect("valid tag regex"))
}

fn non_word_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-zA-Z0-9\s']").expect("valid character regex"))
}

fn stopwords() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| STOPWORDS.iter().copied().collect())
}

/// Normalize review text for word counting.
///
/// HTML entities are decoded, tags and punctuation become spaces, the
/// text is lowercased and single-character tokens other than `i` and `a`
/// are dropped. Applying it twice gives the same result as once.
pub fn normalize_text(text: &str) -> String {
    let decoded = html_escape::decode_html_entities(text);
    let without_tags = tag_pattern().replace_all(&decoded, " ");
    let cleaned = non_word_pattern()
        .replace_all(&without_tags, " ")
        .to_lowercase();

    cleaned
        .split_whitespace()
        .filter(|token| token.len() > 1 || *token == "i" || *token == "a")
        .collect::<Vec<_>>()
        .join(" ")
}

/// Keep roughly `fraction` of the items, deterministically for a seed.
pub fn sample<'a, T>(items: Vec<&'a T>, fraction: f64, seed: u64) -> Vec<&'a T> {
    if fraction >= 1.0 {
        return items;
    }
    if fraction <= 0.0 {
        return Vec::new();
    }

    let mut rng = StdRng::seed_from_u64(seed);
    items
        .into_iter()
        .filter(|_| rng.gen_bool(fraction))
        .collect()
}

/// Reviews whose rating lies within `ratings`.
pub fn reviews_in_ratings<'a>(
    reviews: &'a [ReviewRecord],
    ratings: &RangeInclusive<u8>,
) -> Vec<&'a ReviewRecord> {
    reviews
        .iter()
        .filter(|r| ratings.contains(&r.rating.get()))
        .collect()
}

/// Normalized text of the chosen field across the given reviews.
pub fn corpus(reviews: &[&ReviewRecord], field: TextField) -> String {
    reviews
        .iter()
        .map(|r| match field {
            TextField::ReviewText => normalize_text(&r.review_text),
            TextField::TitleText => normalize_text(&r.title_text),
        })
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalized text of every review within `ratings`.
pub fn filtered_corpus(
    reviews: &[ReviewRecord],
    ratings: &RangeInclusive<u8>,
    field: TextField,
) -> String {
    corpus(&reviews_in_ratings(reviews, ratings), field)
}

/// Most frequent non-stopword tokens, at most `max_words`.
///
/// Possessive `'s` is folded into the base word and purely numeric tokens
/// are ignored. Ties are broken alphabetically.
pub fn word_frequencies(corpus: &str, max_words: usize) -> Vec<WordCount> {
    let stop = stopwords();
    let mut counts: HashMap<&str, u64> = HashMap::new();

    for token in corpus.split_whitespace() {
        let token = token.strip_suffix("'s").unwrap_or(token).trim_matches('\'');
        if token.is_empty() || stop.contains(token) || token.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        *counts.entry(token).or_default() += 1;
    }

    let mut words: Vec<WordCount> = counts
        .into_iter()
        .map(|(word, count)| WordCount {
            word: word.to_string(),
            count,
        })
        .collect();
    words.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.word.cmp(&b.word)));
    words.truncate(max_words);
    words
}
