//! Word cleaning, counting, and frequency ranking over extracted text.
//!
//! The cleaning pipeline mirrors the rest of the core: a pure transformation
//! from raw page text to a normalized word stream, with stop words and
//! non-alphabetic tokens dropped before any counting happens.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::stopwords::is_stop_word;

/// Default size of the frequency ranking.
pub const TOP_WORDS_DEFAULT: usize = 10;

/// Characters trimmed from both ends of a token before filtering.
const PUNCTUATION: &[char] = &[
    '.', ',', '!', '?', ';', ':', '"', '\'', '(', ')', '[', ']', '{', '}',
];

/// One row of the frequency ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordFrequency {
    pub word: String,
    pub count: usize,
}

/// Normalize raw text into the cleaned word stream.
///
/// NFKC-normalizes (ligatures and presentation forms from PDF fonts fold back
/// to plain letters), lowercases, splits on whitespace, trims surrounding
/// punctuation, and keeps only purely alphabetic non-stop-words.
pub fn clean_words(text: &str) -> Vec<String> {
    let normalized: String = text.nfkc().collect::<String>().to_lowercase();
    normalized
        .split_whitespace()
        .map(|token| token.trim_matches(|c: char| PUNCTUATION.contains(&c)))
        .filter(|word| {
            !word.is_empty()
                && word.chars().all(char::is_alphabetic)
                && !is_stop_word(word)
        })
        .map(str::to_string)
        .collect()
}

/// Total whitespace-separated token count of the raw text.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Number of distinct cleaned words.
pub fn vocabulary_size(text: &str) -> usize {
    clean_words(text).into_iter().collect::<BTreeSet<_>>().len()
}

/// The `limit` most frequent cleaned words, count-descending.
///
/// Ties break alphabetically so the ranking is deterministic.
pub fn top_words(text: &str, limit: usize) -> Vec<WordFrequency> {
    let mut frequencies: HashMap<String, usize> = HashMap::new();
    for word in clean_words(text) {
        *frequencies.entry(word).or_insert(0) += 1;
    }

    let mut ranking: Vec<WordFrequency> = frequencies
        .into_iter()
        .map(|(word, count)| WordFrequency { word, count })
        .collect();
    ranking.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.word.cmp(&b.word)));
    ranking.truncate(limit);
    ranking
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_lowers_and_strips_punctuation() {
        let words = clean_words("Proteins, Enzymes; (Lipids)!");
        assert_eq!(words, vec!["proteins", "enzymes", "lipids"]);
    }

    #[test]
    fn clean_drops_stop_words_and_numbers() {
        let words = clean_words("the quick fox jumped over 42 lazy dogs");
        assert_eq!(words, vec!["quick", "fox", "jumped", "lazy", "dogs"]);
    }

    #[test]
    fn clean_drops_mixed_alphanumeric_tokens() {
        // "4g" and "b2b" are not purely alphabetic.
        let words = clean_words("4g networks enable b2b commerce");
        assert_eq!(words, vec!["networks", "enable", "commerce"]);
    }

    #[test]
    fn clean_folds_ligatures() {
        // U+FB01 LATIN SMALL LIGATURE FI, common in PDF-extracted text.
        let words = clean_words("e\u{FB01}cient");
        assert_eq!(words, vec!["eficient"]);
    }

    #[test]
    fn clean_empty_input() {
        assert!(clean_words("").is_empty());
        assert!(clean_words("   \n\t  ").is_empty());
    }

    #[test]
    fn word_count_is_raw_token_count() {
        assert_eq!(word_count("the cat sat on the mat"), 6);
        assert_eq!(word_count(""), 0);
    }

    #[test]
    fn vocabulary_counts_distinct_cleaned_words() {
        // "cat" twice, "mat" once; stop words excluded entirely.
        assert_eq!(vocabulary_size("the cat and the cat on a mat"), 2);
    }

    #[test]
    fn top_words_ranks_by_count() {
        let text = "apple apple apple banana banana cherry";
        let ranking = top_words(text, 10);
        assert_eq!(
            ranking,
            vec![
                WordFrequency { word: "apple".into(), count: 3 },
                WordFrequency { word: "banana".into(), count: 2 },
                WordFrequency { word: "cherry".into(), count: 1 },
            ]
        );
    }

    #[test]
    fn top_words_ties_break_alphabetically() {
        let ranking = top_words("zebra zebra mango mango", 10);
        assert_eq!(ranking[0].word, "mango");
        assert_eq!(ranking[1].word, "zebra");
    }

    #[test]
    fn top_words_respects_limit() {
        let text = "a1x b1x c1x d1x one two three four five six seven eight";
        assert_eq!(top_words(text, 3).len(), 3);
    }

    #[test]
    fn top_words_empty_text() {
        assert!(top_words("", TOP_WORDS_DEFAULT).is_empty());
    }
}
