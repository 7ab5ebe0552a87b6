//! Free-text normalization
//!
//! Text goes through word extraction, stopword removal, Porter stemming and
//! phonetic folding. The phonetic class of each stem is what ends up in index keys.
//! Stop words are matched as written, so "The" survives and folds to class `0`;
//! the stemmer lower-cases everything longer than two characters.

use crate::search::phonetic::metaphone;
use crate::search::porter;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

/// Runs of Unicode letters and underscores
static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\p{L}_]+").expect("invalid word pattern"));

/// English stop words removed before stemming.
const ENGLISH_STOP_WORDS: &[&str] = &[
    "about", "above", "after", "again", "all", "also", "am", "an", "and", "another", "any",
    "are", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "came", "can", "cannot", "come", "could", "did", "do", "does", "doing",
    "during", "each", "few", "for", "from", "further", "get", "got", "has", "had", "he",
    "have", "her", "here", "him", "himself", "his", "how", "if", "in", "into", "is", "it",
    "its", "itself", "like", "make", "many", "me", "might", "more", "most", "much", "must",
    "my", "myself", "never", "now", "of", "on", "only", "or", "other", "our", "ours",
    "ourselves", "out", "over", "own", "said", "same", "see", "should", "since", "so", "some",
    "still", "such", "take", "than", "that", "the", "their", "theirs", "them", "themselves",
    "then", "there", "these", "they", "this", "those", "through", "to", "too", "under",
    "until", "up", "very", "was", "way", "we", "well", "were", "what", "where", "when",
    "which", "while", "who", "whom", "with", "would", "why", "you", "your", "yours",
    "yourself", "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m", "n", "o",
    "p", "q", "r", "s", "t", "u", "v", "w", "x", "y", "z", "$", "1", "2", "3", "4", "5", "6",
    "7", "8", "9", "0", "_",
];

static STOP_WORDS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| ENGLISH_STOP_WORDS.iter().copied().collect());

/// A phonetic class and the frequency stored for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermFrequency {
    pub class: String,
    pub frequency: usize,
}

/// Text normalizer shared by the index writer and the query planner
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer;

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    /// Words as written, in order
    pub fn words(text: &str) -> Vec<&str> {
        WORD.find_iter(text).map(|m| m.as_str()).collect()
    }

    pub fn is_stop_word(word: &str) -> bool {
        STOP_WORDS.contains(word)
    }

    /// Stems of every non-stopword, in order, duplicates kept
    pub fn stems(&self, text: &str) -> Vec<String> {
        Self::words(text)
            .into_iter()
            .filter(|word| !Self::is_stop_word(word))
            .map(porter::stem)
            .collect()
    }

    /// Phonetic classes to index, in order of first occurrence.
    ///
    /// The frequency is the occurrence count of a stem. When several distinct stems
    /// fold into one class, the stem seen last among them sets the frequency.
    pub fn index_terms(&self, text: &str) -> Vec<TermFrequency> {
        let stems = self.stems(text);

        let mut counts: HashMap<&str, usize> = HashMap::new();
        let mut distinct: Vec<&str> = Vec::new();
        for stem in &stems {
            let count = counts.entry(stem.as_str()).or_insert(0);
            if *count == 0 {
                distinct.push(stem.as_str());
            }
            *count += 1;
        }

        let mut terms: Vec<TermFrequency> = Vec::new();
        for stem in distinct {
            let class = metaphone(stem);
            let frequency = counts[stem];
            match terms.iter_mut().find(|term| term.class == class) {
                Some(term) => term.frequency = frequency,
                None => terms.push(TermFrequency { class, frequency }),
            }
        }
        terms
    }

    /// Distinct phonetic classes of the text, in order of first occurrence
    pub fn query_terms(&self, text: &str) -> Vec<String> {
        let mut classes: Vec<String> = Vec::new();
        for stem in self.stems(text) {
            let class = metaphone(&stem);
            if !classes.contains(&class) {
                classes.push(class);
            }
        }
        classes
    }
}
