//! Metaphone phonetic folding
//!
//! Reduces a (stemmed, lower-case) word to a coarse phonetic class. Words that sound
//! alike share a class, so `"emerald"` and `"emmerald"` land on the same index key.
//! Rules are applied in a fixed order over the whole word; the result is upper-case
//! and is not truncated.

use once_cell::sync::Lazy;
use regex::Regex;

struct Rule {
    pattern: Regex,
    replacement: &'static str,
    first_only: bool,
}

impl Rule {
    fn all(pattern: &str, replacement: &'static str) -> Self {
        Self {
            pattern: Regex::new(pattern).expect("invalid metaphone rule"),
            replacement,
            first_only: false,
        }
    }

    fn first(pattern: &str, replacement: &'static str) -> Self {
        Self {
            first_only: true,
            ..Self::all(pattern, replacement)
        }
    }

    fn apply(&self, word: &str) -> String {
        if self.first_only {
            self.pattern.replace(word, self.replacement).into_owned()
        } else {
            self.pattern.replace_all(word, self.replacement).into_owned()
        }
    }
}

static RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        Rule::all(r"mb$", "m"),
        Rule::all(r"ck", "k"),
        // C
        Rule::all(r"([^s]|^)(c)(h)", "${1}x${3}"),
        Rule::all(r"cia", "xia"),
        Rule::all(r"c([iey])", "s${1}"),
        Rule::all(r"c", "k"),
        // D
        Rule::all(r"d(ge|gy|gi)", "j${1}"),
        Rule::all(r"d", "t"),
        // silent G
        Rule::all(r"gh([^aeiou])", "h${1}"),
        Rule::all(r"g(n|ned)$", "${1}"),
        // G
        Rule::all(r"gh", "f"),
        Rule::all(r"([^g]|^)(g)([iey])", "${1}j${3}"),
        Rule::all(r"gg", "g"),
        Rule::all(r"g", "k"),
        // silent H
        Rule::all(r"([aeiou])h([^aeiou]|$)", "${1}${2}"),
        Rule::all(r"ph", "f"),
        Rule::all(r"q", "k"),
        Rule::all(r"s(h|io|ia)", "x${1}"),
        // X
        Rule::all(r"^x", "s"),
        Rule::all(r"x", "ks"),
        // T
        Rule::all(r"t(ia|io)", "x${1}"),
        Rule::first(r"th", "0"),
        Rule::all(r"tch", "ch"),
        Rule::all(r"v", "f"),
        Rule::all(r"^wh", "w"),
        Rule::all(r"w([^aeiou]|$)", "${1}"),
        Rule::all(r"y([^aeiou]|$)", "${1}"),
        Rule::first(r"z", "s"),
    ]
});

/// Collapse adjacent duplicate letters (except `c`), pairwise left to right
fn dedup(word: &str) -> String {
    let chars: Vec<char> = word.chars().collect();
    let mut out = String::with_capacity(word.len());
    let mut i = 0;
    while i < chars.len() {
        out.push(chars[i]);
        if chars[i] != 'c' && i + 1 < chars.len() && chars[i + 1] == chars[i] {
            i += 2;
        } else {
            i += 1;
        }
    }
    out
}

fn drop_initial_letter(word: String) -> String {
    const SILENT_PAIRS: [&str; 5] = ["kn", "gn", "pn", "ae", "wr"];
    if SILENT_PAIRS.iter().any(|pair| word.starts_with(pair)) {
        word[1..].to_string()
    } else {
        word
    }
}

/// Keep the first character, drop every later vowel
fn drop_vowels(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => std::iter::once(first)
            .chain(chars.filter(|c| !matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')))
            .collect(),
        None => String::new(),
    }
}

/// Phonetic class of a word
pub fn metaphone(word: &str) -> String {
    let word = drop_initial_letter(dedup(&word.to_lowercase()));
    let folded = RULES.iter().fold(word, |acc, rule| rule.apply(&acc));
    drop_vowels(&folded).to_uppercase()
}
