//! Porter stemming algorithm (the original 1980 rules)
//!
//! Stems decide key names, so the rule set is fixed: five steps of suffix rewrites
//! gated on the measure `m` of the remaining stem, where a word has the form
//! `[C](VC){m}[V]`. Words shorter than three characters are returned as given.

/// Stem one word. Input longer than two characters is lower-cased first.
pub fn stem(word: &str) -> String {
    if word.chars().count() < 3 {
        return word.to_string();
    }

    let mut w = Word::new(&word.to_lowercase());
    w.step1a();
    w.step1b();
    w.step1c();
    w.step2();
    w.step3();
    w.step4();
    w.step5a();
    w.step5b();
    w.chars.into_iter().collect()
}

const STEP2: &[(&str, &str)] = &[
    ("ational", "ate"),
    ("tional", "tion"),
    ("enci", "ence"),
    ("anci", "ance"),
    ("izer", "ize"),
    ("bli", "ble"),
    ("alli", "al"),
    ("entli", "ent"),
    ("eli", "e"),
    ("ousli", "ous"),
    ("ization", "ize"),
    ("ation", "ate"),
    ("ator", "ate"),
    ("alism", "al"),
    ("iveness", "ive"),
    ("fulness", "ful"),
    ("ousness", "ous"),
    ("aliti", "al"),
    ("iviti", "ive"),
    ("biliti", "ble"),
    ("logi", "log"),
];

const STEP3: &[(&str, &str)] = &[
    ("icate", "ic"),
    ("ative", ""),
    ("alize", "al"),
    ("iciti", "ic"),
    ("ical", "ic"),
    ("ful", ""),
    ("ness", ""),
];

const STEP4: &[&str] = &[
    "al", "ance", "ence", "er", "ic", "able", "ible", "ant", "ement", "ment", "ent", "ism",
    "ate", "iti", "ous", "ive", "ize",
];

struct Word {
    chars: Vec<char>,
}

impl Word {
    fn new(word: &str) -> Self {
        Self {
            chars: word.chars().collect(),
        }
    }

    fn len(&self) -> usize {
        self.chars.len()
    }

    /// `y` is a consonant at the start or after a vowel, a vowel after a consonant
    fn is_consonant(&self, i: usize) -> bool {
        match self.chars[i] {
            'a' | 'e' | 'i' | 'o' | 'u' => false,
            'y' => i == 0 || !self.is_consonant(i - 1),
            _ => true,
        }
    }

    /// Number of vowel-consonant sequences in the first `end` characters
    fn measure(&self, end: usize) -> usize {
        let mut m = 0;
        let mut previous_vowel = false;
        for i in 0..end {
            let vowel = !self.is_consonant(i);
            if previous_vowel && !vowel {
                m += 1;
            }
            previous_vowel = vowel;
        }
        m
    }

    fn has_vowel(&self, end: usize) -> bool {
        (0..end).any(|i| !self.is_consonant(i))
    }

    fn ends_with(&self, suffix: &str) -> bool {
        let n = suffix.len();
        self.len() >= n && self.chars[self.len() - n..].iter().copied().eq(suffix.chars())
    }

    /// Length of the stem left once `suffix` is taken off
    fn stem_len(&self, suffix: &str) -> usize {
        self.len() - suffix.len()
    }

    fn replace_suffix(&mut self, suffix: &str, replacement: &str) {
        let stem = self.stem_len(suffix);
        self.chars.truncate(stem);
        self.chars.extend(replacement.chars());
    }

    fn ends_double_consonant(&self, end: usize) -> bool {
        end >= 2 && self.chars[end - 1] == self.chars[end - 2] && self.is_consonant(end - 1)
    }

    /// consonant-vowel-consonant ending, the last consonant not `w`, `x` or `y`
    fn ends_cvc(&self, end: usize) -> bool {
        end >= 3
            && self.is_consonant(end - 3)
            && !self.is_consonant(end - 2)
            && self.is_consonant(end - 1)
            && !matches!(self.chars[end - 1], 'w' | 'x' | 'y')
    }

    /// Replace the longest matching suffix when the stem measure exceeds `min`
    fn apply_rules(&mut self, rules: &[(&str, &str)], min: usize) {
        let matched = rules
            .iter()
            .filter(|(suffix, _)| self.ends_with(suffix))
            .max_by_key(|(suffix, _)| suffix.len());
        if let Some((suffix, replacement)) = matched {
            if self.measure(self.stem_len(suffix)) > min {
                self.replace_suffix(suffix, replacement);
            }
        }
    }

    fn step1a(&mut self) {
        if self.ends_with("sses") || self.ends_with("ies") {
            self.chars.truncate(self.len() - 2);
        } else if !self.ends_with("ss") && self.ends_with("s") {
            self.chars.pop();
        }
    }

    fn step1b(&mut self) {
        if self.ends_with("eed") {
            if self.measure(self.stem_len("eed")) > 0 {
                self.chars.pop();
            }
            return;
        }

        let suffix = if self.ends_with("ed") {
            "ed"
        } else if self.ends_with("ing") {
            "ing"
        } else {
            return;
        };
        if !self.has_vowel(self.stem_len(suffix)) {
            return;
        }
        self.replace_suffix(suffix, "");

        let end = self.len();
        if self.ends_with("at") || self.ends_with("bl") || self.ends_with("iz") {
            self.chars.push('e');
        } else if self.ends_double_consonant(end)
            && !matches!(self.chars[end - 1], 'l' | 's' | 'z')
        {
            self.chars.pop();
        } else if self.measure(end) == 1 && self.ends_cvc(end) {
            self.chars.push('e');
        }
    }

    fn step1c(&mut self) {
        if self.ends_with("y") && self.has_vowel(self.stem_len("y")) {
            self.replace_suffix("y", "i");
        }
    }

    fn step2(&mut self) {
        self.apply_rules(STEP2, 0);
    }

    fn step3(&mut self) {
        self.apply_rules(STEP3, 0);
    }

    fn step4(&mut self) {
        let matched = STEP4
            .iter()
            .filter(|suffix| self.ends_with(suffix))
            .max_by_key(|suffix| suffix.len());

        if let Some(suffix) = matched {
            if self.measure(self.stem_len(suffix)) > 1 {
                self.replace_suffix(suffix, "");
            }
            return;
        }

        if self.ends_with("ion") {
            let stem = self.stem_len("ion");
            if stem > 0
                && matches!(self.chars[stem - 1], 's' | 't')
                && self.measure(stem) > 1
            {
                self.replace_suffix("ion", "");
            }
        }
    }

    fn step5a(&mut self) {
        if !self.ends_with("e") {
            return;
        }
        let stem = self.stem_len("e");
        let m = self.measure(stem);
        if m > 1 || (m == 1 && !self.ends_cvc(stem)) {
            self.chars.pop();
        }
    }

    fn step5b(&mut self) {
        let end = self.len();
        if self.measure(end) > 1 && self.ends_double_consonant(end) && self.chars[end - 1] == 'l'
        {
            self.chars.pop();
        }
    }
}
