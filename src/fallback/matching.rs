//! Lexical cue matching for fallback replies.

use log::debug;
use strsim::normalized_levenshtein;

/// Similarity above which a misspelt word still counts as a keyword hit.
/// One edit in a six-letter keyword scores about 0.83, so only longer keywords tolerate typos.
const FUZZY_THRESHOLD: f64 = 0.85;

/// Shortest keyword that is also matched fuzzily; shorter ones must match exactly.
const FUZZY_MIN_LEN: usize = 6;

#[derive(Debug, Clone, Copy)]
/// What a question must look like for a fallback rule to apply.
pub enum Cue {
    /// Nothing meaningful was asked (fewer than two characters).
    Empty,
    /// One of these words appears as a whole word.
    Word(&'static [&'static str]),
    /// One of these phrases appears anywhere.
    Phrase(&'static [&'static str]),
    /// One of these keywords appears anywhere, or a word is a close misspelling of it.
    Keyword(&'static [&'static str]),
    /// The raw question contains this character.
    Char(char),
    /// Always applies.
    Any,
}

impl Cue {
    /// Returns true when `question` carries this cue.
    pub fn matches(&self, question: &str) -> bool {
        match self {
            Cue::Empty => question.trim().chars().count() < 2,
            Cue::Char(c) => question.contains(*c),
            Cue::Any => true,
            Cue::Word(words) => {
                let normalized = normalize(question);
                normalized
                    .split_whitespace()
                    .any(|token| words.contains(&token))
            }
            Cue::Phrase(phrases) => {
                let normalized = normalize(question);
                phrases.iter().any(|phrase| normalized.contains(phrase))
            }
            Cue::Keyword(keywords) => {
                let normalized = normalize(question);
                let tokens: Vec<&str> = normalized.split_whitespace().collect();
                keywords
                    .iter()
                    .any(|keyword| normalized.contains(keyword) || fuzzy_hit(&tokens, keyword))
            }
        }
    }
}

fn normalize(input: &str) -> String {
    input
        .to_lowercase()
        .chars()
        .map(|c| if c == '\'' { ' ' } else { c })
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn fuzzy_hit(tokens: &[&str], keyword: &str) -> bool {
    if keyword.chars().count() < FUZZY_MIN_LEN {
        return false;
    }

    let first = keyword.chars().next();
    // A different first letter makes a different word ("leather"), not a typo.
    for token in tokens.iter().filter(|t| t.chars().next() == first) {
        let sim = normalized_levenshtein(token, keyword);
        if sim >= FUZZY_THRESHOLD {
            debug!("Fallback cue: fuzzy hit (token='{token}', keyword='{keyword}', sim={sim:.3})");
            return true;
        }
    }
    false
}
