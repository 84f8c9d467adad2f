//! Post-hoc grounding check.
//!
//! The prompt asks the model to stay inside the context but nothing enforces
//! it. This measures how much of an answer's vocabulary occurs in the
//! retrieved context so weakly grounded answers can be flagged in the logs.

use std::collections::HashSet;

/// Words shorter than this are ignored ("a", "is", "of").
const MIN_WORD_LEN: usize = 3;

fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= MIN_WORD_LEN)
        .map(|w| w.to_lowercase())
}

/// Fraction of the answer's words that also occur in the context.
///
/// An answer without any countable words scores 1.0.
pub fn lexical_overlap(answer: &str, context: &str) -> f32 {
    let context_words: HashSet<String> = words(context).collect();

    let mut total = 0usize;
    let mut grounded = 0usize;
    for word in words(answer) {
        total += 1;
        if context_words.contains(&word) {
            grounded += 1;
        }
    }

    if total == 0 {
        1.0
    } else {
        grounded as f32 / total as f32
    }
}
