use std::collections::HashMap;

use crate::types::TokenSequence;

/// Builds a blank-interleaved CTC target sequence from a transcript.
///
/// Casing follows the vocabulary: uppercase-only vocabularies get an
/// uppercased transcript, everything else is lowercased. Characters absent
/// from the vocabulary are dropped and words left empty are skipped. The
/// word separator never appears inside a word, so a literal `|` in the
/// transcript is dropped too.
pub fn build_token_sequence_case_aware(
    transcript: &str,
    vocab: &HashMap<char, usize>,
    blank_id: usize,
    word_sep_id: usize,
) -> TokenSequence {
    let uppercase_vocab = is_uppercase_only(vocab);

    let mut tokens = vec![blank_id];
    let mut chars: Vec<Option<char>> = vec![None];
    let mut normalized_words = Vec::new();
    let mut original_words = Vec::new();

    for word in transcript.split_whitespace() {
        let cased = if uppercase_vocab {
            word.to_uppercase()
        } else {
            word.to_lowercase()
        };
        let emitted: Vec<(char, usize)> = cased
            .chars()
            .filter(|&c| c != '|')
            .filter_map(|c| vocab.get(&c).map(|&id| (c, id)))
            .filter(|&(_, id)| id != word_sep_id && id != blank_id)
            .collect();
        if emitted.is_empty() {
            continue;
        }

        if !normalized_words.is_empty() {
            tokens.push(word_sep_id);
            chars.push(Some('|'));
            tokens.push(blank_id);
            chars.push(None);
        }

        let mut normalized_word = String::with_capacity(emitted.len());
        for (c, id) in emitted {
            tokens.push(id);
            chars.push(Some(c));
            tokens.push(blank_id);
            chars.push(None);
            normalized_word.push(c);
        }
        normalized_words.push(normalized_word);
        original_words.push(word.to_string());
    }

    TokenSequence {
        tokens,
        chars,
        normalized_words,
        original_words,
    }
}

fn is_uppercase_only(vocab: &HashMap<char, usize>) -> bool {
    let mut has_upper = false;
    let mut has_lower = false;
    for c in vocab.keys().copied().filter(|c| c.is_alphabetic()) {
        has_upper |= c.is_uppercase();
        has_lower |= c.is_lowercase();
    }
    has_upper && !has_lower
}
