use crate::types::{AlignedWord, TokenSequence};

/// Collapses a CTC state path into word spans.
///
/// A word spans from the first to the last frame any of its label states is
/// visited; blank and separator frames never extend a word. Times are frame
/// indices scaled by `stride_secs`, with the end frame exclusive.
pub fn group_into_words(
    path: &[(usize, usize)],
    token_sequence: &TokenSequence,
    blank_id: usize,
    stride_secs: f64,
) -> Vec<AlignedWord> {
    let state_words = word_index_per_state(&token_sequence.chars);
    let mut spans: Vec<Option<(usize, usize)>> = vec![None; token_sequence.original_words.len()];

    for &(state, frame) in path {
        if token_sequence.tokens.get(state) == Some(&blank_id) {
            continue;
        }
        let Some(Some(word_idx)) = state_words.get(state) else {
            continue;
        };
        let Some(span) = spans.get_mut(*word_idx) else {
            continue;
        };
        *span = Some(match *span {
            Some((first, _)) => (first, frame),
            None => (frame, frame),
        });
    }

    spans
        .into_iter()
        .zip(&token_sequence.original_words)
        .filter_map(|(span, word)| {
            let (first, last) = span?;
            Some(AlignedWord {
                word: word.clone(),
                start: first as f64 * stride_secs,
                end: (last + 1) as f64 * stride_secs,
            })
        })
        .collect()
}

/// Maps each token state to the word its label belongs to. Blanks and
/// separators map to `None`.
fn word_index_per_state(chars: &[Option<char>]) -> Vec<Option<usize>> {
    let mut word_idx = 0usize;
    let mut seen_label = false;
    chars
        .iter()
        .map(|c| match c {
            Some('|') => {
                if seen_label {
                    word_idx += 1;
                    seen_label = false;
                }
                None
            }
            Some(_) => {
                seen_label = true;
                Some(word_idx)
            }
            None => None,
        })
        .collect()
}
