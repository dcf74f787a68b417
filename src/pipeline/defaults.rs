use std::collections::HashMap;

use crate::alignment::grouping::group_into_words;
use crate::alignment::tokenization::build_token_sequence_case_aware;
use crate::alignment::viterbi::forced_align_viterbi;
use crate::error::AlignmentError;
use crate::pipeline::traits::{SequenceAligner, Tokenizer, WordGrouper};
use crate::types::{AlignedWord, TokenSequence};

pub struct CaseAwareTokenizer;

impl Tokenizer for CaseAwareTokenizer {
    fn tokenize(
        &self,
        transcript: &str,
        vocab: &HashMap<char, usize>,
        blank_id: usize,
        word_sep_id: usize,
    ) -> TokenSequence {
        build_token_sequence_case_aware(transcript, vocab, blank_id, word_sep_id)
    }
}

pub struct ViterbiSequenceAligner;

impl SequenceAligner for ViterbiSequenceAligner {
    fn align_path(
        &self,
        log_probs: &[Vec<f32>],
        tokens: &[usize],
    ) -> Result<Vec<(usize, usize)>, AlignmentError> {
        let path = forced_align_viterbi(log_probs, tokens);
        if path.is_empty() && !log_probs.is_empty() && !tokens.is_empty() {
            return Err(AlignmentError::runtime(
                "viterbi",
                "no alignment path fits the emissions",
            ));
        }
        Ok(path)
    }
}

pub struct SpanWordGrouper;

impl WordGrouper for SpanWordGrouper {
    fn group_words(
        &self,
        path: &[(usize, usize)],
        token_sequence: &TokenSequence,
        blank_id: usize,
        stride_secs: f64,
    ) -> Vec<AlignedWord> {
        group_into_words(path, token_sequence, blank_id, stride_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_aware_tokenizer_tokenize() {
        let vocab = HashMap::from([('h', 1), ('e', 2), ('l', 3), ('o', 4), ('|', 5)]);
        let seq = CaseAwareTokenizer.tokenize("Hello", &vocab, 0, 5);
        assert!(!seq.tokens.is_empty());
        assert_eq!(seq.normalized_words, ["hello"]);
        assert_eq!(seq.original_words, ["Hello"]);
    }

    #[test]
    fn viterbi_sequence_aligner_matches_free_function() {
        let log_probs = vec![vec![0.0f32, -10.0], vec![-10.0, 0.0f32], vec![0.0, -10.0]];
        let tokens = vec![0, 1, 0];
        let path = ViterbiSequenceAligner
            .align_path(&log_probs, &tokens)
            .expect("path");
        assert_eq!(path, forced_align_viterbi(&log_probs, &tokens));
    }

    #[test]
    fn viterbi_sequence_aligner_reports_impossible_alignment() {
        let log_probs = vec![vec![0.0f32, 0.0]];
        let tokens = vec![0, 1, 0, 1, 0];
        assert!(ViterbiSequenceAligner
            .align_path(&log_probs, &tokens)
            .is_err());
    }

    #[test]
    fn span_word_grouper_delegates() {
        let token_sequence = TokenSequence {
            tokens: vec![0, 1, 0],
            chars: vec![None, Some('a'), None],
            normalized_words: vec!["a".to_string()],
            original_words: vec!["A".to_string()],
        };
        let path = vec![(0, 0), (1, 1), (2, 2)];
        let words = SpanWordGrouper.group_words(&path, &token_sequence, 0, 0.5);
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].word, "A");
        assert_eq!(words[0].start, 0.5);
        assert_eq!(words[0].end, 1.0);
    }
}
