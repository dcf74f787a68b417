pub mod grouping;
pub mod session;
pub mod tokenization;
pub mod viterbi;
