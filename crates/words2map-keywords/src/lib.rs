//! Keyword research primitives.
//!
//! Turns page text into scored keywords: tokenization with stopword
//! filtering, n-gram collocation extraction with redundancy pruning, and a
//! frequency × rarity score using the embedding model's training order.
//!
//! # Main types
//!
//! - [`CollocationExtractor`] — Finds salient unigrams, bigrams and trigrams.
//! - [`KeywordScorer`] — Scores collocations against a vector store.
//! - [`KeywordTally`] — Sums keyword scores across documents.

/// Collocation extraction.
pub mod collocation;
/// Keyword scoring and accumulation.
pub mod scorer;
/// English stopword list.
pub mod stopwords;
/// Word tokenizer.
pub mod tokenize;

pub use collocation::CollocationExtractor;
pub use scorer::{score, KeywordScorer, KeywordTally};
pub use stopwords::is_stopword;
pub use tokenize::tokenize;
