//! Core types and error definitions for words2map.
//!
//! This crate provides the foundational types shared across all words2map crates,
//! including the error taxonomy, the vector/keyword data model and the research
//! configuration.
//!
//! # Main types
//!
//! - [`Words2MapError`] — Unified error enum for all words2map subsystems.
//! - [`Words2MapResult`] — Convenience alias for `Result<T, Words2MapError>`.
//! - [`ErrorKind`] — How the pipeline reacts to an error (abort, retry, skip, reject).
//! - [`VectorEntry`] — A word, its training index and its embedding.
//! - [`Collocation`] — An n-gram extracted from one document with its frequency.
//! - [`KeywordScore`] — A keyword with its accumulated relevance score.
//! - [`DerivedVector`] — The embedding derived for a phrase.
//! - [`ResearchConfig`] — Tunable heuristics of the research pipeline.

/// Research pipeline configuration.
pub mod config;

pub use config::ResearchConfig;

use serde::{Deserialize, Serialize};

// --- Error types ---

/// Top-level error type for words2map.
///
/// Each variant maps to one [`ErrorKind`], which callers use to decide whether
/// to abort the run, retry, or skip a single item.
#[derive(Debug, thiserror::Error)]
pub enum Words2MapError {
    /// The search engine refused the request because the key is invalid or
    /// the daily quota is spent.
    #[error("Search quota exhausted: {0}")]
    QuotaExhausted(String),

    /// A transient failure talking to the search engine.
    #[error("Transient search error: {0}")]
    Transient(String),

    /// The search engine kept failing after every allowed attempt.
    #[error("Search failed after {attempts} attempts: {last}")]
    SearchExhausted {
        /// Number of attempts made.
        attempts: u32,
        /// Message of the last failure.
        last: String,
    },

    /// A single page could not be fetched or decoded.
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// The key is not present in the vector store.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Vectors could not be combined (empty input, zero norm, dimension mismatch).
    #[error("Combine error: {0}")]
    Combine(String),

    /// The caller supplied unusable arguments.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The on-disk vector store is missing or malformed.
    #[error("Store error: {0}")]
    Store(String),

    /// An error in configuration parsing or validation.
    #[error("Config error: {0}")]
    Config(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`Words2MapError`].
pub type Words2MapResult<T> = Result<T, Words2MapError>;

/// How the pipeline reacts to a [`Words2MapError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Terminates the whole run.
    Fatal,
    /// The enclosing unit of work (the search step) may be retried.
    Retryable,
    /// Only the current item is lost; the batch continues.
    PerItem,
    /// Rejected up front, never retried.
    InvalidInput,
}

impl Words2MapError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transient(_) => ErrorKind::Retryable,
            Self::Fetch(_) | Self::NotFound(_) | Self::Combine(_) => ErrorKind::PerItem,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::QuotaExhausted(_)
            | Self::SearchExhausted { .. }
            | Self::Store(_)
            | Self::Config(_)
            | Self::Json(_)
            | Self::Io(_) => ErrorKind::Fatal,
        }
    }

    /// Shorthand for `self.kind() == ErrorKind::Fatal`.
    pub fn is_fatal(&self) -> bool {
        self.kind() == ErrorKind::Fatal
    }
}

// --- Data model ---

/// A word known to the embedding model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorEntry {
    /// The word or underscore-joined phrase.
    pub word: String,
    /// Embedding components.
    pub vector: Vec<f32>,
    /// Position at which the word was first seen during training.
    /// Lower means more frequent.
    pub index: u32,
}

/// An n-gram extracted from a single document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collocation {
    /// One to three tokens joined with `_`.
    pub text: String,
    /// Occurrence count divided by the document's token count.
    pub frequency: f64,
}

impl Collocation {
    /// Number of tokens in this collocation.
    pub fn len(&self) -> usize {
        self.text.split('_').count()
    }

    /// True for an empty text.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// A keyword with its relevance score accumulated over documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordScore {
    /// Collocation text as it appears in the vector store.
    pub keyword: String,
    /// Summed score, never negative.
    pub score: f64,
}

/// An embedding computed for a phrase that has no native entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedVector {
    /// The phrase that was researched.
    pub phrase: String,
    /// Unit-length vector.
    pub vector: Vec<f32>,
    /// Keywords whose vectors were combined, best first.
    pub keywords: Vec<KeywordScore>,
}
