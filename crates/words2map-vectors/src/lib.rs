//! Word vector storage and vector arithmetic.
//!
//! Provides a read-only, memory-mapped vector store over a pretrained
//! embedding model, the mean-and-normalize combiner used to derive vectors
//! for unknown phrases, brute-force nearest-neighbour search, and the
//! word2vec text format used for export and import.
//!
//! # Main types
//!
//! - [`VectorStore`] — Trait for looking up words, training indexes and vectors.
//! - [`MmapVectorStore`] — Disk-backed store over half-precision vectors.
//! - [`InMemoryVectorStore`] — Heap-backed store for tests and small models.
//! - [`ModelWriter`] — Writes a model directory readable by [`MmapVectorStore`].
//! - [`KvReader`] / [`KvWriter`] — Append-only key/value file.
//! - [`Query`] — Nearest-neighbour query by word or by vector.

/// Mean-and-normalize vector combination.
pub mod combine;
/// word2vec text format and numbered output files.
pub mod export;
/// Append-only key/value file.
pub mod kv;
/// Cosine nearest-neighbour search.
pub mod neighbors;
/// Vector store trait and implementations.
pub mod store;

pub use combine::{combine, l2_norm};
pub use export::{next_artifact_path, read_text_vectors, write_text_vectors, TextVectors};
pub use kv::{KvReader, KvWriter};
pub use neighbors::{nearest, Neighbor, Query};
pub use store::{InMemoryVectorStore, MmapVectorStore, ModelMeta, ModelWriter, VectorStore};
