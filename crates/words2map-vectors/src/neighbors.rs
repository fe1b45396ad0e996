use crate::combine::l2_norm;
use crate::store::{normalize_key, VectorStore};
use serde::Serialize;
use words2map_core::{Words2MapError, Words2MapResult};

/// What to search neighbours for.
#[derive(Debug, Clone, Default)]
pub struct Query {
    /// A word in the store.
    pub word: Option<String>,
    /// An arbitrary vector of the store's dimension.
    pub vector: Option<Vec<f32>>,
}

impl Query {
    /// Neighbours of a stored word.
    pub fn word(word: impl Into<String>) -> Self {
        Self {
            word: Some(word.into()),
            vector: None,
        }
    }

    /// Neighbours of a vector.
    pub fn vector(vector: Vec<f32>) -> Self {
        Self {
            word: None,
            vector: Some(vector),
        }
    }
}

/// One search hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Neighbor {
    /// Word in the store.
    pub word: String,
    /// Cosine similarity to the query.
    pub similarity: f32,
}

/// The `k` words most similar to `query` by cosine similarity, best first.
///
/// A word query never returns the word itself. The word takes precedence when
/// both are set. A query with neither a word nor a non-zero vector is rejected.
pub fn nearest(store: &dyn VectorStore, query: &Query, k: usize) -> Words2MapResult<Vec<Neighbor>> {
    let (target, exclude) = match (&query.word, &query.vector) {
        (Some(word), _) if !word.is_empty() => {
            let entry = store
                .lookup(word)
                .ok_or_else(|| Words2MapError::NotFound(word.clone()))?;
            (entry.vector, Some(entry.index))
        }
        (_, Some(vector)) if vector.iter().any(|&x| x != 0.0) => {
            if vector.len() != store.dimension() {
                return Err(Words2MapError::InvalidInput(format!(
                    "Query vector has {} components, store has {}",
                    vector.len(),
                    store.dimension()
                )));
            }
            (vector.clone(), None)
        }
        _ => {
            return Err(Words2MapError::InvalidInput(
                "Provide a word or a non-zero vector to search neighbours, e.g. word = \"humanity\""
                    .to_string(),
            ));
        }
    };

    let target_norm = l2_norm(&target);
    let count = u32::try_from(store.len()).unwrap_or(u32::MAX);
    let mut scored: Vec<(u32, f32)> = (0..count)
        .filter(|i| Some(*i) != exclude)
        .filter_map(|i| {
            let row = store.vector_at(i)?;
            Some((i, cosine(&target, target_norm, &row)))
        })
        .collect();

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(k);

    Ok(scored
        .into_iter()
        .filter_map(|(i, similarity)| {
            store.word_at(i).map(|word| Neighbor {
                word: normalize_key(&word),
                similarity,
            })
        })
        .collect())
}

fn cosine(a: &[f32], a_norm: f32, b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let b_norm = l2_norm(b);
    if a_norm == 0.0 || b_norm == 0.0 {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    dot / (a_norm * b_norm)
}
