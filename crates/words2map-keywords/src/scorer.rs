use crate::stopwords::is_stopword;
use std::collections::HashMap;
use tracing::debug;
use words2map_core::{Collocation, KeywordScore, ResearchConfig};
use words2map_vectors::VectorStore;

/// Relevance of a keyword: its frequency weighted by rarity.
///
/// Models are usually trained on a corpus consumed in frequency-descending
/// order, so a higher training index means a rarer word. `training_index /
/// max_index` stands in for inverse document frequency.
pub fn score(frequency: f64, training_index: u32, max_index: u32) -> f64 {
    if max_index == 0 {
        return 0.0;
    }
    frequency * (f64::from(training_index) / f64::from(max_index))
}

/// Scores collocations found in one document against a vector store.
#[derive(Debug, Clone, Copy)]
pub struct KeywordScorer {
    max_index: u32,
}

impl KeywordScorer {
    /// Scorer with an explicit rarity denominator.
    pub fn new(max_index: u32) -> Self {
        Self { max_index }
    }

    /// Scorer using `config.max_word_index`, or the store size when unset.
    pub fn for_store(store: &dyn VectorStore, config: &ResearchConfig) -> Self {
        let max_index = config
            .max_word_index
            .unwrap_or_else(|| u32::try_from(store.len()).unwrap_or(u32::MAX));
        Self::new(max_index)
    }

    /// Rarity denominator in use.
    pub fn max_index(&self) -> u32 {
        self.max_index
    }

    /// Score every usable collocation of one document.
    ///
    /// Collocations without a training index can never contribute a vector and
    /// are skipped, as are stopwords (case-insensitive) and zero scores.
    pub fn score_document(
        &self,
        collocations: &[Collocation],
        store: &dyn VectorStore,
    ) -> KeywordTally {
        let mut tally = KeywordTally::new();
        let mut skipped = 0usize;

        for collocation in collocations {
            let Some(index) = store.index_of(&collocation.text) else {
                skipped += 1;
                continue;
            };
            if is_stopword(&collocation.text.to_lowercase()) {
                skipped += 1;
                continue;
            }
            let value = score(collocation.frequency, index, self.max_index);
            if value <= 0.0 {
                skipped += 1;
                continue;
            }
            tally.add(&collocation.text, value);
        }

        debug!(
            scored = tally.len(),
            skipped,
            "Scored document collocations"
        );
        tally
    }
}

/// Keyword scores summed across documents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeywordTally {
    scores: HashMap<String, f64>,
}

impl KeywordTally {
    /// Empty tally.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `value` to `keyword`'s running score.
    pub fn add(&mut self, keyword: &str, value: f64) {
        *self.scores.entry(keyword.to_string()).or_insert(0.0) += value;
    }

    /// Fold another tally into this one, summing by keyword.
    pub fn merge(&mut self, other: KeywordTally) {
        for (keyword, value) in other.scores {
            *self.scores.entry(keyword).or_insert(0.0) += value;
        }
    }

    /// Current score of `keyword`.
    pub fn get(&self, keyword: &str) -> Option<f64> {
        self.scores.get(keyword).copied()
    }

    /// Number of distinct keywords.
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// True when nothing was scored.
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// All keywords, best first; equal scores ordered by keyword.
    pub fn ranked(&self) -> Vec<KeywordScore> {
        let mut ranked: Vec<KeywordScore> = self
            .scores
            .iter()
            .map(|(keyword, &score)| KeywordScore {
                keyword: keyword.clone(),
                score,
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.keyword.cmp(&b.keyword))
        });
        ranked
    }

    /// At most `n` best keywords.
    pub fn top(&self, n: usize) -> Vec<KeywordScore> {
        let mut ranked = self.ranked();
        ranked.truncate(n);
        ranked
    }
}

impl FromIterator<(String, f64)> for KeywordTally {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        let mut tally = Self::new();
        for (keyword, value) in iter {
            tally.add(&keyword, value);
        }
        tally
    }
}
