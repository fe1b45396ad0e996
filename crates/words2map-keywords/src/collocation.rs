use std::collections::{HashMap, HashSet};
use words2map_core::{Collocation, ResearchConfig};

/// Below this fraction of the constituents' geometric mean likelihood an
/// n-gram is treated as a chance co-occurrence.
const COLLOCATION_RATIO: f64 = 0.5;

/// Extracts n-gram collocations from a token sequence.
///
/// Counts every contiguous n-gram up to `max_ngram` tokens, keeps those seen
/// at least `min_frequency` times, then prunes redundancy: an n-gram whose
/// likelihood reaches half the geometric mean of its unigram likelihoods is a
/// collocation and removes its constituents and shorter sub-grams; otherwise
/// the n-gram itself is dropped and its parts stand alone.
#[derive(Debug, Clone)]
pub struct CollocationExtractor {
    min_frequency: usize,
    max_ngram: usize,
}

#[derive(Debug)]
struct NGram {
    key: String,
    len: usize,
    count: usize,
}

impl CollocationExtractor {
    /// Extractor with explicit thresholds.
    pub fn new(min_frequency: usize, max_ngram: usize) -> Self {
        Self {
            min_frequency,
            max_ngram: max_ngram.max(1),
        }
    }

    /// Extractor using the thresholds from `config`.
    pub fn from_config(config: &ResearchConfig) -> Self {
        Self::new(config.min_frequency, config.max_ngram)
    }

    /// Collocations in `tokens`, most frequent first. Equal frequencies keep
    /// the order in which the n-grams were first seen.
    pub fn extract<S: AsRef<str>>(&self, tokens: &[S]) -> Vec<Collocation> {
        let total = tokens.len();
        if total == 0 {
            return Vec::new();
        }

        let candidates: Vec<NGram> = self
            .count(tokens)
            .into_iter()
            .filter(|g| g.count >= self.min_frequency)
            .collect();

        let likelihood: HashMap<&str, f64> = candidates
            .iter()
            .map(|g| (g.key.as_str(), g.count as f64 / total as f64))
            .collect();

        let mut dropped: HashSet<&str> = HashSet::new();
        let mut superseded: HashSet<String> = HashSet::new();

        for gram in candidates.iter().filter(|g| g.len > 1) {
            let parts: Vec<&str> = gram.key.split('_').collect();
            let Some(mean) = geometric_mean(parts.iter().map(|p| likelihood.get(p).copied()))
            else {
                dropped.insert(&gram.key);
                continue;
            };

            if likelihood[gram.key.as_str()] < COLLOCATION_RATIO * mean {
                dropped.insert(&gram.key);
            } else {
                for n in 1..parts.len() {
                    for window in parts.windows(n) {
                        superseded.insert(window.join("_"));
                    }
                }
            }
        }

        let mut collocations: Vec<Collocation> = candidates
            .iter()
            .filter(|g| !dropped.contains(g.key.as_str()) && !superseded.contains(&g.key))
            .map(|g| Collocation {
                text: g.key.clone(),
                frequency: likelihood[g.key.as_str()],
            })
            .collect();

        // Stable: ties stay in discovery order.
        collocations.sort_by(|a, b| {
            b.frequency
                .partial_cmp(&a.frequency)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        collocations
    }

    /// Raw counts of every n-gram, in discovery order.
    fn count<S: AsRef<str>>(&self, tokens: &[S]) -> Vec<NGram> {
        let mut grams: Vec<NGram> = Vec::new();
        let mut position: HashMap<String, usize> = HashMap::new();

        for start in 0..tokens.len() {
            for len in 1..=self.max_ngram {
                let Some(window) = tokens.get(start..start + len) else {
                    break;
                };
                let key = window
                    .iter()
                    .map(|t| t.as_ref())
                    .collect::<Vec<&str>>()
                    .join("_");
                match position.get(&key) {
                    Some(&i) => grams[i].count += 1,
                    None => {
                        position.insert(key.clone(), grams.len());
                        grams.push(NGram { key, len, count: 1 });
                    }
                }
            }
        }

        grams
    }
}

impl Default for CollocationExtractor {
    fn default() -> Self {
        Self::from_config(&ResearchConfig::default())
    }
}

/// Geometric mean of the values, `None` if any is missing or none are given.
fn geometric_mean<I: Iterator<Item = Option<f64>>>(values: I) -> Option<f64> {
    let mut log_sum = 0.0;
    let mut n = 0usize;
    for value in values {
        log_sum += value?.ln();
        n += 1;
    }
    if n == 0 {
        return None;
    }
    Some((log_sum / n as f64).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(text: &str) -> Vec<String> {
        text.split_whitespace().map(str::to_string).collect()
    }

    fn texts(collocations: &[Collocation]) -> Vec<&str> {
        collocations.iter().map(|c| c.text.as_str()).collect()
    }

    #[test]
    fn test_new_york_supersedes_parts() {
        let extractor = CollocationExtractor::new(3, 3);
        let result = extractor.extract(&tokens("new york new york new york city"));
        assert_eq!(texts(&result), vec!["new_york"]);
        assert!((result[0].frequency - 3.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_below_threshold_is_empty() {
        let extractor = CollocationExtractor::new(3, 3);
        assert!(extractor.extract(&tokens("a b c a b d")).is_empty());
    }

    #[test]
    fn test_empty_input() {
        let extractor = CollocationExtractor::default();
        let empty: Vec<String> = Vec::new();
        assert!(extractor.extract(&empty).is_empty());
    }

    #[test]
    fn test_weak_bigram_dropped_parts_kept() {
        // x and y appear eight times each but together only twice:
        // 2/28 < 0.5 * 8/28, so the bigram is chance and both unigrams stay.
        let words = tokens("x a x b x c x d x e x f y g y h y i y j y k y l x y x y");
        let extractor = CollocationExtractor::new(2, 2);
        let result = extractor.extract(&words);
        assert_eq!(texts(&result), vec!["x", "y"]);
    }

    #[test]
    fn test_trigram_removes_sub_grams() {
        let extractor = CollocationExtractor::new(3, 3);
        let result =
            extractor.extract(&tokens("support vector machine support vector machine support vector machine"));
        assert_eq!(texts(&result), vec!["support_vector_machine"]);
    }

    #[test]
    fn test_sorted_descending_with_stable_ties() {
        let extractor = CollocationExtractor::new(1, 1);
        let result = extractor.extract(&tokens("b a c a c a"));
        assert_eq!(texts(&result), vec!["a", "c", "b"]);
    }

    #[test]
    fn test_never_returns_ngram_with_all_its_unigrams() {
        let corpora = [
            "deep learning deep learning deep learning neural deep learning networks neural",
            "one two three one two three one two one two three two",
            "a a a a b a b a b b a b",
        ];
        for corpus in corpora {
            for min in 1..4 {
                let result = CollocationExtractor::new(min, 3).extract(&tokens(corpus));
                let found: HashSet<&str> = result.iter().map(|c| c.text.as_str()).collect();
                for c in &result {
                    let parts: Vec<&str> = c.text.split('_').collect();
                    if parts.len() > 1 {
                        assert!(
                            !parts.iter().all(|p| found.contains(p)),
                            "{} returned with all its parts for {:?}",
                            c.text,
                            corpus
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_geometric_mean() {
        let mean = geometric_mean([Some(0.25), Some(1.0)].into_iter()).unwrap_or(0.0);
        assert!((mean - 0.5).abs() < 1e-12);
        assert!(geometric_mean([Some(0.5), None].into_iter()).is_none());
    }
}
