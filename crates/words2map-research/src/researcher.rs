use crate::fetch::PageFetcher;
use crate::search::{SearchEngine, SearchHit};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use words2map_core::{
    DerivedVector, ErrorKind, KeywordScore, ResearchConfig, Words2MapError, Words2MapResult,
};
use words2map_keywords::{tokenize, CollocationExtractor, KeywordScorer, KeywordTally};
use words2map_vectors::{combine, VectorStore};

/// Outcome of deriving vectors for a batch of phrases.
#[derive(Debug, Clone, Default)]
pub struct DeriveReport {
    /// Phrases that produced a vector, in input order.
    pub derived: Vec<DerivedVector>,
    /// Phrases that produced nothing, with the reason.
    pub failed: Vec<(String, String)>,
}

/// The search → mine → select → resolve → combine pipeline.
///
/// Each search result is mined by its own task into a private
/// [`KeywordTally`]; tallies are summed once every task has finished.
pub struct Researcher {
    search: Arc<dyn SearchEngine>,
    fetcher: Arc<dyn PageFetcher>,
    store: Arc<dyn VectorStore>,
    config: ResearchConfig,
    extractor: CollocationExtractor,
    scorer: KeywordScorer,
}

impl Researcher {
    /// Create a researcher. Fails on an invalid configuration.
    pub fn new(
        search: Arc<dyn SearchEngine>,
        fetcher: Arc<dyn PageFetcher>,
        store: Arc<dyn VectorStore>,
        config: ResearchConfig,
    ) -> Words2MapResult<Self> {
        config.validate()?;
        let extractor = CollocationExtractor::from_config(&config);
        let scorer = KeywordScorer::for_store(store.as_ref(), &config);
        Ok(Self {
            search,
            fetcher,
            store,
            config,
            extractor,
            scorer,
        })
    }

    /// The configuration in use.
    pub fn config(&self) -> &ResearchConfig {
        &self.config
    }

    /// Best keywords about `phrase` across its search results, at most
    /// `keyword_count`, best first.
    pub async fn research_keywords(&self, phrase: &str) -> Words2MapResult<Vec<KeywordScore>> {
        let hits = self.search_with_retry(phrase).await?;
        let tally = self.mine(phrase, hits).await;
        let top = tally.top(self.config.keyword_count);

        info!(
            phrase = %phrase,
            candidates = tally.len(),
            selected = top.len(),
            keywords = %describe(&top),
            "Keywords researched"
        );
        Ok(top)
    }

    /// Derive a unit vector for `phrase` from the vectors of its keywords.
    ///
    /// Fails with [`Words2MapError::Combine`] when no keyword has a vector.
    pub async fn derive_vector(&self, phrase: &str) -> Words2MapResult<DerivedVector> {
        let keywords = self.research_keywords(phrase).await?;
        let (keywords, vectors) = self.resolve(keywords);

        let vector = combine(&vectors).map_err(|e| match e {
            Words2MapError::Combine(msg) => Words2MapError::Combine(format!("'{phrase}': {msg}")),
            other => other,
        })?;

        info!(phrase = %phrase, keywords = keywords.len(), "Vector derived");
        Ok(DerivedVector {
            phrase: phrase.to_string(),
            vector,
            keywords,
        })
    }

    /// Derive vectors for every phrase in order.
    ///
    /// Fatal errors abort the batch; anything else is recorded against the
    /// phrase and the batch moves on.
    pub async fn derive_all<S: AsRef<str>>(&self, phrases: &[S]) -> Words2MapResult<DeriveReport> {
        let mut report = DeriveReport::default();
        for phrase in phrases {
            let phrase = phrase.as_ref();
            match self.derive_vector(phrase).await {
                Ok(derived) => report.derived.push(derived),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!(phrase = %phrase, error = %e, "No vector derived");
                    report.failed.push((phrase.to_string(), e.to_string()));
                }
            }
        }
        Ok(report)
    }

    /// Keep the keywords that have a vector, paired with those vectors.
    pub fn resolve(&self, keywords: Vec<KeywordScore>) -> (Vec<KeywordScore>, Vec<Vec<f32>>) {
        let mut kept = Vec::with_capacity(keywords.len());
        let mut vectors = Vec::with_capacity(keywords.len());
        for keyword in keywords {
            match self.store.lookup(&keyword.keyword) {
                Some(entry) => {
                    vectors.push(entry.vector);
                    kept.push(keyword);
                }
                None => debug!(keyword = %keyword.keyword, "No vector for keyword"),
            }
        }
        (kept, vectors)
    }

    /// Run the search step, retrying the whole search on transient failures.
    async fn search_with_retry(&self, phrase: &str) -> Words2MapResult<Vec<SearchHit>> {
        let attempts = self.config.max_search_attempts;
        let mut last = String::new();

        for attempt in 1..=attempts {
            match self
                .search
                .search(phrase, 1, self.config.results_per_search)
                .await
            {
                Ok(hits) => {
                    info!(phrase = %phrase, hits = hits.len(), attempt, "Search results");
                    return Ok(hits);
                }
                Err(e) if e.kind() == ErrorKind::Retryable => {
                    warn!(
                        phrase = %phrase,
                        attempt,
                        error = %e,
                        "Unable to reach the search engine"
                    );
                    last = e.to_string();
                    if attempt < attempts && self.config.retry_delay_ms > 0 {
                        tokio::time::sleep(Duration::from_millis(self.config.retry_delay_ms))
                            .await;
                    }
                }
                Err(e) => return Err(e),
            }
        }

        Err(Words2MapError::SearchExhausted { attempts, last })
    }

    /// Mine every hit in parallel and sum the per-page tallies.
    async fn mine(&self, phrase: &str, hits: Vec<SearchHit>) -> KeywordTally {
        let timeout = Duration::from_secs(self.config.fetch_timeout_secs);
        let mut tasks = JoinSet::new();

        for hit in hits {
            let fetcher = Arc::clone(&self.fetcher);
            let store = Arc::clone(&self.store);
            let extractor = self.extractor.clone();
            let scorer = self.scorer;

            tasks.spawn(async move {
                let mined =
                    tokio::time::timeout(timeout, mine_page(&hit.url, fetcher, store, extractor, scorer))
                        .await;
                match mined {
                    Ok(Ok(tally)) => Some(tally),
                    Ok(Err(e)) => {
                        debug!(url = %hit.url, error = %e, "Page skipped");
                        None
                    }
                    Err(_) => {
                        warn!(url = %hit.url, timeout_secs = timeout.as_secs(), "Page timed out");
                        None
                    }
                }
            });
        }

        let mut total = KeywordTally::new();
        let mut mined_pages = 0usize;
        let mut failed_pages = 0usize;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Some(tally)) => {
                    mined_pages += 1;
                    total.merge(tally);
                }
                Ok(None) => failed_pages += 1,
                Err(e) => {
                    failed_pages += 1;
                    warn!(error = %e, "Mining task aborted");
                }
            }
        }

        info!(
            phrase = %phrase,
            mined_pages,
            failed_pages,
            keywords = total.len(),
            "Pages mined"
        );
        total
    }
}

/// Fetch one page and score its collocations.
/// `keyword:score` pairs, best first, for the research log line.
fn describe(keywords: &[KeywordScore]) -> String {
    keywords
        .iter()
        .map(|k| format!("{}:{:.4}", k.keyword, k.score))
        .collect::<Vec<_>>()
        .join(", ")
}

async fn mine_page(
    url: &str,
    fetcher: Arc<dyn PageFetcher>,
    store: Arc<dyn VectorStore>,
    extractor: CollocationExtractor,
    scorer: KeywordScorer,
) -> Words2MapResult<KeywordTally> {
    let text = fetcher.fetch(url).await?;

    tokio::task::spawn_blocking(move || {
        let tokens = tokenize(&text);
        let collocations = extractor.extract(&tokens);
        scorer.score_document(&collocations, store.as_ref())
    })
    .await
    .map_err(|e| Words2MapError::Fetch(format!("Extraction of {url} failed: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use words2map_vectors::InMemoryVectorStore;

    struct NoSearch;

    #[async_trait]
    impl SearchEngine for NoSearch {
        async fn search(&self, _: &str, _: u32, _: u32) -> Words2MapResult<Vec<SearchHit>> {
            Ok(Vec::new())
        }
    }

    struct NoFetch;

    #[async_trait]
    impl PageFetcher for NoFetch {
        async fn fetch(&self, url: &str) -> Words2MapResult<String> {
            Err(Words2MapError::Fetch(url.to_string()))
        }
    }

    fn researcher(store: InMemoryVectorStore) -> Researcher {
        Researcher::new(
            Arc::new(NoSearch),
            Arc::new(NoFetch),
            Arc::new(store),
            ResearchConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_resolve_drops_missing() {
        let store = InMemoryVectorStore::from_entries(
            2,
            vec![("ai".to_string(), vec![1.0, 0.0])],
        )
        .unwrap();
        let r = researcher(store);
        let (kept, vectors) = r.resolve(vec![
            KeywordScore {
                keyword: "ai".into(),
                score: 0.5,
            },
            KeywordScore {
                keyword: "ghost".into(),
                score: 0.4,
            },
        ]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].keyword, "ai");
        assert_eq!(vectors, vec![vec![1.0, 0.0]]);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ResearchConfig {
            keyword_count: 0,
            ..ResearchConfig::default()
        };
        let result = Researcher::new(
            Arc::new(NoSearch),
            Arc::new(NoFetch),
            Arc::new(InMemoryVectorStore::new(1)),
            config,
        );
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_no_results_cannot_combine() {
        let r = researcher(InMemoryVectorStore::new(2));
        let err = r.derive_vector("Nobody Atall").await.unwrap_err();
        assert!(matches!(err, Words2MapError::Combine(_)));
        assert!(err.to_string().contains("Nobody Atall"));
    }

    #[test]
    fn test_describe_lists_selected_keywords() {
        let keywords = vec![
            KeywordScore { keyword: "Enigma".into(), score: 0.5 },
            KeywordScore { keyword: "Bletchley_Park".into(), score: 0.125 },
        ];
        assert_eq!(describe(&keywords), "Enigma:0.5000, Bletchley_Park:0.1250");
        assert_eq!(describe(&[]), "");
    }
}
