#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Integration tests for the research pipeline.
//!
//! Covers the search retry policy, parallel page mining with failing and
//! hanging pages, keyword selection, vector resolution and batch derivation,
//! all against mock search engines and fetchers.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use words2map_core::{ResearchConfig, Words2MapError, Words2MapResult};
use words2map_research::{PageFetcher, Researcher, SearchEngine, SearchHit};
use words2map_vectors::{InMemoryVectorStore, VectorStore};

// ---------------------------------------------------------------------------
// Mocks
// ---------------------------------------------------------------------------

/// Returns queued responses in order, then empty result lists.
struct ScriptedSearch {
    responses: Mutex<VecDeque<Words2MapResult<Vec<SearchHit>>>>,
    calls: AtomicU32,
}

impl ScriptedSearch {
    fn new(responses: Vec<Words2MapResult<Vec<SearchHit>>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: AtomicU32::new(0),
        }
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchEngine for ScriptedSearch {
    async fn search(&self, _query: &str, _start: u32, _count: u32) -> Words2MapResult<Vec<SearchHit>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// Answers by query; unknown queries get no results.
struct QuerySearch {
    results: HashMap<String, Vec<SearchHit>>,
}

#[async_trait]
impl SearchEngine for QuerySearch {
    async fn search(&self, query: &str, _start: u32, _count: u32) -> Words2MapResult<Vec<SearchHit>> {
        Ok(self.results.get(query).cloned().unwrap_or_default())
    }
}

/// Serves canned page text; unknown URLs fail, `slow://` URLs hang.
struct MapFetcher {
    pages: HashMap<String, String>,
}

#[async_trait]
impl PageFetcher for MapFetcher {
    async fn fetch(&self, url: &str) -> Words2MapResult<String> {
        if url.starts_with("slow://") {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| Words2MapError::Fetch(format!("HTTP 404 from {url}")))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn hit(url: &str) -> SearchHit {
    SearchHit {
        url: url.to_string(),
        title: String::new(),
    }
}

fn hits(urls: &[&str]) -> Vec<SearchHit> {
    urls.iter().map(|u| hit(u)).collect()
}

fn store() -> Arc<dyn VectorStore> {
    Arc::new(
        InMemoryVectorStore::from_entries(
            2,
            vec![
                ("the".to_string(), vec![0.5, 0.5]),
                ("and".to_string(), vec![0.5, 0.5]),
                ("python".to_string(), vec![1.0, 0.0]),
                ("rust".to_string(), vec![1.0, 0.0]),
                ("snake".to_string(), vec![0.3, 0.3]),
                ("new_york".to_string(), vec![0.6, 0.8]),
                ("language".to_string(), vec![0.0, 1.0]),
            ],
        )
        .unwrap(),
    )
}

fn pages() -> MapFetcher {
    let mut pages = HashMap::new();
    pages.insert(
        "https://a.example".to_string(),
        "rust rust rust python python python snake".to_string(),
    );
    pages.insert(
        "https://b.example".to_string(),
        "rust rust rust language language language".to_string(),
    );
    pages.insert(
        "https://nyc.example".to_string(),
        "new york new york new york city".to_string(),
    );
    MapFetcher { pages }
}

fn unigram_config() -> ResearchConfig {
    ResearchConfig {
        max_ngram: 1,
        ..ResearchConfig::default()
    }
}

fn researcher(search: Arc<dyn SearchEngine>, config: ResearchConfig) -> Researcher {
    Researcher::new(search, Arc::new(pages()), store(), config).unwrap()
}

// ---------------------------------------------------------------------------
// 1. Keyword research across pages
// ---------------------------------------------------------------------------

#[tokio::test]
async fn keywords_are_summed_across_pages() {
    let search = Arc::new(ScriptedSearch::new(vec![Ok(hits(&[
        "https://a.example",
        "https://b.example",
        "https://missing.example",
    ]))]));
    let r = researcher(search, unigram_config());

    let keywords = r.research_keywords("Some Person").await.unwrap();
    let names: Vec<&str> = keywords.iter().map(|k| k.keyword.as_str()).collect();
    assert_eq!(names, vec!["language", "rust", "python"]);

    // rust: 3/7 * 3/7 from page a, plus 1/2 * 3/7 from page b.
    let rust = keywords.iter().find(|k| k.keyword == "rust").unwrap();
    assert!((rust.score - (9.0 / 49.0 + 1.5 / 7.0)).abs() < 1e-9);
}

#[tokio::test]
async fn keyword_count_limits_selection() {
    let search = Arc::new(ScriptedSearch::new(vec![Ok(hits(&[
        "https://a.example",
        "https://b.example",
    ]))]));
    let config = ResearchConfig {
        keyword_count: 2,
        ..unigram_config()
    };
    let r = researcher(search, config);

    let derived = r.derive_vector("Some Person").await.unwrap();
    let names: Vec<&str> = derived.keywords.iter().map(|k| k.keyword.as_str()).collect();
    assert_eq!(names, vec!["language", "rust"]);

    let expected = std::f32::consts::FRAC_1_SQRT_2;
    assert!((derived.vector[0] - expected).abs() < 1e-6);
    assert!((derived.vector[1] - expected).abs() < 1e-6);
}

#[tokio::test]
async fn bigram_collocations_reach_the_store() {
    let search = Arc::new(ScriptedSearch::new(vec![Ok(hits(&["https://nyc.example"]))]));
    let r = researcher(search, ResearchConfig::default());

    let derived = r.derive_vector("Big Apple").await.unwrap();
    assert_eq!(derived.keywords.len(), 1);
    assert_eq!(derived.keywords[0].keyword, "new_york");
    assert!((derived.vector[0] - 0.6).abs() < 1e-6);
    assert!((derived.vector[1] - 0.8).abs() < 1e-6);
}

#[tokio::test]
async fn derived_vector_has_unit_norm() {
    let search = Arc::new(ScriptedSearch::new(vec![Ok(hits(&[
        "https://a.example",
        "https://b.example",
        "https://nyc.example",
    ]))]));
    let r = researcher(search, ResearchConfig::default());

    let derived = r.derive_vector("Some Person").await.unwrap();
    let norm: f32 = derived.vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() < 1e-5);
}

// ---------------------------------------------------------------------------
// 2. Page failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn all_pages_failing_yields_combine_error() {
    let search = Arc::new(ScriptedSearch::new(vec![Ok(hits(&[
        "https://gone.example",
        "https://also-gone.example",
    ]))]));
    let r = researcher(search, ResearchConfig::default());

    let err = r.derive_vector("Unfindable").await.unwrap_err();
    assert!(matches!(err, Words2MapError::Combine(_)));
    assert!(!err.is_fatal());
}

#[tokio::test]
async fn hanging_page_times_out_without_stalling() {
    let search = Arc::new(ScriptedSearch::new(vec![Ok(hits(&[
        "slow://never.example",
        "https://a.example",
    ]))]));
    let config = ResearchConfig {
        fetch_timeout_secs: 1,
        ..unigram_config()
    };
    let r = researcher(search, config);

    let started = std::time::Instant::now();
    let keywords = r.research_keywords("Some Person").await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(keywords[0].keyword, "rust");
}

// ---------------------------------------------------------------------------
// 3. Search retry policy
// ---------------------------------------------------------------------------

#[tokio::test]
async fn transient_search_failures_are_retried() {
    let search = Arc::new(ScriptedSearch::new(vec![
        Err(Words2MapError::Transient("connection reset".into())),
        Err(Words2MapError::Transient("HTTP 503".into())),
        Ok(hits(&["https://a.example"])),
    ]));
    let r = researcher(search.clone(), unigram_config());

    let keywords = r.research_keywords("Some Person").await.unwrap();
    assert!(!keywords.is_empty());
    assert_eq!(search.calls(), 3);
}

#[tokio::test]
async fn search_gives_up_after_max_attempts() {
    let search = Arc::new(ScriptedSearch::new(vec![
        Err(Words2MapError::Transient("1".into())),
        Err(Words2MapError::Transient("2".into())),
        Err(Words2MapError::Transient("3".into())),
        Ok(hits(&["https://a.example"])),
    ]));
    let r = researcher(search.clone(), ResearchConfig::default());

    let err = r.research_keywords("Some Person").await.unwrap_err();
    match &err {
        Words2MapError::SearchExhausted { attempts, last } => {
            assert_eq!(*attempts, 3);
            assert!(last.contains('3'));
        }
        other => panic!("expected SearchExhausted, got {other}"),
    }
    assert!(err.is_fatal());
    assert_eq!(search.calls(), 3);
}

#[tokio::test]
async fn quota_exhaustion_is_not_retried() {
    let search = Arc::new(ScriptedSearch::new(vec![
        Err(Words2MapError::QuotaExhausted("403 Forbidden".into())),
        Ok(hits(&["https://a.example"])),
    ]));
    let r = researcher(search.clone(), ResearchConfig::default());

    let err = r.research_keywords("Some Person").await.unwrap_err();
    assert!(matches!(err, Words2MapError::QuotaExhausted(_)));
    assert_eq!(search.calls(), 1);
}

// ---------------------------------------------------------------------------
// 4. Batch derivation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn derive_all_records_per_phrase_failures() {
    let mut results = HashMap::new();
    results.insert("Known Person".to_string(), hits(&["https://a.example"]));
    let search = Arc::new(QuerySearch { results });
    let r = researcher(search, unigram_config());

    let report = r
        .derive_all(&["Known Person", "Unknown Person"])
        .await
        .unwrap();
    assert_eq!(report.derived.len(), 1);
    assert_eq!(report.derived[0].phrase, "Known Person");
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "Unknown Person");
}

#[tokio::test]
async fn derive_all_aborts_on_fatal_error() {
    let search = Arc::new(ScriptedSearch::new(vec![
        Ok(hits(&["https://a.example"])),
        Err(Words2MapError::QuotaExhausted("403".into())),
    ]));
    let r = researcher(search.clone(), unigram_config());

    let err = r
        .derive_all(&["First", "Second", "Third"])
        .await
        .unwrap_err();
    assert!(matches!(err, Words2MapError::QuotaExhausted(_)));
    assert_eq!(search.calls(), 2);
}
