//! Derives embeddings for phrases the model has never seen.
//!
//! A phrase is searched on the web, each result page is mined for scored
//! keywords in parallel, and the vectors of the best keywords are combined
//! into one unit vector.
//!
//! # Main types
//!
//! - [`SearchEngine`] — Trait for web search backends.
//! - [`GoogleSearch`] — Google Custom Search JSON API client.
//! - [`PageFetcher`] — Trait for downloading a page as plain text.
//! - [`HttpPageFetcher`] — reqwest-based fetcher with HTML stripping.
//! - [`Researcher`] — The search → mine → select → combine pipeline.

/// Page download.
pub mod fetch;
/// HTML to plain text.
pub mod html;
/// Research and derivation pipeline.
pub mod researcher;
/// Web search backends.
pub mod search;

pub use fetch::{HttpPageFetcher, PageFetcher};
pub use html::extract_text;
pub use researcher::{DeriveReport, Researcher};
pub use search::{GoogleSearch, SearchConfig, SearchEngine, SearchHit};
