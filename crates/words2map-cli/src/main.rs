mod config;
mod phrases;

use clap::{Parser, Subcommand};
use config::Words2MapConfig;
use phrases::DEFAULT_PHRASES;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use words2map_core::Words2MapError;
use words2map_research::{GoogleSearch, HttpPageFetcher, Researcher};
use words2map_vectors::{
    nearest, next_artifact_path, read_text_vectors, write_text_vectors, MmapVectorStore,
    ModelWriter, Query, VectorStore,
};

#[derive(Parser)]
#[command(
    name = "words2map",
    version,
    about = "Derive word vectors for unknown phrases by researching them on the web"
)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "words2map.toml")]
    config: PathBuf,

    /// Model directory (overrides config)
    #[arg(long, global = true)]
    vectors: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Research phrases on the web and save their derived vectors
    Derive {
        /// Phrases to research (the built-in list when none are given)
        phrases: Vec<String>,
        /// Read additional phrases from a file, one per line
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Keywords combined per phrase (overrides config)
        #[arg(short, long)]
        keywords: Option<usize>,
        /// Output file (defaults to the next words2map_<N>.txt in output_dir)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the words closest to a word or vector
    Neighbors {
        /// Query word
        #[arg(short, long, conflicts_with = "vector")]
        word: Option<String>,
        /// Query vector as comma-separated components
        #[arg(long)]
        vector: Option<String>,
        /// Number of neighbours
        #[arg(short, default_value_t = 10)]
        k: usize,
    },
    /// Convert a word2vec text file into a model directory
    Import {
        /// Text vectors file
        #[arg(short, long)]
        input: PathBuf,
        /// Model directory to create
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Measure vector lookup latency
    Bench {
        /// Words looked up
        #[arg(long, default_value_t = 100_000)]
        count: usize,
    },
}

const REMEDIATION: &str = "\
The search engine is not returning results. If you haven't done so already, \
create your own API key at https://console.cloud.google.com/apis and a \
programmable search engine at https://programmablesearchengine.google.com:
  1. Enable the \"Custom Search API\" for your project
  2. Copy the API key from \"Credentials\" and the search engine id (cx)
  3. Set GOOGLE_API_KEY and GOOGLE_ENGINE_ID, or [search] api_key and
     engine_id in words2map.toml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let mut config = Words2MapConfig::load(&cli.config)?;
    config.apply_env(|name| std::env::var(name).ok());
    if let Some(dir) = cli.vectors {
        config.vectors_dir = dir;
    }

    match cli.command {
        Commands::Derive {
            phrases,
            file,
            keywords,
            output,
        } => {
            if let Some(n) = keywords {
                config.research.keyword_count = n;
                config.research.validate()?;
            }
            let phrases = collect_phrases(phrases, file.as_deref())?;
            derive(&config, &phrases, output).await?;
        }
        Commands::Neighbors { word, vector, k } => {
            let query = match (word, vector) {
                (Some(word), _) => Query::word(word),
                (None, Some(raw)) => Query::vector(parse_vector(&raw)?),
                (None, None) => anyhow::bail!("Provide --word or --vector"),
            };
            let store = MmapVectorStore::open(&config.vectors_dir)?;
            for neighbor in nearest(&store, &query, k)? {
                println!("{}\t{:.4}", neighbor.word, neighbor.similarity);
            }
        }
        Commands::Import { input, output } => {
            let text = read_text_vectors(&input)?;
            let meta = ModelWriter::new(&output, text.dimension).write(
                text.entries
                    .iter()
                    .map(|(word, vector)| (word.as_str(), vector.as_slice())),
            )?;
            println!(
                "Imported {} words of dimension {} into {}",
                meta.count,
                meta.dimension,
                output.display()
            );
        }
        Commands::Bench { count } => {
            let store = MmapVectorStore::open(&config.vectors_dir)?;
            let (looked_up, elapsed) = bench_lookups(&store, count);
            if looked_up == 0 {
                anyhow::bail!("The model at {} is empty", config.vectors_dir.display());
            }
            let total_us = elapsed.as_secs_f64() * 1e6;
            println!(
                "Looked up {looked_up} vectors in {total_us:.0} µs ({:.2} µs each)",
                total_us / looked_up as f64
            );
        }
    }

    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn derive(
    config: &Words2MapConfig,
    phrases: &[String],
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let store = Arc::new(MmapVectorStore::open(&config.vectors_dir)?);
    let search = Arc::new(GoogleSearch::new(config.search.clone()).map_err(with_remediation)?);
    let fetcher = Arc::new(HttpPageFetcher::new(Duration::from_secs(
        config.research.fetch_timeout_secs,
    ))?);
    let researcher = Researcher::new(search, fetcher, store, config.research.clone())?;

    info!(phrases = phrases.len(), "Deriving vectors");
    let report = researcher
        .derive_all(phrases)
        .await
        .map_err(with_remediation)?;

    for (phrase, reason) in &report.failed {
        warn!(phrase = %phrase, reason = %reason, "Skipped");
    }
    if report.derived.is_empty() {
        anyhow::bail!("No vectors could be derived for {} phrases", phrases.len());
    }

    let path = match output {
        Some(path) => path,
        None => next_artifact_path(&config.output_dir, "txt")?,
    };
    let entries: Vec<(&str, &[f32])> = report
        .derived
        .iter()
        .map(|d| (d.phrase.as_str(), d.vector.as_slice()))
        .collect();
    write_text_vectors(&path, &entries)?;

    println!(
        "Saved {} derived vectors ({} skipped) at {}",
        report.derived.len(),
        report.failed.len(),
        path.display()
    );
    Ok(())
}

/// Attach setup instructions to errors a new API key would fix.
fn with_remediation(err: Words2MapError) -> anyhow::Error {
    match err {
        Words2MapError::QuotaExhausted(_)
        | Words2MapError::SearchExhausted { .. }
        | Words2MapError::Config(_) => anyhow::anyhow!("{err}\n\n{REMEDIATION}"),
        other => other.into(),
    }
}

/// Phrases from the command line and an optional file, or the built-in list.
///
/// Blank lines and lines starting with `#` in the file are ignored.
fn collect_phrases(args: Vec<String>, file: Option<&Path>) -> anyhow::Result<Vec<String>> {
    let mut phrases: Vec<String> = args
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();

    if let Some(path) = file {
        let text = std::fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!("Failed to read phrase file '{}': {}", path.display(), e)
        })?;
        phrases.extend(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(str::to_string),
        );
    }

    if phrases.is_empty() {
        phrases = DEFAULT_PHRASES
            .iter()
            .map(|p| (*p).to_string())
            .collect();
    }
    Ok(phrases)
}

fn parse_vector(raw: &str) -> anyhow::Result<Vec<f32>> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<f32>()
                .map_err(|e| anyhow::anyhow!("Invalid vector component '{part}': {e}"))
        })
        .collect()
}

/// Look up the first `count` words of the store by training index, timing only
/// the lookups.
fn bench_lookups(store: &dyn VectorStore, count: usize) -> (usize, Duration) {
    let mut elapsed = Duration::ZERO;
    let mut looked_up = 0usize;
    for index in 0..count.min(store.len()) {
        let Some(word) = u32::try_from(index).ok().and_then(|i| store.word_at(i)) else {
            continue;
        };
        let start = Instant::now();
        let found = store.lookup(&word).is_some();
        elapsed += start.elapsed();
        if found {
            looked_up += 1;
        }
    }
    (looked_up, elapsed)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use words2map_vectors::InMemoryVectorStore;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_derive() {
        let cli = Cli::try_parse_from([
            "words2map",
            "derive",
            "Alan Turing",
            "Grace Hopper",
            "-k",
            "10",
        ])
        .unwrap();
        match cli.command {
            Commands::Derive {
                phrases, keywords, ..
            } => {
                assert_eq!(phrases, vec!["Alan Turing", "Grace Hopper"]);
                assert_eq!(keywords, Some(10));
            }
            _ => panic!("expected derive"),
        }
        assert_eq!(cli.config, PathBuf::from("words2map.toml"));
    }

    #[test]
    fn test_neighbors_word_and_vector_conflict() {
        let result = Cli::try_parse_from([
            "words2map",
            "neighbors",
            "--word",
            "cat",
            "--vector",
            "1,0",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_default_phrases_when_none_given() {
        let phrases = collect_phrases(Vec::new(), None).unwrap();
        assert_eq!(phrases.len(), DEFAULT_PHRASES.len());
        assert_eq!(phrases[0], "Larry Page");
    }

    #[test]
    fn test_phrase_file_is_appended() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("phrases.txt");
        std::fs::write(&path, "# people\nAda Lovelace\n\n  Alan Kay  \n").unwrap();
        let phrases = collect_phrases(vec!["Grace Hopper".to_string()], Some(&path)).unwrap();
        assert_eq!(phrases, vec!["Grace Hopper", "Ada Lovelace", "Alan Kay"]);
    }

    #[test]
    fn test_missing_phrase_file() {
        let err = collect_phrases(Vec::new(), Some(Path::new("/nonexistent/phrases.txt")))
            .unwrap_err();
        assert!(err.to_string().contains("phrases.txt"));
    }

    #[test]
    fn test_parse_vector() {
        assert_eq!(parse_vector("0.5, -1,2e-1").unwrap(), vec![0.5, -1.0, 0.2]);
        assert!(parse_vector("1,x").is_err());
        assert!(parse_vector("").unwrap().is_empty());
    }

    #[test]
    fn test_remediation_for_quota() {
        let err = with_remediation(Words2MapError::QuotaExhausted("403".into()));
        assert!(err.to_string().contains("GOOGLE_API_KEY"));

        let err = with_remediation(Words2MapError::Combine("nothing".into()));
        assert!(!err.to_string().contains("GOOGLE_API_KEY"));
    }

    #[test]
    fn test_bench_counts_lookups() {
        let store = InMemoryVectorStore::from_entries(
            2,
            vec![
                ("a".to_string(), vec![1.0, 0.0]),
                ("b".to_string(), vec![0.0, 1.0]),
                ("c".to_string(), vec![1.0, 1.0]),
            ],
        )
        .unwrap();
        assert_eq!(bench_lookups(&store, 2).0, 2);
        assert_eq!(bench_lookups(&store, 100).0, 3);
    }
}
