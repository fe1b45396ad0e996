use serde::Deserialize;
use std::path::{Path, PathBuf};
use words2map_core::ResearchConfig;
use words2map_research::SearchConfig;

/// Environment variable overriding `search.api_key`.
pub const API_KEY_VAR: &str = "GOOGLE_API_KEY";
/// Environment variable overriding `search.engine_id`.
pub const ENGINE_ID_VAR: &str = "GOOGLE_ENGINE_ID";

/// Contents of `words2map.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct Words2MapConfig {
    /// Model directory opened by [`words2map_vectors::MmapVectorStore`].
    #[serde(default = "default_vectors_dir")]
    pub vectors_dir: PathBuf,
    /// Where derived vector files are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Search API credentials.
    #[serde(default)]
    pub search: SearchConfig,
    /// Keyword research heuristics.
    #[serde(default)]
    pub research: ResearchConfig,
}

fn default_vectors_dir() -> PathBuf {
    PathBuf::from("./vectors")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./derived_vectors")
}

impl Default for Words2MapConfig {
    fn default() -> Self {
        Self {
            vectors_dir: default_vectors_dir(),
            output_dir: default_output_dir(),
            search: SearchConfig::default(),
            research: ResearchConfig::default(),
        }
    }
}

impl Words2MapConfig {
    /// Parse a TOML document.
    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.research.validate()?;
        Ok(config)
    }

    /// Load `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml(&text).map_err(|e| {
                anyhow::anyhow!("Invalid config file '{}': {}", path.display(), e)
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(anyhow::anyhow!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            )),
        }
    }

    /// Let non-empty environment values replace the search credentials.
    pub fn apply_env<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = var(API_KEY_VAR).filter(|v| !v.is_empty()) {
            self.search.api_key = key;
        }
        if let Some(id) = var(ENGINE_ID_VAR).filter(|v| !v.is_empty()) {
            self.search.engine_id = id;
        }
    }
}
