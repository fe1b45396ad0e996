use crate::kv::{KvReader, KvWriter};
use half::f16;
use memmap2::Mmap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use words2map_core::{VectorEntry, Words2MapError, Words2MapResult};

/// Model metadata file inside a model directory.
pub const META_FILE: &str = "model.json";
/// word → training index table.
pub const WORD_TO_INDEX_FILE: &str = "word_to_index";
/// training index → word table.
pub const INDEX_TO_WORD_FILE: &str = "index_to_word";
/// Flat `count × dimension` half-precision vectors.
pub const VECTORS_FILE: &str = "vectors.f16";

/// Bytes per stored vector component.
const COMPONENT_BYTES: usize = 2;

/// Read-only mapping from words to training indexes and embeddings.
///
/// Keys are words or underscore-joined phrases; lookups replace spaces with
/// underscores first. A missing key is `None`, never an error.
pub trait VectorStore: Send + Sync {
    /// Number of components per vector.
    fn dimension(&self) -> usize;

    /// Number of words in the model.
    fn len(&self) -> usize;

    /// True when the model has no words.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Training index of `key`.
    fn index_of(&self, key: &str) -> Option<u32>;

    /// Word stored at training index `index`.
    fn word_at(&self, index: u32) -> Option<String>;

    /// Vector stored at training index `index`.
    fn vector_at(&self, index: u32) -> Option<Vec<f32>>;

    /// Every key in the model.
    fn keys(&self) -> Vec<String>;

    /// Whether `key` has an embedding.
    fn contains_key(&self, key: &str) -> bool {
        self.index_of(key).is_some()
    }

    /// Full entry for `key`.
    fn lookup(&self, key: &str) -> Option<VectorEntry> {
        let word = normalize_key(key);
        let index = self.index_of(&word)?;
        let vector = self.vector_at(index)?;
        Some(VectorEntry {
            word,
            vector,
            index,
        })
    }
}

/// Replace spaces with underscores, the way phrases are keyed in the model.
pub fn normalize_key(key: &str) -> String {
    key.replace(' ', "_")
}

/// Contents of `model.json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelMeta {
    /// Components per vector.
    pub dimension: usize,
    /// Number of words (and vector rows).
    pub count: usize,
}

/// Value stored per word in the `word_to_index` table.
///
/// `count` is the word's occurrence count in the training corpus when the
/// source model provides one. Text models carry none, so imports record the
/// word2vec convention `vocabulary size - index` instead.
#[derive(Debug, Serialize, Deserialize)]
struct VocabRecord {
    index: u32,
    #[serde(default)]
    count: u64,
}

/// Vector store over a model directory.
///
/// The two lookup tables are append-only KV files whose values are decoded
/// only when a key is looked up. Vector rows are read from a memory-mapped
/// file of little-endian `f16`, converted to `f32` per row on demand.
pub struct MmapVectorStore {
    dir: PathBuf,
    meta: ModelMeta,
    word_to_index: KvReader,
    index_to_word: KvReader,
    vectors: Option<Mmap>,
}

impl MmapVectorStore {
    /// Open the model stored in `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Words2MapResult<Self> {
        let dir = dir.as_ref().to_path_buf();

        let meta_path = dir.join(META_FILE);
        let meta_str = std::fs::read_to_string(&meta_path).map_err(|e| {
            Words2MapError::Store(format!("Failed to read {}: {}", meta_path.display(), e))
        })?;
        let meta: ModelMeta = serde_json::from_str(&meta_str)
            .map_err(|e| Words2MapError::Store(format!("Invalid {META_FILE}: {e}")))?;
        if meta.dimension == 0 {
            return Err(Words2MapError::Store(
                "Model dimension must be positive".to_string(),
            ));
        }

        let word_to_index = KvReader::open(dir.join(WORD_TO_INDEX_FILE))?;
        let index_to_word = KvReader::open(dir.join(INDEX_TO_WORD_FILE))?;
        for table in [&word_to_index, &index_to_word] {
            if table.len() != meta.count {
                return Err(Words2MapError::Store(format!(
                    "{} has {} keys, model declares {}",
                    table.path().display(),
                    table.len(),
                    meta.count
                )));
            }
        }

        let vectors_path = dir.join(VECTORS_FILE);
        let file = File::open(&vectors_path).map_err(|e| {
            Words2MapError::Store(format!("Failed to open {}: {}", vectors_path.display(), e))
        })?;
        let expected = meta
            .count
            .checked_mul(meta.dimension)
            .and_then(|n| n.checked_mul(COMPONENT_BYTES))
            .and_then(|n| u64::try_from(n).ok())
            .ok_or_else(|| {
                Words2MapError::Store(format!(
                    "Model size {} x {} in {} overflows",
                    meta.count, meta.dimension, META_FILE
                ))
            })?;
        let actual = file.metadata()?.len();
        if actual != expected {
            return Err(Words2MapError::Store(format!(
                "{} is {} bytes, expected {}",
                vectors_path.display(),
                actual,
                expected
            )));
        }
        let vectors = if actual == 0 {
            None
        } else {
            // SAFETY: opened read-only; the model directory is not modified while mapped.
            Some(unsafe { Mmap::map(&file)? })
        };

        info!(
            dir = %dir.display(),
            words = meta.count,
            dimension = meta.dimension,
            "Vector store opened"
        );

        Ok(Self {
            dir,
            meta,
            word_to_index,
            index_to_word,
            vectors,
        })
    }

    /// Model metadata.
    pub fn meta(&self) -> ModelMeta {
        self.meta
    }

    /// Directory the model was opened from.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Corpus occurrence count recorded for `key`, 0 when the model has none.
    pub fn count_of(&self, key: &str) -> Option<u64> {
        self.record(key).map(|r| r.count)
    }

    fn record(&self, key: &str) -> Option<VocabRecord> {
        let raw = self.word_to_index.get(&normalize_key(key))?;
        serde_json::from_slice(raw).ok()
    }
}

impl VectorStore for MmapVectorStore {
    fn dimension(&self) -> usize {
        self.meta.dimension
    }

    fn len(&self) -> usize {
        self.meta.count
    }

    fn index_of(&self, key: &str) -> Option<u32> {
        self.record(key).map(|r| r.index)
    }

    fn word_at(&self, index: u32) -> Option<String> {
        let raw = self.index_to_word.get(&index.to_string())?;
        String::from_utf8(raw.to_vec()).ok()
    }

    fn vector_at(&self, index: u32) -> Option<Vec<f32>> {
        let index = index as usize;
        if index >= self.meta.count {
            return None;
        }
        let row_bytes = self.meta.dimension.checked_mul(COMPONENT_BYTES)?;
        let start = index.checked_mul(row_bytes)?;
        let end = start.checked_add(row_bytes)?;
        let row = self.vectors.as_ref()?.get(start..end)?;
        Some(
            row.chunks_exact(COMPONENT_BYTES)
                .map(|b| f16::from_le_bytes([b[0], b[1]]).to_f32())
                .collect(),
        )
    }

    fn keys(&self) -> Vec<String> {
        self.word_to_index.keys().map(str::to_string).collect()
    }
}

/// Heap-backed vector store. Training index is the insertion position.
#[derive(Debug, Clone)]
pub struct InMemoryVectorStore {
    dimension: usize,
    words: Vec<String>,
    vectors: Vec<Vec<f32>>,
    by_word: HashMap<String, u32>,
}

impl InMemoryVectorStore {
    /// Empty store of the given dimension.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            words: Vec::new(),
            vectors: Vec::new(),
            by_word: HashMap::new(),
        }
    }

    /// Build a store from `(word, vector)` pairs in training order.
    pub fn from_entries<I>(dimension: usize, entries: I) -> Words2MapResult<Self>
    where
        I: IntoIterator<Item = (String, Vec<f32>)>,
    {
        let mut store = Self::new(dimension);
        for (word, vector) in entries {
            store.push(word, vector)?;
        }
        Ok(store)
    }

    /// Append a word at the next training index.
    pub fn push(&mut self, word: impl Into<String>, vector: Vec<f32>) -> Words2MapResult<u32> {
        let word = normalize_key(&word.into());
        if vector.len() != self.dimension {
            return Err(Words2MapError::InvalidInput(format!(
                "Vector for '{}' has {} components, expected {}",
                word,
                vector.len(),
                self.dimension
            )));
        }
        if self.by_word.contains_key(&word) {
            return Err(Words2MapError::InvalidInput(format!(
                "Duplicate word '{word}'"
            )));
        }
        let index = u32::try_from(self.words.len())
            .map_err(|_| Words2MapError::InvalidInput("Too many words".to_string()))?;
        self.by_word.insert(word.clone(), index);
        self.words.push(word);
        self.vectors.push(vector);
        Ok(index)
    }

    /// Iterate `(word, vector)` in training order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, &[f32])> {
        self.words
            .iter()
            .map(String::as_str)
            .zip(self.vectors.iter().map(Vec::as_slice))
    }
}

impl VectorStore for InMemoryVectorStore {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn len(&self) -> usize {
        self.words.len()
    }

    fn index_of(&self, key: &str) -> Option<u32> {
        self.by_word.get(&normalize_key(key)).copied()
    }

    fn word_at(&self, index: u32) -> Option<String> {
        self.words.get(index as usize).cloned()
    }

    fn vector_at(&self, index: u32) -> Option<Vec<f32>> {
        self.vectors.get(index as usize).cloned()
    }

    fn keys(&self) -> Vec<String> {
        let mut keys = self.words.clone();
        keys.sort();
        keys
    }
}

/// Writes a model directory that [`MmapVectorStore::open`] can read.
pub struct ModelWriter {
    dir: PathBuf,
    dimension: usize,
}

impl ModelWriter {
    /// Writer for a model of `dimension` components into `dir`.
    pub fn new(dir: impl Into<PathBuf>, dimension: usize) -> Self {
        Self {
            dir: dir.into(),
            dimension,
        }
    }

    /// Write every `(word, vector)` pair, in training order.
    ///
    /// Vectors are stored as-is; callers wanting unit rows normalize first.
    pub fn write<'a, I>(&self, entries: I) -> Words2MapResult<ModelMeta>
    where
        I: IntoIterator<Item = (&'a str, &'a [f32])>,
        I::IntoIter: ExactSizeIterator,
    {
        let entries = entries.into_iter();
        let vocabulary = entries.len() as u64;
        if self.dimension == 0 {
            return Err(Words2MapError::InvalidInput(
                "Model dimension must be positive".to_string(),
            ));
        }
        std::fs::create_dir_all(&self.dir)?;

        let mut word_to_index = KvWriter::create(self.dir.join(WORD_TO_INDEX_FILE))?;
        let mut index_to_word = KvWriter::create(self.dir.join(INDEX_TO_WORD_FILE))?;
        let mut vectors = BufWriter::new(File::create(self.dir.join(VECTORS_FILE))?);
        let mut seen: HashMap<String, u32> = HashMap::new();

        for (word, vector) in entries {
            let word = normalize_key(word);
            if vector.len() != self.dimension {
                return Err(Words2MapError::InvalidInput(format!(
                    "Vector for '{}' has {} components, expected {}",
                    word,
                    vector.len(),
                    self.dimension
                )));
            }
            let index = u32::try_from(seen.len())
                .map_err(|_| Words2MapError::InvalidInput("Too many words".to_string()))?;
            if seen.insert(word.clone(), index).is_some() {
                return Err(Words2MapError::InvalidInput(format!(
                    "Duplicate word '{word}'"
                )));
            }

            let record = serde_json::to_vec(&VocabRecord {
                index,
                count: vocabulary.saturating_sub(u64::from(index)),
            })?;
            word_to_index.append(&word, &record)?;
            index_to_word.append(&index.to_string(), word.as_bytes())?;
            for &component in vector {
                vectors.write_all(&f16::from_f32(component).to_le_bytes())?;
            }
        }

        word_to_index.finish()?;
        index_to_word.finish()?;
        vectors.flush()?;

        let meta = ModelMeta {
            dimension: self.dimension,
            count: seen.len(),
        };
        std::fs::write(self.dir.join(META_FILE), serde_json::to_vec_pretty(&meta)?)?;

        info!(
            dir = %self.dir.display(),
            words = meta.count,
            dimension = meta.dimension,
            "Model written"
        );
        Ok(meta)
    }
}
