use memmap2::Mmap;
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::ops::Range;
use std::path::{Path, PathBuf};
use words2map_core::{Words2MapError, Words2MapResult};

/// Size of a record header: key length and value length, both `u32` LE.
const HEADER_LEN: usize = 8;

/// Read-only view of an append-only key/value file.
///
/// The file is a sequence of records `key_len | value_len | key | value`.
/// Opening scans the headers once and keeps only key → value range; values
/// stay in the memory map until asked for. When a key appears more than once
/// the last record wins.
pub struct KvReader {
    path: PathBuf,
    mmap: Option<Mmap>,
    index: BTreeMap<String, Range<usize>>,
}

impl KvReader {
    /// Open and index the file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Words2MapResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| {
            Words2MapError::Store(format!("Failed to open {}: {}", path.display(), e))
        })?;
        let len = file.metadata()?.len();

        // A zero-length file cannot be mapped.
        let mmap = if len == 0 {
            None
        } else {
            // SAFETY: the file is opened read-only and never written through this map.
            Some(unsafe { Mmap::map(&file)? })
        };

        let index = match &mmap {
            Some(bytes) => scan(bytes, &path)?,
            None => BTreeMap::new(),
        };

        Ok(Self { path, mmap, index })
    }

    /// Raw value bytes for `key`.
    pub fn get(&self, key: &str) -> Option<&[u8]> {
        let range = self.index.get(key)?;
        self.mmap.as_ref().map(|m| &m[range.clone()])
    }

    /// Whether `key` has a record.
    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Keys in byte order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.index.keys().map(String::as_str)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// True when the file holds no records.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Path this reader was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn scan(bytes: &[u8], path: &Path) -> Words2MapResult<BTreeMap<String, Range<usize>>> {
    let mut index = BTreeMap::new();
    let mut pos = 0usize;

    while pos < bytes.len() {
        if bytes.len() - pos < HEADER_LEN {
            return Err(truncated(path, pos));
        }
        let key_len = read_u32(&bytes[pos..pos + 4]) as usize;
        let value_len = read_u32(&bytes[pos + 4..pos + 8]) as usize;
        let key_start = pos + HEADER_LEN;
        let value_start = key_start + key_len;
        let end = value_start + value_len;
        if end > bytes.len() {
            return Err(truncated(path, pos));
        }

        let key = std::str::from_utf8(&bytes[key_start..value_start]).map_err(|_| {
            Words2MapError::Store(format!(
                "Non UTF-8 key at offset {} in {}",
                pos,
                path.display()
            ))
        })?;
        index.insert(key.to_string(), value_start..end);
        pos = end;
    }

    Ok(index)
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(bytes);
    u32::from_le_bytes(buf)
}

fn truncated(path: &Path, offset: usize) -> Words2MapError {
    Words2MapError::Store(format!(
        "Truncated record at offset {} in {}",
        offset,
        path.display()
    ))
}

/// Appends records to a key/value file readable by [`KvReader`].
pub struct KvWriter {
    out: BufWriter<File>,
    records: usize,
}

impl KvWriter {
    /// Create (or truncate) the file at `path`.
    pub fn create(path: impl AsRef<Path>) -> Words2MapResult<Self> {
        let file = File::create(path)?;
        Ok(Self {
            out: BufWriter::new(file),
            records: 0,
        })
    }

    /// Open the file at `path` for appending, creating it if missing.
    pub fn append_to(path: impl AsRef<Path>) -> Words2MapResult<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            out: BufWriter::new(file),
            records: 0,
        })
    }

    /// Append one record.
    pub fn append(&mut self, key: &str, value: &[u8]) -> Words2MapResult<()> {
        let key_len = u32::try_from(key.len())
            .map_err(|_| Words2MapError::InvalidInput(format!("Key too long: {} bytes", key.len())))?;
        let value_len = u32::try_from(value.len()).map_err(|_| {
            Words2MapError::InvalidInput(format!("Value too long: {} bytes", value.len()))
        })?;
        self.out.write_all(&key_len.to_le_bytes())?;
        self.out.write_all(&value_len.to_le_bytes())?;
        self.out.write_all(key.as_bytes())?;
        self.out.write_all(value)?;
        self.records += 1;
        Ok(())
    }

    /// Records appended through this writer.
    pub fn records(&self) -> usize {
        self.records
    }

    /// Flush buffered records and sync them to disk.
    pub fn finish(mut self) -> Words2MapResult<()> {
        self.out.flush()?;
        self.out.get_ref().sync_all()?;
        Ok(())
    }
}
