use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use words2map_core::{Words2MapError, Words2MapResult};

/// Prefix of numbered output files, e.g. `words2map_4.txt`.
pub const ARTIFACT_PREFIX: &str = "words2map_";

/// Vectors read from a word2vec text file.
#[derive(Debug, Clone, PartialEq)]
pub struct TextVectors {
    /// Components per vector, from the header line.
    pub dimension: usize,
    /// `(word, vector)` in file order.
    pub entries: Vec<(String, Vec<f32>)>,
}

/// Next free `words2map_<N>.<ext>` path in `dir`.
///
/// N is one more than the highest N already present, or 0 for an empty
/// directory. Creates `dir` if missing.
pub fn next_artifact_path(dir: &Path, ext: &str) -> Words2MapResult<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let suffix = format!(".{ext}");

    let mut highest: Option<u64> = None;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        let number = name
            .strip_prefix(ARTIFACT_PREFIX)
            .and_then(|rest| rest.strip_suffix(&suffix))
            .and_then(|n| n.parse::<u64>().ok());
        if let Some(n) = number {
            highest = Some(highest.map_or(n, |h| h.max(n)));
        }
    }

    let next = highest.map_or(0, |h| h + 1);
    Ok(dir.join(format!("{ARTIFACT_PREFIX}{next}{suffix}")))
}

/// Write vectors in word2vec text format.
///
/// The header is `"<count> <dimension>"`; each following line is the word with
/// spaces replaced by underscores, then its components separated by spaces.
pub fn write_text_vectors<W, V>(path: &Path, entries: &[(W, V)]) -> Words2MapResult<()>
where
    W: AsRef<str>,
    V: AsRef<[f32]>,
{
    let dimension = entries.first().map_or(0, |(_, v)| v.as_ref().len());
    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "{} {}", entries.len(), dimension)?;

    for (word, vector) in entries {
        let vector = vector.as_ref();
        if vector.len() != dimension {
            return Err(Words2MapError::InvalidInput(format!(
                "Vector for '{}' has {} components, expected {}",
                word.as_ref(),
                vector.len(),
                dimension
            )));
        }
        let components: Vec<String> = vector.iter().map(f32::to_string).collect();
        writeln!(
            out,
            "{} {}",
            word.as_ref().replace(' ', "_"),
            components.join(" ")
        )?;
    }
    out.flush()?;

    info!(path = %path.display(), words = entries.len(), "Saved word vectors");
    Ok(())
}

/// Upper bound on rows reserved from the header count before any are read.
const MAX_PREALLOCATED_ROWS: usize = 1 << 20;

/// Read a word2vec text file.
pub fn read_text_vectors(path: &Path) -> Words2MapResult<TextVectors> {
    let reader = BufReader::new(File::open(path)?);
    let mut lines = reader.lines();

    let header = lines
        .next()
        .transpose()?
        .ok_or_else(|| Words2MapError::InvalidInput(format!("{} is empty", path.display())))?;
    let (count, dimension) = parse_header(&header)?;

    // Header count is untrusted.
    let mut entries = Vec::with_capacity(count.min(MAX_PREALLOCATED_ROWS));
    for (n, line) in lines.enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let mut parts = line.split_whitespace();
        let word = parts.next().unwrap_or_default().to_string();
        let vector = parts
            .map(str::parse::<f32>)
            .collect::<Result<Vec<f32>, _>>()
            .map_err(|e| {
                Words2MapError::InvalidInput(format!("Line {}: bad component: {}", n + 2, e))
            })?;
        if vector.len() != dimension {
            return Err(Words2MapError::InvalidInput(format!(
                "Line {}: '{}' has {} components, header says {}",
                n + 2,
                word,
                vector.len(),
                dimension
            )));
        }
        entries.push((word, vector));
    }

    if entries.len() != count {
        return Err(Words2MapError::InvalidInput(format!(
            "Header declares {} words, file has {}",
            count,
            entries.len()
        )));
    }

    Ok(TextVectors { dimension, entries })
}

fn parse_header(header: &str) -> Words2MapResult<(usize, usize)> {
    let bad = || Words2MapError::InvalidInput(format!("Bad header line: '{header}'"));
    let mut parts = header.split_whitespace();
    let count = parts
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(bad)?;
    let dimension = parts
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(bad)?;
    if parts.next().is_some() {
        return Err(bad());
    }
    Ok((count, dimension))
}
