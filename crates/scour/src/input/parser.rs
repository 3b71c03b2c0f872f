//! CSV/TSV loader with delimiter detection and column type inference.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::debug;

use super::source::SourceMetadata;
use crate::error::{Result, ScourError};
use crate::schema::parse::{infer_column_type, is_null_value};
use crate::schema::{ColumnDescriptor, Dataset, Value};

/// Delimiters to try when auto-detecting.
const DELIMITERS: &[u8] = &[b'\t', b',', b';', b'|'];

/// Parser configuration.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Delimiter to use (None = auto-detect).
    pub delimiter: Option<u8>,
    /// Whether the file has a header row.
    pub has_header: bool,
    /// Maximum rows to read (None = all).
    pub max_rows: Option<usize>,
    /// Quote character.
    pub quote: u8,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            has_header: true,
            max_rows: None,
            quote: b'"',
        }
    }
}

/// Loads delimited files into typed datasets.
pub struct Parser {
    config: ParserConfig,
}

impl Parser {
    /// Create a new parser with default configuration.
    pub fn new() -> Self {
        Self {
            config: ParserConfig::default(),
        }
    }

    /// Create a parser with custom configuration.
    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Parse a file and return the dataset and source metadata.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<(Dataset, SourceMetadata)> {
        let path = path.as_ref();

        let io_err = |e| ScourError::Io {
            path: path.to_path_buf(),
            source: e,
        };

        let mut file = File::open(path).map_err(io_err)?;
        let size_bytes = file.metadata().map_err(io_err)?.len();

        let mut contents = Vec::new();
        file.read_to_end(&mut contents).map_err(io_err)?;

        let mut hasher = Sha256::new();
        hasher.update(&contents);
        let hash = format!("sha256:{:x}", hasher.finalize());

        let delimiter = match self.config.delimiter {
            Some(d) => d,
            None => detect_delimiter(&contents, self.config.quote)?,
        };

        let dataset = self.parse_bytes(&contents, delimiter)?;

        let format = match delimiter {
            b'\t' => "tsv",
            b',' => "csv",
            b';' => "csv-semicolon",
            b'|' => "psv",
            _ => "delimited",
        }
        .to_string();

        debug!(
            path = %path.display(),
            rows = dataset.row_count(),
            columns = dataset.column_count(),
            format = %format,
            "loaded dataset"
        );

        let source_metadata = SourceMetadata::new(
            path.to_path_buf(),
            hash,
            size_bytes,
            format,
            dataset.row_count(),
            dataset.column_count(),
        );

        Ok((dataset, source_metadata))
    }

    /// Parse bytes directly with a known delimiter.
    pub fn parse_bytes(&self, bytes: &[u8], delimiter: u8) -> Result<Dataset> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(self.config.has_header)
            .quote(self.config.quote)
            .flexible(true)
            .from_reader(bytes);

        let mut raw_rows: Vec<Vec<String>> = Vec::new();
        for (row_idx, result) in reader.records().enumerate() {
            if let Some(max) = self.config.max_rows {
                if row_idx >= max {
                    break;
                }
            }
            let record = result?;
            raw_rows.push(record.iter().map(|s| s.to_string()).collect());
        }

        let headers: Vec<String> = if self.config.has_header {
            reader.headers()?.iter().map(|s| s.trim().to_string()).collect()
        } else {
            let width = raw_rows.first().map(Vec::len).unwrap_or(0);
            (0..width).map(|i| format!("column_{}", i + 1)).collect()
        };

        if headers.is_empty() {
            return Err(ScourError::EmptyDataset("No columns found".to_string()));
        }

        let expected_cols = headers.len();
        for row in &mut raw_rows {
            // Pad short rows, truncate long ones
            row.resize(expected_cols, String::new());
        }

        let columns: Vec<ColumnDescriptor> = headers
            .into_iter()
            .enumerate()
            .map(|(col_idx, name)| {
                let column_type =
                    infer_column_type(raw_rows.iter().map(|r| r[col_idx].as_str()));
                ColumnDescriptor::new(name, column_type)
            })
            .collect();

        let mut dataset = Dataset::new(columns)?;
        for row in raw_rows {
            let values = row
                .into_iter()
                .map(|cell| {
                    if is_null_value(&cell) {
                        Value::Missing
                    } else {
                        Value::Text(cell)
                    }
                })
                .collect();
            dataset.push_row(values)?;
        }

        Ok(dataset)
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

/// Lines sampled when guessing the delimiter.
const SNIFF_LINES: usize = 10;

/// Pick the candidate delimiter that splits the sampled lines most consistently.
///
/// Candidates are ranked by how many lines share the header's field count, then by
/// that count. Ties keep the earlier candidate, so tab wins over comma.
fn detect_delimiter(bytes: &[u8], quote: u8) -> Result<u8> {
    let lines: Vec<String> = BufReader::new(bytes)
        .lines()
        .map_while(|l| l.ok())
        .filter(|l| !l.trim().is_empty())
        .take(SNIFF_LINES)
        .collect();

    if lines.is_empty() {
        return Err(ScourError::EmptyDataset("No lines to analyze".to_string()));
    }

    let best = DELIMITERS
        .iter()
        .filter_map(|&delim| {
            let counts: Vec<usize> = lines
                .iter()
                .map(|line| unquoted_occurrences(line, delim, quote))
                .collect();
            let header = counts[0];
            (header > 0).then(|| {
                let agreeing = counts.iter().filter(|&&c| c == header).count();
                (delim, (agreeing, header))
            })
        })
        .fold(None, |best: Option<(u8, (usize, usize))>, candidate| match best {
            Some(b) if b.1 >= candidate.1 => Some(b),
            _ => Some(candidate),
        });

    Ok(best.map_or(b',', |(delim, _)| delim))
}

/// Occurrences of `delimiter` outside quoted sections of a line.
fn unquoted_occurrences(line: &str, delimiter: u8, quote: u8) -> usize {
    line.bytes()
        .scan(false, |quoted, b| {
            if b == quote {
                *quoted = !*quoted;
            }
            Some(b == delimiter && !*quoted)
        })
        .filter(|&hit| hit)
        .count()
}
