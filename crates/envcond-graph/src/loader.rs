//! Table loader
//!
//! Reads the delimited source table into `RawTriple`s. Missing required
//! columns abort the load; short or blank rows are skipped and counted.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::{debug, warn};

use envcond_core::{EnvcondError, InputConfig, RawTriple, Result};

/// Rows read from one source table
#[derive(Debug, Clone, Default)]
pub struct LoadedTable {
    /// Well-formed rows, in file order
    pub triples: Vec<RawTriple>,
    /// Data rows seen (header excluded)
    pub rows_read: usize,
    /// Rows dropped as malformed
    pub rows_skipped: usize,
}

/// Delimited-table reader
#[derive(Debug, Clone)]
pub struct TableLoader {
    delimiter: Option<u8>,
    subject_column: String,
    predicate_column: String,
    text_column: String,
}

impl TableLoader {
    /// Create a loader with default column names
    pub fn new() -> Self {
        Self::from_config(&InputConfig::default())
    }

    /// Create a loader from the input section of the config
    pub fn from_config(config: &InputConfig) -> Self {
        Self {
            delimiter: config.delimiter.and_then(|c| u8::try_from(c).ok()),
            subject_column: config.subject_column.clone(),
            predicate_column: config.predicate_column.clone(),
            text_column: config.text_column.clone(),
        }
    }

    /// Force a delimiter instead of inferring it from the file extension
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    /// Delimiter for a path: explicit setting, else `.tsv`/`.tab` -> tab, else comma
    pub fn delimiter_for(&self, path: &Path) -> u8 {
        self.delimiter.unwrap_or_else(|| {
            match path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.to_lowercase())
                .as_deref()
            {
                Some("tsv") | Some("tab") => b'\t',
                _ => b',',
            }
        })
    }

    /// Load a table from disk
    pub fn load_path(&self, path: &Path) -> Result<LoadedTable> {
        let file = File::open(path).map_err(|e| EnvcondError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        self.load_reader(file, &path.display().to_string(), self.delimiter_for(path))
    }

    /// Load a table from any reader
    pub fn load_reader<R: Read>(&self, reader: R, input: &str, delimiter: u8) -> Result<LoadedTable> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = csv_reader
            .headers()
            .map_err(|e| EnvcondError::InputError(format!("{input}: {e}")))?
            .clone();

        let column = |name: &str| -> Result<usize> {
            headers
                .iter()
                .position(|h| h.trim_start_matches('\u{FEFF}').trim().eq_ignore_ascii_case(name))
                .ok_or_else(|| EnvcondError::MissingColumn {
                    column: name.to_string(),
                    input: input.to_string(),
                })
        };
        let subject_idx = column(&self.subject_column)?;
        let predicate_idx = column(&self.predicate_column)?;
        let text_idx = column(&self.text_column)?;
        debug!(input, subject_idx, predicate_idx, text_idx, "resolved columns");

        let mut table = LoadedTable::default();
        for (index, record) in csv_reader.records().enumerate() {
            table.rows_read += 1;
            let row = index + 1;

            let record = match record {
                Ok(record) => record,
                Err(e) if e.is_io_error() => {
                    return Err(EnvcondError::InputError(format!("{input}: {e}")));
                }
                Err(e) => {
                    warn!(input, row, error = %e, "skipping unreadable row");
                    table.rows_skipped += 1;
                    continue;
                }
            };

            let fields = (
                record.get(subject_idx).map(str::trim),
                record.get(predicate_idx).map(str::trim),
                record.get(text_idx),
            );
            match fields {
                (Some(subject), Some(predicate), Some(text))
                    if !subject.is_empty() && !predicate.is_empty() && !text.trim().is_empty() =>
                {
                    table
                        .triples
                        .push(RawTriple::new(subject, predicate, text, row));
                }
                _ => {
                    warn!(input, row, "skipping row with missing subject, predicate or text");
                    table.rows_skipped += 1;
                }
            }
        }

        Ok(table)
    }
}

impl Default for TableLoader {
    fn default() -> Self {
        Self::new()
    }
}
