//! Writing datasets for downstream exporters.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::{Result, ScourError};
use crate::schema::Dataset;

/// Output format for exported datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Csv,
    Tsv,
    Json,
}

impl ExportFormat {
    /// Guess the format from a file extension, defaulting to CSV.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("tsv") => ExportFormat::Tsv,
            Some(ext) if ext.eq_ignore_ascii_case("json") => ExportFormat::Json,
            _ => ExportFormat::Csv,
        }
    }
}

/// Write a dataset as delimited text with a header row. Missing cells are empty.
pub fn write_delimited<W: Write>(dataset: &Dataset, writer: W, delimiter: u8) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);

    wtr.write_record(dataset.column_names())?;
    for row in dataset.rows() {
        wtr.write_record(row.iter().map(|v| v.to_string()))?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Write a dataset as a JSON array of records.
pub fn write_json<W: Write>(dataset: &Dataset, writer: W) -> Result<()> {
    serde_json::to_writer_pretty(writer, dataset)?;
    Ok(())
}

/// Write a dataset to a file in the given format.
pub fn write_file(dataset: &Dataset, path: impl AsRef<Path>, format: ExportFormat) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| ScourError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    match format {
        ExportFormat::Csv => write_delimited(dataset, file, b','),
        ExportFormat::Tsv => write_delimited(dataset, file, b'\t'),
        ExportFormat::Json => write_json(dataset, file),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnDescriptor, Value};

    #[test]
    fn test_write_csv() {
        let ds = Dataset::from_rows(
            vec![ColumnDescriptor::text("country"), ColumnDescriptor::numeric("cases")],
            vec![
                vec!["UK".into(), 10.into()],
                vec!["Côte d'Ivoire, West".into(), Value::Missing],
            ],
        )
        .unwrap();

        let mut buf = Vec::new();
        write_delimited(&ds, &mut buf, b',').unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert_eq!(text, "country,cases\nUK,10\n\"Côte d'Ivoire, West\",\n");
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(ExportFormat::from_path(Path::new("out.tsv")), ExportFormat::Tsv);
        assert_eq!(ExportFormat::from_path(Path::new("out.JSON")), ExportFormat::Json);
        assert_eq!(ExportFormat::from_path(Path::new("out")), ExportFormat::Csv);
    }
}
