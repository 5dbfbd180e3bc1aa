//! Streaming CSV reader producing normalized products

use csv::{ByteRecord, ReaderBuilder, Trim};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::normalizer::normalize_record;
use super::record::CsvRecord;
use crate::models::NewProduct;

/// Dialect of uploaded price lists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvOptions {
    pub delimiter: u8,
    /// Treat the first record as a header row
    pub has_headers: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b';',
            has_headers: true,
        }
    }
}

/// Result of reading one file
#[derive(Debug, Default)]
pub struct ParsedFile {
    /// Rows that passed normalization, in file order
    pub products: Vec<NewProduct>,
    /// Rows that were skipped
    pub rejected: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum CsvReadError {
    #[error("Failed to open CSV file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Read and normalize every record of the file at `path`
pub fn read_products_from_path(
    path: &Path,
    options: &CsvOptions,
) -> Result<ParsedFile, CsvReadError> {
    let file = File::open(path).map_err(|source| CsvReadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    read_products(file, options)
}

/// Read and normalize every record from `input`
///
/// Invalid UTF-8 is decoded lossily. Blank records are ignored and do not
/// count as rejections.
pub fn read_products<R: Read>(input: R, options: &CsvOptions) -> Result<ParsedFile, CsvReadError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(input);

    let mut parsed = ParsedFile::default();
    let mut headers: Option<Arc<[String]>> = None;
    let mut raw = ByteRecord::new();

    while reader.read_byte_record(&mut raw)? {
        let line = raw.position().map(|p| p.line()).unwrap_or_default();
        let fields = decode_fields(&raw);

        if options.has_headers && headers.is_none() {
            headers = Some(strip_bom(fields).into());
            continue;
        }

        let record = match &headers {
            Some(headers) => CsvRecord::with_headers(Arc::clone(headers), fields),
            None => CsvRecord::new(fields),
        };
        if record.is_empty() {
            continue;
        }

        match normalize_record(&record) {
            Ok(product) => parsed.products.push(product),
            Err(reason) => {
                tracing::warn!(line, %reason, "Skipping invalid CSV row");
                parsed.rejected += 1;
            }
        }
    }

    Ok(parsed)
}

fn decode_fields(record: &ByteRecord) -> Vec<String> {
    record
        .iter()
        .map(|field| String::from_utf8_lossy(field).into_owned())
        .collect()
}

fn strip_bom(mut fields: Vec<String>) -> Vec<String> {
    if let Some(first) = fields.first_mut() {
        if let Some(stripped) = first.strip_prefix('\u{feff}') {
            *first = stripped.to_string();
        }
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;

    fn read(input: &str, options: CsvOptions) -> ParsedFile {
        read_products(input.as_bytes(), &options).unwrap()
    }

    #[test]
    fn test_reads_semicolon_file_with_headers() {
        let parsed = read(
            "name;price;expiration\nWidget;12,50;3/4/2024\nGadget;$3.99;12/31/2025\n",
            CsvOptions::default(),
        );
        assert_eq!(parsed.products.len(), 2);
        assert_eq!(parsed.rejected, 0);
        assert_eq!(parsed.products[0].name, "Widget");
        assert_eq!(
            parsed.products[1].expiration,
            NaiveDate::from_ymd_opt(2025, 12, 31).unwrap()
        );
    }

    #[test]
    fn test_skips_invalid_rows() {
        let parsed = read(
            "name;price;expiration\nWidget;1.00;3/4/2024\nGizmo;-5;3/4/2024\nX;2.00;3/4/2024\nBolt;2.00;3/4/2024\n",
            CsvOptions::default(),
        );
        assert_eq!(parsed.products.len(), 2);
        assert_eq!(parsed.rejected, 2);
    }

    #[test]
    fn test_headerless_file_uses_positions() {
        let options = CsvOptions {
            delimiter: b',',
            has_headers: false,
        };
        let parsed = read("Widget,\"12,50\",3/4/2024\n", options);
        assert_eq!(parsed.products.len(), 1);
        assert_eq!(parsed.products[0].name, "Widget");
    }

    #[test]
    fn test_reordered_headers_and_bom() {
        let parsed = read(
            "\u{feff}Expiration;Name;Price\n3/4/2024;Widget;7\n",
            CsvOptions::default(),
        );
        assert_eq!(parsed.products.len(), 1);
        assert_eq!(parsed.products[0].name, "Widget");
    }

    #[test]
    fn test_blank_and_short_rows() {
        let parsed = read(
            "name;price;expiration\n\n;;\nWidget;1\n",
            CsvOptions::default(),
        );
        assert!(parsed.products.is_empty());
        assert_eq!(parsed.rejected, 1);
    }

    #[test]
    fn test_invalid_utf8_is_decoded_lossily() {
        let mut bytes = b"name;price;expiration\nWid".to_vec();
        bytes.push(0xff);
        bytes.extend_from_slice(b"get;2;3/4/2024\n");

        let parsed = read_products(bytes.as_slice(), &CsvOptions::default()).unwrap();
        assert_eq!(parsed.products.len(), 1);
        assert_eq!(parsed.products[0].name, "Widget");
    }

    #[test]
    fn test_read_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "name;price;expiration").unwrap();
        writeln!(file, "Widget;1;3/4/2024").unwrap();

        let parsed = read_products_from_path(file.path(), &CsvOptions::default()).unwrap();
        assert_eq!(parsed.products.len(), 1);

        let missing =
            read_products_from_path(Path::new("/nonexistent/prices.csv"), &CsvOptions::default());
        assert!(matches!(missing, Err(CsvReadError::Open { .. })));
    }
}
