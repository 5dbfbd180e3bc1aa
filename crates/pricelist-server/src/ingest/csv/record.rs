//! Ordered CSV fields with named lookup falling back to position

use std::sync::Arc;

/// One raw CSV record
///
/// When the file carried a header row, a field is first looked up by header
/// name (case-insensitive). If the header is missing or its value is blank the
/// lookup falls back to a fixed position, so headerless or mis-keyed files
/// still resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRecord {
    headers: Option<Arc<[String]>>,
    fields: Vec<String>,
}

impl CsvRecord {
    /// A record from a file without a header row
    pub fn new(fields: Vec<String>) -> Self {
        Self {
            headers: None,
            fields,
        }
    }

    pub fn with_headers(headers: Arc<[String]>, fields: Vec<String>) -> Self {
        Self {
            headers: Some(headers),
            fields,
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.iter().all(|f| f.trim().is_empty())
    }

    /// Field `name`, or the field at `position` when the name does not resolve
    pub fn get(&self, name: &str, position: usize) -> Option<&str> {
        self.by_name(name)
            .or_else(|| self.fields.get(position).map(String::as_str))
    }

    fn by_name(&self, name: &str) -> Option<&str> {
        let headers = self.headers.as_ref()?;
        let index = headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))?;
        self.fields
            .get(index)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }
}
