use super::domain::columns;
use std::collections::HashMap;
use std::sync::Arc;

/// One data line keyed by header name. Values are already trimmed.
#[derive(Debug, Clone)]
pub struct RawRow {
    row_number: usize,
    fields: HashMap<Arc<str>, String>,
}

impl RawRow {
    pub fn row_number(&self) -> usize {
        self.row_number
    }

    /// Cell value for `column`, or `None` when the column is absent or the
    /// cell is blank.
    pub fn value(&self, column: &str) -> Option<&str> {
        self.fields
            .get(column)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    #[cfg(test)]
    pub(crate) fn from_pairs(row_number: usize, pairs: &[(&str, &str)]) -> Self {
        let fields = pairs
            .iter()
            .map(|(column, value)| (Arc::from(*column), value.trim().to_string()))
            .collect();
        Self { row_number, fields }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("CSV file has no header row")]
    MissingHeader,
    #[error("CSV header could not be read: {0}")]
    Header(#[source] csv::Error),
    #[error("malformed CSV at data row {row}: {source}")]
    Malformed {
        row: usize,
        #[source]
        source: csv::Error,
    },
}

/// Lazy iterator over the data rows of a buffered CSV file.
///
/// Yields `Err` at most once; after a structural failure the iterator is
/// exhausted.
pub struct RowDecoder<'a> {
    headers: Vec<Arc<str>>,
    records: csv::StringRecordsIntoIter<&'a [u8]>,
    rows_read: usize,
    failed: bool,
}

impl<'a> RowDecoder<'a> {
    pub fn new(bytes: &'a [u8]) -> Result<Self, DecodeError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(bytes);

        let headers: Vec<Arc<str>> = reader
            .headers()
            .map_err(DecodeError::Header)?
            .iter()
            .map(|header| Arc::from(header.trim_start_matches('\u{feff}').trim()))
            .collect();

        if headers.iter().all(|header| header.is_empty()) {
            return Err(DecodeError::MissingHeader);
        }

        Ok(Self {
            headers,
            records: reader.into_records(),
            rows_read: 0,
            failed: false,
        })
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.headers.iter().map(|header| header.as_ref())
    }

    /// Expected columns absent from the header row.
    pub fn missing_columns(&self) -> Vec<&'static str> {
        columns::EXPECTED
            .iter()
            .copied()
            .filter(|expected| !self.headers.iter().any(|header| header.as_ref() == *expected))
            .collect()
    }
}

impl Iterator for RowDecoder<'_> {
    type Item = Result<RawRow, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let record = self.records.next()?;
        self.rows_read += 1;

        match record {
            Ok(record) => {
                let fields = self
                    .headers
                    .iter()
                    .cloned()
                    .zip(record.iter().map(str::to_string))
                    .collect();
                Some(Ok(RawRow {
                    row_number: self.rows_read,
                    fields,
                }))
            }
            Err(source) => {
                self.failed = true;
                Some(Err(DecodeError::Malformed {
                    row: self.rows_read,
                    source,
                }))
            }
        }
    }
}
