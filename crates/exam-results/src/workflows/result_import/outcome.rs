use super::decoder::{DecodeError, RawRow};
use super::domain::{ExamResult, RowError};
use super::normalizer::{NormalizedRow, Normalizer};
use std::collections::HashMap;

/// Result of checking every row of a file. Built once by [`ValidationOutcome::collect`].
#[derive(Debug)]
pub struct ValidationOutcome {
    total_rows: usize,
    records: Vec<ExamResult>,
    errors: Vec<RowError>,
}

#[derive(Default)]
struct Tally {
    total_rows: usize,
    valid: Vec<NormalizedRow>,
    errors: Vec<RowError>,
}

impl ValidationOutcome {
    /// Folds every decoded row through the normalizer. Row errors accumulate;
    /// a structural decode error aborts the fold.
    pub(crate) fn collect<I>(rows: I, normalizer: &Normalizer) -> Result<Self, DecodeError>
    where
        I: IntoIterator<Item = Result<RawRow, DecodeError>>,
    {
        let tally = rows
            .into_iter()
            .try_fold(Tally::default(), |mut tally, row| {
                let row = row?;
                tally.total_rows += 1;
                match normalizer.normalize(&row) {
                    Ok(normalized) => tally.valid.push(normalized),
                    Err(error) => tally.errors.push(error),
                }
                Ok::<_, DecodeError>(tally)
            })?;

        Ok(Self {
            total_rows: tally.total_rows,
            records: with_cohort_sizes(tally.valid),
            errors: tally.errors,
        })
    }

    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    pub fn records(&self) -> &[ExamResult] {
        &self.records
    }

    pub fn errors(&self) -> &[RowError] {
        &self.errors
    }

    /// Validation-to-write transition. Only a file with zero row errors
    /// produces records the writer will accept.
    pub fn gate(self) -> Result<ValidatedRecords, ValidationRejection> {
        if self.errors.is_empty() {
            Ok(ValidatedRecords {
                total_rows: self.total_rows,
                records: self.records,
            })
        } else {
            Err(ValidationRejection {
                total_rows: self.total_rows,
                processed_rows: self.records.len(),
                errors: self.errors,
            })
        }
    }
}

/// Records from a file that validated cleanly.
#[derive(Debug)]
pub struct ValidatedRecords {
    total_rows: usize,
    records: Vec<ExamResult>,
}

impl ValidatedRecords {
    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    pub fn records(&self) -> &[ExamResult] {
        &self.records
    }

    pub fn into_records(self) -> Vec<ExamResult> {
        self.records
    }
}

/// Every row error found in a rejected file.
#[derive(Debug, Clone)]
pub struct ValidationRejection {
    pub total_rows: usize,
    /// Rows that validated before the file was rejected.
    pub processed_rows: usize,
    pub errors: Vec<RowError>,
}

/// Fills undeclared `total_students` with the number of valid rows sharing
/// the record's exam id.
fn with_cohort_sizes(rows: Vec<NormalizedRow>) -> Vec<ExamResult> {
    let mut cohorts: HashMap<String, u32> = HashMap::new();
    for row in &rows {
        *cohorts.entry(row.record.exam_id.clone()).or_default() += 1;
    }

    rows.into_iter()
        .map(|row| {
            let total_students = row
                .declared_total_students
                .or_else(|| cohorts.get(&row.record.exam_id).copied())
                .unwrap_or_default();
            ExamResult {
                total_students,
                ..row.record
            }
        })
        .collect()
}
