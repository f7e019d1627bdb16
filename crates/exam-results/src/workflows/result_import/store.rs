use super::domain::ExamResult;

/// Persistence boundary for imported results.
///
/// The store owns indexing and uniqueness; the import pipeline only observes
/// them as per-record failures.
pub trait ExamResultStore: Send + Sync {
    fn insert_one(&self, record: &ExamResult) -> Result<(), StoreError>;

    /// Unordered bulk insert: every record is attempted even when earlier ones
    /// fail. An `Err` means the whole batch could not be attempted.
    fn insert_many(&self, batch: &[ExamResult]) -> Result<BatchInsert, StoreError> {
        let mut outcome = BatchInsert::default();
        for (index, record) in batch.iter().enumerate() {
            match self.insert_one(record) {
                Ok(()) => outcome.inserted += 1,
                Err(error) => outcome.failures.push(WriteFailure {
                    index,
                    roll_no: record.roll_no.clone(),
                    error,
                }),
            }
        }
        Ok(outcome)
    }
}

#[derive(Debug, Default)]
pub struct BatchInsert {
    pub inserted: usize,
    pub failures: Vec<WriteFailure>,
}

/// A record the store refused; `index` is its position within the batch.
#[derive(Debug)]
pub struct WriteFailure {
    pub index: usize,
    pub roll_no: String,
    pub error: StoreError,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("duplicate result for {key}")]
    Duplicate { key: String },
    #[error("result store unavailable: {0}")]
    Unavailable(String),
}
