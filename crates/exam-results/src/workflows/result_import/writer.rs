use super::outcome::ValidatedRecords;
use super::store::ExamResultStore;
use std::num::NonZeroUsize;
use tracing::{debug, warn};

/// Per-batch tally kept for logging and assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchResult {
    pub size: usize,
    pub inserted: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteReport {
    pub batches: Vec<BatchResult>,
    pub inserted: usize,
    pub failed: usize,
}

/// Writes validated records in fixed-size, best-effort batches.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BatchWriter {
    batch_size: NonZeroUsize,
}

impl BatchWriter {
    pub(crate) fn new(batch_size: NonZeroUsize) -> Self {
        Self { batch_size }
    }

    /// Attempts every batch regardless of earlier failures.
    pub(crate) fn write<S>(&self, store: &S, validated: &ValidatedRecords) -> WriteReport
    where
        S: ExamResultStore + ?Sized,
    {
        let mut report = WriteReport::default();

        for (index, batch) in validated.records().chunks(self.batch_size.get()).enumerate() {
            let result = match store.insert_many(batch) {
                Ok(outcome) => {
                    for failure in &outcome.failures {
                        debug!(
                            batch = index,
                            position = failure.index,
                            roll_no = %failure.roll_no,
                            error = %failure.error,
                            "store rejected record"
                        );
                    }
                    BatchResult {
                        size: batch.len(),
                        inserted: outcome.inserted,
                        failed: batch.len().saturating_sub(outcome.inserted),
                    }
                }
                Err(error) => {
                    warn!(batch = index, size = batch.len(), %error, "batch insert failed");
                    BatchResult {
                        size: batch.len(),
                        inserted: 0,
                        failed: batch.len(),
                    }
                }
            };

            if result.failed > 0 {
                warn!(
                    batch = index,
                    inserted = result.inserted,
                    failed = result.failed,
                    "batch partially written"
                );
            }

            report.inserted += result.inserted;
            report.failed += result.failed;
            report.batches.push(result);
        }

        report
    }
}
