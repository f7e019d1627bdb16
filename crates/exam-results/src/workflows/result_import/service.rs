use std::sync::Arc;

use chrono::{Datelike, Local, NaiveDate};
use tracing::{info, warn};

use super::decoder::{DecodeError, RowDecoder};
use super::domain::ResultCollection;
use super::normalizer::Normalizer;
use super::outcome::{ValidatedRecords, ValidationOutcome, ValidationRejection};
use super::report::ImportSummary;
use super::store::ExamResultStore;
use super::upload::{UploadPolicy, UploadRejection, UploadedFile};
use super::writer::BatchWriter;
use crate::config::ImportConfig;

/// Runs uploads for one result collection through decode, validation and
/// batched writes.
pub struct ResultImportService<S: ?Sized> {
    collection: ResultCollection,
    config: ImportConfig,
    store: Arc<S>,
}

impl<S> ResultImportService<S>
where
    S: ExamResultStore + ?Sized + 'static,
{
    pub fn new(collection: ResultCollection, store: Arc<S>, config: ImportConfig) -> Self {
        Self {
            collection,
            config,
            store,
        }
    }

    pub fn collection(&self) -> ResultCollection {
        self.collection
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    /// Imports an upload, deriving fallback batch years from today's date.
    pub fn import(&self, file: UploadedFile) -> Result<ImportSummary, ImportError> {
        self.import_as_of(file, Local::now().date_naive())
    }

    pub fn import_as_of(
        &self,
        file: UploadedFile,
        today: NaiveDate,
    ) -> Result<ImportSummary, ImportError> {
        let validated = self.validate_as_of(file, today)?;

        let report = BatchWriter::new(self.config.batch_size).write(self.store.as_ref(), &validated);
        info!(
            collection = self.collection.label(),
            total_rows = validated.total_rows(),
            inserted = report.inserted,
            failed = report.failed,
            batches = report.batches.len(),
            "result import written"
        );

        Ok(self.summarize(validated, report.inserted))
    }

    /// Runs every check without writing; the summary reports zero inserts.
    pub fn dry_run_as_of(
        &self,
        file: UploadedFile,
        today: NaiveDate,
    ) -> Result<ImportSummary, ImportError> {
        let validated = self.validate_as_of(file, today)?;
        info!(
            collection = self.collection.label(),
            total_rows = validated.total_rows(),
            "dry run validated cleanly"
        );
        Ok(self.summarize(validated, 0))
    }

    pub fn validate_as_of(
        &self,
        file: UploadedFile,
        today: NaiveDate,
    ) -> Result<ValidatedRecords, ImportError> {
        let upload = UploadPolicy::new(self.config.max_upload_bytes).accept(file)?;
        info!(
            collection = self.collection.label(),
            filename = upload.filename(),
            bytes = upload.len(),
            "result upload accepted"
        );

        let decoder = RowDecoder::new(upload.bytes())?;
        let missing = decoder.missing_columns();
        if !missing.is_empty() {
            warn!(
                collection = self.collection.label(),
                missing = %missing.join(", "),
                "result sheet is missing expected columns"
            );
        }

        let outcome = ValidationOutcome::collect(decoder, &Normalizer::new(today.year()))?;
        if outcome.total_rows() == 0 {
            return Err(ImportError::NoDataRows);
        }

        outcome.gate().map_err(|rejection| {
            warn!(
                collection = self.collection.label(),
                total_rows = rejection.total_rows,
                invalid_rows = rejection.errors.len(),
                "result import rejected"
            );
            ImportError::Validation(rejection)
        })
    }

    fn summarize(&self, validated: ValidatedRecords, inserted_count: usize) -> ImportSummary {
        let total_rows = validated.total_rows();
        let results = validated
            .into_records()
            .into_iter()
            .take(self.config.sample_size)
            .collect();

        ImportSummary {
            total_rows,
            inserted_count,
            results,
        }
    }
}

/// Error raised by the import service.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error(transparent)]
    Upload(#[from] UploadRejection),
    #[error("CSV file could not be parsed: {0}")]
    Decode(#[from] DecodeError),
    #[error("CSV file contains no data rows")]
    NoDataRows,
    #[error("CSV validation failed: {} row(s) contain errors", .0.errors.len())]
    Validation(ValidationRejection),
    #[error("import did not complete: {0}")]
    Interrupted(String),
}
