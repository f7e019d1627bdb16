//! Bulk import of exam-result spreadsheets.
//!
//! An upload moves through a single linear pass: the upload gate, the row
//! decoder, the normalizer fold, then either a wholesale rejection or the
//! batched writer. [`ValidationOutcome::gate`] is the only way from the
//! validation phase into the write phase.

mod decoder;
pub mod domain;
mod normalizer;
mod outcome;
mod report;
pub mod router;
pub mod service;
pub mod store;
mod upload;
mod writer;

#[cfg(test)]
mod tests;

pub use decoder::{DecodeError, RawRow, RowDecoder};
pub use domain::{columns, ExamResult, ResultCollection, RowError, ScoreBreakdown, TestType};
pub use outcome::{ValidatedRecords, ValidationOutcome, ValidationRejection};
pub use report::ImportSummary;
pub use router::import_router;
pub use service::{ImportError, ResultImportService};
pub use store::{BatchInsert, ExamResultStore, StoreError, WriteFailure};
pub use upload::{CsvUpload, UploadPolicy, UploadRejection, UploadedFile};
pub use writer::{BatchResult, WriteReport};
