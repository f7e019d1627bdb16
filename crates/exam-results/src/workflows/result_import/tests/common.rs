use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::config::ImportConfig;
use crate::workflows::result_import::columns;
use crate::workflows::result_import::domain::{ExamResult, ResultCollection};
use crate::workflows::result_import::service::ResultImportService;
use crate::workflows::result_import::store::{BatchInsert, ExamResultStore, StoreError};
use crate::workflows::result_import::upload::UploadedFile;

pub(super) const BOUNDARY: &str = "exam-results-boundary";

pub(super) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date")
}

pub(super) fn header_line() -> String {
    columns::EXPECTED.join(",")
}

pub(super) fn result_line(index: usize) -> String {
    format!(
        "Classroom Test,2024-03-01,{index},R-{index:04},Student {index},180,170,150,20,10,40,5,35,5,38,5,37,5,580,80.5,11.7,97.2,2024 Batch,North Campus"
    )
}

pub(super) fn missing_roll_no_line(index: usize) -> String {
    format!(
        "Classroom Test,2024-03-01,{index},,Student {index},180,170,150,20,10,40,5,35,5,38,5,37,5,580,80.5,11.7,97.2,2024 Batch,North Campus"
    )
}

pub(super) fn sheet(lines: impl IntoIterator<Item = String>) -> String {
    let mut csv = header_line();
    csv.push('\n');
    for line in lines {
        csv.push_str(&line);
        csv.push('\n');
    }
    csv
}

pub(super) fn valid_sheet(rows: usize) -> String {
    sheet((1..=rows).map(result_line))
}

pub(super) fn csv_upload(contents: &str) -> UploadedFile {
    UploadedFile::csv("results.csv", contents.as_bytes())
}

pub(super) fn import_config(batch_size: usize) -> ImportConfig {
    ImportConfig {
        batch_size: std::num::NonZeroUsize::new(batch_size).expect("non-zero batch"),
        ..ImportConfig::default()
    }
}

pub(super) fn build_service(
    config: ImportConfig,
) -> (ResultImportService<BatchRecordingStore>, Arc<BatchRecordingStore>) {
    let store = Arc::new(BatchRecordingStore::default());
    let service = ResultImportService::new(ResultCollection::ExamResults, store.clone(), config);
    (service, store)
}

/// Enforces one result per roll number per exam, like the production index.
#[derive(Default)]
pub(super) struct MemoryStore {
    keys: Mutex<HashSet<(String, String)>>,
    records: Mutex<Vec<ExamResult>>,
}

impl MemoryStore {
    pub(super) fn records(&self) -> Vec<ExamResult> {
        self.records.lock().expect("store mutex poisoned").clone()
    }
}

impl ExamResultStore for MemoryStore {
    fn insert_one(&self, record: &ExamResult) -> Result<(), StoreError> {
        let key = (record.exam_id.clone(), record.roll_no.clone());
        let mut keys = self.keys.lock().expect("store mutex poisoned");
        if !keys.insert(key) {
            return Err(StoreError::Duplicate {
                key: format!("{}/{}", record.exam_id, record.roll_no),
            });
        }
        self.records
            .lock()
            .expect("store mutex poisoned")
            .push(record.clone());
        Ok(())
    }
}

/// Memory store that remembers the size of every insert-many call.
#[derive(Default)]
pub(super) struct BatchRecordingStore {
    pub(super) inner: MemoryStore,
    batches: Mutex<Vec<usize>>,
}

impl BatchRecordingStore {
    pub(super) fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().expect("store mutex poisoned").clone()
    }

    pub(super) fn records(&self) -> Vec<ExamResult> {
        self.inner.records()
    }
}

impl ExamResultStore for BatchRecordingStore {
    fn insert_one(&self, record: &ExamResult) -> Result<(), StoreError> {
        self.inner.insert_one(record)
    }

    fn insert_many(&self, batch: &[ExamResult]) -> Result<BatchInsert, StoreError> {
        self.batches
            .lock()
            .expect("store mutex poisoned")
            .push(batch.len());
        self.inner.insert_many(batch)
    }
}

pub(super) struct UnavailableStore;

impl ExamResultStore for UnavailableStore {
    fn insert_one(&self, _record: &ExamResult) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn insert_many(&self, _batch: &[ExamResult]) -> Result<BatchInsert, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}

/// Fails the first insert-many call outright, then behaves like memory.
#[derive(Default)]
pub(super) struct FirstBatchOfflineStore {
    pub(super) inner: MemoryStore,
    calls: AtomicUsize,
}

impl ExamResultStore for FirstBatchOfflineStore {
    fn insert_one(&self, record: &ExamResult) -> Result<(), StoreError> {
        self.inner.insert_one(record)
    }

    fn insert_many(&self, batch: &[ExamResult]) -> Result<BatchInsert, StoreError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err(StoreError::Unavailable("primary stepped down".to_string()));
        }
        self.inner.insert_many(batch)
    }
}

pub(super) fn multipart_request(
    path: &str,
    filename: &str,
    content_type: &str,
    contents: &str,
) -> Request<Body> {
    let payload = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n{contents}\r\n--{BOUNDARY}--\r\n"
    );
    multipart_body(path, payload)
}

pub(super) fn multipart_body(path: &str, payload: String) -> Request<Body> {
    Request::post(path)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(payload))
        .expect("request builds")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
