use chrono::NaiveDate;
use exam_results::workflows::result_import::{ExamResult, ExamResultStore, StoreError};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Process-local result store keyed by exam id and roll number, mirroring
/// the unique index of the document collection.
#[derive(Default, Clone)]
pub(crate) struct InMemoryResultStore {
    records: Arc<Mutex<HashMap<(String, String), ExamResult>>>,
}

impl InMemoryResultStore {
    pub(crate) fn len(&self) -> usize {
        self.records.lock().map(|guard| guard.len()).unwrap_or(0)
    }
}

impl ExamResultStore for InMemoryResultStore {
    fn insert_one(&self, record: &ExamResult) -> Result<(), StoreError> {
        let mut guard = self
            .records
            .lock()
            .map_err(|_| StoreError::Unavailable("result store lock poisoned".to_string()))?;
        let key = (record.exam_id.clone(), record.roll_no.clone());
        if guard.contains_key(&key) {
            return Err(StoreError::Duplicate {
                key: format!("{} / {}", key.0, key.1),
            });
        }
        guard.insert(key, record.clone());
        Ok(())
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
