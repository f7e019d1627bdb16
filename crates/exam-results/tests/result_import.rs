use chrono::NaiveDate;
use exam_results::config::ImportConfig;
use exam_results::workflows::result_import::{
    ExamResult, ExamResultStore, ImportError, ResultCollection, ResultImportService, StoreError,
    TestType, UploadedFile,
};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct VecStore {
    records: Mutex<Vec<ExamResult>>,
}

impl ExamResultStore for VecStore {
    fn insert_one(&self, record: &ExamResult) -> Result<(), StoreError> {
        self.records
            .lock()
            .expect("store mutex poisoned")
            .push(record.clone());
        Ok(())
    }
}

fn import_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 9, 24).expect("valid import date")
}

fn service() -> (ResultImportService<VecStore>, Arc<VecStore>) {
    let store = Arc::new(VecStore::default());
    let service = ResultImportService::new(
        ResultCollection::ExamResults,
        store.clone(),
        ImportConfig::default(),
    );
    (service, store)
}

#[test]
fn fixture_sheet_imports_with_derived_fields() {
    let data = include_bytes!("fixtures/classroom_results.csv");
    let (service, store) = service();

    let summary = service
        .import_as_of(
            UploadedFile::csv("classroom_results.csv", &data[..]),
            import_date(),
        )
        .expect("fixture imports");

    assert_eq!(summary.total_rows, 6);
    assert_eq!(summary.inserted_count, 6);
    assert_eq!(summary.results.len(), 5);

    let records = store.records.lock().expect("store mutex poisoned").clone();
    let classroom = &records[0];
    assert_eq!(classroom.test_type, TestType::ClassroomTest);
    assert_eq!(classroom.exam_id, "CT-2024-03-01-2024-Batch");
    assert_eq!(classroom.batch_year, 2024);
    assert_eq!(classroom.total_students, 4);

    let surprise = &records[3];
    assert_eq!(surprise.test_type, TestType::SurpriseTest);
    assert_eq!(surprise.exam_id, "ST-2024-03-01-BTBM25-01");
    assert_eq!(surprise.batch_year, 2025, "falls back to the import year");
    assert_eq!(surprise.batch_code, "BTBM25-01");
    assert_eq!(surprise.total_students, 2);

    let coerced = &records[5];
    assert_eq!(coerced.scores.right, 0, "'n/a' defaults to zero");
    assert_eq!(coerced.scores.chemistry_right, 0, "blank defaults to zero");
    assert_eq!(coerced.scores.physics_right, 33);
}

#[test]
fn fixture_with_a_broken_row_persists_nothing() {
    let data = include_str!("fixtures/classroom_results.csv")
        .replace("NT24-003,Fatima Khan", ",Fatima Khan");
    let (service, store) = service();

    let error = service
        .import_as_of(UploadedFile::csv("broken.csv", data.into_bytes()), import_date())
        .expect_err("broken sheet rejected");

    match error {
        ImportError::Validation(rejection) => {
            assert_eq!(rejection.errors.len(), 1);
            assert_eq!(rejection.errors[0].row_number, 3);
            assert_eq!(rejection.processed_rows, 5);
        }
        other => panic!("expected validation rejection, got {other:?}"),
    }
    assert!(store.records.lock().expect("store mutex poisoned").is_empty());
}
