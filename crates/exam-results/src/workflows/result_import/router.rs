use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};

use super::domain::columns;
use super::service::{ImportError, ResultImportService};
use super::store::ExamResultStore;
use super::upload::{UploadRejection, UploadedFile};

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Router exposing the upload and template endpoints for one collection.
pub fn import_router<S>(service: Arc<ResultImportService<S>>) -> Router
where
    S: ExamResultStore + 'static,
{
    let collection = service.collection();
    let body_limit = service
        .config()
        .max_upload_bytes
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .route(collection.import_path(), post(import_handler::<S>))
        .route(collection.template_path(), get(template_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(service)
}

pub(crate) async fn import_handler<S>(
    State(service): State<Arc<ResultImportService<S>>>,
    multipart: Multipart,
) -> Response
where
    S: ExamResultStore + 'static,
{
    let limit = service.config().max_upload_bytes;
    let file = match read_single_file(multipart, limit).await {
        Ok(file) => file,
        Err(rejection) => return ImportError::from(rejection).into_response(),
    };

    let worker = Arc::clone(&service);
    match tokio::task::spawn_blocking(move || worker.import(file)).await {
        Ok(Ok(summary)) => summary.into_response(),
        Ok(Err(error)) => error.into_response(),
        Err(join_error) => ImportError::Interrupted(join_error.to_string()).into_response(),
    }
}

pub(crate) async fn template_handler() -> Response {
    let header_line = columns::EXPECTED
        .iter()
        .chain(columns::OPTIONAL.iter())
        .copied()
        .collect::<Vec<_>>()
        .join(",");

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"result-import-template.csv\"",
            ),
        ],
        format!("{header_line}\n"),
    )
        .into_response()
}

/// Buffers the one file part of a multipart body. Non-file parts are ignored.
async fn read_single_file(
    mut multipart: Multipart,
    limit: usize,
) -> Result<UploadedFile, UploadRejection> {
    let rejection = |error| transport_rejection(error, limit);
    let mut file: Option<UploadedFile> = None;

    while let Some(field) = multipart.next_field().await.map_err(rejection)? {
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        if file.is_some() {
            return Err(UploadRejection::MultipleFiles);
        }

        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(rejection)?;
        file = Some(UploadedFile {
            filename: Some(filename),
            content_type,
            bytes: bytes.to_vec(),
        });
    }

    file.ok_or(UploadRejection::MissingFile)
}

fn transport_rejection(error: MultipartError, limit: usize) -> UploadRejection {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        UploadRejection::TooLarge { limit }
    } else {
        UploadRejection::Transport(error.body_text())
    }
}
