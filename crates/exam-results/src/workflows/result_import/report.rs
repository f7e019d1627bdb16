use super::domain::ExamResult;
use super::service::ImportError;
use super::upload::UploadRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

/// Outcome of an import that reached the write phase.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub total_rows: usize,
    pub inserted_count: usize,
    /// Leading records of the file, for the uploader to eyeball.
    pub results: Vec<ExamResult>,
}

impl ImportSummary {
    pub fn body(&self) -> Value {
        json!({ "success": true, "data": self })
    }
}

impl IntoResponse for ImportSummary {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self.body())).into_response()
    }
}

impl ImportError {
    pub fn status(&self) -> StatusCode {
        match self {
            ImportError::Upload(UploadRejection::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            ImportError::Upload(_)
            | ImportError::Decode(_)
            | ImportError::NoDataRows
            | ImportError::Validation(_) => StatusCode::BAD_REQUEST,
            ImportError::Interrupted(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// JSON body in the shape returned to uploaders. Only validation
    /// rejections carry row detail.
    pub fn body(&self) -> Value {
        match self {
            ImportError::Validation(rejection) => json!({
                "success": false,
                "message": self.to_string(),
                "data": {
                    "errors": rejection.errors,
                    "processedRows": rejection.processed_rows,
                },
            }),
            _ => json!({
                "success": false,
                "message": self.to_string(),
            }),
        }
    }
}

impl IntoResponse for ImportError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}
