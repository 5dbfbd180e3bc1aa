//! Upload API routes
//!
//! - `POST /api/v1/upload/csv` - Accept a CSV price list (multipart field `file`)
//! - `GET /api/v1/upload/status/:batch_id` - Current state of an upload batch

use crate::api::response::{ApiResponse, ErrorResponse};
use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use super::{
    commands::{CreateBatchCommand, CreateBatchError},
    queries::{GetBatchStatusError, GetBatchStatusQuery},
    IntakeState,
};

pub fn uploads_routes() -> Router<IntakeState> {
    Router::new()
        .route("/csv", post(upload_csv))
        .route("/status/:batch_id", get(get_batch_status))
}

/// Accept a price list for background processing
///
/// # Response
///
/// - `201 Created` - Batch created in `pending`, job queued
/// - `400 Bad Request` - Missing, empty or non-CSV file
/// - `413 Payload Too Large` - File over `UPLOAD_MAX_FILE_SIZE`
/// - `500 Internal Server Error` - Storage, database or queue failure
#[tracing::instrument(skip(intake, multipart))]
async fn upload_csv(
    State(intake): State<IntakeState>,
    mut multipart: Multipart,
) -> Result<Response, UploadApiError> {
    let limit = intake.max_file_size;
    let rejection = |e: MultipartError| multipart_error(e, limit);

    let mut command: Option<CreateBatchCommand> = None;
    while let Some(field) = multipart.next_field().await.map_err(rejection)? {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.map_err(rejection)?;

        command = Some(CreateBatchCommand {
            file_name,
            content_type,
            content: data.to_vec(),
        });
    }

    let command = command.ok_or(CreateBatchError::FileRequired)?;
    let response = super::commands::create_batch::handle(intake, command).await?;

    tracing::info!(batch_id = %response.id, "CSV upload accepted via API");

    Ok((StatusCode::CREATED, Json(ApiResponse::success(response))).into_response())
}

/// Poll the state of a batch
///
/// # Response
///
/// - `200 OK` - Batch snapshot
/// - `404 Not Found` - Unknown batch id
#[tracing::instrument(skip(intake))]
async fn get_batch_status(
    State(intake): State<IntakeState>,
    Path(batch_id): Path<String>,
) -> Result<Response, UploadApiError> {
    let query = GetBatchStatusQuery { batch_id };
    let response = super::queries::get_status::handle(intake.batches.clone(), query).await?;

    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

fn multipart_error(err: MultipartError, limit: usize) -> CreateBatchError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        CreateBatchError::TooLarge { limit }
    } else {
        CreateBatchError::Multipart(err.body_text())
    }
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
enum UploadApiError {
    CreateError(CreateBatchError),
    StatusError(GetBatchStatusError),
}

impl From<CreateBatchError> for UploadApiError {
    fn from(err: CreateBatchError) -> Self {
        Self::CreateError(err)
    }
}

impl From<GetBatchStatusError> for UploadApiError {
    fn from(err: GetBatchStatusError) -> Self {
        Self::StatusError(err)
    }
}

impl IntoResponse for UploadApiError {
    fn into_response(self) -> Response {
        match self {
            UploadApiError::CreateError(
                CreateBatchError::FileRequired
                | CreateBatchError::FileNameRequired
                | CreateBatchError::FileNameLength
                | CreateBatchError::ContentRequired
                | CreateBatchError::NotCsv(_)
                | CreateBatchError::Multipart(_),
            ) => ErrorResponse::new("VALIDATION_ERROR", self.to_string())
                .into_response_with(StatusCode::BAD_REQUEST),
            UploadApiError::CreateError(CreateBatchError::TooLarge { limit }) => {
                ErrorResponse::with_details(
                    "PAYLOAD_TOO_LARGE",
                    self.to_string(),
                    json!({ "max_file_size": limit }),
                )
                .into_response_with(StatusCode::PAYLOAD_TOO_LARGE)
            },
            UploadApiError::CreateError(
                CreateBatchError::Storage(_) | CreateBatchError::Store(_) | CreateBatchError::Queue(_),
            ) => {
                tracing::error!("Upload could not be accepted: {}", self);
                ErrorResponse::new("INTERNAL_ERROR", "The upload could not be processed")
                    .into_response_with(StatusCode::INTERNAL_SERVER_ERROR)
            },

            UploadApiError::StatusError(GetBatchStatusError::NotFound(_)) => {
                ErrorResponse::new("NOT_FOUND", self.to_string())
                    .into_response_with(StatusCode::NOT_FOUND)
            },
            UploadApiError::StatusError(GetBatchStatusError::Store(_)) => {
                tracing::error!("Database error during status lookup: {}", self);
                ErrorResponse::new("INTERNAL_ERROR", "A database error occurred")
                    .into_response_with(StatusCode::INTERNAL_SERVER_ERROR)
            },
        }
    }
}

impl std::fmt::Display for UploadApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CreateError(e) => write!(f, "{}", e),
            Self::StatusError(e) => write!(f, "{}", e),
        }
    }
}
