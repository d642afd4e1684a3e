use axum::extract::multipart::MultipartError;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;

use crate::core::errors::{AppError, AppResult};
use crate::core::types::{ChronologyResponse, Document, GenerateFromTextRequest};
use crate::AppState;

pub const MARKDOWN_FILENAME: &str = "chronology.md";

#[derive(Debug, Default)]
pub struct UploadForm {
    pub documents: Vec<Document>,
    pub case_description: String,
}

/// Body-limit overruns surface as 413; anything else is a bad request.
fn multipart_error(err: MultipartError, context: &str) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(
            "the request exceeds the upload size limit (CHRONOLOGY_MAX_UPLOAD_MB)".to_string(),
        )
    } else {
        AppError::InvalidInput(format!("{context}: {err}"))
    }
}

/// Reads `files` (repeatable) and `case_description` from a multipart body.
pub async fn read_upload(mut multipart: Multipart) -> AppResult<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, "malformed multipart body"))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "files" | "file" => {
                let filename = field.file_name().unwrap_or("").to_string();
                let mime = field.content_type().unwrap_or("").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error(e, &format!("failed to read upload {filename}")))?;
                // Browsers send an empty part when no file was picked.
                if filename.is_empty() && bytes.is_empty() {
                    continue;
                }
                let filename = if filename.is_empty() {
                    format!("document-{}", form.documents.len() + 1)
                } else {
                    filename
                };
                form.documents.push(Document::new(filename, mime, bytes.to_vec()));
            }
            "case_description" | "caseDescription" => {
                form.case_description = field
                    .text()
                    .await
                    .map_err(|e| multipart_error(e, "failed to read case description"))?;
            }
            other => tracing::debug!(field = other, "ignoring unknown multipart field"),
        }
    }

    if form.documents.is_empty() {
        return Err(AppError::InvalidInput(
            "upload at least one document in the `files` field".to_string(),
        ));
    }
    Ok(form)
}

/// Turns the JSON text request into documents. Names and texts pair up by
/// position.
pub fn documents_from_text(request: GenerateFromTextRequest) -> AppResult<Vec<Document>> {
    if request.documents_text.len() != request.document_names.len() {
        return Err(AppError::InvalidInput(format!(
            "documentsText has {} entries but documentNames has {}",
            request.documents_text.len(),
            request.document_names.len()
        )));
    }
    if request.documents_text.is_empty() {
        return Err(AppError::InvalidInput(
            "documentsText must contain at least one document".to_string(),
        ));
    }
    Ok(request
        .document_names
        .into_iter()
        .zip(request.documents_text)
        .map(|(name, text)| Document::from_text(name, text))
        .collect())
}

/// `POST /api/v1/chronology/generate`
pub async fn generate(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<Json<ChronologyResponse>> {
    let form = read_upload(multipart).await?;
    let report = state
        .executor
        .run(form.documents, &form.case_description)
        .await?;
    Ok(Json(report.into()))
}

/// `POST /api/v1/chronology/generate-text`
pub async fn generate_text(
    State(state): State<AppState>,
    payload: Result<Json<GenerateFromTextRequest>, JsonRejection>,
) -> AppResult<Json<ChronologyResponse>> {
    let Json(request) = payload.map_err(|e| AppError::InvalidInput(e.body_text()))?;
    let case_description = request.case_description.clone();
    let documents = documents_from_text(request)?;
    let report = state.executor.run(documents, &case_description).await?;
    Ok(Json(report.into()))
}

/// `POST /api/v1/chronology/download`
pub async fn download(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let form = read_upload(multipart).await?;
    let report = state
        .executor
        .run(form.documents, &form.case_description)
        .await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/markdown; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{MARKDOWN_FILENAME}\""),
            ),
        ],
        report.markdown,
    ))
}
