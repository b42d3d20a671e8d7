//! Knowledge-base document route handlers.

use std::path::Path;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument, warn};

use merchant_assistant_core::DocumentId;

use crate::error::AppError;
use crate::retrieval::extract::{DocumentKind, sanitize_filename};
use crate::state::AppState;

/// Largest accepted upload.
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// An uploaded file on disk.
#[derive(Debug, Serialize)]
pub struct DocumentEntry {
    pub filename: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct DocumentsResponse {
    pub documents: Vec<DocumentEntry>,
}

/// Result of a successful upload.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub document_id: DocumentId,
    pub filename: String,
    pub chunks_created: usize,
    pub status: &'static str,
}

/// Build the documents router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/documents", get(list_documents))
        .route(
            "/api/documents/upload",
            post(upload_document).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
}

/// List uploaded documents, newest first.
///
/// GET /api/documents
async fn list_documents(State(state): State<AppState>) -> Json<DocumentsResponse> {
    let documents = scan_uploads(state.uploads_dir()).await.unwrap_or_else(|e| {
        warn!(error = %e, dir = %state.uploads_dir().display(), "Could not read uploads directory");
        Vec::new()
    });
    Json(DocumentsResponse { documents })
}

/// Save and ingest an uploaded file.
///
/// POST /api/documents/upload (multipart field `file`)
#[instrument(skip_all)]
async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid upload: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let raw_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Invalid upload: {e}")))?;
        upload = Some((raw_name, bytes));
        break;
    }

    let Some((raw_name, bytes)) = upload else {
        return Err(AppError::BadRequest("No file provided".to_string()));
    };
    let filename = sanitize_filename(&raw_name)
        .ok_or_else(|| AppError::BadRequest("No file provided".to_string()))?;
    if DocumentKind::from_filename(&filename).is_none() {
        return Err(AppError::BadRequest(
            "Only PDF, TXT or MD files allowed".to_string(),
        ));
    }

    let dir = state.uploads_dir();
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| AppError::Internal(format!("create uploads dir: {e}")))?;
    tokio::fs::write(dir.join(&filename), &bytes)
        .await
        .map_err(|e| AppError::Internal(format!("save upload: {e}")))?;

    let report = state
        .knowledge()
        .ingest_file(&filename, bytes.to_vec())
        .await?;
    info!(
        document_id = %report.document.id,
        filename = %filename,
        chunks = report.chunk_count,
        "Upload processed"
    );

    Ok(Json(UploadResponse {
        document_id: report.document.id,
        filename,
        chunks_created: report.chunk_count,
        status: "processed",
    }))
}

async fn scan_uploads(dir: &Path) -> std::io::Result<Vec<DocumentEntry>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut documents = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let filename = entry.file_name().to_string_lossy().into_owned();
        if DocumentKind::from_filename(&filename).is_none() {
            continue;
        }
        let metadata = entry.metadata().await?;
        if !metadata.is_file() {
            continue;
        }
        let uploaded_at = metadata
            .modified()
            .map_or_else(|_| Utc::now(), DateTime::<Utc>::from);
        documents.push(DocumentEntry {
            filename,
            uploaded_at,
        });
    }

    documents.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
    Ok(documents)
}
