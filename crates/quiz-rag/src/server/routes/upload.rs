//! PDF upload endpoint

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use std::time::Instant;

use crate::error::{Error, Result};
use crate::ingestion::PdfParser;
use crate::server::state::AppState;
use crate::types::{CollectionId, UploadResponse};

/// Multipart field carrying the PDF
const FILE_FIELD: &str = "file";

/// POST /upload - Extract, chunk and index a PDF
pub async fn upload_pdf(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>> {
    let mut multipart =
        multipart.map_err(|rejection| Error::invalid_input(rejection.body_text()))?;
    let mut upload = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        Error::invalid_input(format!("Failed to read multipart field: {}", e))
    })? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field
            .file_name()
            .map(|s| s.to_string())
            .ok_or_else(|| Error::invalid_input("the file field has no filename"))?;
        PdfParser::check_filename(&filename)?;

        let data = field
            .bytes()
            .await
            .map_err(|e| Error::invalid_input(format!("Failed to read file: {}", e)))?;
        upload = Some((filename, data));
        break;
    }

    let (filename, data) = upload
        .ok_or_else(|| Error::invalid_input(format!("missing '{}' field", FILE_FIELD)))?;

    tracing::info!("Processing upload: {} ({} bytes)", filename, data.len());
    let start = Instant::now();

    let parse_name = filename.clone();
    let bytes = data.clone();
    let parsed = tokio::task::spawn_blocking(move || PdfParser::parse(&parse_name, &bytes))
        .await
        .map_err(|e| Error::Internal(format!("Task join error: {}", e)))??;

    let segments = state.chunker().chunk(&parsed.content);
    let collection_id = CollectionId::from_content(&data);
    let handle = state
        .indexer()
        .index(&segments, &collection_id, Some(&filename))
        .await?;

    tracing::info!(
        "Processed {}: {} pages, {} chunks into {} in {}ms",
        filename,
        parsed.total_pages,
        handle.segment_count,
        handle.id,
        start.elapsed().as_millis()
    );

    Ok(Json(UploadResponse {
        message: "PDF processed".to_string(),
        filename,
        collection_id: handle.id,
        num_chunks: handle.segment_count,
        pages: parsed.total_pages,
    }))
}
