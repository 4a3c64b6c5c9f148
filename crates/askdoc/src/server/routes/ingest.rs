//! Document ingestion endpoint

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{IngestFailure, IngestReport};

/// Response for an ingest call
#[derive(Debug, Serialize)]
pub struct IngestResponse {
    /// Total chunks written to the index
    pub chunks_written: usize,
    /// Sources processed successfully
    pub sources_ingested: usize,
    /// Per-source failures
    pub failures: Vec<IngestFailure>,
}

impl From<IngestReport> for IngestResponse {
    fn from(report: IngestReport) -> Self {
        Self {
            chunks_written: report.chunks_written,
            sources_ingested: report.sources_ingested,
            failures: report.failures,
        }
    }
}

/// POST /api/ingest - upload files and/or submit URLs
///
/// Multipart form: any number of file fields, plus an optional `urls` field
/// holding a JSON array of URLs to fetch.
pub async fn ingest_sources(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<IngestResponse>> {
    let mut files = Vec::new();
    let mut urls: Vec<String> = Vec::new();
    let mut failures = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::Config(format!("Failed to read multipart field: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();

        if name == "urls" {
            let data = field
                .bytes()
                .await
                .map_err(|e| Error::Config(format!("Failed to read urls field: {}", e)))?;
            urls = serde_json::from_slice(&data)
                .map_err(|e| Error::Config(format!("urls field is not a JSON array: {}", e)))?;
            continue;
        }

        let Some(filename) = field.file_name().map(|s| s.to_string()) else {
            continue;
        };

        let data = match field.bytes().await {
            Ok(d) => d,
            Err(e) => {
                failures.push(IngestFailure {
                    source: filename,
                    error: format!("Failed to read upload: {}", e),
                });
                continue;
            }
        };

        tracing::info!("Received upload: {} ({} bytes)", filename, data.len());

        // Keep the original extension: the processor's type gate needs it.
        let path = state
            .uploads_dir()
            .join(format!("{}-{}", Uuid::new_v4(), filename));
        match tokio::fs::write(&path, &data).await {
            Ok(()) => files.push(path),
            Err(e) => {
                failures.push(IngestFailure {
                    source: filename,
                    error: format!("Failed to store upload: {}", e),
                });
            }
        }
    }

    let (report, documents) = state.chain().ingest(&files, &urls).await?;
    state.register_documents(documents);

    let mut response = IngestResponse::from(report);
    response.failures.extend(failures);
    Ok(Json(response))
}
