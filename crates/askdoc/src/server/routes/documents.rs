//! Document registry endpoint

use axum::{extract::State, Json};

use crate::server::state::AppState;
use crate::types::Document;

/// GET /api/documents - list ingested documents
pub async fn list_documents(State(state): State<AppState>) -> Json<Vec<Document>> {
    let mut documents = state.list_documents();
    documents.sort_by_key(|d| d.ingested_at);
    Json(documents)
}
