//! API routes

mod documents;
mod ingest;
mod query;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::server::state::AppState;

/// Build the `/api` route group
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        .route("/ingest", post(ingest::ingest_sources))
        .route("/query", post(query::query_rag))
        .route("/documents", get(documents::list_documents))
        .layer(DefaultBodyLimit::max(max_upload_size))
}
