//! Query endpoint

use axum::{extract::State, Json};

use crate::server::state::AppState;
use crate::types::{QueryRequest, QueryResult};

/// POST /api/query - ask a question over the indexed documents
///
/// Always returns a well-formed result; internal failures surface in the
/// answer text, never as an error status.
pub async fn query_rag(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Json<QueryResult> {
    let result = match request.top_k {
        Some(top_k) => state.chain().query_with_top_k(&request.question, top_k).await,
        None => state.chain().query(&request.question).await,
    };

    Json(result)
}
