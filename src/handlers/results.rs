// src/handlers/results.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::{
    config::RESULTS_HISTORY_LIMIT,
    error::AppError,
    models::{profile::Principal, session::ResultSummary},
    quiz::{progression::parse_identifier, scoring},
    store::QuizStore,
};

/// Lists the caller's most recent sessions with their scores.
pub async fn list_results(
    State(store): State<Arc<dyn QuizStore>>,
    Extension(principal): Extension<Principal>,
) -> Result<impl IntoResponse, AppError> {
    let summaries: Vec<ResultSummary> = store
        .list_session_summaries(principal.user_id, RESULTS_HISTORY_LIMIT)
        .await?
        .into_iter()
        .map(scoring::summarize)
        .collect();

    Ok(Json(summaries))
}

/// Per-question review of one session.
/// Sessions of other users are reported as missing.
pub async fn get_result(
    State(store): State<Arc<dyn QuizStore>>,
    Extension(principal): Extension<Principal>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let session_id = parse_identifier(&session_id)?;

    let session = store
        .get_session(session_id)
        .await?
        .filter(|s| s.user_id == principal.user_id)
        .ok_or(AppError::NotFound("Quiz session not found.".to_string()))?;

    let details = store.list_answer_details(session.id).await?;

    Ok(Json(scoring::review(session, details)))
}
