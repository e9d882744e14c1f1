// src/handlers/questions.rs

use std::time::Duration;

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    response::IntoResponse,
};

use crate::{
    config::{DEFAULT_QUESTIONS_PER_SESSION, MAX_QUESTIONS_PER_SESSION},
    error::AppError,
    models::{
        question::{PublicQuestion, QuestionListParams, QuestionListResponse},
        session::category_filter,
    },
    state::AppState,
};

fn invalid_limit() -> AppError {
    AppError::BadRequest("Invalid limit parameter".to_string())
}

/// Serves a random batch of active questions for a quiz.
///
/// * `limit` defaults to 10 and must be within 1..=20.
/// * `category=all` (or no category) draws from every category.
/// * The store call is bounded by `question_fetch_timeout_ms`; exceeding it is a 504.
/// * Correct indices are stripped before the questions leave the server.
pub async fn list_questions(
    State(state): State<AppState>,
    params: Result<Query<QuestionListParams>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(params) = params.map_err(|_| invalid_limit())?;

    let limit = params.limit.unwrap_or(DEFAULT_QUESTIONS_PER_SESSION);
    if !(1..=MAX_QUESTIONS_PER_SESSION).contains(&limit) {
        return Err(invalid_limit());
    }
    let category = category_filter(params.category.as_deref());

    let timeout_ms = state.config.question_fetch_timeout_ms;
    let questions = tokio::time::timeout(
        Duration::from_millis(timeout_ms),
        state.quiz_store.list_questions(category, limit),
    )
    .await
    .map_err(|_| {
        tracing::warn!(timeout_ms, "Question fetch timed out");
        AppError::GatewayTimeout(format!("Request timed out after {}ms", timeout_ms))
    })??;

    let items = questions.into_iter().map(PublicQuestion::from).collect();

    Ok(Json(QuestionListResponse { items }))
}
