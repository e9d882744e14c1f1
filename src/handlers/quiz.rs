// src/handlers/quiz.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    config::DEFAULT_QUESTIONS_PER_SESSION,
    error::AppError,
    models::{
        answer::SubmitAnswerRequest,
        profile::Principal,
        session::{CreateSessionRequest, SessionResponse, category_filter},
    },
    quiz::{
        self, SubmitAnswer,
        progression::parse_identifier,
    },
    store::QuizStore,
};

/// Starts a quiz session for the caller.
///
/// The session's question count is fixed here and caps how many answers it accepts.
pub async fn create_session(
    State(store): State<Arc<dyn QuizStore>>,
    Extension(principal): Extension<Principal>,
    payload: Result<Json<CreateSessionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload?;
    req.validate()?;

    let total_questions = req.total_questions.unwrap_or(DEFAULT_QUESTIONS_PER_SESSION);
    let category = category_filter(req.category.as_deref());

    let session = store
        .create_session(principal.user_id, category, total_questions)
        .await?;

    tracing::info!(
        session_id = %session.id,
        user_id = %principal.user_id,
        category = session.category.as_deref().unwrap_or("all"),
        total_questions,
        "Quiz session created"
    );

    Ok((StatusCode::CREATED, Json(SessionResponse::from(session))))
}

/// Submits one answer for a session.
///
/// Replays and submissions after completion succeed with `already_answered`.
pub async fn submit_answer(
    State(store): State<Arc<dyn QuizStore>>,
    Extension(principal): Extension<Principal>,
    Path(session_id): Path<String>,
    payload: Result<Json<SubmitAnswerRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload?;

    let input = SubmitAnswer {
        session_id: parse_identifier(&session_id)?,
        question_id: parse_identifier(&req.question_id)?,
        chosen_index: req.chosen_index,
        current_index: req.current_index,
        total_questions: req.total_questions,
    };

    let outcome = quiz::submit_answer(store.as_ref(), &principal, input).await?;

    Ok(Json(outcome))
}
