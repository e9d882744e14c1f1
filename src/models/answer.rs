// src/models/answer.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One recorded, validated response to one question within one session.
/// At most one exists per (session, question) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub id: Uuid,
    pub session_id: Uuid,
    pub question_id: Uuid,
    pub chosen_index: i64,
    pub is_correct: bool,
    pub answered_at: DateTime<Utc>,
}

/// Insert payload handed to the store.
#[derive(Debug, Clone)]
pub struct NewAnswer {
    pub session_id: Uuid,
    pub question_id: Uuid,
    pub chosen_index: i64,
    pub is_correct: bool,
}

/// DTO for `POST /api/quiz/sessions/{session_id}/answers`.
/// Identifiers arrive as raw strings so empty or malformed values
/// surface as input errors rather than extractor rejections.
#[derive(Debug, Deserialize)]
pub struct SubmitAnswerRequest {
    #[serde(default)]
    pub question_id: String,
    pub chosen_index: i64,
    pub current_index: i64,
    pub total_questions: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitAnswerResponse {
    pub is_correct: bool,
    pub already_answered: bool,
    pub next_index: i64,
}

/// An answer joined with the question it responds to, for results review.
#[derive(Debug, Clone)]
pub struct AnswerDetail {
    pub id: Uuid,
    pub question_id: Uuid,
    pub chosen_index: i64,
    pub is_correct: bool,
    pub answered_at: DateTime<Utc>,
    pub category: String,
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_index: i64,
}

/// One answer as shown on the session review page.
#[derive(Debug, Serialize, Deserialize)]
pub struct AnswerReview {
    pub id: Uuid,
    /// 1-based position within the session.
    pub question_number: usize,
    pub category: String,
    pub prompt: String,
    pub chosen_index: i64,
    pub chosen_label: String,
    pub correct_index: i64,
    pub correct_label: String,
    pub is_correct: bool,
    pub answered_at: DateTime<Utc>,
}
