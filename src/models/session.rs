// src/models/session.rs

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::config::MAX_QUESTIONS_PER_SESSION;

static CATEGORY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\p{L}\p{N}][\p{L}\p{N} _&'-]{0,63}$").expect("valid regex"));

/// Category value that stands for "every category".
pub const ALL_CATEGORIES: &str = "all";

/// One user's attempt at a fixed-length quiz.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category: Option<String>,
    /// Fixed at creation; upper bound on recorded answers.
    pub total_questions: i64,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl QuizSession {
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

/// DTO for starting a quiz.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct CreateSessionRequest {
    #[validate(custom(function = validate_category))]
    pub category: Option<String>,

    #[validate(range(min = 1, max = MAX_QUESTIONS_PER_SESSION))]
    pub total_questions: Option<i64>,
}

pub fn validate_category(category: &str) -> Result<(), validator::ValidationError> {
    if !CATEGORY_PATTERN.is_match(category) {
        return Err(validator::ValidationError::new("invalid_category"));
    }
    Ok(())
}

/// Maps the client-facing category value onto a store filter.
/// Blank values and `all` mean no filter.
pub fn category_filter(category: Option<&str>) -> Option<&str> {
    category
        .map(str::trim)
        .filter(|c| !c.is_empty() && *c != ALL_CATEGORIES)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub id: Uuid,
    pub category: Option<String>,
    pub total_questions: i64,
    pub started_at: DateTime<Utc>,
}

impl From<QuizSession> for SessionResponse {
    fn from(s: QuizSession) -> Self {
        Self {
            id: s.id,
            category: s.category,
            total_questions: s.total_questions,
            started_at: s.started_at,
        }
    }
}

/// Aggregated row for the results history: a session and its answer tallies.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub id: Uuid,
    pub category: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub answered: i64,
    pub correct: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    InProgress,
    Completed,
}

impl SessionStatus {
    pub fn of(completed_at: Option<DateTime<Utc>>) -> Self {
        if completed_at.is_some() {
            SessionStatus::Completed
        } else {
            SessionStatus::InProgress
        }
    }
}

/// One row of the results history.
#[derive(Debug, Serialize, Deserialize)]
pub struct ResultSummary {
    pub id: Uuid,
    pub category: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub status: SessionStatus,
    pub total: i64,
    pub correct: i64,
    pub percentage: u32,
}

/// Review of a single session: header plus every recorded answer.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionDetailResponse {
    pub id: Uuid,
    pub category: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub status: SessionStatus,
    pub total: i64,
    pub correct: i64,
    pub percentage: u32,
    pub answers: Vec<crate::models::answer::AnswerReview>,
}
