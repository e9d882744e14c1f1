// src/models/question.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A multiple-choice question as the quiz core sees it.
/// Authored outside this service and never mutated here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: Uuid,

    /// Topic label used to build category quizzes.
    pub category: String,

    pub prompt: String,

    /// Options addressed by their position, 0..N-1.
    pub options: Vec<String>,

    /// Position of the correct option inside `options`.
    pub correct_index: i64,

    /// Inactive questions are neither served nor scored.
    pub is_active: bool,
}

impl Question {
    pub fn options_count(&self) -> i64 {
        self.options.len() as i64
    }
}

/// DTO for sending a question to the client (excludes the correct index).
#[derive(Debug, Serialize, Deserialize)]
pub struct PublicQuestion {
    pub id: Uuid,
    pub category: String,
    pub prompt: String,
    pub options: Vec<String>,
}

impl From<Question> for PublicQuestion {
    fn from(q: Question) -> Self {
        Self {
            id: q.id,
            category: q.category,
            prompt: q.prompt,
            options: q.options,
        }
    }
}

/// Query parameters for `GET /api/questions`.
#[derive(Debug, Deserialize)]
pub struct QuestionListParams {
    pub limit: Option<i64>,
    pub category: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QuestionListResponse {
    pub items: Vec<PublicQuestion>,
}
