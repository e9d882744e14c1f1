// src/store/mod.rs

//! Collaborator contracts for persistence.
//!
//! The quiz core only talks to these traits. `postgres` backs them with the
//! production database; `memory` keeps everything in process for tests and
//! local prototyping.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    answer::{Answer, AnswerDetail, NewAnswer},
    profile::{LoginToken, Profile},
    question::Question,
    session::{QuizSession, SessionSummary},
};

pub use memory::InMemoryStore;
pub use postgres::PgStore;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("conflict")]
    Conflict,

    /// A row could not be mapped into the strict model.
    #[error("malformed row: {0}")]
    Malformed(String),

    #[error("backend error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict,
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                StoreError::Malformed(err.to_string())
            }
            _ => StoreError::Backend(err.to_string()),
        }
    }
}

/// Result of [`QuizStore::record_answer`].
#[derive(Debug, Clone)]
pub enum RecordOutcome {
    Recorded { answer: Answer, completed: bool },
    /// The session was completed or already full; nothing was written.
    SessionClosed,
}

/// Question, session and answer persistence used by the quiz core.
#[async_trait]
pub trait QuizStore: Send + Sync {
    /// Random sample of active questions, optionally restricted to a category.
    async fn list_questions(
        &self,
        category: Option<&str>,
        limit: i64,
    ) -> Result<Vec<Question>, StoreError>;

    /// Fetch a question by ID regardless of its active flag.
    async fn get_question(&self, id: Uuid) -> Result<Option<Question>, StoreError>;

    async fn create_session(
        &self,
        user_id: Uuid,
        category: Option<&str>,
        total_questions: i64,
    ) -> Result<QuizSession, StoreError>;

    async fn get_session(&self, id: Uuid) -> Result<Option<QuizSession>, StoreError>;

    async fn find_answer(
        &self,
        session_id: Uuid,
        question_id: Uuid,
    ) -> Result<Option<Answer>, StoreError>;

    /// Record an answer and, when that fills the session, complete it.
    ///
    /// Runs as one atomic step per session: the completed flag and the answer
    /// count are checked against `total_questions` under the same lock as the
    /// insert. `complete` forces completion after a successful insert.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if the (session, question) pair already
    /// has an answer.
    async fn record_answer(
        &self,
        answer: NewAnswer,
        complete: bool,
    ) -> Result<RecordOutcome, StoreError>;

    /// Most recent sessions of a user, newest first, with answer tallies.
    async fn list_session_summaries(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<SessionSummary>, StoreError>;

    /// Answers of a session joined with their questions, oldest first.
    async fn list_answer_details(&self, session_id: Uuid) -> Result<Vec<AnswerDetail>, StoreError>;
}

/// Profiles and magic-link tokens.
#[async_trait]
pub trait AuthStore: Send + Sync {
    /// Store a pending token and purge tokens that have already expired.
    async fn create_login_token(&self, token: &LoginToken) -> Result<(), StoreError>;

    /// Remove and return a pending token. A second call for the same ID
    /// returns `None`.
    async fn consume_login_token(&self, id: Uuid) -> Result<Option<LoginToken>, StoreError>;

    /// Load the profile for an email, creating a `user` profile on first sign-in.
    async fn find_or_create_profile(&self, email: &str) -> Result<Profile, StoreError>;

    async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>, StoreError>;
}
