// src/store/postgres.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, types::Json};
use uuid::Uuid;

use super::{AuthStore, QuizStore, RecordOutcome, StoreError};
use crate::models::{
    answer::{Answer, AnswerDetail, NewAnswer},
    profile::{LoginToken, Profile, Role},
    question::Question,
    session::{QuizSession, SessionSummary},
};

/// Postgres-backed store. Row structs mirror the tables loosely and are
/// converted into the strict models here, so malformed rows stop at the
/// boundary as `StoreError::Malformed`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct QuestionRow {
    id: Uuid,
    category: String,
    prompt: String,
    options: Json<serde_json::Value>,
    correct_index: Option<i32>,
    is_active: Option<bool>,
}

/// Parse a JSONB options column into an ordered list of strings.
fn parse_options(id: Uuid, value: serde_json::Value) -> Result<Vec<String>, StoreError> {
    serde_json::from_value(value)
        .map_err(|e| StoreError::Malformed(format!("question {id} options: {e}")))
}

impl TryFrom<QuestionRow> for Question {
    type Error = StoreError;

    fn try_from(row: QuestionRow) -> Result<Self, Self::Error> {
        let options = parse_options(row.id, row.options.0)?;
        let correct_index = row
            .correct_index
            .ok_or_else(|| StoreError::Malformed(format!("question {} has no correct_index", row.id)))?;

        Ok(Question {
            id: row.id,
            category: row.category,
            prompt: row.prompt,
            options,
            correct_index: i64::from(correct_index),
            is_active: row.is_active.unwrap_or(false),
        })
    }
}

#[derive(FromRow)]
struct SessionRow {
    id: Uuid,
    user_id: Uuid,
    category: Option<String>,
    total_questions: i32,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl From<SessionRow> for QuizSession {
    fn from(row: SessionRow) -> Self {
        QuizSession {
            id: row.id,
            user_id: row.user_id,
            category: row.category,
            total_questions: i64::from(row.total_questions),
            started_at: row.started_at,
            completed_at: row.completed_at,
        }
    }
}

#[derive(FromRow)]
struct AnswerRow {
    id: Uuid,
    session_id: Uuid,
    question_id: Uuid,
    chosen_index: i32,
    is_correct: bool,
    answered_at: DateTime<Utc>,
}

impl From<AnswerRow> for Answer {
    fn from(row: AnswerRow) -> Self {
        Answer {
            id: row.id,
            session_id: row.session_id,
            question_id: row.question_id,
            chosen_index: i64::from(row.chosen_index),
            is_correct: row.is_correct,
            answered_at: row.answered_at,
        }
    }
}

#[derive(FromRow)]
struct SummaryRow {
    id: Uuid,
    category: Option<String>,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    answered: Option<i64>,
    correct: Option<i64>,
}

#[derive(FromRow)]
struct AnswerDetailRow {
    id: Uuid,
    question_id: Uuid,
    chosen_index: i32,
    is_correct: bool,
    answered_at: DateTime<Utc>,
    category: String,
    prompt: String,
    options: Json<serde_json::Value>,
    correct_index: i32,
}

impl TryFrom<AnswerDetailRow> for AnswerDetail {
    type Error = StoreError;

    fn try_from(row: AnswerDetailRow) -> Result<Self, Self::Error> {
        Ok(AnswerDetail {
            id: row.id,
            question_id: row.question_id,
            chosen_index: i64::from(row.chosen_index),
            is_correct: row.is_correct,
            answered_at: row.answered_at,
            category: row.category,
            prompt: row.prompt,
            options: parse_options(row.question_id, row.options.0)?,
            correct_index: i64::from(row.correct_index),
        })
    }
}

#[derive(FromRow)]
struct ProfileRow {
    id: Uuid,
    email: String,
    full_name: Option<String>,
    role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = StoreError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        let role: Role = row
            .role
            .parse()
            .map_err(|e| StoreError::Malformed(format!("profile {}: {}", row.id, e)))?;

        Ok(Profile {
            id: row.id,
            email: row.email,
            full_name: row.full_name,
            role,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct LoginTokenRow {
    id: Uuid,
    email: String,
    secret_hash: String,
    expires_at: DateTime<Utc>,
}

impl From<LoginTokenRow> for LoginToken {
    fn from(row: LoginTokenRow) -> Self {
        LoginToken {
            id: row.id,
            email: row.email,
            secret_hash: row.secret_hash,
            expires_at: row.expires_at,
        }
    }
}

/// Narrow an i64 coming from the core into an INTEGER column.
fn to_i32(value: i64, column: &str) -> Result<i32, StoreError> {
    i32::try_from(value).map_err(|_| StoreError::Malformed(format!("{column} out of range: {value}")))
}

#[async_trait]
impl QuizStore for PgStore {
    async fn list_questions(
        &self,
        category: Option<&str>,
        limit: i64,
    ) -> Result<Vec<Question>, StoreError> {
        let rows = sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT id, category, prompt, options, correct_index, is_active
            FROM questions
            WHERE is_active = TRUE
              AND ($1::TEXT IS NULL OR category = $1)
            ORDER BY RANDOM()
            LIMIT $2
            "#,
        )
        .bind(category)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch questions: {:?}", e);
            StoreError::from(e)
        })?;

        rows.into_iter().map(Question::try_from).collect()
    }

    async fn get_question(&self, id: Uuid) -> Result<Option<Question>, StoreError> {
        let row = sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT id, category, prompt, options, correct_index, is_active
            FROM questions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Question::try_from).transpose()
    }

    async fn create_session(
        &self,
        user_id: Uuid,
        category: Option<&str>,
        total_questions: i64,
    ) -> Result<QuizSession, StoreError> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            INSERT INTO quiz_sessions (user_id, category, total_questions)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, category, total_questions, started_at, completed_at
            "#,
        )
        .bind(user_id)
        .bind(category)
        .bind(to_i32(total_questions, "total_questions")?)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create quiz session: {:?}", e);
            StoreError::from(e)
        })?;

        Ok(row.into())
    }

    async fn get_session(&self, id: Uuid) -> Result<Option<QuizSession>, StoreError> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT id, user_id, category, total_questions, started_at, completed_at
            FROM quiz_sessions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(QuizSession::from))
    }

    async fn find_answer(
        &self,
        session_id: Uuid,
        question_id: Uuid,
    ) -> Result<Option<Answer>, StoreError> {
        let row = sqlx::query_as::<_, AnswerRow>(
            r#"
            SELECT id, session_id, question_id, chosen_index, is_correct, answered_at
            FROM quiz_answers
            WHERE session_id = $1 AND question_id = $2
            "#,
        )
        .bind(session_id)
        .bind(question_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Answer::from))
    }

    async fn record_answer(
        &self,
        answer: NewAnswer,
        complete: bool,
    ) -> Result<RecordOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Row lock serializes submissions per session until commit.
        let session: Option<(i32, bool)> = sqlx::query_as(
            r#"
            SELECT total_questions, completed_at IS NOT NULL
            FROM quiz_sessions
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(answer.session_id)
        .fetch_optional(&mut *tx)
        .await?;
        let (total_questions, is_completed) = session.ok_or_else(|| {
            StoreError::Backend(format!("session {} missing", answer.session_id))
        })?;

        let (duplicate, answered): (bool, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE question_id = $2) > 0,
                COUNT(*)
            FROM quiz_answers
            WHERE session_id = $1
            "#,
        )
        .bind(answer.session_id)
        .bind(answer.question_id)
        .fetch_one(&mut *tx)
        .await?;

        if duplicate {
            return Err(StoreError::Conflict);
        }
        if is_completed {
            return Ok(RecordOutcome::SessionClosed);
        }

        let total_questions = i64::from(total_questions);
        if answered >= total_questions {
            sqlx::query("UPDATE quiz_sessions SET completed_at = NOW() WHERE id = $1")
                .bind(answer.session_id)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
            return Ok(RecordOutcome::SessionClosed);
        }

        let row = sqlx::query_as::<_, AnswerRow>(
            r#"
            INSERT INTO quiz_answers (session_id, question_id, chosen_index, is_correct)
            VALUES ($1, $2, $3, $4)
            RETURNING id, session_id, question_id, chosen_index, is_correct, answered_at
            "#,
        )
        .bind(answer.session_id)
        .bind(answer.question_id)
        .bind(to_i32(answer.chosen_index, "chosen_index")?)
        .bind(answer.is_correct)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match StoreError::from(e) {
            StoreError::Conflict => StoreError::Conflict,
            other => {
                tracing::error!("Failed to record quiz answer: {}", other);
                other
            }
        })?;

        let completed = complete || answered + 1 >= total_questions;
        if completed {
            sqlx::query("UPDATE quiz_sessions SET completed_at = NOW() WHERE id = $1")
                .bind(answer.session_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await.map_err(|e| {
            tracing::error!("Failed to commit quiz answer: {:?}", e);
            StoreError::from(e)
        })?;

        Ok(RecordOutcome::Recorded {
            answer: row.into(),
            completed,
        })
    }

    async fn list_session_summaries(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<SessionSummary>, StoreError> {
        let rows = sqlx::query_as::<_, SummaryRow>(
            r#"
            SELECT
                s.id,
                s.category,
                s.started_at,
                s.completed_at,
                COUNT(a.id) AS answered,
                COUNT(a.id) FILTER (WHERE a.is_correct) AS correct
            FROM quiz_sessions s
            LEFT JOIN quiz_answers a ON a.session_id = s.id
            WHERE s.user_id = $1
            GROUP BY s.id
            ORDER BY s.started_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load quiz sessions: {:?}", e);
            StoreError::from(e)
        })?;

        Ok(rows
            .into_iter()
            .map(|row| SessionSummary {
                id: row.id,
                category: row.category,
                started_at: row.started_at,
                completed_at: row.completed_at,
                answered: row.answered.unwrap_or(0),
                correct: row.correct.unwrap_or(0),
            })
            .collect())
    }

    async fn list_answer_details(&self, session_id: Uuid) -> Result<Vec<AnswerDetail>, StoreError> {
        let rows = sqlx::query_as::<_, AnswerDetailRow>(
            r#"
            SELECT
                a.id, a.question_id, a.chosen_index, a.is_correct, a.answered_at,
                q.category, q.prompt, q.options, q.correct_index
            FROM quiz_answers a
            JOIN questions q ON q.id = a.question_id
            WHERE a.session_id = $1
            ORDER BY a.answered_at ASC
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load quiz details: {:?}", e);
            StoreError::from(e)
        })?;

        rows.into_iter().map(AnswerDetail::try_from).collect()
    }
}

#[async_trait]
impl AuthStore for PgStore {
    async fn create_login_token(&self, token: &LoginToken) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM login_tokens WHERE expires_at < NOW()")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO login_tokens (id, email, secret_hash, expires_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(token.id)
        .bind(&token.email)
        .bind(&token.secret_hash)
        .bind(token.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn consume_login_token(&self, id: Uuid) -> Result<Option<LoginToken>, StoreError> {
        let row = sqlx::query_as::<_, LoginTokenRow>(
            r#"
            DELETE FROM login_tokens
            WHERE id = $1
            RETURNING id, email, secret_hash, expires_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(LoginToken::from))
    }

    async fn find_or_create_profile(&self, email: &str) -> Result<Profile, StoreError> {
        // The no-op update makes RETURNING yield the existing row on conflict.
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            INSERT INTO profiles (email)
            VALUES ($1)
            ON CONFLICT (email) DO UPDATE SET email = EXCLUDED.email
            RETURNING id, email, full_name, role, created_at
            "#,
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load or create profile: {:?}", e);
            StoreError::from(e)
        })?;

        Profile::try_from(row)
    }

    async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>, StoreError> {
        let row = sqlx::query_as::<_, ProfileRow>(
            "SELECT id, email, full_name, role, created_at FROM profiles WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Profile::try_from).transpose()
    }
}
