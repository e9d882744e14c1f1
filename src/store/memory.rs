// src/store/memory.rs

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use async_trait::async_trait;
use chrono::Utc;
use rand::rng;
use rand::seq::SliceRandom;
use uuid::Uuid;

use super::{AuthStore, QuizStore, RecordOutcome, StoreError};
use crate::models::{
    answer::{Answer, AnswerDetail, NewAnswer},
    profile::{LoginToken, Profile, Role},
    question::Question,
    session::{QuizSession, SessionSummary},
};

#[derive(Default)]
struct Tables {
    questions: Vec<Question>,
    sessions: HashMap<Uuid, QuizSession>,
    /// Insertion order doubles as answer order.
    answers: Vec<Answer>,
    profiles: HashMap<Uuid, Profile>,
    login_tokens: HashMap<Uuid, LoginToken>,
}

/// Simple in-memory store for tests and prototyping.
///
/// All tables sit behind one mutex, so `record_answer` checks duplicates,
/// completion and the answer cap atomically with the insert, like the
/// session row lock in Postgres.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    /// Seed a question. Questions are authored outside the service, so this
    /// has no HTTP counterpart.
    pub fn insert_question(&self, question: Question) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        tables.questions.retain(|q| q.id != question.id);
        tables.questions.push(question);
        Ok(())
    }

    /// Number of answers recorded for a session.
    pub fn count_answers(&self, session_id: Uuid) -> Result<i64, StoreError> {
        let tables = self.lock()?;
        Ok(tables
            .answers
            .iter()
            .filter(|a| a.session_id == session_id)
            .count() as i64)
    }

    /// Overwrite a profile's role, e.g. to seed a superuser.
    pub fn set_role(&self, profile_id: Uuid, role: Role) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        let profile = tables
            .profiles
            .get_mut(&profile_id)
            .ok_or_else(|| StoreError::Backend(format!("profile {profile_id} missing")))?;
        profile.role = role;
        Ok(())
    }
}

#[async_trait]
impl QuizStore for InMemoryStore {
    async fn list_questions(
        &self,
        category: Option<&str>,
        limit: i64,
    ) -> Result<Vec<Question>, StoreError> {
        let tables = self.lock()?;
        let mut active: Vec<Question> = tables
            .questions
            .iter()
            .filter(|q| q.is_active)
            .filter(|q| category.is_none_or(|c| q.category == c))
            .cloned()
            .collect();
        active.shuffle(&mut rng());
        active.truncate(usize::try_from(limit.max(0)).unwrap_or(usize::MAX));
        Ok(active)
    }

    async fn get_question(&self, id: Uuid) -> Result<Option<Question>, StoreError> {
        let tables = self.lock()?;
        Ok(tables.questions.iter().find(|q| q.id == id).cloned())
    }

    async fn create_session(
        &self,
        user_id: Uuid,
        category: Option<&str>,
        total_questions: i64,
    ) -> Result<QuizSession, StoreError> {
        let mut tables = self.lock()?;
        let session = QuizSession {
            id: Uuid::new_v4(),
            user_id,
            category: category.map(str::to_string),
            total_questions,
            started_at: Utc::now(),
            completed_at: None,
        };
        tables.sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn get_session(&self, id: Uuid) -> Result<Option<QuizSession>, StoreError> {
        let tables = self.lock()?;
        Ok(tables.sessions.get(&id).cloned())
    }

    async fn find_answer(
        &self,
        session_id: Uuid,
        question_id: Uuid,
    ) -> Result<Option<Answer>, StoreError> {
        let tables = self.lock()?;
        Ok(tables
            .answers
            .iter()
            .find(|a| a.session_id == session_id && a.question_id == question_id)
            .cloned())
    }

    async fn record_answer(
        &self,
        answer: NewAnswer,
        complete: bool,
    ) -> Result<RecordOutcome, StoreError> {
        let mut tables = self.lock()?;
        let duplicate = tables
            .answers
            .iter()
            .any(|a| a.session_id == answer.session_id && a.question_id == answer.question_id);
        if duplicate {
            return Err(StoreError::Conflict);
        }

        let answered = tables
            .answers
            .iter()
            .filter(|a| a.session_id == answer.session_id)
            .count() as i64;
        let session = tables
            .sessions
            .get_mut(&answer.session_id)
            .ok_or_else(|| StoreError::Backend(format!("session {} missing", answer.session_id)))?;
        if session.is_completed() {
            return Ok(RecordOutcome::SessionClosed);
        }
        if answered >= session.total_questions {
            session.completed_at = Some(Utc::now());
            return Ok(RecordOutcome::SessionClosed);
        }

        let completed = complete || answered + 1 >= session.total_questions;
        if completed {
            session.completed_at = Some(Utc::now());
        }

        let record = Answer {
            id: Uuid::new_v4(),
            session_id: answer.session_id,
            question_id: answer.question_id,
            chosen_index: answer.chosen_index,
            is_correct: answer.is_correct,
            answered_at: Utc::now(),
        };
        tables.answers.push(record.clone());
        Ok(RecordOutcome::Recorded {
            answer: record,
            completed,
        })
    }

    async fn list_session_summaries(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<SessionSummary>, StoreError> {
        let tables = self.lock()?;
        let mut sessions: Vec<&QuizSession> = tables
            .sessions
            .values()
            .filter(|s| s.user_id == user_id)
            .collect();
        sessions.sort_by(|a, b| b.started_at.cmp(&a.started_at));

        let limit = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);
        Ok(sessions
            .into_iter()
            .take(limit)
            .map(|s| {
                let (answered, correct) = tables
                    .answers
                    .iter()
                    .filter(|a| a.session_id == s.id)
                    .fold((0, 0), |(n, c), a| (n + 1, c + i64::from(a.is_correct)));
                SessionSummary {
                    id: s.id,
                    category: s.category.clone(),
                    started_at: s.started_at,
                    completed_at: s.completed_at,
                    answered,
                    correct,
                }
            })
            .collect())
    }

    async fn list_answer_details(&self, session_id: Uuid) -> Result<Vec<AnswerDetail>, StoreError> {
        let tables = self.lock()?;
        tables
            .answers
            .iter()
            .filter(|a| a.session_id == session_id)
            .map(|a| {
                let question = tables
                    .questions
                    .iter()
                    .find(|q| q.id == a.question_id)
                    .ok_or_else(|| {
                        StoreError::Malformed(format!("answer {} has no question", a.id))
                    })?;
                Ok(AnswerDetail {
                    id: a.id,
                    question_id: a.question_id,
                    chosen_index: a.chosen_index,
                    is_correct: a.is_correct,
                    answered_at: a.answered_at,
                    category: question.category.clone(),
                    prompt: question.prompt.clone(),
                    options: question.options.clone(),
                    correct_index: question.correct_index,
                })
            })
            .collect()
    }
}

#[async_trait]
impl AuthStore for InMemoryStore {
    async fn create_login_token(&self, token: &LoginToken) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        let now = Utc::now();
        tables.login_tokens.retain(|_, t| t.expires_at > now);
        if tables.login_tokens.contains_key(&token.id) {
            return Err(StoreError::Conflict);
        }
        tables.login_tokens.insert(token.id, token.clone());
        Ok(())
    }

    async fn consume_login_token(&self, id: Uuid) -> Result<Option<LoginToken>, StoreError> {
        let mut tables = self.lock()?;
        Ok(tables.login_tokens.remove(&id))
    }

    async fn find_or_create_profile(&self, email: &str) -> Result<Profile, StoreError> {
        let mut tables = self.lock()?;
        if let Some(existing) = tables.profiles.values().find(|p| p.email == email) {
            return Ok(existing.clone());
        }

        let profile = Profile {
            id: Uuid::new_v4(),
            email: email.to_string(),
            full_name: None,
            role: Role::User,
            created_at: Utc::now(),
        };
        tables.profiles.insert(profile.id, profile.clone());
        Ok(profile)
    }

    async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>, StoreError> {
        let tables = self.lock()?;
        Ok(tables.profiles.get(&id).cloned())
    }
}
