// src/quiz/progression.rs

use uuid::Uuid;

use super::{error::QuizError, validation::validate_answer};
use crate::{
    models::{
        answer::{NewAnswer, SubmitAnswerResponse},
        profile::Principal,
    },
    store::{QuizStore, RecordOutcome, StoreError},
};

/// A single answer submission, with identifiers already parsed.
#[derive(Debug, Clone, Copy)]
pub struct SubmitAnswer {
    pub session_id: Uuid,
    pub question_id: Uuid,
    pub chosen_index: i64,
    pub current_index: i64,
    pub total_questions: i64,
}

/// Parse a session or question identifier supplied by the client.
pub fn parse_identifier(raw: &str) -> Result<Uuid, QuizError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(QuizError::InvalidInput(
            "Missing session or question identifier.".to_string(),
        ));
    }
    Uuid::parse_str(raw)
        .map_err(|_| QuizError::InvalidInput(format!("Malformed identifier '{}'.", raw)))
}

/// Pointer to the question after `current_index`, never past the end.
pub fn next_index(current_index: i64, total_questions: i64) -> i64 {
    current_index.saturating_add(1).min(total_questions)
}

fn already_answered(is_correct: bool, next_index: i64) -> SubmitAnswerResponse {
    SubmitAnswerResponse {
        is_correct,
        already_answered: true,
        next_index,
    }
}

/// Accept or replay one submission and advance the session.
///
/// * A completed session, or a question already answered in this session,
///   yields `already_answered` without touching storage. Replays report the
///   correctness recorded the first time.
/// * `total_questions` must match the length fixed at session creation.
/// * Otherwise the choice is validated and recorded once. The store completes
///   the session in the same step when the pointer reaches `total_questions`
///   or the session holds `total_questions` answers, and refuses the insert
///   if the session closed in the meantime.
/// * Losing an insert race to a concurrent submit is reported as a replay.
pub async fn submit_answer(
    store: &dyn QuizStore,
    principal: &Principal,
    input: SubmitAnswer,
) -> Result<SubmitAnswerResponse, QuizError> {
    if input.current_index < 0 || input.total_questions < 0 {
        return Err(QuizError::InvalidInput("Invalid quiz state.".to_string()));
    }

    let session = store
        .get_session(input.session_id)
        .await?
        .ok_or_else(|| QuizError::NotFound("Quiz session not found.".to_string()))?;

    if session.user_id != principal.user_id {
        tracing::warn!(
            session_id = %session.id,
            user_id = %principal.user_id,
            "Rejected submission for a session owned by another user"
        );
        return Err(QuizError::Unauthorized);
    }

    // The length was fixed when the session started.
    if input.total_questions != session.total_questions {
        return Err(QuizError::InvalidInput("Invalid quiz state.".to_string()));
    }

    let total = session.total_questions;
    let next = next_index(input.current_index, total);

    if session.is_completed() {
        return Ok(already_answered(false, next));
    }

    if let Some(existing) = store.find_answer(session.id, input.question_id).await? {
        return Ok(already_answered(existing.is_correct, next));
    }

    let question = store
        .get_question(input.question_id)
        .await?
        .filter(|q| q.is_active)
        .ok_or_else(|| QuizError::NotFound("Question not available.".to_string()))?;

    let validation = validate_answer(
        question.correct_index,
        input.chosen_index,
        question.options_count(),
    );
    if !validation.is_valid {
        return Err(QuizError::InvalidSelection);
    }

    let recorded = store
        .record_answer(
            NewAnswer {
                session_id: session.id,
                question_id: question.id,
                chosen_index: input.chosen_index,
                is_correct: validation.is_correct,
            },
            next >= total,
        )
        .await;

    match recorded {
        Ok(RecordOutcome::Recorded { completed, .. }) => {
            if completed {
                tracing::info!(session_id = %session.id, user_id = %principal.user_id, "Quiz session completed");
            }
        }
        // Completed or filled by a concurrent submit since the checks above.
        Ok(RecordOutcome::SessionClosed) => return Ok(already_answered(false, next)),
        Err(StoreError::Conflict) => {
            let winner = store
                .find_answer(session.id, question.id)
                .await?
                .ok_or(QuizError::Conflict)?;
            return Ok(already_answered(winner.is_correct, next));
        }
        Err(e) => return Err(e.into()),
    }

    Ok(SubmitAnswerResponse {
        is_correct: validation.is_correct,
        already_answered: false,
        next_index: next,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::{
        models::{
            answer::{Answer, AnswerDetail},
            profile::Role,
            question::Question,
            session::{QuizSession, SessionSummary},
        },
        store::InMemoryStore,
    };

    fn principal() -> Principal {
        Principal {
            user_id: Uuid::new_v4(),
            role: Role::User,
        }
    }

    fn seed_question(store: &InMemoryStore, correct_index: i64) -> Question {
        let question = Question {
            id: Uuid::new_v4(),
            category: "geography".to_string(),
            prompt: "Capital of France?".to_string(),
            options: vec![
                "Berlin".to_string(),
                "Madrid".to_string(),
                "Paris".to_string(),
                "Rome".to_string(),
            ],
            correct_index,
            is_active: true,
        };
        store.insert_question(question.clone()).unwrap();
        question
    }

    fn submission(session: &QuizSession, question: &Question, chosen: i64, current: i64) -> SubmitAnswer {
        SubmitAnswer {
            session_id: session.id,
            question_id: question.id,
            chosen_index: chosen,
            current_index: current,
            total_questions: session.total_questions,
        }
    }

    #[test]
    fn parse_identifier_distinguishes_missing_and_malformed() {
        let missing = parse_identifier("  ").unwrap_err();
        assert!(missing.to_string().contains("Missing"));

        let malformed = parse_identifier("not-a-uuid").unwrap_err();
        assert!(malformed.to_string().contains("Malformed"));

        let id = Uuid::new_v4();
        assert_eq!(parse_identifier(&id.to_string()).unwrap(), id);
    }

    #[test]
    fn next_index_is_capped_at_total() {
        assert_eq!(next_index(0, 10), 1);
        assert_eq!(next_index(9, 10), 10);
        assert_eq!(next_index(15, 10), 10);
        assert_eq!(next_index(i64::MAX, 10), 10);
    }

    #[tokio::test]
    async fn records_correct_answer_and_advances() {
        let store = InMemoryStore::new();
        let user = principal();
        let question = seed_question(&store, 2);
        let session = store.create_session(user.user_id, None, 10).await.unwrap();

        let outcome = submit_answer(&store, &user, submission(&session, &question, 2, 0))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            SubmitAnswerResponse {
                is_correct: true,
                already_answered: false,
                next_index: 1
            }
        );
        let stored = store.find_answer(session.id, question.id).await.unwrap().unwrap();
        assert!(stored.is_correct);
        assert_eq!(stored.chosen_index, 2);
    }

    #[tokio::test]
    async fn invalid_selection_is_rejected_without_a_record() {
        let store = InMemoryStore::new();
        let user = principal();
        let question = seed_question(&store, 0);
        let session = store.create_session(user.user_id, None, 10).await.unwrap();

        for chosen in [-1, 4, 99] {
            let err = submit_answer(&store, &user, submission(&session, &question, chosen, 0))
                .await
                .unwrap_err();
            assert!(matches!(err, QuizError::InvalidSelection));
        }
        assert_eq!(store.count_answers(session.id).unwrap(), 0);
    }

    #[tokio::test]
    async fn replay_returns_recorded_correctness_once() {
        let store = InMemoryStore::new();
        let user = principal();
        let question = seed_question(&store, 1);
        let session = store.create_session(user.user_id, None, 10).await.unwrap();

        let first = submit_answer(&store, &user, submission(&session, &question, 3, 0))
            .await
            .unwrap();
        // A different choice on replay must not rescore the question.
        let replay = submit_answer(&store, &user, submission(&session, &question, 1, 0))
            .await
            .unwrap();

        assert!(!first.is_correct);
        assert!(!first.already_answered);
        assert!(!replay.is_correct);
        assert!(replay.already_answered);
        assert_eq!(replay.next_index, 1);
        assert_eq!(store.count_answers(session.id).unwrap(), 1);
    }

    #[tokio::test]
    async fn last_answer_completes_session_and_later_submits_are_noops() {
        let store = InMemoryStore::new();
        let user = principal();
        let first = seed_question(&store, 0);
        let second = seed_question(&store, 0);
        let extra = seed_question(&store, 0);
        let session = store.create_session(user.user_id, None, 2).await.unwrap();

        submit_answer(&store, &user, submission(&session, &first, 0, 0))
            .await
            .unwrap();
        let last = submit_answer(&store, &user, submission(&session, &second, 0, 1))
            .await
            .unwrap();
        assert_eq!(last.next_index, 2);
        assert!(store.get_session(session.id).await.unwrap().unwrap().is_completed());

        let after = submit_answer(&store, &user, submission(&session, &extra, 0, 2))
            .await
            .unwrap();
        assert_eq!(
            after,
            SubmitAnswerResponse {
                is_correct: false,
                already_answered: true,
                next_index: 2
            }
        );
        assert_eq!(store.count_answers(session.id).unwrap(), 2);
    }

    #[tokio::test]
    async fn answer_count_never_exceeds_total_even_with_stale_pointer() {
        let store = InMemoryStore::new();
        let user = principal();
        let questions: Vec<Question> = (0..3).map(|_| seed_question(&store, 0)).collect();
        let session = store.create_session(user.user_id, None, 2).await.unwrap();

        // The client never advances its pointer.
        for question in &questions {
            submit_answer(&store, &user, submission(&session, question, 0, 0))
                .await
                .unwrap();
        }

        assert_eq!(store.count_answers(session.id).unwrap(), 2);
        assert!(store.get_session(session.id).await.unwrap().unwrap().is_completed());
    }

    #[tokio::test]
    async fn foreign_session_is_unauthorized() {
        let store = InMemoryStore::new();
        let owner = principal();
        let intruder = principal();
        let question = seed_question(&store, 0);
        let session = store.create_session(owner.user_id, None, 10).await.unwrap();

        let err = submit_answer(&store, &intruder, submission(&session, &question, 0, 0))
            .await
            .unwrap_err();

        assert!(matches!(err, QuizError::Unauthorized));
        assert_eq!(store.count_answers(session.id).unwrap(), 0);
    }

    #[tokio::test]
    async fn missing_session_and_inactive_question_are_not_found() {
        let store = InMemoryStore::new();
        let user = principal();
        let question = seed_question(&store, 0);

        let err = submit_answer(
            &store,
            &user,
            SubmitAnswer {
                session_id: Uuid::new_v4(),
                question_id: question.id,
                chosen_index: 0,
                current_index: 0,
                total_questions: 10,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, QuizError::NotFound(_)));

        let mut retired = seed_question(&store, 0);
        retired.is_active = false;
        store.insert_question(retired.clone()).unwrap();
        let session = store.create_session(user.user_id, None, 10).await.unwrap();

        let err = submit_answer(&store, &user, submission(&session, &retired, 0, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, QuizError::NotFound(_)));
    }

    #[tokio::test]
    async fn negative_or_mismatched_quiz_state_is_invalid_input() {
        let store = InMemoryStore::new();
        let user = principal();
        let question = seed_question(&store, 0);
        let session = store.create_session(user.user_id, None, 10).await.unwrap();

        let mut negative = submission(&session, &question, 0, -1);
        let err = submit_answer(&store, &user, negative).await.unwrap_err();
        assert!(matches!(err, QuizError::InvalidInput(_)));

        negative.current_index = 0;
        negative.total_questions = -3;
        let err = submit_answer(&store, &user, negative).await.unwrap_err();
        assert!(matches!(err, QuizError::InvalidInput(_)));

        for claimed in [1, 9, 11] {
            let mut mismatched = submission(&session, &question, 0, 0);
            mismatched.total_questions = claimed;
            let err = submit_answer(&store, &user, mismatched).await.unwrap_err();
            assert!(matches!(err, QuizError::InvalidInput(_)));
        }
        assert_eq!(store.count_answers(session.id).unwrap(), 0);
    }

    #[tokio::test]
    async fn short_client_total_cannot_end_session_early() {
        let store = InMemoryStore::new();
        let user = principal();
        let first = seed_question(&store, 0);
        let second = seed_question(&store, 0);
        let session = store.create_session(user.user_id, None, 10).await.unwrap();

        let mut short = submission(&session, &first, 0, 0);
        short.total_questions = 1;
        assert!(submit_answer(&store, &user, short).await.is_err());

        let outcome = submit_answer(&store, &user, submission(&session, &second, 0, 0))
            .await
            .unwrap();

        assert!(!outcome.already_answered);
        assert!(!store.get_session(session.id).await.unwrap().unwrap().is_completed());
    }

    /// Wraps the in-memory store to shape how calls interleave or fail.
    #[derive(Default)]
    struct ScriptedStore {
        inner: InMemoryStore,
        /// Yield to the runtime before every call so joined submits interleave.
        yield_each_call: bool,
        /// Hide the next `find_answer` hit, as if a concurrent writer committed
        /// between the duplicate check and the insert.
        hide_next_find: AtomicBool,
        /// Fail the next `record_answer` before anything is written.
        fail_next_record: AtomicBool,
    }

    impl ScriptedStore {
        fn over(inner: InMemoryStore) -> Self {
            Self {
                inner,
                ..Self::default()
            }
        }

        async fn pause(&self) {
            if self.yield_each_call {
                tokio::task::yield_now().await;
            }
        }
    }

    #[async_trait]
    impl QuizStore for ScriptedStore {
        async fn list_questions(&self, category: Option<&str>, limit: i64) -> Result<Vec<Question>, StoreError> {
            self.pause().await;
            self.inner.list_questions(category, limit).await
        }

        async fn get_question(&self, id: Uuid) -> Result<Option<Question>, StoreError> {
            self.pause().await;
            self.inner.get_question(id).await
        }

        async fn create_session(
            &self,
            user_id: Uuid,
            category: Option<&str>,
            total_questions: i64,
        ) -> Result<QuizSession, StoreError> {
            self.inner.create_session(user_id, category, total_questions).await
        }

        async fn get_session(&self, id: Uuid) -> Result<Option<QuizSession>, StoreError> {
            self.pause().await;
            self.inner.get_session(id).await
        }

        async fn find_answer(&self, session_id: Uuid, question_id: Uuid) -> Result<Option<Answer>, StoreError> {
            self.pause().await;
            if self.hide_next_find.swap(false, Ordering::SeqCst) {
                return Ok(None);
            }
            self.inner.find_answer(session_id, question_id).await
        }

        async fn record_answer(&self, answer: NewAnswer, complete: bool) -> Result<RecordOutcome, StoreError> {
            self.pause().await;
            if self.fail_next_record.swap(false, Ordering::SeqCst) {
                return Err(StoreError::Backend("down".to_string()));
            }
            self.inner.record_answer(answer, complete).await
        }

        async fn list_session_summaries(&self, user_id: Uuid, limit: i64) -> Result<Vec<SessionSummary>, StoreError> {
            self.inner.list_session_summaries(user_id, limit).await
        }

        async fn list_answer_details(&self, session_id: Uuid) -> Result<Vec<AnswerDetail>, StoreError> {
            self.inner.list_answer_details(session_id).await
        }
    }

    #[tokio::test]
    async fn lost_insert_race_is_reported_as_replay() {
        let inner = InMemoryStore::new();
        let user = principal();
        let question = seed_question(&inner, 2);
        let session = inner.create_session(user.user_id, None, 10).await.unwrap();
        let store = ScriptedStore::over(inner);

        let winner = submit_answer(&store, &user, submission(&session, &question, 2, 0))
            .await
            .unwrap();
        store.hide_next_find.store(true, Ordering::SeqCst);
        let loser = submit_answer(&store, &user, submission(&session, &question, 0, 0))
            .await
            .unwrap();

        assert!(winner.is_correct && !winner.already_answered);
        assert!(loser.is_correct && loser.already_answered);
        assert_eq!(store.inner.count_answers(session.id).unwrap(), 1);
    }

    #[tokio::test]
    async fn concurrent_identical_submits_record_one_answer() {
        let inner = InMemoryStore::new();
        let user = principal();
        let question = seed_question(&inner, 2);
        let session = inner.create_session(user.user_id, None, 10).await.unwrap();
        let store = ScriptedStore {
            yield_each_call: true,
            ..ScriptedStore::over(inner)
        };

        let (a, b) = tokio::join!(
            submit_answer(&store, &user, submission(&session, &question, 2, 0)),
            submit_answer(&store, &user, submission(&session, &question, 2, 0)),
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        assert!(a.is_correct && b.is_correct);
        assert_eq!(
            [a.already_answered, b.already_answered].iter().filter(|x| !**x).count(),
            1
        );
        assert_eq!(store.inner.count_answers(session.id).unwrap(), 1);
    }

    #[tokio::test]
    async fn concurrent_submits_for_different_questions_respect_the_cap() {
        let inner = InMemoryStore::new();
        let user = principal();
        let first = seed_question(&inner, 0);
        let second = seed_question(&inner, 0);
        let session = inner.create_session(user.user_id, None, 1).await.unwrap();
        let store = ScriptedStore {
            yield_each_call: true,
            ..ScriptedStore::over(inner)
        };

        let (a, b) = tokio::join!(
            submit_answer(&store, &user, submission(&session, &first, 0, 0)),
            submit_answer(&store, &user, submission(&session, &second, 0, 0)),
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_eq!(
            [a.already_answered, b.already_answered].iter().filter(|x| !**x).count(),
            1
        );
        assert_eq!(store.inner.count_answers(session.id).unwrap(), 1);
        assert!(store.inner.get_session(session.id).await.unwrap().unwrap().is_completed());
    }

    #[tokio::test]
    async fn failed_final_write_leaves_nothing_and_retry_completes() {
        let inner = InMemoryStore::new();
        let user = principal();
        let question = seed_question(&inner, 0);
        let session = inner.create_session(user.user_id, None, 1).await.unwrap();
        let store = ScriptedStore::over(inner);

        store.fail_next_record.store(true, Ordering::SeqCst);
        let err = submit_answer(&store, &user, submission(&session, &question, 0, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, QuizError::UpstreamFailure(_)));
        assert_eq!(store.inner.count_answers(session.id).unwrap(), 0);

        let retry = submit_answer(&store, &user, submission(&session, &question, 0, 0))
            .await
            .unwrap();

        assert!(!retry.already_answered);
        assert_eq!(store.inner.count_answers(session.id).unwrap(), 1);
        assert!(store.inner.get_session(session.id).await.unwrap().unwrap().is_completed());
    }
}
