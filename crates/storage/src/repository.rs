use async_trait::async_trait;
use quiz_core::Clock;
use quiz_core::model::{
    Answer, ProgressSummary, RecordOutcome, ResubmissionPolicy, Session, SessionId,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Session store contract: the single source of truth for level, streak and history.
///
/// Unknown ids are never an error; they create a fresh session. Implementations
/// must serialize `record_answer` per session id so the streak/level update
/// never loses a concurrent write.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Fetch the session for `id`, creating a default one on first access.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` only if the backing store is unavailable.
    async fn get_or_create(&self, id: &SessionId) -> Result<Session, StorageError>;

    /// Append `answer` to the session history and apply the streak/level rule.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` only if the backing store is unavailable.
    async fn record_answer(
        &self,
        id: &SessionId,
        answer: Answer,
        policy: ResubmissionPolicy,
    ) -> Result<RecordOutcome, StorageError>;

    /// Aggregate the session history into a progress report.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` only if the backing store is unavailable.
    async fn summarize(&self, id: &SessionId) -> Result<ProgressSummary, StorageError> {
        Ok(self.get_or_create(id).await?.summary())
    }
}

type SessionSlot = Arc<Mutex<Session>>;

/// Process-lifetime session store with one lock per session.
///
/// The outer map lock is only held long enough to find or insert a slot;
/// reads and writes of a session happen under that session's own lock, so
/// different visitors never contend with each other.
#[derive(Clone, Default)]
pub struct InMemorySessionRepository {
    sessions: Arc<Mutex<HashMap<SessionId, SessionSlot>>>,
    clock: Clock,
}

impl InMemorySessionRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Number of sessions created so far.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the session map lock is poisoned.
    pub fn len(&self) -> Result<usize, StorageError> {
        let guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.len())
    }

    fn slot(&self, id: &SessionId) -> Result<SessionSlot, StorageError> {
        let mut guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let slot = guard.entry(id.clone()).or_insert_with(|| {
            tracing::debug!(session = %id, "creating session");
            Arc::new(Mutex::new(Session::new(self.clock.now())))
        });
        Ok(Arc::clone(slot))
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn get_or_create(&self, id: &SessionId) -> Result<Session, StorageError> {
        let slot = self.slot(id)?;
        let session = slot
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(session.clone())
    }

    async fn record_answer(
        &self,
        id: &SessionId,
        answer: Answer,
        policy: ResubmissionPolicy,
    ) -> Result<RecordOutcome, StorageError> {
        let slot = self.slot(id)?;
        let mut session = slot
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let outcome = session.record(answer, policy);
        tracing::debug!(session = %id, ?outcome, "answer recorded");
        Ok(outcome)
    }

    async fn summarize(&self, id: &SessionId) -> Result<ProgressSummary, StorageError> {
        let slot = self.slot(id)?;
        let session = slot
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(session.summary())
    }
}

/// Session store behind a trait object for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub sessions: Arc<dyn SessionRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::in_memory_with_clock(Clock::default())
    }

    #[must_use]
    pub fn in_memory_with_clock(clock: Clock) -> Self {
        let repo = InMemorySessionRepository::new().with_clock(clock);
        Self {
            sessions: Arc::new(repo),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{Difficulty, Level, QuestionId};
    use quiz_core::time::{fixed_clock, fixed_now};

    fn answer(id: &str, correct: bool) -> Answer {
        Answer {
            question_id: QuestionId::new(id),
            correct,
            difficulty: Difficulty::Easy,
            topic: "macro".into(),
            answered_at: fixed_now(),
        }
    }

    #[tokio::test]
    async fn unknown_id_creates_default_session() {
        let repo = InMemorySessionRepository::new().with_clock(fixed_clock());
        let session = repo.get_or_create(&SessionId::from("fresh")).await.unwrap();
        assert_eq!(session.level(), Level::MIN);
        assert_eq!(session.streak(), 0);
        assert!(session.answers().is_empty());
        assert_eq!(session.started_at(), fixed_now());
        assert_eq!(repo.len().unwrap(), 1);
    }

    #[tokio::test]
    async fn repeated_access_returns_same_session() {
        let repo = InMemorySessionRepository::new();
        let id = SessionId::from("same");
        repo.record_answer(&id, answer("q1", true), ResubmissionPolicy::Allow)
            .await
            .unwrap();
        let session = repo.get_or_create(&id).await.unwrap();
        assert_eq!(session.answers().len(), 1);
        assert_eq!(repo.len().unwrap(), 1);
    }

    #[tokio::test]
    async fn sessions_are_independent() {
        let repo = InMemorySessionRepository::new();
        for i in 0..3 {
            repo.record_answer(
                &SessionId::from("a"),
                answer(&format!("q{i}"), true),
                ResubmissionPolicy::Allow,
            )
            .await
            .unwrap();
        }
        let a = repo.get_or_create(&SessionId::from("a")).await.unwrap();
        let b = repo.get_or_create(&SessionId::from("b")).await.unwrap();
        assert_eq!(a.level().value(), 2);
        assert_eq!(b.level().value(), 1);
    }

    #[tokio::test]
    async fn summarize_does_not_touch_state() {
        let repo = InMemorySessionRepository::new();
        let id = SessionId::from("s");
        repo.record_answer(&id, answer("q1", false), ResubmissionPolicy::Allow)
            .await
            .unwrap();
        let before = repo.get_or_create(&id).await.unwrap();
        let summary = repo.summarize(&id).await.unwrap();
        assert_eq!(summary.total, 1);
        assert_eq!(repo.get_or_create(&id).await.unwrap(), before);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_answers_lose_no_update() {
        let repo = InMemorySessionRepository::new();
        let id = SessionId::from("busy");
        let mut handles = Vec::new();
        for i in 0..24 {
            let repo = repo.clone();
            let id = id.clone();
            handles.push(tokio::spawn(async move {
                repo.record_answer(&id, answer(&format!("q{i}"), true), ResubmissionPolicy::Allow)
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let session = repo.get_or_create(&id).await.unwrap();
        assert_eq!(session.answers().len(), 24);
        assert_eq!(session.streak(), 24);
        assert_eq!(session.level().value(), 9);
    }

    #[tokio::test]
    async fn storage_in_memory_is_usable_through_trait_object() {
        let storage = Storage::in_memory();
        let summary = storage
            .sessions
            .summarize(&SessionId::from("nobody"))
            .await
            .unwrap();
        assert_eq!(summary.total, 0);
        assert!(summary.weak_topics.is_empty());
    }
}
