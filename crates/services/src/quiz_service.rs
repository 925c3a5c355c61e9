use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use quiz_core::model::{
    Answer, Catalog, ProgressSummary, Question, RecordOutcome, ResubmissionPolicy, SessionId,
    SessionSnapshot,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use storage::repository::SessionRepository;

use crate::Clock;
use crate::error::QuizError;
use crate::selector::QuestionSelector;

/// The question to show next, with the session state it was chosen for.
///
/// `question` is `None` once the visitor has answered the whole catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NextQuestion {
    pub question: Option<Question>,
    pub session: SessionSnapshot,
}

/// Result of a submission, for immediate feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmitOutcome {
    Recorded {
        correct: bool,
        session: SessionSnapshot,
    },
    /// Rejected by `ResubmissionPolicy::Deny`; nothing was recorded.
    AlreadyAnswered { session: SessionSnapshot },
    /// The question id is not in the catalog; nothing was recorded.
    UnknownQuestion,
}

/// Inbound operations used by the calling layer: next question, submit, progress.
pub struct QuizService {
    clock: Clock,
    selector: QuestionSelector,
    sessions: Arc<dyn SessionRepository>,
    policy: ResubmissionPolicy,
    rng: Mutex<StdRng>,
}

impl QuizService {
    #[must_use]
    pub fn new(clock: Clock, catalog: Arc<Catalog>, sessions: Arc<dyn SessionRepository>) -> Self {
        Self {
            clock,
            selector: QuestionSelector::new(catalog),
            sessions,
            policy: ResubmissionPolicy::default(),
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    #[must_use]
    pub fn with_resubmission_policy(mut self, policy: ResubmissionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the random source with one seeded from `seed`.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        self.selector.catalog()
    }

    #[must_use]
    pub fn resubmission_policy(&self) -> ResubmissionPolicy {
        self.policy
    }

    /// Pick the next question for the session, creating the session if needed.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` if the session store is unavailable.
    pub async fn next_question(&self, session_id: &SessionId) -> Result<NextQuestion, QuizError> {
        let session = self.sessions.get_or_create(session_id).await?;
        let seen = session.seen_question_ids();

        let question = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            self.selector
                .pick(session.level(), &seen, &mut *rng)
                .cloned()
        };
        if question.is_none() {
            tracing::debug!(session = %session_id, "catalog exhausted");
        }

        Ok(NextQuestion {
            question,
            session: session.snapshot(),
        })
    }

    /// Grade `choice` for `question_id` and record it.
    ///
    /// Unknown question ids are discarded without touching the session.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` if the session store is unavailable.
    pub async fn submit_answer(
        &self,
        session_id: &SessionId,
        question_id: &str,
        choice: usize,
    ) -> Result<SubmitOutcome, QuizError> {
        let Some(question) = self.selector.catalog().get(question_id) else {
            tracing::warn!(session = %session_id, question_id, "submission for unknown question discarded");
            return Ok(SubmitOutcome::UnknownQuestion);
        };

        let answer = Answer::grade(question, choice, self.clock.now());
        let correct = answer.correct;

        match self
            .sessions
            .record_answer(session_id, answer, self.policy)
            .await?
        {
            RecordOutcome::Recorded(session) => Ok(SubmitOutcome::Recorded { correct, session }),
            RecordOutcome::DuplicateRejected(session) => {
                tracing::warn!(session = %session_id, question_id, "resubmission rejected");
                Ok(SubmitOutcome::AlreadyAnswered { session })
            }
        }
    }

    /// Progress report for the session.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` if the session store is unavailable.
    pub async fn progress(&self, session_id: &SessionId) -> Result<ProgressSummary, QuizError> {
        Ok(self.sessions.summarize(session_id).await?)
    }
}

impl fmt::Debug for QuizService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizService")
            .field("clock", &self.clock)
            .field("questions", &self.selector.catalog().len())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
