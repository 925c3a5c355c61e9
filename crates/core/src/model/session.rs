use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::model::{Difficulty, Level, LevelOutOfRange, ProgressSummary, Question, QuestionId};

/// Consecutive correct answers needed for each level increase.
pub const STREAK_PER_LEVEL: u32 = 3;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error(transparent)]
    Level(#[from] LevelOutOfRange),

    #[error("streak {streak} exceeds the {answers} recorded answers")]
    StreakExceedsHistory { streak: u32, answers: usize },
}

//
// ─── ANSWER ───────────────────────────────────────────────────────────────────
//

/// A single graded submission. Immutable once appended to a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub question_id: QuestionId,
    pub correct: bool,
    pub difficulty: Difficulty,
    pub topic: String,
    pub answered_at: DateTime<Utc>,
}

impl Answer {
    /// Grade `choice` against `question` and stamp the result with `answered_at`.
    #[must_use]
    pub fn grade(question: &Question, choice: usize, answered_at: DateTime<Utc>) -> Self {
        Self {
            question_id: question.id.clone(),
            correct: question.is_correct(choice),
            difficulty: question.difficulty,
            topic: question.topic.clone(),
            answered_at,
        }
    }
}

//
// ─── POLICY / OUTCOME ─────────────────────────────────────────────────────────
//

/// Whether a question id that is already in the history may be recorded again.
///
/// `Allow` treats every submission as a new event, so replaying a question
/// still moves streak and level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResubmissionPolicy {
    #[default]
    Allow,
    Deny,
}

/// Level, streak and history length at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub level: Level,
    pub streak: u32,
    pub answered: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Recorded(SessionSnapshot),
    /// The policy refused a repeated question id; nothing changed.
    DuplicateRejected(SessionSnapshot),
}

impl RecordOutcome {
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        match self {
            RecordOutcome::Recorded(s) | RecordOutcome::DuplicateRejected(s) => *s,
        }
    }

    #[must_use]
    pub fn is_recorded(&self) -> bool {
        matches!(self, RecordOutcome::Recorded(_))
    }
}

//
// ─── SESSION ──────────────────────────────────────────────────────────────────
//

/// Per-visitor adaptive state.
///
/// The answer history is append-only and kept in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    level: Level,
    streak: u32,
    answers: Vec<Answer>,
    started_at: DateTime<Utc>,
}

impl Session {
    #[must_use]
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            level: Level::MIN,
            streak: 0,
            answers: Vec::new(),
            started_at,
        }
    }

    /// Rehydrate a session from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::StreakExceedsHistory` if the streak could not have
    /// been produced by the stored answers.
    pub fn from_persisted(
        level: Level,
        streak: u32,
        started_at: DateTime<Utc>,
        answers: Vec<Answer>,
    ) -> Result<Self, SessionError> {
        if usize::try_from(streak).map_or(true, |s| s > answers.len()) {
            return Err(SessionError::StreakExceedsHistory {
                streak,
                answers: answers.len(),
            });
        }

        Ok(Self {
            level,
            streak,
            answers,
            started_at,
        })
    }

    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }

    #[must_use]
    pub fn streak(&self) -> u32 {
        self.streak
    }

    #[must_use]
    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            level: self.level,
            streak: self.streak,
            answered: self.answers.len(),
        }
    }

    #[must_use]
    pub fn has_answered(&self, question_id: &QuestionId) -> bool {
        self.answers.iter().any(|a| &a.question_id == question_id)
    }

    /// Ids of every question already answered in this session.
    #[must_use]
    pub fn seen_question_ids(&self) -> HashSet<QuestionId> {
        self.answers.iter().map(|a| a.question_id.clone()).collect()
    }

    /// Append `answer` and apply the streak/level rule.
    ///
    /// A correct answer extends the streak; every third consecutive one raises
    /// the level (capped at 10). An incorrect answer clears the streak and
    /// lowers the level (floored at 1).
    pub fn record(&mut self, answer: Answer, policy: ResubmissionPolicy) -> RecordOutcome {
        if policy == ResubmissionPolicy::Deny && self.has_answered(&answer.question_id) {
            return RecordOutcome::DuplicateRejected(self.snapshot());
        }

        let correct = answer.correct;
        self.answers.push(answer);

        if correct {
            self.streak = self.streak.saturating_add(1);
            if self.streak % STREAK_PER_LEVEL == 0 {
                self.level = self.level.raised();
            }
        } else {
            self.streak = 0;
            self.level = self.level.lowered();
        }

        RecordOutcome::Recorded(self.snapshot())
    }

    /// Progress report over the full history. Does not mutate the session.
    #[must_use]
    pub fn summary(&self) -> ProgressSummary {
        ProgressSummary::from_answers(self.level, self.streak, &self.answers)
    }
}

//
// ─── TESTS ────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn answer(id: &str, correct: bool) -> Answer {
        Answer {
            question_id: QuestionId::new(id),
            correct,
            difficulty: Difficulty::Easy,
            topic: "macro".into(),
            answered_at: fixed_now(),
        }
    }

    fn record_run(session: &mut Session, correct: bool, n: usize) {
        for i in 0..n {
            session.record(answer(&format!("q{i}"), correct), ResubmissionPolicy::Allow);
        }
    }

    #[test]
    fn new_session_has_defaults() {
        let session = Session::new(fixed_now());
        assert_eq!(session.level(), Level::MIN);
        assert_eq!(session.streak(), 0);
        assert!(session.answers().is_empty());
        assert_eq!(session.started_at(), fixed_now());
    }

    #[test]
    fn consecutive_correct_answers_raise_level_every_third() {
        for k in 0..40_u32 {
            let mut session = Session::new(fixed_now());
            record_run(&mut session, true, k as usize);
            assert_eq!(session.streak(), k);
            let expected = (1 + k / STREAK_PER_LEVEL).min(10);
            assert_eq!(u32::from(session.level().value()), expected, "k = {k}");
        }
    }

    #[test]
    fn incorrect_answer_resets_streak_and_drops_level() {
        let mut session = Session::new(fixed_now());
        record_run(&mut session, true, 8);
        assert_eq!(session.level().value(), 3);
        assert_eq!(session.streak(), 8);

        session.record(answer("miss", false), ResubmissionPolicy::Allow);
        assert_eq!(session.streak(), 0);
        assert_eq!(session.level().value(), 2);
    }

    #[test]
    fn level_never_drops_below_one() {
        let mut session = Session::new(fixed_now());
        record_run(&mut session, false, 50);
        assert_eq!(session.level(), Level::MIN);
        assert_eq!(session.streak(), 0);
        assert_eq!(session.answers().len(), 50);
    }

    #[test]
    fn level_never_exceeds_ten() {
        let mut session = Session::new(fixed_now());
        record_run(&mut session, true, 100);
        assert_eq!(session.level(), Level::MAX);
        assert_eq!(session.streak(), 100);
    }

    #[test]
    fn streak_restarts_counting_after_a_miss() {
        let mut session = Session::new(fixed_now());
        record_run(&mut session, true, 2);
        session.record(answer("miss", false), ResubmissionPolicy::Allow);
        record_run(&mut session, true, 2);
        assert_eq!(session.level().value(), 1);
        session.record(answer("third", true), ResubmissionPolicy::Allow);
        assert_eq!(session.level().value(), 2);
        assert_eq!(session.streak(), 3);
    }

    #[test]
    fn allow_policy_records_resubmissions() {
        let mut session = Session::new(fixed_now());
        for _ in 0..3 {
            let outcome = session.record(answer("same", true), ResubmissionPolicy::Allow);
            assert!(outcome.is_recorded());
        }
        assert_eq!(session.answers().len(), 3);
        assert_eq!(session.level().value(), 2);
    }

    #[test]
    fn deny_policy_rejects_resubmissions_without_change() {
        let mut session = Session::new(fixed_now());
        session.record(answer("same", true), ResubmissionPolicy::Deny);
        let before = session.snapshot();

        let outcome = session.record(answer("same", true), ResubmissionPolicy::Deny);
        assert_eq!(outcome, RecordOutcome::DuplicateRejected(before));
        assert_eq!(session.snapshot(), before);
    }

    #[test]
    fn seen_ids_cover_history() {
        let mut session = Session::new(fixed_now());
        record_run(&mut session, true, 3);
        let seen = session.seen_question_ids();
        assert_eq!(seen.len(), 3);
        assert!(seen.contains("q0") && seen.contains("q2"));
    }

    #[test]
    fn from_persisted_rejects_impossible_streak() {
        let err = Session::from_persisted(Level::MIN, 2, fixed_now(), vec![answer("q", true)])
            .unwrap_err();
        assert_eq!(
            err,
            SessionError::StreakExceedsHistory {
                streak: 2,
                answers: 1
            }
        );
    }

    #[test]
    fn from_persisted_keeps_history_order() {
        let answers = vec![answer("q1", true), answer("q2", false), answer("q3", true)];
        let session =
            Session::from_persisted(Level::MIN, 1, fixed_now(), answers.clone()).unwrap();
        assert_eq!(session.answers(), answers.as_slice());
        assert_eq!(session.streak(), 1);
    }
}
