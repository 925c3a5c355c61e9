use chrono::{DateTime, Utc};
use quiz_core::model::{Answer, Difficulty, Level, QuestionId, Session};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn level_to_i64(level: Level) -> i64 {
    i64::from(level.value())
}

pub(crate) fn streak_to_i64(streak: u32) -> i64 {
    i64::from(streak)
}

pub(crate) fn map_answer_row(row: &SqliteRow) -> Result<Answer, StorageError> {
    let difficulty: String = row.try_get("difficulty").map_err(ser)?;
    Ok(Answer {
        question_id: QuestionId::new(row.try_get::<String, _>("question_id").map_err(ser)?),
        correct: row.try_get::<bool, _>("correct").map_err(ser)?,
        difficulty: difficulty.parse::<Difficulty>().map_err(ser)?,
        topic: row.try_get("topic").map_err(ser)?,
        answered_at: row.try_get("answered_at").map_err(ser)?,
    })
}

/// Rebuild a session from its row plus its answers in insertion order.
pub(crate) fn map_session(row: &SqliteRow, answers: Vec<Answer>) -> Result<Session, StorageError> {
    let level = Level::try_from(row.try_get::<i64, _>("level").map_err(ser)?).map_err(ser)?;

    let streak_i64: i64 = row.try_get("streak").map_err(ser)?;
    let streak = u32::try_from(streak_i64)
        .map_err(|_| StorageError::Serialization(format!("invalid streak: {streak_i64}")))?;

    let started_at: DateTime<Utc> = row.try_get("started_at").map_err(ser)?;

    Session::from_persisted(level, streak, started_at, answers).map_err(ser)
}
