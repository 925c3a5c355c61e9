use chrono::{DateTime, Utc};
use quiz_core::model::{Answer, Level, RecordOutcome, ResubmissionPolicy, Session, SessionId};
use sqlx::SqliteConnection;

use super::{
    SqliteRepository,
    mapping::{level_to_i64, map_answer_row, map_session, streak_to_i64},
};
use crate::repository::{SessionRepository, StorageError};

fn conn_err(e: sqlx::Error) -> StorageError {
    StorageError::Connection(e.to_string())
}

/// Insert a default session row if `id` is new. Returns true when a row was created.
///
/// Being a write, this also takes the database write lock for the enclosing
/// transaction before anything is read.
async fn ensure_session(
    conn: &mut SqliteConnection,
    id: &SessionId,
    now: DateTime<Utc>,
) -> Result<bool, StorageError> {
    let res = sqlx::query(
        r"
            INSERT INTO quiz_sessions (id, level, streak, started_at)
            VALUES (?1, ?2, 0, ?3)
            ON CONFLICT(id) DO NOTHING
        ",
    )
    .bind(id.as_str())
    .bind(level_to_i64(Level::MIN))
    .bind(now)
    .execute(&mut *conn)
    .await
    .map_err(conn_err)?;

    Ok(res.rows_affected() > 0)
}

async fn load_session(conn: &mut SqliteConnection, id: &SessionId) -> Result<Session, StorageError> {
    let row = sqlx::query(
        r"
            SELECT level, streak, started_at
            FROM quiz_sessions
            WHERE id = ?1
        ",
    )
    .bind(id.as_str())
    .fetch_optional(&mut *conn)
    .await
    .map_err(conn_err)?
    .ok_or(StorageError::NotFound)?;

    let answer_rows = sqlx::query(
        r"
            SELECT question_id, correct, difficulty, topic, answered_at
            FROM quiz_answers
            WHERE session_id = ?1
            ORDER BY id ASC
        ",
    )
    .bind(id.as_str())
    .fetch_all(&mut *conn)
    .await
    .map_err(conn_err)?;

    let mut answers = Vec::with_capacity(answer_rows.len());
    for answer_row in &answer_rows {
        answers.push(map_answer_row(answer_row)?);
    }
    map_session(&row, answers)
}

#[async_trait::async_trait]
impl SessionRepository for SqliteRepository {
    async fn get_or_create(&self, id: &SessionId) -> Result<Session, StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn_err)?;

        if ensure_session(&mut *tx, id, self.clock.now()).await? {
            tracing::debug!(session = %id, "creating session");
        }
        let session = load_session(&mut *tx, id).await?;

        tx.commit().await.map_err(conn_err)?;
        Ok(session)
    }

    async fn record_answer(
        &self,
        id: &SessionId,
        answer: Answer,
        policy: ResubmissionPolicy,
    ) -> Result<RecordOutcome, StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn_err)?;

        if ensure_session(&mut *tx, id, self.clock.now()).await? {
            tracing::debug!(session = %id, "creating session");
        }
        let mut session = load_session(&mut *tx, id).await?;

        let outcome = session.record(answer.clone(), policy);
        if let RecordOutcome::Recorded(snapshot) = outcome {
            sqlx::query(
                r"
                    UPDATE quiz_sessions
                    SET level = ?2, streak = ?3
                    WHERE id = ?1
                ",
            )
            .bind(id.as_str())
            .bind(level_to_i64(snapshot.level))
            .bind(streak_to_i64(snapshot.streak))
            .execute(&mut *tx)
            .await
            .map_err(conn_err)?;

            sqlx::query(
                r"
                    INSERT INTO quiz_answers (
                        session_id, question_id, correct, difficulty, topic, answered_at
                    )
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ",
            )
            .bind(id.as_str())
            .bind(answer.question_id.as_str())
            .bind(answer.correct)
            .bind(answer.difficulty.as_str())
            .bind(answer.topic.as_str())
            .bind(answer.answered_at)
            .execute(&mut *tx)
            .await
            .map_err(conn_err)?;
        }

        tx.commit().await.map_err(conn_err)?;
        tracing::debug!(session = %id, ?outcome, "answer recorded");
        Ok(outcome)
    }
}
