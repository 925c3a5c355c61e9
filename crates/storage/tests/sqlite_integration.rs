use std::sync::Arc;

use quiz_core::model::{Answer, Difficulty, Level, QuestionId, ResubmissionPolicy, SessionId};
use quiz_core::time::{fixed_clock, fixed_now};
use storage::repository::SessionRepository;
use storage::sqlite::SqliteRepository;

fn answer(id: &str, topic: &str, correct: bool) -> Answer {
    Answer {
        question_id: QuestionId::new(id),
        correct,
        difficulty: Difficulty::Easy,
        topic: topic.into(),
        answered_at: fixed_now(),
    }
}

async fn memory_repo(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url)
        .await
        .expect("connect")
        .with_clock(fixed_clock());
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn sqlite_creates_default_session_on_first_access() {
    let repo = memory_repo("memdb_default").await;
    let session = repo
        .get_or_create(&SessionId::from("visitor"))
        .await
        .unwrap();
    assert_eq!(session.level(), Level::MIN);
    assert_eq!(session.streak(), 0);
    assert!(session.answers().is_empty());
    assert_eq!(session.started_at(), fixed_now());
}

#[tokio::test]
async fn sqlite_persists_streak_level_and_history_order() {
    let repo = memory_repo("memdb_history").await;
    let id = SessionId::from("visitor");

    for i in 0..4 {
        repo.record_answer(&id, answer(&format!("q{i}"), "macro", true), ResubmissionPolicy::Allow)
            .await
            .unwrap();
    }
    repo.record_answer(&id, answer("q4", "micro", false), ResubmissionPolicy::Allow)
        .await
        .unwrap();

    // a second pool over the same database sees the committed state
    let reopened = memory_repo("memdb_history").await;
    let session = reopened.get_or_create(&id).await.unwrap();
    assert_eq!(session.streak(), 0);
    assert_eq!(session.level().value(), 1);
    let ids: Vec<&str> = session
        .answers()
        .iter()
        .map(|a| a.question_id.as_str())
        .collect();
    assert_eq!(ids, vec!["q0", "q1", "q2", "q3", "q4"]);
}

#[tokio::test]
async fn sqlite_summarize_matches_history() {
    let repo = memory_repo("memdb_summary").await;
    let id = SessionId::from("visitor");
    repo.record_answer(&id, answer("a", "macro", true), ResubmissionPolicy::Allow)
        .await
        .unwrap();
    repo.record_answer(&id, answer("b", "macro", true), ResubmissionPolicy::Allow)
        .await
        .unwrap();
    repo.record_answer(&id, answer("c", "micro", false), ResubmissionPolicy::Allow)
        .await
        .unwrap();

    let summary = repo.summarize(&id).await.unwrap();
    assert_eq!(summary.total, 3);
    assert_eq!(summary.correct, 2);
    assert!((summary.accuracy - 66.7).abs() < 1e-9);
    assert_eq!(summary.weak_topics[0].0, "micro");
}

#[tokio::test]
async fn sqlite_deny_policy_leaves_state_untouched() {
    let repo = memory_repo("memdb_deny").await;
    let id = SessionId::from("visitor");
    let first = repo
        .record_answer(&id, answer("q1", "macro", true), ResubmissionPolicy::Deny)
        .await
        .unwrap();
    assert!(first.is_recorded());

    let second = repo
        .record_answer(&id, answer("q1", "macro", true), ResubmissionPolicy::Deny)
        .await
        .unwrap();
    assert!(!second.is_recorded());

    let session = repo.get_or_create(&id).await.unwrap();
    assert_eq!(session.answers().len(), 1);
    assert_eq!(session.streak(), 1);
}

#[tokio::test]
async fn sqlite_concurrent_submissions_are_serialized() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("quiz.sqlite3").display());
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    let repo = Arc::new(repo);
    let id = SessionId::from("racer");

    let mut handles = Vec::new();
    for i in 0..12 {
        let repo = Arc::clone(&repo);
        let id = id.clone();
        handles.push(tokio::spawn(async move {
            repo.record_answer(&id, answer(&format!("q{i}"), "macro", true), ResubmissionPolicy::Allow)
                .await
                .unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let session = repo.get_or_create(&id).await.unwrap();
    assert_eq!(session.answers().len(), 12);
    assert_eq!(session.streak(), 12);
    assert_eq!(session.level().value(), 5);
}
