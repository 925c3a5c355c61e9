use serde::Serialize;

use crate::model::{Answer, Level};

/// Number of topics surfaced in `ProgressSummary::weak_topics`.
pub const WEAK_TOPIC_LIMIT: usize = 3;

/// Per-topic tally, in first-seen order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicProgress {
    pub topic: String,
    pub total: usize,
    pub correct: usize,
    pub accuracy: f64,
}

/// Aggregated view of a session's answer history.
///
/// Serializes as `{level, streak, total, correct, accuracy, topics, weak_topics}`
/// with `weak_topics` as `[[topic, accuracy], ...]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSummary {
    pub level: Level,
    pub streak: u32,
    pub total: usize,
    pub correct: usize,
    /// Percentage rounded to one decimal place; `0.0` when nothing was answered.
    pub accuracy: f64,
    pub topics: Vec<TopicProgress>,
    /// Lowest-accuracy topics, ascending. Ties keep first-seen order.
    pub weak_topics: Vec<(String, f64)>,
}

impl ProgressSummary {
    #[must_use]
    pub fn from_answers(level: Level, streak: u32, answers: &[Answer]) -> Self {
        let total = answers.len();
        let correct = answers.iter().filter(|a| a.correct).count();

        let mut topics: Vec<TopicProgress> = Vec::new();
        for answer in answers {
            let idx = match topics.iter().position(|t| t.topic == answer.topic) {
                Some(idx) => idx,
                None => {
                    topics.push(TopicProgress {
                        topic: answer.topic.clone(),
                        total: 0,
                        correct: 0,
                        accuracy: 0.0,
                    });
                    topics.len() - 1
                }
            };
            let entry = &mut topics[idx];
            entry.total += 1;
            if answer.correct {
                entry.correct += 1;
            }
        }
        for entry in &mut topics {
            entry.accuracy = percentage(entry.correct, entry.total);
        }

        let mut ranked: Vec<(String, f64)> = topics
            .iter()
            .map(|t| (t.topic.clone(), t.accuracy))
            .collect();
        // sort_by is stable, so equal accuracies keep first-seen order
        ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
        ranked.truncate(WEAK_TOPIC_LIMIT);

        Self {
            level,
            streak,
            total,
            correct,
            accuracy: round_one_decimal(percentage(correct, total)),
            topics,
            weak_topics: ranked,
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn percentage(correct: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        correct as f64 / total as f64 * 100.0
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
