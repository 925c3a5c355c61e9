use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::model::{Difficulty, QuestionId};

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

/// Structural problems that make a catalog unusable.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("catalog contains no questions")]
    Empty,

    #[error("duplicate question id: {0}")]
    DuplicateId(QuestionId),

    #[error("question {0} has no choices")]
    NoChoices(QuestionId),

    #[error("question {id} answer_index {index} is out of range for {len} choices")]
    AnswerOutOfRange {
        id: QuestionId,
        index: usize,
        len: usize,
    },
}

//
// ─── QUESTION ─────────────────────────────────────────────────────────────────
//

/// Immutable multiple-choice catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    #[serde(alias = "question")]
    pub prompt: String,
    #[serde(alias = "options")]
    pub choices: Vec<String>,
    pub answer_index: usize,
    pub difficulty: Difficulty,
    pub topic: String,
}

impl Question {
    #[must_use]
    pub fn is_correct(&self, choice: usize) -> bool {
        choice == self.answer_index
    }

    fn validate(&self) -> Result<(), CatalogError> {
        if self.choices.is_empty() {
            return Err(CatalogError::NoChoices(self.id.clone()));
        }
        if self.answer_index >= self.choices.len() {
            return Err(CatalogError::AnswerOutOfRange {
                id: self.id.clone(),
                index: self.answer_index,
                len: self.choices.len(),
            });
        }
        Ok(())
    }
}

//
// ─── CATALOG ──────────────────────────────────────────────────────────────────
//

/// Ordered, validated question bank. Loaded once and never mutated.
#[derive(Debug, Clone)]
pub struct Catalog {
    questions: Vec<Question>,
    by_id: HashMap<QuestionId, usize>,
}

impl Catalog {
    /// Build a catalog, rejecting empty banks, duplicate ids and broken answer keys.
    ///
    /// # Errors
    ///
    /// Returns the first `CatalogError` found, in catalog order.
    pub fn new(questions: Vec<Question>) -> Result<Self, CatalogError> {
        if questions.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut by_id = HashMap::with_capacity(questions.len());
        for (idx, question) in questions.iter().enumerate() {
            question.validate()?;
            if by_id.insert(question.id.clone(), idx).is_some() {
                return Err(CatalogError::DuplicateId(question.id.clone()));
            }
        }

        Ok(Self { questions, by_id })
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Question> {
        self.by_id.get(id).map(|&idx| &self.questions[idx])
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter()
    }
}
