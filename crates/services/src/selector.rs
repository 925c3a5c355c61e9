use std::collections::HashSet;
use std::sync::Arc;

use quiz_core::model::{Catalog, Level, Question, QuestionId};
use rand::Rng;
use rand::seq::IndexedRandom;

/// Picks the next question for a level while avoiding repeats.
///
/// Questions at the level's target tier are preferred. Once that tier is
/// exhausted for a session, any unseen question is eligible, so a visitor is
/// never blocked while content remains.
#[derive(Debug, Clone)]
pub struct QuestionSelector {
    catalog: Arc<Catalog>,
}

impl QuestionSelector {
    #[must_use]
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Eligible questions for `level`, in catalog order.
    ///
    /// Empty only when every catalog question is in `seen`.
    #[must_use]
    pub fn candidates(&self, level: Level, seen: &HashSet<QuestionId>) -> Vec<&Question> {
        let target = level.target_difficulty();

        let unseen: Vec<&Question> = self
            .catalog
            .iter()
            .filter(|q| !seen.contains(&q.id))
            .collect();

        let preferred: Vec<&Question> = unseen
            .iter()
            .copied()
            .filter(|q| q.difficulty == target)
            .collect();
        if !preferred.is_empty() {
            return preferred;
        }

        if !unseen.is_empty() {
            tracing::debug!(%level, %target, remaining = unseen.len(), "target tier exhausted; widening");
        }
        unseen
    }

    /// Choose uniformly among [`Self::candidates`]. `None` means the catalog is exhausted.
    pub fn pick<R: Rng + ?Sized>(
        &self,
        level: Level,
        seen: &HashSet<QuestionId>,
        rng: &mut R,
    ) -> Option<&Question> {
        self.candidates(level, seen).choose(rng).copied()
    }
}
