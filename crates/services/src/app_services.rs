use std::sync::Arc;

use quiz_core::model::{Catalog, ResubmissionPolicy};
use storage::repository::Storage;

use crate::Clock;
use crate::error::AppServicesError;
use crate::quiz_service::QuizService;

/// Settings the calling layer chooses at startup.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuizSettings {
    pub resubmission: ResubmissionPolicy,
    /// Fixed seed for question selection; `None` draws from the OS.
    pub seed: Option<u64>,
}

/// Assembles the quiz service over a chosen session store.
#[derive(Debug, Clone)]
pub struct AppServices {
    quiz: Arc<QuizService>,
}

impl AppServices {
    /// Build services over the process-lifetime in-memory session store.
    #[must_use]
    pub fn in_memory(catalog: Arc<Catalog>, clock: Clock, settings: QuizSettings) -> Self {
        Self::with_storage(catalog, clock, &Storage::in_memory_with_clock(clock), settings)
    }

    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        catalog: Arc<Catalog>,
        clock: Clock,
        settings: QuizSettings,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url, clock).await?;
        Ok(Self::with_storage(catalog, clock, &storage, settings))
    }

    #[must_use]
    pub fn with_storage(
        catalog: Arc<Catalog>,
        clock: Clock,
        storage: &Storage,
        settings: QuizSettings,
    ) -> Self {
        let mut quiz = QuizService::new(clock, catalog, Arc::clone(&storage.sessions))
            .with_resubmission_policy(settings.resubmission);
        if let Some(seed) = settings.seed {
            quiz = quiz.with_seed(seed);
        }
        Self {
            quiz: Arc::new(quiz),
        }
    }

    #[must_use]
    pub fn quiz(&self) -> Arc<QuizService> {
        Arc::clone(&self.quiz)
    }
}
