#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod quiz_service;
pub mod selector;

pub use quiz_core::Clock;

pub use app_services::{AppServices, QuizSettings};
pub use error::{AppServicesError, QuizError};
pub use quiz_service::{NextQuestion, QuizService, SubmitOutcome};
pub use selector::QuestionSelector;
