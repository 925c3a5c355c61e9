use std::path::PathBuf;

use clap::{Parser, Subcommand};
use quiz_core::model::ResubmissionPolicy;
use services::QuizSettings;

/// Adaptive-difficulty multiple-choice quiz.
#[derive(Debug, Parser)]
#[command(name = "quiz", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Question catalog (JSON array)
    #[arg(long, env = "QUIZ_CATALOG", default_value = "data/questions.json", global = true)]
    pub catalog: PathBuf,

    /// SQLite URL or path for durable sessions; in-memory when omitted
    #[arg(long = "db", env = "QUIZ_DB_URL", global = true)]
    pub db_url: Option<String>,

    /// Session id to resume; a new one is issued when omitted
    #[arg(long = "session", env = "QUIZ_SESSION_ID", global = true)]
    pub session_id: Option<String>,

    /// Refuse answers to questions the session has already answered
    #[arg(long, env = "QUIZ_DENY_RESUBMISSION", global = true)]
    pub deny_resubmission: bool,

    /// Seed for deterministic question selection
    #[arg(long, env = "QUIZ_SEED", global = true)]
    pub seed: Option<u64>,

    /// Debug logging (overridden by QUIZ_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Answer questions interactively (default)
    Play,
    /// Print the session's progress summary as JSON
    Progress,
}

impl Cli {
    #[must_use]
    pub fn selected_command(&self) -> Command {
        self.command.unwrap_or(Command::Play)
    }

    #[must_use]
    pub fn settings(&self) -> QuizSettings {
        QuizSettings {
            resubmission: if self.deny_resubmission {
                ResubmissionPolicy::Deny
            } else {
                ResubmissionPolicy::Allow
            },
            seed: self.seed,
        }
    }
}
