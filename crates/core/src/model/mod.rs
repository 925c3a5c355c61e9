mod difficulty;
mod ids;
mod progress;
mod question;
mod session;

pub use difficulty::{Difficulty, Level, LevelOutOfRange, ParseDifficultyError};
pub use ids::{QuestionId, SessionId};
pub use progress::{ProgressSummary, TopicProgress, WEAK_TOPIC_LIMIT};
pub use question::{Catalog, CatalogError, Question};
pub use session::{
    Answer, RecordOutcome, ResubmissionPolicy, Session, SessionError, SessionSnapshot,
};
