use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

//
// ─── DIFFICULTY ───────────────────────────────────────────────────────────────
//

/// Difficulty tier shared by catalog questions and the level-derived target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown difficulty: {0}")]
pub struct ParseDifficultyError(pub String);

impl Difficulty {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl FromStr for Difficulty {
    type Err = ParseDifficultyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            other => Err(ParseDifficultyError(other.to_owned())),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── LEVEL ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("level {0} is outside {min}..={max}", min = Level::MIN.0, max = Level::MAX.0)]
pub struct LevelOutOfRange(pub i64);

/// Adaptive difficulty level, always within `1..=10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Level(u8);

impl Level {
    pub const MIN: Level = Level(1);
    pub const MAX: Level = Level(10);

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    /// One step up, saturating at `Level::MAX`.
    #[must_use]
    pub fn raised(self) -> Self {
        Self(self.0.saturating_add(1).min(Self::MAX.0))
    }

    /// One step down, saturating at `Level::MIN`.
    #[must_use]
    pub fn lowered(self) -> Self {
        Self(self.0.saturating_sub(1).max(Self::MIN.0))
    }

    /// Tier the selector should prefer at this level.
    ///
    /// - 1..=3: easy
    /// - 4..=6: medium
    /// - 7..=10: hard
    #[must_use]
    pub fn target_difficulty(self) -> Difficulty {
        match self.0 {
            0..=3 => Difficulty::Easy,
            4..=6 => Difficulty::Medium,
            _ => Difficulty::Hard,
        }
    }
}

impl Default for Level {
    fn default() -> Self {
        Self::MIN
    }
}

impl TryFrom<i64> for Level {
    type Error = LevelOutOfRange;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .ok()
            .filter(|v| (Self::MIN.0..=Self::MAX.0).contains(v))
            .map(Self)
            .ok_or(LevelOutOfRange(value))
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> Self {
        level.0
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(v: i64) -> Level {
        Level::try_from(v).unwrap()
    }

    #[test]
    fn levels_map_to_tiers() {
        for v in 1..=3 {
            assert_eq!(level(v).target_difficulty(), Difficulty::Easy);
        }
        for v in 4..=6 {
            assert_eq!(level(v).target_difficulty(), Difficulty::Medium);
        }
        for v in 7..=10 {
            assert_eq!(level(v).target_difficulty(), Difficulty::Hard);
        }
    }

    #[test]
    fn level_saturates_at_bounds() {
        assert_eq!(Level::MAX.raised(), Level::MAX);
        assert_eq!(Level::MIN.lowered(), Level::MIN);
        assert_eq!(level(5).raised(), level(6));
        assert_eq!(level(5).lowered(), level(4));
    }

    #[test]
    fn level_rejects_out_of_range() {
        assert_eq!(Level::try_from(0), Err(LevelOutOfRange(0)));
        assert_eq!(Level::try_from(11), Err(LevelOutOfRange(11)));
        assert!(Level::try_from(-3).is_err());
    }

    #[test]
    fn difficulty_parses_lowercase_names() {
        assert_eq!("medium".parse::<Difficulty>(), Ok(Difficulty::Medium));
        assert!("Expert".parse::<Difficulty>().is_err());
        assert_eq!(Difficulty::Hard.to_string(), "hard");
    }

    #[test]
    fn level_deserialization_is_validated() {
        let ok: Level = serde_json::from_str("7").unwrap();
        assert_eq!(ok.value(), 7);
        assert!(serde_json::from_str::<Level>("12").is_err());
    }
}
