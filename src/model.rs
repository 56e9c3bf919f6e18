//! Persisted entities and the closed enumerations behind them.
//!
//! Field names match the snake_case rows of the backing table store, so a
//! serialized `Task` round-trips against the original schema unchanged.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Opaque per-user key. Every store operation and engine call is scoped
/// by one of these; the engine holds no ambient "current user".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Task category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskCategory {
    Work,
    Study,
    Personal,
}

/// Task priority. `Medium` is the fallback wherever a priority is absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl TaskPriority {
    /// Total order used by the plain priority sort (Urgent highest).
    #[must_use]
    pub fn rank(self) -> u8 {
        match self {
            Self::Urgent => 4,
            Self::High => 3,
            Self::Medium => 2,
            Self::Low => 1,
        }
    }
}

/// Task difficulty, stored as 1..=3 in the table rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Numeric form (1, 2 or 3) used for growth amounts and sorting.
    #[must_use]
    pub fn value(self) -> u8 {
        match self {
            Self::Easy => 1,
            Self::Medium => 2,
            Self::Hard => 3,
        }
    }
}

impl TryFrom<u8> for Difficulty {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            1 => Ok(Self::Easy),
            2 => Ok(Self::Medium),
            3 => Ok(Self::Hard),
            other => Err(format!("difficulty must be 1..=3, got {other}")),
        }
    }
}

impl From<Difficulty> for u8 {
    fn from(d: Difficulty) -> u8 {
        d.value()
    }
}

/// A user's task. Immutable once completed except for audit fields; the
/// engine mutates it only on completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub user_id: UserId,
    pub title: String,
    pub category: TaskCategory,
    pub difficulty: Difficulty,
    /// Missing priorities score as `Medium`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Build an open task with a fresh id, created now.
    #[must_use]
    pub fn new(
        user_id: UserId,
        title: impl Into<String>,
        category: TaskCategory,
        difficulty: Difficulty,
        priority: TaskPriority,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            title: title.into(),
            category,
            difficulty,
            priority: Some(priority),
            due_date: None,
            completed: false,
            completed_at: None,
            created_at: Utc::now(),
        }
    }

    /// Builder-style due date.
    #[must_use]
    pub fn with_due_date(mut self, due: NaiveDate) -> Self {
        self.due_date = Some(due);
        self
    }
}

/// Fully grown plants stay at this stage; the next completion plants a new one.
pub const MAX_GROWTH: u8 = 100;

/// Health ceiling.
pub const MAX_HEALTH: u8 = 100;

/// A garden plant. The user's plants form an ordered sequence (insertion
/// order = growth order); the active plant is the last one not yet at
/// [`MAX_GROWTH`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plant {
    pub id: Uuid,
    pub growth_stage: u8,
    pub health_level: u8,
    pub last_updated: DateTime<Utc>,
}

/// Per-user streak singleton. `best_streak >= current_streak` always.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakRecord {
    pub current_streak: u32,
    pub best_streak: u32,
    pub last_activity_date: NaiveDate,
}

/// Per-user aggregate stats singleton. Counters only ever increase; `level`
/// is derived from `experience_points` and is monotonic as a consequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub total_tasks_completed: u32,
    pub total_focus_minutes: u32,
    pub total_focus_sessions: u32,
    pub experience_points: u32,
    pub level: u32,
    /// Opaque progress counters for `special` achievements, keyed by
    /// achievement id. The evaluator reads these without interpreting them.
    #[serde(default)]
    pub special_progress: BTreeMap<String, u32>,
    pub last_updated: DateTime<Utc>,
}

impl UserStats {
    /// Fresh stats for a user's first qualifying event.
    #[must_use]
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            total_tasks_completed: 0,
            total_focus_minutes: 0,
            total_focus_sessions: 0,
            experience_points: 0,
            level: 1,
            special_progress: BTreeMap::new(),
            last_updated: now,
        }
    }
}

/// Record of one unlocked achievement. At most one exists per
/// (user, achievement id) pair; the store enforces first-write-wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockedAchievement {
    pub achievement_id: String,
    pub unlocked_at: DateTime<Utc>,
}
