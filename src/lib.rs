//! Verdant - Gamified Productivity Progression Engine
//!
//! Turns completed tasks into visible progress: priority-ranked task lists,
//! day-granularity streaks, a growing virtual garden, and a fixed catalog of
//! unlockable achievements, coordinated over a pluggable storage backend.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`model`] - Domain types shared across the crate
//! - [`scoring`] - Task priority scoring, sorting, and smart filters
//! - [`streak`] - Day-granularity streak transitions
//! - [`garden`] - Plant growth rules driven by task difficulty
//! - [`stats`] - Experience, level, and special-counter accounting
//! - [`achievements`] - Achievement catalog and threshold evaluation
//! - [`engine`] - The pipeline coordinator tying everything together
//! - [`storage`] - The [`ProgressionStore`] boundary and bundled backends
//! - [`config`] - Engine tuning knobs and retry backoff
//! - [`error`] - Custom error types and handling
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use verdant::{ProgressionEngine, MemoryStore};
//! use verdant::model::{Difficulty, Task, TaskCategory, TaskPriority, UserId};
//! use verdant::storage::ProgressionStore;
//!
//! let store = Arc::new(MemoryStore::new());
//! let engine = ProgressionEngine::new(store.clone());
//!
//! let user = UserId::from("demo");
//! let task = Task::new(
//!     user.clone(),
//!     "Write the report",
//!     TaskCategory::Work,
//!     Difficulty::Medium,
//!     TaskPriority::High,
//! );
//! store.put_task(task.clone()).await?;
//!
//! let outcome = engine.complete_task(&user, task.id).await?;
//! println!(
//!     "streak {:?}, {} new achievements",
//!     outcome.streak,
//!     outcome.newly_unlocked.len()
//! );
//! ```

pub mod achievements;
pub mod config;
pub mod engine;
pub mod error;
pub mod garden;
pub mod model;
pub mod scoring;
pub mod stats;
pub mod storage;
pub mod streak;

// Re-export commonly used types
pub use error::{Result, VerdantError};

pub use engine::{
    CompletionOutcome, Dashboard, FocusOutcome, ProgressionEngine, SideEffect,
};

pub use storage::{FlakyStore, JsonFileStore, MemoryStore, ProgressionStore};

pub use achievements::{
    AchievementCatalog, AchievementCategory, AchievementDef, AchievementTier, ProgressSnapshot,
    Reward, RewardKind,
};

pub use config::EngineConfig;

pub use model::{
    Difficulty, Plant, StreakRecord, Task, TaskCategory, TaskPriority, UnlockedAchievement,
    UserId, UserStats,
};

pub use garden::{GardenSummary, GrowthOutcome};
pub use scoring::{SortMode, TaskFilter};
pub use streak::StreakTransition;
