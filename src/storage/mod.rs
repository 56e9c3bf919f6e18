//! Storage collaborator boundary.
//!
//! The engine never talks to a database directly; everything it persists
//! goes through [`ProgressionStore`]. The trait is deliberately small and
//! keyed by user id so implementations can serialize or version writes per
//! user without any cross-user coordination.

mod flaky;
mod json;
mod memory;

pub use flaky::FlakyStore;
pub use json::JsonFileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::model::{Plant, StreakRecord, Task, UnlockedAchievement, UserId, UserStats};

/// Abstraction over the per-user table store.
///
/// Tasks are addressable by id alone (the row carries its owner, which the
/// engine checks); everything else is scoped by user. `append_unlocked` must
/// be first-write-wins per achievement id — it returns `false` when the
/// entry already existed, which is how the uniqueness invariant survives
/// retried pipelines.
#[async_trait]
pub trait ProgressionStore: Send + Sync {
    /// Fetch a task by id, with its owner.
    async fn task(&self, task_id: Uuid) -> Result<Option<Task>>;

    /// All tasks belonging to a user, in creation order.
    async fn tasks(&self, user: &UserId) -> Result<Vec<Task>>;

    /// Insert or overwrite a task.
    async fn put_task(&self, task: Task) -> Result<()>;

    /// A user's plants in insertion order (the growth order).
    async fn plants(&self, user: &UserId) -> Result<Vec<Plant>>;

    /// Append a new plant to the end of the user's collection.
    async fn append_plant(&self, user: &UserId, plant: Plant) -> Result<()>;

    /// Overwrite an existing plant by id.
    async fn put_plant(&self, user: &UserId, plant: Plant) -> Result<()>;

    /// The user's streak record, if one exists yet.
    async fn streak(&self, user: &UserId) -> Result<Option<StreakRecord>>;

    /// Insert or overwrite the streak record.
    async fn put_streak(&self, user: &UserId, streak: StreakRecord) -> Result<()>;

    /// The user's aggregate stats, if initialized.
    async fn stats(&self, user: &UserId) -> Result<Option<UserStats>>;

    /// Insert or overwrite the stats record.
    async fn put_stats(&self, user: &UserId, stats: UserStats) -> Result<()>;

    /// All achievements the user has unlocked.
    async fn unlocked(&self, user: &UserId) -> Result<Vec<UnlockedAchievement>>;

    /// Record an unlock. Returns `false` (and stores nothing) if the
    /// achievement id was already recorded for this user.
    async fn append_unlocked(&self, user: &UserId, entry: UnlockedAchievement) -> Result<bool>;
}
