//! Failure-injecting store wrapper for tests.
//!
//! Wraps any [`ProgressionStore`] and fails the next N calls of a named
//! operation with a transient storage error. Used to verify the engine's
//! retry behavior and the isolation of gamification side effects from the
//! primary task-completion write.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{Result, VerdantError};
use crate::model::{Plant, StreakRecord, Task, UnlockedAchievement, UserId, UserStats};
use crate::storage::ProgressionStore;

/// Store wrapper that injects transient failures on demand.
pub struct FlakyStore {
    inner: Arc<dyn ProgressionStore>,
    failures: Mutex<HashMap<&'static str, u32>>,
    calls: AtomicU64,
}

impl FlakyStore {
    pub fn new(inner: Arc<dyn ProgressionStore>) -> Self {
        Self {
            inner,
            failures: Mutex::new(HashMap::new()),
            calls: AtomicU64::new(0),
        }
    }

    /// Fail the next `count` invocations of `operation` (trait method name,
    /// e.g. `"put_streak"`).
    pub async fn fail_next(&self, operation: &'static str, count: u32) {
        self.failures.lock().await.insert(operation, count);
    }

    /// Total store calls observed, including failed ones.
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    async fn check(&self, operation: &'static str) -> Result<()> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let mut failures = self.failures.lock().await;
        if let Some(remaining) = failures.get_mut(operation) {
            if *remaining > 0 {
                *remaining -= 1;
                if *remaining == 0 {
                    failures.remove(operation);
                }
                return Err(VerdantError::storage(operation, "injected failure"));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ProgressionStore for FlakyStore {
    async fn task(&self, task_id: Uuid) -> Result<Option<Task>> {
        self.check("task").await?;
        self.inner.task(task_id).await
    }

    async fn tasks(&self, user: &UserId) -> Result<Vec<Task>> {
        self.check("tasks").await?;
        self.inner.tasks(user).await
    }

    async fn put_task(&self, task: Task) -> Result<()> {
        self.check("put_task").await?;
        self.inner.put_task(task).await
    }

    async fn plants(&self, user: &UserId) -> Result<Vec<Plant>> {
        self.check("plants").await?;
        self.inner.plants(user).await
    }

    async fn append_plant(&self, user: &UserId, plant: Plant) -> Result<()> {
        self.check("append_plant").await?;
        self.inner.append_plant(user, plant).await
    }

    async fn put_plant(&self, user: &UserId, plant: Plant) -> Result<()> {
        self.check("put_plant").await?;
        self.inner.put_plant(user, plant).await
    }

    async fn streak(&self, user: &UserId) -> Result<Option<StreakRecord>> {
        self.check("streak").await?;
        self.inner.streak(user).await
    }

    async fn put_streak(&self, user: &UserId, streak: StreakRecord) -> Result<()> {
        self.check("put_streak").await?;
        self.inner.put_streak(user, streak).await
    }

    async fn stats(&self, user: &UserId) -> Result<Option<UserStats>> {
        self.check("stats").await?;
        self.inner.stats(user).await
    }

    async fn put_stats(&self, user: &UserId, stats: UserStats) -> Result<()> {
        self.check("put_stats").await?;
        self.inner.put_stats(user, stats).await
    }

    async fn unlocked(&self, user: &UserId) -> Result<Vec<UnlockedAchievement>> {
        self.check("unlocked").await?;
        self.inner.unlocked(user).await
    }

    async fn append_unlocked(&self, user: &UserId, entry: UnlockedAchievement) -> Result<bool> {
        self.check("append_unlocked").await?;
        self.inner.append_unlocked(user, entry).await
    }
}
