//! In-process store. The default backend for tests and embedding.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{Result, VerdantError};
use crate::model::{Plant, StreakRecord, Task, UnlockedAchievement, UserId, UserStats};
use crate::storage::ProgressionStore;

#[derive(Debug, Default)]
struct UserState {
    plants: Vec<Plant>,
    streak: Option<StreakRecord>,
    stats: Option<UserStats>,
    unlocked: Vec<UnlockedAchievement>,
}

#[derive(Debug, Default)]
struct Inner {
    /// Tasks keyed globally by id; each row carries its owner.
    tasks: HashMap<Uuid, Task>,
    /// Preserves task insertion order per user.
    task_order: Vec<Uuid>,
    users: HashMap<UserId, UserState>,
}

/// In-memory [`ProgressionStore`] behind an async read-write lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProgressionStore for MemoryStore {
    async fn task(&self, task_id: Uuid) -> Result<Option<Task>> {
        Ok(self.inner.read().await.tasks.get(&task_id).cloned())
    }

    async fn tasks(&self, user: &UserId) -> Result<Vec<Task>> {
        let inner = self.inner.read().await;
        Ok(inner
            .task_order
            .iter()
            .filter_map(|id| inner.tasks.get(id))
            .filter(|t| &t.user_id == user)
            .cloned()
            .collect())
    }

    async fn put_task(&self, task: Task) -> Result<()> {
        let mut inner = self.inner.write().await;
        if !inner.tasks.contains_key(&task.id) {
            inner.task_order.push(task.id);
        }
        inner.tasks.insert(task.id, task);
        Ok(())
    }

    async fn plants(&self, user: &UserId) -> Result<Vec<Plant>> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .get(user)
            .map(|s| s.plants.clone())
            .unwrap_or_default())
    }

    async fn append_plant(&self, user: &UserId, plant: Plant) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner
            .users
            .entry(user.clone())
            .or_default()
            .plants
            .push(plant);
        Ok(())
    }

    async fn put_plant(&self, user: &UserId, plant: Plant) -> Result<()> {
        let mut inner = self.inner.write().await;
        let state = inner.users.entry(user.clone()).or_default();
        match state.plants.iter_mut().find(|p| p.id == plant.id) {
            Some(existing) => {
                *existing = plant;
                Ok(())
            }
            None => Err(VerdantError::storage(
                "put_plant",
                format!("plant {} not found for user {user}", plant.id),
            )),
        }
    }

    async fn streak(&self, user: &UserId) -> Result<Option<StreakRecord>> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(user).and_then(|s| s.streak.clone()))
    }

    async fn put_streak(&self, user: &UserId, streak: StreakRecord) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.users.entry(user.clone()).or_default().streak = Some(streak);
        Ok(())
    }

    async fn stats(&self, user: &UserId) -> Result<Option<UserStats>> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(user).and_then(|s| s.stats.clone()))
    }

    async fn put_stats(&self, user: &UserId, stats: UserStats) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.users.entry(user.clone()).or_default().stats = Some(stats);
        Ok(())
    }

    async fn unlocked(&self, user: &UserId) -> Result<Vec<UnlockedAchievement>> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .get(user)
            .map(|s| s.unlocked.clone())
            .unwrap_or_default())
    }

    async fn append_unlocked(&self, user: &UserId, entry: UnlockedAchievement) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let state = inner.users.entry(user.clone()).or_default();
        if state
            .unlocked
            .iter()
            .any(|u| u.achievement_id == entry.achievement_id)
        {
            return Ok(false);
        }
        state.unlocked.push(entry);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Difficulty, TaskCategory, TaskPriority};
    use chrono::Utc;

    fn sample_task(user: &UserId) -> Task {
        Task::new(
            user.clone(),
            "t",
            TaskCategory::Personal,
            Difficulty::Easy,
            TaskPriority::Medium,
        )
    }

    #[tokio::test]
    async fn tasks_are_scoped_by_user() {
        let store = MemoryStore::new();
        let alice = UserId::from("alice");
        let bob = UserId::from("bob");

        let task = sample_task(&alice);
        store.put_task(task.clone()).await.unwrap();
        store.put_task(sample_task(&bob)).await.unwrap();

        assert_eq!(store.tasks(&alice).await.unwrap().len(), 1);
        assert_eq!(store.task(task.id).await.unwrap().unwrap().user_id, alice);
    }

    #[tokio::test]
    async fn tasks_keep_insertion_order() {
        let store = MemoryStore::new();
        let user = UserId::from("u1");
        let t1 = sample_task(&user);
        let t2 = sample_task(&user);
        store.put_task(t1.clone()).await.unwrap();
        store.put_task(t2.clone()).await.unwrap();

        let tasks = store.tasks(&user).await.unwrap();
        assert_eq!(tasks[0].id, t1.id);
        assert_eq!(tasks[1].id, t2.id);
    }

    #[tokio::test]
    async fn put_plant_requires_existing_plant() {
        let store = MemoryStore::new();
        let user = UserId::from("u1");
        let plant = Plant {
            id: Uuid::new_v4(),
            growth_stage: 20,
            health_level: 100,
            last_updated: Utc::now(),
        };
        assert!(store.put_plant(&user, plant.clone()).await.is_err());

        store.append_plant(&user, plant.clone()).await.unwrap();
        let mut grown = plant;
        grown.growth_stage = 40;
        store.put_plant(&user, grown.clone()).await.unwrap();
        assert_eq!(store.plants(&user).await.unwrap()[0].growth_stage, 40);
    }

    #[tokio::test]
    async fn append_unlocked_is_first_write_wins() {
        let store = MemoryStore::new();
        let user = UserId::from("u1");
        let entry = UnlockedAchievement {
            achievement_id: "first_steps".into(),
            unlocked_at: Utc::now(),
        };
        assert!(store.append_unlocked(&user, entry.clone()).await.unwrap());
        assert!(!store.append_unlocked(&user, entry).await.unwrap());
        assert_eq!(store.unlocked(&user).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn singletons_start_absent() {
        let store = MemoryStore::new();
        let user = UserId::from("u1");
        assert!(store.streak(&user).await.unwrap().is_none());
        assert!(store.stats(&user).await.unwrap().is_none());
        assert!(store.plants(&user).await.unwrap().is_empty());
    }
}
