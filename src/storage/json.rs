//! Single-file JSON store.
//!
//! Persists the whole progression state as one JSON document, written
//! atomically (temp file + rename) after every mutation. This is the local
//! fallback backend for environments without a remote table store; it is
//! not built for large datasets.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{Result, VerdantError};
use crate::model::{Plant, StreakRecord, Task, UnlockedAchievement, UserId, UserStats};
use crate::storage::ProgressionStore;

#[derive(Debug, Default, Serialize, Deserialize)]
struct UserSnapshot {
    #[serde(default)]
    plants: Vec<Plant>,
    #[serde(default)]
    streak: Option<StreakRecord>,
    #[serde(default)]
    stats: Option<UserStats>,
    #[serde(default)]
    unlocked: Vec<UnlockedAchievement>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    tasks: Vec<Task>,
    #[serde(default)]
    users: BTreeMap<String, UserSnapshot>,
}

/// File-backed [`ProgressionStore`] holding the full state in one JSON
/// document.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    state: Mutex<Snapshot>,
}

impl JsonFileStore {
    /// Open (or create) a store at `path`. A missing file starts empty; an
    /// unreadable or undecodable file is an error rather than silent data
    /// loss.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let state = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            serde_json::from_str(&raw)
                .map_err(|e| VerdantError::corrupt(format!("{}: {e}", path.display())))?
        } else {
            Snapshot::default()
        };
        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    /// Serialize the snapshot and swap it into place atomically.
    fn flush(path: &Path, state: &Snapshot) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(state)?)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    fn user_mut<'a>(state: &'a mut Snapshot, user: &UserId) -> &'a mut UserSnapshot {
        state.users.entry(user.as_str().to_string()).or_default()
    }
}

#[async_trait]
impl ProgressionStore for JsonFileStore {
    async fn task(&self, task_id: Uuid) -> Result<Option<Task>> {
        let state = self.state.lock().await;
        Ok(state.tasks.iter().find(|t| t.id == task_id).cloned())
    }

    async fn tasks(&self, user: &UserId) -> Result<Vec<Task>> {
        let state = self.state.lock().await;
        Ok(state
            .tasks
            .iter()
            .filter(|t| &t.user_id == user)
            .cloned()
            .collect())
    }

    async fn put_task(&self, task: Task) -> Result<()> {
        let mut state = self.state.lock().await;
        match state.tasks.iter_mut().find(|t| t.id == task.id) {
            Some(existing) => *existing = task,
            None => state.tasks.push(task),
        }
        Self::flush(&self.path, &state)
    }

    async fn plants(&self, user: &UserId) -> Result<Vec<Plant>> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .get(user.as_str())
            .map(|u| u.plants.clone())
            .unwrap_or_default())
    }

    async fn append_plant(&self, user: &UserId, plant: Plant) -> Result<()> {
        let mut state = self.state.lock().await;
        Self::user_mut(&mut state, user).plants.push(plant);
        Self::flush(&self.path, &state)
    }

    async fn put_plant(&self, user: &UserId, plant: Plant) -> Result<()> {
        let mut state = self.state.lock().await;
        let plants = &mut Self::user_mut(&mut state, user).plants;
        match plants.iter_mut().find(|p| p.id == plant.id) {
            Some(existing) => *existing = plant,
            None => {
                return Err(VerdantError::storage(
                    "put_plant",
                    format!("plant {} not found for user {user}", plant.id),
                ))
            }
        }
        Self::flush(&self.path, &state)
    }

    async fn streak(&self, user: &UserId) -> Result<Option<StreakRecord>> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .get(user.as_str())
            .and_then(|u| u.streak.clone()))
    }

    async fn put_streak(&self, user: &UserId, streak: StreakRecord) -> Result<()> {
        let mut state = self.state.lock().await;
        Self::user_mut(&mut state, user).streak = Some(streak);
        Self::flush(&self.path, &state)
    }

    async fn stats(&self, user: &UserId) -> Result<Option<UserStats>> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .get(user.as_str())
            .and_then(|u| u.stats.clone()))
    }

    async fn put_stats(&self, user: &UserId, stats: UserStats) -> Result<()> {
        let mut state = self.state.lock().await;
        Self::user_mut(&mut state, user).stats = Some(stats);
        Self::flush(&self.path, &state)
    }

    async fn unlocked(&self, user: &UserId) -> Result<Vec<UnlockedAchievement>> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .get(user.as_str())
            .map(|u| u.unlocked.clone())
            .unwrap_or_default())
    }

    async fn append_unlocked(&self, user: &UserId, entry: UnlockedAchievement) -> Result<bool> {
        let mut state = self.state.lock().await;
        let unlocked = &mut Self::user_mut(&mut state, user).unlocked;
        if unlocked
            .iter()
            .any(|u| u.achievement_id == entry.achievement_id)
        {
            return Ok(false);
        }
        unlocked.push(entry);
        Self::flush(&self.path, &state)?;
        Ok(true)
    }
}
