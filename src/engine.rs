//! The progression engine.
//!
//! One `complete_task` call runs the whole pipeline for a user: validate,
//! commit the completion, then streak -> garden -> stats -> achievements, in
//! that order because streak and garden outcomes feed achievement progress.
//!
//! Committing the task is the primary effect and is never rolled back; each
//! gamification step after it is attempted independently, and a failing step
//! is logged and reported in the outcome rather than aborting the rest.
//! Pipelines for the same user are serialized behind a per-user mutex;
//! different users proceed in parallel.

use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{sleep, timeout};
use tracing::{info, warn};
use uuid::Uuid;

use crate::achievements::{self, AchievementCatalog, AchievementDef, ProgressSnapshot};
use crate::config::{calculate_backoff, EngineConfig};
use crate::error::{Result, VerdantError};
use crate::garden::{self, GardenSummary, GrowthOutcome};
use crate::model::{
    Difficulty, Plant, StreakRecord, Task, UnlockedAchievement, UserId, UserStats,
};
use crate::scoring::{self, SortMode};
use crate::stats as stats_rules;
use crate::storage::ProgressionStore;
use crate::streak::{self, StreakTransition};

/// Gamification steps that can fail in isolation after the task commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideEffect {
    Streak,
    Garden,
    Stats,
    Achievements,
}

impl fmt::Display for SideEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Streak => "streak",
            Self::Garden => "garden",
            Self::Stats => "stats",
            Self::Achievements => "achievements",
        };
        f.write_str(name)
    }
}

/// Everything one completion changed.
///
/// Fields for isolated side effects are `None` when the corresponding step
/// failed; `failed_effects` says which ones did. The task itself is always
/// present — if it could not be committed the whole call errors instead.
#[derive(Debug, Clone)]
pub struct CompletionOutcome {
    pub task: Task,
    pub streak: Option<StreakRecord>,
    pub plant: Option<Plant>,
    pub stats: Option<UserStats>,
    pub newly_unlocked: Vec<AchievementDef>,
    pub failed_effects: Vec<SideEffect>,
}

/// Result of a completed focus session.
#[derive(Debug, Clone)]
pub struct FocusOutcome {
    pub stats: UserStats,
    pub newly_unlocked: Vec<AchievementDef>,
}

/// Aggregate snapshot for display.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub tasks: Vec<Task>,
    pub plants: Vec<Plant>,
    pub streak: Option<StreakRecord>,
    pub stats: UserStats,
    pub unlocked: Vec<UnlockedAchievement>,
    pub garden: GardenSummary,
}

/// Coordinates the progression pipeline against a [`ProgressionStore`].
pub struct ProgressionEngine {
    store: Arc<dyn ProgressionStore>,
    catalog: AchievementCatalog,
    config: EngineConfig,
    user_locks: Mutex<HashMap<UserId, Arc<Mutex<()>>>>,
}

impl ProgressionEngine {
    /// Engine with the built-in achievement catalog and default config.
    pub fn new(store: Arc<dyn ProgressionStore>) -> Self {
        Self::with_config(store, EngineConfig::default())
    }

    pub fn with_config(store: Arc<dyn ProgressionStore>, config: EngineConfig) -> Self {
        Self {
            store,
            catalog: AchievementCatalog::builtin(),
            config,
            user_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Replace the achievement catalog (loaded once at startup).
    #[must_use]
    pub fn with_catalog(mut self, catalog: AchievementCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    #[must_use]
    pub fn catalog(&self) -> &AchievementCatalog {
        &self.catalog
    }

    // =========================================================================
    // Primary operation
    // =========================================================================

    /// Complete a task and run the full progression pipeline.
    pub async fn complete_task(&self, user: &UserId, task_id: Uuid) -> Result<CompletionOutcome> {
        self.complete_task_at(user, task_id, Utc::now()).await
    }

    /// [`complete_task`](Self::complete_task) with an explicit clock, for
    /// deterministic callers and tests.
    pub async fn complete_task_at(
        &self,
        user: &UserId,
        task_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<CompletionOutcome> {
        let lock = self.user_lock(user).await;
        let _guard = lock.lock().await;

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.run_pipeline(user, task_id, now).await {
                Err(e) if e.is_conflict() && attempt < self.config.conflict_attempts => {
                    warn!(%user, %task_id, attempt, "conflict detected, re-running pipeline");
                    sleep(calculate_backoff(attempt)).await;
                }
                other => return other,
            }
        }
    }

    async fn run_pipeline(
        &self,
        user: &UserId,
        task_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<CompletionOutcome> {
        // Step 1: validate. Nothing is mutated on any of these rejections.
        let store = Arc::clone(&self.store);
        let task = self
            .retrying("task", move || {
                let store = Arc::clone(&store);
                async move { store.task(task_id).await }
            })
            .await?
            .ok_or(VerdantError::TaskNotFound { task_id })?;

        if &task.user_id != user {
            return Err(VerdantError::TaskNotOwned {
                task_id,
                user: user.to_string(),
            });
        }
        if task.completed {
            return Err(VerdantError::AlreadyCompleted { task_id });
        }

        // Step 2: commit the completion. This is the primary effect; a
        // failure here fails the whole call and nothing is considered
        // committed (step 1 makes a caller retry safe).
        let mut task = task;
        task.completed = true;
        task.completed_at = Some(now);
        {
            let store = Arc::clone(&self.store);
            let row = task.clone();
            self.retrying("put_task", move || {
                let store = Arc::clone(&store);
                let task = row.clone();
                async move { store.put_task(task).await }
            })
            .await?;
        }

        let mut failed_effects = Vec::new();

        // Step 3: streak.
        let streak_record = match self.apply_streak(user, now).await {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(%user, %task_id, error = %e, "streak update failed after task commit");
                failed_effects.push(SideEffect::Streak);
                None
            }
        };

        // Step 4: garden.
        let (plant, plants_grown) = match self.apply_garden(user, task.difficulty, now).await {
            Ok((plant, grown)) => (Some(plant), Some(grown)),
            Err(e) => {
                warn!(%user, %task_id, error = %e, "plant growth failed after task commit");
                failed_effects.push(SideEffect::Garden);
                (None, None)
            }
        };

        // Step 5: stats.
        let stats = match self.apply_stats(user, now).await {
            Ok(stats) => Some(stats),
            Err(e) => {
                warn!(%user, %task_id, error = %e, "stats update failed after task commit");
                failed_effects.push(SideEffect::Stats);
                None
            }
        };

        // Step 6: achievements, against whatever the earlier steps managed
        // to persist.
        let newly_unlocked = match self
            .apply_achievements(user, streak_record.as_ref(), plants_grown, stats.as_ref(), now)
            .await
        {
            Ok(defs) => defs,
            Err(e) => {
                warn!(%user, %task_id, error = %e, "achievement evaluation failed after task commit");
                failed_effects.push(SideEffect::Achievements);
                Vec::new()
            }
        };

        info!(
            %user,
            %task_id,
            unlocked = newly_unlocked.len(),
            failed = failed_effects.len(),
            "task completion pipeline finished"
        );

        Ok(CompletionOutcome {
            task,
            streak: streak_record,
            plant,
            stats,
            newly_unlocked,
            failed_effects,
        })
    }

    // =========================================================================
    // Pipeline steps
    // =========================================================================

    async fn apply_streak(&self, user: &UserId, now: DateTime<Utc>) -> Result<StreakRecord> {
        let store = Arc::clone(&self.store);
        let owner = user.clone();
        let existing = self
            .retrying("streak", move || {
                let store = Arc::clone(&store);
                let user = owner.clone();
                async move { store.streak(&user).await }
            })
            .await?;

        let (record, transition) = streak::advance(existing.as_ref(), now.date_naive());
        if transition != StreakTransition::SkewIgnored {
            let store = Arc::clone(&self.store);
            let owner = user.clone();
            let row = record.clone();
            self.retrying("put_streak", move || {
                let store = Arc::clone(&store);
                let user = owner.clone();
                let record = row.clone();
                async move { store.put_streak(&user, record).await }
            })
            .await?;
        }
        Ok(record)
    }

    async fn apply_garden(
        &self,
        user: &UserId,
        difficulty: Difficulty,
        now: DateTime<Utc>,
    ) -> Result<(Plant, u32)> {
        let store = Arc::clone(&self.store);
        let owner = user.clone();
        let mut plants = self
            .retrying("plants", move || {
                let store = Arc::clone(&store);
                let user = owner.clone();
                async move { store.plants(&user).await }
            })
            .await?;

        let outcome = garden::apply_completion(&plants, difficulty, now);
        match &outcome {
            GrowthOutcome::Created(plant) => {
                let store = Arc::clone(&self.store);
                let owner = user.clone();
                let row = plant.clone();
                self.retrying("append_plant", move || {
                    let store = Arc::clone(&store);
                    let user = owner.clone();
                    let plant = row.clone();
                    async move { store.append_plant(&user, plant).await }
                })
                .await?;
                plants.push(plant.clone());
            }
            GrowthOutcome::Grown(plant) => {
                let store = Arc::clone(&self.store);
                let owner = user.clone();
                let row = plant.clone();
                self.retrying("put_plant", move || {
                    let store = Arc::clone(&store);
                    let user = owner.clone();
                    let plant = row.clone();
                    async move { store.put_plant(&user, plant).await }
                })
                .await?;
                if let Some(last) = plants.last_mut() {
                    *last = plant.clone();
                }
            }
        }

        Ok((outcome.plant().clone(), garden::plants_grown(&plants)))
    }

    async fn apply_stats(&self, user: &UserId, now: DateTime<Utc>) -> Result<UserStats> {
        let mut stats = self
            .load_stats(user)
            .await?
            .unwrap_or_else(|| UserStats::empty(now));
        stats_rules::record_completion(&mut stats, now);
        self.put_stats(user, stats.clone()).await?;
        Ok(stats)
    }

    /// Evaluate achievements against the refreshed aggregates. For any step
    /// whose write failed, the previously persisted state is loaded instead,
    /// so unlocks are never granted on state that may not exist.
    async fn apply_achievements(
        &self,
        user: &UserId,
        streak_record: Option<&StreakRecord>,
        plants_grown: Option<u32>,
        stats: Option<&UserStats>,
        now: DateTime<Utc>,
    ) -> Result<Vec<AchievementDef>> {
        let stats_fallback;
        let stats = match stats {
            Some(s) => s,
            None => {
                stats_fallback = self
                    .load_stats(user)
                    .await?
                    .unwrap_or_else(|| UserStats::empty(now));
                &stats_fallback
            }
        };

        let streak_fallback;
        let streak_record = match streak_record {
            Some(s) => Some(s),
            None => {
                let store = Arc::clone(&self.store);
                let owner = user.clone();
                streak_fallback = self
                    .retrying("streak", move || {
                        let store = Arc::clone(&store);
                        let user = owner.clone();
                        async move { store.streak(&user).await }
                    })
                    .await?;
                streak_fallback.as_ref()
            }
        };

        let plants_grown = match plants_grown {
            Some(n) => n,
            None => {
                let store = Arc::clone(&self.store);
                let owner = user.clone();
                let plants = self
                    .retrying("plants", move || {
                        let store = Arc::clone(&store);
                        let user = owner.clone();
                        async move { store.plants(&user).await }
                    })
                    .await?;
                garden::plants_grown(&plants)
            }
        };

        let snapshot = ProgressSnapshot {
            tasks_completed: stats.total_tasks_completed,
            focus_minutes: stats.total_focus_minutes,
            current_streak: streak_record.map_or(0, |s| s.current_streak),
            best_streak: streak_record.map_or(0, |s| s.best_streak),
            plants_grown,
            special: stats.special_progress.clone(),
        };

        let store = Arc::clone(&self.store);
        let owner = user.clone();
        let unlocked = self
            .retrying("unlocked", move || {
                let store = Arc::clone(&store);
                let user = owner.clone();
                async move { store.unlocked(&user).await }
            })
            .await?;
        let unlocked_ids: HashSet<String> =
            unlocked.into_iter().map(|u| u.achievement_id).collect();

        let mut newly = Vec::new();
        for def in achievements::evaluate(&self.catalog, &snapshot, &unlocked_ids) {
            let store = Arc::clone(&self.store);
            let owner = user.clone();
            let entry = UnlockedAchievement {
                achievement_id: def.id.to_string(),
                unlocked_at: now,
            };
            let inserted = self
                .retrying("append_unlocked", move || {
                    let store = Arc::clone(&store);
                    let user = owner.clone();
                    let entry = entry.clone();
                    async move { store.append_unlocked(&user, entry).await }
                })
                .await?;
            // The store enforces first-write-wins, so a concurrent or
            // retried unlock reports false here and is not re-announced.
            if inserted {
                info!(%user, achievement = def.id, "achievement unlocked");
                newly.push(*def);
            }
        }
        Ok(newly)
    }

    // =========================================================================
    // Queries and secondary operations
    // =========================================================================

    /// A user's tasks in the requested order.
    pub async fn ranked_tasks(
        &self,
        user: &UserId,
        mode: SortMode,
        now: DateTime<Utc>,
    ) -> Result<Vec<Task>> {
        let store = Arc::clone(&self.store);
        let owner = user.clone();
        let mut tasks = self
            .retrying("tasks", move || {
                let store = Arc::clone(&store);
                let user = owner.clone();
                async move { store.tasks(&user).await }
            })
            .await?;
        scoring::sort_tasks(&mut tasks, mode, now);
        Ok(tasks)
    }

    /// Record a completed focus session and re-check focus achievements.
    /// Does not touch streaks or plants.
    pub async fn complete_focus_session(
        &self,
        user: &UserId,
        minutes: u32,
    ) -> Result<FocusOutcome> {
        if minutes == 0 {
            return Err(VerdantError::invalid_input(
                "minutes",
                "focus session must be longer than zero minutes",
            ));
        }

        let lock = self.user_lock(user).await;
        let _guard = lock.lock().await;
        let now = Utc::now();

        let mut stats = self
            .load_stats(user)
            .await?
            .unwrap_or_else(|| UserStats::empty(now));
        stats_rules::record_focus_session(&mut stats, minutes, now);
        self.put_stats(user, stats.clone()).await?;

        let newly_unlocked = match self
            .apply_achievements(user, None, None, Some(&stats), now)
            .await
        {
            Ok(defs) => defs,
            Err(e) => {
                warn!(%user, error = %e, "achievement evaluation failed after focus session");
                Vec::new()
            }
        };

        Ok(FocusOutcome {
            stats,
            newly_unlocked,
        })
    }

    /// Load everything the dashboard needs in one concurrent sweep,
    /// lazily initializing stats on first sight of a user.
    pub async fn dashboard(&self, user: &UserId) -> Result<Dashboard> {
        let store = Arc::clone(&self.store);
        let u1 = user.clone();
        let u2 = user.clone();
        let u3 = user.clone();
        let u4 = user.clone();
        let u5 = user.clone();
        let s1 = Arc::clone(&store);
        let s2 = Arc::clone(&store);
        let s3 = Arc::clone(&store);
        let s4 = Arc::clone(&store);
        let s5 = Arc::clone(&store);

        let (tasks, plants, streak_record, stats, unlocked) = tokio::try_join!(
            self.retrying("tasks", move || {
                let store = Arc::clone(&s1);
                let user = u1.clone();
                async move { store.tasks(&user).await }
            }),
            self.retrying("plants", move || {
                let store = Arc::clone(&s2);
                let user = u2.clone();
                async move { store.plants(&user).await }
            }),
            self.retrying("streak", move || {
                let store = Arc::clone(&s3);
                let user = u3.clone();
                async move { store.streak(&user).await }
            }),
            self.retrying("stats", move || {
                let store = Arc::clone(&s4);
                let user = u4.clone();
                async move { store.stats(&user).await }
            }),
            self.retrying("unlocked", move || {
                let store = Arc::clone(&s5);
                let user = u5.clone();
                async move { store.unlocked(&user).await }
            }),
        )?;

        let stats = match stats {
            Some(stats) => stats,
            None => {
                let fresh = UserStats::empty(Utc::now());
                self.put_stats(user, fresh.clone()).await?;
                fresh
            }
        };

        Ok(Dashboard {
            garden: garden::summarize(&plants),
            tasks,
            plants,
            streak: streak_record,
            stats,
            unlocked,
        })
    }

    // =========================================================================
    // Plumbing
    // =========================================================================

    async fn load_stats(&self, user: &UserId) -> Result<Option<UserStats>> {
        let store = Arc::clone(&self.store);
        let owner = user.clone();
        self.retrying("stats", move || {
            let store = Arc::clone(&store);
            let user = owner.clone();
            async move { store.stats(&user).await }
        })
        .await
    }

    async fn put_stats(&self, user: &UserId, stats: UserStats) -> Result<()> {
        let store = Arc::clone(&self.store);
        let owner = user.clone();
        self.retrying("put_stats", move || {
            let store = Arc::clone(&store);
            let user = owner.clone();
            let stats = stats.clone();
            async move { store.put_stats(&user, stats).await }
        })
        .await
    }

    async fn user_lock(&self, user: &UserId) -> Arc<Mutex<()>> {
        let mut locks = self.user_locks.lock().await;
        Arc::clone(
            locks
                .entry(user.clone())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }

    /// Run one store call under the configured timeout, retrying transient
    /// failures with exponential backoff. Validation and conflict errors
    /// pass straight through.
    async fn retrying<T, F, Fut>(&self, operation: &'static str, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let outcome = match timeout(self.config.storage_timeout(), call()).await {
                Ok(result) => result,
                Err(_) => Err(VerdantError::Timeout {
                    operation: operation.to_string(),
                }),
            };
            match outcome {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt <= self.config.transient_retries => {
                    warn!(operation, attempt, error = %e, "transient storage failure, retrying");
                    sleep(calculate_backoff(attempt)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
