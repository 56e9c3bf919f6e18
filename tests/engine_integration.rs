//! End-to-end tests for the progression pipeline.
//!
//! These drive [`ProgressionEngine`] against the in-memory store (and the
//! flaky wrapper for failure injection) and assert on the combined effect of
//! a completion: task state, streak, garden, stats, and achievements.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use verdant::model::{Difficulty, Task, TaskCategory, TaskPriority, UserId};
use verdant::{
    FlakyStore, MemoryStore, ProgressionEngine, ProgressionStore, SideEffect, VerdantError,
};

/// Monday 2025-06-16, midday UTC. A weekday well clear of the night-owl and
/// early-bird windows.
fn monday_noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 16, 12, 0, 0).unwrap()
}

fn task_for(user: &UserId, difficulty: Difficulty) -> Task {
    Task::new(
        user.clone(),
        "integration task",
        TaskCategory::Work,
        difficulty,
        TaskPriority::Medium,
    )
}

async fn seed_task(
    store: &Arc<MemoryStore>,
    user: &UserId,
    difficulty: Difficulty,
) -> Task {
    let task = task_for(user, difficulty);
    store.put_task(task.clone()).await.unwrap();
    task
}

// ============================================================
// Happy path
// ============================================================

#[tokio::test]
async fn test_first_completion_updates_everything() {
    let store = Arc::new(MemoryStore::new());
    let engine = ProgressionEngine::new(store.clone());
    let user = UserId::from("u1");
    let task = seed_task(&store, &user, Difficulty::Medium).await;

    let outcome = engine
        .complete_task_at(&user, task.id, monday_noon())
        .await
        .unwrap();

    assert!(outcome.failed_effects.is_empty());
    assert!(outcome.task.completed);
    assert_eq!(outcome.task.completed_at, Some(monday_noon()));

    let streak = outcome.streak.unwrap();
    assert_eq!(streak.current_streak, 1);
    assert_eq!(streak.best_streak, 1);
    assert_eq!(streak.last_activity_date, monday_noon().date_naive());

    let plant = outcome.plant.unwrap();
    assert_eq!(plant.growth_stage, 40);
    assert_eq!(plant.health_level, 100);

    let stats = outcome.stats.unwrap();
    assert_eq!(stats.total_tasks_completed, 1);
    assert_eq!(stats.experience_points, 10);
    assert_eq!(stats.level, 1);

    let ids: Vec<&str> = outcome.newly_unlocked.iter().map(|a| a.id).collect();
    assert_eq!(ids, vec!["first_steps"]);
}

#[tokio::test]
async fn test_streak_extends_and_resets_across_days() {
    let store = Arc::new(MemoryStore::new());
    let engine = ProgressionEngine::new(store.clone());
    let user = UserId::from("u1");

    let day = monday_noon();
    for (offset, expected_current, expected_best) in [(0, 1, 1), (1, 2, 2), (2, 3, 3), (5, 1, 3)] {
        let task = seed_task(&store, &user, Difficulty::Easy).await;
        let outcome = engine
            .complete_task_at(&user, task.id, day + Duration::days(offset))
            .await
            .unwrap();
        let streak = outcome.streak.unwrap();
        assert_eq!(streak.current_streak, expected_current, "day offset {offset}");
        assert_eq!(streak.best_streak, expected_best, "day offset {offset}");
    }
}

#[tokio::test]
async fn test_garden_rolls_over_to_a_new_plant() {
    let store = Arc::new(MemoryStore::new());
    let engine = ProgressionEngine::new(store.clone());
    let user = UserId::from("u1");

    // Hard tasks grow by 60: 60, then capped at 100, then a fresh plant.
    let mut growth_seen = Vec::new();
    for _ in 0..3 {
        let task = seed_task(&store, &user, Difficulty::Hard).await;
        let outcome = engine
            .complete_task_at(&user, task.id, monday_noon())
            .await
            .unwrap();
        growth_seen.push(outcome.plant.unwrap().growth_stage);
    }
    assert_eq!(growth_seen, vec![60, 100, 60]);

    let plants = store.plants(&user).await.unwrap();
    assert_eq!(plants.len(), 2);
    assert_eq!(plants[0].growth_stage, 100);
    assert_eq!(plants[1].growth_stage, 60);

    // The second completion matured a plant, unlocking Green Thumb.
    let unlocked = store.unlocked(&user).await.unwrap();
    assert!(unlocked.iter().any(|u| u.achievement_id == "green_thumb"));
}

#[tokio::test]
async fn test_level_up_after_ten_completions() {
    let store = Arc::new(MemoryStore::new());
    let engine = ProgressionEngine::new(store.clone());
    let user = UserId::from("u1");

    let mut last = None;
    for _ in 0..10 {
        let task = seed_task(&store, &user, Difficulty::Easy).await;
        last = Some(
            engine
                .complete_task_at(&user, task.id, monday_noon())
                .await
                .unwrap(),
        );
    }

    let stats = last.unwrap().stats.unwrap();
    assert_eq!(stats.total_tasks_completed, 10);
    assert_eq!(stats.experience_points, 100);
    assert_eq!(stats.level, 2);

    let unlocked = store.unlocked(&user).await.unwrap();
    assert!(unlocked.iter().any(|u| u.achievement_id == "getting_started"));
}

#[tokio::test]
async fn test_first_steps_unlocks_exactly_once() {
    let store = Arc::new(MemoryStore::new());
    let engine = ProgressionEngine::new(store.clone());
    let user = UserId::from("u1");

    let first = seed_task(&store, &user, Difficulty::Easy).await;
    let second = seed_task(&store, &user, Difficulty::Easy).await;

    let outcome1 = engine
        .complete_task_at(&user, first.id, monday_noon())
        .await
        .unwrap();
    let outcome2 = engine
        .complete_task_at(&user, second.id, monday_noon())
        .await
        .unwrap();

    assert!(outcome1.newly_unlocked.iter().any(|a| a.id == "first_steps"));
    assert!(outcome2.newly_unlocked.iter().all(|a| a.id != "first_steps"));

    let unlocked = store.unlocked(&user).await.unwrap();
    assert_eq!(
        unlocked
            .iter()
            .filter(|u| u.achievement_id == "first_steps")
            .count(),
        1
    );
}

#[tokio::test]
async fn test_weekend_completion_bumps_special_counter() {
    let store = Arc::new(MemoryStore::new());
    let engine = ProgressionEngine::new(store.clone());
    let user = UserId::from("u1");
    let saturday = Utc.with_ymd_and_hms(2025, 6, 14, 12, 0, 0).unwrap();

    let task = seed_task(&store, &user, Difficulty::Easy).await;
    let outcome = engine.complete_task_at(&user, task.id, saturday).await.unwrap();

    let stats = outcome.stats.unwrap();
    assert_eq!(stats.special_progress.get("weekend_warrior"), Some(&1));
    assert_eq!(stats.special_progress.get("night_owl"), None);
}

#[tokio::test]
async fn test_focus_session_accumulates_and_unlocks() {
    let store = Arc::new(MemoryStore::new());
    let engine = ProgressionEngine::new(store.clone());
    let user = UserId::from("u1");

    let outcome = engine.complete_focus_session(&user, 25).await.unwrap();
    assert_eq!(outcome.stats.total_focus_minutes, 25);
    assert_eq!(outcome.stats.total_focus_sessions, 1);
    assert!(outcome.newly_unlocked.iter().any(|a| a.id == "focus_rookie"));

    // Focus sessions never award task XP.
    assert_eq!(outcome.stats.experience_points, 0);
    assert_eq!(outcome.stats.total_tasks_completed, 0);
}

// ============================================================
// Failure isolation and retries
// ============================================================

#[tokio::test]
async fn test_transient_failure_is_retried_once() {
    let inner = Arc::new(MemoryStore::new());
    let flaky = Arc::new(FlakyStore::new(inner.clone()));
    let engine = ProgressionEngine::new(flaky.clone());
    let user = UserId::from("u1");

    let task = task_for(&user, Difficulty::Easy);
    inner.put_task(task.clone()).await.unwrap();

    // One injected failure is absorbed by the retry.
    flaky.fail_next("put_streak", 1).await;
    let outcome = engine
        .complete_task_at(&user, task.id, monday_noon())
        .await
        .unwrap();

    assert!(outcome.failed_effects.is_empty());
    assert_eq!(outcome.streak.unwrap().current_streak, 1);
}

#[tokio::test]
async fn test_streak_failure_does_not_block_the_rest() {
    let inner = Arc::new(MemoryStore::new());
    let flaky = Arc::new(FlakyStore::new(inner.clone()));
    let engine = ProgressionEngine::new(flaky.clone());
    let user = UserId::from("u1");

    let task = task_for(&user, Difficulty::Medium);
    inner.put_task(task.clone()).await.unwrap();

    // Two failures exhaust the single retry and fail the streak step.
    flaky.fail_next("streak", 2).await;
    let outcome = engine
        .complete_task_at(&user, task.id, monday_noon())
        .await
        .unwrap();

    assert_eq!(outcome.failed_effects, vec![SideEffect::Streak]);
    assert!(outcome.streak.is_none());

    // The commit and the other steps still went through.
    assert!(inner.task(task.id).await.unwrap().unwrap().completed);
    assert_eq!(outcome.plant.unwrap().growth_stage, 40);
    assert_eq!(outcome.stats.unwrap().total_tasks_completed, 1);
    assert!(outcome.newly_unlocked.iter().any(|a| a.id == "first_steps"));
}

#[tokio::test]
async fn test_commit_failure_fails_the_whole_call() {
    let inner = Arc::new(MemoryStore::new());
    let flaky = Arc::new(FlakyStore::new(inner.clone()));
    let engine = ProgressionEngine::new(flaky.clone());
    let user = UserId::from("u1");

    let task = task_for(&user, Difficulty::Easy);
    inner.put_task(task.clone()).await.unwrap();

    flaky.fail_next("put_task", 2).await;
    let err = engine
        .complete_task_at(&user, task.id, monday_noon())
        .await
        .unwrap_err();
    assert!(matches!(err, VerdantError::Storage { .. }));

    // Nothing downstream happened.
    assert!(!inner.task(task.id).await.unwrap().unwrap().completed);
    assert!(inner.plants(&user).await.unwrap().is_empty());
    assert!(inner.stats(&user).await.unwrap().is_none());
}

// ============================================================
// Dashboard
// ============================================================

#[tokio::test]
async fn test_dashboard_reflects_progress() {
    let store = Arc::new(MemoryStore::new());
    let engine = ProgressionEngine::new(store.clone());
    let user = UserId::from("u1");

    for _ in 0..2 {
        let task = seed_task(&store, &user, Difficulty::Hard).await;
        engine
            .complete_task_at(&user, task.id, monday_noon())
            .await
            .unwrap();
    }

    let dashboard = engine.dashboard(&user).await.unwrap();
    assert_eq!(dashboard.tasks.len(), 2);
    assert!(dashboard.tasks.iter().all(|t| t.completed));
    assert_eq!(dashboard.plants.len(), 1);
    assert_eq!(dashboard.garden.plants_grown, 1);
    assert_eq!(dashboard.stats.total_tasks_completed, 2);
    assert_eq!(dashboard.streak.unwrap().current_streak, 1);
    assert!(!dashboard.unlocked.is_empty());
}
