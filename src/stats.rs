//! Aggregate stat transitions.
//!
//! Stats are updated incrementally, never recomputed from scratch after
//! first initialization. Each completion grants a fixed XP amount and the
//! level is derived from total XP, which keeps both monotonic.

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};

use crate::model::UserStats;

/// XP granted per completed task.
pub const XP_PER_TASK: u32 = 10;

/// XP required per level; `level = xp / XP_PER_LEVEL + 1`.
pub const XP_PER_LEVEL: u32 = 100;

/// Completions at or after this hour count toward the night-owl counter.
pub const NIGHT_OWL_HOUR: u32 = 22;

/// Completions before this hour count toward the early-bird counter.
pub const EARLY_BIRD_HOUR: u32 = 6;

/// Level derived from total experience.
#[must_use]
pub fn level_for_xp(experience_points: u32) -> u32 {
    experience_points / XP_PER_LEVEL + 1
}

/// Record one task completion at `completed_at`.
///
/// Bumps the completion count, grants XP, re-derives the level and
/// maintains the time-of-day / weekend counters that feed the `special`
/// achievement category.
pub fn record_completion(stats: &mut UserStats, completed_at: DateTime<Utc>) {
    stats.total_tasks_completed += 1;
    stats.experience_points += XP_PER_TASK;
    stats.level = level_for_xp(stats.experience_points);

    let hour = completed_at.hour();
    if hour >= NIGHT_OWL_HOUR {
        bump_special(stats, "night_owl");
    }
    if hour < EARLY_BIRD_HOUR {
        bump_special(stats, "early_bird");
    }
    if matches!(completed_at.weekday(), Weekday::Sat | Weekday::Sun) {
        bump_special(stats, "weekend_warrior");
    }

    stats.last_updated = completed_at;
}

/// Record one completed focus session.
pub fn record_focus_session(stats: &mut UserStats, minutes: u32, now: DateTime<Utc>) {
    stats.total_focus_minutes += minutes;
    stats.total_focus_sessions += 1;
    stats.last_updated = now;
}

fn bump_special(stats: &mut UserStats, achievement_id: &str) {
    *stats
        .special_progress
        .entry(achievement_id.to_string())
        .or_insert(0) += 1;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn ten_completions_reach_level_two() {
        let now = Utc.with_ymd_and_hms(2025, 6, 16, 12, 0, 0).unwrap(); // Monday
        let mut stats = UserStats::empty(now);
        for _ in 0..10 {
            record_completion(&mut stats, now);
        }
        assert_eq!(stats.total_tasks_completed, 10);
        assert_eq!(stats.experience_points, 100);
        assert_eq!(stats.level, 2);
    }

    #[test]
    fn level_never_decreases() {
        assert_eq!(level_for_xp(0), 1);
        assert_eq!(level_for_xp(99), 1);
        assert_eq!(level_for_xp(100), 2);
        assert_eq!(level_for_xp(250), 3);
    }

    #[test]
    fn late_completion_counts_as_night_owl() {
        let late = Utc.with_ymd_and_hms(2025, 6, 17, 22, 30, 0).unwrap(); // Tuesday
        let mut stats = UserStats::empty(late);
        record_completion(&mut stats, late);
        assert_eq!(stats.special_progress.get("night_owl"), Some(&1));
        assert_eq!(stats.special_progress.get("early_bird"), None);
    }

    #[test]
    fn dawn_completion_counts_as_early_bird() {
        let dawn = Utc.with_ymd_and_hms(2025, 6, 17, 5, 59, 0).unwrap();
        let mut stats = UserStats::empty(dawn);
        record_completion(&mut stats, dawn);
        assert_eq!(stats.special_progress.get("early_bird"), Some(&1));

        let six = Utc.with_ymd_and_hms(2025, 6, 17, 6, 0, 0).unwrap();
        record_completion(&mut stats, six);
        assert_eq!(stats.special_progress.get("early_bird"), Some(&1));
    }

    #[test]
    fn weekend_completions_accumulate() {
        let saturday = Utc.with_ymd_and_hms(2025, 6, 14, 10, 0, 0).unwrap();
        let sunday = Utc.with_ymd_and_hms(2025, 6, 15, 10, 0, 0).unwrap();
        let monday = Utc.with_ymd_and_hms(2025, 6, 16, 10, 0, 0).unwrap();
        let mut stats = UserStats::empty(saturday);
        record_completion(&mut stats, saturday);
        record_completion(&mut stats, sunday);
        record_completion(&mut stats, monday);
        assert_eq!(stats.special_progress.get("weekend_warrior"), Some(&2));
    }

    #[test]
    fn focus_sessions_add_minutes_only() {
        let now = Utc::now();
        let mut stats = UserStats::empty(now);
        record_focus_session(&mut stats, 25, now);
        record_focus_session(&mut stats, 50, now);
        assert_eq!(stats.total_focus_minutes, 75);
        assert_eq!(stats.total_focus_sessions, 2);
        assert_eq!(stats.total_tasks_completed, 0);
        assert_eq!(stats.experience_points, 0);
    }
}
