//! Day-granularity streak state machine.
//!
//! All comparisons use calendar dates (UTC), never timestamps: a second
//! completion on the same day must not inflate the streak, regardless of how
//! many times the pipeline runs.

use chrono::NaiveDate;
use tracing::warn;

use crate::model::StreakRecord;

/// What a streak transition did. Useful for logging and assertions; the
/// record itself carries the resulting state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakTransition {
    /// First-ever qualifying activity.
    Started,
    /// Activity on the day after the last one.
    Extended,
    /// Another activity on the already-recorded day.
    SameDay,
    /// A gap of more than one day broke the streak.
    Reset,
    /// Activity date earlier than the recorded one (clock skew); ignored.
    SkewIgnored,
}

/// Apply one qualifying activity on `activity_date`.
///
/// Returns the new record and the transition that produced it. The invariant
/// `best_streak >= current_streak >= 1` holds on every returned record.
///
/// An activity date earlier than `last_activity_date` is treated as a no-op:
/// a skewed clock must never shrink the best streak or move the record
/// backwards.
#[must_use]
pub fn advance(
    record: Option<&StreakRecord>,
    activity_date: NaiveDate,
) -> (StreakRecord, StreakTransition) {
    let Some(existing) = record else {
        return (
            StreakRecord {
                current_streak: 1,
                best_streak: 1,
                last_activity_date: activity_date,
            },
            StreakTransition::Started,
        );
    };

    let gap_days = (activity_date - existing.last_activity_date).num_days();

    if gap_days < 0 {
        warn!(
            last_activity = %existing.last_activity_date,
            activity = %activity_date,
            "streak activity date is earlier than the recorded one; ignoring"
        );
        return (existing.clone(), StreakTransition::SkewIgnored);
    }

    if gap_days == 0 {
        return (existing.clone(), StreakTransition::SameDay);
    }

    let (current, transition) = if gap_days == 1 {
        (existing.current_streak + 1, StreakTransition::Extended)
    } else {
        (1, StreakTransition::Reset)
    };

    (
        StreakRecord {
            current_streak: current,
            best_streak: existing.best_streak.max(current),
            last_activity_date: activity_date,
        },
        transition,
    )
}
