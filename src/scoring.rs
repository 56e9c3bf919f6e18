//! Smart task prioritization.
//!
//! Scores a task from four independently weighted contributions: the raw
//! priority, how soon the due date is, a deliberately non-monotonic
//! difficulty curve (medium-difficulty tasks rank above both trivial and
//! hard ones, balancing momentum against avoidance), and a capped age bonus
//! so old open tasks are nudged upward without dominating.
//!
//! Scoring is pure: the same (task, now) pair always produces the same
//! score, and scores are never negative or NaN.

use chrono::{DateTime, NaiveDate, Utc};

use crate::model::{Task, TaskPriority};

/// Weight for each priority level. Missing priorities fall back to Medium.
fn priority_weight(priority: Option<TaskPriority>) -> f64 {
    match priority.unwrap_or_default() {
        TaskPriority::Urgent => 40.0,
        TaskPriority::High => 30.0,
        TaskPriority::Medium => 20.0,
        TaskPriority::Low => 10.0,
    }
}

/// Due-date urgency, compared at whole-day granularity. Undated tasks get a
/// flat moderate score so they are not starved.
fn due_date_urgency(due_date: Option<NaiveDate>, today: NaiveDate) -> f64 {
    let Some(due) = due_date else {
        return 10.0;
    };
    let days_until_due = (due - today).num_days();
    match days_until_due {
        d if d < 0 => 30.0, // overdue
        0 => 25.0,          // due today
        1 => 20.0,          // due tomorrow
        2..=3 => 15.0,
        _ => 5.0,
    }
}

/// Difficulty weight: 1 -> 15, 2 -> 20, 3 -> 10.
fn difficulty_weight(difficulty: u8) -> f64 {
    match difficulty {
        1 => 15.0,
        2 => 20.0,
        3 => 10.0,
        _ => 15.0,
    }
}

/// Age bonus: two points per day since creation, capped at 10.
fn age_bonus(created_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let days_old = (now - created_at).num_days() as f64;
    (days_old * 2.0).clamp(0.0, 10.0)
}

/// Score a task for smart ordering. Always finite and non-negative.
#[must_use]
pub fn score(task: &Task, now: DateTime<Utc>) -> f64 {
    let today = now.date_naive();
    let total = priority_weight(task.priority)
        + due_date_urgency(task.due_date, today)
        + difficulty_weight(task.difficulty.value())
        + age_bonus(task.created_at, now);

    if total.is_nan() {
        0.0
    } else {
        total.max(0.0)
    }
}

/// Available task orderings. `Smart` is the scored order; the rest are
/// simple total orders over single fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortMode {
    #[default]
    Smart,
    Priority,
    DueDate,
    Difficulty,
    CreatedAt,
}

/// Sort tasks in place according to the chosen mode.
///
/// All sorts are stable, so tasks that compare equal keep their original
/// insertion order.
pub fn sort_tasks(tasks: &mut [Task], mode: SortMode, now: DateTime<Utc>) {
    match mode {
        SortMode::Smart => {
            // Scores are finite and non-negative, so their IEEE 754 bit
            // patterns order the same way the values do. Caching the key
            // scores each task once instead of once per comparison.
            tasks.sort_by_cached_key(|t| std::cmp::Reverse(score(t, now).to_bits()));
        }
        SortMode::Priority => {
            tasks.sort_by(|a, b| {
                let ra = a.priority.unwrap_or_default().rank();
                let rb = b.priority.unwrap_or_default().rank();
                rb.cmp(&ra)
            });
        }
        SortMode::DueDate => {
            // Undated tasks sort last.
            tasks.sort_by(|a, b| match (a.due_date, b.due_date) {
                (None, None) => std::cmp::Ordering::Equal,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (Some(_), None) => std::cmp::Ordering::Less,
                (Some(da), Some(db)) => da.cmp(&db),
            });
        }
        SortMode::Difficulty => {
            tasks.sort_by(|a, b| b.difficulty.value().cmp(&a.difficulty.value()));
        }
        SortMode::CreatedAt => {
            tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        }
    }
}

/// Rank a task collection by descending smart score.
#[must_use]
pub fn rank(mut tasks: Vec<Task>, now: DateTime<Utc>) -> Vec<Task> {
    sort_tasks(&mut tasks, SortMode::Smart, now);
    tasks
}

/// Read-path filters over a task collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TaskFilter {
    #[default]
    All,
    /// Due exactly today.
    DueToday,
    /// Past due and still open.
    Overdue,
    /// High or Urgent priority.
    HighPriority,
    /// Difficulty 1 and still open.
    QuickWins,
}

impl TaskFilter {
    /// Whether a task passes this filter on the given day.
    #[must_use]
    pub fn matches(self, task: &Task, today: NaiveDate) -> bool {
        match self {
            Self::All => true,
            Self::DueToday => task.due_date == Some(today),
            Self::Overdue => {
                !task.completed && task.due_date.is_some_and(|due| due < today)
            }
            Self::HighPriority => matches!(
                task.priority,
                Some(TaskPriority::High) | Some(TaskPriority::Urgent)
            ),
            Self::QuickWins => !task.completed && task.difficulty.value() == 1,
        }
    }
}
