//! Achievement catalog and unlock evaluation.
//!
//! The catalog is configuration data, not persisted state: a fixed table of
//! definitions loaded once at process start. Evaluation is a pure set
//! difference — given the live aggregates and the ids already unlocked, it
//! reports only the ids whose progress crossed the requirement on this
//! snapshot. Rewards are descriptive metadata carried through unchanged;
//! applying them is the caller's business.

use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Which aggregate drives an achievement's progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementCategory {
    Tasks,
    Focus,
    Streaks,
    Garden,
    Special,
}

/// Cosmetic rank, orthogonal to unlock logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementTier {
    Bronze,
    Silver,
    Gold,
    Platinum,
    Legendary,
}

/// What kind of reward an achievement grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardKind {
    Xp,
    PlantBoost,
    Theme,
    Title,
    Feature,
}

/// Reward payload: either a numeric amount (XP, boost percentage) or a name
/// (theme, title, feature flag).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RewardValue {
    Amount(u32),
    Name(&'static str),
}

/// Reward descriptor carried through evaluation unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Reward {
    pub kind: RewardKind,
    pub value: RewardValue,
    pub description: &'static str,
}

/// One catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AchievementDef {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub category: AchievementCategory,
    pub tier: AchievementTier,
    pub requirement: u32,
    pub reward: Reward,
}

/// The built-in catalog table.
const CATALOG: &[AchievementDef] = &[
    // Task achievements
    AchievementDef {
        id: "first_steps",
        name: "First Steps",
        description: "Complete your first task",
        icon: "\u{1F3AF}",
        category: AchievementCategory::Tasks,
        tier: AchievementTier::Bronze,
        requirement: 1,
        reward: Reward {
            kind: RewardKind::Xp,
            value: RewardValue::Amount(50),
            description: "+50 XP",
        },
    },
    AchievementDef {
        id: "getting_started",
        name: "Getting Started",
        description: "Complete 10 tasks",
        icon: "\u{2705}",
        category: AchievementCategory::Tasks,
        tier: AchievementTier::Bronze,
        requirement: 10,
        reward: Reward {
            kind: RewardKind::Xp,
            value: RewardValue::Amount(100),
            description: "+100 XP",
        },
    },
    AchievementDef {
        id: "task_master",
        name: "Task Master",
        description: "Complete 50 tasks",
        icon: "\u{1F3C6}",
        category: AchievementCategory::Tasks,
        tier: AchievementTier::Silver,
        requirement: 50,
        reward: Reward {
            kind: RewardKind::PlantBoost,
            value: RewardValue::Amount(20),
            description: "+20% plant growth",
        },
    },
    AchievementDef {
        id: "productivity_guru",
        name: "Productivity Guru",
        description: "Complete 100 tasks",
        icon: "\u{1F451}",
        category: AchievementCategory::Tasks,
        tier: AchievementTier::Gold,
        requirement: 100,
        reward: Reward {
            kind: RewardKind::Theme,
            value: RewardValue::Name("golden"),
            description: "Golden theme unlocked",
        },
    },
    AchievementDef {
        id: "task_legend",
        name: "Task Legend",
        description: "Complete 500 tasks",
        icon: "\u{2B50}",
        category: AchievementCategory::Tasks,
        tier: AchievementTier::Legendary,
        requirement: 500,
        reward: Reward {
            kind: RewardKind::Title,
            value: RewardValue::Name("Task Legend"),
            description: "Legendary title",
        },
    },
    // Focus achievements
    AchievementDef {
        id: "focus_rookie",
        name: "Focus Rookie",
        description: "Focus for 25 minutes",
        icon: "\u{1F3AF}",
        category: AchievementCategory::Focus,
        tier: AchievementTier::Bronze,
        requirement: 25,
        reward: Reward {
            kind: RewardKind::Xp,
            value: RewardValue::Amount(75),
            description: "+75 XP",
        },
    },
    AchievementDef {
        id: "deep_work",
        name: "Deep Work",
        description: "Focus for 5 hours total",
        icon: "\u{1F9E0}",
        category: AchievementCategory::Focus,
        tier: AchievementTier::Silver,
        requirement: 300,
        reward: Reward {
            kind: RewardKind::Feature,
            value: RewardValue::Name("advanced_timer"),
            description: "Advanced timer features",
        },
    },
    AchievementDef {
        id: "focus_master",
        name: "Focus Master",
        description: "Focus for 25 hours total",
        icon: "\u{1F525}",
        category: AchievementCategory::Focus,
        tier: AchievementTier::Gold,
        requirement: 1500,
        reward: Reward {
            kind: RewardKind::PlantBoost,
            value: RewardValue::Amount(50),
            description: "+50% plant growth",
        },
    },
    AchievementDef {
        id: "zen_master",
        name: "Zen Master",
        description: "Focus for 100 hours total",
        icon: "\u{1F9D8}",
        category: AchievementCategory::Focus,
        tier: AchievementTier::Platinum,
        requirement: 6000,
        reward: Reward {
            kind: RewardKind::Theme,
            value: RewardValue::Name("zen"),
            description: "Zen theme unlocked",
        },
    },
    // Streak achievements
    AchievementDef {
        id: "consistency",
        name: "Consistency",
        description: "Maintain a 3-day streak",
        icon: "\u{1F4C5}",
        category: AchievementCategory::Streaks,
        tier: AchievementTier::Bronze,
        requirement: 3,
        reward: Reward {
            kind: RewardKind::Xp,
            value: RewardValue::Amount(100),
            description: "+100 XP",
        },
    },
    AchievementDef {
        id: "habit_former",
        name: "Habit Former",
        description: "Maintain a 7-day streak",
        icon: "\u{1F525}",
        category: AchievementCategory::Streaks,
        tier: AchievementTier::Silver,
        requirement: 7,
        reward: Reward {
            kind: RewardKind::PlantBoost,
            value: RewardValue::Amount(25),
            description: "+25% plant health",
        },
    },
    AchievementDef {
        id: "unstoppable",
        name: "Unstoppable",
        description: "Maintain a 30-day streak",
        icon: "\u{26A1}",
        category: AchievementCategory::Streaks,
        tier: AchievementTier::Gold,
        requirement: 30,
        reward: Reward {
            kind: RewardKind::Feature,
            value: RewardValue::Name("streak_protection"),
            description: "Streak protection (1 free miss)",
        },
    },
    AchievementDef {
        id: "streak_legend",
        name: "Legend",
        description: "Maintain a 100-day streak",
        icon: "\u{1F451}",
        category: AchievementCategory::Streaks,
        tier: AchievementTier::Legendary,
        requirement: 100,
        reward: Reward {
            kind: RewardKind::Title,
            value: RewardValue::Name("Streak Legend"),
            description: "Legendary streak title",
        },
    },
    // Garden achievements
    AchievementDef {
        id: "green_thumb",
        name: "Green Thumb",
        description: "Grow your first plant to 100%",
        icon: "\u{1F331}",
        category: AchievementCategory::Garden,
        tier: AchievementTier::Bronze,
        requirement: 1,
        reward: Reward {
            kind: RewardKind::Xp,
            value: RewardValue::Amount(150),
            description: "+150 XP",
        },
    },
    AchievementDef {
        id: "gardener",
        name: "Gardener",
        description: "Grow 5 plants to maturity",
        icon: "\u{1F33F}",
        category: AchievementCategory::Garden,
        tier: AchievementTier::Silver,
        requirement: 5,
        reward: Reward {
            kind: RewardKind::PlantBoost,
            value: RewardValue::Amount(30),
            description: "+30% growth speed",
        },
    },
    AchievementDef {
        id: "garden_master",
        name: "Garden Master",
        description: "Grow 25 plants to maturity",
        icon: "\u{1F333}",
        category: AchievementCategory::Garden,
        tier: AchievementTier::Gold,
        requirement: 25,
        reward: Reward {
            kind: RewardKind::Theme,
            value: RewardValue::Name("garden"),
            description: "Garden paradise theme",
        },
    },
    // Special achievements
    AchievementDef {
        id: "night_owl",
        name: "Night Owl",
        description: "Complete a task after 10 PM",
        icon: "\u{1F989}",
        category: AchievementCategory::Special,
        tier: AchievementTier::Bronze,
        requirement: 1,
        reward: Reward {
            kind: RewardKind::Xp,
            value: RewardValue::Amount(50),
            description: "+50 XP",
        },
    },
    AchievementDef {
        id: "early_bird",
        name: "Early Bird",
        description: "Complete a task before 6 AM",
        icon: "\u{1F426}",
        category: AchievementCategory::Special,
        tier: AchievementTier::Bronze,
        requirement: 1,
        reward: Reward {
            kind: RewardKind::Xp,
            value: RewardValue::Amount(50),
            description: "+50 XP",
        },
    },
    AchievementDef {
        id: "weekend_warrior",
        name: "Weekend Warrior",
        description: "Complete 10 tasks on weekends",
        icon: "\u{2694}",
        category: AchievementCategory::Special,
        tier: AchievementTier::Silver,
        requirement: 10,
        reward: Reward {
            kind: RewardKind::PlantBoost,
            value: RewardValue::Amount(15),
            description: "+15% weekend bonus",
        },
    },
    AchievementDef {
        id: "perfectionist",
        name: "Perfectionist",
        description: "Complete all daily tasks for 7 days",
        icon: "\u{1F48E}",
        category: AchievementCategory::Special,
        tier: AchievementTier::Platinum,
        requirement: 7,
        reward: Reward {
            kind: RewardKind::Feature,
            value: RewardValue::Name("perfect_day_bonus"),
            description: "Perfect day XP bonus",
        },
    },
];

/// The static achievement catalog.
#[derive(Debug, Clone)]
pub struct AchievementCatalog {
    defs: &'static [AchievementDef],
}

impl AchievementCatalog {
    /// The built-in table.
    #[must_use]
    pub fn builtin() -> Self {
        Self { defs: CATALOG }
    }

    /// Look up a definition by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&AchievementDef> {
        self.defs.iter().find(|d| d.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AchievementDef> {
        self.defs.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

impl Default for AchievementCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Snapshot of the aggregates achievement progress is measured against.
///
/// `special` carries the opaque per-achievement counters; the evaluator
/// reads them by id without interpreting them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub tasks_completed: u32,
    pub focus_minutes: u32,
    pub current_streak: u32,
    pub best_streak: u32,
    pub plants_grown: u32,
    pub special: BTreeMap<String, u32>,
}

impl ProgressSnapshot {
    /// Current progress toward one achievement.
    #[must_use]
    pub fn progress_for(&self, def: &AchievementDef) -> u32 {
        match def.category {
            AchievementCategory::Tasks => self.tasks_completed,
            AchievementCategory::Focus => self.focus_minutes,
            AchievementCategory::Streaks => self.current_streak.max(self.best_streak),
            AchievementCategory::Garden => self.plants_grown,
            AchievementCategory::Special => {
                self.special.get(def.id).copied().unwrap_or(0)
            }
        }
    }
}

/// Report the achievements whose progress crosses the requirement and which
/// are not yet in `already_unlocked`.
///
/// Re-evaluating the same snapshot against the grown unlocked set yields an
/// empty result, so a retried pipeline cannot double-record an unlock.
#[must_use]
pub fn evaluate<'a>(
    catalog: &'a AchievementCatalog,
    snapshot: &ProgressSnapshot,
    already_unlocked: &HashSet<String>,
) -> Vec<&'a AchievementDef> {
    catalog
        .iter()
        .filter(|def| !already_unlocked.contains(def.id))
        .filter(|def| snapshot.progress_for(def) >= def.requirement)
        .collect()
}
