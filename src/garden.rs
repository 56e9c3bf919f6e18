//! Plant growth simulation.
//!
//! Each completion feeds the active plant — the last plant in the user's
//! ordered collection that has not yet reached full growth. Growth is
//! `difficulty * 20`, so one to three completions mature a plant. A plant at
//! full growth is retired: the next completion creates a fresh plant that
//! absorbs the whole growth amount.
//!
//! Growth and health never decrease and never exceed 100. Health decay is
//! deliberately absent from this simulation.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::model::{Difficulty, Plant, MAX_GROWTH, MAX_HEALTH};

/// Growth points per difficulty unit.
pub const GROWTH_PER_DIFFICULTY: u8 = 20;

/// Health gained by the active plant on each completion.
pub const HEALTH_PER_COMPLETION: u8 = 10;

/// Result of feeding one completion into the garden.
#[derive(Debug, Clone, PartialEq)]
pub enum GrowthOutcome {
    /// A new plant was created (empty garden, or the active plant was
    /// already fully grown).
    Created(Plant),
    /// The active plant grew in place.
    Grown(Plant),
}

impl GrowthOutcome {
    /// The plant affected by this completion.
    #[must_use]
    pub fn plant(&self) -> &Plant {
        match self {
            Self::Created(p) | Self::Grown(p) => p,
        }
    }

    /// Whether a new plant was created.
    #[must_use]
    pub fn is_new(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// The active plant: last in insertion order, if not yet fully grown.
#[must_use]
pub fn active_plant(plants: &[Plant]) -> Option<&Plant> {
    plants.last().filter(|p| p.growth_stage < MAX_GROWTH)
}

/// Apply one completed task of the given difficulty to the plant collection.
///
/// The collection itself is not mutated; the caller persists the returned
/// plant (append for `Created`, overwrite for `Grown`).
#[must_use]
pub fn apply_completion(
    plants: &[Plant],
    difficulty: Difficulty,
    now: DateTime<Utc>,
) -> GrowthOutcome {
    let growth_amount = difficulty.value() * GROWTH_PER_DIFFICULTY;

    match active_plant(plants) {
        None => GrowthOutcome::Created(Plant {
            id: Uuid::new_v4(),
            growth_stage: growth_amount.min(MAX_GROWTH),
            health_level: MAX_HEALTH,
            last_updated: now,
        }),
        Some(active) => GrowthOutcome::Grown(Plant {
            id: active.id,
            growth_stage: active.growth_stage.saturating_add(growth_amount).min(MAX_GROWTH),
            health_level: active
                .health_level
                .saturating_add(HEALTH_PER_COMPLETION)
                .min(MAX_HEALTH),
            last_updated: now,
        }),
    }
}

/// Count of fully grown plants, the progress measure for garden achievements.
#[must_use]
pub fn plants_grown(plants: &[Plant]) -> u32 {
    plants
        .iter()
        .filter(|p| p.growth_stage >= MAX_GROWTH)
        .count() as u32
}

/// Aggregate view of the garden for dashboards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GardenSummary {
    pub total_plants: usize,
    pub plants_grown: u32,
    pub average_health: f64,
    pub average_growth: f64,
}

/// Summarize a plant collection.
#[must_use]
pub fn summarize(plants: &[Plant]) -> GardenSummary {
    let total = plants.len();
    let (health_sum, growth_sum) = plants.iter().fold((0u32, 0u32), |(h, g), p| {
        (h + u32::from(p.health_level), g + u32::from(p.growth_stage))
    });
    GardenSummary {
        total_plants: total,
        plants_grown: plants_grown(plants),
        average_health: if total == 0 {
            0.0
        } else {
            f64::from(health_sum) / total as f64
        },
        average_growth: if total == 0 {
            0.0
        } else {
            f64::from(growth_sum) / total as f64
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply_and_collect(plants: &mut Vec<Plant>, difficulty: Difficulty) -> GrowthOutcome {
        let outcome = apply_completion(plants, difficulty, Utc::now());
        match &outcome {
            GrowthOutcome::Created(p) => plants.push(p.clone()),
            GrowthOutcome::Grown(p) => {
                let last = plants.last_mut().unwrap();
                *last = p.clone();
            }
        }
        outcome
    }

    #[test]
    fn empty_garden_creates_first_plant() {
        let outcome = apply_completion(&[], Difficulty::Hard, Utc::now());
        assert!(outcome.is_new());
        assert_eq!(outcome.plant().growth_stage, 60);
        assert_eq!(outcome.plant().health_level, 100);
    }

    #[test]
    fn growth_scenario_two_hard_tasks_then_new_plant() {
        let mut plants = Vec::new();

        // Difficulty-3 task: one plant at 60.
        let o1 = apply_and_collect(&mut plants, Difficulty::Hard);
        assert!(o1.is_new());
        assert_eq!(plants[0].growth_stage, 60);

        // Second difficulty-3 task: capped at 100, health capped at 100.
        let o2 = apply_and_collect(&mut plants, Difficulty::Hard);
        assert!(!o2.is_new());
        assert_eq!(plants[0].growth_stage, 100);
        assert_eq!(plants[0].health_level, 100);

        // Third task of any difficulty: a second plant appears.
        let o3 = apply_and_collect(&mut plants, Difficulty::Easy);
        assert!(o3.is_new());
        assert_eq!(plants.len(), 2);
        assert_eq!(plants[1].growth_stage, 20);
    }

    #[test]
    fn growth_is_monotonic_and_bounded() {
        let mut plants = Vec::new();
        let mut previous: Option<(Uuid, u8)> = None;
        for difficulty in [
            Difficulty::Easy,
            Difficulty::Medium,
            Difficulty::Hard,
            Difficulty::Easy,
            Difficulty::Hard,
            Difficulty::Medium,
        ] {
            let outcome = apply_and_collect(&mut plants, difficulty);
            let plant = outcome.plant();
            assert!(plant.growth_stage <= MAX_GROWTH);
            assert!(plant.health_level <= MAX_HEALTH);
            if let Some((prev_id, prev_growth)) = previous {
                if prev_id == plant.id {
                    assert!(plant.growth_stage >= prev_growth);
                }
            }
            previous = Some((plant.id, plant.growth_stage));
        }
    }

    #[test]
    fn growth_amounts_per_difficulty() {
        for (difficulty, expected) in [
            (Difficulty::Easy, 20),
            (Difficulty::Medium, 40),
            (Difficulty::Hard, 60),
        ] {
            let outcome = apply_completion(&[], difficulty, Utc::now());
            assert_eq!(outcome.plant().growth_stage, expected);
        }
    }

    #[test]
    fn health_rises_by_ten_per_completion() {
        let plant = Plant {
            id: Uuid::new_v4(),
            growth_stage: 20,
            health_level: 70,
            last_updated: Utc::now(),
        };
        let outcome = apply_completion(std::slice::from_ref(&plant), Difficulty::Easy, Utc::now());
        assert_eq!(outcome.plant().health_level, 80);
        assert_eq!(outcome.plant().id, plant.id);
    }

    #[test]
    fn plants_grown_counts_only_full_growth() {
        let mk = |growth| Plant {
            id: Uuid::new_v4(),
            growth_stage: growth,
            health_level: 100,
            last_updated: Utc::now(),
        };
        let plants = vec![mk(100), mk(99), mk(100), mk(40)];
        assert_eq!(plants_grown(&plants), 2);
    }

    #[test]
    fn active_plant_skips_fully_grown_tail() {
        let mk = |growth| Plant {
            id: Uuid::new_v4(),
            growth_stage: growth,
            health_level: 100,
            last_updated: Utc::now(),
        };
        assert!(active_plant(&[]).is_none());
        let done = vec![mk(100)];
        assert!(active_plant(&done).is_none());
        let growing = vec![mk(100), mk(40)];
        assert_eq!(active_plant(&growing).unwrap().growth_stage, 40);
    }

    #[test]
    fn summary_averages() {
        let mk = |growth, health| Plant {
            id: Uuid::new_v4(),
            growth_stage: growth,
            health_level: health,
            last_updated: Utc::now(),
        };
        let summary = summarize(&[mk(100, 80), mk(50, 100)]);
        assert_eq!(summary.total_plants, 2);
        assert_eq!(summary.plants_grown, 1);
        assert!((summary.average_health - 90.0).abs() < f64::EPSILON);
        assert!((summary.average_growth - 75.0).abs() < f64::EPSILON);

        let empty = summarize(&[]);
        assert_eq!(empty.average_health, 0.0);
    }
}
