//! Seed state used on first run and after a reset.

use crate::types::*;
use once_cell::sync::Lazy;

/// Storage key of the current schema version
pub const STORAGE_KEY: &str = "workout-tracker:v3";

/// Canonical groups in display order
pub const GROUPS: [Group; 8] = Group::ALL;

pub const DEFAULT_REST_SEC: u32 = 90;
pub const DEFAULT_SETS: u32 = 3;
pub const DEFAULT_REPS: u32 = 10;

/// Upper bound on an exercise's configured set count
pub const MAX_SETS: u32 = 100;

/// Seed state, built once per process
static DEFAULT_STATE: Lazy<AppState> = Lazy::new(build_default_state);

/// Get a copy of the seed state
///
/// Seed ids are fixed (`seed-upper-a`, ...) so they stay valid across runs
/// even before anything has been persisted.
pub fn default_state() -> AppState {
    DEFAULT_STATE.clone()
}

fn build_default_state() -> AppState {
    let exercises = vec![
        seed_exercise("Incline Chest Press", Group::Chest, 4, 10),
        seed_exercise("Seated Cable Row", Group::Back, 4, 10),
        seed_exercise("Lateral Raises", Group::Shoulders, 3, 12),
    ];

    let days = vec![
        Day {
            id: seed_id("Upper A"),
            name: "Upper A".into(),
            exercise_ids: exercises.iter().map(|e| e.id.clone()).collect(),
        },
        empty_day("Upper B"),
        empty_day("Lower"),
        empty_day("Full Body"),
    ];

    AppState {
        units: Units::Kg,
        rest_sec: DEFAULT_REST_SEC,
        exercises,
        plan: Plan { days },
        logs: Vec::new(),
    }
}

fn seed_exercise(name: &str, group: Group, sets: u32, reps: u32) -> Exercise {
    Exercise {
        id: seed_id(name),
        name: name.into(),
        group,
        sets,
        reps,
        link: String::new(),
    }
}

fn empty_day(name: &str) -> Day {
    Day {
        id: seed_id(name),
        name: name.into(),
        exercise_ids: Vec::new(),
    }
}

/// `Incline Chest Press` -> `seed-incline-chest-press`
fn seed_id(name: &str) -> String {
    let slug: Vec<String> = name
        .split_whitespace()
        .map(|word| word.to_lowercase())
        .collect();
    format!("seed-{}", slug.join("-"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_shape() {
        let state = default_state();
        assert_eq!(state.units, Units::Kg);
        assert_eq!(state.rest_sec, 90);
        assert_eq!(state.exercises.len(), 3);
        assert_eq!(state.plan.days.len(), 4);
        assert!(state.logs.is_empty());
        assert_eq!(state.plan.days[0].name, "Upper A");
        assert_eq!(state.plan.days[0].exercise_ids.len(), 3);
    }

    #[test]
    fn test_seed_ids_are_fixed() {
        let state = default_state();
        assert_eq!(state.exercises[0].id, "seed-incline-chest-press");
        assert_eq!(state.exercises[2].id, "seed-lateral-raises");
        let day_ids: Vec<&str> = state.plan.days.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(day_ids, vec!["seed-upper-a", "seed-upper-b", "seed-lower", "seed-full-body"]);
        assert_eq!(build_default_state(), state);
    }

    #[test]
    fn test_seed_days_reference_seed_exercises() {
        let state = default_state();
        for day in &state.plan.days {
            for id in &day.exercise_ids {
                assert!(state.exercises.iter().any(|e| &e.id == id));
            }
        }
    }
}
