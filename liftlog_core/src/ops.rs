//! Domain operations over the state.
//!
//! Everything here is a plain transformation of an `AppState`; the store
//! applies them through [`crate::Store::update`]. Ids that match nothing are
//! silent no-ops so stale references from the UI never turn into errors.

use crate::defaults::{DEFAULT_REPS, DEFAULT_SETS, GROUPS, MAX_SETS};
use crate::ids::new_id;
use crate::types::*;

impl AppState {
    // ========================================================================
    // Lookups
    // ========================================================================

    pub fn exercise(&self, id: &str) -> Option<&Exercise> {
        self.exercises.iter().find(|e| e.id == id)
    }

    pub fn day(&self, id: &str) -> Option<&Day> {
        self.plan.days.iter().find(|d| d.id == id)
    }

    pub fn log(&self, id: &str) -> Option<&Log> {
        self.logs.iter().find(|l| l.id == id)
    }

    /// Most recent logged entry for an exercise
    ///
    /// Logs are append-ordered, so this walks them newest first.
    pub fn find_last_exercise_log(&self, exercise_id: &str) -> Option<&LogEntry> {
        self.logs
            .iter()
            .rev()
            .find_map(|log| log.entries.iter().find(|e| e.exercise_id == exercise_id))
    }

    /// Exercises bucketed by group, in display order (empty groups included)
    pub fn exercises_by_group(&self) -> Vec<(Group, Vec<&Exercise>)> {
        GROUPS
            .iter()
            .map(|&group| {
                let members = self.exercises.iter().filter(|e| e.group == group).collect();
                (group, members)
            })
            .collect()
    }

    /// Case-insensitive substring search on exercise names
    pub fn search_exercises(&self, query: &str) -> Vec<&Exercise> {
        let needle = query.trim().to_lowercase();
        self.exercises
            .iter()
            .filter(|e| e.name.to_lowercase().contains(&needle))
            .collect()
    }

    // ========================================================================
    // Exercises
    // ========================================================================

    /// Append a new exercise and return a copy of it
    pub fn add_exercise(&mut self, init: ExerciseInit) -> Exercise {
        let exercise = Exercise {
            id: new_id(),
            name: init
                .name
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| "New Exercise".into()),
            group: init.group.unwrap_or_default(),
            sets: init.sets.unwrap_or(DEFAULT_SETS).clamp(1, MAX_SETS),
            reps: init.reps.unwrap_or(DEFAULT_REPS).max(1),
            link: init.link.map(|l| l.trim().to_string()).unwrap_or_default(),
        };
        tracing::debug!("Added exercise {} ({})", exercise.name, exercise.id);
        self.exercises.push(exercise.clone());
        exercise
    }

    pub fn update_exercise(&mut self, id: &str, patch: ExercisePatch) {
        let Some(exercise) = self.exercises.iter_mut().find(|e| e.id == id) else {
            return;
        };
        if let Some(name) = patch.name {
            exercise.name = name.trim().to_string();
        }
        if let Some(group) = patch.group {
            exercise.group = group;
        }
        if let Some(sets) = patch.sets {
            exercise.sets = sets.clamp(1, MAX_SETS);
        }
        if let Some(reps) = patch.reps {
            exercise.reps = reps.max(1);
        }
        if let Some(link) = patch.link {
            exercise.link = link.trim().to_string();
        }
    }

    /// Delete an exercise along with every day reference and logged entry
    pub fn remove_exercise(&mut self, id: &str) {
        let before = self.exercises.len();
        self.exercises.retain(|e| e.id != id);
        if self.exercises.len() == before {
            return;
        }
        for day in &mut self.plan.days {
            day.exercise_ids.retain(|e| e != id);
        }
        for log in &mut self.logs {
            log.entries.retain(|e| e.exercise_id != id);
        }
        tracing::debug!("Removed exercise {} and its references", id);
    }

    // ========================================================================
    // Days
    // ========================================================================

    /// Append an empty day; unnamed days are numbered
    pub fn add_day(&mut self, name: Option<String>) -> Day {
        let name = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("Day {}", self.plan.days.len() + 1));
        let day = Day {
            id: new_id(),
            name,
            exercise_ids: Vec::new(),
        };
        self.plan.days.push(day.clone());
        day
    }

    pub fn update_day(&mut self, id: &str, patch: DayPatch) {
        let Some(day) = self.plan.days.iter_mut().find(|d| d.id == id) else {
            return;
        };
        if let Some(name) = patch.name {
            day.name = name;
        }
    }

    /// Remove a day; logs keep pointing at it
    pub fn remove_day(&mut self, id: &str) {
        self.plan.days.retain(|d| d.id != id);
    }

    /// Link an exercise to a day, keeping the list duplicate-free
    pub fn add_exercise_to_day(&mut self, day_id: &str, exercise_id: &str) {
        if self.exercise(exercise_id).is_none() {
            return;
        }
        let Some(day) = self.plan.days.iter_mut().find(|d| d.id == day_id) else {
            return;
        };
        if !day.exercise_ids.iter().any(|e| e == exercise_id) {
            day.exercise_ids.push(exercise_id.to_string());
        }
    }

    pub fn remove_exercise_from_day(&mut self, day_id: &str, exercise_id: &str) {
        let Some(day) = self.plan.days.iter_mut().find(|d| d.id == day_id) else {
            return;
        };
        if let Some(pos) = day.exercise_ids.iter().position(|e| e == exercise_id) {
            day.exercise_ids.remove(pos);
        }
    }

    // ========================================================================
    // Logs & settings
    // ========================================================================

    pub fn delete_log(&mut self, log_id: &str) {
        self.logs.retain(|l| l.id != log_id);
    }

    pub fn set_units(&mut self, units: Units) {
        self.units = units;
    }

    pub fn set_rest_sec(&mut self, rest_sec: u32) {
        self.rest_sec = rest_sec;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::default_state;

    fn log_with(exercise_id: &str, weights: Vec<f64>) -> Log {
        Log {
            id: new_id(),
            date_iso: now_iso(),
            day_id: "d".into(),
            entries: vec![LogEntry {
                exercise_id: exercise_id.into(),
                reps: vec![10.0; weights.len()],
                weights,
            }],
        }
    }

    #[test]
    fn test_add_exercise_defaults_and_overrides() {
        let mut state = default_state();
        let plain = state.add_exercise(ExerciseInit::default());
        assert_eq!(plain.name, "New Exercise");
        assert_eq!(plain.group, Group::Other);
        assert_eq!((plain.sets, plain.reps), (3, 10));

        let squat = state.add_exercise(ExerciseInit {
            name: Some(" Squat ".into()),
            group: Some(Group::Legs),
            sets: Some(0),
            ..Default::default()
        });
        assert_eq!(squat.name, "Squat");
        assert_eq!(squat.sets, 1);
        assert_eq!(state.exercises.last(), Some(&squat));
    }

    #[test]
    fn test_update_exercise_merges_patch() {
        let mut state = default_state();
        let id = state.exercises[0].id.clone();
        state.update_exercise(
            &id,
            ExercisePatch {
                reps: Some(0),
                link: Some("https://example.com ".into()),
                ..Default::default()
            },
        );
        let ex = state.exercise(&id).unwrap();
        assert_eq!(ex.name, "Incline Chest Press");
        assert_eq!(ex.reps, 1);
        assert_eq!(ex.link(), Some("https://example.com"));
    }

    #[test]
    fn test_set_count_is_capped() {
        let mut state = default_state();
        let ex = state.add_exercise(ExerciseInit {
            sets: Some(u32::MAX),
            ..Default::default()
        });
        assert_eq!(ex.sets, MAX_SETS);

        state.update_exercise(
            &ex.id,
            ExercisePatch {
                sets: Some(MAX_SETS + 1),
                ..Default::default()
            },
        );
        assert_eq!(state.exercise(&ex.id).unwrap().sets, MAX_SETS);
    }

    #[test]
    fn test_unknown_ids_are_noops() {
        let mut state = default_state();
        let before = state.clone();
        state.update_exercise("nope", ExercisePatch::default());
        state.remove_exercise("nope");
        state.update_day("nope", DayPatch { name: Some("x".into()) });
        state.remove_day("nope");
        state.add_exercise_to_day("nope", &before.exercises[0].id);
        state.remove_exercise_from_day("nope", "nope");
        state.delete_log("nope");
        assert_eq!(state, before);
    }

    #[test]
    fn test_remove_exercise_cascades() {
        let mut state = default_state();
        let id = state.exercises[0].id.clone();
        let keep = state.exercises[1].id.clone();
        state.logs.push(log_with(&id, vec![40.0]));
        state.logs.push(log_with(&keep, vec![50.0]));

        state.remove_exercise(&id);

        assert!(state.exercise(&id).is_none());
        assert!(state.plan.days.iter().all(|d| !d.exercise_ids.contains(&id)));
        assert!(state
            .logs
            .iter()
            .all(|l| l.entries.iter().all(|e| e.exercise_id != id)));
        // The log itself survives, only the entry goes
        assert_eq!(state.logs.len(), 2);
        assert_eq!(state.logs[1].entries[0].exercise_id, keep);
    }

    #[test]
    fn test_add_exercise_to_day_is_idempotent() {
        let mut state = default_state();
        let day = state.plan.days[1].id.clone();
        let ex = state.exercises[2].id.clone();

        state.add_exercise_to_day(&day, &ex);
        let once = state.day(&day).unwrap().exercise_ids.clone();
        state.add_exercise_to_day(&day, &ex);
        assert_eq!(state.day(&day).unwrap().exercise_ids, once);
        assert_eq!(once, vec![ex]);
    }

    #[test]
    fn test_add_missing_exercise_to_day_is_ignored() {
        let mut state = default_state();
        let day = state.plan.days[1].id.clone();
        state.add_exercise_to_day(&day, "ghost");
        assert!(state.day(&day).unwrap().exercise_ids.is_empty());
    }

    #[test]
    fn test_remove_exercise_from_day_keeps_order() {
        let mut state = default_state();
        let day = state.plan.days[0].clone();
        state.remove_exercise_from_day(&day.id, &day.exercise_ids[1]);
        assert_eq!(
            state.day(&day.id).unwrap().exercise_ids,
            vec![day.exercise_ids[0].clone(), day.exercise_ids[2].clone()]
        );
        // The exercise itself is untouched
        assert!(state.exercise(&day.exercise_ids[1]).is_some());
    }

    #[test]
    fn test_day_lifecycle() {
        let mut state = default_state();
        let day = state.add_day(None);
        assert_eq!(day.name, "Day 5");
        state.update_day(&day.id, DayPatch { name: Some("Arms".into()) });
        assert_eq!(state.day(&day.id).unwrap().name, "Arms");

        let logged = log_with(&state.exercises[0].id, vec![1.0]);
        state.logs.push(Log {
            day_id: day.id.clone(),
            ..logged
        });
        state.remove_day(&day.id);
        assert!(state.day(&day.id).is_none());
        assert_eq!(state.logs[0].day_id, day.id);
    }

    #[test]
    fn test_find_last_exercise_log_prefers_newest() {
        let mut state = default_state();
        let id = state.exercises[0].id.clone();
        assert!(state.find_last_exercise_log(&id).is_none());

        state.logs.push(log_with(&id, vec![40.0]));
        state.logs.push(log_with("other", vec![1.0]));
        state.logs.push(log_with(&id, vec![45.0]));
        state.logs.push(log_with("other", vec![2.0]));

        let last = state.find_last_exercise_log(&id).unwrap();
        assert_eq!(last.weights, vec![45.0]);
    }

    #[test]
    fn test_delete_log() {
        let mut state = default_state();
        state.logs.push(log_with("a", vec![1.0]));
        state.logs.push(log_with("b", vec![2.0]));
        let id = state.logs[0].id.clone();
        state.delete_log(&id);
        assert_eq!(state.logs.len(), 1);
        assert_eq!(state.logs[0].entries[0].exercise_id, "b");
    }

    #[test]
    fn test_grouping_and_search() {
        let state = default_state();
        let groups = state.exercises_by_group();
        assert_eq!(groups.len(), 8);
        assert_eq!(groups[0].0, Group::Chest);
        assert_eq!(groups[0].1.len(), 1);
        assert!(groups[3].1.is_empty());

        let hits = state.search_exercises("ROW");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Seated Cable Row");
    }
}
