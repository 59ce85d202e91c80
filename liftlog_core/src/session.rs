//! Session drafts: building a workout from a day and saving it as a log.
//!
//! A draft is prefilled from history ("copy last"):
//! - weight for set `i` is the last logged weight at `i`, else the last
//!   weight of that logged entry, else `0`
//! - reps for set `i` are the last logged reps at `i`, else the exercise's
//!   configured reps
//!
//! Drafts hold text exactly as typed; numbers are only parsed on save.

use crate::defaults::{DEFAULT_REPS, DEFAULT_SETS, MAX_SETS};
use crate::ids::new_id;
use crate::types::*;

/// Options for building a draft
#[derive(Clone, Copy, Debug)]
pub struct SessionOptions {
    /// Prefill from the most recent log of each exercise
    pub copy_last: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self { copy_last: true }
    }
}

/// Build a draft session for a day, `None` if the day does not exist
pub fn build_session_for_day(
    state: &AppState,
    day_id: &str,
    options: SessionOptions,
) -> Option<Session> {
    let day = state.day(day_id)?;

    let entries = day
        .exercise_ids
        .iter()
        .map(|exercise_id| {
            let last = if options.copy_last {
                state.find_last_exercise_log(exercise_id)
            } else {
                None
            };
            SessionEntry {
                exercise_id: exercise_id.clone(),
                sets: prefill_sets(state.exercise(exercise_id), last),
            }
        })
        .collect();

    tracing::debug!("Built session for day {} (copy_last={})", day.id, options.copy_last);

    Some(Session {
        day_id: day.id.clone(),
        date_iso: now_iso(),
        entries,
    })
}

fn prefill_sets(exercise: Option<&Exercise>, last: Option<&LogEntry>) -> Vec<SessionSet> {
    let set_count = exercise.map(|e| e.sets).unwrap_or(DEFAULT_SETS).min(MAX_SETS) as usize;
    let default_reps = default_reps(exercise);

    (0..set_count)
        .map(|i| {
            let weight = last
                .and_then(|entry| entry.weights.get(i).or_else(|| entry.weights.last()))
                .map(|w| format_number(*w))
                .unwrap_or_else(|| "0".to_string());
            let reps = last
                .and_then(|entry| entry.reps.get(i))
                .map(|r| format_number(*r))
                .unwrap_or_else(|| default_reps.clone());
            SessionSet { weight, reps }
        })
        .collect()
}

fn default_reps(exercise: Option<&Exercise>) -> String {
    exercise.map(|e| e.reps).unwrap_or(DEFAULT_REPS).to_string()
}

/// Render a logged number the way it is typed (`40`, `42.5`)
fn format_number(n: f64) -> String {
    n.to_string()
}

/// Parse typed text; empty or invalid input counts as 0
fn parse_number(text: &str) -> f64 {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .unwrap_or(0.0)
}

impl Session {
    pub fn entry(&self, exercise_id: &str) -> Option<&SessionEntry> {
        self.entries.iter().find(|e| e.exercise_id == exercise_id)
    }

    /// Append a blank set to an exercise
    pub fn add_set(&mut self, exercise_id: &str, default_reps: u32) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.exercise_id == exercise_id) {
            entry.sets.push(SessionSet {
                weight: "0".into(),
                reps: default_reps.max(1).to_string(),
            });
        }
    }

    /// Drop an exercise from this draft only
    pub fn remove_entry(&mut self, exercise_id: &str) {
        self.entries.retain(|e| e.exercise_id != exercise_id);
    }

    /// Overwrite one set's text; out-of-range positions are ignored
    pub fn set_value(&mut self, exercise_id: &str, set_index: usize, weight: &str, reps: &str) {
        let set = self
            .entries
            .iter_mut()
            .find(|e| e.exercise_id == exercise_id)
            .and_then(|e| e.sets.get_mut(set_index));
        if let Some(set) = set {
            set.weight = weight.to_string();
            set.reps = reps.to_string();
        }
    }

    /// Reset every set to zero weight and the configured reps, keeping set counts
    pub fn clear(&mut self, state: &AppState) {
        for entry in &mut self.entries {
            let reps = default_reps(state.exercise(&entry.exercise_id));
            for set in &mut entry.sets {
                set.weight = "0".into();
                set.reps = reps.clone();
            }
        }
    }

    /// Convert the draft into a log (does not record it)
    pub fn to_log(&self) -> Log {
        Log {
            id: new_id(),
            date_iso: self.date_iso.clone(),
            day_id: self.day_id.clone(),
            entries: self
                .entries
                .iter()
                .map(|entry| LogEntry {
                    exercise_id: entry.exercise_id.clone(),
                    weights: entry.sets.iter().map(|s| parse_number(&s.weight)).collect(),
                    reps: entry.sets.iter().map(|s| parse_number(&s.reps)).collect(),
                })
                .collect(),
        }
    }
}

/// Record a draft as a new log and return it
pub fn save_session(state: &mut AppState, session: &Session) -> Log {
    let log = session.to_log();
    tracing::info!(
        "Saved session {} for day {} ({} exercises)",
        log.id,
        log.day_id,
        log.entries.len()
    );
    state.logs.push(log.clone());
    log
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::default_state;

    fn state_with_day(sets: u32, reps: u32) -> (AppState, String, String) {
        let mut state = default_state();
        let ex = state.add_exercise(ExerciseInit {
            name: Some("Bench".into()),
            sets: Some(sets),
            reps: Some(reps),
            ..Default::default()
        });
        let day = state.add_day(Some("Push".into()));
        state.add_exercise_to_day(&day.id, &ex.id);
        (state, day.id, ex.id)
    }

    fn push_log(state: &mut AppState, exercise_id: &str, weights: Vec<f64>, reps: Vec<f64>) {
        state.logs.push(Log {
            id: new_id(),
            date_iso: now_iso(),
            day_id: "any".into(),
            entries: vec![LogEntry {
                exercise_id: exercise_id.into(),
                weights,
                reps,
            }],
        });
    }

    fn values(session: &Session, exercise_id: &str) -> Vec<(String, String)> {
        session
            .entry(exercise_id)
            .unwrap()
            .sets
            .iter()
            .map(|s| (s.weight.clone(), s.reps.clone()))
            .collect()
    }

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter().map(|(w, r)| (w.to_string(), r.to_string())).collect()
    }

    #[test]
    fn test_unknown_day_returns_none() {
        let state = default_state();
        assert!(build_session_for_day(&state, "nope", SessionOptions::default()).is_none());
    }

    #[test]
    fn test_no_history_zero_fills() {
        let (state, day, ex) = state_with_day(3, 10);
        let session = build_session_for_day(&state, &day, SessionOptions::default()).unwrap();
        assert_eq!(session.day_id, day);
        assert_eq!(values(&session, &ex), pairs(&[("0", "10"), ("0", "10"), ("0", "10")]));
    }

    #[test]
    fn test_carry_forward_last_weight() {
        let (mut state, day, ex) = state_with_day(3, 10);
        push_log(&mut state, &ex, vec![40.0, 42.0], vec![8.0, 7.0]);

        let session = build_session_for_day(&state, &day, SessionOptions::default()).unwrap();
        assert_eq!(values(&session, &ex), pairs(&[("40", "8"), ("42", "7"), ("42", "10")]));
    }

    #[test]
    fn test_fewer_sets_than_history_truncates() {
        let (mut state, day, ex) = state_with_day(2, 10);
        push_log(&mut state, &ex, vec![20.0, 22.5, 25.0], vec![5.0, 5.0, 5.0]);

        let session = build_session_for_day(&state, &day, SessionOptions::default()).unwrap();
        assert_eq!(values(&session, &ex), pairs(&[("20", "5"), ("22.5", "5")]));
    }

    #[test]
    fn test_uses_most_recent_log() {
        let (mut state, day, ex) = state_with_day(1, 10);
        push_log(&mut state, &ex, vec![30.0], vec![6.0]);
        push_log(&mut state, &ex, vec![35.0], vec![5.0]);

        let session = build_session_for_day(&state, &day, SessionOptions::default()).unwrap();
        assert_eq!(values(&session, &ex), pairs(&[("35", "5")]));
    }

    #[test]
    fn test_copy_last_disabled_resets() {
        let (mut state, day, ex) = state_with_day(2, 12);
        push_log(&mut state, &ex, vec![40.0, 42.0], vec![8.0, 7.0]);

        let session =
            build_session_for_day(&state, &day, SessionOptions { copy_last: false }).unwrap();
        assert_eq!(values(&session, &ex), pairs(&[("0", "12"), ("0", "12")]));
    }

    #[test]
    fn test_missing_exercise_uses_fallback_scheme() {
        let mut state = default_state();
        let day_id = state.plan.days[1].id.clone();
        // Dangling reference, as left by an old payload
        state.plan.days[1].exercise_ids.push("ghost".into());

        let session = build_session_for_day(&state, &day_id, SessionOptions::default()).unwrap();
        assert_eq!(values(&session, "ghost").len(), 3);
        assert_eq!(values(&session, "ghost")[0], ("0".to_string(), "10".to_string()));
    }

    #[test]
    fn test_oversized_set_count_is_capped() {
        let (mut state, day, ex) = state_with_day(3, 10);
        // Set directly, skipping the clamp in add_exercise
        state.exercises.last_mut().unwrap().sets = u32::MAX;

        let session = build_session_for_day(&state, &day, SessionOptions::default()).unwrap();
        assert_eq!(values(&session, &ex).len(), MAX_SETS as usize);
    }

    #[test]
    fn test_clear_matches_copy_last_disabled() {
        let (mut state, day, ex) = state_with_day(3, 10);
        push_log(&mut state, &ex, vec![40.0, 42.0, 44.0], vec![8.0, 7.0, 6.0]);

        let mut session = build_session_for_day(&state, &day, SessionOptions::default()).unwrap();
        session.clear(&state);
        let cleared =
            build_session_for_day(&state, &day, SessionOptions { copy_last: false }).unwrap();
        assert_eq!(session.entries, cleared.entries);
    }

    #[test]
    fn test_save_coerces_invalid_numbers() {
        let (mut state, day, ex) = state_with_day(3, 10);
        let mut session = build_session_for_day(&state, &day, SessionOptions::default()).unwrap();
        session.set_value(&ex, 0, "", "abc");
        session.set_value(&ex, 1, " 42.5 ", "8");
        session.add_set(&ex, 6);

        let log = save_session(&mut state, &session);
        let entry = &log.entries[0];
        assert_eq!(entry.weights, vec![0.0, 42.5, 0.0, 0.0]);
        assert_eq!(entry.reps, vec![0.0, 8.0, 10.0, 6.0]);
        assert_eq!(log.day_id, day);
        assert_eq!(log.date_iso, session.date_iso);
        assert_eq!(state.logs.last(), Some(&log));
    }

    #[test]
    fn test_saved_session_feeds_next_draft() {
        let (mut state, day, ex) = state_with_day(2, 10);
        let mut session = build_session_for_day(&state, &day, SessionOptions::default()).unwrap();
        session.set_value(&ex, 0, "50", "9");
        session.set_value(&ex, 1, "55", "7");
        save_session(&mut state, &session);

        let next = build_session_for_day(&state, &day, SessionOptions::default()).unwrap();
        assert_eq!(values(&next, &ex), pairs(&[("50", "9"), ("55", "7")]));
    }

    #[test]
    fn test_remove_entry_only_touches_draft() {
        let (state, day, ex) = state_with_day(2, 10);
        let mut session = build_session_for_day(&state, &day, SessionOptions::default()).unwrap();
        session.remove_entry(&ex);
        assert!(session.entries.is_empty());
        assert_eq!(state.day(&day).unwrap().exercise_ids, vec![ex]);
    }
}
