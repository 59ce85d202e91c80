//! Schema migration for persisted and imported state.
//!
//! Every payload ever written by the app (and anything a user pastes into
//! import) goes through [`migrate`]. Each field is decoded on its own with an
//! explicit fallback, so one malformed field never costs the rest of the
//! data. Shapes handled:
//! - v1: `{exercises, logs}` with no plan
//! - v2: log entries as `sets: [{w, r}]` or `weights`-only arrays
//! - v3: the current layout (parallel `weights`/`reps` arrays)
//!
//! Migration drops data in one place: log entries with no usable
//! `exerciseId` are discarded, since nothing can refer back to them.

use crate::defaults::{default_state, DEFAULT_REPS, DEFAULT_REST_SEC, DEFAULT_SETS, MAX_SETS};
use crate::ids::new_id;
use crate::types::*;
use serde_json::{Map, Value};
use std::collections::HashSet;

type Object = Map<String, Value>;

/// Normalize an arbitrary JSON value into the current schema
///
/// Never fails. `migrate(&to_value(migrate(x)))` equals `migrate(x)`.
pub fn migrate(raw: &Value) -> AppState {
    let root = raw.as_object();

    let units = match field(root, "units") {
        Some(Value::String(s)) if s == "lb" => Units::Lb,
        _ => Units::Kg,
    };

    let rest_sec = field(root, "restSec")
        .and_then(finite)
        .map(|n| clamp_u32(n, 0, u32::MAX))
        .unwrap_or(DEFAULT_REST_SEC);

    let exercises = match field(root, "exercises") {
        Some(Value::Array(items)) => normalize_exercises(items),
        _ => {
            tracing::debug!("No exercise list in payload, using seed exercises");
            default_state().exercises
        }
    };

    let plan_days = field(root, "plan")
        .and_then(Value::as_object)
        .and_then(|plan| plan.get("days"));
    let mut days = match plan_days {
        Some(Value::Array(items)) => normalize_days(items),
        _ => {
            tracing::debug!("No plan in payload, using seed plan");
            default_state().plan.days
        }
    };

    prune_day_references(&mut days, &exercises);

    let fallback_day_id = days.first().map(|d| d.id.clone()).unwrap_or_default();
    let logs = match field(root, "logs") {
        Some(Value::Array(items)) => normalize_logs(items, &fallback_day_id),
        _ => Vec::new(),
    };

    AppState {
        units,
        rest_sec,
        exercises,
        plan: Plan { days },
        logs,
    }
}

// ============================================================================
// Entities
// ============================================================================

fn normalize_exercises(items: &[Value]) -> Vec<Exercise> {
    let mut seen = HashSet::new();
    items
        .iter()
        .map(|item| {
            let obj = item.as_object();
            Exercise {
                id: coerce_id(field(obj, "id"), &mut seen),
                name: string_or(field(obj, "name"), "Exercise"),
                group: match field(obj, "group") {
                    Some(Value::String(s)) => Group::from_name(s).unwrap_or_default(),
                    _ => Group::Other,
                },
                sets: field(obj, "sets")
                    .and_then(finite)
                    .map(|n| clamp_u32(n, 1, MAX_SETS))
                    .unwrap_or(DEFAULT_SETS),
                reps: field(obj, "reps")
                    .and_then(finite)
                    .map(|n| clamp_u32(n, 1, u32::MAX))
                    .unwrap_or(DEFAULT_REPS),
                link: string_or(field(obj, "link"), ""),
            }
        })
        .collect()
}

fn normalize_days(items: &[Value]) -> Vec<Day> {
    let mut seen = HashSet::new();
    items
        .iter()
        .map(|item| {
            let obj = item.as_object();
            let mut exercise_ids: Vec<String> = Vec::new();
            if let Some(Value::Array(ids)) = field(obj, "exerciseIds") {
                for id in ids.iter().filter_map(truthy_id) {
                    if !exercise_ids.contains(&id) {
                        exercise_ids.push(id);
                    }
                }
            }
            Day {
                id: coerce_id(field(obj, "id"), &mut seen),
                name: string_or(field(obj, "name"), "Day"),
                exercise_ids,
            }
        })
        .collect()
}

/// Drop day references to exercises that no longer exist
fn prune_day_references(days: &mut [Day], exercises: &[Exercise]) {
    let valid: HashSet<&str> = exercises.iter().map(|e| e.id.as_str()).collect();
    for day in days.iter_mut() {
        let before = day.exercise_ids.len();
        day.exercise_ids.retain(|id| valid.contains(id.as_str()));
        let pruned = before - day.exercise_ids.len();
        if pruned > 0 {
            tracing::debug!("Pruned {} dangling exercise ids from day {}", pruned, day.id);
        }
    }
}

fn normalize_logs(items: &[Value], fallback_day_id: &str) -> Vec<Log> {
    let mut seen = HashSet::new();
    items
        .iter()
        .map(|item| {
            let obj = item.as_object();
            let entries = match field(obj, "entries") {
                Some(Value::Array(entries)) => {
                    entries.iter().filter_map(normalize_entry).collect()
                }
                _ => Vec::new(),
            };
            Log {
                id: coerce_id(field(obj, "id"), &mut seen),
                date_iso: non_empty_string(field(obj, "dateISO")).unwrap_or_else(now_iso),
                day_id: non_empty_string(field(obj, "dayId"))
                    .unwrap_or_else(|| fallback_day_id.to_string()),
                entries,
            }
        })
        .collect()
}

/// Decode one log entry from any of the historical shapes
///
/// Entries without an exercise reference carry no usable history and are
/// dropped.
fn normalize_entry(item: &Value) -> Option<LogEntry> {
    let obj = item.as_object()?;
    let exercise_id = truthy_id(obj.get("exerciseId")?)?;

    let (weights, reps): (Vec<f64>, Vec<f64>) = match obj.get("sets") {
        Some(Value::Array(sets)) => sets
            .iter()
            .map(|set| {
                let set = set.as_object();
                let weight = field(set, "w").or_else(|| field(set, "weight"));
                let reps = field(set, "r").or_else(|| field(set, "reps"));
                (loose_number(weight), loose_number(reps))
            })
            .unzip(),
        _ => {
            let mut weights = loose_numbers(obj.get("weights"));
            let mut reps = loose_numbers(obj.get("reps"));
            let len = weights.len().max(reps.len());
            weights.resize(len, 0.0);
            reps.resize(len, 0.0);
            (weights, reps)
        }
    };

    Some(LogEntry {
        exercise_id,
        weights,
        reps,
    })
}

// ============================================================================
// Field decoders
// ============================================================================

fn field<'a>(obj: Option<&'a Object>, key: &str) -> Option<&'a Value> {
    obj.and_then(|o| o.get(key))
}

/// A JSON number (strings do not count)
fn finite(value: &Value) -> Option<f64> {
    value.as_f64().filter(|n| n.is_finite())
}

fn clamp_u32(n: f64, floor: u32, ceiling: u32) -> u32 {
    n.round().clamp(f64::from(floor), f64::from(ceiling)) as u32
}

fn string_or(value: Option<&Value>, fallback: &str) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        _ => fallback.to_string(),
    }
}

fn non_empty_string(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// Id-like values: non-empty strings and non-zero numbers
fn truthy_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(number_id(n)),
        _ => None,
    }
}

/// Numbers render the same whether stored as `5` or `5.0`
fn number_id(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        i.to_string()
    } else if let Some(u) = n.as_u64() {
        u.to_string()
    } else {
        // f64 Display drops a zero fraction and never uses an exponent
        n.as_f64().map(|f| f.to_string()).unwrap_or_else(|| n.to_string())
    }
}

/// Keep a usable id, otherwise mint one; ids already used in this
/// collection are re-minted
fn coerce_id(value: Option<&Value>, seen: &mut HashSet<String>) -> String {
    let mut id = value.and_then(truthy_id).unwrap_or_else(new_id);
    while seen.contains(&id) {
        tracing::debug!("Duplicate id {} re-keyed during migration", id);
        id = new_id();
    }
    seen.insert(id.clone());
    id
}

/// Lenient numeric coercion; anything unusable becomes 0
fn loose_number(value: Option<&Value>) -> f64 {
    let n = match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                0.0
            } else {
                s.parse::<f64>().unwrap_or(0.0)
            }
        }
        Some(Value::Bool(true)) => 1.0,
        _ => 0.0,
    };
    if n.is_finite() {
        n
    } else {
        0.0
    }
}

fn loose_numbers(value: Option<&Value>) -> Vec<f64> {
    match value {
        Some(Value::Array(items)) => items.iter().map(|v| loose_number(Some(v))).collect(),
        _ => Vec::new(),
    }
}
