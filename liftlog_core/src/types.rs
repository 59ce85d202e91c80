//! Core domain types for Liftlog.
//!
//! This module defines the persisted data model:
//! - Exercises and their muscle groups
//! - The training plan (days referencing exercises)
//! - Logged sessions and their per-exercise entries
//! - The transient session draft edited before saving

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Settings
// ============================================================================

/// Weight unit shown next to logged weights
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Kg,
    Lb,
}

impl Units {
    pub fn as_str(self) -> &'static str {
        match self {
            Units::Kg => "kg",
            Units::Lb => "lb",
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Units {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "kg" => Ok(Units::Kg),
            "lb" | "lbs" => Ok(Units::Lb),
            other => Err(format!("unknown unit '{}' (expected kg or lb)", other)),
        }
    }
}

// ============================================================================
// Exercise Types
// ============================================================================

/// Muscle group an exercise is filed under
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Group {
    Chest,
    Back,
    Shoulders,
    Legs,
    Arms,
    Core,
    Cardio,
    #[default]
    Other,
}

impl Group {
    /// All groups in display order
    pub const ALL: [Group; 8] = [
        Group::Chest,
        Group::Back,
        Group::Shoulders,
        Group::Legs,
        Group::Arms,
        Group::Core,
        Group::Cardio,
        Group::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Group::Chest => "Chest",
            Group::Back => "Back",
            Group::Shoulders => "Shoulders",
            Group::Legs => "Legs",
            Group::Arms => "Arms",
            Group::Core => "Core",
            Group::Cardio => "Cardio",
            Group::Other => "Other",
        }
    }

    /// Exact, case-sensitive match against the persisted names
    pub fn from_name(name: &str) -> Option<Group> {
        Group::ALL.into_iter().find(|g| g.as_str() == name)
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Group {
    type Err = String;

    /// Lenient parse for user input (case-insensitive)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Group::ALL
            .into_iter()
            .find(|g| g.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown group '{}'", s))
    }
}

/// A named movement with a target set/rep scheme
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Exercise {
    pub id: String,
    pub name: String,
    pub group: Group,
    pub sets: u32,
    pub reps: u32,
    /// Reference link; empty when unset
    pub link: String,
}

impl Exercise {
    pub fn link(&self) -> Option<&str> {
        if self.link.is_empty() {
            None
        } else {
            Some(&self.link)
        }
    }
}

/// Fields accepted when creating an exercise; unset fields take defaults
#[derive(Clone, Debug, Default)]
pub struct ExerciseInit {
    pub name: Option<String>,
    pub group: Option<Group>,
    pub sets: Option<u32>,
    pub reps: Option<u32>,
    pub link: Option<String>,
}

/// Partial update merged into an existing exercise
#[derive(Clone, Debug, Default)]
pub struct ExercisePatch {
    pub name: Option<String>,
    pub group: Option<Group>,
    pub sets: Option<u32>,
    pub reps: Option<u32>,
    pub link: Option<String>,
}

// ============================================================================
// Plan Types
// ============================================================================

/// One slot of the training plan (e.g. "Upper A")
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Day {
    pub id: String,
    pub name: String,
    /// Ordered, duplicate-free references into `AppState::exercises`
    pub exercise_ids: Vec<String>,
}

/// Partial update merged into an existing day
#[derive(Clone, Debug, Default)]
pub struct DayPatch {
    pub name: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Plan {
    pub days: Vec<Day>,
}

// ============================================================================
// Log Types
// ============================================================================

/// Actual weights and reps performed for one exercise in a logged session
///
/// `weights` and `reps` are parallel, one value per set.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub exercise_id: String,
    pub weights: Vec<f64>,
    pub reps: Vec<f64>,
}

/// A completed session; immutable once recorded
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Log {
    pub id: String,
    #[serde(rename = "dateISO")]
    pub date_iso: String,
    /// May reference a day that has since been removed
    #[serde(rename = "dayId")]
    pub day_id: String,
    pub entries: Vec<LogEntry>,
}

// ============================================================================
// Session Draft Types
// ============================================================================

/// One editable set; values are kept as typed text until the session is saved
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionSet {
    pub weight: String,
    pub reps: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionEntry {
    pub exercise_id: String,
    pub sets: Vec<SessionSet>,
}

/// Draft workout built from a day; never persisted
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub day_id: String,
    pub date_iso: String,
    pub entries: Vec<SessionEntry>,
}

// ============================================================================
// Root State
// ============================================================================

/// The complete persisted state
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub units: Units,
    pub rest_sec: u32,
    pub exercises: Vec<Exercise>,
    pub plan: Plan,
    pub logs: Vec<Log>,
}

/// Current time in the persisted timestamp format (RFC 3339, millis, `Z`)
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
