//! Import and export of the whole state document.

use crate::migrate::migrate;
use crate::{AppState, Error, Result};
use serde_json::Value;

/// Serialize the state exactly as it is persisted (pretty-printed)
pub fn export_json(state: &AppState) -> Result<String> {
    Ok(serde_json::to_string_pretty(state)?)
}

/// Validate a pasted or loaded export and migrate it into the current schema
///
/// Any older layout is accepted as long as it is a JSON object carrying at
/// least one of `exercises` or `plan`.
pub fn parse_import(contents: &str) -> Result<AppState> {
    let raw: Value = serde_json::from_str(contents)
        .map_err(|e| Error::Import(format!("not valid JSON ({})", e)))?;

    let Some(obj) = raw.as_object() else {
        return Err(Error::Import("expected a JSON object".into()));
    };

    if !obj.contains_key("exercises") && !obj.contains_key("plan") {
        return Err(Error::Import(
            "missing both \"exercises\" and \"plan\"; this does not look like an export".into(),
        ));
    }

    Ok(migrate(&raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::default_state;

    #[test]
    fn test_export_uses_persisted_layout() {
        let json = export_json(&default_state()).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["units"], "kg");
        assert_eq!(value["restSec"], 90);
        assert!(value["plan"]["days"][0]["exerciseIds"].is_array());
        assert!(value["logs"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_export_roundtrip() {
        let state = default_state();
        let parsed = parse_import(&export_json(&state).unwrap()).unwrap();
        assert_eq!(parsed, state);
    }

    #[test]
    fn test_rejects_invalid_json() {
        let err = parse_import("{ nope").unwrap_err();
        assert!(matches!(err, Error::Import(_)));
        assert!(err.to_string().contains("not valid JSON"));
    }

    #[test]
    fn test_rejects_non_objects() {
        for payload in ["[]", "null", "42", "\"text\""] {
            assert!(matches!(parse_import(payload), Err(Error::Import(_))));
        }
    }

    #[test]
    fn test_rejects_payload_without_exercises_or_plan() {
        let err = parse_import(r#"{"units": "lb", "logs": []}"#).unwrap_err();
        assert!(err.to_string().contains("does not look like an export"));
    }

    #[test]
    fn test_accepts_older_shapes() {
        // v1 export: exercises and logs only
        let state = parse_import(
            r#"{"exercises":[{"id":"a","name":"Press"}],"logs":[{"entries":[{"exerciseId":"a","sets":[{"w":30,"r":5}]}]}]}"#,
        )
        .unwrap();
        assert_eq!(state.exercises[0].name, "Press");
        assert_eq!(state.logs[0].entries[0].weights, vec![30.0]);

        // plan only
        let state = parse_import(r#"{"plan":{"days":[{"id":"d","name":"Solo"}]}}"#).unwrap();
        assert_eq!(state.plan.days[0].name, "Solo");
        assert_eq!(state.exercises.len(), 3);
    }
}
