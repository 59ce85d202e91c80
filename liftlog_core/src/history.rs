//! Per-exercise history views and CSV export.

use crate::{AppState, Result};
use chrono::{DateTime, Utc};
use std::io::Write;

/// One logged session of a single exercise
#[derive(Clone, Debug, PartialEq)]
pub struct HistoryRow {
    pub log_id: String,
    pub date_iso: String,
    pub day_id: String,
    /// `(weight, reps)` per set
    pub sets: Vec<(f64, f64)>,
}

impl HistoryRow {
    pub fn performed_at(&self) -> Option<DateTime<Utc>> {
        parse_date(&self.date_iso)
    }
}

fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Every logged session containing the exercise, oldest first
///
/// Rows whose date cannot be parsed sort before all dated rows, keeping
/// their log order.
pub fn exercise_history(state: &AppState, exercise_id: &str) -> Vec<HistoryRow> {
    let mut rows: Vec<HistoryRow> = state
        .logs
        .iter()
        .filter_map(|log| {
            let entry = log.entries.iter().find(|e| e.exercise_id == exercise_id)?;
            let sets = entry
                .weights
                .iter()
                .enumerate()
                .map(|(i, w)| (*w, entry.reps.get(i).copied().unwrap_or(0.0)))
                .collect();
            Some(HistoryRow {
                log_id: log.id.clone(),
                date_iso: log.date_iso.clone(),
                day_id: log.day_id.clone(),
                sets,
            })
        })
        .collect();

    rows.sort_by_key(|row| row.performed_at());
    rows
}

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow<'a> {
    date: &'a str,
    day_id: &'a str,
    set: usize,
    weight: f64,
    reps: f64,
}

/// Write history rows as CSV, one line per set
pub fn write_history_csv<W: Write>(rows: &[HistoryRow], writer: W) -> Result<usize> {
    let mut csv = csv::Writer::from_writer(writer);
    let mut count = 0;

    for row in rows {
        for (i, (weight, reps)) in row.sets.iter().enumerate() {
            csv.serialize(CsvRow {
                date: &row.date_iso,
                day_id: &row.day_id,
                set: i + 1,
                weight: *weight,
                reps: *reps,
            })?;
            count += 1;
        }
    }

    csv.flush()?;
    tracing::debug!("Wrote {} history sets as CSV", count);
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::default_state;
    use crate::{Log, LogEntry};

    fn log(id: &str, date: &str, exercise_id: &str, weights: Vec<f64>, reps: Vec<f64>) -> Log {
        Log {
            id: id.into(),
            date_iso: date.into(),
            day_id: "d1".into(),
            entries: vec![LogEntry {
                exercise_id: exercise_id.into(),
                weights,
                reps,
            }],
        }
    }

    #[test]
    fn test_history_sorted_oldest_first() {
        let mut state = default_state();
        state.logs.push(log("new", "2024-03-01T10:00:00.000Z", "a", vec![50.0], vec![5.0]));
        state.logs.push(log("other", "2024-02-01T10:00:00.000Z", "b", vec![1.0], vec![1.0]));
        state.logs.push(log("old", "2024-01-01T10:00:00.000Z", "a", vec![45.0], vec![6.0]));

        let rows = exercise_history(&state, "a");
        let ids: Vec<_> = rows.iter().map(|r| r.log_id.as_str()).collect();
        assert_eq!(ids, vec!["old", "new"]);
        assert_eq!(rows[0].sets, vec![(45.0, 6.0)]);
    }

    #[test]
    fn test_undated_rows_sort_first() {
        let mut state = default_state();
        state.logs.push(log("dated", "2024-01-01T10:00:00Z", "a", vec![1.0], vec![1.0]));
        state.logs.push(log("garbled", "yesterday", "a", vec![2.0], vec![2.0]));

        let rows = exercise_history(&state, "a");
        assert_eq!(rows[0].log_id, "garbled");
        assert!(rows[0].performed_at().is_none());
    }

    #[test]
    fn test_unknown_exercise_has_no_history() {
        assert!(exercise_history(&default_state(), "nope").is_empty());
    }

    #[test]
    fn test_csv_export() {
        let mut state = default_state();
        state.logs.push(log("l1", "2024-01-01T10:00:00.000Z", "a", vec![40.0, 42.5], vec![10.0, 8.0]));

        let rows = exercise_history(&state, "a");
        let mut out = Vec::new();
        let count = write_history_csv(&rows, &mut out).unwrap();
        assert_eq!(count, 2);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "date,day_id,set,weight,reps");
        assert_eq!(lines[1], "2024-01-01T10:00:00.000Z,d1,1,40.0,10.0");
        assert_eq!(lines[2], "2024-01-01T10:00:00.000Z,d1,2,42.5,8.0");
    }
}
