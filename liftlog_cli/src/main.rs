use clap::{Parser, Subcommand};
use liftlog_core::*;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "liftlog")]
#[command(about = "Personal workout tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage exercises
    #[command(subcommand)]
    Exercises(ExerciseCommand),

    /// Manage training days
    #[command(subcommand)]
    Days(DayCommand),

    /// Build and log a workout for a day
    #[command(subcommand)]
    Session(SessionCommand),

    /// Inspect or delete logged sessions
    #[command(subcommand)]
    Logs(LogCommand),

    /// Show logged sets for one exercise, oldest first
    History {
        /// Exercise id or name
        exercise: String,

        /// Also write the history as CSV to this path
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Units and rest time
    #[command(subcommand)]
    Settings(SettingsCommand),

    /// Print (or write) the full state as JSON
    Export {
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Replace all data with an exported JSON document ('-' reads stdin)
    Import { source: String },

    /// Delete all data and start from the defaults
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum ExerciseCommand {
    /// List exercises by group
    List {
        /// Only show exercises whose name contains this text
        #[arg(long)]
        search: Option<String>,
    },
    /// Create an exercise
    Add {
        name: String,
        #[arg(long)]
        group: Option<Group>,
        #[arg(long)]
        sets: Option<u32>,
        #[arg(long)]
        reps: Option<u32>,
        #[arg(long)]
        link: Option<String>,
        /// Also add the exercise to this day
        #[arg(long)]
        day: Option<String>,
    },
    /// Change an exercise
    Edit {
        exercise: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        group: Option<Group>,
        #[arg(long)]
        sets: Option<u32>,
        #[arg(long)]
        reps: Option<u32>,
        #[arg(long)]
        link: Option<String>,
    },
    /// Delete an exercise from the plan and from all logs
    Remove { exercise: String },
}

#[derive(Subcommand)]
enum DayCommand {
    /// List days and their exercises
    List,
    /// Add a day
    Add { name: Option<String> },
    /// Rename a day
    Rename { day: String, name: String },
    /// Remove a day (logs are kept)
    Remove { day: String },
    /// Add an exercise to a day
    Link { day: String, exercise: String },
    /// Remove an exercise from a day
    Unlink { day: String, exercise: String },
}

#[derive(Subcommand)]
enum SessionCommand {
    /// Show the prefilled session for a day
    Show {
        day: String,
        /// Start from zero weights and default reps
        #[arg(long)]
        clear: bool,
    },
    /// Fill in and save a session for a day
    Log {
        day: String,
        /// Start from zero weights and default reps
        #[arg(long)]
        clear: bool,
        /// Set values without prompting, e.g. --set "Bench=40x10,42.5x8"
        #[arg(long = "set", value_name = "EXERCISE=WxR,...")]
        sets: Vec<String>,
        /// Save the prefilled values without prompting
        #[arg(long)]
        auto_complete: bool,
        /// Show the result without saving
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Subcommand)]
enum LogCommand {
    /// List logged sessions, newest first
    List,
    /// Delete a logged session
    Delete { id: String },
}

#[derive(Subcommand)]
enum SettingsCommand {
    /// Show current settings
    Show,
    /// Set weight units (kg or lb)
    Units { units: Units },
    /// Set rest time between sets, in seconds
    Rest { seconds: u32 },
}

fn main() -> ExitCode {
    liftlog_core::logging::init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    tracing::debug!("Using data directory {:?}", data_dir);
    let store = Store::open(FileStorage::in_dir(&data_dir));

    match cli.command {
        Commands::Exercises(cmd) => cmd_exercises(&store, cmd),
        Commands::Days(cmd) => cmd_days(&store, cmd),
        Commands::Session(cmd) => cmd_session(&store, cmd, &config),
        Commands::Logs(cmd) => cmd_logs(&store, cmd),
        Commands::History { exercise, csv } => cmd_history(&store, &exercise, csv.as_deref()),
        Commands::Settings(cmd) => cmd_settings(&store, cmd),
        Commands::Export { out } => cmd_export(&store, out.as_deref()),
        Commands::Import { source } => cmd_import(&store, &source),
        Commands::Reset { yes } => cmd_reset(&store, yes),
    }
}

type AppStore = Store<FileStorage>;

// ============================================================================
// Exercises & days
// ============================================================================

fn cmd_exercises(store: &AppStore, cmd: ExerciseCommand) -> Result<()> {
    match cmd {
        ExerciseCommand::List { search } => {
            let state = store.state();
            if let Some(query) = search {
                for ex in state.search_exercises(&query) {
                    print_exercise(ex);
                }
                return Ok(());
            }
            for (group, members) in state.exercises_by_group() {
                if members.is_empty() {
                    continue;
                }
                println!("{}", group);
                for ex in members {
                    print_exercise(ex);
                }
            }
        }
        ExerciseCommand::Add {
            name,
            group,
            sets,
            reps,
            link,
            day,
        } => {
            let day_id = match day {
                Some(day) => Some(resolve_day(&store.state(), &day)?),
                None => None,
            };
            let ex = store.add_exercise(ExerciseInit {
                name: Some(name),
                group,
                sets,
                reps,
                link,
            });
            if let Some(day_id) = day_id {
                store.add_exercise_to_day(&day_id, &ex.id);
            }
            println!("✓ Added {} ({})", ex.name, ex.id);
        }
        ExerciseCommand::Edit {
            exercise,
            name,
            group,
            sets,
            reps,
            link,
        } => {
            let id = resolve_exercise(&store.state(), &exercise)?;
            store.update_exercise(
                &id,
                ExercisePatch {
                    name,
                    group,
                    sets,
                    reps,
                    link,
                },
            );
            println!("✓ Updated {}", id);
        }
        ExerciseCommand::Remove { exercise } => {
            let id = resolve_exercise(&store.state(), &exercise)?;
            store.remove_exercise(&id);
            println!("✓ Removed {}", id);
        }
    }
    Ok(())
}

fn print_exercise(ex: &Exercise) {
    print!("  {}  {}  {} x {}", ex.id, ex.name, ex.sets, ex.reps);
    if let Some(link) = ex.link() {
        print!("  {}", link);
    }
    println!();
}

fn cmd_days(store: &AppStore, cmd: DayCommand) -> Result<()> {
    match cmd {
        DayCommand::List => {
            let state = store.state();
            if state.plan.days.is_empty() {
                println!("No days yet. Add one with 'liftlog days add'.");
            }
            for day in &state.plan.days {
                println!("{} ({})", day.name, day.id);
                for (i, id) in day.exercise_ids.iter().enumerate() {
                    println!("  {}. {}", i + 1, exercise_name(&state, id));
                }
            }
        }
        DayCommand::Add { name } => {
            let day = store.add_day(name);
            println!("✓ Added {} ({})", day.name, day.id);
        }
        DayCommand::Rename { day, name } => {
            let id = resolve_day(&store.state(), &day)?;
            store.update_day(&id, DayPatch { name: Some(name) });
            println!("✓ Renamed {}", id);
        }
        DayCommand::Remove { day } => {
            let id = resolve_day(&store.state(), &day)?;
            store.remove_day(&id);
            println!("✓ Removed {}", id);
        }
        DayCommand::Link { day, exercise } => {
            let state = store.state();
            let day_id = resolve_day(&state, &day)?;
            let ex_id = resolve_exercise(&state, &exercise)?;
            store.add_exercise_to_day(&day_id, &ex_id);
            println!("✓ {} is on {}", exercise_name(&state, &ex_id), day_name(&state, &day_id));
        }
        DayCommand::Unlink { day, exercise } => {
            let state = store.state();
            let day_id = resolve_day(&state, &day)?;
            let ex_id = resolve_exercise(&state, &exercise)?;
            store.remove_exercise_from_day(&day_id, &ex_id);
            println!(
                "✓ {} removed from {}",
                exercise_name(&state, &ex_id),
                day_name(&state, &day_id)
            );
        }
    }
    Ok(())
}

// ============================================================================
// Sessions
// ============================================================================

fn cmd_session(store: &AppStore, cmd: SessionCommand, config: &Config) -> Result<()> {
    match cmd {
        SessionCommand::Show { day, clear } => {
            let state = store.state();
            let day_id = resolve_day(&state, &day)?;
            let draft = build_draft(store, &day_id, clear, config)?;
            print_session(&state, &draft);
        }
        SessionCommand::Log {
            day,
            clear,
            sets,
            auto_complete,
            dry_run,
        } => {
            let state = store.state();
            let day_id = resolve_day(&state, &day)?;
            let mut draft = build_draft(store, &day_id, clear, config)?;

            if !sets.is_empty() {
                for spec in &sets {
                    apply_set_spec(&state, &mut draft, spec)?;
                }
            } else if !auto_complete {
                prompt_sets(&state, &mut draft)?;
            }

            print_session(&state, &draft);

            if dry_run {
                println!("\n[Dry run - not logging session]");
                return Ok(());
            }

            let log = store.save_session(&draft);
            println!("\n✓ Session logged! ({})", log.id);
        }
    }
    Ok(())
}

fn build_draft(store: &AppStore, day_id: &str, clear: bool, config: &Config) -> Result<Session> {
    let mut options = config.session.options();
    if clear {
        options.copy_last = false;
    }
    store
        .build_session_for_day(day_id, options)
        .ok_or_else(|| Error::NotFound(format!("day '{}'", day_id)))
}

fn print_session(state: &AppState, draft: &Session) {
    println!("{}  {}", day_name(state, &draft.day_id), draft.date_iso);
    if draft.entries.is_empty() {
        println!("  (no exercises on this day)");
    }
    for entry in &draft.entries {
        println!();
        match state.exercise(&entry.exercise_id) {
            Some(ex) => println!("  {} ({} x {})", ex.name, ex.sets, ex.reps),
            None => println!("  (missing)"),
        }
        for (i, set) in entry.sets.iter().enumerate() {
            println!(
                "    Set {}: {} {} x {}",
                i + 1,
                set.weight,
                state.units,
                set.reps
            );
        }
    }
}

/// Apply `EXERCISE=WxR,WxR,...`; sets beyond the draft are appended
fn apply_set_spec(state: &AppState, draft: &mut Session, spec: &str) -> Result<()> {
    let (key, values) = spec
        .split_once('=')
        .ok_or_else(|| Error::Other(format!("expected EXERCISE=WxR,... in '{}'", spec)))?;
    let ex_id = resolve_exercise(state, key.trim())?;
    let default_reps = state.exercise(&ex_id).map(|e| e.reps).unwrap_or(10);

    if draft.entry(&ex_id).is_none() {
        return Err(Error::NotFound(format!(
            "exercise '{}' in this day's session",
            key.trim()
        )));
    }

    for (i, value) in values.split(',').enumerate() {
        while draft.entry(&ex_id).map(|e| e.sets.len()).unwrap_or(0) <= i {
            draft.add_set(&ex_id, default_reps);
        }
        let current_reps = draft
            .entry(&ex_id)
            .and_then(|e| e.sets.get(i))
            .map(|s| s.reps.clone())
            .unwrap_or_default();
        let (weight, reps) = split_weight_reps(value, &current_reps);
        draft.set_value(&ex_id, i, &weight, &reps);
    }
    Ok(())
}

/// Split `40x10` / `40×10` / `40` into weight and reps text
fn split_weight_reps(value: &str, fallback_reps: &str) -> (String, String) {
    let value = value.trim();
    match value.split_once(|c: char| c == 'x' || c == 'X' || c == '×') {
        Some((w, r)) => (w.trim().to_string(), r.trim().to_string()),
        None => (value.to_string(), fallback_reps.to_string()),
    }
}

fn prompt_sets(state: &AppState, draft: &mut Session) -> Result<()> {
    println!("Enter WEIGHTxREPS per set (Enter keeps the value shown)");
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    let entries: Vec<(String, usize)> = draft
        .entries
        .iter()
        .map(|e| (e.exercise_id.clone(), e.sets.len()))
        .collect();

    for (ex_id, set_count) in entries {
        println!("\n  {}", exercise_name(state, &ex_id));
        for i in 0..set_count {
            let Some(current) = draft.entry(&ex_id).and_then(|e| e.sets.get(i)).cloned() else {
                continue;
            };
            print!("    Set {} [{} x {}]: ", i + 1, current.weight, current.reps);
            io::stdout().flush()?;

            let input = match lines.next() {
                Some(line) => line?,
                None => String::new(),
            };
            if input.trim().is_empty() {
                continue;
            }
            let (weight, reps) = split_weight_reps(&input, &current.reps);
            draft.set_value(&ex_id, i, &weight, &reps);
        }
    }
    println!();
    Ok(())
}

// ============================================================================
// Logs & history
// ============================================================================

fn cmd_logs(store: &AppStore, cmd: LogCommand) -> Result<()> {
    match cmd {
        LogCommand::List => {
            let state = store.state();
            if state.logs.is_empty() {
                println!("No sessions logged yet.");
            }
            for log in state.logs.iter().rev() {
                println!(
                    "{}  {}  {}  {} exercises",
                    log.id,
                    log.date_iso,
                    day_name(&state, &log.day_id),
                    log.entries.len()
                );
            }
        }
        LogCommand::Delete { id } => {
            if store.state().log(&id).is_none() {
                return Err(Error::NotFound(format!("log '{}'", id)));
            }
            store.delete_log(&id);
            println!("✓ Deleted log {}", id);
        }
    }
    Ok(())
}

fn cmd_history(store: &AppStore, exercise: &str, csv: Option<&Path>) -> Result<()> {
    let state = store.state();
    let ex_id = resolve_exercise(&state, exercise)?;
    let rows = exercise_history(&state, &ex_id);

    println!("{}", exercise_name(&state, &ex_id));
    if rows.is_empty() {
        println!("No logs yet for this exercise.");
    }
    for row in &rows {
        let sets: Vec<String> = row
            .sets
            .iter()
            .enumerate()
            .map(|(i, (w, r))| format!("Set {}: {} × {}", i + 1, w, r))
            .collect();
        println!("  {}  {}", row.date_iso, sets.join(", "));
    }

    if let Some(path) = csv {
        let file = std::fs::File::create(path)?;
        let count = write_history_csv(&rows, file)?;
        println!("✓ Wrote {} sets to {}", count, path.display());
    }
    Ok(())
}

// ============================================================================
// Settings, import/export, reset
// ============================================================================

fn cmd_settings(store: &AppStore, cmd: SettingsCommand) -> Result<()> {
    match cmd {
        SettingsCommand::Show => {
            let state = store.state();
            println!("units: {}", state.units);
            println!("rest: {}s", state.rest_sec);
        }
        SettingsCommand::Units { units } => {
            store.set_units(units);
            println!("✓ Units set to {}", units);
        }
        SettingsCommand::Rest { seconds } => {
            store.set_rest_sec(seconds);
            println!("✓ Rest set to {}s", seconds);
        }
    }
    Ok(())
}

fn cmd_export(store: &AppStore, out: Option<&Path>) -> Result<()> {
    let json = store.export_json()?;
    match out {
        Some(path) => {
            std::fs::write(path, json)?;
            println!("✓ Exported to {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn cmd_import(store: &AppStore, source: &str) -> Result<()> {
    let contents = if source == "-" {
        io::read_to_string(io::stdin())?
    } else {
        std::fs::read_to_string(source)?
    };
    store.import_json(&contents)?;
    println!("✓ Imported.");
    Ok(())
}

fn cmd_reset(store: &AppStore, yes: bool) -> Result<()> {
    if !yes {
        return Err(Error::Other(
            "reset deletes all data; re-run with --yes to confirm".into(),
        ));
    }
    store.reset();
    println!("✓ All data reset to defaults.");
    Ok(())
}

// ============================================================================
// Lookup helpers
// ============================================================================

/// Match an exercise by id, then by case-insensitive name
fn resolve_exercise(state: &AppState, key: &str) -> Result<String> {
    if let Some(ex) = state.exercise(key) {
        return Ok(ex.id.clone());
    }
    state
        .exercises
        .iter()
        .find(|e| e.name.eq_ignore_ascii_case(key))
        .map(|e| e.id.clone())
        .ok_or_else(|| Error::NotFound(format!("exercise '{}'", key)))
}

/// Match a day by id, then by case-insensitive name
fn resolve_day(state: &AppState, key: &str) -> Result<String> {
    if let Some(day) = state.day(key) {
        return Ok(day.id.clone());
    }
    state
        .plan
        .days
        .iter()
        .find(|d| d.name.eq_ignore_ascii_case(key))
        .map(|d| d.id.clone())
        .ok_or_else(|| Error::NotFound(format!("day '{}'", key)))
}

fn exercise_name(state: &AppState, id: &str) -> String {
    state
        .exercise(id)
        .map(|e| e.name.clone())
        .unwrap_or_else(|| "(missing)".into())
}

fn day_name(state: &AppState, id: &str) -> String {
    state
        .day(id)
        .map(|d| d.name.clone())
        .unwrap_or_else(|| "(deleted day)".into())
}
