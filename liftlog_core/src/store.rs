//! The state store: one owned `AppState`, write-through persistence and
//! change notification.
//!
//! A `Store` is constructed explicitly and handed to whatever renders the
//! state. It is single-threaded (`!Send`, `!Sync`); every call runs to
//! completion before returning, so a call always observes the effects of
//! the calls made before it.
//!
//! Listeners run synchronously after each change. A listener may call back
//! into the store: the change is applied and persisted immediately, but its
//! notification waits until the current round of listeners has finished, and
//! then a new round runs with the latest state.

use crate::defaults::default_state;
use crate::persistence::{self, StateStorage};
use crate::session::{self, SessionOptions};
use crate::transfer;
use crate::types::*;
use crate::Result;
use std::cell::{Cell, Ref, RefCell};
use std::rc::Rc;

/// Handle returned by [`Store::subscribe`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Rc<RefCell<dyn FnMut(&AppState)>>;

pub struct Store<S: StateStorage> {
    storage: RefCell<S>,
    state: RefCell<Rc<AppState>>,
    listeners: RefCell<Vec<(SubscriptionId, Listener)>>,
    next_subscription: Cell<u64>,
    notifying: Cell<bool>,
    pending_round: Cell<bool>,
}

/// Clears the in-progress flag even if a listener panics
struct RoundGuard<'a>(&'a Cell<bool>);

impl Drop for RoundGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl<S: StateStorage> Store<S> {
    /// Open a store over the given storage, loading (and migrating) whatever
    /// it holds
    pub fn open(storage: S) -> Self {
        let state = persistence::load(&storage);
        Self::with_state(storage, state)
    }

    /// Build a store around an explicit initial state without touching storage
    pub fn with_state(storage: S, state: AppState) -> Self {
        Self {
            storage: RefCell::new(storage),
            state: RefCell::new(Rc::new(state)),
            listeners: RefCell::new(Vec::new()),
            next_subscription: Cell::new(0),
            notifying: Cell::new(false),
            pending_round: Cell::new(false),
        }
    }

    /// Current snapshot
    pub fn state(&self) -> Rc<AppState> {
        Rc::clone(&self.state.borrow())
    }

    pub fn storage(&self) -> Ref<'_, S> {
        self.storage.borrow()
    }

    /// Replace the state with the result of `updater`
    pub fn set_state<F>(&self, updater: F)
    where
        F: FnOnce(&AppState) -> AppState,
    {
        let current = self.state();
        self.commit(updater(&current));
    }

    /// Replace the state wholesale
    pub fn replace(&self, state: AppState) {
        self.commit(state);
    }

    /// Modify a copy of the state, commit it, and return what `f` returned
    pub fn update<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut AppState) -> R,
    {
        let mut next = AppState::clone(&self.state());
        let out = f(&mut next);
        self.commit(next);
        out
    }

    /// Register a listener called with every new state
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: FnMut(&AppState) + 'static,
    {
        let id = SubscriptionId(self.next_subscription.get());
        self.next_subscription.set(id.0 + 1);
        let listener: Listener = Rc::new(RefCell::new(listener));
        self.listeners.borrow_mut().push((id, listener));
        id
    }

    /// Remove a listener; returns false if it was already gone
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(sid, _)| *sid != id);
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    fn commit(&self, next: AppState) {
        let next = Rc::new(next);
        *self.state.borrow_mut() = Rc::clone(&next);
        persistence::save(&mut *self.storage.borrow_mut(), &next);
        self.notify();
    }

    fn notify(&self) {
        if self.notifying.get() {
            self.pending_round.set(true);
            return;
        }
        self.notifying.set(true);
        let _guard = RoundGuard(&self.notifying);

        loop {
            self.pending_round.set(false);
            let snapshot = self.state();
            let listeners: Vec<Listener> = self
                .listeners
                .borrow()
                .iter()
                .map(|(_, l)| Rc::clone(l))
                .collect();

            for listener in listeners {
                match listener.try_borrow_mut() {
                    Ok(mut f) => f(&snapshot),
                    Err(_) => tracing::warn!("Skipping listener that is already running"),
                }
            }

            if !self.pending_round.get() {
                break;
            }
            tracing::debug!("State changed during notification, notifying again");
        }
    }

    // ========================================================================
    // Domain operations
    // ========================================================================

    pub fn add_exercise(&self, init: ExerciseInit) -> Exercise {
        self.update(|s| s.add_exercise(init))
    }

    pub fn update_exercise(&self, id: &str, patch: ExercisePatch) {
        self.update(|s| s.update_exercise(id, patch))
    }

    pub fn remove_exercise(&self, id: &str) {
        self.update(|s| s.remove_exercise(id))
    }

    pub fn add_day(&self, name: Option<String>) -> Day {
        self.update(|s| s.add_day(name))
    }

    pub fn update_day(&self, id: &str, patch: DayPatch) {
        self.update(|s| s.update_day(id, patch))
    }

    pub fn remove_day(&self, id: &str) {
        self.update(|s| s.remove_day(id))
    }

    pub fn add_exercise_to_day(&self, day_id: &str, exercise_id: &str) {
        self.update(|s| s.add_exercise_to_day(day_id, exercise_id))
    }

    pub fn remove_exercise_from_day(&self, day_id: &str, exercise_id: &str) {
        self.update(|s| s.remove_exercise_from_day(day_id, exercise_id))
    }

    pub fn delete_log(&self, log_id: &str) {
        self.update(|s| s.delete_log(log_id))
    }

    pub fn set_units(&self, units: Units) {
        self.update(|s| s.set_units(units))
    }

    pub fn set_rest_sec(&self, rest_sec: u32) {
        self.update(|s| s.set_rest_sec(rest_sec))
    }

    pub fn find_last_exercise_log(&self, exercise_id: &str) -> Option<LogEntry> {
        self.state().find_last_exercise_log(exercise_id).cloned()
    }

    // ========================================================================
    // Sessions
    // ========================================================================

    pub fn build_session_for_day(&self, day_id: &str, options: SessionOptions) -> Option<Session> {
        session::build_session_for_day(&self.state(), day_id, options)
    }

    pub fn save_session(&self, draft: &Session) -> Log {
        self.update(|s| session::save_session(s, draft))
    }

    // ========================================================================
    // Import / export / reset
    // ========================================================================

    pub fn export_json(&self) -> Result<String> {
        transfer::export_json(&self.state())
    }

    /// Replace the state with an imported document
    ///
    /// Rejected payloads leave the state untouched.
    pub fn import_json(&self, contents: &str) -> Result<()> {
        let imported = transfer::parse_import(contents)?;
        tracing::info!(
            "Imported {} exercises, {} days, {} logs",
            imported.exercises.len(),
            imported.plan.days.len(),
            imported.logs.len()
        );
        self.replace(imported);
        Ok(())
    }

    /// Clear stored data and return to the seed state
    pub fn reset(&self) {
        if let Err(e) = self.storage.borrow_mut().clear() {
            tracing::warn!("Failed to clear stored state: {}", e);
        }
        *self.state.borrow_mut() = Rc::new(default_state());
        tracing::info!("State reset to defaults");
        self.notify();
    }
}
