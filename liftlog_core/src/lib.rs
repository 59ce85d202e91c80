#![forbid(unsafe_code)]

//! Core state store for the Liftlog workout tracker.
//!
//! This crate provides:
//! - Domain types (exercises, plan days, logs, session drafts)
//! - Seed state and schema migration for every stored layout
//! - Persistence with corruption-tolerant loading
//! - The store: snapshots, write-through updates, change notification
//! - Session building with "copy last" prefill
//! - History views, import/export and configuration

pub mod types;
pub mod error;
pub mod ids;
pub mod defaults;
pub mod migrate;
pub mod persistence;
pub mod ops;
pub mod session;
pub mod store;
pub mod history;
pub mod transfer;
pub mod config;
pub mod logging;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use defaults::{default_state, GROUPS, STORAGE_KEY};
pub use migrate::migrate;
pub use persistence::{FileStorage, MemoryStorage, StateStorage};
pub use session::{build_session_for_day, save_session, SessionOptions};
pub use store::{Store, SubscriptionId};
pub use history::{exercise_history, write_history_csv, HistoryRow};
pub use config::Config;
