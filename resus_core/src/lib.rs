#![forbid(unsafe_code)]

//! Core domain model and business logic for the ACLS resuscitation assistant.
//!
//! This crate provides:
//! - Domain types (rhythms, drugs, log entries, advisories)
//! - Resuscitation state store and transition operations
//! - Advisory rule engine (pure evaluation of the current state)
//! - Protocol reference data (Hs & Ts, rhythm options)
//! - Report generation and export
//! - Session controller (tick source, screen retention)

pub mod types;
pub mod error;
pub mod protocol;
pub mod config;
pub mod logging;
pub mod state;
pub mod engine;
pub mod report;
pub mod session;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use protocol::{hs_and_ts, rhythm_options};
pub use config::Config;
pub use state::{ResusSession, ResusState};
pub use engine::evaluate;
pub use report::{render_report, report_filename, write_report, write_log_csv};
pub use session::{SessionController, Ticker, ScreenRetention, NoopScreenRetention};
