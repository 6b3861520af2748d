//! Resuscitation state store.
//!
//! `ResusSession` is the single source of truth for one resuscitation:
//! timers, intervention history, current rhythm, and the append-only
//! event log. All mutation goes through the transition operations below;
//! each is synchronous and atomic (no partially applied update is ever
//! observable).
//!
//! Confirmation of destructive operations (`reset_all`, `end`) belongs to
//! the caller; the store executes unconditionally.

use crate::types::{Drug, LogCategory, LogEntry, Rhythm};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Current resuscitation state, mutated only through `ResusSession`
#[derive(Clone, Debug, Default, Serialize)]
pub struct ResusState {
    /// Whether the timer is running
    pub active: bool,
    /// Wall-clock time of first activation, set once
    pub started_at: Option<DateTime<Utc>>,
    /// Total elapsed seconds; reset only by `reset_all`
    pub elapsed_seconds: u32,
    /// Seconds into the current 2-minute CPR cycle
    pub cycle_seconds: u32,
    /// Elapsed-time offset of the last epinephrine dose
    pub last_epi_at: Option<u32>,
    /// Elapsed-time offset of the last amiodarone dose
    pub last_amio_at: Option<u32>,
    /// Cumulative shocks delivered
    pub shock_count: u32,
    /// Rhythm from the most recent rhythm check
    pub current_rhythm: Option<Rhythm>,
}

/// A resuscitation session: state plus the newest-first event log
#[derive(Clone, Debug, Default)]
pub struct ResusSession {
    state: ResusState,
    log: Vec<LogEntry>,
}

impl ResusSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ResusState {
        &self.state
    }

    /// Event log, newest first
    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }

    fn append_log(&mut self, action: impl Into<String>, action_cn: impl Into<String>, category: LogCategory) {
        let entry = LogEntry {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            time_offset: self.state.elapsed_seconds,
            action: action.into(),
            action_cn: action_cn.into(),
            category,
        };
        tracing::debug!(action = %entry.action, category = ?entry.category, "log entry appended");
        self.log.insert(0, entry);
    }

    /// Start or resume the timer
    ///
    /// `started_at` is set on the first call only; resuming never resets
    /// `elapsed_seconds`.
    pub fn start(&mut self) {
        self.state.active = true;
        if self.state.started_at.is_none() {
            self.state.started_at = Some(Utc::now());
        }
        if self.state.elapsed_seconds == 0 {
            self.append_log("Resuscitation Started", "开始抢救", LogCategory::Info);
        } else {
            self.append_log("Timer Resumed", "计时恢复", LogCategory::Info);
        }
    }

    /// Stop the timer; all recorded times remain
    pub fn pause(&mut self) {
        self.state.active = false;
        self.append_log("Timer Paused", "计时暂停", LogCategory::Info);
    }

    /// Restore all fields to their initial state and clear the log
    ///
    /// Destructive; the caller is expected to have confirmed.
    pub fn reset_all(&mut self) {
        tracing::info!("session reset, clearing {} log entries", self.log.len());
        self.state = ResusState::default();
        self.log.clear();
    }

    /// Reset the cycle timer without touching elapsed time
    pub fn reset_cycle(&mut self) {
        self.state.cycle_seconds = 0;
        self.append_log("Cycle Timer Reset", "周期计时重置", LogCategory::Procedure);
    }

    /// Advance both timers by one second; no-op while inactive
    pub fn tick(&mut self) {
        if !self.state.active {
            return;
        }
        self.state.elapsed_seconds += 1;
        self.state.cycle_seconds += 1;
    }

    /// Record a delivered shock: bumps the cumulative count and restarts
    /// the cycle timer
    pub fn record_shock(&mut self) {
        self.state.shock_count += 1;
        self.state.cycle_seconds = 0;
        let n = self.state.shock_count;
        self.append_log(
            format!("Shock Delivered #{}", n),
            format!("实施除颤 #{}", n),
            LogCategory::Shock,
        );
    }

    /// Record a rhythm check result; restarts the cycle timer
    pub fn record_rhythm(&mut self, rhythm: Rhythm) {
        self.state.current_rhythm = Some(rhythm);
        self.state.cycle_seconds = 0;
        self.append_log(
            format!("Rhythm Check: {}", rhythm),
            format!("心律检查: {}", rhythm),
            LogCategory::Rhythm,
        );
    }

    /// Record an administered drug
    ///
    /// Epinephrine and amiodarone variants update their dosing offsets;
    /// `Drug::Other` only logs.
    pub fn record_drug(&mut self, drug: Drug) {
        match drug {
            Drug::Epinephrine => {
                self.state.last_epi_at = Some(self.state.elapsed_seconds);
            }
            Drug::AmiodaroneFirstDose | Drug::AmiodaroneSecondDose => {
                self.state.last_amio_at = Some(self.state.elapsed_seconds);
            }
            Drug::Other(_) => {}
        }
        self.append_log(drug.label(), drug.label_cn(), LogCategory::Drug);
    }

    /// Record a procedure (airway, line placement, ...); log-only
    pub fn record_procedure(&mut self, action: impl Into<String>, action_cn: impl Into<String>) {
        self.append_log(action, action_cn, LogCategory::Procedure);
    }

    /// Record the preset airway procedure
    pub fn record_airway(&mut self) {
        self.record_procedure("Airway Opened", "开放气道");
    }

    /// End the resuscitation: stops the timer and logs the terminal entry
    ///
    /// The session is not locked out; further records remain legal.
    pub fn end(&mut self) {
        self.state.active = false;
        self.append_log(
            "Resuscitation Ended - Patient Deceased",
            "抢救结束 - 患者死亡",
            LogCategory::Info,
        );
    }
}
