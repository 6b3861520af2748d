//! Core domain types for the ACLS resuscitation assistant.
//!
//! This module defines the fundamental types used throughout the system:
//! - Cardiac rhythms and their clinical labels
//! - Drugs and their dosing classes
//! - Log entries (append-only event record)
//! - Advisories produced by the rule engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Rhythm Types
// ============================================================================

/// Cardiac rhythm as classified at a rhythm check
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Rhythm {
    #[serde(rename = "VF")]
    Vf,
    #[serde(rename = "pVT")]
    Pvt,
    #[serde(rename = "PEA")]
    Pea,
    Asystole,
    #[serde(rename = "ROSC")]
    Rosc,
}

impl Rhythm {
    /// Clinical label used in logs and reports
    pub fn label(&self) -> &'static str {
        match self {
            Rhythm::Vf => "VF",
            Rhythm::Pvt => "pVT",
            Rhythm::Pea => "PEA",
            Rhythm::Asystole => "Asystole",
            Rhythm::Rosc => "ROSC",
        }
    }

    /// Whether this rhythm is treated with defibrillation
    pub fn shockable(&self) -> bool {
        matches!(self, Rhythm::Vf | Rhythm::Pvt)
    }
}

impl fmt::Display for Rhythm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Rhythm {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_lowercase().as_str() {
            "vf" => Ok(Rhythm::Vf),
            "pvt" => Ok(Rhythm::Pvt),
            "pea" => Ok(Rhythm::Pea),
            "asystole" => Ok(Rhythm::Asystole),
            "rosc" => Ok(Rhythm::Rosc),
            _ => Err(crate::Error::UnknownRhythm(s.to_string())),
        }
    }
}

// ============================================================================
// Drug Types
// ============================================================================

/// Administered drug, tagged by dosing class
///
/// An explicit enum rather than free-text matching: only the epinephrine
/// and amiodarone variants update dosing timestamps, `Other` is log-only.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Drug {
    Epinephrine,
    AmiodaroneFirstDose,
    AmiodaroneSecondDose,
    Other(String),
}

impl Drug {
    /// Log label (English)
    pub fn label(&self) -> String {
        match self {
            Drug::Epinephrine => "Epinephrine 1mg".into(),
            Drug::AmiodaroneFirstDose => "Amiodarone 300mg".into(),
            Drug::AmiodaroneSecondDose => "Amiodarone 150mg".into(),
            Drug::Other(name) => name.clone(),
        }
    }

    /// Log label (Chinese)
    pub fn label_cn(&self) -> String {
        match self {
            Drug::Epinephrine => "肾上腺素 1mg".into(),
            Drug::AmiodaroneFirstDose => "胺碘酮 300mg".into(),
            Drug::AmiodaroneSecondDose => "胺碘酮 150mg".into(),
            Drug::Other(name) => name.clone(),
        }
    }
}

// ============================================================================
// Log Types
// ============================================================================

/// Category of a recorded event
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogCategory {
    Info,
    Procedure,
    Drug,
    Shock,
    Rhythm,
}

impl LogCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogCategory::Info => "info",
            LogCategory::Procedure => "procedure",
            LogCategory::Drug => "drug",
            LogCategory::Shock => "shock",
            LogCategory::Rhythm => "rhythm",
        }
    }
}

/// One recorded event; immutable once appended
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: Uuid,
    /// Wall-clock time at record
    pub timestamp: DateTime<Utc>,
    /// Elapsed resuscitation seconds at record
    pub time_offset: u32,
    pub action: String,
    pub action_cn: String,
    pub category: LogCategory,
}

// ============================================================================
// Advisory Types
// ============================================================================

/// A single prompt produced by the rule engine
///
/// Advisories are recomputed wholesale on every evaluation and never
/// persisted; the text is static protocol wording.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Advisory {
    pub message: &'static str,
    pub message_cn: &'static str,
    pub urgent: bool,
}

/// Result of one rule-engine evaluation
///
/// `Idle` is a distinct render mode for a session that has never started,
/// not an advisory. An empty `Advisories` list during an active session
/// means the consumer should render its static continue-CPR guidance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Evaluation {
    Idle,
    Advisories(Vec<Advisory>),
}

impl Evaluation {
    /// Advisory list, empty for idle
    pub fn advisories(&self) -> &[Advisory] {
        match self {
            Evaluation::Idle => &[],
            Evaluation::Advisories(list) => list,
        }
    }
}

// ============================================================================
// Checklist Types
// ============================================================================

/// One entry of the Hs & Ts reversible-causes checklist
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HsAndTsItem {
    pub en: &'static str,
    pub cn: &'static str,
}

/// Display descriptor for a rhythm button/option
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RhythmOption {
    pub rhythm: Rhythm,
    pub label: &'static str,
    pub sub_cn: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rhythm_labels_roundtrip() {
        for rhythm in [
            Rhythm::Vf,
            Rhythm::Pvt,
            Rhythm::Pea,
            Rhythm::Asystole,
            Rhythm::Rosc,
        ] {
            let parsed: Rhythm = rhythm.label().parse().unwrap();
            assert_eq!(parsed, rhythm);
        }
    }

    #[test]
    fn test_rhythm_parse_unknown() {
        assert!("sinus".parse::<Rhythm>().is_err());
    }

    #[test]
    fn test_shockable_classification() {
        assert!(Rhythm::Vf.shockable());
        assert!(Rhythm::Pvt.shockable());
        assert!(!Rhythm::Pea.shockable());
        assert!(!Rhythm::Asystole.shockable());
        assert!(!Rhythm::Rosc.shockable());
    }

    #[test]
    fn test_drug_labels() {
        assert_eq!(Drug::Epinephrine.label(), "Epinephrine 1mg");
        assert_eq!(Drug::AmiodaroneFirstDose.label(), "Amiodarone 300mg");
        assert_eq!(Drug::AmiodaroneSecondDose.label(), "Amiodarone 150mg");
        assert_eq!(Drug::Other("Atropine 1mg".into()).label(), "Atropine 1mg");
    }
}
