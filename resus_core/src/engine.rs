//! Advisory rule engine.
//!
//! `evaluate` is a pure function of the current state: same input, same
//! output, no hidden state. It is recomputed wholesale after every state
//! change; advisories are never diffed or suppressed, so a standing
//! condition (e.g. an expired cycle) keeps its prompt visible until the
//! state changes.
//!
//! Rule order is display order:
//! 1. Idle guard (never-started sessions get a distinct ready mode)
//! 2. Cycle boundary (2-minute rhythm check + compressor switch)
//! 3. Rhythm branch (shockable vs non-shockable)
//! 4. Epinephrine timing

use crate::state::ResusState;
use crate::types::{Advisory, Evaluation, Rhythm};

/// Cycle length after which a rhythm check is due
pub const CYCLE_ALERT_SECONDS: u32 = 120;
/// Post-rhythm-check window for the resume-compressions reminder
pub const RESUME_CPR_WINDOW_SECONDS: u32 = 10;
/// Minimum interval between epinephrine doses
pub const EPI_REDOSE_SECONDS: u32 = 180;
/// Interval after which a repeat amiodarone dose would be reconsidered
pub const AMIO_RECONSIDER_SECONDS: u32 = 300;
/// Shocks delivered before amiodarone is suggested
pub const AMIO_SHOCK_THRESHOLD: u32 = 3;

const CHECK_RHYTHM: Advisory = Advisory {
    message: "CHECK RHYTHM & PULSE",
    message_cn: "检查心律和脉搏",
    urgent: true,
};

const SWITCH_COMPRESSOR: Advisory = Advisory {
    message: "SWITCH COMPRESSOR",
    message_cn: "交换按压人员",
    urgent: true,
};

const FIRST_SHOCK: Advisory = Advisory {
    message: "SHOCK 1 - 120-200J Biphasic",
    message_cn: "第一次除颤 - 120-200J 双相波",
    urgent: true,
};

const RESUME_CPR: Advisory = Advisory {
    message: "RESUME CPR IMMEDIATELY",
    message_cn: "立即继续按压",
    urgent: false,
};

const CONSIDER_AMIODARONE: Advisory = Advisory {
    message: "CONSIDER AMIODARONE 300mg",
    message_cn: "考虑胺碘酮 300mg",
    urgent: false,
};

const NO_SHOCK: Advisory = Advisory {
    message: "NO SHOCK - CPR ONLY",
    message_cn: "不可除颤 - 持续按压",
    urgent: false,
};

const FIRST_EPINEPHRINE: Advisory = Advisory {
    message: "ADMINISTER EPINEPHRINE 1mg",
    message_cn: "给予肾上腺素 1mg",
    urgent: true,
};

const REDOSE_EPINEPHRINE: Advisory = Advisory {
    message: "GIVE EPINEPHRINE NOW (q3-5m)",
    message_cn: "立即给予肾上腺素 (每3-5分钟)",
    urgent: true,
};

/// Evaluate the current state into its display mode
///
/// Returns `Evaluation::Idle` for a session that has never started, and
/// the ordered advisory list otherwise. An empty list for an active
/// session means "continue high-quality CPR" (rendered by the consumer).
pub fn evaluate(state: &ResusState) -> Evaluation {
    if !state.active && state.elapsed_seconds == 0 {
        return Evaluation::Idle;
    }

    let mut advisories = Vec::new();

    if state.cycle_seconds >= CYCLE_ALERT_SECONDS {
        advisories.push(CHECK_RHYTHM);
        advisories.push(SWITCH_COMPRESSOR);
    }

    match state.current_rhythm {
        Some(rhythm) if rhythm.shockable() => {
            if state.shock_count == 0 {
                advisories.push(FIRST_SHOCK);
            } else if state.cycle_seconds < RESUME_CPR_WINDOW_SECONDS {
                advisories.push(RESUME_CPR);
            }

            // Single-occurrence suggestion: once any amiodarone dose
            // exists the time-since clause can no longer be reached.
            if state.shock_count >= AMIO_SHOCK_THRESHOLD
                && state.last_amio_at.is_none()
                && time_since(state.elapsed_seconds, state.last_amio_at)
                    .map_or(true, |s| s > AMIO_RECONSIDER_SECONDS)
            {
                advisories.push(CONSIDER_AMIODARONE);
            }
        }
        Some(Rhythm::Pea) | Some(Rhythm::Asystole) => {
            advisories.push(NO_SHOCK);
        }
        _ => {}
    }

    if let Some(rhythm) = state.current_rhythm {
        if rhythm != Rhythm::Rosc {
            match time_since(state.elapsed_seconds, state.last_epi_at) {
                None => advisories.push(FIRST_EPINEPHRINE),
                Some(since) if since >= EPI_REDOSE_SECONDS => {
                    advisories.push(REDOSE_EPINEPHRINE)
                }
                Some(_) => {}
            }
        }
    }

    tracing::debug!(
        count = advisories.len(),
        cycle = state.cycle_seconds,
        rhythm = ?state.current_rhythm,
        "evaluated advisories"
    );

    Evaluation::Advisories(advisories)
}

/// Seconds since a recorded elapsed-time offset, `None` if never recorded
fn time_since(elapsed: u32, recorded_at: Option<u32>) -> Option<u32> {
    recorded_at.map(|at| elapsed.saturating_sub(at))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active_state() -> ResusState {
        ResusState {
            active: true,
            elapsed_seconds: 60,
            cycle_seconds: 60,
            ..Default::default()
        }
    }

    fn messages(eval: &Evaluation) -> Vec<&'static str> {
        eval.advisories().iter().map(|a| a.message).collect()
    }

    #[test]
    fn test_never_started_is_idle() {
        let state = ResusState::default();
        assert_eq!(evaluate(&state), Evaluation::Idle);
    }

    #[test]
    fn test_paused_session_is_not_idle() {
        let state = ResusState {
            active: false,
            elapsed_seconds: 30,
            ..Default::default()
        };
        assert!(matches!(evaluate(&state), Evaluation::Advisories(_)));
    }

    #[test]
    fn test_active_no_rhythm_yields_empty_list() {
        let state = active_state();
        assert_eq!(evaluate(&state), Evaluation::Advisories(vec![]));
    }

    #[test]
    fn test_cycle_boundary_emits_urgent_pair() {
        let mut state = active_state();
        state.elapsed_seconds = 125;
        state.cycle_seconds = 125;

        let eval = evaluate(&state);
        let msgs = messages(&eval);
        assert_eq!(msgs, vec!["CHECK RHYTHM & PULSE", "SWITCH COMPRESSOR"]);
        assert!(eval.advisories().iter().all(|a| a.urgent));
    }

    #[test]
    fn test_cycle_boundary_persists_until_reset() {
        let mut state = active_state();
        state.cycle_seconds = 300;
        assert!(messages(&evaluate(&state)).contains(&"CHECK RHYTHM & PULSE"));

        state.cycle_seconds = 0;
        assert!(!messages(&evaluate(&state)).contains(&"CHECK RHYTHM & PULSE"));
    }

    #[test]
    fn test_vf_first_shock_is_first_and_urgent() {
        let mut state = active_state();
        state.current_rhythm = Some(Rhythm::Vf);
        state.cycle_seconds = 30;

        let eval = evaluate(&state);
        let first = eval.advisories().first().copied().unwrap();
        assert_eq!(first.message, "SHOCK 1 - 120-200J Biphasic");
        assert!(first.urgent);
    }

    #[test]
    fn test_resume_cpr_window_after_shock() {
        let mut state = active_state();
        state.current_rhythm = Some(Rhythm::Pvt);
        state.shock_count = 1;
        state.cycle_seconds = 5;

        let eval = evaluate(&state);
        let resume = eval
            .advisories()
            .iter()
            .find(|a| a.message == "RESUME CPR IMMEDIATELY")
            .copied()
            .unwrap();
        assert!(!resume.urgent);

        // Window closed at 10s
        state.cycle_seconds = 10;
        assert!(!messages(&evaluate(&state)).contains(&"RESUME CPR IMMEDIATELY"));
    }

    #[test]
    fn test_amiodarone_suggested_after_three_shocks() {
        let mut state = active_state();
        state.current_rhythm = Some(Rhythm::Vf);
        state.shock_count = 3;
        state.cycle_seconds = 30;

        assert!(messages(&evaluate(&state)).contains(&"CONSIDER AMIODARONE 300mg"));

        state.shock_count = 2;
        assert!(!messages(&evaluate(&state)).contains(&"CONSIDER AMIODARONE 300mg"));
    }

    #[test]
    fn test_amiodarone_never_suggested_once_given() {
        let mut state = active_state();
        state.current_rhythm = Some(Rhythm::Vf);
        state.shock_count = 5;
        state.elapsed_seconds = 1000;
        state.cycle_seconds = 30;
        state.last_amio_at = Some(0);

        // Single-occurrence: well past 300s since the dose, still silent
        assert!(!messages(&evaluate(&state)).contains(&"CONSIDER AMIODARONE 300mg"));
    }

    #[test]
    fn test_pea_never_gets_shock_advisory() {
        let mut state = active_state();
        state.current_rhythm = Some(Rhythm::Pea);
        state.cycle_seconds = 30;

        for shocks in [0, 1, 4] {
            state.shock_count = shocks;
            let msgs = messages(&evaluate(&state));
            assert!(!msgs.contains(&"SHOCK 1 - 120-200J Biphasic"));
            assert!(msgs.contains(&"NO SHOCK - CPR ONLY"));
        }
    }

    #[test]
    fn test_asystole_non_shockable_advisory() {
        let mut state = active_state();
        state.current_rhythm = Some(Rhythm::Asystole);
        state.cycle_seconds = 30;
        assert!(messages(&evaluate(&state)).contains(&"NO SHOCK - CPR ONLY"));
    }

    #[test]
    fn test_first_epinephrine_urgent_when_never_given() {
        let mut state = active_state();
        state.current_rhythm = Some(Rhythm::Vf);
        state.cycle_seconds = 30;

        let eval = evaluate(&state);
        let epi = eval
            .advisories()
            .iter()
            .find(|a| a.message == "ADMINISTER EPINEPHRINE 1mg")
            .copied()
            .unwrap();
        assert!(epi.urgent);
    }

    #[test]
    fn test_epinephrine_redose_boundary() {
        let mut state = active_state();
        state.current_rhythm = Some(Rhythm::Vf);
        state.shock_count = 1;
        state.elapsed_seconds = 400;
        state.cycle_seconds = 30;

        // 179s since last dose: inside the window, no advisory
        state.last_epi_at = Some(400 - 179);
        let msgs = messages(&evaluate(&state));
        assert!(!msgs.iter().any(|m| m.contains("EPINEPHRINE")));

        // 180s: redose due
        state.last_epi_at = Some(400 - 180);
        assert!(messages(&evaluate(&state)).contains(&"GIVE EPINEPHRINE NOW (q3-5m)"));
    }

    #[test]
    fn test_rosc_suppresses_epinephrine() {
        let mut state = active_state();
        state.current_rhythm = Some(Rhythm::Rosc);
        state.cycle_seconds = 30;
        assert_eq!(evaluate(&state), Evaluation::Advisories(vec![]));
    }

    #[test]
    fn test_scenario_cycle_125_with_vf() {
        let mut state = active_state();
        state.current_rhythm = Some(Rhythm::Vf);
        state.elapsed_seconds = 125;
        state.cycle_seconds = 125;

        let msgs = messages(&evaluate(&state));
        assert_eq!(
            msgs,
            vec![
                "CHECK RHYTHM & PULSE",
                "SWITCH COMPRESSOR",
                "SHOCK 1 - 120-200J Biphasic",
                "ADMINISTER EPINEPHRINE 1mg",
            ]
        );
    }

    #[test]
    fn test_determinism() {
        let mut state = active_state();
        state.current_rhythm = Some(Rhythm::Vf);
        state.shock_count = 3;
        state.cycle_seconds = 125;

        let first = evaluate(&state);
        for _ in 0..5 {
            assert_eq!(evaluate(&state), first);
        }
    }
}
