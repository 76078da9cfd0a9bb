use log::{log_enabled, trace, warn, Level};
use std::time::{Duration, Instant};

/// Trace span around one stepper phase.
///
/// Emits `enter`/`leave` records at trace level; the measured time is read
/// back with [`PhaseSpan::elapsed`] by the profile.
pub struct PhaseSpan {
    phase: &'static str,
    entered: Instant,
}

impl PhaseSpan {
    pub fn enter(phase: &'static str) -> Self {
        if log_enabled!(Level::Trace) {
            trace!("enter {phase}");
        }
        Self {
            phase,
            entered: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.entered.elapsed()
    }
}

impl Drop for PhaseSpan {
    fn drop(&mut self) {
        if log_enabled!(Level::Trace) {
            trace!("leave {} after {} µs", self.phase, self.elapsed().as_micros());
        }
    }
}

/// Warns when computing one `step` took longer than `budget_ms` of wall-clock
/// time. Returns whether the budget was exceeded; no budget never warns.
pub fn check_step_budget(compute: Duration, budget_ms: Option<f32>) -> bool {
    let Some(budget_ms) = budget_ms else {
        return false;
    };
    let spent_ms = compute.as_secs_f64() * 1000.0;
    if spent_ms <= f64::from(budget_ms) {
        return false;
    }
    warn!("step took {spent_ms:.2} ms to compute, budget is {budget_ms:.2} ms");
    true
}
