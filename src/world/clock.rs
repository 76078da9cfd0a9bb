use log::warn;

use crate::{
    config::WorldConfig,
    error::{PhysicsError, PhysicsResult},
};

/// How one `step` call divides elapsed wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameTime {
    /// Time since the previous step, as reported by the driver.
    pub elapsed_ms: f64,
    /// Portion of `elapsed_ms` actually simulated.
    pub simulated_ms: f32,
    pub substeps: u32,
    pub substep_ms: f32,
    /// Elapsed time beyond the per-step cap, thrown away.
    pub dropped_ms: f64,
}

/// Tracks the driver's timestamps between steps.
#[derive(Debug, Clone, Copy, Default)]
pub struct StepClock {
    last_step_time: Option<f64>,
}

impl StepClock {
    pub fn last_step_time(&self) -> Option<f64> {
        self.last_step_time
    }

    /// Splits the time since the previous step into equal sub-steps.
    ///
    /// The first call has nothing to measure against and plans no sub-steps.
    pub fn plan(&self, now_ms: f64, config: &WorldConfig) -> PhysicsResult<FrameTime> {
        if !now_ms.is_finite() {
            return Err(PhysicsError::NonFiniteTime(now_ms));
        }
        let Some(last) = self.last_step_time else {
            return Ok(FrameTime::default());
        };
        if now_ms < last {
            return Err(PhysicsError::TimeWentBackwards { now: now_ms, last });
        }

        let elapsed_ms = now_ms - last;
        let cap = f64::from(config.max_frame_ms());
        let simulated = elapsed_ms.min(cap);
        let dropped_ms = elapsed_ms - simulated;
        if dropped_ms > 0.0 {
            warn!("frame of {elapsed_ms:.1} ms clamped to {cap:.1} ms, dropping {dropped_ms:.1} ms");
        }

        let simulated_ms = simulated as f32;
        let substeps = if simulated_ms > 0.0 {
            ((simulated_ms / config.max_substep_ms).ceil() as u32).clamp(1, config.max_substeps)
        } else {
            0
        };
        let substep_ms = if substeps > 0 {
            simulated_ms / substeps as f32
        } else {
            0.0
        };

        Ok(FrameTime {
            elapsed_ms,
            simulated_ms,
            substeps,
            substep_ms,
            dropped_ms,
        })
    }

    pub fn commit(&mut self, now_ms: f64) {
        self.last_step_time = Some(now_ms);
    }
}
