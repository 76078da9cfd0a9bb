use std::time::Duration;

use super::logging::PhaseSpan;

/// Phases of a single simulation tick, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepPhase {
    ApplyingBehaviors,
    Integrating,
    BroadPhase,
    NarrowPhase,
}

impl StepPhase {
    pub fn label(self) -> &'static str {
        match self {
            StepPhase::ApplyingBehaviors => "behaviors::apply",
            StepPhase::Integrating => "integrator",
            StepPhase::BroadPhase => "broadphase::pairs",
            StepPhase::NarrowPhase => "narrowphase::resolve",
        }
    }
}

/// Timing and counters gathered over one `World::step` call.
#[derive(Debug, Default, Clone, Copy)]
pub struct StepProfile {
    pub behavior_time: Duration,
    pub integrator_time: Duration,
    pub broad_phase_time: Duration,
    pub narrow_phase_time: Duration,
    pub total_frame_time: Duration,

    pub substeps: u32,
    pub body_count: usize,
    pub candidate_pairs: usize,
    pub contact_count: usize,
}

impl StepProfile {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn slot_mut(&mut self, phase: StepPhase) -> &mut Duration {
        match phase {
            StepPhase::ApplyingBehaviors => &mut self.behavior_time,
            StepPhase::Integrating => &mut self.integrator_time,
            StepPhase::BroadPhase => &mut self.broad_phase_time,
            StepPhase::NarrowPhase => &mut self.narrow_phase_time,
        }
    }

    /// Runs `f`, tracing it as `phase` and adding its duration to the
    /// matching slot.
    pub fn time<R>(&mut self, phase: StepPhase, f: impl FnOnce() -> R) -> R {
        let span = PhaseSpan::enter(phase.label());
        let result = f();
        *self.slot_mut(phase) += span.elapsed();
        result
    }

    /// Logs the profile at debug level.
    pub fn report(&self) {
        let total_us = self.total_frame_time.as_micros() as f32;
        if total_us < 1.0 {
            return;
        }

        log::debug!(
            "step: {} bodies, {} substeps, {} candidates, {} contacts, {:.3} ms",
            self.body_count,
            self.substeps,
            self.candidate_pairs,
            self.contact_count,
            self.total_frame_time.as_secs_f32() * 1000.0
        );
        for (label, duration) in [
            ("behaviors", self.behavior_time),
            ("integrator", self.integrator_time),
            ("broad phase", self.broad_phase_time),
            ("narrow phase", self.narrow_phase_time),
        ] {
            log::debug!(
                "  {label:<12} {:.3} ms ({:.1}%)",
                duration.as_secs_f32() * 1000.0,
                (duration.as_micros() as f32 / total_us) * 100.0
            );
        }
    }
}
