#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::core::{body::Body, types::Motion};

/// Advances positions and orientations from the current velocities.
///
/// Velocities are updated beforehand by force behaviors, so one sub-step is
/// a semi-implicit Euler step.
#[derive(Debug, Clone, Default)]
pub struct Integrator {
    parallel: bool,
}

impl Integrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses the rayon pool when the `parallel` feature is enabled.
    pub fn set_parallel(&mut self, enabled: bool) {
        self.parallel = enabled;
    }

    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    pub fn integrate_body(body: &mut Body, dt: f32) {
        if body.motion() == Motion::Static {
            return;
        }
        body.set_position(body.position() + body.velocity() * dt);
        body.set_angle(body.angle() + body.angular_velocity() * dt);
    }

    pub fn step(&self, bodies: &mut [Body], dt: f32) {
        #[cfg(feature = "parallel")]
        if self.parallel {
            bodies
                .par_iter_mut()
                .for_each(|body| Self::integrate_body(body, dt));
            return;
        }

        for body in bodies.iter_mut() {
            Self::integrate_body(body, dt);
        }
    }
}
