use crate::{
    core::{body::Body, registry::BodyRegistry},
    dynamics::{
        behavior::{Behavior, BehaviorPipeline, BehaviorStage},
        integrator::Integrator,
    },
    error::ConfigError,
};

/// Behaviors and the integrator, run around the collision pipeline.
#[derive(Default)]
pub struct DynamicsManager {
    pub pipeline: BehaviorPipeline,
    pub integrator: Integrator,
}

impl DynamicsManager {
    pub fn new(parallel: bool) -> Self {
        let mut integrator = Integrator::new();
        integrator.set_parallel(parallel);
        Self {
            pipeline: BehaviorPipeline::new(),
            integrator,
        }
    }

    /// Validates `behavior` against the registry before adding it.
    pub fn add_behavior(
        &mut self,
        behavior: Box<dyn Behavior>,
        registry: &BodyRegistry,
    ) -> Result<(), ConfigError> {
        behavior.validate(registry)?;
        self.pipeline.add_boxed(behavior);
        Ok(())
    }

    pub fn validate(&self, registry: &BodyRegistry) -> Result<(), ConfigError> {
        self.pipeline.validate(registry)
    }

    pub fn apply_forces(&self, bodies: &mut [Body], dt: f32) {
        self.pipeline.apply_stage(BehaviorStage::Forces, bodies, dt);
    }

    pub fn integrate(&self, bodies: &mut [Body], dt: f32) {
        self.integrator.step(bodies, dt);
    }

    pub fn apply_constraints(&self, bodies: &mut [Body], dt: f32) {
        self.pipeline
            .apply_stage(BehaviorStage::Constraints, bodies, dt);
    }
}
