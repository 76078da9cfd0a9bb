//! The simulation container and its stepper.

mod clock;
mod collision_manager;
mod dynamics_manager;

pub use clock::{FrameTime, StepClock};
pub use collision_manager::CollisionManager;
pub use dynamics_manager::DynamicsManager;

use std::time::Instant;

use glam::Vec2;
use log::{debug, error, info};

use crate::{
    collision::{contact::CollisionEvent, queries::Query},
    config::WorldConfig,
    core::{
        body::{Body, BodyDesc},
        registry::BodyRegistry,
        shape::Aabb,
    },
    dynamics::behavior::{Behavior, BehaviorSpec, ConstantAcceleration, EdgeContainment},
    error::{ConfigError, PhysicsError, PhysicsResult},
    utils::{
        allocator::BodyHandle,
        logging::check_step_budget,
        profiling::{StepPhase, StepProfile},
    },
};

/// Summary returned by [`World::step`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StepReport {
    pub frame: FrameTime,
    pub candidate_pairs: usize,
    pub contacts: usize,
    /// Contacts that received an impulse.
    pub resolved: usize,
}

/// A 2D rigid-body world stepped by wall-clock timestamps.
///
/// Bodies are only moved by [`World::step`]; between steps the world is
/// read-only apart from registering and removing bodies and behaviors.
pub struct World {
    registry: BodyRegistry,
    dynamics: DynamicsManager,
    collisions: CollisionManager,
    clock: StepClock,
    config: WorldConfig,
    events: Vec<CollisionEvent>,
    profile: StepProfile,
    needs_validation: bool,
}

impl Default for World {
    fn default() -> Self {
        let config = WorldConfig::default();
        Self::with_valid_config(config)
    }
}

impl World {
    pub fn new(config: WorldConfig) -> PhysicsResult<Self> {
        config.validate()?;
        Ok(Self::with_valid_config(config))
    }

    fn with_valid_config(config: WorldConfig) -> Self {
        info!(
            "world created: max substep {:.3} ms x {}, parallel: {}",
            config.max_substep_ms, config.max_substeps, config.parallel
        );
        Self {
            registry: BodyRegistry::new(),
            dynamics: DynamicsManager::new(config.parallel),
            collisions: CollisionManager::new(config.parallel),
            clock: StepClock::default(),
            config,
            events: Vec::new(),
            profile: StepProfile::default(),
            needs_validation: false,
        }
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn add_body(&mut self, desc: BodyDesc) -> PhysicsResult<BodyHandle> {
        let body = desc.build()?;
        let handle = self.registry.add(body)?;
        self.needs_validation = true;
        Ok(handle)
    }

    pub fn remove_body(&mut self, handle: BodyHandle) -> PhysicsResult<Body> {
        let body = self.registry.remove(handle)?;
        self.needs_validation = true;
        Ok(body)
    }

    /// Adds a built-in behavior, validating it against the current bodies.
    pub fn add_behavior(&mut self, spec: BehaviorSpec) -> PhysicsResult<()> {
        debug!("adding behavior '{}'", spec.name());
        match spec {
            BehaviorSpec::ConstantAcceleration(config) => {
                let behavior = ConstantAcceleration::new(config)?;
                self.dynamics
                    .add_behavior(Box::new(behavior), &self.registry)?;
            }
            BehaviorSpec::EdgeContainment(config) => {
                let behavior = EdgeContainment::new(
                    config,
                    self.config.restitution_rule,
                    self.config.friction_rule,
                )?;
                self.dynamics
                    .add_behavior(Box::new(behavior), &self.registry)?;
            }
            BehaviorSpec::BodyCollisionDetection(config) => {
                self.collisions.enable_detection(config, &self.registry)?;
            }
            BehaviorSpec::BodyImpulseResponse(config) => {
                self.collisions.enable_response(config, &self.config)?;
            }
            BehaviorSpec::SweepPrune(config) => self.collisions.use_sweep_and_prune(config),
        }
        Ok(())
    }

    pub fn add_custom_behavior<B: Behavior + 'static>(&mut self, behavior: B) -> PhysicsResult<()> {
        self.dynamics
            .add_behavior(Box::new(behavior), &self.registry)?;
        Ok(())
    }

    /// Re-checks every behavior against the current bodies.
    ///
    /// Runs automatically before the first step after bodies were added or
    /// removed.
    pub fn validate(&mut self) -> PhysicsResult<()> {
        self.dynamics.validate(&self.registry)?;
        self.collisions.validate(&self.registry)?;
        self.needs_validation = false;
        Ok(())
    }

    /// Advances the simulation to the driver timestamp `now_ms`.
    ///
    /// On error no body, event or clock state changes.
    pub fn step(&mut self, now_ms: f64) -> PhysicsResult<StepReport> {
        let frame_start = Instant::now();
        let frame = self.clock.plan(now_ms, &self.config)?;
        if self.needs_validation {
            self.validate()?;
        }

        let mut profile = StepProfile {
            substeps: frame.substeps,
            body_count: self.registry.len(),
            ..StepProfile::default()
        };
        let mut report = StepReport {
            frame,
            ..StepReport::default()
        };
        let mut events = Vec::new();

        if frame.substeps > 0 {
            let mut working = self.registry.snapshot();
            for _ in 0..frame.substeps {
                self.substep(&mut working, frame.substep_ms, &mut profile, &mut report, &mut events)?;
            }
            self.registry.commit(&working);
        }

        self.clock.commit(now_ms);
        self.events = events;

        profile.contact_count = report.contacts;
        profile.candidate_pairs = report.candidate_pairs;
        profile.total_frame_time = frame_start.elapsed();
        profile.report();
        check_step_budget(profile.total_frame_time, self.config.step_budget_ms);
        self.profile = profile;

        Ok(report)
    }

    fn substep(
        &mut self,
        bodies: &mut [Body],
        dt: f32,
        profile: &mut StepProfile,
        report: &mut StepReport,
        events: &mut Vec<CollisionEvent>,
    ) -> PhysicsResult<()> {
        let dynamics = &self.dynamics;
        profile.time(StepPhase::ApplyingBehaviors, || {
            dynamics.apply_forces(bodies, dt)
        });
        profile.time(StepPhase::Integrating, || dynamics.integrate(bodies, dt));

        if self.collisions.is_detecting() {
            let collisions = &mut self.collisions;
            let pairs = profile.time(StepPhase::BroadPhase, || collisions.candidate_pairs(bodies));
            report.candidate_pairs += pairs.len();

            let collisions = &self.collisions;
            let (contacts, resolved) =
                profile.time(StepPhase::NarrowPhase, || -> Result<_, ConfigError> {
                    let contacts = collisions.detect(bodies, &pairs)?;
                    let resolved = collisions.resolve(bodies, &contacts);
                    Ok((contacts, resolved))
                })?;
            report.contacts += contacts.len();
            report.resolved += resolved;
            events.extend(contacts.iter().map(|pair| {
                CollisionEvent::new(
                    bodies[pair.a].handle(),
                    bodies[pair.b].handle(),
                    &pair.contact,
                )
            }));
        }

        let dynamics = &self.dynamics;
        profile.time(StepPhase::ApplyingBehaviors, || {
            dynamics.apply_constraints(bodies, dt)
        });

        if let Some(body) = bodies.iter().find(|body| !body.is_finite()) {
            error!("body {} became non-finite; discarding step", body.handle());
            return Err(PhysicsError::NonFiniteState(body.handle()));
        }
        Ok(())
    }

    pub fn body(&self, handle: BodyHandle) -> PhysicsResult<&Body> {
        Ok(self.registry.get(handle)?)
    }

    pub fn bodies(&self) -> impl Iterator<Item = &Body> + '_ {
        self.registry.iter()
    }

    pub fn for_each_body<F>(&self, visitor: F)
    where
        F: FnMut(&Body),
    {
        self.registry.for_each(visitor);
    }

    pub fn body_count(&self) -> usize {
        self.registry.len()
    }

    pub fn registry(&self) -> &BodyRegistry {
        &self.registry
    }

    /// Timestamp of the last successful step, if any.
    pub fn last_step_time(&self) -> Option<f64> {
        self.clock.last_step_time()
    }

    /// Contacts found during the last step, in resolution order.
    pub fn collisions(&self) -> &[CollisionEvent] {
        &self.events
    }

    pub fn profile(&self) -> &StepProfile {
        &self.profile
    }

    pub fn behavior_names(&self) -> Vec<&'static str> {
        self.dynamics.pipeline.names()
    }

    pub fn collision_manager(&self) -> &CollisionManager {
        &self.collisions
    }

    /// Bodies whose shape contains `point`.
    pub fn bodies_at(&self, point: Vec2) -> Vec<BodyHandle> {
        Query::point(&self.registry, point)
    }

    /// Bodies whose bounding box overlaps `region`.
    pub fn bodies_in(&self, region: &Aabb) -> Vec<BodyHandle> {
        Query::region(&self.registry, region)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RegistryError;

    #[test]
    fn invalid_config_is_rejected() {
        let config = WorldConfig {
            max_substeps: 0,
            ..WorldConfig::default()
        };
        assert!(matches!(
            World::new(config),
            Err(PhysicsError::Config(ConfigError::InvalidWorldSetting { .. }))
        ));
    }

    #[test]
    fn failed_step_leaves_clock_untouched() {
        let mut world = World::default();
        world.step(100.0).unwrap();
        assert!(world.step(50.0).is_err());
        assert_eq!(world.last_step_time(), Some(100.0));
    }

    #[test]
    fn removed_body_is_gone() {
        let mut world = World::default();
        let handle = world.add_body(BodyDesc::circle(1.0)).unwrap();
        world.remove_body(handle).unwrap();
        assert_eq!(
            world.body(handle).unwrap_err(),
            PhysicsError::Registry(RegistryError::NotFound(handle))
        );
        assert_eq!(world.body_count(), 0);
    }

    #[test]
    fn lazy_validation_catches_late_bodies() {
        let mut world = World::default();
        world.add_behavior(BehaviorSpec::collision_detection()).unwrap();
        world.add_body(BodyDesc::point()).unwrap();
        world.add_body(BodyDesc::point().position(3.0, 0.0)).unwrap();

        world.step(0.0).unwrap_err();
        assert_eq!(world.last_step_time(), None);
    }

    #[test]
    fn first_step_moves_nothing() {
        let mut world = World::default();
        let handle = world
            .add_body(BodyDesc::circle(1.0).velocity(1.0, 1.0))
            .unwrap();
        let report = world.step(500.0).unwrap();
        assert_eq!(report.frame.substeps, 0);
        assert_eq!(world.body(handle).unwrap().position(), Vec2::ZERO);
    }
}
