//! World-level rules applied to bodies every sub-step.
//!
//! A [`Behavior`] runs either before integration ([`BehaviorStage::Forces`])
//! or after collision resolution ([`BehaviorStage::Constraints`]). Built-in
//! behaviors are described by serde-friendly config structs and assembled
//! through [`BehaviorSpec`].

use glam::Vec2;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    collision::broadphase::SweepAxis,
    config::{DEFAULT_FRICTION, DEFAULT_RESTITUTION},
    core::{
        body::Body,
        registry::BodyRegistry,
        shape::Aabb,
        types::{CombineRule, Material},
    },
    error::ConfigError,
    utils::allocator::BodyHandle,
};

/// When a behavior runs within a sub-step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BehaviorStage {
    /// Before integration: changes velocities.
    Forces,
    /// After collision resolution: enforces positional constraints.
    Constraints,
}

/// Which bodies a behavior acts on.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BehaviorTarget {
    #[default]
    All,
    Only(Vec<BodyHandle>),
}

impl BehaviorTarget {
    pub fn includes(&self, handle: BodyHandle) -> bool {
        match self {
            BehaviorTarget::All => true,
            BehaviorTarget::Only(handles) => handles.contains(&handle),
        }
    }

    /// Handles named explicitly; empty for [`BehaviorTarget::All`].
    pub fn explicit(&self) -> &[BodyHandle] {
        match self {
            BehaviorTarget::All => &[],
            BehaviorTarget::Only(handles) => handles,
        }
    }

    /// Checks that every explicit handle was issued by the registry and, when
    /// `require_dynamic` is set, that it refers to a dynamic body.
    pub fn validate(
        &self,
        behavior: &'static str,
        registry: &BodyRegistry,
        require_dynamic: bool,
    ) -> Result<(), ConfigError> {
        for &handle in self.explicit() {
            if !registry.was_issued(handle) {
                return Err(ConfigError::UnknownTarget { behavior, handle });
            }
            if let Ok(body) = registry.get(handle) {
                if require_dynamic && body.is_immovable() {
                    return Err(ConfigError::ImmovableTarget { behavior, handle });
                }
            }
        }
        Ok(())
    }
}

/// A rule applied to the working set of bodies every sub-step.
pub trait Behavior: Send + Sync {
    fn name(&self) -> &'static str;

    fn stage(&self) -> BehaviorStage {
        BehaviorStage::Forces
    }

    /// Checks the behavior against the current registry contents.
    fn validate(&self, _registry: &BodyRegistry) -> Result<(), ConfigError> {
        Ok(())
    }

    fn apply(&self, bodies: &mut [Body], dt: f32);
}

/// Ordered collection of behaviors.
#[derive(Default)]
pub struct BehaviorPipeline {
    behaviors: Vec<Box<dyn Behavior>>,
}

impl BehaviorPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<B: Behavior + 'static>(&mut self, behavior: B) {
        self.add_boxed(Box::new(behavior));
    }

    pub fn add_boxed(&mut self, behavior: Box<dyn Behavior>) {
        debug!(
            "added behavior '{}' ({:?} stage)",
            behavior.name(),
            behavior.stage()
        );
        self.behaviors.push(behavior);
    }

    pub fn validate(&self, registry: &BodyRegistry) -> Result<(), ConfigError> {
        self.behaviors
            .iter()
            .try_for_each(|behavior| behavior.validate(registry))
    }

    /// Runs every behavior of `stage`, in insertion order.
    pub fn apply_stage(&self, stage: BehaviorStage, bodies: &mut [Body], dt: f32) {
        for behavior in self.behaviors.iter().filter(|b| b.stage() == stage) {
            behavior.apply(bodies, dt);
        }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.behaviors.iter().map(|b| b.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.behaviors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.behaviors.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstantAccelerationConfig {
    /// Acceleration in world units per ms².
    pub acceleration: Vec2,
    pub target: BehaviorTarget,
}

/// Uniform acceleration (gravity) applied to dynamic bodies.
#[derive(Debug, Clone)]
pub struct ConstantAcceleration {
    acceleration: Vec2,
    target: BehaviorTarget,
}

impl ConstantAcceleration {
    pub const NAME: &'static str = "constant-acceleration";

    pub fn new(config: ConstantAccelerationConfig) -> Result<Self, ConfigError> {
        if !config.acceleration.is_finite() {
            return Err(ConfigError::NonFinite("acceleration"));
        }
        Ok(Self {
            acceleration: config.acceleration,
            target: config.target,
        })
    }

    pub fn acceleration(&self) -> Vec2 {
        self.acceleration
    }
}

impl Behavior for ConstantAcceleration {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn validate(&self, registry: &BodyRegistry) -> Result<(), ConfigError> {
        self.target.validate(Self::NAME, registry, true)
    }

    fn apply(&self, bodies: &mut [Body], dt: f32) {
        let delta = self.acceleration * dt;
        for body in bodies
            .iter_mut()
            .filter(|b| b.is_dynamic() && self.target.includes(b.handle()))
        {
            body.set_velocity(body.velocity() + delta);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeContainmentConfig {
    pub bounds: Aabb,
    pub restitution: f32,
    pub friction: f32,
    pub target: BehaviorTarget,
}

impl Default for EdgeContainmentConfig {
    fn default() -> Self {
        Self {
            bounds: Aabb::from_min_max(0.0, 0.0, 0.0, 0.0),
            restitution: DEFAULT_RESTITUTION,
            friction: DEFAULT_FRICTION,
            target: BehaviorTarget::All,
        }
    }
}

/// Keeps dynamic bodies inside an axis-aligned box and bounces them off its
/// walls.
#[derive(Debug, Clone)]
pub struct EdgeContainment {
    bounds: Aabb,
    material: Material,
    target: BehaviorTarget,
    restitution_rule: CombineRule,
    friction_rule: CombineRule,
}

impl EdgeContainment {
    pub const NAME: &'static str = "edge-containment";

    pub fn new(
        config: EdgeContainmentConfig,
        restitution_rule: CombineRule,
        friction_rule: CombineRule,
    ) -> Result<Self, ConfigError> {
        let bounds = config.bounds;
        if !bounds.is_finite() {
            return Err(ConfigError::InvalidBounds(format!(
                "bounds must be finite, got {bounds:?}"
            )));
        }
        if bounds.min.x >= bounds.max.x || bounds.min.y >= bounds.max.y {
            return Err(ConfigError::InvalidBounds(format!(
                "bounds must have positive extent, got {bounds:?}"
            )));
        }

        let material = Material::new(config.restitution, config.friction);
        material.validate()?;

        Ok(Self {
            bounds,
            material,
            target: config.target,
            restitution_rule,
            friction_rule,
        })
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    fn contain(&self, body: &mut Body) {
        let aabb = body.aabb();
        let mut position = body.position();
        let mut velocity = body.velocity();
        let restitution = self
            .restitution_rule
            .combine(self.material.restitution, body.restitution());
        let friction = self
            .friction_rule
            .combine(self.material.friction, body.friction());

        for axis in 0..2 {
            let below = self.bounds.min[axis] - aabb.min[axis];
            let above = aabb.max[axis] - self.bounds.max[axis];

            // Touching a wall counts; the velocity only changes when it
            // points into that wall.
            if below >= 0.0 {
                position[axis] += below;
                if velocity[axis] < 0.0 {
                    bounce(&mut velocity, axis, restitution, friction);
                }
            } else if above >= 0.0 {
                position[axis] -= above;
                if velocity[axis] > 0.0 {
                    bounce(&mut velocity, axis, restitution, friction);
                }
            }
        }

        body.set_position(position);
        body.set_velocity(velocity);
    }
}

/// Reflects the normal component and applies Coulomb friction to the other one.
fn bounce(velocity: &mut Vec2, axis: usize, restitution: f32, friction: f32) {
    let normal_speed = velocity[axis].abs();
    velocity[axis] = -velocity[axis] * restitution;

    let tangent = 1 - axis;
    let tangential = velocity[tangent];
    let reduction = (friction * (1.0 + restitution) * normal_speed).min(tangential.abs());
    velocity[tangent] = tangential - reduction.copysign(tangential);
}

impl Behavior for EdgeContainment {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn stage(&self) -> BehaviorStage {
        BehaviorStage::Constraints
    }

    fn validate(&self, registry: &BodyRegistry) -> Result<(), ConfigError> {
        self.target.validate(Self::NAME, registry, true)?;

        let size = self.bounds.size();
        let room = size.x.min(size.y);
        for body in registry
            .iter()
            .filter(|b| b.is_dynamic() && self.target.includes(b.handle()))
        {
            let diameter = 2.0 * body.shape().bounding_radius();
            if diameter > room {
                return Err(ConfigError::BodyExceedsBounds {
                    behavior: Self::NAME,
                    handle: body.handle(),
                    diameter,
                });
            }
        }
        Ok(())
    }

    fn apply(&self, bodies: &mut [Body], _dt: f32) {
        for body in bodies
            .iter_mut()
            .filter(|b| b.is_dynamic() && self.target.includes(b.handle()))
        {
            self.contain(body);
        }
    }
}

/// Which bodies take part in collision detection.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionDetectionConfig {
    pub target: BehaviorTarget,
}

/// Response settings for detected contacts.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpulseResponseConfig {
    /// Overrides the world's `correction_percent`.
    pub correction_percent: Option<f32>,
    /// Overrides the world's `penetration_slop`.
    pub penetration_slop: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepPruneConfig {
    pub axis: SweepAxis,
}

/// Declarative description of a built-in behavior.
///
/// The last three variants configure the world's collision pipeline rather
/// than adding an entry to the behavior pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BehaviorSpec {
    ConstantAcceleration(ConstantAccelerationConfig),
    EdgeContainment(EdgeContainmentConfig),
    BodyCollisionDetection(CollisionDetectionConfig),
    BodyImpulseResponse(ImpulseResponseConfig),
    SweepPrune(SweepPruneConfig),
}

impl BehaviorSpec {
    pub fn gravity(acceleration: Vec2) -> Self {
        BehaviorSpec::ConstantAcceleration(ConstantAccelerationConfig {
            acceleration,
            target: BehaviorTarget::All,
        })
    }

    pub fn edges(bounds: Aabb, restitution: f32, friction: f32) -> Self {
        BehaviorSpec::EdgeContainment(EdgeContainmentConfig {
            bounds,
            restitution,
            friction,
            target: BehaviorTarget::All,
        })
    }

    pub fn collision_detection() -> Self {
        BehaviorSpec::BodyCollisionDetection(CollisionDetectionConfig::default())
    }

    pub fn impulse_response() -> Self {
        BehaviorSpec::BodyImpulseResponse(ImpulseResponseConfig::default())
    }

    pub fn sweep_prune() -> Self {
        BehaviorSpec::SweepPrune(SweepPruneConfig::default())
    }

    pub fn name(&self) -> &'static str {
        match self {
            BehaviorSpec::ConstantAcceleration(_) => ConstantAcceleration::NAME,
            BehaviorSpec::EdgeContainment(_) => EdgeContainment::NAME,
            BehaviorSpec::BodyCollisionDetection(_) => "body-collision-detection",
            BehaviorSpec::BodyImpulseResponse(_) => "body-impulse-response",
            BehaviorSpec::SweepPrune(_) => "sweep-prune",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::body::BodyDesc;
    use approx::assert_relative_eq;

    fn bounds() -> Aabb {
        Aabb::from_min_max(0.0, 0.0, 100.0, 100.0)
    }

    fn edges(restitution: f32, friction: f32) -> EdgeContainment {
        EdgeContainment::new(
            EdgeContainmentConfig {
                bounds: bounds(),
                restitution,
                friction,
                target: BehaviorTarget::All,
            },
            CombineRule::Min,
            CombineRule::Average,
        )
        .unwrap()
    }

    fn working(desc: BodyDesc) -> Vec<Body> {
        let mut registry = BodyRegistry::new();
        registry.add(desc.build().unwrap()).unwrap();
        registry.snapshot()
    }

    #[test]
    fn constant_acceleration_skips_immovable_bodies() {
        let mut registry = BodyRegistry::new();
        registry.add(BodyDesc::circle(1.0).build().unwrap()).unwrap();
        registry
            .add(BodyDesc::circle(1.0).immovable().build().unwrap())
            .unwrap();
        let mut bodies = registry.snapshot();

        let gravity = ConstantAcceleration::new(ConstantAccelerationConfig {
            acceleration: Vec2::new(0.0, 0.5),
            target: BehaviorTarget::All,
        })
        .unwrap();
        gravity.apply(&mut bodies, 2.0);

        assert_eq!(bodies[0].velocity(), Vec2::new(0.0, 1.0));
        assert_eq!(bodies[1].velocity(), Vec2::ZERO);
    }

    #[test]
    fn targeting_respects_handles() {
        let mut registry = BodyRegistry::new();
        let first = registry.add(BodyDesc::circle(1.0).build().unwrap()).unwrap();
        registry.add(BodyDesc::circle(1.0).build().unwrap()).unwrap();
        let mut bodies = registry.snapshot();

        let gravity = ConstantAcceleration::new(ConstantAccelerationConfig {
            acceleration: Vec2::X,
            target: BehaviorTarget::Only(vec![first]),
        })
        .unwrap();
        gravity.apply(&mut bodies, 1.0);

        assert_eq!(bodies[0].velocity(), Vec2::X);
        assert_eq!(bodies[1].velocity(), Vec2::ZERO);
    }

    #[test]
    fn unknown_and_immovable_targets_are_rejected() {
        let mut registry = BodyRegistry::new();
        let wall = registry
            .add(BodyDesc::rectangle(5.0, 5.0).immovable().build().unwrap())
            .unwrap();

        let stray = BodyHandle(77);
        let gravity = ConstantAcceleration::new(ConstantAccelerationConfig {
            acceleration: Vec2::Y,
            target: BehaviorTarget::Only(vec![stray]),
        })
        .unwrap();
        assert_eq!(
            gravity.validate(&registry),
            Err(ConfigError::UnknownTarget {
                behavior: ConstantAcceleration::NAME,
                handle: stray
            })
        );

        let gravity = ConstantAcceleration::new(ConstantAccelerationConfig {
            acceleration: Vec2::Y,
            target: BehaviorTarget::Only(vec![wall]),
        })
        .unwrap();
        assert_eq!(
            gravity.validate(&registry),
            Err(ConfigError::ImmovableTarget {
                behavior: ConstantAcceleration::NAME,
                handle: wall
            })
        );
    }

    #[test]
    fn elastic_wall_reflects_velocity() {
        let mut bodies = working(BodyDesc::circle(10.0).position(95.0, 50.0).velocity(2.0, 0.0));
        edges(1.0, 0.0).apply(&mut bodies, 1.0);

        assert_relative_eq!(bodies[0].position().x, 90.0);
        assert_relative_eq!(bodies[0].velocity().x, -2.0);
    }

    #[test]
    fn inelastic_floor_stops_normal_motion_and_applies_friction() {
        let mut bodies = working(
            BodyDesc::circle(10.0)
                .position(50.0, 92.0)
                .velocity(1.0, 0.5)
                .restitution(0.0)
                .friction(0.4),
        );
        edges(1.0, 0.4).apply(&mut bodies, 1.0);

        let body = &bodies[0];
        assert_relative_eq!(body.position().y, 90.0);
        assert_relative_eq!(body.velocity().y, 0.0);
        // μ (1 + e) |vn| = 0.4 * 1 * 0.5 = 0.2
        assert_relative_eq!(body.velocity().x, 0.8, epsilon = 1e-6);
    }

    #[test]
    fn body_moving_away_from_touched_wall_keeps_velocity() {
        let mut bodies = working(BodyDesc::circle(10.0).position(10.0, 50.0).velocity(0.3, 0.1));
        edges(1.0, 0.8).apply(&mut bodies, 1.0);
        assert_eq!(bodies[0].velocity(), Vec2::new(0.3, 0.1));
    }

    #[test]
    fn kinematic_bodies_are_not_contained() {
        let mut bodies = working(
            BodyDesc::circle(10.0)
                .position(120.0, 50.0)
                .velocity(2.0, 0.0)
                .kinematic(),
        );
        edges(1.0, 0.0).apply(&mut bodies, 1.0);

        // Kinematic bodies follow their own velocity, walls included.
        assert_eq!(bodies[0].position(), Vec2::new(120.0, 50.0));
        assert_eq!(bodies[0].velocity(), Vec2::new(2.0, 0.0));
    }

    #[test]
    fn oversized_body_and_bad_bounds_are_config_errors() {
        let mut registry = BodyRegistry::new();
        let big = registry
            .add(BodyDesc::circle(60.0).build().unwrap())
            .unwrap();
        assert!(matches!(
            edges(1.0, 0.0).validate(&registry),
            Err(ConfigError::BodyExceedsBounds { handle, .. }) if handle == big
        ));

        let flat = EdgeContainment::new(
            EdgeContainmentConfig {
                bounds: Aabb::from_min_max(0.0, 0.0, 10.0, 0.0),
                ..EdgeContainmentConfig::default()
            },
            CombineRule::Min,
            CombineRule::Average,
        );
        assert!(matches!(flat, Err(ConfigError::InvalidBounds(_))));
    }

    #[test]
    fn pipeline_runs_stages_separately() {
        let mut pipeline = BehaviorPipeline::new();
        pipeline.add(edges(1.0, 0.0));
        pipeline.add(
            ConstantAcceleration::new(ConstantAccelerationConfig {
                acceleration: Vec2::Y,
                target: BehaviorTarget::All,
            })
            .unwrap(),
        );
        assert_eq!(
            pipeline.names(),
            vec![EdgeContainment::NAME, ConstantAcceleration::NAME]
        );

        let mut bodies = working(BodyDesc::circle(10.0).position(-5.0, 50.0));
        pipeline.apply_stage(BehaviorStage::Forces, &mut bodies, 1.0);
        assert_eq!(bodies[0].position().x, -5.0);
        assert_eq!(bodies[0].velocity(), Vec2::Y);

        pipeline.apply_stage(BehaviorStage::Constraints, &mut bodies, 1.0);
        assert_eq!(bodies[0].position().x, 10.0);
    }

    #[test]
    fn spec_round_trips_through_json() {
        let spec = BehaviorSpec::gravity(Vec2::new(0.0, 0.0004));
        let json = serde_json::to_string(&spec).unwrap();
        let back: BehaviorSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, spec);
        assert_eq!(back.name(), "constant-acceleration");
    }
}
