use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::{
    shape::{Aabb, Shape},
    types::{Material, Motion},
};
use crate::{
    config::DEFAULT_MASS,
    error::ConfigError,
    utils::{
        allocator::BodyHandle,
        math::{cross, cross_scalar},
    },
};

/// A simulated rigid body.
///
/// Geometry and mass are fixed at creation; only kinematic state
/// (position, velocity, orientation, spin) changes afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    handle: BodyHandle,
    requested_handle: Option<BodyHandle>,
    shape: Shape,
    position: Vec2,
    velocity: Vec2,
    angle: f32,
    angular_velocity: f32,
    mass: f32,
    inverse_mass: f32,
    inertia: f32,
    inverse_inertia: f32,
    material: Material,
    motion: Motion,
}

impl Body {
    pub fn handle(&self) -> BodyHandle {
        self.handle
    }

    pub(crate) fn set_handle(&mut self, handle: BodyHandle) {
        self.handle = handle;
    }

    pub(crate) fn requested_handle(&self) -> Option<BodyHandle> {
        self.requested_handle
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Orientation in radians.
    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn angular_velocity(&self) -> f32 {
        self.angular_velocity
    }

    /// Mass of a dynamic body; `f32::INFINITY` for immovable bodies.
    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn inverse_mass(&self) -> f32 {
        self.inverse_mass
    }

    pub fn inertia(&self) -> f32 {
        self.inertia
    }

    pub fn inverse_inertia(&self) -> f32 {
        self.inverse_inertia
    }

    pub fn material(&self) -> Material {
        self.material
    }

    pub fn restitution(&self) -> f32 {
        self.material.restitution
    }

    pub fn friction(&self) -> f32 {
        self.material.friction
    }

    pub fn motion(&self) -> Motion {
        self.motion
    }

    pub fn is_dynamic(&self) -> bool {
        self.motion.is_dynamic()
    }

    pub fn is_immovable(&self) -> bool {
        self.motion.is_immovable()
    }

    pub fn aabb(&self) -> Aabb {
        self.shape.aabb(self.position, self.angle)
    }

    pub fn contains_point(&self, point: Vec2) -> bool {
        self.shape.contains_point(self.position, self.angle, point)
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    pub fn set_angle(&mut self, angle: f32) {
        self.angle = angle;
    }

    pub fn set_angular_velocity(&mut self, angular_velocity: f32) {
        self.angular_velocity = angular_velocity;
    }

    /// Applies an impulse at a world-space point. No effect on immovable bodies.
    pub fn apply_impulse(&mut self, impulse: Vec2, point: Vec2) {
        if self.is_immovable() {
            return;
        }
        self.velocity += impulse * self.inverse_mass;
        self.angular_velocity += self.inverse_inertia * cross(point - self.position, impulse);
    }

    /// Velocity of the material point at a world-space location.
    pub fn velocity_at(&self, point: Vec2) -> Vec2 {
        self.velocity + cross_scalar(self.angular_velocity, point - self.position)
    }

    /// Whether every piece of kinematic state is finite.
    pub fn is_finite(&self) -> bool {
        self.position.is_finite()
            && self.velocity.is_finite()
            && self.angle.is_finite()
            && self.angular_velocity.is_finite()
    }

    /// Copies kinematic state from `other`, leaving geometry and mass alone.
    pub(crate) fn copy_state_from(&mut self, other: &Body) {
        self.position = other.position;
        self.velocity = other.velocity;
        self.angle = other.angle;
        self.angular_velocity = other.angular_velocity;
    }
}

/// Description of a body to create, validated by [`BodyDesc::build`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyDesc {
    pub handle: Option<BodyHandle>,
    pub shape: Shape,
    pub position: Vec2,
    pub velocity: Vec2,
    pub angle: f32,
    pub angular_velocity: f32,
    pub mass: f32,
    pub material: Material,
    pub motion: Motion,
    pub fixed_rotation: bool,
}

impl Default for BodyDesc {
    fn default() -> Self {
        Self {
            handle: None,
            shape: Shape::Point,
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            angle: 0.0,
            angular_velocity: 0.0,
            mass: DEFAULT_MASS,
            material: Material::default(),
            motion: Motion::Dynamic,
            fixed_rotation: false,
        }
    }
}

impl BodyDesc {
    pub fn new(shape: Shape) -> Self {
        Self {
            shape,
            ..Self::default()
        }
    }

    pub fn point() -> Self {
        Self::new(Shape::Point)
    }

    pub fn circle(radius: f32) -> Self {
        Self::new(Shape::circle(radius))
    }

    pub fn rectangle(width: f32, height: f32) -> Self {
        Self::new(Shape::rectangle(width, height))
    }

    pub fn polygon(vertices: Vec<Vec2>) -> Self {
        Self::new(Shape::convex_polygon(vertices))
    }

    /// Requests a specific handle instead of an auto-assigned one.
    pub fn handle(mut self, handle: BodyHandle) -> Self {
        self.handle = Some(handle);
        self
    }

    pub fn position(mut self, x: f32, y: f32) -> Self {
        self.position = Vec2::new(x, y);
        self
    }

    pub fn velocity(mut self, vx: f32, vy: f32) -> Self {
        self.velocity = Vec2::new(vx, vy);
        self
    }

    pub fn angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    pub fn angular_velocity(mut self, angular_velocity: f32) -> Self {
        self.angular_velocity = angular_velocity;
        self
    }

    pub fn mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    pub fn restitution(mut self, restitution: f32) -> Self {
        self.material.restitution = restitution;
        self
    }

    pub fn friction(mut self, friction: f32) -> Self {
        self.material.friction = friction;
        self
    }

    pub fn material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    /// Infinite mass, never moves.
    pub fn immovable(mut self) -> Self {
        self.motion = Motion::Static;
        self
    }

    /// Infinite mass, moves with its own velocity only.
    pub fn kinematic(mut self) -> Self {
        self.motion = Motion::Kinematic;
        self
    }

    pub fn fixed_rotation(mut self) -> Self {
        self.fixed_rotation = true;
        self
    }

    pub fn build(self) -> Result<Body, ConfigError> {
        let shape = self.shape.normalized()?;
        self.material.validate()?;

        if !self.position.is_finite() {
            return Err(ConfigError::NonFinite("position"));
        }
        if !self.velocity.is_finite() {
            return Err(ConfigError::NonFinite("velocity"));
        }
        if !self.angle.is_finite() {
            return Err(ConfigError::NonFinite("angle"));
        }
        if !self.angular_velocity.is_finite() {
            return Err(ConfigError::NonFinite("angular velocity"));
        }

        let (mass, inverse_mass, inertia, inverse_inertia) = if self.motion.is_dynamic() {
            if !(self.mass.is_finite() && self.mass > 0.0) {
                return Err(ConfigError::InvalidMass(self.mass));
            }
            let inertia = shape.moment_of_inertia(self.mass);
            let inverse_inertia = if self.fixed_rotation || inertia <= f32::EPSILON {
                0.0
            } else {
                1.0 / inertia
            };
            (self.mass, 1.0 / self.mass, inertia, inverse_inertia)
        } else {
            (f32::INFINITY, 0.0, f32::INFINITY, 0.0)
        };

        let velocity = if self.motion == Motion::Static {
            Vec2::ZERO
        } else {
            self.velocity
        };
        let angular_velocity = if self.motion == Motion::Static {
            0.0
        } else {
            self.angular_velocity
        };

        Ok(Body {
            handle: self.handle.unwrap_or_default(),
            requested_handle: self.handle,
            shape,
            position: self.position,
            velocity,
            angle: self.angle,
            angular_velocity,
            mass,
            inverse_mass,
            inertia,
            inverse_inertia,
            material: self.material,
            motion: self.motion,
        })
    }
}
