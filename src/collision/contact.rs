use glam::Vec2;

use crate::utils::allocator::BodyHandle;

/// Geometric result of a narrow-phase test between bodies A and B.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Unit normal pointing from A towards B.
    pub normal: Vec2,
    /// Penetration depth along the normal; zero when the shapes just touch.
    pub depth: f32,
    /// World-space contact point.
    pub point: Vec2,
}

impl Contact {
    /// The same contact seen from B's side.
    pub fn flipped(self) -> Self {
        Self {
            normal: -self.normal,
            ..self
        }
    }
}

/// Contact between two entries of the stepper's working set.
#[derive(Debug, Clone, Copy)]
pub struct ContactPair {
    pub a: usize,
    pub b: usize,
    pub contact: Contact,
}

/// Collision reported to the driver after a step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionEvent {
    pub body_a: BodyHandle,
    pub body_b: BodyHandle,
    pub normal: Vec2,
    pub depth: f32,
    pub point: Vec2,
}

impl CollisionEvent {
    pub fn new(body_a: BodyHandle, body_b: BodyHandle, contact: &Contact) -> Self {
        Self {
            body_a,
            body_b,
            normal: contact.normal,
            depth: contact.depth,
            point: contact.point,
        }
    }

    pub fn involves(&self, handle: BodyHandle) -> bool {
        self.body_a == handle || self.body_b == handle
    }
}
