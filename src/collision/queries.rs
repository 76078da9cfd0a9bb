use glam::Vec2;

use crate::{
    core::{registry::BodyRegistry, shape::Aabb},
    utils::allocator::BodyHandle,
};

/// Spatial lookups against the registered bodies.
pub struct Query;

impl Query {
    /// Handles of bodies whose shape contains `point`, in insertion order.
    pub fn point(registry: &BodyRegistry, point: Vec2) -> Vec<BodyHandle> {
        registry
            .iter()
            .filter(|body| body.aabb().contains_point(point) && body.contains_point(point))
            .map(|body| body.handle())
            .collect()
    }

    /// Handles of bodies whose bounding box overlaps `region`.
    pub fn region(registry: &BodyRegistry, region: &Aabb) -> Vec<BodyHandle> {
        registry
            .iter()
            .filter(|body| body.aabb().overlaps(region))
            .map(|body| body.handle())
            .collect()
    }
}
