//! Additional 2D math helpers layered on top of `glam`.

use glam::Vec2;

/// Normal used whenever a contact direction degenerates to zero length.
pub const FALLBACK_NORMAL: Vec2 = Vec2::Y;

/// Scalar 2D cross product `a.x * b.y - a.y * b.x`.
pub fn cross(a: Vec2, b: Vec2) -> f32 {
    a.perp_dot(b)
}

/// Cross product of a scalar angular velocity with a vector (`ω × r`).
pub fn cross_scalar(w: f32, r: Vec2) -> Vec2 {
    Vec2::new(-w * r.y, w * r.x)
}

/// Normalizes `v`, returning `fallback` when its length is too small or not finite.
pub fn normalize_or(v: Vec2, fallback: Vec2) -> Vec2 {
    let length_sq = v.length_squared();
    if length_sq > 1e-12 && length_sq.is_finite() {
        v / length_sq.sqrt()
    } else {
        log::trace!("degenerate direction {v:?}, using fallback {fallback:?}");
        fallback
    }
}

/// Rotates a local-space point by `angle` radians and translates it to `position`.
pub fn to_world(local: Vec2, position: Vec2, angle: f32) -> Vec2 {
    position + Vec2::from_angle(angle).rotate(local)
}

/// Rotates a world-space point into the local frame at `position`/`angle`.
pub fn to_local(world: Vec2, position: Vec2, angle: f32) -> Vec2 {
    Vec2::from_angle(-angle).rotate(world - position)
}
