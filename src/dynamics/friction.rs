use crate::{
    collision::contact::Contact,
    core::body::Body,
    utils::math::cross,
};

/// Relative tangential speeds below this are treated as sticking.
const MIN_TANGENT_SPEED_SQ: f32 = 1e-12;

/// Applies a Coulomb friction impulse at the contact point.
///
/// The tangential impulse removes the relative sliding velocity but never
/// exceeds `friction * normal_impulse`. Returns the applied impulse magnitude.
pub fn apply_friction(
    body_a: &mut Body,
    body_b: &mut Body,
    contact: &Contact,
    normal_impulse: f32,
    friction: f32,
) -> f32 {
    if body_a.is_immovable() && body_b.is_immovable() {
        return 0.0;
    }

    let normal_impulse = normal_impulse.max(0.0);
    if normal_impulse <= f32::EPSILON || friction <= 0.0 {
        return 0.0;
    }

    let relative = body_b.velocity_at(contact.point) - body_a.velocity_at(contact.point);
    let sliding = relative - contact.normal * relative.dot(contact.normal);
    if sliding.length_squared() <= MIN_TANGENT_SPEED_SQ {
        log::trace!("friction skipped: no sliding velocity");
        return 0.0;
    }
    let tangent = sliding.normalize();

    let r_a = contact.point - body_a.position();
    let r_b = contact.point - body_b.position();
    let rt_a = cross(r_a, tangent);
    let rt_b = cross(r_b, tangent);
    let effective_mass_inv = body_a.inverse_mass()
        + body_b.inverse_mass()
        + rt_a * rt_a * body_a.inverse_inertia()
        + rt_b * rt_b * body_b.inverse_inertia();
    if effective_mass_inv <= f32::EPSILON {
        return 0.0;
    }

    let max_impulse = friction * normal_impulse;
    let impulse = (-relative.dot(tangent) / effective_mass_inv).clamp(-max_impulse, max_impulse);

    body_a.apply_impulse(-tangent * impulse, contact.point);
    body_b.apply_impulse(tangent * impulse, contact.point);
    impulse.abs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::body::BodyDesc;
    use glam::Vec2;

    #[test]
    fn friction_is_clamped_by_normal_impulse() {
        let mut ground = BodyDesc::rectangle(10.0, 1.0).immovable().build().unwrap();
        let mut puck = BodyDesc::circle(0.5)
            .position(0.0, 1.0)
            .velocity(5.0, 0.0)
            .fixed_rotation()
            .build()
            .unwrap();
        let contact = Contact {
            normal: Vec2::Y,
            depth: 0.0,
            point: Vec2::new(0.0, 0.5),
        };

        let applied = apply_friction(&mut ground, &mut puck, &contact, 1.0, 0.5);
        assert!((applied - 0.5).abs() < 1e-6);
        assert!((puck.velocity().x - 4.5).abs() < 1e-6);
        assert_eq!(ground.velocity(), Vec2::ZERO);
    }

    #[test]
    fn small_sliding_is_stopped_completely() {
        let mut ground = BodyDesc::rectangle(10.0, 1.0).immovable().build().unwrap();
        let mut puck = BodyDesc::circle(0.5)
            .position(0.0, 1.0)
            .velocity(0.1, 0.0)
            .fixed_rotation()
            .build()
            .unwrap();
        let contact = Contact {
            normal: Vec2::Y,
            depth: 0.0,
            point: Vec2::new(0.0, 0.5),
        };

        apply_friction(&mut ground, &mut puck, &contact, 1.0, 0.5);
        assert!(puck.velocity().x.abs() < 1e-6);
    }
}
