use log::trace;

use super::friction::apply_friction;
use crate::{
    collision::{contact::Contact, narrowphase},
    config::WorldConfig,
    core::{body::Body, types::CombineRule},
    error::ConfigError,
    utils::math::cross,
};

/// Sequential impulse response for single contacts.
///
/// Each contact is resolved once: positional correction first, then a
/// normal impulse scaled by the combined restitution, then Coulomb friction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpulseResolver {
    pub restitution_rule: CombineRule,
    pub friction_rule: CombineRule,
    /// Fraction of the penetration beyond `penetration_slop` removed per contact.
    pub correction_percent: f32,
    pub penetration_slop: f32,
}

impl Default for ImpulseResolver {
    fn default() -> Self {
        Self::from_config(&WorldConfig::default())
    }
}

impl ImpulseResolver {
    pub fn from_config(config: &WorldConfig) -> Self {
        Self {
            restitution_rule: config.restitution_rule,
            friction_rule: config.friction_rule,
            correction_percent: config.correction_percent,
            penetration_slop: config.penetration_slop,
        }
    }

    /// Resolves one contact between `a` and `b`, with the normal pointing A → B.
    ///
    /// Returns `true` when a normal impulse was applied. Separating pairs and
    /// pairs of two immovable bodies are left alone.
    pub fn resolve(&self, contact: &Contact, a: &mut Body, b: &mut Body) -> bool {
        let inv_mass_a = a.inverse_mass();
        let inv_mass_b = b.inverse_mass();
        let inv_mass_sum = inv_mass_a + inv_mass_b;
        if inv_mass_sum <= 0.0 {
            return false;
        }

        self.correct_positions(contact, a, b, inv_mass_sum);

        let normal = contact.normal;
        let relative = b.velocity_at(contact.point) - a.velocity_at(contact.point);
        let normal_speed = relative.dot(normal);
        if normal_speed > 0.0 {
            return false;
        }

        let rn_a = cross(contact.point - a.position(), normal);
        let rn_b = cross(contact.point - b.position(), normal);
        let effective_mass_inv = inv_mass_sum
            + rn_a * rn_a * a.inverse_inertia()
            + rn_b * rn_b * b.inverse_inertia();
        if effective_mass_inv <= f32::EPSILON {
            trace!("contact skipped: degenerate effective mass");
            return false;
        }

        let restitution = self
            .restitution_rule
            .combine(a.restitution(), b.restitution());
        let impulse = -(1.0 + restitution) * normal_speed / effective_mass_inv;

        a.apply_impulse(-normal * impulse, contact.point);
        b.apply_impulse(normal * impulse, contact.point);

        let friction = self.friction_rule.combine(a.friction(), b.friction());
        apply_friction(a, b, contact, impulse, friction);
        true
    }

    /// Detects and resolves a single pair. Separated pairs are untouched.
    pub fn resolve_pair(&self, a: &mut Body, b: &mut Body) -> Result<bool, ConfigError> {
        Ok(match narrowphase::detect(a, b)? {
            Some(contact) => self.resolve(&contact, a, b),
            None => false,
        })
    }

    fn correct_positions(&self, contact: &Contact, a: &mut Body, b: &mut Body, inv_mass_sum: f32) {
        let excess = (contact.depth - self.penetration_slop).max(0.0);
        if excess <= 0.0 {
            return;
        }
        let correction = contact.normal * (excess * self.correction_percent / inv_mass_sum);
        a.set_position(a.position() - correction * a.inverse_mass());
        b.set_position(b.position() + correction * b.inverse_mass());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::body::BodyDesc;
    use approx::assert_relative_eq;
    use glam::Vec2;

    fn wall() -> Body {
        BodyDesc::rectangle(2.0, 20.0)
            .position(11.0, 0.0)
            .immovable()
            .build()
            .unwrap()
    }

    fn ball(restitution: f32) -> Body {
        BodyDesc::circle(1.0)
            .position(9.5, 0.0)
            .velocity(3.0, 0.0)
            .restitution(restitution)
            .build()
            .unwrap()
    }

    #[test]
    fn elastic_ball_keeps_normal_speed() {
        let mut ball = ball(1.0);
        let mut wall = wall();
        assert!(ImpulseResolver::default().resolve_pair(&mut ball, &mut wall).unwrap());
        assert_relative_eq!(ball.velocity().x, -3.0, epsilon = 1e-5);
        assert_relative_eq!(ball.velocity().y, 0.0, epsilon = 1e-5);
        assert_eq!(wall.position(), Vec2::new(11.0, 0.0));
    }

    #[test]
    fn plastic_ball_stops() {
        let mut ball = ball(0.0);
        let mut wall = wall();
        ImpulseResolver::default().resolve_pair(&mut wall, &mut ball).unwrap();
        assert_relative_eq!(ball.velocity().x, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn penetration_is_reduced() {
        let mut ball = ball(1.0);
        let mut wall = wall();
        ImpulseResolver::default().resolve_pair(&mut ball, &mut wall).unwrap();
        // Depth 0.5 → moved out by (0.5 - 0.01) * 0.8.
        assert_relative_eq!(ball.position().x, 9.5 - 0.392, epsilon = 1e-5);
    }

    #[test]
    fn separated_pair_is_left_alone_twice() {
        let mut a = BodyDesc::circle(1.0).velocity(1.0, 0.0).build().unwrap();
        let mut b = BodyDesc::circle(1.0).position(5.0, 0.0).build().unwrap();
        let (before_a, before_b) = (a.clone(), b.clone());
        let resolver = ImpulseResolver::default();

        assert!(!resolver.resolve_pair(&mut a, &mut b).unwrap());
        assert!(!resolver.resolve_pair(&mut a, &mut b).unwrap());
        assert_eq!(a, before_a);
        assert_eq!(b, before_b);
    }

    #[test]
    fn separating_contact_gets_no_impulse() {
        let mut a = BodyDesc::circle(1.0).velocity(-1.0, 0.0).build().unwrap();
        let mut b = BodyDesc::circle(1.0).position(1.99, 0.0).build().unwrap();
        assert!(!ImpulseResolver::default().resolve_pair(&mut a, &mut b).unwrap());
        assert_eq!(a.velocity(), Vec2::new(-1.0, 0.0));
    }

    #[test]
    fn equal_masses_exchange_momentum() {
        let mut a = BodyDesc::circle(1.0).velocity(2.0, 0.0).build().unwrap();
        let mut b = BodyDesc::circle(1.0).position(2.0, 0.0).build().unwrap();
        let total = a.velocity() + b.velocity();
        ImpulseResolver::default().resolve_pair(&mut a, &mut b).unwrap();

        assert_relative_eq!(a.velocity().x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(b.velocity().x, 2.0, epsilon = 1e-5);
        assert_relative_eq!((a.velocity() + b.velocity()).x, total.x, epsilon = 1e-5);
    }

    #[test]
    fn two_immovable_bodies_are_skipped() {
        let mut a = BodyDesc::circle(1.0).immovable().build().unwrap();
        let mut b = BodyDesc::circle(1.0).position(1.0, 0.0).kinematic().build().unwrap();
        assert!(!ImpulseResolver::default().resolve_pair(&mut a, &mut b).unwrap());
        assert_eq!(a.position(), Vec2::ZERO);
    }
}
