use serde::{Deserialize, Serialize};

use crate::{
    config::{DEFAULT_FRICTION, DEFAULT_RESTITUTION},
    error::ConfigError,
};

pub use glam::Vec2;

/// How a body takes part in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Motion {
    /// Finite mass; moved by behaviors, integration and collisions.
    #[default]
    Dynamic,
    /// Infinite mass; never moves.
    Static,
    /// Infinite mass; moves with its own velocity but ignores forces and impacts.
    Kinematic,
}

impl Motion {
    pub fn is_dynamic(self) -> bool {
        matches!(self, Motion::Dynamic)
    }

    /// Static and kinematic bodies have zero inverse mass.
    pub fn is_immovable(self) -> bool {
        !self.is_dynamic()
    }
}

/// Surface coefficients used by collision response.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    /// Bounciness in `[0, 1]`.
    pub restitution: f32,
    /// Coulomb friction coefficient, `>= 0`.
    pub friction: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            restitution: DEFAULT_RESTITUTION,
            friction: DEFAULT_FRICTION,
        }
    }
}

impl Material {
    pub fn new(restitution: f32, friction: f32) -> Self {
        Self {
            restitution,
            friction,
        }
    }

    pub fn rubber() -> Self {
        Self::new(0.8, 1.0)
    }

    pub fn steel() -> Self {
        Self::new(0.4, 0.44)
    }

    pub fn ice() -> Self {
        Self::new(0.05, 0.03)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.restitution) {
            return Err(ConfigError::InvalidRestitution(self.restitution));
        }
        if !(self.friction.is_finite() && self.friction >= 0.0) {
            return Err(ConfigError::InvalidFriction(self.friction));
        }
        Ok(())
    }
}

/// Rule for combining a coefficient of two touching surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CombineRule {
    #[default]
    Average,
    Min,
    Max,
    Multiply,
}

impl CombineRule {
    pub fn combine(self, a: f32, b: f32) -> f32 {
        match self {
            CombineRule::Average => 0.5 * (a + b),
            CombineRule::Min => a.min(b),
            CombineRule::Max => a.max(b),
            CombineRule::Multiply => a * b,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combine_rules_are_symmetric() {
        for rule in [
            CombineRule::Average,
            CombineRule::Min,
            CombineRule::Max,
            CombineRule::Multiply,
        ] {
            assert_eq!(rule.combine(0.6, 0.2), rule.combine(0.2, 0.6));
        }
        assert!((CombineRule::Average.combine(0.6, 0.2) - 0.4).abs() < 1e-6);
        assert!((CombineRule::Min.combine(0.6, 0.2) - 0.2).abs() < 1e-6);
        assert!((CombineRule::Max.combine(0.6, 0.2) - 0.6).abs() < 1e-6);
        assert!((CombineRule::Multiply.combine(0.6, 0.2) - 0.12).abs() < 1e-6);
    }

    #[test]
    fn material_rejects_out_of_range_coefficients() {
        assert_eq!(
            Material::new(1.5, 0.1).validate(),
            Err(ConfigError::InvalidRestitution(1.5))
        );
        assert_eq!(
            Material::new(0.5, -0.1).validate(),
            Err(ConfigError::InvalidFriction(-0.1))
        );
        assert!(Material::rubber().validate().is_ok());
    }
}
