//! Global configuration constants and world settings.
//!
//! Units follow the driver's clock: time in milliseconds, distances in world
//! units (pixels for a canvas renderer).

use serde::{Deserialize, Serialize};

use crate::{core::types::CombineRule, error::ConfigError};

/// Largest time slice integrated in one sub-step (milliseconds).
pub const DEFAULT_MAX_SUBSTEP_MS: f32 = 1000.0 / 120.0;

/// Maximum number of sub-steps per `step` call; elapsed time beyond
/// `max_substep_ms * max_substeps` is dropped.
pub const DEFAULT_MAX_SUBSTEPS: u32 = 16;

/// Upper bound accepted for `max_substeps`.
pub const MAX_SUBSTEPS_LIMIT: u32 = 1024;

/// Fraction of penetration (beyond the slop) removed per contact.
pub const DEFAULT_CORRECTION_PERCENT: f32 = 0.8;

/// Penetration depth tolerated without positional correction.
pub const DEFAULT_PENETRATION_SLOP: f32 = 0.01;

/// Default body mass.
pub const DEFAULT_MASS: f32 = 1.0;

/// Default body restitution.
pub const DEFAULT_RESTITUTION: f32 = 1.0;

/// Default body friction coefficient.
pub const DEFAULT_FRICTION: f32 = 0.8;

/// World-wide simulation settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub max_substep_ms: f32,
    pub max_substeps: u32,
    /// How two restitution coefficients combine at a contact.
    pub restitution_rule: CombineRule,
    /// How two friction coefficients combine at a contact.
    pub friction_rule: CombineRule,
    pub correction_percent: f32,
    pub penetration_slop: f32,
    /// Run integration and narrow-phase detection on the rayon pool.
    /// Ignored without the `parallel` feature.
    pub parallel: bool,
    /// Wall-clock compute time a `step` may take before a warning is
    /// logged. `None` disables the check.
    pub step_budget_ms: Option<f32>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            max_substep_ms: DEFAULT_MAX_SUBSTEP_MS,
            max_substeps: DEFAULT_MAX_SUBSTEPS,
            restitution_rule: CombineRule::Min,
            friction_rule: CombineRule::Average,
            correction_percent: DEFAULT_CORRECTION_PERCENT,
            penetration_slop: DEFAULT_PENETRATION_SLOP,
            parallel: false,
            step_budget_ms: None,
        }
    }
}

impl WorldConfig {
    /// Longest elapsed time a single `step` call will simulate.
    pub fn max_frame_ms(&self) -> f32 {
        self.max_substep_ms * self.max_substeps as f32
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.max_substep_ms.is_finite() && self.max_substep_ms > 0.0) {
            return Err(ConfigError::InvalidWorldSetting {
                field: "max_substep_ms",
                reason: format!("must be positive and finite, got {}", self.max_substep_ms),
            });
        }
        if !(1..=MAX_SUBSTEPS_LIMIT).contains(&self.max_substeps) {
            return Err(ConfigError::InvalidWorldSetting {
                field: "max_substeps",
                reason: format!(
                    "must lie in [1, {MAX_SUBSTEPS_LIMIT}], got {}",
                    self.max_substeps
                ),
            });
        }
        if !(0.0..=1.0).contains(&self.correction_percent) {
            return Err(ConfigError::InvalidWorldSetting {
                field: "correction_percent",
                reason: format!("must lie in [0, 1], got {}", self.correction_percent),
            });
        }
        if !(self.penetration_slop.is_finite() && self.penetration_slop >= 0.0) {
            return Err(ConfigError::InvalidWorldSetting {
                field: "penetration_slop",
                reason: format!("must be non-negative, got {}", self.penetration_slop),
            });
        }
        if let Some(budget) = self.step_budget_ms {
            if !(budget.is_finite() && budget > 0.0) {
                return Err(ConfigError::InvalidWorldSetting {
                    field: "step_budget_ms",
                    reason: format!("must be positive and finite, got {budget}"),
                });
            }
        }
        Ok(())
    }
}
