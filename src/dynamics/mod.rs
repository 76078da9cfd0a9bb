//! Simulation dynamics: behaviors, integration and contact response.

pub mod behavior;
pub mod friction;
pub mod integrator;
pub mod solver;

pub use behavior::{
    Behavior, BehaviorPipeline, BehaviorSpec, BehaviorStage, BehaviorTarget,
    CollisionDetectionConfig, ConstantAcceleration, ConstantAccelerationConfig, EdgeContainment,
    EdgeContainmentConfig, ImpulseResponseConfig, SweepPruneConfig,
};
pub use integrator::Integrator;
pub use solver::ImpulseResolver;
