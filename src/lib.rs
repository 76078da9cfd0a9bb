//! Impulse2D – a small 2D rigid-body physics core.
//!
//! A [`World`] owns a registry of bodies (points, circles, rectangles and
//! convex polygons), a pipeline of behaviors such as gravity and edge
//! containment, and a collision pipeline made of a broad phase
//! (sweep-and-prune or brute force), an exact narrow phase and an impulse
//! resolver. The driver calls [`World::step`] with its own millisecond
//! timestamps and reads body state back for rendering.

pub mod collision;
pub mod config;
pub mod core;
pub mod dynamics;
pub mod error;
pub mod utils;
pub mod world;

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

pub use glam::Vec2;

pub use collision::{
    broadphase::{BroadPhase, BruteForce, CandidatePair, Proxy, SweepAndPrune, SweepAxis},
    contact::{CollisionEvent, Contact},
};
pub use config::WorldConfig;
pub use crate::core::{
    body::{Body, BodyDesc},
    registry::BodyRegistry,
    shape::{Aabb, Shape, ShapeKind},
    types::{CombineRule, Material, Motion},
};
pub use dynamics::{
    behavior::{
        Behavior, BehaviorSpec, BehaviorStage, BehaviorTarget, CollisionDetectionConfig,
        ConstantAccelerationConfig, EdgeContainmentConfig, ImpulseResponseConfig,
        SweepPruneConfig,
    },
    solver::ImpulseResolver,
};
pub use error::{ConfigError, PhysicsError, PhysicsResult, RegistryError};
pub use utils::{allocator::BodyHandle, profiling::StepProfile};
pub use world::{FrameTime, StepReport, World};

/// A [`World`] shared between threads, e.g. a stepping driver and a renderer.
///
/// Access is serialized through a mutex; each closure sees a consistent
/// world between steps.
#[derive(Clone)]
pub struct SharedWorld {
    inner: Arc<Mutex<World>>,
}

impl SharedWorld {
    pub fn new(world: World) -> Self {
        Self {
            inner: Arc::new(Mutex::new(world)),
        }
    }

    /// Steps the shared world to `now_ms`.
    pub fn step(&self, now_ms: f64) -> PhysicsResult<StepReport> {
        self.inner.lock().step(now_ms)
    }

    /// Runs `f` with read access to the world.
    pub fn read<R>(&self, f: impl FnOnce(&World) -> R) -> R {
        f(&self.inner.lock())
    }

    /// Runs `f` with write access to the world.
    pub fn write<R>(&self, f: impl FnOnce(&mut World) -> R) -> R {
        f(&mut self.inner.lock())
    }

    /// Locks the world for a longer sequence of calls.
    pub fn lock(&self) -> MutexGuard<'_, World> {
        self.inner.lock()
    }
}
