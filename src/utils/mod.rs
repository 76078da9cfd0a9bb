//! Utility helpers: handle allocation, 2D math, logging and profiling.

pub mod allocator;
pub mod logging;
pub mod math;
pub mod profiling;

pub use allocator::{Arena, BodyHandle};
pub use math::*;
pub use profiling::{StepPhase, StepProfile};
