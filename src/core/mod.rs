//! Core types describing bodies, shapes, materials and the body registry.

pub mod body;
pub mod registry;
pub mod shape;
pub mod types;

pub use body::{Body, BodyDesc};
pub use registry::BodyRegistry;
pub use shape::{Aabb, Shape, ShapeKind};
pub use types::{CombineRule, Material, Motion};
