//! Collision detection: broad-phase pruning, narrow-phase contact tests, queries.

pub mod broadphase;
pub mod clipping;
pub mod contact;
pub mod narrowphase;
pub mod queries;

pub use broadphase::{BroadPhase, BruteForce, CandidatePair, Proxy, SweepAndPrune, SweepAxis};
pub use contact::{CollisionEvent, Contact, ContactPair};
pub use queries::Query;
