//! Physics module for collision detection between machine components
//!
//! Provides exact mesh-mesh intersection tests and the detector that runs
//! them over the configured component pairs.

pub mod collision;
pub mod collision_system;

#[cfg(test)]
mod tests;

pub use collision::{Aabb, BoundingSphere, Triangle, WorldSpaceCollisionMesh};
pub use collision_system::{
    CollisionDetector,
    CollisionPair,
    CollisionReport,
    ComponentPlacement,
    DetectorState,
    MachineComponent,
    PairResult,
    FIXED_PAIRS,
};
