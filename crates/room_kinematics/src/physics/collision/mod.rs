//! Mesh collision detection
//!
//! # Architecture
//!
//! - **Model Space Storage**: component meshes stay in their own frame
//! - **On-Demand Transformation**: working copies are placed in the common
//!   frame only for the duration of a test
//! - **Exact Narrow Phase**: triangle-triangle separating axis test, counting
//!   every intersecting pair as one contact
//!
//! # Module Organization
//!
//! - [`primitives`] - bounding volumes and triangles
//! - [`mesh`] - world-space collision meshes and contact counting

pub mod mesh;
pub mod primitives;

// Re-export commonly used types
pub use mesh::WorldSpaceCollisionMesh;
pub use primitives::{Aabb, BoundingSphere, Triangle};
