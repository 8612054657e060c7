//! Kinematic chain of the treatment room
//!
//! - [`frames`] - the fixed IEC 61217 frame set and its parent wiring
//! - [`parameters`] - machine inputs and which edges each one drives
//! - [`updaters`] - per-edge transform formulas
//! - [`tree`] - frame arena and the transform composer

pub mod frames;
pub mod parameters;
pub mod tree;
pub mod updaters;

#[cfg(test)]
mod tests;

pub use frames::CoordinateFrame;
pub use parameters::{MachineParameter, MachineParameterSet};
pub use tree::{FrameNode, FrameTree, TransformError};
