//! Beam geometry
//!
//! - [`geometry`] - beam inputs and the radiation source pose
//! - [`model`] - the pyramidal beam solid placed along the beam axis

pub mod geometry;
pub mod model;

pub use geometry::{
    compute_source_position,
    source_orientation,
    source_position_in_ras,
    BeamError,
    BeamGeometry,
    JawPositions,
    SourcePose,
};
pub use model::{create_beam_model, pyramid_radius, BeamModel};
