//! Beam-shape solid
//!
//! A four-sided pyramid from the source through the isocenter, sized so its
//! cross-section at the isocenter matches the X jaw opening.

use super::geometry::{compute_source_position, BeamError, BeamGeometry, JawPositions};
use crate::assets::TriangleMesh;
use crate::foundation::math::{Mat4, Mat4Ext, Point3};

/// Beam solid in beam-local coordinates plus its placement
#[derive(Debug, Clone, PartialEq)]
pub struct BeamModel {
    /// Pyramid along +X with the apex at `+SAD`
    pub mesh: TriangleMesh,
    /// Beam-local → isocenter-frame transform
    pub placement: Mat4,
}

impl BeamModel {
    /// Copy of the mesh moved into place
    pub fn world_mesh(&self) -> TriangleMesh {
        self.mesh.transformed(&self.placement)
    }

    /// Apex of the pyramid after placement, which is the source position
    pub fn apex(&self) -> Point3 {
        let local_apex = self
            .mesh
            .vertices()
            .first()
            .copied()
            .unwrap_or_else(Point3::origin);
        self.placement.transform_point(&local_apex)
    }
}

/// Fixed tilt bringing the pyramid from +X onto the beam axis (+Z)
///
/// The 45° roll turns the base corners off the axes so the base edges run
/// along the jaws.
fn beam_axis_tilt() -> Mat4 {
    Mat4::rotation_y_deg(-90.0) * Mat4::rotation_x_deg(45.0)
}

/// Base radius of the pyramid for a jaw opening
///
/// The base lies at twice the isocenter distance, and its corners sit on the
/// diagonals after the tilt, hence the `2·√2` factor.
pub fn pyramid_radius(jaws: &JawPositions) -> f64 {
    jaws.x_half_width() * 2.0 * std::f64::consts::SQRT_2
}

/// Build the beam solid for the given isocenter, jaws, SAD and collimator
/// angle
///
/// `orientation` is the source → isocenter transform from
/// [`compute_source_position`]; only its rotation is used.
pub fn create_beam_model(
    isocenter: Option<&Point3>,
    jaw_positions: Option<&JawPositions>,
    source_axis_distance: Option<f64>,
    collimator_angle: f64,
    orientation: &Mat4,
) -> Result<BeamModel, BeamError> {
    let isocenter = isocenter.ok_or(BeamError::MissingIsocenter)?;
    let jaws = jaw_positions.ok_or(BeamError::MissingJawPositions)?;
    let sad = source_axis_distance.ok_or(BeamError::MissingSourceAxisDistance)?;
    if !(sad.is_finite() && sad > 0.0) {
        return Err(BeamError::InvalidSourceAxisDistance(sad));
    }

    let mesh = TriangleMesh::pyramid(pyramid_radius(jaws), 2.0 * sad);

    let placement = Mat4::translation(isocenter.coords)
        * orientation.linear_part()
        * Mat4::rotation_z_deg(collimator_angle)
        * beam_axis_tilt();

    Ok(BeamModel { mesh, placement })
}

impl BeamGeometry {
    /// Beam solid for these inputs
    pub fn beam_model(&self) -> Result<BeamModel, BeamError> {
        let jaws = self.jaw_positions.ok_or(BeamError::MissingJawPositions)?;
        let pose = compute_source_position(
            self.isocenter.as_ref(),
            self.gantry_angle,
            self.couch_angle,
            self.source_axis_distance,
        )?;

        create_beam_model(
            self.isocenter.as_ref(),
            Some(&jaws),
            self.source_axis_distance,
            self.collimator_angle,
            &pose.orientation,
        )
    }
}
