//! Radiation source geometry
//!
//! The source sits on the beam axis at the source-axis distance from the
//! isocenter. Its pose is a pure function of the isocenter, the gantry and
//! couch angles and the SAD.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::config::MachineModelConfig;
use crate::foundation::math::{Mat4, Mat4Ext, Point3, Vec3};
use crate::kinematics::{CoordinateFrame, FrameTree, MachineParameterSet, TransformError};

/// Errors raised when beam inputs are incomplete
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BeamError {
    /// No isocenter has been supplied
    #[error("Beam has no isocenter")]
    MissingIsocenter,

    /// No collimator jaw positions have been supplied
    #[error("Beam has no jaw positions")]
    MissingJawPositions,

    /// No source-axis distance has been supplied
    #[error("Beam has no source-axis distance")]
    MissingSourceAxisDistance,

    /// Source-axis distance that cannot place a source
    #[error("Invalid source-axis distance: {0}")]
    InvalidSourceAxisDistance(f64),

    /// Composing a frame transform failed
    #[error(transparent)]
    Transform(#[from] TransformError),
}

/// Rectangular collimator opening, projected to the isocenter plane (mm)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JawPositions {
    /// X jaws as `[min, max]`
    pub x: [f64; 2],
    /// Y jaws as `[min, max]`
    pub y: [f64; 2],
}

impl JawPositions {
    /// Create jaw positions from the four jaw coordinates
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
        Self { x: [x_min, x_max], y: [y_min, y_max] }
    }

    /// Field centred on the beam axis with the given full widths
    pub fn symmetric(width_x: f64, width_y: f64) -> Self {
        Self::new(-width_x / 2.0, width_x / 2.0, -width_y / 2.0, width_y / 2.0)
    }

    /// Half of the X opening
    pub fn x_half_width(&self) -> f64 {
        (self.x[1] - self.x[0]).abs() / 2.0
    }

    /// Half of the Y opening
    pub fn y_half_width(&self) -> f64 {
        (self.y[1] - self.y[0]).abs() / 2.0
    }
}

/// Source position and the source → isocenter orientation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourcePose {
    /// Source position
    pub position: Point3,
    /// Couch, gantry and SAD offset composed in that order
    pub orientation: Mat4,
}

fn checked_source_axis_distance(source_axis_distance: Option<f64>) -> Result<f64, BeamError> {
    let sad = source_axis_distance.ok_or(BeamError::MissingSourceAxisDistance)?;
    if !(sad.is_finite() && sad > 0.0) {
        return Err(BeamError::InvalidSourceAxisDistance(sad));
    }
    Ok(sad)
}

/// Source → isocenter orientation for the given angles and SAD
///
/// `couch ∘ gantry ∘ source`: the source offset is applied first, then the
/// gantry rotation, then the couch rotation taken back out.
pub fn source_orientation(gantry_angle: f64, couch_angle: f64, source_axis_distance: f64) -> Mat4 {
    let couch_to_isocenter = Mat4::rotation_z_deg(-couch_angle);
    let gantry_to_couch = Mat4::rotation_y_deg(gantry_angle);
    let source_to_gantry = Mat4::translation(Vec3::new(0.0, 0.0, source_axis_distance));

    couch_to_isocenter * gantry_to_couch * source_to_gantry
}

/// Radiation source position and orientation
///
/// The position is expressed in a frame centred on the isocenter whose axes
/// follow the patient support: couch rotation shows up as the source
/// swinging the other way around the isocenter.
pub fn compute_source_position(
    isocenter: Option<&Point3>,
    gantry_angle: f64,
    couch_angle: f64,
    source_axis_distance: Option<f64>,
) -> Result<SourcePose, BeamError> {
    let isocenter = isocenter.ok_or(BeamError::MissingIsocenter)?;
    let sad = checked_source_axis_distance(source_axis_distance)?;

    let orientation = source_orientation(gantry_angle, couch_angle, sad);
    let position = *isocenter + orientation.transform_point(&Point3::origin()).coords;

    Ok(SourcePose { position, orientation })
}

/// Source position in patient RAS, read through the frame tree
///
/// The source is the point on the collimator axis at the source-axis
/// distance, so table displacements and eccentric rotation are included.
pub fn source_position_in_ras(tree: &FrameTree, source_axis_distance: f64) -> Result<Point3, BeamError> {
    let sad = checked_source_axis_distance(Some(source_axis_distance))?;
    let collimator_to_ras = tree.get_transform_between(CoordinateFrame::Collimator, CoordinateFrame::Ras)?;
    Ok(collimator_to_ras.transform_point(&Point3::new(0.0, 0.0, sad)))
}

/// Inputs of one treatment beam
///
/// Every derived quantity is recomputed from these on request; nothing is
/// cached.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BeamGeometry {
    /// Isocenter in patient RAS (mm)
    pub isocenter: Option<Point3>,
    /// Gantry angle (degrees)
    pub gantry_angle: f64,
    /// Collimator angle (degrees)
    pub collimator_angle: f64,
    /// Couch angle (degrees)
    pub couch_angle: f64,
    /// Source-axis distance (mm)
    pub source_axis_distance: Option<f64>,
    /// Collimator opening
    pub jaw_positions: Option<JawPositions>,
}

impl BeamGeometry {
    /// Beam inputs taken from the live machine state
    pub fn from_parameters(params: &MachineParameterSet, config: &MachineModelConfig) -> Self {
        Self {
            isocenter: Some(params.isocenter),
            gantry_angle: params.gantry_angle,
            collimator_angle: params.collimator_angle,
            couch_angle: params.patient_support_angle,
            source_axis_distance: Some(config.source_axis_distance),
            jaw_positions: None,
        }
    }

    /// Same beam with a collimator opening
    #[must_use]
    pub fn with_jaw_positions(mut self, jaws: JawPositions) -> Self {
        self.jaw_positions = Some(jaws);
        self
    }

    /// Source position and orientation
    pub fn source_pose(&self) -> Result<SourcePose, BeamError> {
        compute_source_position(
            self.isocenter.as_ref(),
            self.gantry_angle,
            self.couch_angle,
            self.source_axis_distance,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f64 = 1e-4;

    #[test]
    fn test_source_above_isocenter_at_rest() {
        let pose = compute_source_position(Some(&Point3::origin()), 0.0, 0.0, Some(1000.0))
            .expect("complete inputs");
        assert_relative_eq!(pose.position, Point3::new(0.0, 0.0, 1000.0), epsilon = EPSILON);
    }

    #[test]
    fn test_gantry_swings_source_about_transverse_axis() {
        let isocenter = Point3::new(10.0, -20.0, 30.0);

        let pose = compute_source_position(Some(&isocenter), 90.0, 0.0, Some(1000.0))
            .expect("complete inputs");
        assert_relative_eq!(pose.position, Point3::new(1010.0, -20.0, 30.0), epsilon = EPSILON);

        let pose = compute_source_position(Some(&isocenter), 270.0, 0.0, Some(1000.0))
            .expect("complete inputs");
        assert_relative_eq!(pose.position, Point3::new(-990.0, -20.0, 30.0), epsilon = EPSILON);
    }

    #[test]
    fn test_couch_rotation_counter_rotates_source() {
        let pose = compute_source_position(Some(&Point3::origin()), 90.0, 90.0, Some(1000.0))
            .expect("complete inputs");
        assert_relative_eq!(pose.position, Point3::new(0.0, -1000.0, 0.0), epsilon = EPSILON);

        // Couch rotation alone leaves a vertical beam where it is
        let pose = compute_source_position(Some(&Point3::origin()), 0.0, 45.0, Some(1000.0))
            .expect("complete inputs");
        assert_relative_eq!(pose.position, Point3::new(0.0, 0.0, 1000.0), epsilon = EPSILON);
    }

    #[test]
    fn test_source_distance_equals_sad() {
        let isocenter = Point3::new(5.0, 5.0, 5.0);
        for (gantry, couch) in [(0.0, 0.0), (33.0, 12.0), (181.0, -70.0), (359.0, 90.0)] {
            let pose = compute_source_position(Some(&isocenter), gantry, couch, Some(1000.0))
                .expect("complete inputs");
            assert_relative_eq!((pose.position - isocenter).norm(), 1000.0, epsilon = EPSILON);
        }
    }

    #[test]
    fn test_missing_inputs_are_reported() {
        assert_eq!(
            compute_source_position(None, 0.0, 0.0, Some(1000.0)),
            Err(BeamError::MissingIsocenter)
        );
        assert_eq!(
            compute_source_position(Some(&Point3::origin()), 0.0, 0.0, None),
            Err(BeamError::MissingSourceAxisDistance)
        );
        assert_eq!(
            compute_source_position(Some(&Point3::origin()), 0.0, 0.0, Some(0.0)),
            Err(BeamError::InvalidSourceAxisDistance(0.0))
        );
        assert!(matches!(
            compute_source_position(Some(&Point3::origin()), 0.0, 0.0, Some(f64::NAN)),
            Err(BeamError::InvalidSourceAxisDistance(_))
        ));
    }

    #[test]
    fn test_geometry_from_parameters() {
        let params = MachineParameterSet {
            gantry_angle: 90.0,
            collimator_angle: 15.0,
            patient_support_angle: 0.0,
            ..MachineParameterSet::at_isocenter(Point3::new(0.0, 0.0, 0.0))
        };
        let geometry = BeamGeometry::from_parameters(&params, &MachineModelConfig::default());

        assert_eq!(geometry.source_axis_distance, Some(1000.0));
        assert!(geometry.jaw_positions.is_none());
        let pose = geometry.source_pose().expect("complete inputs");
        assert_relative_eq!(pose.position, Point3::new(1000.0, 0.0, 0.0), epsilon = EPSILON);

        assert_eq!(BeamGeometry::default().source_pose(), Err(BeamError::MissingIsocenter));
    }

    #[test]
    fn test_jaw_half_widths() {
        let jaws = JawPositions::new(-30.0, 50.0, 20.0, -20.0);
        assert_relative_eq!(jaws.x_half_width(), 40.0);
        assert_relative_eq!(jaws.y_half_width(), 20.0);
        assert_eq!(JawPositions::symmetric(100.0, 60.0), JawPositions::new(-50.0, 50.0, -30.0, 30.0));
    }

    #[test]
    fn test_source_in_ras_matches_axis_permutation() {
        let isocenter = Point3::new(100.0, -50.0, 25.0);
        let params = MachineParameterSet {
            gantry_angle: 40.0,
            patient_support_angle: 20.0,
            ..MachineParameterSet::at_isocenter(isocenter)
        };
        let config = MachineModelConfig::default();
        let mut tree = FrameTree::built();
        tree.recompute_all(&params, &config).expect("tree is built");

        let pose = BeamGeometry::from_parameters(&params, &config)
            .source_pose()
            .expect("complete inputs");
        let in_ras = source_position_in_ras(&tree, config.source_axis_distance).expect("connected");

        // RAS axes are the fixed reference axes permuted, around the isocenter
        let offset = pose.position - isocenter;
        let expected = isocenter + Vec3::new(-offset.x, offset.z, offset.y);
        assert_relative_eq!(in_ras, expected, epsilon = EPSILON);
    }

    #[test]
    fn test_source_in_ras_needs_built_tree() {
        assert_eq!(
            source_position_in_ras(&FrameTree::new(), 1000.0),
            Err(BeamError::Transform(TransformError::TreeNotBuilt))
        );
    }
}
