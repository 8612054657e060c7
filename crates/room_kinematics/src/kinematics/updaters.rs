//! Edge transform updaters
//!
//! One builder per tree edge. Each returns the child→parent matrix of exactly
//! one frame from the scalar inputs that drive it. Composition is
//! pre-multiply: the factor written rightmost is applied to geometry first.
//!
//! Axis conventions (IEC 61217): the gantry turns about Y, the collimator,
//! couch and eccentric stage about Z, and +Z is vertical.

use super::frames::CoordinateFrame;
use super::parameters::MachineParameterSet;
use crate::core::config::MachineModelConfig;
use crate::foundation::math::{Mat4, Mat4Ext, Point3, Vec3};

/// IEC fixed reference → patient RAS axis permutation
///
/// x flips to the patient's right, the longitudinal axis becomes superior and
/// the vertical axis becomes anterior. The matrix is its own inverse.
pub fn fixed_reference_to_ras_axes() -> Mat4 {
    Mat4::new(
        -1.0, 0.0, 0.0, 0.0,
        0.0, 0.0, 1.0, 0.0,
        0.0, 1.0, 0.0, 0.0,
        0.0, 0.0, 0.0, 1.0,
    )
}

/// Gantry → FixedReference: rotation about the transverse (Y) axis
pub fn gantry_to_fixed_reference(gantry_angle: f64) -> Mat4 {
    Mat4::rotation_y_deg(gantry_angle)
}

/// Collimator → Gantry: rotation about the beam axis around the actual
/// rotation center, which sits slightly off the nominal one
pub fn collimator_to_gantry(collimator_angle: f64, rotation_center: Vec3) -> Mat4 {
    Mat4::translation(rotation_center)
        * Mat4::rotation_z_deg(collimator_angle)
        * Mat4::translation(-rotation_center)
}

/// Fold-out rotation of an imaging panel for a given extension
///
/// The rotation reaches `max_rotation` at zero extension and never exceeds it.
pub fn imaging_panel_rotation(panel_extension: f64, max_rotation: f64) -> f64 {
    (max_rotation - panel_extension).min(max_rotation)
}

fn imaging_panel_to_gantry(
    panel_extension: f64,
    max_rotation: f64,
    isocenter_offset: Vec3,
    rotation_sign: f64,
) -> Mat4 {
    let angle = rotation_sign * imaging_panel_rotation(panel_extension, max_rotation);

    let hinge = Mat4::translation(isocenter_offset)
        * Mat4::rotation_z_deg(angle)
        * Mat4::translation(-isocenter_offset);

    if panel_extension > 0.0 {
        // Past full rotation the panel slides out linearly
        hinge * Mat4::translation(Vec3::new(0.0, -panel_extension, 0.0))
    } else {
        hinge
    }
}

/// LeftImagingPanel → Gantry
pub fn left_imaging_panel_to_gantry(panel_extension: f64, config: &MachineModelConfig) -> Mat4 {
    imaging_panel_to_gantry(
        panel_extension,
        config.imaging_panel_max_rotation,
        config.left_panel_offset(),
        1.0,
    )
}

/// RightImagingPanel → Gantry, mirror image of the left panel
pub fn right_imaging_panel_to_gantry(panel_extension: f64, config: &MachineModelConfig) -> Mat4 {
    imaging_panel_to_gantry(
        panel_extension,
        config.imaging_panel_max_rotation,
        config.right_panel_offset(),
        -1.0,
    )
}

/// PatientSupportRotation → FixedReference: couch rotation about the vertical axis
pub fn patient_support_rotation_to_fixed_reference(patient_support_angle: f64) -> Mat4 {
    Mat4::rotation_z_deg(patient_support_angle)
}

/// Vertical scale factor of the support column for a table-top displacement
pub fn patient_support_scale(table_top_vertical: f64, config: &MachineModelConfig) -> f64 {
    (config.patient_support_base_height
        + table_top_vertical * config.patient_support_displacement_gain)
        / config.patient_support_reference_height
}

/// PatientSupport → PatientSupportRotation: the telescoping column
///
/// The column is stretched rather than moved: lift the anchor to the origin,
/// scale along Z, and drop it back so the anchor stays on the floor.
pub fn patient_support_to_rotation(table_top_vertical: f64, config: &MachineModelConfig) -> Mat4 {
    let anchor = Vec3::new(0.0, 0.0, config.patient_support_anchor_offset);
    let scale = patient_support_scale(table_top_vertical, config);

    Mat4::translation(-anchor)
        * Mat4::scaling(Vec3::new(1.0, 1.0, scale))
        * Mat4::translation(anchor)
}

/// TableTopEccentricRotation → PatientSupportRotation
pub fn table_top_eccentric_to_rotation(eccentric_angle: f64) -> Mat4 {
    Mat4::rotation_z_deg(eccentric_angle)
}

/// TableTop → TableTopEccentricRotation: lateral, longitudinal, vertical shift
pub fn table_top_to_eccentric(lateral: f64, longitudinal: f64, vertical: f64) -> Mat4 {
    Mat4::translation(Vec3::new(lateral, longitudinal, vertical))
}

/// Ras → Patient: image space placed so the isocenter lands on the room origin
pub fn ras_to_patient(isocenter: &Point3) -> Mat4 {
    let axes = fixed_reference_to_ras_axes();
    Mat4::translation(-axes.transform_vector(&isocenter.coords)) * axes
}

/// Local (child → parent) transform of a frame for the given inputs
///
/// The root has no parent edge and yields the identity.
pub fn edge_transform(
    frame: CoordinateFrame,
    params: &MachineParameterSet,
    config: &MachineModelConfig,
) -> Mat4 {
    match frame {
        CoordinateFrame::FixedReference | CoordinateFrame::Patient => Mat4::identity(),
        CoordinateFrame::Gantry => gantry_to_fixed_reference(params.gantry_angle),
        CoordinateFrame::Collimator => {
            collimator_to_gantry(params.collimator_angle, config.collimator_center())
        }
        CoordinateFrame::LeftImagingPanel => {
            left_imaging_panel_to_gantry(params.imaging_panel_extension, config)
        }
        CoordinateFrame::RightImagingPanel => {
            right_imaging_panel_to_gantry(params.imaging_panel_extension, config)
        }
        CoordinateFrame::PatientSupportRotation => {
            patient_support_rotation_to_fixed_reference(params.patient_support_angle)
        }
        CoordinateFrame::PatientSupport => {
            patient_support_to_rotation(params.table_top_vertical, config)
        }
        CoordinateFrame::TableTopEccentricRotation => {
            table_top_eccentric_to_rotation(params.table_top_eccentric_angle)
        }
        CoordinateFrame::TableTop => table_top_to_eccentric(
            params.table_top_lateral,
            params.table_top_longitudinal,
            params.table_top_vertical,
        ),
        CoordinateFrame::Ras => ras_to_patient(&params.isocenter),
    }
}
