//! Machine parameters and the parameter → edge dependency graph

use serde::{Deserialize, Serialize};

use super::frames::CoordinateFrame;
use crate::foundation::math::Point3;

/// Live machine state driving the frame tree
///
/// Angles are degrees, displacements millimetres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineParameterSet {
    /// Gantry rotation angle
    pub gantry_angle: f64,
    /// Collimator rotation angle
    pub collimator_angle: f64,
    /// Patient support (couch) rotation angle
    pub patient_support_angle: f64,
    /// Table-top eccentric rotation angle
    pub table_top_eccentric_angle: f64,
    /// Imaging panel extension; positive values slide the panels outward
    pub imaging_panel_extension: f64,
    /// Table-top vertical displacement
    pub table_top_vertical: f64,
    /// Table-top longitudinal displacement
    pub table_top_longitudinal: f64,
    /// Table-top lateral displacement
    pub table_top_lateral: f64,
    /// Isocenter in patient RAS coordinates, as supplied by the plan
    pub isocenter: Point3,
}

impl Default for MachineParameterSet {
    fn default() -> Self {
        Self {
            gantry_angle: 0.0,
            collimator_angle: 0.0,
            patient_support_angle: 0.0,
            table_top_eccentric_angle: 0.0,
            imaging_panel_extension: 0.0,
            table_top_vertical: 0.0,
            table_top_longitudinal: 0.0,
            table_top_lateral: 0.0,
            isocenter: Point3::origin(),
        }
    }
}

impl MachineParameterSet {
    /// Parameters with every axis at rest and the isocenter at the given point
    pub fn at_isocenter(isocenter: Point3) -> Self {
        Self { isocenter, ..Self::default() }
    }
}

/// One input of [`MachineParameterSet`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MachineParameter {
    /// [`MachineParameterSet::gantry_angle`]
    GantryAngle,
    /// [`MachineParameterSet::collimator_angle`]
    CollimatorAngle,
    /// [`MachineParameterSet::patient_support_angle`]
    PatientSupportAngle,
    /// [`MachineParameterSet::table_top_eccentric_angle`]
    TableTopEccentricAngle,
    /// [`MachineParameterSet::imaging_panel_extension`]
    ImagingPanelExtension,
    /// [`MachineParameterSet::table_top_vertical`]
    TableTopVertical,
    /// [`MachineParameterSet::table_top_longitudinal`]
    TableTopLongitudinal,
    /// [`MachineParameterSet::table_top_lateral`]
    TableTopLateral,
    /// [`MachineParameterSet::isocenter`]
    Isocenter,
}

impl MachineParameter {
    /// Every parameter
    pub const ALL: [MachineParameter; 9] = [
        Self::GantryAngle,
        Self::CollimatorAngle,
        Self::PatientSupportAngle,
        Self::TableTopEccentricAngle,
        Self::ImagingPanelExtension,
        Self::TableTopVertical,
        Self::TableTopLongitudinal,
        Self::TableTopLateral,
        Self::Isocenter,
    ];

    /// Frames whose parent edge must be recomputed when this parameter changes
    pub const fn affected_frames(self) -> &'static [CoordinateFrame] {
        match self {
            Self::GantryAngle => &[CoordinateFrame::Gantry],
            Self::CollimatorAngle => &[CoordinateFrame::Collimator],
            Self::PatientSupportAngle => &[CoordinateFrame::PatientSupportRotation],
            Self::TableTopEccentricAngle => &[CoordinateFrame::TableTopEccentricRotation],
            Self::ImagingPanelExtension => {
                &[CoordinateFrame::LeftImagingPanel, CoordinateFrame::RightImagingPanel]
            }
            // The support column telescopes with the table top
            Self::TableTopVertical => &[CoordinateFrame::PatientSupport, CoordinateFrame::TableTop],
            Self::TableTopLongitudinal | Self::TableTopLateral => &[CoordinateFrame::TableTop],
            Self::Isocenter => &[CoordinateFrame::Ras],
        }
    }
}
