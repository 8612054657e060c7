//! Treatment room state

use crate::{
    assets::{MeshProvider, PatientBodyProvider},
    beam::{self, BeamError, BeamGeometry, BeamModel, JawPositions, SourcePose},
    config::ConfigError,
    core::config::RoomConfig,
    foundation::math::{Mat4, Point3},
    kinematics::{CoordinateFrame, FrameTree, MachineParameter, MachineParameterSet, TransformError},
    physics::{CollisionDetector, CollisionReport},
};
use thiserror::Error;

/// Treatment room
///
/// Owns the machine inputs, the frame tree and the collision detector. Every
/// setter recomputes the edges its input drives before returning, so the
/// tree never holds stale transforms.
#[derive(Debug, Clone)]
pub struct TreatmentRoom {
    /// Room configuration
    config: RoomConfig,

    /// Current machine inputs
    params: MachineParameterSet,

    /// Kinematic chain
    tree: FrameTree,

    /// Collision checks over the machine meshes
    detector: CollisionDetector,

    /// Collimator opening of the current beam
    jaw_positions: Option<JawPositions>,
}

impl TreatmentRoom {
    /// Create a room with every axis at rest
    pub fn new(config: RoomConfig) -> Result<Self, RoomError> {
        Self::with_parameters(config, MachineParameterSet::default())
    }

    /// Create a room at the given machine state
    pub fn with_parameters(config: RoomConfig, params: MachineParameterSet) -> Result<Self, RoomError> {
        config.validate()?;

        log::info!("Initializing treatment room...");
        let mut tree = FrameTree::built();
        tree.recompute_all(&params, &config.machine)?;
        let detector = CollisionDetector::new(config.collision.clone());

        Ok(Self { config, params, tree, detector, jaw_positions: None })
    }

    /// Room configuration
    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Current machine inputs
    pub fn parameters(&self) -> &MachineParameterSet {
        &self.params
    }

    /// Kinematic chain at the current inputs
    pub fn tree(&self) -> &FrameTree {
        &self.tree
    }

    /// Collision detector
    pub fn detector(&self) -> &CollisionDetector {
        &self.detector
    }

    /// Collision detector, for registering meshes and placements
    pub fn detector_mut(&mut self) -> &mut CollisionDetector {
        &mut self.detector
    }

    /// Register every machine mesh a provider can supply
    pub fn register_meshes(&mut self, provider: &dyn MeshProvider) -> usize {
        self.detector.register_from(provider)
    }

    fn apply(&mut self, parameter: MachineParameter) -> Result<(), RoomError> {
        self.tree.apply_change(parameter, &self.params, &self.config.machine)?;
        log::debug!("Applied {:?}", parameter);
        Ok(())
    }

    /// Set the gantry angle (degrees)
    pub fn set_gantry_angle(&mut self, angle: f64) -> Result<(), RoomError> {
        self.params.gantry_angle = angle;
        self.apply(MachineParameter::GantryAngle)
    }

    /// Set the collimator angle (degrees)
    pub fn set_collimator_angle(&mut self, angle: f64) -> Result<(), RoomError> {
        self.params.collimator_angle = angle;
        self.apply(MachineParameter::CollimatorAngle)
    }

    /// Set the patient support angle (degrees)
    pub fn set_patient_support_angle(&mut self, angle: f64) -> Result<(), RoomError> {
        self.params.patient_support_angle = angle;
        self.apply(MachineParameter::PatientSupportAngle)
    }

    /// Set the table-top eccentric angle (degrees)
    pub fn set_table_top_eccentric_angle(&mut self, angle: f64) -> Result<(), RoomError> {
        self.params.table_top_eccentric_angle = angle;
        self.apply(MachineParameter::TableTopEccentricAngle)
    }

    /// Set the imaging panel extension (mm)
    pub fn set_imaging_panel_extension(&mut self, extension: f64) -> Result<(), RoomError> {
        self.params.imaging_panel_extension = extension;
        self.apply(MachineParameter::ImagingPanelExtension)
    }

    /// Set the table-top lateral, longitudinal and vertical displacement (mm)
    pub fn set_table_top_displacement(
        &mut self,
        lateral: f64,
        longitudinal: f64,
        vertical: f64,
    ) -> Result<(), RoomError> {
        self.params.table_top_lateral = lateral;
        self.params.table_top_longitudinal = longitudinal;
        self.params.table_top_vertical = vertical;
        self.apply(MachineParameter::TableTopLateral)?;
        self.apply(MachineParameter::TableTopLongitudinal)?;
        self.apply(MachineParameter::TableTopVertical)
    }

    /// Set the isocenter (patient RAS, mm)
    pub fn set_isocenter(&mut self, isocenter: Point3) -> Result<(), RoomError> {
        self.params.isocenter = isocenter;
        self.apply(MachineParameter::Isocenter)
    }

    /// Set the collimator opening of the current beam
    pub fn set_jaw_positions(&mut self, jaws: JawPositions) {
        self.jaw_positions = Some(jaws);
    }

    /// Replace every input at once and recompute the whole tree
    pub fn set_parameters(&mut self, params: MachineParameterSet) -> Result<(), RoomError> {
        self.params = params;
        self.recompute_all()
    }

    /// Recompute every edge from the current inputs
    pub fn recompute_all(&mut self) -> Result<(), RoomError> {
        self.tree.recompute_all(&self.params, &self.config.machine)?;
        Ok(())
    }

    /// Pose of a frame in the fixed reference
    pub fn world_transform(&self, frame: CoordinateFrame) -> Result<Mat4, RoomError> {
        Ok(self.tree.world_transform(frame)?)
    }

    /// Transform mapping `from` coordinates into `to` coordinates
    pub fn transform_between(&self, from: CoordinateFrame, to: CoordinateFrame) -> Result<Mat4, RoomError> {
        Ok(self.tree.get_transform_between(from, to)?)
    }

    /// Snapshot of the current beam inputs
    pub fn beam_geometry(&self) -> BeamGeometry {
        let geometry = BeamGeometry::from_parameters(&self.params, &self.config.machine);
        match self.jaw_positions {
            Some(jaws) => geometry.with_jaw_positions(jaws),
            None => geometry,
        }
    }

    /// Source position and orientation of the current beam
    pub fn source_position(&self) -> Result<SourcePose, RoomError> {
        Ok(self.beam_geometry().source_pose()?)
    }

    /// Source position in patient RAS, including table displacements
    pub fn source_position_in_ras(&self) -> Result<Point3, RoomError> {
        Ok(beam::source_position_in_ras(&self.tree, self.config.machine.source_axis_distance)?)
    }

    /// Beam solid of the current beam
    pub fn beam_model(&self) -> Result<BeamModel, RoomError> {
        Ok(self.beam_geometry().beam_model()?)
    }

    /// Check every collision pair at the current inputs
    pub fn check_for_collisions(&self, body_provider: Option<&dyn PatientBodyProvider>) -> CollisionReport {
        self.detector.check_for_collisions(&self.tree, body_provider)
    }
}

/// Treatment room errors
#[derive(Error, Debug)]
pub enum RoomError {
    /// Room configuration rejected
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Frame tree could not compose a transform
    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    /// Beam inputs incomplete
    #[error("Beam error: {0}")]
    Beam(#[from] BeamError),
}
