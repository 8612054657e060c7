//! # Room Configuration
//!
//! Calibration constants of the modelled treatment machine and the settings
//! of the collision detector, gathered into one serializable structure.
//!
//! ## Configuration Categories
//!
//! - **Machine Model**: imaging panel geometry, collimator rotation center,
//!   patient support telescoping constants, nominal source-axis distance
//! - **Collision**: patient body segment and the configured component pairs
//!
//! The defaults reproduce the calibrated machine; a configuration file only
//! needs to name the values that differ.

use serde::{Deserialize, Serialize};

use crate::config::{Config, ConfigError};
use crate::foundation::math::Vec3;
use crate::physics::MachineComponent;

/// Maximum fold-out rotation of the imaging panels, degrees
pub const IMAGING_PANEL_MAX_ROTATION_DEG: f64 = 68.5;

/// Hinge offset of the left imaging panel relative to the isocenter (gantry frame)
pub const LEFT_IMAGING_PANEL_ISOCENTER_OFFSET: [f64; 3] = [-68.5, 451.786, 0.0];

/// Hinge offset of the right imaging panel relative to the isocenter (gantry frame)
pub const RIGHT_IMAGING_PANEL_ISOCENTER_OFFSET: [f64; 3] = [68.5, 451.786, 0.0];

/// Actual collimator rotation center relative to the nominal one (gantry frame)
pub const COLLIMATOR_ROTATION_CENTER_OFFSET: [f64; 3] = [0.0, 0.0, -0.7];

/// Patient support column height at zero vertical displacement, millimetres
pub const PATIENT_SUPPORT_BASE_HEIGHT: f64 = 906.0;

/// Column height change per millimetre of table-top vertical displacement
pub const PATIENT_SUPPORT_DISPLACEMENT_GAIN: f64 = 1.01;

/// Height of the patient support model as loaded, millimetres
pub const PATIENT_SUPPORT_REFERENCE_HEIGHT: f64 = 900.0;

/// Distance from the isocenter plane down to the column anchor (floor), millimetres
pub const PATIENT_SUPPORT_ANCHOR_OFFSET: f64 = 1359.47;

/// Nominal source-axis distance, millimetres
pub const DEFAULT_SOURCE_AXIS_DISTANCE: f64 = 1000.0;

/// Segment name the patient body surface is requested under
pub const DEFAULT_BODY_SEGMENT_ID: &str = "Body";

/// # Machine Model Configuration
///
/// Calibration values of one treatment-machine model. These are fitted to a
/// specific machine and are not expected to transfer to other models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineModelConfig {
    /// Fully folded-out panel rotation, degrees
    pub imaging_panel_max_rotation: f64,
    /// Left panel hinge offset from the isocenter (gantry frame, mm)
    pub left_imaging_panel_offset: [f64; 3],
    /// Right panel hinge offset from the isocenter (gantry frame, mm)
    pub right_imaging_panel_offset: [f64; 3],
    /// Actual collimator rotation center relative to the nominal one (mm)
    pub collimator_rotation_center: [f64; 3],
    /// Column height at zero vertical displacement (mm)
    pub patient_support_base_height: f64,
    /// Column height change per unit vertical displacement
    pub patient_support_displacement_gain: f64,
    /// Height of the support model as loaded (mm)
    pub patient_support_reference_height: f64,
    /// Depth of the column anchor below the isocenter plane (mm)
    pub patient_support_anchor_offset: f64,
    /// Nominal source-axis distance (mm)
    pub source_axis_distance: f64,
}

impl MachineModelConfig {
    /// Left panel hinge offset as a vector
    pub fn left_panel_offset(&self) -> Vec3 {
        Vec3::from(self.left_imaging_panel_offset)
    }

    /// Right panel hinge offset as a vector
    pub fn right_panel_offset(&self) -> Vec3 {
        Vec3::from(self.right_imaging_panel_offset)
    }

    /// Collimator rotation center offset as a vector
    pub fn collimator_center(&self) -> Vec3 {
        Vec3::from(self.collimator_rotation_center)
    }

    /// Validate the calibration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.source_axis_distance > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "source-axis distance must be positive, got {}",
                self.source_axis_distance
            )));
        }

        if !(self.patient_support_reference_height > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "patient support reference height must be positive, got {}",
                self.patient_support_reference_height
            )));
        }

        if !(self.imaging_panel_max_rotation > 0.0 && self.imaging_panel_max_rotation < 180.0) {
            return Err(ConfigError::Invalid(format!(
                "imaging panel rotation must lie in (0, 180) degrees, got {}",
                self.imaging_panel_max_rotation
            )));
        }

        Ok(())
    }
}

impl Default for MachineModelConfig {
    fn default() -> Self {
        Self {
            imaging_panel_max_rotation: IMAGING_PANEL_MAX_ROTATION_DEG,
            left_imaging_panel_offset: LEFT_IMAGING_PANEL_ISOCENTER_OFFSET,
            right_imaging_panel_offset: RIGHT_IMAGING_PANEL_ISOCENTER_OFFSET,
            collimator_rotation_center: COLLIMATOR_ROTATION_CENTER_OFFSET,
            patient_support_base_height: PATIENT_SUPPORT_BASE_HEIGHT,
            patient_support_displacement_gain: PATIENT_SUPPORT_DISPLACEMENT_GAIN,
            patient_support_reference_height: PATIENT_SUPPORT_REFERENCE_HEIGHT,
            patient_support_anchor_offset: PATIENT_SUPPORT_ANCHOR_OFFSET,
            source_axis_distance: DEFAULT_SOURCE_AXIS_DISTANCE,
        }
    }
}

/// # Collision Configuration
///
/// Which component pairs are tested and where the patient body comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    /// Segment identifier of the patient body surface
    pub body_segment_id: String,
    /// Whether pairs involving the patient body are tested at all
    pub check_patient: bool,
    /// Pairs tested in addition to the fixed machine pairs
    pub extra_pairs: Vec<(MachineComponent, MachineComponent)>,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            body_segment_id: DEFAULT_BODY_SEGMENT_ID.to_string(),
            check_patient: true,
            extra_pairs: Vec::new(),
        }
    }
}

/// # Complete Room Configuration
///
/// Top-level configuration a [`crate::TreatmentRoom`] is built from.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    /// Machine calibration
    pub machine: MachineModelConfig,
    /// Collision detector settings
    pub collision: CollisionConfig,
}

impl RoomConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.machine.validate()?;

        if let Some((a, b)) = self.collision.extra_pairs.iter().find(|(a, b)| a == b) {
            return Err(ConfigError::Invalid(format!(
                "collision pair must name two different components, got {a} and {b}"
            )));
        }

        Ok(())
    }
}

impl Config for RoomConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_calibrated_constants() {
        let config = RoomConfig::default();

        assert_eq!(config.machine.imaging_panel_max_rotation, 68.5);
        assert_eq!(config.machine.patient_support_anchor_offset, 1359.47);
        assert_eq!(config.machine.source_axis_distance, 1000.0);
        assert_eq!(config.collision.body_segment_id, "Body");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_machine() {
        let mut config = RoomConfig::default();
        config.machine.source_axis_distance = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = RoomConfig::default();
        config.machine.imaging_panel_max_rotation = 200.0;
        assert!(config.validate().is_err());

        let mut config = RoomConfig::default();
        config.collision.extra_pairs.push((MachineComponent::Gantry, MachineComponent::Gantry));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let text = r#"
            [machine]
            source_axis_distance = 800.0

            [collision]
            body_segment_id = "Skin"
        "#;

        let config: RoomConfig = toml::from_str(text).expect("partial config should parse");
        assert_eq!(config.machine.source_axis_distance, 800.0);
        assert_eq!(config.machine.patient_support_base_height, 906.0);
        assert_eq!(config.collision.body_segment_id, "Skin");
        assert!(config.collision.check_patient);
    }

    #[test]
    fn test_ron_roundtrip_through_file() {
        let mut config = RoomConfig::default();
        config.collision.extra_pairs.push((MachineComponent::Collimator, MachineComponent::PatientSupport));

        let path = std::env::temp_dir().join(format!("room_config_{}.ron", std::process::id()));
        config.save_to_file(&path).expect("save should succeed");
        let loaded = RoomConfig::load_from_file(&path).expect("load should succeed");
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let result = RoomConfig::default().save_to_file("room.json");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }
}
