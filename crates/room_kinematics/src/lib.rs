//! # Room Kinematics
//!
//! IEC 61217 kinematic model of an external-beam radiotherapy treatment room.
//!
//! ## Features
//!
//! - **Frame Tree**: fixed topology of machine frames with per-edge transforms
//! - **Transform Composer**: transform between any two frames of the tree
//! - **Beam Geometry**: radiation source pose and the pyramidal beam solid
//! - **Collision Detection**: exact mesh-mesh tests between machine parts and
//!   the patient, with a human-readable status report
//! - **Configuration**: machine calibration values from TOML or RON files
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use room_kinematics::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut room = TreatmentRoom::new(RoomConfig::default())?;
//!     room.register_meshes(&MeshLibrary::placeholder_machine());
//!
//!     room.set_gantry_angle(90.0)?;
//!     room.set_table_top_displacement(400.0, 0.0, 0.0)?;
//!
//!     let gantry = room.world_transform(CoordinateFrame::Gantry)?;
//!     println!("{gantry}");
//!     print!("{}", room.check_for_collisions(None));
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Core modules
pub mod core;

pub mod foundation;
pub mod config;
pub mod kinematics;
pub mod beam;
pub mod physics;
pub mod assets;

mod room;

pub use room::{RoomError, TreatmentRoom};

/// Common imports for library users
pub mod prelude {
    pub use crate::{
        TreatmentRoom, RoomError,
        config::{Config, ConfigError},
        core::config::{CollisionConfig, MachineModelConfig, RoomConfig},
        foundation::math::{Mat4, Mat4Ext, Point3, Vec3},
        kinematics::{CoordinateFrame, FrameTree, MachineParameter, MachineParameterSet, TransformError},
        beam::{BeamError, BeamGeometry, BeamModel, JawPositions, SourcePose},
        physics::{
            CollisionDetector, CollisionPair, CollisionReport, ComponentPlacement,
            DetectorState, MachineComponent,
        },
        assets::{MeshLibrary, MeshProvider, PatientBodyProvider, TriangleMesh},
    };
}
