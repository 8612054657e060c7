//! # Core Module
//!
//! Shared configuration that the kinematic, beam and collision subsystems
//! are parameterised by.
//!
//! ## Organization
//!
//! - **Config**: machine calibration and collision settings
//! - **Foundation**: re-exported low-level utilities (math, logging)

pub mod config;

pub use crate::foundation;

pub use config::{CollisionConfig, MachineModelConfig, RoomConfig};
pub use crate::config::{Config, ConfigError};
