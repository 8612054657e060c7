//! Gantry sweep demo
//!
//! Builds a treatment room from a configuration file (or the calibrated
//! defaults), places block models of the machine, and sweeps the gantry
//! around a laterally shifted table, logging the beam source and the
//! collision status at each step.
//!
//! Usage: `room_demo [config.toml|config.ron] [table lateral mm]`

use room_kinematics::foundation::logging;
use room_kinematics::prelude::*;
use thiserror::Error;

/// Gantry step of the sweep, degrees
const GANTRY_STEP: f64 = 30.0;

/// Default lateral table shift, mm
const DEFAULT_TABLE_LATERAL: f64 = 400.0;

#[derive(Error, Debug)]
enum DemoError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Room error: {0}")]
    Room(#[from] RoomError),

    #[error("Invalid table lateral shift '{0}'")]
    InvalidLateral(String),
}

/// Patient lying on the table top, in RAS coordinates
fn patient_body() -> TriangleMesh {
    TriangleMesh::cuboid(Point3::new(0.0, -50.0, -450.0), Vec3::new(200.0, 120.0, 750.0))
}

fn run() -> Result<(), DemoError> {
    let mut args = std::env::args().skip(1);

    let config = match args.next() {
        Some(path) => {
            log::info!("Loading room configuration from {}", path);
            RoomConfig::load_from_file(&path)?
        }
        None => {
            log::info!("Using default room configuration");
            RoomConfig::default()
        }
    };

    let lateral = match args.next() {
        Some(value) => value.parse::<f64>().map_err(|_| DemoError::InvalidLateral(value))?,
        None => DEFAULT_TABLE_LATERAL,
    };

    let mut room = TreatmentRoom::new(config)?;
    let registered = room.register_meshes(&MeshLibrary::placeholder_machine());
    log::info!(
        "Registered {} component meshes, detector {:?}",
        registered,
        room.detector().state()
    );

    let mut segmentation = MeshLibrary::new();
    let segment_id = room.config().collision.body_segment_id.clone();
    segmentation.insert_segment(segment_id, patient_body());

    room.set_jaw_positions(JawPositions::symmetric(100.0, 100.0));
    room.set_table_top_displacement(lateral, 0.0, 0.0)?;

    let mut steps = 0;
    let mut colliding_steps = 0;
    let mut gantry = 0.0;
    while gantry < 360.0 {
        room.set_gantry_angle(gantry)?;

        let source = room.source_position()?.position;
        let beam = room.beam_model()?;
        log::debug!("Beam apex at {:?}, {} triangles", beam.apex(), beam.mesh.triangle_count());

        let report = room.check_for_collisions(Some(&segmentation));
        if report.has_collision() {
            colliding_steps += 1;
            log::warn!("Gantry {:>5.1}°: source {:?}", gantry, source);
            for line in report.to_string().lines() {
                log::warn!("  {}", line);
            }
        } else {
            log::info!("Gantry {:>5.1}°: source {:?}, clear", gantry, source);
        }

        steps += 1;
        gantry += GANTRY_STEP;
    }

    log::info!("Sweep finished: {} of {} positions in collision", colliding_steps, steps);
    Ok(())
}

fn main() {
    logging::init_with_default("info");

    log::info!("Starting treatment room demo");

    if let Err(e) = run() {
        log::error!("Demo failed: {}", e);
        std::process::exit(1);
    }
}
