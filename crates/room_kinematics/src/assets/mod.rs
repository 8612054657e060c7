//! Mesh assets and the providers that supply them
//!
//! Loading component models from disk and segmenting the patient body are
//! done by the host; this module only defines the boundary the collision
//! detector consumes, plus an in-memory library implementing it.

pub mod mesh;

use std::collections::HashMap;
use std::sync::Arc;

pub use mesh::{MeshError, TriangleMesh};

use crate::foundation::math::{Point3, Vec3};
use crate::physics::MachineComponent;

/// Source of the static surface mesh of each machine component
pub trait MeshProvider {
    /// Mesh of a component in its own frame, if one is available
    fn component_mesh(&self, component: MachineComponent) -> Option<Arc<TriangleMesh>>;
}

/// Source of the patient body surface, keyed by segment identifier
pub trait PatientBodyProvider {
    /// Body surface in patient RAS coordinates, if the segment exists
    fn body_surface(&self, segment_id: &str) -> Option<Arc<TriangleMesh>>;
}

/// In-memory mesh store implementing both provider traits
#[derive(Debug, Clone, Default)]
pub struct MeshLibrary {
    components: HashMap<MachineComponent, Arc<TriangleMesh>>,
    segments: HashMap<String, Arc<TriangleMesh>>,
}

impl MeshLibrary {
    /// Create an empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the mesh of a machine component, replacing any previous one
    pub fn insert_component(&mut self, component: MachineComponent, mesh: TriangleMesh) {
        self.components.insert(component, Arc::new(mesh));
    }

    /// Store a segmented surface under an identifier
    pub fn insert_segment(&mut self, segment_id: impl Into<String>, mesh: TriangleMesh) {
        self.segments.insert(segment_id.into(), Arc::new(mesh));
    }

    /// Remove a segment, returning it if present
    pub fn remove_segment(&mut self, segment_id: &str) -> Option<Arc<TriangleMesh>> {
        self.segments.remove(segment_id)
    }

    /// Number of component meshes stored
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Block models of every machine component, for demos and tests
    ///
    /// Each block is given in its component's own frame (mm). At rest none of
    /// the blocks touch.
    pub fn placeholder_machine() -> Self {
        let blocks = [
            // Treatment head above the isocenter
            (MachineComponent::Gantry, [0.0, 0.0, 750.0], [250.0, 300.0, 250.0]),
            (MachineComponent::Collimator, [0.0, 0.0, 450.0], [150.0, 150.0, 50.0]),
            (MachineComponent::LeftImagingPanel, [-700.0, 0.0, 0.0], [20.0, 200.0, 100.0]),
            (MachineComponent::RightImagingPanel, [700.0, 0.0, 0.0], [20.0, 200.0, 100.0]),
            // Column under the foot end of the table
            (MachineComponent::PatientSupport, [0.0, -1000.0, -800.0], [200.0, 200.0, 550.0]),
            (MachineComponent::TableTop, [0.0, -500.0, -200.0], [250.0, 1000.0, 25.0]),
        ];

        let mut library = Self::new();
        for (component, center, half_extents) in blocks {
            library.insert_component(
                component,
                TriangleMesh::cuboid(Point3::from(center), Vec3::from(half_extents)),
            );
        }
        library
    }
}

impl MeshProvider for MeshLibrary {
    fn component_mesh(&self, component: MachineComponent) -> Option<Arc<TriangleMesh>> {
        self.components.get(&component).cloned()
    }
}

impl PatientBodyProvider for MeshLibrary {
    fn body_surface(&self, segment_id: &str) -> Option<Arc<TriangleMesh>> {
        self.segments.get(segment_id).cloned()
    }
}
