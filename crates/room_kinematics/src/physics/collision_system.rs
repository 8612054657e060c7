//! Collision detector for machine components and the patient
//!
//! Pairs of named components are placed in the fixed reference frame and
//! tested mesh against mesh. Results are recomputed on every check and never
//! cached across parameter changes.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::assets::{MeshProvider, PatientBodyProvider, TriangleMesh};
use crate::core::config::CollisionConfig;
use crate::foundation::math::Mat4;
use crate::kinematics::{CoordinateFrame, FrameTree, TransformError};
use crate::physics::collision::WorldSpaceCollisionMesh;

/// Component taking part in collision checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MachineComponent {
    /// Gantry housing
    Gantry,
    /// Collimator head
    Collimator,
    /// Left kV imaging panel
    LeftImagingPanel,
    /// Right kV imaging panel
    RightImagingPanel,
    /// Couch column
    PatientSupport,
    /// Table top
    TableTop,
    /// Patient body surface, supplied per check by segmentation
    PatientBody,
}

impl MachineComponent {
    /// Components whose meshes are static and registered up front
    pub const MACHINE: [MachineComponent; 6] = [
        Self::Gantry,
        Self::Collimator,
        Self::LeftImagingPanel,
        Self::RightImagingPanel,
        Self::PatientSupport,
        Self::TableTop,
    ];

    /// Frame the component's mesh is modelled in
    pub const fn frame(self) -> CoordinateFrame {
        match self {
            Self::Gantry => CoordinateFrame::Gantry,
            Self::Collimator => CoordinateFrame::Collimator,
            Self::LeftImagingPanel => CoordinateFrame::LeftImagingPanel,
            Self::RightImagingPanel => CoordinateFrame::RightImagingPanel,
            Self::PatientSupport => CoordinateFrame::PatientSupport,
            Self::TableTop => CoordinateFrame::TableTop,
            Self::PatientBody => CoordinateFrame::Ras,
        }
    }

    /// Human-readable name used in status reports
    pub const fn label(self) -> &'static str {
        match self {
            Self::Gantry => "gantry",
            Self::Collimator => "collimator",
            Self::LeftImagingPanel => "left imaging panel",
            Self::RightImagingPanel => "right imaging panel",
            Self::PatientSupport => "patient support",
            Self::TableTop => "table top",
            Self::PatientBody => "patient",
        }
    }
}

impl fmt::Display for MachineComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Where a component's world transform comes from
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ComponentPlacement {
    /// Composed from the frame tree
    Frame(CoordinateFrame),
    /// Fixed model → fixed reference matrix supplied by the host
    Matrix(Mat4),
}

impl ComponentPlacement {
    /// Model → fixed reference transform for the current tree state
    pub fn to_world(&self, tree: &FrameTree) -> Result<Mat4, TransformError> {
        match self {
            Self::Frame(frame) => tree.world_transform(*frame),
            Self::Matrix(matrix) => Ok(*matrix),
        }
    }
}

/// Two components tested against each other
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CollisionPair {
    /// First component
    pub first: MachineComponent,
    /// Second component
    pub second: MachineComponent,
}

impl CollisionPair {
    /// Create a new collision pair
    pub const fn new(first: MachineComponent, second: MachineComponent) -> Self {
        Self { first, second }
    }

    /// Whether either side is the patient body
    pub fn involves_patient(&self) -> bool {
        self.first == MachineComponent::PatientBody || self.second == MachineComponent::PatientBody
    }

    /// Same two components, regardless of order
    pub fn same_components(&self, other: &CollisionPair) -> bool {
        (self.first == other.first && self.second == other.second)
            || (self.first == other.second && self.second == other.first)
    }
}

impl fmt::Display for CollisionPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} and {}", self.first, self.second)
    }
}

/// Pairs checked on every machine
pub const FIXED_PAIRS: [CollisionPair; 7] = [
    CollisionPair::new(MachineComponent::Gantry, MachineComponent::TableTop),
    CollisionPair::new(MachineComponent::Gantry, MachineComponent::PatientSupport),
    CollisionPair::new(MachineComponent::Collimator, MachineComponent::TableTop),
    CollisionPair::new(MachineComponent::Gantry, MachineComponent::PatientBody),
    CollisionPair::new(MachineComponent::Collimator, MachineComponent::PatientBody),
    CollisionPair::new(MachineComponent::LeftImagingPanel, MachineComponent::TableTop),
    CollisionPair::new(MachineComponent::RightImagingPanel, MachineComponent::TableTop),
];

/// Registration state of the detector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorState {
    /// Some machine mesh is still missing
    Idle,
    /// Every machine mesh referenced by a pair is registered
    Armed,
}

/// Outcome of testing one pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairResult {
    /// The pair tested
    pub pair: CollisionPair,
    /// Intersecting triangle pairs, `None` when the pair was skipped
    pub contacts: Option<usize>,
}

impl PairResult {
    /// Whether the pair was tested and found touching
    pub fn is_colliding(&self) -> bool {
        self.contacts.is_some_and(|count| count > 0)
    }
}

/// Result of checking every pair
///
/// `Display` renders the status text: one line per colliding pair, nothing
/// when the room is clear.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollisionReport {
    /// Per-pair outcomes in pair order
    pub results: Vec<PairResult>,
}

impl CollisionReport {
    /// Pairs found colliding
    pub fn colliding_pairs(&self) -> impl Iterator<Item = CollisionPair> + '_ {
        self.results.iter().filter(|r| r.is_colliding()).map(|r| r.pair)
    }

    /// Whether any pair collides
    pub fn has_collision(&self) -> bool {
        self.results.iter().any(PairResult::is_colliding)
    }

    /// Pairs that could not be tested
    pub fn skipped_pairs(&self) -> impl Iterator<Item = CollisionPair> + '_ {
        self.results.iter().filter(|r| r.contacts.is_none()).map(|r| r.pair)
    }

    /// Contact count of a pair, if it was tested
    pub fn contacts(&self, pair: &CollisionPair) -> Option<usize> {
        self.results
            .iter()
            .find(|r| r.pair.same_components(pair))
            .and_then(|r| r.contacts)
    }
}

impl fmt::Display for CollisionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for pair in self.colliding_pairs() {
            writeln!(f, "Collision between {pair}")?;
        }
        Ok(())
    }
}

/// Collision detector over a fixed set of component pairs
#[derive(Debug, Clone)]
pub struct CollisionDetector {
    meshes: HashMap<MachineComponent, Arc<TriangleMesh>>,
    placements: HashMap<MachineComponent, ComponentPlacement>,
    pairs: Vec<CollisionPair>,
    config: CollisionConfig,
    state: DetectorState,
}

impl CollisionDetector {
    /// Create a detector with the fixed pairs plus the configured extra pairs
    pub fn new(config: CollisionConfig) -> Self {
        let mut detector = Self {
            meshes: HashMap::new(),
            placements: HashMap::new(),
            pairs: FIXED_PAIRS.to_vec(),
            config,
            state: DetectorState::Idle,
        };

        let extra = detector.config.extra_pairs.clone();
        for (first, second) in extra {
            detector.add_pair(CollisionPair::new(first, second));
        }

        detector
    }

    /// Add a pair to test; duplicates and self-pairs are ignored
    pub fn add_pair(&mut self, pair: CollisionPair) -> bool {
        if pair.first == pair.second || self.pairs.iter().any(|p| p.same_components(&pair)) {
            return false;
        }
        self.pairs.push(pair);
        self.refresh_state();
        true
    }

    /// Pairs tested by [`Self::check_for_collisions`]
    pub fn pairs(&self) -> &[CollisionPair] {
        &self.pairs
    }

    /// Current registration state
    pub fn state(&self) -> DetectorState {
        self.state
    }

    /// Register the static mesh of a machine component
    ///
    /// The patient body is not registered here; it is requested from the
    /// segmentation provider on every check. Meshes without triangles are
    /// rejected.
    pub fn register_mesh(&mut self, component: MachineComponent, mesh: Arc<TriangleMesh>) -> bool {
        if component == MachineComponent::PatientBody {
            log::warn!("Patient body is supplied per check, ignoring static registration");
            return false;
        }
        if mesh.is_empty() {
            log::warn!("Mesh for {} has no triangles, ignoring registration", component);
            return false;
        }

        self.meshes.insert(component, mesh);
        self.refresh_state();
        true
    }

    /// Register every machine mesh a provider can supply
    ///
    /// Returns the number of components registered.
    pub fn register_from(&mut self, provider: &dyn MeshProvider) -> usize {
        let mut registered = 0;
        for component in MachineComponent::MACHINE {
            match provider.component_mesh(component) {
                Some(mesh) if !mesh.is_empty() => {
                    self.meshes.insert(component, mesh);
                    registered += 1;
                }
                Some(_) => log::warn!("Mesh for {} has no triangles, skipping", component),
                None => log::debug!("No mesh available for {}", component),
            }
        }
        self.refresh_state();
        registered
    }

    /// Place a component by frame or by an explicit matrix
    pub fn set_placement(&mut self, component: MachineComponent, placement: ComponentPlacement) {
        self.placements.insert(component, placement);
    }

    /// Current placement source of a component
    pub fn placement(&self, component: MachineComponent) -> ComponentPlacement {
        self.placements
            .get(&component)
            .copied()
            .unwrap_or(ComponentPlacement::Frame(component.frame()))
    }

    fn refresh_state(&mut self) {
        let armed = self
            .pairs
            .iter()
            .flat_map(|pair| [pair.first, pair.second])
            .filter(|&component| component != MachineComponent::PatientBody)
            .all(|component| self.meshes.contains_key(&component));

        let state = if armed { DetectorState::Armed } else { DetectorState::Idle };
        if state != self.state {
            log::debug!("Collision detector {:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }

    fn world_mesh(
        &self,
        component: MachineComponent,
        mesh: &TriangleMesh,
        tree: &FrameTree,
    ) -> Result<WorldSpaceCollisionMesh, TransformError> {
        let to_world = self.placement(component).to_world(tree)?;
        Ok(WorldSpaceCollisionMesh::from_mesh(mesh, &to_world))
    }

    fn mesh_for<'a>(
        &'a self,
        component: MachineComponent,
        body: Option<&'a TriangleMesh>,
    ) -> Option<&'a TriangleMesh> {
        let mesh = if component == MachineComponent::PatientBody {
            body
        } else {
            self.meshes.get(&component).map(|mesh| &**mesh)
        };
        mesh.filter(|mesh| !mesh.is_empty())
    }

    /// Contact count of one pair at the tree's current configuration
    ///
    /// `body` is the patient surface for pairs that involve it. Returns
    /// `None` when a mesh is missing or empty, or a transform is unavailable.
    pub fn update(
        &self,
        pair: &CollisionPair,
        tree: &FrameTree,
        body: Option<&TriangleMesh>,
    ) -> Option<usize> {
        let mesh_a = self.mesh_for(pair.first, body)?;
        let mesh_b = self.mesh_for(pair.second, body)?;

        let placed = self
            .world_mesh(pair.first, mesh_a, tree)
            .and_then(|a| self.world_mesh(pair.second, mesh_b, tree).map(|b| (a, b)));

        match placed {
            Ok((a, b)) => Some(a.contact_count(&b)),
            Err(e) => {
                log::warn!("Cannot place {}: {}", pair, e);
                None
            }
        }
    }

    /// Test every pair and collect the results
    ///
    /// Pairs missing geometry (including the patient when no body surface is
    /// available) are skipped rather than reported as errors.
    pub fn check_for_collisions(
        &self,
        tree: &FrameTree,
        body_provider: Option<&dyn PatientBodyProvider>,
    ) -> CollisionReport {
        let body = if self.config.check_patient {
            body_provider.and_then(|provider| provider.body_surface(&self.config.body_segment_id))
        } else {
            None
        };
        if body.is_none() && self.pairs.iter().any(CollisionPair::involves_patient) {
            log::debug!(
                "Patient body '{}' unavailable, skipping patient pairs",
                self.config.body_segment_id
            );
        }

        let results: Vec<PairResult> = self
            .pairs
            .iter()
            .map(|pair| {
                let contacts = self.update(pair, tree, body.as_deref());
                if contacts.is_none() {
                    log::debug!("Skipped collision pair {}", pair);
                }
                PairResult { pair: *pair, contacts }
            })
            .collect();

        let report = CollisionReport { results };
        if report.has_collision() {
            log::info!("Collisions detected: {}", report.colliding_pairs().count());
        }
        report
    }
}

impl Default for CollisionDetector {
    fn default() -> Self {
        Self::new(CollisionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Mat4Ext, Point3, Vec3};

    fn small_box() -> Arc<TriangleMesh> {
        Arc::new(TriangleMesh::cuboid(Point3::origin(), Vec3::new(10.0, 10.0, 10.0)))
    }

    #[test]
    fn test_fixed_pairs_are_distinct() {
        for (i, a) in FIXED_PAIRS.iter().enumerate() {
            for b in &FIXED_PAIRS[i + 1..] {
                assert!(!a.same_components(b), "{a} listed twice");
            }
        }
    }

    #[test]
    fn test_detector_arms_when_machine_meshes_registered() {
        let mut detector = CollisionDetector::default();
        assert_eq!(detector.state(), DetectorState::Idle);

        for component in MachineComponent::MACHINE {
            assert_eq!(detector.state(), DetectorState::Idle);
            assert!(detector.register_mesh(component, small_box()));
        }
        assert_eq!(detector.state(), DetectorState::Armed);

        // Patient meshes never take part in arming
        assert!(!detector.register_mesh(MachineComponent::PatientBody, small_box()));
        assert_eq!(detector.state(), DetectorState::Armed);
    }

    #[test]
    fn test_empty_meshes_are_not_registered() {
        let mut detector = CollisionDetector::default();
        for component in MachineComponent::MACHINE {
            assert!(!detector.register_mesh(component, Arc::new(TriangleMesh::default())));
        }
        assert_eq!(detector.state(), DetectorState::Idle);

        let mut library = crate::assets::MeshLibrary::new();
        for component in MachineComponent::MACHINE {
            library.insert_component(component, TriangleMesh::default());
        }
        assert_eq!(detector.register_from(&library), 0);
        assert_eq!(detector.state(), DetectorState::Idle);

        let report = detector.check_for_collisions(&FrameTree::built(), None);
        assert_eq!(report.skipped_pairs().count(), FIXED_PAIRS.len());
        assert_eq!(report.contacts(&FIXED_PAIRS[0]), None);
    }

    #[test]
    fn test_empty_body_skips_patient_pair() {
        let mut detector = CollisionDetector::default();
        detector.register_mesh(MachineComponent::Collimator, small_box());

        let tree = FrameTree::built();
        let pair = CollisionPair::new(MachineComponent::Collimator, MachineComponent::PatientBody);
        assert_eq!(detector.update(&pair, &tree, Some(&TriangleMesh::default())), None);
        let body = small_box();
        assert!(detector.update(&pair, &tree, Some(body.as_ref())).is_some());
    }

    #[test]
    fn test_extra_pairs_from_config() {
        let config = CollisionConfig {
            extra_pairs: vec![
                (MachineComponent::Collimator, MachineComponent::PatientSupport),
                (MachineComponent::TableTop, MachineComponent::Gantry),
            ],
            ..CollisionConfig::default()
        };
        let detector = CollisionDetector::new(config);

        // The reversed gantry/table top pair is already fixed
        assert_eq!(detector.pairs().len(), FIXED_PAIRS.len() + 1);
    }

    #[test]
    fn test_report_text() {
        let report = CollisionReport {
            results: vec![
                PairResult { pair: FIXED_PAIRS[0], contacts: Some(4) },
                PairResult { pair: FIXED_PAIRS[1], contacts: Some(0) },
                PairResult { pair: FIXED_PAIRS[3], contacts: None },
                PairResult { pair: FIXED_PAIRS[4], contacts: Some(1) },
            ],
        };

        assert_eq!(
            report.to_string(),
            "Collision between gantry and table top\nCollision between collimator and patient\n"
        );
        assert_eq!(report.skipped_pairs().collect::<Vec<_>>(), vec![FIXED_PAIRS[3]]);
        assert_eq!(report.contacts(&CollisionPair::new(MachineComponent::TableTop, MachineComponent::Gantry)), Some(4));
        assert!(CollisionReport::default().to_string().is_empty());
    }

    #[test]
    fn test_matrix_placement_overrides_frame() {
        let mut detector = CollisionDetector::default();
        detector.register_mesh(MachineComponent::Gantry, small_box());
        detector.register_mesh(MachineComponent::TableTop, small_box());

        let tree = FrameTree::built();
        let pair = FIXED_PAIRS[0];

        // Both boxes at the origin overlap completely
        assert!(detector.update(&pair, &tree, None).is_some_and(|c| c > 0));

        detector.set_placement(
            MachineComponent::TableTop,
            ComponentPlacement::Matrix(Mat4::translation(Vec3::new(0.0, 0.0, -500.0))),
        );
        assert_eq!(detector.update(&pair, &tree, None), Some(0));
    }

    #[test]
    fn test_unbuilt_tree_skips_pairs() {
        let mut detector = CollisionDetector::default();
        detector.register_mesh(MachineComponent::Gantry, small_box());
        detector.register_mesh(MachineComponent::TableTop, small_box());

        let report = detector.check_for_collisions(&FrameTree::new(), None);
        assert!(!report.has_collision());
        assert_eq!(report.skipped_pairs().count(), FIXED_PAIRS.len());
    }
}
