//! Coordinate frame tree and transform composer
//!
//! Frames live in a fixed-size arena indexed by [`CoordinateFrame`]; each
//! slot stores its parent and the local child→parent matrix. Edges are
//! rewritten in place by the updaters and never reallocated.

use thiserror::Error;

use super::frames::CoordinateFrame;
use super::parameters::{MachineParameter, MachineParameterSet};
use super::updaters;
use crate::core::config::MachineModelConfig;
use crate::foundation::math::Mat4;

/// Failures of the transform composer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    /// A frame name that is not part of the room
    #[error("Unknown coordinate frame: {0}")]
    UnknownFrame(String),

    /// The tree has not been built yet
    #[error("Coordinate frame tree has not been built")]
    TreeNotBuilt,

    /// No path connects the two frames
    #[error("No path between frames {from} and {to}")]
    Disconnected {
        /// Source frame
        from: CoordinateFrame,
        /// Target frame
        to: CoordinateFrame,
    },

    /// The composed transform cannot be inverted
    #[error("Transform chain through {frame} is singular")]
    Singular {
        /// Frame whose leg could not be inverted
        frame: CoordinateFrame,
    },
}

/// A node of the frame tree
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameNode {
    /// Identity of this frame
    pub frame: CoordinateFrame,
    /// Parent frame, `None` for the root
    pub parent: Option<CoordinateFrame>,
    /// Pose of this frame in its parent (child → parent)
    pub local: Mat4,
}

/// The room's kinematic chain
#[derive(Debug, Clone, Default)]
pub struct FrameTree {
    nodes: [Option<FrameNode>; CoordinateFrame::COUNT],
}

impl FrameTree {
    /// Create an empty, unbuilt tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a tree that is already built with identity edges
    pub fn built() -> Self {
        let mut tree = Self::new();
        tree.build_tree();
        tree
    }

    /// Create every frame node and wire it to its fixed parent
    ///
    /// Existing nodes are kept as they are, so calling this again is a no-op.
    /// Returns the number of nodes created by this call.
    pub fn build_tree(&mut self) -> usize {
        let mut created = 0;

        for frame in CoordinateFrame::ALL {
            let slot = &mut self.nodes[frame.index()];
            if slot.is_none() {
                *slot = Some(FrameNode {
                    frame,
                    parent: frame.parent(),
                    local: Mat4::identity(),
                });
                created += 1;
            }
        }

        if created > 0 {
            log::info!("Built coordinate frame tree ({} frames created)", created);
        } else {
            log::trace!("Coordinate frame tree already built, reusing existing frames");
        }

        created
    }

    /// Whether every frame node exists
    pub fn is_built(&self) -> bool {
        self.nodes.iter().all(Option::is_some)
    }

    /// Number of frames currently present
    pub fn frame_count(&self) -> usize {
        self.nodes.iter().flatten().count()
    }

    /// Look up a node
    pub fn node(&self, frame: CoordinateFrame) -> Result<&FrameNode, TransformError> {
        self.nodes[frame.index()].as_ref().ok_or(TransformError::TreeNotBuilt)
    }

    /// Look up a node by frame name
    pub fn node_by_name(&self, name: &str) -> Result<&FrameNode, TransformError> {
        self.node(name.parse()?)
    }

    /// Local child → parent transform of a frame
    pub fn local_transform(&self, frame: CoordinateFrame) -> Result<&Mat4, TransformError> {
        self.node(frame).map(|node| &node.local)
    }

    /// Overwrite the local transform of a frame in place
    pub fn set_local_transform(
        &mut self,
        frame: CoordinateFrame,
        local: Mat4,
    ) -> Result<(), TransformError> {
        let node = self.nodes[frame.index()].as_mut().ok_or(TransformError::TreeNotBuilt)?;
        node.local = local;
        Ok(())
    }

    /// Recompute the parent edge of one frame from the machine inputs
    pub fn update_edge(
        &mut self,
        frame: CoordinateFrame,
        params: &MachineParameterSet,
        config: &MachineModelConfig,
    ) -> Result<(), TransformError> {
        let local = updaters::edge_transform(frame, params, config);
        self.set_local_transform(frame, local)?;
        log::trace!("Recomputed edge {} -> {:?}", frame, frame.parent());
        Ok(())
    }

    /// Recompute every edge driven by one changed parameter
    pub fn apply_change(
        &mut self,
        parameter: MachineParameter,
        params: &MachineParameterSet,
        config: &MachineModelConfig,
    ) -> Result<(), TransformError> {
        for &frame in parameter.affected_frames() {
            self.update_edge(frame, params, config)?;
        }
        Ok(())
    }

    /// Recompute every edge of the tree
    pub fn recompute_all(
        &mut self,
        params: &MachineParameterSet,
        config: &MachineModelConfig,
    ) -> Result<(), TransformError> {
        for frame in CoordinateFrame::ALL {
            self.update_edge(frame, params, config)?;
        }
        log::debug!("Recomputed all {} frame edges", CoordinateFrame::COUNT);
        Ok(())
    }

    /// Frames from `frame` up to the root, both included
    fn path_to_root(&self, frame: CoordinateFrame) -> Result<Vec<CoordinateFrame>, TransformError> {
        let mut path = vec![frame];
        let mut current = self.node(frame)?;

        while let Some(parent) = current.parent {
            // A tree path can never be longer than the number of frames
            if path.len() > CoordinateFrame::COUNT {
                return Err(TransformError::Disconnected { from: frame, to: CoordinateFrame::ROOT });
            }
            current = self.node(parent).map_err(|_| TransformError::Disconnected {
                from: frame,
                to: parent,
            })?;
            path.push(parent);
        }

        Ok(path)
    }

    /// Pre-multiplied product of local transforms from `path[0]` up to `ancestor`
    fn chain_to(&self, path: &[CoordinateFrame], ancestor: CoordinateFrame) -> Result<Mat4, TransformError> {
        let mut result = Mat4::identity();
        for &frame in path.iter().take_while(|&&f| f != ancestor) {
            result = self.local_transform(frame)? * result;
        }
        Ok(result)
    }

    /// Transform mapping coordinates in `from` to coordinates in `to`
    ///
    /// Both legs are composed through the lowest common ancestor. The result
    /// for `(b, a)` is the inverse of the result for `(a, b)`.
    pub fn get_transform_between(
        &self,
        from: CoordinateFrame,
        to: CoordinateFrame,
    ) -> Result<Mat4, TransformError> {
        if from == to {
            self.node(from)?;
            return Ok(Mat4::identity());
        }

        let from_path = self.path_to_root(from)?;
        let to_path = self.path_to_root(to)?;

        let common = from_path
            .iter()
            .copied()
            .find(|frame| to_path.contains(frame))
            .ok_or(TransformError::Disconnected { from, to })?;

        let from_to_common = self.chain_to(&from_path, common)?;
        let to_to_common = self.chain_to(&to_path, common)?;

        let common_to_target = to_to_common
            .try_inverse()
            .ok_or(TransformError::Singular { frame: to })?;

        Ok(common_to_target * from_to_common)
    }

    /// Transform between two frames addressed by name
    pub fn get_transform_between_names(&self, from: &str, to: &str) -> Result<Mat4, TransformError> {
        self.get_transform_between(from.parse()?, to.parse()?)
    }

    /// Pose of a frame in the fixed reference (frame → FixedReference)
    pub fn world_transform(&self, frame: CoordinateFrame) -> Result<Mat4, TransformError> {
        self.get_transform_between(frame, CoordinateFrame::ROOT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Mat4Ext, Point3, Vec3};
    use approx::{assert_relative_eq, relative_eq};

    fn posed_tree() -> FrameTree {
        let params = MachineParameterSet {
            gantry_angle: 33.0,
            collimator_angle: -12.0,
            patient_support_angle: 17.0,
            table_top_eccentric_angle: 4.0,
            imaging_panel_extension: 15.0,
            table_top_vertical: -120.0,
            table_top_longitudinal: 300.0,
            table_top_lateral: -25.0,
            isocenter: Point3::new(12.0, -48.0, 230.0),
        };
        let mut tree = FrameTree::built();
        tree.recompute_all(&params, &MachineModelConfig::default()).expect("tree is built");
        tree
    }

    #[test]
    fn test_unbuilt_tree_fails_gracefully() {
        let tree = FrameTree::new();
        assert!(!tree.is_built());
        assert_eq!(
            tree.get_transform_between(CoordinateFrame::Gantry, CoordinateFrame::FixedReference),
            Err(TransformError::TreeNotBuilt)
        );
    }

    #[test]
    fn test_build_tree_is_idempotent() {
        let mut tree = FrameTree::new();
        assert_eq!(tree.build_tree(), CoordinateFrame::COUNT);

        let local = Mat4::translation(Vec3::new(1.0, 2.0, 3.0));
        tree.set_local_transform(CoordinateFrame::TableTop, local).expect("frame exists");

        assert_eq!(tree.build_tree(), 0);
        assert_eq!(tree.frame_count(), CoordinateFrame::COUNT);
        assert_eq!(tree.local_transform(CoordinateFrame::TableTop), Ok(&local));
    }

    #[test]
    fn test_self_transform_is_identity() {
        let tree = posed_tree();
        for frame in CoordinateFrame::ALL {
            let m = tree.get_transform_between(frame, frame).expect("frames are connected");
            assert_relative_eq!(m, Mat4::identity(), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_reverse_transform_is_inverse() {
        let tree = posed_tree();
        for a in CoordinateFrame::ALL {
            for b in CoordinateFrame::ALL {
                let ab = tree.get_transform_between(a, b).expect("frames are connected");
                let ba = tree.get_transform_between(b, a).expect("frames are connected");
                assert!(
                    relative_eq!(ab * ba, Mat4::identity(), epsilon = 1e-4),
                    "{a} <-> {b} are not inverse"
                );
            }
        }
    }

    #[test]
    fn test_composition_law() {
        let tree = posed_tree();
        for a in CoordinateFrame::ALL {
            for b in CoordinateFrame::ALL {
                for c in [CoordinateFrame::Collimator, CoordinateFrame::PatientSupport, CoordinateFrame::Ras] {
                    let ac = tree.get_transform_between(a, c).expect("connected");
                    let ab = tree.get_transform_between(a, b).expect("connected");
                    let bc = tree.get_transform_between(b, c).expect("connected");
                    assert!(
                        relative_eq!(ac, bc * ab, epsilon = 1e-4, max_relative = 1e-9),
                        "composition failed for {a} -> {b} -> {c}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_upward_path_is_pre_multiplied() {
        let tree = posed_tree();
        let expected = tree.local_transform(CoordinateFrame::Gantry).copied().expect("built")
            * tree.local_transform(CoordinateFrame::Collimator).copied().expect("built");
        let composed = tree
            .get_transform_between(CoordinateFrame::Collimator, CoordinateFrame::FixedReference)
            .expect("connected");
        assert_relative_eq!(composed, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_lookup_by_name() {
        let tree = posed_tree();
        let by_name = tree.get_transform_between_names("Collimator", "RAS").expect("known frames");
        let by_enum = tree
            .get_transform_between(CoordinateFrame::Collimator, CoordinateFrame::Ras)
            .expect("connected");
        assert_relative_eq!(by_name, by_enum);

        assert_eq!(
            tree.get_transform_between_names("Collimator", "Wedge"),
            Err(TransformError::UnknownFrame("Wedge".to_string()))
        );
    }

    #[test]
    fn test_singular_leg_is_reported() {
        let mut tree = FrameTree::built();
        tree.set_local_transform(CoordinateFrame::PatientSupport, Mat4::scaling(Vec3::new(1.0, 1.0, 0.0)))
            .expect("frame exists");

        let result = tree.get_transform_between(CoordinateFrame::Gantry, CoordinateFrame::PatientSupport);
        assert_eq!(result, Err(TransformError::Singular { frame: CoordinateFrame::PatientSupport }));
    }

    #[test]
    fn test_apply_change_touches_only_affected_edges() {
        let config = MachineModelConfig::default();
        let mut tree = FrameTree::built();
        let mut params = MachineParameterSet::default();
        tree.recompute_all(&params, &config).expect("built");
        let before = tree.clone();

        params.gantry_angle = 45.0;
        tree.apply_change(MachineParameter::GantryAngle, &params, &config).expect("built");

        for frame in CoordinateFrame::ALL {
            let changed = tree.local_transform(frame) != before.local_transform(frame);
            assert_eq!(changed, frame == CoordinateFrame::Gantry, "unexpected change on {frame}");
        }
    }
}
