//! Collision mesh representations
//!
//! Component meshes are stored in their own frame and never modified. A
//! collision test places a working copy in the common frame, tests it, and
//! drops it again.

use super::primitives::{Aabb, BoundingSphere, Triangle};
use crate::assets::TriangleMesh;
use crate::foundation::math::Mat4;

/// World-space collision mesh (temporary, created on-demand for collision tests)
#[derive(Debug, Clone)]
pub struct WorldSpaceCollisionMesh {
    /// Triangles in the common frame
    pub triangles: Vec<Triangle>,
    /// Bounds of each triangle, same order as `triangles`
    pub triangle_bounds: Vec<Aabb>,
    /// Bounds of the whole mesh, `None` when it has no triangles
    pub bounds: Option<Aabb>,
}

impl WorldSpaceCollisionMesh {
    /// Place a model-space mesh into the common frame
    pub fn from_mesh(mesh: &TriangleMesh, model_to_world: &Mat4) -> Self {
        let triangles: Vec<Triangle> = mesh
            .triangle_corners()
            .map(|[a, b, c]| {
                Triangle::new(
                    model_to_world.transform_point(&a),
                    model_to_world.transform_point(&b),
                    model_to_world.transform_point(&c),
                )
            })
            .collect();

        let triangle_bounds: Vec<Aabb> = triangles.iter().map(Triangle::bounds).collect();
        let bounds = triangle_bounds.iter().copied().reduce(|acc, b| Aabb {
            min: acc.min.inf(&b.min),
            max: acc.max.sup(&b.max),
        });

        Self { triangles, triangle_bounds, bounds }
    }

    /// Bounding sphere of the whole mesh
    pub fn bounding_sphere(&self) -> Option<BoundingSphere> {
        self.bounds.as_ref().map(BoundingSphere::enclosing)
    }

    /// Number of intersecting triangle pairs between two meshes
    ///
    /// Broad phase: bounding spheres, then mesh bounds, then each triangle's
    /// bounds against the other mesh. Narrow phase: exact triangle test.
    pub fn contact_count(&self, other: &WorldSpaceCollisionMesh) -> usize {
        let (Some(bounds_a), Some(bounds_b)) = (self.bounds, other.bounds) else {
            return 0;
        };

        if !BoundingSphere::enclosing(&bounds_a).intersects(&BoundingSphere::enclosing(&bounds_b)) {
            return 0;
        }
        if !bounds_a.intersects(&bounds_b) {
            return 0;
        }

        let candidates_b: Vec<usize> = (0..other.triangles.len())
            .filter(|&j| other.triangle_bounds[j].intersects(&bounds_a))
            .collect();

        let mut contacts = 0;
        for (tri_a, box_a) in self.triangles.iter().zip(&self.triangle_bounds) {
            if !box_a.intersects(&bounds_b) {
                continue;
            }
            for &j in &candidates_b {
                if box_a.intersects(&other.triangle_bounds[j])
                    && tri_a.intersects_triangle(&other.triangles[j])
                {
                    contacts += 1;
                }
            }
        }

        contacts
    }

    /// Test mesh-mesh intersection
    pub fn intersects_mesh(&self, other: &WorldSpaceCollisionMesh) -> bool {
        self.contact_count(other) > 0
    }
}
