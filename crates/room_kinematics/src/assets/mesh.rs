//! Indexed triangle surface meshes
//!
//! Component meshes are loaded once by an external provider and shared
//! read-only; every placement produces a new, transformed copy.

use thiserror::Error;

use crate::foundation::math::{Mat4, Point3, Vec3};
use crate::physics::collision::Aabb;

/// Errors raised when assembling a mesh from raw buffers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MeshError {
    /// A triangle references a vertex that does not exist
    #[error("Triangle index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        /// Offending index
        index: u32,
        /// Number of vertices available
        vertex_count: usize,
    },

    /// A flat buffer whose length is not a multiple of three
    #[error("Buffer of length {0} does not hold whole triples")]
    Malformed(usize),
}

/// Surface mesh made of indexed triangles
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TriangleMesh {
    vertices: Vec<Point3>,
    triangles: Vec<[u32; 3]>,
}

impl TriangleMesh {
    /// Create a mesh, checking every index against the vertex list
    pub fn new(vertices: Vec<Point3>, triangles: Vec<[u32; 3]>) -> Result<Self, MeshError> {
        let vertex_count = vertices.len();
        if let Some(&index) = triangles
            .iter()
            .flatten()
            .find(|&&index| index as usize >= vertex_count)
        {
            return Err(MeshError::IndexOutOfRange { index, vertex_count });
        }

        Ok(Self { vertices, triangles })
    }

    /// Create a mesh from flat `xyz` coordinates and flat triangle indices
    pub fn from_buffers(coordinates: &[f64], indices: &[u32]) -> Result<Self, MeshError> {
        if coordinates.len() % 3 != 0 {
            return Err(MeshError::Malformed(coordinates.len()));
        }
        if indices.len() % 3 != 0 {
            return Err(MeshError::Malformed(indices.len()));
        }

        let vertices = coordinates
            .chunks_exact(3)
            .map(|c| Point3::new(c[0], c[1], c[2]))
            .collect();
        let triangles = indices.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect();

        Self::new(vertices, triangles)
    }

    /// Closed axis-aligned box with outward-facing triangles
    pub fn cuboid(center: Point3, half_extents: Vec3) -> Self {
        let (hx, hy, hz) = (half_extents.x, half_extents.y, half_extents.z);
        let vertices = [
            (-hx, -hy, -hz),
            (hx, -hy, -hz),
            (hx, hy, -hz),
            (-hx, hy, -hz),
            (-hx, -hy, hz),
            (hx, -hy, hz),
            (hx, hy, hz),
            (-hx, hy, hz),
        ]
        .iter()
        .map(|&(x, y, z)| center + Vec3::new(x, y, z))
        .collect();

        let triangles = vec![
            [0, 3, 2], [0, 2, 1], // bottom
            [4, 5, 6], [4, 6, 7], // top
            [0, 1, 5], [0, 5, 4], // front
            [2, 3, 7], [2, 7, 6], // back
            [1, 2, 6], [1, 6, 5], // right
            [3, 0, 4], [3, 4, 7], // left
        ];

        Self { vertices, triangles }
    }

    /// Four-sided cone along +X, centred on the origin
    ///
    /// The apex sits at `+height / 2`; the square base at `-height / 2` has
    /// its corners on the Y and Z axes at `radius`.
    pub fn pyramid(radius: f64, height: f64) -> Self {
        let half = height / 2.0;
        let vertices = vec![
            Point3::new(half, 0.0, 0.0),
            Point3::new(-half, radius, 0.0),
            Point3::new(-half, 0.0, radius),
            Point3::new(-half, -radius, 0.0),
            Point3::new(-half, 0.0, -radius),
        ];

        let triangles = vec![
            [0, 1, 2], [0, 2, 3], [0, 3, 4], [0, 4, 1], // sides
            [1, 4, 3], [1, 3, 2],                       // base
        ];

        Self { vertices, triangles }
    }

    /// Vertex positions
    pub fn vertices(&self) -> &[Point3] {
        &self.vertices
    }

    /// Triangle vertex indices
    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    /// Number of triangles
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Whether the mesh has no triangles
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Corner positions of every triangle
    pub fn triangle_corners(&self) -> impl Iterator<Item = [Point3; 3]> + '_ {
        self.triangles.iter().map(move |&[a, b, c]| {
            [
                self.vertices[a as usize],
                self.vertices[b as usize],
                self.vertices[c as usize],
            ]
        })
    }

    /// Copy of this mesh with every vertex mapped through `matrix`
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        Self {
            vertices: self.vertices.iter().map(|v| matrix.transform_point(v)).collect(),
            triangles: self.triangles.clone(),
        }
    }

    /// Axis-aligned bounds of the vertices, `None` for an empty mesh
    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(&self.vertices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Mat4Ext;
    use approx::assert_relative_eq;

    #[test]
    fn test_index_validation() {
        let vertices = vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)];
        assert!(TriangleMesh::new(vertices.clone(), vec![[0, 1, 2]]).is_ok());
        assert_eq!(
            TriangleMesh::new(vertices, vec![[0, 1, 3]]),
            Err(MeshError::IndexOutOfRange { index: 3, vertex_count: 3 })
        );
    }

    #[test]
    fn test_from_buffers() {
        let mesh = TriangleMesh::from_buffers(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0], &[0, 1, 2])
            .expect("well-formed buffers");
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.vertices()[1], Point3::new(1.0, 0.0, 0.0));

        assert_eq!(TriangleMesh::from_buffers(&[0.0, 1.0], &[]), Err(MeshError::Malformed(2)));
    }

    #[test]
    fn test_cuboid_bounds() {
        let mesh = TriangleMesh::cuboid(Point3::new(10.0, 0.0, -5.0), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(mesh.triangle_count(), 12);

        let bounds = mesh.bounds().expect("non-empty mesh");
        assert_relative_eq!(bounds.min, Point3::new(9.0, -2.0, -8.0));
        assert_relative_eq!(bounds.max, Point3::new(11.0, 2.0, -2.0));
    }

    #[test]
    fn test_cuboid_triangles_face_outward() {
        let center = Point3::new(3.0, -1.0, 2.0);
        let mesh = TriangleMesh::cuboid(center, Vec3::new(1.0, 1.0, 1.0));
        for [a, b, c] in mesh.triangle_corners() {
            let normal = (b - a).cross(&(c - a));
            let outward = Point3::from((a.coords + b.coords + c.coords) / 3.0) - center;
            assert!(normal.dot(&outward) > 0.0);
        }
    }

    #[test]
    fn test_pyramid_shape() {
        let mesh = TriangleMesh::pyramid(2.0, 10.0);
        assert_eq!(mesh.triangle_count(), 6);

        let bounds = mesh.bounds().expect("non-empty mesh");
        assert_relative_eq!(bounds.min, Point3::new(-5.0, -2.0, -2.0));
        assert_relative_eq!(bounds.max, Point3::new(5.0, 2.0, 2.0));

        // The origin lies inside the solid, so every face points away from it
        for [a, b, c] in mesh.triangle_corners() {
            let normal = (b - a).cross(&(c - a));
            let centroid = (a.coords + b.coords + c.coords) / 3.0;
            assert!(normal.dot(&centroid) > 0.0);
        }
    }

    #[test]
    fn test_transformed_leaves_source_untouched() {
        let mesh = TriangleMesh::cuboid(Point3::origin(), Vec3::new(1.0, 1.0, 1.0));
        let moved = mesh.transformed(&Mat4::translation(Vec3::new(0.0, 0.0, 100.0)));

        assert_eq!(mesh.bounds().map(|b| b.min.z), Some(-1.0));
        assert_relative_eq!(moved.bounds().map_or(0.0, |b| b.min.z), 99.0);
        assert_eq!(moved.triangles(), mesh.triangles());
    }
}
