//! Primitive collision shapes and intersection algorithms
//!
//! Provides the bounding volumes used by the broad phase and the exact
//! triangle-triangle test used by the narrow phase.

use crate::foundation::math::{Point3, Vec3};

/// Axis-Aligned Bounding Box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the bounding box
    pub min: Point3,
    /// Maximum corner of the bounding box
    pub max: Point3,
}

impl Aabb {
    /// Create a new AABB from min and max points
    pub fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// Smallest box enclosing all points, `None` when there are none
    pub fn from_points(points: &[Point3]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut bounds = Self::new(*first, *first);
        for p in rest {
            bounds.min = bounds.min.inf(p);
            bounds.max = bounds.max.sup(p);
        }
        Some(bounds)
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Point3 {
        nalgebra::center(&self.min, &self.max)
    }

    /// Get the extents (half-size) of the AABB
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Check if this AABB contains a point
    pub fn contains_point(&self, point: &Point3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y &&
        point.z >= self.min.z && point.z <= self.max.z
    }

    /// Check if this AABB intersects another AABB (touching counts)
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x &&
        self.min.y <= other.max.y && self.max.y >= other.min.y &&
        self.min.z <= other.max.z && self.max.z >= other.min.z
    }
}

/// A bounding sphere for collision detection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    /// The center position of the sphere in world space
    pub center: Point3,
    /// The radius of the sphere
    pub radius: f64,
}

impl BoundingSphere {
    /// Creates a new bounding sphere with the given center and radius
    pub fn new(center: Point3, radius: f64) -> Self {
        Self { center, radius }
    }

    /// Sphere around a box, enclosing all of its corners
    pub fn enclosing(bounds: &Aabb) -> Self {
        Self::new(bounds.center(), bounds.extents().norm())
    }

    /// Check if this sphere intersects with another
    pub fn intersects(&self, other: &BoundingSphere) -> bool {
        let distance_squared = (self.center - other.center).norm_squared();
        let radius_sum = self.radius + other.radius;
        distance_squared <= radius_sum * radius_sum
    }
}

/// A triangle for collision detection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    /// First vertex
    pub v0: Point3,
    /// Second vertex
    pub v1: Point3,
    /// Third vertex
    pub v2: Point3,
}

impl Triangle {
    /// Creates a new triangle
    pub fn new(v0: Point3, v1: Point3, v2: Point3) -> Self {
        Self { v0, v1, v2 }
    }

    /// Unnormalized face normal (right-hand rule); zero for degenerate triangles
    pub fn normal(&self) -> Vec3 {
        (self.v1 - self.v0).cross(&(self.v2 - self.v0))
    }

    /// Edge vectors v0→v1, v1→v2, v2→v0
    pub fn edges(&self) -> [Vec3; 3] {
        [self.v1 - self.v0, self.v2 - self.v1, self.v0 - self.v2]
    }

    /// Bounding box of the triangle
    pub fn bounds(&self) -> Aabb {
        Aabb::new(self.v0.inf(&self.v1).inf(&self.v2), self.v0.sup(&self.v1).sup(&self.v2))
    }

    fn project(&self, axis: &Vec3) -> (f64, f64) {
        let p0 = axis.dot(&self.v0.coords);
        let p1 = axis.dot(&self.v1.coords);
        let p2 = axis.dot(&self.v2.coords);
        (p0.min(p1).min(p2), p0.max(p1).max(p2))
    }

    /// Longest segment spanned by the vertices
    ///
    /// For a zero-area triangle this is the segment covering all three points.
    pub fn span(&self) -> (Point3, Point3) {
        [(self.v0, self.v1), (self.v1, self.v2), (self.v2, self.v0)]
            .into_iter()
            .fold((self.v0, self.v1), |longest, (a, b)| {
                if (b - a).norm_squared() > (longest.1 - longest.0).norm_squared() {
                    (a, b)
                } else {
                    longest
                }
            })
    }

    /// Test if the segment `start → end` touches this triangle
    ///
    /// The triangle must have a non-zero area. A segment lying in the
    /// triangle's plane is tested with in-plane separating axes.
    pub fn intersects_segment(&self, start: &Point3, end: &Point3) -> bool {
        let normal = self.normal();
        let area = normal.norm();
        if area <= 0.0 {
            return false;
        }
        let normal = normal / area;
        let edges = self.edges();
        let direction = end - start;

        let scale = edges.iter().map(Vec3::norm).fold(direction.norm(), f64::max);
        let tolerance = 1e-9 * scale.max(1.0);

        let d_start = normal.dot(&(start - self.v0));
        let d_end = normal.dot(&(end - self.v0));
        if (d_start > tolerance && d_end > tolerance) || (d_start < -tolerance && d_end < -tolerance) {
            return false;
        }

        if d_start.abs() <= tolerance && d_end.abs() <= tolerance {
            return !edges
                .iter()
                .chain(std::iter::once(&direction))
                .map(|edge| normal.cross(edge))
                .filter(|axis| axis.norm() > tolerance)
                .any(|axis| {
                    let (min_t, max_t) = self.project(&axis);
                    let p = axis.dot(&start.coords);
                    let q = axis.dot(&end.coords);
                    let slack = tolerance * axis.norm();
                    p.max(q) < min_t - slack || max_t < p.min(q) - slack
                });
        }

        let t = (d_start / (d_start - d_end)).clamp(0.0, 1.0);
        let crossing = start + direction * t;

        // Inside test against each edge in the triangle's plane
        [self.v0, self.v1, self.v2]
            .iter()
            .zip(edges.iter())
            .all(|(corner, edge)| normal.dot(&edge.cross(&(crossing - corner))) >= -tolerance * edge.norm())
    }

    /// Test if this triangle intersects another triangle
    ///
    /// Separating Axis Theorem over the two face normals and the nine
    /// edge-edge cross products. When the triangles are coplanar those axes
    /// collapse, and the in-plane edge normals of both triangles are used
    /// instead. A zero-area triangle is tested as the segment it spans; two
    /// zero-area triangles never intersect. Touching triangles count as
    /// intersecting.
    pub fn intersects_triangle(&self, other: &Triangle) -> bool {
        let edges_a = self.edges();
        let edges_b = other.edges();
        let n_a = self.normal();
        let n_b = other.normal();

        // Scale-aware threshold below which an axis is treated as degenerate
        let scale = edges_a
            .iter()
            .chain(edges_b.iter())
            .map(Vec3::norm_squared)
            .fold(0.0_f64, f64::max);
        let degenerate = scale * scale * 1e-18;

        match (n_a.norm_squared() <= degenerate, n_b.norm_squared() <= degenerate) {
            (false, false) => {}
            (true, false) => {
                let (start, end) = self.span();
                return other.intersects_segment(&start, &end);
            }
            (false, true) => {
                let (start, end) = other.span();
                return self.intersects_segment(&start, &end);
            }
            (true, true) => return false,
        }

        let separated_on = |axis: &Vec3| -> bool {
            if axis.norm_squared() <= degenerate {
                return false;
            }
            let (min_a, max_a) = self.project(axis);
            let (min_b, max_b) = other.project(axis);
            let tolerance = 1e-12 * (max_a.abs().max(max_b.abs()).max(1.0));
            max_a < min_b - tolerance || max_b < min_a - tolerance
        };

        if separated_on(&n_a) || separated_on(&n_b) {
            return false;
        }

        let coplanar = n_a.cross(&n_b).norm_squared() <= degenerate;
        if coplanar {
            return !edges_a
                .iter()
                .map(|edge| n_a.cross(edge))
                .chain(edges_b.iter().map(|edge| n_b.cross(edge)))
                .any(|axis| separated_on(&axis));
        }

        for edge_a in &edges_a {
            for edge_b in &edges_b {
                if separated_on(&edge_a.cross(edge_b)) {
                    return false;
                }
            }
        }

        // No separating axis found = triangles intersect
        true
    }
}
