//! Math utilities and types
//!
//! Homogeneous 4x4 transforms in double precision. Every transform in the
//! room is expressed in millimetres; angles enter the API in degrees.

pub use nalgebra::{Matrix4, Vector3};

/// 3D vector type
pub type Vec3 = Vector3<f64>;

/// 4x4 homogeneous transform type
pub type Mat4 = Matrix4<f64>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f64>;

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f64 = std::f64::consts::PI;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f64 = PI / 180.0;
}

/// Math utility functions
pub mod utils {
    use super::constants;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f64) -> f64 {
        degrees * constants::DEG_TO_RAD
    }
}

/// Extension trait for Mat4 with the constructors the kinematic chain needs
pub trait Mat4Ext {
    /// Rotation about the X axis, angle in degrees
    fn rotation_x_deg(angle: f64) -> Mat4;

    /// Rotation about the Y axis, angle in degrees
    fn rotation_y_deg(angle: f64) -> Mat4;

    /// Rotation about the Z axis, angle in degrees
    fn rotation_z_deg(angle: f64) -> Mat4;

    /// Pure translation
    fn translation(offset: Vec3) -> Mat4;

    /// Non-uniform scale along the three axes
    fn scaling(factors: Vec3) -> Mat4;

    /// Rotation/scale block with the translation column cleared
    fn linear_part(&self) -> Mat4;

    /// Translation column as a vector
    fn translation_part(&self) -> Vec3;
}

impl Mat4Ext for Mat4 {
    fn rotation_x_deg(angle: f64) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::x_axis(), utils::deg_to_rad(angle))
    }

    fn rotation_y_deg(angle: f64) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::y_axis(), utils::deg_to_rad(angle))
    }

    fn rotation_z_deg(angle: f64) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::z_axis(), utils::deg_to_rad(angle))
    }

    fn translation(offset: Vec3) -> Mat4 {
        Mat4::new_translation(&offset)
    }

    fn scaling(factors: Vec3) -> Mat4 {
        Mat4::new_nonuniform_scaling(&factors)
    }

    fn linear_part(&self) -> Mat4 {
        let mut result = *self;
        result[(0, 3)] = 0.0;
        result[(1, 3)] = 0.0;
        result[(2, 3)] = 0.0;
        result
    }

    fn translation_part(&self) -> Vec3 {
        Vec3::new(self[(0, 3)], self[(1, 3)], self[(2, 3)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f64 = 1e-12;

    #[test]
    fn test_right_handed_rotations() {
        // Quarter turns must follow the right-hand rule on each axis
        let x = Vec3::x();
        let y = Vec3::y();
        let z = Vec3::z();

        assert_relative_eq!(Mat4::rotation_z_deg(90.0).transform_vector(&x), y, epsilon = EPSILON);
        assert_relative_eq!(Mat4::rotation_x_deg(90.0).transform_vector(&y), z, epsilon = EPSILON);
        assert_relative_eq!(Mat4::rotation_y_deg(90.0).transform_vector(&z), x, epsilon = EPSILON);
    }

    #[test]
    fn test_translation_and_linear_parts() {
        let m = Mat4::translation(Vec3::new(1.0, 2.0, 3.0)) * Mat4::rotation_z_deg(30.0);

        assert_relative_eq!(m.translation_part(), Vec3::new(1.0, 2.0, 3.0), epsilon = EPSILON);
        assert_relative_eq!(m.linear_part(), Mat4::rotation_z_deg(30.0), epsilon = EPSILON);
    }

    #[test]
    fn test_scaling_is_non_uniform() {
        let m = Mat4::scaling(Vec3::new(1.0, 1.0, 2.5));
        let p = m.transform_point(&Point3::new(4.0, 5.0, 2.0));
        assert_relative_eq!(p, Point3::new(4.0, 5.0, 5.0), epsilon = EPSILON);
    }

    #[test]
    fn test_angle_conversion() {
        assert_relative_eq!(utils::deg_to_rad(180.0), constants::PI, epsilon = EPSILON);
        assert_relative_eq!(utils::deg_to_rad(-90.0), -constants::PI / 2.0, epsilon = EPSILON);
    }
}
