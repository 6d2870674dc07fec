//! Math utilities and types
//!
//! Aliases over `nalgebra` plus the helpers shared by the transform tree,
//! the camera and the renderer. Projection helpers follow OpenGL clip-space
//! conventions: right-handed view space looking down -Z, depth in [-1, 1].

pub use nalgebra::{
    Vector2, Vector3, Vector4,
    Matrix3, Matrix4,
    Quaternion,
    Unit,
};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Unit quaternion used for every rotation in the engine
pub type Quat = Unit<Quaternion<f32>>;

/// Local translation, rotation and scale of a spatial node
///
/// Composed in TRS order: scale first, then rotation, then translation.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Translation relative to the parent
    pub position: Vec3,

    /// Rotation relative to the parent
    pub rotation: Quat,

    /// Component-wise scale
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Transform with only a translation
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Builder: replace the rotation
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Builder: replace the scale
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Compose into a local matrix, `T * R * S`
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;
}

/// Math utility functions
pub mod utils {
    use super::{constants, Quat};

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Build a rotation from Euler angles given in degrees
    ///
    /// `x` rotates about the X axis, `y` about Y and `z` about Z; the
    /// resulting rotation applies X first, then Y, then Z.
    pub fn quat_from_euler_degrees(x: f32, y: f32, z: f32) -> Quat {
        Quat::from_euler_angles(deg_to_rad(x), deg_to_rad(y), deg_to_rad(z))
    }
}

/// Extension trait for Mat4 with the projection and inversion helpers the
/// renderer needs
pub trait Mat4Ext {
    /// OpenGL perspective projection, `fov_y` in radians
    fn perspective_gl(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4;

    /// OpenGL orthographic projection centred on the view axis
    fn orthographic_gl(half_width: f32, half_height: f32, near: f32, far: f32) -> Mat4;

    /// Right-handed view matrix looking from `eye` towards `target`
    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4;

    /// Inverse, or identity when the matrix is singular (zero scale)
    fn inverse_or_identity(&self) -> Mat4;

    /// Copy with the translation column cleared
    fn without_translation(&self) -> Mat4;

    /// Upper 3x3 of the inverse-transpose, used to transform normals
    fn normal_matrix(&self) -> Mat3;
}

impl Mat4Ext for Mat4 {
    fn perspective_gl(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        Mat4::new_perspective(aspect, fov_y, near, far)
    }

    fn orthographic_gl(half_width: f32, half_height: f32, near: f32, far: f32) -> Mat4 {
        Mat4::new_orthographic(-half_width, half_width, -half_height, half_height, near, far)
    }

    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
        Mat4::look_at_rh(&Point3::from(eye), &Point3::from(target), &up)
    }

    fn inverse_or_identity(&self) -> Mat4 {
        self.try_inverse().unwrap_or_else(|| {
            log::warn!("Attempted to invert a singular matrix, using identity");
            Mat4::identity()
        })
    }

    fn without_translation(&self) -> Mat4 {
        let mut stripped = *self;
        stripped[(0, 3)] = 0.0;
        stripped[(1, 3)] = 0.0;
        stripped[(2, 3)] = 0.0;
        stripped
    }

    fn normal_matrix(&self) -> Mat3 {
        self.inverse_or_identity()
            .transpose()
            .fixed_view::<3, 3>(0, 0)
            .into_owned()
    }
}
