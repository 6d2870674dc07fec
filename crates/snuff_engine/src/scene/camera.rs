//! # Camera
//!
//! A camera is a spatial node plus projection parameters. Its view matrix is
//! the node's world-to-local matrix, so it always goes through the tree's
//! lazy refresh. The projection matrix has its own dirty flag and is only
//! rebuilt when a projection parameter or the viewport size changes.
//!
//! ## Coordinate System
//! OpenGL conventions: right-handed, the camera looks down its local -Z
//! axis, clip-space depth in [-1, 1].

use crate::config::CameraConfig;
use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec3};

use super::{NodeId, SceneError, TransformTree};

/// Projection model of a camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectionKind {
    /// Perspective projection driven by the vertical field of view
    #[default]
    Perspective,
    /// Parallel projection driven by the orthographic size
    Orthographic,
}

/// Camera attached to a node of a [`TransformTree`]
#[derive(Debug, Clone)]
pub struct Camera {
    node: NodeId,
    kind: ProjectionKind,
    field_of_view: f32,
    near_plane: f32,
    far_plane: f32,
    orthographic_size: f32,
    projection: Mat4,
    projection_dirty: bool,
    viewport: Option<(u32, u32)>,
}

impl Camera {
    /// Create a perspective camera on a new root node of `tree`
    pub fn new(tree: &mut TransformTree) -> Self {
        Self::with_config(tree, &CameraConfig::default())
    }

    /// Create a camera on a new root node using configured defaults
    pub fn with_config(tree: &mut TransformTree, config: &CameraConfig) -> Self {
        let node = tree.create_node();
        Self::for_node(node, config)
    }

    /// Wrap an existing node
    pub fn for_node(node: NodeId, config: &CameraConfig) -> Self {
        Self {
            node,
            kind: ProjectionKind::Perspective,
            field_of_view: config.field_of_view,
            near_plane: config.near_plane,
            far_plane: config.far_plane,
            orthographic_size: config.orthographic_size,
            projection: Mat4::identity(),
            projection_dirty: true,
            viewport: None,
        }
    }

    /// Node carrying the camera's placement
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Projection model
    pub fn kind(&self) -> ProjectionKind {
        self.kind
    }

    /// Vertical field of view in degrees
    pub fn field_of_view(&self) -> f32 {
        self.field_of_view
    }

    /// Near clipping plane distance
    pub fn near_plane(&self) -> f32 {
        self.near_plane
    }

    /// Far clipping plane distance
    pub fn far_plane(&self) -> f32 {
        self.far_plane
    }

    /// Half-height of the orthographic view volume
    pub fn orthographic_size(&self) -> f32 {
        self.orthographic_size
    }

    /// Whether the next projection request rebuilds the matrix
    pub fn is_projection_dirty(&self) -> bool {
        self.projection_dirty
    }

    /// Switch projection model
    pub fn set_kind(&mut self, kind: ProjectionKind) {
        self.kind = kind;
        self.projection_dirty = true;
    }

    /// Set the vertical field of view in degrees
    pub fn set_field_of_view(&mut self, degrees: f32) {
        self.field_of_view = degrees;
        self.projection_dirty = true;
    }

    /// Set the near clipping plane
    pub fn set_near_plane(&mut self, near: f32) {
        self.near_plane = near;
        self.projection_dirty = true;
    }

    /// Set the far clipping plane
    pub fn set_far_plane(&mut self, far: f32) {
        self.far_plane = far;
        self.projection_dirty = true;
    }

    /// Set the orthographic half-height
    pub fn set_orthographic_size(&mut self, size: f32) {
        self.orthographic_size = size;
        self.projection_dirty = true;
    }

    /// Projection matrix for a `width` x `height` viewport
    ///
    /// Returns a copy of the cached matrix, rebuilding it first if a
    /// parameter or the viewport changed since the last call.
    pub fn projection_matrix(&mut self, width: u32, height: u32) -> Result<Mat4, SceneError> {
        if width == 0 || height == 0 {
            return Err(SceneError::InvalidViewport { width, height });
        }
        if !(self.near_plane > 0.0 && self.far_plane > self.near_plane) {
            return Err(SceneError::InvalidClipPlanes {
                near: self.near_plane,
                far: self.far_plane,
            });
        }

        if self.projection_dirty || self.viewport != Some((width, height)) {
            let aspect = width as f32 / height as f32;
            self.projection = match self.kind {
                ProjectionKind::Perspective => Mat4::perspective_gl(
                    utils::deg_to_rad(self.field_of_view),
                    aspect,
                    self.near_plane,
                    self.far_plane,
                ),
                ProjectionKind::Orthographic => Mat4::orthographic_gl(
                    self.orthographic_size * aspect,
                    self.orthographic_size,
                    self.near_plane,
                    self.far_plane,
                ),
            };
            self.projection_dirty = false;
            self.viewport = Some((width, height));
            log::trace!("Rebuilt {:?} projection for {}x{}", self.kind, width, height);
        }

        Ok(self.projection)
    }

    /// View matrix, the inverse of the node's local-to-world matrix
    pub fn view_matrix(&self, tree: &mut TransformTree) -> Result<Mat4, SceneError> {
        tree.world_to_local(self.node)
    }

    /// World-space eye position
    pub fn world_translation(&self, tree: &mut TransformTree) -> Result<Vec3, SceneError> {
        tree.world_translation(self.node)
    }

    /// Resolve projection, view and eye position for one viewport
    pub fn view(&mut self, tree: &mut TransformTree, width: u32, height: u32) -> Result<CameraView, SceneError> {
        Ok(CameraView {
            projection: self.projection_matrix(width, height)?,
            view: self.view_matrix(tree)?,
            eye_position: self.world_translation(tree)?,
        })
    }
}

/// One face of a cube render target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CubeFace {
    /// +X
    PositiveX,
    /// -X
    NegativeX,
    /// +Y
    PositiveY,
    /// -Y
    NegativeY,
    /// +Z
    PositiveZ,
    /// -Z
    NegativeZ,
}

impl CubeFace {
    /// Faces in attachment order
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PositiveX,
        CubeFace::NegativeX,
        CubeFace::PositiveY,
        CubeFace::NegativeY,
        CubeFace::PositiveZ,
        CubeFace::NegativeZ,
    ];

    /// Attachment index of the face
    pub fn index(self) -> usize {
        self as usize
    }

    /// World-space view direction of the face
    pub fn direction(self) -> Vec3 {
        match self {
            CubeFace::PositiveX => Vec3::new(1.0, 0.0, 0.0),
            CubeFace::NegativeX => Vec3::new(-1.0, 0.0, 0.0),
            CubeFace::PositiveY => Vec3::new(0.0, 1.0, 0.0),
            CubeFace::NegativeY => Vec3::new(0.0, -1.0, 0.0),
            CubeFace::PositiveZ => Vec3::new(0.0, 0.0, 1.0),
            CubeFace::NegativeZ => Vec3::new(0.0, 0.0, -1.0),
        }
    }

    /// Up vector of the face, following the cube map layout convention
    pub fn up(self) -> Vec3 {
        match self {
            CubeFace::PositiveY => Vec3::new(0.0, 0.0, 1.0),
            CubeFace::NegativeY => Vec3::new(0.0, 0.0, -1.0),
            _ => Vec3::new(0.0, -1.0, 0.0),
        }
    }
}

/// Resolved camera matrices for one replay of a pass
#[derive(Debug, Clone, PartialEq)]
pub struct CameraView {
    /// Projection matrix
    pub projection: Mat4,
    /// World-to-view matrix
    pub view: Mat4,
    /// World-space eye position
    pub eye_position: Vec3,
}

impl CameraView {
    /// Camera for one face of a cube target: 90° perspective, square aspect
    pub fn cube_face(eye_position: Vec3, face: CubeFace, near: f32, far: f32) -> Self {
        Self {
            projection: Mat4::perspective_gl(utils::deg_to_rad(90.0), 1.0, near, far),
            view: Mat4::look_at(eye_position, eye_position + face.direction(), face.up()),
            eye_position,
        }
    }

    /// `inverse(projection * view)` with the view translation removed, for
    /// reconstructing world-space directions (skyboxes, environment lookups)
    pub fn inv_view_dir_projection(&self) -> Mat4 {
        (self.projection * self.view.without_translation()).inverse_or_identity()
    }
}
