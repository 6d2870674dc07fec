//! Spatial node data

use crate::foundation::math::{Mat4, Quat, Transform, Vec3};

slotmap::new_key_type! {
    /// Stable handle to a node in a [`TransformTree`](super::TransformTree)
    pub struct NodeId;
}

/// One node of the transform hierarchy
///
/// Holds the local TRS, the parent/children links and the cached world
/// matrices. The cache is only meaningful while `is_dirty()` is false; the
/// tree refreshes it on read.
#[derive(Debug, Clone)]
pub struct SpatialNode {
    pub(super) local: Transform,
    pub(super) parent: Option<NodeId>,
    pub(super) children: Vec<NodeId>,
    pub(super) dirty: bool,
    pub(super) local_to_world: Mat4,
    pub(super) world_to_local: Mat4,
}

impl SpatialNode {
    pub(super) fn new(local: Transform) -> Self {
        Self {
            local,
            parent: None,
            children: Vec::new(),
            dirty: true,
            local_to_world: Mat4::identity(),
            world_to_local: Mat4::identity(),
        }
    }

    /// Translation relative to the parent
    pub fn local_translation(&self) -> Vec3 {
        self.local.position
    }

    /// Scale relative to the parent
    pub fn local_scale(&self) -> Vec3 {
        self.local.scale
    }

    /// Rotation relative to the parent
    pub fn local_rotation(&self) -> Quat {
        self.local.rotation
    }

    /// Full local transform
    pub fn local_transform(&self) -> &Transform {
        &self.local
    }

    /// Current parent, if attached
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Direct children in attach order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Whether the cached world matrices are stale
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}
