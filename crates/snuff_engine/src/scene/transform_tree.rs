//! Transform hierarchy arena
//!
//! Every mutation of a node's local TRS or of its parent eagerly marks the
//! node and its whole subtree dirty. Reads walk up the contiguous run of
//! dirty ancestors and recompose world matrices downward from the nearest
//! clean one (or the root), so a clean cache is never stale.
//!
//! Invariant relied on by the early-outs below: a dirty node has only dirty
//! descendants.

use slotmap::SlotMap;

use crate::foundation::math::{utils, Mat4, Mat4Ext, Point3, Quat, Transform, Vec3};

use super::{NodeId, SceneError, SpatialNode};

/// Arena owning every spatial node of a scene
#[derive(Debug, Default)]
pub struct TransformTree {
    nodes: SlotMap<NodeId, SpatialNode>,
}

impl TransformTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty tree with room for `capacity` nodes
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: SlotMap::with_capacity_and_key(capacity),
        }
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether `id` refers to a live node
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Create a root node with the identity transform
    pub fn create_node(&mut self) -> NodeId {
        self.create_node_with(Transform::identity())
    }

    /// Create a root node with the given local transform
    pub fn create_node_with(&mut self, local: Transform) -> NodeId {
        self.nodes.insert(SpatialNode::new(local))
    }

    /// Destroy a node together with its whole subtree
    ///
    /// The node is detached from its parent first. Returns how many nodes
    /// were removed.
    pub fn remove_node(&mut self, id: NodeId) -> Result<usize, SceneError> {
        let parent = self.get(id)?.parent;
        if let Some(parent) = parent {
            self.unlink(id, parent);
        }

        let mut doomed = vec![id];
        self.walk_descendants(id, |child| doomed.push(child))?;
        for node in &doomed {
            self.nodes.remove(*node);
        }

        log::trace!("Removed node {:?} and {} descendants", id, doomed.len() - 1);
        Ok(doomed.len())
    }

    /// Read-only access to a node
    pub fn node(&self, id: NodeId) -> Option<&SpatialNode> {
        self.nodes.get(id)
    }

    /// Iterate over nodes without a parent
    pub fn roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .filter(|(_, node)| node.parent.is_none())
            .map(|(id, _)| id)
    }

    // === Local mutation ===

    /// Set the translation relative to the parent
    pub fn set_local_translation(&mut self, id: NodeId, translation: Vec3) -> Result<(), SceneError> {
        self.get_mut(id)?.local.position = translation;
        self.mark_subtree_dirty(id);
        Ok(())
    }

    /// Set the scale relative to the parent
    pub fn set_local_scale(&mut self, id: NodeId, scale: Vec3) -> Result<(), SceneError> {
        self.get_mut(id)?.local.scale = scale;
        self.mark_subtree_dirty(id);
        Ok(())
    }

    /// Set the rotation relative to the parent
    pub fn set_local_rotation(&mut self, id: NodeId, rotation: Quat) -> Result<(), SceneError> {
        self.get_mut(id)?.local.rotation = rotation;
        self.mark_subtree_dirty(id);
        Ok(())
    }

    /// Set the rotation from Euler angles in degrees
    pub fn set_rotation_euler(&mut self, id: NodeId, x: f32, y: f32, z: f32) -> Result<(), SceneError> {
        self.set_local_rotation(id, utils::quat_from_euler_degrees(x, y, z))
    }

    /// Replace the whole local transform
    pub fn set_local_transform(&mut self, id: NodeId, local: Transform) -> Result<(), SceneError> {
        self.get_mut(id)?.local = local;
        self.mark_subtree_dirty(id);
        Ok(())
    }

    /// Move the node along its own right, up and forward directions
    pub fn translate(&mut self, id: NodeId, amount: Vec3) -> Result<(), SceneError> {
        let offset = self.right(id)? * amount.x + self.up(id)? * amount.y + self.forward(id)? * amount.z;
        self.get_mut(id)?.local.position += offset;
        self.mark_subtree_dirty(id);
        Ok(())
    }

    /// Translation relative to the parent
    pub fn local_translation(&self, id: NodeId) -> Result<Vec3, SceneError> {
        Ok(self.get(id)?.local_translation())
    }

    /// Scale relative to the parent
    pub fn local_scale(&self, id: NodeId) -> Result<Vec3, SceneError> {
        Ok(self.get(id)?.local_scale())
    }

    /// Rotation relative to the parent
    pub fn local_rotation(&self, id: NodeId) -> Result<Quat, SceneError> {
        Ok(self.get(id)?.local_rotation())
    }

    /// Whether the node's cached world matrices are stale
    pub fn is_dirty(&self, id: NodeId) -> Result<bool, SceneError> {
        Ok(self.get(id)?.dirty)
    }

    // === Hierarchy ===

    /// Attach `child` under `parent`, detaching it from any previous parent
    ///
    /// Rejects attaching a node to itself or to one of its descendants; the
    /// tree is left untouched in that case.
    pub fn attach(&mut self, child: NodeId, parent: NodeId) -> Result<(), SceneError> {
        self.get(child)?;
        self.get(parent)?;

        let mut ancestor = Some(parent);
        while let Some(current) = ancestor {
            if current == child {
                let error = SceneError::InvalidHierarchy { child, parent };
                log::warn!("{error}");
                return Err(error);
            }
            ancestor = self.get(current)?.parent;
        }

        if let Some(previous) = self.get(child)?.parent {
            self.unlink(child, previous);
        }

        self.get_mut(parent)?.children.push(child);
        self.get_mut(child)?.parent = Some(parent);
        self.mark_subtree_dirty(child);
        Ok(())
    }

    /// Detach `child` from its parent, making it a root
    pub fn detach(&mut self, child: NodeId) -> Result<(), SceneError> {
        let Some(parent) = self.get(child)?.parent else {
            let error = SceneError::NoParent(child);
            log::warn!("Detaching a node that doesn't have a parent: {error}");
            return Err(error);
        };

        self.unlink(child, parent);
        self.mark_subtree_dirty(child);
        Ok(())
    }

    /// Current parent of a node
    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>, SceneError> {
        Ok(self.get(id)?.parent)
    }

    /// Child at `index` in attach order
    pub fn child(&self, id: NodeId, index: usize) -> Result<NodeId, SceneError> {
        let children = &self.get(id)?.children;
        children.get(index).copied().ok_or_else(|| {
            let error = SceneError::ChildIndexOutOfRange {
                index,
                count: children.len(),
            };
            log::warn!("{error}");
            error
        })
    }

    /// Number of direct children
    pub fn child_count(&self, id: NodeId) -> Result<usize, SceneError> {
        Ok(self.get(id)?.children.len())
    }

    /// Visit every descendant of `id` depth-first, parents before children
    pub fn for_each_child<F>(&self, id: NodeId, visit: F) -> Result<(), SceneError>
    where
        F: FnMut(NodeId),
    {
        self.walk_descendants(id, visit)
    }

    /// Every descendant of `id` in pre-order
    pub fn descendants(&self, id: NodeId) -> Result<Vec<NodeId>, SceneError> {
        let mut found = Vec::new();
        self.walk_descendants(id, |child| found.push(child))?;
        Ok(found)
    }

    // === World-space queries ===

    /// Local-to-world matrix, refreshing the cache if needed
    pub fn local_to_world(&mut self, id: NodeId) -> Result<Mat4, SceneError> {
        self.refresh(id)?;
        Ok(self.get(id)?.local_to_world)
    }

    /// World-to-local matrix, refreshing the cache if needed
    pub fn world_to_local(&mut self, id: NodeId) -> Result<Mat4, SceneError> {
        self.refresh(id)?;
        Ok(self.get(id)?.world_to_local)
    }

    /// Transform a point from local to world space
    pub fn transform_point(&mut self, id: NodeId, point: Vec3) -> Result<Vec3, SceneError> {
        let matrix = self.local_to_world(id)?;
        Ok(matrix.transform_point(&Point3::from(point)).coords)
    }

    /// Transform a direction from local to world space, normalized
    pub fn transform_direction(&mut self, id: NodeId, direction: Vec3) -> Result<Vec3, SceneError> {
        let matrix = self.local_to_world(id)?;
        Ok(matrix
            .transform_vector(&direction)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vec3::zeros))
    }

    /// World-space +X axis of the node
    pub fn right(&mut self, id: NodeId) -> Result<Vec3, SceneError> {
        self.transform_direction(id, Vec3::x())
    }

    /// World-space +Y axis of the node
    pub fn up(&mut self, id: NodeId) -> Result<Vec3, SceneError> {
        self.transform_direction(id, Vec3::y())
    }

    /// World-space +Z axis of the node
    pub fn forward(&mut self, id: NodeId) -> Result<Vec3, SceneError> {
        self.transform_direction(id, Vec3::z())
    }

    /// World-space position of the node's origin
    pub fn world_translation(&mut self, id: NodeId) -> Result<Vec3, SceneError> {
        self.transform_point(id, Vec3::zeros())
    }

    // === Internals ===

    fn get(&self, id: NodeId) -> Result<&SpatialNode, SceneError> {
        self.nodes.get(id).ok_or(SceneError::UnknownNode(id))
    }

    fn get_mut(&mut self, id: NodeId) -> Result<&mut SpatialNode, SceneError> {
        self.nodes.get_mut(id).ok_or(SceneError::UnknownNode(id))
    }

    fn unlink(&mut self, child: NodeId, parent: NodeId) {
        if let Some(parent_node) = self.nodes.get_mut(parent) {
            parent_node.children.retain(|&existing| existing != child);
        }
        if let Some(child_node) = self.nodes.get_mut(child) {
            child_node.parent = None;
        }
    }

    fn walk_descendants<F>(&self, id: NodeId, mut visit: F) -> Result<(), SceneError>
    where
        F: FnMut(NodeId),
    {
        let mut stack: Vec<NodeId> = self.get(id)?.children.iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            visit(current);
            if let Some(node) = self.nodes.get(current) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        Ok(())
    }

    fn mark_subtree_dirty(&mut self, id: NodeId) {
        let mut stack = vec![id];
        let mut first = true;
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get_mut(current) else {
                continue;
            };
            // A dirty node already has a dirty subtree; the root of the
            // mutation is always walked because its parent may have changed.
            if node.dirty && !first {
                continue;
            }
            first = false;
            node.dirty = true;
            stack.extend(node.children.iter().copied());
        }
    }

    fn refresh(&mut self, id: NodeId) -> Result<(), SceneError> {
        let mut stale = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = self.get(node_id)?;
            if !node.dirty {
                break;
            }
            stale.push(node_id);
            current = node.parent;
        }

        for &node_id in stale.iter().rev() {
            let parent_world = match self.get(node_id)?.parent {
                Some(parent) => Some(self.get(parent)?.local_to_world),
                None => None,
            };

            let node = self.get_mut(node_id)?;
            let local = node.local.to_matrix();
            node.local_to_world = match parent_world {
                Some(parent_world) => parent_world * local,
                None => local,
            };
            node.world_to_local = node.local_to_world.inverse_or_identity();
            node.dirty = false;
        }

        Ok(())
    }
}
