//! Scene hierarchy
//!
//! Spatial nodes live in a [`TransformTree`] arena and refer to each other by
//! [`NodeId`]. Owners (entities, cameras, renderables) hold ids, never the
//! nodes themselves, so re-parenting and destruction cannot leave dangling
//! references behind.
//!
//! ## Architecture
//!
//! ```text
//! TransformTree (arena of SpatialNode)
//!      ↑ NodeId
//! Camera / queued draws
//!      ↓
//! Renderer (reads world matrices through the lazy cache)
//! ```

mod spatial_node;
mod transform_tree;
mod camera;

pub use spatial_node::{NodeId, SpatialNode};
pub use transform_tree::TransformTree;
pub use camera::{Camera, CameraView, CubeFace, ProjectionKind};

/// Errors raised by hierarchy and camera operations
///
/// All of them are recoverable: the operation that produced one left the
/// scene unchanged.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    /// Detach was requested on a root node
    #[error("Node {0:?} has no parent to detach from")]
    NoParent(NodeId),

    /// Attach would make a node its own ancestor
    #[error("Attaching {child:?} under {parent:?} would create a cycle")]
    InvalidHierarchy {
        /// Node being attached
        child: NodeId,
        /// Requested parent
        parent: NodeId,
    },

    /// Child lookup past the end of the children list
    #[error("Child index {index} is out of range, node has {count} children")]
    ChildIndexOutOfRange {
        /// Requested index
        index: usize,
        /// Number of children the node has
        count: usize,
    },

    /// The id does not refer to a live node
    #[error("Node {0:?} does not exist")]
    UnknownNode(NodeId),

    /// Projection requested for an empty viewport
    #[error("Invalid viewport {width}x{height}")]
    InvalidViewport {
        /// Viewport width in pixels
        width: u32,
        /// Viewport height in pixels
        height: u32,
    },

    /// Clip planes that cannot produce a projection
    #[error("Invalid clip planes: near {near}, far {far}")]
    InvalidClipPlanes {
        /// Near plane distance
        near: f32,
        /// Far plane distance
        far: f32,
    },
}
