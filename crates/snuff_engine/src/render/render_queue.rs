//! # Render Queue System
//!
//! Collects draw entries during a frame and hands them to the renderer one
//! pass at a time.
//!
//! ## Architecture
//!
//! - **RenderQueue**: one bucket per pass name, each an ordered list of entries
//! - **QueueEntry**: node, geometry, material and per-draw uniform overrides
//! - **FramePhase**: where the queue is in its per-frame lifecycle
//!
//! ## Ordering
//!
//! Entries within a bucket are drained strictly in insertion order. Pass
//! order is up to the caller, who drains buckets by name. Draining removes
//! the bucket, and [`RenderQueue::clear`] drops whatever was never drained,
//! so nothing carries over into the next frame.

use std::collections::HashMap;
use std::rc::Rc;

use crate::scene::NodeId;

use super::geometry::Geometry;
use super::material::Material;
use super::uniforms::CustomUniforms;

/// Lifecycle of the queue within one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FramePhase {
    /// Nothing queued since the last frame boundary
    #[default]
    Idle,
    /// Entries are being queued
    Accumulating,
    /// A bucket is being replayed
    Draining,
}

/// One queued draw
///
/// Geometry, material and uniforms are shared: a single `queue` call fans
/// out into one entry per pass without copying them.
#[derive(Debug, Clone)]
pub struct QueueEntry {
    /// Node whose world matrix is used as `Model`
    pub node: NodeId,
    /// Geometry to draw
    pub geometry: Rc<Geometry>,
    /// Material to draw with
    pub material: Rc<Material>,
    /// Per-draw overrides, if any
    pub uniforms: Option<Rc<CustomUniforms>>,
}

/// Per-pass buckets of queued draws
#[derive(Debug, Default)]
pub struct RenderQueue {
    buckets: HashMap<String, Vec<QueueEntry>>,
    phase: FramePhase,
}

impl RenderQueue {
    /// Create a new empty render queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry to the bucket of `pass`
    pub fn push(&mut self, pass: &str, entry: QueueEntry) {
        match self.buckets.get_mut(pass) {
            Some(bucket) => bucket.push(entry),
            None => {
                self.buckets.insert(pass.to_string(), vec![entry]);
            }
        }
        self.phase = FramePhase::Accumulating;
    }

    /// Remove and return the bucket of `pass`, entering the draining phase
    ///
    /// Returns `None` if nothing was queued for the pass.
    pub fn take_bucket(&mut self, pass: &str) -> Option<Vec<QueueEntry>> {
        let bucket = self.buckets.remove(pass).filter(|bucket| !bucket.is_empty())?;
        self.phase = FramePhase::Draining;
        Some(bucket)
    }

    /// Leave the draining phase once a bucket has been replayed
    pub fn finish_drain(&mut self) {
        self.phase = if self.buckets.is_empty() {
            FramePhase::Idle
        } else {
            FramePhase::Accumulating
        };
    }

    /// Entries queued for `pass`, in draw order
    pub fn bucket(&self, pass: &str) -> &[QueueEntry] {
        self.buckets.get(pass).map_or(&[], Vec::as_slice)
    }

    /// Names of the passes that have entries
    pub fn pass_names(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys().map(String::as_str)
    }

    /// Current phase
    pub fn phase(&self) -> FramePhase {
        self.phase
    }

    /// Get total number of entries across all passes
    pub fn entry_count(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// Check if queue is empty
    pub fn is_empty(&self) -> bool {
        self.buckets.values().all(Vec::is_empty)
    }

    /// Drop every bucket for the next frame
    pub fn clear(&mut self) {
        self.buckets.clear();
        self.phase = FramePhase::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::TransformTree;

    fn entry(node: NodeId, geometry: &str) -> QueueEntry {
        QueueEntry {
            node,
            geometry: Rc::new(Geometry::new(geometry)),
            material: Rc::new(Material::pending("test")),
            uniforms: None,
        }
    }

    #[test]
    fn test_render_queue_creation() {
        let queue = RenderQueue::new();
        assert!(queue.is_empty());
        assert_eq!(queue.entry_count(), 0);
        assert_eq!(queue.phase(), FramePhase::Idle);
    }

    #[test]
    fn test_bucket_keeps_insertion_order() {
        let mut tree = TransformTree::new();
        let node = tree.create_node();
        let mut queue = RenderQueue::new();

        queue.push("Default", entry(node, "e1"));
        queue.push("Shadow", entry(node, "s1"));
        queue.push("Default", entry(node, "e2"));
        queue.push("Default", entry(node, "e3"));

        assert_eq!(queue.phase(), FramePhase::Accumulating);
        assert_eq!(queue.entry_count(), 4);

        let names: Vec<&str> = queue.bucket("Default").iter().map(|e| e.geometry.name()).collect();
        assert_eq!(names, vec!["e1", "e2", "e3"]);
    }

    #[test]
    fn test_take_bucket_drains_once() {
        let mut tree = TransformTree::new();
        let node = tree.create_node();
        let mut queue = RenderQueue::new();
        queue.push("Default", entry(node, "e1"));
        queue.push("Shadow", entry(node, "s1"));

        let bucket = queue.take_bucket("Default").unwrap();
        assert_eq!(bucket.len(), 1);
        assert_eq!(queue.phase(), FramePhase::Draining);
        queue.finish_drain();
        assert_eq!(queue.phase(), FramePhase::Accumulating);

        assert!(queue.take_bucket("Default").is_none());
        assert!(queue.take_bucket("Missing").is_none());

        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(queue.phase(), FramePhase::Idle);
    }
}
