//! Geometry handles
//!
//! GPU-side vertex and index buffers as the renderer sees them. Uploading
//! buffer data belongs to the asset loader; a [`Geometry`] only records which
//! buffers feed which named attribute and how to interpret the indices.

use super::context::BufferHandle;

/// Width of one index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IndexWidth {
    /// Unsigned 16-bit indices
    #[default]
    U16,
    /// Unsigned 32-bit indices
    U32,
}

impl IndexWidth {
    /// Narrowest width able to address `vertex_count` vertices
    pub fn for_vertex_count(vertex_count: usize) -> Self {
        if vertex_count <= usize::from(u16::MAX) + 1 {
            IndexWidth::U16
        } else {
            IndexWidth::U32
        }
    }
}

/// How indices assemble into primitives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[allow(missing_docs)]
pub enum PrimitiveTopology {
    #[default]
    Triangles,
    Lines,
    TriangleStrip,
    LineStrip,
    Points,
    TriangleFan,
    LineLoop,
}

/// A vertex buffer bound to a named shader input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexAttribute {
    /// Attribute name matched against the pass layout
    pub name: String,
    /// Float buffer holding the data
    pub buffer: BufferHandle,
    /// Floats per vertex
    pub components: u32,
}

/// Indexed geometry ready for drawing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Geometry {
    name: String,
    attributes: Vec<VertexAttribute>,
    index_buffer: Option<BufferHandle>,
    index_count: u32,
    index_width: IndexWidth,
    topology: PrimitiveTopology,
}

impl Geometry {
    /// Geometry without buffers
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            index_buffer: None,
            index_count: 0,
            index_width: IndexWidth::default(),
            topology: PrimitiveTopology::default(),
        }
    }

    /// Builder: set an attribute buffer
    pub fn with_attribute(mut self, name: impl Into<String>, buffer: BufferHandle, components: u32) -> Self {
        self.set_attribute(name, buffer, components);
        self
    }

    /// Builder: set the index buffer
    pub fn with_indices(mut self, buffer: BufferHandle, count: u32, width: IndexWidth) -> Self {
        self.set_indices(buffer, count, width);
        self
    }

    /// Builder: set the topology
    pub fn with_topology(mut self, topology: PrimitiveTopology) -> Self {
        self.topology = topology;
        self
    }

    /// Set or replace the buffer feeding attribute `name`
    pub fn set_attribute(&mut self, name: impl Into<String>, buffer: BufferHandle, components: u32) {
        let attribute = VertexAttribute {
            name: name.into(),
            buffer,
            components,
        };
        match self.attributes.iter_mut().find(|existing| existing.name == attribute.name) {
            Some(existing) => *existing = attribute,
            None => self.attributes.push(attribute),
        }
    }

    /// Set the index buffer
    pub fn set_indices(&mut self, buffer: BufferHandle, count: u32, width: IndexWidth) {
        self.index_buffer = Some(buffer);
        self.index_count = count;
        self.index_width = width;
    }

    /// Name for diagnostics
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attribute buffers in insertion order
    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    /// Index buffer, if uploaded
    pub fn index_buffer(&self) -> Option<BufferHandle> {
        self.index_buffer
    }

    /// Number of indices drawn
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Index width
    pub fn index_width(&self) -> IndexWidth {
        self.index_width
    }

    /// Primitive topology
    pub fn topology(&self) -> PrimitiveTopology {
        self.topology
    }

    /// Drawable once it has at least one attribute and an index buffer
    pub fn is_valid(&self) -> bool {
        !self.attributes.is_empty() && self.index_buffer.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validity_requires_attributes_and_indices() {
        let geometry = Geometry::new("quad");
        assert!(!geometry.is_valid());

        let geometry = geometry.with_attribute("Position", BufferHandle(1), 3);
        assert!(!geometry.is_valid());

        let geometry = geometry.with_indices(BufferHandle(2), 6, IndexWidth::U16);
        assert!(geometry.is_valid());
        assert_eq!(geometry.topology(), PrimitiveTopology::Triangles);
    }

    #[test]
    fn test_attribute_replaced_by_name() {
        let mut geometry = Geometry::new("quad").with_attribute("Position", BufferHandle(1), 3);
        geometry.set_attribute("Position", BufferHandle(5), 4);

        assert_eq!(geometry.attributes().len(), 1);
        assert_eq!(geometry.attributes()[0].buffer, BufferHandle(5));
    }

    #[test]
    fn test_index_width_selection() {
        assert_eq!(IndexWidth::for_vertex_count(65_536), IndexWidth::U16);
        assert_eq!(IndexWidth::for_vertex_count(65_537), IndexWidth::U32);
    }
}
