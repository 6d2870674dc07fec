//! Graphics context abstraction
//!
//! The renderer never talks to a graphics API directly. Everything it needs
//! from the device goes through [`GraphicsContext`], which is owned by the
//! [`Renderer`](super::Renderer) and threaded explicitly into effect loading.

use crate::scene::CubeFace;

use super::geometry::{IndexWidth, PrimitiveTopology};
use super::state::PassState;
use super::uniforms::UniformValue;
use super::RenderResult;

macro_rules! gpu_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u64);
    };
}

gpu_handle!(
    /// Vertex or index buffer owned by the context
    BufferHandle
);
gpu_handle!(
    /// Texture owned by the context
    TextureHandle
);
gpu_handle!(
    /// Linked shader program owned by the context
    ProgramHandle
);
gpu_handle!(
    /// Offscreen framebuffer owned by the context
    FramebufferHandle
);

/// Device operations the renderer issues
///
/// Locations returned by [`attribute_location`](Self::attribute_location)
/// and [`uniform_location`](Self::uniform_location) are opaque slots that
/// are handed back unchanged to the binding calls.
pub trait GraphicsContext {
    /// Size of the default framebuffer in pixels
    fn backbuffer_size(&self) -> (u32, u32);

    /// Bind a framebuffer, `None` selects the backbuffer. `face` picks the
    /// cube face attachment of a cube framebuffer. Returns false when the
    /// framebuffer is incomplete or unknown.
    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferHandle>, face: Option<CubeFace>) -> bool;

    /// Set the viewport rectangle starting at the origin
    fn set_viewport(&mut self, width: u32, height: u32);

    /// Clear colour and depth of the bound framebuffer
    fn clear(&mut self, color: [f32; 4]);

    /// Whether the program linked successfully
    fn is_program_valid(&self, program: ProgramHandle) -> bool;

    /// Slot of a vertex attribute in `program`
    fn attribute_location(&self, program: ProgramHandle, name: &str) -> Option<u32>;

    /// Slot of a uniform in `program`
    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<u32>;

    /// Make `program` current
    fn use_program(&mut self, program: ProgramHandle);

    /// Apply blend, depth and cull state
    fn apply_pass_state(&mut self, state: &PassState);

    /// Upload a uniform value to the current program
    fn set_uniform(&mut self, location: u32, value: &UniformValue);

    /// Point a sampler uniform at a texture unit
    fn set_sampler(&mut self, location: u32, unit: u32);

    /// Bind a texture to a texture unit
    fn bind_texture(&mut self, unit: u32, texture: TextureHandle);

    /// Feed a vertex attribute slot from a float buffer
    fn bind_vertex_attribute(&mut self, location: u32, buffer: BufferHandle, components: u32);

    /// Issue an indexed draw with the current program and bindings
    fn draw_indexed(
        &mut self,
        topology: PrimitiveTopology,
        index_buffer: BufferHandle,
        index_count: u32,
        index_width: IndexWidth,
    ) -> RenderResult<()>;

    /// Present the backbuffer
    fn present(&mut self) -> RenderResult<()>;
}
