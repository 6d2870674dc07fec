//! Offscreen render targets

use crate::scene::CubeFace;

use super::context::{FramebufferHandle, GraphicsContext};

/// A framebuffer to render into instead of the backbuffer
///
/// Cube targets expose six face attachments; the renderer replays every
/// pass once per face when one is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTarget {
    framebuffer: FramebufferHandle,
    width: u32,
    height: u32,
    cube: bool,
}

impl RenderTarget {
    /// Flat 2D target
    pub fn new(framebuffer: FramebufferHandle, width: u32, height: u32) -> Self {
        Self {
            framebuffer,
            width,
            height,
            cube: false,
        }
    }

    /// Cube target with square faces of `size` pixels
    pub fn cube(framebuffer: FramebufferHandle, size: u32) -> Self {
        Self {
            framebuffer,
            width: size,
            height: size,
            cube: true,
        }
    }

    /// Framebuffer handle
    pub fn framebuffer(&self) -> FramebufferHandle {
        self.framebuffer
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether this is a cube target
    pub fn is_cube(&self) -> bool {
        self.cube
    }

    /// Bind the target, or one face of it, and size the viewport
    ///
    /// `face` is ignored for flat targets.
    pub fn bind<C: GraphicsContext + ?Sized>(&self, context: &mut C, face: Option<CubeFace>) -> bool {
        let face = if self.cube { face } else { None };
        if !context.bind_framebuffer(Some(self.framebuffer), face) {
            log::warn!("Failed to bind render target {:?} (face {:?})", self.framebuffer, face);
            return false;
        }
        context.set_viewport(self.width, self.height);
        true
    }

    /// Clear the target with `color`, every face for cube targets
    pub fn clear<C: GraphicsContext + ?Sized>(&self, context: &mut C, color: [f32; 4]) -> bool {
        let faces: Vec<Option<CubeFace>> = if self.cube {
            CubeFace::ALL.iter().copied().map(Some).collect()
        } else {
            vec![None]
        };

        for face in faces {
            if !self.bind(context, face) {
                return false;
            }
            context.clear(color);
        }
        true
    }
}
