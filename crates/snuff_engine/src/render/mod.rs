//! # Rendering System
//!
//! Queue-based multi-pass renderer over an explicit graphics context.
//!
//! ## Architecture
//!
//! The rendering system is designed with clear separation of concerns:
//! - **Renderer**: frame orchestration, target binding and pass replay
//! - **RenderQueue**: per-pass buckets of draws accumulated during a frame
//! - **Effect / Technique / Pass**: shader programs, fixed-function state and
//!   binding tables resolved when the pass is built
//! - **Geometry / Material / RenderTarget**: resources a draw references
//! - **GraphicsContext**: the device seam, with a headless recording backend
//!
//! ## Per-draw Uniforms
//!
//! Before each draw the renderer uploads `Projection`, `View`,
//! `InvViewDirProjection`, `EyePosition`, `Time`, `Model` and
//! `InvTransposedModel`, each only if the pass declares it. Material
//! textures go to `tex0..texN`; custom uniforms bind by name and are skipped
//! when the pass does not declare them.

mod context;
mod effect;
mod geometry;
mod material;
mod render_queue;
mod renderer;
mod state;
mod target;
mod uniforms;

/// Graphics backend implementations
pub mod backends;

#[cfg(test)]
mod tests;

pub use context::{BufferHandle, FramebufferHandle, GraphicsContext, ProgramHandle, TextureHandle};
pub use effect::{glsl_type_size, Effect, LayoutEntry, LayoutLocation, Pass, ShaderLayout, Technique, MAX_TEXTURE_UNITS};
pub use geometry::{Geometry, IndexWidth, PrimitiveTopology, VertexAttribute};
pub use material::Material;
pub use render_queue::{FramePhase, QueueEntry, RenderQueue};
pub use renderer::Renderer;
pub use state::{BlendFactor, BlendOp, BlendState, ColorMask, CompareFunc, CullMode, DepthState, PassState};
pub use target::RenderTarget;
pub use uniforms::{names as uniform_names, CustomUniforms, FrameUniforms, StandardBindings, UniformType, UniformValue};

use crate::scene::SceneError;

/// Errors that can occur during rendering operations
///
/// None of them abort a frame: the renderer logs the error and skips the
/// affected draw.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    /// Material has no effect, or its technique is missing or unusable
    #[error("Material '{0}' is not ready for drawing")]
    InvalidMaterial(String),

    /// Geometry lacks vertex attributes or an index buffer
    #[error("Geometry '{0}' is incomplete")]
    InvalidGeometry(String),

    /// Technique or pass name not declared by the effect
    #[error("Unknown pass '{pass}' in technique '{technique}'")]
    UnknownPass {
        /// Technique name
        technique: String,
        /// Pass name
        pass: String,
    },

    /// Pass program failed to link
    #[error("Pass '{pass}' in technique '{technique}' has an invalid program")]
    InvalidProgram {
        /// Technique name
        technique: String,
        /// Pass name
        pass: String,
    },

    /// Node or camera lookup failed
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// Backend-specific error occurred
    ///
    /// Wraps device errors in a generic form for consistent error handling
    /// across graphics backends.
    #[error("Backend error: {0}")]
    Context(String),
}

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;
