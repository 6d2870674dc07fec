//! # Snuff Engine
//!
//! Scene hierarchy, cameras and a queue-based multi-pass renderer.
//!
//! ## Features
//!
//! - **Transform Tree**: arena of spatial nodes with lazily cached world matrices
//! - **Cameras**: perspective and orthographic projections with their own cache
//! - **Render Queue**: per-pass buckets drained in queue order, cleared every frame
//! - **Cube Targets**: one queued draw replays into all six faces
//! - **Headless Backend**: record graphics commands without a GPU
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::rc::Rc;
//! use snuff_engine::prelude::*;
//! use snuff_engine::render::backends::headless::RecordingContext;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = EngineConfig::default();
//!     let mut context = RecordingContext::new(800, 600);
//!     let program = context.create_program(&["Position"], &["Projection", "View", "Model"]);
//!     let layout = ShaderLayout::new()
//!         .with_attribute("Position", "vec3")
//!         .with_uniform("Projection", "mat4")
//!         .with_uniform("View", "mat4")
//!         .with_uniform("Model", "mat4");
//!     let pass = Pass::new("Default", program, PassState::default(), &layout, &context);
//!     let effect = Rc::new(Effect::new("Unlit").with_technique("Default", Technique::new().with_pass(pass)));
//!     let geometry = Rc::new(
//!         Geometry::new("triangle")
//!             .with_attribute("Position", context.create_buffer(), 3)
//!             .with_indices(context.create_buffer(), 3, IndexWidth::U16),
//!     );
//!
//!     let mut tree = TransformTree::new();
//!     let mut camera = Camera::with_config(&mut tree, &config.camera);
//!     let node = tree.create_node();
//!     let mut renderer = Renderer::new(context, config.renderer.clone());
//!
//!     renderer.queue(node, geometry, Rc::new(Material::new("flat", effect)), None)?;
//!     renderer.render_pass(&mut tree, &mut camera, "Default");
//!     renderer.render(1.0 / 60.0)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod foundation;
pub mod render;
pub mod scene;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{CameraConfig, Config, EngineConfig, RendererConfig},
        foundation::{
            math::{Mat4, Mat4Ext, Quat, Transform, Vec3},
            time::FrameClock,
        },
        render::{
            CustomUniforms, Effect, Geometry, GraphicsContext, IndexWidth, Material, Pass, PassState,
            RenderTarget, Renderer, ShaderLayout, Technique,
        },
        scene::{Camera, NodeId, ProjectionKind, TransformTree},
    };
}
