//! # Renderer
//!
//! Frame orchestration on top of a [`GraphicsContext`]: target binding,
//! queueing, per-pass replay and the frame boundary.
//!
//! ## Frame Flow
//!
//! ```text
//! queue(...)*  →  render_pass("Shadow")  →  render_pass("Default")  →  render(dt)
//!  Accumulating        Draining                  Draining                Idle
//! ```
//!
//! Every failure inside a frame is local to one draw: it is logged, the draw
//! is skipped and the rest of the frame proceeds.

use std::rc::Rc;

use crate::config::RendererConfig;
use crate::foundation::time::FrameClock;
use crate::scene::{Camera, CameraView, CubeFace, NodeId, SceneError, TransformTree};

use super::context::GraphicsContext;
use super::geometry::Geometry;
use super::material::Material;
use super::render_queue::{QueueEntry, RenderQueue};
use super::target::RenderTarget;
use super::uniforms::{CustomUniforms, FrameUniforms};
use super::{RenderError, RenderResult};

/// Everything one draw call needs besides the camera
#[derive(Clone, Copy)]
struct DrawItem<'a> {
    node: NodeId,
    geometry: &'a Geometry,
    material: &'a Material,
    uniforms: Option<&'a CustomUniforms>,
}

impl<'a> From<&'a QueueEntry> for DrawItem<'a> {
    fn from(entry: &'a QueueEntry) -> Self {
        Self {
            node: entry.node,
            geometry: &entry.geometry,
            material: &entry.material,
            uniforms: entry.uniforms.as_deref(),
        }
    }
}

/// High-level renderer owning the graphics context and the render queue
pub struct Renderer<C: GraphicsContext> {
    context: C,
    config: RendererConfig,
    queue: RenderQueue,
    target: Option<RenderTarget>,
    clock: FrameClock,
}

impl<C: GraphicsContext> Renderer<C> {
    /// Create a renderer drawing through `context`
    pub fn new(context: C, config: RendererConfig) -> Self {
        let (width, height) = context.backbuffer_size();
        log::info!(
            "Renderer created, backbuffer {}x{}, default technique '{}', default pass '{}'",
            width,
            height,
            config.default_technique,
            config.default_pass
        );
        Self {
            context,
            config,
            queue: RenderQueue::new(),
            target: None,
            clock: FrameClock::new(),
        }
    }

    /// Graphics context
    pub fn context(&self) -> &C {
        &self.context
    }

    /// Mutable graphics context, for resource creation
    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    /// Renderer settings
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Entries queued so far this frame
    pub fn render_queue(&self) -> &RenderQueue {
        &self.queue
    }

    /// Currently bound target, `None` for the backbuffer
    pub fn target(&self) -> Option<&RenderTarget> {
        self.target.as_ref()
    }

    /// Frames completed by [`render`](Self::render)
    pub fn frame_count(&self) -> u64 {
        self.clock.frame_count()
    }

    /// Seconds accumulated by [`render`](Self::render), the `Time` uniform
    pub fn elapsed_time(&self) -> f32 {
        self.clock.total_time()
    }

    /// Frame timing
    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    /// Queue a draw into every pass of the material's technique
    ///
    /// Returns the number of passes the draw was queued for. A material
    /// without a usable effect or technique, or incomplete geometry, is
    /// rejected and nothing is queued.
    pub fn queue(
        &mut self,
        node: NodeId,
        geometry: Rc<Geometry>,
        material: Rc<Material>,
        uniforms: Option<Rc<CustomUniforms>>,
    ) -> RenderResult<usize> {
        let technique = material.technique_or(&self.config.default_technique);

        let Some(effect) = material.effect() else {
            log::warn!("Material '{}' has no effect loaded, draw not queued", material.name());
            return Err(RenderError::InvalidMaterial(material.name().to_string()));
        };
        if !effect.is_valid(technique) {
            log::warn!(
                "Technique '{}' of effect '{}' is missing or invalid, draw of '{}' not queued",
                technique,
                effect.name(),
                material.name()
            );
            return Err(RenderError::InvalidMaterial(material.name().to_string()));
        }
        if !geometry.is_valid() {
            log::warn!("Geometry '{}' is incomplete, draw not queued", geometry.name());
            return Err(RenderError::InvalidGeometry(geometry.name().to_string()));
        }

        let passes = effect.possible_passes(technique);
        for pass in &passes {
            self.queue.push(
                pass,
                QueueEntry {
                    node,
                    geometry: Rc::clone(&geometry),
                    material: Rc::clone(&material),
                    uniforms: uniforms.clone(),
                },
            );
        }
        log::trace!("Queued '{}' into {} pass(es)", geometry.name(), passes.len());
        Ok(passes.len())
    }

    /// Replay the bucket of `pass` with `camera` and return the number of
    /// draws issued
    ///
    /// The bucket is consumed: draining the same pass again before anything
    /// is re-queued draws nothing. With a cube target bound the bucket is
    /// replayed once per face from the camera's position.
    pub fn render_pass(&mut self, tree: &mut TransformTree, camera: &mut Camera, pass: &str) -> usize {
        let Some(bucket) = self.queue.take_bucket(pass) else {
            log::trace!("Pass '{}' has nothing queued", pass);
            return 0;
        };

        let drawn = match self.replay_views(tree, camera) {
            Ok(views) => {
                let items: Vec<DrawItem<'_>> = bucket.iter().map(DrawItem::from).collect();
                self.replay(tree, &views, &items, pass)
            }
            Err(error) => {
                log::warn!("Cannot resolve camera for pass '{}': {}", pass, error);
                0
            }
        };

        self.queue.finish_drain();
        log::debug!("Pass '{}': {} of {} queued draw(s) issued", pass, drawn, bucket.len());
        drawn
    }

    /// Draw one geometry immediately, bypassing the queue
    ///
    /// Uses the material's technique and `pass`, or the configured default
    /// pass. Returns the number of draws issued, six on a cube target.
    pub fn draw(
        &mut self,
        tree: &mut TransformTree,
        camera: &mut Camera,
        node: NodeId,
        geometry: &Geometry,
        material: &Material,
        uniforms: Option<&CustomUniforms>,
        pass: Option<&str>,
    ) -> RenderResult<usize> {
        let item = DrawItem {
            node,
            geometry,
            material,
            uniforms,
        };
        let pass = pass.map_or_else(|| self.config.default_pass.clone(), str::to_string);
        let views = self.replay_views(tree, camera)?;

        // Surface the first failure, the replay itself only logs
        let technique = material.technique_or(&self.config.default_technique);
        if let Err(error) = check_drawable(&item, technique, &pass) {
            log::warn!("Immediate draw of '{}' rejected: {}", geometry.name(), error);
            return Err(error);
        }

        Ok(self.replay(tree, &views, &[item], &pass))
    }

    /// Redirect rendering to `target`, or back to the backbuffer with `None`
    ///
    /// Returns false and keeps the previous target if binding fails.
    pub fn set_target(&mut self, target: Option<RenderTarget>) -> bool {
        match target {
            Some(target) => {
                let face = target.is_cube().then_some(CubeFace::PositiveX);
                if !target.bind(&mut self.context, face) {
                    return false;
                }
            }
            None => {
                self.bind_backbuffer();
            }
        }
        log::debug!("Render target set to {:?}", target.map(|t| t.framebuffer()));
        self.target = target;
        true
    }

    /// Clear the bound target, or the backbuffer, with `color` or the
    /// configured clear colour
    pub fn clear(&mut self, color: Option<[f32; 4]>) {
        let color = color.unwrap_or(self.config.clear_color);
        match self.target {
            Some(target) => {
                if target.clear(&mut self.context, color) && target.is_cube() {
                    // Leave the first face bound like set_target does
                    target.bind(&mut self.context, Some(CubeFace::PositiveX));
                }
            }
            None => self.context.clear(color),
        }
    }

    /// Finish the frame: present, drop every queued entry and advance time
    pub fn render(&mut self, delta_time: f32) -> RenderResult<()> {
        let presented = self.context.present();
        if let Err(error) = &presented {
            log::warn!("Present failed: {}", error);
        }

        let undrained = self.queue.entry_count();
        if undrained > 0 {
            log::debug!("Dropping {} undrained entr(ies) at frame end", undrained);
        }
        self.queue.clear();
        self.clock.advance(delta_time);
        presented
    }

    fn bind_backbuffer(&mut self) {
        let (width, height) = self.context.backbuffer_size();
        self.context.bind_framebuffer(None, None);
        self.context.set_viewport(width, height);
    }

    /// Camera views to replay with, paired with the face to bind first
    fn replay_views(
        &self,
        tree: &mut TransformTree,
        camera: &mut Camera,
    ) -> Result<Vec<(Option<CubeFace>, CameraView)>, SceneError> {
        match self.target {
            Some(target) if target.is_cube() => {
                let eye = camera.world_translation(tree)?;
                Ok(CubeFace::ALL
                    .iter()
                    .map(|&face| {
                        let view = CameraView::cube_face(
                            eye,
                            face,
                            self.config.cube_face_near_plane,
                            self.config.cube_face_far_plane,
                        );
                        (Some(face), view)
                    })
                    .collect())
            }
            Some(target) => Ok(vec![(None, camera.view(tree, target.width(), target.height())?)]),
            None => {
                let (width, height) = self.context.backbuffer_size();
                Ok(vec![(None, camera.view(tree, width, height)?)])
            }
        }
    }

    fn replay(
        &mut self,
        tree: &mut TransformTree,
        views: &[(Option<CubeFace>, CameraView)],
        items: &[DrawItem<'_>],
        pass: &str,
    ) -> usize {
        let time = self.clock.total_time();
        let mut drawn = 0;

        for (face, view) in views {
            if let (Some(target), Some(face)) = (self.target, *face) {
                if !target.bind(&mut self.context, Some(face)) {
                    continue;
                }
            }

            let frame = FrameUniforms::new(view, time);
            for item in items {
                let technique = item.material.technique_or(&self.config.default_technique);
                match submit(&mut self.context, tree, &frame, item, technique, pass) {
                    Ok(()) => drawn += 1,
                    Err(error) => log::warn!("Skipping draw of '{}': {}", item.geometry.name(), error),
                }
            }
        }

        drawn
    }
}

/// Validate that `item` can be drawn with `technique`/`pass`
fn check_drawable(item: &DrawItem<'_>, technique: &str, pass: &str) -> RenderResult<()> {
    let material = item.material;
    let effect = material
        .effect()
        .ok_or_else(|| RenderError::InvalidMaterial(material.name().to_string()))?;
    let resolved = effect.pass(technique, pass).ok_or_else(|| RenderError::UnknownPass {
        technique: technique.to_string(),
        pass: pass.to_string(),
    })?;
    if !resolved.is_valid() {
        return Err(RenderError::InvalidProgram {
            technique: technique.to_string(),
            pass: pass.to_string(),
        });
    }
    if !item.geometry.is_valid() {
        return Err(RenderError::InvalidGeometry(item.geometry.name().to_string()));
    }
    Ok(())
}

/// Bind everything `item` declares and issue its indexed draw
fn submit<C: GraphicsContext + ?Sized>(
    context: &mut C,
    tree: &mut TransformTree,
    frame: &FrameUniforms,
    item: &DrawItem<'_>,
    technique: &str,
    pass_name: &str,
) -> RenderResult<()> {
    check_drawable(item, technique, pass_name)?;
    let (Some(effect), Some(index_buffer)) = (item.material.effect(), item.geometry.index_buffer()) else {
        return Err(RenderError::InvalidGeometry(item.geometry.name().to_string()));
    };
    let Some(pass) = effect.pass(technique, pass_name) else {
        return Err(RenderError::UnknownPass {
            technique: technique.to_string(),
            pass: pass_name.to_string(),
        });
    };
    let model = tree.local_to_world(item.node)?;

    pass.apply(context);

    for attribute in item.geometry.attributes() {
        if let Some(location) = pass.attribute_location(&attribute.name) {
            context.bind_vertex_attribute(location.offset, attribute.buffer, attribute.components);
        }
    }

    if let Some(uniforms) = item.uniforms {
        for (name, value) in uniforms.iter() {
            match pass.uniform_location(name) {
                Some(location) => context.set_uniform(location.offset, value),
                None => log::trace!("Pass '{}' has no uniform '{}', skipped", pass_name, name),
            }
        }
    }

    let bindings = pass.standard_bindings();
    bindings.apply(context, frame, &model);

    for (unit, texture) in (0u32..).zip(item.material.textures()) {
        if let Some(location) = bindings.texture(unit as usize) {
            context.bind_texture(unit, *texture);
            context.set_sampler(location.offset, unit);
        }
    }

    context.draw_indexed(
        item.geometry.topology(),
        index_buffer,
        item.geometry.index_count(),
        item.geometry.index_width(),
    )
}
