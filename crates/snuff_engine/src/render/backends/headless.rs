//! Headless graphics context
//!
//! [`RecordingContext`] hands out handles, keeps a symbol table per program
//! and appends a [`GraphicsCommand`] for every state-changing call. Tests
//! inspect the command list to check what the renderer issued and in which
//! order.

use std::collections::{HashMap, HashSet};

use crate::render::context::{BufferHandle, FramebufferHandle, GraphicsContext, ProgramHandle, TextureHandle};
use crate::render::geometry::{IndexWidth, PrimitiveTopology};
use crate::render::state::PassState;
use crate::render::uniforms::UniformValue;
use crate::render::{RenderError, RenderResult};
use crate::scene::CubeFace;

/// One recorded context call
#[derive(Debug, Clone, PartialEq)]
pub enum GraphicsCommand {
    /// Framebuffer bound, `None` is the backbuffer
    BindFramebuffer {
        /// Framebuffer
        framebuffer: Option<FramebufferHandle>,
        /// Cube face attachment
        face: Option<CubeFace>,
    },
    /// Viewport resized
    Viewport {
        /// Width in pixels
        width: u32,
        /// Height in pixels
        height: u32,
    },
    /// Bound framebuffer cleared
    Clear([f32; 4]),
    /// Program made current
    UseProgram(ProgramHandle),
    /// Fixed-function state applied
    PassState(PassState),
    /// Uniform uploaded
    Uniform {
        /// Slot
        location: u32,
        /// Value
        value: UniformValue,
    },
    /// Sampler pointed at a texture unit
    Sampler {
        /// Slot
        location: u32,
        /// Texture unit
        unit: u32,
    },
    /// Texture bound to a unit
    BindTexture {
        /// Texture unit
        unit: u32,
        /// Texture
        texture: TextureHandle,
    },
    /// Vertex attribute fed from a buffer
    VertexAttribute {
        /// Slot
        location: u32,
        /// Source buffer
        buffer: BufferHandle,
        /// Floats per vertex
        components: u32,
    },
    /// Indexed draw
    Draw(DrawCall),
    /// Backbuffer presented
    Present,
}

/// Snapshot of the bindings an indexed draw executed with
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    /// Current program
    pub program: Option<ProgramHandle>,
    /// Bound framebuffer
    pub framebuffer: Option<FramebufferHandle>,
    /// Bound cube face
    pub face: Option<CubeFace>,
    /// Topology
    pub topology: PrimitiveTopology,
    /// Index buffer
    pub index_buffer: BufferHandle,
    /// Number of indices
    pub index_count: u32,
    /// Index width
    pub index_width: IndexWidth,
    /// Uniform values current at draw time, by slot
    pub uniforms: HashMap<u32, UniformValue>,
}

#[derive(Debug, Default)]
struct ProgramSymbols {
    attributes: HashMap<String, u32>,
    uniforms: HashMap<String, u32>,
}

/// Graphics context that records instead of rendering
#[derive(Debug)]
pub struct RecordingContext {
    width: u32,
    height: u32,
    next_handle: u64,
    programs: HashMap<ProgramHandle, ProgramSymbols>,
    framebuffers: HashSet<FramebufferHandle>,
    fail_draws: bool,

    current_program: Option<ProgramHandle>,
    current_framebuffer: Option<FramebufferHandle>,
    current_face: Option<CubeFace>,
    current_uniforms: HashMap<u32, UniformValue>,

    commands: Vec<GraphicsCommand>,
}

impl RecordingContext {
    /// Context with a `width` x `height` backbuffer
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            next_handle: 1,
            programs: HashMap::new(),
            framebuffers: HashSet::new(),
            fail_draws: false,
            current_program: None,
            current_framebuffer: None,
            current_face: None,
            current_uniforms: HashMap::new(),
            commands: Vec::new(),
        }
    }

    fn allocate(&mut self) -> u64 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }

    /// Resize the backbuffer
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    /// New buffer handle
    pub fn create_buffer(&mut self) -> BufferHandle {
        BufferHandle(self.allocate())
    }

    /// New texture handle
    pub fn create_texture(&mut self) -> TextureHandle {
        TextureHandle(self.allocate())
    }

    /// New complete framebuffer
    pub fn create_framebuffer(&mut self) -> FramebufferHandle {
        let framebuffer = FramebufferHandle(self.allocate());
        self.framebuffers.insert(framebuffer);
        framebuffer
    }

    /// Linked program exposing the given active attributes and uniforms
    ///
    /// Slots are numbered in declaration order, attributes and uniforms
    /// independently.
    pub fn create_program(&mut self, attributes: &[&str], uniforms: &[&str]) -> ProgramHandle {
        let number = |names: &[&str]| {
            (0u32..)
                .zip(names)
                .map(|(slot, name)| ((*name).to_string(), slot))
                .collect::<HashMap<_, _>>()
        };
        let program = ProgramHandle(self.allocate());
        self.programs.insert(
            program,
            ProgramSymbols {
                attributes: number(attributes),
                uniforms: number(uniforms),
            },
        );
        program
    }

    /// Program handle that failed to link
    pub fn create_invalid_program(&mut self) -> ProgramHandle {
        ProgramHandle(self.allocate())
    }

    /// Make every subsequent draw report a device error
    pub fn set_fail_draws(&mut self, fail: bool) {
        self.fail_draws = fail;
    }

    /// Recorded commands in issue order
    pub fn commands(&self) -> &[GraphicsCommand] {
        &self.commands
    }

    /// Take the recorded commands, leaving the list empty
    pub fn take_commands(&mut self) -> Vec<GraphicsCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Recorded draws in issue order
    pub fn draw_calls(&self) -> impl Iterator<Item = &DrawCall> {
        self.commands.iter().filter_map(|command| match command {
            GraphicsCommand::Draw(draw) => Some(draw),
            _ => None,
        })
    }

    /// Number of recorded draws
    pub fn draw_count(&self) -> usize {
        self.draw_calls().count()
    }

    /// Slot of a uniform in `program`, for assertions
    pub fn uniform_slot(&self, program: ProgramHandle, name: &str) -> Option<u32> {
        self.uniform_location(program, name)
    }
}

impl GraphicsContext for RecordingContext {
    fn backbuffer_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferHandle>, face: Option<CubeFace>) -> bool {
        if let Some(handle) = framebuffer {
            if !self.framebuffers.contains(&handle) {
                return false;
            }
        }
        self.current_framebuffer = framebuffer;
        self.current_face = face;
        self.commands.push(GraphicsCommand::BindFramebuffer { framebuffer, face });
        true
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        self.commands.push(GraphicsCommand::Viewport { width, height });
    }

    fn clear(&mut self, color: [f32; 4]) {
        self.commands.push(GraphicsCommand::Clear(color));
    }

    fn is_program_valid(&self, program: ProgramHandle) -> bool {
        self.programs.contains_key(&program)
    }

    fn attribute_location(&self, program: ProgramHandle, name: &str) -> Option<u32> {
        self.programs.get(&program)?.attributes.get(name).copied()
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<u32> {
        self.programs.get(&program)?.uniforms.get(name).copied()
    }

    fn use_program(&mut self, program: ProgramHandle) {
        if self.current_program != Some(program) {
            self.current_uniforms.clear();
        }
        self.current_program = Some(program);
        self.commands.push(GraphicsCommand::UseProgram(program));
    }

    fn apply_pass_state(&mut self, state: &PassState) {
        self.commands.push(GraphicsCommand::PassState(*state));
    }

    fn set_uniform(&mut self, location: u32, value: &UniformValue) {
        self.current_uniforms.insert(location, value.clone());
        self.commands.push(GraphicsCommand::Uniform {
            location,
            value: value.clone(),
        });
    }

    fn set_sampler(&mut self, location: u32, unit: u32) {
        self.commands.push(GraphicsCommand::Sampler { location, unit });
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureHandle) {
        self.commands.push(GraphicsCommand::BindTexture { unit, texture });
    }

    fn bind_vertex_attribute(&mut self, location: u32, buffer: BufferHandle, components: u32) {
        self.commands.push(GraphicsCommand::VertexAttribute {
            location,
            buffer,
            components,
        });
    }

    fn draw_indexed(
        &mut self,
        topology: PrimitiveTopology,
        index_buffer: BufferHandle,
        index_count: u32,
        index_width: IndexWidth,
    ) -> RenderResult<()> {
        if self.fail_draws {
            return Err(RenderError::Context("draw rejected by device".to_string()));
        }
        self.commands.push(GraphicsCommand::Draw(DrawCall {
            program: self.current_program,
            framebuffer: self.current_framebuffer,
            face: self.current_face,
            topology,
            index_buffer,
            index_count,
            index_width,
            uniforms: self.current_uniforms.clone(),
        }));
        Ok(())
    }

    fn present(&mut self) -> RenderResult<()> {
        self.commands.push(GraphicsCommand::Present);
        Ok(())
    }
}
