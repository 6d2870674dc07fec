//! # Effects, Techniques and Passes
//!
//! An [`Effect`] groups named techniques; a technique is an ordered list of
//! passes; a [`Pass`] is one shader program plus fixed-function state.
//!
//! Each pass resolves its [`ShaderLayout`] against the graphics context when
//! it is built, so binding lookups during drawing never go back to the
//! device. The standard per-frame uniforms are resolved a second time into
//! a [`StandardBindings`] table so the draw loop does not hash their names.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::context::{GraphicsContext, ProgramHandle};
use super::state::PassState;
use super::uniforms::{names, StandardBindings};

/// Highest texture unit probed for `texN` samplers
pub const MAX_TEXTURE_UNITS: usize = 16;

/// Resolved binding slot of a vertex attribute or uniform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayoutLocation {
    /// Context slot the value is bound to
    pub offset: u32,
    /// Size in bytes of the declared GLSL type
    pub size: usize,
}

/// One declared input of a shader
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutEntry {
    /// Name in the shader source
    pub name: String,
    /// GLSL type, e.g. `vec3` or `mat4`
    #[serde(rename = "type")]
    pub glsl_type: String,
}

/// Inputs a pass's program declares
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ShaderLayout {
    /// Per-vertex inputs
    pub vertex_attributes: Vec<LayoutEntry>,
    /// Uniforms, samplers included
    pub uniforms: Vec<LayoutEntry>,
}

impl ShaderLayout {
    /// Empty layout
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: declare a vertex attribute
    pub fn with_attribute(mut self, name: impl Into<String>, glsl_type: impl Into<String>) -> Self {
        self.vertex_attributes.push(LayoutEntry {
            name: name.into(),
            glsl_type: glsl_type.into(),
        });
        self
    }

    /// Builder: declare a uniform
    pub fn with_uniform(mut self, name: impl Into<String>, glsl_type: impl Into<String>) -> Self {
        self.uniforms.push(LayoutEntry {
            name: name.into(),
            glsl_type: glsl_type.into(),
        });
        self
    }
}

/// Byte size of a GLSL type, `None` for types the layout cannot describe
///
/// Samplers count as an `int` slot.
pub fn glsl_type_size(glsl_type: &str) -> Option<usize> {
    match glsl_type {
        "bool" | "char" => return Some(1),
        "int" | "uint" | "float" => return Some(4),
        "double" => return Some(8),
        "mat2" => return Some(16),
        "mat3" => return Some(36),
        "mat4" => return Some(64),
        _ if glsl_type.starts_with("sampler") => return Some(4),
        _ => {}
    }

    let (prefix, count) = glsl_type.split_once("vec")?;
    let count: usize = count.parse().ok().filter(|n| (2..=4).contains(n))?;
    let element = match prefix {
        "" => 4,
        "b" => 1,
        "i" | "u" => 4,
        "d" => 8,
        _ => return None,
    };
    Some(count * element)
}

/// One shader program with its state and resolved bindings
#[derive(Debug, Clone)]
pub struct Pass {
    name: String,
    program: ProgramHandle,
    valid: bool,
    state: PassState,
    attributes: HashMap<String, LayoutLocation>,
    uniforms: HashMap<String, LayoutLocation>,
    standard: StandardBindings,
}

impl Pass {
    /// Build a pass, resolving every layout entry against `context`
    ///
    /// Entries with an unknown type, or that the program does not expose,
    /// are skipped with a warning. An invalid program resolves nothing.
    pub fn new<C: GraphicsContext + ?Sized>(
        name: impl Into<String>,
        program: ProgramHandle,
        state: PassState,
        layout: &ShaderLayout,
        context: &C,
    ) -> Self {
        let name = name.into();
        let valid = context.is_program_valid(program);
        let mut attributes = HashMap::new();
        let mut uniforms = HashMap::new();

        if valid {
            for entry in &layout.vertex_attributes {
                let offset = context.attribute_location(program, &entry.name);
                if let Some(location) = resolve_entry(&name, entry, offset) {
                    attributes.insert(entry.name.clone(), location);
                }
            }
            for entry in &layout.uniforms {
                let offset = context.uniform_location(program, &entry.name);
                if let Some(location) = resolve_entry(&name, entry, offset) {
                    uniforms.insert(entry.name.clone(), location);
                }
            }
        } else {
            log::warn!("Pass '{}' was built with an invalid program {:?}", name, program);
        }

        let standard = Self::resolve_standard(&uniforms);
        Self {
            name,
            program,
            valid,
            state,
            attributes,
            uniforms,
            standard,
        }
    }

    fn resolve_standard(uniforms: &HashMap<String, LayoutLocation>) -> StandardBindings {
        let lookup = |name: &str| uniforms.get(name).copied();
        StandardBindings {
            projection: lookup(names::PROJECTION),
            view: lookup(names::VIEW),
            inv_view_dir_projection: lookup(names::INV_VIEW_DIR_PROJECTION),
            eye_position: lookup(names::EYE_POSITION),
            time: lookup(names::TIME),
            model: lookup(names::MODEL),
            inv_transposed_model: lookup(names::INV_TRANSPOSED_MODEL),
            textures: (0..MAX_TEXTURE_UNITS)
                .map(|unit| lookup(&format!("{}{unit}", names::TEXTURE_PREFIX)))
                .collect(),
        }
    }

    /// Pass name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Program drawn with
    pub fn program(&self) -> ProgramHandle {
        self.program
    }

    /// Fixed-function state
    pub fn state(&self) -> &PassState {
        &self.state
    }

    /// Whether the program linked
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Slot of a declared input, `None` if undeclared or inactive
    ///
    /// Uniforms shadow vertex attributes of the same name.
    pub fn layout_location(&self, name: &str) -> Option<LayoutLocation> {
        self.uniform_location(name).or_else(|| self.attribute_location(name))
    }

    /// Slot of a declared vertex attribute
    pub fn attribute_location(&self, name: &str) -> Option<LayoutLocation> {
        self.attributes.get(name).copied()
    }

    /// Slot of a declared uniform or sampler
    pub fn uniform_location(&self, name: &str) -> Option<LayoutLocation> {
        self.uniforms.get(name).copied()
    }

    /// Standard uniform slot table
    pub fn standard_bindings(&self) -> &StandardBindings {
        &self.standard
    }

    /// Make the program current and apply the fixed-function state
    pub fn apply<C: GraphicsContext + ?Sized>(&self, context: &mut C) {
        context.use_program(self.program);
        context.apply_pass_state(&self.state);
    }
}

/// Size and slot of one layout entry, `None` when it cannot be bound
fn resolve_entry(pass: &str, entry: &LayoutEntry, offset: Option<u32>) -> Option<LayoutLocation> {
    let Some(size) = glsl_type_size(&entry.glsl_type) else {
        log::warn!("Pass '{}': unknown type '{}' for '{}', skipping", pass, entry.glsl_type, entry.name);
        return None;
    };
    let Some(offset) = offset else {
        log::debug!("Pass '{}': '{}' is declared but not active in the program", pass, entry.name);
        return None;
    };
    Some(LayoutLocation { offset, size })
}

/// Ordered passes sharing a technique name
#[derive(Debug, Clone, Default)]
pub struct Technique {
    passes: Vec<Pass>,
}

impl Technique {
    /// Technique without passes
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: append a pass, replacing one with the same name
    pub fn with_pass(mut self, pass: Pass) -> Self {
        self.add_pass(pass);
        self
    }

    /// Append a pass, replacing one with the same name in place
    pub fn add_pass(&mut self, pass: Pass) {
        match self.passes.iter_mut().find(|existing| existing.name == pass.name) {
            Some(existing) => *existing = pass,
            None => self.passes.push(pass),
        }
    }

    /// Pass by name
    pub fn pass(&self, name: &str) -> Option<&Pass> {
        self.passes.iter().find(|pass| pass.name == name)
    }

    /// Passes in declaration order
    pub fn passes(&self) -> &[Pass] {
        &self.passes
    }

    /// Valid when it has passes and every program linked
    pub fn is_valid(&self) -> bool {
        !self.passes.is_empty() && self.passes.iter().all(Pass::is_valid)
    }
}

/// A named set of techniques
#[derive(Debug, Clone)]
pub struct Effect {
    name: String,
    techniques: HashMap<String, Technique>,
}

impl Effect {
    /// Effect without techniques
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            techniques: HashMap::new(),
        }
    }

    /// Builder: add a technique
    pub fn with_technique(mut self, name: impl Into<String>, technique: Technique) -> Self {
        self.techniques.insert(name.into(), technique);
        self
    }

    /// Effect name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Technique by name
    pub fn technique(&self, name: &str) -> Option<&Technique> {
        self.techniques.get(name)
    }

    /// Pass of a technique
    pub fn pass(&self, technique: &str, pass: &str) -> Option<&Pass> {
        self.technique(technique)?.pass(pass)
    }

    /// Names of the passes a technique declares, in declaration order
    ///
    /// Empty for an unknown technique.
    pub fn possible_passes(&self, technique: &str) -> Vec<&str> {
        self.technique(technique)
            .map(|technique| technique.passes.iter().map(Pass::name).collect())
            .unwrap_or_default()
    }

    /// Binding slot of `name` in one pass
    pub fn layout_location(&self, technique: &str, pass: &str, name: &str) -> Option<LayoutLocation> {
        self.pass(technique, pass)?.layout_location(name)
    }

    /// Whether the technique exists and all its passes are usable
    pub fn is_valid(&self, technique: &str) -> bool {
        self.technique(technique).is_some_and(Technique::is_valid)
    }

    /// Whether every technique is usable
    pub fn validate_all(&self) -> bool {
        self.techniques.values().all(Technique::is_valid)
    }
}
