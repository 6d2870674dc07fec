//! Per-draw uniform values
//!
//! [`CustomUniforms`] carries the typed overrides a caller attaches to a
//! queued draw. [`StandardBindings`] is the slot table for the per-frame
//! uniforms every pass may declare, resolved once when the pass is built.

use std::collections::BTreeMap;

use crate::foundation::math::{Mat3, Mat4, Mat4Ext, Vec2, Vec3, Vec4};
use crate::scene::CameraView;

use super::context::GraphicsContext;
use super::effect::LayoutLocation;

/// Value types a custom uniform can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UniformType {
    /// `float`
    Float,
    /// `vec2`
    Vec2,
    /// `vec3`
    Vec3,
    /// `vec4`
    Vec4,
    /// `mat3`
    Mat3,
    /// `mat4`
    Mat4,
}

/// A typed uniform value
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    /// Scalar
    Float(f32),
    /// Two components
    Vec2(Vec2),
    /// Three components
    Vec3(Vec3),
    /// Four components
    Vec4(Vec4),
    /// 3x3 matrix
    Mat3(Mat3),
    /// 4x4 matrix
    Mat4(Mat4),
}

impl UniformValue {
    /// Type tag of the value
    pub fn uniform_type(&self) -> UniformType {
        match self {
            UniformValue::Float(_) => UniformType::Float,
            UniformValue::Vec2(_) => UniformType::Vec2,
            UniformValue::Vec3(_) => UniformType::Vec3,
            UniformValue::Vec4(_) => UniformType::Vec4,
            UniformValue::Mat3(_) => UniformType::Mat3,
            UniformValue::Mat4(_) => UniformType::Mat4,
        }
    }
}

/// Named uniform overrides for one draw, grouped by type
///
/// A name holds at most one value; setting it again with a different type
/// replaces the previous entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomUniforms {
    values: BTreeMap<UniformType, BTreeMap<String, UniformValue>>,
}

impl CustomUniforms {
    /// Empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a uniform, replacing any previous value under the same name
    pub fn set(&mut self, name: impl Into<String>, value: UniformValue) -> &mut Self {
        let name = name.into();
        self.remove(&name);
        self.values
            .entry(value.uniform_type())
            .or_default()
            .insert(name, value);
        self
    }

    /// Set a `float`
    pub fn set_float(&mut self, name: impl Into<String>, value: f32) -> &mut Self {
        self.set(name, UniformValue::Float(value))
    }

    /// Set a `vec2`
    pub fn set_vec2(&mut self, name: impl Into<String>, value: Vec2) -> &mut Self {
        self.set(name, UniformValue::Vec2(value))
    }

    /// Set a `vec3`
    pub fn set_vec3(&mut self, name: impl Into<String>, value: Vec3) -> &mut Self {
        self.set(name, UniformValue::Vec3(value))
    }

    /// Set a `vec4`
    pub fn set_vec4(&mut self, name: impl Into<String>, value: Vec4) -> &mut Self {
        self.set(name, UniformValue::Vec4(value))
    }

    /// Set a `mat3`
    pub fn set_mat3(&mut self, name: impl Into<String>, value: Mat3) -> &mut Self {
        self.set(name, UniformValue::Mat3(value))
    }

    /// Set a `mat4`
    pub fn set_mat4(&mut self, name: impl Into<String>, value: Mat4) -> &mut Self {
        self.set(name, UniformValue::Mat4(value))
    }

    /// Remove a uniform of any type
    pub fn remove(&mut self, name: &str) -> Option<UniformValue> {
        self.values.values_mut().find_map(|by_name| by_name.remove(name))
    }

    /// Look up a uniform of any type
    pub fn get(&self, name: &str) -> Option<&UniformValue> {
        self.values.values().find_map(|by_name| by_name.get(name))
    }

    /// Uniforms of one type, ordered by name
    pub fn of_type(&self, uniform_type: UniformType) -> impl Iterator<Item = (&str, &UniformValue)> {
        self.values
            .get(&uniform_type)
            .into_iter()
            .flat_map(|by_name| by_name.iter().map(|(name, value)| (name.as_str(), value)))
    }

    /// Every uniform, ordered by type then name
    pub fn iter(&self) -> impl Iterator<Item = (&str, &UniformValue)> {
        self.values
            .values()
            .flat_map(|by_name| by_name.iter().map(|(name, value)| (name.as_str(), value)))
    }

    /// Number of uniforms
    pub fn len(&self) -> usize {
        self.values.values().map(BTreeMap::len).sum()
    }

    /// Whether no uniform is set
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Uniform names every pass may declare
pub mod names {
    /// Camera projection matrix
    pub const PROJECTION: &str = "Projection";
    /// Camera view matrix
    pub const VIEW: &str = "View";
    /// `inverse(Projection * View)` with the view translation removed
    pub const INV_VIEW_DIR_PROJECTION: &str = "InvViewDirProjection";
    /// Camera world position
    pub const EYE_POSITION: &str = "EyePosition";
    /// Seconds since the renderer started
    pub const TIME: &str = "Time";
    /// Node world matrix
    pub const MODEL: &str = "Model";
    /// 3x3 inverse-transpose of the node world matrix
    pub const INV_TRANSPOSED_MODEL: &str = "InvTransposedModel";
    /// Prefix of sampler uniforms, `tex0`, `tex1`, ...
    pub const TEXTURE_PREFIX: &str = "tex";
}

/// Camera-dependent uniform values shared by every draw of one replay
#[derive(Debug, Clone, PartialEq)]
pub struct FrameUniforms {
    /// Projection matrix
    pub projection: Mat4,
    /// View matrix
    pub view: Mat4,
    /// Direction-only inverse view-projection
    pub inv_view_dir_projection: Mat4,
    /// Camera world position
    pub eye_position: Vec3,
    /// Seconds since the renderer started
    pub time: f32,
}

impl FrameUniforms {
    /// Derive the per-replay values from a resolved camera
    pub fn new(camera: &CameraView, time: f32) -> Self {
        Self {
            projection: camera.projection,
            view: camera.view,
            inv_view_dir_projection: camera.inv_view_dir_projection(),
            eye_position: camera.eye_position,
            time,
        }
    }
}

/// Slots of the standard uniforms in one pass, `None` where undeclared
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StandardBindings {
    /// `Projection`
    pub projection: Option<LayoutLocation>,
    /// `View`
    pub view: Option<LayoutLocation>,
    /// `InvViewDirProjection`
    pub inv_view_dir_projection: Option<LayoutLocation>,
    /// `EyePosition`
    pub eye_position: Option<LayoutLocation>,
    /// `Time`
    pub time: Option<LayoutLocation>,
    /// `Model`
    pub model: Option<LayoutLocation>,
    /// `InvTransposedModel`
    pub inv_transposed_model: Option<LayoutLocation>,
    /// `tex0..texN`, indexed by texture unit
    pub textures: Vec<Option<LayoutLocation>>,
}

impl StandardBindings {
    /// Upload the per-frame and per-node values the pass declares
    pub fn apply<C: GraphicsContext + ?Sized>(&self, context: &mut C, frame: &FrameUniforms, model: &Mat4) {
        let mut upload = |slot: Option<LayoutLocation>, value: UniformValue| {
            if let Some(location) = slot {
                context.set_uniform(location.offset, &value);
            }
        };

        upload(self.projection, UniformValue::Mat4(frame.projection));
        upload(self.view, UniformValue::Mat4(frame.view));
        upload(self.inv_view_dir_projection, UniformValue::Mat4(frame.inv_view_dir_projection));
        upload(self.eye_position, UniformValue::Vec3(frame.eye_position));
        upload(self.time, UniformValue::Float(frame.time));
        upload(self.model, UniformValue::Mat4(*model));
        if self.inv_transposed_model.is_some() {
            upload(self.inv_transposed_model, UniformValue::Mat3(model.normal_matrix()));
        }
    }

    /// Sampler slot for a texture unit
    pub fn texture(&self, unit: usize) -> Option<LayoutLocation> {
        self.textures.get(unit).copied().flatten()
    }
}
