//! Material system for rendering

use std::rc::Rc;

use super::context::TextureHandle;
use super::effect::Effect;

/// Effect, technique and textures a draw renders with
///
/// The effect is shared between every material that uses it. A material
/// without an effect is still constructible (the effect may be loading) but
/// is rejected when queued.
#[derive(Debug, Clone, Default)]
pub struct Material {
    name: String,
    effect: Option<Rc<Effect>>,
    technique: Option<String>,
    textures: Vec<TextureHandle>,
}

impl Material {
    /// Material using `effect` with the renderer's default technique
    pub fn new(name: impl Into<String>, effect: Rc<Effect>) -> Self {
        Self {
            name: name.into(),
            effect: Some(effect),
            ..Default::default()
        }
    }

    /// Material whose effect is not available yet
    pub fn pending(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Builder: pick a technique
    pub fn with_technique(mut self, technique: impl Into<String>) -> Self {
        self.technique = Some(technique.into());
        self
    }

    /// Builder: append a texture, bound to the next `texN` sampler
    pub fn with_texture(mut self, texture: TextureHandle) -> Self {
        self.textures.push(texture);
        self
    }

    /// Name for diagnostics
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Effect, if loaded
    pub fn effect(&self) -> Option<&Rc<Effect>> {
        self.effect.as_ref()
    }

    /// Attach the effect once it is loaded
    pub fn set_effect(&mut self, effect: Rc<Effect>) {
        self.effect = Some(effect);
    }

    /// Explicit technique, `None` means the renderer default
    pub fn technique(&self) -> Option<&str> {
        self.technique.as_deref()
    }

    /// Technique to render with, falling back to `default`
    pub fn technique_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.technique().unwrap_or(default)
    }

    /// Textures in unit order
    pub fn textures(&self) -> &[TextureHandle] {
        &self.textures
    }

    /// Whether the effect is loaded and the technique usable
    pub fn is_valid(&self, default_technique: &str) -> bool {
        self.effect
            .as_ref()
            .is_some_and(|effect| effect.is_valid(self.technique_or(default_technique)))
    }
}
