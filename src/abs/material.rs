//! Materials: a shader plus the uniform values and textures to draw with.

use indexmap::IndexMap;

use super::{Shader, ShaderLoader, TextureLoader, UniformValue};
use crate::error::{Error, Result};

/// A texture bound to a sampler uniform through a texture unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplerBinding {
    /// Key of the texture in its [`TextureLoader`].
    pub texture: String,
    pub unit: u32,
}

/// A named bag of uniform values and sampler bindings, applied to a shader on demand.
///
/// Shaders and textures are referenced by loader key, so a material never refers to an
/// unloaded GPU object. Values are applied in insertion order.
#[derive(Debug, Clone, Default)]
pub struct Material {
    shader: Option<String>,
    uniforms: IndexMap<String, UniformValue>,
    samplers: IndexMap<String, SamplerBinding>,
}

impl Material {
    pub fn new(shader: Option<&str>) -> Self {
        Self {
            shader: shader.map(str::to_string),
            ..Self::default()
        }
    }

    /// Key of the default shader.
    pub fn shader(&self) -> Option<&str> {
        self.shader.as_deref()
    }

    pub fn set_shader(&mut self, shader: Option<&str>) {
        self.shader = shader.map(str::to_string);
    }

    /// Stores a uniform value, replacing any previous value of the same name.
    pub fn set(&mut self, name: &str, value: impl Into<UniformValue>) {
        self.uniforms.insert(name.to_string(), value.into());
    }

    /// Binds the texture loaded under `texture` to a sampler uniform through `unit`.
    pub fn set_texture(&mut self, name: &str, texture: &str, unit: u32) {
        let binding = SamplerBinding {
            texture: texture.to_string(),
            unit,
        };
        self.samplers.insert(name.to_string(), binding);
    }

    pub fn uniform(&self, name: &str) -> Option<&UniformValue> {
        self.uniforms.get(name)
    }

    pub fn uniforms(&self) -> &IndexMap<String, UniformValue> {
        &self.uniforms
    }

    pub fn samplers(&self) -> &IndexMap<String, SamplerBinding> {
        &self.samplers
    }

    /// Binds a shader and applies every stored uniform and sampler to it.
    ///
    /// `shader` overrides the material's own shader, which is otherwise looked up in
    /// `shaders`. Fails with [`Error::NotFound`] if a texture has been unloaded.
    pub fn attach(
        &self,
        shaders: &ShaderLoader,
        textures: &TextureLoader,
        shader: Option<&Shader>,
    ) -> Result<()> {
        let shader = match (shader, &self.shader) {
            (Some(shader), _) => shader,
            (None, Some(key)) => shaders.get(key)?,
            (None, None) => return Err(Error::NoShader),
        };

        shader.use_program();
        for (name, value) in &self.uniforms {
            shader.set_value(name, value)?;
        }
        for (name, binding) in &self.samplers {
            textures.get(&binding.texture)?.bind(binding.unit);
            shader.set_sampler(name, binding.unit)?;
        }
        Ok(())
    }
}
