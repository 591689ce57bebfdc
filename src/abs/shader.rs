//! OpenGL Shaders
//!
//! This module defines the [`Shader`] struct, a linked program with its introspected
//! uniforms, and the [`ShaderLoader`] cache that owns every loaded shader.

use std::{
    fmt,
    path::{Path, PathBuf},
    rc::Rc,
};

use serde::{Deserialize, Serialize};

use super::{
    GpuContext, ResourceCache,
    gpu::Gpu,
    uniform::{UniformValue, gl_type_name, is_sampler},
};
use crate::error::{Error, Result};

/// A programmable pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Geometry,
    Fragment,
}

impl ShaderStage {
    /// The GL enum of the stage.
    pub fn gl(self) -> u32 {
        match self {
            Self::Vertex => glow::VERTEX_SHADER,
            Self::Geometry => glow::GEOMETRY_SHADER,
            Self::Fragment => glow::FRAGMENT_SHADER,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Vertex => "vertex",
            Self::Geometry => "geometry",
            Self::Fragment => "fragment",
        })
    }
}

/// What to do when a setter names a uniform the program does not have.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UniformPolicy {
    /// Setting an unknown uniform is an error.
    #[default]
    Strict,
    /// Unknown uniforms are skipped.
    Lenient,
}

/// GLSL source text for every stage of a program.
#[derive(Debug, Clone)]
pub struct ShaderSources {
    pub vertex: String,
    pub geometry: Option<String>,
    pub fragment: String,
}

impl ShaderSources {
    pub fn new(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            vertex: vertex.into(),
            geometry: None,
            fragment: fragment.into(),
        }
    }

    pub fn with_geometry(mut self, geometry: impl Into<String>) -> Self {
        self.geometry = Some(geometry.into());
        self
    }

    /// Reads the sources from disk. The geometry stage is optional.
    pub fn read(vertex: &Path, geometry: Option<&Path>, fragment: &Path) -> Result<Self> {
        Ok(Self {
            vertex: read_stage(ShaderStage::Vertex, vertex)?,
            geometry: geometry
                .map(|path| read_stage(ShaderStage::Geometry, path))
                .transpose()?,
            fragment: read_stage(ShaderStage::Fragment, fragment)?,
        })
    }

    fn stages(&self) -> impl Iterator<Item = (ShaderStage, &str)> {
        [
            Some((ShaderStage::Vertex, self.vertex.as_str())),
            self.geometry
                .as_deref()
                .map(|source| (ShaderStage::Geometry, source)),
            Some((ShaderStage::Fragment, self.fragment.as_str())),
        ]
        .into_iter()
        .flatten()
    }
}

fn read_stage(stage: ShaderStage, path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| Error::ShaderSource {
        stage,
        path: path.to_path_buf(),
        source,
    })
}

/// An active uniform of a linked program.
#[derive(Debug, Clone)]
pub struct UniformInfo {
    pub name: String,
    pub gl_type: u32,
    /// Number of array elements, 1 for non-arrays.
    pub size: i32,
    pub location: Option<glow::UniformLocation>,
}

/// A compiled stage, deleted when dropped.
struct StageObject<'a> {
    gpu: &'a dyn Gpu,
    id: glow::Shader,
}

impl<'a> StageObject<'a> {
    fn compile(gpu: &'a dyn Gpu, shader: &str, stage: ShaderStage, source: &str) -> Result<Self> {
        let id = gpu.create_shader(stage.gl()).map_err(Error::Gpu)?;
        let object = Self { gpu, id };
        gpu.shader_source(id, source);
        gpu.compile_shader(id);

        if !gpu.get_shader_compile_status(id) {
            return Err(Error::Compile {
                shader: shader.to_string(),
                stage,
                log: gpu.get_shader_info_log(id),
            });
        }
        Ok(object)
    }
}

impl Drop for StageObject<'_> {
    fn drop(&mut self) {
        self.gpu.delete_shader(self.id);
    }
}

/// A linked shader program stored on the GPU side.
pub struct Shader {
    gpu: GpuContext,
    id: glow::Program,
    name: String,
    uniforms: Vec<UniformInfo>,
    policy: UniformPolicy,
}

impl Shader {
    /// Compiles and links a program from the given sources, then introspects its uniforms.
    ///
    /// On failure every stage object and the program object are deleted before returning.
    pub fn new(
        gpu: &GpuContext,
        name: &str,
        sources: &ShaderSources,
        policy: UniformPolicy,
    ) -> Result<Self> {
        let stages = sources
            .stages()
            .map(|(stage, source)| StageObject::compile(gpu.as_ref(), name, stage, source))
            .collect::<Result<Vec<_>>>()?;

        let program = gpu.create_program().map_err(Error::Gpu)?;
        for stage in &stages {
            gpu.attach_shader(program, stage.id);
        }
        gpu.link_program(program);

        if !gpu.get_program_link_status(program) {
            let log = gpu.get_program_info_log(program);
            gpu.delete_program(program);
            return Err(Error::Link {
                shader: name.to_string(),
                log,
            });
        }

        for stage in &stages {
            gpu.detach_shader(program, stage.id);
        }
        drop(stages);

        let uniforms = introspect(gpu.as_ref(), program);

        Ok(Self {
            gpu: Rc::clone(gpu),
            id: program,
            name: name.to_string(),
            uniforms,
            policy,
        })
    }

    /// Binds the program for use.
    pub fn use_program(&self) {
        self.gpu.use_program(Some(self.id));
    }

    pub fn id(&self) -> glow::Program {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn policy(&self) -> UniformPolicy {
        self.policy
    }

    pub fn has_uniform(&self, name: &str) -> bool {
        self.uniform(name).is_some()
    }

    pub fn uniform(&self, name: &str) -> Option<&UniformInfo> {
        self.uniforms.iter().find(|u| u.name == name)
    }

    pub fn uniforms(&self) -> &[UniformInfo] {
        &self.uniforms
    }

    fn gpu(&self) -> &dyn Gpu {
        self.gpu.as_ref()
    }

    /// Sets a uniform of this program. The program must be bound.
    pub fn set_uniform(&self, name: &str, value: impl Into<UniformValue>) -> Result<()> {
        self.set_value(name, &value.into())
    }

    /// Sets every element `name[i]` of a uniform array.
    pub fn set_uniform_array<T>(&self, name: &str, values: &[T]) -> Result<()>
    where
        T: Into<UniformValue> + Copy,
    {
        let Some(info) = self.resolve(name)? else {
            return Ok(());
        };
        let value_count = values.len();
        if value_count > info.size as usize {
            log::warn!(
                "shader '{}': {} values given for '{}[{}]', extra values dropped",
                self.name,
                value_count,
                name,
                info.size
            );
        }
        for (index, value) in values.iter().take(info.size as usize).enumerate() {
            let value = (*value).into();
            self.check_type(info, &value)?;
            // A non-array uniform has no `name[0]` location.
            let location = match index {
                0 => info.location.clone(),
                _ => self
                    .gpu
                    .get_uniform_location(self.id, &format!("{name}[{index}]")),
            };
            value.upload(self.gpu(), location.as_ref());
        }
        Ok(())
    }

    /// Points a sampler uniform at a texture unit.
    pub fn set_sampler(&self, name: &str, unit: u32) -> Result<()> {
        let Some(info) = self.resolve(name)? else {
            return Ok(());
        };
        if !is_sampler(info.gl_type) {
            return Err(self.mismatch(info, "sampler"));
        }
        self.gpu.uniform_1_i32(info.location.as_ref(), unit as i32);
        Ok(())
    }

    /// Sets a uniform from an already tagged value.
    pub fn set_value(&self, name: &str, value: &UniformValue) -> Result<()> {
        let Some(info) = self.resolve(name)? else {
            return Ok(());
        };
        self.check_type(info, value)?;
        value.upload(self.gpu(), info.location.as_ref());
        Ok(())
    }

    /// Logs the introspected uniform table at debug level.
    pub fn log_uniforms(&self) {
        log::debug!("shader '{}' ({} uniforms)", self.name, self.uniforms.len());
        for u in &self.uniforms {
            log::debug!(
                "  {:<16} {:<12} size {:<3} location {:?}",
                u.name,
                gl_type_name(u.gl_type),
                u.size,
                u.location.as_ref().map(|l| l.0)
            );
        }
    }

    fn resolve(&self, name: &str) -> Result<Option<&UniformInfo>> {
        match (self.uniform(name), self.policy) {
            (Some(info), _) => Ok(Some(info)),
            (None, UniformPolicy::Lenient) => {
                log::trace!("shader '{}': ignoring unknown uniform '{}'", self.name, name);
                Ok(None)
            }
            (None, UniformPolicy::Strict) => Err(Error::UnknownUniform {
                shader: self.name.clone(),
                name: name.to_string(),
            }),
        }
    }

    fn check_type(&self, info: &UniformInfo, value: &UniformValue) -> Result<()> {
        if value.matches(info.gl_type) {
            Ok(())
        } else {
            Err(self.mismatch(info, value.type_name()))
        }
    }

    fn mismatch(&self, info: &UniformInfo, assigned: &'static str) -> Error {
        Error::UniformTypeMismatch {
            shader: self.name.clone(),
            name: info.name.clone(),
            declared: gl_type_name(info.gl_type),
            assigned,
        }
    }
}

impl Drop for Shader {
    fn drop(&mut self) {
        self.gpu.delete_program(self.id);
    }
}

fn introspect(gpu: &dyn Gpu, program: glow::Program) -> Vec<UniformInfo> {
    gpu.get_active_uniforms(program)
        .into_iter()
        .map(|active| {
            let location = gpu.get_uniform_location(program, &active.name);
            let name = match active.name.strip_suffix("[0]") {
                Some(base) => base.to_string(),
                None => active.name,
            };
            UniformInfo {
                name,
                gl_type: active.utype,
                size: active.size,
                location,
            }
        })
        .collect()
}

/// Caches shaders by name.
pub struct ShaderLoader {
    gpu: GpuContext,
    policy: UniformPolicy,
    shaders: ResourceCache<Shader>,
}

impl ShaderLoader {
    /// Creates an empty loader. Every shader it loads uses the given uniform policy.
    pub fn new(gpu: &GpuContext, policy: UniformPolicy) -> Self {
        Self {
            gpu: Rc::clone(gpu),
            policy,
            shaders: ResourceCache::new("shader"),
        }
    }

    /// Loads a vertex + fragment program from files.
    pub fn load(
        &mut self,
        key: &str,
        vertex: impl AsRef<Path>,
        fragment: impl AsRef<Path>,
    ) -> Result<&Shader> {
        self.shaders.ensure_vacant(key)?;
        let sources = ShaderSources::read(vertex.as_ref(), None, fragment.as_ref())?;
        self.load_sources(key, &sources)
    }

    /// Loads a vertex + geometry + fragment program from files.
    pub fn load_with_geometry(
        &mut self,
        key: &str,
        vertex: impl AsRef<Path>,
        geometry: impl AsRef<Path>,
        fragment: impl AsRef<Path>,
    ) -> Result<&Shader> {
        self.shaders.ensure_vacant(key)?;
        let sources =
            ShaderSources::read(vertex.as_ref(), Some(geometry.as_ref()), fragment.as_ref())?;
        self.load_sources(key, &sources)
    }

    /// Loads a program from in-memory sources.
    pub fn load_sources(&mut self, key: &str, sources: &ShaderSources) -> Result<&Shader> {
        self.shaders.ensure_vacant(key)?;
        let shader = Shader::new(&self.gpu, key, sources, self.policy)?;
        shader.log_uniforms();
        self.shaders.insert(key, shader)
    }

    pub fn get(&self, key: &str) -> Result<&Shader> {
        self.shaders.get(key)
    }

    /// Deletes the program stored under `key`.
    pub fn unload(&mut self, key: &str) -> Result<()> {
        self.shaders.remove(key).map(drop)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.shaders.contains(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.shaders.keys()
    }

    pub fn len(&self) -> usize {
        self.shaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shaders.is_empty()
    }
}

/// Paths of the stage sources of a program, relative to some asset root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShaderPaths {
    pub vertex: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<PathBuf>,
    pub fragment: PathBuf,
}

impl ShaderPaths {
    /// Loads the program into `loader`, resolving the paths against `root`.
    pub fn load_into<'a>(
        &self,
        loader: &'a mut ShaderLoader,
        key: &str,
        root: &Path,
    ) -> Result<&'a Shader> {
        match &self.geometry {
            Some(geometry) => loader.load_with_geometry(
                key,
                root.join(&self.vertex),
                root.join(geometry),
                root.join(&self.fragment),
            ),
            None => loader.load(key, root.join(&self.vertex), root.join(&self.fragment)),
        }
    }
}
