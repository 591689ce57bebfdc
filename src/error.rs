//! Error types.
//!
//! Every fallible operation in the crate returns [`Result`], whose error type is [`Error`].

use std::path::PathBuf;

use thiserror::Error;

use crate::abs::ShaderStage;

/// Everything that can go wrong while bringing up the window or loading resources.
#[derive(Debug, Error)]
pub enum Error {
    /// SDL could not be initialised or the window could not be created.
    #[error("failed to initialise window: {0}")]
    Window(String),

    /// The OpenGL context could not be created, made current or is too old.
    #[error("failed to load OpenGL: {0}")]
    OpenGlLoad(String),

    /// The driver refused to allocate an object.
    #[error("failed to create GPU object: {0}")]
    Gpu(String),

    /// A shader source file could not be read.
    #[error("failed to read {stage} shader source {}: {source}", path.display())]
    ShaderSource {
        stage: ShaderStage,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A single shader stage failed to compile.
    #[error("{stage} compilation failed for shader '{shader}': {log}")]
    Compile {
        shader: String,
        stage: ShaderStage,
        log: String,
    },

    /// The compiled stages failed to link into a program.
    #[error("linking failed for shader '{shader}': {log}")]
    Link { shader: String, log: String },

    /// A loader already holds a resource under this key.
    #[error("{kind} '{key}' is already loaded")]
    DuplicateKey { kind: &'static str, key: String },

    /// A loader holds no resource under this key.
    #[error("{kind} '{key}' is not loaded")]
    NotFound { kind: &'static str, key: String },

    /// The image file for a texture does not exist.
    #[error("image not found for texture '{key}': {}", path.display())]
    ImageNotFound { key: String, path: PathBuf },

    /// The image file exists but could not be decoded.
    #[error("failed to decode image for texture '{key}': {source}")]
    ImageDecode {
        key: String,
        #[source]
        source: image::ImageError,
    },

    /// The shader has no active uniform with this name.
    #[error("shader '{shader}' has no active uniform '{name}'")]
    UnknownUniform { shader: String, name: String },

    /// The value assigned to a uniform does not match its declared type.
    #[error("uniform '{name}' of shader '{shader}' is declared as {declared}, got a {assigned} value")]
    UniformTypeMismatch {
        shader: String,
        name: String,
        declared: &'static str,
        assigned: &'static str,
    },

    /// A material was attached without any shader to attach it to.
    #[error("material has no shader")]
    NoShader,

    /// The configuration file could not be read.
    #[error("failed to read config {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for [`crate::config::Config`].
    #[error("invalid config {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
