//! Workbench configuration.
//!
//! Everything has a default, so the file is optional and may set any subset of fields:
//!
//! ```json
//! { "window": { "width": 1280, "height": 720 }, "log_level": "debug" }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    abs::{ShaderPaths, UniformPolicy},
    error::{Error, Result},
};

/// File name looked up in the working directory.
pub const LOCAL_CONFIG: &str = "workbench.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub window: WindowConfig,
    pub assets: AssetConfig,
    pub uniform_policy: UniformPolicy,
    pub log_level: log::LevelFilter,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            assets: AssetConfig::default(),
            uniform_policy: UniformPolicy::Strict,
            log_level: log::LevelFilter::Info,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub gl_major: u8,
    pub gl_minor: u8,
    pub resizable: bool,
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "OpenGL Workbench".to_string(),
            width: 800,
            height: 600,
            gl_major: 3,
            gl_minor: 3,
            resizable: false,
            vsync: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Directory every other asset path is relative to.
    pub root: PathBuf,
    pub shader: ShaderPaths,
    /// Image for the tetrahedron. A checkerboard is generated when unset.
    pub texture: Option<PathBuf>,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("assets"),
            shader: ShaderPaths {
                vertex: PathBuf::from("shaders/tetrahedron.vert"),
                geometry: None,
                fragment: PathBuf::from("shaders/tetrahedron.frag"),
            },
            texture: None,
        }
    }
}

impl Config {
    /// Reads a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents, path)
    }

    fn parse(contents: &str, path: &Path) -> Result<Self> {
        serde_json::from_str(contents).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Finds the config file to use, if any.
    ///
    /// `./workbench.json` wins over `<config dir>/gl-workbench/config.json`.
    pub fn locate() -> Option<PathBuf> {
        let local = PathBuf::from(LOCAL_CONFIG);
        if local.is_file() {
            return Some(local);
        }
        dirs::config_dir()
            .map(|dir| dir.join("gl-workbench").join("config.json"))
            .filter(|path| path.is_file())
    }

    /// Loads the located config file, or the defaults when there is none.
    pub fn load_or_default() -> Result<Self> {
        match Self::locate() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }
}
