//! A small OpenGL workbench: an SDL2 window with a core-profile context, resource
//! loaders for shaders, textures and meshes, materials, and a frame loop drawing a
//! textured tetrahedron.

pub mod abs;
pub mod app;
pub mod config;
pub mod error;
pub mod logging;
pub mod time;
pub mod workbench;

pub use error::{Error, Result};
