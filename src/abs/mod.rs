//! This module contains the core components for the rendering workbench,
//! including window setup, the GPU seam, shader, mesh and texture handling and materials.

pub mod gpu;
pub mod loader;
pub mod material;
pub mod mesh;
pub mod shader;
pub mod texture;
pub mod uniform;
pub mod window;

#[cfg(test)]
pub(crate) mod mock;

pub use gpu::*;
pub use loader::*;
pub use material::*;
pub use mesh::*;
pub use shader::*;
pub use texture::*;
pub use uniform::*;
pub use window::*;
