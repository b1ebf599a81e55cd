//! GPU-facing resources
//!
//! The sphere mesh, the single material and the environment textures.

mod environment;
mod material;
mod mesh;
mod texture;

pub use environment::*;
pub use material::*;
pub use mesh::*;
pub use texture::*;
