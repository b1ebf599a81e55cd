//! Backend abstraction layer
//!
//! Provides the GPU-facing trait the renderer is written against, the wgpu
//! implementation used by the viewer, and a recording backend for tests.

pub mod dummy;
pub mod traits;
pub mod types;
pub mod wgpu_backend;

pub use traits::*;
pub use types::*;
