//! Renderer error type

use thiserror::Error;

use crate::backend::BackendError;
use crate::uniforms::UniformKind;

/// Errors surfaced by the frame renderer
#[derive(Error, Debug)]
pub enum RenderError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("Shader compilation failed: {0}")]
    ShaderCompilation(String),
    #[error("Uniform '{name}' is declared by the program but was not provided")]
    MissingUniform { name: String },
    #[error("Uniform '{name}' expected {expected:?}, found {found:?}")]
    UniformTypeMismatch {
        name: String,
        expected: UniformKind,
        found: UniformKind,
    },
    #[error("Cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },
}

pub type RenderResult<T> = Result<T, RenderError>;
