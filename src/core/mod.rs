/// Core Module for triplesh
///
/// This module contains the data-side building blocks of the shell: the
/// quad unit type, the quad store and the shared error type.

pub mod error;
pub mod quad;
pub mod store;

// Re-export commonly used types for convenience
pub use error::{Result, ShellError};
pub use quad::{parse_quad, Quad};
pub use store::{MemStore, QuadStore};
