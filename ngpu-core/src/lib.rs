//! Backend-agnostic types for the portable GPU abstraction layer: error
//! codes, the format registry, the std140/std430 block layout engine,
//! resource descriptors, the tagged-union command buffer, and the
//! `GpuContext` trait every backend (`ngpu-gl`, ...) implements.

pub mod block;
pub mod cmd;
pub mod config;
pub mod context;
pub mod descriptors;
pub mod dimensions;
pub mod error;
pub mod format;
pub mod resource;
pub mod usage;

pub use error::{Error, ErrorKind, Result};
