//! The GL/GLES backend: implements `ngpu_core::context::GpuContext` against
//! an already-current GL context (this crate never creates a window or a GL
//! context itself, per the portability goal's "no window ownership"
//! non-goal). Module layout follows `backend_gl/src/lib.rs`'s flat
//! `mod api; mod backend; mod cmd; ...` shape.

#[macro_use]
extern crate log;

pub mod cmd;
pub mod descriptor;
pub mod device;
pub mod format;
pub mod framebuffer;
pub mod gl;
pub mod pipeline;
pub mod program;
pub mod resource;
pub mod state;
pub mod sync;
pub mod workaround;

pub use device::GlContext;
