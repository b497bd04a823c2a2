//! Declarative GLSL shader crafting: turns a [`params::CraftParams`]
//! description plus a pair of hand-written stage bodies into compiled
//! backend programs, filling in version headers, extensions, texture
//! declarations, vertex attributes and a compat uniform block so the same
//! user GLSL runs across GL/GLES/Vulkan profiles (spec.md §4.J).

pub mod craft;
pub mod glslinfo;
pub mod params;
pub mod rewrite;
pub mod synth;

pub use craft::{craft, pack_uniform_index, CraftOutput};
pub use glslinfo::{Backend, BindingAllocator, GlslInfo};
pub use params::{
    AttributeDecl, BlockDecl, BlockField, CraftParams, GlslType, IoVarDecl, TextureDecl,
    TextureSemantic, UniformDecl,
};
pub use rewrite::SamplingMode;
