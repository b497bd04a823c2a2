//! Arc-based resource handles and the backend vtables they wrap.
//!
//! The teacher (`renderer/src/traits.rs`) models ownership with an
//! `Arena`-associated type and `&'a` borrows returned from creation calls,
//! which predates GATs and needs a nightly `const_transmute` feature to
//! erase the lifetime internally. This crate instead follows spec.md §3/§9's
//! own recommendation: resources are `Arc<dyn Trait>`, cloned into a command
//! buffer's retention list on recording and dropped when the fence signals.
//! The trait boundary (one trait per resource kind, `: Debug`) is kept from
//! `renderer/src/traits.rs`'s `Buffer`/`Image`/`Framebuffer`/`DescriptorSet`
//! marker-trait shape.

use crate::descriptors::{AttributeInfo, BlockInfo, UniformInfo};
use crate::dimensions::Dimensions;
use crate::format::Format;
use crate::usage::{BufferUsageFlags, ImageUsageFlags};
use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

/// Every resource trait requires `as_any` so a backend can downcast a handle
/// it receives back (e.g. as a bind-group entry or render target attachment)
/// to its own concrete type without the trait itself needing associated
/// types (which would make it non-object-safe).
pub trait BufferObject: Debug + Send + Sync {
    fn size(&self) -> u64;
    fn usage(&self) -> BufferUsageFlags;
    fn as_any(&self) -> &dyn Any;
}

#[derive(Clone, Debug)]
pub struct Buffer(pub Arc<dyn BufferObject>);

pub trait TextureObject: Debug + Send + Sync {
    fn format(&self) -> Format;
    fn dimensions(&self) -> Dimensions;
    fn usage(&self) -> ImageUsageFlags;
    fn samples(&self) -> u32;
    /// `false` for textures wrapped around an externally-owned handle
    /// (hardware frames, the default framebuffer's implicit color image);
    /// such textures must never have their native storage freed by this
    /// crate (spec.md §9 "Backing stores for wrapped resources").
    fn owns_storage(&self) -> bool;
    fn as_any(&self) -> &dyn Any;
}

#[derive(Clone, Debug)]
pub struct Texture(pub Arc<dyn TextureObject>);

pub trait ProgramObject: Debug + Send + Sync {
    fn attributes(&self) -> &[AttributeInfo];
    fn uniforms(&self) -> &[UniformInfo];
    fn buffer_blocks(&self) -> &[BlockInfo];
    fn as_any(&self) -> &dyn Any;
}

#[derive(Clone, Debug)]
pub struct Program(pub Arc<dyn ProgramObject>);

pub trait BindGroupLayoutObject: Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

#[derive(Clone, Debug)]
pub struct BindGroupLayout(pub Arc<dyn BindGroupLayoutObject>);

pub trait BindGroupObject: Debug + Send + Sync {
    /// Union of every write-accessed binding's intrinsic barrier mask,
    /// computed once at bind-group creation/update time (spec.md §4.D).
    fn barrier_mask(&self) -> crate::usage::MemoryBarrierFlags;
    fn as_any(&self) -> &dyn Any;
}

#[derive(Clone, Debug)]
pub struct BindGroup(pub Arc<dyn BindGroupObject>);

pub trait RenderTargetObject: Debug + Send + Sync {
    fn dimensions(&self) -> (u32, u32);
    fn sample_count(&self) -> u32;
    fn as_any(&self) -> &dyn Any;
}

#[derive(Clone, Debug)]
pub struct RenderTarget(pub Arc<dyn RenderTargetObject>);

pub trait PipelineObject: Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

#[derive(Clone, Debug)]
pub struct Pipeline(pub Arc<dyn PipelineObject>);

pub trait FenceObject: Debug + Send + Sync {
    /// Client-waits on this fence. `Ok(true)` means signaled, `Ok(false)`
    /// means the timeout elapsed; a device-level failure is `Err`.
    fn wait(&self, timeout: Duration) -> crate::error::Result<bool>;
    fn is_signaled(&self) -> bool;
}

#[derive(Clone, Debug)]
pub struct Fence(pub Arc<dyn FenceObject>);

/// Any resource that can sit in a command buffer's retention list. Blanket
/// implementations below let every concrete handle type above be retained
/// without a manual conversion at each call site.
pub trait Retained: Debug + Send + Sync {}
impl<T: Debug + Send + Sync + ?Sized> Retained for T {}

#[derive(Clone, Debug)]
pub enum RetainedHandle {
    Buffer(Buffer),
    Texture(Texture),
    Program(Program),
    BindGroup(BindGroup),
    RenderTarget(RenderTarget),
    Pipeline(Pipeline),
}

impl From<Buffer> for RetainedHandle {
    fn from(b: Buffer) -> RetainedHandle {
        RetainedHandle::Buffer(b)
    }
}
impl From<Texture> for RetainedHandle {
    fn from(t: Texture) -> RetainedHandle {
        RetainedHandle::Texture(t)
    }
}
impl From<Program> for RetainedHandle {
    fn from(p: Program) -> RetainedHandle {
        RetainedHandle::Program(p)
    }
}
impl From<BindGroup> for RetainedHandle {
    fn from(b: BindGroup) -> RetainedHandle {
        RetainedHandle::BindGroup(b)
    }
}
impl From<RenderTarget> for RetainedHandle {
    fn from(r: RenderTarget) -> RetainedHandle {
        RetainedHandle::RenderTarget(r)
    }
}
impl From<Pipeline> for RetainedHandle {
    fn from(p: Pipeline) -> RetainedHandle {
        RetainedHandle::Pipeline(p)
    }
}
