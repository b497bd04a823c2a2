//! The `GpuContext` trait every backend implements (spec.md §4.I). Grounded
//! on `renderer/src/traits.rs`'s `RendererBackend` (same "one trait, every
//! resource-creation entry point" shape) but object-safe: no associated
//! types, no arena/lifetime parameter. Concrete resource types are `Arc`-
//! wrapped trait objects from `resource.rs`; a `GpuContext` is used as
//! `&dyn GpuContext` or behind an `Arc<dyn GpuContext>` by callers.

use crate::cmd::CommandBuffer;
use crate::config::Config;
use crate::descriptors::{
    BindGroupDescriptor, BindGroupLayoutDescriptor, BufferDescriptor, ComputePipelineDescriptor,
    GraphicsPipelineDescriptor, ProgramDescriptor, RenderTargetDescriptor, TextureDescriptor,
    TransferRegion,
};
use crate::error::Result;
use crate::format::FeatureTable;
use crate::resource::{BindGroup, BindGroupLayout, Buffer, Pipeline, Program, RenderTarget, Texture};

#[derive(Copy, Clone, Debug)]
pub struct DeviceLimits {
    pub max_texture_units: u32,
    pub max_color_attachments: u32,
    pub max_viewports: u32,
    pub max_samples: u32,
    pub max_vertex_attributes: u32,
    pub uniform_buffer_offset_alignment: u32,
    pub max_uniform_buffer_size: u32,
    pub max_storage_buffer_size: u32,
    pub max_compute_workgroup_count: [u32; 3],
    pub max_compute_workgroup_size: [u32; 3],
    pub max_compute_workgroup_invocations: u32,
}

/// Lifecycle per spec.md §4.I: create -> init -> rendertargets -> capture ->
/// per-frame `begin_update..end_update, begin_draw..end_draw`.
pub trait GpuContext: Send + Sync {
    fn limits(&self) -> &DeviceLimits;
    fn features(&self) -> &FeatureTable;

    fn create_buffer(&self, desc: &BufferDescriptor, initial_data: Option<&[u8]>) -> Result<Buffer>;
    fn upload_buffer(&self, buffer: &Buffer, offset: u64, data: &[u8]) -> Result<()>;
    fn map_buffer(&self, buffer: &Buffer) -> Result<*mut u8>;
    fn unmap_buffer(&self, buffer: &Buffer) -> Result<()>;

    fn create_texture(&self, desc: &TextureDescriptor) -> Result<Texture>;
    fn upload_texture(&self, texture: &Texture, region: &TransferRegion, data: &[u8]) -> Result<()>;
    /// Wraps an externally-owned native texture handle (vaapi/DMA-BUF
    /// EGLImage binding, CVOpenGLESTexture, ...). The result never frees its
    /// native storage (spec.md §9).
    fn wrap_texture(&self, native: usize, desc: &TextureDescriptor) -> Result<Texture>;

    fn create_bind_group_layout(&self, desc: &BindGroupLayoutDescriptor) -> Result<BindGroupLayout>;
    fn create_bind_group(&self, layout: &BindGroupLayout, desc: &BindGroupDescriptor) -> Result<BindGroup>;

    fn create_program(&self, desc: &ProgramDescriptor) -> Result<Program>;

    fn create_render_target(&self, desc: &RenderTargetDescriptor) -> Result<RenderTarget>;
    /// `load` selects between the clearing and load-preserving variants of
    /// the context's default render target (spec.md §4.I step 3).
    fn default_render_target(&self, load: bool) -> RenderTarget;

    fn create_graphics_pipeline(&self, desc: &GraphicsPipelineDescriptor) -> Result<Pipeline>;
    fn create_compute_pipeline(&self, desc: &ComputePipelineDescriptor) -> Result<Pipeline>;

    fn begin_update(&self) -> CommandBuffer;
    fn begin_draw(&self) -> CommandBuffer;
    /// Replays every recorded command against the device and attaches a
    /// fence to `cmdbuf` (spec.md §4.H `submit`).
    fn submit(&self, cmdbuf: &mut CommandBuffer) -> Result<()>;
    fn end_draw(&self) -> Result<()>;

    fn resize(&self, width: u32, height: u32) -> Result<()>;
    fn set_capture_buffer(&self, enabled: bool) -> Result<()>;
    fn wait_idle(&self);

    /// Identity or a Y-flip depending on backend clip-space convention, so
    /// higher layers need only multiply (spec.md §4.I).
    fn transform_projection_matrix(&self, m: &mut [f32; 16]);
    fn rendertarget_uvcoord_matrix(&self) -> [f32; 9];
}
