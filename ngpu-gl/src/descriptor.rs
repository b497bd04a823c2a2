//! Bind groups: resolved GL object names bound straight to the explicit
//! binding points `pgcraft` assigns each program (spec.md §4.D, §9
//! "binding-namespace divergence" — GL keeps one counter per `BindingSpace`,
//! so a uniform-buffer binding 0 and a texture binding 0 never collide).
//! Grounded on `backend_gl/src/descriptor.rs`'s `ShaderResourceBindings`/
//! `RawDescriptor`/`DescriptorSet::collect`, flattened since this crate binds
//! directly to explicit locations instead of indirecting through a
//! descriptor-set-index + `DescriptorMap` lookup.

use crate::gl::{self, types::GLuint};
use crate::resource::{GlBuffer, GlTexture, SamplerCache};
use ngpu_core::descriptors::{
    Access, BindGroupDescriptor, BindGroupEntry, BindGroupLayoutDescriptor, BindGroupLayoutEntry, DescriptorType,
};
use ngpu_core::error::{Error, Result};
use ngpu_core::resource::{BindGroup, BindGroupLayoutObject, BindGroupObject};
use ngpu_core::usage::MemoryBarrierFlags;
use std::sync::Arc;

#[derive(Debug)]
pub struct GlBindGroupLayout {
    pub entries: Vec<BindGroupLayoutEntry>,
}

impl BindGroupLayoutObject for GlBindGroupLayout {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

impl GlBindGroupLayout {
    pub fn new(desc: &BindGroupLayoutDescriptor) -> GlBindGroupLayout {
        GlBindGroupLayout {
            entries: desc.entries.clone(),
        }
    }
}

#[derive(Debug)]
pub enum GlBoundResource {
    Texture { binding: u32, image: GLuint, sampler: GLuint, target: gl::types::GLenum },
    Image { binding: u32, image: GLuint },
    UniformBuffer { binding: u32, buffer: GLuint, offset: i64, size: i64 },
    StorageBuffer { binding: u32, buffer: GLuint, offset: i64, size: i64 },
}

#[derive(Debug)]
pub struct GlBindGroup {
    pub resources: Vec<GlBoundResource>,
    pub barrier_mask: MemoryBarrierFlags,
}

impl BindGroupObject for GlBindGroup {
    fn barrier_mask(&self) -> MemoryBarrierFlags {
        self.barrier_mask
    }
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

fn downcast_texture(tex: &ngpu_core::resource::Texture) -> Result<&GlTexture> {
    tex.0
        .as_any()
        .downcast_ref::<GlTexture>()
        .ok_or_else(|| Error::invalid_arg("texture was not created by this context"))
}

fn downcast_buffer(buf: &ngpu_core::resource::Buffer) -> Result<&GlBuffer> {
    buf.0
        .as_any()
        .downcast_ref::<GlBuffer>()
        .ok_or_else(|| Error::invalid_arg("buffer was not created by this context"))
}

fn write_access_mask(entry: &BindGroupLayoutEntry) -> MemoryBarrierFlags {
    if entry.access == Access::Read {
        return MemoryBarrierFlags::empty();
    }
    match entry.ty.binding_space() {
        ngpu_core::descriptors::BindingSpace::UniformBuffer => MemoryBarrierFlags::UNIFORM_BARRIER,
        ngpu_core::descriptors::BindingSpace::StorageBuffer => MemoryBarrierFlags::STORAGE_BARRIER,
        ngpu_core::descriptors::BindingSpace::Image => MemoryBarrierFlags::SHADER_IMAGE_ACCESS_BARRIER,
        ngpu_core::descriptors::BindingSpace::Texture => MemoryBarrierFlags::TEXTURE_FETCH_BARRIER,
    }
}

impl GlBindGroup {
    pub fn new(layout: &GlBindGroupLayout, desc: &BindGroupDescriptor, samplers: &SamplerCache) -> Result<GlBindGroup> {
        if layout.entries.len() != desc.entries.len() {
            return Err(Error::invalid_arg("bind group entry count does not match layout"));
        }
        let mut resources = Vec::with_capacity(desc.entries.len());
        let mut barrier_mask = MemoryBarrierFlags::empty();

        for (entry_desc, entry) in layout.entries.iter().zip(desc.entries.iter()) {
            barrier_mask |= write_access_mask(entry_desc);
            let binding = entry_desc.binding;
            match (entry_desc.ty, entry) {
                (DescriptorType::StorageImage, BindGroupEntry::Image { texture }) => {
                    let tex = downcast_texture(texture)?;
                    resources.push(GlBoundResource::Image { binding, image: tex.obj });
                }
                (ty, BindGroupEntry::Texture { texture, sampler }) if ty != DescriptorType::StorageImage => {
                    let tex = downcast_texture(texture)?;
                    let sampler_obj = samplers.get(sampler);
                    let target = crate::resource::texture_target(tex.dimensions);
                    resources.push(GlBoundResource::Texture {
                        binding,
                        image: tex.obj,
                        sampler: sampler_obj,
                        target,
                    });
                }
                (DescriptorType::UniformBuffer { .. }, BindGroupEntry::Buffer { buffer, offset, size }) => {
                    let buf = downcast_buffer(buffer)?;
                    resources.push(GlBoundResource::UniformBuffer {
                        binding,
                        buffer: buf.obj,
                        offset: *offset as i64,
                        size: *size as i64,
                    });
                }
                (DescriptorType::StorageBuffer { .. }, BindGroupEntry::Buffer { buffer, offset, size }) => {
                    let buf = downcast_buffer(buffer)?;
                    resources.push(GlBoundResource::StorageBuffer {
                        binding,
                        buffer: buf.obj,
                        offset: *offset as i64,
                        size: *size as i64,
                    });
                }
                _ => return Err(Error::invalid_arg("bind group entry kind does not match layout descriptor type")),
            }
        }

        Ok(GlBindGroup { resources, barrier_mask })
    }

    /// Binds every resource to its explicit GL binding point. Called from
    /// command replay on `SetBindGroup` (spec.md §4.H).
    pub fn bind(&self, gl: &gl::Gl) {
        for res in &self.resources {
            unsafe {
                match *res {
                    GlBoundResource::Texture { binding, image, sampler, .. } => {
                        gl.BindTextureUnit(binding, image);
                        gl.BindSampler(binding, sampler);
                    }
                    GlBoundResource::Image { binding, image } => {
                        gl.BindImageTexture(binding, image, 0, gl::FALSE, 0, gl::READ_WRITE, gl::RGBA8);
                    }
                    GlBoundResource::UniformBuffer { binding, buffer, offset, size } => {
                        gl.BindBufferRange(gl::UNIFORM_BUFFER, binding, buffer, offset as isize, size as isize);
                    }
                    GlBoundResource::StorageBuffer { binding, buffer, offset, size } => {
                        gl.BindBufferRange(gl::SHADER_STORAGE_BUFFER, binding, buffer, offset as isize, size as isize);
                    }
                }
            }
        }
    }
}

pub fn downcast_layout(bg: &ngpu_core::resource::BindGroupLayout) -> Result<&GlBindGroupLayout> {
    bg.0.as_any()
        .downcast_ref::<GlBindGroupLayout>()
        .ok_or_else(|| Error::invalid_arg("bind group layout was not created by this context"))
}

pub fn downcast_group(bg: &BindGroup) -> Result<&GlBindGroup> {
    bg.0.as_any()
        .downcast_ref::<GlBindGroup>()
        .ok_or_else(|| Error::invalid_arg("bind group was not created by this context"))
}
