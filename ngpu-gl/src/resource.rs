//! Concrete GL resource objects implementing the `ngpu_core::resource`
//! traits. Grounded on `backend_gl/src/resource.rs`'s `GlBuffer`/`GlImage`/
//! `SamplerCache`, with the arena+alias-key ownership dropped in favor of
//! each object owning (and, on `Drop`, deleting) its own GL name directly —
//! the `Arc` wrapper in `ngpu_core::resource` is what used to be the arena.

use crate::gl::{self, types::GLuint};
use fxhash::FxHashMap;
use ngpu_core::descriptors::{FilterMode, MipmapFilter, SamplerDescription, WrapMode};
use ngpu_core::dimensions::Dimensions;
use ngpu_core::format::Format;
use ngpu_core::resource::{BufferObject, TextureObject};
use ngpu_core::usage::{BufferUsageFlags, ImageUsageFlags};
use std::sync::Mutex;

#[derive(Debug)]
pub struct GlBuffer {
    pub(crate) gl: gl::Gl,
    pub obj: GLuint,
    pub size: u64,
    pub usage: BufferUsageFlags,
}

impl Drop for GlBuffer {
    fn drop(&mut self) {
        unsafe {
            self.gl.DeleteBuffers(1, &self.obj);
        }
    }
}

impl BufferObject for GlBuffer {
    fn size(&self) -> u64 {
        self.size
    }
    fn usage(&self) -> BufferUsageFlags {
        self.usage
    }
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

/// Whether a texture's storage is backed by a renderbuffer (can only be a
/// render target attachment, never sampled) or a real GL texture object.
/// Mirrors `GlImage::target` being `RENDERBUFFER` or a texture target in the
/// teacher (spec.md §4.C "renderbuffer vs. texture realization").
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum GlImageStorage {
    Renderbuffer,
    Texture(gl::types::GLenum),
}

#[derive(Debug)]
pub struct GlTexture {
    pub(crate) gl: gl::Gl,
    pub obj: GLuint,
    pub storage: GlImageStorage,
    pub format: Format,
    pub dimensions: Dimensions,
    pub samples: u32,
    pub usage: ImageUsageFlags,
    pub owns_storage: bool,
}

impl Drop for GlTexture {
    fn drop(&mut self) {
        if !self.owns_storage {
            return;
        }
        unsafe {
            match self.storage {
                GlImageStorage::Renderbuffer => self.gl.DeleteRenderbuffers(1, &self.obj),
                GlImageStorage::Texture(_) => self.gl.DeleteTextures(1, &self.obj),
            }
        }
    }
}

impl TextureObject for GlTexture {
    fn format(&self) -> Format {
        self.format
    }
    fn dimensions(&self) -> Dimensions {
        self.dimensions
    }
    fn usage(&self) -> ImageUsageFlags {
        self.usage
    }
    fn samples(&self) -> u32 {
        self.samples
    }
    fn owns_storage(&self) -> bool {
        self.owns_storage
    }
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

/// Decides renderbuffer vs. texture storage the way `create_texture`
/// (spec.md §4.C step 1) must: renderbuffers are cheaper but can't be
/// sampled or mapped, so anything with `SAMPLED` or `STORAGE` usage, or more
/// than one mip level, gets real texture storage.
pub fn choose_storage_kind(usage: ImageUsageFlags, dims: Dimensions, mip_levels: u32) -> GlImageStorage {
    let must_be_texture = usage.intersects(ImageUsageFlags::SAMPLED | ImageUsageFlags::STORAGE) || mip_levels > 1;
    if must_be_texture {
        GlImageStorage::Texture(texture_target(dims))
    } else {
        GlImageStorage::Renderbuffer
    }
}

pub fn texture_target(dims: Dimensions) -> gl::types::GLenum {
    match dims {
        Dimensions::Dim1d { .. } => gl::TEXTURE_1D,
        Dimensions::Dim1dArray { .. } => gl::TEXTURE_1D_ARRAY,
        Dimensions::Dim2d { .. } => gl::TEXTURE_2D,
        Dimensions::Dim2dArray { .. } => gl::TEXTURE_2D_ARRAY,
        Dimensions::Dim3d { .. } => gl::TEXTURE_3D,
        Dimensions::Cubemap { .. } => gl::TEXTURE_CUBE_MAP,
        Dimensions::CubemapArray { .. } => gl::TEXTURE_CUBE_MAP_ARRAY,
    }
}

fn min_filter_to_glenum(min: FilterMode, mipmap: MipmapFilter) -> gl::types::GLenum {
    match (min, mipmap) {
        (FilterMode::Nearest, MipmapFilter::None) => gl::NEAREST,
        (FilterMode::Linear, MipmapFilter::None) => gl::LINEAR,
        (FilterMode::Nearest, MipmapFilter::Nearest) => gl::NEAREST_MIPMAP_NEAREST,
        (FilterMode::Nearest, MipmapFilter::Linear) => gl::NEAREST_MIPMAP_LINEAR,
        (FilterMode::Linear, MipmapFilter::Nearest) => gl::LINEAR_MIPMAP_NEAREST,
        (FilterMode::Linear, MipmapFilter::Linear) => gl::LINEAR_MIPMAP_LINEAR,
    }
}

fn mag_filter_to_glenum(mag: FilterMode) -> gl::types::GLenum {
    match mag {
        FilterMode::Nearest => gl::NEAREST,
        FilterMode::Linear => gl::LINEAR,
    }
}

fn wrap_to_glenum(wrap: WrapMode) -> gl::types::GLenum {
    match wrap {
        WrapMode::Repeat => gl::REPEAT,
        WrapMode::MirroredRepeat => gl::MIRRORED_REPEAT,
        WrapMode::ClampToEdge => gl::CLAMP_TO_EDGE,
        WrapMode::ClampToBorder => gl::CLAMP_TO_BORDER,
    }
}

fn sampler_key(desc: &SamplerDescription) -> (u8, u8, u8, u8, u8, u8) {
    (
        desc.min_filter as u8,
        desc.mag_filter as u8,
        desc.mipmap_filter as u8,
        desc.wrap_u as u8,
        desc.wrap_v as u8,
        desc.wrap_w as u8,
    )
}

/// Sampler objects are immutable and cheap to share: one GL sampler name per
/// distinct `SamplerDescription`, never freed, grounded on
/// `backend_gl/src/resource.rs`'s `SamplerCache`.
pub struct SamplerCache {
    gl: gl::Gl,
    samplers: Mutex<FxHashMap<(u8, u8, u8, u8, u8, u8), GLuint>>,
}

impl SamplerCache {
    pub fn new(gl: &gl::Gl) -> SamplerCache {
        SamplerCache {
            gl: gl.clone(),
            samplers: Mutex::new(FxHashMap::default()),
        }
    }

    pub fn get(&self, desc: &SamplerDescription) -> GLuint {
        let key = sampler_key(desc);
        let mut samplers = self.samplers.lock().unwrap();
        *samplers.entry(key).or_insert_with(|| unsafe {
            let mut obj = 0;
            self.gl.GenSamplers(1, &mut obj);
            self.gl.SamplerParameteri(
                obj,
                gl::TEXTURE_MIN_FILTER,
                min_filter_to_glenum(desc.min_filter, desc.mipmap_filter) as i32,
            );
            self.gl
                .SamplerParameteri(obj, gl::TEXTURE_MAG_FILTER, mag_filter_to_glenum(desc.mag_filter) as i32);
            self.gl
                .SamplerParameteri(obj, gl::TEXTURE_WRAP_S, wrap_to_glenum(desc.wrap_u) as i32);
            self.gl
                .SamplerParameteri(obj, gl::TEXTURE_WRAP_T, wrap_to_glenum(desc.wrap_v) as i32);
            self.gl
                .SamplerParameteri(obj, gl::TEXTURE_WRAP_R, wrap_to_glenum(desc.wrap_w) as i32);
            obj
        })
    }
}
