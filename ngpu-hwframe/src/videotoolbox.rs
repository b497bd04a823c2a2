//! VideoToolbox (iOS, GLES) hardware-frame mapper: wraps a `CVPixelBuffer`'s
//! planes directly as GLES textures through `CVOpenGLESTextureCache`, no
//! copy. Grounded on
//! `original_source/libnopegl/src/backends/gl/hwmap_videotoolbox_ios_gl.c`
//! (spec.md §4.K "videotoolbox").

use std::os::raw::c_void;

use ngpu_core::context::GpuContext;
use ngpu_core::descriptors::{SamplerDescription, TextureDescriptor};
use ngpu_core::dimensions::{Dimensions, MipmapsCount};
use ngpu_core::error::{Error, Result};
use ngpu_core::format::Format;
use ngpu_core::resource::Texture;
use ngpu_core::usage::ImageUsageFlags;

use crate::image::{ImageLayout, ImageLayoutFlags, MappedImage, MapperParams};

pub type CvPixelBufferRef = *mut c_void;
pub type CvOpenGlesTextureCacheRef = *mut c_void;
pub type CvOpenGlesTextureRef = *mut c_void;
pub type CvReturn = i32;
pub type EaglContextRef = *mut c_void;

const KCV_PIXEL_FORMAT_TYPE_32BGRA: u32 = 0x42475241; // 'BGRA'
const KCV_PIXEL_FORMAT_TYPE_420YPCBCR8_BIPLANAR_FULL_RANGE: u32 = 0x34323066; // '420f'
const KCV_PIXEL_FORMAT_TYPE_420YPCBCR8_BIPLANAR_VIDEO_RANGE: u32 = 0x34323076; // '420v'

const GL_TEXTURE_2D: u32 = 0x0DE1;

extern "C" {
    fn CVOpenGLESTextureCacheCreate(
        allocator: *const c_void,
        cache_attributes: *const c_void,
        gl_context: EaglContextRef,
        texture_attributes: *const c_void,
        cache_out: *mut CvOpenGlesTextureCacheRef,
    ) -> CvReturn;
    fn CVOpenGLESTextureCacheCreateTextureFromImage(
        allocator: *const c_void,
        texture_cache: CvOpenGlesTextureCacheRef,
        source_image: CvPixelBufferRef,
        texture_attributes: *const c_void,
        target: u32,
        internal_format: i32,
        width: i32,
        height: i32,
        format: u32,
        ty: u32,
        plane_index: usize,
        texture_out: *mut CvOpenGlesTextureRef,
    ) -> CvReturn;
    fn CVOpenGLESTextureGetName(texture: CvOpenGlesTextureRef) -> u32;
    fn CVOpenGLESTextureCacheFlush(texture_cache: CvOpenGlesTextureCacheRef, options: u32);
    fn CVPixelBufferGetPixelFormatType(pixel_buffer: CvPixelBufferRef) -> u32;
    fn CVPixelBufferGetWidthOfPlane(pixel_buffer: CvPixelBufferRef, plane_index: usize) -> usize;
    fn CVPixelBufferGetHeightOfPlane(pixel_buffer: CvPixelBufferRef, plane_index: usize) -> usize;
    fn CFRelease(cf: *const c_void);
}

const GL_RED: u32 = 0x1903;
const GL_RG: u32 = 0x8227;
const GL_BGRA: u32 = 0x80E1;
const GL_UNSIGNED_BYTE: u32 = 0x1401;

/// One GLES plane format: `(internal_format, format, type, ngpu Format)`.
struct PlaneFormat {
    internal_format: i32,
    format: u32,
    gl_type: u32,
    ngpu_format: Format,
}

/// Maps a `CVPixelBuffer`'s pixel format to the plane formats and image
/// layout the caller's shader should sample with (`vt_get_format_desc` in
/// the original).
fn plane_formats(pixel_format: u32) -> Result<(ImageLayout, Vec<PlaneFormat>)> {
    match pixel_format {
        KCV_PIXEL_FORMAT_TYPE_32BGRA => Ok((
            ImageLayout::Default,
            vec![PlaneFormat {
                internal_format: GL_BGRA as i32,
                format: GL_BGRA,
                gl_type: GL_UNSIGNED_BYTE,
                ngpu_format: Format::B8G8R8A8_UNORM,
            }],
        )),
        KCV_PIXEL_FORMAT_TYPE_420YPCBCR8_BIPLANAR_FULL_RANGE
        | KCV_PIXEL_FORMAT_TYPE_420YPCBCR8_BIPLANAR_VIDEO_RANGE => Ok((
            ImageLayout::Nv12,
            vec![
                PlaneFormat {
                    internal_format: GL_RED as i32,
                    format: GL_RED,
                    gl_type: GL_UNSIGNED_BYTE,
                    ngpu_format: Format::R8_UNORM,
                },
                PlaneFormat {
                    internal_format: GL_RG as i32,
                    format: GL_RG,
                    gl_type: GL_UNSIGNED_BYTE,
                    ngpu_format: Format::R8G8_UNORM,
                },
            ],
        )),
        other => Err(Error::graphics_unsupported(format!("unsupported CVPixelBuffer format {:#x}", other))),
    }
}

struct Plane {
    cv_texture: CvOpenGlesTextureRef,
}

impl Drop for Plane {
    fn drop(&mut self) {
        unsafe { CFRelease(self.cv_texture) }
    }
}

pub struct VideoToolboxMapper {
    texture_cache: CvOpenGlesTextureCacheRef,
    planes: [Option<Plane>; 2],
}

unsafe impl Send for VideoToolboxMapper {}

impl VideoToolboxMapper {
    pub fn init(gl_context: EaglContextRef) -> Result<VideoToolboxMapper> {
        let mut texture_cache: CvOpenGlesTextureCacheRef = std::ptr::null_mut();
        let status = unsafe {
            CVOpenGLESTextureCacheCreate(
                std::ptr::null(),
                std::ptr::null(),
                gl_context,
                std::ptr::null(),
                &mut texture_cache,
            )
        };
        if status != 0 || texture_cache.is_null() {
            return Err(Error::external(format!("CVOpenGLESTextureCacheCreate failed: {}", status)));
        }
        Ok(VideoToolboxMapper { texture_cache, planes: [None, None] })
    }

    /// Neither BGRA nor NV12 CVPixelBuffers carry mip chains, so direct
    /// (zero-copy) rendering never has mipmaps to offer (spec.md §4.K).
    pub fn supports_direct_rendering(params: &MapperParams) -> bool {
        params.image_layouts.contains(ImageLayoutFlags::DEFAULT) || params.image_layouts.contains(ImageLayoutFlags::NV12)
    }

    pub fn map_frame(
        &mut self,
        ctx: &dyn GpuContext,
        pixel_buffer: CvPixelBufferRef,
        sampler: &SamplerDescription,
    ) -> Result<(MappedImage, [Option<Texture>; 2])> {
        self.planes = [None, None];

        let pixel_format = unsafe { CVPixelBufferGetPixelFormatType(pixel_buffer) };
        let (layout, formats) = plane_formats(pixel_format)?;

        let mut textures: [Option<Texture>; 2] = [None, None];
        let mut width = 0u32;
        let mut height = 0u32;

        for (i, fmt) in formats.iter().enumerate() {
            let plane_width = unsafe { CVPixelBufferGetWidthOfPlane(pixel_buffer, i) } as u32;
            let plane_height = unsafe { CVPixelBufferGetHeightOfPlane(pixel_buffer, i) } as u32;
            if i == 0 {
                width = plane_width;
                height = plane_height;
            }

            let mut cv_texture: CvOpenGlesTextureRef = std::ptr::null_mut();
            let status = unsafe {
                CVOpenGLESTextureCacheCreateTextureFromImage(
                    std::ptr::null(),
                    self.texture_cache,
                    pixel_buffer,
                    std::ptr::null(),
                    GL_TEXTURE_2D,
                    fmt.internal_format,
                    plane_width as i32,
                    plane_height as i32,
                    fmt.format,
                    fmt.gl_type,
                    i,
                    &mut cv_texture,
                )
            };
            if status != 0 || cv_texture.is_null() {
                return Err(Error::external(format!(
                    "CVOpenGLESTextureCacheCreateTextureFromImage failed on plane {}: {}",
                    i, status
                )));
            }
            let gl_name = unsafe { CVOpenGLESTextureGetName(cv_texture) };
            self.planes[i] = Some(Plane { cv_texture });

            let desc = TextureDescriptor {
                label: None,
                format: fmt.ngpu_format,
                dimensions: Dimensions::Dim2d { width: plane_width, height: plane_height },
                samples: 1,
                usage: ImageUsageFlags::SAMPLED,
                mipmaps: MipmapsCount::One,
                sampler: sampler.clone(),
            };
            textures[i] = Some(ctx.wrap_texture(gl_name as usize, &desc)?);
        }

        unsafe { CVOpenGLESTextureCacheFlush(self.texture_cache, 0) };

        let image = MappedImage { layout, width, height, color_scale: 1.0, planes: [textures[0].clone(), textures[1].clone()] };
        Ok((image, textures))
    }
}

impl Drop for VideoToolboxMapper {
    fn drop(&mut self) {
        self.planes = [None, None];
        unsafe { CFRelease(self.texture_cache) };
    }
}
