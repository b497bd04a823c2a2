//! vaapi (Linux, GL) hardware-frame mapper: DMA-BUF export + EGLImage import
//! of an NV12/P010/P016 VA surface, bound directly into the plane textures'
//! GL names via `OES_EGL_image`. Grounded line-for-line on
//! `original_source/libnopegl/src/backends/gl/hwmap_vaapi_gl.c` (spec.md
//! §4.K "vaapi"); the `va_drmcommon.h` struct layouts are reproduced as
//! `#[repr(C)]` FFI types since no `libva` crate is part of this stack. GL
//! entry points are loaded through a caller-supplied function the same way
//! `ngpu-gl`'s `GlContext::new` loads its own bindings (`gl::Gl::load_with`),
//! so this mapper never needs access to that backend's internal `Gl` table.

use std::os::raw::{c_int, c_uint, c_void};

use log::warn;
use ngpu_core::context::GpuContext;
use ngpu_core::descriptors::{FilterMode, SamplerDescription, WrapMode};
use ngpu_core::dimensions::{Dimensions, MipmapsCount};
use ngpu_core::error::{Error, Result};
use ngpu_core::format::Format;
use ngpu_core::resource::Texture;
use ngpu_core::usage::ImageUsageFlags;

use crate::image::{wants_mipmaps, ImageLayout, ImageLayoutFlags, MappedImage, MapperParams};

pub type VaDisplay = *mut c_void;
pub type VaSurfaceId = u32;
pub type VaStatus = c_int;
pub type EglDisplay = *mut c_void;
pub type EglContext = *mut c_void;
pub type EglImageKhr = *mut c_void;
pub type EglEnum = i32;
pub type EglInt = i32;

const VA_STATUS_SUCCESS: VaStatus = 0;
const VA_SURFACE_ATTRIB_MEM_TYPE_DRM_PRIME_2: u32 = 0x0008;
const VA_EXPORT_SURFACE_READ_ONLY: u32 = 0x0001;
const VA_EXPORT_SURFACE_SEPARATE_LAYERS: u32 = 0x0004;
const VA_FOURCC_NV12: u32 = 0x3231564e;
const VA_FOURCC_P010: u32 = 0x30313050;
const VA_FOURCC_P016: u32 = 0x36313050;
const DRM_FORMAT_MOD_INVALID: u64 = (1u64 << 56) - 1;

const EGL_NONE: EglInt = 0x3038;
const EGL_LINUX_DMA_BUF_EXT: EglEnum = 0x3270;
const EGL_LINUX_DRM_FOURCC_EXT: EglEnum = 0x3271;
const EGL_WIDTH: EglEnum = 0x3057;
const EGL_HEIGHT: EglEnum = 0x3056;
const EGL_DMA_BUF_PLANE0_FD_EXT: EglEnum = 0x3272;
const EGL_DMA_BUF_PLANE0_OFFSET_EXT: EglEnum = 0x3273;
const EGL_DMA_BUF_PLANE0_PITCH_EXT: EglEnum = 0x3274;
const EGL_DMA_BUF_PLANE1_FD_EXT: EglEnum = 0x3275;
const EGL_DMA_BUF_PLANE1_OFFSET_EXT: EglEnum = 0x3276;
const EGL_DMA_BUF_PLANE1_PITCH_EXT: EglEnum = 0x3277;
const EGL_DMA_BUF_PLANE0_MODIFIER_LO_EXT: EglEnum = 0x3443;
const EGL_DMA_BUF_PLANE0_MODIFIER_HI_EXT: EglEnum = 0x3444;
const EGL_DMA_BUF_PLANE1_MODIFIER_LO_EXT: EglEnum = 0x3445;
const EGL_DMA_BUF_PLANE1_MODIFIER_HI_EXT: EglEnum = 0x3446;

const VA_OBJECTS_MAX: usize = 4;
const VA_LAYERS_MAX: usize = 4;
const VA_PLANES_MAX: usize = 4;

#[repr(C)]
struct VaDrmPrimeObject {
    fd: c_int,
    size: u32,
    drm_format_modifier: u64,
}

#[repr(C)]
struct VaDrmPrimeLayer {
    drm_format: u32,
    num_planes: u32,
    object_index: [u32; VA_PLANES_MAX],
    offset: [u32; VA_PLANES_MAX],
    pitch: [u32; VA_PLANES_MAX],
}

/// Mirrors `VADRMPRIMESurfaceDescriptor` from `va/va_drmcommon.h`.
#[repr(C)]
struct VaDrmPrimeSurfaceDescriptor {
    fourcc: u32,
    width: u32,
    height: u32,
    num_objects: u32,
    objects: [VaDrmPrimeObject; VA_OBJECTS_MAX],
    num_layers: u32,
    layers: [VaDrmPrimeLayer; VA_LAYERS_MAX],
}

impl VaDrmPrimeSurfaceDescriptor {
    fn zeroed() -> VaDrmPrimeSurfaceDescriptor {
        unsafe { std::mem::zeroed() }
    }
}

extern "C" {
    fn vaExportSurfaceHandle(
        dpy: VaDisplay,
        surface_id: VaSurfaceId,
        mem_type: u32,
        flags: u32,
        descriptor: *mut VaDrmPrimeSurfaceDescriptor,
    ) -> VaStatus;
    fn vaSyncSurface(dpy: VaDisplay, surface_id: VaSurfaceId) -> VaStatus;
    fn vaErrorStr(status: VaStatus) -> *const std::os::raw::c_char;
}

fn va_error_str(status: VaStatus) -> String {
    unsafe {
        let ptr = vaErrorStr(status);
        if ptr.is_null() {
            format!("VAStatus({})", status)
        } else {
            std::ffi::CStr::from_ptr(ptr).to_string_lossy().into_owned()
        }
    }
}

const GL_TEXTURE_2D: c_uint = 0x0DE1;
const GL_TEXTURE_MIN_FILTER: c_uint = 0x2801;
const GL_TEXTURE_MAG_FILTER: c_uint = 0x2800;
const GL_TEXTURE_WRAP_S: c_uint = 0x2802;
const GL_TEXTURE_WRAP_T: c_uint = 0x2803;
const GL_NEAREST: c_int = 0x2600;
const GL_LINEAR: c_int = 0x2601;
const GL_REPEAT: c_int = 0x2901;
const GL_CLAMP_TO_EDGE: c_int = 0x812F;
const GL_CLAMP_TO_BORDER: c_int = 0x812D;
const GL_MIRRORED_REPEAT: c_int = 0x8370;

type PfnGenTextures = unsafe extern "system" fn(c_int, *mut u32);
type PfnDeleteTextures = unsafe extern "system" fn(c_int, *const u32);
type PfnBindTexture = unsafe extern "system" fn(c_uint, u32);
type PfnTexParameteri = unsafe extern "system" fn(c_uint, c_uint, c_int);
type PfnEglCreateImageKhr =
    unsafe extern "system" fn(EglDisplay, EglContext, c_uint, *mut c_void, *const EglInt) -> EglImageKhr;
type PfnEglDestroyImageKhr = unsafe extern "system" fn(EglDisplay, EglImageKhr) -> c_uint;
type PfnEglImageTargetTexture2DOes = unsafe extern "system" fn(c_uint, EglImageKhr);

/// Entry points this mapper drives directly, resolved once at init through
/// the same `loader(name) -> *const c_void` convention `GlContext::new`
/// uses, so this crate never links against a GL loader of its own.
struct GlFns {
    gen_textures: PfnGenTextures,
    delete_textures: PfnDeleteTextures,
    bind_texture: PfnBindTexture,
    tex_parameteri: PfnTexParameteri,
    egl_create_image: PfnEglCreateImageKhr,
    egl_destroy_image: PfnEglDestroyImageKhr,
    egl_image_target_texture_2d: PfnEglImageTargetTexture2DOes,
}

impl GlFns {
    fn load(mut loader: impl FnMut(&str) -> *const c_void) -> Result<GlFns> {
        macro_rules! load_fn {
            ($name:expr) => {{
                let ptr = loader($name);
                if ptr.is_null() {
                    return Err(Error::unsupported(format!("missing required entry point: {}", $name)));
                }
                unsafe { std::mem::transmute(ptr) }
            }};
        }
        Ok(GlFns {
            gen_textures: load_fn!("glGenTextures"),
            delete_textures: load_fn!("glDeleteTextures"),
            bind_texture: load_fn!("glBindTexture"),
            tex_parameteri: load_fn!("glTexParameteri"),
            egl_create_image: load_fn!("eglCreateImageKHR"),
            egl_destroy_image: load_fn!("eglDestroyImageKHR"),
            egl_image_target_texture_2d: load_fn!("glEGLImageTargetTexture2DOES"),
        })
    }
}

/// One DMA-BUF-backed GL texture plane; its fd is closed and its EGLImage
/// destroyed on release so a mid-stream resolution change never leaks
/// either (`vaapi_release_frame_resources` in the original).
struct Plane {
    egl_image: EglImageKhr,
    dma_fd: c_int,
}

pub struct VaapiMapper {
    gl: GlFns,
    egl_display: EglDisplay,
    gl_planes: [u32; 2],
    planes: [Option<Plane>; 2],
    use_drm_format_modifiers: bool,
}

unsafe impl Send for VaapiMapper {}

impl VaapiMapper {
    /// `egl_display` must be the same `EGLDisplay` the active GL context was
    /// created against. `has_dma_buf_import_modifiers` reflects whether
    /// `EGL_EXT_image_dma_buf_import_modifiers` was advertised.
    pub fn init(
        ctx: &dyn GpuContext,
        loader: impl FnMut(&str) -> *const c_void,
        egl_display: EglDisplay,
        has_dma_buf_import_modifiers: bool,
        params: &MapperParams,
    ) -> Result<(VaapiMapper, [Texture; 2])> {
        let gl = GlFns::load(loader)?;

        let mut gl_planes = [0u32; 2];
        unsafe {
            (gl.gen_textures)(2, gl_planes.as_mut_ptr());
        }

        let mut textures: Vec<Texture> = Vec::with_capacity(2);
        for (i, &gl_name) in gl_planes.iter().enumerate() {
            let format = if i == 0 { Format::R8_UNORM } else { Format::R8G8_UNORM };
            unsafe {
                (gl.bind_texture)(GL_TEXTURE_2D, gl_name);
                (gl.tex_parameteri)(GL_TEXTURE_2D, GL_TEXTURE_MIN_FILTER, filter_gl(params.sampler.min_filter));
                (gl.tex_parameteri)(GL_TEXTURE_2D, GL_TEXTURE_MAG_FILTER, filter_gl(params.sampler.mag_filter));
                (gl.tex_parameteri)(GL_TEXTURE_2D, GL_TEXTURE_WRAP_S, wrap_gl(params.sampler.wrap_u));
                (gl.tex_parameteri)(GL_TEXTURE_2D, GL_TEXTURE_WRAP_T, wrap_gl(params.sampler.wrap_v));
                (gl.bind_texture)(GL_TEXTURE_2D, 0);
            }
            let desc = ngpu_core::descriptors::TextureDescriptor {
                label: None,
                format,
                dimensions: Dimensions::Dim2d { width: 0, height: 0 },
                samples: 1,
                usage: ImageUsageFlags::SAMPLED,
                mipmaps: MipmapsCount::One,
                sampler: params.sampler.clone(),
            };
            textures.push(ctx.wrap_texture(gl_name as usize, &desc)?);
        }

        let mapper = VaapiMapper {
            gl,
            egl_display,
            gl_planes,
            planes: [None, None],
            use_drm_format_modifiers: has_dma_buf_import_modifiers,
        };
        Ok((mapper, [textures.remove(0), textures.remove(0)]))
    }

    /// Whether the caller can sample the mapped planes directly as NV12
    /// without an intermediate RGBA conversion pass (spec.md §4.K).
    pub fn supports_direct_rendering(params: &MapperParams) -> bool {
        let wants_nv12 = params.image_layouts.contains(ImageLayoutFlags::NV12);
        if wants_nv12 && wants_mipmaps(params) {
            warn!("vaapi direct rendering does not support mipmapping: disabling direct rendering");
            return false;
        }
        wants_nv12
    }

    fn release_frame(&mut self) {
        for plane in self.planes.iter_mut() {
            if let Some(p) = plane.take() {
                unsafe {
                    (self.gl.egl_destroy_image)(self.egl_display, p.egl_image);
                    libc::close(p.dma_fd);
                }
            }
        }
    }

    /// `surface_id` is the `VASurfaceID` recovered from `frame.datap[0]`;
    /// `va_display` the `VADisplay` the decoder surface belongs to.
    pub fn map_frame(
        &mut self,
        ctx: &dyn GpuContext,
        va_display: VaDisplay,
        surface_id: VaSurfaceId,
        width: u32,
        height: u32,
    ) -> Result<(MappedImage, [Texture; 2])> {
        self.release_frame();

        let mut descriptor = VaDrmPrimeSurfaceDescriptor::zeroed();
        let status = unsafe {
            vaExportSurfaceHandle(
                va_display,
                surface_id,
                VA_SURFACE_ATTRIB_MEM_TYPE_DRM_PRIME_2,
                VA_EXPORT_SURFACE_READ_ONLY | VA_EXPORT_SURFACE_SEPARATE_LAYERS,
                &mut descriptor,
            )
        };
        if status != VA_STATUS_SUCCESS {
            return Err(Error::external(format!("failed to export vaapi surface handle: {}", va_error_str(status))));
        }

        let sync_status = unsafe { vaSyncSurface(va_display, surface_id) };
        if sync_status != VA_STATUS_SUCCESS {
            warn!("failed to sync surface: {}", va_error_str(sync_status));
        }

        if descriptor.fourcc != VA_FOURCC_NV12 && descriptor.fourcc != VA_FOURCC_P010 && descriptor.fourcc != VA_FOURCC_P016 {
            return Err(Error::graphics_unsupported(format!("unsupported vaapi surface format: {:#x}", descriptor.fourcc)));
        }

        let num_layers = (descriptor.num_layers as usize).min(2);
        let mut textures: Vec<Texture> = Vec::with_capacity(2);
        for i in 0..num_layers {
            let layer_drm_format = descriptor.layers[i].drm_format;
            let layer_num_planes = descriptor.layers[i].num_planes;

            let plane_width = if i == 0 { width } else { (width + 1) >> 1 };
            let plane_height = if i == 0 { height } else { (height + 1) >> 1 };

            let mut attribs: Vec<EglInt> = Vec::with_capacity(20);
            attribs.push(EGL_LINUX_DRM_FOURCC_EXT);
            attribs.push(layer_drm_format as EglInt);
            attribs.push(EGL_WIDTH);
            attribs.push(plane_width as EglInt);
            attribs.push(EGL_HEIGHT);
            attribs.push(plane_height as EglInt);

            self.push_plane_attribs(
                &descriptor,
                i,
                0,
                EGL_DMA_BUF_PLANE0_FD_EXT,
                EGL_DMA_BUF_PLANE0_OFFSET_EXT,
                EGL_DMA_BUF_PLANE0_PITCH_EXT,
                EGL_DMA_BUF_PLANE0_MODIFIER_LO_EXT,
                EGL_DMA_BUF_PLANE0_MODIFIER_HI_EXT,
                &mut attribs,
            );
            if layer_num_planes > 1 {
                self.push_plane_attribs(
                    &descriptor,
                    i,
                    1,
                    EGL_DMA_BUF_PLANE1_FD_EXT,
                    EGL_DMA_BUF_PLANE1_OFFSET_EXT,
                    EGL_DMA_BUF_PLANE1_PITCH_EXT,
                    EGL_DMA_BUF_PLANE1_MODIFIER_LO_EXT,
                    EGL_DMA_BUF_PLANE1_MODIFIER_HI_EXT,
                    &mut attribs,
                );
            }
            attribs.push(EGL_NONE);

            let egl_image = unsafe {
                (self.gl.egl_create_image)(
                    self.egl_display,
                    std::ptr::null_mut(),
                    EGL_LINUX_DMA_BUF_EXT as c_uint,
                    std::ptr::null_mut(),
                    attribs.as_ptr(),
                )
            };
            if egl_image.is_null() {
                return Err(Error::external("failed to create egl image"));
            }

            let object_index = descriptor.layers[i].object_index[0] as usize;
            self.planes[i] = Some(Plane { egl_image, dma_fd: descriptor.objects[object_index].fd });

            unsafe {
                (self.gl.bind_texture)(GL_TEXTURE_2D, self.gl_planes[i]);
                (self.gl.egl_image_target_texture_2d)(GL_TEXTURE_2D, egl_image);
            }

            let format = if i == 0 { Format::R8_UNORM } else { Format::R8G8_UNORM };
            let desc = ngpu_core::descriptors::TextureDescriptor {
                label: None,
                format,
                dimensions: Dimensions::Dim2d { width: plane_width, height: plane_height },
                samples: 1,
                usage: ImageUsageFlags::SAMPLED,
                mipmaps: MipmapsCount::One,
                sampler: SamplerDescription::default(),
            };
            textures.push(ctx.wrap_texture(self.gl_planes[i] as usize, &desc)?);
        }

        let image = MappedImage {
            layout: ImageLayout::Nv12,
            width,
            height,
            color_scale: 1.0,
            planes: [textures.get(0).cloned(), textures.get(1).cloned()],
        };

        let t0 = textures.remove(0);
        let t1 = if !textures.is_empty() { textures.remove(0) } else { t0.clone() };
        Ok((image, [t0, t1]))
    }

    #[allow(clippy::too_many_arguments)]
    fn push_plane_attribs(
        &self,
        descriptor: &VaDrmPrimeSurfaceDescriptor,
        layer: usize,
        plane: usize,
        fd_attr: EglInt,
        off_attr: EglInt,
        pitch_attr: EglInt,
        lo_attr: EglInt,
        hi_attr: EglInt,
        attribs: &mut Vec<EglInt>,
    ) {
        let object_index = descriptor.layers[layer].object_index[plane] as usize;
        let object = &descriptor.objects[object_index];
        attribs.push(fd_attr);
        attribs.push(object.fd as EglInt);
        attribs.push(off_attr);
        attribs.push(descriptor.layers[layer].offset[plane] as EglInt);
        attribs.push(pitch_attr);
        attribs.push(descriptor.layers[layer].pitch[plane] as EglInt);
        if self.use_drm_format_modifiers && object.drm_format_modifier != DRM_FORMAT_MOD_INVALID {
            attribs.push(lo_attr);
            attribs.push((object.drm_format_modifier & 0xFFFF_FFFF) as EglInt);
            attribs.push(hi_attr);
            attribs.push(((object.drm_format_modifier >> 32) & 0xFFFF_FFFF) as EglInt);
        }
    }
}

impl Drop for VaapiMapper {
    fn drop(&mut self) {
        self.release_frame();
        unsafe {
            (self.gl.delete_textures)(2, self.gl_planes.as_ptr());
        }
    }
}

fn filter_gl(mode: FilterMode) -> c_int {
    match mode {
        FilterMode::Nearest => GL_NEAREST,
        FilterMode::Linear => GL_LINEAR,
    }
}

fn wrap_gl(mode: WrapMode) -> c_int {
    match mode {
        WrapMode::Repeat => GL_REPEAT,
        WrapMode::MirroredRepeat => GL_MIRRORED_REPEAT,
        WrapMode::ClampToEdge => GL_CLAMP_TO_EDGE,
        WrapMode::ClampToBorder => GL_CLAMP_TO_BORDER,
    }
}
