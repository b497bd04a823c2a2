//! Ties every module in this crate together behind `GpuContext`. Grounded on
//! `backend_gl/src/backend.rs`'s `OpenGlBackend::with_gl_window` (proc-
//! address loading, `GL_DEBUG_OUTPUT` callback wiring, `ImplementationParameters`
//! population) and `submit_frame` (execute then frames-in-flight pacing) —
//! generalized to `GpuContext`'s object-safe, window-agnostic shape. Frame
//! pacing itself is two independent rings of fences, one per `begin_update`/
//! `begin_draw` slot, matching the reference's double-buffered command pool
//! rather than its single `Timeline` counter (see `FrameState` below).

use crate::descriptor::{downcast_group, downcast_layout, GlBindGroup, GlBindGroupLayout};
use crate::framebuffer::GlRenderTarget;
use crate::gl::{self, types::*};
use crate::pipeline::{GlComputePipeline, GlGraphicsPipeline};
use crate::program;
use crate::resource::{choose_storage_kind, GlBuffer, GlImageStorage, GlTexture, SamplerCache};
use crate::sync::GlFence;
use crate::workaround::workaround_radeonsi_sync;
use ngpu_core::cmd::CommandBuffer;
use ngpu_core::config::{BackendKind, Config};
use ngpu_core::context::{DeviceLimits, GpuContext};
use ngpu_core::descriptors::{
    BindGroupDescriptor, BindGroupLayoutDescriptor, BufferDescriptor, ComputePipelineDescriptor,
    GraphicsPipelineDescriptor, ProgramDescriptor, RenderTargetDescriptor, TextureDescriptor, TransferRegion,
};
use ngpu_core::dimensions::resolve_mip_count;
use ngpu_core::error::{Error, Result};
use ngpu_core::format::FeatureTable;
use ngpu_core::resource::{BindGroup, BindGroupLayout, Buffer, Fence, FenceObject, Pipeline, Program, RenderTarget, Texture};
use std::ffi::{c_void, CStr};
use std::os::raw::c_char;
use std::sync::{Arc, Mutex};
use std::time::Duration;

extern "system" fn debug_callback(
    _source: GLenum,
    _ty: GLenum,
    _id: GLuint,
    severity: GLenum,
    length: GLsizei,
    msg: *const GLchar,
    _user_data: *mut c_void,
) {
    let text = unsafe { std::slice::from_raw_parts(msg as *const u8, length.max(0) as usize) };
    let text = String::from_utf8_lossy(text);
    match severity {
        gl::DEBUG_SEVERITY_HIGH => error!("(GL) {}", text),
        gl::DEBUG_SEVERITY_MEDIUM => warn!("(GL) {}", text),
        gl::DEBUG_SEVERITY_LOW => info!("(GL) {}", text),
        _ => debug!("(GL) {}", text),
    }
}

#[derive(Copy, Clone)]
enum RingKind {
    Update,
    Draw,
}

/// Two independent rings of `max_frames_in_flight` fence slots, one per
/// `begin_update`/`begin_draw` stream. `update_index`/`draw_index` cycle
/// through their ring on every `begin_*` call; `pending` remembers which
/// slot the command buffer currently being recorded will land in, so
/// `submit` knows where to park the fence it creates.
struct FrameState {
    update_fences: Vec<Option<Fence>>,
    draw_fences: Vec<Option<Fence>>,
    update_index: usize,
    draw_index: usize,
    pending: Option<(RingKind, usize)>,
}

impl FrameState {
    fn new(rings: usize) -> FrameState {
        FrameState {
            update_fences: vec![None; rings],
            draw_fences: vec![None; rings],
            update_index: 0,
            draw_index: 0,
            pending: None,
        }
    }
}

pub struct GlContext {
    gl: gl::Gl,
    limits: DeviceLimits,
    features: FeatureTable,
    state_cache: Mutex<crate::state::StateCache>,
    sampler_cache: SamplerCache,
    frame: Mutex<FrameState>,
    max_frames_in_flight: u32,
    viewport_size: Mutex<(u32, u32)>,
    capture_enabled: Mutex<bool>,
    workaround_radeonsi_sync: bool,
    offscreen: bool,
    external: bool,
}

fn get_int(gl: &gl::Gl, pname: GLenum) -> u32 {
    let mut v = 0;
    unsafe {
        gl.GetIntegerv(pname, &mut v);
    }
    v.max(0) as u32
}

fn get_int_indexed(gl: &gl::Gl, pname: GLenum, index: u32) -> u32 {
    let mut v = 0;
    unsafe {
        gl.GetIntegeri_v(pname, index, &mut v);
    }
    v.max(0) as u32
}

impl GlContext {
    /// Loads GL entry points through `loader` against whatever GL context is
    /// already current on this thread. This crate never creates a window or
    /// GL context itself (spec.md's portability Non-goal). `overrides`, when
    /// given, is read the same way `OpenGlBackend::with_gl_window` reads
    /// `gfx.default_upload_buffer_size`/`gfx.max_frames_in_flight` from its
    /// `config::Config` — named knobs overlaid onto `base_config`'s values.
    pub fn new(
        mut loader: impl FnMut(&str) -> *const c_void,
        base_config: &Config,
        overrides: Option<&config::Config>,
    ) -> Result<GlContext> {
        let mut config = base_config.clone();
        if let Some(source) = overrides {
            config.apply_overrides(source);
        }
        let config = &config;

        let gl = gl::Gl::load_with(|symbol| loader(symbol) as *const _);

        let is_es_driver = unsafe {
            gl.Enable(gl::DEBUG_OUTPUT_SYNCHRONOUS);
            gl.DebugMessageCallback(debug_callback, std::ptr::null());
            gl.DebugMessageControl(gl::DONT_CARE, gl::DONT_CARE, gl::DONT_CARE, 0, std::ptr::null(), gl::TRUE);

            let vendor = CStr::from_ptr(gl.GetString(gl::VENDOR) as *const c_char).to_string_lossy();
            let renderer = CStr::from_ptr(gl.GetString(gl::RENDERER) as *const c_char).to_string_lossy();
            let version = CStr::from_ptr(gl.GetString(gl::VERSION) as *const c_char).to_string_lossy();
            info!("GL context: vendor={} renderer={} version={}", vendor, renderer, version);
            version.contains("OpenGL ES")
        };

        // `config.backend` names what the caller asked for; the driver string
        // is what the already-current context actually is. A caller that
        // requested desktop GL but handed us an ES context would otherwise
        // silently run against the wrong profile's entry points.
        if config.backend == BackendKind::OpenGl && is_es_driver {
            return Err(Error::invalid_usage(
                "backend=OpenGl requested but the current context reports an OpenGL ES driver",
            ));
        }

        let limits = DeviceLimits {
            max_texture_units: get_int(&gl, gl::MAX_COMBINED_TEXTURE_IMAGE_UNITS),
            max_color_attachments: get_int(&gl, gl::MAX_COLOR_ATTACHMENTS),
            max_viewports: get_int(&gl, gl::MAX_VIEWPORTS),
            max_samples: get_int(&gl, gl::MAX_SAMPLES),
            max_vertex_attributes: get_int(&gl, gl::MAX_VERTEX_ATTRIBS),
            uniform_buffer_offset_alignment: get_int(&gl, gl::UNIFORM_BUFFER_OFFSET_ALIGNMENT),
            max_uniform_buffer_size: get_int(&gl, gl::MAX_UNIFORM_BLOCK_SIZE),
            max_storage_buffer_size: get_int(&gl, gl::MAX_SHADER_STORAGE_BLOCK_SIZE),
            max_compute_workgroup_count: [
                get_int_indexed(&gl, gl::MAX_COMPUTE_WORK_GROUP_COUNT, 0),
                get_int_indexed(&gl, gl::MAX_COMPUTE_WORK_GROUP_COUNT, 1),
                get_int_indexed(&gl, gl::MAX_COMPUTE_WORK_GROUP_COUNT, 2),
            ],
            max_compute_workgroup_size: [
                get_int_indexed(&gl, gl::MAX_COMPUTE_WORK_GROUP_SIZE, 0),
                get_int_indexed(&gl, gl::MAX_COMPUTE_WORK_GROUP_SIZE, 1),
                get_int_indexed(&gl, gl::MAX_COMPUTE_WORK_GROUP_SIZE, 2),
            ],
            max_compute_workgroup_invocations: get_int(&gl, gl::MAX_COMPUTE_WORK_GROUP_INVOCATIONS),
        };

        let mut features = FeatureTable::from_baseline();
        crate::format::refine_feature_table(&mut features, true, true, true);

        let max_frames_in_flight = config.max_frames_in_flight.max(1);
        let default_upload_buffer_size = config.default_upload_buffer_size;
        let _ = default_upload_buffer_size;

        let workaround = workaround_radeonsi_sync(&gl);
        if workaround {
            warn!("enabling workaround_radeonsi_sync");
        }

        Ok(GlContext {
            sampler_cache: SamplerCache::new(&gl),
            state_cache: Mutex::new(crate::state::StateCache::new()),
            frame: Mutex::new(FrameState::new(max_frames_in_flight as usize)),
            max_frames_in_flight,
            viewport_size: Mutex::new((1, 1)),
            capture_enabled: Mutex::new(false),
            workaround_radeonsi_sync: workaround,
            offscreen: config.offscreen,
            external: config.external,
            limits,
            features,
            gl,
        })
    }
}

impl GpuContext for GlContext {
    fn limits(&self) -> &DeviceLimits {
        &self.limits
    }

    fn features(&self) -> &FeatureTable {
        &self.features
    }

    fn create_buffer(&self, desc: &BufferDescriptor, initial_data: Option<&[u8]>) -> Result<Buffer> {
        let mut obj = 0;
        unsafe {
            self.gl.CreateBuffers(1, &mut obj);
            let mut flags = gl::DYNAMIC_STORAGE_BIT;
            if desc.usage.contains(ngpu_core::usage::BufferUsageFlags::MAP_PERSISTENT) {
                flags |= gl::MAP_PERSISTENT_BIT | gl::MAP_COHERENT_BIT | gl::MAP_READ_BIT | gl::MAP_WRITE_BIT;
            }
            let data_ptr = initial_data.map(|d| d.as_ptr()).unwrap_or(std::ptr::null());
            self.gl.NamedBufferStorage(obj, desc.size as isize, data_ptr as *const c_void, flags);
        }
        Ok(Buffer(Arc::new(GlBuffer {
            gl: self.gl.clone(),
            obj,
            size: desc.size,
            usage: desc.usage,
        })))
    }

    fn upload_buffer(&self, buffer: &Buffer, offset: u64, data: &[u8]) -> Result<()> {
        let buf = buffer
            .0
            .as_any()
            .downcast_ref::<GlBuffer>()
            .ok_or_else(|| Error::invalid_arg("buffer was not created by this context"))?;
        if offset + data.len() as u64 > buf.size {
            return Err(Error::invalid_arg("upload range exceeds buffer size"));
        }
        unsafe {
            self.gl.NamedBufferSubData(buf.obj, offset as isize, data.len() as isize, data.as_ptr() as *const c_void);
        }
        Ok(())
    }

    fn map_buffer(&self, buffer: &Buffer) -> Result<*mut u8> {
        let buf = buffer
            .0
            .as_any()
            .downcast_ref::<GlBuffer>()
            .ok_or_else(|| Error::invalid_arg("buffer was not created by this context"))?;
        let perms = ngpu_core::usage::map_permissions(buf.usage);
        let mut access = 0;
        if perms.readable {
            access |= gl::MAP_READ_BIT;
        }
        if perms.writable {
            access |= gl::MAP_WRITE_BIT;
        }
        if perms.persistent {
            access |= gl::MAP_PERSISTENT_BIT;
        }
        if perms.coherent {
            access |= gl::MAP_COHERENT_BIT;
        }
        let ptr = unsafe { self.gl.MapNamedBufferRange(buf.obj, 0, buf.size as isize, access) };
        if ptr.is_null() {
            return Err(Error::graphics_generic("glMapNamedBufferRange returned null"));
        }
        Ok(ptr as *mut u8)
    }

    fn unmap_buffer(&self, buffer: &Buffer) -> Result<()> {
        let buf = buffer
            .0
            .as_any()
            .downcast_ref::<GlBuffer>()
            .ok_or_else(|| Error::invalid_arg("buffer was not created by this context"))?;
        let ok = unsafe { self.gl.UnmapNamedBuffer(buf.obj) };
        if ok == gl::FALSE {
            return Err(Error::graphics_generic("buffer storage was invalidated while mapped"));
        }
        Ok(())
    }

    fn create_texture(&self, desc: &TextureDescriptor) -> Result<Texture> {
        let mip_levels = resolve_mip_count(desc.mipmaps, desc.dimensions);
        let storage = choose_storage_kind(desc.usage, desc.dimensions, mip_levels);
        let info = crate::format::gl_format_info(desc.format);
        let mut obj = 0;

        unsafe {
            match storage {
                GlImageStorage::Renderbuffer => {
                    self.gl.CreateRenderbuffers(1, &mut obj);
                    if desc.samples > 1 {
                        self.gl.NamedRenderbufferStorageMultisample(
                            obj,
                            desc.samples as i32,
                            info.internal_fmt,
                            desc.dimensions.width() as i32,
                            desc.dimensions.height() as i32,
                        );
                    } else {
                        self.gl
                            .NamedRenderbufferStorage(obj, info.internal_fmt, desc.dimensions.width() as i32, desc.dimensions.height() as i32);
                    }
                }
                GlImageStorage::Texture(target) => {
                    self.gl.CreateTextures(target, 1, &mut obj);
                    match target {
                        t if t == gl::TEXTURE_1D => {
                            self.gl.TextureStorage1D(obj, mip_levels as i32, info.internal_fmt, desc.dimensions.width() as i32);
                        }
                        t if t == gl::TEXTURE_3D || t == gl::TEXTURE_2D_ARRAY => {
                            self.gl.TextureStorage3D(
                                obj,
                                mip_levels as i32,
                                info.internal_fmt,
                                desc.dimensions.width() as i32,
                                desc.dimensions.height() as i32,
                                desc.dimensions.array_layers_with_cube().max(desc.dimensions.depth()) as i32,
                            );
                        }
                        _ => {
                            self.gl.TextureStorage2D(
                                obj,
                                mip_levels as i32,
                                info.internal_fmt,
                                desc.dimensions.width() as i32,
                                desc.dimensions.height() as i32,
                            );
                        }
                    }
                }
            }
        }

        Ok(Texture(Arc::new(GlTexture {
            gl: self.gl.clone(),
            obj,
            storage,
            format: desc.format,
            dimensions: desc.dimensions,
            samples: desc.samples.max(1),
            usage: desc.usage,
            owns_storage: true,
        })))
    }

    fn upload_texture(&self, texture: &Texture, region: &TransferRegion, data: &[u8]) -> Result<()> {
        let tex = texture
            .0
            .as_any()
            .downcast_ref::<GlTexture>()
            .ok_or_else(|| Error::invalid_arg("texture was not created by this context"))?;
        let target = match tex.storage {
            GlImageStorage::Renderbuffer => return Err(Error::invalid_usage("cannot upload to a renderbuffer-backed texture")),
            GlImageStorage::Texture(t) => t,
        };
        let info = crate::format::gl_format_info(tex.format);
        if region.pixels_per_row != 0 {
            unsafe {
                self.gl.PixelStorei(gl::UNPACK_ROW_LENGTH, region.pixels_per_row as i32);
            }
        }
        unsafe {
            if target == gl::TEXTURE_3D || target == gl::TEXTURE_2D_ARRAY {
                self.gl.TextureSubImage3D(
                    tex.obj,
                    region.mip_level as i32,
                    region.x as i32,
                    region.y as i32,
                    region.base_layer as i32,
                    region.w as i32,
                    region.h as i32,
                    region.layer_count.max(1) as i32,
                    info.upload_components,
                    info.upload_ty,
                    data.as_ptr() as *const c_void,
                );
            } else {
                self.gl.TextureSubImage2D(
                    tex.obj,
                    region.mip_level as i32,
                    region.x as i32,
                    region.y as i32,
                    region.w as i32,
                    region.h as i32,
                    info.upload_components,
                    info.upload_ty,
                    data.as_ptr() as *const c_void,
                );
            }
            if region.pixels_per_row != 0 {
                self.gl.PixelStorei(gl::UNPACK_ROW_LENGTH, 0);
            }
        }
        Ok(())
    }

    fn wrap_texture(&self, native: usize, desc: &TextureDescriptor) -> Result<Texture> {
        let storage = GlImageStorage::Texture(crate::resource::texture_target(desc.dimensions));
        Ok(Texture(Arc::new(GlTexture {
            gl: self.gl.clone(),
            obj: native as GLuint,
            storage,
            format: desc.format,
            dimensions: desc.dimensions,
            samples: desc.samples.max(1),
            usage: desc.usage,
            owns_storage: false,
        })))
    }

    fn create_bind_group_layout(&self, desc: &BindGroupLayoutDescriptor) -> Result<BindGroupLayout> {
        Ok(BindGroupLayout(Arc::new(GlBindGroupLayout::new(desc))))
    }

    fn create_bind_group(&self, layout: &BindGroupLayout, desc: &BindGroupDescriptor) -> Result<BindGroup> {
        let gl_layout = downcast_layout(layout)?;
        let group = GlBindGroup::new(gl_layout, desc, &self.sampler_cache)?;
        Ok(BindGroup(Arc::new(group)))
    }

    fn create_program(&self, desc: &ProgramDescriptor) -> Result<Program> {
        let gl_program = program::create_program(&self.gl, desc)?;
        Ok(Program(Arc::new(gl_program)))
    }

    fn create_render_target(&self, desc: &RenderTargetDescriptor) -> Result<RenderTarget> {
        Ok(RenderTarget(Arc::new(GlRenderTarget::new(&self.gl, desc)?)))
    }

    fn default_render_target(&self, load: bool) -> RenderTarget {
        let (width, height) = *self.viewport_size.lock().unwrap();
        RenderTarget(Arc::new(GlRenderTarget::default_target(&self.gl, width, height, load)))
    }

    fn create_graphics_pipeline(&self, desc: &GraphicsPipelineDescriptor) -> Result<Pipeline> {
        let gl_program = program::downcast(&desc.program)?;
        Ok(Pipeline(Arc::new(GlGraphicsPipeline::new(&self.gl, gl_program.obj, desc)?)))
    }

    fn create_compute_pipeline(&self, desc: &ComputePipelineDescriptor) -> Result<Pipeline> {
        let gl_program = program::downcast(&desc.program)?;
        Ok(Pipeline(Arc::new(GlComputePipeline::new(&self.gl, gl_program.obj, desc))))
    }

    fn begin_update(&self) -> CommandBuffer {
        let mut frame = self.frame.lock().unwrap();
        let slot = frame.update_index;
        frame.update_index = (slot + 1) % self.max_frames_in_flight as usize;
        if let Some(fence) = frame.update_fences[slot].take() {
            if let Ok(false) = fence.0.wait(Duration::from_secs(5)) {
                warn!("update ring slot {} did not signal within 5s, reusing it anyway", slot);
            }
        }
        frame.pending = Some((RingKind::Update, slot));
        drop(frame);

        let mut cb = CommandBuffer::new();
        cb.begin();
        cb
    }

    fn begin_draw(&self) -> CommandBuffer {
        let mut frame = self.frame.lock().unwrap();
        let slot = frame.draw_index;
        frame.draw_index = (slot + 1) % self.max_frames_in_flight as usize;
        if let Some(fence) = frame.draw_fences[slot].take() {
            if let Ok(false) = fence.0.wait(Duration::from_secs(5)) {
                warn!("draw ring slot {} did not signal within 5s, reusing it anyway", slot);
            }
        }
        frame.pending = Some((RingKind::Draw, slot));
        drop(frame);

        let mut cb = CommandBuffer::new();
        cb.begin();
        cb
    }

    fn submit(&self, cmdbuf: &mut CommandBuffer) -> Result<()> {
        {
            let mut state = self.state_cache.lock().unwrap();
            let mut replay = crate::cmd::ReplayCtxt::new(&self.gl, &mut state);
            replay.replay(cmdbuf)?;
        }
        let fence = Fence(Arc::new(GlFence::new(&self.gl)));
        cmdbuf.attach_fence(fence.clone());

        let mut frame = self.frame.lock().unwrap();
        if let Some((kind, slot)) = frame.pending.take() {
            match kind {
                RingKind::Update => frame.update_fences[slot] = Some(fence),
                RingKind::Draw => frame.draw_fences[slot] = Some(fence),
            }
        }
        Ok(())
    }

    fn end_draw(&self) -> Result<()> {
        Ok(())
    }

    fn resize(&self, width: u32, height: u32) -> Result<()> {
        if self.offscreen {
            return Err(Error::unsupported("resize is not supported on an offscreen context"));
        }
        *self.viewport_size.lock().unwrap() = (width, height);
        Ok(())
    }

    fn set_capture_buffer(&self, enabled: bool) -> Result<()> {
        if enabled && !self.offscreen {
            return Err(Error::unsupported("set_capture_buffer is not supported on an onscreen context"));
        }
        *self.capture_enabled.lock().unwrap() = enabled;
        Ok(())
    }

    fn wait_idle(&self) {
        unsafe {
            self.gl.Finish();
        }
    }

    fn transform_projection_matrix(&self, m: &mut [f32; 16]) {
        // GL's clip space has Y pointing up and Vulkan's has Y pointing down;
        // this context's NDC convention matches GL's, so no flip is needed.
        let _ = m;
    }

    fn rendertarget_uvcoord_matrix(&self) -> [f32; 9] {
        // Flips V so that (0,0) addresses the top-left texel the way the
        // rest of the abstraction's image-space convention expects, even
        // though GL itself samples with (0,0) at the bottom-left.
        [1.0, 0.0, 0.0, 0.0, -1.0, 0.0, 0.0, 1.0, 0.0]
    }
}
