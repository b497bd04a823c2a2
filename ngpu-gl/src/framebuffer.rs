//! Render targets: a GL framebuffer object plus per-attachment load/store
//! bookkeeping and MSAA resolve. Extends `backend_gl/src/framebuffer.rs`'s
//! `Framebuffer::new` (which only attaches images and checks completeness)
//! with the load/store-op and resolve logic spec.md §4.F requires.

use crate::gl::{self, types::GLuint};
use crate::resource::{GlImageStorage, GlTexture};
use ngpu_core::descriptors::{LoadOp, RenderTargetDescriptor, StoreOp};
use ngpu_core::error::{Error, Result};
use ngpu_core::resource::{RenderTarget, RenderTargetObject, Texture};
use std::sync::Arc;

#[derive(Clone, Copy, Debug)]
pub struct ColorAttachment {
    pub load_op: LoadOp,
    pub store_op: StoreOp,
    pub clear_value: [f32; 4],
    pub has_resolve: bool,
}

#[derive(Clone, Copy, Debug)]
pub struct DepthStencilAttachment {
    pub load_op: LoadOp,
    pub store_op: StoreOp,
    pub clear_depth: f32,
    pub clear_stencil: u8,
}

#[derive(Debug)]
pub struct GlRenderTarget {
    pub(crate) gl: gl::Gl,
    pub fbo: GLuint,
    /// A second FBO bound to the resolve targets, created lazily only when
    /// at least one color attachment specifies a resolve target.
    pub resolve_fbo: Option<GLuint>,
    pub width: u32,
    pub height: u32,
    pub samples: u32,
    pub color: Vec<ColorAttachment>,
    pub depth_stencil: Option<DepthStencilAttachment>,
    // retained so attachments outlive the framebuffer object referencing them
    _color_textures: Vec<Texture>,
    _resolve_textures: Vec<Option<Texture>>,
    _depth_texture: Option<Texture>,
}

impl Drop for GlRenderTarget {
    fn drop(&mut self) {
        unsafe {
            // fbo 0 is the GL default framebuffer, never owned by us.
            if self.fbo != 0 {
                self.gl.DeleteFramebuffers(1, &self.fbo);
            }
            if let Some(resolve_fbo) = self.resolve_fbo {
                self.gl.DeleteFramebuffers(1, &resolve_fbo);
            }
        }
    }
}

impl RenderTargetObject for GlRenderTarget {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
    fn sample_count(&self) -> u32 {
        self.samples
    }
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

fn attach(gl: &gl::Gl, fbo: GLuint, attachment: gl::types::GLenum, tex: &GlTexture, layer: u32) {
    unsafe {
        match tex.storage {
            GlImageStorage::Renderbuffer => {
                gl.NamedFramebufferRenderbuffer(fbo, attachment, gl::RENDERBUFFER, tex.obj);
            }
            GlImageStorage::Texture(target) if target == gl::TEXTURE_2D => {
                gl.NamedFramebufferTexture(fbo, attachment, tex.obj, 0);
            }
            GlImageStorage::Texture(_) => {
                gl.NamedFramebufferTextureLayer(fbo, attachment, tex.obj, 0, layer as i32);
            }
        }
    }
}

fn downcast(tex: &Texture) -> Result<&GlTexture> {
    tex.0
        .as_any()
        .downcast_ref::<GlTexture>()
        .ok_or_else(|| Error::invalid_arg("texture was not created by this context"))
}

impl GlRenderTarget {
    /// Wraps GL's default framebuffer (object 0). `load` selects between a
    /// clearing and a load-preserving color attachment, per spec.md §4.I
    /// step 3; this crate doesn't control the clear itself here since the
    /// caller issues its own `BeginPass` with whatever `LoadOp` it wants —
    /// `load` only picks the value reported back for introspection.
    pub fn default_target(gl: &gl::Gl, width: u32, height: u32, load: bool) -> GlRenderTarget {
        GlRenderTarget {
            gl: gl.clone(),
            fbo: 0,
            resolve_fbo: None,
            width,
            height,
            samples: 1,
            color: vec![ColorAttachment {
                load_op: if load { LoadOp::Load } else { LoadOp::Clear },
                store_op: StoreOp::Store,
                clear_value: [0.0, 0.0, 0.0, 1.0],
                has_resolve: false,
            }],
            depth_stencil: None,
            _color_textures: Vec::new(),
            _resolve_textures: Vec::new(),
            _depth_texture: None,
        }
    }

    pub fn new(gl: &gl::Gl, desc: &RenderTargetDescriptor) -> Result<GlRenderTarget> {
        let mut fbo = 0;
        unsafe {
            gl.CreateFramebuffers(1, &mut fbo);
        }

        let mut width = 0;
        let mut height = 0;
        let mut samples = 0;
        let mut color = Vec::with_capacity(desc.color_attachments.len());
        let mut color_textures = Vec::with_capacity(desc.color_attachments.len());
        let mut resolve_textures = Vec::with_capacity(desc.color_attachments.len());
        let mut draw_buffers = Vec::with_capacity(desc.color_attachments.len());
        let mut needs_resolve_fbo = false;

        for (index, ca) in desc.color_attachments.iter().enumerate() {
            let gl_tex = downcast(&ca.texture)?;
            width = gl_tex.dimensions.width();
            height = gl_tex.dimensions.height();
            samples = gl_tex.samples;
            let attachment = gl::COLOR_ATTACHMENT0 + index as u32;
            attach(gl, fbo, attachment, gl_tex, ca.layer);
            draw_buffers.push(attachment);
            color.push(ColorAttachment {
                load_op: ca.load_op,
                store_op: ca.store_op,
                clear_value: ca.clear_value,
                has_resolve: ca.resolve_target.is_some(),
            });
            color_textures.push(ca.texture.clone());
            if ca.resolve_target.is_some() {
                needs_resolve_fbo = true;
            }
            resolve_textures.push(ca.resolve_target.clone());
        }

        unsafe {
            gl.NamedFramebufferDrawBuffers(fbo, draw_buffers.len() as i32, draw_buffers.as_ptr());
        }

        let mut depth_texture = None;
        let depth_stencil = if let Some(ds) = &desc.depth_stencil_attachment {
            let gl_tex = downcast(&ds.texture)?;
            let attachment = match gl_tex.format {
                ngpu_core::format::Format::D24_UNORM_S8_UINT | ngpu_core::format::Format::D32_SFLOAT_S8_UINT => {
                    gl::DEPTH_STENCIL_ATTACHMENT
                }
                _ => gl::DEPTH_ATTACHMENT,
            };
            attach(gl, fbo, attachment, gl_tex, ds.layer);
            depth_texture = Some(ds.texture.clone());
            Some(DepthStencilAttachment {
                load_op: ds.load_op,
                store_op: ds.store_op,
                clear_depth: ds.clear_depth,
                clear_stencil: ds.clear_stencil,
            })
        } else {
            None
        };

        let status = unsafe { gl.CheckNamedFramebufferStatus(fbo, gl::DRAW_FRAMEBUFFER) };
        if status != gl::FRAMEBUFFER_COMPLETE {
            unsafe {
                gl.DeleteFramebuffers(1, &fbo);
            }
            return Err(Error::graphics_generic(format!(
                "framebuffer incomplete: status=0x{:x}",
                status
            )));
        }

        let resolve_fbo = if needs_resolve_fbo {
            let mut resolve_fbo = 0;
            unsafe {
                gl.CreateFramebuffers(1, &mut resolve_fbo);
            }
            for (index, resolve) in resolve_textures.iter().enumerate() {
                if let Some(resolve_tex) = resolve {
                    let gl_tex = downcast(resolve_tex)?;
                    attach(gl, resolve_fbo, gl::COLOR_ATTACHMENT0 + index as u32, gl_tex, 0);
                }
            }
            Some(resolve_fbo)
        } else {
            None
        };

        Ok(GlRenderTarget {
            gl: gl.clone(),
            fbo,
            resolve_fbo,
            width,
            height,
            samples: samples.max(1),
            color,
            depth_stencil,
            _color_textures: color_textures,
            _resolve_textures: resolve_textures,
            _depth_texture: depth_texture,
        })
    }

    /// Issues `glClear*` for every attachment whose load op is `Clear` or
    /// `DontCare`, per spec.md §4.F and `rendertarget_gl.c`'s `rendertarget_gl_begin_pass`:
    /// `DONT_CARE` still contributes to the clear mask there, since its
    /// prior content is never meant to be observed either way.
    pub fn clear_on_load(&self) {
        let contributes = |op: LoadOp| op == LoadOp::Clear || op == LoadOp::DontCare;
        unsafe {
            for (index, ca) in self.color.iter().enumerate() {
                if contributes(ca.load_op) {
                    self.gl
                        .ClearNamedFramebufferfv(self.fbo, gl::COLOR, index as i32, ca.clear_value.as_ptr());
                }
            }
            if let Some(ds) = &self.depth_stencil {
                if contributes(ds.load_op) {
                    self.gl.ClearNamedFramebufferfi(
                        self.fbo,
                        gl::DEPTH_STENCIL,
                        0,
                        ds.clear_depth,
                        ds.clear_stencil as i32,
                    );
                }
            }
        }
    }

    /// Resolves every color attachment with a configured resolve target via
    /// `glBlitNamedFramebuffer`, per spec.md §4.F "EndPass resolves MSAA
    /// attachments with a resolve target", then invalidates every attachment
    /// whose store op is `DontCare` via `glInvalidateNamedFramebufferData` so
    /// the driver doesn't have to write back content nothing will read.
    pub fn resolve_on_end(&self) {
        if let Some(resolve_fbo) = self.resolve_fbo {
            for (index, ca) in self.color.iter().enumerate() {
                if !ca.has_resolve {
                    continue;
                }
                unsafe {
                    self.gl.NamedFramebufferReadBuffer(self.fbo, gl::COLOR_ATTACHMENT0 + index as u32);
                    self.gl.NamedFramebufferDrawBuffers(resolve_fbo, 1, &(gl::COLOR_ATTACHMENT0 + index as u32));
                    self.gl.BlitNamedFramebuffer(
                        self.fbo,
                        resolve_fbo,
                        0,
                        0,
                        self.width as i32,
                        self.height as i32,
                        0,
                        0,
                        self.width as i32,
                        self.height as i32,
                        gl::COLOR_BUFFER_BIT,
                        gl::NEAREST,
                    );
                }
            }
        }

        let mut invalidate = Vec::new();
        for (index, ca) in self.color.iter().enumerate() {
            if ca.store_op == StoreOp::DontCare {
                invalidate.push(gl::COLOR_ATTACHMENT0 + index as u32);
            }
        }
        if let Some(ds) = &self.depth_stencil {
            if ds.store_op == StoreOp::DontCare {
                invalidate.push(gl::DEPTH_STENCIL_ATTACHMENT);
            }
        }
        if !invalidate.is_empty() {
            unsafe {
                self.gl.InvalidateNamedFramebufferData(self.fbo, invalidate.len() as i32, invalidate.as_ptr());
            }
        }
    }
}
