//! Command replay: turns a recorded `ngpu_core::cmd::Command` sequence into
//! GL calls. Grounded directly on `backend_gl/src/cmd.rs`'s `ExecuteCtxt`/
//! `execute_command`, generalized from its `gfx2::CommandInner` match arms to
//! this crate's `Command` enum and retention-list ownership model (no arena
//! borrow, resources are cloned `Arc`s already held by the command buffer).

use crate::descriptor::downcast_group;
use crate::framebuffer::GlRenderTarget;
use crate::gl;
use crate::pipeline::downcast_graphics;
use crate::resource::GlBuffer;
use crate::state::StateCache;
use ngpu_core::cmd::{Command, CommandBuffer};
use ngpu_core::descriptors::{IndexFormat, PrimitiveTopology};
use ngpu_core::error::{Error, Result};
use ngpu_core::resource::RenderTarget;
use ngpu_core::usage::MemoryBarrierFlags;
use std::collections::HashMap;

/// A snapshot of the handful of bound-pipeline fields `Draw`/`DrawIndexed`/
/// `SetVertexBuffer` need, copied out rather than borrowed so replay state
/// doesn't have to carry the command buffer's borrow lifetime.
struct BoundGraphicsPipeline {
    vao: gl::types::GLuint,
    topology: PrimitiveTopology,
    vertex_strides: Vec<u32>,
}

fn index_format_to_glenum_and_size(format: IndexFormat) -> (gl::types::GLenum, u32) {
    match format {
        IndexFormat::Uint16 => (gl::UNSIGNED_SHORT, 2),
        IndexFormat::Uint32 => (gl::UNSIGNED_INT, 4),
    }
}

fn barrier_mask_to_glbitfield(mask: MemoryBarrierFlags) -> gl::types::GLbitfield {
    let mut bits = 0;
    if mask.contains(MemoryBarrierFlags::UNIFORM_BARRIER) {
        bits |= gl::UNIFORM_BARRIER_BIT;
    }
    if mask.contains(MemoryBarrierFlags::STORAGE_BARRIER) {
        bits |= gl::SHADER_STORAGE_BARRIER_BIT;
    }
    if mask.contains(MemoryBarrierFlags::VERTEX_ATTRIB_ARRAY_BARRIER) {
        bits |= gl::VERTEX_ATTRIB_ARRAY_BARRIER_BIT;
    }
    if mask.contains(MemoryBarrierFlags::ELEMENT_ARRAY_BARRIER) {
        bits |= gl::ELEMENT_ARRAY_BARRIER_BIT;
    }
    if mask.contains(MemoryBarrierFlags::CLIENT_MAPPED_BUFFER_BARRIER) {
        bits |= gl::CLIENT_MAPPED_BUFFER_BARRIER_BIT;
    }
    if mask.contains(MemoryBarrierFlags::BUFFER_UPDATE_BARRIER) {
        bits |= gl::BUFFER_UPDATE_BARRIER_BIT;
    }
    if mask.contains(MemoryBarrierFlags::FRAMEBUFFER_BARRIER) {
        bits |= gl::FRAMEBUFFER_BARRIER_BIT;
    }
    if mask.contains(MemoryBarrierFlags::SHADER_IMAGE_ACCESS_BARRIER) {
        bits |= gl::SHADER_IMAGE_ACCESS_BARRIER_BIT;
    }
    if mask.contains(MemoryBarrierFlags::TEXTURE_FETCH_BARRIER) {
        bits |= gl::TEXTURE_FETCH_BARRIER_BIT;
    }
    bits
}

/// Per-replay scratch state, analogous to `ExecuteCtxt`: which pipeline is
/// bound right now, so `Draw`/`DrawIndexed`/`Dispatch` know the topology /
/// vertex strides / workgroup size to use.
pub struct ReplayCtxt<'a> {
    gl: &'a gl::Gl,
    state: &'a mut StateCache,
    current_graphics_pipeline: Option<BoundGraphicsPipeline>,
    index_buffer: Option<(gl::types::GLuint, u64, IndexFormat)>,
    current_render_target: Option<RenderTarget>,
    /// Barrier mask of every bind group currently bound, keyed by binding
    /// index. Unioned at each draw/dispatch to compute the pre/post barrier
    /// (spec.md §5 "issued pre- and post- every draw or dispatch that
    /// consumes a bind-group with any writable binding").
    bound_bind_groups: HashMap<u32, MemoryBarrierFlags>,
}

impl<'a> ReplayCtxt<'a> {
    pub fn new(gl: &'a gl::Gl, state: &'a mut StateCache) -> ReplayCtxt<'a> {
        ReplayCtxt {
            gl,
            state,
            current_graphics_pipeline: None,
            index_buffer: None,
            current_render_target: None,
            bound_bind_groups: HashMap::new(),
        }
    }

    fn pending_barrier_mask(&self) -> MemoryBarrierFlags {
        self.bound_bind_groups.values().fold(MemoryBarrierFlags::empty(), |acc, m| acc | *m)
    }

    /// Replays every command in `cmdbuf` in recording order (spec.md §5: no
    /// reordering or cross-buffer fusion).
    pub fn replay(&mut self, cmdbuf: &CommandBuffer) -> Result<()> {
        for command in cmdbuf.commands() {
            self.execute(command)?;
        }
        Ok(())
    }

    fn execute(&mut self, command: &Command) -> Result<()> {
        match command {
            Command::BeginPass { render_target } => {
                let rt = render_target
                    .0
                    .as_any()
                    .downcast_ref::<GlRenderTarget>()
                    .ok_or_else(|| Error::invalid_arg("render target was not created by this context"))?;
                self.state.set_draw_framebuffer(self.gl, rt.fbo);
                rt.clear_on_load();
                self.current_render_target = Some(render_target.clone());
                self.bound_bind_groups.clear();
            }
            Command::EndPass => {
                if let Some(rt) = self.current_render_target.take() {
                    let rt = rt
                        .0
                        .as_any()
                        .downcast_ref::<GlRenderTarget>()
                        .ok_or_else(|| Error::invalid_arg("render target was not created by this context"))?;
                    rt.resolve_on_end();
                }
            }
            Command::SetViewport(viewport) => self.state.set_viewport(self.gl, *viewport),
            Command::SetScissor(scissor) => self.state.set_scissor(self.gl, *scissor),
            Command::SetPipeline { pipeline } => {
                let gfx = downcast_graphics(pipeline)?;
                gfx.bind(self.gl, self.state);
                self.current_graphics_pipeline = Some(BoundGraphicsPipeline {
                    vao: gfx.vao,
                    topology: gfx.topology,
                    vertex_strides: gfx.vertex_strides.clone(),
                });
            }
            Command::SetBindGroup { index, bind_group, .. } => {
                let bg = downcast_group(bind_group)?;
                bg.bind(self.gl);
                self.bound_bind_groups.insert(*index, bg.barrier_mask);
            }
            Command::SetVertexBuffer { binding, buffer, offset } => {
                let buf = buffer
                    .0
                    .as_any()
                    .downcast_ref::<GlBuffer>()
                    .ok_or_else(|| Error::invalid_arg("buffer was not created by this context"))?;
                let pipeline = self
                    .current_graphics_pipeline
                    .as_ref()
                    .ok_or_else(|| Error::invalid_usage("SetVertexBuffer issued with no pipeline bound"))?;
                let stride = *pipeline.vertex_strides.get(*binding as usize).unwrap_or(&0);
                unsafe {
                    self.gl.VertexArrayVertexBuffer(pipeline.vao, *binding, buf.obj, *offset as isize, stride as i32);
                }
            }
            Command::SetIndexBuffer { buffer, offset, format } => {
                let buf = buffer
                    .0
                    .as_any()
                    .downcast_ref::<GlBuffer>()
                    .ok_or_else(|| Error::invalid_arg("buffer was not created by this context"))?;
                self.index_buffer = Some((buf.obj, *offset, *format));
                let pipeline = self
                    .current_graphics_pipeline
                    .as_ref()
                    .ok_or_else(|| Error::invalid_usage("SetIndexBuffer issued with no pipeline bound"))?;
                unsafe {
                    self.gl.VertexArrayElementBuffer(pipeline.vao, buf.obj);
                }
            }
            Command::Draw { vertex_count, instance_count, first_vertex, first_instance } => {
                let pipeline = self
                    .current_graphics_pipeline
                    .as_ref()
                    .ok_or_else(|| Error::invalid_usage("Draw issued with no pipeline bound"))?;
                let mask = self.pending_barrier_mask();
                issue_barrier(self.gl, mask);
                self.state.draw(self.gl, pipeline.topology, *vertex_count, *instance_count, *first_vertex, *first_instance);
                issue_barrier(self.gl, mask);
            }
            Command::DrawIndexed { index_count, instance_count, first_index, vertex_offset, first_instance } => {
                let pipeline = self
                    .current_graphics_pipeline
                    .as_ref()
                    .ok_or_else(|| Error::invalid_usage("DrawIndexed issued with no pipeline bound"))?;
                let (_, base_offset, format) = self
                    .index_buffer
                    .ok_or_else(|| Error::invalid_usage("DrawIndexed issued with no index buffer bound"))?;
                let (gl_format, size) = index_format_to_glenum_and_size(format);
                let _ = base_offset;
                let mask = self.pending_barrier_mask();
                issue_barrier(self.gl, mask);
                self.state.draw_indexed(
                    self.gl,
                    pipeline.topology,
                    gl_format,
                    *index_count,
                    *instance_count,
                    *first_index,
                    size,
                    *vertex_offset,
                    *first_instance,
                );
                issue_barrier(self.gl, mask);
            }
            Command::Dispatch { x, y, z } => {
                let mask = self.pending_barrier_mask();
                issue_barrier(self.gl, mask);
                self.state.dispatch(self.gl, *x, *y, *z);
                issue_barrier(self.gl, mask);
            }
            Command::GenerateMipmap { texture } => {
                let tex = texture
                    .0
                    .as_any()
                    .downcast_ref::<crate::resource::GlTexture>()
                    .ok_or_else(|| Error::invalid_arg("texture was not created by this context"))?;
                unsafe {
                    self.gl.GenerateTextureMipmap(tex.obj);
                }
            }
        }
        Ok(())
    }
}

/// Issues the union of every bound bind group's barrier mask right before a
/// draw/dispatch that reads back a resource written earlier in the same
/// command buffer, per spec.md §5 "implicit GL memory barriers".
pub fn issue_barrier(gl: &gl::Gl, mask: MemoryBarrierFlags) {
    if mask.is_empty() {
        return;
    }
    unsafe {
        gl.MemoryBarrier(barrier_mask_to_glbitfield(mask));
    }
}
