//! A state-diff cache: every `glXxx` state-setting call funnels through here
//! so repeated identical state changes across draws are skipped. Referenced
//! (but not present in the retrieval pack) as `StateCache` from
//! `backend_gl/src/cmd.rs`'s `ExecuteCtxt`; designed fresh from that call
//! site's shape (`set_viewports`, `set_draw_framebuffer`, `draw`,
//! `draw_indexed`, ...).

use crate::gl::{self, types::GLuint};
use ngpu_core::descriptors::{PrimitiveTopology, ScissorRect, Viewport};

fn topology_to_glenum(topology: PrimitiveTopology) -> gl::types::GLenum {
    match topology {
        PrimitiveTopology::PointList => gl::POINTS,
        PrimitiveTopology::LineList => gl::LINES,
        PrimitiveTopology::LineStrip => gl::LINE_STRIP,
        PrimitiveTopology::TriangleList => gl::TRIANGLES,
        PrimitiveTopology::TriangleStrip => gl::TRIANGLE_STRIP,
    }
}

/// Mirrors the handful of global-state slots a graphics pipeline can touch,
/// so `bind_pipeline` only emits the GL calls for what actually changed
/// since the last pipeline bind (spec.md §4.I "pipeline switches are cheap").
#[derive(Default)]
pub struct StateCache {
    program: GLuint,
    vao: GLuint,
    draw_fbo: GLuint,
    viewport: Option<Viewport>,
    scissor: Option<ScissorRect>,
    scissor_enabled: bool,
}

impl StateCache {
    pub fn new() -> StateCache {
        StateCache::default()
    }

    pub fn set_program(&mut self, gl: &gl::Gl, program: GLuint) {
        if self.program != program {
            unsafe {
                gl.UseProgram(program);
            }
            self.program = program;
        }
    }

    pub fn set_vao(&mut self, gl: &gl::Gl, vao: GLuint) {
        if self.vao != vao {
            unsafe {
                gl.BindVertexArray(vao);
            }
            self.vao = vao;
        }
    }

    pub fn set_draw_framebuffer(&mut self, gl: &gl::Gl, fbo: GLuint) {
        if self.draw_fbo != fbo {
            unsafe {
                gl.BindFramebuffer(gl::DRAW_FRAMEBUFFER, fbo);
            }
            self.draw_fbo = fbo;
        }
    }

    pub fn set_viewport(&mut self, gl: &gl::Gl, viewport: Viewport) {
        if self.viewport != Some(viewport) {
            unsafe {
                gl.ViewportIndexedf(0, viewport.x, viewport.y, viewport.width, viewport.height);
                gl.DepthRangef(viewport.min_depth, viewport.max_depth);
            }
            self.viewport = Some(viewport);
        }
    }

    pub fn set_scissor(&mut self, gl: &gl::Gl, scissor: ScissorRect) {
        if !self.scissor_enabled {
            unsafe {
                gl.Enable(gl::SCISSOR_TEST);
            }
            self.scissor_enabled = true;
        }
        if self.scissor != Some(scissor) {
            unsafe {
                gl.ScissorIndexed(0, scissor.x, scissor.y, scissor.width as i32, scissor.height as i32);
            }
            self.scissor = Some(scissor);
        }
    }

    pub fn draw(&self, gl: &gl::Gl, topology: PrimitiveTopology, vertex_count: u32, instance_count: u32, first_vertex: u32, first_instance: u32) {
        unsafe {
            if instance_count == 1 && first_instance == 0 {
                gl.DrawArrays(topology_to_glenum(topology), first_vertex as i32, vertex_count as i32);
            } else {
                gl.DrawArraysInstancedBaseInstance(
                    topology_to_glenum(topology),
                    first_vertex as i32,
                    vertex_count as i32,
                    instance_count as i32,
                    first_instance,
                );
            }
        }
    }

    pub fn draw_indexed(
        &self,
        gl: &gl::Gl,
        topology: PrimitiveTopology,
        index_format_gl: gl::types::GLenum,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        index_size: u32,
        vertex_offset: i32,
        first_instance: u32,
    ) {
        let offset = (first_index * index_size) as usize as *const std::ffi::c_void;
        unsafe {
            if instance_count == 1 && first_instance == 0 && vertex_offset == 0 {
                gl.DrawElements(topology_to_glenum(topology), index_count as i32, index_format_gl, offset);
            } else {
                gl.DrawElementsInstancedBaseVertexBaseInstance(
                    topology_to_glenum(topology),
                    index_count as i32,
                    index_format_gl,
                    offset,
                    instance_count as i32,
                    vertex_offset,
                    first_instance,
                );
            }
        }
    }

    pub fn dispatch(&self, gl: &gl::Gl, x: u32, y: u32, z: u32) {
        unsafe {
            gl.DispatchCompute(x, y, z);
        }
    }
}
