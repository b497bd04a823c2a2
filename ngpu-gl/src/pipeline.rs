//! Graphics and compute pipelines: a linked program plus the fixed-function
//! state a draw call needs (VAO, blend/depth/stencil/cull state, topology).
//! `backend_gl/src/pipeline.rs` (referenced from `cmd.rs`'s
//! `GlGraphicsPipeline::bind`/`input_assembly_state`/`vertex_input_bindings`)
//! was not present in the retrieval pack; this module is designed fresh from
//! that call-site shape plus `descriptors::GraphicsPipelineDescriptor`.

use crate::gl::{self, types::GLuint};
use crate::format::gl_format_info;
use ngpu_core::descriptors::{
    BlendFactor, BlendOp, CompareFunc, ComputePipelineDescriptor, CullMode, FrontFace, GraphicsPipelineDescriptor,
    GraphicsState, InputRate, PrimitiveTopology, VertexStateDescriptor,
};
use ngpu_core::error::{Error, Result};
use ngpu_core::resource::PipelineObject;

fn blend_factor_to_glenum(f: BlendFactor) -> gl::types::GLenum {
    match f {
        BlendFactor::Zero => gl::ZERO,
        BlendFactor::One => gl::ONE,
        BlendFactor::SrcAlpha => gl::SRC_ALPHA,
        BlendFactor::OneMinusSrcAlpha => gl::ONE_MINUS_SRC_ALPHA,
        BlendFactor::DstAlpha => gl::DST_ALPHA,
        BlendFactor::OneMinusDstAlpha => gl::ONE_MINUS_DST_ALPHA,
    }
}

fn blend_op_to_glenum(op: BlendOp) -> gl::types::GLenum {
    match op {
        BlendOp::Add => gl::FUNC_ADD,
        BlendOp::Subtract => gl::FUNC_SUBTRACT,
        BlendOp::ReverseSubtract => gl::FUNC_REVERSE_SUBTRACT,
        BlendOp::Min => gl::MIN,
        BlendOp::Max => gl::MAX,
    }
}

fn compare_func_to_glenum(f: CompareFunc) -> gl::types::GLenum {
    match f {
        CompareFunc::Never => gl::NEVER,
        CompareFunc::Less => gl::LESS,
        CompareFunc::Equal => gl::EQUAL,
        CompareFunc::LessEqual => gl::LEQUAL,
        CompareFunc::Greater => gl::GREATER,
        CompareFunc::NotEqual => gl::NOTEQUAL,
        CompareFunc::GreaterEqual => gl::GEQUAL,
        CompareFunc::Always => gl::ALWAYS,
    }
}

#[derive(Debug)]
pub struct GlGraphicsPipeline {
    pub(crate) gl: gl::Gl,
    pub program: GLuint,
    pub vao: GLuint,
    pub topology: PrimitiveTopology,
    pub state: GraphicsState,
    pub vertex_strides: Vec<u32>,
}

impl Drop for GlGraphicsPipeline {
    fn drop(&mut self) {
        unsafe {
            self.gl.DeleteVertexArrays(1, &self.vao);
        }
    }
}

impl PipelineObject for GlGraphicsPipeline {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

fn build_vao(gl: &gl::Gl, vertex_state: &VertexStateDescriptor) -> (GLuint, Vec<u32>) {
    let mut vao = 0;
    unsafe {
        gl.CreateVertexArrays(1, &mut vao);
    }
    let mut strides = Vec::with_capacity(vertex_state.buffers.len());
    for (binding, buf) in vertex_state.buffers.iter().enumerate() {
        let binding = binding as u32;
        strides.push(buf.stride);
        unsafe {
            gl.VertexArrayBindingDivisor(vao, binding, if buf.input_rate == InputRate::Instance { 1 } else { 0 });
        }
        for attr in &buf.attributes {
            let info = gl_format_info(attr.format);
            let component_type = ngpu_core::format::format_component_type(attr.format);
            let nb_comp = ngpu_core::format::format_nb_comp(attr.format);
            unsafe {
                gl.EnableVertexArrayAttrib(vao, attr.location);
                match component_type {
                    ngpu_core::format::ComponentType::SInt | ngpu_core::format::ComponentType::UInt => {
                        gl.VertexArrayAttribIFormat(vao, attr.location, nb_comp as i32, info.upload_ty, attr.offset);
                    }
                    _ => {
                        let normalized = matches!(
                            component_type,
                            ngpu_core::format::ComponentType::UNorm | ngpu_core::format::ComponentType::SNorm
                        );
                        gl.VertexArrayAttribFormat(
                            vao,
                            attr.location,
                            nb_comp as i32,
                            info.upload_ty,
                            normalized as u8,
                            attr.offset,
                        );
                    }
                }
                gl.VertexArrayAttribBinding(vao, attr.location, binding);
            }
        }
    }
    (vao, strides)
}

impl GlGraphicsPipeline {
    pub fn new(gl: &gl::Gl, program: GLuint, desc: &GraphicsPipelineDescriptor) -> Result<GlGraphicsPipeline> {
        let (vao, vertex_strides) = build_vao(gl, &desc.vertex_state);
        Ok(GlGraphicsPipeline {
            gl: gl.clone(),
            program,
            vao,
            topology: desc.topology,
            state: desc.graphics_state,
            vertex_strides,
        })
    }

    /// Applies every piece of fixed-function state this pipeline carries.
    /// Called from command replay on `SetPipeline` (spec.md §4.H).
    pub fn bind(&self, gl: &gl::Gl, state_cache: &mut crate::state::StateCache) {
        state_cache.set_program(gl, self.program);
        state_cache.set_vao(gl, self.vao);
        unsafe {
            if self.state.blend.enabled {
                gl.Enable(gl::BLEND);
                gl.BlendFunc(blend_factor_to_glenum(self.state.blend.src_factor), blend_factor_to_glenum(self.state.blend.dst_factor));
                gl.BlendEquation(blend_op_to_glenum(self.state.blend.op));
            } else {
                gl.Disable(gl::BLEND);
            }

            if self.state.depth.test_enabled {
                gl.Enable(gl::DEPTH_TEST);
                gl.DepthFunc(compare_func_to_glenum(self.state.depth.func));
            } else {
                gl.Disable(gl::DEPTH_TEST);
            }
            gl.DepthMask(self.state.depth.write_enabled as u8);

            if self.state.stencil.enabled {
                gl.Enable(gl::STENCIL_TEST);
                gl.StencilFuncSeparate(
                    gl::FRONT,
                    compare_func_to_glenum(self.state.stencil.front.func),
                    self.state.stencil.front.reference as i32,
                    self.state.stencil.front.read_mask as u32,
                );
                gl.StencilFuncSeparate(
                    gl::BACK,
                    compare_func_to_glenum(self.state.stencil.back.func),
                    self.state.stencil.back.reference as i32,
                    self.state.stencil.back.read_mask as u32,
                );
                gl.StencilMaskSeparate(gl::FRONT, self.state.stencil.front.write_mask as u32);
                gl.StencilMaskSeparate(gl::BACK, self.state.stencil.back.write_mask as u32);
            } else {
                gl.Disable(gl::STENCIL_TEST);
            }

            match self.state.cull_mode {
                CullMode::None => gl.Disable(gl::CULL_FACE),
                CullMode::Front => {
                    gl.Enable(gl::CULL_FACE);
                    gl.CullFace(gl::FRONT);
                }
                CullMode::Back => {
                    gl.Enable(gl::CULL_FACE);
                    gl.CullFace(gl::BACK);
                }
            }
            gl.FrontFace(match self.state.front_face {
                FrontFace::Clockwise => gl::CW,
                FrontFace::CounterClockwise => gl::CCW,
            });
            gl.ColorMask(
                self.state.color_write_mask.contains(ngpu_core::descriptors::ColorWriteMask::RED) as u8,
                self.state.color_write_mask.contains(ngpu_core::descriptors::ColorWriteMask::GREEN) as u8,
                self.state.color_write_mask.contains(ngpu_core::descriptors::ColorWriteMask::BLUE) as u8,
                self.state.color_write_mask.contains(ngpu_core::descriptors::ColorWriteMask::ALPHA) as u8,
            );
        }
    }
}

#[derive(Debug)]
pub struct GlComputePipeline {
    pub(crate) gl: gl::Gl,
    pub program: GLuint,
    pub workgroup_size: (u32, u32, u32),
}

impl Drop for GlComputePipeline {
    fn drop(&mut self) {
        // the program itself is owned by the retained `Program` handle this
        // pipeline was created from; nothing GL-side to free here.
    }
}

impl PipelineObject for GlComputePipeline {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

impl GlComputePipeline {
    pub fn new(gl: &gl::Gl, program: GLuint, desc: &ComputePipelineDescriptor) -> GlComputePipeline {
        GlComputePipeline {
            gl: gl.clone(),
            program,
            workgroup_size: desc.workgroup_size,
        }
    }
}

pub fn downcast_graphics(pipeline: &ngpu_core::resource::Pipeline) -> Result<&GlGraphicsPipeline> {
    pipeline
        .0
        .as_any()
        .downcast_ref::<GlGraphicsPipeline>()
        .ok_or_else(|| Error::invalid_arg("pipeline is not a graphics pipeline created by this context"))
}

pub fn downcast_compute(pipeline: &ngpu_core::resource::Pipeline) -> Result<&GlComputePipeline> {
    pipeline
        .0
        .as_any()
        .downcast_ref::<GlComputePipeline>()
        .ok_or_else(|| Error::invalid_arg("pipeline is not a compute pipeline created by this context"))
}
