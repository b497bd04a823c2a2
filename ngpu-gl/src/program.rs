//! Shader compilation, linking, and introspection. Grounded on
//! `backend_gl/src/shader/mod.rs`'s `create_shader_from_glsl`/
//! `ShaderCreationError` (kept as the `Error::graphics_generic` idiom
//! instead of a bespoke error type, since this crate funnels every error
//! through `ngpu_core::error::Error`).

use crate::gl::{self, types::GLuint};
use ngpu_core::descriptors::{AttributeInfo, BlockInfo, ProgramDescriptor, UniformInfo};
use ngpu_core::error::{Error, Result};
use ngpu_core::resource::ProgramObject;

#[derive(Debug)]
pub struct GlProgram {
    pub(crate) gl: gl::Gl,
    pub obj: GLuint,
    pub attributes: Vec<AttributeInfo>,
    pub uniforms: Vec<UniformInfo>,
    pub buffer_blocks: Vec<BlockInfo>,
    pub is_compute: bool,
}

impl Drop for GlProgram {
    fn drop(&mut self) {
        unsafe {
            self.gl.DeleteProgram(self.obj);
        }
    }
}

impl ProgramObject for GlProgram {
    fn attributes(&self) -> &[AttributeInfo] {
        &self.attributes
    }
    fn uniforms(&self) -> &[UniformInfo] {
        &self.uniforms
    }
    fn buffer_blocks(&self) -> &[BlockInfo] {
        &self.buffer_blocks
    }
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

fn compile_stage(gl: &gl::Gl, stage: gl::types::GLenum, source: &str) -> Result<GLuint> {
    unsafe {
        let obj = gl.CreateShader(stage);
        let src_ptr = source.as_ptr() as *const i8;
        let len = source.len() as gl::types::GLint;
        gl.ShaderSource(obj, 1, &src_ptr, &len);
        gl.CompileShader(obj);
        let mut status = 0;
        gl.GetShaderiv(obj, gl::COMPILE_STATUS, &mut status);
        if status != gl::TRUE as gl::types::GLint {
            let log = get_shader_info_log(gl, obj);
            gl.DeleteShader(obj);
            return Err(Error::graphics_generic(format!("shader compilation failed: {}", log)));
        }
        Ok(obj)
    }
}

fn get_shader_info_log(gl: &gl::Gl, obj: GLuint) -> String {
    unsafe {
        let mut len = 0;
        gl.GetShaderiv(obj, gl::INFO_LOG_LENGTH, &mut len);
        let mut buf = vec![0u8; len.max(0) as usize];
        let mut written = 0;
        gl.GetShaderInfoLog(obj, len, &mut written, buf.as_mut_ptr() as *mut i8);
        buf.truncate(written.max(0) as usize);
        String::from_utf8_lossy(&buf).into_owned()
    }
}

fn get_program_info_log(gl: &gl::Gl, obj: GLuint) -> String {
    unsafe {
        let mut len = 0;
        gl.GetProgramiv(obj, gl::INFO_LOG_LENGTH, &mut len);
        let mut buf = vec![0u8; len.max(0) as usize];
        let mut written = 0;
        gl.GetProgramInfoLog(obj, len, &mut written, buf.as_mut_ptr() as *mut i8);
        buf.truncate(written.max(0) as usize);
        String::from_utf8_lossy(&buf).into_owned()
    }
}

fn link(gl: &gl::Gl, stages: &[GLuint]) -> Result<GLuint> {
    unsafe {
        let program = gl.CreateProgram();
        for &shader in stages {
            gl.AttachShader(program, shader);
        }
        gl.LinkProgram(program);
        for &shader in stages {
            gl.DetachShader(program, shader);
            gl.DeleteShader(shader);
        }
        let mut status = 0;
        gl.GetProgramiv(program, gl::LINK_STATUS, &mut status);
        if status != gl::TRUE as gl::types::GLint {
            let log = get_program_info_log(gl, program);
            gl.DeleteProgram(program);
            return Err(Error::graphics_generic(format!("program link failed: {}", log)));
        }
        Ok(program)
    }
}

fn introspect_attributes(gl: &gl::Gl, program: GLuint) -> Vec<AttributeInfo> {
    let mut count = 0;
    unsafe {
        gl.GetProgramiv(program, gl::ACTIVE_ATTRIBUTES, &mut count);
    }
    let mut out = Vec::with_capacity(count.max(0) as usize);
    let mut name_buf = vec![0u8; 256];
    for i in 0..count {
        let mut len = 0;
        let mut size = 0;
        let mut ty = 0;
        unsafe {
            gl.GetActiveAttrib(
                program,
                i as u32,
                name_buf.len() as i32,
                &mut len,
                &mut size,
                &mut ty,
                name_buf.as_mut_ptr() as *mut i8,
            );
        }
        let name = String::from_utf8_lossy(&name_buf[..len.max(0) as usize]).into_owned();
        let location = unsafe { gl.GetAttribLocation(program, name_buf.as_ptr() as *const i8) };
        out.push(AttributeInfo { name, location });
    }
    out
}

fn introspect_uniforms(gl: &gl::Gl, program: GLuint) -> Vec<UniformInfo> {
    let mut count = 0;
    unsafe {
        gl.GetProgramiv(program, gl::ACTIVE_UNIFORMS, &mut count);
    }
    let mut out = Vec::with_capacity(count.max(0) as usize);
    let mut name_buf = vec![0u8; 256];
    for i in 0..count {
        let mut len = 0;
        let mut size = 0;
        let mut ty = 0;
        unsafe {
            gl.GetActiveUniform(
                program,
                i as u32,
                name_buf.len() as i32,
                &mut len,
                &mut size,
                &mut ty,
                name_buf.as_mut_ptr() as *mut i8,
            );
        }
        let name = String::from_utf8_lossy(&name_buf[..len.max(0) as usize]).into_owned();
        let location = unsafe { gl.GetUniformLocation(program, name_buf.as_ptr() as *const i8) };
        out.push(UniformInfo { name, location });
    }
    out
}

fn introspect_blocks(gl: &gl::Gl, program: GLuint, storage: bool) -> Vec<BlockInfo> {
    let interface = if storage { gl::SHADER_STORAGE_BLOCK } else { gl::UNIFORM_BLOCK };
    let mut count = 0;
    unsafe {
        gl.GetProgramInterfaceiv(program, interface, gl::ACTIVE_RESOURCES, &mut count);
    }
    let mut out = Vec::with_capacity(count.max(0) as usize);
    let mut name_buf = vec![0u8; 256];
    for i in 0..count as u32 {
        let mut len = 0;
        unsafe {
            gl.GetProgramResourceName(program, interface, i, name_buf.len() as i32, &mut len, name_buf.as_mut_ptr() as *mut i8);
        }
        let name = String::from_utf8_lossy(&name_buf[..len.max(0) as usize]).into_owned();
        let mut binding_val = 0;
        let props = [gl::BUFFER_BINDING];
        let mut written = 0;
        unsafe {
            gl.GetProgramResourceiv(program, interface, i, 1, props.as_ptr(), 1, &mut written, &mut binding_val);
        }
        out.push(BlockInfo { name, binding: binding_val as u32, is_storage: storage });
    }
    out
}

/// Compiles and links `desc`'s sources into a `GlProgram`, then introspects
/// its attribute/uniform/block interfaces (spec.md §4.G "program introspection").
pub fn create_program(gl: &gl::Gl, desc: &ProgramDescriptor) -> Result<GlProgram> {
    let mut stages = Vec::new();
    let is_compute = desc.compute_src.is_some();

    if let Some(src) = &desc.vertex_src {
        stages.push(compile_stage(gl, gl::VERTEX_SHADER, src)?);
    }
    if let Some(src) = &desc.fragment_src {
        stages.push(compile_stage(gl, gl::FRAGMENT_SHADER, src)?);
    }
    if let Some(src) = &desc.compute_src {
        stages.push(compile_stage(gl, gl::COMPUTE_SHADER, src)?);
    }
    if stages.is_empty() {
        return Err(Error::invalid_arg("program descriptor has no shader stages"));
    }

    let obj = link(gl, &stages)?;
    let attributes = introspect_attributes(gl, obj);
    let uniforms = introspect_uniforms(gl, obj);
    let mut buffer_blocks = introspect_blocks(gl, obj, false);
    buffer_blocks.extend(introspect_blocks(gl, obj, true));

    Ok(GlProgram {
        gl: gl.clone(),
        obj,
        attributes,
        uniforms,
        buffer_blocks,
        is_compute,
    })
}

pub fn downcast(program: &ngpu_core::resource::Program) -> Result<&GlProgram> {
    program
        .0
        .as_any()
        .downcast_ref::<GlProgram>()
        .ok_or_else(|| Error::invalid_arg("program was not created by this context"))
}
