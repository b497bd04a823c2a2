//! The crafting pipeline's orchestration entry point (spec.md §4.J step 2):
//! prepare texture/block binding records, synthesize each stage's source,
//! run the `ngl_texvideo` rewriter, compile through a [`GpuContext`], then
//! build the bind-group layout, vertex-state descriptor and uniform symbol
//! table the caller drives the program with. Grounded on
//! `backend_gl/src/shader/mod.rs`'s `create_shader_from_glsl` for the
//! compile step and on `ngpu-gl/src/pipeline.rs::build_vao`'s location
//! assignment for the vertex-state step.

use std::collections::HashMap;

use ngpu_core::context::GpuContext;
use ngpu_core::descriptors::{
    BindGroupLayoutDescriptor, BindGroupLayoutEntry, BindingSpace, DescriptorType, InputRate,
    ProgramDescriptor, VertexAttribute, VertexBufferLayout, VertexStateDescriptor,
};
use ngpu_core::error::Result;
use ngpu_core::format::format_bytes_per_pixel;
use ngpu_core::resource::{BindGroupLayout, Program};

use crate::glslinfo::{BindingAllocator, GlslInfo};
use crate::params::{BlockDecl, CraftParams, TextureDecl, TextureSemantic};
use crate::rewrite::{self, SamplingMode};
use crate::synth::{self, Stage};

/// `stage << 16 | field_index`, letting a caller look a uniform name up once
/// at craft time and reuse the packed index on every frame without
/// restringing (spec.md §4.J "compat uniform block").
pub fn pack_uniform_index(stage: Stage, field_index: u32) -> u32 {
    let stage_bits = match stage {
        Stage::Vertex => 0u32,
        Stage::Fragment => 1,
        Stage::Compute => 2,
    };
    (stage_bits << 16) | field_index
}

pub struct CraftOutput {
    pub program: Program,
    pub bind_group_layout: BindGroupLayout,
    pub vertex_state: VertexStateDescriptor,
    /// Maps a uniform or texture auxiliary-uniform name to its packed
    /// `stage << 16 | field_index` symbol, one entry per stage the name
    /// appears in.
    pub uniform_index: HashMap<String, Vec<u32>>,
    pub vert_source: Option<String>,
    pub frag_source: Option<String>,
    pub comp_source: Option<String>,
}

/// The layout's descriptor type for a declared texture. A video texture
/// whose only supported sampling mode is the Android MediaCodec external
/// image binds as `SamplerExternalOes` instead of the regular `sampler2D`
/// the crafted source also declares (spec.md §4.J "Textures").
fn descriptor_type_for(tex: &TextureDecl, supported: &[SamplingMode]) -> DescriptorType {
    if tex.semantic == TextureSemantic::Video && supported.len() == 1 && supported[0] == SamplingMode::MediaCodec {
        return DescriptorType::SamplerExternalOes;
    }
    match tex.semantic {
        TextureSemantic::Tex2d | TextureSemantic::Video => DescriptorType::Sampler2d,
        TextureSemantic::Tex2dArray => DescriptorType::Sampler2dArray,
        TextureSemantic::Tex3d => DescriptorType::Sampler3d,
        TextureSemantic::Cube => DescriptorType::SamplerCube,
        TextureSemantic::Image2d => DescriptorType::StorageImage,
    }
}

pub fn craft(
    ctx: &dyn GpuContext,
    info: &GlslInfo,
    params: &CraftParams,
    supported: &[SamplingMode],
) -> Result<CraftOutput> {
    let mut alloc = BindingAllocator::new(info);

    let textures_by_name: HashMap<String, TextureDecl> =
        params.textures.iter().map(|t| (t.name.clone(), t.clone())).collect();

    let tex_bindings: Vec<(TextureDecl, u32)> = params
        .textures
        .iter()
        .map(|t| {
            let space = descriptor_type_for(t, supported).binding_space();
            (t.clone(), alloc.next(space))
        })
        .collect();

    let mut block_bindings: HashMap<String, u32> = HashMap::new();
    for block in &params.blocks {
        let space = if block.storage { BindingSpace::StorageBuffer } else { BindingSpace::UniformBuffer };
        block_bindings.entry(block.name.clone()).or_insert_with(|| alloc.next(space));
    }

    let mut uniform_index: HashMap<String, Vec<u32>> = HashMap::new();
    let mut stage_source = |stage: Stage, user_source: Option<&str>| -> Option<String> {
        let user_source = user_source?;
        let compat_binding = alloc.next(BindingSpace::UniformBuffer);
        let mut block_binding_of = |block: &BlockDecl| -> u32 { block_bindings[&block.name] };
        let (source, fields) = synth::synthesize_stage(
            info,
            params,
            stage,
            user_source,
            &tex_bindings,
            &mut block_binding_of,
            compat_binding,
            supported,
        );
        for (i, field) in fields.iter().enumerate() {
            uniform_index.entry(field.name.clone()).or_default().push(pack_uniform_index(stage, i as u32));
        }
        Some(rewrite::rewrite(&source, &textures_by_name, supported))
    };

    let vert_source = stage_source(Stage::Vertex, params.vert_base.as_deref());
    let frag_source = stage_source(Stage::Fragment, params.frag_base.as_deref());
    let comp_source = stage_source(Stage::Compute, params.comp_base.as_deref());

    let program = ctx.create_program(&ProgramDescriptor {
        label: None,
        vertex_src: vert_source.clone(),
        fragment_src: frag_source.clone(),
        compute_src: comp_source.clone(),
    })?;

    let mut entries = Vec::new();
    for (tex, binding) in &tex_bindings {
        entries.push(BindGroupLayoutEntry {
            binding: *binding,
            ty: descriptor_type_for(tex, supported),
            access: tex.access,
            stage_flags: tex.stage_flags,
            count: 1,
        });
    }
    for block in &params.blocks {
        entries.push(BindGroupLayoutEntry {
            binding: block_bindings[&block.name],
            ty: if block.storage {
                DescriptorType::StorageBuffer { dynamic: false }
            } else {
                DescriptorType::UniformBuffer { dynamic: false }
            },
            access: block.access,
            stage_flags: block.stage_flags,
            count: 1,
        });
    }
    let bind_group_layout = ctx.create_bind_group_layout(&BindGroupLayoutDescriptor { entries })?;

    let mut offset = 0u32;
    let attributes: Vec<VertexAttribute> = params
        .attributes
        .iter()
        .enumerate()
        .map(|(i, a)| {
            let size = format_bytes_per_pixel(a.format) as u32;
            let attr = VertexAttribute { id: a.name.clone(), location: i as u32, format: a.format, offset };
            offset += size;
            attr
        })
        .collect();
    let vertex_state = if attributes.is_empty() {
        VertexStateDescriptor::default()
    } else {
        VertexStateDescriptor {
            buffers: vec![VertexBufferLayout { stride: offset, input_rate: InputRate::Vertex, attributes }],
        }
    };

    Ok(CraftOutput { program, bind_group_layout, vertex_state, uniform_index, vert_source, frag_source, comp_source })
}
