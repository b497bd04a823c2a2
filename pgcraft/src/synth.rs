//! GLSL source synthesis: header, iovars, texture declarations, user blocks,
//! vertex attributes, and the compat uniform block, assembled per spec.md
//! §4.J's crafting-pipeline step 2. No teacher file produces GLSL text (the
//! reference renderer's shaders are hand-written); grounded on the
//! `#version`/qualifier facts `backend_gl/src/shader/preprocessor.rs` already
//! parses out of hand-written sources, run here in the opposite direction.

use crate::glslinfo::GlslInfo;
use crate::params::{AttributeDecl, BlockDecl, CraftParams, IoVarDecl, TextureDecl, TextureSemantic};
use crate::rewrite::SamplingMode;
use ngpu_core::descriptors::ShaderStageFlags;
use ngpu_core::format::{format_component_type, format_nb_comp, ComponentType};

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Stage {
    Vertex,
    Fragment,
    Compute,
}

impl Stage {
    fn flag(self) -> ShaderStageFlags {
        match self {
            Stage::Vertex => ShaderStageFlags::VERTEX,
            Stage::Fragment => ShaderStageFlags::FRAGMENT,
            Stage::Compute => ShaderStageFlags::COMPUTE,
        }
    }
}

/// One compat-block field: every non-texture uniform plus every texture's
/// auxiliary uniforms are injected here (spec.md §4.J "compat uniform
/// block"). `stage_field_index` is this field's position within its stage's
/// block, used to build the `stage << 16 | field_index` uniform index.
pub struct CompatField {
    pub name: String,
    pub glsl_type: &'static str,
}

fn push_header(out: &mut String, info: &GlslInfo, stage: Stage, has_video_texture: bool, ubo_binding_below_420: bool) {
    out.push_str(&format!("#version {}{}\n", info.version, info.version_suffix));
    if !info.has_explicit_bindings && ubo_binding_below_420 {
        out.push_str("#extension GL_ARB_shading_language_420pack : require\n");
    }
    if has_video_texture && stage == Stage::Fragment {
        out.push_str("#extension GL_OES_EGL_image_external_essl3 : require\n");
    }
    if stage == Stage::Compute && info.version < 430 {
        out.push_str("#extension GL_ARB_compute_shader : require\n");
    }
    if info.has_precision_qualifiers {
        out.push_str("precision highp float;\nprecision highp int;\n");
    }
}

fn push_iovars(out: &mut String, info: &GlslInfo, iovars: &[IoVarDecl], stage: Stage) {
    let direction = match stage {
        Stage::Vertex => "out",
        Stage::Fragment => "in",
        Stage::Compute => return,
    };
    let mut location = 0u32;
    for iovar in iovars {
        let layout = if info.has_in_out_layout_qualifiers {
            format!("layout(location = {}) ", location)
        } else {
            String::new()
        };
        let flat = if iovar.ty.is_integer() { "flat " } else { "" };
        out.push_str(&format!("{}{}{} {} {};\n", layout, flat, direction, iovar.ty.glsl_name(), iovar.name));
        location += iovar.ty.location_count();
    }
}

/// Emits the sampler/image declarations for one texture, per the semantic
/// type's variant list (spec.md §4.J "Textures").
fn push_texture_decl(out: &mut String, info: &GlslInfo, tex: &TextureDecl, binding: u32, supported: &[SamplingMode]) {
    let layout = if info.has_explicit_bindings {
        format!("layout(binding = {}) ", binding)
    } else {
        String::new()
    };
    match tex.semantic {
        TextureSemantic::Tex2d | TextureSemantic::Video => {
            out.push_str(&format!("{}uniform sampler2D {};\n", layout, tex.name));
            if tex.semantic == TextureSemantic::Video {
                if supported.contains(&SamplingMode::Nv12) {
                    out.push_str(&format!("uniform sampler2D {}_1;\n", tex.name));
                }
                if supported.contains(&SamplingMode::Yuv) {
                    out.push_str(&format!("uniform sampler2D {}_1;\n", tex.name));
                    out.push_str(&format!("uniform sampler2D {}_2;\n", tex.name));
                }
                if supported.contains(&SamplingMode::MediaCodec) {
                    out.push_str(&format!("uniform samplerExternalOES {}_oes;\n", tex.name));
                }
                if supported.contains(&SamplingMode::Rectangle) || supported.contains(&SamplingMode::Nv12Rectangle) {
                    out.push_str(&format!("uniform sampler2DRect {}_rect_0;\n", tex.name));
                }
                if supported.contains(&SamplingMode::Nv12Rectangle) {
                    out.push_str(&format!("uniform sampler2DRect {}_rect_1;\n", tex.name));
                }
            }
        }
        TextureSemantic::Tex2dArray => out.push_str(&format!("{}uniform sampler2DArray {};\n", layout, tex.name)),
        TextureSemantic::Tex3d => out.push_str(&format!("{}uniform sampler3D {};\n", layout, tex.name)),
        TextureSemantic::Cube => out.push_str(&format!("{}uniform samplerCube {};\n", layout, tex.name)),
        TextureSemantic::Image2d => {
            let format = tex.format.expect("Image2d texture requires a storage format");
            let (glsl_fmt, requires_qualifier) = image_format_qualifier(format);
            let qualifier = if requires_qualifier {
                match tex.access {
                    ngpu_core::descriptors::Access::Read => "readonly ",
                    ngpu_core::descriptors::Access::Write => "writeonly ",
                    ngpu_core::descriptors::Access::ReadWrite => "",
                }
            } else {
                ""
            };
            out.push_str(&format!("layout({}, binding = {}) {}uniform image2D {};\n", glsl_fmt, binding, qualifier, tex.name));
        }
    }
}

/// `r32f`/`r32i`/`r32ui` don't require a `readonly`/`writeonly` memory
/// qualifier under the GLES 3.2 rule (spec.md §4.J); every other storage
/// image format does.
fn image_format_qualifier(format: ngpu_core::format::Format) -> (&'static str, bool) {
    use ngpu_core::format::Format::*;
    match format {
        R32_SFLOAT => ("r32f", false),
        R32_SINT => ("r32i", false),
        R32_UINT => ("r32ui", false),
        R8_UNORM => ("r8", true),
        R8G8B8A8_UNORM => ("rgba8", true),
        R16G16B16A16_SFLOAT => ("rgba16f", true),
        _ => ("rgba8", true),
    }
}

fn attribute_glsl_type(attr: &AttributeDecl) -> &'static str {
    let component_type = format_component_type(attr.format);
    let nb_comp = format_nb_comp(attr.format);
    match (component_type, nb_comp) {
        (ComponentType::SInt, 1) => "int",
        (ComponentType::SInt, 2) => "ivec2",
        (ComponentType::SInt, 3) => "ivec3",
        (ComponentType::SInt, 4) => "ivec4",
        (ComponentType::UInt, 1) => "uint",
        (ComponentType::UInt, 2) => "uvec2",
        (ComponentType::UInt, 3) => "uvec3",
        (ComponentType::UInt, 4) => "uvec4",
        (_, 1) => "float",
        (_, 2) => "vec2",
        (_, 3) => "vec3",
        _ => "vec4",
    }
}

fn push_attributes(out: &mut String, info: &GlslInfo, attrs: &[(AttributeDecl, u32)]) {
    for (attr, location) in attrs {
        let layout = if info.has_in_out_layout_qualifiers {
            format!("layout(location = {}) ", location)
        } else {
            String::new()
        };
        out.push_str(&format!("{}in {} {};\n", layout, attribute_glsl_type(attr), attr.name));
    }
}

fn push_blocks(out: &mut String, binding_of: &mut dyn FnMut(&BlockDecl) -> u32, blocks: &[BlockDecl], stage: Stage) {
    for block in blocks {
        if !block.stage_flags.contains(stage.flag()) {
            continue;
        }
        let layout_kind = if block.storage { "std430" } else { "std140" };
        let keyword = if block.storage { "buffer" } else { "uniform" };
        let binding = binding_of(block);
        out.push_str(&format!("layout({}, binding = {}) {} {}Block {{\n", layout_kind, binding, keyword, block.name));
        for field in &block.fields {
            out.push_str(&format!("    {} {};\n", field.ty.glsl_name(), field.name));
        }
        out.push_str(&format!("}} {};\n", block.name));
    }
}

/// Injects every non-texture uniform plus each texture's auxiliary uniforms
/// into one anonymous (instance-name-less) std140 block, so member names
/// stay visible as plain globals the way default-block uniforms would be
/// (spec.md §4.J "compat uniform block").
fn push_compat_block(out: &mut String, binding: u32, fields: &[CompatField]) {
    if fields.is_empty() {
        return;
    }
    out.push_str(&format!("layout(std140, binding = {}) uniform CompatUniforms {{\n", binding));
    for field in fields {
        out.push_str(&format!("    {} {};\n", field.glsl_type, field.name));
    }
    out.push_str("};\n");
}

fn texture_compat_fields(tex: &TextureDecl) -> Vec<CompatField> {
    if tex.semantic != TextureSemantic::Video {
        return Vec::new();
    }
    vec![
        CompatField { name: format!("{}_sampling_mode", tex.name), glsl_type: "int" },
        CompatField { name: format!("{}_color_matrix", tex.name), glsl_type: "mat4" },
        CompatField { name: format!("{}_coord_matrix", tex.name), glsl_type: "mat3" },
        CompatField { name: format!("{}_dimensions", tex.name), glsl_type: "vec2" },
        CompatField { name: format!("{}_ts", tex.name), glsl_type: "float" },
    ]
}

/// Synthesizes one stage's complete source (header through user code) and
/// returns it alongside the compat-block field list for this stage (used to
/// build the symbol table's `stage << 16 | field_index` indices).
pub fn synthesize_stage(
    info: &GlslInfo,
    params: &CraftParams,
    stage: Stage,
    user_source: &str,
    tex_bindings: &[(TextureDecl, u32)],
    block_binding_of: &mut dyn FnMut(&BlockDecl) -> u32,
    compat_binding: u32,
    supported: &[SamplingMode],
) -> (String, Vec<CompatField>) {
    let has_video = tex_bindings.iter().any(|(t, _)| t.semantic == TextureSemantic::Video && t.stage_flags.contains(stage.flag()));

    let mut out = String::new();
    push_header(&mut out, info, stage, has_video, compat_binding > 0);
    push_iovars(&mut out, info, &params.iovars, stage);

    for (tex, binding) in tex_bindings {
        if tex.stage_flags.contains(stage.flag()) {
            push_texture_decl(&mut out, info, tex, *binding, supported);
        }
    }

    push_blocks(&mut out, block_binding_of, &params.blocks, stage);

    if stage == Stage::Vertex && !params.attributes.is_empty() {
        let located: Vec<(AttributeDecl, u32)> =
            params.attributes.iter().enumerate().map(|(i, a)| (a.clone(), i as u32)).collect();
        push_attributes(&mut out, info, &located);
    }

    let mut compat_fields = Vec::new();
    for uniform in &params.uniforms {
        if uniform.stage_flags.contains(stage.flag()) {
            compat_fields.push(CompatField { name: uniform.name.clone(), glsl_type: uniform.ty.glsl_name() });
        }
    }
    for (tex, _) in tex_bindings {
        if tex.stage_flags.contains(stage.flag()) {
            compat_fields.extend(texture_compat_fields(tex));
        }
    }
    push_compat_block(&mut out, compat_binding, &compat_fields);

    out.push_str(user_source);
    (out, compat_fields)
}
