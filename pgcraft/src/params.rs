//! The declarative description a caller hands to [`crate::craft`]. Grounded
//! on spec.md §4.J's own parameter list (uniforms/blocks/textures/attributes/
//! iovars/workgroup size/output count); no teacher file covers this (the
//! reference renderer's shaders are hand-written GLSL, not synthesized).

use ngpu_core::descriptors::{Access, ShaderStageFlags};
use ngpu_core::format::Format;

/// A scalar/vector/matrix GLSL type, used for both compat-block fields and
/// inter-stage iovars.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum GlslType {
    Float,
    Int,
    UInt,
    Vec2,
    Vec3,
    Vec4,
    IVec2,
    IVec3,
    IVec4,
    Mat3,
    Mat4,
}

impl GlslType {
    pub fn glsl_name(self) -> &'static str {
        match self {
            GlslType::Float => "float",
            GlslType::Int => "int",
            GlslType::UInt => "uint",
            GlslType::Vec2 => "vec2",
            GlslType::Vec3 => "vec3",
            GlslType::Vec4 => "vec4",
            GlslType::IVec2 => "ivec2",
            GlslType::IVec3 => "ivec3",
            GlslType::IVec4 => "ivec4",
            GlslType::Mat3 => "mat3",
            GlslType::Mat4 => "mat4",
        }
    }

    /// Number of consecutive vertex-attribute/iovar locations this type
    /// occupies, per spec.md §4.J "mat3/mat4 occupy 3/4 consecutive locations".
    pub fn location_count(self) -> u32 {
        match self {
            GlslType::Mat3 => 3,
            GlslType::Mat4 => 4,
            _ => 1,
        }
    }

    pub fn is_integer(self) -> bool {
        matches!(self, GlslType::Int | GlslType::UInt | GlslType::IVec2 | GlslType::IVec3 | GlslType::IVec4)
    }
}

/// The semantic type of a declared texture, driving which auxiliary
/// uniforms and sampler variants the crafter emits.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum TextureSemantic {
    Tex2d,
    Tex2dArray,
    Tex3d,
    Cube,
    /// A video frame whose in-memory layout (NV12, YUV planar, an OES
    /// external image, ...) is only known at bind time; sampled through
    /// `ngl_texvideo` (spec.md §4.J).
    Video,
    /// A storage image (`image2D`); requires `format` to be set.
    Image2d,
}

#[derive(Clone, Debug)]
pub struct TextureDecl {
    pub name: String,
    pub semantic: TextureSemantic,
    pub stage_flags: ShaderStageFlags,
    pub access: Access,
    /// Required (non-UNDEFINED) when `semantic` is `Image2d`.
    pub format: Option<Format>,
    /// Wraps the `ngl_texvideo` expansion in `clamp(..., 0.0, 1.0)`.
    pub clamp_video: bool,
}

#[derive(Clone, Debug)]
pub struct UniformDecl {
    pub name: String,
    pub ty: GlslType,
    pub stage_flags: ShaderStageFlags,
}

#[derive(Clone, Debug)]
pub struct BlockField {
    pub name: String,
    pub ty: GlslType,
}

#[derive(Clone, Debug)]
pub struct BlockDecl {
    pub name: String,
    pub fields: Vec<BlockField>,
    pub storage: bool,
    pub stage_flags: ShaderStageFlags,
    pub access: Access,
}

#[derive(Clone, Debug)]
pub struct AttributeDecl {
    pub name: String,
    pub format: Format,
    pub buffer_index: u32,
}

#[derive(Clone, Debug)]
pub struct IoVarDecl {
    pub name: String,
    pub ty: GlslType,
}

#[derive(Clone, Debug, Default)]
pub struct CraftParams {
    pub vert_base: Option<String>,
    pub frag_base: Option<String>,
    pub comp_base: Option<String>,
    pub uniforms: Vec<UniformDecl>,
    pub blocks: Vec<BlockDecl>,
    pub textures: Vec<TextureDecl>,
    pub attributes: Vec<AttributeDecl>,
    pub iovars: Vec<IoVarDecl>,
    pub workgroup_size: (u32, u32, u32),
    pub frag_output_count: u32,
}
