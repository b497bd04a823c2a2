//! Resource descriptors: the plain-data structs callers fill in to create
//! buffers, textures, bind groups, programs, pipelines, and render targets.
//! Grounded on `renderer/src/descriptor.rs` (`DescriptorSetLayoutBinding`,
//! `DescriptorType`, `Descriptor`) and `renderer/src/interface.rs`'s
//! vertex-attribute/fragment-output descriptions, widened per spec.md §3.

use crate::dimensions::{Dimensions, MipmapsCount};
use crate::format::Format;
use crate::resource::{Buffer, Texture};
use crate::usage::{BufferUsageFlags, ImageUsageFlags};
use bitflags::bitflags;

bitflags! {
    pub struct ShaderStageFlags: u32 {
        const VERTEX   = 0b001;
        const FRAGMENT = 0b010;
        const COMPUTE  = 0b100;
    }
}

// ---- buffers ---------------------------------------------------------

#[derive(Clone, Debug)]
pub struct BufferDescriptor {
    pub label: Option<String>,
    pub size: u64,
    pub usage: BufferUsageFlags,
}

// ---- textures ----------------------------------------------------------

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum FilterMode {
    Nearest,
    Linear,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum WrapMode {
    Repeat,
    MirroredRepeat,
    ClampToEdge,
    ClampToBorder,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum MipmapFilter {
    None,
    Nearest,
    Linear,
}

#[derive(Clone, Debug)]
pub struct SamplerDescription {
    pub min_filter: FilterMode,
    pub mag_filter: FilterMode,
    pub mipmap_filter: MipmapFilter,
    pub wrap_u: WrapMode,
    pub wrap_v: WrapMode,
    pub wrap_w: WrapMode,
}

impl Default for SamplerDescription {
    fn default() -> SamplerDescription {
        SamplerDescription {
            min_filter: FilterMode::Linear,
            mag_filter: FilterMode::Linear,
            mipmap_filter: MipmapFilter::None,
            wrap_u: WrapMode::ClampToEdge,
            wrap_v: WrapMode::ClampToEdge,
            wrap_w: WrapMode::ClampToEdge,
        }
    }
}

#[derive(Clone, Debug)]
pub struct TextureDescriptor {
    pub label: Option<String>,
    pub format: Format,
    pub dimensions: Dimensions,
    pub samples: u32,
    pub usage: ImageUsageFlags,
    pub mipmaps: MipmapsCount,
    pub sampler: SamplerDescription,
}

/// Transfer region for `upload`, per spec.md §4.C.
#[derive(Copy, Clone, Debug)]
pub struct TransferRegion {
    pub x: u32,
    pub y: u32,
    pub z: u32,
    pub w: u32,
    pub h: u32,
    pub d: u32,
    pub base_layer: u32,
    pub layer_count: u32,
    pub pixels_per_row: u32,
    pub mip_level: u32,
}

// ---- bind groups ---------------------------------------------------------

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum DescriptorType {
    Sampler2d,
    Sampler2dArray,
    Sampler3d,
    SamplerCube,
    SamplerExternalOes,
    SamplerRect,
    SamplerY2yExternal,
    StorageImage,
    UniformBuffer { dynamic: bool },
    StorageBuffer { dynamic: bool },
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Access {
    Read,
    Write,
    ReadWrite,
}

/// Which per-backend binding pool a descriptor type is drawn from. On
/// Vulkan all four share one counter; on GL each has its own (spec.md §3
/// invariant, §9 "Binding-namespace divergence").
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum BindingSpace {
    UniformBuffer,
    StorageBuffer,
    Texture,
    Image,
}

impl DescriptorType {
    pub fn binding_space(self) -> BindingSpace {
        match self {
            DescriptorType::UniformBuffer { .. } => BindingSpace::UniformBuffer,
            DescriptorType::StorageBuffer { .. } => BindingSpace::StorageBuffer,
            DescriptorType::StorageImage => BindingSpace::Image,
            _ => BindingSpace::Texture,
        }
    }
}

#[derive(Clone, Debug)]
pub struct BindGroupLayoutEntry {
    pub binding: u32,
    pub ty: DescriptorType,
    pub access: Access,
    pub stage_flags: ShaderStageFlags,
    pub count: u32,
}

#[derive(Clone, Debug, Default)]
pub struct BindGroupLayoutDescriptor {
    pub entries: Vec<BindGroupLayoutEntry>,
}

#[derive(Clone, Debug)]
pub enum BindGroupEntry {
    Texture { texture: Texture, sampler: SamplerDescription },
    Image { texture: Texture },
    Buffer { buffer: Buffer, offset: u64, size: u64 },
}

#[derive(Clone, Debug, Default)]
pub struct BindGroupDescriptor {
    pub entries: Vec<BindGroupEntry>,
}

// ---- programs ------------------------------------------------------------

#[derive(Clone, Debug, Default)]
pub struct ProgramDescriptor {
    pub label: Option<String>,
    pub vertex_src: Option<String>,
    pub fragment_src: Option<String>,
    pub compute_src: Option<String>,
}

#[derive(Clone, Debug)]
pub struct AttributeInfo {
    pub name: String,
    pub location: i32,
}

#[derive(Clone, Debug)]
pub struct UniformInfo {
    pub name: String,
    pub location: i32,
}

#[derive(Clone, Debug)]
pub struct BlockInfo {
    pub name: String,
    pub binding: u32,
    pub is_storage: bool,
}

// ---- vertex state ---------------------------------------------------------

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum InputRate {
    Vertex,
    Instance,
}

#[derive(Clone, Debug)]
pub struct VertexAttribute {
    pub id: String,
    pub location: u32,
    pub format: Format,
    pub offset: u32,
}

#[derive(Clone, Debug)]
pub struct VertexBufferLayout {
    pub stride: u32,
    pub input_rate: InputRate,
    pub attributes: Vec<VertexAttribute>,
}

#[derive(Clone, Debug, Default)]
pub struct VertexStateDescriptor {
    pub buffers: Vec<VertexBufferLayout>,
}

// ---- render target ---------------------------------------------------------

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum LoadOp {
    DontCare,
    Clear,
    Load,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum StoreOp {
    DontCare,
    Store,
}

#[derive(Clone, Debug)]
pub struct ColorAttachmentDescriptor {
    pub texture: Texture,
    pub layer: u32,
    pub resolve_target: Option<Texture>,
    pub resolve_layer: u32,
    pub load_op: LoadOp,
    pub store_op: StoreOp,
    pub clear_value: [f32; 4],
}

#[derive(Clone, Debug)]
pub struct DepthStencilAttachmentDescriptor {
    pub texture: Texture,
    pub layer: u32,
    pub load_op: LoadOp,
    pub store_op: StoreOp,
    pub clear_depth: f32,
    pub clear_stencil: u8,
}

#[derive(Clone, Debug, Default)]
pub struct RenderTargetDescriptor {
    pub color_attachments: Vec<ColorAttachmentDescriptor>,
    pub depth_stencil_attachment: Option<DepthStencilAttachmentDescriptor>,
}

// ---- pipeline ---------------------------------------------------------

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum PrimitiveTopology {
    PointList,
    LineList,
    LineStrip,
    TriangleList,
    TriangleStrip,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum BlendFactor {
    Zero,
    One,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum BlendOp {
    Add,
    Subtract,
    ReverseSubtract,
    Min,
    Max,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct BlendState {
    pub enabled: bool,
    pub src_factor: BlendFactor,
    pub dst_factor: BlendFactor,
    pub op: BlendOp,
}

impl Default for BlendState {
    fn default() -> BlendState {
        BlendState {
            enabled: false,
            src_factor: BlendFactor::One,
            dst_factor: BlendFactor::Zero,
            op: BlendOp::Add,
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum CompareFunc {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum CullMode {
    None,
    Front,
    Back,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum FrontFace {
    Clockwise,
    CounterClockwise,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct DepthState {
    pub test_enabled: bool,
    pub write_enabled: bool,
    pub func: CompareFunc,
}

impl Default for DepthState {
    fn default() -> DepthState {
        DepthState {
            test_enabled: false,
            write_enabled: true,
            func: CompareFunc::Less,
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct StencilFaceState {
    pub func: CompareFunc,
    pub reference: u8,
    pub read_mask: u8,
    pub write_mask: u8,
}

impl Default for StencilFaceState {
    fn default() -> StencilFaceState {
        StencilFaceState {
            func: CompareFunc::Always,
            reference: 0,
            read_mask: 0xff,
            write_mask: 0xff,
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct StencilState {
    pub enabled: bool,
    pub front: StencilFaceState,
    pub back: StencilFaceState,
}

bitflags! {
    pub struct ColorWriteMask: u32 {
        const RED   = 0b0001;
        const GREEN = 0b0010;
        const BLUE  = 0b0100;
        const ALPHA = 0b1000;
        const ALL = Self::RED.bits | Self::GREEN.bits | Self::BLUE.bits | Self::ALPHA.bits;
    }
}

#[derive(Copy, Clone, Debug)]
pub struct GraphicsState {
    pub blend: BlendState,
    pub depth: DepthState,
    pub stencil: StencilState,
    pub cull_mode: CullMode,
    pub front_face: FrontFace,
    pub color_write_mask: ColorWriteMask,
}

impl Default for GraphicsState {
    fn default() -> GraphicsState {
        GraphicsState {
            blend: BlendState::default(),
            depth: DepthState::default(),
            stencil: StencilState::default(),
            cull_mode: CullMode::None,
            front_face: FrontFace::CounterClockwise,
            color_write_mask: ColorWriteMask::ALL,
        }
    }
}

#[derive(Clone)]
pub struct GraphicsPipelineDescriptor {
    pub label: Option<String>,
    pub program: crate::resource::Program,
    pub vertex_state: VertexStateDescriptor,
    pub topology: PrimitiveTopology,
    pub graphics_state: GraphicsState,
}

#[derive(Clone)]
pub struct ComputePipelineDescriptor {
    pub label: Option<String>,
    pub program: crate::resource::Program,
    pub workgroup_size: (u32, u32, u32),
}

// ---- misc --------------------------------------------------------------

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum IndexFormat {
    Uint16,
    Uint32,
}

#[derive(Copy, Clone, PartialEq, Debug, Default)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

#[derive(Copy, Clone, PartialEq, Debug, Default)]
pub struct ScissorRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}
