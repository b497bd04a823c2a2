//! The mapped-image result type both hardware mappers populate. Grounded on
//! `original_source/libnopegl/src/backends/gl/hwmap_vaapi_gl.c` and
//! `hwmap_videotoolbox_ios_gl.c`'s shared `struct image_params`/
//! `ngli_image_init` (spec.md §4.K).

use bitflags::bitflags;
use ngpu_core::descriptors::SamplerDescription;
use ngpu_core::resource::Texture;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ImageLayout {
    Default,
    Nv12,
}

bitflags! {
    /// Mirrors the caller's `image_layouts` mask (spec.md §4.K "the caller's
    /// `image_layouts` mask"), used to decide whether direct (non-converting)
    /// rendering of a mapped frame is possible.
    pub struct ImageLayoutFlags: u32 {
        const DEFAULT = 0b01;
        const NV12 = 0b10;
    }
}

/// Caller-supplied sampling parameters and the accepted image-layout set,
/// mirrored from `hwmap_params` in both original mappers.
#[derive(Clone, Debug)]
pub struct MapperParams {
    pub sampler: SamplerDescription,
    pub image_layouts: ImageLayoutFlags,
}

/// One hardware-mapped frame: up to two planes (NV12) or one (packed RGBA),
/// the layout telling the sampling shader which `SamplingMode` to use.
pub struct MappedImage {
    pub layout: ImageLayout,
    pub width: u32,
    pub height: u32,
    pub color_scale: f32,
    pub planes: [Option<Texture>; 2],
}

impl MappedImage {
    pub fn empty() -> MappedImage {
        MappedImage { layout: ImageLayout::Default, width: 0, height: 0, color_scale: 1.0, planes: [None, None] }
    }
}

/// Whether mipmapping was requested; both mappers disable direct (zero-copy)
/// rendering when it was, since neither hardware path produces mip chains
/// (spec.md §4.K).
pub fn wants_mipmaps(params: &MapperParams) -> bool {
    params.sampler.mipmap_filter != ngpu_core::descriptors::MipmapFilter::None
}
