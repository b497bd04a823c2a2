//! GL format mapping, extending `backend_gl/src/format.rs`'s `GlFormatInfo`/
//! `GLF_*` table to the fuller set `ngpu_core::format` declares, plus the
//! feature-upgrade pass spec.md §4.B and §9 ask for.

use crate::gl;
use ngpu_core::format::{Format, FormatFeatureFlags, FeatureTable};

#[derive(Copy, Clone, Debug)]
pub struct GlFormatInfo {
    pub internal_fmt: gl::types::GLenum,
    pub upload_components: gl::types::GLenum,
    pub upload_ty: gl::types::GLenum,
}

pub fn gl_format_info(format: Format) -> GlFormatInfo {
    use Format::*;
    let (internal_fmt, upload_components, upload_ty) = match format {
        R8_UNORM => (gl::R8, gl::RED, gl::UNSIGNED_BYTE),
        R8_SNORM => (gl::R8_SNORM, gl::RED, gl::BYTE),
        R8_UINT => (gl::R8UI, gl::RED_INTEGER, gl::UNSIGNED_BYTE),
        R8_SINT => (gl::R8I, gl::RED_INTEGER, gl::BYTE),
        R8G8_UNORM => (gl::RG8, gl::RG, gl::UNSIGNED_BYTE),
        R8G8_SNORM => (gl::RG8_SNORM, gl::RG, gl::BYTE),
        R8G8_UINT => (gl::RG8UI, gl::RG_INTEGER, gl::UNSIGNED_BYTE),
        R8G8_SINT => (gl::RG8I, gl::RG_INTEGER, gl::BYTE),
        R8G8B8_UNORM => (gl::RGB8, gl::RGB, gl::UNSIGNED_BYTE),
        R8G8B8_SRGB => (gl::SRGB8, gl::RGB, gl::UNSIGNED_BYTE),
        R8G8B8A8_UNORM => (gl::RGBA8, gl::RGBA, gl::UNSIGNED_BYTE),
        R8G8B8A8_SNORM => (gl::RGBA8_SNORM, gl::RGBA, gl::BYTE),
        R8G8B8A8_UINT => (gl::RGBA8UI, gl::RGBA_INTEGER, gl::UNSIGNED_BYTE),
        R8G8B8A8_SINT => (gl::RGBA8I, gl::RGBA_INTEGER, gl::BYTE),
        R8G8B8A8_SRGB => (gl::SRGB8_ALPHA8, gl::RGBA, gl::UNSIGNED_BYTE),
        B8G8R8A8_UNORM => (gl::RGBA8, gl::BGRA, gl::UNSIGNED_BYTE),
        R16_UNORM => (gl::R16, gl::RED, gl::UNSIGNED_SHORT),
        R16_SNORM => (gl::R16_SNORM, gl::RED, gl::SHORT),
        R16_UINT => (gl::R16UI, gl::RED_INTEGER, gl::UNSIGNED_SHORT),
        R16_SINT => (gl::R16I, gl::RED_INTEGER, gl::SHORT),
        R16_SFLOAT => (gl::R16F, gl::RED, gl::HALF_FLOAT),
        R16G16_SFLOAT => (gl::RG16F, gl::RG, gl::HALF_FLOAT),
        R16G16B16A16_SFLOAT => (gl::RGBA16F, gl::RGBA, gl::HALF_FLOAT),
        R32_UINT => (gl::R32UI, gl::RED_INTEGER, gl::UNSIGNED_INT),
        R32_SINT => (gl::R32I, gl::RED_INTEGER, gl::INT),
        R32_SFLOAT => (gl::R32F, gl::RED, gl::FLOAT),
        R32G32_SFLOAT => (gl::RG32F, gl::RG, gl::FLOAT),
        R32G32B32_SFLOAT => (gl::RGB32F, gl::RGB, gl::FLOAT),
        R32G32B32A32_SFLOAT => (gl::RGBA32F, gl::RGBA, gl::FLOAT),
        D16_UNORM => (gl::DEPTH_COMPONENT16, gl::DEPTH_COMPONENT, gl::UNSIGNED_SHORT),
        D24_UNORM_S8_UINT => (gl::DEPTH24_STENCIL8, gl::DEPTH_STENCIL, gl::UNSIGNED_INT_24_8),
        D32_SFLOAT => (gl::DEPTH_COMPONENT32F, gl::DEPTH_COMPONENT, gl::FLOAT),
        D32_SFLOAT_S8_UINT => (gl::DEPTH32F_STENCIL8, gl::DEPTH_STENCIL, gl::FLOAT_32_UNSIGNED_INT_24_8_REV),
    };
    GlFormatInfo {
        internal_fmt,
        upload_components,
        upload_ty,
    }
}

/// Refines the baseline `FeatureTable` with GL extension/version-gated
/// upgrades, per spec.md §4.B "baseline + upgrade phase" and §9.
pub fn refine_feature_table(table: &mut FeatureTable, has_float_linear: bool, has_color_buffer_float: bool, has_texture_norm16: bool) {
    if has_float_linear {
        for &f in &[Format::R16_SFLOAT, Format::R16G16_SFLOAT, Format::R16G16B16A16_SFLOAT, Format::R32_SFLOAT, Format::R32G32_SFLOAT, Format::R32G32B32A32_SFLOAT] {
            table.upgrade(f, FormatFeatureFlags::LINEAR_FILTER);
        }
    }
    if has_color_buffer_float {
        for &f in &[Format::R16G16B16A16_SFLOAT, Format::R32_SFLOAT, Format::R32G32B32A32_SFLOAT] {
            table.upgrade(f, FormatFeatureFlags::COLOR_ATTACHMENT | FormatFeatureFlags::BLENDABLE);
        }
    }
    if has_texture_norm16 {
        for &f in &[Format::R16_UNORM, Format::R16_SNORM] {
            table.upgrade(f, FormatFeatureFlags::COLOR_ATTACHMENT | FormatFeatureFlags::LINEAR_FILTER);
        }
    }
}
