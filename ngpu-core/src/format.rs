//! The format registry (spec component B). A single static table keyed by
//! [`Format`], refined at device-init time by OR-ing in extension-gated
//! feature bits, matching the "immutable baseline + upgrade phase" shape
//! design notes call for.

use bitflags::bitflags;

bitflags! {
    pub struct FormatFeatureFlags: u32 {
        const SAMPLED               = 0b0000_0001;
        const LINEAR_FILTER         = 0b0000_0010;
        const COLOR_ATTACHMENT      = 0b0000_0100;
        const BLENDABLE             = 0b0000_1000;
        const DEPTH_STENCIL_ATTACHMENT = 0b0001_0000;
        const STORAGE               = 0b0010_0000;
        const VERTEX_ATTRIBUTE       = 0b0100_0000;
    }
}

/// Scalar component kind carried by a format, used by the block layout
/// engine and the vertex-attribute type mapping to pick natural sizes.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ComponentType {
    UNorm,
    SNorm,
    UInt,
    SInt,
    SFloat,
    Srgb,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
#[allow(non_camel_case_types)]
pub enum Format {
    R8_UNORM,
    R8_SNORM,
    R8_UINT,
    R8_SINT,
    R8G8_UNORM,
    R8G8_SNORM,
    R8G8_UINT,
    R8G8_SINT,
    R8G8B8_UNORM,
    R8G8B8_SRGB,
    R8G8B8A8_UNORM,
    R8G8B8A8_SNORM,
    R8G8B8A8_UINT,
    R8G8B8A8_SINT,
    R8G8B8A8_SRGB,
    B8G8R8A8_UNORM,
    R16_UNORM,
    R16_SNORM,
    R16_UINT,
    R16_SINT,
    R16_SFLOAT,
    R16G16_SFLOAT,
    R16G16B16A16_SFLOAT,
    R32_UINT,
    R32_SINT,
    R32_SFLOAT,
    R32G32_SFLOAT,
    R32G32B32_SFLOAT,
    R32G32B32A32_SFLOAT,
    D16_UNORM,
    D24_UNORM_S8_UINT,
    D32_SFLOAT,
    D32_SFLOAT_S8_UINT,
}

pub struct FormatInfo {
    pub nb_comp: u8,
    pub bytes_per_pixel: u8,
    pub component_type: ComponentType,
    baseline: FormatFeatureFlags,
}

impl FormatInfo {
    pub const fn new(
        nb_comp: u8,
        bytes_per_pixel: u8,
        component_type: ComponentType,
        baseline: FormatFeatureFlags,
    ) -> FormatInfo {
        FormatInfo {
            nb_comp,
            bytes_per_pixel,
            component_type,
            baseline,
        }
    }
}

macro_rules! fmt_row {
    ($comp:expr, $bpp:expr, $ty:expr, $($feat:ident)|+) => {
        FormatInfo::new($comp, $bpp, $ty, $(FormatFeatureFlags::$feat)|+)
    };
}

fn info(format: Format) -> FormatInfo {
    use ComponentType::*;
    use Format::*;
    match format {
        R8_UNORM => fmt_row!(1, 1, UNorm, SAMPLED | LINEAR_FILTER | COLOR_ATTACHMENT | BLENDABLE | VERTEX_ATTRIBUTE),
        R8_SNORM => fmt_row!(1, 1, SNorm, SAMPLED | LINEAR_FILTER | VERTEX_ATTRIBUTE),
        R8_UINT => fmt_row!(1, 1, UInt, SAMPLED | COLOR_ATTACHMENT | VERTEX_ATTRIBUTE),
        R8_SINT => fmt_row!(1, 1, SInt, SAMPLED | COLOR_ATTACHMENT | VERTEX_ATTRIBUTE),
        R8G8_UNORM => fmt_row!(2, 2, UNorm, SAMPLED | LINEAR_FILTER | COLOR_ATTACHMENT | BLENDABLE | VERTEX_ATTRIBUTE),
        R8G8_SNORM => fmt_row!(2, 2, SNorm, SAMPLED | LINEAR_FILTER | VERTEX_ATTRIBUTE),
        R8G8_UINT => fmt_row!(2, 2, UInt, SAMPLED | COLOR_ATTACHMENT | VERTEX_ATTRIBUTE),
        R8G8_SINT => fmt_row!(2, 2, SInt, SAMPLED | COLOR_ATTACHMENT | VERTEX_ATTRIBUTE),
        R8G8B8_UNORM => fmt_row!(3, 3, UNorm, SAMPLED | LINEAR_FILTER | VERTEX_ATTRIBUTE),
        R8G8B8_SRGB => fmt_row!(3, 3, Srgb, SAMPLED | LINEAR_FILTER),
        R8G8B8A8_UNORM => fmt_row!(4, 4, UNorm, SAMPLED | LINEAR_FILTER | COLOR_ATTACHMENT | BLENDABLE | STORAGE | VERTEX_ATTRIBUTE),
        R8G8B8A8_SNORM => fmt_row!(4, 4, SNorm, SAMPLED | LINEAR_FILTER | VERTEX_ATTRIBUTE),
        R8G8B8A8_UINT => fmt_row!(4, 4, UInt, SAMPLED | COLOR_ATTACHMENT | VERTEX_ATTRIBUTE),
        R8G8B8A8_SINT => fmt_row!(4, 4, SInt, SAMPLED | COLOR_ATTACHMENT | VERTEX_ATTRIBUTE),
        R8G8B8A8_SRGB => fmt_row!(4, 4, Srgb, SAMPLED | LINEAR_FILTER | COLOR_ATTACHMENT | BLENDABLE),
        B8G8R8A8_UNORM => fmt_row!(4, 4, UNorm, SAMPLED | LINEAR_FILTER | COLOR_ATTACHMENT | BLENDABLE),
        R16_UNORM => fmt_row!(1, 2, UNorm, SAMPLED | VERTEX_ATTRIBUTE),
        R16_SNORM => fmt_row!(1, 2, SNorm, SAMPLED | VERTEX_ATTRIBUTE),
        R16_UINT => fmt_row!(1, 2, UInt, SAMPLED | VERTEX_ATTRIBUTE),
        R16_SINT => fmt_row!(1, 2, SInt, SAMPLED | VERTEX_ATTRIBUTE),
        R16_SFLOAT => fmt_row!(1, 2, SFloat, SAMPLED | VERTEX_ATTRIBUTE),
        R16G16_SFLOAT => fmt_row!(2, 4, SFloat, SAMPLED | COLOR_ATTACHMENT | VERTEX_ATTRIBUTE),
        R16G16B16A16_SFLOAT => fmt_row!(4, 8, SFloat, SAMPLED | COLOR_ATTACHMENT | STORAGE | VERTEX_ATTRIBUTE),
        R32_UINT => fmt_row!(1, 4, UInt, SAMPLED | COLOR_ATTACHMENT | STORAGE | VERTEX_ATTRIBUTE),
        R32_SINT => fmt_row!(1, 4, SInt, SAMPLED | COLOR_ATTACHMENT | STORAGE | VERTEX_ATTRIBUTE),
        R32_SFLOAT => fmt_row!(1, 4, SFloat, SAMPLED | COLOR_ATTACHMENT | STORAGE | VERTEX_ATTRIBUTE),
        R32G32_SFLOAT => fmt_row!(2, 8, SFloat, SAMPLED | COLOR_ATTACHMENT | VERTEX_ATTRIBUTE),
        R32G32B32_SFLOAT => fmt_row!(3, 12, SFloat, VERTEX_ATTRIBUTE),
        R32G32B32A32_SFLOAT => fmt_row!(4, 16, SFloat, SAMPLED | COLOR_ATTACHMENT | STORAGE | VERTEX_ATTRIBUTE),
        D16_UNORM => fmt_row!(1, 2, UNorm, DEPTH_STENCIL_ATTACHMENT),
        D24_UNORM_S8_UINT => fmt_row!(2, 4, UNorm, DEPTH_STENCIL_ATTACHMENT),
        D32_SFLOAT => fmt_row!(1, 4, SFloat, DEPTH_STENCIL_ATTACHMENT),
        D32_SFLOAT_S8_UINT => fmt_row!(2, 8, SFloat, DEPTH_STENCIL_ATTACHMENT),
    }
}

pub fn format_nb_comp(format: Format) -> u8 {
    info(format).nb_comp
}

pub fn format_bytes_per_pixel(format: Format) -> u8 {
    info(format).bytes_per_pixel
}

/// Baseline feature mask, before any device-specific upgrade pass runs.
pub fn format_features(format: Format) -> FormatFeatureFlags {
    info(format).baseline
}

pub fn format_component_type(format: Format) -> ComponentType {
    info(format).component_type
}

pub fn is_depth_or_stencil(format: Format) -> bool {
    info(format)
        .baseline
        .contains(FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT)
}

/// Per-device refined feature table. Backends build one of these at init
/// time by starting from the baseline and OR-ing in bits gated on detected
/// extensions (e.g. `FLOAT_LINEAR`, `COLOR_BUFFER_FLOAT`), then consult it
/// instead of the static baseline for the rest of the context's lifetime.
#[derive(Clone)]
pub struct FeatureTable {
    refined: std::collections::HashMap<Format, FormatFeatureFlags>,
}

impl FeatureTable {
    /// Builds a table seeded with every format's static baseline.
    pub fn from_baseline() -> FeatureTable {
        let mut refined = std::collections::HashMap::new();
        for &format in ALL_FORMATS {
            refined.insert(format, format_features(format));
        }
        FeatureTable { refined }
    }

    /// Upgrade pass: OR additional bits into a format's entry. Called once
    /// per detected extension during device init.
    pub fn upgrade(&mut self, format: Format, extra: FormatFeatureFlags) {
        let entry = self.refined.entry(format).or_insert_with(|| format_features(format));
        *entry |= extra;
    }

    pub fn features(&self, format: Format) -> FormatFeatureFlags {
        self.refined
            .get(&format)
            .copied()
            .unwrap_or_else(|| format_features(format))
    }
}

pub const ALL_FORMATS: &[Format] = &[
    Format::R8_UNORM,
    Format::R8_SNORM,
    Format::R8_UINT,
    Format::R8_SINT,
    Format::R8G8_UNORM,
    Format::R8G8_SNORM,
    Format::R8G8_UINT,
    Format::R8G8_SINT,
    Format::R8G8B8_UNORM,
    Format::R8G8B8_SRGB,
    Format::R8G8B8A8_UNORM,
    Format::R8G8B8A8_SNORM,
    Format::R8G8B8A8_UINT,
    Format::R8G8B8A8_SINT,
    Format::R8G8B8A8_SRGB,
    Format::B8G8R8A8_UNORM,
    Format::R16_UNORM,
    Format::R16_SNORM,
    Format::R16_UINT,
    Format::R16_SINT,
    Format::R16_SFLOAT,
    Format::R16G16_SFLOAT,
    Format::R16G16B16A16_SFLOAT,
    Format::R32_UINT,
    Format::R32_SINT,
    Format::R32_SFLOAT,
    Format::R32G32_SFLOAT,
    Format::R32G32B32_SFLOAT,
    Format::R32G32B32A32_SFLOAT,
    Format::D16_UNORM,
    Format::D24_UNORM_S8_UINT,
    Format::D32_SFLOAT,
    Format::D32_SFLOAT_S8_UINT,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgba8_has_expected_shape() {
        assert_eq!(format_nb_comp(Format::R8G8B8A8_UNORM), 4);
        assert_eq!(format_bytes_per_pixel(Format::R8G8B8A8_UNORM), 4);
        assert!(format_features(Format::R8G8B8A8_UNORM).contains(FormatFeatureFlags::SAMPLED));
    }

    #[test]
    fn depth_formats_flagged() {
        assert!(is_depth_or_stencil(Format::D24_UNORM_S8_UINT));
        assert!(!is_depth_or_stencil(Format::R8G8B8A8_UNORM));
    }

    #[test]
    fn upgrade_pass_ors_bits_without_losing_baseline() {
        let mut table = FeatureTable::from_baseline();
        let before = table.features(Format::R32_SFLOAT);
        assert!(!before.contains(FormatFeatureFlags::LINEAR_FILTER));
        table.upgrade(Format::R32_SFLOAT, FormatFeatureFlags::LINEAR_FILTER);
        let after = table.features(Format::R32_SFLOAT);
        assert!(after.contains(FormatFeatureFlags::LINEAR_FILTER));
        assert!(after.contains(FormatFeatureFlags::SAMPLED));
    }
}
