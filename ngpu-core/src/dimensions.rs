//! Texture dimension/mip helpers, generalized from `renderer/src/image.rs`'s
//! `Dimensions`/`MipmapsCount` (the arena-bound `create_texture_mip_map`
//! dependency is dropped; this is pure arithmetic).

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Dimensions {
    Dim1d { width: u32 },
    Dim1dArray { width: u32, array_layers: u32 },
    Dim2d { width: u32, height: u32 },
    Dim2dArray { width: u32, height: u32, array_layers: u32 },
    Dim3d { width: u32, height: u32, depth: u32 },
    Cubemap { size: u32 },
    CubemapArray { size: u32, array_layers: u32 },
}

impl Dimensions {
    pub fn width(&self) -> u32 {
        match *self {
            Dimensions::Dim1d { width }
            | Dimensions::Dim1dArray { width, .. }
            | Dimensions::Dim2d { width, .. }
            | Dimensions::Dim2dArray { width, .. }
            | Dimensions::Dim3d { width, .. } => width,
            Dimensions::Cubemap { size } | Dimensions::CubemapArray { size, .. } => size,
        }
    }

    pub fn height(&self) -> u32 {
        match *self {
            Dimensions::Dim2d { height, .. }
            | Dimensions::Dim2dArray { height, .. }
            | Dimensions::Dim3d { height, .. } => height,
            Dimensions::Cubemap { size } | Dimensions::CubemapArray { size, .. } => size,
            Dimensions::Dim1d { .. } | Dimensions::Dim1dArray { .. } => 1,
        }
    }

    pub fn depth(&self) -> u32 {
        match *self {
            Dimensions::Dim3d { depth, .. } => depth,
            _ => 1,
        }
    }

    pub fn array_layers(&self) -> u32 {
        match *self {
            Dimensions::Dim1dArray { array_layers, .. }
            | Dimensions::Dim2dArray { array_layers, .. }
            | Dimensions::CubemapArray { array_layers, .. } => array_layers,
            _ => 1,
        }
    }

    /// Layer count including the implicit 6 faces of a cubemap.
    pub fn array_layers_with_cube(&self) -> u32 {
        match *self {
            Dimensions::Cubemap { .. } => 6,
            Dimensions::CubemapArray { array_layers, .. } => 6 * array_layers,
            _ => self.array_layers(),
        }
    }

    pub fn is_cube(&self) -> bool {
        matches!(self, Dimensions::Cubemap { .. } | Dimensions::CubemapArray { .. })
    }
}

impl From<(u32, u32)> for Dimensions {
    fn from((width, height): (u32, u32)) -> Dimensions {
        Dimensions::Dim2d { width, height }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum MipmapsCount {
    Log2,
    One,
    Specific(u32),
}

/// `1 + floor(log2(max(w,h)))`, per spec.md §4.C "mipmap level count".
pub fn mip_map_count(dims: Dimensions) -> u32 {
    let longest = dims.width().max(dims.height()).max(1);
    1 + (31 - longest.leading_zeros())
}

pub fn resolve_mip_count(count: MipmapsCount, dims: Dimensions) -> u32 {
    match count {
        MipmapsCount::Log2 => mip_map_count(dims),
        MipmapsCount::One => 1,
        MipmapsCount::Specific(n) => n.max(1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mip_count_power_of_two() {
        let d = Dimensions::Dim2d { width: 256, height: 128 };
        assert_eq!(mip_map_count(d), 9);
    }

    #[test]
    fn mip_count_one_for_1x1() {
        let d = Dimensions::Dim2d { width: 1, height: 1 };
        assert_eq!(mip_map_count(d), 1);
    }

    #[test]
    fn cube_array_layer_count_multiplies_by_six() {
        let d = Dimensions::CubemapArray { size: 32, array_layers: 3 };
        assert_eq!(d.array_layers_with_cube(), 18);
    }
}
