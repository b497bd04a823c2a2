//! The block layout engine (spec component A): std140/std430 field packing.

use crate::error::{Error, Result};

/// Marks a field as runtime-sized; legal only as the last field of a std430
/// storage block.
pub const VARIADIC: u32 = u32::max_value();

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum BlockLayout {
    Std140,
    Std430,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ScalarType {
    Bool,
    Int,
    UInt,
    Float,
}

impl ScalarType {
    fn natural_size(self) -> u32 {
        4
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum FieldType {
    Scalar(ScalarType),
    Vec2(ScalarType),
    Vec3(ScalarType),
    Vec4(ScalarType),
    Mat3,
    Mat4,
}

impl FieldType {
    /// Tightly-packed CPU size of one element (what a "field copy" reads
    /// from the source side), per-column for matrices.
    fn natural_size(self) -> u32 {
        match self {
            FieldType::Scalar(s) => s.natural_size(),
            FieldType::Vec2(s) => 2 * s.natural_size(),
            FieldType::Vec3(s) => 3 * s.natural_size(),
            FieldType::Vec4(s) => 4 * s.natural_size(),
            FieldType::Mat3 | FieldType::Mat4 => 16,
        }
    }

    /// Number of consecutive vec4-aligned columns this type spans (matrices
    /// only; everything else is one unit).
    fn column_count(self) -> u32 {
        match self {
            FieldType::Mat3 => 3,
            FieldType::Mat4 => 4,
            _ => 1,
        }
    }

    /// `(align, non_array_stride, array_stride)` per the table in spec.md §3.
    /// `non_array_stride` is the size of a lone (non-array) instance;
    /// `array_stride` is the per-element stride when this type appears in an
    /// array.
    fn align_and_strides(self, layout: BlockLayout) -> (u32, u32, u32) {
        match (self, layout) {
            (FieldType::Scalar(_), BlockLayout::Std140) => (4, 4, 16),
            (FieldType::Scalar(_), BlockLayout::Std430) => (4, 4, 4),
            (FieldType::Vec2(_), BlockLayout::Std140) => (8, 8, 16),
            (FieldType::Vec2(_), BlockLayout::Std430) => (8, 8, 8),
            (FieldType::Vec3(_), _) => (16, 16, 16),
            (FieldType::Vec4(_), _) => (16, 16, 16),
            // mat3/mat4 are stored as 3/4 vec4-aligned columns under both layouts.
            (FieldType::Mat3, _) => (16, 16 * 3, 16 * 3),
            (FieldType::Mat4, _) => (16, 16 * 4, 16 * 4),
        }
    }
}

fn align_up(offset: u32, align: u32) -> u32 {
    (offset + align - 1) / align * align
}

#[derive(Clone, Debug)]
pub struct BlockField {
    pub name: String,
    pub ty: FieldType,
    /// 0 means a scalar (non-array) field; [`VARIADIC`] means runtime-sized.
    pub count: u32,
    pub size: u32,
    pub stride: u32,
    pub offset: u32,
}

#[derive(Clone, Debug)]
pub struct BlockDesc {
    layout: BlockLayout,
    fields: Vec<BlockField>,
    total_size: u32,
}

impl BlockDesc {
    pub fn new(layout: BlockLayout) -> BlockDesc {
        BlockDesc {
            layout,
            fields: Vec::new(),
            total_size: 0,
        }
    }

    pub fn layout(&self) -> BlockLayout {
        self.layout
    }

    pub fn fields(&self) -> &[BlockField] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&BlockField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Appends one field, computing its `{size, stride, offset}` and
    /// advancing `total_size`. `count == 0` means scalar (non-array);
    /// `count == VARIADIC` is only legal as the last field of a std430 block.
    pub fn add_field(
        &mut self,
        name: impl Into<String>,
        ty: FieldType,
        count: u32,
    ) -> Result<()> {
        if count == VARIADIC && self.layout != BlockLayout::Std430 {
            return Err(Error::invalid_arg(
                "variadic fields are only legal in std430 storage blocks",
            ));
        }
        if let Some(last) = self.fields.last() {
            if last.count == VARIADIC {
                return Err(Error::invalid_arg(
                    "cannot append a field after a variadic field",
                ));
            }
        }

        let (natural_align, non_array_size, array_stride) = ty.align_and_strides(self.layout);
        let is_array = count > 0 && count != VARIADIC;

        // "array of T aligned to vec4" rule: any array field (std140) is
        // vec4-aligned regardless of element type.
        let align = if is_array && self.layout == BlockLayout::Std140 {
            16
        } else {
            natural_align
        };

        let offset = align_up(self.total_size, align);

        let (size, stride) = if count == VARIADIC {
            (0, array_stride)
        } else if is_array {
            (array_stride * count, array_stride)
        } else {
            (non_array_size, non_array_size)
        };

        self.total_size = offset + size;

        self.fields.push(BlockField {
            name: name.into(),
            ty,
            count,
            size,
            stride,
            offset,
        });

        Ok(())
    }

    /// Total byte size, accounting for a runtime element count if the block
    /// ends in a variadic field.
    pub fn size(&self, runtime_variadic_count: Option<u32>) -> u32 {
        match self.fields.last() {
            Some(last) if last.count == VARIADIC => {
                let n = runtime_variadic_count.unwrap_or(0);
                self.total_size + n * last.stride
            }
            _ => self.total_size,
        }
    }
}

/// Packs a tightly-packed CPU source array of `field.count` (or 1, for a
/// scalar field) elements of `field.ty`'s natural size into `dst`, which must
/// be at least `field.size` (or the runtime variadic size) bytes.
///
/// For `count == 0` or `stride == natural_size`, this is a single memcpy;
/// otherwise each element is copied individually with a per-element stride
/// advance.
pub fn block_field_copy(field: &BlockField, dst: &mut [u8], src: &[u8]) -> Result<()> {
    let natural_size = field.ty.natural_size() as usize;
    let stride = field.stride as usize;

    let element_count = if field.count == 0 {
        1
    } else if field.count == VARIADIC {
        if natural_size == 0 {
            0
        } else {
            src.len() / natural_size
        }
    } else {
        field.count as usize
    };

    if element_count == 0 {
        return Ok(());
    }

    if src.len() < element_count * natural_size {
        return Err(Error::invalid_arg("source buffer smaller than field requires"));
    }
    if dst.len() < element_count * stride {
        return Err(Error::invalid_arg("destination buffer smaller than field requires"));
    }

    if stride == natural_size {
        dst[..element_count * natural_size].copy_from_slice(&src[..element_count * natural_size]);
        return Ok(());
    }

    for i in 0..element_count {
        let src_off = i * natural_size;
        let dst_off = i * stride;
        dst[dst_off..dst_off + natural_size].copy_from_slice(&src[src_off..src_off + natural_size]);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::TryInto;
    use ScalarType::Float;

    #[test]
    fn std140_float_vec2_vec3_offsets() {
        let mut b = BlockDesc::new(BlockLayout::Std140);
        b.add_field("a", FieldType::Scalar(Float), 0).unwrap();
        b.add_field("b", FieldType::Vec2(Float), 0).unwrap();
        b.add_field("c", FieldType::Vec3(Float), 0).unwrap();
        assert_eq!(b.fields()[0].offset, 0);
        assert_eq!(b.fields()[1].offset, 8);
        assert_eq!(b.fields()[2].offset, 16);
        assert_eq!(b.size(None), 28);
    }

    #[test]
    fn std430_float_vec2_vec3_offsets() {
        let mut b = BlockDesc::new(BlockLayout::Std430);
        b.add_field("a", FieldType::Scalar(Float), 0).unwrap();
        b.add_field("b", FieldType::Vec2(Float), 0).unwrap();
        b.add_field("c", FieldType::Vec3(Float), 0).unwrap();
        assert_eq!(b.fields()[0].offset, 0);
        assert_eq!(b.fields()[1].offset, 8);
        assert_eq!(b.fields()[2].offset, 16);
        assert_eq!(b.size(None), 28);
    }

    #[test]
    fn std140_array_of_float_is_vec4_strided() {
        let mut b = BlockDesc::new(BlockLayout::Std140);
        b.add_field("a", FieldType::Scalar(Float), 5).unwrap();
        assert_eq!(b.fields()[0].stride, 16);
        assert_eq!(b.fields()[0].size, 80);
    }

    #[test]
    fn std140_three_floats_offsets_0_16_32() {
        let mut b = BlockDesc::new(BlockLayout::Std140);
        b.add_field("a", FieldType::Scalar(Float), 0).unwrap();
        b.add_field("b", FieldType::Scalar(Float), 0).unwrap();
        b.add_field("c", FieldType::Scalar(Float), 0).unwrap();
        assert_eq!(b.fields()[0].offset, 0);
        assert_eq!(b.fields()[1].offset, 16);
        assert_eq!(b.fields()[2].offset, 32);
    }

    #[test]
    fn std430_three_floats_offsets_0_4_8() {
        let mut b = BlockDesc::new(BlockLayout::Std430);
        b.add_field("a", FieldType::Scalar(Float), 0).unwrap();
        b.add_field("b", FieldType::Scalar(Float), 0).unwrap();
        b.add_field("c", FieldType::Scalar(Float), 0).unwrap();
        assert_eq!(b.fields()[0].offset, 0);
        assert_eq!(b.fields()[1].offset, 4);
        assert_eq!(b.fields()[2].offset, 8);
    }

    #[test]
    fn variadic_block_size() {
        let mut b = BlockDesc::new(BlockLayout::Std430);
        b.add_field("count", FieldType::Scalar(ScalarType::Int), 0).unwrap();
        b.add_field("data", FieldType::Vec4(Float), VARIADIC).unwrap();
        // align(4,16) + 7*16 = 128
        assert_eq!(b.size(Some(7)), 128);
    }

    #[test]
    fn field_copy_tight_and_strided() {
        let mut b = BlockDesc::new(BlockLayout::Std140);
        b.add_field("a", FieldType::Scalar(Float), 3).unwrap();
        let field = b.fields()[0].clone();
        let src: [f32; 3] = [1.0, 2.0, 3.0];
        let src_bytes =
            unsafe { std::slice::from_raw_parts(src.as_ptr() as *const u8, 12) };
        let mut dst = vec![0u8; field.size as usize];
        block_field_copy(&field, &mut dst, src_bytes).unwrap();
        for i in 0..3 {
            let off = i * field.stride as usize;
            let v = f32::from_ne_bytes(dst[off..off + 4].try_into().unwrap());
            assert_eq!(v, src[i]);
        }
    }
}
