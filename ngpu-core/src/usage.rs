//! Usage-flag bitflags. Usage is the single source of truth for derived
//! barrier masks, mapping permissions, and (for textures) renderbuffer vs.
//! image realization — mirrors `renderer/src/image.rs`'s `ImageUsageFlags`
//! idiom, widened to the full set spec.md §3 names for both resource kinds.

use bitflags::bitflags;

bitflags! {
    pub struct BufferUsageFlags: u32 {
        const TRANSFER_SRC       = 0b0000_0000_0001;
        const TRANSFER_DST       = 0b0000_0000_0010;
        const UNIFORM            = 0b0000_0000_0100;
        const STORAGE            = 0b0000_0000_1000;
        const INDEX              = 0b0000_0001_0000;
        const VERTEX             = 0b0000_0010_0000;
        const DYNAMIC            = 0b0000_0100_0000;
        const MAP_READ           = 0b0000_1000_0000;
        const MAP_WRITE          = 0b0001_0000_0000;
        const MAP_PERSISTENT     = 0b0010_0000_0000;
    }
}

bitflags! {
    pub struct ImageUsageFlags: u32 {
        const TRANSFER_SRC          = 0b0000_0001;
        const TRANSFER_DST          = 0b0000_0010;
        const SAMPLED               = 0b0000_0100;
        const STORAGE               = 0b0000_1000;
        const COLOR_ATTACHMENT      = 0b0001_0000;
        const DEPTH_STENCIL_ATTACHMENT = 0b0010_0000;
        const TRANSIENT_ATTACHMENT  = 0b0100_0000;
    }
}

bitflags! {
    /// Barrier bits a resource's usage derives; bind-group binding issues
    /// the union of every write-accessed resource's mask both before and
    /// after the draw/dispatch that consumes it (spec.md §4.D/§5).
    pub struct MemoryBarrierFlags: u32 {
        const UNIFORM_BARRIER               = 0b0000_0000_0001;
        const STORAGE_BARRIER               = 0b0000_0000_0010;
        const VERTEX_ATTRIB_ARRAY_BARRIER   = 0b0000_0000_0100;
        const ELEMENT_ARRAY_BARRIER         = 0b0000_0000_1000;
        const CLIENT_MAPPED_BUFFER_BARRIER  = 0b0000_0001_0000;
        const BUFFER_UPDATE_BARRIER         = 0b0000_0010_0000;
        const FRAMEBUFFER_BARRIER           = 0b0000_0100_0000;
        const SHADER_IMAGE_ACCESS_BARRIER   = 0b0000_1000_0000;
        const TEXTURE_FETCH_BARRIER         = 0b0001_0000_0000;
    }
}

/// Derives a buffer's intrinsic barrier mask from its usage bits, per
/// spec.md §4.C step 3.
pub fn buffer_barrier_mask(usage: BufferUsageFlags) -> MemoryBarrierFlags {
    let mut mask = MemoryBarrierFlags::empty();
    if usage.contains(BufferUsageFlags::UNIFORM) {
        mask |= MemoryBarrierFlags::UNIFORM_BARRIER;
    }
    if usage.contains(BufferUsageFlags::STORAGE) {
        mask |= MemoryBarrierFlags::STORAGE_BARRIER;
    }
    if usage.contains(BufferUsageFlags::VERTEX) {
        mask |= MemoryBarrierFlags::VERTEX_ATTRIB_ARRAY_BARRIER;
    }
    if usage.contains(BufferUsageFlags::INDEX) {
        mask |= MemoryBarrierFlags::ELEMENT_ARRAY_BARRIER;
    }
    if usage.intersects(BufferUsageFlags::MAP_READ | BufferUsageFlags::MAP_WRITE | BufferUsageFlags::MAP_PERSISTENT) {
        mask |= MemoryBarrierFlags::CLIENT_MAPPED_BUFFER_BARRIER;
    }
    if usage.intersects(BufferUsageFlags::TRANSFER_SRC | BufferUsageFlags::TRANSFER_DST) {
        mask |= MemoryBarrierFlags::BUFFER_UPDATE_BARRIER;
    }
    mask
}

pub fn image_barrier_mask(usage: ImageUsageFlags) -> MemoryBarrierFlags {
    let mut mask = MemoryBarrierFlags::empty();
    if usage.contains(ImageUsageFlags::STORAGE) {
        mask |= MemoryBarrierFlags::SHADER_IMAGE_ACCESS_BARRIER;
    }
    if usage.contains(ImageUsageFlags::COLOR_ATTACHMENT)
        || usage.contains(ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT)
    {
        mask |= MemoryBarrierFlags::FRAMEBUFFER_BARRIER;
    }
    if usage.contains(ImageUsageFlags::SAMPLED) {
        mask |= MemoryBarrierFlags::TEXTURE_FETCH_BARRIER;
    }
    mask
}

/// Derives a buffer's mapping permission bits directly from `usage`: READ →
/// host-visible, WRITE → host-coherent, PERSISTENT → persistent+coherent
/// storage (spec.md §3 Buffer invariant).
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct MapPermissions {
    pub readable: bool,
    pub writable: bool,
    pub persistent: bool,
    pub coherent: bool,
}

pub fn map_permissions(usage: BufferUsageFlags) -> MapPermissions {
    let persistent = usage.contains(BufferUsageFlags::MAP_PERSISTENT);
    MapPermissions {
        readable: usage.contains(BufferUsageFlags::MAP_READ),
        writable: usage.contains(BufferUsageFlags::MAP_WRITE) || persistent,
        persistent,
        coherent: usage.contains(BufferUsageFlags::MAP_WRITE) || persistent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_barrier_union() {
        let mask = buffer_barrier_mask(BufferUsageFlags::UNIFORM | BufferUsageFlags::VERTEX);
        assert!(mask.contains(MemoryBarrierFlags::UNIFORM_BARRIER));
        assert!(mask.contains(MemoryBarrierFlags::VERTEX_ATTRIB_ARRAY_BARRIER));
        assert!(!mask.contains(MemoryBarrierFlags::STORAGE_BARRIER));
    }

    #[test]
    fn persistent_mapping_implies_coherent_and_writable() {
        let perms = map_permissions(BufferUsageFlags::MAP_PERSISTENT);
        assert!(perms.persistent);
        assert!(perms.coherent);
        assert!(perms.writable);
    }
}
