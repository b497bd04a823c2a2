//! GLSL capability discovery and per-backend binding allocation. Grounded on
//! spec.md §4.J's "GLSL info discovery" list and on
//! `backend_gl/src/shader/mod.rs`'s `DescriptorMapBuilder` (four separate
//! `next_tex`/`next_img`/`next_ssbo`/`next_ubo` counters), generalized with a
//! Vulkan variant that shares one counter per spec.md §9.

use ngpu_core::descriptors::BindingSpace;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Backend {
    OpenGl,
    OpenGlEs,
    Vulkan,
}

/// Derived once per crafting session from the target backend/version.
#[derive(Copy, Clone, Debug)]
pub struct GlslInfo {
    pub backend: Backend,
    pub version: u32,
    pub version_suffix: &'static str,
    pub sym_vertex_index: &'static str,
    pub sym_instance_index: &'static str,
    pub has_in_out_layout_qualifiers: bool,
    pub has_precision_qualifiers: bool,
    pub has_explicit_bindings: bool,
}

impl GlslInfo {
    /// `version` is the GLSL (not GL) version number, e.g. `450` for GL 4.5,
    /// `320` for GLES 3.2.
    pub fn derive(backend: Backend, version: u32) -> GlslInfo {
        let is_gles = backend == Backend::OpenGlEs;
        let is_vulkan = backend == Backend::Vulkan;
        GlslInfo {
            backend,
            version,
            version_suffix: if is_gles { " es" } else { "" },
            sym_vertex_index: if is_vulkan { "gl_VertexIndex" } else { "gl_VertexID" },
            sym_instance_index: if is_vulkan { "gl_InstanceIndex" } else { "gl_InstanceID" },
            has_in_out_layout_qualifiers: is_vulkan || (is_gles && version >= 310) || (!is_gles && version >= 410),
            has_precision_qualifiers: is_gles,
            has_explicit_bindings: is_vulkan || (is_gles && version >= 310) || (!is_gles && version >= 420),
        }
    }
}

/// Per-backend binding-pool policy: GL keeps one counter per
/// [`BindingSpace`] so a uniform-buffer binding 0 and a texture binding 0
/// never collide; Vulkan shares a single counter across all four spaces
/// (spec.md §9 "binding-namespace divergence").
pub struct BindingAllocator {
    shared: bool,
    next_ubo: u32,
    next_ssbo: u32,
    next_tex: u32,
    next_img: u32,
    next_shared: u32,
}

impl BindingAllocator {
    pub fn new(info: &GlslInfo) -> BindingAllocator {
        BindingAllocator {
            shared: info.backend == Backend::Vulkan,
            next_ubo: 0,
            next_ssbo: 0,
            next_tex: 0,
            next_img: 0,
            next_shared: 0,
        }
    }

    pub fn next(&mut self, space: BindingSpace) -> u32 {
        if self.shared {
            let b = self.next_shared;
            self.next_shared += 1;
            return b;
        }
        let counter = match space {
            BindingSpace::UniformBuffer => &mut self.next_ubo,
            BindingSpace::StorageBuffer => &mut self.next_ssbo,
            BindingSpace::Texture => &mut self.next_tex,
            BindingSpace::Image => &mut self.next_img,
        };
        let b = *counter;
        *counter += 1;
        b
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gl_spaces_dont_collide() {
        let info = GlslInfo::derive(Backend::OpenGl, 450);
        let mut alloc = BindingAllocator::new(&info);
        assert_eq!(alloc.next(BindingSpace::UniformBuffer), 0);
        assert_eq!(alloc.next(BindingSpace::Texture), 0);
        assert_eq!(alloc.next(BindingSpace::UniformBuffer), 1);
    }

    #[test]
    fn vulkan_shares_one_counter() {
        let info = GlslInfo::derive(Backend::Vulkan, 450);
        let mut alloc = BindingAllocator::new(&info);
        assert_eq!(alloc.next(BindingSpace::UniformBuffer), 0);
        assert_eq!(alloc.next(BindingSpace::Texture), 1);
    }

    #[test]
    fn gles_310_has_explicit_bindings() {
        let info = GlslInfo::derive(Backend::OpenGlEs, 310);
        assert!(info.has_explicit_bindings);
        assert!(info.has_in_out_layout_qualifiers);
        assert!(info.has_precision_qualifiers);
    }
}
