//! Hardware-frame mappers: zero-copy binding of a platform decoder's native
//! surfaces (vaapi DMA-BUF, CoreVideo `CVPixelBuffer`) into ngpu textures,
//! so a decoded video frame never round-trips through a CPU upload
//! (spec.md §4.K).

pub mod image;

#[cfg(all(target_os = "linux", not(target_os = "android")))]
pub mod vaapi;

#[cfg(target_os = "ios")]
pub mod videotoolbox;

pub use crate::image::{wants_mipmaps, ImageLayout, ImageLayoutFlags, MappedImage, MapperParams};

#[cfg(all(target_os = "linux", not(target_os = "android")))]
pub use crate::vaapi::VaapiMapper;

#[cfg(target_os = "ios")]
pub use crate::videotoolbox::VideoToolboxMapper;
