//! Pixel-format translation table (spec §4.8 "Probing: format ... table").
//!
//! A fixed, large lookup from the engine's backend-neutral [`PixelFormat`]
//! to a concrete `wgpu::TextureFormat`. Kept as a single table rather than a
//! `match` spread across call sites so every backend consults the same
//! mapping.

use super::PixelFormat;

/// Maps a [`PixelFormat`] to the `wgpu::TextureFormat` the real backend
/// allocates textures with.
#[must_use]
pub fn to_wgpu(format: PixelFormat) -> wgpu::TextureFormat {
    match format {
        PixelFormat::R8Unorm => wgpu::TextureFormat::R8Unorm,
        PixelFormat::Rg8Unorm => wgpu::TextureFormat::Rg8Unorm,
        PixelFormat::Rgba8Unorm => wgpu::TextureFormat::Rgba8Unorm,
        PixelFormat::Rgba8UnormSrgb => wgpu::TextureFormat::Rgba8UnormSrgb,
        PixelFormat::Rgba32Float => wgpu::TextureFormat::Rgba32Float,
        PixelFormat::Depth24Stencil8 => wgpu::TextureFormat::Depth24PlusStencil8,
        PixelFormat::Depth32Float => wgpu::TextureFormat::Depth32Float,
    }
}

/// Bytes per texel for the fast-path CPU-side upload of a [`PixelFormat`]
/// (spec §4.7 media upload, "per-pixel-format fast paths").
#[must_use]
pub fn bytes_per_texel(format: PixelFormat) -> u32 {
    match format {
        PixelFormat::R8Unorm => 1,
        PixelFormat::Rg8Unorm => 2,
        PixelFormat::Rgba8Unorm | PixelFormat::Rgba8UnormSrgb => 4,
        PixelFormat::Rgba32Float => 16,
        PixelFormat::Depth24Stencil8 => 4,
        PixelFormat::Depth32Float => 4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgba8_is_four_bytes() {
        assert_eq!(bytes_per_texel(PixelFormat::Rgba8Unorm), 4);
    }
}
