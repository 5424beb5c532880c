//! Render backend abstraction.
//!
//! The decode core issues four kinds of pixel operations: upload an atlas
//! image, allocate a persistent surface, copy a region between them, and
//! present a surface scaled into another. Each platform target implements
//! these once; handles are opaque indices minted by the backend.

use lava_core::{LavaResult, PixelRect, PixelSurface};

/// Handle to an immutable atlas texture owned by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub usize);

/// Handle to a mutable surface owned by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub usize);

/// Pixel operations required by the decode core and the compositor.
///
/// Copy rectangles handed to [`copy_region`](RenderBackend::copy_region) are
/// pre-clipped by the caller to both source and destination bounds, so
/// implementations may issue them directly to the platform copy primitive.
pub trait RenderBackend {
    /// Upload a decoded RGBA8 image as an immutable texture.
    fn create_texture(&mut self, image: &PixelSurface) -> LavaResult<TextureId>;

    /// Allocate a persistent mutable surface, cleared to transparent black.
    fn create_surface(&mut self, width: u32, height: u32) -> LavaResult<SurfaceId>;

    /// Pixel dimensions of a previously created texture.
    fn texture_size(&self, texture: TextureId) -> (u32, u32);

    /// Copy `src_rect` of a texture into `dst` at (`dst_x`, `dst_y`),
    /// verbatim — no blending, no resampling.
    fn copy_region(
        &mut self,
        src: TextureId,
        src_rect: PixelRect,
        dst: SurfaceId,
        dst_x: u32,
        dst_y: u32,
    );

    /// Draw all of `src`, uniformly scaled about center by `scale`, into
    /// `dst`. The area outside the scaled quad is cleared.
    fn present_scaled(&mut self, src: SurfaceId, dst: SurfaceId, scale: (f32, f32));

    /// Release a texture. The handle must not be used afterwards.
    fn destroy_texture(&mut self, texture: TextureId);

    /// Release a surface. The handle must not be used afterwards.
    fn destroy_surface(&mut self, surface: SurfaceId);
}
