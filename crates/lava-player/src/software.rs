//! Software render backend.
//!
//! A pure-CPU implementation of [`RenderBackend`] over [`PixelSurface`]
//! buffers. Deterministic across platforms, so it backs the test suite and
//! the CLI frame dumper; embeddings without a GPU can present from it
//! directly.

use lava_core::{LavaResult, PixelRect, PixelSurface};

use crate::backend::{RenderBackend, SurfaceId, TextureId};

/// CPU blit backend. Textures and surfaces live in freed-slot vectors so
/// handles stay stable across destroys.
#[derive(Debug, Default)]
pub struct SoftwareBackend {
    textures: Vec<Option<PixelSurface>>,
    surfaces: Vec<Option<PixelSurface>>,
}

impl SoftwareBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read access to a surface's pixels, e.g. for encoding a decoded frame
    /// to an image file.
    pub fn surface(&self, surface: SurfaceId) -> Option<&PixelSurface> {
        self.surfaces.get(surface.0).and_then(|s| s.as_ref())
    }

    /// Read access to an uploaded texture's pixels.
    pub fn texture(&self, texture: TextureId) -> Option<&PixelSurface> {
        self.textures.get(texture.0).and_then(|t| t.as_ref())
    }
}

impl RenderBackend for SoftwareBackend {
    fn create_texture(&mut self, image: &PixelSurface) -> LavaResult<TextureId> {
        self.textures.push(Some(image.clone()));
        Ok(TextureId(self.textures.len() - 1))
    }

    fn create_surface(&mut self, width: u32, height: u32) -> LavaResult<SurfaceId> {
        self.surfaces.push(Some(PixelSurface::new(width, height)));
        Ok(SurfaceId(self.surfaces.len() - 1))
    }

    fn texture_size(&self, texture: TextureId) -> (u32, u32) {
        match self.texture(texture) {
            Some(t) => (t.width, t.height),
            None => (0, 0),
        }
    }

    fn copy_region(
        &mut self,
        src: TextureId,
        src_rect: PixelRect,
        dst: SurfaceId,
        dst_x: u32,
        dst_y: u32,
    ) {
        let Some(src_pixels) = self.textures.get(src.0).and_then(|t| t.clone()) else {
            return;
        };
        if let Some(Some(dst_pixels)) = self.surfaces.get_mut(dst.0) {
            dst_pixels.copy_region(&src_pixels, src_rect, dst_x, dst_y);
        }
    }

    fn present_scaled(&mut self, src: SurfaceId, dst: SurfaceId, scale: (f32, f32)) {
        // Source and destination both live in `surfaces`; snapshot the source
        // so the destination can be written in place.
        let Some(src_pixels) = self.surfaces.get(src.0).and_then(|s| s.clone()) else {
            return;
        };
        let Some(Some(dst_pixels)) = self.surfaces.get_mut(dst.0) else {
            return;
        };

        dst_pixels.fill([0, 0, 0, 0]);

        let target_w = (dst_pixels.width as f32 * scale.0).round() as u32;
        let target_h = (dst_pixels.height as f32 * scale.1).round() as u32;
        if target_w == 0 || target_h == 0 {
            return;
        }
        let x0 = (dst_pixels.width - target_w.min(dst_pixels.width)) / 2;
        let y0 = (dst_pixels.height - target_h.min(dst_pixels.height)) / 2;

        // Nearest sampling over the full source extent.
        for y in 0..target_h.min(dst_pixels.height) {
            let sy = ((y as f32 + 0.5) / target_h as f32 * src_pixels.height as f32) as u32;
            let sy = sy.min(src_pixels.height - 1);
            for x in 0..target_w.min(dst_pixels.width) {
                let sx = ((x as f32 + 0.5) / target_w as f32 * src_pixels.width as f32) as u32;
                let sx = sx.min(src_pixels.width - 1);
                if let Some(pixel) = src_pixels.get_pixel(sx, sy) {
                    dst_pixels.set_pixel(x0 + x, y0 + y, pixel);
                }
            }
        }
    }

    fn destroy_texture(&mut self, texture: TextureId) {
        if let Some(slot) = self.textures.get_mut(texture.0) {
            *slot = None;
        }
    }

    fn destroy_surface(&mut self, surface: SurfaceId) {
        if let Some(slot) = self.surfaces.get_mut(surface.0) {
            *slot = None;
        }
    }
}
