//! Tile-patch frame decoder.
//!
//! Advances the persistent composite surface by one frame. Key frames
//! replace the whole canvas from one atlas image; diff frames apply sparse
//! tile-region copies on top of whatever the composite already holds. Image
//! indices are validated at manifest load, so decoding is infallible; tile
//! indices are unvalidated by the format and handled by clipping.

use lava_core::{tile, PixelRect};
use lava_manifest::{Frame, Manifest};

use crate::backend::{RenderBackend, SurfaceId, TextureId};

/// Apply frame `frame_index` of `manifest` to the composite surface.
///
/// `textures` holds one backend texture per manifest image entry, in order.
pub fn apply_frame<B: RenderBackend>(
    backend: &mut B,
    manifest: &Manifest,
    textures: &[TextureId],
    composite: SurfaceId,
    frame_index: usize,
) {
    match &manifest.frames[frame_index] {
        Frame::Key { image_index } => {
            let texture = textures[*image_index as usize];
            let (image_w, image_h) = backend.texture_size(texture);
            let rect = PixelRect::new(
                0,
                0,
                image_w.min(manifest.width),
                image_h.min(manifest.height),
            );
            backend.copy_region(texture, rect, composite, 0, 0);
        }
        Frame::Diff { diffs } => {
            let cell = manifest.cell_size;
            let dst_tiles_per_row = tile::tiles_per_row(manifest.width, cell);

            for patch in diffs {
                let texture = textures[patch.src_image as usize];
                let (image_w, image_h) = backend.texture_size(texture);
                let src_tiles_per_row = tile::tiles_per_row(image_w, cell);

                let (src_x, src_y) = tile::tile_origin(patch.src_tile, src_tiles_per_row, cell);
                let (dst_x, dst_y) = tile::tile_origin(patch.dst_tile, dst_tiles_per_row, cell);

                // Clip to both the source image and the canvas; a patch that
                // lands entirely outside either grid degenerates to nothing.
                let copy_w = patch
                    .count_x
                    .saturating_mul(cell)
                    .min(image_w.saturating_sub(src_x))
                    .min(manifest.width.saturating_sub(dst_x));
                let copy_h = patch
                    .count_y
                    .saturating_mul(cell)
                    .min(image_h.saturating_sub(src_y))
                    .min(manifest.height.saturating_sub(dst_y));
                if copy_w == 0 || copy_h == 0 {
                    continue;
                }

                backend.copy_region(
                    texture,
                    PixelRect::new(src_x, src_y, copy_w, copy_h),
                    composite,
                    dst_x,
                    dst_y,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::software::SoftwareBackend;
    use lava_core::PixelSurface;
    use lava_manifest::{ImageEntry, Patch, Version};

    fn solid(width: u32, height: u32, rgba: [u8; 4]) -> PixelSurface {
        let mut s = PixelSurface::new(width, height);
        s.fill(rgba);
        s
    }

    fn manifest(frames: Vec<Frame>) -> Manifest {
        Manifest {
            version: Version::V1,
            fps: 10,
            cell_size: 16,
            diff_image_size: 512,
            width: 32,
            height: 32,
            density: 1.0,
            alpha: true,
            images: vec![
                ImageEntry { url: "a.png".into() },
                ImageEntry { url: "b.png".into() },
            ],
            frames,
        }
    }

    fn patch(src_image: u32, src_tile: u32, count_x: u32, count_y: u32, dst_tile: u32) -> Patch {
        Patch {
            src_image,
            src_tile,
            count_x,
            count_y,
            dst_tile,
        }
    }

    /// Backend with a red 32x32 atlas, a green 32x32 atlas, and a 32x32
    /// composite surface.
    fn setup() -> (SoftwareBackend, Vec<TextureId>, SurfaceId) {
        let mut backend = SoftwareBackend::new();
        let red = backend
            .create_texture(&solid(32, 32, [255, 0, 0, 255]))
            .unwrap();
        let green = backend
            .create_texture(&solid(32, 32, [0, 255, 0, 255]))
            .unwrap();
        let composite = backend.create_surface(32, 32).unwrap();
        (backend, vec![red, green], composite)
    }

    #[test]
    fn test_key_frame_replaces_whole_canvas() {
        let (mut backend, textures, composite) = setup();
        let manifest = manifest(vec![Frame::Key { image_index: 1 }]);
        apply_frame(&mut backend, &manifest, &textures, composite, 0);
        let pixels = backend.surface(composite).unwrap();
        assert_eq!(pixels.get_pixel(0, 0), Some([0, 255, 0, 255]));
        assert_eq!(pixels.get_pixel(31, 31), Some([0, 255, 0, 255]));
    }

    #[test]
    fn test_key_frame_is_idempotent() {
        let (mut backend, textures, composite) = setup();
        let manifest = manifest(vec![
            Frame::Key { image_index: 0 },
            Frame::Key { image_index: 1 },
        ]);
        apply_frame(&mut backend, &manifest, &textures, composite, 0);
        apply_frame(&mut backend, &manifest, &textures, composite, 1);
        let once = backend.surface(composite).unwrap().clone();
        apply_frame(&mut backend, &manifest, &textures, composite, 1);
        assert_eq!(backend.surface(composite).unwrap(), &once);
    }

    #[test]
    fn test_key_frame_clips_oversized_image() {
        let mut backend = SoftwareBackend::new();
        let big = backend
            .create_texture(&solid(64, 64, [255, 0, 0, 255]))
            .unwrap();
        let composite = backend.create_surface(32, 32).unwrap();
        let manifest = manifest(vec![Frame::Key { image_index: 0 }]);
        apply_frame(&mut backend, &manifest, &[big, big], composite, 0);
        let pixels = backend.surface(composite).unwrap();
        assert_eq!(pixels.width, 32);
        assert_eq!(pixels.get_pixel(31, 31), Some([255, 0, 0, 255]));
    }

    #[test]
    fn test_diff_patches_only_target_tiles() {
        let (mut backend, textures, composite) = setup();
        let manifest = manifest(vec![
            Frame::Key { image_index: 0 },
            Frame::Diff {
                diffs: vec![patch(1, 0, 1, 1, 0)],
            },
        ]);
        apply_frame(&mut backend, &manifest, &textures, composite, 0);
        apply_frame(&mut backend, &manifest, &textures, composite, 1);
        let pixels = backend.surface(composite).unwrap();
        // Patched top-left tile comes from the green atlas.
        assert_eq!(pixels.get_pixel(0, 0), Some([0, 255, 0, 255]));
        assert_eq!(pixels.get_pixel(15, 15), Some([0, 255, 0, 255]));
        // Everything outside the 16x16 tile keeps the key frame's pixels.
        assert_eq!(pixels.get_pixel(16, 0), Some([255, 0, 0, 255]));
        assert_eq!(pixels.get_pixel(0, 16), Some([255, 0, 0, 255]));
        assert_eq!(pixels.get_pixel(31, 31), Some([255, 0, 0, 255]));
    }

    #[test]
    fn test_disjoint_patches_commute() {
        let (mut backend, textures, composite) = setup();
        let forward = manifest(vec![
            Frame::Key { image_index: 0 },
            Frame::Diff {
                diffs: vec![patch(1, 0, 1, 1, 0), patch(1, 1, 1, 1, 3)],
            },
        ]);
        let reversed = manifest(vec![
            Frame::Key { image_index: 0 },
            Frame::Diff {
                diffs: vec![patch(1, 1, 1, 1, 3), patch(1, 0, 1, 1, 0)],
            },
        ]);

        apply_frame(&mut backend, &forward, &textures, composite, 0);
        apply_frame(&mut backend, &forward, &textures, composite, 1);
        let a = backend.surface(composite).unwrap().clone();

        apply_frame(&mut backend, &reversed, &textures, composite, 0);
        apply_frame(&mut backend, &reversed, &textures, composite, 1);
        let b = backend.surface(composite).unwrap().clone();

        assert_eq!(a, b);
    }

    #[test]
    fn test_overlapping_patches_later_wins() {
        let mut backend = SoftwareBackend::new();
        let red = backend
            .create_texture(&solid(32, 32, [255, 0, 0, 255]))
            .unwrap();
        let green = backend
            .create_texture(&solid(32, 32, [0, 255, 0, 255]))
            .unwrap();
        let composite = backend.create_surface(32, 32).unwrap();
        let manifest = manifest(vec![Frame::Diff {
            // Both patches target tile 0; the green one is listed last.
            diffs: vec![patch(0, 0, 1, 1, 0), patch(1, 0, 1, 1, 0)],
        }]);
        apply_frame(&mut backend, &manifest, &[red, green], composite, 0);
        let pixels = backend.surface(composite).unwrap();
        assert_eq!(pixels.get_pixel(0, 0), Some([0, 255, 0, 255]));
    }

    #[test]
    fn test_oversized_patch_is_clipped_to_canvas() {
        let (mut backend, textures, composite) = setup();
        let manifest = manifest(vec![Frame::Diff {
            // 10 tiles wide from tile 1 of a 2-tile-wide canvas row.
            diffs: vec![patch(1, 0, 10, 10, 1)],
        }]);
        apply_frame(&mut backend, &manifest, &textures, composite, 0);
        let pixels = backend.surface(composite).unwrap();
        // Only the right half of the first tile row can receive pixels.
        assert_eq!(pixels.get_pixel(16, 0), Some([0, 255, 0, 255]));
        assert_eq!(pixels.get_pixel(31, 31), Some([0, 255, 0, 255]));
        assert_eq!(pixels.get_pixel(15, 0), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_out_of_grid_tile_indices_are_skipped() {
        let (mut backend, textures, composite) = setup();
        let before = backend.surface(composite).unwrap().clone();
        let manifest = manifest(vec![Frame::Diff {
            // Destination tile 99 is far below a 2x2 tile canvas.
            diffs: vec![patch(1, 0, 1, 1, 99)],
        }]);
        apply_frame(&mut backend, &manifest, &textures, composite, 0);
        assert_eq!(backend.surface(composite).unwrap(), &before);
    }

    #[test]
    fn test_empty_diff_frame_is_noop() {
        let (mut backend, textures, composite) = setup();
        let manifest = manifest(vec![
            Frame::Key { image_index: 0 },
            Frame::Diff { diffs: vec![] },
        ]);
        apply_frame(&mut backend, &manifest, &textures, composite, 0);
        let before = backend.surface(composite).unwrap().clone();
        apply_frame(&mut backend, &manifest, &textures, composite, 1);
        assert_eq!(backend.surface(composite).unwrap(), &before);
    }
}
