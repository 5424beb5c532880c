use crate::manifest::{Frame, Manifest};
use lava_core::LavaError;

/// Validate a decoded manifest for structural correctness.
///
/// Every frame's image references are bounds-checked here, which is what lets
/// the frame decoder index images without any runtime checks. Collects all
/// violations rather than stopping at the first, for diagnostics.
pub fn validate_manifest(manifest: &Manifest) -> Result<(), Vec<LavaError>> {
    let mut errors = Vec::new();

    if manifest.fps == 0 {
        errors.push(LavaError::manifest("fps must be positive"));
    }

    if manifest.cell_size == 0 {
        errors.push(LavaError::manifest("cellSize must be positive"));
    }

    if manifest.width == 0 || manifest.height == 0 {
        errors.push(LavaError::manifest("canvas dimensions must be non-zero"));
    }

    if manifest.frames.is_empty() {
        errors.push(LavaError::manifest("manifest must have at least one frame"));
    }

    let image_count = manifest.images.len();
    for (frame_index, frame) in manifest.frames.iter().enumerate() {
        match frame {
            Frame::Key { image_index } => {
                if *image_index as usize >= image_count {
                    errors.push(LavaError::manifest(format!(
                        "frame {}: key image index {} out of bounds ({} images)",
                        frame_index, image_index, image_count
                    )));
                }
            }
            Frame::Diff { diffs } => {
                for (patch_index, patch) in diffs.iter().enumerate() {
                    if patch.src_image as usize >= image_count {
                        errors.push(LavaError::manifest(format!(
                            "frame {} patch {}: source image index {} out of bounds ({} images)",
                            frame_index, patch_index, patch.src_image, image_count
                        )));
                    }
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
