use serde::{Deserialize, Serialize};

use lava_core::{LavaError, LavaResult};

/// Lava format version. Exactly one version exists today.
///
/// The wire encoding differs between producers: some emit the integer `1`,
/// others the string `"v1"`. Both decode to [`Version::V1`]; anything else is
/// rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    V1,
}

impl Serialize for Version {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Version::V1 => serializer.serialize_u32(1),
        }
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct VersionVisitor;

        impl serde::de::Visitor<'_> for VersionVisitor {
            type Value = Version;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "a Lava format version (1 or \"v1\")")
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<Version, E> {
                match v {
                    1 => Ok(Version::V1),
                    other => Err(E::custom(format!("unsupported format version {other}"))),
                }
            }

            fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<Version, E> {
                u64::try_from(v)
                    .map_err(|_| E::custom(format!("unsupported format version {v}")))
                    .and_then(|v| self.visit_u64(v))
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Version, E> {
                match v {
                    "v1" | "1" => Ok(Version::V1),
                    other => Err(E::custom(format!("unsupported format version \"{other}\""))),
                }
            }
        }

        deserializer.deserialize_any(VersionVisitor)
    }
}

/// One atlas image resource, addressed by index from frames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageEntry {
    /// Locator of the image, resolved by the asset fetcher (a file name or
    /// URL relative to the animation's root).
    pub url: String,
}

/// One diff entry: a rectangular tile-region copy from an atlas image into
/// the composite canvas.
///
/// Wire format is a 5-integer array:
/// `[srcImage, srcTile, countX, countY, dstTile]`. Tile indices address the
/// source image's own tile grid and the canvas grid respectively, which can
/// have different row widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[u32; 5]", into = "[u32; 5]")]
pub struct Patch {
    /// Index into `images` of the source atlas.
    pub src_image: u32,
    /// Top-left tile of the source region, in the source image's grid.
    pub src_tile: u32,
    /// Region width in tiles.
    pub count_x: u32,
    /// Region height in tiles.
    pub count_y: u32,
    /// Top-left tile of the destination region, in the canvas grid.
    pub dst_tile: u32,
}

impl From<[u32; 5]> for Patch {
    fn from(raw: [u32; 5]) -> Self {
        Self {
            src_image: raw[0],
            src_tile: raw[1],
            count_x: raw[2],
            count_y: raw[3],
            dst_tile: raw[4],
        }
    }
}

impl From<Patch> for [u32; 5] {
    fn from(patch: Patch) -> Self {
        [
            patch.src_image,
            patch.src_tile,
            patch.count_x,
            patch.count_y,
            patch.dst_tile,
        ]
    }
}

/// One frame of the animation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Frame {
    /// Full-canvas replacement from one atlas image — the stream's
    /// resynchronization point.
    #[serde(rename_all = "camelCase")]
    Key { image_index: u32 },
    /// Zero or more tile-region copies applied on top of the previous
    /// composite contents.
    Diff { diffs: Vec<Patch> },
}

/// Declarative description of a Lava animation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Format version.
    pub version: Version,
    /// Playback rate in frames per second.
    pub fps: u32,
    /// Tile edge length in pixels.
    pub cell_size: u32,
    /// Declared pixel size of diff source images (informational).
    pub diff_image_size: u32,
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Pixel scale factor of the authored content.
    pub density: f64,
    /// Whether the canvas carries transparency.
    pub alpha: bool,
    /// Atlas images, referenced by index.
    pub images: Vec<ImageEntry>,
    /// Ordered frame sequence.
    pub frames: Vec<Frame>,
}

impl Manifest {
    /// Decode and validate a manifest from JSON bytes.
    ///
    /// Schema errors and structural violations both surface as
    /// [`LavaError::InvalidManifest`]; a manifest that parses is safe to
    /// decode without any further per-frame bounds checks.
    pub fn parse(bytes: &[u8]) -> LavaResult<Manifest> {
        let manifest: Manifest =
            serde_json::from_slice(bytes).map_err(|e| LavaError::manifest(e.to_string()))?;
        crate::validate::validate_manifest(&manifest).map_err(|mut errors| errors.swap_remove(0))?;
        Ok(manifest)
    }

    /// Number of frames in the animation.
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}
