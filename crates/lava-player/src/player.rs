//! Playback state machine.
//!
//! A [`Player`] owns one loaded asset (manifest + uploaded atlas textures),
//! the persistent composite surface, and the frame clock. The embedding
//! drives it with `advance(now)` from its presentation clock; everything
//! runs synchronously on that thread.

use lava_core::{FrameClock, LavaError, LavaResult, Tick};
use lava_manifest::Manifest;

use crate::backend::{RenderBackend, SurfaceId, TextureId};
use crate::compositor;
use crate::decoder;
use crate::loader::AssetFetcher;

/// Lifecycle state of a [`Player`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    /// No asset loaded (also the state after a failed load).
    Idle,
    /// A load is in progress.
    Loading,
    /// Asset loaded, frame 0 pending its first tick.
    Ready,
    Playing,
    Paused,
    /// Terminal; all resources released.
    Disposed,
}

/// The embedder-owned visible surface the player presents into.
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub surface: SurfaceId,
    pub width: u32,
    pub height: u32,
}

/// A fully loaded animation: validated manifest, one texture per atlas
/// image, and the composite surface. Immutable once created; released on
/// dispose or reload.
struct LoadedAsset {
    manifest: Manifest,
    textures: Vec<TextureId>,
    composite: SurfaceId,
}

/// Plays one Lava animation on a render backend.
pub struct Player<B: RenderBackend> {
    backend: B,
    state: PlayerState,
    asset: Option<LoadedAsset>,
    clock: Option<FrameClock>,
    frame_index: usize,
    viewport: Option<Viewport>,
}

impl<B: RenderBackend> Player<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            state: PlayerState::Idle,
            asset: None,
            clock: None,
            frame_index: 0,
            viewport: None,
        }
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    /// Current frame position. Meaningful only in `Ready`/`Playing`/`Paused`.
    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    /// Number of frames in the loaded animation, 0 when nothing is loaded.
    pub fn frame_count(&self) -> usize {
        self.asset
            .as_ref()
            .map(|a| a.manifest.frame_count())
            .unwrap_or(0)
    }

    /// The loaded manifest, if any.
    pub fn manifest(&self) -> Option<&Manifest> {
        self.asset.as_ref().map(|a| &a.manifest)
    }

    /// The composite surface holding the animation's current visible state.
    pub fn composite_surface(&self) -> Option<SurfaceId> {
        self.asset.as_ref().map(|a| a.composite)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Attach the visible surface to present into. The surface is created
    /// and owned by the embedding; the player never destroys it.
    pub fn attach_viewport(&mut self, viewport: Viewport) {
        self.viewport = Some(viewport);
    }

    /// Update the viewport dimensions after a host resize.
    pub fn resize_viewport(&mut self, width: u32, height: u32) {
        if let Some(viewport) = self.viewport.as_mut() {
            viewport.width = width;
            viewport.height = height;
        }
    }

    pub fn detach_viewport(&mut self) {
        self.viewport = None;
    }

    /// Load an animation, replacing any previously loaded one.
    ///
    /// Fetches and validates the manifest, then fetches, decodes, and
    /// uploads every atlas image, and allocates the composite surface. Any
    /// single failure aborts the whole load, releases everything created so
    /// far, and leaves the player `Idle` — no partial asset ever plays.
    pub fn load<F: AssetFetcher>(&mut self, fetcher: &F, locator: &str) -> LavaResult<()> {
        if self.state == PlayerState::Disposed {
            return Err(LavaError::asset("player has been disposed", locator));
        }

        self.release_asset();
        self.state = PlayerState::Loading;

        match self.load_asset(fetcher, locator) {
            Ok(asset) => {
                tracing::info!(
                    locator,
                    frames = asset.manifest.frame_count(),
                    images = asset.textures.len(),
                    "lava asset loaded"
                );
                self.clock = Some(FrameClock::new(asset.manifest.fps));
                self.frame_index = 0;
                self.asset = Some(asset);
                self.state = PlayerState::Ready;
                Ok(())
            }
            Err(e) => {
                self.state = PlayerState::Idle;
                Err(e)
            }
        }
    }

    fn load_asset<F: AssetFetcher>(
        &mut self,
        fetcher: &F,
        locator: &str,
    ) -> LavaResult<LoadedAsset> {
        let bytes = fetcher.fetch_manifest(locator)?;
        let manifest = Manifest::parse(&bytes)?;

        let mut textures = Vec::with_capacity(manifest.images.len());
        for entry in &manifest.images {
            let uploaded = fetcher.fetch_image(locator, &entry.url).and_then(|img| {
                if img.width == 0 || img.height == 0 {
                    return Err(LavaError::asset("atlas image has zero size", &entry.url));
                }
                self.backend.create_texture(&img)
            });
            match uploaded {
                Ok(texture) => textures.push(texture),
                Err(e) => {
                    for texture in textures {
                        self.backend.destroy_texture(texture);
                    }
                    return Err(e);
                }
            }
        }

        let composite = match self.backend.create_surface(manifest.width, manifest.height) {
            Ok(surface) => surface,
            Err(e) => {
                for texture in textures {
                    self.backend.destroy_texture(texture);
                }
                return Err(e);
            }
        };

        Ok(LoadedAsset {
            manifest,
            textures,
            composite,
        })
    }

    /// Start or resume playback. No-op when already playing or when no
    /// asset is loaded.
    pub fn play(&mut self) {
        match self.state {
            PlayerState::Ready | PlayerState::Paused => self.state = PlayerState::Playing,
            _ => tracing::debug!(state = ?self.state, "play ignored"),
        }
    }

    /// Pause playback, keeping the current frame displayed.
    pub fn pause(&mut self) {
        if self.state == PlayerState::Playing {
            self.state = PlayerState::Paused;
        }
    }

    /// Release the asset and composite surface. Terminal; every later call
    /// on this player is a no-op (loads fail).
    pub fn dispose(&mut self) {
        if self.state == PlayerState::Disposed {
            return;
        }
        self.release_asset();
        self.state = PlayerState::Disposed;
    }

    /// Process one presentation-clock tick at monotonic time `now_ms`.
    ///
    /// Only acts while `Playing`. Decoding is gated to the manifest's frame
    /// rate by the frame clock — the first qualifying tick renders frame 0
    /// without advancing, later ones advance exactly one frame — but the
    /// composite is presented into the attached viewport on every tick, so
    /// host-driven resizes repaint without a dirty flag.
    pub fn advance(&mut self, now_ms: f64) {
        if self.state != PlayerState::Playing {
            return;
        }
        let (Some(asset), Some(clock)) = (self.asset.as_ref(), self.clock.as_mut()) else {
            return;
        };

        match clock.tick(now_ms) {
            Tick::Hold => {}
            Tick::Start => {
                decoder::apply_frame(
                    &mut self.backend,
                    &asset.manifest,
                    &asset.textures,
                    asset.composite,
                    self.frame_index,
                );
            }
            Tick::Step => {
                self.frame_index = (self.frame_index + 1) % asset.manifest.frame_count();
                tracing::trace!(frame = self.frame_index, "frame advanced");
                decoder::apply_frame(
                    &mut self.backend,
                    &asset.manifest,
                    &asset.textures,
                    asset.composite,
                    self.frame_index,
                );
            }
        }

        if let Some(viewport) = self.viewport {
            let scale = compositor::aspect_fit(
                asset.manifest.width,
                asset.manifest.height,
                viewport.width,
                viewport.height,
            );
            self.backend
                .present_scaled(asset.composite, viewport.surface, scale);
        }
    }

    fn release_asset(&mut self) {
        if let Some(asset) = self.asset.take() {
            for texture in asset.textures {
                self.backend.destroy_texture(texture);
            }
            self.backend.destroy_surface(asset.composite);
        }
        self.clock = None;
        self.frame_index = 0;
    }
}
