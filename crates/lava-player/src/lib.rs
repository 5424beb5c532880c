//! # lava-player
//!
//! The Lava playback engine. Owns the decode core (tile-patch frames applied
//! to a persistent composite surface), the playback state machine driven by an
//! external presentation clock, and the aspect-fit presentation step. All
//! pixel operations go through the [`backend::RenderBackend`] trait, so the
//! decode logic is written once and runs unchanged over the software blitter
//! and the wgpu backend.

pub mod backend;
pub mod compositor;
pub mod decoder;
pub mod gpu;
pub mod loader;
pub mod player;
pub mod software;

pub use backend::{RenderBackend, SurfaceId, TextureId};
pub use gpu::{GpuContext, WgpuBackend};
pub use loader::{AssetFetcher, FsFetcher, MemoryFetcher};
pub use player::{Player, PlayerState, Viewport};
pub use software::SoftwareBackend;
