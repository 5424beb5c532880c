//! # lava-core
//!
//! Core types and primitives for the Lava animation engine.
//! This crate contains the foundational pieces shared across all Lava crates:
//! the error type, the pixel surface, tile-grid geometry, and the frame clock.

pub mod error;
pub mod surface;
pub mod tile;
pub mod time;

pub use error::{LavaError, LavaResult};
pub use surface::PixelSurface;
pub use tile::{tile_origin, tiles_per_row, PixelRect};
pub use time::{FrameClock, Tick};
