//! Tile-based atmospheric gas simulation engine: per-tile gas mixtures,
//! Monstermos pressure equalization, explosive depressurization, Linda
//! sharing, excited groups, fire/hotspots, and solid-body superconduction,
//! exposed as a safe Rust API plus a C ABI facade for foreign hosts.

pub mod constants;
pub mod depressurize;
pub mod equalize;
pub mod error;
pub mod excited;
pub mod ffi;
pub mod flags;
pub mod grid;
pub mod hotspot;
pub mod reactions;
pub mod share;
pub mod simd;
pub mod superconduct;
pub mod tile;

pub use constants::{config_init_default, AtmosConfig, AtmosConstants};
pub use flags::TileFlags;
pub use grid::{AtmosResult, GridState};
pub use tile::Tile;
