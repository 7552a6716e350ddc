//! Tile flag bitset, mirroring `atmos_types.h`'s `TILE_FLAG_*` constants.

use bitflags::bitflags;

bitflags! {
	/// Flag-as-set-membership: each list-membership flag below must be set
	/// iff the tile's index is present exactly once in the matching
	/// `GridState` list (invariants #3-#5 in the spec).
	#[derive(Default)]
	pub struct TileFlags: u32 {
		/// Vacuum; the only mass sink in the system.
		const SPACE = 1 << 0;
		/// Present in the active-tile list.
		const EXCITED = 1 << 1;
		/// Present in the hotspot list.
		const HOTSPOT = 1 << 2;
		/// Host-controlled; never mutated by the engine.
		const IMMUTABLE = 1 << 3;
		/// Host hint: tile participates in the host's map-level atmos view.
		const MAP_ATMOS = 1 << 4;
		/// Present in the superconduct list.
		const SUPERCONDUCT = 1 << 5;
		/// Scratch bit used within a single cycle pass to mark visited tiles.
		const PROCESSED = 1 << 6;
	}
}
