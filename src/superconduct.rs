//! Component F: superconduction, solid-body heat flow through walls and
//! radiative loss to vacuum, for tiles above a high-temperature threshold.
//!
//! Grounded on `original_source/src/superconductivity.cpp` in full.
//! Two deliberate deviations from the literal source are recorded in
//! DESIGN.md: an added immutability guard in the both-solid sub-case
//! (divergence #3), and the gas/solid sub-case's coefficient, which
//! follows the literal source (the neighbor's own `thermal_conductivity`)
//! rather than the spec prose's `window_heat_transfer_coefficient`
//! (divergence #4). `radiate_to_space`'s missing division by heat
//! capacity is preserved as written (divergence #5).

use crate::constants::*;
use crate::flags::TileFlags;
use crate::share::temperature_share_solid;
use crate::tile::{heat_capacity, Tile};

fn mutable(tile: &Tile) -> bool {
	!tile.flags.contains(TileFlags::IMMUTABLE)
}

/// `consider(tile, starting)`: eligibility gate plus idempotent list
/// tracking. Returns `true` when the tile is newly tracked and the caller
/// should append it to the superconduct list.
pub fn consider_superconductivity(
	tile: &mut Tile,
	starting: bool,
	config_enabled: bool,
	constants: &AtmosConstants,
) -> bool {
	if !config_enabled {
		return false;
	}
	if tile.thermal_conductivity == 0.0 {
		return false;
	}
	let min_temp = if starting {
		constants.minimum_temperature_start_super_conduction
	} else {
		constants.minimum_temperature_for_superconduction
	};
	if tile.temperature < min_temp {
		return false;
	}
	let hc = heat_capacity(&tile.moles, &DEFAULT_SPECIFIC_HEATS, tile.flags.contains(TileFlags::SPACE));
	if hc < constants.mcell_with_ratio {
		return false;
	}
	if tile.flags.contains(TileFlags::SUPERCONDUCT) {
		return false;
	}
	tile.flags |= TileFlags::SUPERCONDUCT;
	true
}

/// `neighbor_conduct_with_source`: four sub-cases keyed on whether each
/// side currently holds gas. `tile_idx` is the neighbor being conducted
/// into; `source_idx` is the tile superconduction is running for. Returns
/// `true` if `tile_idx` (the neighbor) should be activated.
fn neighbor_conduct_with_source(
	tiles: &mut [Tile],
	tile_idx: usize,
	source_idx: usize,
	constants: &AtmosConstants,
) -> bool {
	let tile_has_air = mutable(&tiles[tile_idx]) && tiles[tile_idx].total_moles() > 0.0;
	let other_has_air = mutable(&tiles[source_idx]) && tiles[source_idx].total_moles() > 0.0;

	if !tile_has_air {
		if other_has_air {
			let k = tiles[tile_idx].thermal_conductivity;
			let (temp, hc) = (tiles[tile_idx].temperature, tiles[tile_idx].heat_capacity);
			let (left, right) = split_pair(tiles, source_idx, tile_idx);
			let new_temp = temperature_share_solid(left, k, temp, hc, &DEFAULT_SPECIFIC_HEATS, constants);
			right.temperature = new_temp;
		} else {
			let delta_t = tiles[tile_idx].temperature_archived - tiles[source_idx].temperature_archived;
			let tile_hc = tiles[tile_idx].heat_capacity;
			let other_hc = tiles[source_idx].heat_capacity;
			if delta_t.abs() > constants.minimum_temperature_delta_to_consider && tile_hc != 0.0 && other_hc != 0.0 {
				let k = tiles[tile_idx].thermal_conductivity;
				let heat = k * delta_t * (tile_hc * other_hc / (tile_hc + other_hc));
				if mutable(&tiles[tile_idx]) {
					tiles[tile_idx].temperature -= heat / tile_hc;
				}
				if mutable(&tiles[source_idx]) {
					tiles[source_idx].temperature += heat / other_hc;
				}
			}
		}
		return false;
	}

	if other_has_air {
		let (left, right) = split_pair(tiles, source_idx, tile_idx);
		crate::share::temperature_share(left, right, constants.window_heat_transfer_coefficient, &DEFAULT_SPECIFIC_HEATS, constants);
	} else {
		let k = tiles[source_idx].thermal_conductivity;
		let (temp, hc) = (tiles[source_idx].temperature, tiles[source_idx].heat_capacity);
		let new_temp = temperature_share_solid(&mut tiles[tile_idx], k, temp, hc, &DEFAULT_SPECIFIC_HEATS, constants);
		tiles[source_idx].temperature = new_temp;
	}
	true
}

fn split_pair(tiles: &mut [Tile], a: usize, b: usize) -> (&mut Tile, &mut Tile) {
	assert_ne!(a, b);
	if a < b {
		let (left, right) = tiles.split_at_mut(b);
		(&mut left[a], &mut right[0])
	} else {
		let (left, right) = tiles.split_at_mut(a);
		(&mut right[0], &mut left[b])
	}
}

/// `superconduct(tile)` per cycle: conducts into every valid neighbor with
/// nonzero thermal conductivity, archiving it first if stale, then
/// radiates to space and finishes. Returns neighbor indices that should be
/// activated and, separately, those newly eligible for the superconduct
/// list via `consider_superconductivity(starting=false)`.
pub struct SuperconductOutcome {
	pub activate: Vec<usize>,
	pub newly_tracked: Vec<usize>,
	pub still_superconducting: bool,
}

pub fn superconduct(
	tiles: &mut [Tile],
	idx: usize,
	update_counter: u64,
	config_enabled: bool,
	constants: &AtmosConstants,
) -> SuperconductOutcome {
	let mut activate = Vec::new();
	let mut newly_tracked = Vec::new();

	for dir in 0..DIRECTIONS {
		if tiles[idx].adjacent_bits & (1 << dir) == 0 {
			continue;
		}
		let adj = tiles[idx].adjacent_indices[dir];
		if adj < 0 || adj as usize >= tiles.len() {
			continue;
		}
		let adj = adj as usize;
		if tiles[adj].thermal_conductivity == 0.0 {
			continue;
		}
		if tiles[adj].last_cycle < update_counter {
			tiles[adj].archive();
			tiles[adj].last_cycle = update_counter;
		}
		if neighbor_conduct_with_source(tiles, adj, idx, constants) {
			activate.push(adj);
		}
		if consider_superconductivity(&mut tiles[adj], false, config_enabled, constants) {
			newly_tracked.push(adj);
		}
	}

	radiate_to_space(&mut tiles[idx], constants);
	let final_temp = tiles[idx].temperature;
	let still_superconducting = finish_superconductivity(&mut tiles[idx], final_temp, constants);

	SuperconductOutcome { activate, newly_tracked, still_superconducting }
}

/// `radiate_to_space(tile)`: loses heat to a virtual vacuum at TCMB. The
/// missing division by heat capacity below is intentional — see
/// DESIGN.md divergence #5.
pub fn radiate_to_space(tile: &mut Tile, constants: &AtmosConstants) {
	if tile.temperature <= constants.t0c {
		return;
	}
	let delta_t = tile.temperature_archived - constants.tcmb;
	if tile.heat_capacity > 0.0 && delta_t.abs() > constants.minimum_temperature_delta_to_consider {
		let heat = tile.thermal_conductivity
			* delta_t
			* (tile.heat_capacity * constants.heat_capacity_vacuum
				/ (tile.heat_capacity + constants.heat_capacity_vacuum));
		if mutable(tile) {
			tile.temperature -= heat;
			tile.temperature = tile.temperature.max(constants.tcmb);
		}
	}
}

/// `finish(tile, T)`: if the tile holds gas and is mutable, one final
/// solid-solid share against itself; clears SUPERCONDUCT (reporting
/// `false`) if `T` has fallen below the continuation threshold.
fn finish_superconductivity(tile: &mut Tile, temperature: f32, constants: &AtmosConstants) -> bool {
	if tile.total_moles() > 0.0 && mutable(tile) {
		let k = tile.thermal_conductivity;
		let (temp, hc) = (tile.temperature, tile.heat_capacity);
		tile.temperature = temperature_share_solid(tile, k, temp, hc, &DEFAULT_SPECIFIC_HEATS, constants);
	}
	if temperature < constants.minimum_temperature_for_superconduction {
		tile.flags.remove(TileFlags::SUPERCONDUCT);
		false
	} else {
		true
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn radiate_to_space_cools_towards_tcmb() {
		let constants = AtmosConstants::default();
		let mut tile = Tile::default();
		tile.temperature = 1000.0;
		tile.temperature_archived = 1000.0;
		tile.heat_capacity = 10000.0;
		tile.thermal_conductivity = 0.5;
		radiate_to_space(&mut tile, &constants);
		assert!(tile.temperature < 1000.0);
		assert!(tile.temperature >= constants.tcmb);
	}

	#[test]
	fn radiate_to_space_skips_immutable_tiles() {
		let constants = AtmosConstants::default();
		let mut tile = Tile::default();
		tile.temperature = 1000.0;
		tile.temperature_archived = 1000.0;
		tile.heat_capacity = 10000.0;
		tile.thermal_conductivity = 0.5;
		tile.flags |= TileFlags::IMMUTABLE;
		radiate_to_space(&mut tile, &constants);
		assert_eq!(tile.temperature, 1000.0);
	}

	#[test]
	fn consider_superconductivity_is_idempotent() {
		let constants = AtmosConstants::default();
		let mut tile = Tile::default();
		tile.thermal_conductivity = 0.5;
		tile.heat_capacity = 100_000.0;
		tile.temperature = constants.minimum_temperature_start_super_conduction + 10.0;
		assert!(consider_superconductivity(&mut tile, true, true, &constants));
		assert!(!consider_superconductivity(&mut tile, true, true, &constants));
	}
}
