//! Component H: explosive depressurization. Triggered when Monstermos
//! equalization's zone flood-fill reaches a SPACE tile: the zone reachable
//! from `start` is rediscovered (interior tiles separated from the space
//! tiles bordering them), a wavefront is seeded at every space tile and
//! expanded inward, and the interior tiles vent in order from farthest to
//! nearest the breach.
//!
//! Grounded on `original_source/src/monstermos.cpp`'s
//! `explosive_depressurization` queue machinery (shared with
//! `equalize.rs`'s zone flood-fill) and `atmos_core.cpp`'s high-pressure
//! wind bookkeeping.

use crate::constants::{opposite_dir, AtmosConfig, DIRECTIONS};
use crate::flags::TileFlags;
use crate::grid::GridState;

struct Wavefront {
	index: usize,
	/// Direction this tile should vent along to move gas toward the space
	/// breach; `None` for the space tiles the wavefront was seeded from.
	parent_dir: Option<usize>,
	distance: u32,
}

/// `explosive_depressurize(tile)`: rediscovers the zone reachable from
/// `start` up to the hard tile limit, separating interior tiles from the
/// space tiles bordering them, then floods inward from every space tile so
/// each interior tile learns which direction points back toward the
/// breach, and finally vents every interior tile in farthest-first order.
pub fn explosive_depressurize(grid: &mut GridState, start: usize, config: &AtmosConfig) {
	if !config.spacing_enabled {
		return;
	}
	if grid.tiles[start].flags.contains(TileFlags::IMMUTABLE) {
		return;
	}

	let discover_cycle = grid.bump_equalization_cycle();
	let mut interior: Vec<usize> = Vec::new();
	let mut space_boundary: Vec<usize> = Vec::new();
	let mut frontier = vec![start];
	grid.tiles[start].last_queue_cycle = discover_cycle;
	if grid.tiles[start].flags.contains(TileFlags::SPACE) {
		space_boundary.push(start);
	} else {
		interior.push(start);
	}

	let mut i = 0;
	while i < frontier.len() {
		let cur = frontier[i];
		i += 1;
		if grid.tiles[cur].flags.contains(TileFlags::SPACE) {
			// Space tiles terminate the discovery BFS along that branch;
			// the inward wavefront (below) is what expands past them.
			continue;
		}
		if interior.len() >= config.constants.monstermos_hard_tile_limit {
			break;
		}
		for dir in 0..DIRECTIONS {
			let Some(n) = grid.valid_neighbor(cur, dir) else { continue };
			if grid.tiles[n].last_queue_cycle >= discover_cycle {
				continue;
			}
			grid.tiles[n].last_queue_cycle = discover_cycle;
			if grid.tiles[n].flags.contains(TileFlags::SPACE) {
				space_boundary.push(n);
				frontier.push(n);
				continue;
			}
			if grid.tiles[n].flags.contains(TileFlags::IMMUTABLE) {
				continue;
			}
			interior.push(n);
			frontier.push(n);
		}
	}

	if space_boundary.is_empty() {
		for &idx in &interior {
			grid.tiles[idx].last_queue_cycle = 0;
		}
		return;
	}

	let slow_cycle = grid.bump_equalization_cycle();
	let mut queue: Vec<Wavefront> = Vec::with_capacity(space_boundary.len());
	for &s in &space_boundary {
		grid.tiles[s].last_slow_queue_cycle = slow_cycle;
		queue.push(Wavefront { index: s, parent_dir: None, distance: 0 });
	}

	let mut i = 0;
	while i < queue.len() {
		let cur = queue[i].index;
		let dist = queue[i].distance;
		for dir in 0..DIRECTIONS {
			let Some(n) = grid.valid_neighbor(cur, dir) else { continue };
			if grid.tiles[n].last_slow_queue_cycle >= slow_cycle {
				continue;
			}
			// Only flood within the zone discovered above; `last_queue_cycle`
			// doubles as zone membership and was never reset for space tiles.
			let in_zone = grid.tiles[n].last_queue_cycle == discover_cycle
				&& !grid.tiles[n].flags.contains(TileFlags::SPACE);
			if !in_zone {
				continue;
			}
			grid.tiles[n].last_slow_queue_cycle = slow_cycle;
			// `dir` is the edge from `cur` to `n`; the direction that sends
			// gas back toward the breach is the opposite one.
			queue.push(Wavefront { index: n, parent_dir: Some(opposite_dir(dir)), distance: dist + 1 });
		}
		i += 1;
	}

	let mut order: Vec<usize> = (0..queue.len()).collect();
	order.sort_by(|&a, &b| queue[b].distance.cmp(&queue[a].distance));

	for qi in order {
		let idx = queue[qi].index;
		let Some(dir) = queue[qi].parent_dir else { continue };
		vent_tile(grid, idx, dir, config);
	}

	for &idx in &interior {
		grid.tiles[idx].last_queue_cycle = 0;
	}
}

/// Vents one tile's gas along `dir` (the direction that points back toward
/// the space breach it was reached from), subject to `spacing_min_gas`,
/// `spacing_max_wind` and `spacing_escape_ratio`. 70% of the vented gas is
/// transferred to the receiving tile unless that receiver is itself space,
/// in which case the full amount is lost to vacuum. Below 280K the cooling
/// factor is skipped — a relic of the original's fire-suppression tuning
/// rather than a physical cutoff.
fn vent_tile(grid: &mut GridState, idx: usize, dir: usize, config: &AtmosConfig) {
	let tile = &grid.tiles[idx];
	if tile.flags.contains(TileFlags::IMMUTABLE) {
		return;
	}
	let total = tile.total_moles();
	if total < config.spacing_min_gas {
		return;
	}

	let escape_amount = (total * config.spacing_escape_ratio).min(config.spacing_max_wind);
	if escape_amount <= 0.0 {
		return;
	}

	let ratio = (escape_amount / total).clamp(0.0, 1.0);
	let cooling_factor = if tile.temperature < 280.0 { 1.0 } else { 0.7 };

	let moved = grid.tiles[idx].remove_ratio(ratio, config.constants.gas_min_moles);
	let moved_total: f32 = moved[..crate::constants::GAS_COUNT].iter().sum();
	let transferred_total = moved_total * 0.7 * cooling_factor;
	let transfer_ratio = if moved_total > 0.0 { (transferred_total / moved_total).clamp(0.0, 1.0) } else { 0.0 };

	let giver_temp = grid.tiles[idx].temperature;
	if let Some(n) = grid.valid_neighbor(idx, dir) {
		let receiver_is_sink =
			grid.tiles[n].flags.contains(TileFlags::IMMUTABLE) || grid.tiles[n].flags.contains(TileFlags::SPACE);
		if !receiver_is_sink {
			let mut transferred = moved;
			for g in transferred.iter_mut() {
				*g *= transfer_ratio;
			}
			grid.tiles[n].blend_temperature(
				&transferred,
				giver_temp,
				&config.gas_specific_heats,
				config.constants.minimum_temperature_delta_to_consider,
				config.constants.minimum_heat_capacity,
			);
			for i in 0..crate::constants::GAS_ARRAY_SIZE {
				grid.tiles[n].moles[i] += transferred[i];
			}
		}
	}

	grid.consider_pressure_difference(idx, dir as i8, escape_amount);
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::constants::{AtmosConfig, OXYGEN};
	use crate::tile::Tile;

	#[test]
	fn venting_loses_all_gas_when_directly_bordering_space() {
		let mut grid = GridState::new(64);
		let mut interior = Tile::default();
		interior.moles[OXYGEN] = 1000.0;
		interior.temperature = 293.15;
		interior.archive();
		grid.add_tile(interior);

		let mut space = Tile::default();
		space.flags |= TileFlags::SPACE;
		grid.add_tile(space);

		grid.set_adjacency(0, crate::constants::DIR_EAST, 1);
		grid.set_adjacency(1, crate::constants::DIR_WEST, 0);

		let config = AtmosConfig::default();
		let before = grid.tiles[0].total_moles();
		explosive_depressurize(&mut grid, 0, &config);
		let after = grid.tiles[0].total_moles();
		assert!(after < before);
		assert!(grid.tiles[0].pressure_difference > 0.0);
	}

	#[test]
	fn venting_passes_most_gas_toward_the_breach_through_a_middle_tile() {
		let mut grid = GridState::new(64);
		for _ in 0..2 {
			let mut t = Tile::default();
			t.moles[OXYGEN] = 1000.0;
			t.temperature = 293.15;
			t.archive();
			grid.add_tile(t);
		}
		let mut space = Tile::default();
		space.flags |= TileFlags::SPACE;
		grid.add_tile(space);

		grid.set_adjacency(0, crate::constants::DIR_EAST, 1);
		grid.set_adjacency(1, crate::constants::DIR_WEST, 0);
		grid.set_adjacency(1, crate::constants::DIR_EAST, 2);
		grid.set_adjacency(2, crate::constants::DIR_WEST, 1);

		let config = AtmosConfig::default();
		let sum_before: f32 = grid.tiles.iter().map(|t| t.total_moles()).sum();
		explosive_depressurize(&mut grid, 0, &config);
		let sum_after: f32 = grid.tiles.iter().map(|t| t.total_moles()).sum();
		assert!(sum_after < sum_before);
		// Tile 0 (farthest from the breach) should have vented toward tile 1,
		// not away from it.
		assert!(grid.tiles[0].total_moles() < 1000.0);
	}

	#[test]
	fn depressurize_is_noop_with_no_space_boundary_reachable() {
		let mut grid = GridState::new(64);
		let mut tile = Tile::default();
		tile.moles[OXYGEN] = 1000.0;
		tile.flags |= TileFlags::IMMUTABLE;
		grid.add_tile(tile);
		let config = AtmosConfig::default();
		explosive_depressurize(&mut grid, 0, &config);
		assert_eq!(grid.tiles[0].total_moles(), 1000.0);
	}

	#[test]
	fn spacing_disabled_is_a_mass_noop() {
		let mut grid = GridState::new(64);
		let mut interior = Tile::default();
		interior.moles[OXYGEN] = 1000.0;
		interior.archive();
		grid.add_tile(interior);
		let mut space = Tile::default();
		space.flags |= TileFlags::SPACE;
		grid.add_tile(space);
		grid.set_adjacency(0, crate::constants::DIR_EAST, 1);
		grid.set_adjacency(1, crate::constants::DIR_WEST, 0);

		let mut config = AtmosConfig::default();
		config.spacing_enabled = false;
		explosive_depressurize(&mut grid, 0, &config);
		assert_eq!(grid.tiles[0].total_moles(), 1000.0);
	}
}
