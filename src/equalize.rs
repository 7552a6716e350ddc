//! Component G: Monstermos zone-scale pressure equalization. Flood-fills
//! a region of tiles whose archived mole counts diverge enough to be
//! worth moving in bulk, then redistributes by a fast sorted-giver/taker
//! pass or, for larger zones, a slower flood-propagated pass, before
//! finalizing the planned transfers against live tile state.
//!
//! Grounded on `original_source/src/monstermos.cpp` in full
//! (`equalize_pressure_in_zone`, `give_to_takers`, `take_from_givers`,
//! `finalize_eq`, `explosive_depressurization`'s queue machinery shared
//! with this file's BFS). `finalize_eq` here calls `Tile::blend_temperature`
//! rather than `Tile::merge` — see DESIGN.md divergence #6.

use std::collections::HashMap;

use float_ord::FloatOrd;

use crate::constants::{AtmosConfig, AtmosConstants, DIRECTIONS};
use crate::grid::{split_pair, GridState};
use crate::tile::Tile;

/// `compare_exchange(a, b)`: decides whether two neighboring tiles still
/// need to move gas between them.
///
/// Returns the index of the first species whose delta exceeds both
/// `minimum_moles_delta_to_move` and a fraction of `a`'s own moles
/// (`minimum_air_ratio_to_move`) — a species-level "yes, exchange". If no
/// species qualifies but the combined moles and temperature deltas both
/// clear their thresholds, returns `-1` ("exchange needed, bulk"). If
/// nothing clears any threshold, returns `-2` ("no exchange needed").
pub fn compare_exchange(a: &Tile, b: &Tile, constants: &AtmosConstants) -> i32 {
	for g in 0..crate::constants::GAS_COUNT {
		let delta = (a.moles[g] - b.moles[g]).abs();
		if delta > constants.minimum_moles_delta_to_move && delta > a.moles[g] * constants.minimum_air_ratio_to_move {
			return g as i32;
		}
	}
	let total_delta = (a.total_moles() - b.total_moles()).abs();
	let temp_delta = (a.temperature - b.temperature).abs();
	if total_delta > constants.minimum_moles_delta_to_move && temp_delta > constants.minimum_temperature_delta_to_suspend {
		-1
	} else {
		-2
	}
}

/// Records a planned transfer of `amount` moles from `src` to `dst` along
/// `dir`, to be realized later by `finalize_eq`.
fn adjust_eq_movement(tiles: &mut [Tile], src: usize, dst: usize, dir: usize, amount: f32) {
	tiles[src].transfer_directions[dir] += amount;
	tiles[dst].transfer_directions[crate::constants::opposite_dir(dir)] -= amount;
}

struct ZoneTile {
	index: usize,
	mole_delta: f32,
}

/// `equalize_pressure_in_zone(tile)`: the entry point run against an
/// active tile once its archived mole delta against some neighbor exceeds
/// threshold. Builds the zone by BFS up to `monstermos_tile_limit` tiles
/// (continuing to enqueue, but no longer accumulating, up to
/// `monstermos_hard_tile_limit`), bails into explosive depressurization
/// the moment a SPACE tile is found and spacing is enabled, then
/// redistributes and finalizes.
pub fn equalize_pressure_in_zone(grid: &mut GridState, start: usize, config: &AtmosConfig) {
	if grid.tiles[start].flags.contains(crate::flags::TileFlags::IMMUTABLE) {
		return;
	}
	if grid.tiles[start].last_queue_cycle >= grid.equalization_queue_cycle {
		return;
	}

	let start_moles = grid.tiles[start].total_moles_archived();
	let mut any_ready = false;
	for dir in 0..DIRECTIONS {
		if let Some(n) = grid.valid_neighbor(start, dir) {
			let delta = (start_moles - grid.tiles[n].total_moles_archived()).abs();
			if delta > config.constants.minimum_moles_delta_to_move {
				any_ready = true;
				break;
			}
		}
	}
	if !any_ready {
		return;
	}

	let cycle = grid.bump_equalization_cycle();
	let mut queue: Vec<ZoneTile> = vec![ZoneTile { index: start, mole_delta: 0.0 }];
	grid.tiles[start].last_queue_cycle = cycle;
	let mut total_moles = start_moles;
	let mut hit_space = false;
	let mut i = 0;
	while i < queue.len() {
		let idx = queue[i].index;
		if queue.len() >= config.constants.monstermos_hard_tile_limit {
			break;
		}
		for dir in 0..DIRECTIONS {
			let Some(n) = grid.valid_neighbor(idx, dir) else { continue };
			if grid.tiles[n].last_queue_cycle >= cycle {
				continue;
			}
			grid.tiles[n].last_queue_cycle = cycle;
			if grid.tiles[n].flags.contains(crate::flags::TileFlags::SPACE) {
				if config.spacing_enabled {
					hit_space = true;
				}
				continue;
			}
			if grid.tiles[n].flags.contains(crate::flags::TileFlags::IMMUTABLE) {
				continue;
			}
			if queue.len() < config.constants.monstermos_tile_limit {
				total_moles += grid.tiles[n].total_moles_archived();
			}
			queue.push(ZoneTile { index: n, mole_delta: 0.0 });
		}
		i += 1;
	}

	if hit_space {
		crate::depressurize::explosive_depressurize(grid, start, config);
		clear_queue_scratch(grid, &queue);
		return;
	}

	queue.truncate(config.constants.monstermos_tile_limit.max(1));
	let average = total_moles / queue.len() as f32;
	for zt in queue.iter_mut() {
		zt.mole_delta = grid.tiles[zt.index].total_moles_archived() - average;
	}

	let mut givers: Vec<usize> = (0..queue.len()).filter(|&i| queue[i].mole_delta > 0.0).collect();
	let mut takers: Vec<usize> = (0..queue.len()).filter(|&i| queue[i].mole_delta <= 0.0).collect();

	let pos_of: HashMap<usize, usize> = queue.iter().enumerate().map(|(i, z)| (z.index, i)).collect();
	for zt in &queue {
		grid.tiles[zt.index].fast_done = false;
	}

	let log_n = (queue.len() as f32).max(1.0).log2();
	let use_fast_path = givers.len() as f32 > log_n && takers.len() as f32 > log_n;

	if use_fast_path {
		fast_redistribute(grid, &mut queue, &pos_of, config);
		givers = (0..queue.len()).filter(|&i| queue[i].mole_delta > 0.0).collect();
		takers = (0..queue.len()).filter(|&i| queue[i].mole_delta <= 0.0).collect();
	}

	if givers.len() < takers.len() {
		for &gi in &givers {
			flood_transfer(grid, &mut queue, &pos_of, gi, true, config);
		}
	} else {
		for &ti in &takers {
			flood_transfer(grid, &mut queue, &pos_of, ti, false, config);
		}
	}

	let mut pressure_report = Vec::new();
	for zt in &queue {
		finalize_eq(grid, zt.index, config, &mut pressure_report);
	}
	for (idx, dir, amount) in pressure_report {
		grid.consider_pressure_difference(idx, dir, amount);
	}

	for zt in &queue {
		for dir in 0..DIRECTIONS {
			let Some(n) = grid.valid_neighbor(zt.index, dir) else { continue };
			if grid.tiles[n].adjacent_bits == 0 {
				continue;
			}
			let cmp = compare_exchange(&grid.tiles[n], &grid.tiles[start], &config.constants);
			if cmp == -2 {
				continue;
			}
			grid.add_active_tile(n);
			break;
		}
	}

	clear_queue_scratch(grid, &queue);
}

fn clear_queue_scratch(grid: &mut GridState, queue: &[ZoneTile]) {
	for zt in queue {
		grid.tiles[zt.index].flags.remove(crate::flags::TileFlags::PROCESSED);
	}
}

/// Fast path (§4.G step 4): visits every zone tile once in ascending
/// `mole_delta` order, marking each `fast_done` as it's visited. A giver
/// redistributes its surplus evenly across neighbors that are in the zone
/// and not yet `fast_done` — i.e. neighbors later in the sorted order,
/// which keeps a single pass from double-moving the same surplus back and
/// forth. Re-classification into givers/takers happens at the call site.
fn fast_redistribute(grid: &mut GridState, queue: &mut [ZoneTile], pos_of: &HashMap<usize, usize>, _config: &AtmosConfig) {
	let mut order: Vec<usize> = (0..queue.len()).collect();
	order.sort_by_key(|&i| FloatOrd(queue[i].mole_delta));

	for qi in order {
		let tile_idx = queue[qi].index;
		grid.tiles[tile_idx].fast_done = true;

		if queue[qi].mole_delta <= 0.0 {
			continue;
		}

		let eligible: Vec<(usize, usize)> = (0..DIRECTIONS)
			.filter_map(|dir| grid.valid_neighbor(tile_idx, dir).map(|n| (dir, n)))
			.filter_map(|(dir, n)| pos_of.get(&n).map(|&qj| (dir, qj)))
			.filter(|&(_, qj)| !grid.tiles[queue[qj].index].fast_done)
			.collect();
		if eligible.is_empty() {
			continue;
		}

		let moles_to_move = queue[qi].mole_delta / eligible.len() as f32;
		for (dir, qj) in eligible {
			adjust_eq_movement(&mut grid.tiles, tile_idx, queue[qj].index, dir, moles_to_move);
			queue[qi].mole_delta -= moles_to_move;
			queue[qj].mole_delta += moles_to_move;
		}
	}
}

/// Slow path (§4.G step 5): flood outward from a single giver or taker
/// `seed`, one BFS per seed (each gets its own slow-cycle id so visits
/// don't bleed between seeds), pushing only in-zone neighbors not yet
/// visited by this seed's flood. A pushed neighbor's `current_transfer_direction`
/// is set back toward its parent; if its sign is opposite the seed's, it
/// consumes/provides up to the seed's remaining delta into
/// `current_transfer_amount`. Once the seed's delta is drained (or the
/// flood exhausts the zone), the frontier is walked in reverse, realizing
/// each tile's `current_transfer_amount` back through its parent direction.
fn flood_transfer(grid: &mut GridState, queue: &mut [ZoneTile], pos_of: &HashMap<usize, usize>, seed_qi: usize, is_giver: bool, _config: &AtmosConfig) {
	let seed_idx = queue[seed_qi].index;
	grid.tiles[seed_idx].current_transfer_direction = -1;
	grid.tiles[seed_idx].current_transfer_amount = 0.0;

	let zone_cycle = grid.tiles[seed_idx].last_queue_cycle;
	let slow_cycle = grid.bump_equalization_cycle();
	let mut frontier: Vec<usize> = vec![seed_idx];
	grid.tiles[seed_idx].last_slow_queue_cycle = slow_cycle;

	let seed_exhausted = |queue: &[ZoneTile], pos_of: &HashMap<usize, usize>| {
		let d = queue[*pos_of.get(&seed_idx).unwrap()].mole_delta;
		if is_giver {
			d <= 0.0
		} else {
			d >= 0.0
		}
	};

	let mut fi = 0;
	while fi < frontier.len() && !seed_exhausted(queue, pos_of) {
		let cur = frontier[fi];
		for dir in 0..DIRECTIONS {
			if seed_exhausted(queue, pos_of) {
				break;
			}
			let Some(n) = grid.valid_neighbor(cur, dir) else { continue };
			if grid.tiles[n].last_queue_cycle != zone_cycle {
				continue;
			}
			if grid.tiles[n].last_slow_queue_cycle == slow_cycle {
				continue;
			}
			frontier.push(n);
			grid.tiles[n].last_slow_queue_cycle = slow_cycle;
			grid.tiles[n].current_transfer_direction = crate::constants::opposite_dir(dir) as i8;
			grid.tiles[n].current_transfer_amount = 0.0;

			let Some(&nj) = pos_of.get(&n) else { continue };
			let sj = *pos_of.get(&seed_idx).unwrap();
			let opposite_sign = if is_giver { queue[nj].mole_delta < 0.0 } else { queue[nj].mole_delta > 0.0 };
			if opposite_sign {
				if queue[nj].mole_delta.abs() > queue[sj].mole_delta.abs() {
					grid.tiles[n].current_transfer_amount -= queue[sj].mole_delta;
					queue[nj].mole_delta += queue[sj].mole_delta;
					queue[sj].mole_delta = 0.0;
				} else {
					grid.tiles[n].current_transfer_amount += queue[nj].mole_delta;
					queue[sj].mole_delta += queue[nj].mole_delta;
					queue[nj].mole_delta = 0.0;
				}
			}
		}
		fi += 1;
	}

	for &idx in frontier.iter().rev() {
		let dir = grid.tiles[idx].current_transfer_direction;
		let amount = grid.tiles[idx].current_transfer_amount;
		if amount == 0.0 || dir < 0 {
			continue;
		}
		let Some(n) = grid.valid_neighbor(idx, dir as usize) else { continue };
		adjust_eq_movement(&mut grid.tiles, idx, n, dir as usize, amount);
		grid.tiles[n].current_transfer_amount += amount;
		grid.tiles[idx].current_transfer_amount = 0.0;
	}
}

/// `finalize_eq(tile)`: realizes a tile's planned `transfer_directions`
/// against live (not archived) state. Positive entries mean "owed to a
/// neighbor"; if the tile doesn't currently hold enough total moles to
/// cover its positive obligations, recurses into the neighbors holding
/// negative (owed-to-this-tile) entries first so moles arrive before
/// they're asked to leave. `PROCESSED` guards against revisiting a tile
/// already finalized within this call.
pub fn finalize_eq(grid: &mut GridState, idx: usize, config: &AtmosConfig, pressure_report: &mut Vec<(usize, i8, f32)>) {
	if grid.tiles[idx].flags.contains(crate::flags::TileFlags::PROCESSED) {
		return;
	}
	grid.tiles[idx].flags |= crate::flags::TileFlags::PROCESSED;

	let transfers = grid.tiles[idx].transfer_directions;
	let owed: f32 = transfers.iter().filter(|&&a| a > 0.0).sum();
	if owed > grid.tiles[idx].total_moles() {
		for dir in 0..DIRECTIONS {
			if transfers[dir] < 0.0 {
				if let Some(n) = grid.valid_neighbor(idx, dir) {
					finalize_eq(grid, n, config, pressure_report);
				}
			}
		}
	}

	for dir in 0..DIRECTIONS {
		let amount = grid.tiles[idx].transfer_directions[dir];
		if amount <= 0.0 {
			continue;
		}
		let Some(n) = grid.valid_neighbor(idx, dir) else { continue };
		grid.tiles[idx].transfer_directions[dir] = 0.0;
		grid.tiles[n].transfer_directions[crate::constants::opposite_dir(dir)] = 0.0;

		let (src, dst) = split_pair(&mut grid.tiles, idx, n);
		let total = src.total_moles();
		if total <= 0.0 {
			continue;
		}
		let ratio = (amount / total).clamp(0.0, 1.0);
		let moved = src.remove_ratio(ratio, config.constants.gas_min_moles);
		let giver_temp = src.temperature;
		if !dst.flags.contains(crate::flags::TileFlags::IMMUTABLE) {
			dst.blend_temperature(&moved, giver_temp, &config.gas_specific_heats, config.constants.minimum_temperature_delta_to_consider, config.constants.minimum_heat_capacity);
			for i in 0..crate::constants::GAS_ARRAY_SIZE {
				dst.moles[i] += moved[i];
			}
		}

		pressure_report.push((idx, dir as i8, amount));
		pressure_report.push((n, crate::constants::opposite_dir(dir) as i8, -amount));
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::constants::{AtmosConfig, NITROGEN, OXYGEN};
	use crate::grid::GridState;

	fn standard_tile() -> Tile {
		let mut t = Tile::default();
		t.moles[OXYGEN] = 1840.0;
		t.moles[NITROGEN] = 6928.0;
		t.temperature = 293.15;
		t.archive();
		t
	}

	#[test]
	fn compare_exchange_reports_no_exchange_for_identical_tiles() {
		let constants = AtmosConstants::default();
		let a = standard_tile();
		let b = standard_tile();
		assert_eq!(compare_exchange(&a, &b, &constants), -2);
	}

	#[test]
	fn compare_exchange_flags_large_species_delta() {
		let constants = AtmosConstants::default();
		let a = standard_tile();
		let mut b = standard_tile();
        b.moles[OXYGEN] = 0.0;
		assert_eq!(compare_exchange(&a, &b, &constants), OXYGEN as i32);
	}

	#[test]
	fn equalize_conserves_total_moles_across_a_zone() {
		let mut grid = GridState::new(64);
		for _ in 0..4 {
			grid.add_tile(standard_tile());
		}
		grid.set_adjacency(0, crate::constants::DIR_EAST, 1);
		grid.set_adjacency(1, crate::constants::DIR_WEST, 0);
		grid.set_adjacency(1, crate::constants::DIR_EAST, 2);
		grid.set_adjacency(2, crate::constants::DIR_WEST, 1);
		grid.set_adjacency(2, crate::constants::DIR_EAST, 3);
		grid.set_adjacency(3, crate::constants::DIR_WEST, 2);
		grid.tiles[0].moles[OXYGEN] = 10_000.0;
		grid.tiles[0].archive();

		let before: f32 = grid.tiles.iter().map(|t| t.total_moles()).sum();
		let config = AtmosConfig::default();
		equalize_pressure_in_zone(&mut grid, 0, &config);
		let after: f32 = grid.tiles.iter().map(|t| t.total_moles()).sum();
		assert!((before - after).abs() / before < 0.0001);
	}
}
