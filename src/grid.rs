//! `GridState`: the tile array, the active/hotspot/superconduct/
//! high-pressure lists, the excited-group pool, and the cycle orchestrator
//! (component J).
//!
//! Grounded on `original_source/src/atmos_core.cpp` (`atmos_process`,
//! `process_cell`, `add_active_tile_impl`/`remove_active_tile_impl`); the
//! `RwLock`-guarded-static/doubling-growth style of the teacher's
//! `gas.rs` `GasMixtures`/`Arena` is adapted here to owned `Vec` fields,
//! since the spec's lifecycle (§5: "the `GridState` is owned exclusively
//! by whichever caller is executing an engine entry point") needs no
//! interior mutability.

use crate::constants::{AtmosConfig, AtmosConstants, DIRECTIONS};
use crate::excited::{ExcitedGroupPool, GroupTick};
use crate::flags::TileFlags;
use crate::reactions::{self, ReactionStatus};
use crate::tile::Tile;
use crate::{depressurize, equalize, hotspot, share, superconduct};

const MIN_INITIAL_CAPACITY: usize = 64;

/// Report returned by `process` and the stage-selective variants.
#[derive(Debug, Clone, Copy, Default)]
pub struct AtmosResult {
	pub tiles_processed: u64,
	pub active_count: usize,
	pub hotspot_count: usize,
	pub superconduct_count: usize,
	pub excited_group_count: usize,
	pub reactions_triggered: u64,
	pub max_pressure_delta: f32,
	pub processing_complete: bool,
}

pub struct GridState {
	pub tiles: Vec<Tile>,
	pub active_tiles: Vec<usize>,
	pub hotspot_tiles: Vec<usize>,
	pub superconduct_tiles: Vec<usize>,
	pub high_pressure_tiles: Vec<usize>,
	pub excited_groups: ExcitedGroupPool,
	pub update_counter: u64,
	pub equalization_queue_cycle: u64,
	pub max_pressure_delta: f32,
}

impl GridState {
	/// `create_grid(initialCapacity >= 64)`: `initialCapacity` is floored
	/// to 64.
	pub fn new(initial_capacity: usize) -> Self {
		let capacity = initial_capacity.max(MIN_INITIAL_CAPACITY);
		GridState {
			tiles: Vec::with_capacity(capacity),
			active_tiles: Vec::new(),
			hotspot_tiles: Vec::new(),
			superconduct_tiles: Vec::new(),
			high_pressure_tiles: Vec::new(),
			excited_groups: ExcitedGroupPool::default(),
			update_counter: 0,
			equalization_queue_cycle: 0,
			max_pressure_delta: 0.0,
		}
	}

	/// `reset_grid(state)`: drops all tiles and bookkeeping, keeping the
	/// `GridState` handle itself alive.
	pub fn reset(&mut self) {
		self.tiles.clear();
		self.active_tiles.clear();
		self.hotspot_tiles.clear();
		self.superconduct_tiles.clear();
		self.high_pressure_tiles.clear();
		self.excited_groups = ExcitedGroupPool::default();
		self.update_counter = 0;
		self.equalization_queue_cycle = 0;
		self.max_pressure_delta = 0.0;
	}

	/// `add_tile(state, tileTemplate) -> index`: appends; `Vec::push`
	/// grows by amortized doubling on its own, matching the spec's
	/// capacity policy without a hand-rolled grower.
	pub fn add_tile(&mut self, template: Tile) -> usize {
		self.tiles.push(template);
		self.tiles.len() - 1
	}

	/// `update_tile(state, index, template)`: bulk overwrite, range-checked
	/// only.
	pub fn update_tile(&mut self, index: usize, template: Tile) {
		if let Some(slot) = self.tiles.get_mut(index) {
			*slot = template;
		}
	}

	pub fn get_tile(&self, index: usize) -> Option<&Tile> {
		self.tiles.get(index)
	}

	pub fn tile_count(&self) -> usize {
		self.tiles.len()
	}

	/// `set_adjacency(state, tile, direction, neighborIndex or -1)`.
	pub fn set_adjacency(&mut self, index: usize, direction: usize, neighbor: i32) {
		if direction >= DIRECTIONS {
			return;
		}
		let Some(tile) = self.tiles.get_mut(index) else { return };
		tile.adjacent_indices[direction] = neighbor;
		let bit = 1u8 << direction;
		if neighbor >= 0 {
			tile.adjacent_bits |= bit;
		} else {
			tile.adjacent_bits &= !bit;
		}
	}

	pub(crate) fn valid_neighbor(&self, index: usize, direction: usize) -> Option<usize> {
		let tile = self.tiles.get(index)?;
		if tile.adjacent_bits & (1 << direction) == 0 {
			return None;
		}
		let n = tile.adjacent_indices[direction];
		if n < 0 || n as usize >= self.tiles.len() {
			return None;
		}
		Some(n as usize)
	}

	pub(crate) fn valid_neighbor_count(&self, index: usize) -> u32 {
		(0..DIRECTIONS).filter(|&d| self.valid_neighbor(index, d).is_some()).count() as u32
	}

	/// `add_active_tile(state, index)`.
	pub fn add_active_tile(&mut self, index: usize) {
		let Some(tile) = self.tiles.get_mut(index) else { return };
		if tile.flags.contains(TileFlags::EXCITED) {
			return;
		}
		tile.flags |= TileFlags::EXCITED;
		self.active_tiles.push(index);
	}

	/// `remove_active_tile(state, index)`: also disposes the tile's group.
	pub fn remove_active_tile(&mut self, index: usize) {
		let Some(tile) = self.tiles.get_mut(index) else { return };
		if !tile.flags.contains(TileFlags::EXCITED) {
			return;
		}
		tile.flags.remove(TileFlags::EXCITED);
		if let Some(pos) = self.active_tiles.iter().position(|&t| t == index) {
			self.active_tiles.swap_remove(pos);
		}
		if let Some(group) = self.tiles[index].excited_group_id {
			self.excited_groups.dispose(&mut self.tiles, group);
		}
	}

	pub(crate) fn add_hotspot_tile(&mut self, index: usize) {
		if let Some(tile) = self.tiles.get(index) {
			if !tile.flags.contains(TileFlags::HOTSPOT) {
				return;
			}
		}
		if !self.hotspot_tiles.contains(&index) {
			self.hotspot_tiles.push(index);
		}
	}

	fn remove_hotspot_tile(&mut self, index: usize) {
		if let Some(pos) = self.hotspot_tiles.iter().position(|&t| t == index) {
			self.hotspot_tiles.swap_remove(pos);
		}
	}

	fn add_superconduct_tile(&mut self, index: usize) {
		if !self.superconduct_tiles.contains(&index) {
			self.superconduct_tiles.push(index);
		}
	}

	fn remove_superconduct_tile(&mut self, index: usize) {
		if let Some(pos) = self.superconduct_tiles.iter().position(|&t| t == index) {
			self.superconduct_tiles.swap_remove(pos);
		}
	}

	/// `consider_pressure_difference(tile, dir, diff)`: records the
	/// magnitude/direction if it exceeds what's already stored and appends
	/// to the high-pressure list if not already present.
	pub(crate) fn consider_pressure_difference(&mut self, index: usize, dir: i8, diff: f32) {
		let Some(tile) = self.tiles.get_mut(index) else { return };
		if diff.abs() > tile.pressure_difference {
			tile.pressure_difference = diff.abs();
			tile.current_transfer_direction = dir;
		}
		if !self.high_pressure_tiles.contains(&index) {
			self.high_pressure_tiles.push(index);
		}
	}

	pub(crate) fn bump_equalization_cycle(&mut self) -> u64 {
		self.equalization_queue_cycle += 1;
		self.equalization_queue_cycle
	}

	/// `get_version()`.
	pub fn version() -> &'static str {
		env!("CARGO_PKG_VERSION")
	}

	/// `process(state, cfg)`: full six-stage pipeline.
	pub fn process(&mut self, config: &AtmosConfig) -> AtmosResult {
		self.update_counter += 1;
		let mut result = AtmosResult::default();

		self.archive_all();
		result.processing_complete = self.process_active_tiles(config, &mut result.tiles_processed, &mut result.reactions_triggered);

		if config.excited_groups_enabled {
			self.process_excited_groups(config);
		}
		self.process_hotspots(config);
		if config.superconduction_enabled {
			self.process_superconductivity(config);
		}
		self.process_high_pressure();

		result.active_count = self.active_tiles.len();
		result.hotspot_count = self.hotspot_tiles.len();
		result.superconduct_count = self.superconduct_tiles.len();
		result.excited_group_count = self.excited_groups.count();
		result.max_pressure_delta = self.max_pressure_delta;
		log::debug!(
			"process cycle {}: {} tiles processed, complete={}",
			self.update_counter,
			result.tiles_processed,
			result.processing_complete
		);
		result
	}

	/// `archive_all(state)`: archives every non-immutable tile.
	pub fn archive_all(&mut self) {
		for tile in self.tiles.iter_mut() {
			if !tile.flags.contains(TileFlags::IMMUTABLE) {
				tile.archive();
			}
		}
	}

	/// `process_active_tiles`. Returns whether the full active list was
	/// serviced within the time budget.
	pub fn process_active_tiles(
		&mut self,
		config: &AtmosConfig,
		tiles_processed: &mut u64,
		reactions_triggered: &mut u64,
	) -> bool {
		let start = std::time::Instant::now();
		let mut i = 0;
		while i < self.active_tiles.len() {
			let idx = self.active_tiles[i];
			if config.monstermos_enabled {
				equalize::equalize_pressure_in_zone(self, idx, config);
			}
			if self.process_cell(idx, config) == ReactionStatus::Reacting {
				*reactions_triggered += 1;
			}
			*tiles_processed += 1;
			i += 1;
			if i % 30 == 0 {
				let elapsed = start.elapsed().as_micros() as u64;
				if elapsed > config.max_process_time_microseconds {
					log::debug!("time budget exceeded after {} tiles", i);
					return false;
				}
			}
		}
		true
	}

	/// `process_cell(tile)`, steps 1-6.
	fn process_cell(&mut self, idx: usize, config: &AtmosConfig) -> ReactionStatus {
		if self.tiles[idx].flags.contains(TileFlags::IMMUTABLE) {
			self.remove_active_tile(idx);
			return ReactionStatus::None;
		}
		self.tiles[idx].last_cycle = self.update_counter;
		let neighbor_count = self.valid_neighbor_count(idx);

		for dir in 0..DIRECTIONS {
			let Some(neighbor) = self.valid_neighbor(idx, dir) else { continue };
			if self.tiles[neighbor].last_cycle >= self.update_counter {
				continue;
			}
			if self.tiles[neighbor].flags.contains(TileFlags::IMMUTABLE) {
				continue;
			}

			let mut share_air = false;
			if config.excited_groups_enabled {
				let g1 = self.tiles[idx].excited_group_id;
				let g2 = self.tiles[neighbor].excited_group_id;
				match (g1, g2) {
					(Some(a), Some(b)) => {
						if a != b {
							self.excited_groups.merge(&mut self.tiles, a, b);
						}
						share_air = true;
					}
					_ => {
						let verdict = equalize::compare_exchange(&self.tiles[idx], &self.tiles[neighbor], &config.constants);
						if verdict != -2 {
							self.add_active_tile(neighbor);
							let group = g1.or(g2).unwrap_or_else(|| self.excited_groups.create());
							self.excited_groups.add_tile(group, &mut self.tiles, idx);
							self.excited_groups.add_tile(group, &mut self.tiles, neighbor);
							share_air = true;
						}
					}
				}
			} else {
				let verdict = equalize::compare_exchange(&self.tiles[idx], &self.tiles[neighbor], &config.constants);
				if verdict != -2 {
					self.add_active_tile(neighbor);
					share_air = true;
				}
			}

			if share_air {
				let (a, b) = split_pair(&mut self.tiles, idx, neighbor);
				share::share(a, b, neighbor_count, &config.gas_specific_heats, &config.constants);
				if !config.monstermos_enabled {
					let p_idx = self.tiles[idx].pressure(&config.constants, config.constants.cell_volume);
					let p_n = self.tiles[neighbor].pressure(&config.constants, config.constants.cell_volume);
					self.consider_pressure_difference(neighbor, dir as i8, p_idx - p_n);
					self.consider_pressure_difference(idx, crate::constants::opposite_dir(dir) as i8, p_n - p_idx);
				}
				self.last_share_check(idx, config);
			}
		}

		let status = reactions::react(&mut self.tiles[idx], &config.constants, &config.gas_specific_heats, config.heat_scale);

		if self.tiles[idx].temperature > config.constants.minimum_temperature_start_super_conduction {
			if superconduct::consider_superconductivity(&mut self.tiles[idx], true, config.superconduction_enabled, &config.constants) {
				self.add_superconduct_tile(idx);
			}
			if self.tiles[idx].flags.contains(TileFlags::SUPERCONDUCT) {
				return status;
			}
		}

		if config.excited_groups_enabled && self.tiles[idx].excited_group_id.is_none() {
			self.remove_active_tile(idx);
		}

		status
	}

	/// `last_share_check`.
	fn last_share_check(&mut self, idx: usize, config: &AtmosConfig) {
		let last_share = self.tiles[idx].last_share;
		if let Some(group) = self.tiles[idx].excited_group_id {
			if last_share > config.constants.minimum_air_to_suspend {
				self.excited_groups.reset_cooldowns(group);
			} else if last_share > config.constants.minimum_moles_delta_to_move {
				self.excited_groups.reset_dismantle_cooldown(group);
			}
		}
	}

	/// `process_excited_groups`.
	pub fn process_excited_groups(&mut self, config: &AtmosConfig) {
		for group_id in self.excited_groups.non_disposed_ids() {
			match self.excited_groups.tick(group_id, &config.constants) {
				GroupTick::SelfBreakdown => {
					self.excited_groups.self_breakdown(&mut self.tiles, group_id, &config.gas_specific_heats);
				}
				GroupTick::Deactivate => {
					let members = self.excited_groups.deactivate_group_tiles(&mut self.tiles, group_id);
					for m in members {
						self.remove_active_tile(m);
					}
				}
				GroupTick::None => {}
			}
		}
	}

	/// `process_hotspots`. Runs unconditionally: already-burning fires
	/// keep resolving even when a host has disabled new ignitions, since
	/// there's no config flag gating this stage in the source.
	pub fn process_hotspots(&mut self, config: &AtmosConfig) {
		let mut i = 0;
		while i < self.hotspot_tiles.len() {
			let idx = self.hotspot_tiles[i];
			let outcome = hotspot::process_hotspot(&mut self.tiles, idx, &config.constants, &config.gas_specific_heats, config.heat_scale);
			if outcome.extinguished {
				self.remove_hotspot_tile(idx);
				continue;
			}
			for target in outcome.spread_targets {
				let spread_temp = self.tiles[idx].hotspot_temperature * config.constants.fire_spread_radiosity_scale;
				if hotspot::ignite(&mut self.tiles[target], spread_temp, 1.0, &config.constants) {
					self.add_hotspot_tile(target);
					self.add_active_tile(target);
				}
			}
			i += 1;
		}
	}

	/// `process_superconductivity`.
	pub fn process_superconductivity(&mut self, config: &AtmosConfig) {
		let mut i = 0;
		while i < self.superconduct_tiles.len() {
			let idx = self.superconduct_tiles[i];
			let outcome = superconduct::superconduct(&mut self.tiles, idx, self.update_counter, config.superconduction_enabled, &config.constants);
			for a in outcome.activate {
				self.add_active_tile(a);
			}
			for n in outcome.newly_tracked {
				self.add_superconduct_tile(n);
			}
			if !outcome.still_superconducting {
				self.remove_superconduct_tile(idx);
				continue;
			}
			i += 1;
		}
	}

	/// `process_high_pressure`: drains the high-pressure list, reporting
	/// `maxPressureDelta`, then clears each tile's scratch fields. Wind
	/// application is a host concern (§4.I, §9).
	pub fn process_high_pressure(&mut self) {
		let mut max_delta = 0.0_f32;
		for &idx in &self.high_pressure_tiles {
			if let Some(tile) = self.tiles.get(idx) {
				max_delta = max_delta.max(tile.pressure_difference);
			}
		}
		for &idx in &self.high_pressure_tiles {
			if let Some(tile) = self.tiles.get_mut(idx) {
				tile.pressure_difference = 0.0;
				tile.current_transfer_direction = -1;
				tile.current_transfer_amount = 0.0;
			}
		}
		self.high_pressure_tiles.clear();
		self.max_pressure_delta = max_delta;
	}

	/// `process_revalidate`: reserved, does nothing (§9).
	pub fn process_revalidate(&mut self) -> bool {
		true
	}

	pub fn equalize_pressure_zone(&mut self, index: usize, config: &AtmosConfig) {
		equalize::equalize_pressure_in_zone(self, index, config);
	}

	pub fn explosive_depressurize(&mut self, index: usize, config: &AtmosConfig) {
		depressurize::explosive_depressurize(self, index, config);
	}
}

pub(crate) fn split_pair(tiles: &mut [Tile], a: usize, b: usize) -> (&mut Tile, &mut Tile) {
	assert_ne!(a, b);
	if a < b {
		let (left, right) = tiles.split_at_mut(b);
		(&mut left[a], &mut right[0])
	} else {
		let (left, right) = tiles.split_at_mut(a);
		(&mut right[0], &mut left[b])
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::constants::{AtmosConfig, NITROGEN, OXYGEN};

	#[test]
	fn create_grid_floors_initial_capacity() {
		let grid = GridState::new(4);
		assert!(grid.tiles.capacity() >= MIN_INITIAL_CAPACITY);
	}

	#[test]
	fn add_active_tile_is_idempotent_in_list_membership() {
		let mut grid = GridState::new(64);
		grid.add_tile(Tile::default());
		grid.add_active_tile(0);
		grid.add_active_tile(0);
		assert_eq!(grid.active_tiles.len(), 1);
		assert!(grid.tiles[0].flags.contains(TileFlags::EXCITED));
	}

	#[test]
	fn remove_active_tile_clears_flag_and_group() {
		let mut grid = GridState::new(64);
		grid.add_tile(Tile::default());
		grid.add_active_tile(0);
		let group = grid.excited_groups.create();
		grid.excited_groups.add_tile(group, &mut grid.tiles, 0);
		grid.remove_active_tile(0);
		assert!(!grid.tiles[0].flags.contains(TileFlags::EXCITED));
		assert!(grid.active_tiles.is_empty());
	}

	#[test]
	fn process_on_empty_grid_reports_complete() {
		let mut grid = GridState::new(64);
		let config = AtmosConfig::default();
		let result = grid.process(&config);
		assert!(result.processing_complete);
		assert_eq!(result.tiles_processed, 0);
	}

	#[test]
	fn linear_diffusion_spreads_mass_and_conserves_total() {
		let mut grid = GridState::new(64);
		for _ in 0..5 {
			grid.add_tile(Tile::default());
		}
		for i in 0..5 {
			grid.set_adjacency(i, crate::constants::DIR_EAST, if i + 1 < 5 { (i + 1) as i32 } else { -1 });
			grid.set_adjacency(i, crate::constants::DIR_WEST, if i > 0 { (i - 1) as i32 } else { -1 });
		}
		for i in 0..5 {
			grid.tiles[i].moles[OXYGEN] = 1840.0;
			grid.tiles[i].moles[NITROGEN] = 6928.0;
			grid.tiles[i].temperature = 293.15;
		}
		grid.tiles[0].moles[OXYGEN] = 100.0;
		grid.tiles[0].moles[NITROGEN] = 400.0;
		grid.tiles[0].temperature = 293.15 + 20.0;

		let sum_before: f32 = grid.tiles.iter().map(|t| t.total_moles()).sum();
		grid.add_active_tile(0);
		let config = AtmosConfig::default();
		for _ in 0..50 {
			grid.process(&config);
		}
		let sum_after: f32 = grid.tiles.iter().map(|t| t.total_moles()).sum();
		assert!((sum_before - sum_after).abs() / sum_before < 0.0001);
	}
}
