//! Component D: excited groups, a union of tiles currently exchanging
//! mass, with breakdown (self-averaging) and dismantle (deactivation)
//! cooldown timers.
//!
//! Grounded on `original_source/src/gases.cpp` (`create_excited_group`,
//! `add_tile_to_excited_group`, `merge_excited_groups`,
//! `excited_group_self_breakdown`, `deactivate_group_tiles`,
//! `reset_excited_group_cooldowns`). Slot reuse on dispose mirrors the
//! teacher's `Arena<T>` free-list scan in `gas.rs`, adapted to a plain
//! `Vec<Option<ExcitedGroup>>` since groups are never referenced by a
//! foreign handle needing generational-index safety.

use crate::constants::{AtmosConstants, SpecificHeats, GAS_ARRAY_SIZE, GAS_COUNT};
use crate::flags::TileFlags;
use crate::tile::{heat_capacity, Tile};

#[derive(Debug, Clone)]
pub struct ExcitedGroup {
	pub tiles: Vec<usize>,
	pub breakdown_cooldown: u32,
	pub dismantle_cooldown: u32,
	pub disposed: bool,
}

impl ExcitedGroup {
	fn new() -> Self {
		ExcitedGroup {
			tiles: Vec::new(),
			breakdown_cooldown: 0,
			dismantle_cooldown: 0,
			disposed: false,
		}
	}
}

/// What a cycle tick on a group asks the orchestrator to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupTick {
	None,
	SelfBreakdown,
	Deactivate,
}

#[derive(Default)]
pub struct ExcitedGroupPool {
	groups: Vec<Option<ExcitedGroup>>,
}

impl ExcitedGroupPool {
	pub fn get(&self, id: usize) -> Option<&ExcitedGroup> {
		self.groups.get(id).and_then(|g| g.as_ref())
	}

	/// `create`: reuses the first empty-or-disposed slot before growing.
	pub fn create(&mut self) -> usize {
		for (i, slot) in self.groups.iter().enumerate() {
			if slot.as_ref().map_or(true, |g| g.disposed) {
				self.groups[i] = Some(ExcitedGroup::new());
				return i;
			}
		}
		self.groups.push(Some(ExcitedGroup::new()));
		self.groups.len() - 1
	}

	/// `add_tile(group, tile)`.
	pub fn add_tile(&mut self, group_id: usize, tiles: &mut [Tile], tile_idx: usize) {
		if let Some(Some(g)) = self.groups.get_mut(group_id) {
			if tiles[tile_idx].excited_group_id != Some(group_id) {
				g.tiles.push(tile_idx);
				tiles[tile_idx].excited_group_id = Some(group_id);
			}
		}
	}

	/// `remove_tile(group, tile)`.
	pub fn remove_tile(&mut self, group_id: usize, tiles: &mut [Tile], tile_idx: usize) {
		if let Some(Some(g)) = self.groups.get_mut(group_id) {
			if let Some(pos) = g.tiles.iter().position(|&t| t == tile_idx) {
				g.tiles.swap_remove(pos);
			}
		}
		if tiles[tile_idx].excited_group_id == Some(group_id) {
			tiles[tile_idx].excited_group_id = None;
		}
	}

	/// `merge(g1, g2)`: reparent all of g2's tiles into g1, mark g2
	/// disposed. A no-op if `g1 == g2`.
	pub fn merge(&mut self, tiles: &mut [Tile], g1: usize, g2: usize) {
		if g1 == g2 {
			return;
		}
		let moved = match self.groups.get_mut(g2).and_then(|g| g.as_mut()) {
			Some(g) => std::mem::take(&mut g.tiles),
			None => return,
		};
		for &t in &moved {
			tiles[t].excited_group_id = Some(g1);
		}
		if let Some(Some(g)) = self.groups.get_mut(g1) {
			g.tiles.extend(moved);
		}
		if let Some(Some(g)) = self.groups.get_mut(g2) {
			g.disposed = true;
		}
	}

	/// `dispose(group)`: unlink all its tiles, mark disposed.
	pub fn dispose(&mut self, tiles: &mut [Tile], group_id: usize) {
		let members = match self.groups.get_mut(group_id).and_then(|g| g.as_mut()) {
			Some(g) => {
				g.disposed = true;
				std::mem::take(&mut g.tiles)
			}
			None => return,
		};
		for t in members {
			if tiles[t].excited_group_id == Some(group_id) {
				tiles[t].excited_group_id = None;
			}
		}
	}

	/// `reset_cooldowns(group)`: both cooldowns to 0.
	pub fn reset_cooldowns(&mut self, group_id: usize) {
		if let Some(Some(g)) = self.groups.get_mut(group_id) {
			g.breakdown_cooldown = 0;
			g.dismantle_cooldown = 0;
		}
	}

	pub fn reset_dismantle_cooldown(&mut self, group_id: usize) {
		if let Some(Some(g)) = self.groups.get_mut(group_id) {
			g.dismantle_cooldown = 0;
		}
	}

	/// `self_breakdown(group)`: redistribute temperature and moles
	/// uniformly across its mutable members using an energy-weighted mean
	/// temperature; reset breakdown cooldown.
	pub fn self_breakdown(&mut self, tiles: &mut [Tile], group_id: usize, specific_heats: &SpecificHeats) {
		let members = match self.groups.get_mut(group_id).and_then(|g| g.as_mut()) {
			Some(g) => {
				g.breakdown_cooldown = 0;
				g.tiles.clone()
			}
			None => return,
		};
		let mutable_members: Vec<usize> = members
			.iter()
			.copied()
			.filter(|&t| !tiles[t].flags.contains(TileFlags::IMMUTABLE))
			.collect();
		if mutable_members.is_empty() {
			return;
		}
		let mut combined_hc = 0.0_f32;
		let mut combined_energy = 0.0_f32;
		let mut combined_moles = [0.0_f32; GAS_ARRAY_SIZE];
		for &t in &mutable_members {
			let tile = &tiles[t];
			let hc = heat_capacity(&tile.moles, specific_heats, tile.flags.contains(TileFlags::SPACE));
			combined_hc += hc;
			combined_energy += hc * tile.temperature;
			for g in 0..GAS_COUNT {
				combined_moles[g] += tile.moles[g];
			}
		}
		if combined_hc <= 0.0 {
			return;
		}
		let mean_temperature = combined_energy / combined_hc;
		let count = mutable_members.len() as f32;
		let mut mean_moles = [0.0_f32; GAS_ARRAY_SIZE];
		for g in 0..GAS_ARRAY_SIZE {
			mean_moles[g] = combined_moles[g] / count;
		}
		for &t in &mutable_members {
			tiles[t].moles = mean_moles;
			tiles[t].temperature = mean_temperature;
		}
	}

	/// `deactivate_group_tiles(group)`: returns the member list so the
	/// caller (grid.rs) can remove each from the active list, then disposes
	/// the group.
	pub fn deactivate_group_tiles(&mut self, tiles: &mut [Tile], group_id: usize) -> Vec<usize> {
		let members = self
			.groups
			.get(group_id)
			.and_then(|g| g.as_ref())
			.map(|g| g.tiles.clone())
			.unwrap_or_default();
		self.dispose(tiles, group_id);
		members
	}

	/// Advances a group's cooldowns by one cycle and reports what the
	/// orchestrator should do.
	pub fn tick(&mut self, group_id: usize, constants: &AtmosConstants) -> GroupTick {
		let g = match self.groups.get_mut(group_id).and_then(|g| g.as_mut()) {
			Some(g) if !g.disposed => g,
			_ => return GroupTick::None,
		};
		g.breakdown_cooldown += 1;
		g.dismantle_cooldown += 1;
		if g.breakdown_cooldown as u32 > constants.excited_group_breakdown_cycles {
			GroupTick::SelfBreakdown
		} else if g.dismantle_cooldown as u32 > constants.excited_groups_dismantle_cycles {
			GroupTick::Deactivate
		} else {
			GroupTick::None
		}
	}

	pub fn non_disposed_ids(&self) -> Vec<usize> {
		self.groups
			.iter()
			.enumerate()
			.filter_map(|(i, g)| g.as_ref().filter(|g| !g.disposed).map(|_| i))
			.collect()
	}

	pub fn count(&self) -> usize {
		self.groups.iter().filter(|g| matches!(g, Some(g) if !g.disposed)).count()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::constants::DEFAULT_SPECIFIC_HEATS;

	#[test]
	fn create_reuses_disposed_slots() {
		let mut pool = ExcitedGroupPool::default();
		let mut tiles = vec![Tile::default(); 2];
		let g1 = pool.create();
		pool.dispose(&mut tiles, g1);
		let g2 = pool.create();
		assert_eq!(g1, g2);
	}

	#[test]
	fn self_breakdown_averages_mutable_members_only() {
		let mut pool = ExcitedGroupPool::default();
		let mut tiles = vec![Tile::default(); 2];
		tiles[0].moles[crate::constants::OXYGEN] = 100.0;
		tiles[0].temperature = 1000.0;
		tiles[1].moles[crate::constants::OXYGEN] = 0.0;
		tiles[1].temperature = 200.0;
		tiles[1].flags |= TileFlags::IMMUTABLE;
		let g = pool.create();
		pool.add_tile(g, &mut tiles, 0);
		pool.add_tile(g, &mut tiles, 1);
		pool.self_breakdown(&mut tiles, g, &DEFAULT_SPECIFIC_HEATS);
		assert_eq!(tiles[0].moles[crate::constants::OXYGEN], 100.0);
		assert_eq!(tiles[0].temperature, 1000.0);
		assert_eq!(tiles[1].temperature, 200.0);
	}

	#[test]
	fn merge_reparents_tiles_and_disposes_source() {
		let mut pool = ExcitedGroupPool::default();
		let mut tiles = vec![Tile::default(); 2];
		let g1 = pool.create();
		let g2 = pool.create();
		pool.add_tile(g1, &mut tiles, 0);
		pool.add_tile(g2, &mut tiles, 1);
		pool.merge(&mut tiles, g1, g2);
		assert_eq!(tiles[1].excited_group_id, Some(g1));
		assert!(pool.get(g2).unwrap().disposed);
	}
}
