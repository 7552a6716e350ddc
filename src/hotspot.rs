//! Component E: the hotspot engine. A hotspot is a sub-tile fire with its
//! own temperature and effective volume, independent of (but coupled to)
//! the tile's bulk temperature.
//!
//! Grounded on `original_source/src/hotspot.cpp` in full. The hotspot's own
//! burn formulas are deliberately distinct from `reactions.rs`'s ambient
//! plasma/tritium fire rules — see DESIGN.md divergences #1 and #2.

use crate::constants::*;
use crate::flags::TileFlags;
use crate::tile::{heat_capacity, Tile};

/// What a `process_hotspot` tick asks the orchestrator to do with the
/// hotspot list and with neighboring tiles.
pub struct HotspotOutcome {
	pub extinguished: bool,
	/// Neighbor tile indices eligible for an ignition attempt.
	pub spread_targets: Vec<usize>,
}

/// `ignite(tile, T, V)`: requires not SPACE, fuel (plasma or tritium) and
/// oxygen present, and `T` above the plasma minimum burn temperature. If
/// already a hotspot, monotonically raises temperature and volume (and
/// reports no new list insertion needed). Otherwise marks the tile a
/// hotspot and reports `true` so the caller adds it to the hotspot list
/// and activates it.
pub fn ignite(tile: &mut Tile, temperature: f32, volume: f32, constants: &AtmosConstants) -> bool {
	if tile.flags.contains(TileFlags::SPACE) {
		return false;
	}
	if tile.moles[PLASMA] < 0.5 && tile.moles[TRITIUM] < 0.5 {
		return false;
	}
	if tile.moles[OXYGEN] < 0.5 {
		return false;
	}
	if temperature < constants.plasma_minimum_burn_temperature {
		return false;
	}
	if tile.flags.contains(TileFlags::HOTSPOT) {
		tile.hotspot_temperature = tile.hotspot_temperature.max(temperature);
		tile.hotspot_volume = tile.hotspot_volume.max(volume);
		false
	} else {
		tile.flags |= TileFlags::HOTSPOT;
		tile.hotspot_temperature = temperature;
		tile.hotspot_volume = volume;
		tile.hotspot_state = 1;
		true
	}
}

/// `extinguish(tile)`: clears HOTSPOT and zeroes hotspot state. Caller
/// removes the tile from the hotspot list.
pub fn extinguish(tile: &mut Tile) {
	tile.flags.remove(TileFlags::HOTSPOT);
	tile.hotspot_temperature = 0.0;
	tile.hotspot_volume = 0.0;
	tile.hotspot_state = 0;
}

/// The hotspot-driven burn, using the hotspot's own temperature (not the
/// tile's bulk temperature) for its burn-rate ramp. Returns energy
/// released, to be folded back into `hotspot_temperature` by the caller.
fn perform_hotspot_fire(tile: &mut Tile, constants: &AtmosConstants) -> f32 {
	let mut energy = 0.0_f32;

	let plasma = tile.moles[PLASMA];
	let oxygen = tile.moles[OXYGEN];
	if plasma >= 0.5 && oxygen >= 0.5 && tile.hotspot_temperature >= constants.plasma_minimum_burn_temperature {
		let temperature_scale = if tile.hotspot_temperature > constants.plasma_upper_temperature {
			1.0
		} else {
			(tile.hotspot_temperature - constants.plasma_minimum_burn_temperature)
				/ (constants.plasma_upper_temperature - constants.plasma_minimum_burn_temperature)
		};
		if temperature_scale > 0.0 {
			let oxygen_burn_rate = constants.oxygen_burn_rate_base - temperature_scale;
			// No plasma_burn_rate_delta division here, unlike the ambient
			// reaction: the hotspot burns its fuel faster than bulk chemistry.
			let plasma_burn_rate = if oxygen > plasma * constants.plasma_oxygen_fullburn {
				temperature_scale
			} else {
				temperature_scale * (oxygen / (plasma * constants.plasma_oxygen_fullburn))
			};
			if plasma_burn_rate > constants.gas_min_moles {
				let burned = plasma_burn_rate.min(plasma.min(oxygen / oxygen_burn_rate));
				if burned > 0.0 {
					tile.moles[PLASMA] -= burned;
					tile.moles[OXYGEN] -= burned * oxygen_burn_rate;
					tile.moles[CARBON_DIOXIDE] += burned * 0.75;
					tile.moles[WATER_VAPOR] += burned * 0.25;
					energy += constants.fire_plasma_energy_released * burned;
				}
			}
		}
	}

	let tritium = tile.moles[TRITIUM];
	let oxygen = tile.moles[OXYGEN];
	if tritium >= 0.5 && oxygen >= 0.5 && tile.hotspot_temperature >= constants.plasma_minimum_burn_temperature {
		// Capped by tritium_burn_trit_factor, unlike the ambient reaction.
		let burned = tritium
			.min(oxygen / constants.tritium_burn_oxy_factor)
			.min(constants.tritium_burn_trit_factor);
		if burned > 0.0 {
			tile.moles[TRITIUM] -= burned;
			tile.moles[OXYGEN] -= burned * constants.tritium_burn_oxy_factor;
			tile.moles[WATER_VAPOR] += burned;
			energy += constants.fire_hydrogen_energy_released * burned;
		}
	}

	energy
}

/// `process(tile)` per cycle, steps 1-7 as specified.
pub fn process_hotspot(
	tiles: &mut [Tile],
	idx: usize,
	constants: &AtmosConstants,
	specific_heats: &SpecificHeats,
	heat_scale: f32,
) -> HotspotOutcome {
	if tiles[idx].hotspot_temperature < constants.fire_minimum_temperature_to_exist {
		extinguish(&mut tiles[idx]);
		return HotspotOutcome { extinguished: true, spread_targets: Vec::new() };
	}

	if tiles[idx].hotspot_volume > 1.0 {
		tiles[idx].hotspot_volume -= 1.0;
	}

	let burned_energy = perform_hotspot_fire(&mut tiles[idx], constants);
	if burned_energy > 0.0 {
		let hc = heat_capacity(&tiles[idx].moles, specific_heats, false);
		if hc > 0.0 {
			tiles[idx].hotspot_temperature += burned_energy / hc;
		}
	} else {
		tiles[idx].hotspot_temperature -= 5.0;
	}

	if !tiles[idx].flags.contains(TileFlags::IMMUTABLE) {
		let hc = heat_capacity(&tiles[idx].moles, specific_heats, tiles[idx].flags.contains(TileFlags::SPACE));
		if hc > 0.0 {
			let expose_energy = tiles[idx].hotspot_temperature * tiles[idx].hotspot_volume * 0.5;
			tiles[idx].temperature =
				(tiles[idx].temperature + expose_energy / (hc * heat_scale)).clamp(constants.tcmb, constants.tmax);
		}
	}

	if tiles[idx].hotspot_temperature < constants.fire_minimum_temperature_to_exist {
		extinguish(&mut tiles[idx]);
		return HotspotOutcome { extinguished: true, spread_targets: Vec::new() };
	}

	let mut spread_targets = Vec::new();
	if tiles[idx].hotspot_temperature > constants.fire_minimum_temperature_to_spread {
		for dir in 0..DIRECTIONS {
			if tiles[idx].adjacent_bits & (1 << dir) == 0 {
				continue;
			}
			let neighbor_idx = tiles[idx].adjacent_indices[dir];
			if neighbor_idx < 0 || neighbor_idx as usize >= tiles.len() {
				continue;
			}
			let neighbor = &tiles[neighbor_idx as usize];
			if neighbor.flags.contains(TileFlags::SPACE) || neighbor.flags.contains(TileFlags::HOTSPOT) {
				continue;
			}
			if neighbor.moles[OXYGEN] < 0.5 {
				continue;
			}
			if neighbor.moles[PLASMA] < 0.5 && neighbor.moles[TRITIUM] < 0.5 {
				continue;
			}
			spread_targets.push(neighbor_idx as usize);
		}
	}

	let t = tiles[idx].hotspot_temperature;
	tiles[idx].hotspot_state = if t > constants.plasma_upper_temperature {
		3
	} else if t > constants.fire_minimum_temperature_to_exist + 500.0 {
		2
	} else {
		1
	};

	HotspotOutcome { extinguished: false, spread_targets }
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn ignite_requires_fuel_and_oxygen() {
		let constants = AtmosConstants::default();
		let mut tile = Tile::default();
		tile.moles[OXYGEN] = 30.0;
		assert!(!ignite(&mut tile, constants.plasma_minimum_burn_temperature + 1.0, 1.0, &constants));
		tile.moles[PLASMA] = 10.0;
		assert!(ignite(&mut tile, constants.plasma_minimum_burn_temperature + 1.0, 1.0, &constants));
		assert!(tile.flags.contains(TileFlags::HOTSPOT));
	}

	#[test]
	fn ignite_on_already_hotspot_tile_is_monotonic() {
		let constants = AtmosConstants::default();
		let mut tile = Tile::default();
		tile.moles[OXYGEN] = 30.0;
		tile.moles[PLASMA] = 10.0;
		ignite(&mut tile, 500.0, 2.0, &constants);
		let was_new = ignite(&mut tile, 300.0, 1.0, &constants);
		assert!(!was_new);
		assert_eq!(tile.hotspot_temperature, 500.0);
		assert_eq!(tile.hotspot_volume, 2.0);
	}

	#[test]
	fn process_hotspot_extinguishes_below_minimum() {
		let constants = AtmosConstants::default();
		let mut tiles = vec![Tile::default()];
		tiles[0].flags |= TileFlags::HOTSPOT;
		tiles[0].hotspot_temperature = 1.0;
		let outcome = process_hotspot(&mut tiles, 0, &constants, &DEFAULT_SPECIFIC_HEATS, 1.0);
		assert!(outcome.extinguished);
		assert!(!tiles[0].flags.contains(TileFlags::HOTSPOT));
	}

	#[test]
	fn process_hotspot_does_not_spread_into_space() {
		let constants = AtmosConstants::default();
		let mut tiles = vec![Tile::default(), Tile::default()];
		tiles[0].moles[PLASMA] = 1000.0;
		tiles[0].moles[OXYGEN] = 1000.0;
		tiles[0].flags |= TileFlags::HOTSPOT;
		tiles[0].hotspot_temperature = constants.fire_minimum_temperature_to_spread + 100.0;
		tiles[0].hotspot_volume = 10.0;
		tiles[0].adjacent_indices[0] = 1;
		tiles[0].adjacent_bits |= 1 << 0;
		tiles[1].flags |= TileFlags::SPACE;
		let outcome = process_hotspot(&mut tiles, 0, &constants, &DEFAULT_SPECIFIC_HEATS, 1.0);
		assert!(outcome.spread_targets.is_empty());
	}
}
