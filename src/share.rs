//! Component C: Linda sharing, the pairwise gas+heat exchange between two
//! adjacent tiles, based on archived values to avoid order dependence
//! within a cycle.
//!
//! Grounded on `original_source/src/linda.cpp` (`share_impl`,
//! `temperature_share_impl`, `temperature_share_solid`); the archived-HC
//! formula mirrors `gas/gas_mixture.rs`'s `temperature_share` exactly.

use crate::constants::*;
use crate::flags::TileFlags;
use crate::tile::{heat_capacity, Tile};

fn mutable(tile: &Tile) -> bool {
	!tile.flags.contains(TileFlags::IMMUTABLE)
}

/// `share(receiver, sharer, adjacentCount, …)`: per-species mass delta
/// scaled by `1/(n+1)`, followed by a heat-capacity-weighted temperature
/// recombination, and a supplementary direct temperature share when the
/// sharer's heat capacity barely moved.
pub fn share(
	receiver: &mut Tile,
	sharer: &mut Tile,
	adjacent_count: u32,
	specific_heats: &SpecificHeats,
	constants: &AtmosConstants,
) {
	let n = adjacent_count as f32 + 1.0;
	let mut deltas = [0.0_f32; GAS_ARRAY_SIZE];
	for g in 0..GAS_COUNT {
		let delta = (receiver.moles[g] - sharer.moles[g]) / n;
		if delta.abs() < constants.gas_min_moles {
			continue;
		}
		deltas[g] = delta;
		if mutable(receiver) {
			receiver.moles[g] -= delta;
		}
		if mutable(sharer) {
			sharer.moles[g] += delta;
		}
	}
	receiver.last_share = deltas.iter().map(|d| d.abs()).sum::<f32>();

	let delta_t_archived = receiver.temperature_archived - sharer.temperature_archived;
	if delta_t_archived.abs() > constants.minimum_temperature_delta_to_consider {
		let old_hc_r = heat_capacity(&receiver.moles_archived, specific_heats, receiver.flags.contains(TileFlags::SPACE));
		let old_hc_s = heat_capacity(&sharer.moles_archived, specific_heats, sharer.flags.contains(TileFlags::SPACE));

		let mut energy_flow = 0.0_f32;
		for g in 0..GAS_COUNT {
			let d = deltas[g];
			if d == 0.0 {
				continue;
			}
			let origin_temp = if d > 0.0 {
				receiver.temperature_archived
			} else {
				sharer.temperature_archived
			};
			energy_flow += d * specific_heats[g] * origin_temp;
		}

		let mut moved_hc = 0.0_f32;
		for g in 0..GAS_COUNT {
			moved_hc += deltas[g] * specific_heats[g];
		}
		let new_hc_r = old_hc_r - moved_hc;
		let new_hc_s = old_hc_s + moved_hc;

		if new_hc_r > constants.minimum_heat_capacity && mutable(receiver) {
			receiver.temperature =
				(receiver.temperature_archived * old_hc_r - energy_flow) / new_hc_r;
		}
		if new_hc_s > constants.minimum_heat_capacity && mutable(sharer) {
			sharer.temperature = (sharer.temperature_archived * old_hc_s + energy_flow) / new_hc_s;
		}

		if old_hc_s > 0.0 && ((new_hc_s / old_hc_s) - 1.0).abs() < 0.1 {
			temperature_share(receiver, sharer, constants.open_heat_transfer_coefficient, specific_heats, constants);
		}
	}
}

/// `temperature_share(receiver, sharer, k)`: archived-HC heat flow,
/// `heat = k * deltaT_archived * (HC_r * HC_s) / (HC_r + HC_s)`; mutable
/// sides adjust by `heat / HC`, floored at TCMB.
pub fn temperature_share(
	receiver: &mut Tile,
	sharer: &mut Tile,
	k: f32,
	specific_heats: &SpecificHeats,
	constants: &AtmosConstants,
) {
	let delta_t = receiver.temperature_archived - sharer.temperature_archived;
	if delta_t.abs() <= constants.minimum_temperature_delta_to_consider {
		return;
	}
	let hc_r = heat_capacity(&receiver.moles_archived, specific_heats, receiver.flags.contains(TileFlags::SPACE));
	let hc_s = heat_capacity(&sharer.moles_archived, specific_heats, sharer.flags.contains(TileFlags::SPACE));
	if hc_r == 0.0 || hc_s == 0.0 {
		return;
	}
	let heat = k * delta_t * (hc_r * hc_s / (hc_r + hc_s));
	if mutable(receiver) {
		receiver.temperature = (receiver.temperature - heat / hc_r).max(constants.tcmb);
	}
	if mutable(sharer) {
		sharer.temperature = (sharer.temperature + heat / hc_s).max(constants.tcmb);
	}
}

/// `temperature_share_solid(receiver, k, sharerTemp, sharerHC)`: same
/// formula against a caller-supplied solid temperature/heat capacity pair
/// (used by superconduction, where one side isn't a gas tile at all);
/// returns the updated solid temperature and does not touch `receiver`
/// unless it is mutable.
pub fn temperature_share_solid(
	receiver: &mut Tile,
	k: f32,
	sharer_temp: f32,
	sharer_hc: f32,
	specific_heats: &SpecificHeats,
	constants: &AtmosConstants,
) -> f32 {
	let delta_t = receiver.temperature_archived - sharer_temp;
	if delta_t.abs() <= constants.minimum_temperature_delta_to_consider {
		return sharer_temp;
	}
	let hc_r = heat_capacity(&receiver.moles_archived, specific_heats, receiver.flags.contains(TileFlags::SPACE));
	if hc_r == 0.0 || sharer_hc == 0.0 {
		return sharer_temp;
	}
	let heat = k * delta_t * (hc_r * sharer_hc / (hc_r + sharer_hc));
	if mutable(receiver) {
		receiver.temperature = (receiver.temperature - heat / hc_r).max(constants.tcmb);
	}
	(sharer_temp + heat / sharer_hc).max(constants.tcmb)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn air_tile(oxygen: f32, temperature: f32) -> Tile {
		let mut t = Tile::default();
		t.moles[OXYGEN] = oxygen;
		t.temperature = temperature;
		t.temperature_archived = temperature;
		t.moles_archived = t.moles;
		t
	}

	#[test]
	fn share_is_mass_symmetric() {
		let constants = AtmosConstants::default();
		let mut r = air_tile(1000.0, 293.15);
		let mut s = air_tile(0.0, 293.15);
		let total_before = r.total_moles() + s.total_moles();
		share(&mut r, &mut s, 1, &DEFAULT_SPECIFIC_HEATS, &constants);
		let total_after = r.total_moles() + s.total_moles();
		assert!((total_before - total_after).abs() < 0.001);
		assert!(r.moles[OXYGEN] < 1000.0);
		assert!(s.moles[OXYGEN] > 0.0);
	}

	#[test]
	fn share_skips_immutable_writes_but_still_computes() {
		let constants = AtmosConstants::default();
		let mut r = air_tile(1000.0, 293.15);
		r.flags |= TileFlags::IMMUTABLE;
		let mut s = air_tile(0.0, 293.15);
		share(&mut r, &mut s, 1, &DEFAULT_SPECIFIC_HEATS, &constants);
		assert_eq!(r.moles[OXYGEN], 1000.0);
		assert!(s.moles[OXYGEN] > 0.0);
	}

	#[test]
	fn temperature_share_conserves_thermal_energy() {
		let constants = AtmosConstants::default();
		let mut r = air_tile(1840.0, 1000.0);
		let mut s = air_tile(1840.0, 293.15);
		let hc_r = heat_capacity(&r.moles, &DEFAULT_SPECIFIC_HEATS, false);
		let hc_s = heat_capacity(&s.moles, &DEFAULT_SPECIFIC_HEATS, false);
		let energy_before = r.temperature * hc_r + s.temperature * hc_s;
		temperature_share(&mut r, &mut s, 1.0, &DEFAULT_SPECIFIC_HEATS, &constants);
		let energy_after = r.temperature * hc_r + s.temperature * hc_s;
		assert!((energy_before - energy_after).abs() / energy_before < 0.01);
		assert!(r.temperature < 1000.0);
		assert!(s.temperature > 293.15);
	}
}
