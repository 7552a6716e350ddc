//! Component B: seven chemistry rules applied to a single tile, in a fixed
//! order that matters because several of them compete for the same oxygen
//! pool (SPEC_FULL.md design note "Reaction precedence").
//!
//! Grounded on `original_source/src/reactions.cpp` (`react_impl` and each
//! rule body); no teacher Rust file covers reaction chemistry since
//! auxmos's reaction hooks are BYOND callbacks stripped from this crate.

use crate::constants::*;
use crate::tile::{heat_capacity, Tile};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionStatus {
	None,
	Reacting,
	Stop,
}

impl ReactionStatus {
	fn combine(self, other: ReactionStatus) -> ReactionStatus {
		match (self, other) {
			(ReactionStatus::Stop, _) | (_, ReactionStatus::Stop) => ReactionStatus::Stop,
			(ReactionStatus::Reacting, _) | (_, ReactionStatus::Reacting) => {
				ReactionStatus::Reacting
			}
			_ => ReactionStatus::None,
		}
	}
}

fn apply_energy(tile: &mut Tile, energy: f32, specific_heats: &SpecificHeats, heat_scale: f32) {
	let hc = heat_capacity(&tile.moles, specific_heats, false);
	if hc > 0.0 && heat_scale != 0.0 {
		tile.temperature += energy / (hc * heat_scale);
	}
}

/// Rule 1: plasma fire. Distinct from the hotspot-driven plasma burn in
/// `hotspot.rs`'s `perform_hotspot_fire`, which skips the
/// `plasma_burn_rate_delta` division — see DESIGN.md divergence #2.
fn plasma_fire_reaction(tile: &mut Tile, constants: &AtmosConstants, specific_heats: &SpecificHeats, heat_scale: f32) -> ReactionStatus {
	let plasma = tile.moles[PLASMA];
	let oxygen = tile.moles[OXYGEN];
	if plasma < 0.5 || oxygen < 0.5 || tile.temperature < constants.plasma_minimum_burn_temperature {
		return ReactionStatus::None;
	}
	let temperature_scale = if tile.temperature > constants.plasma_upper_temperature {
		1.0
	} else {
		(tile.temperature - constants.plasma_minimum_burn_temperature)
			/ (constants.plasma_upper_temperature - constants.plasma_minimum_burn_temperature)
	};
	if temperature_scale <= 0.0 {
		return ReactionStatus::None;
	}
	let oxygen_burn_rate = constants.oxygen_burn_rate_base - temperature_scale;
	let plasma_burn_rate = if oxygen / plasma > constants.plasma_oxygen_fullburn {
		plasma * temperature_scale / constants.plasma_burn_rate_delta
	} else {
		(temperature_scale * (oxygen / plasma))
			/ (constants.plasma_burn_rate_delta * constants.plasma_oxygen_fullburn)
	};
	if plasma_burn_rate <= constants.gas_min_moles {
		return ReactionStatus::None;
	}
	let burned = plasma_burn_rate.min(plasma.min(oxygen / oxygen_burn_rate));
	if burned <= 0.0 {
		return ReactionStatus::None;
	}
	tile.moles[PLASMA] -= burned;
	tile.moles[OXYGEN] -= burned * oxygen_burn_rate;
	tile.moles[CARBON_DIOXIDE] += burned * 0.75;
	tile.moles[WATER_VAPOR] += burned * 0.25;
	let energy = constants.fire_plasma_energy_released * burned;
	apply_energy(tile, energy, specific_heats, heat_scale);
	tile.clamp_temperature(constants);
	ReactionStatus::Reacting
}

/// Rule 2: ambient tritium fire. Unlike the hotspot-driven burn, this path
/// has no `tritium_burn_trit_factor` cap — see DESIGN.md divergence #1.
fn tritium_fire_reaction(tile: &mut Tile, constants: &AtmosConstants, specific_heats: &SpecificHeats, heat_scale: f32) -> ReactionStatus {
	let tritium = tile.moles[TRITIUM];
	let oxygen = tile.moles[OXYGEN];
	if tritium < 0.5 || oxygen < 0.5 || tile.temperature < constants.plasma_minimum_burn_temperature
	{
		return ReactionStatus::None;
	}
	let burned = tritium.min(oxygen / constants.tritium_burn_oxy_factor);
	if burned <= 0.0 {
		return ReactionStatus::None;
	}
	tile.moles[TRITIUM] -= burned;
	tile.moles[OXYGEN] -= burned * constants.tritium_burn_oxy_factor;
	tile.moles[WATER_VAPOR] += burned;
	let energy = constants.fire_hydrogen_energy_released * burned;
	apply_energy(tile, energy, specific_heats, heat_scale);
	tile.clamp_temperature(constants);
	ReactionStatus::Reacting
}

/// Rule 3: frezon production from tritium + oxygen + nitrogen at low temps.
fn frezon_production_reaction(tile: &mut Tile, constants: &AtmosConstants) -> ReactionStatus {
	let tritium = tile.moles[TRITIUM];
	let oxygen = tile.moles[OXYGEN];
	let nitrogen = tile.moles[NITROGEN];
	if tritium < 0.5
		|| oxygen < 0.5
		|| nitrogen < 0.5
		|| tile.temperature > constants.frezon_cool_mid_temperature
	{
		return ReactionStatus::None;
	}
	let efficiency = ((constants.frezon_cool_mid_temperature - tile.temperature)
		/ (constants.frezon_cool_mid_temperature - 73.15))
		.clamp(0.0, 1.0);
	let tritium_used = tritium.min(oxygen / 50.0).min(nitrogen * 10.0);
	if tritium_used <= 0.0 {
		return ReactionStatus::None;
	}
	let frezon_produced = tritium_used * efficiency / 50.0;
	tile.moles[TRITIUM] -= tritium_used;
	tile.moles[OXYGEN] -= tritium_used * 50.0;
	tile.moles[NITROGEN] -= tritium_used / 10.0;
	tile.moles[FREZON] += frezon_produced;
	if frezon_produced > 0.0 {
		ReactionStatus::Reacting
	} else {
		ReactionStatus::None
	}
}

/// Rule 4: frezon coolant, consuming nitrogen to cool the tile.
fn frezon_coolant_reaction(tile: &mut Tile, constants: &AtmosConstants, specific_heats: &SpecificHeats, heat_scale: f32) -> ReactionStatus {
	let frezon = tile.moles[FREZON];
	let nitrogen = tile.moles[NITROGEN];
	if frezon < 0.5 || nitrogen < 0.5 || tile.temperature < constants.frezon_cool_lower_temperature {
		return ReactionStatus::None;
	}
	let span = constants.frezon_cool_mid_temperature - constants.frezon_cool_lower_temperature;
	let temperature_scale = if tile.temperature <= constants.frezon_cool_mid_temperature {
		(tile.temperature - constants.frezon_cool_lower_temperature) / span
	} else {
		1.0 + (tile.temperature - constants.frezon_cool_mid_temperature) / constants.frezon_cool_mid_temperature
	}
	.clamp(0.0, constants.frezon_cool_maximum_energy_modifier);
	let cooling_rate = frezon * temperature_scale * constants.frezon_cool_rate_modifier;
	let nitrogen_used = nitrogen.min(frezon * constants.frezon_nitrogen_cool_ratio);
	if nitrogen_used <= 0.0 {
		return ReactionStatus::None;
	}
	tile.moles[NITROGEN] -= nitrogen_used;
	let energy = constants.frezon_cool_energy_released * cooling_rate;
	apply_energy(tile, energy, specific_heats, heat_scale);
	tile.temperature = tile.temperature.max(constants.tcmb);
	ReactionStatus::Reacting
}

/// Rule 5: water vapor condensation, a pure mass sink with no energy term.
fn water_vapor_reaction(tile: &mut Tile, constants: &AtmosConstants) -> ReactionStatus {
	let water_vapor = tile.moles[WATER_VAPOR];
	if water_vapor < 0.5 || tile.temperature > constants.t0c + 100.0 {
		return ReactionStatus::None;
	}
	tile.moles[WATER_VAPOR] -= water_vapor * 0.05;
	ReactionStatus::Reacting
}

/// Rule 6: N2O decomposes into N2 and O2 at high temperature.
fn n2o_decomposition_reaction(tile: &mut Tile, constants: &AtmosConstants, specific_heats: &SpecificHeats, heat_scale: f32) -> ReactionStatus {
	let n2o = tile.moles[NITROUS_OXIDE];
	if n2o < 0.5 || tile.temperature < constants.t0c + 250.0 {
		return ReactionStatus::None;
	}
	let decomposed = n2o * 0.5;
	tile.moles[NITROUS_OXIDE] -= decomposed;
	tile.moles[NITROGEN] += decomposed;
	tile.moles[OXYGEN] += decomposed * 0.5;
	let energy = 20_000.0 * decomposed;
	apply_energy(tile, energy, specific_heats, heat_scale);
	tile.clamp_temperature(constants);
	ReactionStatus::Reacting
}

/// Rule 7: ammonia burns with oxygen into N2 and water vapor.
fn ammonia_oxygen_reaction(tile: &mut Tile, constants: &AtmosConstants) -> ReactionStatus {
	let ammonia = tile.moles[AMMONIA];
	let oxygen = tile.moles[OXYGEN];
	if ammonia < 0.5 || oxygen < 0.5 || tile.temperature < constants.t0c + 100.0 {
		return ReactionStatus::None;
	}
	let ammonia_used = ammonia.min(oxygen / 0.75) / 10.0;
	if ammonia_used <= 0.0 {
		return ReactionStatus::None;
	}
	tile.moles[AMMONIA] -= ammonia_used;
	tile.moles[OXYGEN] -= ammonia_used * 0.75;
	tile.moles[NITROGEN] += ammonia_used * 0.5;
	tile.moles[WATER_VAPOR] += ammonia_used * 1.5;
	ReactionStatus::Reacting
}

/// `react(tile, cfg)`: no-op for immutable tiles or tiles below the
/// 1000-unit thermal-energy floor, then runs the seven rules in their
/// fixed order, short-circuiting on `Stop` and otherwise accumulating
/// `Reacting`.
pub fn react(tile: &mut Tile, constants: &AtmosConstants, specific_heats: &SpecificHeats, heat_scale: f32) -> ReactionStatus {
	if tile.flags.contains(crate::flags::TileFlags::IMMUTABLE) {
		return ReactionStatus::None;
	}
	let hc = heat_capacity(&tile.moles, specific_heats, tile.flags.contains(crate::flags::TileFlags::SPACE));
	if tile.temperature * hc < 1000.0 {
		return ReactionStatus::None;
	}

	let mut status = ReactionStatus::None;
	macro_rules! run {
		($call:expr) => {{
			status = status.combine($call);
			if status == ReactionStatus::Stop {
				return status;
			}
		}};
	}
	run!(plasma_fire_reaction(tile, constants, specific_heats, heat_scale));
	run!(tritium_fire_reaction(tile, constants, specific_heats, heat_scale));
	run!(frezon_production_reaction(tile, constants));
	run!(frezon_coolant_reaction(tile, constants, specific_heats, heat_scale));
	run!(water_vapor_reaction(tile, constants));
	run!(n2o_decomposition_reaction(tile, constants, specific_heats, heat_scale));
	run!(ammonia_oxygen_reaction(tile, constants));
	status
}

#[cfg(test)]
mod tests {
	use super::*;

	fn tile_with(moles: &[(usize, f32)], temperature: f32) -> Tile {
		let mut t = Tile::default();
		t.temperature = temperature;
		for (idx, amt) in moles {
			t.moles[*idx] = *amt;
		}
		t
	}

	#[test]
	fn plasma_fire_consumes_fuel_and_raises_temperature() {
		let constants = AtmosConstants::default();
		let mut tile = tile_with(
			&[(PLASMA, 10.0), (OXYGEN, 30.0)],
			constants.plasma_upper_temperature + 100.0,
		);
		let before_temp = tile.temperature;
		let status = react(&mut tile, &constants, &DEFAULT_SPECIFIC_HEATS, 1.0);
		assert_eq!(status, ReactionStatus::Reacting);
		assert!(tile.moles[PLASMA] < 10.0);
		assert!(tile.moles[OXYGEN] < 30.0);
		assert!(tile.moles[CARBON_DIOXIDE] > 0.0);
		assert!(tile.moles[WATER_VAPOR] > 0.0);
		let ratio = tile.moles[CARBON_DIOXIDE] / tile.moles[WATER_VAPOR];
		assert!((ratio - 3.0).abs() < 0.01);
		assert!(tile.temperature > before_temp);
	}

	#[test]
	fn react_is_noop_below_thermal_energy_floor() {
		let constants = AtmosConstants::default();
		let mut tile = tile_with(&[(PLASMA, 10.0), (OXYGEN, 30.0)], constants.tcmb);
		let status = react(&mut tile, &constants, &DEFAULT_SPECIFIC_HEATS, 1.0);
		assert_eq!(status, ReactionStatus::None);
		assert_eq!(tile.moles[PLASMA], 10.0);
	}

	#[test]
	fn react_is_noop_for_immutable_tiles() {
		let constants = AtmosConstants::default();
		let mut tile = tile_with(
			&[(PLASMA, 10.0), (OXYGEN, 30.0)],
			constants.plasma_upper_temperature + 100.0,
		);
		tile.flags |= crate::flags::TileFlags::IMMUTABLE;
		let status = react(&mut tile, &constants, &DEFAULT_SPECIFIC_HEATS, 1.0);
		assert_eq!(status, ReactionStatus::None);
	}

	#[test]
	fn n2o_decomposition_releases_energy_and_splits_evenly() {
		let constants = AtmosConstants::default();
		let mut tile = tile_with(&[(NITROUS_OXIDE, 20.0)], constants.t0c + 300.0);
		let before = tile.temperature;
		let status = react(&mut tile, &constants, &DEFAULT_SPECIFIC_HEATS, 1.0);
		assert_eq!(status, ReactionStatus::Reacting);
		assert!((tile.moles[NITROUS_OXIDE] - 10.0).abs() < 0.01);
		assert!((tile.moles[NITROGEN] - 10.0).abs() < 0.01);
		assert!((tile.moles[OXYGEN] - 5.0).abs() < 0.01);
		assert!(tile.temperature > before);
	}
}
