//! The tile record and bulk primitives (component A): total moles,
//! pressure, heat capacity, thermal energy, archive, merge, split-by-ratio.
//!
//! Grounded on `gas/gas_mixture.rs`'s `merge`/`remove_ratio`/
//! `temperature_share` for style, and on `original_source/src/gases.cpp`
//! for the dense fixed-array formulas (`get_heat_capacity_impl`,
//! `merge_impl`, `remove_ratio_impl`) — unlike the teacher's sparse
//! bitvec-indexed `GasMixture`, this crate's tile uses a fixed `[f32; 12]`
//! array per the data model in SPEC_FULL.md §3.

use crate::constants::{AtmosConstants, GAS_ARRAY_SIZE, GAS_COUNT};
use crate::flags::TileFlags;

pub type Moles = [f32; GAS_ARRAY_SIZE];

/// One grid cell: a gas mixture, a temperature, and the scratch fields the
/// engine's algorithms thread state through across a cycle.
#[derive(Debug, Clone, Copy)]
pub struct Tile {
	pub moles: Moles,
	pub moles_archived: Moles,
	pub temperature: f32,
	pub temperature_archived: f32,

	pub heat_capacity: f32,
	pub thermal_conductivity: f32,

	pub pressure_difference: f32,
	pub current_transfer_direction: i8,
	pub current_transfer_amount: f32,
	pub transfer_directions: [f32; 4],

	pub last_share: f32,

	pub grid_x: i32,
	pub grid_y: i32,
	pub adjacent_indices: [i32; 4],
	pub adjacent_bits: u8,
	pub blocked_bits: u8,

	pub flags: TileFlags,

	pub hotspot_temperature: f32,
	pub hotspot_volume: f32,
	pub hotspot_state: u8,

	pub last_cycle: u64,
	pub last_queue_cycle: u64,
	pub last_slow_queue_cycle: u64,
	pub fast_done: bool,
	pub excited_group_id: Option<usize>,
}

impl Default for Tile {
	fn default() -> Self {
		Tile {
			moles: [0.0; GAS_ARRAY_SIZE],
			moles_archived: [0.0; GAS_ARRAY_SIZE],
			temperature: 2.7,
			temperature_archived: 2.7,
			heat_capacity: 0.0,
			thermal_conductivity: 0.0,
			pressure_difference: 0.0,
			current_transfer_direction: -1,
			current_transfer_amount: 0.0,
			transfer_directions: [0.0; 4],
			last_share: 0.0,
			grid_x: 0,
			grid_y: 0,
			adjacent_indices: [-1; 4],
			adjacent_bits: 0,
			blocked_bits: 0,
			flags: TileFlags::empty(),
			hotspot_temperature: 0.0,
			hotspot_volume: 0.0,
			hotspot_state: 0,
			last_cycle: 0,
			last_queue_cycle: 0,
			last_slow_queue_cycle: 0,
			fast_done: false,
			excited_group_id: None,
		}
	}
}

impl Tile {
	/// Sums the first `GAS_COUNT` entries of `moles`; padding slots never
	/// participate.
	pub fn total_moles(&self) -> f32 {
		self.moles[..GAS_COUNT].iter().sum()
	}

	pub fn total_moles_archived(&self) -> f32 {
		self.moles_archived[..GAS_COUNT].iter().sum()
	}

	/// `total_moles * R * T / V`; zero if `volume <= 0`.
	pub fn pressure(&self, constants: &AtmosConstants, volume: f32) -> f32 {
		if volume <= 0.0 {
			return 0.0;
		}
		self.total_moles() * constants.r_ideal_gas_equation * self.temperature / volume
	}

	/// Copies current moles and temperature into the archive fields.
	pub fn archive(&mut self) {
		self.moles_archived = self.moles;
		self.temperature_archived = self.temperature;
	}

	fn is_immutable(&self) -> bool {
		self.flags.contains(TileFlags::IMMUTABLE)
	}

	/// `merge(receiver, giverMoles, giverTemp, …)`: energy-weighted
	/// temperature blend (when the temperature delta and combined heat
	/// capacity clear their thresholds), then unconditional mole addition.
	/// No-op for an immutable receiver.
	pub fn merge(
		&mut self,
		giver_moles: &Moles,
		giver_temp: f32,
		specific_heats: &[f32; GAS_COUNT],
		min_temp_delta: f32,
		min_heat_capacity: f32,
	) {
		if self.is_immutable() {
			return;
		}
		self.blend_temperature(giver_moles, giver_temp, specific_heats, min_temp_delta, min_heat_capacity);
		for i in 0..GAS_ARRAY_SIZE {
			self.moles[i] += giver_moles[i];
		}
	}

	/// The temperature-blending half of `merge`, split out so callers that
	/// have already moved moles by some other path (equalization's
	/// `finalize_eq`, which explicitly transfers per-species amounts) can
	/// still get `merge`'s energy-weighted temperature recombination
	/// without adding the moles a second time — see DESIGN.md divergence
	/// #6.
	pub fn blend_temperature(
		&mut self,
		giver_moles: &Moles,
		giver_temp: f32,
		specific_heats: &[f32; GAS_COUNT],
		min_temp_delta: f32,
		min_heat_capacity: f32,
	) {
		if self.is_immutable() {
			return;
		}
		let giver_hc = heat_capacity(giver_moles, specific_heats, false);
		let self_hc = heat_capacity(&self.moles, specific_heats, false);
		let combined_hc = giver_hc + self_hc;
		if (self.temperature - giver_temp).abs() > min_temp_delta && combined_hc > min_heat_capacity
		{
			self.temperature =
				(giver_temp * giver_hc + self.temperature * self_hc) / combined_hc;
		}
	}

	/// `remove_gas(tile, amount, out)`: ratio = amount / total, delegates to
	/// `remove_ratio`. With zero total moles, `out` is zeroed at the tile's
	/// current temperature.
	pub fn remove_gas(&mut self, amount: f32, gas_min_moles: f32) -> Moles {
		let total = self.total_moles();
		if total <= 0.0 {
			return [0.0; GAS_ARRAY_SIZE];
		}
		self.remove_ratio(amount / total, gas_min_moles)
	}

	/// `remove_ratio(tile, ratio, out, gasMinMoles)`: clamps ratio to
	/// `[0,1]`, returns `ratio * moles` (temperature carried alongside by
	/// the caller via `self.temperature`), reduces the tile by that amount
	/// unless immutable, snapping species below `gas_min_moles` to zero.
	pub fn remove_ratio(&mut self, ratio: f32, gas_min_moles: f32) -> Moles {
		let ratio = ratio.clamp(0.0, 1.0);
		let mut out = [0.0; GAS_ARRAY_SIZE];
		for i in 0..GAS_ARRAY_SIZE {
			out[i] = self.moles[i] * ratio;
		}
		if !self.is_immutable() {
			for i in 0..GAS_ARRAY_SIZE {
				self.moles[i] -= out[i];
				if self.moles[i] < gas_min_moles {
					self.moles[i] = 0.0;
				}
			}
		}
		out
	}

	pub fn clamp_temperature(&mut self, constants: &AtmosConstants) {
		self.temperature = self.temperature.clamp(constants.tcmb, constants.tmax);
	}
}

/// `heat_capacity(moles, specificHeats, spaceFlag)`: `spaceHeatCapacity`
/// when `space_flag` and the mixture is near-empty; otherwise
/// `max(dot(moles, specificHeats), minimumHeatCapacity)`.
///
/// Takes the raw constant (7000.0) rather than `AtmosConstants` so bulk
/// primitives that only need a mixture's heat capacity (not a full tile)
/// can call it without threading a whole config through.
pub fn heat_capacity(moles: &Moles, specific_heats: &[f32; GAS_COUNT], space_flag: bool) -> f32 {
	if space_flag && moles[..GAS_COUNT].iter().sum::<f32>() < 1e-10 {
		return 7000.0;
	}
	let dot = moles[..GAS_COUNT]
		.iter()
		.zip(specific_heats.iter())
		.fold(0.0_f32, |acc, (m, h)| m.mul_add(*h, acc));
	dot.max(0.0003)
}

/// `thermal_energy(tile, …) = temperature * heat_capacity`.
pub fn thermal_energy(temperature: f32, heat_capacity: f32) -> f32 {
	temperature * heat_capacity
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::constants::DEFAULT_SPECIFIC_HEATS;

	fn standard_air() -> Moles {
		let mut m = [0.0; GAS_ARRAY_SIZE];
		m[crate::constants::OXYGEN] = 1840.0;
		m[crate::constants::NITROGEN] = 6928.0;
		m
	}

	#[test]
	fn heat_capacity_of_standard_air() {
		// 1840*20 + 6928*20 = 36800 + 138560 = 175,360
		let hc = heat_capacity(&standard_air(), &DEFAULT_SPECIFIC_HEATS, false);
		assert!((hc - 175_360.0).abs() < 1.0);
	}

	#[test]
	fn heat_capacity_space_tile_with_no_gas() {
		let hc = heat_capacity(&[0.0; GAS_ARRAY_SIZE], &DEFAULT_SPECIFIC_HEATS, true);
		assert_eq!(hc, 7000.0);
	}

	#[test]
	fn merge_blends_temperature_and_adds_moles() {
		let mut receiver = Tile::default();
		receiver.moles[crate::constants::OXYGEN] = 1840.0;
		receiver.temperature = 293.15;

		let mut giver_moles = [0.0; GAS_ARRAY_SIZE];
		giver_moles[crate::constants::OXYGEN] = 1840.0;
		let giver_temp = 1000.0;

		// receiver HC = 1840*20 = 36800, giver HC = 36800, combined 73600.
		// blended T = (1000*36800 + 293.15*36800) / 73600 = (1000+293.15)/2
		//           = 646.575
		receiver.merge(&giver_moles, giver_temp, &DEFAULT_SPECIFIC_HEATS, 0.0, 0.0003);
		assert!((receiver.temperature - 646.575).abs() < 0.01);
		assert!((receiver.moles[crate::constants::OXYGEN] - 3680.0).abs() < 0.001);
	}

	#[test]
	fn merge_skips_immutable_receiver() {
		let mut receiver = Tile::default();
		receiver.flags |= TileFlags::IMMUTABLE;
		receiver.moles[crate::constants::OXYGEN] = 10.0;
		receiver.temperature = 293.15;
		let mut giver_moles = [0.0; GAS_ARRAY_SIZE];
		giver_moles[crate::constants::OXYGEN] = 5000.0;
		receiver.merge(&giver_moles, 5000.0, &DEFAULT_SPECIFIC_HEATS, 0.0, 0.0003);
		assert_eq!(receiver.moles[crate::constants::OXYGEN], 10.0);
		assert_eq!(receiver.temperature, 293.15);
	}

	#[test]
	fn remove_ratio_preserves_composition() {
		let mut tile = Tile::default();
		tile.moles[crate::constants::OXYGEN] = 1840.0;
		tile.moles[crate::constants::NITROGEN] = 6928.0;
		let out = tile.remove_ratio(0.25, 0.00000005);
		assert!((out[crate::constants::OXYGEN] - 460.0).abs() < 0.01);
		assert!((out[crate::constants::NITROGEN] - 1732.0).abs() < 0.01);
		assert!((tile.moles[crate::constants::OXYGEN] - 1380.0).abs() < 0.01);
		assert!((tile.moles[crate::constants::NITROGEN] - 5196.0).abs() < 0.01);
	}

	#[test]
	fn remove_gas_with_zero_total_zeroes_output() {
		let mut tile = Tile::default();
		let out = tile.remove_gas(10.0, 0.00000005);
		assert_eq!(out, [0.0; GAS_ARRAY_SIZE]);
	}

	#[test]
	fn archive_mirrors_current_state() {
		let mut tile = Tile::default();
		tile.moles[crate::constants::PLASMA] = 42.0;
		tile.temperature = 500.0;
		tile.archive();
		assert_eq!(tile.moles_archived, tile.moles);
		assert_eq!(tile.temperature_archived, tile.temperature);
	}

	#[test]
	fn pressure_zero_volume_is_zero() {
		let tile = Tile::default();
		let constants = AtmosConstants::default();
		assert_eq!(tile.pressure(&constants, 0.0), 0.0);
		assert_eq!(tile.pressure(&constants, -5.0), 0.0);
	}
}
