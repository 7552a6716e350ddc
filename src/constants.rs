//! Physical constants and tunables, mirroring `atmos_constants_init_default`
//! and `AtmosConfig` from the original source exactly.

/// Number of distinct gas species the engine understands.
pub const GAS_COUNT: usize = 9;
/// Storage width per tile, padded for SIMD-friendly short runs.
pub const GAS_ARRAY_SIZE: usize = 12;
/// Cardinal directions a tile can have neighbors in.
pub const DIRECTIONS: usize = 4;

pub const DIR_NORTH: usize = 0;
pub const DIR_SOUTH: usize = 1;
pub const DIR_EAST: usize = 2;
pub const DIR_WEST: usize = 3;

/// Per-species indices into `moles`/`moles_archived`.
pub const OXYGEN: usize = 0;
pub const NITROGEN: usize = 1;
pub const CARBON_DIOXIDE: usize = 2;
pub const PLASMA: usize = 3;
pub const TRITIUM: usize = 4;
pub const WATER_VAPOR: usize = 5;
pub const AMMONIA: usize = 6;
pub const NITROUS_OXIDE: usize = 7;
pub const FREZON: usize = 8;

pub fn opposite_dir(dir: usize) -> usize {
	match dir {
		DIR_NORTH => DIR_SOUTH,
		DIR_SOUTH => DIR_NORTH,
		DIR_EAST => DIR_WEST,
		DIR_WEST => DIR_EAST,
		_ => dir,
	}
}

pub fn opposite_dir_bit(bit: u8) -> u8 {
	match bit {
		0b0001 => 0b0010,
		0b0010 => 0b0001,
		0b0100 => 0b1000,
		0b1000 => 0b0100,
		_ => bit,
	}
}

pub const ATMOS_DIR_BIT_ALL: u8 = 0b1111;

/// Per-species specific heats, in the fixed species order above.
pub type SpecificHeats = [f32; GAS_COUNT];

pub const DEFAULT_SPECIFIC_HEATS: SpecificHeats = [
	20.0,  // oxygen
	20.0,  // nitrogen
	30.0,  // carbon dioxide
	200.0, // plasma
	10.0,  // tritium
	40.0,  // water vapor
	20.0,  // ammonia
	40.0,  // nitrous oxide
	600.0, // frezon
];

/// Physical and tuning constants, all configurable by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtmosConstants {
	pub r_ideal_gas_equation: f32,
	pub one_atmosphere: f32,
	pub tcmb: f32,
	pub t0c: f32,
	pub t20c: f32,
	pub tmax: f32,
	pub cell_volume: f32,
	pub gas_min_moles: f32,
	pub open_heat_transfer_coefficient: f32,
	pub heat_capacity_vacuum: f32,
	pub minimum_air_ratio_to_suspend: f32,
	pub minimum_air_ratio_to_move: f32,
	pub moles_cell_standard: f32,
	pub minimum_air_to_suspend: f32,
	pub minimum_moles_delta_to_move: f32,
	pub minimum_temperature_to_move: f32,
	pub minimum_temperature_delta_to_suspend: f32,
	pub minimum_temperature_delta_to_consider: f32,
	pub minimum_temperature_start_super_conduction: f32,
	pub minimum_temperature_for_superconduction: f32,
	pub minimum_heat_capacity: f32,
	pub space_heat_capacity: f32,
	pub fire_minimum_temperature_to_exist: f32,
	pub fire_minimum_temperature_to_spread: f32,
	pub fire_spread_radiosity_scale: f32,
	pub fire_plasma_energy_released: f32,
	pub fire_hydrogen_energy_released: f32,
	pub fire_growth_rate: f32,
	pub plasma_minimum_burn_temperature: f32,
	pub plasma_upper_temperature: f32,
	pub plasma_oxygen_fullburn: f32,
	pub plasma_burn_rate_delta: f32,
	pub oxygen_burn_rate_base: f32,
	pub super_saturation_threshold: f32,
	pub tritium_burn_oxy_factor: f32,
	pub tritium_burn_trit_factor: f32,
	pub frezon_cool_lower_temperature: f32,
	pub frezon_cool_mid_temperature: f32,
	pub frezon_cool_maximum_energy_modifier: f32,
	pub frezon_nitrogen_cool_ratio: f32,
	pub frezon_cool_energy_released: f32,
	pub frezon_cool_rate_modifier: f32,
	pub window_heat_transfer_coefficient: f32,
	pub mcell_with_ratio: f32,
	pub excited_group_breakdown_cycles: u32,
	pub excited_groups_dismantle_cycles: u32,
	pub monstermos_hard_tile_limit: usize,
	pub monstermos_tile_limit: usize,
}

impl Default for AtmosConstants {
	fn default() -> Self {
		let t0c = 273.15;
		let t20c = 293.15;
		let one_atmosphere = 101.325;
		let cell_volume = 2500.0;
		let r = 8.314_462_6;
		let moles_cell_standard = one_atmosphere * cell_volume / (t20c * r);
		let minimum_air_ratio_to_suspend = 0.1;
		let minimum_air_ratio_to_move = 0.001;
		AtmosConstants {
			r_ideal_gas_equation: r,
			one_atmosphere,
			tcmb: 2.7,
			t0c,
			t20c,
			tmax: 262_144.0,
			cell_volume,
			gas_min_moles: 0.000_000_05,
			open_heat_transfer_coefficient: 0.4,
			heat_capacity_vacuum: 7000.0,
			minimum_air_ratio_to_suspend,
			minimum_air_ratio_to_move,
			moles_cell_standard,
			minimum_air_to_suspend: moles_cell_standard * minimum_air_ratio_to_suspend,
			minimum_moles_delta_to_move: moles_cell_standard * minimum_air_ratio_to_move,
			minimum_temperature_to_move: t20c + 100.0,
			minimum_temperature_delta_to_suspend: 4.0,
			minimum_temperature_delta_to_consider: 0.01,
			minimum_temperature_start_super_conduction: t20c + 400.0,
			minimum_temperature_for_superconduction: t20c + 80.0,
			minimum_heat_capacity: 0.0003,
			space_heat_capacity: 7000.0,
			fire_minimum_temperature_to_exist: t0c + 100.0,
			fire_minimum_temperature_to_spread: t0c + 150.0,
			fire_spread_radiosity_scale: 0.85,
			fire_plasma_energy_released: 160_000.0,
			fire_hydrogen_energy_released: 284_000.0,
			fire_growth_rate: 40_000.0,
			plasma_minimum_burn_temperature: t0c + 100.0,
			plasma_upper_temperature: t0c + 1370.0,
			plasma_oxygen_fullburn: 10.0,
			plasma_burn_rate_delta: 9.0,
			oxygen_burn_rate_base: 1.4,
			super_saturation_threshold: 96.0,
			tritium_burn_oxy_factor: 100.0,
			tritium_burn_trit_factor: 10.0,
			frezon_cool_lower_temperature: 23.15,
			frezon_cool_mid_temperature: 373.15,
			frezon_cool_maximum_energy_modifier: 10.0,
			frezon_nitrogen_cool_ratio: 5.0,
			frezon_cool_energy_released: -600_000.0,
			frezon_cool_rate_modifier: 20.0,
			window_heat_transfer_coefficient: 0.1,
			mcell_with_ratio: moles_cell_standard * 0.005,
			excited_group_breakdown_cycles: 4,
			excited_groups_dismantle_cycles: 16,
			monstermos_hard_tile_limit: 2000,
			monstermos_tile_limit: 200,
		}
	}
}

/// Runtime-configurable feature flags and tunables, analogous to the
/// teacher's compile-time cargo features but exposed as plain booleans
/// since the spec requires per-host runtime configurability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtmosConfig {
	pub gas_specific_heats: SpecificHeats,
	pub constants: AtmosConstants,
	pub monstermos_enabled: bool,
	pub excited_groups_enabled: bool,
	pub superconduction_enabled: bool,
	pub spacing_enabled: bool,
	pub spacing_escape_ratio: f32,
	pub spacing_min_gas: f32,
	pub spacing_max_wind: f32,
	pub max_process_time_microseconds: u64,
	pub speedup: f32,
	pub heat_scale: f32,
}

impl Default for AtmosConfig {
	fn default() -> Self {
		AtmosConfig {
			gas_specific_heats: DEFAULT_SPECIFIC_HEATS,
			constants: AtmosConstants::default(),
			monstermos_enabled: true,
			excited_groups_enabled: true,
			superconduction_enabled: true,
			spacing_enabled: true,
			spacing_escape_ratio: 0.9,
			spacing_min_gas: 2.0,
			spacing_max_wind: 500.0,
			max_process_time_microseconds: 5000,
			speedup: 1.0,
			heat_scale: 1.0,
		}
	}
}

/// `config_init_default` entry point (§6): a named constructor identical to
/// `AtmosConfig::default()`, kept as a free function so the `ffi` facade has
/// a stable C-callable name to bind to.
pub fn config_init_default() -> AtmosConfig {
	AtmosConfig::default()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn moles_cell_standard_matches_ideal_gas_law() {
		let c = AtmosConstants::default();
		// one_atmosphere * cell_volume / (T20C * R) ~ 3,188.34 moles
		assert!((c.moles_cell_standard - 3188.34).abs() < 1.0);
	}

	#[test]
	fn default_specific_heats_in_species_order() {
		assert_eq!(DEFAULT_SPECIFIC_HEATS[OXYGEN], 20.0);
		assert_eq!(DEFAULT_SPECIFIC_HEATS[FREZON], 600.0);
	}
}
