//! The `extern "C"` facade (component L, §6). Every function here follows
//! the silent-null-guard contract literally: a null pointer or
//! out-of-range index is a no-op / safe default, never a panic.
//!
//! Grounded on `original_source/include/atmos_api.h` (function surface)
//! and `atmos_types.h` (`TileAtmosData`/`AtmosConstants`/`AtmosConfig`/
//! `AtmosResult` C layouts). The teacher's crate is `cdylib` for the same
//! reason — a foreign host links against it as a shared library — though
//! the teacher binds to BYOND specifically via `auxtools`, while this
//! facade is a plain C ABI any host can call.
//!
//! `get_tile`/`get_tiles_ptr` hand back pointers into a `CTileData` mirror
//! synced from the safe `Tile` array on each call, rather than aliasing
//! engine-internal storage directly — `Tile` is not `#[repr(C)]`
//! layout-compatible with the original's packed struct. See DESIGN.md
//! divergence #7. Writes only ever go back through `update_tile` and the
//! other explicit mutating entry points.

use crate::constants::{AtmosConfig, AtmosConstants, GAS_ARRAY_SIZE, GAS_COUNT};
use crate::flags::TileFlags;
use crate::grid::GridState;
use crate::tile::Tile;

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CTileData {
	pub moles: [f32; GAS_ARRAY_SIZE],
	pub moles_archived: [f32; GAS_ARRAY_SIZE],
	pub temperature: f32,
	pub temperature_archived: f32,
	pub heat_capacity: f32,
	pub thermal_conductivity: f32,
	pub pressure_difference: f32,
	pub last_share: f32,

	pub grid_x: i32,
	pub grid_y: i32,
	pub adjacent_indices: [i32; 4],

	pub adjacent_bits: u8,
	pub blocked_bits: u8,
	pub flags: u8,
	pub hotspot_state: u8,

	pub hotspot_temperature: f32,
	pub hotspot_volume: f32,

	pub mole_delta: f32,
	pub transfer_directions: [f32; 4],
	pub current_transfer_amount: f32,
	pub current_transfer_direction: i32,

	pub last_cycle: i32,
	pub last_queue_cycle: i32,
	pub last_slow_queue_cycle: i32,
	pub excited_group_id: i32,

	pub fast_done: u8,
	pub padding: [u8; 3],
}

impl From<&Tile> for CTileData {
	fn from(t: &Tile) -> Self {
		CTileData {
			moles: t.moles,
			moles_archived: t.moles_archived,
			temperature: t.temperature,
			temperature_archived: t.temperature_archived,
			heat_capacity: t.heat_capacity,
			thermal_conductivity: t.thermal_conductivity,
			pressure_difference: t.pressure_difference,
			last_share: t.last_share,
			grid_x: t.grid_x,
			grid_y: t.grid_y,
			adjacent_indices: t.adjacent_indices,
			adjacent_bits: t.adjacent_bits,
			blocked_bits: t.blocked_bits,
			flags: t.flags.bits() as u8,
			hotspot_state: t.hotspot_state,
			hotspot_temperature: t.hotspot_temperature,
			hotspot_volume: t.hotspot_volume,
			mole_delta: 0.0,
			transfer_directions: t.transfer_directions,
			current_transfer_amount: t.current_transfer_amount,
			current_transfer_direction: t.current_transfer_direction as i32,
			last_cycle: t.last_cycle as i32,
			last_queue_cycle: t.last_queue_cycle as i32,
			last_slow_queue_cycle: t.last_slow_queue_cycle as i32,
			excited_group_id: t.excited_group_id.map(|g| g as i32).unwrap_or(-1),
			fast_done: t.fast_done as u8,
			padding: [0; 3],
		}
	}
}

impl From<&CTileData> for Tile {
	fn from(c: &CTileData) -> Self {
		Tile {
			moles: c.moles,
			moles_archived: c.moles_archived,
			temperature: c.temperature,
			temperature_archived: c.temperature_archived,
			heat_capacity: c.heat_capacity,
			thermal_conductivity: c.thermal_conductivity,
			pressure_difference: c.pressure_difference,
			current_transfer_direction: c.current_transfer_direction as i8,
			current_transfer_amount: c.current_transfer_amount,
			transfer_directions: c.transfer_directions,
			last_share: c.last_share,
			grid_x: c.grid_x,
			grid_y: c.grid_y,
			adjacent_indices: c.adjacent_indices,
			adjacent_bits: c.adjacent_bits,
			blocked_bits: c.blocked_bits,
			flags: TileFlags::from_bits_truncate(c.flags as u32),
			hotspot_temperature: c.hotspot_temperature,
			hotspot_volume: c.hotspot_volume,
			hotspot_state: c.hotspot_state,
			last_cycle: c.last_cycle.max(0) as u64,
			last_queue_cycle: c.last_queue_cycle.max(0) as u64,
			last_slow_queue_cycle: c.last_slow_queue_cycle.max(0) as u64,
			fast_done: c.fast_done != 0,
			excited_group_id: if c.excited_group_id >= 0 { Some(c.excited_group_id as usize) } else { None },
		}
	}
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CAtmosConstants {
	pub r: f32,
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
	pub minimum_air_to_suspend: f32,
	pub minimum_temperature_to_move: f32,
	pub minimum_moles_delta_to_move: f32,
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
	pub excited_group_breakdown_cycles: i32,
	pub excited_groups_dismantle_cycles: i32,
	pub monstermos_hard_tile_limit: i32,
	pub monstermos_tile_limit: i32,
}

impl From<&AtmosConstants> for CAtmosConstants {
	fn from(c: &AtmosConstants) -> Self {
		CAtmosConstants {
			r: c.r_ideal_gas_equation,
			one_atmosphere: c.one_atmosphere,
			tcmb: c.tcmb,
			t0c: c.t0c,
			t20c: c.t20c,
			tmax: c.tmax,
			cell_volume: c.cell_volume,
			gas_min_moles: c.gas_min_moles,
			open_heat_transfer_coefficient: c.open_heat_transfer_coefficient,
			heat_capacity_vacuum: c.heat_capacity_vacuum,
			minimum_air_ratio_to_suspend: c.minimum_air_ratio_to_suspend,
			minimum_air_ratio_to_move: c.minimum_air_ratio_to_move,
			minimum_air_to_suspend: c.minimum_air_to_suspend,
			minimum_temperature_to_move: c.minimum_temperature_to_move,
			minimum_moles_delta_to_move: c.minimum_moles_delta_to_move,
			minimum_temperature_delta_to_suspend: c.minimum_temperature_delta_to_suspend,
			minimum_temperature_delta_to_consider: c.minimum_temperature_delta_to_consider,
			minimum_temperature_start_super_conduction: c.minimum_temperature_start_super_conduction,
			minimum_temperature_for_superconduction: c.minimum_temperature_for_superconduction,
			minimum_heat_capacity: c.minimum_heat_capacity,
			space_heat_capacity: c.space_heat_capacity,
			fire_minimum_temperature_to_exist: c.fire_minimum_temperature_to_exist,
			fire_minimum_temperature_to_spread: c.fire_minimum_temperature_to_spread,
			fire_spread_radiosity_scale: c.fire_spread_radiosity_scale,
			fire_plasma_energy_released: c.fire_plasma_energy_released,
			fire_hydrogen_energy_released: c.fire_hydrogen_energy_released,
			fire_growth_rate: c.fire_growth_rate,
			plasma_minimum_burn_temperature: c.plasma_minimum_burn_temperature,
			plasma_upper_temperature: c.plasma_upper_temperature,
			plasma_oxygen_fullburn: c.plasma_oxygen_fullburn,
			plasma_burn_rate_delta: c.plasma_burn_rate_delta,
			oxygen_burn_rate_base: c.oxygen_burn_rate_base,
			super_saturation_threshold: c.super_saturation_threshold,
			tritium_burn_oxy_factor: c.tritium_burn_oxy_factor,
			tritium_burn_trit_factor: c.tritium_burn_trit_factor,
			frezon_cool_lower_temperature: c.frezon_cool_lower_temperature,
			frezon_cool_mid_temperature: c.frezon_cool_mid_temperature,
			frezon_cool_maximum_energy_modifier: c.frezon_cool_maximum_energy_modifier,
			frezon_nitrogen_cool_ratio: c.frezon_nitrogen_cool_ratio,
			frezon_cool_energy_released: c.frezon_cool_energy_released,
			frezon_cool_rate_modifier: c.frezon_cool_rate_modifier,
			window_heat_transfer_coefficient: c.window_heat_transfer_coefficient,
			mcell_with_ratio: c.mcell_with_ratio,
			excited_group_breakdown_cycles: c.excited_group_breakdown_cycles as i32,
			excited_groups_dismantle_cycles: c.excited_groups_dismantle_cycles as i32,
			monstermos_hard_tile_limit: c.monstermos_hard_tile_limit as i32,
			monstermos_tile_limit: c.monstermos_tile_limit as i32,
		}
	}
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CAtmosConfig {
	pub gas_specific_heats: [f32; GAS_ARRAY_SIZE],
	pub constants: CAtmosConstants,
	pub max_process_time_microseconds: i32,
	pub speedup: f32,
	pub heat_scale: f32,
	pub monstermos_enabled: u8,
	pub excited_groups_enabled: u8,
	pub superconduction_enabled: u8,
	pub spacing_enabled: u8,
	pub spacing_escape_ratio: f32,
	pub spacing_min_gas: f32,
	pub spacing_max_wind: f32,
}

impl From<&CAtmosConfig> for AtmosConfig {
	fn from(c: &CAtmosConfig) -> Self {
		let mut gas_specific_heats = [0.0; GAS_COUNT];
		gas_specific_heats.copy_from_slice(&c.gas_specific_heats[..GAS_COUNT]);
		AtmosConfig {
			gas_specific_heats,
			constants: AtmosConstants {
				r_ideal_gas_equation: c.constants.r,
				one_atmosphere: c.constants.one_atmosphere,
				tcmb: c.constants.tcmb,
				t0c: c.constants.t0c,
				t20c: c.constants.t20c,
				tmax: c.constants.tmax,
				cell_volume: c.constants.cell_volume,
				gas_min_moles: c.constants.gas_min_moles,
				open_heat_transfer_coefficient: c.constants.open_heat_transfer_coefficient,
				heat_capacity_vacuum: c.constants.heat_capacity_vacuum,
				minimum_air_ratio_to_suspend: c.constants.minimum_air_ratio_to_suspend,
				minimum_air_ratio_to_move: c.constants.minimum_air_ratio_to_move,
				moles_cell_standard: c.constants.one_atmosphere * c.constants.cell_volume / (c.constants.t20c * c.constants.r),
				minimum_air_to_suspend: c.constants.minimum_air_to_suspend,
				minimum_moles_delta_to_move: c.constants.minimum_moles_delta_to_move,
				minimum_temperature_to_move: c.constants.minimum_temperature_to_move,
				minimum_temperature_delta_to_suspend: c.constants.minimum_temperature_delta_to_suspend,
				minimum_temperature_delta_to_consider: c.constants.minimum_temperature_delta_to_consider,
				minimum_temperature_start_super_conduction: c.constants.minimum_temperature_start_super_conduction,
				minimum_temperature_for_superconduction: c.constants.minimum_temperature_for_superconduction,
				minimum_heat_capacity: c.constants.minimum_heat_capacity,
				space_heat_capacity: c.constants.space_heat_capacity,
				fire_minimum_temperature_to_exist: c.constants.fire_minimum_temperature_to_exist,
				fire_minimum_temperature_to_spread: c.constants.fire_minimum_temperature_to_spread,
				fire_spread_radiosity_scale: c.constants.fire_spread_radiosity_scale,
				fire_plasma_energy_released: c.constants.fire_plasma_energy_released,
				fire_hydrogen_energy_released: c.constants.fire_hydrogen_energy_released,
				fire_growth_rate: c.constants.fire_growth_rate,
				plasma_minimum_burn_temperature: c.constants.plasma_minimum_burn_temperature,
				plasma_upper_temperature: c.constants.plasma_upper_temperature,
				plasma_oxygen_fullburn: c.constants.plasma_oxygen_fullburn,
				plasma_burn_rate_delta: c.constants.plasma_burn_rate_delta,
				oxygen_burn_rate_base: c.constants.oxygen_burn_rate_base,
				super_saturation_threshold: c.constants.super_saturation_threshold,
				tritium_burn_oxy_factor: c.constants.tritium_burn_oxy_factor,
				tritium_burn_trit_factor: c.constants.tritium_burn_trit_factor,
				frezon_cool_lower_temperature: c.constants.frezon_cool_lower_temperature,
				frezon_cool_mid_temperature: c.constants.frezon_cool_mid_temperature,
				frezon_cool_maximum_energy_modifier: c.constants.frezon_cool_maximum_energy_modifier,
				frezon_nitrogen_cool_ratio: c.constants.frezon_nitrogen_cool_ratio,
				frezon_cool_energy_released: c.constants.frezon_cool_energy_released,
				frezon_cool_rate_modifier: c.constants.frezon_cool_rate_modifier,
				window_heat_transfer_coefficient: c.constants.window_heat_transfer_coefficient,
				mcell_with_ratio: c.constants.mcell_with_ratio,
				excited_group_breakdown_cycles: c.constants.excited_group_breakdown_cycles.max(0) as u32,
				excited_groups_dismantle_cycles: c.constants.excited_groups_dismantle_cycles.max(0) as u32,
				monstermos_hard_tile_limit: c.constants.monstermos_hard_tile_limit.max(0) as usize,
				monstermos_tile_limit: c.constants.monstermos_tile_limit.max(0) as usize,
			},
			monstermos_enabled: c.monstermos_enabled != 0,
			excited_groups_enabled: c.excited_groups_enabled != 0,
			superconduction_enabled: c.superconduction_enabled != 0,
			spacing_enabled: c.spacing_enabled != 0,
			spacing_escape_ratio: c.spacing_escape_ratio,
			spacing_min_gas: c.spacing_min_gas,
			spacing_max_wind: c.spacing_max_wind,
			max_process_time_microseconds: c.max_process_time_microseconds.max(0) as u64,
			speedup: c.speedup,
			heat_scale: c.heat_scale,
		}
	}
}

impl From<&AtmosConfig> for CAtmosConfig {
	fn from(cfg: &AtmosConfig) -> Self {
		let mut gas_specific_heats = [0.0; GAS_ARRAY_SIZE];
		gas_specific_heats[..GAS_COUNT].copy_from_slice(&cfg.gas_specific_heats);
		CAtmosConfig {
			gas_specific_heats,
			constants: CAtmosConstants::from(&cfg.constants),
			max_process_time_microseconds: cfg.max_process_time_microseconds as i32,
			speedup: cfg.speedup,
			heat_scale: cfg.heat_scale,
			monstermos_enabled: cfg.monstermos_enabled as u8,
			excited_groups_enabled: cfg.excited_groups_enabled as u8,
			superconduction_enabled: cfg.superconduction_enabled as u8,
			spacing_enabled: cfg.spacing_enabled as u8,
			spacing_escape_ratio: cfg.spacing_escape_ratio,
			spacing_min_gas: cfg.spacing_min_gas,
			spacing_max_wind: cfg.spacing_max_wind,
		}
	}
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct CAtmosResult {
	pub tiles_processed: i32,
	pub active_tiles_count: i32,
	pub hotspot_tiles_count: i32,
	pub superconduct_tiles_count: i32,
	pub excited_groups_count: i32,
	pub reactions_triggered: i32,
	pub max_pressure_delta: f32,
	pub processing_complete: u8,
	pub padding: [u8; 3],
}

impl From<crate::grid::AtmosResult> for CAtmosResult {
	fn from(r: crate::grid::AtmosResult) -> Self {
		CAtmosResult {
			tiles_processed: r.tiles_processed as i32,
			active_tiles_count: r.active_count as i32,
			hotspot_tiles_count: r.hotspot_count as i32,
			superconduct_tiles_count: r.superconduct_count as i32,
			excited_groups_count: r.excited_group_count as i32,
			reactions_triggered: r.reactions_triggered as i32,
			max_pressure_delta: r.max_pressure_delta,
			processing_complete: r.processing_complete as u8,
			padding: [0; 3],
		}
	}
}

/// Opaque handle type the host holds a pointer to. Carries the safe
/// `GridState` plus the read-view mirror described above.
pub struct GridAtmosState {
	inner: GridState,
	mirror: Vec<CTileData>,
}

impl GridAtmosState {
	fn sync_mirror(&mut self) {
		self.mirror.clear();
		self.mirror.extend(self.inner.tiles.iter().map(CTileData::from));
	}
}

macro_rules! guard {
	($ptr:expr) => {
		match unsafe { $ptr.as_mut() } {
			Some(s) => s,
			None => return Default::default(),
		}
	};
}

macro_rules! guard_ref {
	($ptr:expr) => {
		match unsafe { $ptr.as_ref() } {
			Some(s) => s,
			None => return Default::default(),
		}
	};
}

#[no_mangle]
pub extern "C" fn atmos_get_version() -> u32 {
	let version = env!("CARGO_PKG_VERSION");
	let mut parts = version.split('.');
	let major: u32 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(0);
	let minor: u32 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(0);
	let patch: u32 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(0);
	(major << 16) | (minor << 8) | patch
}

#[no_mangle]
pub extern "C" fn atmos_get_simd_level() -> u32 {
	crate::simd::get_simd_level() as u32
}

#[no_mangle]
pub extern "C" fn atmos_create_grid(initial_capacity: i32) -> *mut GridAtmosState {
	let capacity = if initial_capacity > 0 { initial_capacity as usize } else { 0 };
	let state = Box::new(GridAtmosState { inner: GridState::new(capacity), mirror: Vec::new() });
	Box::into_raw(state)
}

/// # Safety
/// `state` must be either null or a pointer previously returned by
/// `atmos_create_grid` and not yet destroyed.
#[no_mangle]
pub unsafe extern "C" fn atmos_destroy_grid(state: *mut GridAtmosState) {
	if state.is_null() {
		return;
	}
	drop(Box::from_raw(state));
}

#[no_mangle]
pub extern "C" fn atmos_reset_grid(state: *mut GridAtmosState) {
	let state = guard!(state);
	state.inner.reset();
	state.mirror.clear();
}

#[no_mangle]
pub extern "C" fn atmos_add_tile(state: *mut GridAtmosState, tile: *const CTileData) -> i32 {
	let state = match unsafe { state.as_mut() } {
		Some(s) => s,
		None => return -1,
	};
	let tile = match unsafe { tile.as_ref() } {
		Some(t) => t,
		None => return -1,
	};
	state.inner.add_tile(Tile::from(tile)) as i32
}

#[no_mangle]
pub extern "C" fn atmos_update_tile(state: *mut GridAtmosState, index: i32, tile: *const CTileData) {
	let state = guard!(state);
	let tile = match unsafe { tile.as_ref() } {
		Some(t) => t,
		None => return,
	};
	if index < 0 {
		return;
	}
	state.inner.update_tile(index as usize, Tile::from(tile));
}

#[no_mangle]
pub extern "C" fn atmos_get_tile(state: *mut GridAtmosState, index: i32) -> *mut CTileData {
	let state = match unsafe { state.as_mut() } {
		Some(s) => s,
		None => return std::ptr::null_mut(),
	};
	if index < 0 || index as usize >= state.inner.tiles.len() {
		return std::ptr::null_mut();
	}
	state.sync_mirror();
	&mut state.mirror[index as usize] as *mut CTileData
}

#[no_mangle]
pub extern "C" fn atmos_get_tiles_ptr(state: *mut GridAtmosState) -> *mut CTileData {
	let state = match unsafe { state.as_mut() } {
		Some(s) => s,
		None => return std::ptr::null_mut(),
	};
	state.sync_mirror();
	state.mirror.as_mut_ptr()
}

#[no_mangle]
pub extern "C" fn atmos_get_tile_count(state: *const GridAtmosState) -> i32 {
	let state = guard_ref!(state);
	state.inner.tile_count() as i32
}

#[no_mangle]
pub extern "C" fn atmos_get_active_tile_count(state: *const GridAtmosState) -> i32 {
	let state = guard_ref!(state);
	state.inner.active_tiles.len() as i32
}

#[no_mangle]
pub extern "C" fn atmos_set_adjacency(state: *mut GridAtmosState, tile_index: i32, direction: i32, adjacent_index: i32) {
	let state = guard!(state);
	if tile_index < 0 || direction < 0 {
		return;
	}
	state.inner.set_adjacency(tile_index as usize, direction as usize, adjacent_index);
}

#[no_mangle]
pub extern "C" fn atmos_add_active_tile(state: *mut GridAtmosState, tile_index: i32) {
	let state = guard!(state);
	if tile_index < 0 {
		return;
	}
	state.inner.add_active_tile(tile_index as usize);
}

#[no_mangle]
pub extern "C" fn atmos_remove_active_tile(state: *mut GridAtmosState, tile_index: i32) {
	let state = guard!(state);
	if tile_index < 0 {
		return;
	}
	state.inner.remove_active_tile(tile_index as usize);
}

fn config_from_ptr(config: *const CAtmosConfig) -> Option<AtmosConfig> {
	unsafe { config.as_ref() }.map(AtmosConfig::from)
}

#[no_mangle]
pub extern "C" fn atmos_process(state: *mut GridAtmosState, config: *const CAtmosConfig) -> CAtmosResult {
	let state = guard!(state);
	let Some(config) = config_from_ptr(config) else { return CAtmosResult::default() };
	CAtmosResult::from(state.inner.process(&config))
}

#[no_mangle]
pub extern "C" fn atmos_process_revalidate(state: *mut GridAtmosState, _config: *const CAtmosConfig) -> CAtmosResult {
	let state = guard!(state);
	state.inner.process_revalidate();
	CAtmosResult { processing_complete: 1, ..Default::default() }
}

#[no_mangle]
pub extern "C" fn atmos_process_active_tiles(state: *mut GridAtmosState, config: *const CAtmosConfig) -> CAtmosResult {
	let state = guard!(state);
	let Some(config) = config_from_ptr(config) else { return CAtmosResult::default() };
	let mut processed = 0;
	let mut reactions = 0;
	let complete = state.inner.process_active_tiles(&config, &mut processed, &mut reactions);
	CAtmosResult {
		tiles_processed: processed as i32,
		reactions_triggered: reactions as i32,
		processing_complete: complete as u8,
		active_tiles_count: state.inner.active_tiles.len() as i32,
		..Default::default()
	}
}

#[no_mangle]
pub extern "C" fn atmos_process_excited_groups(state: *mut GridAtmosState, config: *const CAtmosConfig) -> CAtmosResult {
	let state = guard!(state);
	let Some(config) = config_from_ptr(config) else { return CAtmosResult::default() };
	state.inner.process_excited_groups(&config);
	CAtmosResult { excited_groups_count: state.inner.excited_groups.count() as i32, processing_complete: 1, ..Default::default() }
}

#[no_mangle]
pub extern "C" fn atmos_process_hotspots(state: *mut GridAtmosState, config: *const CAtmosConfig) -> CAtmosResult {
	let state = guard!(state);
	let Some(config) = config_from_ptr(config) else { return CAtmosResult::default() };
	state.inner.process_hotspots(&config);
	CAtmosResult { hotspot_tiles_count: state.inner.hotspot_tiles.len() as i32, processing_complete: 1, ..Default::default() }
}

#[no_mangle]
pub extern "C" fn atmos_process_superconductivity(state: *mut GridAtmosState, config: *const CAtmosConfig) -> CAtmosResult {
	let state = guard!(state);
	let Some(config) = config_from_ptr(config) else { return CAtmosResult::default() };
	state.inner.process_superconductivity(&config);
	CAtmosResult { superconduct_tiles_count: state.inner.superconduct_tiles.len() as i32, processing_complete: 1, ..Default::default() }
}

#[no_mangle]
pub extern "C" fn atmos_process_high_pressure(state: *mut GridAtmosState, _config: *const CAtmosConfig) -> CAtmosResult {
	let state = guard!(state);
	state.inner.process_high_pressure();
	CAtmosResult { max_pressure_delta: state.inner.max_pressure_delta, processing_complete: 1, ..Default::default() }
}

#[no_mangle]
pub extern "C" fn atmos_equalize_pressure_zone(state: *mut GridAtmosState, start_tile: i32, config: *const CAtmosConfig) -> CAtmosResult {
	let state = guard!(state);
	let Some(config) = config_from_ptr(config) else { return CAtmosResult::default() };
	if start_tile < 0 {
		return CAtmosResult::default();
	}
	state.inner.equalize_pressure_zone(start_tile as usize, &config);
	CAtmosResult { processing_complete: 1, max_pressure_delta: state.inner.max_pressure_delta, ..Default::default() }
}

#[no_mangle]
pub extern "C" fn atmos_explosive_depressurize(state: *mut GridAtmosState, start_tile: i32, config: *const CAtmosConfig) -> CAtmosResult {
	let state = guard!(state);
	let Some(config) = config_from_ptr(config) else { return CAtmosResult::default() };
	if start_tile < 0 {
		return CAtmosResult::default();
	}
	state.inner.explosive_depressurize(start_tile as usize, &config);
	CAtmosResult { processing_complete: 1, ..Default::default() }
}

#[no_mangle]
pub extern "C" fn atmos_ignite_hotspot(state: *mut GridAtmosState, tile_index: i32, temperature: f32, volume: f32) {
	let state = guard!(state);
	if tile_index < 0 || tile_index as usize >= state.inner.tiles.len() {
		return;
	}
	let constants = AtmosConstants::default();
	if crate::hotspot::ignite(&mut state.inner.tiles[tile_index as usize], temperature, volume, &constants) {
		state.inner.add_hotspot_tile(tile_index as usize);
		state.inner.add_active_tile(tile_index as usize);
	}
}

#[no_mangle]
pub extern "C" fn atmos_extinguish_hotspot(state: *mut GridAtmosState, tile_index: i32) {
	let state = guard!(state);
	if tile_index < 0 || tile_index as usize >= state.inner.tiles.len() {
		return;
	}
	crate::hotspot::extinguish(&mut state.inner.tiles[tile_index as usize]);
}

#[no_mangle]
pub extern "C" fn atmos_get_heat_capacity(tile: *const CTileData, specific_heats: *const f32) -> f32 {
	let Some(tile) = (unsafe { tile.as_ref() }) else { return 0.0 };
	let Some(heats) = specific_heats_from_ptr(specific_heats) else { return 0.0 };
	let t = Tile::from(tile);
	crate::tile::heat_capacity(&t.moles, &heats, t.flags.contains(TileFlags::SPACE))
}

#[no_mangle]
pub extern "C" fn atmos_get_heat_capacity_archived(tile: *const CTileData, specific_heats: *const f32) -> f32 {
	let Some(tile) = (unsafe { tile.as_ref() }) else { return 0.0 };
	let Some(heats) = specific_heats_from_ptr(specific_heats) else { return 0.0 };
	let t = Tile::from(tile);
	crate::tile::heat_capacity(&t.moles_archived, &heats, t.flags.contains(TileFlags::SPACE))
}

#[no_mangle]
pub extern "C" fn atmos_get_thermal_energy(tile: *const CTileData, specific_heats: *const f32) -> f32 {
	let Some(tile) = (unsafe { tile.as_ref() }) else { return 0.0 };
	let Some(heats) = specific_heats_from_ptr(specific_heats) else { return 0.0 };
	let t = Tile::from(tile);
	let hc = crate::tile::heat_capacity(&t.moles, &heats, t.flags.contains(TileFlags::SPACE));
	crate::tile::thermal_energy(t.temperature, hc)
}

fn specific_heats_from_ptr(ptr: *const f32) -> Option<[f32; GAS_COUNT]> {
	if ptr.is_null() {
		return None;
	}
	let slice = unsafe { std::slice::from_raw_parts(ptr, GAS_COUNT) };
	let mut out = [0.0; GAS_COUNT];
	out.copy_from_slice(slice);
	Some(out)
}

#[no_mangle]
pub extern "C" fn atmos_merge(receiver: *mut CTileData, giver: *const CTileData, specific_heats: *const f32) {
	let (Some(receiver_c), Some(giver_c)) = (unsafe { receiver.as_mut() }, unsafe { giver.as_ref() }) else { return };
	let Some(heats) = specific_heats_from_ptr(specific_heats) else { return };
	let constants = AtmosConstants::default();
	let mut r = Tile::from(&*receiver_c);
	let g = Tile::from(giver_c);
	r.merge(&g.moles, g.temperature, &heats, constants.minimum_temperature_delta_to_consider, constants.minimum_heat_capacity);
	*receiver_c = CTileData::from(&r);
}

#[no_mangle]
pub extern "C" fn atmos_remove_gas(tile: *mut CTileData, amount: f32, removed: *mut CTileData) {
	let Some(tile_c) = (unsafe { tile.as_mut() }) else { return };
	let constants = AtmosConstants::default();
	let mut t = Tile::from(&*tile_c);
	let out = t.remove_gas(amount, constants.gas_min_moles);
	*tile_c = CTileData::from(&t);
	if let Some(removed) = unsafe { removed.as_mut() } {
		let mut out_tile = Tile::default();
		out_tile.moles = out;
		out_tile.temperature = t.temperature;
		*removed = CTileData::from(&out_tile);
	}
}

#[no_mangle]
pub extern "C" fn atmos_remove_ratio(tile: *mut CTileData, ratio: f32, removed: *mut CTileData) {
	let Some(tile_c) = (unsafe { tile.as_mut() }) else { return };
	let constants = AtmosConstants::default();
	let mut t = Tile::from(&*tile_c);
	let out = t.remove_ratio(ratio, constants.gas_min_moles);
	*tile_c = CTileData::from(&t);
	if let Some(removed) = unsafe { removed.as_mut() } {
		let mut out_tile = Tile::default();
		out_tile.moles = out;
		out_tile.temperature = t.temperature;
		*removed = CTileData::from(&out_tile);
	}
}

#[no_mangle]
pub extern "C" fn atmos_react(tile: *mut CTileData, config: *const CAtmosConfig) -> i32 {
	let Some(tile_c) = (unsafe { tile.as_mut() }) else { return 0 };
	let Some(config) = config_from_ptr(config) else { return 0 };
	let mut t = Tile::from(&*tile_c);
	let status = crate::reactions::react(&mut t, &config.constants, &config.gas_specific_heats, config.heat_scale);
	*tile_c = CTileData::from(&t);
	match status {
		crate::reactions::ReactionStatus::None => 0,
		crate::reactions::ReactionStatus::Reacting => 1,
		crate::reactions::ReactionStatus::Stop => 2,
	}
}

#[no_mangle]
pub extern "C" fn atmos_share(receiver: *mut CTileData, sharer: *mut CTileData, adjacent_count: i32, config: *const CAtmosConfig) {
	let (Some(receiver_c), Some(sharer_c)) = (unsafe { receiver.as_mut() }, unsafe { sharer.as_mut() }) else { return };
	let Some(config) = config_from_ptr(config) else { return };
	let mut r = Tile::from(&*receiver_c);
	let mut s = Tile::from(&*sharer_c);
	crate::share::share(&mut r, &mut s, adjacent_count.max(0) as u32, &config.gas_specific_heats, &config.constants);
	*receiver_c = CTileData::from(&r);
	*sharer_c = CTileData::from(&s);
}

#[no_mangle]
pub extern "C" fn atmos_temperature_share(receiver: *mut CTileData, sharer: *mut CTileData, conduction_coefficient: f32, config: *const CAtmosConfig) -> f32 {
	let (Some(receiver_c), Some(sharer_c)) = (unsafe { receiver.as_mut() }, unsafe { sharer.as_mut() }) else { return 0.0 };
	let Some(config) = config_from_ptr(config) else { return 0.0 };
	let mut r = Tile::from(&*receiver_c);
	let mut s = Tile::from(&*sharer_c);
	crate::share::temperature_share(&mut r, &mut s, conduction_coefficient, &config.gas_specific_heats, &config.constants);
	*receiver_c = CTileData::from(&r);
	*sharer_c = CTileData::from(&s);
	r.temperature
}

#[no_mangle]
pub extern "C" fn atmos_config_init_default(config: *mut CAtmosConfig) {
	let Some(config) = (unsafe { config.as_mut() }) else { return };
	*config = CAtmosConfig::from(&AtmosConfig::default());
}

#[no_mangle]
pub extern "C" fn atmos_archive_tile(tile: *mut CTileData) {
	let Some(tile_c) = (unsafe { tile.as_mut() }) else { return };
	let mut t = Tile::from(&*tile_c);
	t.archive();
	*tile_c = CTileData::from(&t);
}

#[no_mangle]
pub extern "C" fn atmos_archive_all(state: *mut GridAtmosState) {
	let state = guard!(state);
	state.inner.archive_all();
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn create_destroy_roundtrip_is_safe() {
		let state = atmos_create_grid(4);
		assert!(!state.is_null());
		unsafe { atmos_destroy_grid(state) };
	}

	#[test]
	fn null_state_calls_are_safe_no_ops() {
		assert_eq!(atmos_get_tile_count(std::ptr::null()), 0);
		assert_eq!(atmos_add_tile(std::ptr::null_mut(), std::ptr::null()), -1);
		atmos_reset_grid(std::ptr::null_mut());
	}

	#[test]
	fn tile_roundtrips_through_c_layout() {
		let state = atmos_create_grid(4);
		let mut template = CTileData::from(&Tile::default());
		template.moles[crate::constants::OXYGEN] = 1840.0;
		template.temperature = 293.15;
		let idx = atmos_add_tile(state, &template);
		assert_eq!(idx, 0);
		let ptr = atmos_get_tile(state, 0);
		assert!(!ptr.is_null());
		let fetched = unsafe { &*ptr };
		assert_eq!(fetched.moles[crate::constants::OXYGEN], 1840.0);
		unsafe { atmos_destroy_grid(state) };
	}
}
