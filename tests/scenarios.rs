//! Whole-grid integration coverage for the six concrete scenarios, each
//! built against the safe `GridState` API with no `ffi` involved, mirroring
//! how `original_source/tests/` separates unit coverage of individual
//! translation units from whole-grid integration runs.

use atmos_engine::constants::{
	AtmosConfig, CARBON_DIOXIDE, DIR_EAST, DIR_NORTH, DIR_SOUTH, DIR_WEST, NITROGEN, OXYGEN, PLASMA,
	WATER_VAPOR,
};
use atmos_engine::flags::TileFlags;
use atmos_engine::grid::GridState;
use atmos_engine::hotspot;
use atmos_engine::reactions::{react, ReactionStatus};
use atmos_engine::superconduct;
use atmos_engine::tile::Tile;

fn standard_air() -> Tile {
	let mut t = Tile::default();
	t.moles[OXYGEN] = 1840.0;
	t.moles[NITROGEN] = 6928.0;
	t.temperature = 293.15;
	t
}

/// Scenario 1: 5 tiles in a row, all standard air except tile 0, which
/// starts hot and rich. After 50 cycles, the spread is no longer
/// concentrated in tile 0 and the system hasn't leaked mass.
#[test]
fn linear_diffusion_evens_out_without_losing_mass() {
	let mut grid = GridState::new(64);
	for _ in 0..5 {
		grid.add_tile(standard_air());
	}
	for i in 0..5 {
		grid.set_adjacency(i, DIR_EAST, if i + 1 < 5 { (i + 1) as i32 } else { -1 });
		grid.set_adjacency(i, DIR_WEST, if i > 0 { (i - 1) as i32 } else { -1 });
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

	let totals: Vec<f32> = grid.tiles.iter().map(|t| t.total_moles()).collect();
	let mean = totals.iter().sum::<f32>() / totals.len() as f32;
	let max = totals.iter().cloned().fold(f32::MIN, f32::max);
	let min = totals.iter().cloned().fold(f32::MAX, f32::min);
	assert!(max - min < mean * 0.3, "spread {} too wide relative to mean {mean}", max - min);
}

/// Scenario 2: 3 tiles in a row plus a SPACE tile east of tile 2. Venting
/// loses mass to vacuum and records a pressure difference; disabling
/// spacing makes the same call a full no-op.
#[test]
fn explosive_depressurization_vents_toward_space_and_respects_the_spacing_flag() {
	let mut grid = GridState::new(64);
	for _ in 0..3 {
		let mut t = Tile::default();
		t.moles[OXYGEN] = 100.0;
		t.moles[NITROGEN] = 400.0;
		t.temperature = 293.15;
		t.archive();
		grid.add_tile(t);
	}
	let mut space = Tile::default();
	space.flags |= TileFlags::SPACE;
	grid.add_tile(space);

	grid.set_adjacency(0, DIR_EAST, 1);
	grid.set_adjacency(1, DIR_WEST, 0);
	grid.set_adjacency(1, DIR_EAST, 2);
	grid.set_adjacency(2, DIR_WEST, 1);
	grid.set_adjacency(2, DIR_EAST, 3);
	grid.set_adjacency(3, DIR_WEST, 2);

	let config = AtmosConfig::default();
	let sum_before: f32 = grid.tiles.iter().map(|t| t.total_moles()).sum();
	grid.explosive_depressurize(0, &config);
	let sum_after: f32 = grid.tiles.iter().map(|t| t.total_moles()).sum();

	assert!(sum_after < sum_before);
	assert!(grid.tiles.iter().any(|t| t.pressure_difference > 0.0));

	let mut grid2 = GridState::new(64);
	for _ in 0..3 {
		let mut t = Tile::default();
		t.moles[OXYGEN] = 100.0;
		t.moles[NITROGEN] = 400.0;
		t.archive();
		grid2.add_tile(t);
	}
	let mut space2 = Tile::default();
	space2.flags |= TileFlags::SPACE;
	grid2.add_tile(space2);
	grid2.set_adjacency(0, DIR_EAST, 1);
	grid2.set_adjacency(1, DIR_WEST, 0);
	grid2.set_adjacency(1, DIR_EAST, 2);
	grid2.set_adjacency(2, DIR_WEST, 1);
	grid2.set_adjacency(2, DIR_EAST, 3);
	grid2.set_adjacency(3, DIR_WEST, 2);

	let mut no_spacing = AtmosConfig::default();
	no_spacing.spacing_enabled = false;
	let before2: f32 = grid2.tiles.iter().map(|t| t.total_moles()).sum();
	grid2.explosive_depressurize(0, &no_spacing);
	let after2: f32 = grid2.tiles.iter().map(|t| t.total_moles()).sum();
	assert_eq!(before2, after2);
}

/// Scenario 3: a plasma/oxygen mix well above the upper burn temperature
/// reacts in a single call, burning fuel and oxidizer while producing
/// CO2/water vapor in roughly the 3:1 ratio the reaction rule fixes, and
/// heating the tile further.
#[test]
fn plasma_fire_burns_fuel_and_raises_temperature() {
	let config = AtmosConfig::default();
	let mut tile = Tile::default();
	tile.moles[PLASMA] = 10.0;
	tile.moles[OXYGEN] = 30.0;
	tile.temperature = config.constants.plasma_upper_temperature + 100.0;
	let temp_before = tile.temperature;

	let status = react(&mut tile, &config.constants, &config.gas_specific_heats, config.heat_scale);

	assert_eq!(status, ReactionStatus::Reacting);
	assert!(tile.moles[PLASMA] < 10.0);
	assert!(tile.moles[OXYGEN] < 30.0);
	assert!(tile.moles[CARBON_DIOXIDE] > 0.0);
	assert!(tile.moles[WATER_VAPOR] > 0.0);
	let ratio = tile.moles[CARBON_DIOXIDE] / tile.moles[WATER_VAPOR];
	assert!((ratio - 3.0).abs() < 0.1, "CO2/water ratio {ratio} should be near 3.0");
	assert!(tile.temperature > temp_before);
}

/// Scenario 4: two adjacent plasma-rich tiles, the first ignited directly.
/// One hotspot-processing pass offers the second as a spread target, but
/// never offers a SPACE neighbor regardless of its fuel/oxygen content.
#[test]
fn fire_spreads_to_fuel_rich_neighbors_but_never_into_space() {
	let config = AtmosConfig::default();
	let mut tiles = vec![Tile::default(), Tile::default(), Tile::default()];
	tiles[0].moles[PLASMA] = 1000.0;
	tiles[0].moles[OXYGEN] = 1000.0;
	tiles[1].moles[PLASMA] = 1000.0;
	tiles[1].moles[OXYGEN] = 1000.0;
	tiles[2].flags |= TileFlags::SPACE;

	tiles[0].adjacent_indices[DIR_EAST] = 1;
	tiles[0].adjacent_bits |= 1 << DIR_EAST;
	tiles[0].adjacent_indices[DIR_WEST] = 2;
	tiles[0].adjacent_bits |= 1 << DIR_WEST;

	assert!(hotspot::ignite(&mut tiles[0], 1000.0, 1000.0, &config.constants));

	let outcome = hotspot::process_hotspot(&mut tiles, 0, &config.constants, &config.gas_specific_heats, config.heat_scale);
	assert!(outcome.spread_targets.contains(&1));
	assert!(!outcome.spread_targets.contains(&2));
}

/// Scenario 5: a row of 5 conductive tiles, the first hot, the rest at
/// room temperature. Each holds a little gas so `consider_superconductivity`
/// clears `mcellWithRatio` and tracks them as the chain heats up — a
/// bare-solid tile (no gas at all) never gets past its immediate neighbor,
/// since that gate reads the tile's gas-derived heat capacity, not its
/// solid `heat_capacity` field. Running superconduction repeatedly
/// (archiving between cycles, as the orchestrator does at the top of
/// `process`) cools the source and eventually warms the far end.
#[test]
fn superconduction_propagates_heat_down_a_chain() {
	let mut grid = GridState::new(64);
	for _ in 0..5 {
		let mut t = Tile::default();
		t.moles[OXYGEN] = 21.0;
		t.moles[NITROGEN] = 79.0;
		t.thermal_conductivity = 0.5;
		t.heat_capacity = 10_000.0;
		t.temperature = 293.15 + 20.0;
		grid.add_tile(t);
	}
	grid.tiles[0].temperature = 1000.0;

	for i in 0..5 {
		grid.set_adjacency(i, DIR_EAST, if i + 1 < 5 { (i + 1) as i32 } else { -1 });
		grid.set_adjacency(i, DIR_WEST, if i > 0 { (i - 1) as i32 } else { -1 });
	}

	let config = AtmosConfig::default();
	assert!(superconduct::consider_superconductivity(
		&mut grid.tiles[0],
		true,
		config.superconduction_enabled,
		&config.constants,
	));
	grid.superconduct_tiles.push(0);

	let start_temp = grid.tiles[0].temperature;
	for _ in 0..50 {
		grid.update_counter += 1;
		grid.archive_all();
		grid.process_superconductivity(&config);
	}

	assert!(grid.tiles[0].temperature < start_temp);
	assert!(grid.tiles[4].temperature > 293.15 + 20.0);
}

/// Scenario 6: a large, mostly-uniform grid with one saturated tile and
/// one nearly-empty tile. Repeated zone equalization moves mass toward
/// balance without creating or losing it.
#[test]
fn equalize_pressure_zone_preserves_mass_on_a_large_grid() {
	const SIDE: usize = 20;
	let mut grid = GridState::new(512);
	for _ in 0..(SIDE * SIDE) {
		grid.add_tile(standard_air());
	}
	for y in 0..SIDE {
		for x in 0..SIDE {
			let idx = y * SIDE + x;
			if x + 1 < SIDE {
				grid.set_adjacency(idx, DIR_EAST, (idx + 1) as i32);
			}
			if x > 0 {
				grid.set_adjacency(idx, DIR_WEST, (idx - 1) as i32);
			}
			if y + 1 < SIDE {
				grid.set_adjacency(idx, DIR_SOUTH, (idx + SIDE) as i32);
			}
			if y > 0 {
				grid.set_adjacency(idx, DIR_NORTH, (idx - SIDE) as i32);
			}
		}
	}

	grid.tiles[0].moles[OXYGEN] = 1000.0;
	grid.tiles[0].moles[NITROGEN] = 4000.0;
	grid.tiles[0].archive();
	grid.tiles[399].moles[OXYGEN] = 0.1;
	grid.tiles[399].moles[NITROGEN] = 0.1;
	grid.tiles[399].archive();

	for t in grid.tiles.iter_mut() {
		t.archive();
	}

	let sum_before: f32 = grid.tiles.iter().map(|t| t.total_moles()).sum();
	let config = AtmosConfig::default();
	for _ in 0..50 {
		grid.update_counter += 1;
		grid.archive_all();
		grid.tiles[0].last_queue_cycle = 0;
		grid.equalize_pressure_zone(0, &config);
	}
	let sum_after: f32 = grid.tiles.iter().map(|t| t.total_moles()).sum();

	assert!((sum_before - sum_after).abs() / sum_before < 0.01);
}
