#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic Roman city synthesis.
//!
//! [`generate`] builds a complete [`CityMap`] from grid dimensions and a
//! seed. The passes run in a fixed priority order and later passes overwrite
//! earlier ones: roads, plazas, buildings, temples, then the river, which
//! claims its tiles unconditionally. Only buildings and the smaller temples
//! inspect the grid before committing; every other pass stamps blindly.
//! Rejected placements are skipped rather than retried, so realised building
//! and temple counts are upper-bounded by their targets.

use cardo_core::{TileCell, TileKind};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const MAIN_PLAZA_MAX_SIDE: u32 = 7;
const SMALL_PLAZA_MAX_SIDE: u32 = 5;
const SMALL_PLAZA_EXCLUSION: i64 = 10;
const MAX_SECONDARY_ROADS: u32 = 3;
const MAX_SMALL_PLAZAS: u32 = 3;
const MAX_SMALL_TEMPLES: u32 = 3;
const MAX_BUILDINGS: u32 = 30;
const INTERSECTION_CLEARANCE: i64 = 3;

/// Rectangular grid of tiles describing one generated city.
///
/// Storage is row-major with the origin at the top-left cell. A map is
/// immutable once returned by [`generate`]; regeneration replaces it
/// wholesale.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CityMap {
    columns: u32,
    rows: u32,
    tiles: Vec<TileKind>,
}

impl CityMap {
    fn filled_with_empty(columns: u32, rows: u32) -> Self {
        let capacity_u64 = u64::from(columns) * u64::from(rows);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Self {
            columns,
            rows,
            tiles: vec![TileKind::Empty; capacity],
        }
    }

    /// Number of tile columns in the map.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of tile rows in the map.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Retrieves the tile stored at the provided cell, if it is in bounds.
    #[must_use]
    pub fn tile(&self, cell: TileCell) -> Option<TileKind> {
        self.index(cell).map(|index| self.tiles[index])
    }

    /// Row-major slice of every tile in the map.
    #[must_use]
    pub fn tiles(&self) -> &[TileKind] {
        &self.tiles
    }

    /// Locates the first cell able to host a coin, scanning row-major.
    #[must_use]
    pub fn first_coin_cell(&self) -> Option<TileCell> {
        self.tiles
            .iter()
            .position(|tile| tile.supports_coin())
            .map(|index| {
                let width = self.columns.max(1) as usize;
                TileCell::new((index % width) as u32, (index / width) as u32)
            })
    }

    fn index(&self, cell: TileCell) -> Option<usize> {
        if cell.column() < self.columns && cell.row() < self.rows {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }

    /// Writes `kind` into the cell, silently ignoring out-of-bounds targets.
    fn stamp(&mut self, column: i64, row: i64, kind: TileKind) {
        if column < 0 || row < 0 {
            return;
        }
        let cell = TileCell::new(column as u32, row as u32);
        if let Some(index) = self.index(cell) {
            self.tiles[index] = kind;
        }
    }

    fn is_empty_at(&self, column: i64, row: i64) -> bool {
        if column < 0 || row < 0 {
            // Cells outside the map never veto a placement.
            return true;
        }
        self.tile(TileCell::new(column as u32, row as u32))
            .map_or(true, |tile| tile == TileKind::Empty)
    }
}

/// Synthesises a city map for the provided dimensions and seed.
///
/// Equal `(columns, rows, seed)` triples always yield identical maps.
/// Degenerate dimensions never panic; passes that cannot fit simply skip
/// their placements.
#[must_use]
pub fn generate(columns: u32, rows: u32, seed: u64) -> CityMap {
    let mut map = CityMap::filled_with_empty(columns, rows);
    if columns == 0 || rows == 0 {
        return map;
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let cardo = columns / 2;
    let decumanus = rows / 2;

    carve_main_roads(&mut map, cardo, decumanus);
    carve_secondary_roads(&mut map, &mut rng, cardo, decumanus);
    stamp_plazas(&mut map, &mut rng, cardo, decumanus);
    place_buildings(&mut map, &mut rng);
    place_temples(&mut map, &mut rng, cardo, decumanus);
    carve_river(&mut map);

    map
}

/// Carves the Cardo (vertical) and Decumanus (horizontal), both 3 tiles wide.
fn carve_main_roads(map: &mut CityMap, cardo: u32, decumanus: u32) {
    for row in 0..map.rows() {
        for offset in -1..=1 {
            map.stamp(i64::from(cardo) + offset, i64::from(row), TileKind::Road);
        }
    }
    for column in 0..map.columns() {
        for offset in -1..=1 {
            map.stamp(
                i64::from(column),
                i64::from(decumanus) + offset,
                TileKind::Road,
            );
        }
    }
}

/// Adds random 3-wide roads on both axes, avoiding the main intersection.
fn carve_secondary_roads(map: &mut CityMap, rng: &mut ChaCha8Rng, cardo: u32, decumanus: u32) {
    let shorter = map.columns().min(map.rows());
    let road_count = MAX_SECONDARY_ROADS.min(shorter / 10);
    if map.columns() <= 6 || map.rows() <= 6 {
        return;
    }

    for _ in 0..road_count {
        let road_column = i64::from(rng.gen_range(0..map.columns() - 6) + 3);
        for row in 0..map.rows() {
            let row = i64::from(row);
            let clearance = i64::from(decumanus);
            if row < clearance - INTERSECTION_CLEARANCE || row > clearance + INTERSECTION_CLEARANCE
            {
                for offset in -1..=1 {
                    map.stamp(road_column + offset, row, TileKind::Road);
                }
            }
        }

        let road_row = i64::from(rng.gen_range(0..map.rows() - 6) + 3);
        for column in 0..map.columns() {
            let column = i64::from(column);
            let clearance = i64::from(cardo);
            if column < clearance - INTERSECTION_CLEARANCE
                || column > clearance + INTERSECTION_CLEARANCE
            {
                for offset in -1..=1 {
                    map.stamp(column, road_row + offset, TileKind::Road);
                }
            }
        }
    }
}

/// Stamps the main plaza plus a few smaller ones away from the centre.
///
/// Plazas are rendered as road tiles. A small plaza that lands within the
/// exclusion distance of the main intersection on both axes is skipped
/// outright; there is no retry at another location.
fn stamp_plazas(map: &mut CityMap, rng: &mut ChaCha8Rng, cardo: u32, decumanus: u32) {
    let shorter = map.columns().min(map.rows());
    let main_side = MAIN_PLAZA_MAX_SIDE.min(shorter / 6);
    stamp_plaza(map, i64::from(cardo), i64::from(decumanus), main_side);

    let small_count = MAX_SMALL_PLAZAS.min(shorter / 15);
    if map.columns() <= 10 || map.rows() <= 10 {
        return;
    }

    for _ in 0..small_count {
        let centre_x = i64::from(rng.gen_range(0..map.columns() - 10) + 5);
        let centre_y = i64::from(rng.gen_range(0..map.rows() - 10) + 5);

        let near_centre = (centre_x - i64::from(cardo)).abs() <= SMALL_PLAZA_EXCLUSION
            && (centre_y - i64::from(decumanus)).abs() <= SMALL_PLAZA_EXCLUSION;
        if near_centre {
            continue;
        }

        let side = SMALL_PLAZA_MAX_SIDE.min(shorter / 10);
        stamp_plaza(map, centre_x, centre_y, side);
    }
}

fn stamp_plaza(map: &mut CityMap, centre_x: i64, centre_y: i64, side: u32) {
    let half = i64::from(side / 2);
    for row in (centre_y - half)..=(centre_y + half) {
        for column in (centre_x - half)..=(centre_x + half) {
            map.stamp(column, row, TileKind::Road);
        }
    }
}

/// Attempts to place multi-tile buildings with a one-tile clear buffer.
fn place_buildings(map: &mut CityMap, rng: &mut ChaCha8Rng) {
    let area = u64::from(map.columns()) * u64::from(map.rows());
    let target = u64::from(MAX_BUILDINGS).min(area / 40);

    for _ in 0..target {
        let width = if rng.gen_bool(0.5) { 2u32 } else { 3u32 };
        let height = if rng.gen_bool(0.5) { 2u32 } else { 3u32 };
        if map.columns() <= width + 2 || map.rows() <= height + 2 {
            continue;
        }

        let origin_x = i64::from(rng.gen_range(0..map.columns() - width - 2) + 1);
        let origin_y = i64::from(rng.gen_range(0..map.rows() - height - 2) + 1);

        if !buffer_is_empty(map, origin_x, origin_y, width, height) {
            continue;
        }

        for dy in 0..i64::from(height) {
            for dx in 0..i64::from(width) {
                map.stamp(origin_x + dx, origin_y + dy, TileKind::Building);
            }
        }
    }
}

/// Checks that the footprint plus a one-tile border contains only empty tiles.
fn buffer_is_empty(map: &CityMap, origin_x: i64, origin_y: i64, width: u32, height: u32) -> bool {
    for dy in -1..=i64::from(height) {
        for dx in -1..=i64::from(width) {
            if !map.is_empty_at(origin_x + dx, origin_y + dy) {
                return false;
            }
        }
    }
    true
}

/// Places the main temple near the forum and a few 2x2 temples elsewhere.
///
/// The main temple claims its tiles unconditionally; the smaller temples
/// require the same one-tile clear buffer as buildings.
fn place_temples(map: &mut CityMap, rng: &mut ChaCha8Rng, cardo: u32, decumanus: u32) {
    let main_x = i64::from(cardo + 5).min(i64::from(map.columns()) - 4);
    let main_y = i64::from(decumanus + 5).min(i64::from(map.rows()) - 4);
    let main_width = 4i64.min(i64::from(map.columns()) - main_x);
    let main_height = 4i64.min(i64::from(map.rows()) - main_y);

    for dy in 0..main_height.max(0) {
        for dx in 0..main_width.max(0) {
            map.stamp(main_x + dx, main_y + dy, TileKind::Temple);
        }
    }

    let shorter = map.columns().min(map.rows());
    let small_count = MAX_SMALL_TEMPLES.min(shorter / 15);
    if map.columns() <= 3 || map.rows() <= 3 {
        return;
    }

    for _ in 0..small_count {
        let origin_x = i64::from(rng.gen_range(0..map.columns() - 3));
        let origin_y = i64::from(rng.gen_range(0..map.rows() - 3));

        if !buffer_is_empty(map, origin_x, origin_y, 2, 2) {
            continue;
        }

        for dy in 0..2 {
            for dx in 0..2 {
                map.stamp(origin_x + dx, origin_y + dy, TileKind::Temple);
            }
        }
    }
}

/// Carves the river along the western third of the city.
///
/// Water is the final pass and overwrites whatever came before it. The
/// single-tile bulges on alternating sides give the channel its curve.
fn carve_river(map: &mut CityMap) {
    let river = i64::from((map.columns() / 4).max(3));
    for row in 0..map.rows() {
        let row = i64::from(row);
        for offset in -1..=1 {
            map.stamp(river + offset, row, TileKind::Water);
        }
        if row % 5 == 0 {
            map.stamp(river + 2, row, TileKind::Water);
        }
        if row % 7 == 0 {
            map.stamp(river - 2, row, TileKind::Water);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tile(map: &CityMap, column: u32, row: u32) -> TileKind {
        map.tile(TileCell::new(column, row)).expect("cell in bounds")
    }

    #[test]
    fn generated_map_covers_every_cell() {
        let map = generate(30, 20, 7);
        assert_eq!(map.columns(), 30);
        assert_eq!(map.rows(), 20);
        assert_eq!(map.tiles().len(), 600);
    }

    #[test]
    fn generation_is_deterministic_for_equal_seeds() {
        assert_eq!(generate(40, 25, 99), generate(40, 25, 99));
    }

    #[test]
    fn generation_differs_across_seeds() {
        // Two seeds agreeing on every cell of a 1000-tile map would indicate
        // the rng is not actually consulted.
        assert_ne!(generate(40, 25, 1), generate(40, 25, 2));
    }

    #[test]
    fn main_roads_cross_at_the_grid_centre() {
        let columns = 31;
        let rows = 21;
        let map = generate(columns, rows, 5);
        let cardo = columns / 2;
        let decumanus = rows / 2;
        let river = (columns / 4).max(3);

        for row in 0..rows {
            let final_kind = tile(&map, cardo, row);
            let in_river_channel = cardo + 2 >= river && cardo <= river + 2;
            assert!(
                final_kind == TileKind::Road
                    || in_river_channel
                    || final_kind == TileKind::Temple,
                "cardo cell ({cardo}, {row}) held {final_kind:?}"
            );
        }
        for column in 0..columns {
            let final_kind = tile(&map, column, decumanus);
            let near_river = column + 2 >= river && column <= river + 2;
            assert!(
                final_kind == TileKind::Road || near_river || final_kind == TileKind::Temple,
                "decumanus cell ({column}, {decumanus}) held {final_kind:?}"
            );
        }
    }

    #[test]
    fn river_channel_is_water_for_every_row() {
        let columns = 32;
        let map = generate(columns, 24, 11);
        let river = (columns / 4).max(3);

        for row in 0..24 {
            for column in river - 1..=river + 1 {
                assert_eq!(
                    tile(&map, column, row),
                    TileKind::Water,
                    "river cell ({column}, {row}) was overwritten"
                );
            }
        }
    }

    #[test]
    fn river_bulges_follow_the_row_cadence() {
        let columns = 40;
        let map = generate(columns, 21, 3);
        let river = (columns / 4).max(3);

        for row in (0..21).step_by(5) {
            assert_eq!(tile(&map, river + 2, row), TileKind::Water);
        }
        for row in (0..21).step_by(7) {
            assert_eq!(tile(&map, river - 2, row), TileKind::Water);
        }
    }

    #[test]
    fn water_has_final_priority_over_roads() {
        // The decumanus spans the full width, so it crosses the river channel;
        // the crossing cells must read back as water.
        let columns = 36;
        let rows = 20;
        let map = generate(columns, rows, 17);
        let river = (columns / 4).max(3);
        let decumanus = rows / 2;

        assert_eq!(tile(&map, river, decumanus), TileKind::Water);
    }

    #[test]
    fn buildings_never_touch_non_empty_neighbours_of_other_kinds() {
        // The one-tile buffer rule means a building cell can only border
        // building cells from its own footprint, empty ground, or tiles
        // stamped by later passes (temples are placed after buildings and the
        // river overwrites everything).
        let map = generate(50, 40, 23);

        for row in 0..map.rows() {
            for column in 0..map.columns() {
                if tile(&map, column, row) != TileKind::Building {
                    continue;
                }
                for (dx, dy) in [(-1i64, 0i64), (1, 0), (0, -1), (0, 1)] {
                    let nx = i64::from(column) + dx;
                    let ny = i64::from(row) + dy;
                    if nx < 0 || ny < 0 {
                        continue;
                    }
                    if let Some(kind) = map.tile(TileCell::new(nx as u32, ny as u32)) {
                        assert!(
                            !matches!(kind, TileKind::Road),
                            "building at ({column}, {row}) touches a road"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn degenerate_dimensions_yield_empty_maps_without_panicking() {
        assert!(generate(0, 10, 1).tiles().is_empty());
        assert!(generate(10, 0, 1).tiles().is_empty());
        let tiny = generate(2, 2, 1);
        assert_eq!(tiny.tiles().len(), 4);
    }

    #[test]
    fn first_coin_cell_skips_leading_water() {
        let map = generate(30, 20, 41);
        let cell = map.first_coin_cell().expect("land exists");
        assert!(map
            .tile(cell)
            .expect("cell in bounds")
            .supports_coin());
    }
}
