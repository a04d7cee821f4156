#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Cardo engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values describing what
//! actually happened. Everything here is plain data: no randomness, no I/O,
//! no frame timing.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Side length of a single square tile expressed in pixels.
pub const TILE_SIZE: f32 = 40.0;

/// Distance the player travels per tick along each active axis, in pixels.
pub const PLAYER_SPEED: f32 = 5.0;

/// Score awarded for each collected coin.
pub const COIN_VALUE: u32 = 10;

/// Minimum number of coins kept in the city after collision resolution.
pub const COIN_FLOOR: usize = 15;

/// Number of coins seeded into a freshly generated city.
pub const INITIAL_COIN_COUNT: usize = 10;

/// Width and height of the player's bounding box in pixels.
pub const PLAYER_EXTENT: f32 = 30.0;

/// Width and height of a coin's bounding box in pixels.
pub const COIN_EXTENT: f32 = 15.0;

/// Kinds of tile that can occupy a city grid cell.
///
/// The order matches the original city palette and is load-bearing for
/// serialized grids: `Empty` is 0 and `Water` is 5.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileKind {
    /// Bare ground with nothing built on it.
    Empty,
    /// Paved road or plaza surface.
    Road,
    /// Part of a multi-tile dwelling footprint.
    Building,
    /// Part of a temple footprint.
    Temple,
    /// Stone wall segment.
    Wall,
    /// River water.
    Water,
}

impl TileKind {
    /// Reports whether a coin may be placed on this tile.
    #[must_use]
    pub const fn supports_coin(self) -> bool {
        !matches!(self, Self::Water)
    }
}

/// Index within the tile grid measured in whole tiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord(u32);

impl TileCoord {
    /// Creates a new tile coordinate wrapper.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the underlying tile index.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single grid cell expressed as column and row indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCell {
    column: u32,
    row: u32,
}

impl TileCell {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }
}

/// Unique identifier assigned to a coin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CoinId(u32);

impl CoinId {
    /// Creates a new coin identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Movement directions the player can express through input intent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MoveDirection {
    /// Movement toward decreasing x.
    Left,
    /// Movement toward increasing x.
    Right,
    /// Movement toward decreasing y.
    Up,
    /// Movement toward increasing y.
    Down,
}

/// Axis-aligned rectangle expressed in pixel space.
///
/// `x`/`y` name the top-left corner. The overlap test is inclusive: two
/// rectangles are disjoint only when one's far edge lies strictly before the
/// other's near edge, so rectangles that merely touch count as intersecting.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PxRect {
    /// Horizontal position of the top-left corner.
    pub x: f32,
    /// Vertical position of the top-left corner.
    pub y: f32,
    /// Horizontal extent of the rectangle.
    pub width: f32,
    /// Vertical extent of the rectangle.
    pub height: f32,
}

impl PxRect {
    /// Creates a new rectangle from its top-left corner and extents.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Horizontal coordinate of the rectangle's center.
    #[must_use]
    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    /// Vertical coordinate of the rectangle's center.
    #[must_use]
    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }

    /// Reports whether the two rectangles overlap, counting shared edges.
    #[must_use]
    pub fn intersects(&self, other: &PxRect) -> bool {
        !(self.x + self.width < other.x
            || other.x + other.width < self.x
            || self.y + self.height < other.y
            || other.y + other.height < self.y)
    }
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Regenerates the city grid wholesale and resets the session entities.
    ConfigureMap {
        /// Number of tile columns laid out in the grid.
        columns: TileCoord,
        /// Number of tile rows laid out in the grid.
        rows: TileCoord,
        /// Length of each square tile measured in pixels.
        tile_length: f32,
        /// Seed driving the deterministic city synthesis.
        seed: u64,
    },
    /// Updates the viewport dimensions used for camera framing.
    ConfigureViewport {
        /// Viewport width in pixels.
        width: f32,
        /// Viewport height in pixels.
        height: f32,
    },
    /// Latches one of the player's four movement-intent flags.
    SetMoveIntent {
        /// Direction whose intent flag changed.
        direction: MoveDirection,
        /// Whether the direction is currently pressed.
        active: bool,
    },
    /// Advances the session by one frame.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Announces that a fresh city grid replaced the previous one.
    MapGenerated {
        /// Number of tile columns in the new grid.
        columns: TileCoord,
        /// Number of tile rows in the new grid.
        rows: TileCoord,
        /// Seed the generator consumed.
        seed: u64,
    },
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Reports the player's position after integration and clamping.
    PlayerMoved {
        /// Horizontal pixel position of the player's top-left corner.
        x: f32,
        /// Vertical pixel position of the player's top-left corner.
        y: f32,
    },
    /// Reports the camera offset resolved for the current frame.
    CameraMoved {
        /// Horizontal camera offset in pixels.
        offset_x: f32,
        /// Vertical camera offset in pixels.
        offset_y: f32,
    },
    /// Confirms that the player collected a coin.
    CoinCollected {
        /// Identifier of the collected coin.
        coin: CoinId,
        /// Score awarded for the coin.
        value: u32,
        /// Session score after the award.
        score: u32,
    },
    /// Confirms that a replacement or initial coin entered the city.
    CoinSpawned {
        /// Identifier assigned to the new coin.
        coin: CoinId,
        /// Grid cell hosting the coin.
        cell: TileCell,
    },
    /// Announces the session score after it changed.
    ScoreChanged {
        /// Current session score.
        score: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::{CoinId, PxRect, TileCell, TileKind};
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn coin_id_round_trips_through_bincode() {
        assert_round_trip(&CoinId::new(42));
    }

    #[test]
    fn tile_cell_round_trips_through_bincode() {
        assert_round_trip(&TileCell::new(12, 7));
    }

    #[test]
    fn tile_kind_round_trips_through_bincode() {
        assert_round_trip(&TileKind::Water);
    }

    #[test]
    fn water_rejects_coins_while_other_tiles_accept_them() {
        assert!(!TileKind::Water.supports_coin());
        assert!(TileKind::Empty.supports_coin());
        assert!(TileKind::Road.supports_coin());
        assert!(TileKind::Temple.supports_coin());
    }

    #[test]
    fn overlapping_rectangles_intersect() {
        let first = PxRect::new(0.0, 0.0, 10.0, 10.0);
        let second = PxRect::new(9.0, 9.0, 10.0, 10.0);
        assert!(first.intersects(&second));
        assert!(second.intersects(&first));
    }

    #[test]
    fn touching_edges_count_as_intersecting() {
        let first = PxRect::new(0.0, 0.0, 10.0, 10.0);
        let second = PxRect::new(10.0, 0.0, 10.0, 10.0);
        assert!(first.intersects(&second));
    }

    #[test]
    fn separated_rectangles_do_not_intersect() {
        let first = PxRect::new(0.0, 0.0, 10.0, 10.0);
        let second = PxRect::new(10.5, 0.0, 10.0, 10.0);
        assert!(!first.intersects(&second));
        assert!(!second.intersects(&first));
    }

    #[test]
    fn center_lies_midway_through_the_extents() {
        let rect = PxRect::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(rect.center_x(), 25.0);
        assert_eq!(rect.center_y(), 40.0);
    }
}
