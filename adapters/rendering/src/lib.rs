#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Cardo adapters.
//!
//! Backends consume a [`Scene`] describing everything visible this frame and
//! report per-frame input through [`FrameInput`]. The scene is pure data:
//! window arithmetic, palette lookups, and the procedural cobblestone
//! description all live here so they stay testable without a GPU.

use anyhow::Result as AnyResult;
use cardo_core::TileKind;
use glam::Vec2;
use std::time::Duration;
use thiserror::Error;

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }
}

/// Fixed palette shared by every backend.
///
/// The byte values reproduce the original city's colors exactly.
pub mod palette {
    use super::Color;
    use cardo_core::TileKind;

    /// Bare ground.
    pub const EMPTY: Color = Color::from_rgb_u8(0x8b, 0x73, 0x55);
    /// Stone road and plaza surface.
    pub const ROAD: Color = Color::from_rgb_u8(0xa9, 0xa9, 0xa9);
    /// Wooden dwellings.
    pub const BUILDING: Color = Color::from_rgb_u8(0xcd, 0x85, 0x3f);
    /// Marble temples.
    pub const TEMPLE: Color = Color::from_rgb_u8(0xf5, 0xf5, 0xdc);
    /// Stone walls.
    pub const WALL: Color = Color::from_rgb_u8(0x69, 0x69, 0x69);
    /// River water.
    pub const WATER: Color = Color::from_rgb_u8(0x46, 0x82, 0xb4);

    /// Player torso.
    pub const PLAYER_BODY: Color = Color::from_rgb_u8(0x8b, 0x45, 0x13);
    /// Player helmet strip above the torso.
    pub const PLAYER_HELMET: Color = Color::from_rgb_u8(0xcd, 0x85, 0x3f);
    /// Player shield strip on the western flank.
    pub const PLAYER_SHIELD: Color = Color::from_rgb_u8(0xa5, 0x2a, 0x2a);
    /// Coin fill.
    pub const COIN: Color = Color::from_rgb_u8(0xff, 0xd7, 0x00);
    /// Building door.
    pub const DOOR: Color = Color::from_rgb_u8(0x8b, 0x45, 0x13);
    /// Building window.
    pub const WINDOW: Color = Color::from_rgb_u8(0xf0, 0xe6, 0x8c);
    /// Temple roof triangle.
    pub const ROOF: Color = Color::from_rgb_u8(0x8b, 0x00, 0x00);
    /// Temple column.
    pub const COLUMN: Color = Color::new(1.0, 1.0, 1.0, 1.0);
    /// Faint border drawn around non-road tiles.
    pub const TILE_BORDER: Color = Color::new(0.0, 0.0, 0.0, 0.1);
    /// Mortar lines inside cobblestone textures.
    pub const MORTAR: Color = Color::from_rgb_u8(0x77, 0x77, 0x77);

    /// Base color of a tile before decorations.
    #[must_use]
    pub const fn tile_color(kind: TileKind) -> Color {
        match kind {
            TileKind::Empty => EMPTY,
            TileKind::Road => ROAD,
            TileKind::Building => BUILDING,
            TileKind::Temple => TEMPLE,
            TileKind::Wall => WALL,
            TileKind::Water => WATER,
        }
    }
}

/// Describes a square tile grid that can be rendered by adapters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileGridPresentation {
    /// Number of columns contained in the grid.
    pub columns: u32,
    /// Number of rows contained in the grid.
    pub rows: u32,
    /// Side length of a single tile expressed in pixels.
    pub tile_length: f32,
}

impl TileGridPresentation {
    /// Creates a new tile grid descriptor.
    ///
    /// Returns an error when `tile_length` is not strictly positive.
    pub fn new(columns: u32, rows: u32, tile_length: f32) -> Result<Self, RenderingError> {
        if !(tile_length > 0.0) {
            return Err(RenderingError::InvalidTileLength { tile_length });
        }
        Ok(Self {
            columns,
            rows,
            tile_length,
        })
    }

    /// Calculates the total width of the grid in pixels.
    #[must_use]
    pub const fn width(&self) -> f32 {
        self.columns as f32 * self.tile_length
    }

    /// Calculates the total height of the grid in pixels.
    #[must_use]
    pub const fn height(&self) -> f32 {
        self.rows as f32 * self.tile_length
    }
}

/// Half-open tile index ranges covering exactly the visible viewport.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileWindow {
    /// First visible column.
    pub start_column: u32,
    /// One past the last visible column.
    pub end_column: u32,
    /// First visible row.
    pub start_row: u32,
    /// One past the last visible row.
    pub end_row: u32,
}

impl TileWindow {
    /// Iterator over the visible column indices.
    pub fn columns(&self) -> impl Iterator<Item = u32> {
        self.start_column..self.end_column
    }

    /// Iterator over the visible row indices.
    pub fn rows(&self) -> impl Iterator<Item = u32> {
        self.start_row..self.end_row
    }
}

/// Computes the tile window visible through the camera.
///
/// The start index floors the camera offset and the end index ceils the far
/// viewport edge, then both are clipped to the grid so callers can paint the
/// window without further bounds checks.
#[must_use]
pub fn visible_tiles(camera_offset: Vec2, viewport: Vec2, grid: TileGridPresentation) -> TileWindow {
    let tile = grid.tile_length;

    let start_column = (camera_offset.x / tile).floor().max(0.0) as u32;
    let start_row = (camera_offset.y / tile).floor().max(0.0) as u32;
    let end_column = (((camera_offset.x + viewport.x) / tile).ceil().max(0.0) as u32).min(grid.columns);
    let end_row = (((camera_offset.y + viewport.y) / tile).ceil().max(0.0) as u32).min(grid.rows);

    TileWindow {
        start_column: start_column.min(end_column),
        end_column,
        start_row: start_row.min(end_row),
        end_row,
    }
}

/// Player drawn as a body plus helmet and shield strips.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerPresentation {
    /// World-space position of the body's top-left corner.
    pub position: Vec2,
    /// Extents of the body rectangle.
    pub size: Vec2,
}

/// Coin drawn as a filled circle inside its bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoinPresentation {
    /// World-space position of the bounding box's top-left corner.
    pub position: Vec2,
    /// Side length of the bounding box; the circle diameter.
    pub diameter: f32,
}

/// Scene description consumed by rendering backends each frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Tile grid that composes the city.
    pub tile_grid: TileGridPresentation,
    /// Row-major tile kinds matching the grid dimensions.
    pub tiles: Vec<TileKind>,
    /// Camera offset subtracted from world positions when drawing.
    pub camera_offset: Vec2,
    /// Player visible in the city.
    pub player: PlayerPresentation,
    /// Coins visible in the city.
    pub coins: Vec<CoinPresentation>,
    /// Session score surfaced through the backend's score sink.
    pub score: u32,
}

impl Scene {
    /// Retrieves the tile kind at the provided indices, if in bounds.
    #[must_use]
    pub fn tile(&self, column: u32, row: u32) -> Option<TileKind> {
        if column >= self.tile_grid.columns || row >= self.tile_grid.rows {
            return None;
        }
        let index = row as usize * self.tile_grid.columns as usize + column as usize;
        self.tiles.get(index).copied()
    }
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct FrameInput {
    /// Whether leftward movement intent is currently pressed.
    pub move_left: bool,
    /// Whether rightward movement intent is currently pressed.
    pub move_right: bool,
    /// Whether upward movement intent is currently pressed.
    pub move_up: bool,
    /// Whether downward movement intent is currently pressed.
    pub move_down: bool,
    /// Whether the adapter detected a restart request on this frame.
    pub restart: bool,
    /// Viewport size reported by the platform this frame.
    pub viewport: Vec2,
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            scene,
        }
    }
}

/// Rendering backend capable of presenting Cardo scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the frame delta and the
    /// input captured by the adapter, and may mutate the scene before it is
    /// rendered.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static;
}

/// Shared cache of prepared road textures.
///
/// The store starts `Empty`, moves to `Loading` while a backend prepares
/// variants, and becomes `Ready` once every variant is published. Reading
/// from a store that is not ready is the defined fallback path, not an
/// error: callers paint the flat road color instead.
#[derive(Clone, Debug)]
pub struct TextureStore<T> {
    state: TextureStoreState<T>,
}

#[derive(Clone, Debug)]
enum TextureStoreState<T> {
    Empty,
    Loading(Vec<T>),
    Ready(Vec<T>),
}

impl<T> Default for TextureStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TextureStore<T> {
    /// Creates a store with no textures prepared.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: TextureStoreState::Empty,
        }
    }

    /// Creates a store already populated with the provided variants.
    #[must_use]
    pub fn ready(variants: Vec<T>) -> Self {
        Self {
            state: TextureStoreState::Ready(variants),
        }
    }

    /// Reports whether every variant has been published.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self.state, TextureStoreState::Ready(_))
    }

    /// Number of variants available for selection.
    #[must_use]
    pub fn variant_count(&self) -> usize {
        match &self.state {
            TextureStoreState::Ready(variants) => variants.len(),
            _ => 0,
        }
    }

    /// Adds one prepared variant, moving the store into `Loading`.
    pub fn push_variant(&mut self, variant: T) {
        match &mut self.state {
            TextureStoreState::Empty => {
                self.state = TextureStoreState::Loading(vec![variant]);
            }
            TextureStoreState::Loading(variants) | TextureStoreState::Ready(variants) => {
                variants.push(variant);
            }
        }
    }

    /// Flips the store to `Ready`, exposing the published variants.
    ///
    /// A store with no variants stays `Empty`; flat-color fallback remains in
    /// effect indefinitely.
    pub fn finish_loading(&mut self) {
        let state = std::mem::replace(&mut self.state, TextureStoreState::Empty);
        self.state = match state {
            TextureStoreState::Loading(variants) | TextureStoreState::Ready(variants)
                if !variants.is_empty() =>
            {
                TextureStoreState::Ready(variants)
            }
            _ => TextureStoreState::Empty,
        };
    }

    /// Number of variants prepared so far, ready or not.
    #[must_use]
    pub fn prepared_count(&self) -> usize {
        match &self.state {
            TextureStoreState::Empty => 0,
            TextureStoreState::Loading(variants) | TextureStoreState::Ready(variants) => {
                variants.len()
            }
        }
    }

    /// Selects the variant for a tile, or `None` while the store is not
    /// ready.
    ///
    /// Selection is deterministic per tile: `(column + row) mod count`.
    #[must_use]
    pub fn variant_for_tile(&self, column: u32, row: u32) -> Option<&T> {
        match &self.state {
            TextureStoreState::Ready(variants) if !variants.is_empty() => {
                let index = (column as usize + row as usize) % variants.len();
                variants.get(index)
            }
            _ => None,
        }
    }
}

/// Number of cobblestone variants backends are expected to prepare.
pub const COBBLESTONE_VARIANTS: u32 = 4;

/// One stone inside a [`CobblestonePattern`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CobbleStone {
    /// Horizontal offset of the stone inside the tile, in pixels.
    pub x: f32,
    /// Vertical offset of the stone inside the tile, in pixels.
    pub y: f32,
    /// Side length of the stone after deterministic irregularity.
    pub size: f32,
    /// Stone fill color after shade variation.
    pub color: Color,
    /// Whether a half-size white highlight overlays the stone.
    pub highlighted: bool,
}

/// Deterministic procedural description of one road texture variant.
///
/// Backends rasterise this description however they like; tests inspect it
/// directly. Equal `(tile_size, variant)` pairs always describe the same
/// stones.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CobblestonePattern {
    tile_size: u32,
    variant: u32,
}

impl CobblestonePattern {
    const BASE_SHADE: i32 = 0xa9;
    const STONE_GAP: u32 = 1;

    /// Creates the pattern description for one variant.
    #[must_use]
    pub const fn new(tile_size: u32, variant: u32) -> Self {
        Self { tile_size, variant }
    }

    /// Variant index this pattern describes.
    #[must_use]
    pub const fn variant(&self) -> u32 {
        self.variant
    }

    /// Side length of the square texture in pixels.
    #[must_use]
    pub const fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Base fill behind the stones.
    #[must_use]
    pub const fn base_color(&self) -> Color {
        palette::ROAD
    }

    /// Side length of a single stone before irregularity.
    #[must_use]
    pub const fn stone_size(&self) -> u32 {
        let derived = self.tile_size / 10;
        if derived < 4 {
            4
        } else {
            derived
        }
    }

    /// Number of stones along each texture edge.
    #[must_use]
    pub const fn stones_per_row(&self) -> u32 {
        self.tile_size / (self.stone_size() + Self::STONE_GAP)
    }

    /// Pixel pitch between mortar lines.
    #[must_use]
    pub const fn mortar_pitch(&self) -> u32 {
        self.stone_size() + Self::STONE_GAP
    }

    /// Enumerates every stone in the pattern, row-major.
    #[must_use]
    pub fn stones(&self) -> Vec<CobbleStone> {
        let per_row = self.stones_per_row();
        let stone_size = self.stone_size();
        let pitch = self.mortar_pitch();
        let mut stones = Vec::with_capacity(per_row as usize * per_row as usize);

        for sy in 0..per_row {
            for sx in 0..per_row {
                let shade_variation = ((sx * 7 + sy * 13) + self.variant * 17) % 30;
                let shade = (Self::BASE_SHADE - shade_variation as i32).clamp(0, 255) as u8;

                let phase = sx as f32 * 0.7 + sy as f32 * 0.9 + self.variant as f32;
                let irregularity = (phase.sin() * 2.0 - 1.0) * 0.5;

                stones.push(CobbleStone {
                    x: (sx * pitch + Self::STONE_GAP) as f32,
                    y: (sy * pitch + Self::STONE_GAP) as f32,
                    size: stone_size as f32 + irregularity,
                    color: Color::from_rgb_u8(shade, shade, shade),
                    highlighted: (sx + sy + self.variant) % 3 == 0,
                });
            }
        }

        stones
    }
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq, Error)]
pub enum RenderingError {
    /// Tile length must be positive to avoid a degenerate window computation.
    #[error("tile_length must be positive (received {tile_length})")]
    InvalidTileLength {
        /// Provided tile length that failed validation.
        tile_length: f32,
    },
}
