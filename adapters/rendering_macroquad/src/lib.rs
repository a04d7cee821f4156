#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Macroquad-backed rendering adapter for Cardo.
//!
//! Macroquad's optional audio stack depends on native ALSA development
//! libraries, which are unavailable in the containerised CI environment.
//! To keep `cargo test` usable everywhere we depend on macroquad without its
//! default `audio` feature. Consumers that need sound playback can opt back
//! in by enabling `macroquad/audio` in their own `Cargo.toml` dependency
//! specification.
//!
//! Road tiles are textured with procedurally rasterised cobblestone variants.
//! The variants are prepared incrementally, one per frame, so startup never
//! stalls; until the full set is ready road tiles fall back to their flat
//! palette color.

mod textures;

use anyhow::Result;
use cardo_core::TileKind;
use cardo_rendering::{
    palette, visible_tiles, CobblestonePattern, Color, FrameInput, Presentation,
    RenderingBackend, Scene, TextureStore, COBBLESTONE_VARIANTS,
};
use glam::Vec2;
use macroquad::input::{is_key_down, is_key_pressed, KeyCode};
use macroquad::math::Vec2 as MacroquadVec2;
use macroquad::texture::Texture2D;
use std::{collections::VecDeque, time::Duration};

use self::textures::rasterise_pattern;

/// Snapshot of the keyboard state observed during a single frame.
///
/// Movement keys are level-triggered so intents stay active while held;
/// restart and quit are edge-triggered so they fire once per press.
#[derive(Clone, Copy, Debug, Default)]
struct KeyboardShortcuts {
    /// `ArrowLeft` or `A` steers the player west.
    move_left: bool,
    /// `ArrowRight` or `D` steers the player east.
    move_right: bool,
    /// `ArrowUp` or `W` steers the player north.
    move_up: bool,
    /// `ArrowDown` or `S` steers the player south.
    move_down: bool,
    /// `R` requests a fresh city.
    restart: bool,
    /// `Q` or `Escape` to quit the game loop.
    quit_requested: bool,
}

impl KeyboardShortcuts {
    fn poll() -> Self {
        let move_left = is_key_down(KeyCode::Left) || is_key_down(KeyCode::A);
        let move_right = is_key_down(KeyCode::Right) || is_key_down(KeyCode::D);
        let move_up = is_key_down(KeyCode::Up) || is_key_down(KeyCode::W);
        let move_down = is_key_down(KeyCode::Down) || is_key_down(KeyCode::S);
        let restart = is_key_pressed(KeyCode::R);
        let quit_requested = is_key_pressed(KeyCode::Escape) || is_key_pressed(KeyCode::Q);

        Self {
            move_left,
            move_right,
            move_up,
            move_down,
            restart,
            quit_requested,
        }
    }
}

/// Rendering backend implemented on top of macroquad.
#[derive(Clone, Copy, Debug, Default)]
pub struct MacroquadBackend {
    swap_interval: Option<i32>,
    show_fps: bool,
}

impl MacroquadBackend {
    /// Returns a backend that requests the platform's default swap interval.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the backend to request a specific swap interval from the platform.
    #[must_use]
    pub fn with_swap_interval(mut self, swap_interval: Option<i32>) -> Self {
        self.swap_interval = swap_interval;
        self
    }

    /// Configures the backend to either synchronise presentation with the display refresh rate
    /// or render as fast as possible.
    #[must_use]
    pub fn with_vsync(self, enabled: bool) -> Self {
        let swap_interval = if enabled { Some(1) } else { Some(0) };
        self.with_swap_interval(swap_interval)
    }

    /// Configures whether the backend prints frame timing metrics once per second.
    #[must_use]
    pub fn with_show_fps(mut self, show: bool) -> Self {
        self.show_fps = show;
        self
    }
}

/// Tracks the average frames-per-second produced by the render loop.
#[derive(Debug, Default)]
struct FpsCounter {
    elapsed: Duration,
    frames: u32,
    frame_times: VecDeque<Duration>,
    window_duration: Duration,
}

#[derive(Clone, Copy, Debug)]
struct FpsMetrics {
    per_second: f32,
    trailing_ten_seconds: f32,
}

impl FpsCounter {
    /// Records a rendered frame and returns the per-second and trailing ten-second averages once
    /// one second has elapsed.
    fn record_frame(&mut self, frame: Duration) -> Option<FpsMetrics> {
        self.elapsed += frame;
        self.frames = self.frames.saturating_add(1);

        self.frame_times.push_back(frame);
        self.window_duration += frame;

        let trailing_window = Duration::from_secs(10);
        while self.window_duration > trailing_window {
            if let Some(removed) = self.frame_times.pop_front() {
                self.window_duration = self.window_duration.saturating_sub(removed);
            } else {
                break;
            }
        }

        if self.elapsed < Duration::from_secs(1) {
            return None;
        }

        let seconds = self.elapsed.as_secs_f32();
        if seconds <= f32::EPSILON {
            self.elapsed = Duration::ZERO;
            self.frames = 0;
            return None;
        }

        let per_second = self.frames as f32 / seconds;
        let window_seconds = self.window_duration.as_secs_f32();
        let trailing_ten_seconds = if window_seconds <= f32::EPSILON {
            per_second
        } else {
            self.frame_times.len() as f32 / window_seconds
        };
        self.elapsed = Duration::ZERO;
        self.frames = 0;
        Some(FpsMetrics {
            per_second,
            trailing_ten_seconds,
        })
    }
}

impl RenderingBackend for MacroquadBackend {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static,
    {
        let Self {
            swap_interval,
            show_fps,
        } = self;

        let Presentation {
            window_title,
            clear_color,
            scene,
        } = presentation;

        let mut config = macroquad::window::Conf {
            window_title,
            window_width: 800,
            window_height: 400,
            ..macroquad::window::Conf::default()
        };
        if let Some(swap_interval) = swap_interval {
            config.platform.swap_interval = Some(swap_interval);
        }

        macroquad::Window::from_config(config, async move {
            let mut scene = scene;
            let background = to_macroquad_color(clear_color);
            let mut fps_counter = FpsCounter::default();
            let mut road_textures: TextureStore<Texture2D> = TextureStore::new();
            let mut texture_tile_size = 0;

            loop {
                let keyboard = KeyboardShortcuts::poll();
                if keyboard.quit_requested {
                    break;
                }

                macroquad::window::clear_background(background);

                let viewport = Vec2::new(
                    macroquad::window::screen_width(),
                    macroquad::window::screen_height(),
                );

                let dt_seconds = macroquad::time::get_frame_time();
                let frame_dt = Duration::from_secs_f32(dt_seconds.max(0.0));
                let frame_input = FrameInput {
                    move_left: keyboard.move_left,
                    move_right: keyboard.move_right,
                    move_up: keyboard.move_up,
                    move_down: keyboard.move_down,
                    restart: keyboard.restart,
                    viewport,
                };

                update_scene(frame_dt, frame_input, &mut scene);

                let tile_size = scene.tile_grid.tile_length.round().max(1.0) as u32;
                if tile_size != texture_tile_size {
                    road_textures = TextureStore::new();
                    texture_tile_size = tile_size;
                }
                prepare_next_variant(&mut road_textures, tile_size);

                draw_scene(&scene, &road_textures, viewport);

                if show_fps {
                    if let Some(FpsMetrics {
                        per_second,
                        trailing_ten_seconds,
                    }) = fps_counter.record_frame(frame_dt)
                    {
                        println!(
                            "FPS: {:.2} (10s avg: {:.2})",
                            per_second, trailing_ten_seconds,
                        );
                    }
                }

                macroquad::window::next_frame().await;
            }
        });

        Ok(())
    }
}

/// Rasterises at most one cobblestone variant per call so texture preparation
/// spreads across frames instead of stalling the first one.
fn prepare_next_variant(road_textures: &mut TextureStore<Texture2D>, tile_size: u32) {
    if road_textures.is_ready() {
        return;
    }

    let prepared = road_textures.prepared_count() as u32;
    if prepared < COBBLESTONE_VARIANTS {
        let pattern = CobblestonePattern::new(tile_size, prepared);
        road_textures.push_variant(rasterise_pattern(&pattern));
    }
    if road_textures.prepared_count() as u32 >= COBBLESTONE_VARIANTS {
        road_textures.finish_loading();
    }
}

fn draw_scene(scene: &Scene, road_textures: &TextureStore<Texture2D>, viewport: Vec2) {
    let window = visible_tiles(scene.camera_offset, viewport, scene.tile_grid);
    let tile = scene.tile_grid.tile_length;

    for row in window.rows() {
        for column in window.columns() {
            if let Some(kind) = scene.tile(column, row) {
                let screen_x = column as f32 * tile - scene.camera_offset.x;
                let screen_y = row as f32 * tile - scene.camera_offset.y;
                draw_tile(kind, column, row, screen_x, screen_y, tile, road_textures);
            }
        }
    }

    draw_player(scene);
    draw_coins(scene);
    draw_score(scene.score);
}

fn draw_tile(
    kind: TileKind,
    column: u32,
    row: u32,
    screen_x: f32,
    screen_y: f32,
    tile: f32,
    road_textures: &TextureStore<Texture2D>,
) {
    if kind == TileKind::Road {
        match road_textures.variant_for_tile(column, row) {
            Some(texture) => {
                macroquad::texture::draw_texture(
                    *texture,
                    screen_x,
                    screen_y,
                    macroquad::color::WHITE,
                );
            }
            None => {
                macroquad::shapes::draw_rectangle(
                    screen_x,
                    screen_y,
                    tile,
                    tile,
                    to_macroquad_color(palette::ROAD),
                );
            }
        }
        return;
    }

    macroquad::shapes::draw_rectangle(
        screen_x,
        screen_y,
        tile,
        tile,
        to_macroquad_color(palette::tile_color(kind)),
    );
    macroquad::shapes::draw_rectangle_lines(
        screen_x,
        screen_y,
        tile,
        tile,
        1.0,
        to_macroquad_color(palette::TILE_BORDER),
    );

    match kind {
        TileKind::Temple => draw_temple_details(screen_x, screen_y, tile),
        TileKind::Building => draw_building_details(screen_x, screen_y, tile),
        _ => {}
    }
}

/// Two flanking columns plus a triangular pediment overhanging the tile top.
fn draw_temple_details(screen_x: f32, screen_y: f32, tile: f32) {
    let column_color = to_macroquad_color(palette::COLUMN);
    macroquad::shapes::draw_rectangle(screen_x + 5.0, screen_y + 5.0, 5.0, tile - 10.0, column_color);
    macroquad::shapes::draw_rectangle(
        screen_x + tile - 10.0,
        screen_y + 5.0,
        5.0,
        tile - 10.0,
        column_color,
    );

    macroquad::shapes::draw_triangle(
        MacroquadVec2::new(screen_x, screen_y),
        MacroquadVec2::new(screen_x + tile / 2.0, screen_y - 10.0),
        MacroquadVec2::new(screen_x + tile, screen_y),
        to_macroquad_color(palette::ROOF),
    );
}

/// A centred door on the southern edge and two square windows.
fn draw_building_details(screen_x: f32, screen_y: f32, tile: f32) {
    macroquad::shapes::draw_rectangle(
        screen_x + tile / 2.0 - 5.0,
        screen_y + tile - 15.0,
        10.0,
        15.0,
        to_macroquad_color(palette::DOOR),
    );

    let window_color = to_macroquad_color(palette::WINDOW);
    macroquad::shapes::draw_rectangle(screen_x + 10.0, screen_y + 10.0, 8.0, 8.0, window_color);
    macroquad::shapes::draw_rectangle(
        screen_x + tile - 18.0,
        screen_y + 10.0,
        8.0,
        8.0,
        window_color,
    );
}

/// Soldier body with a helmet strip above and a shield strip on the west flank.
fn draw_player(scene: &Scene) {
    let player = scene.player;
    let screen = player.position - scene.camera_offset;

    macroquad::shapes::draw_rectangle(
        screen.x,
        screen.y,
        player.size.x,
        player.size.y,
        to_macroquad_color(palette::PLAYER_BODY),
    );
    macroquad::shapes::draw_rectangle(
        screen.x + 5.0,
        screen.y - 5.0,
        player.size.x - 10.0,
        5.0,
        to_macroquad_color(palette::PLAYER_HELMET),
    );
    macroquad::shapes::draw_rectangle(
        screen.x - 5.0,
        screen.y + 5.0,
        5.0,
        player.size.y - 10.0,
        to_macroquad_color(palette::PLAYER_SHIELD),
    );
}

fn draw_coins(scene: &Scene) {
    let coin_color = to_macroquad_color(palette::COIN);
    for coin in &scene.coins {
        let screen = coin.position - scene.camera_offset;
        let radius = coin.diameter / 2.0;
        macroquad::shapes::draw_circle(screen.x + radius, screen.y + radius, radius, coin_color);
    }
}

fn draw_score(score: u32) {
    macroquad::text::draw_text(
        &format!("Score: {score}"),
        12.0,
        24.0,
        24.0,
        macroquad::color::WHITE,
    );
}

fn to_macroquad_color(color: Color) -> macroquad::color::Color {
    macroquad::color::Color::new(color.red, color.green, color.blue, color.alpha)
}
