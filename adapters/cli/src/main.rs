#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that boots the Cardo city experience.
//!
//! The binary owns the translation between backend frame input and world
//! commands: held movement keys become move intents, `R` regenerates the city
//! with a fresh seed, and every frame ends with a tick followed by a scene
//! refresh from the world's query surface.

use anyhow::Result;
use cardo_core::{Command, Event, MoveDirection, TileCoord, TILE_SIZE};
use cardo_rendering::{
    palette, CoinPresentation, PlayerPresentation, Presentation, RenderingBackend, Scene,
    TileGridPresentation,
};
use cardo_rendering_macroquad::MacroquadBackend;
use cardo_world::{self as world, query, World};
use clap::Parser;
use glam::Vec2;
use tracing::{debug, info};

const STARTUP_VIEWPORT: Vec2 = Vec2::new(800.0, 400.0);

/// Command-line arguments accepted by the Cardo binary.
#[derive(Debug, Parser)]
#[command(name = "cardo", about = "Explore a procedurally generated Roman city")]
struct Args {
    /// Seed for the city generator; a random seed is drawn when omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Number of map columns; derived from the window size when omitted.
    #[arg(long)]
    columns: Option<u32>,

    /// Number of map rows; derived from the window size when omitted.
    #[arg(long)]
    rows: Option<u32>,

    /// Side length of a square tile in pixels.
    #[arg(long, default_value_t = TILE_SIZE)]
    tile_length: f32,

    /// Synchronise presentation with the display refresh rate.
    #[arg(long)]
    vsync: bool,

    /// Print frame timing metrics once per second.
    #[arg(long)]
    show_fps: bool,
}

/// Move intents currently registered with the world, used to edge-detect
/// changes so intent commands fire only on transitions.
#[derive(Clone, Copy, Debug, Default)]
struct HeldIntents {
    left: bool,
    right: bool,
    up: bool,
    down: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    anyhow::ensure!(
        args.tile_length > 0.0,
        "tile length must be positive (received {})",
        args.tile_length
    );

    let tile_length = args.tile_length;
    let seed = args.seed.unwrap_or_else(rand::random);
    let (columns, rows) = map_dimensions(&args, STARTUP_VIEWPORT);
    info!(seed, columns, rows, tile_length, "configuring city session");

    let mut world = World::new();
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::ConfigureMap {
            columns: TileCoord::new(columns),
            rows: TileCoord::new(rows),
            tile_length,
            seed,
        },
        &mut events,
    );
    world::apply(
        &mut world,
        Command::ConfigureViewport {
            width: STARTUP_VIEWPORT.x,
            height: STARTUP_VIEWPORT.y,
        },
        &mut events,
    );
    log_events(&events);

    let mut scene = Scene {
        tile_grid: TileGridPresentation::new(columns, rows, tile_length)?,
        tiles: Vec::new(),
        camera_offset: Vec2::ZERO,
        player: PlayerPresentation {
            position: Vec2::ZERO,
            size: Vec2::ZERO,
        },
        coins: Vec::new(),
        score: 0,
    };
    populate_scene(&world, &mut scene);

    let presentation = Presentation::new("Cardo", palette::EMPTY, scene);
    // Absent the flag the platform keeps its default swap interval.
    let mut backend = MacroquadBackend::new().with_show_fps(args.show_fps);
    if args.vsync {
        backend = backend.with_vsync(true);
    }

    let mut held = HeldIntents::default();
    let mut viewport = STARTUP_VIEWPORT;
    backend.run(presentation, move |dt, input, scene| {
        let mut events = Vec::new();

        if input.restart {
            let seed: u64 = rand::random();
            let grid = *query::tile_grid(&world);
            info!(seed, "restarting with a fresh city");
            world::apply(
                &mut world,
                Command::ConfigureMap {
                    columns: grid.columns(),
                    rows: grid.rows(),
                    tile_length: grid.tile_length(),
                    seed,
                },
                &mut events,
            );
        }

        if input.viewport != viewport && input.viewport.x > 0.0 && input.viewport.y > 0.0 {
            viewport = input.viewport;
            world::apply(
                &mut world,
                Command::ConfigureViewport {
                    width: viewport.x,
                    height: viewport.y,
                },
                &mut events,
            );
        }

        sync_intent(
            &mut world,
            &mut events,
            MoveDirection::Left,
            input.move_left,
            &mut held.left,
        );
        sync_intent(
            &mut world,
            &mut events,
            MoveDirection::Right,
            input.move_right,
            &mut held.right,
        );
        sync_intent(
            &mut world,
            &mut events,
            MoveDirection::Up,
            input.move_up,
            &mut held.up,
        );
        sync_intent(
            &mut world,
            &mut events,
            MoveDirection::Down,
            input.move_down,
            &mut held.down,
        );

        world::apply(&mut world, Command::Tick { dt }, &mut events);
        log_events(&events);

        populate_scene(&world, scene);
    })
}

/// Explicit dimensions win; otherwise enough tiles to cover the window plus a
/// two-tile margin so no bare backdrop shows at the map edge.
fn map_dimensions(args: &Args, viewport: Vec2) -> (u32, u32) {
    let derived_columns = ((viewport.x / args.tile_length).ceil() as u32).saturating_add(2);
    let derived_rows = ((viewport.y / args.tile_length).ceil() as u32).saturating_add(2);
    (
        args.columns.unwrap_or(derived_columns),
        args.rows.unwrap_or(derived_rows),
    )
}

/// Registers a move intent change with the world when the held state flips.
fn sync_intent(
    world: &mut World,
    events: &mut Vec<Event>,
    direction: MoveDirection,
    active: bool,
    held: &mut bool,
) {
    if *held == active {
        return;
    }
    *held = active;
    world::apply(world, Command::SetMoveIntent { direction, active }, events);
}

fn log_events(events: &[Event]) {
    for event in events {
        match event {
            Event::MapGenerated {
                columns,
                rows,
                seed,
            } => {
                info!(
                    columns = columns.get(),
                    rows = rows.get(),
                    seed,
                    "city generated"
                );
            }
            Event::CoinCollected { value, score, .. } => {
                debug!(value, score, "coin collected");
            }
            _ => {}
        }
    }
}

/// Refreshes the scene from the world's query surface after a tick.
fn populate_scene(world: &World, scene: &mut Scene) {
    let grid = query::tile_grid(world);
    if let Ok(tile_grid) =
        TileGridPresentation::new(grid.columns().get(), grid.rows().get(), grid.tile_length())
    {
        scene.tile_grid = tile_grid;
    }
    scene.tiles = query::city_map(world).tiles().to_vec();

    let camera = query::camera(world);
    scene.camera_offset = Vec2::new(camera.offset_x(), camera.offset_y());

    let player = query::player(world);
    scene.player = PlayerPresentation {
        position: Vec2::new(player.rect.x, player.rect.y),
        size: Vec2::new(player.rect.width, player.rect.height),
    };

    scene.coins = query::coins(world)
        .iter()
        .map(|coin| CoinPresentation {
            position: Vec2::new(coin.rect.x, coin.rect.y),
            diameter: coin.rect.width,
        })
        .collect();

    scene.score = query::score(world);
}
