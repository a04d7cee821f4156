//! Rasterises procedural cobblestone descriptions into GPU textures.

use cardo_rendering::{palette, CobbleStone, CobblestonePattern, Color};
use macroquad::texture::{FilterMode, Image, Texture2D};

/// Paints one cobblestone variant into an image and uploads it.
///
/// Nearest-neighbour filtering keeps the single-pixel mortar lines crisp when
/// the texture is drawn at its native tile size.
pub(crate) fn rasterise_pattern(pattern: &CobblestonePattern) -> Texture2D {
    let size = pattern.tile_size();
    let mut image = Image::gen_image_color(
        size as u16,
        size as u16,
        to_image_color(pattern.base_color()),
    );

    for stone in pattern.stones() {
        paint_stone(&mut image, &stone);
    }

    let mortar = to_image_color(palette::MORTAR);
    let pitch = pattern.mortar_pitch();
    for line in 1..pattern.stones_per_row() {
        let offset = line * pitch;
        fill_rect(&mut image, 0, offset, size, 1, mortar);
        fill_rect(&mut image, offset, 0, 1, size, mortar);
    }

    let texture = Texture2D::from_image(&image);
    texture.set_filter(FilterMode::Nearest);
    texture
}

fn paint_stone(image: &mut Image, stone: &CobbleStone) {
    let x = stone.x as u32;
    let y = stone.y as u32;
    let side = stone.size.round().max(1.0) as u32;

    fill_rect(image, x, y, side, side, to_image_color(stone.color));
    if stone.highlighted {
        blend_white(image, x, y, side / 2, side / 2, 0.2);
    }
}

fn fill_rect(image: &mut Image, x: u32, y: u32, width: u32, height: u32, color: macroquad::color::Color) {
    let max_x = (x + width).min(image.width() as u32);
    let max_y = (y + height).min(image.height() as u32);
    for py in y..max_y {
        for px in x..max_x {
            image.set_pixel(px, py, color);
        }
    }
}

/// Overlays translucent white, matching a canvas-style alpha fill.
fn blend_white(image: &mut Image, x: u32, y: u32, width: u32, height: u32, alpha: f32) {
    let max_x = (x + width).min(image.width() as u32);
    let max_y = (y + height).min(image.height() as u32);
    for py in y..max_y {
        for px in x..max_x {
            let base = image.get_pixel(px, py);
            let blended = macroquad::color::Color::new(
                base.r + (1.0 - base.r) * alpha,
                base.g + (1.0 - base.g) * alpha,
                base.b + (1.0 - base.b) * alpha,
                base.a,
            );
            image.set_pixel(px, py, blended);
        }
    }
}

fn to_image_color(color: Color) -> macroquad::color::Color {
    macroquad::color::Color::new(color.red, color.green, color.blue, color.alpha)
}
