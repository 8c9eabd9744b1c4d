//! Frame overlays: hand skeleton and gesture label
//!
//! Drawing is done directly on the RGB buffer. Everything is clipped to the
//! frame, so landmarks outside [0, 1] are safe to draw.

use image::{Rgb, RgbImage};

use super::font::{self, GLYPH_ADVANCE, GLYPH_HEIGHT, GLYPH_WIDTH};
use crate::gesture::landmarks::HAND_CONNECTIONS;
use crate::gesture::HandLandmarkSet;

pub const LANDMARK_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
pub const CONNECTION_COLOR: Rgb<u8> = Rgb([224, 224, 224]);
pub const LABEL_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// Label baseline position (left, baseline) in pixels
pub const LABEL_ORIGIN: (i32, i32) = (10, 40);
pub const LABEL_SCALE: u32 = 3;

const LANDMARK_RADIUS: i32 = 2;
const LINE_THICKNESS: i32 = 2;

/// Draw the hand connection graph and landmark dots
pub fn draw_hand(frame: &mut RgbImage, hand: &HandLandmarkSet) {
    let (width, height) = frame.dimensions();
    let pixels = hand.to_pixels(width, height);
    let to_point = |(x, y): (f32, f32)| (x.round() as i32, y.round() as i32);

    for (a, b) in HAND_CONNECTIONS {
        draw_line(frame, to_point(pixels[a]), to_point(pixels[b]), CONNECTION_COLOR, LINE_THICKNESS);
    }

    for point in pixels {
        let (x, y) = to_point(point);
        fill_circle(frame, x, y, LANDMARK_RADIUS, LANDMARK_COLOR);
    }
}

/// Draw text with its baseline at `origin`
pub fn draw_label(frame: &mut RgbImage, text: &str, origin: (i32, i32), color: Rgb<u8>, scale: u32) {
    let scale = scale.max(1) as i32;
    let top = origin.1 - GLYPH_HEIGHT as i32 * scale;
    let mut left = origin.0;

    for c in text.chars().filter(|&c| !font::is_zero_width(c)) {
        let rows = font::glyph(c);
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                    continue;
                }
                let x = left + col as i32 * scale;
                let y = top + row as i32 * scale;
                fill_rect(frame, x, y, scale, scale, color);
            }
        }
        left += GLYPH_ADVANCE as i32 * scale;
    }
}

/// Pixel width `draw_label` will use for `text`
pub fn label_width(text: &str, scale: u32) -> u32 {
    font::cell_count(text) * GLYPH_ADVANCE * scale.max(1)
}

fn put_pixel_clipped(frame: &mut RgbImage, x: i32, y: i32, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < frame.width() && (y as u32) < frame.height() {
        frame.put_pixel(x as u32, y as u32, color);
    }
}

fn fill_rect(frame: &mut RgbImage, x: i32, y: i32, w: i32, h: i32, color: Rgb<u8>) {
    for dy in 0..h {
        for dx in 0..w {
            put_pixel_clipped(frame, x + dx, y + dy, color);
        }
    }
}

fn fill_circle(frame: &mut RgbImage, cx: i32, cy: i32, radius: i32, color: Rgb<u8>) {
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                put_pixel_clipped(frame, cx + dx, cy + dy, color);
            }
        }
    }
}

/// Bresenham line with a square brush
fn draw_line(frame: &mut RgbImage, from: (i32, i32), to: (i32, i32), color: Rgb<u8>, thickness: i32) {
    let (mut x, mut y) = from;
    let dx = (to.0 - x).abs();
    let dy = -(to.1 - y).abs();
    let sx = if x < to.0 { 1 } else { -1 };
    let sy = if y < to.1 { 1 } else { -1 };
    let mut err = dx + dy;
    let offset = thickness / 2;

    // Landmarks far outside the frame would make this loop long for nothing
    let limit = (frame.width() + frame.height()) as i32 * 4;
    if dx > limit || -dy > limit {
        return;
    }

    loop {
        fill_rect(frame, x - offset, y - offset, thickness.max(1), thickness.max(1), color);
        if (x, y) == to {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}
