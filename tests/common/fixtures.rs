use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut, draw_polygon_mut};
use imageproc::point::Point;
use imageproc::rect::Rect;
use signspot::BoundingBox;
use tempfile::NamedTempFile;

/// Neutral background with zero saturation
pub const BACKGROUND: Rgb<u8> = Rgb([120, 120, 120]);
pub const SIGN_RED: Rgb<u8> = Rgb([220, 20, 20]);
pub const SIGN_BLUE: Rgb<u8> = Rgb([20, 40, 220]);
pub const SIGN_YELLOW: Rgb<u8> = Rgb([240, 200, 0]);

/// Pixels the default blur and threshold may shave off each side of a shape
pub const EDGE_TOLERANCE: u32 = 2;

pub fn blank_canvas(width: u32, height: u32) -> RgbImage {
    RgbImage::from_pixel(width, height, BACKGROUND)
}

pub fn fill_square(canvas: &mut RgbImage, x: i32, y: i32, side: u32, color: Rgb<u8>) -> BoundingBox {
    draw_filled_rect_mut(canvas, Rect::at(x, y).of_size(side, side), color);
    BoundingBox::new(x as u32, y as u32, side, side)
}

pub fn fill_disc(canvas: &mut RgbImage, cx: i32, cy: i32, radius: i32, color: Rgb<u8>) -> BoundingBox {
    draw_filled_circle_mut(canvas, (cx, cy), radius, color);
    let side = 2 * radius as u32 + 1;
    BoundingBox::new((cx - radius) as u32, (cy - radius) as u32, side, side)
}

pub fn fill_polygon(canvas: &mut RgbImage, vertices: &[(i32, i32)], color: Rgb<u8>) {
    let points: Vec<Point<i32>> = vertices.iter().map(|&(x, y)| Point::new(x, y)).collect();
    draw_polygon_mut(canvas, &points, color);
}

/// A 320x240 scene with a red square and a blue disc.
/// Returns the image and the exact extents of (square, disc).
pub fn square_and_disc_scene() -> (DynamicImage, BoundingBox, BoundingBox) {
    let mut canvas = blank_canvas(320, 240);
    let square = fill_square(&mut canvas, 40, 60, 60, SIGN_RED);
    let disc = fill_disc(&mut canvas, 220, 120, 40, SIGN_BLUE);
    (DynamicImage::ImageRgb8(canvas), square, disc)
}

/// `shape` grown by `margin` on each side, minus the edge tolerance
pub fn must_contain(shape: &BoundingBox, margin: u32) -> BoundingBox {
    let grow = margin.saturating_sub(EDGE_TOLERANCE);
    BoundingBox::new(
        shape.x.saturating_sub(grow),
        shape.y.saturating_sub(grow),
        shape.width + 2 * grow,
        shape.height + 2 * grow,
    )
}

/// Writes `image` to a temporary PNG file that is removed on drop
pub fn save_temp_png(image: &DynamicImage) -> NamedTempFile {
    let file = tempfile::Builder::new()
        .suffix(".png")
        .tempfile()
        .expect("Failed to create temp image file");
    image
        .save_with_format(file.path(), image::ImageFormat::Png)
        .expect("Failed to save test image");
    file
}
