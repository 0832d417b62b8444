use image::{GrayImage, imageops};
use imageproc::contours::{BorderType, find_contours};

use crate::models::{Contour, Point};

/// Outermost contours of the foreground (non-zero) regions in `mask`.
///
/// Holes and regions nested inside other regions are skipped, so a sign's
/// pictogram never shows up separately from its border. Regions touching the
/// image edge are traced as if the image were surrounded by background.
pub fn find_external_contours(mask: &GrayImage) -> Vec<Contour> {
    if mask.width() == 0 || mask.height() == 0 {
        return Vec::new();
    }

    // The tracer only opens an outer border at x > 0
    let mut framed = GrayImage::new(mask.width() + 2, mask.height() + 2);
    imageops::replace(&mut framed, mask, 1, 1);

    find_contours::<i32>(&framed)
        .into_iter()
        .filter(|c| c.parent.is_none() && c.border_type == BorderType::Outer)
        .filter(|c| !c.points.is_empty())
        .map(|c| Contour::new(c.points.iter().map(|p| Point::new(p.x - 1, p.y - 1)).collect()))
        .collect()
}
