use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use tracing::{debug, warn};

use crate::models::{BoundingBox, ProposalSet, ShapeLabel};
use crate::pipeline::PipelineObserver;

/// Outline thickness of proposal boxes, in pixels
const BOX_THICKNESS: u32 = 4;

/// Drawing color for each shape
pub fn label_color(label: ShapeLabel) -> Rgb<u8> {
    match label {
        ShapeLabel::Triangle => Rgb([255, 200, 0]),
        ShapeLabel::Rectangle => Rgb([0, 200, 255]),
        ShapeLabel::Hexagon => Rgb([160, 0, 255]),
        ShapeLabel::Circle => Rgb([255, 0, 255]),
        ShapeLabel::NonConvex => Rgb([0, 255, 100]),
        ShapeLabel::Rejected => Rgb([128, 128, 128]),
    }
}

/// Draw a thick hollow box, clipped to the canvas
pub fn draw_box(canvas: &mut RgbImage, bbox: &BoundingBox, color: Rgb<u8>) {
    for inset in 0..BOX_THICKNESS {
        let width = bbox.width.saturating_sub(2 * inset);
        let height = bbox.height.saturating_sub(2 * inset);
        if width == 0 || height == 0 {
            break;
        }
        let rect = Rect::at((bbox.x + inset) as i32, (bbox.y + inset) as i32).of_size(width, height);
        draw_hollow_rect_mut(canvas, rect, color);
    }
}

/// Copy of `image` with every proposal outlined in its label color
pub fn annotate(image: &DynamicImage, proposals: &ProposalSet) -> RgbImage {
    let mut canvas = image.to_rgb8();
    for (label, bbox) in proposals.iter() {
        draw_box(&mut canvas, bbox, label_color(label));
    }
    canvas
}

/// Observer that writes every intermediate image to a directory.
///
/// Layout: `00_input.png`, one `NN_<step>.png` per mask step and
/// `proposals.png` with the accepted boxes drawn over the final mask.
/// Write failures are logged and counted, never propagated.
pub struct DebugDump {
    output_dir: PathBuf,
    last_stage: Option<DynamicImage>,
    failures: usize,
}

impl DebugDump {
    /// The directory must be empty or non-existent
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir)?;
            if entries.count() > 0 {
                return Err(anyhow!("Debug directory is not empty: {}", output_dir.display()));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }

        Ok(Self {
            output_dir,
            last_stage: None,
            failures: 0,
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Number of images that could not be written
    pub fn failures(&self) -> usize {
        self.failures
    }

    fn save(&mut self, file_name: &str, image: &DynamicImage) {
        let path = self.output_dir.join(file_name);
        match image.save(&path) {
            Ok(()) => debug!("saved {}", path.display()),
            Err(e) => {
                self.failures += 1;
                warn!("Failed to save debug image {}: {}", path.display(), e);
            }
        }
    }
}

impl PipelineObserver for DebugDump {
    fn on_input(&mut self, image: &DynamicImage) {
        self.save("00_input.png", image);
    }

    fn on_stage(&mut self, index: usize, name: &str, image: &DynamicImage) {
        let file_name = format!("{:02}_{}.png", index, name.to_lowercase().replace(' ', "_"));
        self.save(&file_name, image);
        self.last_stage = Some(image.clone());
    }

    fn on_finish(&mut self, proposals: &ProposalSet) {
        let Some(mask) = self.last_stage.take() else {
            return;
        };
        let overlay = DynamicImage::ImageRgb8(annotate(&mask, proposals));
        self.save("proposals.png", &overlay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annotate_leaves_source_untouched() {
        let source = DynamicImage::ImageRgb8(RgbImage::from_pixel(50, 50, Rgb([10, 10, 10])));
        let mut proposals = ProposalSet::new();
        proposals.insert(ShapeLabel::Circle, BoundingBox::new(5, 5, 20, 20));

        let canvas = annotate(&source, &proposals);

        assert_eq!(*canvas.get_pixel(5, 5), label_color(ShapeLabel::Circle));
        assert_eq!(*canvas.get_pixel(8, 8), label_color(ShapeLabel::Circle));
        assert_eq!(*canvas.get_pixel(15, 15), Rgb([10, 10, 10]));
        assert_eq!(source.to_rgb8().get_pixel(5, 5), &Rgb([10, 10, 10]));
    }

    #[test]
    fn tiny_boxes_do_not_panic() {
        let mut canvas = RgbImage::new(10, 10);
        draw_box(&mut canvas, &BoundingBox::new(8, 8, 2, 2), Rgb([255, 0, 0]));
        draw_box(&mut canvas, &BoundingBox::new(9, 9, 1, 1), Rgb([255, 0, 0]));
        assert_eq!(*canvas.get_pixel(9, 9), Rgb([255, 0, 0]));
    }
}
