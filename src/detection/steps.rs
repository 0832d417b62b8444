use image::DynamicImage;

use crate::config::{ChannelMode, PreprocessConfig};
use crate::detection::preprocessing;
use crate::pipeline::{Pipeline, PipelineStep};

/// Extract the HSV saturation channel from a color image
pub struct SaturationStep;

impl PipelineStep for SaturationStep {
    fn process(&self, image: &DynamicImage) -> DynamicImage {
        let rgb = image.to_rgb8();
        DynamicImage::ImageLuma8(preprocessing::saturation_channel(&rgb))
    }

    fn name(&self) -> &str {
        "Saturation"
    }
}

/// Mask strongly colored red and blue pixels
pub struct HueMaskStep;

impl PipelineStep for HueMaskStep {
    fn process(&self, image: &DynamicImage) -> DynamicImage {
        let rgb = image.to_rgb8();
        DynamicImage::ImageLuma8(preprocessing::red_blue_hue_mask(&rgb))
    }

    fn name(&self) -> &str {
        "Hue Mask"
    }
}

/// Normalize contrast across lighting conditions
pub struct EqualizeStep;

impl PipelineStep for EqualizeStep {
    fn process(&self, image: &DynamicImage) -> DynamicImage {
        let gray = image.to_luma8();
        DynamicImage::ImageLuma8(preprocessing::equalize_histogram(&gray))
    }

    fn name(&self) -> &str {
        "Histogram Equalization"
    }
}

/// Apply Gaussian blur
pub struct BlurStep {
    pub sigma: f32,
}

impl PipelineStep for BlurStep {
    fn process(&self, image: &DynamicImage) -> DynamicImage {
        let gray = image.to_luma8();
        DynamicImage::ImageLuma8(preprocessing::apply_blur(&gray, self.sigma))
    }

    fn name(&self) -> &str {
        "Gaussian Blur"
    }
}

/// Fixed-level binarization
pub struct ThresholdStep {
    pub level: u8,
}

impl PipelineStep for ThresholdStep {
    fn process(&self, image: &DynamicImage) -> DynamicImage {
        let gray = image.to_luma8();
        DynamicImage::ImageLuma8(preprocessing::binarize(&gray, self.level))
    }

    fn name(&self) -> &str {
        "Threshold"
    }
}

/// Remove specks smaller than the structuring element
pub struct OpeningStep {
    pub radius: u8,
}

impl PipelineStep for OpeningStep {
    fn process(&self, image: &DynamicImage) -> DynamicImage {
        let gray = image.to_luma8();
        DynamicImage::ImageLuma8(preprocessing::open_mask(&gray, self.radius))
    }

    fn name(&self) -> &str {
        "Opening"
    }
}

/// Merge fragments of one region
pub struct ClosingStep {
    pub radius: u8,
}

impl PipelineStep for ClosingStep {
    fn process(&self, image: &DynamicImage) -> DynamicImage {
        let gray = image.to_luma8();
        DynamicImage::ImageLuma8(preprocessing::close_mask(&gray, self.radius))
    }

    fn name(&self) -> &str {
        "Closing"
    }
}

/// Assemble the mask pipeline described by `config`.
///
/// Steps whose parameters make them a no-op are left out so debug output
/// only shows stages that changed something.
pub fn build_mask_pipeline(config: &PreprocessConfig) -> Pipeline {
    let mut pipeline = Pipeline::new();

    pipeline = match config.channel {
        ChannelMode::Saturation => {
            let mut p = pipeline
                .add_step_boxed(Box::new(SaturationStep))
                .add_step_boxed(Box::new(EqualizeStep));
            if config.blur_sigma > 0.0 {
                p = p.add_step_boxed(Box::new(BlurStep { sigma: config.blur_sigma }));
            }
            p.add_step_boxed(Box::new(ThresholdStep { level: config.threshold }))
        }
        ChannelMode::RedBlueHue => pipeline.add_step_boxed(Box::new(HueMaskStep)),
    };

    if config.open_radius > 0 {
        pipeline = pipeline.add_step_boxed(Box::new(OpeningStep { radius: config.open_radius }));
    }
    if config.close_radius > 0 {
        pipeline = pipeline.add_step_boxed(Box::new(ClosingStep { radius: config.close_radius }));
    }

    pipeline
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saturation_pipeline_stages() {
        let pipeline = build_mask_pipeline(&PreprocessConfig::default());
        assert_eq!(
            pipeline.step_names(),
            vec!["Saturation", "Histogram Equalization", "Gaussian Blur", "Threshold", "Opening"]
        );
    }

    #[test]
    fn hue_pipeline_skips_thresholding() {
        let config = PreprocessConfig {
            channel: ChannelMode::RedBlueHue,
            close_radius: 3,
            ..Default::default()
        };
        let pipeline = build_mask_pipeline(&config);
        assert_eq!(pipeline.step_names(), vec!["Hue Mask", "Opening", "Closing"]);
    }
}
