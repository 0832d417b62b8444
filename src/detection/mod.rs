pub mod contours;
pub mod geometry;
pub mod preprocessing;
pub mod shapes;
pub mod steps;

use image::{DynamicImage, GrayImage};
use tracing::{debug, info};

use crate::config::{PreprocessConfig, ProposalConfig};
use crate::models::{Contour, ProposalSet};
use crate::pipeline::{NoopObserver, Pipeline, PipelineObserver};
use shapes::{Classification, ContourClassifier};

/// Turns a color image into a binary mask of saturated regions
#[derive(Clone)]
pub struct ChannelPreprocessor {
    pipeline: Pipeline,
}

impl ChannelPreprocessor {
    pub fn new(config: &PreprocessConfig) -> Self {
        Self {
            pipeline: steps::build_mask_pipeline(config),
        }
    }

    /// Build from an explicit step sequence
    pub fn from_pipeline(pipeline: Pipeline) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn preprocess(&self, image: &DynamicImage) -> GrayImage {
        self.preprocess_observed(image, &mut NoopObserver)
    }

    /// Like [`preprocess`](Self::preprocess), reporting every stage
    pub fn preprocess_observed(&self, image: &DynamicImage, observer: &mut dyn PipelineObserver) -> GrayImage {
        if image.width() == 0 || image.height() == 0 {
            return GrayImage::new(0, 0);
        }
        self.pipeline.run(image, observer).into_luma8()
    }
}

impl Default for ChannelPreprocessor {
    fn default() -> Self {
        Self::new(&PreprocessConfig::default())
    }
}

/// Region-proposal orchestrator: mask, contours, shape filters, box expansion
#[derive(Clone)]
pub struct ProposalExtractor {
    preprocessor: ChannelPreprocessor,
    classifier: ContourClassifier,
    margin: u32,
}

impl ProposalExtractor {
    pub fn new(config: ProposalConfig) -> Self {
        Self {
            preprocessor: ChannelPreprocessor::new(&config.preprocess),
            classifier: ContourClassifier::new(config.shape),
            margin: config.margin,
        }
    }

    /// Combine custom parts, e.g. a preprocessor with extra steps
    pub fn from_parts(preprocessor: ChannelPreprocessor, classifier: ContourClassifier, margin: u32) -> Self {
        Self {
            preprocessor,
            classifier,
            margin,
        }
    }

    pub fn preprocessor(&self) -> &ChannelPreprocessor {
        &self.preprocessor
    }

    pub fn classifier(&self) -> &ContourClassifier {
        &self.classifier
    }

    pub fn margin(&self) -> u32 {
        self.margin
    }

    /// Run the full proposal pipeline on an image
    pub fn extract(&self, image: &DynamicImage) -> ProposalSet {
        self.extract_observed(image, &mut NoopObserver)
    }

    /// Same as [`extract`](Self::extract) with diagnostics sent to `observer`
    pub fn extract_observed(&self, image: &DynamicImage, observer: &mut dyn PipelineObserver) -> ProposalSet {
        let (width, height) = (image.width(), image.height());
        let mut proposals = ProposalSet::new();

        observer.on_input(image);
        let mask = self.preprocessor.preprocess_observed(image, observer);
        let contours = contours::find_external_contours(&mask);
        debug!(count = contours.len(), "found external contours");

        for contour in &contours {
            let result = self.classifier.classify_detailed(contour);
            let Some(bbox) = result.metrics.bbox else {
                continue;
            };
            if let Some(reason) = result.rejection {
                debug!(
                    %bbox,
                    ?reason,
                    solidity = result.metrics.solidity,
                    vertices = result.metrics.vertices,
                    "contour rejected"
                );
                continue;
            }

            let Some(region) = bbox.expand_clipped(self.margin, width, height) else {
                continue;
            };
            debug!(label = %result.label, %region, "proposal accepted");
            observer.on_proposal(result.label, &region);
            proposals.insert(result.label, region);
        }

        info!(
            width,
            height,
            contours = contours.len(),
            proposals = proposals.len(),
            "region proposals extracted"
        );
        observer.on_finish(&proposals);
        proposals
    }

    /// Binary mask the contours are traced on (for debugging)
    pub fn get_mask(&self, image: &DynamicImage) -> GrayImage {
        self.preprocessor.preprocess(image)
    }

    /// All external contours before filtering (for debugging)
    pub fn get_contours(&self, image: &DynamicImage) -> Vec<Contour> {
        contours::find_external_contours(&self.get_mask(image))
    }

    /// Every external contour with its classification (for debugging)
    pub fn get_classifications(&self, image: &DynamicImage) -> Vec<(Contour, Classification)> {
        self.get_contours(image)
            .into_iter()
            .map(|c| {
                let result = self.classifier.classify_detailed(&c);
                (c, result)
            })
            .collect()
    }
}

impl Default for ProposalExtractor {
    fn default() -> Self {
        Self::new(ProposalConfig::default())
    }
}
