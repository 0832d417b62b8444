//! Hand-off of proposals to per-sign region classifiers.
//!
//! The classifiers themselves (for example pretrained cascades) live outside
//! this crate. They are registered once in an immutable
//! [`ClassifierRegistry`] and receive each proposal as a grayscale,
//! equalized, fixed-size crop.
//!
//! The `signspot` binary stops at proposals since it ships no models; callers
//! embedding the library run [`classify_proposals`] on its output.

use std::collections::BTreeMap;

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage};
use tracing::debug;

use crate::detection::preprocessing;
use crate::models::{BoundingBox, ProposalSet, ShapeLabel};

/// Side length of the square crop handed to classifiers
pub const CROP_SIZE: u32 = 100;

/// Sensitivity settings forwarded to every classifier
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionParams {
    pub scale_factor: f64,
    pub min_neighbors: u32,
    pub min_size: Option<(u32, u32)>,
    pub max_size: Option<(u32, u32)>,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            scale_factor: 1.1,
            min_neighbors: 3,
            min_size: None,
            max_size: None,
        }
    }
}

/// One hit reported by a classifier, in crop coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub confidence: f64,
    pub region: BoundingBox,
}

/// Recognizes one sign category inside a cropped region
pub trait RegionClassifier: Send + Sync {
    fn detect(&self, region: &GrayImage, params: &DetectionParams) -> Vec<Detection>;
}

/// Named classifiers, fixed after construction
#[derive(Default)]
pub struct ClassifierRegistry {
    classifiers: BTreeMap<String, Box<dyn RegionClassifier>>,
}

impl ClassifierRegistry {
    pub fn builder() -> ClassifierRegistryBuilder {
        ClassifierRegistryBuilder::default()
    }

    pub fn len(&self) -> usize {
        self.classifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classifiers.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.classifiers.keys().map(String::as_str)
    }

    pub fn get(&self, name: &str) -> Option<&dyn RegionClassifier> {
        self.classifiers.get(name).map(|c| c.as_ref())
    }

    fn iter(&self) -> impl Iterator<Item = (&str, &dyn RegionClassifier)> + '_ {
        self.classifiers.iter().map(|(name, c)| (name.as_str(), c.as_ref()))
    }
}

#[derive(Default)]
pub struct ClassifierRegistryBuilder {
    classifiers: BTreeMap<String, Box<dyn RegionClassifier>>,
}

impl ClassifierRegistryBuilder {
    /// Register `classifier` under `name`; a later registration replaces an earlier one
    pub fn register(mut self, name: impl Into<String>, classifier: impl RegionClassifier + 'static) -> Self {
        self.classifiers.insert(name.into(), Box::new(classifier));
        self
    }

    pub fn build(self) -> ClassifierRegistry {
        ClassifierRegistry {
            classifiers: self.classifiers,
        }
    }
}

/// Best classifier verdict for one proposal
#[derive(Debug, Clone, PartialEq)]
pub struct SignDetection {
    pub sign: String,
    pub confidence: f64,
    pub shape: ShapeLabel,
    /// The proposal region, in source image coordinates
    pub region: BoundingBox,
    /// The classifier hit mapped back to source image coordinates
    pub hit: BoundingBox,
}

/// Run every registered classifier on every proposal.
///
/// Each proposal keeps only its most confident detection; proposals where no
/// classifier reports a positive confidence are dropped.
pub fn classify_proposals(
    image: &DynamicImage,
    proposals: &ProposalSet,
    registry: &ClassifierRegistry,
    params: &DetectionParams,
) -> Vec<SignDetection> {
    if registry.is_empty() || proposals.is_empty() {
        return Vec::new();
    }

    let gray = preprocessing::equalize_histogram(&image.to_luma8());
    let mut detections = Vec::new();

    for (shape, region) in proposals.iter() {
        if region.width == 0 || region.height == 0 || !region.fits_within(gray.width(), gray.height()) {
            continue;
        }
        let crop = imageops::crop_imm(&gray, region.x, region.y, region.width, region.height).to_image();
        let crop = imageops::resize(&crop, CROP_SIZE, CROP_SIZE, FilterType::Triangle);

        let mut best: Option<(&str, Detection)> = None;
        for (name, classifier) in registry.iter() {
            for detection in classifier.detect(&crop, params) {
                let best_confidence = best.as_ref().map_or(0.0, |(_, d)| d.confidence);
                if detection.confidence > best_confidence {
                    best = Some((name, detection));
                }
            }
        }

        if let Some((name, detection)) = best {
            debug!(sign = name, confidence = detection.confidence, %region, "proposal classified");
            detections.push(SignDetection {
                sign: name.to_string(),
                confidence: detection.confidence,
                shape,
                region: *region,
                hit: crop_to_source(&detection.region, region),
            });
        }
    }

    detections
}

/// Map a box from the resized crop back into the source image
fn crop_to_source(hit: &BoundingBox, region: &BoundingBox) -> BoundingBox {
    let sx = region.width as f64 / CROP_SIZE as f64;
    let sy = region.height as f64 / CROP_SIZE as f64;
    let x = (hit.x as f64 * sx).round() as u32;
    let y = (hit.y as f64 * sy).round() as u32;
    let width = ((hit.width as f64 * sx).round() as u32).min(region.width.saturating_sub(x));
    let height = ((hit.height as f64 * sy).round() as u32).min(region.height.saturating_sub(y));
    BoundingBox::new(region.x + x, region.y + y, width, height)
}
