use std::path::Path;

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

/// Which single-channel view of the color image is thresholded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelMode {
    /// HSV saturation, equalized, blurred and binarized
    #[default]
    Saturation,
    /// Union of red and blue hue bands, already binary
    RedBlueHue,
}

/// Mask preparation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    pub channel: ChannelMode,
    /// Gaussian sigma; 1.1 matches a 5x5 kernel, 0 disables the step
    pub blur_sigma: f32,
    /// Pixels strictly above this level become foreground
    pub threshold: u8,
    /// Opening element is a (2r+1) square; 0 disables the step
    pub open_radius: u8,
    /// Closing element is a (2r+1) square; 0 disables the step
    pub close_radius: u8,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            channel: ChannelMode::Saturation,
            blur_sigma: 1.1,
            threshold: 200,
            open_radius: 1,
            close_radius: 0,
        }
    }
}

/// Contour filtering and shape typing parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeConfig {
    /// Polygon tolerance as a fraction of the contour perimeter
    pub approx_epsilon_ratio: f64,
    pub min_box_area: u32,
    pub max_box_area: u32,
    pub min_aspect: f64,
    pub max_aspect: f64,
    pub min_solidity: f64,
    /// Allowed relative deviation for both circle tests
    pub circle_tolerance: f64,
    /// Label unmatched contours `non-convex` instead of rejecting them
    pub detect_non_convex: bool,
}

impl Default for ShapeConfig {
    fn default() -> Self {
        Self {
            approx_epsilon_ratio: 0.02,
            min_box_area: 100,
            max_box_area: 100_000,
            min_aspect: 0.25,
            max_aspect: 4.0,
            min_solidity: 0.5,
            circle_tolerance: 0.2,
            detect_non_convex: false,
        }
    }
}

/// Full region-proposal configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProposalConfig {
    pub preprocess: PreprocessConfig,
    pub shape: ShapeConfig,
    /// Pixels added on each side of an accepted box before clipping
    pub margin: u32,
}

impl Default for ProposalConfig {
    fn default() -> Self {
        Self {
            preprocess: PreprocessConfig::default(),
            shape: ShapeConfig::default(),
            margin: 15,
        }
    }
}

impl ProposalConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON file; missing fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: ProposalConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let shape = &self.shape;
        ensure!(
            self.preprocess.blur_sigma >= 0.0,
            "blur_sigma must not be negative, got {}",
            self.preprocess.blur_sigma
        );
        ensure!(
            shape.approx_epsilon_ratio > 0.0,
            "approx_epsilon_ratio must be positive, got {}",
            shape.approx_epsilon_ratio
        );
        ensure!(
            shape.min_box_area <= shape.max_box_area,
            "min_box_area {} exceeds max_box_area {}",
            shape.min_box_area,
            shape.max_box_area
        );
        ensure!(
            shape.min_aspect > 0.0 && shape.min_aspect < shape.max_aspect,
            "aspect bounds must satisfy 0 < min < max, got {}..{}",
            shape.min_aspect,
            shape.max_aspect
        );
        ensure!(
            (0.0..=1.0).contains(&shape.min_solidity),
            "min_solidity must lie in [0, 1], got {}",
            shape.min_solidity
        );
        ensure!(
            shape.circle_tolerance >= 0.0,
            "circle_tolerance must not be negative, got {}",
            shape.circle_tolerance
        );
        Ok(())
    }
}
