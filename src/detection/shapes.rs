//! Shape typing of single contours.
//!
//! A contour first has to pass three exclusionary filters on its bounding
//! box and convexity. Survivors are simplified to a polygon whose vertex
//! count and corner angles decide between triangle, rectangle and hexagon;
//! everything else is tested for circularity.
//!
//! A 4 to 6 vertex polygon whose corners fit neither the rectangle nor the
//! hexagon band is handed to the circularity test as well, so a coarsely
//! simplified disc is still recognised.

use std::f64::consts::PI;

use crate::config::ShapeConfig;
use crate::detection::geometry;
use crate::models::{BoundingBox, Contour, Point, ShapeLabel};

const RECTANGLE_MIN_COS: f64 = -0.1;
const RECTANGLE_MAX_COS: f64 = 0.3;
const HEXAGON_MIN_COS: f64 = -0.55;
const HEXAGON_MAX_COS: f64 = -0.45;

/// Why a contour was not proposed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Too few points or zero area
    Degenerate,
    Aspect,
    TooSmall,
    TooLarge,
    Solidity,
    /// Passed the filters but matched no shape
    Shape,
}

/// Measurements taken while classifying one contour
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapeMetrics {
    pub bbox: Option<BoundingBox>,
    pub contour_area: f64,
    pub hull_area: f64,
    pub solidity: f64,
    /// Vertices of the simplified polygon; 0 when simplification never ran
    pub vertices: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub label: ShapeLabel,
    pub rejection: Option<Rejection>,
    pub metrics: ShapeMetrics,
}

impl Classification {
    fn rejected(reason: Rejection, metrics: ShapeMetrics) -> Self {
        Self {
            label: ShapeLabel::Rejected,
            rejection: Some(reason),
            metrics,
        }
    }
}

/// Assigns a [`ShapeLabel`] to each contour
#[derive(Debug, Clone, Default)]
pub struct ContourClassifier {
    config: ShapeConfig,
}

impl ContourClassifier {
    pub fn new(config: ShapeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ShapeConfig {
        &self.config
    }

    pub fn classify(&self, contour: &Contour) -> ShapeLabel {
        self.classify_detailed(contour).label
    }

    /// Classify and report the measurements and rejection reason
    pub fn classify_detailed(&self, contour: &Contour) -> Classification {
        let cfg = &self.config;
        let mut metrics = ShapeMetrics::default();

        let bbox = match contour.bounding_box() {
            Some(b) if contour.len() >= 3 => b,
            _ => return Classification::rejected(Rejection::Degenerate, metrics),
        };
        metrics.bbox = Some(bbox);

        let aspect = bbox.aspect_ratio();
        if aspect >= cfg.max_aspect || aspect <= cfg.min_aspect {
            return Classification::rejected(Rejection::Aspect, metrics);
        }

        let box_area = bbox.area();
        if box_area < cfg.min_box_area as u64 {
            return Classification::rejected(Rejection::TooSmall, metrics);
        }
        if box_area > cfg.max_box_area as u64 {
            return Classification::rejected(Rejection::TooLarge, metrics);
        }

        metrics.contour_area = contour.area();
        metrics.hull_area = contour.hull_area();
        if metrics.hull_area <= 0.0 {
            return Classification::rejected(Rejection::Degenerate, metrics);
        }
        metrics.solidity = metrics.contour_area / metrics.hull_area;
        if metrics.solidity < cfg.min_solidity {
            return Classification::rejected(Rejection::Solidity, metrics);
        }

        let epsilon = contour.perimeter() * cfg.approx_epsilon_ratio;
        let polygon = if epsilon > 0.0 {
            geometry::approximate_polygon(&contour.points, epsilon)
        } else {
            contour.points.clone()
        };
        metrics.vertices = polygon.len();

        let label = self.polygon_label(&polygon, &bbox, metrics.contour_area);
        if label == ShapeLabel::Rejected {
            return Classification::rejected(Rejection::Shape, metrics);
        }
        Classification {
            label,
            rejection: None,
            metrics,
        }
    }

    fn polygon_label(&self, polygon: &[Point], bbox: &BoundingBox, contour_area: f64) -> ShapeLabel {
        let vertices = polygon.len();
        match vertices {
            3 => ShapeLabel::Triangle,
            4..=6 => {
                let cosines = geometry::corner_cosines(polygon);
                let min_cos = cosines.first().copied().unwrap_or(0.0);
                let max_cos = cosines.last().copied().unwrap_or(0.0);

                if vertices == 4 && min_cos >= RECTANGLE_MIN_COS && max_cos <= RECTANGLE_MAX_COS {
                    ShapeLabel::Rectangle
                } else if vertices == 6 && min_cos >= HEXAGON_MIN_COS && max_cos <= HEXAGON_MAX_COS {
                    ShapeLabel::Hexagon
                } else {
                    self.round_or_fallback(bbox, contour_area)
                }
            }
            _ => self.round_or_fallback(bbox, contour_area),
        }
    }

    fn round_or_fallback(&self, bbox: &BoundingBox, contour_area: f64) -> ShapeLabel {
        if self.is_circle(bbox, contour_area) {
            ShapeLabel::Circle
        } else if self.config.detect_non_convex {
            ShapeLabel::NonConvex
        } else {
            ShapeLabel::Rejected
        }
    }

    /// Near-square box whose area is close to that of its inscribed circle
    fn is_circle(&self, bbox: &BoundingBox, contour_area: f64) -> bool {
        let tolerance = self.config.circle_tolerance;
        let radius = bbox.width as f64 / 2.0;
        let circle_area = PI * radius * radius;
        if circle_area <= 0.0 {
            return false;
        }
        (1.0 - bbox.aspect_ratio()).abs() <= tolerance && (1.0 - contour_area / circle_area).abs() <= tolerance
    }
}
