use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::detection::geometry;

/// Integer pixel coordinate, shared with `imageproc`'s contour tracing.
pub type Point = imageproc::point::Point<i32>;

/// Closed boundary of one connected region in a binary mask
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    pub points: Vec<Point>,
}

impl Contour {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Tight axis-aligned bound, inclusive of the outermost pixels
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::enclosing(&self.points)
    }

    /// Area enclosed by the boundary polygon (shoelace, unsigned)
    pub fn area(&self) -> f64 {
        geometry::polygon_area(&self.points)
    }

    pub fn hull_area(&self) -> f64 {
        geometry::convex_hull_area(&self.points)
    }

    pub fn perimeter(&self) -> f64 {
        geometry::perimeter(&self.points)
    }
}

/// Axis-aligned rectangle in image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Smallest box holding every point. Points left of or above the origin
    /// are clamped to zero.
    pub fn enclosing(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        let min_x = min_x.max(0);
        let min_y = min_y.max(0);
        if max_x < min_x || max_y < min_y {
            return None;
        }
        Some(Self {
            x: min_x as u32,
            y: min_y as u32,
            width: (max_x - min_x + 1) as u32,
            height: (max_y - min_y + 1) as u32,
        })
    }

    /// Exclusive right edge
    pub fn right(&self) -> u64 {
        self.x as u64 + self.width as u64
    }

    /// Exclusive bottom edge
    pub fn bottom(&self) -> u64 {
        self.y as u64 + self.height as u64
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            return 0.0;
        }
        self.width as f64 / self.height as f64
    }

    pub fn contains(&self, other: &BoundingBox) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.right() <= width as u64 && self.bottom() <= height as u64
    }

    /// Grow by `margin` on every side, then intersect with a
    /// `width` x `height` image. Returns `None` when nothing is left.
    pub fn expand_clipped(&self, margin: u32, width: u32, height: u32) -> Option<BoundingBox> {
        let margin = margin as i64;
        let left = (self.x as i64 - margin).max(0);
        let top = (self.y as i64 - margin).max(0);
        let right = (self.right() as i64 + margin).min(width as i64);
        let bottom = (self.bottom() as i64 + margin).min(height as i64);
        if right <= left || bottom <= top {
            return None;
        }
        Some(BoundingBox {
            x: left as u32,
            y: top as u32,
            width: (right - left) as u32,
            height: (bottom - top) as u32,
        })
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}) {}x{}", self.x, self.y, self.width, self.height)
    }
}

/// Geometric shape type assigned to a contour
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShapeLabel {
    Triangle,
    Rectangle,
    Hexagon,
    Circle,
    NonConvex,
    Rejected,
}

impl ShapeLabel {
    pub const ALL: [ShapeLabel; 6] = [
        ShapeLabel::Triangle,
        ShapeLabel::Rectangle,
        ShapeLabel::Hexagon,
        ShapeLabel::Circle,
        ShapeLabel::NonConvex,
        ShapeLabel::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeLabel::Triangle => "triangle",
            ShapeLabel::Rectangle => "rectangle",
            ShapeLabel::Hexagon => "hexagon",
            ShapeLabel::Circle => "circle",
            ShapeLabel::NonConvex => "non-convex",
            ShapeLabel::Rejected => "rejected",
        }
    }

    pub fn is_accepted(&self) -> bool {
        !matches!(self, ShapeLabel::Rejected)
    }
}

impl fmt::Display for ShapeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Candidate sign regions for one image, grouped by shape.
///
/// Several regions may share a label. Entries keep their insertion order
/// within a label; labels iterate in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProposalSet {
    entries: BTreeMap<ShapeLabel, Vec<BoundingBox>>,
}

impl ProposalSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, label: ShapeLabel, bbox: BoundingBox) {
        self.entries.entry(label).or_default().push(bbox);
    }

    pub fn get(&self, label: ShapeLabel) -> &[BoundingBox] {
        self.entries.get(&label).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn count(&self, label: ShapeLabel) -> usize {
        self.get(label).len()
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn labels(&self) -> impl Iterator<Item = ShapeLabel> + '_ {
        self.entries
            .iter()
            .filter(|(_, boxes)| !boxes.is_empty())
            .map(|(label, _)| *label)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ShapeLabel, &BoundingBox)> + '_ {
        self.entries
            .iter()
            .flat_map(|(label, boxes)| boxes.iter().map(move |b| (*label, b)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enclosing_box_is_inclusive() {
        let points = vec![Point::new(10, 20), Point::new(19, 20), Point::new(19, 29), Point::new(10, 29)];
        let bbox = BoundingBox::enclosing(&points).unwrap();
        assert_eq!(bbox, BoundingBox::new(10, 20, 10, 10));
        assert_eq!(bbox.area(), 100);
        assert!(BoundingBox::enclosing(&[]).is_none());
    }

    #[test]
    fn expand_clips_to_image() {
        let bbox = BoundingBox::new(5, 90, 20, 8);
        let expanded = bbox.expand_clipped(15, 100, 100).unwrap();
        assert_eq!(expanded, BoundingBox::new(0, 75, 40, 25));
        assert!(expanded.fits_within(100, 100));
        assert!(expanded.contains(&bbox));
    }

    #[test]
    fn expand_in_the_interior_adds_margin_on_each_side() {
        let bbox = BoundingBox::new(50, 50, 10, 10);
        assert_eq!(
            bbox.expand_clipped(15, 200, 200),
            Some(BoundingBox::new(35, 35, 40, 40))
        );
    }

    #[test]
    fn expand_outside_image_is_empty() {
        let bbox = BoundingBox::new(120, 10, 5, 5);
        assert!(bbox.expand_clipped(2, 100, 100).is_none());
    }

    #[test]
    fn proposal_set_keeps_repeated_labels() {
        let mut set = ProposalSet::new();
        set.insert(ShapeLabel::Circle, BoundingBox::new(0, 0, 10, 10));
        set.insert(ShapeLabel::Rectangle, BoundingBox::new(5, 5, 10, 10));
        set.insert(ShapeLabel::Circle, BoundingBox::new(20, 20, 10, 10));

        assert_eq!(set.len(), 3);
        assert_eq!(set.count(ShapeLabel::Circle), 2);
        assert_eq!(set.count(ShapeLabel::Hexagon), 0);
        assert_eq!(set.get(ShapeLabel::Circle)[1], BoundingBox::new(20, 20, 10, 10));
        let labels: Vec<_> = set.labels().collect();
        assert_eq!(labels, vec![ShapeLabel::Rectangle, ShapeLabel::Circle]);
        assert_eq!(set.iter().count(), 3);
    }

    #[test]
    fn proposal_set_serializes_by_label_name() {
        let mut set = ProposalSet::new();
        set.insert(ShapeLabel::NonConvex, BoundingBox::new(1, 2, 3, 4));
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"{"non-convex":[{"x":1,"y":2,"width":3,"height":4}]}"#);
    }
}
