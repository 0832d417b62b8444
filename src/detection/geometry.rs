//! Planar geometry on integer contours: corner angles, polygon areas and
//! closed-curve simplification.

use imageproc::geometry::{arc_length, convex_hull};

use crate::models::Point;

/// Guards the angle denominator against zero-length edges.
const ANGLE_EPSILON: f64 = 1e-10;

/// Cosine of the angle at vertex `p0` between the edges towards `p1` and `p2`.
///
/// Always within `[-1, 1]`; a degenerate edge yields `0.0` instead of a
/// division error.
pub fn cosine_angle(p1: Point, p2: Point, p0: Point) -> f64 {
    let dx1 = (p1.x - p0.x) as f64;
    let dy1 = (p1.y - p0.y) as f64;
    let dx2 = (p2.x - p0.x) as f64;
    let dy2 = (p2.y - p0.y) as f64;
    (dx1 * dx2 + dy1 * dy2) / ((dx1 * dx1 + dy1 * dy1) * (dx2 * dx2 + dy2 * dy2) + ANGLE_EPSILON).sqrt()
}

/// Cosines of every corner of a closed polygon, sorted ascending.
///
/// Vertex `i` is measured against its two neighbours `i - 1` and `i + 1`.
pub fn corner_cosines(polygon: &[Point]) -> Vec<f64> {
    let n = polygon.len();
    if n < 3 {
        return Vec::new();
    }
    let mut cosines: Vec<f64> = (0..n)
        .map(|i| {
            let prev = polygon[(i + n - 1) % n];
            let next = polygon[(i + 1) % n];
            cosine_angle(next, prev, polygon[i])
        })
        .collect();
    cosines.sort_by(|a, b| a.total_cmp(b));
    cosines
}

/// Unsigned area of a closed polygon (shoelace formula).
pub fn polygon_area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice_area: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64)
        .sum();
    (twice_area as f64 / 2.0).abs()
}

/// Area of the convex hull around `points`.
pub fn convex_hull_area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let hull = convex_hull(points);
    polygon_area(&hull)
}

/// Length of the closed curve through `points`.
pub fn perimeter(points: &[Point]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    arc_length(points, true)
}

/// Simplifies a closed curve with Douglas-Peucker.
///
/// The curve is cut at two mutually distant points so that each half is an
/// open chain with well separated endpoints. The result lists each kept
/// vertex once; the closing edge back to the first vertex is implied.
/// `imageproc::geometry::approximate_polygon_dp` treats the curve as open from
/// its first pixel, which pins an extra vertex there and repeats the start point.
pub fn approximate_polygon(points: &[Point], epsilon: f64) -> Vec<Point> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }

    let start = farthest_from(points, points[0]);
    let end = farthest_from(points, points[start]);
    if start == end {
        return vec![points[start]];
    }

    let first_half = cyclic_chain(points, start, end);
    let second_half = cyclic_chain(points, end, start);

    let mut polygon = simplify_chain(&first_half, epsilon);
    polygon.pop();
    let mut rest = simplify_chain(&second_half, epsilon);
    rest.pop();
    polygon.append(&mut rest);
    polygon
}

fn farthest_from(points: &[Point], origin: Point) -> usize {
    let mut best = 0;
    let mut best_dist = -1i64;
    for (i, p) in points.iter().enumerate() {
        let dx = (p.x - origin.x) as i64;
        let dy = (p.y - origin.y) as i64;
        let dist = dx * dx + dy * dy;
        if dist > best_dist {
            best = i;
            best_dist = dist;
        }
    }
    best
}

/// Points from index `from` to `to` inclusive, wrapping around the end.
fn cyclic_chain(points: &[Point], from: usize, to: usize) -> Vec<Point> {
    let n = points.len();
    let steps = (to + n - from) % n;
    (0..=steps).map(|k| points[(from + k) % n]).collect()
}

/// Open-chain Douglas-Peucker; both endpoints are always kept.
fn simplify_chain(chain: &[Point], epsilon: f64) -> Vec<Point> {
    if chain.len() <= 2 {
        return chain.to_vec();
    }

    let mut keep = vec![false; chain.len()];
    keep[0] = true;
    keep[chain.len() - 1] = true;

    let mut stack = vec![(0, chain.len() - 1)];
    while let Some((start, end)) = stack.pop() {
        if end - start <= 1 {
            continue;
        }

        let mut max_dist = 0.0;
        let mut max_index = start;
        for i in (start + 1)..end {
            let dist = distance_to_line(chain[i], chain[start], chain[end]);
            if dist > max_dist {
                max_dist = dist;
                max_index = i;
            }
        }

        if max_dist > epsilon {
            keep[max_index] = true;
            stack.push((start, max_index));
            stack.push((max_index, end));
        }
    }

    chain
        .iter()
        .zip(keep)
        .filter_map(|(p, kept)| kept.then_some(*p))
        .collect()
}

fn distance_to_line(p: Point, a: Point, b: Point) -> f64 {
    let dx = (b.x - a.x) as f64;
    let dy = (b.y - a.y) as f64;
    let px = (p.x - a.x) as f64;
    let py = (p.y - a.y) as f64;
    let length = dx.hypot(dy);
    if length == 0.0 {
        return px.hypot(py);
    }
    (dx * py - dy * px).abs() / length
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(side: i32) -> Vec<Point> {
        vec![
            Point::new(0, 0),
            Point::new(side, 0),
            Point::new(side, side),
            Point::new(0, side),
        ]
    }

    #[test]
    fn right_angle_has_zero_cosine() {
        let c = cosine_angle(Point::new(10, 0), Point::new(0, 10), Point::new(0, 0));
        assert!(c.abs() < 1e-9);
    }

    #[test]
    fn straight_and_folded_angles() {
        let straight = cosine_angle(Point::new(-5, 0), Point::new(5, 0), Point::new(0, 0));
        let folded = cosine_angle(Point::new(5, 0), Point::new(9, 0), Point::new(0, 0));
        assert!((straight + 1.0).abs() < 1e-9);
        assert!((folded - 1.0).abs() < 1e-9);
    }

    #[test]
    fn degenerate_edges_stay_in_range() {
        let origin = Point::new(3, 3);
        let cases = [
            (origin, origin),
            (origin, Point::new(7, 3)),
            (Point::new(4, 4), Point::new(5, 5)),
            (Point::new(1, 1), Point::new(5, 5)),
            (Point::new(-100000, 0), Point::new(100000, 1)),
        ];
        for (p1, p2) in cases {
            let c = cosine_angle(p1, p2, origin);
            assert!(c.is_finite());
            assert!((-1.0..=1.0).contains(&c), "cosine {c} out of range");
        }
        assert_eq!(cosine_angle(origin, origin, origin), 0.0);
    }

    #[test]
    fn shoelace_area_ignores_orientation() {
        let mut points = square(10);
        assert_eq!(polygon_area(&points), 100.0);
        points.reverse();
        assert_eq!(polygon_area(&points), 100.0);
        assert_eq!(polygon_area(&points[..2]), 0.0);
    }

    #[test]
    fn hull_fills_in_a_notch() {
        let notched = vec![
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(5, 5),
            Point::new(10, 10),
            Point::new(0, 10),
        ];
        assert_eq!(convex_hull_area(&notched), 100.0);
        assert!(polygon_area(&notched) < 100.0);
    }

    #[test]
    fn perimeter_of_closed_square() {
        assert!((perimeter(&square(10)) - 40.0).abs() < 1e-9);
    }

    #[test]
    fn simplification_recovers_square_corners() {
        let mut dense = Vec::new();
        for x in 0..20 {
            dense.push(Point::new(x, 0));
        }
        for y in 0..20 {
            dense.push(Point::new(20, y));
        }
        for x in (1..=20).rev() {
            dense.push(Point::new(x, 20));
        }
        for y in (1..=20).rev() {
            dense.push(Point::new(0, y));
        }

        let polygon = approximate_polygon(&dense, 1.0);
        assert_eq!(polygon.len(), 4);
        for corner in square(20) {
            assert!(polygon.contains(&corner), "missing corner {corner:?}");
        }
    }

    #[test]
    fn corner_cosines_of_square_are_zero() {
        let cosines = corner_cosines(&square(7));
        assert_eq!(cosines.len(), 4);
        assert!(cosines.iter().all(|c| c.abs() < 1e-9));
    }
}
