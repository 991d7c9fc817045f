// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::Point;

/// Calculates the planar (x, y only) Euclidean distance between two points
/// in the local frame, in meters. Used for proximity detection, where the
/// altitude component would wrongly push same-floor nodes out of reach.
pub fn planar_distance(a: &Point, b: &Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    (dx * dx + dy * dy).sqrt()
}

/// Calculates the 3-D Euclidean distance between two points in the local
/// frame, in meters.
pub fn point_distance(a: &Point, b: &Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let dz = b.z - a.z;
    (dx * dx + dy * dy + dz * dz).sqrt()
}

/// Calculates the total 3-D length of a polyline, as the sum of its
/// consecutive segment lengths. Polylines with fewer than 2 points have
/// zero length.
pub fn polyline_length(points: &[Point]) -> f64 {
    points
        .windows(2)
        .map(|pair| point_distance(&pair[0], &pair[1]))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! assert_almost_eq {
        ($a:expr, $b:expr) => {
            assert!(
                (($a - $b).abs() < 1e-9),
                "assertion failed: {} ≈ {}",
                $a,
                $b
            )
        };
    }

    #[test]
    fn planar_ignores_z() {
        let a = Point::new(0.0, 0.0, 0.0);
        let b = Point::new(3.0, 4.0, 100.0);
        assert_almost_eq!(planar_distance(&a, &b), 5.0);
    }

    #[test]
    fn point_distance_includes_z() {
        let a = Point::new(0.0, 0.0, 0.0);
        let b = Point::new(2.0, 3.0, 6.0);
        assert_almost_eq!(point_distance(&a, &b), 7.0);
    }

    #[test]
    fn polyline_length_sums_segments() {
        let line = [
            Point::new(0.0, 0.0, 0.0),
            Point::new(3.0, 4.0, 0.0),
            Point::new(3.0, 4.0, 2.0),
        ];
        assert_almost_eq!(polyline_length(&line), 7.0);
        assert_almost_eq!(polyline_length(&line[..1]), 0.0);
        assert_almost_eq!(polyline_length(&[]), 0.0);
    }
}
