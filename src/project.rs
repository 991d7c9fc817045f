// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};

use crate::Point;

/// Meters per degree of latitude (and of longitude at the equator).
const METERS_PER_DEGREE: f64 = 111_320.0;

/// A raw positioning sample from the device sensor or a simulator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoSample {
    pub lat: f64,
    pub lng: f64,
    /// Altitude above the reference ellipsoid, when the sensor reports one.
    pub alt: Option<f64>,
    /// Reported horizontal accuracy in meters, informational only.
    pub accuracy: Option<f64>,
}

impl GeoSample {
    pub const fn new(lat: f64, lng: f64, alt: Option<f64>) -> Self {
        Self {
            lat,
            lng,
            alt,
            accuracy: None,
        }
    }
}

/// The geodetic anchor of a local frame. Immutable once established.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OriginFix {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub alt: f64,
}

/// Error conditions which may occur during [Projector::project].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionError {
    /// Projection was attempted before an origin fix was established.
    /// This is a caller error: the first sample of a session must be
    /// passed to [Projector::fix_origin] (or use [Projector::project_or_fix]).
    MissingOrigin,
}

impl std::fmt::Display for ProjectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingOrigin => write!(f, "no origin fix established"),
        }
    }
}

impl std::error::Error for ProjectionError {}

/// Converts geodetic samples into the local Cartesian frame using an
/// equirectangular tangent-plane approximation:
///
/// ```text
/// y = (lat - origin.lat) * 111320
/// x = (lng - origin.lng) * 111320 * cos(origin.lat)
/// z = alt - origin.alt
/// ```
///
/// The approximation holds for displacements of a few kilometers around
/// the origin, which comfortably covers a single building. It degrades
/// over larger extents; that is an accepted precision bound of the local
/// frame, not a defect.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Projector {
    origin: Option<OriginFix>,
}

impl Projector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a projector anchored at a previously persisted origin.
    pub fn with_origin(origin: OriginFix) -> Self {
        Self {
            origin: Some(origin),
        }
    }

    pub fn origin(&self) -> Option<&OriginFix> {
        self.origin.as_ref()
    }

    /// Establishes the origin of the local frame from a sample.
    /// The first fix wins; later calls are ignored.
    pub fn fix_origin(&mut self, sample: &GeoSample) {
        if self.origin.is_none() {
            self.origin = Some(OriginFix {
                lat: sample.lat,
                lng: sample.lng,
                alt: sample.alt.unwrap_or(0.0),
            });
        }
    }

    /// Projects a sample into the local frame. Deterministic and pure:
    /// the same sample always yields the same point, and projecting the
    /// origin sample itself yields `(0, 0, 0)`.
    pub fn project(&self, sample: &GeoSample) -> Result<Point, ProjectionError> {
        let origin = self.origin.ok_or(ProjectionError::MissingOrigin)?;
        let y = (sample.lat - origin.lat) * METERS_PER_DEGREE;
        let x = (sample.lng - origin.lng) * METERS_PER_DEGREE * origin.lat.to_radians().cos();
        let z = sample.alt.unwrap_or(0.0) - origin.alt;
        Ok(Point { x, y, z })
    }

    /// Projects a sample, establishing the origin from it first when no
    /// origin exists yet. Mirrors live-position acquisition, where the
    /// first fix of a session anchors the frame.
    pub fn project_or_fix(&mut self, sample: &GeoSample) -> Point {
        self.fix_origin(sample);
        // Cannot fail: the origin was just fixed.
        self.project(sample).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! assert_almost_eq {
        ($a:expr, $b:expr) => {
            assert!(
                (($a - $b).abs() < 1e-6),
                "assertion failed: {} ≈ {}",
                $a,
                $b
            )
        };
    }

    #[test]
    fn origin_projects_to_zero() {
        let sample = GeoSample::new(1.3521, 103.8198, Some(12.0));
        let mut projector = Projector::new();
        let p = projector.project_or_fix(&sample);
        assert_eq!(p, Point::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn missing_origin_is_an_error() {
        let projector = Projector::new();
        assert_eq!(
            projector.project(&GeoSample::new(1.0, 103.0, None)),
            Err(ProjectionError::MissingOrigin),
        );
    }

    #[test]
    fn origin_is_immutable_once_fixed() {
        let mut projector = Projector::new();
        projector.fix_origin(&GeoSample::new(1.3521, 103.8198, Some(5.0)));
        projector.fix_origin(&GeoSample::new(52.2297, 21.0122, None));
        let origin = projector.origin().unwrap();
        assert_almost_eq!(origin.lat, 1.3521);
        assert_almost_eq!(origin.alt, 5.0);
    }

    #[test]
    fn equirectangular_displacement() {
        let mut projector = Projector::new();
        projector.fix_origin(&GeoSample::new(0.0, 0.0, Some(0.0)));

        // One thousandth of a degree north at the equator.
        let p = projector
            .project(&GeoSample::new(0.001, 0.0, None))
            .unwrap();
        assert_almost_eq!(p.y, 111.32);
        assert_almost_eq!(p.x, 0.0);
        assert_almost_eq!(p.z, 0.0);

        // East displacement is scaled by cos(origin latitude); at the
        // equator the factor is exactly 1.
        let p = projector
            .project(&GeoSample::new(0.0, 0.002, Some(4.0)))
            .unwrap();
        assert_almost_eq!(p.x, 222.64);
        assert_almost_eq!(p.z, 4.0);
    }

    #[test]
    fn east_displacement_shrinks_away_from_equator() {
        let mut projector = Projector::new();
        projector.fix_origin(&GeoSample::new(60.0, 0.0, None));

        let p = projector.project(&GeoSample::new(60.0, 0.001, None)).unwrap();
        assert_almost_eq!(p.x, 111.32 * 60f64.to_radians().cos());
    }

    #[test]
    fn missing_altitude_treated_as_zero() {
        let mut projector = Projector::new();
        projector.fix_origin(&GeoSample::new(1.0, 1.0, Some(10.0)));
        let p = projector.project(&GeoSample::new(1.0, 1.0, None)).unwrap();
        assert_almost_eq!(p.z, -10.0);
    }
}
