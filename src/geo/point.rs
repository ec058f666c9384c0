use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Topology discriminator for a geometry factory. Every [`Point`] carries a
/// copy of the factory it was built under so that distance/bearing/
/// projection operations dispatch to the correct topology without runtime
/// lookups or shared ownership -- the factory itself is stateless.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize, Default)]
pub enum GeometryKind {
    /// WGS84 ellipsoid, coordinates are `(longitude, latitude)` in degrees.
    #[default]
    GeodeticWgs84,
    /// Euclidean plane, coordinates are `(x, y)` in arbitrary linear units.
    Euclidean,
}

impl GeometryKind {
    /// default point-equality tolerance for this topology, in coordinate units.
    ///
    /// the geodetic default approximates 0.1 m at the equator; callers needing
    /// tighter precision at high latitude should pass an explicit tolerance to
    /// [`Point::approx_eq`] rather than rely on this constant.
    pub fn default_point_epsilon(&self) -> f64 {
        match self {
            GeometryKind::GeodeticWgs84 => 0.1 / 111_320.0,
            GeometryKind::Euclidean => 0.1,
        }
    }

    /// default near-line-merge tolerance for this topology (see `graph::merge_graph`).
    pub fn default_merge_epsilon(&self) -> f64 {
        match self {
            GeometryKind::GeodeticWgs84 => 50.0,
            GeometryKind::Euclidean => 1.0,
        }
    }
}

/// An immutable `(x, y)` pair, standardized on `(x = longitude, y = latitude)`
/// under a geodetic factory, or arbitrary planar coordinates under a
/// Euclidean factory. Callers converting from `(lat, lon)` tuples must swap
/// at the boundary.
#[derive(Copy, Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub kind: GeometryKind,
}

impl Point {
    pub fn new(x: f64, y: f64, kind: GeometryKind) -> Self {
        Self { x, y, kind }
    }

    pub fn geodetic(lon: f64, lat: f64) -> Self {
        Self::new(lon, lat, GeometryKind::GeodeticWgs84)
    }

    pub fn planar(x: f64, y: f64) -> Self {
        Self::new(x, y, GeometryKind::Euclidean)
    }

    /// coordinate-wise equality within `epsilon` (in coordinate units).
    pub fn approx_eq(&self, other: &Point, epsilon: f64) -> bool {
        (self.x - other.x).abs() <= epsilon && (self.y - other.y).abs() <= epsilon
    }

    /// coordinate-wise equality within this point's factory's default tolerance.
    pub fn approx_eq_default(&self, other: &Point) -> bool {
        self.approx_eq(other, self.kind.default_point_epsilon())
    }
}

impl Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approx_eq() {
        let a = Point::geodetic(-105.0, 40.0);
        let b = Point::geodetic(-105.0 + 1e-8, 40.0);
        assert!(a.approx_eq_default(&b));
    }

    #[test]
    fn test_not_approx_eq() {
        let a = Point::geodetic(-105.0, 40.0);
        let b = Point::geodetic(-104.9, 40.0);
        assert!(!a.approx_eq_default(&b));
    }
}
