//! WKT `POINT`/`LINESTRING` ingestion and formatting. This is explicitly
//! peripheral: the core four subsystems never call into this module, only
//! test code and callers crossing the WKT boundary do.

use geo::{LineString, Point as GeoPoint};
use wkt::{ToWkt, TryFromWkt};

use crate::geo::{GeometryKind, Point, Polyline};

/// Errors raised while parsing a WKT string into this crate's geometry
/// types. Malformed input from the `wkt` crate is wrapped rather than
/// panicking.
#[derive(thiserror::Error, Debug)]
pub enum WktError {
    #[error("failed to parse WKT geometry: {0}")]
    Parse(String),
    #[error(transparent)]
    Geometry(#[from] crate::geo::GeometryError),
}

/// parses a `POINT (x y)` string under the given geometry factory.
/// Whitespace is tolerated and keywords are case-insensitive, per the
/// `wkt` crate's own parser.
pub fn parse_point(wkt: &str, kind: GeometryKind) -> Result<Point, WktError> {
    let parsed: GeoPoint<f64> =
        GeoPoint::try_from_wkt_str(wkt).map_err(|e| WktError::Parse(e.to_string()))?;
    Ok(Point::new(parsed.x(), parsed.y(), kind))
}

/// formats a point as `POINT (x y)`.
pub fn format_point(p: &Point) -> String {
    GeoPoint::new(p.x, p.y).wkt_string()
}

/// parses a `LINESTRING (x y, x y, ...)` string into a [`Polyline`] under
/// the given geometry factory. Consecutive duplicate vertices collapse per
/// [`Polyline::new`]'s own contract.
pub fn parse_linestring(wkt: &str, kind: GeometryKind) -> Result<Polyline, WktError> {
    let parsed: LineString<f64> =
        LineString::try_from_wkt_str(wkt).map_err(|e| WktError::Parse(e.to_string()))?;
    let points = parsed
        .points()
        .map(|p| Point::new(p.x(), p.y(), kind))
        .collect();
    Ok(Polyline::new(points))
}

/// formats a polyline as `LINESTRING (x y, x y, ...)`.
pub fn format_linestring(pl: &Polyline) -> String {
    let line: LineString<f64> = pl.points().iter().map(|p| (p.x, p.y)).collect();
    line.wkt_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_round_trip() {
        let p = Point::geodetic(-105.2, 40.0);
        let wkt = format_point(&p);
        let back = parse_point(&wkt, GeometryKind::GeodeticWgs84).unwrap();
        assert!(p.approx_eq(&back, 1e-9));
    }

    #[test]
    fn test_linestring_round_trip() {
        let pl = Polyline::new(vec![
            Point::planar(0.0, 0.0),
            Point::planar(1.0, 1.0),
            Point::planar(2.0, 0.0),
        ]);
        let wkt = format_linestring(&pl);
        let back = parse_linestring(&wkt, GeometryKind::Euclidean).unwrap();
        assert_eq!(pl, back);
    }

    #[test]
    fn test_case_insensitive_and_whitespace_tolerant() {
        let pl = parse_linestring("linestring (0 0, 5 5,10 0)", GeometryKind::Euclidean).unwrap();
        assert_eq!(pl.len(), 3);
    }

    #[test]
    fn test_malformed_wkt_is_an_error() {
        let err = parse_point("NOT A POINT", GeometryKind::Euclidean).unwrap_err();
        assert!(matches!(err, WktError::Parse(_)));
    }
}
