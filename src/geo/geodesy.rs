//! Distance, bearing, destination, and segment-projection primitives on the
//! WGS84 ellipsoid (Vincenty formulae) and on the Euclidean plane.

use super::error::GeometryError;
use super::point::{GeometryKind, Point};

/// WGS84 equatorial radius, meters.
pub const WGS84_A: f64 = 6_378_137.0;
/// WGS84 inverse flattening.
pub const WGS84_INV_F: f64 = 298.257223563;
/// WGS84 flattening.
pub const WGS84_F: f64 = 1.0 / WGS84_INV_F;
/// WGS84 semi-minor axis, meters.
pub const WGS84_B: f64 = WGS84_A * (1.0 - WGS84_F);

const VINCENTY_MAX_ITER: usize = 200;
const VINCENTY_TOLERANCE: f64 = 1e-12;
const ON_TRACK_EPS_M: f64 = 0.1;
const ON_TRACK_MAX_ITER: usize = 50;
const ON_TRACK_HISTORY: usize = 3;

fn check_same_kind(a: &Point, b: &Point) -> Result<GeometryKind, GeometryError> {
    if a.kind != b.kind {
        return Err(GeometryError::MismatchedFactory);
    }
    Ok(a.kind)
}

fn check_latitude(lat: f64) -> Result<(), GeometryError> {
    if !(-90.0..=90.0).contains(&lat) {
        return Err(GeometryError::OutOfRange(lat));
    }
    Ok(())
}

fn normalize_degrees(deg: f64) -> f64 {
    let d = deg % 360.0;
    if d < 0.0 {
        d + 360.0
    } else {
        d
    }
}

/// distance between `a` and `b`, in meters. Planar factories use the
/// Euclidean 2-norm (coordinate units treated as meters); geodetic
/// factories use the Vincenty inverse formula on the WGS84 ellipsoid.
pub fn distance(a: &Point, b: &Point) -> Result<f64, GeometryError> {
    let kind = check_same_kind(a, b)?;
    match kind {
        GeometryKind::Euclidean => Ok(((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()),
        GeometryKind::GeodeticWgs84 => Ok(vincenty_inverse(a, b)?.0),
    }
}

/// initial bearing from `a` to `b`, in degrees `[0, 360)`.
pub fn initial_bearing(a: &Point, b: &Point) -> Result<f64, GeometryError> {
    let kind = check_same_kind(a, b)?;
    if a.approx_eq_default(b) {
        return Err(GeometryError::Degenerate);
    }
    match kind {
        GeometryKind::Euclidean => {
            let dx = b.x - a.x;
            let dy = b.y - a.y;
            Ok(normalize_degrees(dx.atan2(dy).to_degrees()))
        }
        GeometryKind::GeodeticWgs84 => Ok(vincenty_inverse(a, b)?.1),
    }
}

/// point reached by travelling `distance_m` meters from `p` along `bearing_deg`.
pub fn destination(p: &Point, bearing_deg: f64, distance_m: f64) -> Result<Point, GeometryError> {
    match p.kind {
        GeometryKind::Euclidean => {
            let theta = bearing_deg.to_radians();
            Ok(Point::planar(
                p.x + distance_m * theta.sin(),
                p.y + distance_m * theta.cos(),
            ))
        }
        GeometryKind::GeodeticWgs84 => {
            check_latitude(p.y)?;
            let (lon2, lat2) = vincenty_direct(p.x, p.y, bearing_deg, distance_m);
            Ok(Point::geodetic(lon2, lat2))
        }
    }
}

/// Vincenty inverse: returns `(distance_m, initial_bearing_deg)`.
fn vincenty_inverse(a: &Point, b: &Point) -> Result<(f64, f64), GeometryError> {
    check_latitude(a.y)?;
    check_latitude(b.y)?;

    if a.approx_eq_default(b) {
        return Ok((0.0, 0.0));
    }

    let l = (b.x - a.x).to_radians();
    let u1 = ((1.0 - WGS84_F) * a.y.to_radians().tan()).atan();
    let u2 = ((1.0 - WGS84_F) * b.y.to_radians().tan()).atan();
    let (sin_u1, cos_u1) = u1.sin_cos();
    let (sin_u2, cos_u2) = u2.sin_cos();

    let mut lambda = l;
    let mut sin_sigma;
    let mut cos_sigma;
    let mut sigma;
    let mut cos_sq_alpha;
    let mut cos2_sigma_m;
    let mut sin_alpha;

    loop {
        let mut converged = false;
        let mut iter = 0usize;
        loop {
            let (sin_lambda, cos_lambda) = lambda.sin_cos();
            sin_sigma = ((cos_u2 * sin_lambda).powi(2)
                + (cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda).powi(2))
            .sqrt();
            if sin_sigma == 0.0 {
                // coincident points along the same meridian
                return Ok((0.0, 0.0));
            }
            cos_sigma = sin_u1 * sin_u2 + cos_u1 * cos_u2 * cos_lambda;
            sigma = sin_sigma.atan2(cos_sigma);
            sin_alpha = cos_u1 * cos_u2 * sin_lambda / sin_sigma;
            cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
            cos2_sigma_m = if cos_sq_alpha.abs() < 1e-12 {
                0.0 // equatorial line
            } else {
                cos_sigma - 2.0 * sin_u1 * sin_u2 / cos_sq_alpha
            };
            let c = WGS84_F / 16.0 * cos_sq_alpha * (4.0 + WGS84_F * (4.0 - 3.0 * cos_sq_alpha));
            let lambda_prev = lambda;
            lambda = l
                + (1.0 - c)
                    * WGS84_F
                    * sin_alpha
                    * (sigma
                        + c * sin_sigma
                            * (cos2_sigma_m + c * cos_sigma * (-1.0 + 2.0 * cos2_sigma_m.powi(2))));
            iter += 1;
            if (lambda - lambda_prev).abs() < VINCENTY_TOLERANCE {
                converged = true;
            }
            if converged || iter >= VINCENTY_MAX_ITER {
                break;
            }
        }
        break;
    }

    let u_sq = cos_sq_alpha * (WGS84_A.powi(2) - WGS84_B.powi(2)) / WGS84_B.powi(2);
    let big_a = 1.0
        + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
    let big_b = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));
    let delta_sigma = big_b
        * sin_sigma
        * (cos2_sigma_m
            + big_b / 4.0
                * (cos_sigma * (-1.0 + 2.0 * cos2_sigma_m.powi(2))
                    - big_b / 6.0
                        * cos2_sigma_m
                        * (-3.0 + 4.0 * sin_sigma.powi(2))
                        * (-3.0 + 4.0 * cos2_sigma_m.powi(2))));
    let s = WGS84_B * big_a * (sigma - delta_sigma);

    let (sin_lambda, cos_lambda) = lambda.sin_cos();
    let alpha1 = (cos_u2 * sin_lambda).atan2(cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda);

    Ok((s, normalize_degrees(alpha1.to_degrees())))
}

/// Vincenty direct: returns `(lon2, lat2)` in degrees.
fn vincenty_direct(lon1: f64, lat1: f64, bearing_deg: f64, s: f64) -> (f64, f64) {
    let alpha1 = bearing_deg.to_radians();
    let (sin_alpha1, cos_alpha1) = alpha1.sin_cos();

    let tan_u1 = (1.0 - WGS84_F) * lat1.to_radians().tan();
    let cos_u1 = 1.0 / (1.0 + tan_u1 * tan_u1).sqrt();
    let sin_u1 = tan_u1 * cos_u1;

    let sigma1 = tan_u1.atan2(cos_alpha1);
    let sin_alpha = cos_u1 * sin_alpha1;
    let cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
    let u_sq = cos_sq_alpha * (WGS84_A.powi(2) - WGS84_B.powi(2)) / WGS84_B.powi(2);
    let big_a = 1.0
        + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
    let big_b = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));

    let mut sigma = s / (WGS84_B * big_a);
    let mut cos2_sigma_m;
    for _ in 0..VINCENTY_MAX_ITER {
        cos2_sigma_m = (2.0 * sigma1 + sigma).cos();
        let (sin_sigma, cos_sigma) = sigma.sin_cos();
        let delta_sigma = big_b
            * sin_sigma
            * (cos2_sigma_m
                + big_b / 4.0
                    * (cos_sigma * (-1.0 + 2.0 * cos2_sigma_m.powi(2))
                        - big_b / 6.0
                            * cos2_sigma_m
                            * (-3.0 + 4.0 * sin_sigma.powi(2))
                            * (-3.0 + 4.0 * cos2_sigma_m.powi(2))));
        let sigma_prev = sigma;
        sigma = s / (WGS84_B * big_a) + delta_sigma;
        if (sigma - sigma_prev).abs() < VINCENTY_TOLERANCE {
            break;
        }
    }

    let cos2_sigma_m = (2.0 * sigma1 + sigma).cos();
    let (sin_sigma, cos_sigma) = sigma.sin_cos();
    let tmp = sin_u1 * sin_sigma - cos_u1 * cos_sigma * cos_alpha1;
    let lat2 = (sin_u1 * cos_sigma + cos_u1 * sin_sigma * cos_alpha1)
        .atan2((1.0 - WGS84_F) * (sin_alpha * sin_alpha + tmp * tmp).sqrt());
    let lambda = (sin_sigma * sin_alpha1).atan2(cos_u1 * cos_sigma - sin_u1 * sin_sigma * cos_alpha1);
    let c = WGS84_F / 16.0 * cos_sq_alpha * (4.0 + WGS84_F * (4.0 - 3.0 * cos_sq_alpha));
    let l = lambda
        - (1.0 - c)
            * WGS84_F
            * sin_alpha
            * (sigma + c * sin_sigma * (cos2_sigma_m + c * cos_sigma * (-1.0 + 2.0 * cos2_sigma_m.powi(2))));

    let lon2 = lon1.to_radians() + l;
    (
        normalize_longitude(lon2.to_degrees()),
        lat2.to_degrees(),
    )
}

fn normalize_longitude(lon: f64) -> f64 {
    let mut l = lon;
    while l > 180.0 {
        l -= 360.0;
    }
    while l < -180.0 {
        l += 360.0;
    }
    l
}

/// the point on segment `a -> b` closest to `p`, clamped to the segment's
/// endpoints. The planar variant is a closed-form projection; the geodetic
/// variant iterates a local bearing/along-track-distance estimate to
/// convergence.
pub fn on_track_closest_point(a: &Point, b: &Point, p: &Point) -> Result<Point, GeometryError> {
    if a.approx_eq_default(b) {
        return Ok(*a);
    }
    match a.kind {
        GeometryKind::Euclidean => Ok(on_track_closest_point_planar(a, b, p)),
        GeometryKind::GeodeticWgs84 => on_track_closest_point_geodetic(a, b, p),
    }
}

fn on_track_closest_point_planar(a: &Point, b: &Point, p: &Point) -> Point {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    Point::planar(a.x + t * dx, a.y + t * dy)
}

fn on_track_closest_point_geodetic(a: &Point, b: &Point, p: &Point) -> Result<Point, GeometryError> {
    let total_dist = distance(a, b)?;
    let bearing_ab = initial_bearing(a, b)?;

    let mut atd = 0.0_f64;
    let mut history: Vec<f64> = Vec::with_capacity(ON_TRACK_HISTORY);
    let mut step_scale = 1.0_f64;

    for _ in 0..ON_TRACK_MAX_ITER {
        let candidate = destination(a, bearing_ab, atd.clamp(0.0, total_dist))?;
        if candidate.approx_eq_default(p) {
            break;
        }
        let d_cp = distance(&candidate, p)?;
        if d_cp < ON_TRACK_EPS_M {
            break;
        }
        let bearing_cp = match initial_bearing(&candidate, p) {
            Ok(b) => b,
            Err(GeometryError::Degenerate) => break,
            Err(e) => return Err(e),
        };
        let delta_angle = (bearing_cp - bearing_ab).to_radians();
        let delta_atd = d_cp * delta_angle.cos() * step_scale;
        let new_atd = atd + delta_atd;

        if (new_atd - atd).abs() < ON_TRACK_EPS_M {
            atd = new_atd;
            break;
        }

        if history.len() == ON_TRACK_HISTORY
            && history.iter().any(|v| (v - new_atd).abs() < 1e-6)
        {
            step_scale *= 0.5;
        }
        history.push(new_atd);
        if history.len() > ON_TRACK_HISTORY {
            history.remove(0);
        }
        atd = new_atd;
    }

    let clamped = atd.clamp(0.0, total_dist);
    destination(a, bearing_ab, clamped)
}

/// distance from `a` to `onTrackClosestPoint(a, b, p)` along the segment, meters.
pub fn along_track_distance(a: &Point, b: &Point, p: &Point) -> Result<f64, GeometryError> {
    let closest = on_track_closest_point(a, b, p)?;
    distance(a, &closest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_geodetic_distance_matches_known_value() {
        let a = Point::geodetic(121.058805, 14.552797);
        let b = Point::geodetic(120.994260, 14.593999);
        let d = distance(&a, &b).unwrap();
        assert_relative_eq!(d, 8316.3, epsilon = 0.05);
    }

    #[test]
    fn test_planar_on_track_closest_point_trivial_case() {
        let a = Point::planar(0.0, 0.0);
        let b = Point::planar(10.0, 0.0);
        let p = Point::planar(5.0, 7.0);
        let closest = on_track_closest_point(&a, &b, &p).unwrap();
        assert_relative_eq!(closest.x, 5.0, epsilon = 1e-9);
        assert_relative_eq!(closest.y, 0.0, epsilon = 1e-9);
        let atd = along_track_distance(&a, &b, &p).unwrap();
        assert_relative_eq!(atd, 5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_destination_zero_distance_is_identity() {
        let p = Point::geodetic(-105.2, 40.0);
        let d = destination(&p, 45.0, 0.0).unwrap();
        assert!(p.approx_eq(&d, 1e-6));
    }

    #[test]
    fn test_destination_round_trip() {
        let p = Point::geodetic(-105.2, 40.0);
        let out = destination(&p, 37.0, 1000.0).unwrap();
        let back = destination(&out, 37.0 + 180.0, 1000.0).unwrap();
        assert_relative_eq!(back.x, p.x, epsilon = 1e-6);
        assert_relative_eq!(back.y, p.y, epsilon = 1e-6);
    }

    #[test]
    fn test_on_track_closest_point_endpoints() {
        let a = Point::geodetic(-105.2, 40.0);
        let b = Point::geodetic(-105.1, 40.05);
        let at_a = on_track_closest_point(&a, &b, &a).unwrap();
        let at_b = on_track_closest_point(&a, &b, &b).unwrap();
        assert!(at_a.approx_eq(&a, 1.0 / 111_320.0));
        assert!(at_b.approx_eq(&b, 1.0 / 111_320.0));
    }

    #[test]
    fn test_out_of_range_latitude() {
        let a = Point::geodetic(-105.0, 95.0);
        let b = Point::geodetic(-105.0, 40.0);
        let err = distance(&a, &b).unwrap_err();
        assert_eq!(err, GeometryError::OutOfRange(95.0));
    }

    #[test]
    fn test_degenerate_bearing() {
        let a = Point::geodetic(-105.0, 40.0);
        let err = initial_bearing(&a, &a).unwrap_err();
        assert_eq!(err, GeometryError::Degenerate);
    }
}
